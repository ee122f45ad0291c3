//! Request dispatch: auth headers, retry/backoff and status classification.

use std::fmt;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::RETRY_AFTER;
use serde_json::Value;

use crate::auth::{Credentials, TokenManager};
use crate::error::{Error, ErrorEnvelope, Result, parse_raw_body};
use crate::retry::{RetryPolicy, SharedSleeper, parse_retry_after};

/// Header carrying a static API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// One outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl RequestSpec {
    /// Create a spec with no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// Create a POST spec with a JSON body.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Active auth mode with any state it needs.
enum Authenticator {
    None,
    ApiKey(String),
    Bearer(TokenManager),
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authenticator::None => f.write_str("None"),
            Authenticator::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Authenticator::Bearer(tokens) => f.debug_tuple("Bearer").field(tokens).finish(),
        }
    }
}

/// Outcome of a single attempt.
#[derive(Debug)]
enum Attempt {
    Success(Value),
    Retry { error: Error, delay: Duration },
    Fail(Error),
}

/// Executes [`RequestSpec`]s with the retry policy and error taxonomy applied.
#[derive(Debug)]
pub struct RequestExecutor {
    base_url: String,
    timeout: Duration,
    auth: Authenticator,
    retry: RetryPolicy,
    sleeper: SharedSleeper,
}

impl RequestExecutor {
    /// Create an executor. `base_url` must not end with a slash.
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
        retry: RetryPolicy,
        sleeper: SharedSleeper,
    ) -> Self {
        let auth = match credentials {
            Credentials::None => Authenticator::None,
            Credentials::ApiKey(key) => Authenticator::ApiKey(key),
            Credentials::ClientCredentials(creds) => {
                Authenticator::Bearer(TokenManager::new(creds, timeout))
            }
        };

        Self {
            base_url: base_url.into(),
            timeout,
            auth,
            retry,
            sleeper,
        }
    }

    /// The token manager, when running in OAuth2 mode.
    pub fn token_manager(&self) -> Option<&TokenManager> {
        match &self.auth {
            Authenticator::Bearer(tokens) => Some(tokens),
            _ => None,
        }
    }

    /// Name of the active auth mode.
    pub fn auth_mode(&self) -> &'static str {
        match &self.auth {
            Authenticator::None => "none",
            Authenticator::ApiKey(_) => "api_key",
            Authenticator::Bearer(_) => "oauth2",
        }
    }

    /// The retry policy in effect.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Full URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Run one logical call, retrying transient failures.
    pub async fn execute(&self, http: &reqwest::Client, spec: &RequestSpec) -> Result<Value> {
        let url = self.url(&spec.path);

        for attempt in 0..self.retry.max_attempts {
            let (error, delay) = match self.attempt(http, spec, &url, attempt).await {
                Attempt::Success(body) => return Ok(body),
                Attempt::Fail(error) => return Err(error),
                Attempt::Retry { error, delay } => (error, delay),
            };

            if !self.retry.has_more(attempt) {
                return Err(error);
            }

            tracing::warn!(
                path = %spec.path,
                attempt = attempt + 1,
                max_attempts = self.retry.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                status = error.status_code().unwrap_or(0),
                "Request failed, retrying"
            );
            self.sleeper.sleep(delay).await;
        }

        Err(Error::Api(ErrorEnvelope::new(0, "Request failed after retries")))
    }

    async fn attempt(
        &self,
        http: &reqwest::Client,
        spec: &RequestSpec,
        url: &str,
        attempt: u32,
    ) -> Attempt {
        let mut request = http
            .request(spec.method.clone(), url)
            .timeout(self.timeout);

        request = match &self.auth {
            Authenticator::None => request,
            Authenticator::ApiKey(key) => request.header(API_KEY_HEADER, key),
            Authenticator::Bearer(tokens) => match tokens.get_token(http).await {
                Ok(token) => request.bearer_auth(token),
                Err(e) => return Attempt::Fail(e),
            },
        };

        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        tracing::debug!(method = %spec.method, path = %spec.path, attempt, "Dispatching request");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return self.transport_retry(e, attempt),
        };

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return self.transport_retry(e, attempt),
        };

        classify(&self.retry, status, retry_after, &body, attempt)
    }

    fn transport_retry(&self, e: reqwest::Error, attempt: u32) -> Attempt {
        Attempt::Retry {
            error: Error::Transport(e),
            delay: self.retry.backoff(attempt),
        }
    }
}

/// Map a received response to the next step of the retry loop.
fn classify(
    policy: &RetryPolicy,
    status: u16,
    retry_after: Option<Duration>,
    body: &str,
    attempt: u32,
) -> Attempt {
    match status {
        200..=299 => match parse_success_body(body) {
            Ok(value) => Attempt::Success(value),
            Err(e) => Attempt::Fail(e),
        },
        429 => {
            let delay = retry_after.unwrap_or_else(|| policy.backoff(attempt));
            Attempt::Retry {
                error: Error::RateLimit {
                    retry_after: delay,
                    envelope: ErrorEnvelope {
                        status_code: 429,
                        message: "Rate limit exceeded".to_string(),
                        raw_body: parse_raw_body(body),
                    },
                },
                delay,
            }
        }
        401 | 403 => Attempt::Fail(Error::Auth(ErrorEnvelope::from_body(
            status,
            body,
            "Authentication failed",
        ))),
        s if s >= 500 => Attempt::Retry {
            error: Error::Server(ErrorEnvelope::from_body(status, body, "Server error")),
            delay: policy.backoff(attempt),
        },
        400..=499 => Attempt::Fail(Error::Api(ErrorEnvelope::from_body(
            status,
            body,
            "Request failed",
        ))),
        // Informational and unfollowed redirect statuses.
        _ => Attempt::Fail(Error::Api(ErrorEnvelope::from_body(
            status,
            body,
            "Unexpected response status",
        ))),
    }
}

fn parse_success_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(body)?)
}
