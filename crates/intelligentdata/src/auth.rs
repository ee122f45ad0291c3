//! Credentials and OAuth2 client-credentials token management.
//!
//! Tokens are fetched lazily on first use and cached in memory until they
//! come within [`EXPIRY_MARGIN_SECS`] of expiring. Nothing is persisted.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{Error, ErrorEnvelope, Result, parse_raw_body};

/// Tokens are treated as expired this many seconds early.
pub const EXPIRY_MARGIN_SECS: i64 = 30;

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

// ============================================================================
// Credentials
// ============================================================================

/// How the client authenticates. Exactly one mode is active per client.
#[derive(Clone, Default)]
pub enum Credentials {
    /// No credentials; requests go out without an auth header.
    #[default]
    None,
    /// Static key sent as `X-Api-Key`.
    ApiKey(String),
    /// OAuth2 client-credentials grant; tokens sent as `Authorization: Bearer`.
    ClientCredentials(ClientCredentials),
}

impl Credentials {
    /// Resolve the active mode from optional settings.
    ///
    /// A non-empty API key always wins. OAuth2 is only enabled when both the
    /// client id and secret are non-empty.
    pub fn resolve(
        api_key: Option<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
        token_url: String,
    ) -> Self {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            return Credentials::ApiKey(key);
        }
        match (
            client_id.filter(|s| !s.is_empty()),
            client_secret.filter(|s| !s.is_empty()),
        ) {
            (Some(client_id), Some(client_secret)) => {
                Credentials::ClientCredentials(ClientCredentials {
                    client_id,
                    client_secret,
                    token_url,
                })
            }
            _ => Credentials::None,
        }
    }

    /// Short name of the active mode, safe to log.
    pub fn mode(&self) -> &'static str {
        match self {
            Credentials::None => "none",
            Credentials::ApiKey(_) => "api_key",
            Credentials::ClientCredentials(_) => "oauth2",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credentials::ClientCredentials(c) => {
                f.debug_tuple("ClientCredentials").field(c).finish()
            }
        }
    }
}

/// OAuth2 client id/secret pair and the endpoint that exchanges them.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url)
            .finish()
    }
}

// ============================================================================
// CachedToken
// ============================================================================

/// An access token and the instant it stops being valid.
#[derive(Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// True while `now < expires_at - 30s`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        match self
            .expires_at
            .checked_sub_signed(TimeDelta::seconds(EXPIRY_MARGIN_SECS))
        {
            Some(deadline) => now < deadline,
            None => false,
        }
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

// ============================================================================
// TokenManager
// ============================================================================

/// Fetches and caches OAuth2 client-credentials tokens.
///
/// The cache guard is held across check-and-refresh, so concurrent callers
/// wait for a single in-flight fetch instead of issuing their own.
#[derive(Debug)]
pub struct TokenManager {
    credentials: ClientCredentials,
    timeout: Duration,
    cache: Mutex<Option<Arc<CachedToken>>>,
}

impl TokenManager {
    /// Create a token manager; no request is made until the first `get_token`.
    pub fn new(credentials: ClientCredentials, timeout: Duration) -> Self {
        Self {
            credentials,
            timeout,
            cache: Mutex::new(None),
        }
    }

    /// Token endpoint URL.
    pub fn token_url(&self) -> &str {
        &self.credentials.token_url
    }

    /// Return a usable access token, fetching a new one if needed.
    pub async fn get_token(&self, http: &reqwest::Client) -> Result<String> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref().filter(|t| t.is_usable_at(Utc::now())) {
            tracing::debug!("Using cached access token");
            return Ok(token.access_token.clone());
        }

        let token = Arc::new(self.fetch(http).await?);
        *cache = Some(Arc::clone(&token));

        tracing::info!(expires_at = %token.expires_at, "Access token refreshed");
        Ok(token.access_token.clone())
    }

    /// Snapshot of the current cached token, if any.
    pub async fn cached(&self) -> Option<Arc<CachedToken>> {
        self.cache.lock().await.clone()
    }

    /// Check if a token is cached (usable or not).
    pub async fn has_cached_token(&self) -> bool {
        self.cache.lock().await.is_some()
    }

    /// Drop the cached token so the next call refreshes.
    pub async fn clear(&self) {
        *self.cache.lock().await = None;
    }

    #[cfg(test)]
    pub(crate) async fn prime(&self, token: CachedToken) {
        *self.cache.lock().await = Some(Arc::new(token));
    }

    async fn fetch(&self, http: &reqwest::Client) -> Result<CachedToken> {
        tracing::debug!(token_url = %self.credentials.token_url, "Requesting access token");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];

        let response = http
            .post(&self.credentials.token_url)
            .form(&params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(token_transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(token_transport_error)?;

        if !(200..300).contains(&status) {
            tracing::error!(status, "Token endpoint rejected credentials");
            return Err(Error::Auth(ErrorEnvelope::from_body(
                status,
                &body,
                "Token request rejected",
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Auth(ErrorEnvelope {
                status_code: status,
                message: format!("Invalid token response: {}", e),
                raw_body: parse_raw_body(&body),
            })
        })?;

        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let lifetime = i64::try_from(expires_in)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Ok(CachedToken::new(parsed.access_token, expires_at))
    }
}

fn token_transport_error(e: reqwest::Error) -> Error {
    Error::Auth(ErrorEnvelope::new(0, format!("Token request failed: {}", e)))
}
