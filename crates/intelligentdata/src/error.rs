//! Client error types.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Normalized description of a failed call.
///
/// Every HTTP-level failure carries one of these, and any [`Error`] can be
/// reduced to one through [`Error::envelope`].
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEnvelope {
    /// HTTP status code, or `0` when no response was received.
    pub status_code: u16,
    /// Human-readable message, taken from the body's `message` field when present.
    pub message: String,
    /// The response body: parsed JSON, the raw text if it was not JSON, or `{}` if empty.
    pub raw_body: Value,
}

impl ErrorEnvelope {
    /// Create an envelope with an empty raw body.
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            raw_body: Value::Object(Default::default()),
        }
    }

    /// Build an envelope from a response body, falling back to `default_message`
    /// when the body has no string `message` field.
    pub(crate) fn from_body(status_code: u16, body: &str, default_message: &str) -> Self {
        let raw_body = parse_raw_body(body);
        let message = raw_body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(default_message)
            .to_string();

        Self {
            status_code,
            message,
            raw_body,
        }
    }
}

/// Parse an error body without ever failing.
pub(crate) fn parse_raw_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// No response was received (connection, DNS or timeout failure).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Credentials were rejected (401/403, or the token endpoint refused them).
    #[error("Authentication failed: {}", .0.message)]
    Auth(ErrorEnvelope),

    /// Rate limit still in effect after all retries.
    #[error("Rate limit exceeded (retry after {:.2}s)", .retry_after.as_secs_f64())]
    RateLimit {
        /// Delay the server asked for on the final attempt.
        retry_after: Duration,
        /// Details of the final 429 response.
        envelope: ErrorEnvelope,
    },

    /// Server-side failure (5xx) after all retries.
    #[error("Server error ({}): {}", .0.status_code, .0.message)]
    Server(ErrorEnvelope),

    /// Request rejected by the API (4xx other than 401/403/429).
    #[error("API error ({}): {}", .0.status_code, .0.message)]
    Api(ErrorEnvelope),

    /// A success body could not be decoded.
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The client was closed before the call.
    #[error("Client is closed")]
    Closed,
}

impl Error {
    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimit { .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Server(_))
    }

    /// Returns true for the failure kinds the executor retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::RateLimit { .. } | Error::Server(_)
        )
    }

    /// HTTP status code behind this error, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Auth(env) | Error::Server(env) | Error::Api(env) => Some(env.status_code),
            Error::RateLimit { envelope, .. } => Some(envelope.status_code),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get the retry-after duration if this is a rate limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimit { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Reduce this error to its normalized envelope.
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            Error::Auth(env) | Error::Server(env) | Error::Api(env) => env.clone(),
            Error::RateLimit { envelope, .. } => envelope.clone(),
            other => ErrorEnvelope::new(0, other.to_string()),
        }
    }
}
