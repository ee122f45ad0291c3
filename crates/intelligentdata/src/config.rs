//! Client configuration loaded from the environment or a TOML document.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable prefix for [`ClientConfig::from_env`].
pub const ENV_PREFIX: &str = "INTELLIGENTDATA_";

/// Serializable client settings.
///
/// Every field is optional; unset values fall back to the [`ClientBuilder`]
/// defaults.
///
/// ```toml
/// api_key = "svm_live_..."
/// base_url = "https://api.smartvmapi.com"
/// timeout_secs = 10
/// ```
///
/// [`ClientBuilder`]: crate::ClientBuilder
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
}

impl ClientConfig {
    /// Read `INTELLIGENTDATA_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.trim().is_empty())
        };

        Ok(Self {
            api_key: get("API_KEY"),
            client_id: get("CLIENT_ID"),
            client_secret: get("CLIENT_SECRET"),
            token_url: get("TOKEN_URL"),
            base_url: get("BASE_URL"),
            timeout_secs: parse_number(get("TIMEOUT_SECS"), "TIMEOUT_SECS")?,
            max_attempts: parse_number(get("MAX_ATTEMPTS"), "MAX_ATTEMPTS")?,
        })
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))
    }

    /// Overlay `other` on top of `self`; set fields in `other` win.
    pub fn merge(self, other: ClientConfig) -> Self {
        Self {
            api_key: other.api_key.or(self.api_key),
            client_id: other.client_id.or(self.client_id),
            client_secret: other.client_secret.or(self.client_secret),
            token_url: other.token_url.or(self.token_url),
            base_url: other.base_url.or(self.base_url),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            max_attempts: other.max_attempts.or(self.max_attempts),
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, name: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|_| {
                Error::Config(format!("{}{} must be a number, got '{}'", ENV_PREFIX, name, v))
            })
        })
        .transpose()
}
