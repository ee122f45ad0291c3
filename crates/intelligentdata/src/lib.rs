//! HTTP client SDK for the Intelligent Data verification API.
//!
//! This crate provides a typed, async client for address, tax ID and bank
//! account validation, business lookup, sanctions screening and
//! disqualified-director checks.
//!
//! # Example
//!
//! ```no_run
//! use intelligentdata::{Error, IntelligentDataClient, SanctionsRequest};
//!
//! # async fn example() -> intelligentdata::Result<()> {
//! // API key auth
//! let client = IntelligentDataClient::with_api_key("svm_live_...")?;
//!
//! // Or OAuth2 client credentials; tokens are fetched and refreshed on demand
//! let client = IntelligentDataClient::builder()
//!     .client_credentials("my-client-id", "my-client-secret")
//!     .build()?;
//!
//! match client.check_sanctions(SanctionsRequest::new("Acme Corp")).await {
//!     Ok(result) if result.has_matches => println!("{} matches", result.matches.len()),
//!     Ok(_) => println!("clear"),
//!     Err(Error::RateLimit { retry_after, .. }) => println!("slow down for {:?}", retry_after),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Retries
//!
//! Every operation runs through the same pipeline: up to three attempts,
//! exponential backoff (1s, 2s, 4s), `Retry-After` honored on 429. Transport
//! failures, 429 and 5xx responses are retried; 401/403 and other 4xx
//! responses fail immediately. See [`Error`] for the taxonomy.
//!
//! # API Coverage
//!
//! - **Validation**: address, tax ID, bank account
//! - **Enrichment**: business lookup
//! - **Risk**: sanctions screening, director checks

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod retry;
pub mod types;

pub use auth::{CachedToken, ClientCredentials, Credentials, TokenManager};
pub use client::{ClientBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, IntelligentDataClient};
pub use config::ClientConfig;
pub use error::{Error, ErrorEnvelope, Result};
pub use executor::{RequestExecutor, RequestSpec};
pub use retry::{RetryPolicy, SharedSleeper, Sleeper, TokioSleeper};
pub use types::*;
