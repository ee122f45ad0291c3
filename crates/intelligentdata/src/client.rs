//! Main client implementation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::api::{EnrichmentApi, RiskApi, ValidationApi};
use crate::auth::{Credentials, TokenManager};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::executor::{RequestExecutor, RequestSpec};
use crate::retry::{RetryPolicy, SharedSleeper, TokioSleeper};
use crate::types::{
    AddressRequest, AddressResponse, BankAccountRequest, BankAccountResponse,
    BusinessLookupRequest, BusinessLookupResponse, DirectorsRequest, DirectorsResponse, RawBody,
    SanctionsRequest, SanctionsResponse, TaxIdRequest, TaxIdResponse,
};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.smartvmapi.com";

/// Default timeout for requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Token endpoint path used when no token URL is configured.
const DEFAULT_TOKEN_PATH: &str = "/api/oauth/token";

/// Intelligent Data API client.
///
/// Cloning is cheap; clones share one connection pool and token cache.
///
/// # Example
///
/// ```no_run
/// use intelligentdata::{AddressRequest, IntelligentDataClient};
///
/// # async fn example() -> intelligentdata::Result<()> {
/// let client = IntelligentDataClient::builder().api_key("svm_live_...").build()?;
///
/// let result = client
///     .validate_address(
///         AddressRequest::new("123 Main St", "New York", "US").with_postal_code("10001"),
///     )
///     .await?;
/// println!("valid: {} ({:.2})", result.is_valid, result.confidence_score);
///
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct IntelligentDataClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
struct ClientInner {
    /// HTTP client; `None` once closed.
    http: RwLock<Option<reqwest::Client>>,
    /// Base URL, without trailing slash.
    base_url: Url,
    executor: RequestExecutor,
}

impl fmt::Debug for IntelligentDataClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntelligentDataClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("closed", &self.is_closed())
            .field("executor", &self.inner.executor)
            .finish()
    }
}

impl IntelligentDataClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client authenticating with a static API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Create a client from `INTELLIGENTDATA_*` environment variables.
    pub fn from_env() -> Result<Self> {
        ClientBuilder::from_config(ClientConfig::from_env()?).build()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Name of the active auth mode: `"api_key"`, `"oauth2"` or `"none"`.
    pub fn auth_mode(&self) -> &'static str {
        self.inner.executor.auth_mode()
    }

    /// The OAuth2 token manager, when authenticating with client credentials.
    pub fn token_manager(&self) -> Option<&TokenManager> {
        self.inner.executor.token_manager()
    }

    /// The retry policy applied to every operation.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.executor.retry_policy()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Release the connection pool. Later calls fail with [`Error::Closed`].
    ///
    /// Closing twice is a no-op. The pool is shared, so this affects all clones.
    pub fn close(&self) {
        if self.inner.http.write().take().is_some() {
            tracing::debug!("Client closed");
        }
    }

    /// Check whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.http.read().is_none()
    }

    /// Run `f` with this client, then close it regardless of the outcome.
    pub async fn scoped<F, Fut, T>(self, f: F) -> T
    where
        F: FnOnce(IntelligentDataClient) -> Fut,
        Fut: Future<Output = T>,
    {
        let output = f(self.clone()).await;
        self.close();
        output
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the validation API (address, tax ID, bank account).
    pub fn validation(&self) -> ValidationApi {
        ValidationApi::new(self.clone())
    }

    /// Access the enrichment API (business lookup).
    pub fn enrichment(&self) -> EnrichmentApi {
        EnrichmentApi::new(self.clone())
    }

    /// Access the risk API (sanctions, directors).
    pub fn risk(&self) -> RiskApi {
        RiskApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate and standardize a postal address.
    pub async fn validate_address(&self, request: AddressRequest) -> Result<AddressResponse> {
        self.validation().address(request).await
    }

    /// Validate a tax identification number.
    pub async fn validate_tax_id(&self, request: TaxIdRequest) -> Result<TaxIdResponse> {
        self.validation().tax_id(request).await
    }

    /// Verify bank account details.
    pub async fn validate_bank_account(
        &self,
        request: BankAccountRequest,
    ) -> Result<BankAccountResponse> {
        self.validation().bank_account(request).await
    }

    /// Look up official business registration data.
    pub async fn lookup_business(
        &self,
        request: BusinessLookupRequest,
    ) -> Result<BusinessLookupResponse> {
        self.enrichment().business(request).await
    }

    /// Screen an entity against global sanctions lists.
    pub async fn check_sanctions(&self, request: SanctionsRequest) -> Result<SanctionsResponse> {
        self.risk().sanctions(request).await
    }

    /// Check for disqualified directors.
    pub async fn check_directors(&self, request: DirectorsRequest) -> Result<DirectorsResponse> {
        self.risk().directors(request).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute a raw request through the retry pipeline.
    ///
    /// Useful for endpoints that have no typed wrapper yet.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<Value> {
        let http = self.http()?;
        self.inner.executor.execute(&http, spec).await
    }

    /// POST a typed request and decode the typed response, keeping the raw body.
    pub(crate) async fn post<B, T>(&self, path: &str, request: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + RawBody,
    {
        let body = serde_json::to_value(request)?;
        let data = self.execute(&RequestSpec::post(path, body)).await?;

        let mut response: T = serde_json::from_value(data.clone())?;
        response.set_raw(data);
        Ok(response)
    }

    fn http(&self) -> Result<reqwest::Client> {
        self.inner.http.read().clone().ok_or(Error::Closed)
    }
}

/// Builder for creating an [`IntelligentDataClient`].
pub struct ClientBuilder {
    api_key: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    token_url: Option<String>,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    sleeper: Option<SharedSleeper>,
    user_agent: Option<String>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("token_url", &self.token_url)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            api_key: None,
            client_id: None,
            client_secret: None,
            token_url: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            sleeper: None,
            user_agent: None,
        }
    }

    /// Seed a builder from a [`ClientConfig`].
    pub fn from_config(config: ClientConfig) -> Self {
        let mut builder = Self::new();
        builder.api_key = config.api_key;
        builder.client_id = config.client_id;
        builder.client_secret = config.client_secret;
        builder.token_url = config.token_url;
        if let Some(base_url) = config.base_url {
            builder.base_url = base_url;
        }
        if let Some(secs) = config.timeout_secs {
            builder.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = config.max_attempts {
            builder.retry.max_attempts = attempts;
        }
        builder
    }

    /// Authenticate with a static API key. Takes precedence over OAuth2.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Authenticate with the OAuth2 client-credentials grant.
    pub fn client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Override the token endpoint (defaults to `<base_url>/api/oauth/token`).
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// Set the base URL for the API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Set how backoff delays are waited out (defaults to the tokio timer).
    pub fn sleeper(mut self, sleeper: SharedSleeper) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<IntelligentDataClient> {
        let base = self.base_url.trim_end_matches('/').to_string();
        let base_url = Url::parse(&base)?;

        if self.retry.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be at least 1".to_string()));
        }

        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            HeaderValue::from_str(key)
                .map_err(|_| Error::Config("Invalid API key".to_string()))?;
        }

        let token_url = match self.token_url.filter(|u| !u.is_empty()) {
            Some(url) => {
                Url::parse(&url)?;
                url
            }
            None => format!("{}{}", base, DEFAULT_TOKEN_PATH),
        };

        let credentials =
            Credentials::resolve(self.api_key, self.client_id, self.client_secret, token_url);

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("intelligentdata-rust-sdk/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(base_url = %base, auth_mode = credentials.mode(), "Client configured");

        let sleeper = self
            .sleeper
            .unwrap_or_else(|| Arc::new(TokioSleeper) as SharedSleeper);
        let executor = RequestExecutor::new(base, credentials, self.timeout, self.retry, sleeper);

        Ok(IntelligentDataClient {
            inner: Arc::new(ClientInner {
                http: RwLock::new(Some(http)),
                base_url,
                executor,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
