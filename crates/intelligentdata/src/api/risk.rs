//! Risk API.
//!
//! Sanctions screening and disqualified-director checks.

use crate::client::IntelligentDataClient;
use crate::error::Result;
use crate::types::{DirectorsRequest, DirectorsResponse, SanctionsRequest, SanctionsResponse};

pub(crate) const SANCTIONS_PATH: &str = "/api/risk/sanctions";
pub(crate) const DIRECTORS_PATH: &str = "/api/risk/directors";

/// Risk API client.
pub struct RiskApi {
    client: IntelligentDataClient,
}

impl RiskApi {
    pub(crate) fn new(client: IntelligentDataClient) -> Self {
        Self { client }
    }

    /// Screen an entity against global sanctions lists.
    pub async fn sanctions(&self, request: SanctionsRequest) -> Result<SanctionsResponse> {
        self.client.post(SANCTIONS_PATH, &request).await
    }

    /// Check a company's directors for disqualifications.
    pub async fn directors(&self, request: DirectorsRequest) -> Result<DirectorsResponse> {
        self.client.post(DIRECTORS_PATH, &request).await
    }
}
