//! Enrichment API.

use crate::client::IntelligentDataClient;
use crate::error::Result;
use crate::types::{BusinessLookupRequest, BusinessLookupResponse};

pub(crate) const BUSINESS_PATH: &str = "/api/enrich/business";

/// Enrichment API client.
pub struct EnrichmentApi {
    client: IntelligentDataClient,
}

impl EnrichmentApi {
    pub(crate) fn new(client: IntelligentDataClient) -> Self {
        Self { client }
    }

    /// Look up official business registration data.
    pub async fn business(&self, request: BusinessLookupRequest) -> Result<BusinessLookupResponse> {
        self.client.post(BUSINESS_PATH, &request).await
    }
}
