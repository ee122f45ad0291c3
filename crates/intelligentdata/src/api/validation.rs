//! Validation API.

use crate::client::IntelligentDataClient;
use crate::error::Result;
use crate::types::{
    AddressRequest, AddressResponse, BankAccountRequest, BankAccountResponse, TaxIdRequest,
    TaxIdResponse,
};

pub(crate) const ADDRESS_PATH: &str = "/api/validate/address";
pub(crate) const TAX_ID_PATH: &str = "/api/validate/taxid";
pub(crate) const BANK_PATH: &str = "/api/validate/bank";

/// Validation API client.
pub struct ValidationApi {
    client: IntelligentDataClient,
}

impl ValidationApi {
    pub(crate) fn new(client: IntelligentDataClient) -> Self {
        Self { client }
    }

    /// Validate and standardize a postal address.
    pub async fn address(&self, request: AddressRequest) -> Result<AddressResponse> {
        self.client.post(ADDRESS_PATH, &request).await
    }

    /// Validate a tax identification number.
    pub async fn tax_id(&self, request: TaxIdRequest) -> Result<TaxIdResponse> {
        self.client.post(TAX_ID_PATH, &request).await
    }

    /// Verify bank account details.
    pub async fn bank_account(&self, request: BankAccountRequest) -> Result<BankAccountResponse> {
        self.client.post(BANK_PATH, &request).await
    }
}
