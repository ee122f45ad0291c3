//! Request and response types for the Intelligent Data API.
//!
//! Requests serialize to camelCase and leave out empty optional strings.
//! Responses tolerate missing fields and keep the raw body in `raw`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Responses that carry the raw JSON body they were decoded from.
pub(crate) trait RawBody {
    fn set_raw(&mut self, raw: Value);
}

macro_rules! impl_raw_body {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RawBody for $ty {
                fn set_raw(&mut self, raw: Value) {
                    self.raw = raw;
                }
            }
        )*
    };
}

/// Decode `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl_raw_body!(
    AddressResponse,
    TaxIdResponse,
    BankAccountResponse,
    BusinessLookupResponse,
    SanctionsResponse,
    DirectorsResponse,
);

// ─────────────────────────────────────────────────────────────────────────────
// Address Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Request to validate and standardize a postal address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub address_line1: String,
    pub city: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address_line2: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub postal_code: String,
}

impl AddressRequest {
    pub fn new(
        address_line1: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            address_line1: address_line1.into(),
            city: city.into(),
            country: country.into(),
            ..Default::default()
        }
    }

    pub fn with_address_line2(mut self, line: impl Into<String>) -> Self {
        self.address_line2 = line.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = postal_code.into();
        self
    }
}

/// Result of address validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub is_valid: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub confidence_score: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub standardized_address: HashMap<String, Value>,
    /// Full response body, including fields not modeled above.
    #[serde(skip)]
    pub raw: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tax ID Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Request to validate a tax identification number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxIdRequest {
    pub tax_id: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tax_id_type: String,
}

impl TaxIdRequest {
    pub fn new(tax_id: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            tax_id: tax_id.into(),
            country: country.into(),
            ..Default::default()
        }
    }

    /// Hint the expected identifier scheme (e.g. `"EIN"`, `"VAT"`).
    pub fn with_tax_id_type(mut self, tax_id_type: impl Into<String>) -> Self {
        self.tax_id_type = tax_id_type.into();
        self
    }
}

/// Result of tax ID validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaxIdResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub is_valid: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub tax_id_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub registered_name: String,
    #[serde(skip)]
    pub raw: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Bank Account Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Request to verify bank account details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountRequest {
    pub account_number: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub routing_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iban: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bank_code: String,
}

impl BankAccountRequest {
    pub fn new(account_number: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            country: country.into(),
            ..Default::default()
        }
    }

    pub fn with_routing_number(mut self, routing_number: impl Into<String>) -> Self {
        self.routing_number = routing_number.into();
        self
    }

    pub fn with_iban(mut self, iban: impl Into<String>) -> Self {
        self.iban = iban.into();
        self
    }

    pub fn with_bank_code(mut self, bank_code: impl Into<String>) -> Self {
        self.bank_code = bank_code.into();
        self
    }
}

/// Result of bank account validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BankAccountResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub is_valid: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub bank_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub account_type: String,
    #[serde(skip)]
    pub raw: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Business Lookup
// ─────────────────────────────────────────────────────────────────────────────

/// Request to look up official business registration data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessLookupRequest {
    pub company_name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub registration_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
}

impl BusinessLookupRequest {
    pub fn new(company_name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            country: country.into(),
            ..Default::default()
        }
    }

    pub fn with_registration_number(mut self, number: impl Into<String>) -> Self {
        self.registration_number = number.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }
}

/// Business registration record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BusinessLookupResponse {
    /// Whether a matching registration was found.
    #[serde(deserialize_with = "null_as_default")]
    pub found: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub company_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub registration_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: HashMap<String, Value>,
    #[serde(skip)]
    pub raw: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Sanctions Screening
// ─────────────────────────────────────────────────────────────────────────────

/// Default entity type screened when none is given.
pub const DEFAULT_ENTITY_TYPE: &str = "organization";

/// Request to screen an entity against global sanctions lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanctionsRequest {
    pub entity_name: String,
    #[serde(default = "default_entity_type", skip_serializing_if = "String::is_empty")]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
}

fn default_entity_type() -> String {
    DEFAULT_ENTITY_TYPE.to_string()
}

impl Default for SanctionsRequest {
    fn default() -> Self {
        Self {
            entity_name: String::new(),
            entity_type: default_entity_type(),
            country: String::new(),
        }
    }
}

impl SanctionsRequest {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Default::default()
        }
    }

    /// Screen as a different entity type, e.g. `"individual"`.
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = entity_type.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }
}

/// Sanctions screening result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SanctionsResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub has_matches: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub matches: Vec<HashMap<String, Value>>,
    /// Names of the lists the entity was screened against.
    #[serde(deserialize_with = "null_as_default")]
    pub screened_lists: Vec<String>,
    #[serde(skip)]
    pub raw: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Directors Check
// ─────────────────────────────────────────────────────────────────────────────

/// Request to check a company's directors for disqualifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorsRequest {
    pub company_name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub registration_number: String,
}

impl DirectorsRequest {
    pub fn new(company_name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            country: country.into(),
            ..Default::default()
        }
    }

    pub fn with_registration_number(mut self, number: impl Into<String>) -> Self {
        self.registration_number = number.into();
        self
    }
}

/// Disqualified-director check result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirectorsResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub has_disqualified: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub directors: Vec<HashMap<String, Value>>,
    #[serde(skip)]
    pub raw: Value,
}
