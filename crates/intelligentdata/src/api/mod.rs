//! API endpoint implementations.

mod enrichment;
mod risk;
mod validation;

pub use enrichment::EnrichmentApi;
pub use risk::RiskApi;
pub use validation::ValidationApi;
