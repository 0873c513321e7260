//! Product repository
//!
//! Looks up raw product records by barcode. The trait keeps the lookup
//! pluggable; the bundled implementation talks to the Open Food Facts
//! HTTP API. A missing product is an ordinary `Ok(None)`, never an error.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::build_info;
use crate::models::RawProductRecord;

/// Default product catalog endpoint
pub const DEFAULT_API_BASE: &str = "https://world.openfoodfacts.org";

/// Repository error types
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("product request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed product payload")]
    MalformedPayload,
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Source of raw product records, keyed by decoded symbol text
pub trait ProductRepository {
    /// Fetch the record for a product code; `Ok(None)` when the catalog
    /// has no product under this code.
    fn fetch_product(&self, code: &str) -> RepositoryResult<Option<RawProductRecord>>;
}

/// Blocking Open Food Facts API client
pub struct OpenFoodFactsClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OpenFoodFactsClient {
    pub fn new() -> RepositoryResult<Self> {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> RepositoryResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("{}/{}", build_info::NAME, build_info::VERSION))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl ProductRepository for OpenFoodFactsClient {
    fn fetch_product(&self, code: &str) -> RepositoryResult<Option<RawProductRecord>> {
        let url = format!("{}/api/v0/product/{}.json", self.base_url, code);
        debug!("fetching product record from {url}");
        let payload: Value = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .json()?;
        parse_lookup(payload)
    }
}

/// Interpret a catalog lookup payload: `status == 1` carries a product,
/// any other status means "not found". Kept free of I/O so it is
/// testable without a network.
fn parse_lookup(payload: Value) -> RepositoryResult<Option<RawProductRecord>> {
    let status = match payload.get("status") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match status {
        Some(1) => {
            let product = payload
                .get("product")
                .cloned()
                .ok_or(RepositoryError::MalformedPayload)?;
            Ok(Some(RawProductRecord::new(product)))
        }
        Some(_) => Ok(None),
        None => Err(RepositoryError::MalformedPayload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_found_product_is_returned() {
        let payload = json!({
            "status": 1,
            "product": { "product_name": "Oat Bar", "nutriments": { "fat": 3.0 } },
        });
        let record = parse_lookup(payload).expect("valid payload").expect("found");
        assert_eq!(record.str_field("product_name"), Some("Oat Bar"));
        assert_eq!(record.nutriment("fat"), Some(3.0));
    }

    #[test]
    fn test_status_zero_is_not_found() {
        let payload = json!({ "status": 0, "status_verbose": "product not found" });
        assert!(parse_lookup(payload).expect("valid payload").is_none());
    }

    #[test]
    fn test_string_status_is_tolerated() {
        let payload = json!({ "status": "1", "product": {} });
        assert!(parse_lookup(payload).expect("valid payload").is_some());
    }

    #[test]
    fn test_missing_status_is_malformed() {
        assert!(matches!(
            parse_lookup(json!({ "product": {} })),
            Err(RepositoryError::MalformedPayload)
        ));
    }

    #[test]
    fn test_found_without_product_is_malformed() {
        assert!(matches!(
            parse_lookup(json!({ "status": 1 })),
            Err(RepositoryError::MalformedPayload)
        ));
    }
}
