//! HTTP client for the currencyapi.com latest-rates endpoint.
//!
//! One authenticated GET per refresh; the response is decoded leniently
//! (unknown fields ignored) and reduced to the rate list plus the
//! server-reported "last updated" instant.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::CurrencyRate;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Latest-rates endpoint of the currencyapi.com service.
const ENDPOINT: &str = "https://api.currencyapi.com/v3/latest";

/// Request header carrying the API key.
const API_KEY_HEADER: &str = "apikey";

/// HTTP request timeout in seconds.
/// The rate list is small; anything slower is treated as a network failure.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Result of one fetch round-trip.
#[derive(Debug, Clone)]
pub struct RateUpdate {
    pub rates: Vec<CurrencyRate>,
    /// Server-reported "last updated" instant; `None` when the field is
    /// missing or unparseable.
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// One network round-trip for the current rate list.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch(&self) -> Result<RateUpdate, ApiError>;
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    meta: ResponseMeta,
    data: HashMap<String, CurrencyRate>,
}

#[derive(Debug, Deserialize)]
struct ResponseMeta {
    last_updated_at: String,
}

/// Rate fetcher backed by currencyapi.com.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct CurrencyApiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl CurrencyApiClient {
    /// Create a new client from the application configuration.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| ENDPOINT.to_string()),
            api_key: config.api_key.clone(),
        })
    }

    fn decode(body: &str) -> Result<RateUpdate, ApiError> {
        let response: LatestRatesResponse = serde_json::from_str(body)?;

        let last_updated_at = match DateTime::parse_from_rfc3339(&response.meta.last_updated_at) {
            Ok(instant) => Some(instant.with_timezone(&Utc)),
            Err(e) => {
                warn!(error = %e, raw = %response.meta.last_updated_at, "Unparseable last_updated_at");
                None
            }
        };

        let mut rates: Vec<CurrencyRate> = response.data.into_values().collect();
        rates.sort_by(|a, b| a.code.cmp(&b.code));

        Ok(RateUpdate {
            rates,
            last_updated_at,
        })
    }
}

#[async_trait]
impl RateFetcher for CurrencyApiClient {
    async fn fetch(&self) -> Result<RateUpdate, ApiError> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(ref key) = self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let body = response.text().await?;
        let update = Self::decode(&body)?;
        debug!(count = update.rates.len(), "Fetched latest rates");
        Ok(update)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "meta": { "last_updated_at": "2024-03-01T23:59:59Z" },
        "data": {
            "EUR": { "code": "EUR", "value": 0.92 },
            "USD": { "code": "USD", "value": 1.0 }
        }
    }"#;

    #[test]
    fn decodes_rates_sorted_by_code() {
        let update = CurrencyApiClient::decode(SAMPLE).unwrap();

        let codes: Vec<&str> = update.rates.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["EUR", "USD"]);

        let expected = DateTime::parse_from_rfc3339("2024-03-01T23:59:59Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(update.last_updated_at, Some(expected));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let body = r#"{
            "meta": { "last_updated_at": "2024-03-01T00:00:00Z", "request_id": "abc" },
            "data": {
                "CHF": { "code": "CHF", "value": 0.88, "type": "fiat" }
            },
            "extra": true
        }"#;

        let update = CurrencyApiClient::decode(body).unwrap();
        assert_eq!(update.rates.len(), 1);
        assert_eq!(update.rates[0].code, "CHF");
    }

    #[test]
    fn malformed_timestamp_degrades_to_none() {
        let body = r#"{
            "meta": { "last_updated_at": "yesterday-ish" },
            "data": { "USD": { "code": "USD", "value": 1.0 } }
        }"#;

        let update = CurrencyApiClient::decode(body).unwrap();
        assert_eq!(update.rates.len(), 1);
        assert!(update.last_updated_at.is_none());
    }

    #[test]
    fn malformed_payload_is_a_decode_error() {
        let err = CurrencyApiClient::decode("{not json").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn status_errors_truncate_long_bodies() {
        let err = ApiError::from_status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            &"x".repeat(600),
        );
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("truncated"));
                assert!(body.len() < 600);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
