//! Remote rate fetching from the currencyapi.com service.
//!
//! This module provides the `CurrencyApiClient` for fetching the latest
//! exchange-rate list in a single authenticated GET, the `RateFetcher`
//! trait seam the refresh pipeline consumes, and the `ApiError` taxonomy
//! for transport, HTTP status, and decode failures.

pub mod client;
pub mod error;

pub use client::{CurrencyApiClient, RateFetcher, RateUpdate};
pub use error::ApiError;
