//! Domain models for the rate pipeline.
//!
//! - `CurrencyRate`: one quoted rate relative to the provider's fixed base
//! - `RateStatus`: derived freshness indicator for the UI shell
//! - `CurrencySlot`: which side of a conversion a preference addresses

pub mod currency;

pub use currency::{convert, CurrencyRate, CurrencySlot, RateStatus};
