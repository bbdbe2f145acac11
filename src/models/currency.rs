use serde::{Deserialize, Serialize};

/// A single exchange rate relative to the provider's fixed base currency.
/// Immutable once fetched; a refresh replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRate {
    /// ISO 4217 currency code, unique within one refresh generation.
    pub code: String,
    /// Units of this currency per one unit of the base currency.
    pub value: f64,
}

/// Derived freshness of the cached rate set.
///
/// `Idle` is the pre-initialization default; after the first refresh pass
/// the status is always `Fresh` or `Stale`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RateStatus {
    #[default]
    Idle,
    Fresh,
    Stale,
}

impl RateStatus {
    pub fn display(&self) -> &'static str {
        match self {
            RateStatus::Idle => "Idle",
            RateStatus::Fresh => "Rates are up to date",
            RateStatus::Stale => "Rates are not fresh",
        }
    }
}

/// Which side of the conversion a persisted currency preference addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySlot {
    Source,
    Target,
}

/// Convert an amount between two currencies through the fixed base.
pub fn convert(amount: f64, source: &CurrencyRate, target: &CurrencyRate) -> f64 {
    amount / source.value * target.value
}

// ============================================================================
// Tests
// ============================================================================
