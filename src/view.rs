//! View-facing state: resolved currency selections.
//!
//! The shell persists selections through `Preferences` and re-resolves
//! them here when a code's subscription fires. This module never fetches
//! and never touches the stores; it only materializes persisted codes
//! against the in-memory rate set and holds the transient results the UI
//! renders.

use tracing::debug;

use crate::models::{CurrencyRate, CurrencySlot};

/// Resolution message when a persisted code has no fetched rate.
const CURRENCY_NOT_FOUND: &str = "currency not found";

/// Outcome of an asynchronous view-facing request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> RequestState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, RequestState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RequestState::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RequestState::Error(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            RequestState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        RequestState::Idle
    }
}

/// Transient, view-facing selection state.
///
/// Swapping is deliberately view-local: persisted preference codes are
/// untouched, so a restart reloads the original source/target pair.
#[derive(Debug, Default)]
pub struct ViewState {
    pub source: RequestState<CurrencyRate>,
    pub target: RequestState<CurrencyRate>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize a persisted currency code against the fetched set.
    pub fn resolve(&mut self, slot: CurrencySlot, code: &str, rates: &[CurrencyRate]) {
        let resolution = match rates.iter().find(|rate| rate.code == code) {
            Some(rate) => RequestState::Success(rate.clone()),
            None => {
                debug!(code, "No fetched rate for selected currency");
                RequestState::Error(CURRENCY_NOT_FOUND.to_string())
            }
        };
        match slot {
            CurrencySlot::Source => self.source = resolution,
            CurrencySlot::Target => self.target = resolution,
        }
    }

    /// Swap the two resolved selections without touching persisted codes.
    pub fn switch_currencies(&mut self) {
        std::mem::swap(&mut self.source, &mut self.target);
    }

    pub fn resolution(&self, slot: CurrencySlot) -> &RequestState<CurrencyRate> {
        match slot {
            CurrencySlot::Source => &self.source,
            CurrencySlot::Target => &self.target,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(code: &str, value: f64) -> CurrencyRate {
        CurrencyRate {
            code: code.to_string(),
            value,
        }
    }

    fn sample_rates() -> Vec<CurrencyRate> {
        vec![rate("USD", 1.0), rate("EUR", 0.92)]
    }

    #[test]
    fn starts_idle() {
        let view = ViewState::new();
        assert!(view.source.is_idle());
        assert!(view.target.is_idle());
    }

    #[test]
    fn resolves_a_fetched_code_to_success() {
        let mut view = ViewState::new();
        view.resolve(CurrencySlot::Source, "EUR", &sample_rates());

        assert_eq!(view.source.success(), Some(&rate("EUR", 0.92)));
        assert!(view.target.is_idle());
    }

    #[test]
    fn resolves_an_unfetched_code_to_not_found() {
        let mut view = ViewState::new();
        view.resolve(CurrencySlot::Target, "JPY", &sample_rates());

        assert_eq!(view.target.error(), Some("currency not found"));
    }

    #[test]
    fn re_resolving_overwrites_the_previous_state() {
        let mut view = ViewState::new();
        view.resolve(CurrencySlot::Source, "JPY", &sample_rates());
        assert!(view.source.is_error());

        view.resolve(CurrencySlot::Source, "USD", &sample_rates());
        assert_eq!(view.source.success(), Some(&rate("USD", 1.0)));
    }

    #[test]
    fn switch_swaps_resolved_selections() {
        let mut view = ViewState::new();
        view.resolve(CurrencySlot::Source, "USD", &sample_rates());
        view.resolve(CurrencySlot::Target, "EUR", &sample_rates());

        view.switch_currencies();

        assert_eq!(view.source.success(), Some(&rate("EUR", 0.92)));
        assert_eq!(view.target.success(), Some(&rate("USD", 1.0)));
        assert_eq!(
            view.resolution(CurrencySlot::Source).success(),
            Some(&rate("EUR", 0.92))
        );
    }

    #[test]
    fn switch_swaps_whatever_is_resolved_including_errors() {
        let mut view = ViewState::new();
        view.resolve(CurrencySlot::Source, "USD", &sample_rates());
        view.resolve(CurrencySlot::Target, "XXX", &sample_rates());

        view.switch_currencies();

        assert!(view.source.is_error());
        assert_eq!(view.target.success(), Some(&rate("USD", 1.0)));
    }
}
