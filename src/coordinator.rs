//! The refresh pipeline: staleness check, network fetch, cache rebuild.
//!
//! `RefreshCoordinator` orchestrates the freshness policy, the local
//! stores, and the rate fetcher into a single `ensure_fresh` operation.
//! Store and network failures never escape it: they are logged, recorded
//! for display, and folded into a `Stale` status with prior data retained.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, RateFetcher};
use crate::freshness;
use crate::models::{CurrencyRate, RateStatus};
use crate::store::{KeyValueStore, Preferences, RateStore, StoreError};

/// A pipeline failure, surfaced for display but never propagated as a
/// fault. Each variant leaves prior persisted state intact and degrades
/// the derived status to `Stale`.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("local store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("network refresh failed: {0}")]
    NetworkFailure(ApiError),

    #[error("malformed server payload: {0}")]
    DecodeFailure(ApiError),
}

impl From<ApiError> for RefreshError {
    fn from(e: ApiError) -> Self {
        if e.is_decode() {
            RefreshError::DecodeFailure(e)
        } else {
            RefreshError::NetworkFailure(e)
        }
    }
}

/// Orchestrates policy, stores, and fetcher; owns the in-memory rate view.
pub struct RefreshCoordinator<F, R, S> {
    fetcher: F,
    rates: R,
    prefs: Preferences<S>,
    all_rates: Vec<CurrencyRate>,
    status: RateStatus,
    last_error: Option<RefreshError>,
}

impl<F, R, S> RefreshCoordinator<F, R, S>
where
    F: RateFetcher,
    R: RateStore,
    S: KeyValueStore,
{
    pub fn new(fetcher: F, rates: R, prefs: Preferences<S>) -> Self {
        Self {
            fetcher,
            rates,
            prefs,
            all_rates: Vec::new(),
            status: RateStatus::Idle,
            last_error: None,
        }
    }

    /// The in-memory rate view the shell resolves selections against.
    pub fn rates(&self) -> &[CurrencyRate] {
        &self.all_rates
    }

    /// Status derived by the most recent `ensure_fresh` call; `Idle`
    /// until the first one.
    pub fn status(&self) -> RateStatus {
        self.status
    }

    /// Failure recorded by the most recent `ensure_fresh` call, if any.
    pub fn last_error(&self) -> Option<&RefreshError> {
        self.last_error.as_ref()
    }

    /// Reuse the cached snapshot when it is fresh, refresh it from the
    /// network when it is not, and derive the resulting status.
    pub async fn ensure_fresh(&mut self) -> RateStatus {
        self.last_error = None;

        // A failed read is not fatal: continue as if the cache were empty
        // and let the network refresh rebuild it.
        let snapshot = match self.rates.read_all().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed to read cached rates");
                self.last_error = Some(RefreshError::StoreUnavailable(e));
                Vec::new()
            }
        };

        if snapshot.is_empty() {
            debug!("No cached rates, fetching");
            self.refresh_from_network().await;
        } else {
            // Append as-is; uniqueness of codes is the snapshot's own
            // invariant, not re-checked here.
            self.all_rates.extend(snapshot);
            let now = Utc::now().timestamp_millis();
            if self.is_fresh_at(now).await {
                debug!("Cached rates are fresh, skipping fetch");
            } else {
                debug!("Cached rates are stale, fetching");
                self.refresh_from_network().await;
            }
        }

        let now = Utc::now().timestamp_millis();
        self.status = if self.is_fresh_at(now).await {
            RateStatus::Fresh
        } else {
            RateStatus::Stale
        };
        self.status
    }

    async fn is_fresh_at(&mut self, now_millis: i64) -> bool {
        match self.prefs.last_updated().await {
            Ok(last_saved) => freshness::is_fresh(now_millis, last_saved),
            Err(e) => {
                warn!(error = %e, "Failed to read last-updated timestamp");
                self.last_error = Some(RefreshError::StoreUnavailable(e));
                false
            }
        }
    }

    /// Fetch the current rate list and rebuild the cache from it.
    ///
    /// The clear-insert-timestamp sequence is not transactional; an error
    /// partway through leaves the timestamp unset, so the next call
    /// simply fetches again.
    async fn refresh_from_network(&mut self) {
        let update = match self.fetcher.fetch().await {
            Ok(update) => update,
            Err(e) => {
                warn!(error = %e, "Rate fetch failed");
                self.last_error = Some(e.into());
                return;
            }
        };

        // An empty rate list never replaces a populated cache.
        if update.rates.is_empty() {
            warn!("Fetch returned no rates, keeping cached data");
            return;
        }

        if let Err(e) = self.rebuild_cache(&update.rates).await {
            warn!(error = %e, "Failed to persist fetched rates");
            self.last_error = Some(RefreshError::StoreUnavailable(e));
        } else {
            let timestamp = update
                .last_updated_at
                .map(|instant| instant.timestamp_millis())
                .unwrap_or_else(|| Utc::now().timestamp_millis());
            if let Err(e) = self.prefs.save_last_updated(timestamp).await {
                warn!(error = %e, "Failed to persist last-updated timestamp");
                self.last_error = Some(RefreshError::StoreUnavailable(e));
            } else {
                info!(count = update.rates.len(), "Refreshed rate cache");
            }
        }

        self.all_rates.extend(update.rates);
    }

    async fn rebuild_cache(&self, rates: &[CurrencyRate]) -> Result<(), StoreError> {
        self.rates.clear().await?;
        for rate in rates {
            self.rates.insert(rate.clone()).await?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
