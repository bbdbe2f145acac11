//! Staleness-gated refresh and local cache pipeline for currency
//! exchange rates.
//!
//! The crate keeps three copies of a small, slowly-changing reference
//! dataset in sync: a remote source of truth (currencyapi.com), a durable
//! local cache, and the in-memory view a UI shell renders. The pipeline
//! reuses cached rates while they were fetched on the current local
//! calendar day and refreshes them over the network otherwise.
//!
//! Components, leaf to root:
//!
//! - [`freshness`]: day-granularity staleness policy
//! - [`store`]: durable rate snapshot and preference storage behind
//!   injectable trait seams
//! - [`api`]: the rate fetcher and its HTTP implementation
//! - [`coordinator`]: `ensure_fresh`, the staleness-gated refresh pass
//! - [`view`]: resolved currency selections for the shell
//!
//! Store and network failures never escape the coordinator; the shell is
//! only ever shown a status enum, a "currency not found" resolution, or
//! previously cached data.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod freshness;
pub mod models;
pub mod store;
pub mod subscription;
pub mod view;

pub use api::{ApiError, CurrencyApiClient, RateFetcher, RateUpdate};
pub use config::Config;
pub use coordinator::{RefreshCoordinator, RefreshError};
pub use models::{convert, CurrencyRate, CurrencySlot, RateStatus};
pub use store::{
    JsonKeyValueStore, JsonRateStore, KeyValueStore, Preferences, RateStore, StoreError,
};
pub use subscription::Subscription;
pub use view::{RequestState, ViewState};
