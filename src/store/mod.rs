//! Local persistence for rates and preferences.
//!
//! This module provides the two durable collaborator seams of the
//! pipeline and their file-backed reference implementations:
//!
//! - `RateStore` / `JsonRateStore`: the cached rate snapshot
//! - `KeyValueStore` / `JsonKeyValueStore`: durable preference storage
//! - `Preferences`: domain facade over the key-value store
//!
//! Both implementations persist pretty-printed JSON under the application
//! cache directory and publish every mutation to watch subscribers.

pub mod error;
pub mod prefs;
pub mod rates;

pub use error::StoreError;
pub use prefs::{JsonKeyValueStore, KeyValueStore, Preferences};
pub use rates::{JsonRateStore, RateStore};
