//! Durable preference storage and the domain facade over it.
//!
//! `KeyValueStore` is the opaque settings seam: typed getters with
//! caller-supplied defaults, typed putters, and observable variants of the
//! getters. `Preferences` fixes the pipeline's keys and defaults on top of
//! it: the last-refresh timestamp and the selected source/target currency
//! codes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::freshness;
use crate::models::CurrencySlot;
use crate::subscription::Subscription;

use super::StoreError;

/// Preference file name in the cache directory.
const PREFS_FILE: &str = "prefs.json";

/// Preference key for the epoch-millis timestamp of the last refresh.
pub const TIMESTAMP_KEY: &str = "lastUpdated";

/// Preference key for the user-selected source currency code.
pub const SOURCE_CURRENCY_KEY: &str = "sourceCurrency";

/// Preference key for the user-selected target currency code.
pub const TARGET_CURRENCY_KEY: &str = "targetCurrency";

/// Default source currency until the user picks one.
pub const DEFAULT_SOURCE_CURRENCY: &str = "USD";

/// Default target currency until the user picks one.
pub const DEFAULT_TARGET_CURRENCY: &str = "EUR";

/// Durable key-value store with observable readers.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_long(&self, key: &str, default: i64) -> Result<i64, StoreError>;
    async fn put_long(&self, key: &str, value: i64) -> Result<(), StoreError>;
    async fn get_string(&self, key: &str, default: &str) -> Result<String, StoreError>;
    async fn put_string(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn watch_long(&self, key: &str, default: i64) -> Subscription<i64>;
    fn watch_string(&self, key: &str, default: &str) -> Subscription<String>;
}

/// JSON-file-backed [`KeyValueStore`].
///
/// One object file holds every key; watch channels are created lazily per
/// key on first subscription.
pub struct JsonKeyValueStore {
    path: PathBuf,
    values: Mutex<HashMap<String, Value>>,
    long_watchers: Mutex<HashMap<String, watch::Sender<i64>>>,
    string_watchers: Mutex<HashMap<String, watch::Sender<String>>>,
}

impl JsonKeyValueStore {
    /// Open the store under `cache_dir`, loading any persisted values.
    pub fn open(cache_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(cache_dir)?;
        let path = cache_dir.join(PREFS_FILE);

        let values: HashMap<String, Value> = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
            long_watchers: Mutex::new(HashMap::new()),
            string_watchers: Mutex::new(HashMap::new()),
        })
    }

    fn lock_values(&self) -> Result<MutexGuard<'_, HashMap<String, Value>>, StoreError> {
        self.values
            .lock()
            .map_err(|_| StoreError::Unavailable("preference store lock poisoned".to_string()))
    }

    fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let snapshot = {
            let mut values = self.lock_values()?;
            values.insert(key.to_string(), value);
            values.clone()
        };
        let contents = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    fn notify_long(&self, key: &str, value: i64) {
        let watchers = self
            .long_watchers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(tx) = watchers.get(key) {
            tx.send_replace(value);
        }
    }

    fn notify_string(&self, key: &str, value: &str) {
        let watchers = self
            .string_watchers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(tx) = watchers.get(key) {
            tx.send_replace(value.to_string());
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonKeyValueStore {
    async fn get_long(&self, key: &str, default: i64) -> Result<i64, StoreError> {
        Ok(self
            .lock_values()?
            .get(key)
            .and_then(Value::as_i64)
            .unwrap_or(default))
    }

    async fn put_long(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.put(key, Value::from(value))?;
        self.notify_long(key, value);
        Ok(())
    }

    async fn get_string(&self, key: &str, default: &str) -> Result<String, StoreError> {
        Ok(self
            .lock_values()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| default.to_string()))
    }

    async fn put_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.put(key, Value::from(value))?;
        self.notify_string(key, value);
        Ok(())
    }

    fn watch_long(&self, key: &str, default: i64) -> Subscription<i64> {
        let current = self
            .values
            .lock()
            .ok()
            .and_then(|values| values.get(key).and_then(Value::as_i64))
            .unwrap_or(default);
        let mut watchers = self
            .long_watchers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let tx = watchers
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(current).0);
        Subscription::new(tx.subscribe())
    }

    fn watch_string(&self, key: &str, default: &str) -> Subscription<String> {
        let current = self
            .values
            .lock()
            .ok()
            .and_then(|values| {
                values
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| default.to_string());
        let mut watchers = self
            .string_watchers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let tx = watchers
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(current).0);
        Subscription::new(tx.subscribe())
    }
}

/// Domain facade over a [`KeyValueStore`]: fixed keys, defaults, and the
/// freshness check against the persisted timestamp.
pub struct Preferences<S> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn save_last_updated(&self, timestamp_millis: i64) -> Result<(), StoreError> {
        self.store.put_long(TIMESTAMP_KEY, timestamp_millis).await
    }

    pub async fn last_updated(&self) -> Result<i64, StoreError> {
        self.store
            .get_long(TIMESTAMP_KEY, freshness::UNSET_TIMESTAMP)
            .await
    }

    /// Whether the persisted snapshot is still fresh at `now_millis`.
    pub async fn is_data_fresh(&self, now_millis: i64) -> Result<bool, StoreError> {
        Ok(freshness::is_fresh(now_millis, self.last_updated().await?))
    }

    /// Persist the user's currency selection for one slot.
    pub async fn save_currency_code(
        &self,
        slot: CurrencySlot,
        code: &str,
    ) -> Result<(), StoreError> {
        self.store.put_string(Self::key(slot), code).await
    }

    pub async fn currency_code(&self, slot: CurrencySlot) -> Result<String, StoreError> {
        self.store
            .get_string(Self::key(slot), Self::default_code(slot))
            .await
    }

    pub fn watch_currency_code(&self, slot: CurrencySlot) -> Subscription<String> {
        self.store
            .watch_string(Self::key(slot), Self::default_code(slot))
    }

    pub fn watch_last_updated(&self) -> Subscription<i64> {
        self.store
            .watch_long(TIMESTAMP_KEY, freshness::UNSET_TIMESTAMP)
    }

    fn key(slot: CurrencySlot) -> &'static str {
        match slot {
            CurrencySlot::Source => SOURCE_CURRENCY_KEY,
            CurrencySlot::Target => TARGET_CURRENCY_KEY,
        }
    }

    fn default_code(slot: CurrencySlot) -> &'static str {
        match slot {
            CurrencySlot::Source => DEFAULT_SOURCE_CURRENCY,
            CurrencySlot::Target => DEFAULT_TARGET_CURRENCY,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
