//! Durable storage for the cached rate snapshot.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::models::CurrencyRate;
use crate::subscription::Subscription;

use super::StoreError;

/// Rate snapshot file name in the cache directory.
const RATES_FILE: &str = "rates.json";

/// Durable record store for the cached rate snapshot.
///
/// `read_all` is the one-shot first value of the observable read; `watch`
/// registers a long-lived subscription that sees every mutation. The
/// snapshot is either empty or a complete set from a single fetch; the
/// caller owns that invariant through its clear-then-insert sequence.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn insert(&self, rate: CurrencyRate) -> Result<(), StoreError>;
    async fn read_all(&self) -> Result<Vec<CurrencyRate>, StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
    fn watch(&self) -> Subscription<Vec<CurrencyRate>>;
}

/// JSON-file-backed [`RateStore`].
pub struct JsonRateStore {
    path: PathBuf,
    rates: Mutex<Vec<CurrencyRate>>,
    publisher: watch::Sender<Vec<CurrencyRate>>,
}

impl JsonRateStore {
    /// Open the store under `cache_dir`, loading any persisted snapshot.
    pub fn open(cache_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(cache_dir)?;
        let path = cache_dir.join(RATES_FILE);

        let rates: Vec<CurrencyRate> = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Vec::new()
        };
        debug!(count = rates.len(), "Loaded rate snapshot");

        let (publisher, _) = watch::channel(rates.clone());
        Ok(Self {
            path,
            rates: Mutex::new(rates),
            publisher,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<CurrencyRate>>, StoreError> {
        self.rates
            .lock()
            .map_err(|_| StoreError::Unavailable("rate store lock poisoned".to_string()))
    }

    fn persist(&self, rates: &[CurrencyRate]) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(rates)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[async_trait]
impl RateStore for JsonRateStore {
    async fn insert(&self, rate: CurrencyRate) -> Result<(), StoreError> {
        let snapshot = {
            let mut rates = self.lock()?;
            rates.push(rate);
            rates.clone()
        };
        self.persist(&snapshot)?;
        self.publisher.send_replace(snapshot);
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<CurrencyRate>, StoreError> {
        Ok(self.lock()?.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let snapshot = {
            let mut rates = self.lock()?;
            rates.clear();
            rates.clone()
        };
        self.persist(&snapshot)?;
        self.publisher.send_replace(snapshot);
        Ok(())
    }

    fn watch(&self) -> Subscription<Vec<CurrencyRate>> {
        Subscription::new(self.publisher.subscribe())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rate(code: &str, value: f64) -> CurrencyRate {
        CurrencyRate {
            code: code.to_string(),
            value,
        }
    }

    #[tokio::test]
    async fn insert_and_read_all() {
        let dir = TempDir::new().unwrap();
        let store = JsonRateStore::open(dir.path()).unwrap();

        store.insert(rate("USD", 1.0)).await.unwrap();
        store.insert(rate("EUR", 0.92)).await.unwrap();

        let all = store.read_all().await.unwrap();
        assert_eq!(all, vec![rate("USD", 1.0), rate("EUR", 0.92)]);
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = JsonRateStore::open(dir.path()).unwrap();
            store.insert(rate("GBP", 0.79)).await.unwrap();
        }

        let reopened = JsonRateStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read_all().await.unwrap(), vec![rate("GBP", 0.79)]);
    }

    #[tokio::test]
    async fn clear_empties_store_and_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonRateStore::open(dir.path()).unwrap();
        store.insert(rate("USD", 1.0)).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.read_all().await.unwrap().is_empty());

        let reopened = JsonRateStore::open(dir.path()).unwrap();
        assert!(reopened.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn watch_observes_mutations() {
        let dir = TempDir::new().unwrap();
        let store = JsonRateStore::open(dir.path()).unwrap();

        let mut sub = store.watch();
        assert!(sub.current().is_empty());

        store.insert(rate("JPY", 150.0)).await.unwrap();
        assert_eq!(sub.next().await.unwrap(), vec![rate("JPY", 150.0)]);

        store.clear().await.unwrap();
        assert!(sub.next().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_dir_reads_as_empty_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = JsonRateStore::open(dir.path()).unwrap();
        assert!(store.read_all().await.unwrap().is_empty());
    }
}
