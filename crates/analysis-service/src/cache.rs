use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use analysis_core::{AnalysisError, Period};
use dashmap::DashMap;
use tokio::sync::OnceCell;

/// Default time-to-live for cached reports
pub const CACHE_TTL_SECS: u64 = 300; // 5 minutes

/// Identifies one cached report. A new `data_version` from the provider
/// produces a new key, so stale inputs are never served.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub period: Option<Period>,
    pub data_version: u64,
}

impl CacheKey {
    pub fn new(symbol: &str, period: Option<Period>, data_version: u64) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            period,
            data_version,
        }
    }
}

/// Internal cache slot with creation time
struct Slot<V> {
    cell: OnceCell<Arc<V>>,
    created_at: Instant,
}

impl<V> Slot<V> {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cell.initialized() && self.created_at.elapsed() >= ttl
    }
}

/// Single-flight report cache.
///
/// Concurrent callers for the same key share one computation: the first
/// caller runs it, the rest await the same cell. Failed computations leave
/// nothing behind, so the next caller retries.
pub struct ReportCache<V> {
    slots: DashMap<CacheKey, Arc<Slot<V>>>,
    ttl: Duration,
}

impl<V> ReportCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
        }
    }

    pub async fn get_or_compute<F, Fut>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> Result<Arc<V>, AnalysisError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AnalysisError>>,
    {
        // The shard lock must be released before awaiting.
        let slot = {
            let mut entry = self
                .slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Slot::new()));
            if entry.is_expired(self.ttl) {
                tracing::debug!("Cache entry for {:?} expired", key);
                *entry = Arc::new(Slot::new());
            }
            Arc::clone(entry.value())
        };

        if let Some(value) = slot.cell.get() {
            tracing::debug!("Cache hit for {:?}", key);
            return Ok(Arc::clone(value));
        }

        tracing::debug!("Cache miss for {:?}", key);
        let result = slot
            .cell
            .get_or_try_init(|| async move { compute().await.map(Arc::new) })
            .await;

        match result {
            Ok(value) => Ok(Arc::clone(value)),
            Err(e) => {
                self.slots.remove_if(&key, |_, current| Arc::ptr_eq(current, &slot));
                Err(e)
            }
        }
    }

    /// Drops every entry for `symbol`, across periods and data versions.
    pub fn invalidate(&self, symbol: &str) {
        let symbol = symbol.trim().to_uppercase();
        self.slots.retain(|key, _| key.symbol != symbol);
    }

    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.slots.retain(|_, slot| !slot.is_expired(ttl));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<V> Default for ReportCache<V> {
    fn default() -> Self {
        Self::new(Duration::from_secs(CACHE_TTL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(symbol: &str) -> CacheKey {
        CacheKey::new(symbol, Some(Period::OneYear), 0)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_per_key() {
        let cache = Arc::new(ReportCache::<usize>::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(key("aapl"), || async move {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(calls.fetch_add(1, Ordering::SeqCst) + 42)
                    })
                    .await
            }));
        }

        for handle in handles {
            let value = handle.await.unwrap().unwrap();
            assert_eq!(*value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = ReportCache::<&'static str>::default();
        let a = cache.get_or_compute(key("AAPL"), || async { Ok("a") }).await.unwrap();
        let b = cache
            .get_or_compute(CacheKey::new("AAPL", Some(Period::OneMonth), 0), || async { Ok("b") })
            .await
            .unwrap();
        let c = cache
            .get_or_compute(CacheKey::new("AAPL", Some(Period::OneYear), 7), || async { Ok("c") })
            .await
            .unwrap();

        assert_eq!((*a, *b, *c), ("a", "b", "c"));
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn test_ttl_expiry_recomputes() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let compute = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<u8, AnalysisError>(1)
        };

        let fresh = ReportCache::new(Duration::from_secs(3600));
        fresh.get_or_compute(key("MSFT"), compute).await.unwrap();
        fresh.get_or_compute(key("MSFT"), compute).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let expiring = ReportCache::new(Duration::ZERO);
        expiring.get_or_compute(key("MSFT"), compute).await.unwrap();
        expiring.get_or_compute(key("MSFT"), compute).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        expiring.purge_expired();
        assert!(expiring.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = ReportCache::<u8>::default();

        let err = cache
            .get_or_compute(key("TSLA"), || async {
                Err(AnalysisError::Provider("upstream down".to_string()))
            })
            .await;
        assert!(err.is_err());
        assert!(cache.is_empty());

        let value = cache.get_or_compute(key("TSLA"), || async { Ok(9) }).await.unwrap();
        assert_eq!(*value, 9);
    }

    #[tokio::test]
    async fn test_invalidate_symbol() {
        let cache = ReportCache::<u8>::default();
        cache.get_or_compute(key("AAPL"), || async { Ok(1) }).await.unwrap();
        cache.get_or_compute(key("MSFT"), || async { Ok(2) }).await.unwrap();

        cache.invalidate("aapl");
        assert_eq!(cache.len(), 1);

        let value = cache.get_or_compute(key("AAPL"), || async { Ok(3) }).await.unwrap();
        assert_eq!(*value, 3);
    }
}
