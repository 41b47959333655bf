//! TTL-gated status snapshot.
//!
//! Refresh is lazy: a fetch is issued only when a caller finds the cache
//! empty or older than the TTL. The lock is never held across the fetch, so
//! callers arriving together after expiry may each refetch. A failed fetch
//! leaves the previous snapshot in place. A `Duration::ZERO` TTL disables
//! caching.

use aoi_types::{AoiResult, Status};
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default snapshot lifetime.
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(5);

struct CachedStatus {
    status: Arc<Status>,
    fetched_at: Instant,
}

/// Shared, TTL-gated [`Status`] snapshot.
pub struct StatusCache {
    ttl: Duration,
    entry: RwLock<Option<CachedStatus>>,
}

impl StatusCache {
    /// Create an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached snapshot if it is still fresh.
    pub fn fresh(&self) -> Option<Arc<Status>> {
        if self.ttl.is_zero() {
            return None;
        }
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        entry
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.status))
    }

    /// The last successful snapshot, fresh or not.
    pub fn last(&self) -> Option<Arc<Status>> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        entry.as_ref().map(|cached| Arc::clone(&cached.status))
    }

    /// Store a freshly fetched snapshot.
    pub fn store(&self, status: Status) -> Arc<Status> {
        let status = Arc::new(status);
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *entry = Some(CachedStatus {
            status: Arc::clone(&status),
            fetched_at: Instant::now(),
        });
        status
    }

    /// Drop the cached snapshot so the next caller refetches.
    pub fn invalidate(&self) {
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *entry = None;
    }

    /// Return the fresh snapshot, or run `fetch` and cache its result.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> AoiResult<Arc<Status>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AoiResult<Status>>,
    {
        if let Some(status) = self.fresh() {
            return Ok(status);
        }
        debug!(ttl_ms = self.ttl.as_millis() as u64, "Status cache stale, fetching");
        let status = fetch().await?;
        Ok(self.store(status))
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aoi_types::AoiError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn status(state: &str) -> Status {
        Status {
            backend_state: state.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetches_once_within_ttl() {
        let cache = StatusCache::new(Duration::from_secs(60));
        let fetches = AtomicUsize::new(0);

        for _ in 0..3 {
            let s = cache
                .get_or_fetch(|| async {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(status("Running"))
                })
                .await
                .unwrap();
            assert_eq!(s.backend_state, "Running");
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refetches_after_expiry() {
        let cache = StatusCache::new(Duration::from_millis(5));
        cache.store(status("Starting"));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let s = cache
            .get_or_fetch(|| async { Ok(status("Running")) })
            .await
            .unwrap();
        assert_eq!(s.backend_state, "Running");
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_snapshot() {
        let cache = StatusCache::new(Duration::from_millis(5));
        cache.store(status("Running"));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let result = cache
            .get_or_fetch(|| async { Err(AoiError::Connection("refused".into())) })
            .await;
        assert!(matches!(result, Err(AoiError::Connection(_))));
        assert_eq!(cache.last().unwrap().backend_state, "Running");
    }

    #[tokio::test]
    async fn test_zero_ttl_always_fetches() {
        let cache = StatusCache::new(Duration::ZERO);
        let fetches = AtomicUsize::new(0);
        for _ in 0..2 {
            cache
                .get_or_fetch(|| async {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(status("Running"))
                })
                .await
                .unwrap();
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalidate() {
        let cache = StatusCache::default();
        cache.store(status("Running"));
        assert!(cache.fresh().is_some());
        cache.invalidate();
        assert!(cache.fresh().is_none());
        assert!(cache.last().is_none());
    }
}
