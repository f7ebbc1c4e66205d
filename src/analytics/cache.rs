//! Time-bounded cache for the analytics dataset.
//!
//! There is exactly one dataset, so the cache is a single slot holding the
//! rows and the instant they were fetched. The slot is guarded by an async
//! mutex that stays locked across a refill: concurrent page loads on a cold
//! cache wait for one query instead of issuing their own.

use crate::error::DashboardError;
use crate::models::AnalyticsRow;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug)]
struct CachedRows {
    fetched_at: Instant,
    rows: Arc<Vec<AnalyticsRow>>,
}

#[derive(Debug)]
pub struct AnalyticsCache {
    ttl: Duration,
    slot: Mutex<Option<CachedRows>>,
}

impl AnalyticsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached rows, or run `fetch` and cache its result.
    ///
    /// Errors are passed through and never cached.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Arc<Vec<AnalyticsRow>>, DashboardError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<AnalyticsRow>, DashboardError>>,
    {
        self.get_or_fetch_at(Instant::now(), fetch).await
    }

    pub(crate) async fn get_or_fetch_at<F, Fut>(
        &self,
        now: Instant,
        fetch: F,
    ) -> Result<Arc<Vec<AnalyticsRow>>, DashboardError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<AnalyticsRow>, DashboardError>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            let age = now.saturating_duration_since(cached.fetched_at);
            if age < self.ttl {
                debug!(age_secs = age.as_secs(), rows = cached.rows.len(), "Analytics cache hit");
                return Ok(Arc::clone(&cached.rows));
            }
            info!(age_secs = age.as_secs(), "Analytics cache expired");
        }

        let rows = Arc::new(fetch().await?);
        info!(rows = rows.len(), ttl_secs = self.ttl.as_secs(), "Analytics cache refilled");
        *slot = Some(CachedRows {
            fetched_at: now,
            rows: Arc::clone(&rows),
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rows(users: u64) -> Vec<AnalyticsRow> {
        vec![AnalyticsRow {
            date: NaiveDate::from_ymd_opt(2024, 12, 2).unwrap(),
            path: "/jp/blog/p1".to_string(),
            users,
        }]
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = AnalyticsCache::new(Duration::from_secs(3600));
        let calls = AtomicUsize::new(0);
        let t0 = Instant::now();

        let first = cache
            .get_or_fetch_at(t0, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(rows(1))
            })
            .await
            .unwrap();
        let second = cache
            .get_or_fetch_at(t0 + Duration::from_secs(3599), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(rows(2))
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(second[0].users, 1);
    }

    #[tokio::test]
    async fn test_refetch_after_ttl() {
        let cache = AnalyticsCache::new(Duration::from_secs(3600));
        let t0 = Instant::now();

        cache.get_or_fetch_at(t0, || async { Ok(rows(1)) }).await.unwrap();
        let refreshed = cache
            .get_or_fetch_at(t0 + Duration::from_secs(3600), || async { Ok(rows(2)) })
            .await
            .unwrap();

        assert_eq!(refreshed[0].users, 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = AnalyticsCache::new(Duration::from_secs(3600));
        let t0 = Instant::now();

        let failed = cache
            .get_or_fetch_at(t0, || async {
                Err(DashboardError::Connection("unreachable".to_string()))
            })
            .await;
        assert!(failed.is_err());

        let recovered = cache
            .get_or_fetch_at(t0 + Duration::from_secs(1), || async { Ok(rows(3)) })
            .await
            .unwrap();
        assert_eq!(recovered[0].users, 3);
    }

    #[tokio::test]
    async fn test_expired_rows_not_served_when_refill_fails() {
        let cache = AnalyticsCache::new(Duration::from_secs(10));
        let t0 = Instant::now();

        cache.get_or_fetch_at(t0, || async { Ok(rows(1)) }).await.unwrap();
        let failed = cache
            .get_or_fetch_at(t0 + Duration::from_secs(20), || async {
                Err(DashboardError::Connection("down".to_string()))
            })
            .await;
        assert!(failed.is_err());
    }
}
