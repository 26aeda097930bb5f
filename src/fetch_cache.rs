// src/fetch_cache.rs
// Keyed TTL cache with exponential-backoff retry and stale-on-failure
// fallback. Every remote feed in the SDK goes through one of these.
//
// The cache is an owned, injectable object (no process-wide globals) so tests
// and embedders control its lifetime. Backoff sleeps are tokio suspensions:
// callers on other keys are never blocked, and a caller that wants a deadline
// can race `get_or_fetch` against `tokio::time::timeout` — the cache is only
// written after a fetch completes, so dropping the future cannot publish a
// half-done result.

use crate::errors::{SdkError, SdkResult};
use dashmap::DashMap;
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Retry schedule for a failed fetch: delay after attempt `i` (0-indexed) is
/// `min(base_delay * 2^i, max_delay)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// One cached value. Overwritten whole on refresh, never partially updated.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub timestamp: Instant,
    pub data: T,
}

/// A fetch result with an explicit staleness flag. Stale data is returned as
/// the same structured value as fresh data; callers decide how to warn.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub data: T,
    pub stale: bool,
    pub fetched_at: Instant,
}

/// TTL cache wrapping a remote fetch.
///
/// Entries live until superseded by key; there is no size-based eviction.
/// `invalidate` drops a single key explicitly.
pub struct FetchCache<T: Clone> {
    entries: DashMap<String, CacheEntry<T>>,
    // Per-key refresh mutex: concurrent callers for one key collapse into a
    // single upstream fetch; unrelated keys stay independent.
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
    ttl: Duration,
    policy: RetryPolicy,
}

impl<T: Clone> FetchCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_policy(ttl, RetryPolicy::default())
    }

    pub fn with_policy(ttl: Duration, policy: RetryPolicy) -> Self {
        Self {
            entries: DashMap::new(),
            refresh_locks: DashMap::new(),
            ttl,
            policy,
        }
    }

    /// Return the cached value for `key` if fresh, otherwise fetch it with
    /// retries. After retries are exhausted a stale entry of any age is
    /// served with `stale: true`; with no entry at all the result is
    /// `Unavailable`.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetcher: F) -> SdkResult<Fetched<T>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(hit) = self.fresh(key) {
            return Ok(hit);
        }

        let lock = self
            .refresh_locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another caller may have refreshed while we waited on the lock.
        if let Some(hit) = self.fresh(key) {
            return Ok(hit);
        }

        let attempts = self.policy.retries.max(1);
        for attempt in 0..attempts {
            match fetcher().await {
                Ok(data) => {
                    let now = Instant::now();
                    self.entries.insert(
                        key.to_string(),
                        CacheEntry {
                            timestamp: now,
                            data: data.clone(),
                        },
                    );
                    debug!("refreshed cache entry '{}'", key);
                    return Ok(Fetched {
                        data,
                        stale: false,
                        fetched_at: now,
                    });
                }
                Err(err) => {
                    warn!(
                        "fetch attempt {}/{} failed for '{}': {:#}",
                        attempt + 1,
                        attempts,
                        key,
                        err
                    );
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.policy.delay_for_attempt(attempt)).await;
                    }
                }
            }
        }

        if let Some(entry) = self.entries.get(key) {
            warn!(
                "serving stale cache for '{}' ({}s old)",
                key,
                entry.timestamp.elapsed().as_secs()
            );
            return Ok(Fetched {
                data: entry.data.clone(),
                stale: true,
                fetched_at: entry.timestamp,
            });
        }

        Err(SdkError::Unavailable {
            key: key.to_string(),
            attempts,
        })
    }

    /// Drop the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Prime an entry directly (tests, warm starts).
    pub fn insert(&self, key: &str, data: T) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                timestamp: Instant::now(),
                data,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fresh(&self, key: &str) -> Option<Fetched<T>> {
        self.entries.get(key).and_then(|entry| {
            if entry.timestamp.elapsed() < self.ttl {
                Some(Fetched {
                    data: entry.data.clone(),
                    stale: false,
                    fetched_at: entry.timestamp,
                })
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetcher(
        calls: Arc<AtomicUsize>,
        result: anyhow::Result<u64>,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = anyhow::Result<u64>> + Send>> {
        let result = Arc::new(result);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let result = Arc::clone(&result);
            Box::pin(async move {
                match result.as_ref() {
                    Ok(v) => Ok(*v),
                    Err(e) => Err(anyhow::anyhow!("{e}")),
                }
            })
        }
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
        // Capped, never overflowing.
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(60), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_fresh_hit_skips_fetcher() {
        let cache: FetchCache<u64> = FetchCache::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_fetch("pools", counting_fetcher(Arc::clone(&calls), Ok(7)))
            .await
            .unwrap();
        assert_eq!(first.data, 7);
        assert!(!first.stale);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Within TTL: zero additional invocations.
        let second = cache
            .get_or_fetch("pools", counting_fetcher(Arc::clone(&calls), Ok(7)))
            .await
            .unwrap();
        assert_eq!(second.data, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_without_entry_is_unavailable() {
        let cache: FetchCache<u64> = FetchCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let err = cache
            .get_or_fetch(
                "pools",
                counting_fetcher(Arc::clone(&calls), Err(anyhow::anyhow!("http 500"))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Unavailable { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_with_entry_serves_stale() {
        let cache: FetchCache<u64> = FetchCache::new(Duration::from_millis(10));
        cache.insert("pools", 42);
        tokio::time::sleep(Duration::from_millis(50)).await; // let it expire

        let calls = Arc::new(AtomicUsize::new(0));
        let got = cache
            .get_or_fetch(
                "pools",
                counting_fetcher(Arc::clone(&calls), Err(anyhow::anyhow!("timeout"))),
            )
            .await
            .unwrap();
        assert!(got.stale);
        assert_eq!(got.data, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache: FetchCache<u64> = FetchCache::new(Duration::from_secs(300));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch("k", counting_fetcher(Arc::clone(&calls), Ok(1)))
            .await
            .unwrap();
        assert!(cache.invalidate("k"));
        assert!(!cache.invalidate("k"));

        cache
            .get_or_fetch("k", counting_fetcher(Arc::clone(&calls), Ok(2)))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_collapse_to_one_fetch() {
        let cache: Arc<FetchCache<u64>> = Arc::new(FetchCache::new(Duration::from_secs(300)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch("shared", move || {
                        let calls = Arc::clone(&calls);
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(99u64)
                        }
                    })
                    .await
            }));
        }
        for h in handles {
            let got = h.await.unwrap().unwrap();
            assert_eq!(got.data, 99);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_does_not_block_other_keys() {
        let cache: Arc<FetchCache<u64>> = Arc::new(FetchCache::new(Duration::from_secs(300)));

        // Kick off a failing fetch that will sit in backoff sleeps.
        let slow = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .get_or_fetch("failing", || async { Err(anyhow::anyhow!("down")) })
                    .await
            })
        };

        // An unrelated key resolves while the other is mid-backoff.
        let fast = cache
            .get_or_fetch("healthy", || async { Ok(5u64) })
            .await
            .unwrap();
        assert_eq!(fast.data, 5);

        let err = slow.await.unwrap().unwrap_err();
        assert!(matches!(err, SdkError::Unavailable { .. }));
    }
}
