//! LRU cache whose entries also expire after a fixed window.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use orderly_common::{CacheKey, Clock, KeyedQueue, QueueResult, SystemClock};

use crate::config::CacheConfig;
use crate::error::{CacheResult, ConfigError};
use crate::lru::LruCache;
use crate::stats::CacheStats;

/// Insertion timestamps in refresh order, oldest at the head.
pub(crate) struct Expiry {
    window: Duration,
    clock: Arc<dyn Clock>,
    timings: KeyedQueue<CacheKey, Instant>,
}

impl Expiry {
    pub(crate) fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { window, clock, timings: KeyedQueue::new() }
    }

    /// Removes and returns every key stored at least one window ago.
    ///
    /// Stops at the first key that is still fresh; later keys were stored
    /// after it.
    pub(crate) fn take_expired(&mut self) -> Vec<CacheKey> {
        let mut expired = Vec::new();
        loop {
            let stale = match self.timings.peek() {
                Ok((_, stored_at)) => self.clock.elapsed_since(*stored_at) >= self.window,
                Err(_) => false,
            };
            if !stale {
                break;
            }
            if let Ok((key, _)) = self.timings.dequeue() {
                expired.push(key);
            }
        }
        expired
    }

    /// Stamps `key` with the current time and moves it to the fresh end.
    pub(crate) fn touch(&mut self, key: &CacheKey) -> QueueResult<()> {
        let now = self.clock.now();
        if self.timings.has_key(key) {
            *self.timings.promote(key)? = now;
            Ok(())
        } else {
            self.timings.enqueue(key.clone(), now)
        }
    }

    pub(crate) fn forget(&mut self, key: &CacheKey) {
        // Absent keys are fine: the entry may have expired already.
        let _ = self.timings.remove_by_key(key);
    }

    pub(crate) fn clear(&mut self) {
        self.timings.clear();
    }
}

/// [`LruCache`] whose entries stop being served once they are older than the
/// configured expiration window.
///
/// Age is measured from the moment a fetched value is stored; cache hits do
/// not extend it. Expired entries are purged lazily, oldest first, before
/// every lookup and every insertion, and are indistinguishable from entries
/// that were never cached.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use orderly_cache::{CacheConfig, CacheKey, MockClock, TimedLruCache};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let clock = MockClock::new();
/// let cache = TimedLruCache::with_clock(
///     CacheConfig::timed(10, Duration::from_millis(100)),
///     clock.clone(),
///     |id: &u32| CacheKey::from(*id),
///     |id: u32| async move { Ok::<_, ()>(id * 2) },
/// )
/// .unwrap();
///
/// assert_eq!(cache.get(4).await, Ok(8));
/// clock.advance(Duration::from_millis(100));
/// assert!(!cache.contains(&4));
/// # }
/// ```
pub struct TimedLruCache<A, V, E> {
    inner: LruCache<A, V, E>,
    expiration: Duration,
}

impl<A, V, E> Clone for TimedLruCache<A, V, E> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), expiration: self.expiration }
    }
}

impl<A, V, E> TimedLruCache<A, V, E>
where
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates a timed cache measuring age with the system clock.
    ///
    /// Fails with [`ConfigError::MissingExpiration`] when the configuration
    /// has no expiration window.
    pub fn new<K, F, Fut>(config: CacheConfig, key_fn: K, fetch: F) -> Result<Self, ConfigError>
    where
        K: Fn(&A) -> CacheKey + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self::with_clock(config, SystemClock, key_fn, fetch)
    }

    /// Creates a timed cache measuring age with `clock`.
    pub fn with_clock<C, K, F, Fut>(
        config: CacheConfig,
        clock: C,
        key_fn: K,
        fetch: F,
    ) -> Result<Self, ConfigError>
    where
        C: Clock + 'static,
        K: Fn(&A) -> CacheKey + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        config.validate()?;
        let expiration = config.expiration.ok_or(ConfigError::MissingExpiration)?;
        let expiry = Expiry::new(expiration, Arc::new(clock));
        Ok(Self { inner: LruCache::build(&config, Some(expiry), key_fn, fetch), expiration })
    }

    /// Expiration window of every entry.
    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Returns the value for `args`, fetching it if it is missing or expired.
    pub async fn get(&self, args: A) -> CacheResult<V, E> {
        self.inner.get(args).await
    }

    /// Drops every cached entry and its timestamp.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Resolves once no fetch is in flight.
    pub async fn wait_requests_finished(&self) {
        self.inner.wait_requests_finished().await;
    }

    /// Returns `true` while at least one fetch is in flight.
    pub fn has_pending_requests(&self) -> bool {
        self.inner.has_pending_requests()
    }

    /// Number of live entries, after purging expired ones.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` when no live entry is cached.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Returns `true` if a live entry exists for `args`.
    pub fn contains(&self, args: &A) -> bool {
        self.inner.contains(args)
    }

    /// Snapshot of the live keys, most recently used first.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.inner.keys()
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    /// Resets all counters to zero.
    pub fn reset_stats(&self) {
        self.inner.reset_stats();
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for timed.
    use orderly_common::MockClock;

    use super::*;

    fn expiry(clock: &MockClock, window_ms: u64) -> Expiry {
        Expiry::new(Duration::from_millis(window_ms), Arc::new(clock.clone()))
    }

    /// Validates the expiry purge boundary scenario.
    ///
    /// Assertions:
    /// - Confirms an entry is kept strictly before one window has passed.
    /// - Confirms it is purged exactly at one window.
    #[test]
    fn test_expiry_boundary() {
        let clock = MockClock::new();
        let mut expiry = expiry(&clock, 100);
        expiry.touch(&CacheKey::from(1)).unwrap();

        clock.advance_millis(99);
        assert!(expiry.take_expired().is_empty());

        clock.advance_millis(1);
        assert_eq!(expiry.take_expired(), vec![CacheKey::from(1)]);
    }

    /// Validates the expiry refresh scenario.
    ///
    /// Assertions:
    /// - Confirms touching a key restamps it and moves it behind newer keys.
    #[test]
    fn test_expiry_touch_refreshes() {
        let clock = MockClock::new();
        let mut expiry = expiry(&clock, 100);
        expiry.touch(&CacheKey::from(1)).unwrap();
        clock.advance_millis(30);
        expiry.touch(&CacheKey::from(2)).unwrap();
        clock.advance_millis(30);
        expiry.touch(&CacheKey::from(1)).unwrap();

        clock.advance_millis(70);
        assert_eq!(expiry.take_expired(), vec![CacheKey::from(2)]);
        clock.advance_millis(30);
        assert_eq!(expiry.take_expired(), vec![CacheKey::from(1)]);
    }

    /// Validates the expiry forget scenario.
    ///
    /// Assertions:
    /// - Confirms forgotten and cleared keys never come back as expired.
    #[test]
    fn test_expiry_forget_and_clear() {
        let clock = MockClock::new();
        let mut expiry = expiry(&clock, 10);
        expiry.touch(&CacheKey::from(1)).unwrap();
        expiry.touch(&CacheKey::from(2)).unwrap();
        expiry.forget(&CacheKey::from(1));
        expiry.forget(&CacheKey::from(42));

        clock.advance_millis(10);
        assert_eq!(expiry.take_expired(), vec![CacheKey::from(2)]);

        expiry.touch(&CacheKey::from(3)).unwrap();
        expiry.clear();
        clock.advance_millis(10);
        assert!(expiry.take_expired().is_empty());
    }

    /// Validates the missing expiration scenario.
    ///
    /// Assertions:
    /// - Confirms a config without a window is rejected.
    #[test]
    fn test_missing_expiration_rejected() {
        let result = TimedLruCache::new(
            CacheConfig::lru(4),
            |x: &i64| CacheKey::from(*x),
            |x: i64| async move { Ok::<_, String>(x) },
        );
        assert!(matches!(result, Err(ConfigError::MissingExpiration)));
    }
}
