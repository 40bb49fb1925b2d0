//! Integration tests for `orderly_cache::TimedLruCache`.
//!
//! Expiry is measured with a `MockClock`, so the cache's notion of time is
//! advanced by hand while fetches resolve immediately.

mod support;

use std::time::Duration;

use orderly_cache::{CacheConfig, CacheKey, ConfigError, MockClock, TimedLruCache};
use support::Supplier;

fn timed_cache(
    supplier: &Supplier,
    clock: &MockClock,
    capacity: usize,
) -> TimedLruCache<i64, i64, String> {
    let supplier = supplier.clone();
    TimedLruCache::with_clock(
        CacheConfig::builder()
            .capacity(capacity)
            .expiration(Duration::from_millis(100))
            .name("timed")
            .track_metrics(true)
            .build(),
        clock.clone(),
        |x: &i64| CacheKey::from(*x),
        move |x: i64| supplier.supply(x),
    )
    .unwrap()
}

async fn assert_gets(cache: &TimedLruCache<i64, i64, String>, keys: &[i64]) {
    for &x in keys {
        assert_eq!(cache.get(x).await, Ok(x));
    }
}

/// Validates that hits do not extend an entry's lifetime.
///
/// Assertions:
/// - Confirms a hit at 50ms does not keep entry 2 alive at 150ms.
/// - Confirms the fetch pattern `[1, 2, 3, 3, 2, 1]`.
#[tokio::test(start_paused = true)]
async fn entries_expire_from_insertion_time() {
    support::init_tracing();
    let supplier = Supplier::new(Duration::ZERO);
    let clock = MockClock::new();
    let cache = timed_cache(&supplier, &clock, 100);

    assert_gets(&cache, &[1, 2, 3]).await;
    clock.advance_millis(50);
    assert_gets(&cache, &[2]).await;
    clock.advance_millis(100);
    assert_gets(&cache, &[3, 2, 1]).await;

    assert_eq!(supplier.requests(), vec![1, 2, 3, 3, 2, 1]);
}

/// Validates purging of mixed-age entries.
///
/// Assertions:
/// - Confirms only entries at least one window old are refetched.
/// - Confirms the fetch pattern `[1, 2, 3, 1, 2, 4, 3]`.
#[tokio::test(start_paused = true)]
async fn only_stale_entries_are_refetched() {
    let supplier = Supplier::new(Duration::ZERO);
    let clock = MockClock::new();
    let cache = timed_cache(&supplier, &clock, 100);

    assert_gets(&cache, &[1, 2]).await;
    clock.advance_millis(50);
    assert_gets(&cache, &[3]).await;
    clock.advance_millis(75);
    assert_gets(&cache, &[1, 2, 4, 3, 4]).await;
    clock.advance_millis(50);
    assert_gets(&cache, &[4, 3, 4]).await;

    assert_eq!(supplier.requests(), vec![1, 2, 3, 1, 2, 4, 3]);
    assert_eq!(cache.stats().expirations, 3);
}

/// Validates the exact expiration boundary.
///
/// Assertions:
/// - Confirms a hit strictly before the window ends.
/// - Confirms a miss exactly at the window.
#[tokio::test(start_paused = true)]
async fn expiration_boundary_is_inclusive() {
    let supplier = Supplier::new(Duration::ZERO);
    let clock = MockClock::new();
    let cache = timed_cache(&supplier, &clock, 10);

    cache.get(1).await.unwrap();
    clock.advance(Duration::from_millis(99));
    assert!(cache.contains(&1));
    clock.advance(Duration::from_millis(1));
    assert!(!cache.contains(&1));
    assert!(cache.is_empty());
}

/// Validates that eviction and expiry stay consistent.
///
/// Assertions:
/// - Confirms an evicted entry never resurfaces through the timing queue.
/// - Confirms `clear` drops timestamps along with entries.
#[tokio::test(start_paused = true)]
async fn eviction_and_clear_drop_timings() {
    let supplier = Supplier::new(Duration::ZERO);
    let clock = MockClock::new();
    let cache = timed_cache(&supplier, &clock, 2);

    assert_gets(&cache, &[1, 2, 3]).await;
    assert_eq!(cache.keys(), vec![CacheKey::from(3), CacheKey::from(2)]);

    cache.clear();
    assert_gets(&cache, &[5]).await;
    clock.advance_millis(100);
    assert_eq!(cache.len(), 0);

    let stats = cache.stats();
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.expirations, 1);
    assert_eq!(cache.expiration(), Duration::from_millis(100));
}

/// Validates that a window is required.
///
/// Assertions:
/// - Confirms `ConfigError::MissingExpiration` without a window.
#[test]
fn timed_cache_requires_a_window() {
    let result = TimedLruCache::new(
        CacheConfig::lru(3),
        |x: &i64| CacheKey::from(*x),
        |x: i64| async move { Ok::<_, String>(x) },
    );
    assert!(matches!(result, Err(ConfigError::MissingExpiration)));
}
