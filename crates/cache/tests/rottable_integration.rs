//! Integration tests for `orderly_cache::Rottable`.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use orderly_cache::{CacheError, MockClock, Rottable};

fn counting_rottable(
    clock: &MockClock,
    calls: &Arc<AtomicUsize>,
    fail_first: bool,
) -> Rottable<usize, String> {
    let calls = Arc::clone(calls);
    Rottable::with_clock(Duration::from_secs(1), clock.clone(), move || {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if fail_first && call == 0 {
                Err("cold start".to_string())
            } else {
                Ok(call)
            }
        }
    })
}

/// Validates lazy fetching and freshness.
///
/// Assertions:
/// - Confirms the value starts rotten and is fetched on first use.
/// - Confirms it is served from memory until the rotting time passes.
#[tokio::test(start_paused = true)]
async fn value_is_refetched_after_rotting() {
    support::init_tracing();
    let clock = MockClock::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let value = counting_rottable(&clock, &calls, false);

    assert!(!value.is_fresh());
    assert_eq!(value.get().await, Ok(0));
    clock.advance(Duration::from_secs(1));
    assert_eq!(value.get().await, Ok(0));
    assert!(value.is_fresh());

    clock.advance_millis(1);
    assert_eq!(value.get().await, Ok(1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(value.rotting_time(), Duration::from_secs(1));
}

/// Validates that concurrent refreshes share one fetch.
///
/// Assertions:
/// - Confirms four concurrent `get` calls fetch once.
#[tokio::test(start_paused = true)]
async fn concurrent_gets_share_one_fetch() {
    let clock = MockClock::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let value = counting_rottable(&clock, &calls, false);

    let results = join_all((0..4).map(|_| value.get())).await;
    assert!(results.iter().all(|result| *result == Ok(0)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Validates failure handling and invalidation.
///
/// Assertions:
/// - Confirms every waiter sees the failure and the next `get` retries.
/// - Confirms `invalidate` forces a refetch of a fresh value.
#[tokio::test(start_paused = true)]
async fn failures_are_retried_and_invalidate_refetches() {
    let clock = MockClock::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let value = counting_rottable(&clock, &calls, true);

    let results = join_all((0..2).map(|_| value.get())).await;
    for result in results {
        assert_eq!(result, Err(CacheError::Fetch("cold start".to_string())));
    }

    assert_eq!(value.get().await, Ok(1));
    value.invalidate();
    assert!(!value.is_fresh());
    assert_eq!(value.get().await, Ok(2));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

/// Validates a fetch function that panics before returning its future.
///
/// Assertions:
/// - Confirms the waiter observes `FetchPanicked`.
/// - Confirms the next `get` starts a fresh fetch instead of waiting forever.
#[tokio::test(start_paused = true)]
async fn fetch_panicking_before_its_future_is_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let value = Rottable::with_clock(Duration::from_secs(1), MockClock::new(), {
        let calls = Arc::clone(&calls);
        move || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            assert!(call > 0, "not warmed up");
            async move { Ok::<_, String>(call) }
        }
    });

    assert_eq!(value.get().await, Err(CacheError::FetchPanicked("not warmed up".to_string())));
    let retry = tokio::time::timeout(Duration::from_secs(1), value.get()).await;
    assert_eq!(retry.expect("rottable stalled after a panicking fetch"), Ok(1));
    assert!(value.is_fresh());
}
