//! Shared helpers for the cache integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use orderly_cache::{CacheConfig, CacheKey, LruCache};
use parking_lot::Mutex;
use tracing_subscriber::fmt::fmt;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orderly_cache=debug")),
        )
        .with_target(false)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Fetch function double that records every request it serves.
#[derive(Clone, Default)]
pub struct Supplier {
    requests: Arc<Mutex<Vec<i64>>>,
    latency: Duration,
}

impl Supplier {
    pub fn new(latency: Duration) -> Self {
        Self { requests: Arc::default(), latency }
    }

    /// Records `value` immediately, then resolves to it after the latency.
    pub fn supply(&self, value: i64) -> impl std::future::Future<Output = Result<i64, String>> + Send + 'static {
        self.requests.lock().push(value);
        let latency = self.latency;
        async move {
            tokio::time::sleep(latency).await;
            Ok(value)
        }
    }

    /// Every value requested so far, in request order.
    pub fn requests(&self) -> Vec<i64> {
        self.requests.lock().clone()
    }

    /// LRU cache keyed by `x * 10` that fetches through this supplier.
    pub fn lru(&self, capacity: usize) -> LruCache<i64, i64, String> {
        let supplier = self.clone();
        LruCache::new(
            CacheConfig::builder().capacity(capacity).track_metrics(true).build(),
            |x: &i64| CacheKey::from(x * 10),
            move |x: i64| supplier.supply(x),
        )
        .expect("valid test config")
    }
}

/// Resolves to `value` after `millis` of (paused) Tokio time.
pub async fn delayed<E>(millis: u64, value: i64) -> Result<i64, E> {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Ok(value)
}
