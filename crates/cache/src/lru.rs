//! Deduplicating, order-preserving LRU cache.
//!
//! All state of one cache lives behind a single mutex:
//!
//! - `entries`: cached values in recency order, least recently used at the
//!   head.
//! - `requests`: a [`Rectifier`] holding every in-flight fetch in the order
//!   it was requested.
//! - `waiters`: per key, the callers waiting for that fetch, in arrival
//!   order.
//! - `expiry`: insertion timestamps, present only for timed caches.
//!
//! The lock is only held for synchronous transitions; fetches run as Tokio
//! tasks and report back through [`Settle`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use orderly_common::{CacheKey, KeyedQueue, QueueError};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, field, instrument, warn, Span};

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult, ConfigError, ProducerError};
use crate::rectifying::{Completion, Rectifier};
use crate::stats::{CacheStats, MetricsCollector};
use crate::task::{self, Settle};
use crate::timed::Expiry;

type KeyFn<A> = Arc<dyn Fn(&A) -> CacheKey + Send + Sync>;
type FetchFn<A, V, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<V, E>> + Send + Sync>;
type Waiter<V, E> = oneshot::Sender<CacheResult<V, E>>;

struct CacheState<V, E> {
    entries: KeyedQueue<CacheKey, V>,
    requests: Rectifier<V, CacheError<E>>,
    waiters: HashMap<CacheKey, Vec<Waiter<V, E>>>,
    expiry: Option<Expiry>,
}

impl<V, E> CacheState<V, E> {
    fn purge_expired(&mut self, metrics: &MetricsCollector) {
        let Some(expiry) = self.expiry.as_mut() else {
            return;
        };
        for key in expiry.take_expired() {
            if self.entries.remove_by_key(&key).is_ok() {
                metrics.record_expiration();
                debug!(%key, "expired entry");
            }
        }
    }
}

struct Shared<V, E> {
    state: Mutex<CacheState<V, E>>,
    capacity: usize,
    label: String,
    metrics: MetricsCollector,
}

enum Lookup<V, E> {
    Hit(V),
    Miss { receiver: oneshot::Receiver<CacheResult<V, E>>, started: bool },
}

impl<V, E> Shared<V, E>
where
    V: Clone,
    E: Clone,
{
    fn lookup(&self, key: &CacheKey) -> CacheResult<Lookup<V, E>, E> {
        let mut state = self.state.lock();
        state.purge_expired(&self.metrics);

        if state.entries.has_key(key) {
            let value = state.entries.promote(key)?.clone();
            self.metrics.record_hit();
            debug!("cache hit");
            return Ok(Lookup::Hit(value));
        }
        self.metrics.record_miss();

        // Register before accepting so a completion released by the
        // acceptance itself still reaches this caller.
        let (sender, receiver) = oneshot::channel();
        state.waiters.entry(key.clone()).or_default().push(sender);

        let acceptance = match state.requests.accept(Some(key.clone())) {
            Ok(acceptance) => acceptance,
            Err(error) => {
                if let Some(waiters) = state.waiters.get_mut(key) {
                    waiters.pop();
                    if waiters.is_empty() {
                        state.waiters.remove(key);
                    }
                }
                return Err(error.into());
            }
        };

        if acceptance.started {
            self.metrics.record_fetch();
            debug!("cache miss, fetching");
        } else {
            self.metrics.record_deduplicated();
            debug!("cache miss, joining in-flight fetch");
        }
        self.complete(&mut state, acceptance.ready);
        Ok(Lookup::Miss { receiver, started: acceptance.started })
    }

    /// Applies released completions in order: store successes, then answer
    /// every waiter of the key.
    fn complete(&self, state: &mut CacheState<V, E>, ready: Vec<Completion<V, CacheError<E>>>) {
        for Completion { key, result } in ready {
            let waiters = state.waiters.remove(&key).unwrap_or_default();
            let outcome = match result {
                Ok(value) => match self.insert(state, &key, value.clone()) {
                    Ok(()) => Ok(value),
                    Err(error) => {
                        error!(%key, %error, "failed to store fetched value");
                        Err(CacheError::Queue(error))
                    }
                },
                Err(error) => Err(error),
            };
            debug!(%key, waiters = waiters.len(), ok = outcome.is_ok(), "request completed");
            for waiter in waiters {
                // A dropped receiver means the caller stopped waiting.
                let _ = waiter.send(outcome.clone());
            }
        }
    }

    fn insert(&self, state: &mut CacheState<V, E>, key: &CacheKey, value: V) -> Result<(), QueueError> {
        state.purge_expired(&self.metrics);

        if state.entries.has_key(key) {
            *state.entries.promote(key)? = value;
        } else {
            state.entries.enqueue(key.clone(), value)?;
        }
        if let Some(expiry) = state.expiry.as_mut() {
            expiry.touch(key)?;
        }
        self.metrics.record_insert();

        while state.entries.len() > self.capacity {
            let (evicted, _) = state.entries.dequeue()?;
            if let Some(expiry) = state.expiry.as_mut() {
                expiry.forget(&evicted);
            }
            self.metrics.record_eviction();
            debug!(key = %evicted, "evicted least recently used entry");
        }
        Ok(())
    }

    fn len(&self) -> usize {
        let mut state = self.state.lock();
        state.purge_expired(&self.metrics);
        state.entries.len()
    }
}

impl<V, E> Settle for Shared<V, E>
where
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Token = CacheKey;
    type Output = V;
    type Error = E;

    fn settle(&self, key: CacheKey, result: Result<V, ProducerError<E>>) {
        let result = result.map_err(CacheError::from);
        if let Err(error) = &result {
            self.metrics.record_fetch_failure();
            warn!(cache = %self.label, %key, kind = error.kind(), "fetch failed");
        }

        let mut state = self.state.lock();
        match state.requests.settle(&key, result) {
            Ok(ready) => {
                self.complete(&mut state, ready);
                state.requests.notify_idle();
            }
            Err(error) => error!(cache = %self.label, %key, %error, "settled an unknown request"),
        }
    }
}

/// Least-recently-used cache in front of an asynchronous fetch function.
///
/// - Concurrent `get`s for a key that is neither cached nor being fetched
///   start exactly one fetch; every caller receives its result.
/// - Results are delivered and stored in the order their keys were first
///   requested, so a slow fetch holds back later ones that finished sooner.
/// - Failures reach every waiting caller and are never cached.
///
/// `A` are the fetch arguments, `V` the cached value and `E` the fetch error.
/// Cloning the cache yields another handle to the same state.
///
/// The expiration window of the configuration is ignored here; use
/// [`TimedLruCache`](crate::TimedLruCache) for expiring entries.
///
/// # Examples
///
/// ```
/// use orderly_cache::{CacheConfig, CacheKey, LruCache};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = LruCache::new(
///     CacheConfig::lru(2),
///     |id: &u32| CacheKey::from(*id),
///     |id: u32| async move { Ok::<_, String>(format!("user-{id}")) },
/// )
/// .unwrap();
///
/// assert_eq!(cache.get(7).await.unwrap(), "user-7");
/// assert!(cache.contains(&7));
/// # }
/// ```
pub struct LruCache<A, V, E> {
    shared: Arc<Shared<V, E>>,
    key_fn: KeyFn<A>,
    fetch: FetchFn<A, V, E>,
}

impl<A, V, E> Clone for LruCache<A, V, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            key_fn: Arc::clone(&self.key_fn),
            fetch: Arc::clone(&self.fetch),
        }
    }
}

impl<A, V, E> LruCache<A, V, E>
where
    V: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates a cache from a validated configuration, a key function and a
    /// fetch function.
    pub fn new<K, F, Fut>(config: CacheConfig, key_fn: K, fetch: F) -> Result<Self, ConfigError>
    where
        K: Fn(&A) -> CacheKey + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        config.validate()?;
        Ok(Self::build(&config, None, key_fn, fetch))
    }

    pub(crate) fn build<K, F, Fut>(
        config: &CacheConfig,
        expiry: Option<Expiry>,
        key_fn: K,
        fetch: F,
    ) -> Self
    where
        K: Fn(&A) -> CacheKey + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let state = CacheState {
            entries: KeyedQueue::new(),
            requests: Rectifier::new(),
            waiters: HashMap::new(),
            expiry,
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                capacity: config.capacity,
                label: config.label().to_owned(),
                metrics: MetricsCollector::new(config.track_metrics),
            }),
            key_fn: Arc::new(key_fn),
            fetch: Arc::new(move |args| fetch(args).boxed()),
        }
    }

    /// Returns the value for `args`, fetching it if it is not cached.
    ///
    /// A hit marks the entry most recently used. A miss waits for the
    /// in-flight fetch of the same key, or starts one. Must be called from
    /// within a Tokio runtime.
    #[instrument(
        level = "debug",
        skip(self, args),
        fields(cache = %self.shared.label, key = field::Empty)
    )]
    pub async fn get(&self, args: A) -> CacheResult<V, E> {
        let key = (self.key_fn)(&args);
        Span::current().record("key", field::display(&key));

        let receiver = match self.shared.lookup(&key)? {
            Lookup::Hit(value) => return Ok(value),
            Lookup::Miss { receiver, started } => {
                if started {
                    task::spawn_settled(Arc::clone(&self.shared), key, || (self.fetch)(args));
                }
                receiver
            }
        };

        receiver.await.unwrap_or(Err(CacheError::Abandoned))
    }

    /// Drops every cached entry.
    ///
    /// In-flight fetches are not cancelled and still store their results.
    pub fn clear(&self) {
        let mut state = self.shared.state.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        if let Some(expiry) = state.expiry.as_mut() {
            expiry.clear();
        }
        debug!(cache = %self.shared.label, dropped, "cleared cache");
    }

    /// Resolves once no fetch is in flight.
    ///
    /// Requests made after that moment are not covered.
    pub async fn wait_requests_finished(&self) {
        let (waiter, idle) = oneshot::channel();
        self.shared.state.lock().requests.on_idle(waiter);
        let _ = idle.await;
    }

    /// Returns `true` while at least one fetch is in flight or awaiting
    /// ordered delivery.
    pub fn has_pending_requests(&self) -> bool {
        !self.shared.state.lock().requests.is_empty()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Returns `true` when no entry is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Returns `true` if a live entry exists for `args`, without touching its
    /// recency.
    pub fn contains(&self, args: &A) -> bool {
        let key = (self.key_fn)(args);
        let mut state = self.shared.state.lock();
        state.purge_expired(&self.shared.metrics);
        state.entries.has_key(&key)
    }

    /// Snapshot of the cached keys, most recently used first.
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut state = self.shared.state.lock();
        state.purge_expired(&self.shared.metrics);
        state.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        self.shared.metrics.snapshot(self.len(), self.shared.capacity)
    }

    /// Resets all counters to zero.
    pub fn reset_stats(&self) {
        self.shared.metrics.reset();
    }
}
