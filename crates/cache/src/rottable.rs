//! Single lazily fetched value that goes stale after a fixed time.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use orderly_common::{Clock, SystemClock};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult, ProducerError};
use crate::task::{self, Settle};

type Fetch<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

struct RotState<T, E> {
    stored: Option<(T, Instant)>,
    waiters: Vec<oneshot::Sender<CacheResult<T, E>>>,
}

struct Shared<T, E> {
    state: Mutex<RotState<T, E>>,
    rotting_time: Duration,
    clock: Arc<dyn Clock>,
}

impl<T, E> Settle for Shared<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Token = ();
    type Output = T;
    type Error = E;

    fn settle(&self, _token: (), result: Result<T, ProducerError<E>>) {
        let mut state = self.state.lock();
        let outcome = match result {
            Ok(value) => {
                state.stored = Some((value.clone(), self.clock.now()));
                Ok(value)
            }
            Err(error) => {
                let error = CacheError::from(error);
                warn!(kind = error.kind(), "rottable fetch failed");
                Err(error)
            }
        };
        let waiters = std::mem::take(&mut state.waiters);
        debug!(waiters = waiters.len(), ok = outcome.is_ok(), "rottable fetch settled");
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Lazily fetched value that is refetched once it is older than its rotting
/// time.
///
/// The value starts rotten. Concurrent `get`s on a rotten value share one
/// fetch. A failed fetch is reported to every waiter and leaves the value
/// rotten, so the next `get` tries again.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use orderly_cache::Rottable;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let token = Rottable::new(Duration::from_secs(60), || async { Ok::<_, String>("secret") });
/// assert_eq!(token.get().await, Ok("secret"));
/// # }
/// ```
pub struct Rottable<T, E> {
    shared: Arc<Shared<T, E>>,
    fetch: Fetch<T, E>,
}

impl<T, E> Clone for Rottable<T, E> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared), fetch: Arc::clone(&self.fetch) }
    }
}

impl<T, E> Rottable<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Creates a value that rots `rotting_time` after each successful fetch.
    pub fn new<F, Fut>(rotting_time: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::with_clock(rotting_time, SystemClock, fetch)
    }

    /// Same as [`Rottable::new`] with an explicit clock.
    pub fn with_clock<C, F, Fut>(rotting_time: Duration, clock: C, fetch: F) -> Self
    where
        C: Clock + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(RotState { stored: None, waiters: Vec::new() }),
                rotting_time,
                clock: Arc::new(clock),
            }),
            fetch: Arc::new(move || fetch().boxed()),
        }
    }

    /// Time a fetched value stays fresh.
    pub fn rotting_time(&self) -> Duration {
        self.shared.rotting_time
    }

    /// Returns the stored value if it is fresh, otherwise waits for a fetch.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn get(&self) -> CacheResult<T, E> {
        let (receiver, first) = {
            let mut state = self.shared.state.lock();
            if let Some((value, fetched_at)) = &state.stored {
                if self.shared.clock.elapsed_since(*fetched_at) <= self.shared.rotting_time {
                    return Ok(value.clone());
                }
            }
            let (sender, receiver) = oneshot::channel();
            state.waiters.push(sender);
            (receiver, state.waiters.len() == 1)
        };

        if first {
            debug!("rottable value is rotten, fetching");
            task::spawn_settled(Arc::clone(&self.shared), (), || (self.fetch)());
        }
        receiver.await.unwrap_or(Err(CacheError::Abandoned))
    }

    /// Returns `true` if a stored value is still fresh.
    pub fn is_fresh(&self) -> bool {
        let state = self.shared.state.lock();
        state
            .stored
            .as_ref()
            .is_some_and(|(_, at)| self.shared.clock.elapsed_since(*at) <= self.shared.rotting_time)
    }

    /// Marks the stored value rotten so the next `get` refetches.
    pub fn invalidate(&self) {
        self.shared.state.lock().stored = None;
    }
}
