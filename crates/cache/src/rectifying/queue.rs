//! Async driver around [`Rectifier`].

use std::future::Future;
use std::sync::Arc;

use orderly_common::{CacheKey, QueueError};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, instrument, warn};

use super::rectifier::{Completion, Rectifier};
use crate::error::ProducerError;
use crate::task::{self, Settle};

/// Callback receiving completions in acceptance order.
pub type ReadyCallback<T, E> = Box<dyn Fn(Completion<T, ProducerError<E>>) + Send + Sync>;

struct Shared<T, E> {
    state: Mutex<Rectifier<T, ProducerError<E>>>,
    on_ready: ReadyCallback<T, E>,
}

impl<T, E> Shared<T, E> {
    fn deliver(&self, ready: Vec<Completion<T, ProducerError<E>>>) {
        for completion in ready {
            if let Err(error) = &completion.result {
                match error {
                    ProducerError::Failed(_) => warn!(key = %completion.key, "producer failed"),
                    ProducerError::Panicked(message) => {
                        warn!(key = %completion.key, %message, "producer panicked");
                    }
                    ProducerError::Cancelled => warn!(key = %completion.key, "producer cancelled"),
                }
            }
            (self.on_ready)(completion);
        }
    }
}

impl<T, E> Settle for Shared<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Token = CacheKey;
    type Output = T;
    type Error = E;

    fn settle(&self, key: CacheKey, result: Result<T, ProducerError<E>>) {
        let mut state = self.state.lock();
        match state.settle(&key, result) {
            Ok(ready) => {
                self.deliver(ready);
                state.notify_idle();
            }
            Err(error) => error!(%key, %error, "settled a request the queue does not hold"),
        }
    }
}

/// Runs asynchronous producers concurrently and reports their results in the
/// order they were enqueued.
///
/// Producers enqueued under a key that is still queued are not run; the
/// existing computation is moved to the back of the order instead. A queue
/// either always or never receives keys; the first [`enqueue`] decides.
///
/// Completions are handed to the owner callback while the queue's lock is
/// held, so the callback must not call back into the queue.
///
/// [`enqueue`]: RectifyingQueue::enqueue
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// use orderly_cache::rectifying::RectifyingQueue;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let queue = RectifyingQueue::<u64, ()>::new(move |completion| {
///     sink.lock().unwrap().push(completion.result.unwrap());
/// });
///
/// for delay in [30, 10, 20] {
///     queue
///         .enqueue(
///             move || async move {
///                 tokio::time::sleep(Duration::from_millis(delay)).await;
///                 Ok(delay)
///             },
///             None,
///         )
///         .unwrap();
/// }
/// queue.wait_empty().await;
/// assert_eq!(*seen.lock().unwrap(), vec![30, 10, 20]);
/// # }
/// ```
pub struct RectifyingQueue<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for RectifyingQueue<T, E> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T, E> RectifyingQueue<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates a queue that reports completions to `on_ready`.
    pub fn new<F>(on_ready: F) -> Self
    where
        F: Fn(Completion<T, ProducerError<E>>) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(Rectifier::new()),
                on_ready: Box::new(on_ready),
            }),
        }
    }

    /// Enqueues a producer under `key` and returns the key it was accepted
    /// under.
    ///
    /// `producer` is only invoked when the key starts a new computation; the
    /// future it returns is spawned on the current Tokio runtime.
    #[instrument(level = "debug", skip(self, producer))]
    pub fn enqueue<P, Fut>(&self, producer: P, key: Option<CacheKey>) -> Result<CacheKey, QueueError>
    where
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (key, started) = {
            let mut state = self.shared.state.lock();
            let acceptance = state.accept(key)?;
            self.shared.deliver(acceptance.ready);
            (acceptance.key, acceptance.started)
        };

        if started {
            task::spawn_settled(Arc::clone(&self.shared), key.clone(), producer);
        } else {
            debug!(%key, "joined queued request");
        }
        Ok(key)
    }

    /// Resolves once every accepted request has been delivered.
    ///
    /// Requests enqueued after the queue drains are not covered.
    pub async fn wait_empty(&self) {
        let (waiter, idle) = oneshot::channel();
        self.shared.state.lock().on_idle(waiter);
        let _ = idle.await;
    }

    /// Number of requests accepted but not yet delivered.
    pub fn len(&self) -> usize {
        self.shared.state.lock().len()
    }

    /// Returns `true` when no request is awaiting delivery.
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().is_empty()
    }
}
