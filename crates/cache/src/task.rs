//! Running producers on the tokio runtime
//!
//! Every producer future is spawned together with a guard that reports its
//! outcome back to the owning structure exactly once: with the produced
//! value, with the producer's error, with a captured panic, or with
//! [`ProducerError::Cancelled`] if the task is dropped before finishing.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;

use crate::error::ProducerError;

/// Owner of pending producer runs.
pub(crate) trait Settle: Send + Sync + 'static {
    /// Identifies which pending run is being settled.
    type Token: Send + 'static;
    /// Value produced on success.
    type Output: Send + 'static;
    /// Error produced on failure.
    type Error: Send + 'static;

    /// Records the outcome of the run identified by `token`.
    fn settle(&self, token: Self::Token, result: Result<Self::Output, ProducerError<Self::Error>>);
}

/// Reports a run's outcome on drop if the task never finished it.
struct SettleGuard<S: Settle> {
    owner: Arc<S>,
    token: Option<S::Token>,
}

impl<S: Settle> SettleGuard<S> {
    fn finish(mut self, result: Result<S::Output, ProducerError<S::Error>>) {
        if let Some(token) = self.token.take() {
            self.owner.settle(token, result);
        }
    }
}

impl<S: Settle> Drop for SettleGuard<S> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.owner.settle(token, Err(ProducerError::Cancelled));
        }
    }
}

/// Builds the producer's future and spawns it, settling `token` on `owner`
/// when it completes.
///
/// The guard is armed before `producer` runs, so a producer that panics
/// while building its future is settled with [`ProducerError::Panicked`]
/// on the calling thread. The caller must not hold the owner's lock. Must be
/// called from within a Tokio runtime.
pub(crate) fn spawn_settled<S, P, F>(owner: Arc<S>, token: S::Token, producer: P)
where
    S: Settle,
    P: FnOnce() -> F,
    F: Future<Output = Result<S::Output, S::Error>> + Send + 'static,
{
    let guard = SettleGuard { owner, token: Some(token) };
    match panic::catch_unwind(AssertUnwindSafe(producer)) {
        Ok(future) => {
            tokio::spawn(async move {
                let result = run_guarded(future).await;
                guard.finish(result);
            });
        }
        Err(payload) => {
            guard.finish(Err(ProducerError::Panicked(panic_message(payload.as_ref()))));
        }
    }
}

/// Polls `future` to completion, converting a panic into
/// [`ProducerError::Panicked`].
pub(crate) async fn run_guarded<F, T, E>(future: F) -> Result<T, ProducerError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(ProducerError::Failed(error)),
        Err(payload) => Err(ProducerError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for task.
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        outcomes: Mutex<Vec<(u32, Result<i32, ProducerError<String>>)>>,
    }

    impl Settle for Recorder {
        type Token = u32;
        type Output = i32;
        type Error = String;

        fn settle(&self, token: u32, result: Result<i32, ProducerError<String>>) {
            self.outcomes.lock().push((token, result));
        }
    }

    /// Validates the guarded run scenario.
    ///
    /// Assertions:
    /// - Confirms values and errors pass through.
    /// - Confirms a panic is captured with its message.
    #[tokio::test]
    async fn test_run_guarded() {
        assert_eq!(run_guarded(async { Ok::<_, String>(1) }).await, Ok(1));
        assert_eq!(
            run_guarded(async { Err::<i32, _>("bad".to_string()) }).await,
            Err(ProducerError::Failed("bad".to_string()))
        );

        async fn explode() -> Result<i32, String> {
            panic!("exploded")
        }

        let panicked = run_guarded(explode()).await;
        assert_eq!(panicked, Err(ProducerError::Panicked("exploded".to_string())));
    }

    /// Validates the spawned settle scenario.
    ///
    /// Assertions:
    /// - Confirms the owner receives exactly one outcome per token.
    #[tokio::test]
    async fn test_spawn_settled_reports_once() {
        let recorder = Arc::new(Recorder::default());
        spawn_settled(Arc::clone(&recorder), 7, || async { Ok(70) });

        while recorder.outcomes.lock().is_empty() {
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;
        assert_eq!(*recorder.outcomes.lock(), vec![(7, Ok(70))]);
    }

    /// Validates the producer panicking before it yields a future.
    ///
    /// Assertions:
    /// - Confirms the owner is settled with `Panicked` before the call
    ///   returns.
    #[tokio::test]
    async fn test_spawn_settled_producer_panics_synchronously() {
        let recorder = Arc::new(Recorder::default());
        let producer = || -> std::future::Ready<Result<i32, String>> {
            panic!("bad argument");
        };
        spawn_settled(Arc::clone(&recorder), 5, producer);
        assert_eq!(
            *recorder.outcomes.lock(),
            vec![(5, Err(ProducerError::Panicked("bad argument".to_string())))]
        );
    }

    /// Validates the dropped guard scenario.
    ///
    /// Assertions:
    /// - Confirms an unfinished guard settles with `Cancelled`.
    #[test]
    fn test_dropped_guard_cancels() {
        let recorder = Arc::new(Recorder::default());
        drop(SettleGuard { owner: Arc::clone(&recorder), token: Some(3) });
        assert_eq!(*recorder.outcomes.lock(), vec![(3, Err(ProducerError::Cancelled))]);
    }
}
