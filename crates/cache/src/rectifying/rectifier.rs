//! Synchronous core of request rectification.
//!
//! Each accepted request is an entry in a [`KeyedQueue`] ordered by
//! acceptance, and moves from pending to done exactly once. After every
//! transition the queue is drained from the head for as long as the head is
//! done, so results leave in acceptance order no matter when they finish.

use orderly_common::{AlphanumericSequence, CacheKey, KeyedQueue, QueueError, SubmissionMode};
use tokio::sync::oneshot;
use tracing::trace;

/// A finished request, released in acceptance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion<T, E> {
    /// Key the request was accepted under.
    pub key: CacheKey,
    /// Outcome of the request.
    pub result: Result<T, E>,
}

/// Outcome of [`Rectifier::accept`].
#[derive(Debug)]
pub struct Acceptance<T, E> {
    /// Key assigned to the request; generated for keyless submissions.
    pub key: CacheKey,
    /// `true` when a new computation must be started for `key`, `false` when
    /// the key was already queued and has only been moved to the back.
    pub started: bool,
    /// Completions released by the acceptance, in order.
    pub ready: Vec<Completion<T, E>>,
}

#[derive(Debug)]
enum Slot<T, E> {
    Pending,
    Done(Result<T, E>),
}

/// Per-key pending/done state machine kept in acceptance order.
///
/// # Examples
///
/// ```
/// use orderly_cache::rectifying::Rectifier;
/// use orderly_common::CacheKey;
///
/// let mut rectifier: Rectifier<&str, ()> = Rectifier::new();
/// let first = rectifier.accept(Some(CacheKey::from(1))).unwrap();
/// let second = rectifier.accept(Some(CacheKey::from(2))).unwrap();
///
/// // The second request finishes first but is held back.
/// assert!(rectifier.settle(&second.key, Ok("b")).unwrap().is_empty());
///
/// let released = rectifier.settle(&first.key, Ok("a")).unwrap();
/// let values: Vec<_> = released.into_iter().map(|c| c.result.unwrap()).collect();
/// assert_eq!(values, vec!["a", "b"]);
/// ```
#[derive(Debug)]
pub struct Rectifier<T, E> {
    order: KeyedQueue<CacheKey, Slot<T, E>>,
    mode: Option<SubmissionMode>,
    keys: AlphanumericSequence,
    idle: Vec<oneshot::Sender<()>>,
}

impl<T, E> Default for Rectifier<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Rectifier<T, E> {
    /// Creates an empty rectifier that has not yet chosen a submission mode.
    pub fn new() -> Self {
        Self {
            order: KeyedQueue::new(),
            mode: None,
            keys: AlphanumericSequence::new(),
            idle: Vec::new(),
        }
    }

    /// Number of requests not yet released.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` when nothing is waiting to be released.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Submission mode chosen by the first accepted request.
    pub fn mode(&self) -> Option<SubmissionMode> {
        self.mode
    }

    /// Returns `true` while `key` is accepted but not yet released.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.order.has_key(key)
    }

    /// Accepts a request under `key`, or under a generated key when `None`.
    ///
    /// The first call locks the rectifier into keyed or keyless mode; a later
    /// call in the other mode fails with [`QueueError::ModeMismatch`]. A key
    /// that is still queued is moved to the back without starting a new
    /// computation, which may release requests that were waiting behind it.
    pub fn accept(&mut self, key: Option<CacheKey>) -> Result<Acceptance<T, E>, QueueError> {
        let mode = SubmissionMode::of(&key);
        match self.mode {
            Some(expected) if expected != mode => {
                return Err(QueueError::ModeMismatch { expected });
            }
            Some(_) => {}
            None => self.mode = Some(mode),
        }

        let key = match key {
            Some(key) => key,
            None => CacheKey::Str(self.keys.next_key()),
        };

        if self.order.has_key(&key) {
            self.order.promote(&key)?;
            trace!(%key, "re-raised queued request");
            let ready = self.drain();
            return Ok(Acceptance { key, started: false, ready });
        }

        self.order.enqueue(key.clone(), Slot::Pending)?;
        Ok(Acceptance { key, started: true, ready: Vec::new() })
    }

    /// Marks `key` as done and releases every request that is now at the
    /// head and done.
    ///
    /// Fails with [`QueueError::UnknownKey`] if `key` was never accepted or
    /// was already released, and with [`QueueError::DuplicateKey`] if it was
    /// already settled.
    pub fn settle(
        &mut self,
        key: &CacheKey,
        result: Result<T, E>,
    ) -> Result<Vec<Completion<T, E>>, QueueError> {
        let slot = self.order.get_by_key_mut(key)?;
        if matches!(slot, Slot::Done(_)) {
            return Err(QueueError::duplicate_key(key));
        }
        *slot = Slot::Done(result);
        Ok(self.drain())
    }

    /// Registers a waiter released once nothing is left to release.
    ///
    /// Fires immediately when the rectifier is already empty.
    pub fn on_idle(&mut self, waiter: oneshot::Sender<()>) {
        if self.order.is_empty() {
            let _ = waiter.send(());
        } else {
            self.idle.push(waiter);
        }
    }

    /// Releases idle waiters if the rectifier is empty.
    ///
    /// Owners call this after delivering the completions returned by
    /// [`Rectifier::settle`], so idle waiters observe every delivery.
    pub fn notify_idle(&mut self) {
        if self.order.is_empty() {
            for waiter in self.idle.drain(..) {
                let _ = waiter.send(());
            }
        }
    }

    fn head_is_done(&self) -> bool {
        matches!(self.order.peek(), Ok((_, Slot::Done(_))))
    }

    fn drain(&mut self) -> Vec<Completion<T, E>> {
        let mut ready = Vec::new();
        while self.head_is_done() {
            if let Ok((key, Slot::Done(result))) = self.order.dequeue() {
                ready.push(Completion { key, result });
            }
        }
        if !ready.is_empty() {
            trace!(released = ready.len(), remaining = self.order.len(), "drained rectifier");
        }
        ready
    }
}
