//! Error types and classification shared by the orderly crates
//!
//! # Error Handling Architecture
//!
//! 1. **[`QueueError`]**: structural errors raised by the keyed queue and the
//!    request rectifier. They signal a broken invariant or a programming
//!    error (inserting a key twice, addressing a missing key, mixing keyed and
//!    keyless submissions) and are always returned to the caller, never
//!    swallowed.
//!
//! 2. **[`ErrorClassification`] trait**: a standard interface for classifying
//!    errors by their characteristics (retryability, severity, criticality).
//!    Cache-level errors that embed `QueueError` delegate to it.
//!
//! 3. **[`ErrorSeverity`] enum**: a unified severity level used when deciding
//!    how loudly to log a failure.
//!
//! ## Composition
//!
//! Higher-level errors compose with `QueueError` rather than duplicating its
//! variants:
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum CacheError<E> {
//!     #[error("fetch failed: {0}")]
//!     Fetch(E),
//!
//!     #[error(transparent)]
//!     Queue(#[from] QueueError),
//! }
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Standard result type using [`QueueError`]
pub type QueueResult<T> = Result<T, QueueError>;

/// Whether a rectifying queue accepts caller-supplied keys or generates its
/// own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionMode {
    /// Every submission carries a caller-supplied key.
    Keyed,
    /// Every submission receives a generated key.
    Keyless,
}

impl SubmissionMode {
    /// Mode implied by an optional submission key.
    pub fn of<K>(key: &Option<K>) -> Self {
        if key.is_some() {
            Self::Keyed
        } else {
            Self::Keyless
        }
    }
}

impl fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyed => f.write_str("keyed"),
            Self::Keyless => f.write_str("keyless"),
        }
    }
}

/// Structural errors of keyed queues and rectifying queues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// An item with the same key is already queued.
    #[error("Duplicate queue key: {0}")]
    DuplicateKey(String),

    /// No item is queued under the key.
    #[error("Unknown queue key: {0}")]
    UnknownKey(String),

    /// `dequeue` or `peek` on an empty queue.
    #[error("Queue is empty")]
    EmptyQueue,

    /// A keyed submission reached a keyless queue or vice versa.
    #[error("Rectifying queue only accepts {expected} submissions")]
    ModeMismatch {
        /// Mode the queue locked into on first use.
        expected: SubmissionMode,
    },
}

impl QueueError {
    /// Builds a [`QueueError::DuplicateKey`] from any debuggable key.
    pub fn duplicate_key<K: fmt::Debug + ?Sized>(key: &K) -> Self {
        Self::DuplicateKey(format!("{key:?}"))
    }

    /// Builds a [`QueueError::UnknownKey`] from any debuggable key.
    pub fn unknown_key<K: fmt::Debug + ?Sized>(key: &K) -> Self {
        Self::UnknownKey(format!("{key:?}"))
    }
}

/// Trait for classifying errors by their characteristics
///
/// This trait provides a standard interface for determining error properties
/// that are useful for logging and retry decisions.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// A retryable error may succeed when the same request is issued again.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    ///
    /// Critical errors indicate internal invariant violations.
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl ErrorClassification for QueueError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Critical
    }
}
