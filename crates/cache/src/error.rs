//! Error types for the async cache tier
//!
//! - [`ProducerError`]: outcome of a producer run by a rectifying queue that
//!   did not yield a value.
//! - [`CacheError`]: what a cache `get` returns when no value is available.
//!   Structural [`QueueError`]s compose in through `#[from]`.
//! - [`ConfigError`]: invalid or unparsable cache configuration.
//!
//! All three derive `Clone` so one failure can be handed to every waiter of a
//! deduplicated request.

use orderly_common::{ErrorClassification, ErrorSeverity, QueueError};
use thiserror::Error;

/// Result type returned by cache lookups.
pub type CacheResult<V, E> = Result<V, CacheError<E>>;

/// Failure of a producer scheduled on a rectifying queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProducerError<E> {
    /// The producer resolved to an error.
    #[error("producer failed: {0}")]
    Failed(E),

    /// The producer panicked while being polled.
    #[error("producer panicked: {0}")]
    Panicked(String),

    /// The producer task was dropped before it finished, usually because the
    /// runtime shut down.
    #[error("producer task was cancelled")]
    Cancelled,
}

/// Failure of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError<E> {
    /// The fetch function failed; the original error is carried unmodified.
    #[error("fetch failed: {0}")]
    Fetch(E),

    /// The fetch function panicked.
    #[error("fetch panicked: {0}")]
    FetchPanicked(String),

    /// The cache's internal queues rejected an operation.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The fetch never reported back.
    #[error("fetch was abandoned before completing")]
    Abandoned,
}

impl<E> CacheError<E> {
    /// Short, stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::FetchPanicked(_) => "fetch_panicked",
            Self::Queue(_) => "queue",
            Self::Abandoned => "abandoned",
        }
    }

    /// Returns the producer's own error, if that is what failed.
    pub fn fetch_error(&self) -> Option<&E> {
        match self {
            Self::Fetch(error) => Some(error),
            _ => None,
        }
    }
}

impl<E> From<ProducerError<E>> for CacheError<E> {
    fn from(error: ProducerError<E>) -> Self {
        match error {
            ProducerError::Failed(error) => Self::Fetch(error),
            ProducerError::Panicked(message) => Self::FetchPanicked(message),
            ProducerError::Cancelled => Self::Abandoned,
        }
    }
}

impl<E> ErrorClassification for CacheError<E> {
    fn is_retryable(&self) -> bool {
        match self {
            // Failures are never cached, so the next get starts a new fetch.
            Self::Fetch(_) | Self::Abandoned => true,
            Self::FetchPanicked(_) => false,
            Self::Queue(error) => error.is_retryable(),
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Fetch(_) => ErrorSeverity::Error,
            Self::Abandoned => ErrorSeverity::Warning,
            Self::FetchPanicked(_) => ErrorSeverity::Critical,
            Self::Queue(error) => error.severity(),
        }
    }
}

/// Invalid cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Capacity must hold at least one entry.
    #[error("cache capacity must be at least 1")]
    ZeroCapacity,

    /// A timed cache was configured without an expiration window.
    #[error("timed cache requires an expiration window")]
    MissingExpiration,

    /// The configuration document could not be parsed.
    #[error("invalid cache configuration: {0}")]
    Parse(String),
}
