//! Synchronous foundations shared by the orderly cache crates.
//!
//! # Modules
//!
//! - [`collections`]: the ordered keyed queue backing eviction, timing and
//!   request ordering
//! - [`sequence`]: compact sequence keys for keyless submissions
//! - [`key`]: the primitive [`CacheKey`] type
//! - [`error`]: structural queue errors and error classification
//! - [`time`]: clock abstraction for deterministic expiry testing
//!
//! # Feature Flags
//!
//! - `serde`: serde support for [`CacheKey`] and the duration helpers in
//!   `utils::serde`

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod collections;
pub mod error;
pub mod key;
pub mod sequence;
pub mod time;
#[cfg(feature = "serde")]
pub mod utils;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use collections::KeyedQueue;
pub use error::{ErrorClassification, ErrorSeverity, QueueError, QueueResult, SubmissionMode};
pub use key::CacheKey;
pub use sequence::{AlphanumericSequence, SequenceError, SequenceGen};
pub use time::{Clock, MockClock, SystemClock};
#[cfg(feature = "serde")]
pub use utils::serde::{duration_millis, option_duration_millis};
