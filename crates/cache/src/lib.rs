//! Order-preserving, deduplicating async caches.
//!
//! # Modules
//!
//! - [`rectifying`]: runs producers concurrently and releases their results
//!   in submission order, collapsing duplicate keys
//! - [`lru`]: [`LruCache`], an LRU cache in front of an async fetch function
//! - [`timed`]: [`TimedLruCache`], the same cache with expiring entries
//! - [`rottable`]: [`Rottable`], a single value refetched after it rots
//! - [`config`], [`stats`], [`error`]: configuration, metrics snapshots and
//!   error types
//!
//! # Guarantees
//!
//! - Concurrent lookups of the same missing key share one fetch.
//! - Results are delivered in the order keys were first requested.
//! - Failed fetches reach every waiting caller and are never cached.
//!
//! # Example
//!
//! ```
//! use orderly_cache::{CacheConfig, CacheKey, LruCache};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let cache = LruCache::new(
//!     CacheConfig::builder().capacity(128).name("squares").build(),
//!     |n: &i64| CacheKey::from(*n),
//!     |n: i64| async move { Ok::<_, String>(n * n) },
//! )?;
//!
//! assert_eq!(cache.get(12).await?, 144);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod config;
pub mod error;
pub mod lru;
pub mod rectifying;
pub mod rottable;
pub mod stats;
pub mod timed;

mod task;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use config::{CacheConfig, CacheConfigBuilder};
pub use error::{CacheError, CacheResult, ConfigError, ProducerError};
pub use lru::LruCache;
pub use orderly_common::{
    CacheKey, Clock, ErrorClassification, ErrorSeverity, MockClock, QueueError, SubmissionMode,
    SystemClock,
};
pub use rectifying::{Completion, RectifyingQueue};
pub use rottable::Rottable;
pub use stats::CacheStats;
pub use timed::TimedLruCache;
