//! Request rectification
//!
//! - **[`Rectifier`]**: synchronous state machine that releases results in
//!   acceptance order and collapses duplicate keys.
//! - **[`RectifyingQueue`]**: runs producers as Tokio tasks on top of a
//!   rectifier and reports each result to an owner callback.
//!
//! Caches embed a [`Rectifier`] directly in their own locked state instead of
//! owning a [`RectifyingQueue`], so request acceptance and waiter
//! registration happen atomically.

mod queue;
mod rectifier;

pub use queue::{ReadyCallback, RectifyingQueue};
pub use rectifier::{Acceptance, Completion, Rectifier};
