//! Specialized data structures
//!
//! - **[`keyed_queue`]**: FIFO queue with O(1) access, removal and promotion
//!   by key
//!
//! ## Usage
//!
//! ```
//! use orderly_common::collections::KeyedQueue;
//!
//! let mut queue = KeyedQueue::new();
//! queue.enqueue("a", 1).unwrap();
//! queue.enqueue("b", 2).unwrap();
//!
//! assert_eq!(queue.dequeue().unwrap(), ("a", 1));
//! ```

pub mod keyed_queue;

pub use keyed_queue::{Iter, KeyedQueue};
