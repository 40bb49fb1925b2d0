//! Time abstraction for testability
//!
//! Expiry decisions read the current instant through the [`Clock`] trait so
//! production code can run on [`SystemClock`] while tests drive a
//! [`MockClock`] by hand.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use orderly_common::time::{Clock, MockClock, SystemClock};
//!
//! // Use system clock in production
//! let clock = SystemClock;
//! let _now = clock.now();
//!
//! // Use mock clock in tests
//! let mock = MockClock::new();
//! let start = mock.now();
//! mock.advance(Duration::from_secs(5));
//! assert_eq!(mock.now().duration_since(start), Duration::from_secs(5));
//! ```

mod clock;

pub use clock::{Clock, MockClock, SystemClock};
