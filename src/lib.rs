//! Bounded lock-free SPSC queue with a mutex-protected baseline.
//!
//! The crate exposes two queue flavors behind the same narrow push/pop
//! contract so a driver can benchmark them interchangeably:
//!
//! - [`sync::spsc`] - wait-free bounded ring buffer, one producer and one
//!   consumer, synchronized purely through two atomic cursors.
//! - [`sync::locked`] - unbounded queue serialized by a mutex, the baseline
//!   the ring is measured against.
//!
//! Both operations are single non-blocking attempts; full and empty are
//! reported as ordinary return values and any retry policy (spin, yield,
//! backoff) belongs to the caller.

pub mod config;
pub mod spsc;
pub mod sync;

mod trace;

pub use trace::init_tracing;
