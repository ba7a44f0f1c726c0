//! Thread-safe queues for communication between threads within the same
//! process.
//!
//! [`spsc`] is the lock-free ring queue; [`locked`] is the mutex-serialized
//! baseline it is benchmarked against. Both expose the same narrow push/pop
//! contract.

pub mod locked;
pub mod spsc;
