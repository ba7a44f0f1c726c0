//! Mutex-serialized unbounded queue, the baseline the ring is measured
//! against.
//!
//! Every operation takes the guard for its whole critical section; the
//! mutex is the sole serialization point, so no atomic-ordering reasoning
//! applies here. Unlike [`crate::sync::spsc`] there is no producer/consumer
//! discipline: any number of threads may push and pop through the guard.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Unbounded FIFO queue protected by a mutex.
///
/// `push` always succeeds; `pop` returns `None` when the queue was empty at
/// the instant the guard was held, an ordinary transient state rather than
/// an error.
pub struct LockedQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> LockedQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends a value to the back of the queue. Never fails.
    pub fn push(&self, value: T) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(value);
    }

    /// Removes the value at the front of the queue.
    ///
    /// Returns `None` if the queue was empty; the caller may retry or stop.
    #[must_use]
    pub fn pop(&self) -> Option<T> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Number of elements currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the queue held no elements at the instant of observation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for LockedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = LockedQueue::new();

        for i in 0..10 {
            queue.push(i);
        }
        for i in 0..10 {
            assert_eq!(queue.pop(), Some(i));
        }
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_pop_on_fresh_queue() {
        let queue = LockedQueue::<u64>::new();
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let queue = LockedQueue::new();
        queue.push("hello".to_string());
        assert_eq!(queue.pop(), Some("hello".to_string()));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_len_tracks_pushes_and_pops() {
        let queue = LockedQueue::new();
        assert_eq!(queue.len(), 0);

        queue.push(1);
        queue.push(2);
        assert_eq!(queue.len(), 2);

        let _ = queue.pop();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        let queue = Arc::new(LockedQueue::new());
        let count = 10_000u64;

        let producer_queue = Arc::clone(&queue);
        let producer = std::thread::spawn(move || {
            for i in 0..count {
                producer_queue.push(i);
            }
        });

        let consumer_queue = Arc::clone(&queue);
        let consumer = std::thread::spawn(move || {
            let mut expected = 0u64;
            while expected < count {
                if let Some(value) = consumer_queue.pop() {
                    assert_eq!(value, expected);
                    expected += 1;
                } else {
                    std::hint::spin_loop();
                }
            }
        });

        producer.join().unwrap();
        consumer.join().unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_many_producers() {
        let queue = Arc::new(LockedQueue::new());
        let per_thread = 1_000u64;

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        queue.push(t * per_thread + i);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.len() as u64, 4 * per_thread);
    }
}
