//! Lock-free SPSC queue for inter-thread communication.
//!
//! A wait-free bounded queue using a heap-allocated ring buffer with atomic
//! cursors.
//!
//! # Overview
//!
//! - [`Producer`] - Write end (single producer per queue)
//! - [`Consumer`] - Read end (single consumer per queue)
//! - Lock-free, wait-free: no mutexes or syscalls in the hot path
//!
//! A full queue rejects the push and an empty queue returns `None`; both are
//! ordinary transient states, and retry policy (spin, yield, backoff) is the
//! caller's. [`Producer::push_blocking`] and [`Consumer::pop_blocking`]
//! package the spin policy as a convenience without changing the queue's
//! contract.
//!
//! # Example
//!
//! ```
//! use rill::sync::spsc;
//!
//! let (producer, consumer) = spsc::channel::<u64, 1024>();
//!
//! // Producer thread
//! producer.push(42).expect("Queue full");
//!
//! // Consumer thread
//! assert_eq!(consumer.pop(), Some(42));
//! ```

use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use minstant::Instant;

use crate::spsc::ring::{ConsumerState, ProducerState, Ring};
use crate::trace::{debug, trace};

/// Timeout specification for blocking operations.
#[derive(Debug, Clone, Copy)]
pub enum Timeout {
    /// Wait indefinitely.
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

/// Heap-allocated ring buffer for inter-thread SPSC.
#[repr(C)]
struct HeapRing<T, const N: usize> {
    ring: Ring<T, N>,
}

impl<T, const N: usize> HeapRing<T, N> {
    /// Allocates and initializes a ring directly on the heap.
    ///
    /// The benchmark configuration uses rings of a million slots, so the
    /// ring is never materialized on the stack: the cursor state is written
    /// in place behind the allocation and the slots stay uninitialized
    /// (`MaybeUninit` requires no initialization).
    fn new_arc() -> Arc<Self> {
        let mut uninit = Arc::<Self>::new_uninit();
        let slot = Arc::get_mut(&mut uninit).expect("freshly allocated Arc is unique");

        let ptr = slot.as_mut_ptr();
        unsafe {
            std::ptr::addr_of_mut!((*ptr).ring.producer).write(ProducerState::new());
            std::ptr::addr_of_mut!((*ptr).ring.consumer).write(ConsumerState::new());
            std::ptr::addr_of_mut!((*ptr).ring._padding).write([0u8; 64]);
        }

        // SAFETY: All fields except the buffer were written above, and the
        // buffer is an array of MaybeUninit slots.
        unsafe { uninit.assume_init() }
    }
}

impl<T, const N: usize> Drop for HeapRing<T, N> {
    /// Drops any elements that were pushed but never popped.
    fn drop(&mut self) {
        let mut head = self.ring.consumer.head.load(Ordering::Relaxed);
        let tail = self.ring.producer.tail.load(Ordering::Relaxed);

        while head != tail {
            // SAFETY: Slots in [head, tail) hold values the producer wrote
            // and the consumer never read. Both endpoints are gone (we hold
            // &mut through the last Arc), so no concurrent access exists.
            unsafe {
                (*self.ring.buffer[head].value.get().get()).assume_init_drop();
            }
            head = Ring::<T, N>::bump_cursor(head);
        }
    }
}

// SAFETY: HeapRing is Send because all fields are Send.
unsafe impl<T: Send, const N: usize> Send for HeapRing<T, N> {}

// SAFETY: HeapRing is Sync because concurrent access is mediated by atomics
// and the SPSC protocol.
unsafe impl<T: Send, const N: usize> Sync for HeapRing<T, N> {}

/// Marker type to opt-out of `Sync` while remaining `Send`.
type PhantomUnsync = PhantomData<Cell<&'static ()>>;

/// Write end of the SPSC queue.
///
/// Only one producer exists per queue; the type upholds this structurally.
///
/// # Thread Safety
///
/// `Producer` is [`Send`] but **not** [`Sync`]:
/// - Can transfer ownership to another thread
/// - Cannot share `&Producer` (no concurrent `push()`)
pub struct Producer<T: Send, const N: usize> {
    ring: Arc<HeapRing<T, N>>,
    _unsync: PhantomUnsync,
}

/// Read end of the SPSC queue.
///
/// Only one consumer exists per queue; see [`Producer`] for thread safety
/// details (same semantics apply).
pub struct Consumer<T: Send, const N: usize> {
    ring: Arc<HeapRing<T, N>>,
    _unsync: PhantomUnsync,
}

struct CapacityCheck<const N: usize>;

impl<const N: usize> CapacityCheck<N> {
    /// Compile-time assertion that the slot count supports the one-empty-slot
    /// full/empty disambiguation.
    const OK: () = assert!(N >= 2, "Ring must have at least 2 slots");
}

/// Creates a new SPSC channel over a ring of `N` slots.
///
/// Returns a `(Producer, Consumer)` pair whose queue holds up to `N - 1`
/// elements at once. The producer and consumer can be sent to different
/// threads.
///
/// # Panics
///
/// Fails to compile if `N < 2`.
///
/// # Example
///
/// ```
/// use rill::sync::spsc;
///
/// let (tx, rx) = spsc::channel::<String, 16>();
///
/// tx.push("hello".to_string()).unwrap();
/// assert_eq!(rx.pop(), Some("hello".to_string()));
/// ```
#[must_use]
pub fn channel<T: Send, const N: usize>() -> (Producer<T, N>, Consumer<T, N>) {
    let () = CapacityCheck::<N>::OK;

    let ring = HeapRing::new_arc();
    debug!("spsc channel created ({} usable slots)", N - 1);

    let producer = Producer {
        ring: Arc::clone(&ring),
        _unsync: PhantomData,
    };

    let consumer = Consumer {
        ring,
        _unsync: PhantomData,
    };

    (producer, consumer)
}

impl<T: Send, const N: usize> Producer<T, N> {
    /// Number of elements the queue can hold at once (`N - 1`).
    #[must_use]
    pub const fn capacity(&self) -> usize {
        Ring::<T, N>::CAPACITY
    }

    /// Attempts to push an item onto the queue (wait-free).
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` if the queue is full, allowing retry.
    #[inline]
    pub fn push(&self, item: T) -> Result<(), T> {
        // SAFETY: Producer has exclusive access to the producer side of the
        // ring. The ring is initialized during construction.
        unsafe { self.ring.ring.push(item) }
    }

    /// Spins until space is available, then pushes.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` on timeout.
    #[inline]
    pub fn push_blocking(&self, mut item: T, timeout: Timeout) -> Result<(), T> {
        let deadline = match timeout {
            Timeout::Infinite => None,
            Timeout::Duration(d) => Some(Instant::now() + d),
        };
        loop {
            match self.push(item) {
                Ok(()) => return Ok(()),
                Err(returned) => {
                    item = returned;
                    if let Some(dl) = deadline
                        && Instant::now() > dl
                    {
                        trace!("push_blocking timed out on a full queue");
                        return Err(item);
                    }
                    std::hint::spin_loop();
                }
            }
        }
    }
}

impl<T: Send, const N: usize> Consumer<T, N> {
    /// Number of elements the queue can hold at once (`N - 1`).
    #[must_use]
    pub const fn capacity(&self) -> usize {
        Ring::<T, N>::CAPACITY
    }

    /// Attempts to pop an item from the queue (wait-free).
    ///
    /// Returns `None` if the queue is empty.
    #[inline]
    #[must_use]
    pub fn pop(&self) -> Option<T> {
        // SAFETY: Consumer has exclusive access to the consumer side of the
        // ring. The ring is initialized during construction.
        unsafe { self.ring.ring.pop() }
    }

    /// Spins until an item is available, then pops.
    ///
    /// Returns `None` on timeout.
    #[inline]
    #[must_use]
    pub fn pop_blocking(&self, timeout: Timeout) -> Option<T> {
        let deadline = match timeout {
            Timeout::Infinite => None,
            Timeout::Duration(d) => Some(Instant::now() + d),
        };
        loop {
            if let Some(item) = self.pop() {
                return Some(item);
            }
            if let Some(dl) = deadline
                && Instant::now() > dl
            {
                trace!("pop_blocking timed out on an empty queue");
                return None;
            }
            std::hint::spin_loop();
        }
    }
}
