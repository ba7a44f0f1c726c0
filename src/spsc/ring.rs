//! Core lock-free SPSC ring buffer algorithm.
//!
//! A fixed array of `N` slots addressed by two wrapping cursors: `tail` is
//! the next slot the producer writes, `head` the next slot the consumer
//! reads. Both cursors stay in `[0, N)` and advance modulo `N`. One slot is
//! always left empty so the cursors alone disambiguate the boundary states:
//! the ring is empty iff `head == tail` and full iff `bump(tail) == head`.
//!
//! All cross-thread visibility goes through the two cursors. The producer
//! publishes a slot write with a release store of `tail`; the consumer
//! observes it with an acquire load, and the mirrored pair on `head` covers
//! the opposite direction. The slots themselves are plain (non-atomic)
//! cells: the cursor protocol guarantees no slot is ever touched by both
//! threads at the same time.
//!
//! # Safety
//!
//! The operations here are unsafe because they require the caller to uphold
//! the SPSC invariant: exactly one producer and one consumer, with no
//! concurrent access to either role.

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Role marker: Fields with this role are owned exclusively by the producer.
pub struct ProducerRole;

/// Role marker: Fields with this role are owned exclusively by the consumer.
pub struct ConsumerRole;

/// Role marker: Buffer slots whose ownership transfers via the SPSC protocol.
pub struct SlotRole;

/// Interior-mutable cell with a role marker for nominal type safety.
///
/// The `Role` parameter doesn't affect runtime behavior; it exists purely to
/// make the differently-owned "kinds" of cells distinct types at compile
/// time.
#[repr(transparent)]
pub struct SpscCell<T, Role>(UnsafeCell<T>, PhantomData<Role>);

impl<T, Role> SpscCell<T, Role> {
    pub const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value), PhantomData)
    }

    pub const fn get(&self) -> &UnsafeCell<T> {
        &self.0
    }
}

// SAFETY: SpscCell is Sync because the SPSC protocol guarantees each cell is
// only ever accessed by its owning role (or, for slots, by one role at a
// time). The atomic cursors with Release/Acquire ordering provide the
// synchronization barrier between writes and reads.
unsafe impl<T: Send, Role> Sync for SpscCell<T, Role> {}
unsafe impl<T: Send, Role> Send for SpscCell<T, Role> {}

/// Cache cell owned exclusively by the producer.
pub type ProducerCache<T> = SpscCell<T, ProducerRole>;

/// Cache cell owned exclusively by the consumer.
pub type ConsumerCache<T> = SpscCell<T, ConsumerRole>;

/// Buffer slot cell with ownership governed by the SPSC protocol.
pub type SlotCell<T> = SpscCell<T, SlotRole>;

/// Producer-side state: write cursor and cached head.
#[repr(C)]
#[repr(align(64))]
pub struct ProducerState {
    /// Next slot to write, in `[0, N)`.
    /// Advanced only by the producer, read by the consumer.
    pub tail: AtomicUsize,

    /// Producer's last-seen copy of `head`. Refreshing it is the only time
    /// the producer touches the consumer's cache line.
    pub cached_head: ProducerCache<usize>,
}

impl ProducerState {
    pub const fn new() -> Self {
        Self {
            tail: AtomicUsize::new(0),
            cached_head: ProducerCache::new(0),
        }
    }
}

impl Default for ProducerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer-side state: read cursor and cached tail.
#[repr(C)]
#[repr(align(64))]
pub struct ConsumerState {
    /// Next slot to read, in `[0, N)`.
    /// Advanced only by the consumer, read by the producer.
    pub head: AtomicUsize,

    /// Consumer's last-seen copy of `tail`.
    pub cached_tail: ConsumerCache<usize>,
}

impl ConsumerState {
    pub const fn new() -> Self {
        Self {
            head: AtomicUsize::new(0),
            cached_tail: ConsumerCache::new(0),
        }
    }
}

impl Default for ConsumerState {
    fn default() -> Self {
        Self::new()
    }
}

/// A single slot in the ring buffer.
#[repr(C)]
pub struct Slot<T> {
    pub value: SlotCell<MaybeUninit<T>>,
}

/// Core SPSC ring buffer state.
///
/// Producer state, consumer state, and the slot array each start on their
/// own cache line so cursor updates on one side never invalidate the other
/// side's line.
#[repr(C)]
pub struct Ring<T, const N: usize> {
    /// Producer state (tail cursor + cached head).
    pub producer: ProducerState,

    /// Consumer state (head cursor + cached tail).
    pub consumer: ConsumerState,

    /// Prevent false sharing between consumer state and buffer.
    pub _padding: [u8; 64],

    /// Ring buffer slots.
    pub buffer: [Slot<T>; N],
}

impl<T, const N: usize> Ring<T, N> {
    /// Number of elements the ring can hold at once.
    ///
    /// One slot stays empty to keep `head == tail` unambiguous, so a ring
    /// of `N` slots carries at most `N - 1` live elements.
    pub const CAPACITY: usize = N - 1;

    /// Advances a cursor to the next slot index, wrapping to 0 at `N`.
    ///
    /// Equivalent to `(cursor + 1) % N` but avoids the division instruction,
    /// using a comparison and conditional move instead.
    #[inline]
    pub const fn bump_cursor(cursor: usize) -> usize {
        let next = cursor + 1;
        if next == N { 0 } else { next }
    }

    /// Attempts to push an item onto the queue.
    ///
    /// Returns `Err(item)` if the ring is full at the instant the consumer's
    /// progress was observed. Wait-free: a bounded number of steps with no
    /// internal retry loop.
    ///
    /// # Safety
    ///
    /// Caller must ensure:
    /// - Only one thread calls this method (single producer)
    /// - The ring's producer and consumer state have been initialized
    #[inline]
    pub unsafe fn push(&self, item: T) -> Result<(), T> {
        // Load own cursor (producer-local, relaxed is fine)
        let tail = self.producer.tail.load(Ordering::Relaxed);
        let next = Self::bump_cursor(tail);

        // SAFETY: Producer has exclusive access to cached_head
        let mut cached_head = unsafe { *self.producer.cached_head.get().get() };

        // Check if the ring appears full using the cached value. The cache
        // only ever lags the real head, so "not full" here is conclusive.
        if next == cached_head {
            // Refresh from the real head (acquire to sync with consumer)
            cached_head = self.consumer.head.load(Ordering::Acquire);
            // SAFETY: Producer has exclusive write access to cached_head
            unsafe {
                *self.producer.cached_head.get().get() = cached_head;
            }

            if next == cached_head {
                return Err(item); // Ring is full
            }
        }

        // SAFETY: The producer owns the slot at `tail` because:
        // - tail hasn't been published yet (store happens after this write)
        // - The fullness check above proved the consumer isn't at this slot
        //   and won't reach it until tail is published
        // - tail is in [0, N) by the cursor invariant, so indexing is in bounds
        unsafe {
            let slot_ptr = self.buffer[tail].value.get().get();
            std::ptr::write(slot_ptr, MaybeUninit::new(item));
        }

        // Publish the slot write (release to sync with consumer)
        self.producer.tail.store(next, Ordering::Release);

        Ok(())
    }

    /// Attempts to pop an item from the queue.
    ///
    /// Returns `None` if the ring is empty at the instant the producer's
    /// progress was observed. Wait-free like [`Ring::push`].
    ///
    /// # Safety
    ///
    /// Caller must ensure:
    /// - Only one thread calls this method (single consumer)
    /// - The ring's producer and consumer state have been initialized
    #[inline]
    pub unsafe fn pop(&self) -> Option<T> {
        // Load own cursor (consumer-local, relaxed is fine)
        let head = self.consumer.head.load(Ordering::Relaxed);

        // SAFETY: Consumer has exclusive access to cached_tail
        let mut cached_tail = unsafe { *self.consumer.cached_tail.get().get() };

        // Check if the ring appears empty using the cached value
        if head == cached_tail {
            // Refresh from the real tail (acquire to sync with producer)
            cached_tail = self.producer.tail.load(Ordering::Acquire);
            // SAFETY: Consumer has exclusive write access to cached_tail
            unsafe {
                *self.consumer.cached_tail.get().get() = cached_tail;
            }

            if head == cached_tail {
                return None; // Ring is empty
            }
        }

        // SAFETY: The consumer owns the slot at `head` because:
        // - The emptiness check proved head != tail, so the slot holds a
        //   value the producer published (assume_init is valid)
        // - head hasn't been published yet, so the producer won't overwrite
        //   this slot until we advance it
        // - head is in [0, N) by the cursor invariant, so indexing is in bounds
        let item = unsafe {
            let slot_ptr = self.buffer[head].value.get().get();
            std::ptr::read(slot_ptr).assume_init()
        };

        // Publish the slot read (release to sync with producer)
        self.consumer.head.store(Self::bump_cursor(head), Ordering::Release);

        Some(item)
    }
}

// SAFETY: Ring is Send because all fields are Send (AtomicUsize, SpscCell).
unsafe impl<T: Send, const N: usize> Send for Ring<T, N> {}

// SAFETY: Ring is Sync because concurrent access is mediated by atomics:
// - head/tail are AtomicUsize with Release/Acquire ordering
// - Buffer slots are protected by the SPSC invariant (see SpscCell)
unsafe impl<T: Send, const N: usize> Sync for Ring<T, N> {}
