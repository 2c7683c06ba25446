//! Fixed-depth slot ring shared between one producer and one consumer context.
//!
//! Two disciplines run on the same storage:
//!
//! - **Latest-wins** (transmit): `head` is the newest published slot and the
//!   consumer steps `tail` towards it one slot per frame. A producer that laps
//!   the consumer overwrites unread slots, never the one being transmitted.
//! - **Queue** (receive): `head` is the slot being filled. Committing a full
//!   ring drops the newest frame; the consumer releases `tail` explicitly.
//!
//! Each index has exactly one writing context. Slot contents are handed out
//! as raw pointers; callers uphold the ownership rules above.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Power-of-two ring of `N` slots with atomic wraparound indices.
pub(crate) struct SlotRing<S, const N: usize> {
    /// Slot storage
    slots: [UnsafeCell<S>; N],
    /// Producer index
    head: AtomicUsize,
    /// Consumer index
    tail: AtomicUsize,
}

// SAFETY: slots are only reached through raw pointers whose use is governed
// by the single-producer/single-consumer index protocol.
unsafe impl<S: Send, const N: usize> Sync for SlotRing<S, N> {}

impl<S, const N: usize> SlotRing<S, N> {
    const MASK: usize = {
        assert!(N.is_power_of_two(), "ring depth must be a power of two");
        assert!(N >= 4, "ring depth must be at least 4");
        N - 1
    };

    /// Create a ring whose slots are produced by `init`
    pub(crate) fn new(mut init: impl FnMut() -> S) -> Self {
        Self {
            slots: core::array::from_fn(|_| UnsafeCell::new(init())),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Wrap an index into the ring
    #[inline(always)]
    pub(crate) const fn wrap(index: usize) -> usize {
        index & Self::MASK
    }

    /// Current producer index
    #[inline(always)]
    pub(crate) fn head(&self) -> usize {
        self.head.load(Ordering::Acquire)
    }

    /// Current consumer index
    #[inline(always)]
    pub(crate) fn tail(&self) -> usize {
        self.tail.load(Ordering::Acquire)
    }

    /// Slots between consumer and producer
    #[inline]
    pub(crate) fn pending(&self) -> usize {
        Self::wrap(self.head().wrapping_sub(self.tail()))
    }

    /// Raw pointer to a slot
    #[inline(always)]
    pub(crate) fn slot_ptr(&self, index: usize) -> *mut S {
        self.slots[Self::wrap(index)].get()
    }

    /// Iterate raw pointers to every slot
    pub(crate) fn slot_ptrs(&self) -> impl Iterator<Item = *mut S> + '_ {
        self.slots.iter().map(UnsafeCell::get)
    }

    // =========================================================================
    // Latest-wins discipline
    // =========================================================================

    /// Index the producer should write next.
    ///
    /// Normally the slot after `head`; when that slot is the consumer's, the
    /// newest unread slot is overwritten instead.
    pub(crate) fn next_write_index(&self) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let next = Self::wrap(head + 1);
        if next == self.tail() { head } else { next }
    }

    /// Make a written slot visible to the consumer
    #[inline]
    pub(crate) fn publish(&self, index: usize) {
        self.head.store(Self::wrap(index), Ordering::Release);
    }

    /// Step the consumer one slot towards `head` if new data exists.
    ///
    /// Returns the consumer's slot index after the step.
    pub(crate) fn advance_to_latest(&self) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        if self.head() == tail {
            return tail;
        }
        let next = Self::wrap(tail + 1);
        self.tail.store(next, Ordering::Release);
        next
    }

    /// Drop all unread slots; the consumer resumes at `head`.
    ///
    /// Only valid while the consumer context is not using the ring.
    pub(crate) fn skip_to_latest(&self) {
        self.tail.store(self.head(), Ordering::Release);
    }

    // =========================================================================
    // Queue discipline
    // =========================================================================

    /// Raw pointer to the slot the producer is filling
    #[inline]
    pub(crate) fn fill_ptr(&self) -> *mut S {
        self.slot_ptr(self.head.load(Ordering::Relaxed))
    }

    /// Hand the filled slot to the consumer.
    ///
    /// Returns `false` and keeps the slot for refilling when the ring is full.
    pub(crate) fn commit(&self) -> bool {
        let next = Self::wrap(self.head.load(Ordering::Relaxed) + 1);
        if next == self.tail() {
            return false;
        }
        self.head.store(next, Ordering::Release);
        true
    }

    /// Raw pointer to the oldest committed slot, if any
    pub(crate) fn peek_ptr(&self) -> Option<*const S> {
        let tail = self.tail.load(Ordering::Relaxed);
        if self.head() == tail {
            None
        } else {
            Some(self.slot_ptr(tail).cast_const())
        }
    }

    /// Return the oldest committed slot to the producer
    pub(crate) fn release(&self) {
        let tail = self.tail.load(Ordering::Relaxed);
        self.tail.store(Self::wrap(tail + 1), Ordering::Release);
    }
}

// =============================================================================
// Tests
// =============================================================================
