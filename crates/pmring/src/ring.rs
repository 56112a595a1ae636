use crate::invariants::{
    debug_assert_bounded_count, debug_assert_head_not_past_tail, debug_assert_initialized_read,
    debug_assert_monotonic,
};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// Classic SPSC protocol with unbounded u64 sequence numbers for `head` and
// `tail`; the buffer index is `sequence & mask`. Sequence numbers never wrap
// in practice (2^64 hand-offs). Empty is exactly `head == tail`; full uses
// the sacrificed-slot discrimination, `(tail + 1) mod C == head` under the
// index mask, so a ring of C slots stores C - 1 items. With monotonic
// sequences that condition reduces to `tail - head == C - 1`, which is the
// form the checks below take.
//
// Producer (push):
//   1. Load `tail` Relaxed (only the producer writes tail)
//   2. Check `cached_head` (UnsafeCell, producer-private); refresh it with an
//      Acquire load of `head` only when the cache says full
//   3. Write the slot payload
//   4. Store `tail` Release, publishing the payload to the consumer
//
// Consumer (pop/peek):
//   1. Load `head` Relaxed (only the consumer writes head)
//   2. Check `cached_tail` (UnsafeCell, consumer-private); refresh it with an
//      Acquire load of `tail` only when the cache says empty
//   3. Read the slot payload
//   4. pop only: store `head` Release, returning the slot to the producer
//
// The cached copies have exactly one writer each, which is what makes the
// unsynchronized UnsafeCell accesses sound. Slot payloads need no atomicity
// of their own: a slot is written only between the full-check and the tail
// publish, and read only between the tail observation and the head publish.
//
// =============================================================================

/// Single-producer single-consumer bounded ring.
///
/// Lock-free and wait-free for the two participant threads. Exactly one
/// thread may call the producer operation ([`push`](Ring::push)) and exactly
/// one thread may call the consumer operations ([`pop`](Ring::pop),
/// [`peek`](Ring::peek)); any third-thread access to those operations is
/// unspecified. The observational queries (`len`, `is_empty`, `is_full`) may
/// return stale answers to the non-owning side but are monotonically correct
/// to the owner.
pub struct Ring<T> {
    // === PRODUCER HOT ===
    /// Tail sequence (written by producer, read by consumer).
    tail: CachePadded<AtomicU64>,
    /// Producer's cached view of head (avoids cross-core reads).
    cached_head: CachePadded<UnsafeCell<u64>>,

    // === CONSUMER HOT ===
    /// Head sequence (written by consumer, read by producer).
    head: CachePadded<AtomicU64>,
    /// Consumer's cached view of tail.
    cached_tail: CachePadded<UnsafeCell<u64>>,

    // === DATA ===
    /// Fixed-size slot storage. `Box<[T]>` rather than `Vec<T>`: the size
    /// never changes after construction.
    buffer: UnsafeCell<Box<[MaybeUninit<T>]>>,
    capacity: usize,
}

// Safety: the SPSC protocol above synchronizes all slot accesses; Ring is
// Send + Sync whenever the payload can move between threads.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    /// Creates a ring with `capacity` slots, of which one is sacrificed to
    /// discriminate full from empty: the ring stores `capacity - 1` items.
    ///
    /// # Panics
    ///
    /// Panics unless `capacity` is a power of two in `2..=2^20`. The
    /// power-of-two requirement is what lets the index mask replace a
    /// modulo on the hot path.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two() && capacity >= 2,
            "ring capacity must be a power of two >= 2, got {capacity}"
        );
        assert!(
            capacity <= (1 << 20),
            "ring capacity {capacity} exceeds 2^20 slots"
        );

        let mut buffer = Vec::with_capacity(capacity);
        buffer.resize_with(capacity, MaybeUninit::uninit);

        Self {
            tail: CachePadded::new(AtomicU64::new(0)),
            cached_head: CachePadded::new(UnsafeCell::new(0)),
            head: CachePadded::new(AtomicU64::new(0)),
            cached_tail: CachePadded::new(UnsafeCell::new(0)),
            buffer: UnsafeCell::new(buffer.into_boxed_slice()),
            capacity,
        }
    }

    /// Slot count. The ring stores [`capacity`](Ring::capacity)` - 1` items.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn mask(&self) -> usize {
        self.capacity - 1
    }

    /// Current number of items. Observational; exact only to the owner side.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Relaxed);
        tail.wrapping_sub(head) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Relaxed) == self.head.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        // The sacrificed slot: next(tail) == head under the mask.
        self.len() >= self.capacity - 1
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Enqueue one item. Returns `false` if the ring is full.
    ///
    /// The new tail becomes visible to the consumer only after the slot
    /// payload is (store-release on tail).
    pub fn push(&self, item: T) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);

        // Fast path: check the cached head.
        // SAFETY: cached_head is written only by the producer (this path).
        let cached_head = unsafe { *self.cached_head.get() };
        if tail.wrapping_sub(cached_head) as usize >= self.capacity - 1 {
            // Slow path: refresh the cache.
            let head = self.head.load(Ordering::Acquire);
            // SAFETY: single writer as above; the Acquire load synchronizes
            // with the consumer's Release store of head.
            unsafe {
                *self.cached_head.get() = head;
            }
            if tail.wrapping_sub(head) as usize >= self.capacity - 1 {
                return false;
            }
        }

        let idx = (tail as usize) & self.mask();
        // SAFETY: the full-check guarantees this slot is outside [head, tail)
        // and therefore not observed by the consumer; only the producer
        // writes slots at or beyond tail.
        unsafe {
            (*self.buffer.get())[idx].write(item);
        }

        let new_tail = tail.wrapping_add(1);
        debug_assert_monotonic!("tail", tail, new_tail);
        debug_assert_bounded_count!(
            new_tail.wrapping_sub(self.head.load(Ordering::Relaxed)) as usize,
            self.capacity - 1
        );

        self.tail.store(new_tail, Ordering::Release);
        true
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Consumer-side availability check; refreshes the cached tail if needed.
    #[inline]
    fn available(&self, head: u64) -> Option<u64> {
        // SAFETY: cached_tail is written only by the consumer (this path).
        let cached_tail = unsafe { *self.cached_tail.get() };
        if cached_tail != head {
            return Some(cached_tail);
        }
        let tail = self.tail.load(Ordering::Acquire);
        // SAFETY: single writer as above; the Acquire load synchronizes with
        // the producer's Release store of tail.
        unsafe {
            *self.cached_tail.get() = tail;
        }
        if tail == head {
            None
        } else {
            Some(tail)
        }
    }

    /// Dequeue the oldest item. Returns `None` if the ring is empty.
    pub fn pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.available(head)?;

        debug_assert_initialized_read!(head, head, tail);
        let idx = (head as usize) & self.mask();
        // SAFETY: head is inside [head, tail), so the slot was fully written
        // by the producer and published by its Release store of tail, which
        // the Acquire load in `available` synchronized with. Ownership moves
        // out; the slot is reusable once head advances below.
        let item = unsafe { (*self.buffer.get())[idx].assume_init_read() };

        let new_head = head.wrapping_add(1);
        debug_assert_monotonic!("head", head, new_head);
        debug_assert_head_not_past_tail!(new_head, tail);

        self.head.store(new_head, Ordering::Release);
        Some(item)
    }

    /// Inspect the oldest item without consuming it.
    ///
    /// Lets the consumer decide whether to commit to a candidate before
    /// advancing head. The reference stays valid until the consumer itself
    /// pops; the producer never touches slots inside `[head, tail)`.
    pub fn peek(&self) -> Option<&T> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.available(head)?;

        debug_assert_initialized_read!(head, head, tail);
        let idx = (head as usize) & self.mask();
        // SAFETY: same publication argument as `pop`, without moving the
        // value out or advancing head.
        Some(unsafe { (*self.buffer.get())[idx].assume_init_ref() })
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        // Drop any items still sitting in [head, tail).
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        let count = tail.wrapping_sub(head) as usize;

        if count > 0 {
            let mask = self.mask();
            let buffer = self.buffer.get_mut();
            for i in 0..count {
                let idx = ((head as usize).wrapping_add(i)) & mask;
                unsafe {
                    ptr::drop_in_place(buffer[idx].as_mut_ptr());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_fifo() {
        let ring = Ring::<u64>::new(8);

        for i in 0..5 {
            assert!(ring.push(i * 10));
        }
        assert_eq!(ring.len(), 5);

        for i in 0..5 {
            assert_eq!(ring.pop(), Some(i * 10));
        }
        assert!(ring.is_empty());
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn peek_does_not_advance() {
        let ring = Ring::<u64>::new(4);
        assert_eq!(ring.peek(), None);

        assert!(ring.push(7));
        assert_eq!(ring.peek(), Some(&7));
        assert_eq!(ring.peek(), Some(&7));
        assert_eq!(ring.len(), 1);

        assert_eq!(ring.pop(), Some(7));
        assert_eq!(ring.peek(), None);
    }

    #[test]
    fn full_rejects_push() {
        // One of the four slots is sacrificed: three items fit.
        let ring = Ring::<u64>::new(4);
        for i in 0..3 {
            assert!(ring.push(i));
        }
        assert!(ring.is_full());
        assert!(!ring.push(99));

        // One slot frees up after a pop.
        assert_eq!(ring.pop(), Some(0));
        assert!(ring.push(99));
        assert!(ring.is_full());
    }

    #[test]
    fn wraps_around_capacity() {
        let ring = Ring::<u64>::new(4);
        for round in 0..10u64 {
            assert!(ring.push(round));
            assert_eq!(ring.pop(), Some(round));
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn quiescent_queries_are_idempotent() {
        let ring = Ring::<u64>::new(8);
        ring.push(1);
        ring.push(2);

        for _ in 0..3 {
            assert_eq!(ring.len(), 2);
            assert!(!ring.is_empty());
            assert!(!ring.is_full());
        }
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn rejects_non_power_of_two() {
        let _ = Ring::<u64>::new(6);
    }

    #[test]
    fn drops_remaining_items() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROPS.store(0, Ordering::SeqCst);
        {
            let ring = Ring::<Tracked>::new(8);
            for _ in 0..3 {
                assert!(ring.push(Tracked));
            }
            drop(ring.pop());
        }
        assert_eq!(DROPS.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn two_thread_handoff() {
        use std::sync::Arc;
        use std::thread;

        const N: u64 = 100_000;
        let ring = Arc::new(Ring::<u64>::new(1024));
        let producer_ring = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            for i in 0..N {
                while !producer_ring.push(i) {
                    std::hint::spin_loop();
                }
            }
        });

        let mut expected = 0;
        while expected < N {
            if let Some(v) = ring.pop() {
                assert_eq!(v, expected);
                expected += 1;
            } else {
                std::hint::spin_loop();
            }
        }

        producer.join().unwrap();
        assert!(ring.is_empty());
    }
}
