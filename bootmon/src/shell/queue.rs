// SPDX-License-Identifier: MIT OR Apache-2.0

//! Receive byte queue.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Ring capacity. One slot is kept free to tell "full" from "empty", so at most
/// `RX_CAPACITY - 1` bytes can be pending.
pub const RX_CAPACITY: usize = 64;

/// Lock-free single-producer single-consumer byte ring between the UART receive interrupt and
/// the polling loop.
///
/// The producer only ever advances `head`, the consumer only ever advances `tail`; with one
/// writer per index, release/acquire pairs on the indices are all the synchronization needed.
/// Enqueueing into a full ring drops the byte: the interrupt handler must never block, and a
/// lost keystroke is the accepted price.
pub struct ByteQueue {
    buf: UnsafeCell<[u8; RX_CAPACITY]>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

// SAFETY: Soundness rests on the single-writer-per-index discipline described above. Each slot
// is written strictly before the index store that publishes it.
unsafe impl Sync for ByteQueue {}

impl ByteQueue {
    /// Create an instance.
    pub const fn new() -> Self {
        Self {
            buf: UnsafeCell::new([0; RX_CAPACITY]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Producer side. Called from interrupt context; never blocks.
    pub fn enqueue(&self, byte: u8) {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % RX_CAPACITY;

        // Advancing would make the queue look empty to the reader. Drop the byte.
        if next == self.tail.load(Ordering::Acquire) {
            return;
        }

        // SAFETY: Only the producer writes `head`, so the slot at `head` is not readable by the
        // consumer until the store below.
        unsafe { (*self.buf.get())[head] = byte };
        self.head.store(next, Ordering::Release);
    }

    /// Consumer side. Removes and returns the oldest pending byte.
    pub fn dequeue(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: The Acquire load above pairs with the producer's Release store, making the
        // slot contents at `tail` visible. Only the consumer writes `tail`.
        let byte = unsafe { (*self.buf.get())[tail] };
        self.tail.store((tail + 1) % RX_CAPACITY, Ordering::Release);

        Some(byte)
    }

    /// Whether any bytes are pending.
    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Relaxed) == self.head.load(Ordering::Acquire)
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::vec::Vec;

    #[test]
    fn drains_in_fifo_order() {
        let queue = ByteQueue::new();

        for byte in 0..10u8 {
            queue.enqueue(byte);
        }
        for byte in 0..10u8 {
            assert_eq!(queue.dequeue(), Some(byte));
        }
        assert_eq!(queue.dequeue(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn usable_capacity_is_one_below_ring_size() {
        let queue = ByteQueue::new();

        for byte in 0..(RX_CAPACITY as u8) {
            queue.enqueue(byte);
        }

        let drained: Vec<u8> = core::iter::from_fn(|| queue.dequeue()).collect();
        assert_eq!(drained.len(), RX_CAPACITY - 1);
    }

    #[test]
    fn wraps_across_the_ring_boundary() {
        let queue = ByteQueue::new();

        // Push the indices close to the wrap point, then stream past it.
        for round in 0..3 {
            for byte in 0..40u8 {
                queue.enqueue(byte.wrapping_add(round));
            }
            for byte in 0..40u8 {
                assert_eq!(queue.dequeue(), Some(byte.wrapping_add(round)));
            }
        }
    }

    proptest! {
        /// Any burst that fits the usable capacity is drained losslessly, in order.
        #[test]
        fn fifo_no_loss_within_capacity(bytes in prop::collection::vec(any::<u8>(), 0..RX_CAPACITY)) {
            let queue = ByteQueue::new();

            for byte in &bytes {
                queue.enqueue(*byte);
            }

            let drained: Vec<u8> = core::iter::from_fn(|| queue.dequeue()).collect();
            prop_assert_eq!(drained, bytes);
        }

        /// Overflow loses exactly the excess and keeps the FIFO order of the retained prefix.
        #[test]
        fn overflow_retains_ordered_prefix(bytes in prop::collection::vec(any::<u8>(), RX_CAPACITY..RX_CAPACITY * 3)) {
            let queue = ByteQueue::new();

            for byte in &bytes {
                queue.enqueue(*byte);
            }

            let drained: Vec<u8> = core::iter::from_fn(|| queue.dequeue()).collect();
            prop_assert_eq!(drained.as_slice(), &bytes[..RX_CAPACITY - 1]);
        }
    }
}
