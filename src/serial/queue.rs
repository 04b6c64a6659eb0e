//! Bounded queue of completed serial lines
//!
//! The queue is the synchronisation boundary between the UART interrupt
//! (producer) and the BLE task (consumer). Enqueueing never waits: when all
//! slots are taken the new line is dropped and counted.

use core::future::Future;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::config::serial::{
    LINE_MAX_PAYLOAD, LINE_QUEUE_DEPTH, LINE_SLOT_SIZE, LINE_TERMINATOR_MARKER,
};

/// One completed line in its fixed-size slot
///
/// The payload is followed by [`LINE_TERMINATOR_MARKER`]; the rest of the slot
/// is zero.
#[repr(C, align(4))]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Line {
    slot: [u8; LINE_SLOT_SIZE],
    len: u8,
}

impl Line {
    /// Build a line from accumulated payload bytes
    ///
    /// Bytes beyond [`LINE_MAX_PAYLOAD`] are cut off so the terminator always fits.
    pub fn new(payload: &[u8]) -> Self {
        let len = payload.len().min(LINE_MAX_PAYLOAD);
        let mut slot = [0u8; LINE_SLOT_SIZE];
        slot[..len].copy_from_slice(&payload[..len]);
        slot[len] = LINE_TERMINATOR_MARKER;
        Self {
            slot,
            len: len as u8,
        }
    }

    /// Payload without the terminator
    pub fn as_bytes(&self) -> &[u8] {
        &self.slot[..self.len as usize]
    }

    /// Whole slot, terminator and padding included
    pub fn as_slot(&self) -> &[u8; LINE_SLOT_SIZE] {
        &self.slot
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl core::fmt::Debug for Line {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match core::str::from_utf8(self.as_bytes()) {
            Ok(s) => write!(f, "Line({:?})", s),
            Err(_) => write!(f, "Line({:02x?})", self.as_bytes()),
        }
    }
}

/// Fixed-capacity FIFO of [`Line`]s
///
/// Generic over the raw mutex so the device can use a critical-section mutex
/// (interrupt safe) while host tests use a no-op one.
pub struct LineQueue<M: RawMutex> {
    channel: Channel<M, Line, LINE_QUEUE_DEPTH>,
    dropped: AtomicU32,
}

impl<M: RawMutex> LineQueue<M> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Copy a line into the next free slot
    ///
    /// Returns false without waiting if all slots are occupied. The line is
    /// dropped in that case and the drop counter incremented.
    pub fn enqueue(&self, line: Line) -> bool {
        match self.channel.try_send(line) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Wait for the oldest line
    pub async fn dequeue(&self) -> Line {
        self.channel.receive().await
    }

    /// Wait for the oldest line until `deadline` resolves
    ///
    /// A line that is already queued wins over a deadline that is already due.
    pub async fn dequeue_until<F: Future>(&self, deadline: F) -> Option<Line> {
        match select(self.channel.receive(), deadline).await {
            Either::First(line) => Some(line),
            Either::Second(_) => None,
        }
    }

    /// Take the oldest line if there is one
    pub fn try_dequeue(&self) -> Option<Line> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.channel.is_full()
    }

    /// Number of lines dropped because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<M: RawMutex> Default for LineQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    fn line(text: &str) -> Line {
        Line::new(text.as_bytes())
    }

    #[test]
    fn test_line_is_terminated() {
        let l = line("AB");
        assert_eq!(l.as_bytes(), b"AB");
        assert_eq!(l.len(), 2);
        assert_eq!(l.as_slot()[2], LINE_TERMINATOR_MARKER);
        assert!(l.as_slot()[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_line_truncates_to_max_payload() {
        let long = [b'x'; LINE_SLOT_SIZE + 4];
        let l = Line::new(&long);
        assert_eq!(l.len(), LINE_MAX_PAYLOAD);
        assert_eq!(l.as_slot()[LINE_MAX_PAYLOAD], LINE_TERMINATOR_MARKER);
    }

    #[test]
    fn test_line_slot_is_aligned() {
        assert_eq!(core::mem::align_of::<Line>(), 4);
    }

    #[test]
    fn test_fifo_order() {
        let queue: LineQueue<NoopRawMutex> = LineQueue::new();
        assert!(queue.enqueue(line("one")));
        assert!(queue.enqueue(line("two")));
        assert!(queue.enqueue(line("three")));

        futures::executor::block_on(async {
            assert_eq!(queue.dequeue().await.as_bytes(), b"one");
            assert_eq!(queue.dequeue().await.as_bytes(), b"two");
            assert_eq!(queue.dequeue().await.as_bytes(), b"three");
        });
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_rejects_and_keeps_contents() {
        let queue: LineQueue<NoopRawMutex> = LineQueue::new();
        let mut text = heapless::String::<8>::new();

        for i in 0..LINE_QUEUE_DEPTH {
            text.clear();
            core::fmt::write(&mut text, format_args!("line{}", i)).unwrap();
            assert!(queue.enqueue(line(&text)));
        }
        assert!(queue.is_full());

        assert!(!queue.enqueue(line("overflow")));
        assert_eq!(queue.len(), LINE_QUEUE_DEPTH);
        assert_eq!(queue.dropped(), 1);

        // Oldest entry is untouched
        assert_eq!(queue.try_dequeue().unwrap().as_bytes(), b"line0");
    }

    #[test]
    fn test_dequeue_until_times_out_on_empty_queue() {
        let queue: LineQueue<NoopRawMutex> = LineQueue::new();

        let result = futures::executor::block_on(queue.dequeue_until(core::future::ready(())));
        assert!(result.is_none());
    }

    #[test]
    fn test_dequeue_until_prefers_queued_line() {
        let queue: LineQueue<NoopRawMutex> = LineQueue::new();
        queue.enqueue(line("ready"));

        let result = futures::executor::block_on(queue.dequeue_until(core::future::ready(())));
        assert_eq!(result.unwrap().as_bytes(), b"ready");
    }

    #[test]
    fn test_try_dequeue_empty() {
        let queue: LineQueue<NoopRawMutex> = LineQueue::new();
        assert!(queue.try_dequeue().is_none());
        assert_eq!(queue.dropped(), 0);
    }
}
