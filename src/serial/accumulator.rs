//! Line accumulator for the serial receive interrupt
//!
//! Reassembles bytes into lines terminated by CR or LF and hands each
//! completed line to the [`LineQueue`].

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::config::serial::{LINE_MAX_PAYLOAD, LINE_SLOT_SIZE};
use crate::serial::queue::{Line, LineQueue};
use crate::serial::traits::ByteSource;

/// Returns true for the bytes that end a line
pub fn is_line_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// Accumulates incoming bytes and extracts complete lines.
///
/// The buffer is reused in place. At most [`LINE_MAX_PAYLOAD`] bytes are kept
/// per line; further bytes are dropped until the next terminator. A terminator
/// with nothing accumulated is swallowed, so CR LF pairs and blank lines never
/// produce empty lines.
pub struct LineAccumulator {
    buffer: [u8; LINE_SLOT_SIZE],
    cursor: usize,
    dropped_bytes: u32,
}

impl LineAccumulator {
    /// Create a new empty accumulator.
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; LINE_SLOT_SIZE],
            cursor: 0,
            dropped_bytes: 0,
        }
    }

    /// Push a byte into the accumulator.
    ///
    /// Returns `Some(line)` when a terminator completes a non-empty line.
    pub fn push(&mut self, byte: u8) -> Option<Line> {
        if is_line_terminator(byte) {
            if self.cursor == 0 {
                return None;
            }

            let line = Line::new(&self.buffer[..self.cursor]);
            self.cursor = 0;
            return Some(line);
        }

        if self.cursor < LINE_MAX_PAYLOAD {
            self.buffer[self.cursor] = byte;
            self.cursor += 1;
        } else {
            // Line full: drop until the next terminator
            self.dropped_bytes = self.dropped_bytes.wrapping_add(1);
        }

        None
    }

    /// Service one receive interrupt.
    ///
    /// Drains every ready byte from `source` and enqueues each completed line.
    /// Lines that do not fit in the queue are dropped by the queue. Returns the
    /// number of bytes read.
    pub fn on_interrupt<S: ByteSource, M: RawMutex>(
        &mut self,
        source: &mut S,
        queue: &LineQueue<M>,
    ) -> usize {
        if !source.interrupt_pending() {
            return 0;
        }

        let mut read = 0;
        while source.is_ready() {
            let Some(byte) = source.read_byte() else {
                break;
            };
            read += 1;

            if let Some(line) = self.push(byte) {
                let _ = queue.enqueue(line);
            }
        }

        read
    }

    /// Returns true if no partial line is in progress.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Returns the current number of bytes in the buffer.
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// Number of bytes dropped because a line was already full
    pub fn dropped_bytes(&self) -> u32 {
        self.dropped_bytes
    }
}

impl Default for LineAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
