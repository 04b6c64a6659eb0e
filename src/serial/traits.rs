//! Byte source trait for abstraction and testability
//!
//! This trait defines the receive side of the serial peripheral as seen from
//! its interrupt handler, allowing the actual UART driver to be swapped with a
//! mock for testing.

/// Receive side of a serial peripheral, polled from its interrupt handler
///
/// All methods are non-blocking. `read_byte` is only called after `is_ready`
/// has reported a byte.
pub trait ByteSource {
    /// Acknowledge and clear pending interrupts
    ///
    /// Returns false when nothing was pending.
    fn interrupt_pending(&mut self) -> bool;

    /// Returns true if at least one received byte can be read
    fn is_ready(&mut self) -> bool;

    /// Read exactly one byte
    ///
    /// Returns `None` if the peripheral reported an error or had no data after all.
    fn read_byte(&mut self) -> Option<u8>;
}

#[cfg(test)]
pub mod mock {
    //! Mock byte source for testing

    use super::*;
    use heapless::Deque;

    /// Mock byte source for unit testing
    pub struct MockByteSource {
        /// Bytes waiting in the simulated RX FIFO
        rx_fifo: Deque<u8, 256>,
        /// Whether an interrupt is latched
        pending: bool,
        /// Number of times the interrupt was acknowledged
        acknowledged: usize,
    }

    impl MockByteSource {
        /// Create a new mock with an empty FIFO and no pending interrupt
        pub fn new() -> Self {
            Self {
                rx_fifo: Deque::new(),
                pending: false,
                acknowledged: 0,
            }
        }

        /// Simulate bytes arriving on the wire (latches the interrupt)
        pub fn receive(&mut self, data: &[u8]) {
            for &byte in data {
                let _ = self.rx_fifo.push_back(byte);
            }
            self.pending = true;
        }

        /// Queue bytes without raising the interrupt
        pub fn receive_silently(&mut self, data: &[u8]) {
            for &byte in data {
                let _ = self.rx_fifo.push_back(byte);
            }
        }

        /// Bytes still unread in the FIFO
        pub fn remaining(&self) -> usize {
            self.rx_fifo.len()
        }

        /// Number of acknowledged interrupts
        pub fn acknowledged(&self) -> usize {
            self.acknowledged
        }
    }

    impl Default for MockByteSource {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ByteSource for MockByteSource {
        fn interrupt_pending(&mut self) -> bool {
            let pending = self.pending;
            if pending {
                self.acknowledged += 1;
            }
            self.pending = false;
            pending
        }

        fn is_ready(&mut self) -> bool {
            !self.rx_fifo.is_empty()
        }

        fn read_byte(&mut self) -> Option<u8> {
            self.rx_fifo.pop_front()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_interrupt_is_acknowledged_once() {
            let mut source = MockByteSource::new();
            assert!(!source.interrupt_pending());

            source.receive(b"x");
            assert!(source.interrupt_pending());
            assert!(!source.interrupt_pending());
            assert_eq!(source.acknowledged(), 1);
        }

        #[test]
        fn test_mock_reads_in_order() {
            let mut source = MockByteSource::new();
            source.receive(&[0x01, 0x02]);

            assert!(source.is_ready());
            assert_eq!(source.read_byte(), Some(0x01));
            assert_eq!(source.read_byte(), Some(0x02));
            assert!(!source.is_ready());
            assert_eq!(source.read_byte(), None);
        }
    }
}
