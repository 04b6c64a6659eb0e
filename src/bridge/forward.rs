//! Inbound forwarding: BLE writes to the serial transmitter

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;
use heapless::Vec;

use crate::ble::data_service::InboundHandler;
use crate::config::bridge::INBOUND_CHUNK_LEN;

/// A piece of an inbound write waiting for the UART
pub type InboundChunk = Vec<u8, INBOUND_CHUNK_LEN>;

/// Inbound handler that queues peer data for the serial writer task
///
/// Payloads are split into [`InboundChunk`]s. A chunk that does not fit in the
/// channel is dropped and counted; the peer is never told.
pub struct SerialForwarder<'a, M: RawMutex, const N: usize> {
    sender: Sender<'a, M, InboundChunk, N>,
    dropped: u32,
}

impl<'a, M: RawMutex, const N: usize> SerialForwarder<'a, M, N> {
    pub fn new(sender: Sender<'a, M, InboundChunk, N>) -> Self {
        Self {
            sender,
            dropped: 0,
        }
    }
}

impl<M: RawMutex, const N: usize> InboundHandler for SerialForwarder<'_, M, N> {
    fn on_inbound(&mut self, data: &[u8]) {
        for piece in data.chunks(INBOUND_CHUNK_LEN) {
            // chunks() never yields more than INBOUND_CHUNK_LEN bytes
            let Ok(chunk) = InboundChunk::from_slice(piece) else {
                continue;
            };
            if self.sender.try_send(chunk).is_err() {
                self.dropped = self.dropped.wrapping_add(1);
                log::debug!("Bridge: serial side busy, dropped inbound chunk");
            }
        }
    }

    /// Number of chunks dropped because the serial side was behind
    fn dropped(&self) -> u32 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::channel::Channel;

    #[test]
    fn test_small_write_is_one_chunk() {
        let channel: Channel<NoopRawMutex, InboundChunk, 4> = Channel::new();
        let mut forwarder = SerialForwarder::new(channel.sender());

        forwarder.on_inbound(b"AB");

        let chunk = channel.try_receive().unwrap();
        assert_eq!(chunk.as_slice(), b"AB");
        assert!(channel.try_receive().is_err());
    }

    #[test]
    fn test_large_write_is_split() {
        let channel: Channel<NoopRawMutex, InboundChunk, 4> = Channel::new();
        let mut forwarder = SerialForwarder::new(channel.sender());

        let data = [0x55u8; INBOUND_CHUNK_LEN + 10];
        forwarder.on_inbound(&data);

        assert_eq!(channel.try_receive().unwrap().len(), INBOUND_CHUNK_LEN);
        assert_eq!(channel.try_receive().unwrap().len(), 10);
        assert_eq!(forwarder.dropped(), 0);
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let channel: Channel<NoopRawMutex, InboundChunk, 1> = Channel::new();
        let mut forwarder = SerialForwarder::new(channel.sender());

        forwarder.on_inbound(b"first");
        forwarder.on_inbound(b"second");

        assert_eq!(forwarder.dropped(), 1);
        assert_eq!(channel.try_receive().unwrap().as_slice(), b"first");
    }

    #[test]
    fn test_empty_write_sends_nothing() {
        let channel: Channel<NoopRawMutex, InboundChunk, 1> = Channel::new();
        let mut forwarder = SerialForwarder::new(channel.sender());

        forwarder.on_inbound(&[]);
        assert!(channel.try_receive().is_err());
    }
}
