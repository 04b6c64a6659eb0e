//! Serial writer task
//!
//! Drains inbound chunks received over BLE into the UART. Generic over any
//! blocking `embedded_io::Write`, so it works with the shared UART transmitter
//! or any other serial sink.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver};
use embedded_io::Write;

use crate::bridge::InboundChunk;
use crate::config::bridge::INBOUND_CHANNEL_DEPTH;

/// Type alias for the inbound channel receiver
pub type InboundReceiver = Receiver<'static, CriticalSectionRawMutex, InboundChunk, INBOUND_CHANNEL_DEPTH>;

/// Chunks written by the BLE peer, waiting for the UART
pub static INBOUND_CHANNEL: Channel<CriticalSectionRawMutex, InboundChunk, INBOUND_CHANNEL_DEPTH> =
    Channel::new();

/// Task that writes inbound chunks to a serial interface.
pub async fn serial_writer_task<W: Write>(mut writer: W, receiver: InboundReceiver) {
    loop {
        let chunk = receiver.receive().await;

        if let Err(e) = writer.write_all(&chunk) {
            // Chunk is lost; the peer never learns about it
            log::warn!("Serial: write failed ({:?}), dropped {} bytes", e, chunk.len());
        }
    }
}
