//! UART1 binding: receive interrupt and shared transmitter
//!
//! The UART lives in a critical-section mutex together with the line
//! accumulator. The receive interrupt drains it into [`LINE_QUEUE`]; the
//! serial writer task borrows it briefly through [`SharedUartTx`].

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use esp_hal::handler;
use esp_hal::uart::{Uart, UartInterrupt};
use esp_hal::Blocking;

use crate::serial::accumulator::LineAccumulator;
use crate::serial::queue::LineQueue;
use crate::serial::traits::ByteSource;

/// Completed lines waiting to be notified to the peer
pub static LINE_QUEUE: LineQueue<CriticalSectionRawMutex> = LineQueue::new();

/// UART and the accumulator fed by its interrupt
struct SerialPort {
    uart: Uart<'static, Blocking>,
    accumulator: LineAccumulator,
}

static SERIAL: Mutex<CriticalSectionRawMutex, RefCell<Option<SerialPort>>> =
    Mutex::new(RefCell::new(None));

impl ByteSource for Uart<'_, Blocking> {
    fn interrupt_pending(&mut self) -> bool {
        let pending = self.interrupts();
        self.clear_interrupts(pending);
        !pending.is_empty()
    }

    fn is_ready(&mut self) -> bool {
        self.read_ready()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

/// Hand the UART over to the receive interrupt.
///
/// Interrupts stay masked until the port is stored, so the handler never
/// observes an empty slot.
pub fn install(mut uart: Uart<'static, Blocking>) {
    SERIAL.lock(|cell| {
        uart.set_interrupt_handler(on_uart_interrupt);
        uart.listen(UartInterrupt::RxFifoFull);
        cell.replace(Some(SerialPort {
            uart,
            accumulator: LineAccumulator::new(),
        }));
    });
    log::info!("Serial: receive interrupt armed");
}

/// Disarm the receive interrupt and release the UART.
///
/// Used when startup is aborted after the UART was installed.
pub fn shutdown() {
    SERIAL.lock(|cell| {
        if let Some(mut port) = cell.borrow_mut().take() {
            port.uart.unlisten(UartInterrupt::RxFifoFull);
        }
    });
    log::warn!("Serial: receive interrupt disarmed");
}

#[handler]
fn on_uart_interrupt() {
    SERIAL.lock(|cell| {
        if let Some(port) = cell.borrow_mut().as_mut() {
            let SerialPort { uart, accumulator } = port;
            accumulator.on_interrupt(uart, &LINE_QUEUE);
        }
    });
}

/// Bytes dropped so far because a line exceeded its slot
pub fn truncated_bytes() -> u32 {
    SERIAL.lock(|cell| {
        cell.borrow()
            .as_ref()
            .map_or(0, |port| port.accumulator.dropped_bytes())
    })
}

/// Error type for shared UART writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialWriteError {
    /// The UART has not been installed yet
    NotInstalled,
    /// The peripheral rejected the write
    Transmit,
}

impl embedded_io::Error for SerialWriteError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            SerialWriteError::NotInstalled => embedded_io::ErrorKind::NotConnected,
            SerialWriteError::Transmit => embedded_io::ErrorKind::Other,
        }
    }
}

/// Transmit half of the installed UART that implements embedded_io::Write.
///
/// Each write holds the critical section only while bytes are pushed into the
/// TX FIFO.
pub struct SharedUartTx;

impl embedded_io::ErrorType for SharedUartTx {
    type Error = SerialWriteError;
}

impl embedded_io::Write for SharedUartTx {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        SERIAL.lock(|cell| match cell.borrow_mut().as_mut() {
            Some(port) => port
                .uart
                .write(buf)
                .map_err(|_| SerialWriteError::Transmit),
            None => Err(SerialWriteError::NotInstalled),
        })
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // Must not wait for TX idle inside the critical section
        Ok(())
    }
}
