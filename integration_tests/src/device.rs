//! Serial side of the device under test.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use serialport::SerialPort;

/// Find the first USB serial adapter (ttyUSB / ttyACM).
pub fn find_serial_port() -> Result<String> {
    let ports = serialport::available_ports()?;
    ports
        .into_iter()
        .map(|p| p.port_name)
        .find(|name| name.contains("ttyUSB") || name.contains("ttyACM"))
        .ok_or_else(|| anyhow::anyhow!("No serial adapter found - ensure the bridge UART is connected"))
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str) -> Result<String> {
    if port_arg == "auto" {
        find_serial_port()
    } else {
        Ok(port_arg.to_string())
    }
}

/// Client for the UART wired to the bridge.
pub struct SerialClient {
    port: Box<dyn SerialPort>,
}

impl SerialClient {
    /// Open the serial port.
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;

        Ok(Self { port })
    }

    /// Drain all pending data from the serial port.
    pub fn drain_buffer(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::All)?;

        let mut buf = [0u8; 256];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Write raw bytes to the device.
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    /// Read until `expected` bytes have arrived or the timeout expires.
    pub fn read_exact_within(&mut self, expected: usize, timeout: Duration) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        let mut buf = [0u8; 64];
        let start = Instant::now();

        while data.len() < expected && start.elapsed() < timeout {
            match self.port.read(&mut buf) {
                Ok(n) => data.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if data.len() < expected {
            anyhow::bail!(
                "Timeout waiting for serial data, got {} of {} bytes: {:02x?}",
                data.len(),
                expected,
                data
            );
        }
        Ok(data)
    }
}
