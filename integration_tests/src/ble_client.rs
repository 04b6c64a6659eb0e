//! BLE client for the bridge service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::time::timeout;
use uuid::Uuid;

/// Bridge service UUIDs
pub const BRIDGE_SERVICE_UUID: Uuid = Uuid::from_u128(0x00214367_8900_ffff_ffff_ffffffffffff);
const INBOUND_UUID: Uuid = Uuid::from_u128(0x00214367_8901_ffff_ffff_ffffffffffff); // Write to device
const OUTBOUND_UUID: Uuid = Uuid::from_u128(0x00214367_8902_ffff_ffff_ffffffffffff); // Notify from device

/// Size of one notified line slot
const LINE_SLOT_SIZE: usize = 32;

/// BLE client for the bridge device.
pub struct BleClient {
    peripheral: Peripheral,
    inbound_char: Characteristic,
    outbound_char: Characteristic,
    /// Lines received by notification, terminator and padding stripped
    lines: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl BleClient {
    /// Scan for a device by name and connect.
    pub async fn connect_by_name(name: &str, scan_timeout: Duration) -> Result<Self> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No Bluetooth adapters found"))?;

        adapter.start_scan(ScanFilter::default()).await?;
        let peripheral = Self::find_device_by_name(&adapter, name, scan_timeout).await?;
        adapter.stop_scan().await?;

        peripheral.connect().await?;
        peripheral.discover_services().await?;

        let characteristics = peripheral.characteristics();

        let inbound_char = characteristics
            .iter()
            .find(|c| c.uuid == INBOUND_UUID && c.service_uuid == BRIDGE_SERVICE_UUID)
            .cloned()
            .ok_or_else(|| anyhow!("Inbound characteristic not found"))?;

        let outbound_char = characteristics
            .iter()
            .find(|c| c.uuid == OUTBOUND_UUID && c.service_uuid == BRIDGE_SERVICE_UUID)
            .cloned()
            .ok_or_else(|| anyhow!("Outbound characteristic not found"))?;

        let lines = Arc::new(Mutex::new(Vec::new()));

        // Subscribe before spawning the listener so no line is missed
        peripheral.subscribe(&outbound_char).await?;

        let lines_clone = lines.clone();
        let peripheral_clone = peripheral.clone();
        tokio::spawn(async move {
            let mut stream = match peripheral_clone.notifications().await {
                Ok(s) => s,
                Err(_) => return,
            };

            while let Some(data) = stream.next().await {
                if data.uuid == OUTBOUND_UUID {
                    lines_clone.lock().await.push(strip_slot(&data.value));
                }
            }
        });

        Ok(Self {
            peripheral,
            inbound_char,
            outbound_char,
            lines,
        })
    }

    /// Find a device by name within the scan timeout.
    async fn find_device_by_name(
        adapter: &Adapter,
        name: &str,
        scan_timeout: Duration,
    ) -> Result<Peripheral> {
        let start = std::time::Instant::now();

        while start.elapsed() < scan_timeout {
            for peripheral in adapter.peripherals().await? {
                if let Some(props) = peripheral.properties().await? {
                    if props.local_name.as_deref() == Some(name) {
                        return Ok(peripheral);
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        Err(anyhow!("Device '{}' not found within timeout", name))
    }

    /// Write raw bytes to the inbound characteristic.
    pub async fn write(&self, data: &[u8]) -> Result<()> {
        self.peripheral
            .write(&self.inbound_char, data, WriteType::WithoutResponse)
            .await?;
        Ok(())
    }

    /// Wait until `count` lines have been notified, then take them.
    pub async fn wait_for_lines(&self, count: usize, wait: Duration) -> Result<Vec<Vec<u8>>> {
        let result = timeout(wait, async {
            loop {
                {
                    let mut lines = self.lines.lock().await;
                    if lines.len() >= count {
                        return lines.drain(..count).collect::<Vec<_>>();
                    }
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        result.map_err(|_| anyhow!("Timeout waiting for {} notified lines", count))
    }

    /// Lines received so far without waiting.
    pub async fn pending_lines(&self) -> usize {
        self.lines.lock().await.len()
    }

    /// Clear any received lines.
    pub async fn clear_lines(&self) {
        self.lines.lock().await.clear();
    }

    /// Disconnect from the device.
    pub async fn disconnect(&self) -> Result<()> {
        self.peripheral.unsubscribe(&self.outbound_char).await?;
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

/// Cut a notified slot at its terminator marker.
fn strip_slot(slot: &[u8]) -> Vec<u8> {
    let slot = &slot[..slot.len().min(LINE_SLOT_SIZE)];
    match slot.iter().position(|&b| b == 0x00) {
        Some(end) => slot[..end].to_vec(),
        None => slot.to_vec(),
    }
}
