//! Hardware and protocol configuration constants for the ESP32-S3 bridge

/// Serial (UART) side of the bridge
pub mod serial {
    pub const BAUD_RATE: u32 = 115200;

    /// UART1 pins
    pub const TX_PIN: u8 = 17;
    pub const RX_PIN: u8 = 18;

    /// Raise the RX interrupt for every received byte
    pub const RX_FIFO_FULL_THRESHOLD: u16 = 1;

    /// Size of one line slot, terminator marker included
    pub const LINE_SLOT_SIZE: usize = 32;

    /// Usable payload bytes per line
    pub const LINE_MAX_PAYLOAD: usize = LINE_SLOT_SIZE - 1;

    /// Number of completed lines the queue can hold
    pub const LINE_QUEUE_DEPTH: usize = 10;

    /// Marker written after the last payload byte of a line
    pub const LINE_TERMINATOR_MARKER: u8 = 0x00;
}

/// BLE side of the bridge
pub mod ble {
    /// Device name prefix, followed by six hex digits of the MAC
    pub const DEVICE_NAME_PREFIX: &str = "SerialBridge-";

    /// Primary bridge service
    pub const SERVICE_UUID: &str = "00214367-8900-ffff-ffff-ffffffffffff";

    /// Peer -> device, write without response
    pub const INBOUND_UUID: &str = "00214367-8901-ffff-ffff-ffffffffffff";

    /// Device -> peer, notify
    pub const OUTBOUND_UUID: &str = "00214367-8902-ffff-ffff-ffffffffffff";

    /// 16-bit service UUIDs listed in the advertisement (little-endian):
    /// Heart Rate, Battery, Device Information
    pub const ADVERTISED_SERVICE_UUIDS: [[u8; 2]; 3] = [[0x0d, 0x18], [0x0f, 0x18], [0x0a, 0x18]];

    /// Maximum length of a single inbound write
    pub const INBOUND_MAX_LEN: usize = 128;

    /// Number of maximum concurrent connections
    pub const CONNECTIONS_MAX: usize = 1;

    /// Number of L2CAP channels
    pub const L2CAP_CHANNELS_MAX: usize = 3;

    /// Fixed tail of the random static address (head comes from the MAC)
    pub const ADDRESS_SUFFIX: [u8; 3] = [0x1E, 0x83, 0xE7];
}

/// Glue between the two sides
pub mod bridge {
    /// Inbound chunks waiting for the UART transmitter
    pub const INBOUND_CHANNEL_DEPTH: usize = 8;

    /// Size of one inbound chunk
    pub const INBOUND_CHUNK_LEN: usize = 64;

    /// How often drop statistics are checked while connected
    pub const STATS_INTERVAL_MS: u64 = 5_000;
}
