//! Glue between the serial and BLE sides

pub mod forward;
pub mod outbound;
pub mod startup;
pub mod stats;

pub use forward::{InboundChunk, SerialForwarder};
pub use outbound::{next_outbound, Outbound};
pub use startup::{StartupError, StartupSequence, StartupStage, TransportInitError};
pub use stats::{BridgeStats, StatsMonitor};
