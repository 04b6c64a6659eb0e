//! Bluetooth Low Energy module
//!
//! Provides the bridge service: one inbound characteristic the peer writes
//! to, and one outbound characteristic carrying serial lines as notifications.

pub mod advertising;
pub mod data_service;

#[cfg(feature = "embedded")]
pub mod service;

pub use data_service::{AttributeHandles, DataService, InboundHandler, ServiceAttribute};

#[cfg(feature = "embedded")]
pub use service::BridgeService;
