#![cfg_attr(not(test), no_std)]

pub mod ble;
pub mod bridge;
pub mod config;
pub mod serial;

// These modules depend on esp-hal/trouble features only available with embedded feature
#[cfg(feature = "embedded")]
pub mod tasks;
