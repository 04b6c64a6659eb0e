//! Bridge GATT service definition
//!
//! - Service UUID: 00214367-8900-FFFF-FFFF-FFFFFFFFFFFF
//! - Inbound Characteristic: 00214367-8901-... (write without response)
//! - Outbound Characteristic: 00214367-8902-... (notify)
//!
//! The UUID literals must match [`crate::config::ble`].

use trouble_host::prelude::*;

use crate::config::ble::INBOUND_MAX_LEN;
use crate::config::serial::LINE_SLOT_SIZE;
use crate::ble::data_service::AttributeHandles;

/// Serial bridge service
#[gatt_service(uuid = "00214367-8900-ffff-ffff-ffffffffffff")]
pub struct BridgeService {
    /// Inbound Characteristic - peer writes raw bytes here
    #[characteristic(uuid = "00214367-8901-ffff-ffff-ffffffffffff", write_without_response, value = [0u8; 128])]
    pub inbound: [u8; INBOUND_MAX_LEN],

    /// Outbound Characteristic - serial lines are notified here as terminated slots
    #[characteristic(uuid = "00214367-8902-ffff-ffff-ffffffffffff", notify, value = [0u8; 32])]
    pub outbound: [u8; LINE_SLOT_SIZE],
}

impl BridgeService {
    /// Handles the GATT server assigned to this service
    pub fn handles(&self) -> AttributeHandles {
        AttributeHandles {
            inbound: self.inbound.handle,
            outbound: self.outbound.handle,
            outbound_config: self.outbound.cccd_handle,
        }
    }
}
