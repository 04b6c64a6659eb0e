//! Bridge data service logic
//!
//! The GATT table itself is declared in [`super::service`]. This module
//! decides what happens when the peer touches one of its attributes, and is
//! independent of the BLE stack so it can be tested on the host.

/// Receives every payload the peer writes to the inbound characteristic
///
/// Runs on the BLE task with stack-internal state borrowed, so it must return
/// quickly.
pub trait InboundHandler {
    fn on_inbound(&mut self, data: &[u8]);

    /// Payloads the handler had to discard
    fn dropped(&self) -> u32 {
        0
    }
}

impl<F: FnMut(&[u8])> InboundHandler for F {
    fn on_inbound(&mut self, data: &[u8]) {
        self(data)
    }
}

/// The attributes of the bridge service that can receive writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAttribute {
    /// Peer -> device data, write without response
    Inbound,
    /// Device -> peer data, notify only
    Outbound,
    /// Subscription switch of [`ServiceAttribute::Outbound`]
    OutboundConfig,
}

/// Attribute handles assigned by the GATT server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeHandles {
    pub inbound: u16,
    pub outbound: u16,
    pub outbound_config: Option<u16>,
}

impl AttributeHandles {
    /// Map a handle from a GATT event to the attribute it belongs to
    pub fn resolve(&self, handle: u16) -> Option<ServiceAttribute> {
        if handle == self.inbound {
            Some(ServiceAttribute::Inbound)
        } else if handle == self.outbound {
            Some(ServiceAttribute::Outbound)
        } else if self.outbound_config == Some(handle) {
            Some(ServiceAttribute::OutboundConfig)
        } else {
            None
        }
    }
}

/// CCCD bit enabling notifications
const CCCD_NOTIFY: u8 = 0x01;

/// Per-connection state of the bridge service
///
/// The inbound handler is injected at construction; with `None` inbound writes
/// are consumed and discarded.
pub struct DataService<H> {
    handler: Option<H>,
    subscribed: bool,
}

impl<H: InboundHandler> DataService<H> {
    pub fn new(handler: Option<H>) -> Self {
        Self {
            handler,
            subscribed: false,
        }
    }

    /// Handle a write from the peer
    ///
    /// Returns the number of bytes consumed. Inbound writes are always
    /// consumed in full, whatever the handler does with them.
    pub fn on_write(&mut self, attribute: ServiceAttribute, data: &[u8]) -> usize {
        match attribute {
            ServiceAttribute::Inbound => {
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_inbound(data);
                }
                data.len()
            }
            ServiceAttribute::OutboundConfig => {
                let enabled = data.first().is_some_and(|&bits| bits & CCCD_NOTIFY != 0);
                self.set_subscribed(enabled);
                data.len()
            }
            ServiceAttribute::Outbound => {
                log::warn!("BLE: ignoring write to notify-only characteristic");
                0
            }
        }
    }

    /// Returns true while the peer wants outbound notifications
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Forget the subscription of the previous peer
    pub fn on_connect(&mut self) {
        self.subscribed = false;
    }

    pub fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    fn set_subscribed(&mut self, enabled: bool) {
        if enabled != self.subscribed {
            log::info!(
                "BLE: outbound notifications {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        self.subscribed = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    type Calls = Vec<(Vec<u8, 16>, usize), 4>;

    #[test]
    fn test_inbound_write_reaches_handler() {
        let mut calls: Calls = Vec::new();

        {
            let mut service = DataService::new(Some(|data: &[u8]| {
                calls
                    .push((Vec::from_slice(data).unwrap(), data.len()))
                    .unwrap();
            }));
            assert_eq!(service.on_write(ServiceAttribute::Inbound, b"AB"), 2);
        }

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_slice(), &[0x41, 0x42]);
        assert_eq!(calls[0].1, 2);
    }

    #[test]
    fn test_inbound_write_without_handler_is_consumed() {
        let mut service: DataService<fn(&[u8])> = DataService::new(None);

        assert_eq!(service.on_write(ServiceAttribute::Inbound, b"AB"), 2);
        assert!(!service.is_subscribed());
        assert!(service.handler().is_none());
    }

    #[test]
    fn test_cccd_write_toggles_subscription() {
        let mut service: DataService<fn(&[u8])> = DataService::new(None);

        service.on_write(ServiceAttribute::OutboundConfig, &[0x01, 0x00]);
        assert!(service.is_subscribed());

        service.on_write(ServiceAttribute::OutboundConfig, &[0x00, 0x00]);
        assert!(!service.is_subscribed());

        // Indications only: not a notification subscription
        service.on_write(ServiceAttribute::OutboundConfig, &[0x02, 0x00]);
        assert!(!service.is_subscribed());
    }

    #[test]
    fn test_new_connection_clears_subscription() {
        let mut service: DataService<fn(&[u8])> = DataService::new(None);
        service.on_write(ServiceAttribute::OutboundConfig, &[0x01, 0x00]);

        service.on_connect();
        assert!(!service.is_subscribed());
    }

    #[test]
    fn test_outbound_is_not_writable() {
        let mut hits = 0;
        let mut service = DataService::new(Some(|_: &[u8]| hits += 1));

        assert_eq!(service.on_write(ServiceAttribute::Outbound, b"nope"), 0);
        drop(service);
        assert_eq!(hits, 0);
    }

    #[test]
    fn test_resolve_handles() {
        let handles = AttributeHandles {
            inbound: 3,
            outbound: 5,
            outbound_config: Some(6),
        };

        assert_eq!(handles.resolve(3), Some(ServiceAttribute::Inbound));
        assert_eq!(handles.resolve(5), Some(ServiceAttribute::Outbound));
        assert_eq!(handles.resolve(6), Some(ServiceAttribute::OutboundConfig));
        assert_eq!(handles.resolve(1), None);
    }
}
