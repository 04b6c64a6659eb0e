//! BLE task for the serial bridge
//!
//! Runs the BLE host, advertises the bridge service, and for the single
//! connected peer routes inbound writes to the injected handler and queued
//! serial lines to outbound notifications.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Ticker, Timer};
use trouble_host::prelude::*;

use crate::ble::advertising::{device_address, format_device_name, DEVICE_NAME_LEN};
use crate::ble::data_service::{DataService, InboundHandler};
use crate::ble::service::BridgeService;
use crate::bridge::outbound::{next_outbound, Outbound};
use crate::bridge::startup::{StartupSequence, StartupStage};
use crate::bridge::stats::{BridgeStats, StatsMonitor};
use crate::config::ble::{ADVERTISED_SERVICE_UUIDS, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX};
use crate::config::bridge::STATS_INTERVAL_MS;
use crate::serial::uart::{self, LINE_QUEUE};

/// BLE GATT Server with the bridge service
#[gatt_server(mutex_type = CriticalSectionRawMutex)]
struct Server {
    bridge: BridgeService,
}

/// Main BLE task that manages the Bluetooth stack and connections
///
/// This task:
/// 1. Builds the host and registers the bridge service
/// 2. Starts advertising as "SerialBridge-XXXXXX" (unique per device)
/// 3. Hands inbound writes to `handler`
/// 4. Notifies queued serial lines while the peer is subscribed
/// 5. Reports drop counters every stats interval, connected or not
///
/// Service registration and the first advertising start are startup steps: if
/// either fails the task returns and the device stays silent.
pub async fn ble_task<C: Controller, H: InboundHandler>(
    controller: C,
    device_id: [u8; 3],
    handler: H,
    startup: &mut StartupSequence,
) {
    let mut device_name_buf = [0u8; DEVICE_NAME_LEN];
    let device_name = format_device_name(&mut device_name_buf, &device_id);

    log::info!("BLE: starting as '{}'", device_name);

    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();

    let stack = trouble_host::new(controller, &mut resources)
        .set_random_address(Address::random(device_address(&device_id)));

    let Host {
        mut peripheral,
        mut runner,
        ..
    } = stack.build();

    let gap = GapConfig::Peripheral(PeripheralConfig {
        name: device_name,
        appearance: &appearance::UNKNOWN,
    });
    let server: Server = match startup.complete(StartupStage::Service, Server::new_with_config(gap)) {
        Ok(s) => s,
        Err(_) => return,
    };

    let runner_task = runner.run();

    let peripheral_task = async {
        let mut adv_data = [0u8; 31];
        let adv_len = match AdStructure::encode_slice(
            &[
                AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
                AdStructure::ServiceUuids16(&ADVERTISED_SERVICE_UUIDS),
            ],
            &mut adv_data,
        ) {
            Ok(l) => l,
            Err(e) => {
                let _ = startup.complete(StartupStage::Advertising, Err::<(), _>(e));
                return;
            }
        };

        let mut scan_data = [0u8; 31];
        let scan_len = match AdStructure::encode_slice(
            &[AdStructure::CompleteLocalName(device_name.as_bytes())],
            &mut scan_data,
        ) {
            Ok(l) => l,
            Err(e) => {
                let _ = startup.complete(StartupStage::Advertising, Err::<(), _>(e));
                return;
            }
        };

        let handles = server.bridge.handles();
        let mut service = DataService::new(Some(handler));
        let mut monitor = StatsMonitor::new();
        let mut ticker = Ticker::every(Duration::from_millis(STATS_INTERVAL_MS));

        loop {
            log::info!("BLE: advertising...");
            let result = peripheral
                .advertise(
                    &Default::default(),
                    Advertisement::ConnectableScannableUndirected {
                        adv_data: &adv_data[..adv_len],
                        scan_data: &scan_data[..scan_len],
                    },
                )
                .await;

            let advertiser = if startup.is_discoverable() {
                match result {
                    Ok(a) => a,
                    Err(e) => {
                        log::warn!("BLE: advertising restart failed: {:?}", e);
                        Timer::after(Duration::from_millis(100)).await;
                        continue;
                    }
                }
            } else {
                match startup.complete(StartupStage::Advertising, result) {
                    Ok(a) => a,
                    Err(_) => return,
                }
            };

            // Wait for connection; drops pile up while nobody is connected
            let reporting = async {
                loop {
                    ticker.next().await;
                    monitor.report(current_stats(&service));
                }
            };
            let acceptor = match select(advertiser.accept(), reporting).await {
                Either::First(Ok(a)) => a,
                Either::First(Err(e)) => {
                    log::warn!("BLE: connection failed: {:?}", e);
                    continue;
                }
                Either::Second(_) => continue,
            };

            // Attach to attribute server (using Deref to get &AttributeServer)
            let conn = match acceptor.with_attribute_server(&*server) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("BLE: attaching GATT server failed: {:?}", e);
                    continue;
                }
            };

            log::info!("BLE: connected");
            service.on_connect();

            loop {
                let outbound = next_outbound(&LINE_QUEUE, service.is_subscribed(), ticker.next());
                let event = select(conn.next(), outbound).await;

                match event {
                    Either::First(GattConnectionEvent::Disconnected { reason }) => {
                        log::info!("BLE: disconnected (reason {:?})", reason);
                        break;
                    }
                    Either::First(GattConnectionEvent::Gatt { event }) => match event {
                        GattEvent::Write(write_event) => {
                            if let Some(attribute) = handles.resolve(write_event.handle()) {
                                let consumed = service.on_write(attribute, write_event.data());
                                log::trace!("BLE: {:?} consumed {} bytes", attribute, consumed);
                            }
                            // Accept the write
                            let _ = write_event.accept();
                        }
                        GattEvent::Read(read_event) => {
                            let _ = read_event.accept();
                        }
                        GattEvent::Other(other_event) => {
                            let _ = other_event.accept();
                        }
                    },
                    Either::First(_) => {}
                    Either::Second(Outbound::Line(line)) => {
                        log::debug!("BLE: notifying {:?}", line);
                        if let Err(e) = server.bridge.outbound.notify(&conn, line.as_slot()).await {
                            log::warn!("BLE: notify failed: {:?}", e);
                        }
                    }
                    Either::Second(Outbound::ReportDue) => {
                        monitor.report(current_stats(&service));
                    }
                }
            }
        }
    };

    select(runner_task, peripheral_task).await;
}

/// Drop counters of both directions
fn current_stats<H: InboundHandler>(service: &DataService<H>) -> BridgeStats {
    BridgeStats {
        lines_dropped: LINE_QUEUE.dropped(),
        bytes_truncated: uart::truncated_bytes(),
        inbound_dropped: service.handler().map_or(0, |h| h.dropped()),
    }
}
