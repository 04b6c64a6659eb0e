#![no_std]
#![no_main]

extern crate alloc;

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{Config as UartConfig, RxConfig, Uart};
use static_cell::StaticCell;

use serial_ble_bridge::bridge::{SerialForwarder, StartupSequence, StartupStage, TransportInitError};
use serial_ble_bridge::config;
use serial_ble_bridge::serial::uart::{self, SharedUartTx};
use serial_ble_bridge::tasks::{self, InboundReceiver, INBOUND_CHANNEL};

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

/// Static cell for esp-radio controller (needed for 'static lifetime)
static RADIO_CONTROLLER: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

/// Type alias for the BLE controller
type BleController = trouble_host::prelude::ExternalController<
    esp_radio::ble::controller::BleConnector<'static>,
    10,
>;

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);

    // Initialise heap allocator for BLE support (64KB - BLE requires significant heap)
    esp_alloc::heap_allocator!(size: 64 * 1024);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let mut startup = StartupSequence::new();

    // Initialise esp-radio and create the BLE connector (must be after esp_rtos::start)
    let transport = esp_radio::init()
        .map_err(TransportInitError::Radio)
        .and_then(|controller| {
            esp_radio::ble::controller::BleConnector::new(
                RADIO_CONTROLLER.init(controller),
                peripherals.BT,
                esp_radio::ble::Config::default(),
            )
            .map_err(TransportInitError::Connector)
        });
    let ble_connector = match startup.complete(StartupStage::Transport, transport) {
        Ok(connector) => connector,
        Err(_) => halt(),
    };

    // Wrap in ExternalController for trouble-host compatibility
    let controller: BleController = trouble_host::prelude::ExternalController::new(ble_connector);

    // Configure UART1: one interrupt per received byte
    let uart_config = UartConfig::default()
        .with_baudrate(config::serial::BAUD_RATE)
        .with_rx(RxConfig::default().with_fifo_full_threshold(config::serial::RX_FIFO_FULL_THRESHOLD));
    let serial = match startup.complete(
        StartupStage::ByteSource,
        Uart::new(peripherals.UART1, uart_config),
    ) {
        Ok(serial) => serial
            .with_tx(peripherals.GPIO17)
            .with_rx(peripherals.GPIO18),
        Err(_) => halt(),
    };
    uart::install(serial);

    // Read unique device ID from eFuse MAC address (last 3 bytes)
    let mac = esp_hal::efuse::Efuse::read_base_mac_address();
    let device_id: [u8; 3] = [mac[3], mac[4], mac[5]];

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(async_main(spawner, controller, device_id, startup));
    })
}

/// Stop making progress after a fatal startup error
///
/// The diagnostic has already been logged by [`StartupSequence::complete`].
fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

#[embassy_executor::task]
async fn async_main(
    spawner: Spawner,
    ble_controller: BleController,
    device_id: [u8; 3],
    startup: StartupSequence,
) {
    spawner.must_spawn(serial_writer_task(INBOUND_CHANNEL.receiver()));
    spawner.must_spawn(ble_host_task(ble_controller, device_id, startup));
}

/// Task that writes BLE inbound data to the UART
#[embassy_executor::task]
async fn serial_writer_task(receiver: InboundReceiver) {
    tasks::serial_writer_task(SharedUartTx, receiver).await;
}

/// Task that manages BLE connectivity
///
/// Inbound writes are forwarded to the serial writer through INBOUND_CHANNEL.
/// If service registration or the first advertising start fails, the UART
/// receive interrupt is disarmed so nothing keeps running.
#[embassy_executor::task]
async fn ble_host_task(controller: BleController, device_id: [u8; 3], mut startup: StartupSequence) {
    let forwarder = SerialForwarder::new(INBOUND_CHANNEL.sender());
    tasks::ble_task(controller, device_id, forwarder, &mut startup).await;

    if startup.failure().is_some() {
        uart::shutdown();
    }
}
