//! Integration tests for the serial BLE bridge firmware.
//!
//! Requires a flashed device with its bridge UART wired to a USB serial
//! adapter on this machine, and a Bluetooth adapter in range.

mod ble_client;
mod device;

use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use ble_client::BleClient;
use device::{resolve_port, SerialClient};
use tests::{print_results, run_all_tests};

#[derive(Parser)]
#[command(name = "bridge-tests")]
#[command(about = "End-to-end tests for the serial BLE bridge")]
struct Args {
    /// Serial port wired to the bridge UART (use "auto" to auto-detect)
    #[arg(short, long, default_value = "auto")]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// BLE device name, e.g. SerialBridge-0ABC01
    #[arg(long)]
    ble_name: String,

    /// BLE scan timeout in seconds
    #[arg(long, default_value = "10")]
    scan_timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let port = resolve_port(&args.port)?;

    println!("{}", "Serial BLE Bridge Integration Tests".bold());
    println!("Port: {}", port);
    println!("Baud: {}", args.baud);
    println!("BLE:  {}", args.ble_name);
    println!();

    println!("Opening serial port...");
    let mut serial = SerialClient::new(&port, args.baud)?;
    serial.drain_buffer()?;
    println!("{}", "  Serial open!".green());

    println!("Scanning for \"{}\"...", args.ble_name);
    let ble = BleClient::connect_by_name(&args.ble_name, Duration::from_secs(args.scan_timeout)).await?;
    println!("{}", "  BLE connected!".green());

    println!("\nRunning tests...\n");

    let results = run_all_tests(&ble, &mut serial).await;
    print_results(&results);

    let _ = ble.disconnect().await;

    // Exit with error code if any tests failed
    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}
