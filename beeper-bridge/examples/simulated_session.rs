//! Drives a bridge against the in-memory SDK and prints every result
//!
//! Usage: cargo run -p beeper-bridge --example simulated_session --features test-support

use std::sync::Arc;
use std::time::Duration;

use beeper_api::mock::{MockPlatform, MockSdk};
use beeper_api::{DeviceRecord, LockStatus, LogLine, RadioState, Shop};
use beeper_bridge::{init_logging, BeeperBridge, BridgeConfig, LoggingMode};
use beeper_event_manager::{queue_sink, ResultQueue};

fn drain(label: &str, results: &ResultQueue) {
    while let Some(result) = results.recv_timeout(Duration::from_millis(200)) {
        println!(
            "[{}] {:?} keep={} {}",
            label,
            result.status,
            result.keep_callback,
            result.payload.to_wire()
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingMode::Development)?;

    let sdk = Arc::new(MockSdk::new());
    let platform = Arc::new(MockPlatform::new());
    sdk.lockers.set_visible(vec![DeviceRecord::new("1042", "Corner Shop")
        .connectable(true)
        .with_lock_statuses(vec![LockStatus::Closed])]);

    let bridge = BeeperBridge::builder(sdk.clone(), platform.clone())
        .config(BridgeConfig::default().with_radio_snapshot(true))
        .build()?;

    let (sink, setup) = queue_sink();
    bridge.execute("initSDK", &[r#"["Demo","app-token","svc-1"]"#.to_string()], sink.clone());
    bridge.execute("enableBeeper", &[], sink.clone());
    bridge.execute("isPermissionGranted", &[], sink);
    drain("setup", &setup);

    let (sink, devices) = queue_sink();
    bridge.execute("searchDevices", &[r#"["tokenA"]"#.to_string()], sink);
    let (sink, locations) = queue_sink();
    bridge.execute("subscribeToLocations", &[], sink);
    let (sink, radio) = queue_sink();
    bridge.execute("subscribeBluetoothEvents", &[], sink);
    let (sink, logs) = queue_sink();
    bridge.execute("subscribeLogEvents", &[], sink);
    bridge.flush()?;

    sdk.lockers.raise_detected(DeviceRecord::new("2001", "Kiosk"));
    sdk.lockers.raise_lock_state_changed(
        DeviceRecord::new("1042", "Corner Shop").with_lock_statuses(vec![LockStatus::Opened]),
    );
    sdk.locations.raise_shop_entered(Shop::new(12, "Bakery"));
    platform.raise_radio(RadioState::TurningOff);
    platform.raise_radio(RadioState::Off);
    sdk.logger.raise_line(LogLine::new("Scanner", "advertisement received"));

    let (sink, token) = queue_sink();
    bridge.execute("applyToken", &["00ff00".to_string()], sink);

    let (sink, teardown) = queue_sink();
    bridge.execute("stopSearching", &["search stopped".to_string()], sink.clone());
    bridge.execute("unsubscribeFromLocations", &[], sink);
    bridge.flush()?;

    drain("devices", &devices);
    drain("locations", &locations);
    drain("bluetooth", &radio);
    drain("logs", &logs);
    drain("token", &token);
    drain("teardown", &teardown);

    bridge.shutdown();
    Ok(())
}
