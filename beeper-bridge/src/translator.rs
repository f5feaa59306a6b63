//! Raw SDK callbacks to channel events
//!
//! The translator is the one object the bridge hands to the SDK as its
//! listener on every sub-system. Each callback is translated and delivered on
//! the calling thread; when the channel has no listener the event is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use beeper_api::{
    DeviceRecord, DeviceStatusListener, LocationListener, LogLine, LogListener, Merchant,
    Payload, RadioState, RadioStateListener, Shop,
};
use beeper_event_manager::{Channel, ChannelRegistry};

use crate::payload::{self, DeviceStatus, LocationEvent};

pub struct EventTranslator {
    registry: Arc<ChannelRegistry>,
    /// Set by a log subscription; log lines are dropped while clear
    remote_logging: AtomicBool,
}

impl EventTranslator {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self {
            registry,
            remote_logging: AtomicBool::new(false),
        }
    }

    pub fn set_remote_logging(&self, enabled: bool) {
        self.remote_logging.store(enabled, Ordering::SeqCst);
    }

    pub fn remote_logging(&self) -> bool {
        self.remote_logging.load(Ordering::SeqCst)
    }

    fn device(&self, device: &DeviceRecord, status: DeviceStatus) {
        self.registry
            .deliver(Channel::DeviceEvents, payload::device_event(device, status));
    }

    fn location(&self, event: LocationEvent, shop: &Shop) {
        self.registry
            .deliver(Channel::LocationEvents, payload::location_event(event, shop));
    }
}

impl DeviceStatusListener for EventTranslator {
    fn on_device_detected(&self, device: DeviceRecord) {
        tracing::debug!("onLockerDeviceDetected {}", device.device_id);
        self.device(&device, DeviceStatus::DeviceDetected);
    }

    fn on_device_status_changed(&self, devices: Vec<DeviceRecord>) {
        tracing::debug!("onLockerDeviceStatusChanged ({} devices)", devices.len());
        self.registry.deliver_all(
            Channel::DeviceEvents,
            devices
                .iter()
                .map(|d| payload::device_event(d, DeviceStatus::DeviceStateChanged)),
        );
    }

    fn on_device_lock_state_changed(&self, device: DeviceRecord) {
        tracing::debug!("onLockerDeviceLockStateChanged {}", device.device_id);
        self.device(&device, DeviceStatus::DeviceLockStateChanged);
    }

    fn on_device_lost(&self, device: DeviceRecord) {
        tracing::debug!("onLockerDeviceLost {}", device.device_id);
        self.device(&device, DeviceStatus::DeviceLost);
    }
}

impl LocationListener for EventTranslator {
    fn on_shop_entered(&self, shop: Shop) {
        tracing::debug!("onShopEntered {} ({})", shop.id, shop.name);
        self.location(LocationEvent::OnShopEntered, &shop);
    }

    fn on_shop_exit(&self, shop: Shop) {
        tracing::debug!("onShopExit {} ({})", shop.id, shop.name);
        self.location(LocationEvent::OnShopExit, &shop);
    }

    fn on_merchant_entered(&self, merchant: Merchant, shop: Shop) {
        tracing::debug!(
            "onMerchantEntered {} at shop {}, not forwarded",
            merchant.id,
            shop.id
        );
    }

    fn on_merchant_exit(&self, merchant: Merchant) {
        tracing::debug!("onMerchantExit {}, not forwarded", merchant.id);
    }
}

impl RadioStateListener for EventTranslator {
    fn on_radio_state_changed(&self, state: RadioState) {
        match state.settled() {
            Some(enabled) => {
                tracing::debug!("Bluetooth radio settled: {:?}", state);
                self.registry
                    .deliver(Channel::BluetoothStateEvents, payload::radio_state(enabled));
            }
            None => tracing::trace!("Bluetooth radio transitioning: {:?}", state),
        }
    }
}

impl LogListener for EventTranslator {
    fn on_log_line(&self, line: LogLine) {
        if !self.remote_logging() {
            return;
        }
        self.registry
            .deliver(Channel::LogEvents, Payload::Text(line.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beeper_api::ResultStatus;
    use beeper_event_manager::{queue_sink, CommandContext, ResultQueue};

    fn translator_with(channel: Channel) -> (EventTranslator, ResultQueue) {
        let registry = Arc::new(ChannelRegistry::new());
        let (sink, results) = queue_sink();
        registry.register(channel, CommandContext::new("test", sink).into_listener(channel));
        (EventTranslator::new(registry), results)
    }

    fn device_statuses(results: &ResultQueue) -> Vec<(String, String)> {
        results
            .try_iter()
            .map(|r| {
                let json = r.payload.as_json().cloned().unwrap_or_default();
                (
                    json["deviceId"].as_str().unwrap_or_default().to_string(),
                    json["status"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_batch_delivered_in_order() {
        let (translator, results) = translator_with(Channel::DeviceEvents);

        translator.on_device_status_changed(vec![
            DeviceRecord::new("d1", "A"),
            DeviceRecord::new("d2", "B"),
            DeviceRecord::new("d3", "C"),
        ]);

        let statuses = device_statuses(&results);
        assert_eq!(
            statuses,
            vec![
                ("d1".to_string(), "DeviceStateChanged".to_string()),
                ("d2".to_string(), "DeviceStateChanged".to_string()),
                ("d3".to_string(), "DeviceStateChanged".to_string()),
            ]
        );
    }

    #[test]
    fn test_device_callbacks_map_to_statuses() {
        let (translator, results) = translator_with(Channel::DeviceEvents);
        let device = DeviceRecord::new("d1", "A");

        translator.on_device_detected(device.clone());
        translator.on_device_lock_state_changed(device.clone());
        translator.on_device_lost(device);

        let statuses: Vec<String> = device_statuses(&results).into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            statuses,
            vec!["DeviceDetected", "DeviceLockStateChanged", "DeviceLost"]
        );
    }

    #[test]
    fn test_no_listener_drops_device_events() {
        let (translator, results) = translator_with(Channel::LocationEvents);
        translator.on_device_detected(DeviceRecord::new("d1", "A"));
        assert!(results.try_recv().is_none());
    }

    #[test]
    fn test_merchant_events_are_dropped() {
        let (translator, results) = translator_with(Channel::LocationEvents);
        let shop = Shop::new(3, "Kiosk");

        translator.on_merchant_entered(Merchant::new(9, "Chain"), shop.clone());
        translator.on_merchant_exit(Merchant::new(9, "Chain"));
        translator.on_shop_exit(shop);

        let events: Vec<_> = results.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload.as_json().unwrap()["event"], "onShopExit");
    }

    #[test]
    fn test_radio_intermediate_states_ignored() {
        let (translator, results) = translator_with(Channel::BluetoothStateEvents);

        translator.on_radio_state_changed(RadioState::Off);
        translator.on_radio_state_changed(RadioState::TurningOn);
        translator.on_radio_state_changed(RadioState::On);
        translator.on_radio_state_changed(RadioState::TurningOff);

        let wire: Vec<String> = results.try_iter().map(|r| r.payload.to_wire()).collect();
        assert_eq!(
            wire,
            vec![r#"{"bluetooth":"disabled"}"#, r#"{"bluetooth":"enabled"}"#]
        );
    }

    #[test]
    fn test_log_lines_need_remote_logging() {
        let (translator, results) = translator_with(Channel::LogEvents);

        translator.on_log_line(LogLine::new("Scanner", "ignored"));
        assert!(results.try_recv().is_none());

        translator.set_remote_logging(true);
        translator.on_log_line(LogLine::new("Scanner", "started"));

        let result = results.try_recv().unwrap();
        assert_eq!(result.status, ResultStatus::Ok);
        assert!(result.keep_callback);
        assert_eq!(result.payload, Payload::text("Scanner: started"));
    }
}
