//! Callback traits the SDK invokes on the bridge
//!
//! Implementations must be cheap and non-blocking: the SDK calls them on its
//! own threads and expects them to return promptly.

use crate::model::{DeviceRecord, LogLine, Merchant, RadioState, Shop};

/// Locker discovery callbacks
pub trait DeviceStatusListener: Send + Sync {
    /// A device became visible
    fn on_device_detected(&self, device: DeviceRecord);

    /// One or more visible devices changed state, in SDK order
    fn on_device_status_changed(&self, devices: Vec<DeviceRecord>);

    /// The lock state of a single device changed
    fn on_device_lock_state_changed(&self, device: DeviceRecord);

    /// A device is no longer visible
    fn on_device_lost(&self, device: DeviceRecord);
}

/// Geofence callbacks from the location engine
pub trait LocationListener: Send + Sync {
    fn on_shop_entered(&self, shop: Shop);

    fn on_shop_exit(&self, shop: Shop);

    fn on_merchant_entered(&self, merchant: Merchant, shop: Shop);

    fn on_merchant_exit(&self, merchant: Merchant);
}

/// Bluetooth adapter state changes
pub trait RadioStateListener: Send + Sync {
    fn on_radio_state_changed(&self, state: RadioState);
}

/// SDK log stream
pub trait LogListener: Send + Sync {
    fn on_log_line(&self, line: LogLine);
}
