//! Contracts of the native SDK and the host platform
//!
//! The bridge holds these as trait objects. Whoever composes the bridge
//! decides whether there is one SDK instance per process; the bridge itself
//! keeps no global state.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SdkResult;
use crate::listener::{DeviceStatusListener, LocationListener, LogListener, RadioStateListener};
use crate::model::{DeviceRecord, InitParams, SearchFilter, Shop, Token, TokenResult};

/// Entry point of the native locker SDK
///
/// All methods except `is_initialized` expect to be called on the UI thread.
pub trait LockerSdk: Send + Sync {
    /// Initialize the SDK. Calling it again re-initializes.
    fn init(&self, params: &InitParams) -> SdkResult<()>;

    fn is_initialized(&self) -> bool;

    /// Kick off a best-effort sync of the SDK's shop/device repository
    fn try_sync(&self);

    fn is_background_active(&self) -> bool;

    fn enable_background(&self) -> SdkResult<()>;

    /// Locker sub-system. Fails when the SDK is not ready to hand it out.
    fn lockers(&self) -> SdkResult<Arc<dyn Lockers>>;

    fn locations(&self) -> Arc<dyn Locations>;

    fn scanner(&self) -> Arc<dyn ForegroundScanner>;

    fn logger(&self) -> Arc<dyn SdkLogger>;
}

/// Locker discovery and access
#[async_trait]
pub trait Lockers: Send + Sync {
    fn subscribe(&self, listener: Arc<dyn DeviceStatusListener>);

    /// Remove a listener previously passed to `subscribe`, matched by identity
    fn unsubscribe(&self, listener: &Arc<dyn DeviceStatusListener>);

    /// Devices the SDK currently considers visible
    fn visible_devices(&self) -> Vec<DeviceRecord>;

    fn start_search(&self, filter: &SearchFilter) -> SdkResult<()>;

    fn stop_search(&self);

    /// Apply a token to a nearby locker
    ///
    /// May block for the whole handshake with the physical device. Never call
    /// this on the UI thread.
    async fn apply(&self, token: Token) -> SdkResult<TokenResult>;
}

/// Shop and merchant geofencing
pub trait Locations: Send + Sync {
    fn subscribe(&self, listener: Arc<dyn LocationListener>);

    fn unsubscribe(&self, listener: &Arc<dyn LocationListener>);

    fn entered_shops(&self) -> SdkResult<Vec<Shop>>;
}

/// The shared foreground BLE scanner
pub trait ForegroundScanner: Send + Sync {
    fn is_started(&self) -> bool;

    fn start(&self);

    fn stop(&self);
}

/// The SDK's internal logger
pub trait SdkLogger: Send + Sync {
    fn set_remote_logging(&self, enabled: bool);

    fn subscribe(&self, listener: Arc<dyn LogListener>);

    fn unsubscribe(&self, listener: &Arc<dyn LogListener>);
}

/// OS facilities: permissions, Bluetooth adapter, location services
pub trait Platform: Send + Sync {
    fn bluetooth_permissions_granted(&self) -> bool;

    fn location_permissions_granted(&self) -> bool;

    /// True on OS versions where the Bluetooth permission set also covers
    /// location access for scanning
    fn bluetooth_implies_location(&self) -> bool;

    /// Show the OS permission prompt. Returns immediately.
    fn request_permissions(&self);

    fn is_bluetooth_enabled(&self) -> bool;

    fn is_location_enabled(&self) -> bool;

    /// Show the OS "enable Bluetooth" prompt
    fn request_enable_bluetooth(&self) -> SdkResult<()>;

    fn register_radio_receiver(&self, listener: Arc<dyn RadioStateListener>);

    fn unregister_radio_receiver(&self, listener: &Arc<dyn RadioStateListener>);
}

/// Identity comparison for listener trait objects
///
/// Compares data pointers only, so two `Arc`s of the same allocation match
/// even when they were coerced through different vtables.
pub fn same_listener<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogLine;

    struct Collect;

    impl LogListener for Collect {
        fn on_log_line(&self, _line: LogLine) {}
    }

    #[test]
    fn test_same_listener_identity() {
        let a: Arc<dyn LogListener> = Arc::new(Collect);
        let a2 = Arc::clone(&a);
        let b: Arc<dyn LogListener> = Arc::new(Collect);

        assert!(same_listener(&a, &a2));
        assert!(!same_listener(&a, &b));
    }
}
