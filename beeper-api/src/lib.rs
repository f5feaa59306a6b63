//! # Beeper API
//!
//! Domain model and collaborator contracts for the locker SDK bridge.
//!
//! The bridge never talks to a BLE radio, a locker or a geofencing engine
//! itself. Everything it consumes is described here as a trait:
//!
//! - [`LockerSdk`]: the native SDK entry point (init, background mode, sub-systems)
//! - [`Lockers`]: locker discovery, filtered search and token application
//! - [`Locations`]: shop/merchant geofence notifications
//! - [`ForegroundScanner`]: the shared BLE scanner resource
//! - [`SdkLogger`]: the SDK's internal log stream
//! - [`Platform`]: OS permissions and the Bluetooth radio
//! - [`ResultSink`]: the host transport that carries results back to the caller
//!
//! Callbacks raised by the SDK flow back through the listener traits in
//! [`listener`].
//!
//! ## Architecture
//!
//! ```text
//! host transport (ResultSink)
//!     ↑
//! beeper-bridge (commands, translation)
//!     ↓
//! beeper-event-manager (channels, scanner lifecycle, UI thread)
//!     ↓
//! beeper-api (model + collaborator traits)  ← implemented by the native SDK glue
//! ```

pub mod error;
pub mod listener;
pub mod model;
pub mod sdk;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use error::{SdkError, SdkResult};
pub use listener::{DeviceStatusListener, LocationListener, LogListener, RadioStateListener};
pub use model::{
    DeviceRecord, InitParams, LockStatus, LogLine, Merchant, RadioState, SearchFilter, Shop,
    Token, TokenResult,
};
pub use sdk::{same_listener, ForegroundScanner, LockerSdk, Lockers, Locations, Platform, SdkLogger};
pub use transport::{Payload, PluginResult, ResultSink, ResultStatus};
