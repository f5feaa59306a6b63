//! # Beeper Bridge
//!
//! Exposes the native locker SDK to a host application through a
//! string/JSON command channel.
//!
//! The host invokes named commands (`initSDK`, `searchDevices`,
//! `subscribeToLocations`, ...) and receives results through a
//! [`ResultSink`](beeper_api::ResultSink). Subscription commands keep their
//! sink open and receive pushed events until they are unsubscribed or
//! replaced by a newer subscriber.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use beeper_bridge::{BeeperBridge, BridgeConfig};
//! use beeper_event_manager::queue_sink;
//!
//! let bridge = BeeperBridge::builder(sdk, platform)
//!     .config(BridgeConfig::default())
//!     .build()?;
//!
//! let (sink, results) = queue_sink();
//! bridge.execute("initSDK", &[r#"["Demo","app-token","service"]"#.to_string()], sink.clone());
//! bridge.execute("enableBeeper", &[], sink.clone());
//! bridge.execute("searchDevices", &[r#"["tokenA"]"#.to_string()], sink);
//!
//! while let Some(result) = results.recv_timeout(std::time::Duration::from_secs(5)) {
//!     println!("{:?} {}", result.status, result.payload.to_wire());
//! }
//! ```
//!
//! ## Threading
//!
//! All UI-affine SDK calls, channel registrations and scanner start/stop run
//! on one dedicated UI worker thread, in submission order. Token application
//! runs on a short-lived background thread. SDK callbacks are translated and
//! delivered on whatever thread the SDK raises them on.

pub mod commands;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod payload;
pub mod translator;

pub use commands::Command;
pub use config::BridgeConfig;
pub use coordinator::{BeeperBridge, BeeperBridgeBuilder};
pub use error::{BridgeError, ErrorKind, Result};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use translator::EventTranslator;

pub use beeper_event_manager::Channel;
