//! # Beeper Event Manager
//!
//! Subscription plumbing between the locker SDK's callbacks and the host.
//!
//! ## Overview
//!
//! - **Channel registry**: one live listener per logical channel; a new
//!   subscriber replaces the previous one, which goes silent
//! - **Scanner lifecycle**: the shared foreground BLE scanner is started on
//!   the first consumer and stopped when the last one detaches
//! - **Dispatcher**: UI-affine calls are funnelled through one worker thread,
//!   long-running calls run on background threads
//! - **Result queue**: a queue-backed sink for hosts that pull results
//!
//! ## Usage
//!
//! ```rust,ignore
//! use beeper_event_manager::{queue_sink, Channel, ChannelRegistry, CommandContext};
//!
//! let registry = ChannelRegistry::new();
//! let (sink, results) = queue_sink();
//!
//! let listener = CommandContext::new("subscribeLogEvents", sink).into_listener(Channel::LogEvents);
//! registry.register(Channel::LogEvents, listener);
//!
//! registry.deliver(Channel::LogEvents, beeper_api::Payload::text("Scanner: started"));
//! for result in results.try_iter() {
//!     println!("{}", result.payload.to_wire());
//! }
//! ```
//!
//! ## Architecture
//!
//! The scanner follows the **Reference-Counted Resource** pattern:
//!
//! 1. **Demand-driven start**: the scanner starts when the first consumer acquires it
//! 2. **Reference counting**: each consumer (device search, location subscription) holds one reference
//! 3. **Automatic stop**: when the count reaches zero, the scanner stops
//! 4. **Single-thread serialization**: acquire/release run on the UI worker, so
//!    two consumers can never race for the 0 -> 1 transition

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod lifecycle;
pub mod queue;
pub mod registry;
pub mod worker;

// Re-export main types for convenience
pub use dispatcher::Dispatcher;
pub use error::{EventManagerError, Result};
pub use handle::{CommandContext, ListenerHandle, ListenerId};
pub use queue::{queue_sink, QueueSink, ResultQueue};
pub use lifecycle::{Consumer, ScannerLifecycle};
pub use registry::{Channel, ChannelRegistry};
pub use worker::block_on_worker;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        queue_sink, Channel, ChannelRegistry, CommandContext, Consumer, Dispatcher,
        EventManagerError, ListenerHandle, Result, ResultQueue, ScannerLifecycle,
    };
}
