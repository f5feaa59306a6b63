//! Configuration for the bridge

use std::time::Duration;

use crate::error::BridgeError;

/// Configuration for a [`BeeperBridge`](crate::BeeperBridge)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Name of the UI-affine worker thread
    /// Default: "beeper-ui"
    pub ui_thread_name: String,

    /// Name of the threads that apply tokens
    /// Default: "beeper-token"
    pub worker_thread_name: String,

    /// How long synchronous helpers wait for the UI thread
    /// Default: 5 seconds
    pub ui_call_timeout: Duration,

    /// Deliver the current radio state to a new Bluetooth-events subscriber
    /// Default: false
    pub emit_radio_state_on_subscribe: bool,

    /// Turn remote logging off again when the log channel is closed
    /// Default: true
    pub disable_remote_logging_on_unsubscribe: bool,

    /// Send a `NoResult` terminal status to a listener that gets replaced
    /// by a newer subscriber on the same channel
    /// Default: false
    pub terminate_replaced_listeners: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ui_thread_name: "beeper-ui".to_string(),
            worker_thread_name: "beeper-token".to_string(),
            ui_call_timeout: Duration::from_secs(5),
            emit_radio_state_on_subscribe: false,
            disable_remote_logging_on_unsubscribe: true,
            terminate_replaced_listeners: false,
        }
    }
}

impl BridgeConfig {
    /// Create a new BridgeConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaviour of the iOS plugin: radio snapshot on subscribe and explicit
    /// termination of replaced listeners
    pub fn ios_compatible() -> Self {
        Self {
            emit_radio_state_on_subscribe: true,
            terminate_replaced_listeners: true,
            ..Default::default()
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.ui_thread_name.trim().is_empty() {
            return Err(BridgeError::Configuration(
                "UI thread name must not be empty".to_string(),
            ));
        }

        if self.worker_thread_name.trim().is_empty() {
            return Err(BridgeError::Configuration(
                "Worker thread name must not be empty".to_string(),
            ));
        }

        if self.ui_thread_name == self.worker_thread_name {
            return Err(BridgeError::Configuration(
                "UI and worker threads must have different names".to_string(),
            ));
        }

        if self.ui_call_timeout == Duration::ZERO {
            return Err(BridgeError::Configuration(
                "UI call timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_thread_names(mut self, ui: impl Into<String>, worker: impl Into<String>) -> Self {
        self.ui_thread_name = ui.into();
        self.worker_thread_name = worker.into();
        self
    }

    pub fn with_ui_call_timeout(mut self, timeout: Duration) -> Self {
        self.ui_call_timeout = timeout;
        self
    }

    pub fn with_radio_snapshot(mut self, enabled: bool) -> Self {
        self.emit_radio_state_on_subscribe = enabled;
        self
    }

    pub fn with_remote_logging_reset(mut self, enabled: bool) -> Self {
        self.disable_remote_logging_on_unsubscribe = enabled;
        self
    }

    pub fn with_replaced_listener_termination(mut self, enabled: bool) -> Self {
        self.terminate_replaced_listeners = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.ui_thread_name, "beeper-ui");
        assert_eq!(config.ui_call_timeout, Duration::from_secs(5));
        assert!(!config.emit_radio_state_on_subscribe);
        assert!(config.disable_remote_logging_on_unsubscribe);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let same_names = BridgeConfig::new().with_thread_names("t", "t");
        assert!(same_names.validate().is_err());

        let blank = BridgeConfig::new().with_thread_names(" ", "worker");
        assert!(blank.validate().is_err());

        let zero = BridgeConfig::new().with_ui_call_timeout(Duration::ZERO);
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_presets_and_builder() {
        let ios = BridgeConfig::ios_compatible();
        assert!(ios.emit_radio_state_on_subscribe);
        assert!(ios.terminate_replaced_listeners);
        assert!(ios.validate().is_ok());

        let config = BridgeConfig::new()
            .with_thread_names("ui", "bg")
            .with_ui_call_timeout(Duration::from_millis(250))
            .with_radio_snapshot(true)
            .with_remote_logging_reset(false)
            .with_replaced_listener_termination(true);

        assert_eq!(config.worker_thread_name, "bg");
        assert_eq!(config.ui_call_timeout, Duration::from_millis(250));
        assert!(config.emit_radio_state_on_subscribe);
        assert!(!config.disable_remote_logging_on_unsubscribe);
        assert!(config.terminate_replaced_listeners);
        assert!(config.validate().is_ok());
    }
}
