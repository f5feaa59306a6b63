use beeper_api::SdkError;
use beeper_event_manager::EventManagerError;
use thiserror::Error;

/// Error categories reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The SDK has not been initialized
    NotInitialized,
    /// A required capability (e.g. the lockers handle) is missing
    NotReady,
    /// An OS permission is missing
    PermissionDenied,
    /// Malformed or empty command payload
    InvalidArgument,
    /// The SDK or the bridge runtime failed underneath the command
    CollaboratorFailure,
}

/// Errors produced by bridge commands
///
/// `Display` is the exact string handed to the host's error callback.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Sdk not initialized")]
    NotInitialized,

    #[error("Lockers is null!")]
    LockersUnavailable,

    #[error("No permissions")]
    NoPermissions,

    #[error("{0}")]
    PermissionDenied(String),

    #[error("Empty message!")]
    EmptyMessage,

    #[error("{0}")]
    InvalidArgument(String),

    /// Online init failed, the reason is only logged
    #[error("Failed to init sdk")]
    InitFailed,

    /// Offline init failed, the reason is part of the message
    #[error("Failed to init sdk, {0}")]
    OfflineInitFailed(#[source] SdkError),

    #[error("{0}")]
    Sdk(#[from] SdkError),

    #[error("{0}")]
    Runtime(#[from] EventManagerError),

    /// Configuration rejected by `BridgeConfig::validate`
    #[error("Invalid bridge configuration: {0}")]
    Configuration(String),
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::NotInitialized => ErrorKind::NotInitialized,
            BridgeError::Sdk(SdkError::NotInitialized) => ErrorKind::NotInitialized,
            BridgeError::LockersUnavailable => ErrorKind::NotReady,
            BridgeError::NoPermissions | BridgeError::PermissionDenied(_) => {
                ErrorKind::PermissionDenied
            }
            BridgeError::Sdk(SdkError::Platform(_)) => ErrorKind::PermissionDenied,
            BridgeError::EmptyMessage
            | BridgeError::InvalidArgument(_)
            | BridgeError::Configuration(_) => ErrorKind::InvalidArgument,
            BridgeError::Sdk(SdkError::InvalidToken(_)) => ErrorKind::InvalidArgument,
            BridgeError::InitFailed
            | BridgeError::OfflineInitFailed(_)
            | BridgeError::Sdk(_)
            | BridgeError::Runtime(_) => ErrorKind::CollaboratorFailure,
        }
    }
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
