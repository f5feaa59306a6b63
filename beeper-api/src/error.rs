use thiserror::Error;

/// Errors raised by the native SDK collaborator
///
/// The `Display` output is what ends up in front of the host application, so
/// most variants render the SDK's own message unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    /// The SDK has not been initialized yet
    #[error("Sdk not initialized")]
    NotInitialized,

    /// The offline configuration could not be parsed by the SDK
    #[error("invalid offline config: {0}")]
    InvalidConfig(String),

    /// A token string was rejected before it reached a device
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// An OS-level capability refused the call
    #[error("{0}")]
    Platform(String),

    /// Any other failure reported by the SDK
    #[error("{0}")]
    Failure(String),
}

/// Result type for SDK collaborator calls
pub type SdkResult<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_host_facing() {
        assert_eq!(SdkError::NotInitialized.to_string(), "Sdk not initialized");
        assert_eq!(SdkError::Failure("boom".into()).to_string(), "boom");
        assert_eq!(
            SdkError::InvalidConfig("missing shops".into()).to_string(),
            "invalid offline config: missing shops"
        );
    }
}
