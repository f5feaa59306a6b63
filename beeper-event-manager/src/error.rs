use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in the event manager
#[derive(Error, Debug)]
pub enum EventManagerError {
    /// The UI worker thread is gone and can no longer run jobs
    #[error("UI dispatcher has shut down")]
    DispatcherDisconnected,

    /// A blocking UI call did not complete in time
    #[error("UI call did not complete within {0:?}")]
    Timeout(Duration),

    /// A job panicked on the UI thread before producing a result
    #[error("UI job panicked")]
    JobPanicked,

    /// Spawning a worker thread failed
    #[error("Failed to spawn worker thread {name}: {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Building the async runtime for a worker failed
    #[error("Failed to build async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Result type for event manager operations
pub type Result<T> = std::result::Result<T, EventManagerError>;
