use thiserror::Error;

/// Application-level errors using thiserror for structured error handling.
///
/// These errors represent domain-specific failures that can occur while the
/// client is connected to a session hub. They provide context and can be
/// chained with anyhow.

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to open hub transport")]
    TransportOpenFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Hub handshake call failed: {call}")]
    HandshakeFailure {
        call: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Graceful close did not complete within {timeout_secs}s")]
    GracefulCloseTimeout { timeout_secs: u64 },

    #[error("Hub connection closed unexpectedly")]
    UnexpectedClosure(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Transport is not open")]
    NotConnected,

    #[error("Connection manager has been disposed")]
    Disposed,
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Consumer has not drained the queue ({pending} entries pending)")]
    ConsumerStalled { pending: usize },

    #[error("Queue is closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
