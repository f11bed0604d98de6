use thiserror::Error;

/// Top-level error type for the forwarder.
///
/// Startup problems and upstream stream failures reach this level;
/// serialization and delivery failures stay inside the dispatchers.
#[derive(Error, Debug)]
pub enum ForwarderError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::app::ConfigError),

    #[error("Upstream stream error: {0}")]
    Upstream(#[from] crate::collector::SourceError),

    #[error("HTTP client error: {0}")]
    Client(#[from] crate::sender::ClientError),

    #[error("Sender error: {0}")]
    Sender(#[from] crate::sender::DeliveryError),

    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
