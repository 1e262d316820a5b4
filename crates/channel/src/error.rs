use thiserror::Error;

/// Errors that can occur when interacting with the event channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The broker could not be reached. Transient; callers may retry.
    #[error("Event channel unavailable: {0}")]
    Unavailable(String),

    /// The delivery tag does not match the outstanding delivery.
    ///
    /// Raised when acknowledging a message that was already settled or
    /// superseded by a redelivery.
    #[error("Stale delivery tag {tag}")]
    StaleDelivery { tag: u64 },

    /// The event payload could not be serialized for the wire.
    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;
