use std::time::Duration;

use thiserror::Error;

/// Messaging bridge errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The peer never replied within the reply timeout.
    #[error("no reply to '{action}' within {timeout:?}")]
    Timeout {
        action: &'static str,
        timeout: Duration,
    },

    /// The other context was torn down.
    #[error("peer context disconnected")]
    Disconnected,

    /// Payload could not be encoded or decoded.
    #[error("malformed bridge payload: {0}")]
    Codec(#[from] serde_json::Error),
}
