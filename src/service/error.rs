use thiserror::Error;

/// Remote analysis service errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The response body was not what the endpoint promises.
    #[error("malformed response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[source] reqwest::Error),

    /// Service reported itself unavailable (used by the offline mock).
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
