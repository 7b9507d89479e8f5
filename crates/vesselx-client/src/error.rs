use thiserror::Error;

/// Failures surfaced to the caller of a client operation. Nothing here is
/// fatal to the process; every error is scoped to the triggering call and no
/// layer below the caller retries.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the request. `message` is the server's own error
    /// string, surfaced verbatim.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request could not complete at the transport level.
    #[error("network error: {0}")]
    Network(String),

    /// The operation requires a session and none is present.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
