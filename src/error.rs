use std::time::Duration;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum CloudHttpError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The attempt's cancellation token fired before a response arrived.
    #[error("request cancelled before a response was received")]
    Cancelled,
    /// A transport reported "no response" through the status-0 sentinel.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The request entity could not be serialized.
    #[error("failed to serialize request body: {0}")]
    Serialize(serde_json::Error),
    /// Response content could not be converted into the requested entity type.
    #[error("decode error: {0}")]
    Decode(String),
    /// Every attempt ended without a response and no error was recorded.
    #[error("failed to get response after {attempts} attempts, no error recorded, elapsed: {elapsed:?}")]
    NoResponse {
        /// Number of transport attempts made.
        attempts: usize,
        /// Wall time spent on the whole call.
        elapsed: Duration,
    },
}
