//! Error types for the scanner bridge.
//!
//! Uses `thiserror` for typed errors that surface through the bridge
//! pipeline: configuration, reading the scanner, and posting reports.

/// Errors that can occur during bridge operation.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Reading the scanner source failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The ingest endpoint was unreachable.
    #[error("http error: {0}")]
    Http(String),

    /// The ingest endpoint answered with a non-success status.
    #[error("ingest rejected with {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, if readable.
        body: String,
    },

    /// The report poster task panicked or was cancelled.
    #[error("poster task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
