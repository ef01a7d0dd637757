//! Error types for the tracker service binary.
//!
//! [`ServiceError`] is the top-level error type that wraps all possible
//! failure modes during service startup and shutdown.

/// Top-level error for the tracker service binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: beaconwatch_core::config::ConfigError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: beaconwatch_observer::ServerError,
    },
}
