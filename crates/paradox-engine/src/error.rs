//! Error types for the Paradox engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and the scripted match run.

/// Top-level error for the Paradox engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: paradox_core::ConfigError,
    },

    /// Topology construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: paradox_world::WorldError,
    },

    /// The match rejected an operation.
    #[error("match error: {source}")]
    Match {
        /// The underlying match error.
        #[from]
        source: paradox_core::MatchError,
    },

    /// The command script could not be read.
    #[error("script error: {message}")]
    Script {
        /// Description of the script failure.
        message: String,
    },

    /// The coordinator task is no longer accepting submissions.
    #[error("coordinator stopped")]
    CoordinatorClosed,

    /// A background task panicked or was cancelled.
    #[error("task error: {source}")]
    Task {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
