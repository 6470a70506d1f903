//! Error types for the Holdout binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the autopilot
//! run so that `main` can propagate with `?`.

/// Top-level error for the Holdout binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: holdout_core::ConfigError,
    },

    /// District grid construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: holdout_world::WorldError,
    },

    /// The session failed while playing.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: holdout_core::SessionError,
    },

    /// The worker status snapshot could not be serialised.
    #[error("status serialisation error: {source}")]
    Status {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// World generation failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },

    /// The `autopilot` config section could not be read.
    #[error("autopilot config error: {message}")]
    Autopilot {
        /// Description of the failure.
        message: String,
    },
}
