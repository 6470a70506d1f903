//! Error types for the `holdout-core` crate.
//!
//! [`SimError`] covers everything that can go wrong while advancing a
//! district. [`SimThreadError`] covers the lifecycle of the background
//! worker and [`SessionError`] wraps both for the main-thread coordinator.

use holdout_agents::AgentError;
use holdout_types::{Action, ActorId};
use holdout_world::{TimeError, WorldError};

use crate::decision::DecisionError;

/// Errors raised while advancing maps and districts.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A map or district operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A clock operation failed.
    #[error("clock error: {source}")]
    Time {
        /// The underlying clock error.
        #[from]
        source: TimeError,
    },

    /// A per-actor rule failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// The decision source could not produce an action.
    #[error("actor {actor} failed to decide: {source}")]
    Decision {
        /// The actor that was asked to decide.
        actor: ActorId,
        /// The underlying decision error.
        source: DecisionError,
    },

    /// The decision source returned an action the executor rejects.
    #[error("actor {actor} chose illegal action {action:?}")]
    IllegalAction {
        /// The acting actor.
        actor: ActorId,
        /// The rejected action.
        action: Action,
    },

    /// Tracked world state is inconsistent and cannot be resolved.
    #[error("invariant violated: {reason}")]
    Invariant {
        /// What was found.
        reason: String,
    },
}

/// Errors raised by the background worker lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum SimThreadError {
    /// `start` was called while the worker runs.
    #[error("simulation thread is already running")]
    AlreadyRunning,

    /// Background simulation is switched off in the configuration.
    #[error("background simulation is disabled")]
    Disabled,

    /// The OS refused to spawn the worker.
    #[error("failed to spawn simulation thread: {source}")]
    Spawn {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The worker did not acknowledge a stop in time.
    #[error("simulation thread did not stop within {waited_ms} ms")]
    StopTimeout {
        /// Milliseconds waited for the acknowledgement.
        waited_ms: u64,
    },
}

/// Errors raised by the main-thread session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Advancing a district failed.
    #[error("simulation error: {source}")]
    Sim {
        /// The underlying simulation error.
        #[from]
        source: SimError,
    },

    /// Starting or stopping the worker failed.
    #[error("simulation thread error: {source}")]
    Thread {
        /// The underlying worker error.
        #[from]
        source: SimThreadError,
    },

    /// A grid or map operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The player could not be found where the session expects it.
    #[error("player is not in district {0}")]
    PlayerMissing(holdout_types::DistrictPos),
}
