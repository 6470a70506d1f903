//! Simulation core for Holdout.
//!
//! This crate drives the world forward: it decides which actor acts next,
//! applies per-map turn effects, fires scripted district events, advances
//! whole districts, catches lagging districts up, and runs the background
//! worker that keeps the player's surroundings moving.
//!
//! # Modules
//!
//! - [`advancer`] -- One world turn for one district ([`advance_district`]).
//! - [`catch_up`] -- Synchronous catch-up of a lagging district.
//! - [`config`] -- YAML configuration ([`SimulationConfig`]).
//! - [`context`] -- Per-thread [`SimContext`], [`WorldSignals`], [`WorldState`].
//! - [`decision`] -- AI decision sources.
//! - [`error`] -- Error types.
//! - [`events`] -- Scripted invasions, refugees, and raids.
//! - [`executor`] -- Action validation and execution.
//! - [`flags`] -- [`SimRatio`] and per-advance [`SimFlags`].
//! - [`scheduler`] -- Round-robin actor selection and loop detection.
//! - [`session`] -- The main-thread [`Session`].
//! - [`sim_thread`] -- The background worker ([`SimThread`]).
//! - [`turn_effects`] -- Per-map turn effects ([`next_map_turn`]).

pub mod advancer;
pub mod catch_up;
pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod events;
pub mod executor;
pub mod flags;
pub mod scheduler;
pub mod session;
pub mod sim_thread;
pub mod turn_effects;

// Re-export primary types at crate root for convenience.
pub use advancer::{AbortReason, AdvanceOutcome, AdvanceReport, advance_district, advance_if_behind};
pub use catch_up::{CatchUpOutcome, CatchUpProgress, CatchUpReport, NoProgress, catch_up};
pub use config::{
    ConfigError, CorpseConfig, EventsConfig, FailurePolicy, LoggingConfig, PopulationConfig,
    RaidConfig, SimulationConfig, SimulationSettings, WorldConfig,
};
pub use context::{
    AutopilotCollaborators, CollaboratorFactory, IdleCollaborators, SimContext, WorldSignals,
    WorldState,
};
pub use decision::{DecisionError, DecisionSource, StubDecisionSource, WanderDecisionSource};
pub use error::{SessionError, SimError, SimThreadError};
pub use events::{EventKind, ScriptedEvent, run_scripted_events};
pub use executor::{ActionExecutor, RulesActionExecutor};
pub use flags::{SimFlags, SimRatio};
pub use scheduler::{BASE_ACTION_COST, LoopGuard, LoopVerdict, next_actor_to_act};
pub use session::Session;
pub use sim_thread::{
    SimThread, SimThreadParams, SimThreadState, SimThreadStatus, StopMode, StopOutcome,
};
pub use turn_effects::{TurnEffectsReport, next_map_turn};
