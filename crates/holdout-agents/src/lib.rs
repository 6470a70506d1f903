//! Per-actor survival rules for the Holdout simulation.
//!
//! This crate contains the logic layer that operates on a single actor's
//! state without looking at the map around it. The turn effects pipeline in
//! `holdout-core` calls into it once per actor per full-detail map turn and
//! applies the map-level consequences (corpses, decorations, timers).
//!
//! # Modules
//!
//! - [`chance`] -- Percent and per-mille rolls.
//! - [`config`] -- Tunable rates ([`VitalsConfig`]).
//! - [`death`] -- Death causes and the kill helper.
//! - [`error`] -- Error types ([`AgentError`]).
//! - [`infection`] -- Infection growth and its cascading symptoms.
//! - [`sleep`] -- Sleep regeneration, heal rolls, waking, nightmares.
//! - [`upgrade`] -- Dawn and dusk skill upgrades.
//! - [`vitals`] -- Gauge decay, starvation, exhaustion, leader trust.

pub mod chance;
pub mod config;
pub mod death;
pub mod error;
pub mod infection;
pub mod sleep;
pub mod upgrade;
pub mod vitals;

// Re-export primary types at crate root for convenience.
pub use config::VitalsConfig;
pub use death::{DeathCause, check_death, kill};
pub use error::AgentError;
pub use infection::{InfectionSymptom, apply_infection_turn};
pub use sleep::{SleepOutcome, WakeReason, apply_sleep_turn};
pub use upgrade::{upgrade_living_npc, upgrade_undead};
pub use vitals::{VitalTickResult, apply_trust_drift, apply_vital_tick};
