//! Shared type definitions for the Holdout district simulator.
//!
//! This crate is the single source of truth for the plain data shared by
//! the world, agent, and core crates. It carries no simulation logic beyond
//! small invariant-preserving helpers (gauge clamping, faction hostility).
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for actor, map, and item identifiers
//! - [`enums`] -- Enumeration types (factions, models, weather, day phases)
//! - [`structs`] -- Core entity structs (actors, gauges, items, positions)
//! - [`actions`] -- The [`Action`] tagged union and its outcome record

pub mod actions;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{Action, ActionOutcome, Direction};
pub use enums::{
    ActorModel, DayPhase, Faction, MapKind, RaidType, ScentKind, Skill, Weather,
};
pub use ids::{ActorId, ItemId, MapId};
pub use structs::{Actor, Corpse, Decoration, DistrictPos, Gauge, Item, ItemKind, Point};
