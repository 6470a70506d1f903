//! Clock, maps, districts, and environment for the Holdout simulation.
//!
//! This crate models the physical world: the turn clock shared by world and
//! map time, maps holding actors in arenas, districts bundling maps, and
//! the grid of lock-protected districts.
//!
//! # Modules
//!
//! - [`clock`] -- [`WorldTime`] turn counter with day/hour/phase derivation.
//! - [`district`] -- [`District`], a bundle of maps with raid cooldowns.
//! - [`environment`] -- Deterministic weather transitions.
//! - [`error`] -- Error types for map and district operations.
//! - [`grid`] -- [`DistrictGrid`], one mutex per district.
//! - [`map`] -- [`Map`], one layer of a district with its actor arena.
//! - [`scent`] -- Scent fields laid by actors.
//! - [`timer`] -- Pending per-map timers.

pub mod clock;
pub mod district;
pub mod environment;
pub mod error;
pub mod grid;
pub mod map;
pub mod scent;
pub mod timer;

// Re-export primary types at crate root.
pub use clock::{HOURS_PER_DAY, TURNS_PER_DAY, TURNS_PER_HOUR, TimeError, WorldTime};
pub use district::District;
pub use environment::{WeatherSystem, fire_extinguish_chance};
pub use error::WorldError;
pub use grid::{DistrictGrid, SharedDistrict, lock_district};
pub use map::Map;
pub use scent::{SCENT_DECAY_PER_TURN, SCENT_EMIT_STRENGTH, ScentField};
pub use timer::{MapTimer, TimerQueue, TimerTask};
