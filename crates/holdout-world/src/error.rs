//! Error types for the `holdout-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use holdout_types::{ActorId, DistrictPos, MapId, MapKind, Point};

use crate::clock::TimeError;

/// Errors that can occur during map and district operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A position lies outside its map. Tracked state with an unresolvable
    /// position is a fatal inconsistency.
    #[error("position {pos:?} is outside map {map}")]
    OutOfBounds {
        /// The map the position was resolved against.
        map: MapId,
        /// The offending position.
        pos: Point,
    },

    /// An actor was not found on the map.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// No actor occupies the given arena slot.
    #[error("map {map} has no actor at index {index}")]
    NoActorAt {
        /// The map searched.
        map: MapId,
        /// The arena index.
        index: usize,
    },

    /// The district has no map of the requested kind.
    #[error("district {district} has no {kind:?} map")]
    MapNotFound {
        /// The district searched.
        district: DistrictPos,
        /// The requested layer.
        kind: MapKind,
    },

    /// No district exists at the given grid position.
    #[error("district not found at {0}")]
    DistrictNotFound(DistrictPos),

    /// The district list does not match the declared grid dimensions.
    #[error("grid of {width}x{height} cannot hold {count} districts")]
    GridShape {
        /// Declared width.
        width: i32,
        /// Declared height.
        height: i32,
        /// Districts supplied.
        count: usize,
    },

    /// A clock operation failed.
    #[error("clock error: {source}")]
    Time {
        /// The underlying clock error.
        #[from]
        source: TimeError,
    },
}
