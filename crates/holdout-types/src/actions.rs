//! Action types exchanged between the decision source, the action executor,
//! and the scheduler.
//!
//! Every action kind carries its own payload, so executors dispatch with an
//! exhaustive `match` instead of runtime type tests.

use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, ItemId};

/// One of the eight compass directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Up.
    North,
    /// Up-right.
    NorthEast,
    /// Right.
    East,
    /// Down-right.
    SouthEast,
    /// Down.
    South,
    /// Down-left.
    SouthWest,
    /// Left.
    West,
    /// Up-left.
    NorthWest,
}

impl Direction {
    /// All directions, clockwise from north.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Tile delta `(dx, dy)` of one step in this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }
}

/// An action an actor wants to perform this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Do nothing and spend a turn.
    Wait,
    /// Step one tile.
    Move {
        /// Step direction.
        dir: Direction,
    },
    /// Melee attack on an adjacent actor.
    Attack {
        /// Target actor.
        target: ActorId,
    },
    /// Eat a carried food item.
    Eat {
        /// Food item in the inventory.
        item: ItemId,
    },
    /// Fall asleep where the actor stands.
    Sleep,
    /// Pick up an item lying on the actor's tile.
    TakeItem {
        /// Item on the ground.
        item: ItemId,
    },
    /// Prime a carried explosive and drop it at the actor's feet.
    PrimeExplosive {
        /// Explosive in the inventory.
        item: ItemId,
        /// Fuse length in map turns.
        fuse: u32,
    },
}

/// Result of performing an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Action points charged to the actor.
    pub ap_spent: i32,
    /// Actors killed by the action.
    pub killed: Vec<ActorId>,
}
