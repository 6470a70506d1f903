//! Core entity structs for the Holdout simulation.
//!
//! Actors are plain data held in their map's arena; relationships between
//! actors (leader and followers) are expressed through [`ActorId`] values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{ActorModel, Faction, Skill};
use crate::ids::{ActorId, ItemId};

/// Maximum stamina of a living actor.
pub const STAMINA_MAX: i32 = 100;

/// Maximum food of a living actor (two days of turns).
pub const FOOD_MAX: i32 = 1440;

/// Maximum sleep of a living actor (two days of turns).
pub const SLEEP_MAX: i32 = 1440;

/// Maximum sanity of a living actor (four days of turns).
pub const SANITY_MAX: i32 = 2880;

/// Starting trust a follower has in its leader.
pub const TRUST_START: i32 = 0;

/// Trust bounds (symmetric).
pub const TRUST_BOUND: i32 = 1000;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A tile position on a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Point {
    /// Create a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by a delta, saturating at the integer limits.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Chebyshev (king-move) distance between two points.
    pub const fn distance(self, other: Self) -> i32 {
        let dx = self.x.saturating_sub(other.x).saturating_abs();
        let dy = self.y.saturating_sub(other.y).saturating_abs();
        if dx > dy { dx } else { dy }
    }

    /// Whether `other` is one of the eight surrounding tiles.
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.distance(other) == 1
    }
}

/// Position of a district on the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DistrictPos {
    /// Column on the world grid.
    pub x: i32,
    /// Row on the world grid.
    pub y: i32,
}

impl DistrictPos {
    /// Create a district position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The eight surrounding positions, unfiltered. Callers drop the ones
    /// outside the world grid.
    pub const fn neighbors(self) -> [Self; 8] {
        let (x, y) = (self.x, self.y);
        let (l, r) = (x.saturating_sub(1), x.saturating_add(1));
        let (u, d) = (y.saturating_sub(1), y.saturating_add(1));
        [
            Self::new(l, u),
            Self::new(x, u),
            Self::new(r, u),
            Self::new(l, y),
            Self::new(r, y),
            Self::new(l, d),
            Self::new(x, d),
            Self::new(r, d),
        ]
    }
}

impl core::fmt::Display for DistrictPos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Gauges
// ---------------------------------------------------------------------------

/// A bounded, decaying actor statistic.
///
/// `previous` holds the value before the last change and exists only for UI
/// animation; simulation rules never read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gauge {
    /// Current value in `0..=max`.
    pub value: i32,
    /// Upper bound.
    pub max: i32,
    /// Value before the last change.
    pub previous: i32,
}

impl Gauge {
    /// A gauge filled to `max`.
    pub const fn full(max: i32) -> Self {
        Self {
            value: max,
            max,
            previous: max,
        }
    }

    /// Set the value, clamped to `0..=max`.
    pub fn set(&mut self, value: i32) {
        self.previous = self.value;
        self.value = value.clamp(0, self.max.max(0));
    }

    /// Add `delta` (may be negative), clamped to `0..=max`.
    pub fn add(&mut self, delta: i32) {
        self.set(self.value.saturating_add(delta));
    }

    /// Subtract `delta`, clamped to `0..=max`.
    pub fn sub(&mut self, delta: i32) {
        self.set(self.value.saturating_sub(delta));
    }

    /// Whether the gauge is fully drained.
    pub const fn is_empty(&self) -> bool {
        self.value <= 0
    }

    /// Whether the gauge is at its maximum.
    pub const fn is_full(&self) -> bool {
        self.value >= self.max
    }

    /// Fill level in percent; 0 for gauges without capacity.
    pub fn percent(&self) -> i32 {
        self.value
            .saturating_mul(100)
            .checked_div(self.max)
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// What an item is, with the mutable state the turn effects care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Edible ration.
    Food {
        /// Food points restored when eaten.
        nutrition: i32,
    },
    /// Flashlight; drains while equipped.
    Light {
        /// Remaining battery turns.
        battery: i32,
    },
    /// Zombie or follower tracker; drains while equipped.
    Tracker {
        /// Remaining battery turns.
        battery: i32,
    },
    /// Grenade or bomb.
    Explosive {
        /// Turns left before detonation; `None` while unprimed.
        fuse: Option<u32>,
        /// Blast radius in tiles.
        radius: i32,
        /// Damage at the blast center.
        damage: i32,
    },
    /// Bandages and the like.
    Medikit {
        /// Hit points restored.
        heal: i32,
    },
    /// Melee or ranged weapon.
    Weapon {
        /// Bonus damage.
        damage: i32,
    },
}

/// An item instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identifier.
    pub id: ItemId,
    /// Kind and state.
    pub kind: ItemKind,
}

impl Item {
    /// Create an item with a fresh identifier.
    pub fn new(kind: ItemKind) -> Self {
        Self {
            id: ItemId::new(),
            kind,
        }
    }

    /// Whether the item is an explosive with a running fuse.
    pub const fn is_primed_explosive(&self) -> bool {
        matches!(self.kind, ItemKind::Explosive { fuse: Some(_), .. })
    }
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// A living or undead inhabitant of a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable identifier.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Body plan; fixes faction and base stats.
    pub model: ActorModel,
    /// Whether the human player controls this actor.
    pub is_player: bool,
    /// Tile position on the actor's map.
    pub pos: Point,
    /// Budget spent by acting, regenerated every map turn.
    pub action_points: i32,
    /// Action points regenerated per map turn.
    pub speed: i32,
    /// Local turn of the last action, if any.
    pub last_action_turn: Option<u64>,
    /// Hit points.
    pub hp: Gauge,
    /// Stamina, spent by running and fighting.
    pub stamina: Gauge,
    /// Food; empty means starving.
    pub food: Gauge,
    /// Sleep; empty means exhausted.
    pub sleep: Gauge,
    /// Sanity; low values cause nightmares.
    pub sanity: Gauge,
    /// Infection points; death at `hp.max`.
    pub infection: i32,
    /// Whether the actor is asleep.
    pub is_sleeping: bool,
    /// Whether the actor died this turn and awaits removal.
    pub is_dead: bool,
    /// Leader this actor follows, if any.
    pub leader: Option<ActorId>,
    /// Trust in the leader, in `-TRUST_BOUND..=TRUST_BOUND`.
    pub trust_in_leader: i32,
    /// Skill levels.
    pub skills: BTreeMap<Skill, u8>,
    /// Items in hand or worn.
    pub equipped: Vec<Item>,
    /// Items in the backpack.
    pub inventory: Vec<Item>,
}

impl Actor {
    /// Create an actor of the given model with full gauges.
    ///
    /// Undead actors have zeroed food, sleep, and sanity gauges; the turn
    /// effects never decay them.
    pub fn new(name: impl Into<String>, model: ActorModel, pos: Point) -> Self {
        let living = !model.is_undead();
        let gauge = |max: i32| if living { Gauge::full(max) } else { Gauge::full(0) };
        Self {
            id: ActorId::new(),
            name: name.into(),
            model,
            is_player: false,
            pos,
            action_points: 0,
            speed: model.base_speed(),
            last_action_turn: None,
            hp: Gauge::full(model.base_hp()),
            stamina: Gauge::full(STAMINA_MAX),
            food: gauge(FOOD_MAX),
            sleep: gauge(SLEEP_MAX),
            sanity: gauge(SANITY_MAX),
            infection: 0,
            is_sleeping: false,
            is_dead: false,
            leader: None,
            trust_in_leader: TRUST_START,
            skills: BTreeMap::new(),
            equipped: Vec::new(),
            inventory: Vec::new(),
        }
    }

    /// Faction of the actor's model.
    pub const fn faction(&self) -> Faction {
        self.model.faction()
    }

    /// Whether the actor is undead.
    pub const fn is_undead(&self) -> bool {
        self.model.is_undead()
    }

    /// Whether the actor is alive (not awaiting removal).
    pub const fn is_alive(&self) -> bool {
        !self.is_dead
    }

    /// Infection as a percentage of the lethal amount (`hp.max`).
    pub fn infection_percent(&self) -> i32 {
        self.infection
            .saturating_mul(100)
            .checked_div(self.hp.max)
            .unwrap_or(0)
            .clamp(0, 100)
    }

    /// Level of a skill (0 when untrained).
    pub fn skill_level(&self, skill: Skill) -> u8 {
        self.skills.get(&skill).copied().unwrap_or(0)
    }

    /// Raise a skill by one level.
    pub fn gain_skill(&mut self, skill: Skill) {
        let level = self.skills.entry(skill).or_insert(0);
        *level = level.saturating_add(1);
    }

    /// Whether the actor is hostile toward `other`.
    pub const fn is_enemy_of(&self, other: &Self) -> bool {
        self.faction().is_enemy_of(other.faction())
    }
}

/// Remains of a dead actor lying on a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpse {
    /// Identifier the actor had while alive.
    pub actor: ActorId,
    /// Name the actor had while alive.
    pub name: String,
    /// Model the actor had while alive.
    pub model: ActorModel,
    /// Tile position.
    pub pos: Point,
    /// Map turns since death.
    pub turns_dead: u32,
    /// Decay level; the corpse vanishes when it reaches the rot limit.
    pub rot: i32,
    /// Whether the actor died of infection (reanimates more readily).
    pub is_infected: bool,
}

impl Corpse {
    /// Create a fresh corpse from a dead actor.
    pub fn from_actor(actor: &Actor) -> Self {
        Self {
            actor: actor.id,
            name: actor.name.clone(),
            model: actor.model,
            pos: actor.pos,
            turns_dead: 0,
            rot: 0,
            is_infected: actor.infection > 0,
        }
    }
}

/// A cosmetic tile decoration such as a vomit puddle or a blood stain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    /// Tile position.
    pub pos: Point,
    /// Decoration name.
    pub name: String,
}
