//! Districts: bundles of maps sharing one synchronization checkpoint.

use std::collections::BTreeMap;

use holdout_types::{DistrictPos, MapKind, RaidType};

use crate::error::WorldError;
use crate::map::Map;

/// A cell of the world grid with its surface and underground maps.
#[derive(Debug, Clone)]
pub struct District {
    pos: DistrictPos,
    /// Maps of the district; the surface map comes first.
    pub maps: Vec<Map>,
    /// Local turn at which each cooldown-gated event last fired.
    pub last_raid_turn: BTreeMap<RaidType, u64>,
    /// Entry-map turn the scripted events last ran for.
    pub last_event_turn: Option<u64>,
}

impl District {
    /// Create a district from its maps.
    pub const fn new(pos: DistrictPos, maps: Vec<Map>) -> Self {
        Self {
            pos,
            maps,
            last_raid_turn: BTreeMap::new(),
            last_event_turn: None,
        }
    }

    /// Claim the scripted-event roll for entry-map turn `turn`. Returns
    /// `false` if events already ran for it.
    pub fn claim_event_turn(&mut self, turn: u64) -> bool {
        if self.last_event_turn.is_some_and(|last| last >= turn) {
            return false;
        }
        self.last_event_turn = Some(turn);
        true
    }

    /// Grid position.
    pub const fn pos(&self) -> DistrictPos {
        self.pos
    }

    /// District local turn: the minimum local turn over its maps.
    pub fn local_turn(&self) -> u64 {
        self.maps
            .iter()
            .map(|m| m.local_time().turn())
            .min()
            .unwrap_or(0)
    }

    /// Index of the map of the given kind.
    pub fn map_index(&self, kind: MapKind) -> Option<usize> {
        self.maps.iter().position(|m| m.kind() == kind)
    }

    /// Map of the given kind.
    pub fn map(&self, kind: MapKind) -> Option<&Map> {
        self.maps.iter().find(|m| m.kind() == kind)
    }

    /// Mutable map of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MapNotFound`] if the district has no such layer.
    pub fn map_mut(&mut self, kind: MapKind) -> Result<&mut Map, WorldError> {
        let district = self.pos;
        self.maps
            .iter_mut()
            .find(|m| m.kind() == kind)
            .ok_or(WorldError::MapNotFound { district, kind })
    }

    /// The surface map, where the district is entered.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MapNotFound`] if the district has no surface.
    pub fn entry_map_mut(&mut self) -> Result<&mut Map, WorldError> {
        self.map_mut(MapKind::Surface)
    }

    /// Force every map's local time to `turn` (never backwards).
    pub fn jump_to(&mut self, turn: u64) {
        for map in &mut self.maps {
            map.jump_to(turn);
        }
    }

    /// Whether the player stands on one of the district's maps.
    pub fn contains_player(&self) -> bool {
        self.maps.iter().any(|m| m.player().is_some())
    }

    /// Whether the player is here and asleep.
    pub fn is_player_sleeping(&self) -> bool {
        self.maps
            .iter()
            .filter_map(Map::player)
            .any(|p| p.is_sleeping && p.is_alive())
    }

    /// Turn the raid last fired, if ever.
    pub fn last_raid_turn(&self, raid: RaidType) -> Option<u64> {
        self.last_raid_turn.get(&raid).copied()
    }

    /// Record that `raid` fired at `turn`.
    pub fn record_raid(&mut self, raid: RaidType, turn: u64) {
        self.last_raid_turn.insert(raid, turn);
    }
}
