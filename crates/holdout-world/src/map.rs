//! A single map: one layer (surface, sewers, subway) of a district.
//!
//! The map owns its actors in an arena vector. Actor order is the scheduling
//! order; the persisted `next_actor_cursor` records where the next scheduler
//! scan starts so that repeated scans within one local turn are fair.
//!
//! Local time and the cursor are private: local time only moves forward and
//! the cursor is kept consistent when actors are removed.

use std::collections::{BTreeMap, BTreeSet};

use holdout_types::{Actor, ActorId, Corpse, Decoration, Item, ItemId, MapId, MapKind, Point};
use tracing::debug;

use crate::clock::{TimeError, WorldTime};
use crate::error::WorldError;
use crate::scent::ScentField;
use crate::timer::{TimerQueue, TimerTask};

/// One layer of a district.
#[derive(Debug, Clone)]
pub struct Map {
    id: MapId,
    kind: MapKind,
    width: i32,
    height: i32,
    local_time: WorldTime,
    next_actor_cursor: usize,
    /// Actors present on the map, in scheduling order.
    pub actors: Vec<Actor>,
    /// Corpses lying on the map.
    pub corpses: Vec<Corpse>,
    /// Items lying on the ground, keyed by tile.
    pub ground: BTreeMap<Point, Vec<Item>>,
    /// Scent left by actors.
    pub scents: ScentField,
    /// Burning tiles.
    pub fires: BTreeSet<Point>,
    /// Cosmetic decorations.
    pub decorations: Vec<Decoration>,
    /// Pending timers.
    pub timers: TimerQueue,
}

impl Map {
    /// Create an empty map at local turn 0.
    pub fn new(kind: MapKind, width: i32, height: i32) -> Self {
        Self {
            id: MapId::new(),
            kind,
            width: width.max(1),
            height: height.max(1),
            local_time: WorldTime::default(),
            next_actor_cursor: 0,
            actors: Vec::new(),
            corpses: Vec::new(),
            ground: BTreeMap::new(),
            scents: ScentField::new(),
            fires: BTreeSet::new(),
            decorations: Vec::new(),
            timers: TimerQueue::new(),
        }
    }

    /// Map identifier.
    pub const fn id(&self) -> MapId {
        self.id
    }

    /// Layer of the district this map represents.
    pub const fn kind(&self) -> MapKind {
        self.kind
    }

    /// Width in tiles.
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in tiles.
    pub const fn height(&self) -> i32 {
        self.height
    }

    // -------------------------------------------------------------------
    // Local time
    // -------------------------------------------------------------------

    /// The map's local clock.
    pub const fn local_time(&self) -> WorldTime {
        self.local_time
    }

    /// Advance local time by exactly one turn.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::TurnOverflow`] on counter overflow.
    pub fn advance_local_turn(&mut self) -> Result<u64, TimeError> {
        self.local_time.increment()
    }

    /// Jump local time forward to `turn` without simulating.
    pub const fn jump_to(&mut self, turn: u64) {
        self.local_time.jump_to(turn);
    }

    // -------------------------------------------------------------------
    // Scheduling cursor
    // -------------------------------------------------------------------

    /// Index where the next scheduler scan starts.
    pub const fn next_actor_cursor(&self) -> usize {
        self.next_actor_cursor
    }

    /// Move the cursor; indices past the end wrap to 0.
    pub fn set_next_actor_cursor(&mut self, index: usize) {
        self.next_actor_cursor = if index >= self.actors.len() { 0 } else { index };
    }

    // -------------------------------------------------------------------
    // Actors
    // -------------------------------------------------------------------

    /// Append an actor at the end of the scheduling order. Returns its index.
    pub fn spawn_actor(&mut self, actor: Actor) -> usize {
        let index = self.actors.len();
        debug!(map = %self.id, actor = %actor.id, model = ?actor.model, "Actor spawned");
        self.actors.push(actor);
        index
    }

    /// Remove the actor at `index`, keeping the cursor on the same next
    /// actor.
    pub fn remove_actor(&mut self, index: usize) -> Option<Actor> {
        if index >= self.actors.len() {
            return None;
        }
        let actor = self.actors.remove(index);
        if index < self.next_actor_cursor {
            self.next_actor_cursor = self.next_actor_cursor.saturating_sub(1);
        }
        if self.next_actor_cursor >= self.actors.len() {
            self.next_actor_cursor = 0;
        }
        Some(actor)
    }

    /// Index of the actor with `id`.
    pub fn actor_index(&self, id: ActorId) -> Option<usize> {
        self.actors.iter().position(|a| a.id == id)
    }

    /// Actor with `id`.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    /// Mutable actor with `id`.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    /// Actor standing on `pos`, if any.
    pub fn actor_at(&self, pos: Point) -> Option<&Actor> {
        self.actors.iter().find(|a| a.is_alive() && a.pos == pos)
    }

    /// The player actor, if on this map.
    pub fn player(&self) -> Option<&Actor> {
        self.actors.iter().find(|a| a.is_player)
    }

    /// Live undead actors.
    pub fn count_undead(&self) -> usize {
        self.actors
            .iter()
            .filter(|a| a.is_alive() && a.is_undead())
            .count()
    }

    /// Live living actors.
    pub fn count_living(&self) -> usize {
        self.actors
            .iter()
            .filter(|a| a.is_alive() && !a.is_undead())
            .count()
    }

    /// Turn every actor flagged dead into a corpse (living actors only;
    /// destroyed undead leave nothing), drop their items on their tile, and
    /// remove them from the arena. Returns the removed identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if a dead actor stands outside
    /// the map.
    pub fn remove_dead(&mut self) -> Result<Vec<ActorId>, WorldError> {
        let mut removed = Vec::new();
        let mut index = 0_usize;
        while let Some(actor) = self.actors.get(index) {
            if actor.is_alive() {
                index = index.saturating_add(1);
                continue;
            }
            let Some(actor) = self.remove_actor(index) else {
                break;
            };
            if !actor.is_undead() {
                self.corpses.push(Corpse::from_actor(&actor));
            }
            for item in actor.equipped.iter().chain(actor.inventory.iter()) {
                self.drop_item(actor.pos, *item)?;
            }
            removed.push(actor.id);
        }
        Ok(removed)
    }

    // -------------------------------------------------------------------
    // Tiles
    // -------------------------------------------------------------------

    /// Whether `pos` lies on the map.
    pub const fn is_in_bounds(&self, pos: Point) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Whether an actor can step onto `pos`.
    pub fn is_walkable(&self, pos: Point) -> bool {
        self.is_in_bounds(pos) && self.actor_at(pos).is_none() && !self.fires.contains(&pos)
    }

    /// Put an item on the ground.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `pos` is outside the map.
    pub fn drop_item(&mut self, pos: Point, item: Item) -> Result<(), WorldError> {
        if !self.is_in_bounds(pos) {
            return Err(WorldError::OutOfBounds { map: self.id, pos });
        }
        self.ground.entry(pos).or_default().push(item);
        Ok(())
    }

    /// Remove an item from the ground at `pos`.
    pub fn take_item(&mut self, pos: Point, item: ItemId) -> Option<Item> {
        let stack = self.ground.get_mut(&pos)?;
        let index = stack.iter().position(|i| i.id == item)?;
        let taken = stack.remove(index);
        if stack.is_empty() {
            self.ground.remove(&pos);
        }
        Some(taken)
    }

    /// Items on the ground at `pos`.
    pub fn items_at(&self, pos: Point) -> &[Item] {
        self.ground.get(&pos).map_or(&[], Vec::as_slice)
    }

    /// Set a tile on fire. Returns `false` if the tile is off-map.
    pub fn ignite(&mut self, pos: Point) -> bool {
        if !self.is_in_bounds(pos) {
            return false;
        }
        self.fires.insert(pos)
    }

    /// Put out the fire on a tile.
    pub fn extinguish(&mut self, pos: Point) -> bool {
        self.fires.remove(&pos)
    }

    /// Add a decoration.
    pub fn add_decoration(&mut self, pos: Point, name: &str) {
        self.decorations.push(Decoration {
            pos,
            name: name.to_owned(),
        });
    }

    /// Remove the first decoration named `name` on `pos`.
    pub fn remove_decoration(&mut self, pos: Point, name: &str) -> bool {
        let found = self
            .decorations
            .iter()
            .position(|d| d.pos == pos && d.name == name);
        found.is_some_and(|index| {
            self.decorations.remove(index);
            true
        })
    }

    /// Carry out a completed timer task. Announcements are returned for the
    /// caller to relay.
    pub fn apply_timer_task(&mut self, task: TimerTask) -> Option<String> {
        match task {
            TimerTask::RemoveDecoration { pos, name } => {
                self.remove_decoration(pos, &name);
                None
            }
            TimerTask::BurnOut { pos } => {
                self.extinguish(pos);
                None
            }
            TimerTask::Announcement { message } => Some(message),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use holdout_types::{ActorModel, ItemKind};

    fn map_with(n: usize) -> Map {
        let mut map = Map::new(MapKind::Surface, 10, 10);
        for i in 0..n {
            let x = i32::try_from(i).unwrap();
            map.spawn_actor(Actor::new(format!("a{i}"), ActorModel::Civilian, Point::new(x, 0)));
        }
        map
    }

    #[test]
    fn local_time_only_moves_forward() {
        let mut map = map_with(0);
        assert_eq!(map.advance_local_turn().unwrap(), 1);
        map.jump_to(0);
        assert_eq!(map.local_time().turn(), 1);
        map.jump_to(40);
        assert_eq!(map.local_time().turn(), 40);
    }

    #[test]
    fn cursor_wraps_past_the_end() {
        let mut map = map_with(3);
        map.set_next_actor_cursor(2);
        assert_eq!(map.next_actor_cursor(), 2);
        map.set_next_actor_cursor(3);
        assert_eq!(map.next_actor_cursor(), 0);
    }

    #[test]
    fn removing_before_cursor_keeps_next_actor() {
        let mut map = map_with(4);
        map.set_next_actor_cursor(2);
        let next_id = map.actors.get(2).unwrap().id;
        map.remove_actor(0);
        assert_eq!(map.actors.get(map.next_actor_cursor()).unwrap().id, next_id);
    }

    #[test]
    fn removing_last_actor_resets_cursor() {
        let mut map = map_with(2);
        map.set_next_actor_cursor(1);
        map.remove_actor(1);
        assert_eq!(map.next_actor_cursor(), 0);
    }

    #[test]
    fn dead_living_actor_leaves_corpse_and_items() {
        let mut map = map_with(2);
        let food = Item::new(ItemKind::Food { nutrition: 100 });
        {
            let victim = map.actors.get_mut(0).unwrap();
            victim.inventory.push(food);
            victim.is_dead = true;
        }
        let removed = map.remove_dead().unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(map.actors.len(), 1);
        assert_eq!(map.corpses.len(), 1);
        assert_eq!(map.items_at(Point::new(0, 0)), &[food]);
    }

    #[test]
    fn destroyed_undead_leave_no_corpse() {
        let mut map = Map::new(MapKind::Sewers, 5, 5);
        let mut z = Actor::new("z", ActorModel::Zombie, Point::new(1, 1));
        z.is_dead = true;
        map.spawn_actor(z);
        map.remove_dead().unwrap();
        assert!(map.corpses.is_empty());
    }

    #[test]
    fn dropping_off_map_is_an_error() {
        let mut map = map_with(0);
        let item = Item::new(ItemKind::Medikit { heal: 5 });
        let err = map.drop_item(Point::new(-1, 3), item);
        assert!(matches!(err, Err(WorldError::OutOfBounds { .. })));
    }

    #[test]
    fn take_item_cleans_empty_stacks() {
        let mut map = map_with(0);
        let item = Item::new(ItemKind::Weapon { damage: 2 });
        map.drop_item(Point::new(4, 4), item).unwrap();
        assert_eq!(map.take_item(Point::new(4, 4), item.id), Some(item));
        assert!(map.ground.is_empty());
    }

    #[test]
    fn timer_tasks_mutate_the_map() {
        let mut map = map_with(0);
        map.add_decoration(Point::new(1, 1), "vomit");
        map.ignite(Point::new(2, 2));
        let none = map.apply_timer_task(TimerTask::RemoveDecoration {
            pos: Point::new(1, 1),
            name: "vomit".to_owned(),
        });
        assert!(none.is_none());
        assert!(map.decorations.is_empty());
        map.apply_timer_task(TimerTask::BurnOut { pos: Point::new(2, 2) });
        assert!(map.fires.is_empty());
        let msg = map.apply_timer_task(TimerTask::Announcement { message: "hi".to_owned() });
        assert_eq!(msg.as_deref(), Some("hi"));
    }
}
