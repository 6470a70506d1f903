//! Actor scheduling within one map.
//!
//! Actors accumulate action points every map turn and spend them by acting.
//! The scheduler picks the single next actor allowed to act, scanning the
//! arena round-robin from the map's persisted cursor. When nobody is
//! eligible the caller advances the map turn, which regenerates action
//! points and resets the cursor.

use std::collections::BTreeMap;

use holdout_types::{Actor, ActorId};
use holdout_world::Map;

/// Action points spent by one ordinary action; also the eligibility floor.
pub const BASE_ACTION_COST: i32 = 100;

/// Whether an actor may be selected to act.
pub const fn is_eligible(actor: &Actor) -> bool {
    actor.is_alive() && !actor.is_sleeping && actor.action_points >= BASE_ACTION_COST
}

/// Select the next actor to act on `map` during local turn `current_turn`.
///
/// The first pass prefers actors that have not acted this turn; the second
/// accepts any eligible actor so that fast actors get their extra actions.
/// On a hit the cursor moves past the selected actor. `None` means the map
/// turn must advance.
pub fn next_actor_to_act(map: &mut Map, current_turn: u64) -> Option<usize> {
    let len = map.actors.len();
    if len == 0 {
        return None;
    }
    let start = map.next_actor_cursor();
    let slot = |k: usize| start.saturating_add(k).checked_rem(len).unwrap_or(0);

    let fresh = (0..len).map(slot).find(|&i| {
        map.actors
            .get(i)
            .is_some_and(|a| is_eligible(a) && a.last_action_turn != Some(current_turn))
    });
    let found = fresh.or_else(|| (0..len).map(slot).find(|&i| map.actors.get(i).is_some_and(is_eligible)));

    if let Some(index) = found {
        map.set_next_actor_cursor(index.saturating_add(1));
    }
    found
}

/// Regenerate action points at a map-turn boundary and reset the cursor.
///
/// Sleepers and the dead regenerate nothing.
pub fn regenerate_action_points(map: &mut Map) {
    for actor in map.actors.iter_mut().filter(|a| a.is_alive() && !a.is_sleeping) {
        let cap = actor.speed.max(BASE_ACTION_COST).saturating_mul(2);
        actor.action_points = actor.action_points.saturating_add(actor.speed).min(cap);
    }
    map.set_next_actor_cursor(0);
}

/// What the loop guard concluded about a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopVerdict {
    /// Normal scheduling.
    Clear,
    /// The actor has been selected `selections` times in this map pass.
    Looping {
        /// Selections of the actor so far.
        selections: u32,
    },
}

/// Detects an AI stuck being selected over and over within one map pass,
/// typically by choosing actions that cost nothing.
///
/// One guard covers one map pass; create a fresh guard per pass.
#[derive(Debug, Clone)]
pub struct LoopGuard {
    selections: BTreeMap<ActorId, u32>,
    threshold: u32,
}

impl LoopGuard {
    /// Create a guard that trips once an actor is selected more than
    /// `threshold` times.
    pub const fn new(threshold: u32) -> Self {
        Self {
            selections: BTreeMap::new(),
            threshold,
        }
    }

    /// Record a selection. The player is never considered looping.
    pub fn observe(&mut self, actor: &Actor) -> LoopVerdict {
        if actor.is_player {
            return LoopVerdict::Clear;
        }
        let count = self.selections.entry(actor.id).or_insert(0);
        *count = count.saturating_add(1);
        if *count > self.threshold {
            LoopVerdict::Looping { selections: *count }
        } else {
            LoopVerdict::Clear
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use holdout_types::{ActorModel, MapKind, Point};
    use proptest::prelude::*;

    fn map_with(n: usize, ap: i32) -> Map {
        let mut map = Map::new(MapKind::Surface, 20, 20);
        for i in 0..n {
            let mut actor = Actor::new(
                format!("a{i}"),
                ActorModel::Civilian,
                Point::new(i32::try_from(i).unwrap(), 0),
            );
            actor.action_points = ap;
            map.spawn_actor(actor);
        }
        map
    }

    fn act(map: &mut Map, index: usize, turn: u64) {
        let actor = &mut map.actors[index];
        actor.action_points -= BASE_ACTION_COST;
        actor.last_action_turn = Some(turn);
    }

    #[test]
    fn empty_map_has_nobody() {
        let mut map = Map::new(MapKind::Surface, 5, 5);
        assert_eq!(next_actor_to_act(&mut map, 0), None);
    }

    #[test]
    fn round_robin_from_cursor() {
        let mut map = map_with(3, BASE_ACTION_COST);
        let mut order = Vec::new();
        while let Some(i) = next_actor_to_act(&mut map, 0) {
            act(&mut map, i, 0);
            order.push(i);
        }
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn fast_actor_gets_second_action_after_others() {
        let mut map = map_with(2, BASE_ACTION_COST);
        map.actors[0].action_points = 2 * BASE_ACTION_COST;
        let mut order = Vec::new();
        while let Some(i) = next_actor_to_act(&mut map, 5) {
            act(&mut map, i, 5);
            order.push(i);
        }
        assert_eq!(order, vec![0, 1, 0]);
    }

    #[test]
    fn sleepers_and_dead_are_skipped() {
        let mut map = map_with(3, BASE_ACTION_COST);
        map.actors[0].is_sleeping = true;
        map.actors[1].is_dead = true;
        assert_eq!(next_actor_to_act(&mut map, 0), Some(2));
    }

    #[test]
    fn regeneration_is_capped_and_resets_cursor() {
        let mut map = map_with(2, 0);
        map.actors[1].is_sleeping = true;
        map.set_next_actor_cursor(1);
        for _ in 0..10 {
            regenerate_action_points(&mut map);
        }
        assert_eq!(map.actors[0].action_points, 2 * BASE_ACTION_COST);
        assert_eq!(map.actors[1].action_points, 0);
        assert_eq!(map.next_actor_cursor(), 0);
    }

    #[test]
    fn slow_actor_acts_after_ceil_cost_over_speed_turns() {
        for speed in [30, 60, 80, 100, 120] {
            let mut map = map_with(1, 0);
            map.actors[0].speed = speed;
            let expected = (BASE_ACTION_COST + speed - 1) / speed;
            let mut turns = 0;
            while next_actor_to_act(&mut map, 0).is_none() {
                regenerate_action_points(&mut map);
                turns += 1;
            }
            assert_eq!(turns, expected, "speed {speed}");
        }
    }

    #[test]
    fn loop_guard_counts_interleaved_selections() {
        let actor = Actor::new("a", ActorModel::Zombie, Point::new(0, 0));
        let other = Actor::new("b", ActorModel::Zombie, Point::new(1, 0));
        let mut guard = LoopGuard::new(3);
        for _ in 0..3 {
            assert_eq!(guard.observe(&actor), LoopVerdict::Clear);
            assert_eq!(guard.observe(&other), LoopVerdict::Clear);
        }
        assert_eq!(guard.observe(&actor), LoopVerdict::Looping { selections: 4 });
    }

    #[test]
    fn loop_guard_ignores_player() {
        let mut player = Actor::new("p", ActorModel::Survivor, Point::new(0, 0));
        player.is_player = true;
        let mut guard = LoopGuard::new(1);
        for _ in 0..5 {
            assert_eq!(guard.observe(&player), LoopVerdict::Clear);
        }
    }

    proptest! {
        #[test]
        fn every_eligible_actor_acts_once_before_repeats(n in 1_usize..12, cursor in 0_usize..12) {
            let mut map = map_with(n, BASE_ACTION_COST);
            map.set_next_actor_cursor(cursor);
            let mut seen = Vec::new();
            while let Some(i) = next_actor_to_act(&mut map, 7) {
                act(&mut map, i, 7);
                seen.push(i);
            }
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());
        }
    }
}
