//! AI decision sources.
//!
//! The simulator never decides for an actor itself: it asks a
//! [`DecisionSource`] for an [`Action`] and hands the result to an
//! [`ActionExecutor`](crate::executor::ActionExecutor). Two sources ship
//! with the crate: [`StubDecisionSource`], which always waits, and
//! [`WanderDecisionSource`], a small survival-minded autopilot.

use holdout_types::{Action, Actor, ActorId, Direction, ItemKind, ScentKind};
use holdout_world::Map;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Food percentage under which an actor eats when it can.
const HUNGRY_PCT: i32 = 40;

/// Sleep percentage under which an actor lies down.
const TIRED_PCT: i32 = 20;

/// Percent chance an idle actor moves rather than waits.
const WANDER_CHANCE: u32 = 60;

/// Why a decision source could not produce an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    /// The source has nothing to offer for this actor.
    #[error("no decision for actor {actor}")]
    NoDecision {
        /// The actor asked.
        actor: ActorId,
    },

    /// The source failed internally.
    #[error("decision source failure: {reason}")]
    Internal {
        /// Description of the failure.
        reason: String,
    },
}

/// Produces the next action of an actor.
///
/// Implementations run on whichever thread advances the map, so they must
/// be [`Send`]. Each simulation context owns its own instance.
pub trait DecisionSource: Send {
    /// Decide what the actor at `actor_index` on `map` does next.
    ///
    /// # Errors
    ///
    /// Returns a [`DecisionError`] when no action can be produced.
    fn decide(&mut self, map: &Map, actor_index: usize) -> Result<Action, DecisionError>;
}

/// Always waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubDecisionSource;

impl DecisionSource for StubDecisionSource {
    fn decide(&mut self, _map: &Map, _actor_index: usize) -> Result<Action, DecisionError> {
        Ok(Action::Wait)
    }
}

/// Survival-minded autopilot: fight adjacent enemies, eat when hungry,
/// sleep when tired, otherwise wander. Undead follow the scent of the
/// living.
#[derive(Debug, Clone)]
pub struct WanderDecisionSource {
    rng: SmallRng,
}

impl WanderDecisionSource {
    /// Create an autopilot with its own seeded generator.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn step_toward_scent(map: &Map, actor: &Actor) -> Option<Direction> {
        let here = map.scents.strength_at(actor.pos, ScentKind::Living);
        Direction::ALL
            .into_iter()
            .map(|dir| {
                let (dx, dy) = dir.delta();
                let to = actor.pos.offset(dx, dy);
                (dir, to, map.scents.strength_at(to, ScentKind::Living))
            })
            .filter(|&(_, to, strength)| strength > here && map.is_walkable(to))
            .max_by_key(|&(_, _, strength)| strength)
            .map(|(dir, _, _)| dir)
    }

    fn random_step(&mut self, map: &Map, actor: &Actor) -> Option<Direction> {
        let open: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|dir| {
                let (dx, dy) = dir.delta();
                map.is_walkable(actor.pos.offset(dx, dy))
            })
            .collect();
        if open.is_empty() {
            return None;
        }
        open.get(self.rng.random_range(0..open.len())).copied()
    }
}

impl DecisionSource for WanderDecisionSource {
    fn decide(&mut self, map: &Map, actor_index: usize) -> Result<Action, DecisionError> {
        let actor = map.actors.get(actor_index).ok_or_else(|| DecisionError::Internal {
            reason: format!("no actor at index {actor_index}"),
        })?;

        if let Some(enemy) = map
            .actors
            .iter()
            .find(|o| o.is_alive() && o.pos.is_adjacent(actor.pos) && actor.is_enemy_of(o))
        {
            return Ok(Action::Attack { target: enemy.id });
        }

        if !actor.is_undead() {
            if actor.food.percent() < HUNGRY_PCT {
                let food = actor
                    .inventory
                    .iter()
                    .find(|i| matches!(i.kind, ItemKind::Food { .. }));
                if let Some(item) = food {
                    return Ok(Action::Eat { item: item.id });
                }
                let ground = map
                    .items_at(actor.pos)
                    .iter()
                    .find(|i| matches!(i.kind, ItemKind::Food { .. }));
                if let Some(item) = ground {
                    return Ok(Action::TakeItem { item: item.id });
                }
            }
            if actor.sleep.percent() < TIRED_PCT {
                return Ok(Action::Sleep);
            }
        } else if let Some(dir) = Self::step_toward_scent(map, actor) {
            return Ok(Action::Move { dir });
        }

        if self.rng.random_range(0..100) < WANDER_CHANCE {
            if let Some(dir) = self.random_step(map, actor) {
                return Ok(Action::Move { dir });
            }
        }
        Ok(Action::Wait)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use holdout_types::{ActorModel, Item, MapKind, Point};

    #[test]
    fn stub_always_waits() {
        let mut map = Map::new(MapKind::Surface, 5, 5);
        map.spawn_actor(Actor::new("a", ActorModel::Civilian, Point::new(1, 1)));
        assert_eq!(StubDecisionSource.decide(&map, 0).unwrap(), Action::Wait);
    }

    #[test]
    fn wander_attacks_adjacent_enemy() {
        let mut map = Map::new(MapKind::Surface, 5, 5);
        map.spawn_actor(Actor::new("cop", ActorModel::Policeman, Point::new(1, 1)));
        let zombie = Actor::new("z", ActorModel::Zombie, Point::new(2, 1));
        let zombie_id = zombie.id;
        map.spawn_actor(zombie);
        let mut source = WanderDecisionSource::new(1);
        assert_eq!(
            source.decide(&map, 0).unwrap(),
            Action::Attack { target: zombie_id }
        );
    }

    #[test]
    fn wander_eats_when_hungry() {
        let mut map = Map::new(MapKind::Surface, 5, 5);
        let mut actor = Actor::new("a", ActorModel::Civilian, Point::new(1, 1));
        actor.food.set(10);
        let food = Item::new(ItemKind::Food { nutrition: 300 });
        actor.inventory.push(food);
        map.spawn_actor(actor);
        let mut source = WanderDecisionSource::new(1);
        assert_eq!(source.decide(&map, 0).unwrap(), Action::Eat { item: food.id });
    }

    #[test]
    fn wander_sleeps_when_tired() {
        let mut map = Map::new(MapKind::Surface, 5, 5);
        let mut actor = Actor::new("a", ActorModel::Civilian, Point::new(1, 1));
        actor.sleep.set(5);
        map.spawn_actor(actor);
        let mut source = WanderDecisionSource::new(1);
        assert_eq!(source.decide(&map, 0).unwrap(), Action::Sleep);
    }

    #[test]
    fn undead_follow_living_scent() {
        let mut map = Map::new(MapKind::Sewers, 5, 5);
        map.spawn_actor(Actor::new("z", ActorModel::Zombie, Point::new(1, 1)));
        map.scents.emit(Point::new(2, 2), ScentKind::Living, 100);
        let mut source = WanderDecisionSource::new(1);
        assert_eq!(
            source.decide(&map, 0).unwrap(),
            Action::Move {
                dir: Direction::SouthEast
            }
        );
    }

    #[test]
    fn bad_index_is_internal_error() {
        let map = Map::new(MapKind::Surface, 5, 5);
        let mut source = WanderDecisionSource::new(1);
        assert!(matches!(
            source.decide(&map, 3),
            Err(DecisionError::Internal { .. })
        ));
    }
}
