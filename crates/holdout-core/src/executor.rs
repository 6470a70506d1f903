//! Action execution.
//!
//! The executor validates and applies the actions chosen by a
//! [`DecisionSource`](crate::decision::DecisionSource). It is the only
//! place where actors spend action points on their own behalf.

use holdout_agents::{DeathCause, check_death, kill};
use holdout_types::{Action, ActionOutcome, ItemKind, Skill};
use holdout_world::{Map, WorldError};
use tracing::debug;

use crate::scheduler::BASE_ACTION_COST;

/// Damage of an unarmed hit.
const BASE_MELEE_DAMAGE: i32 = 2;

/// Infection points an undead bite adds to a living target.
const BITE_INFECTION: i32 = 1;

/// Validates and performs actions on a map.
///
/// Implementations run on whichever thread advances the map, so they must
/// be [`Send`].
pub trait ActionExecutor: Send {
    /// Whether `action` is legal for the actor at `actor_index`.
    fn is_legal(&self, map: &Map, actor_index: usize, action: &Action) -> bool;

    /// Perform a legal action and charge its cost.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] if the action touches state that does not
    /// exist.
    fn perform(
        &mut self,
        map: &mut Map,
        actor_index: usize,
        action: &Action,
    ) -> Result<ActionOutcome, WorldError>;
}

/// Straightforward survival rules: one action costs
/// [`BASE_ACTION_COST`], melee hits deal fixed damage plus skill and weapon
/// bonuses, undead hits infect.
#[derive(Debug, Clone, Copy, Default)]
pub struct RulesActionExecutor;

impl RulesActionExecutor {
    fn melee_damage(map: &Map, actor_index: usize) -> i32 {
        let Some(actor) = map.actors.get(actor_index) else {
            return 0;
        };
        let strength = if actor.is_undead() {
            actor.skill_level(Skill::ZombieStrong)
        } else {
            actor.skill_level(Skill::Strong)
        };
        let weapon = actor
            .equipped
            .iter()
            .map(|i| match i.kind {
                ItemKind::Weapon { damage } => damage,
                _ => 0,
            })
            .max()
            .unwrap_or(0);
        BASE_MELEE_DAMAGE
            .saturating_add(i32::from(strength))
            .saturating_add(weapon)
    }
}

impl ActionExecutor for RulesActionExecutor {
    fn is_legal(&self, map: &Map, actor_index: usize, action: &Action) -> bool {
        let Some(actor) = map.actors.get(actor_index) else {
            return false;
        };
        if !actor.is_alive() || actor.is_sleeping {
            return false;
        }
        match *action {
            Action::Wait => true,
            Action::Move { dir } => {
                let (dx, dy) = dir.delta();
                map.is_walkable(actor.pos.offset(dx, dy))
            }
            Action::Attack { target } => map
                .actor(target)
                .is_some_and(|t| t.id != actor.id && t.is_alive() && t.pos.is_adjacent(actor.pos)),
            Action::Eat { item } => {
                !actor.is_undead()
                    && actor
                        .inventory
                        .iter()
                        .any(|i| i.id == item && matches!(i.kind, ItemKind::Food { .. }))
            }
            Action::Sleep => !actor.is_undead(),
            Action::TakeItem { item } => map.items_at(actor.pos).iter().any(|i| i.id == item),
            Action::PrimeExplosive { item, fuse } => {
                fuse > 0
                    && actor.inventory.iter().any(|i| {
                        i.id == item && matches!(i.kind, ItemKind::Explosive { fuse: None, .. })
                    })
            }
        }
    }

    fn perform(
        &mut self,
        map: &mut Map,
        actor_index: usize,
        action: &Action,
    ) -> Result<ActionOutcome, WorldError> {
        let damage = Self::melee_damage(map, actor_index);
        let map_id = map.id();
        let (actor_id, actor_pos, actor_undead) = {
            let actor = map.actors.get(actor_index).ok_or(WorldError::NoActorAt {
                map: map_id,
                index: actor_index,
            })?;
            (actor.id, actor.pos, actor.is_undead())
        };
        let mut outcome = ActionOutcome {
            ap_spent: BASE_ACTION_COST,
            killed: Vec::new(),
        };

        match *action {
            Action::Wait => {}
            Action::Move { dir } => {
                let (dx, dy) = dir.delta();
                let to = actor_pos.offset(dx, dy);
                if let Some(actor) = map.actors.get_mut(actor_index) {
                    actor.pos = to;
                }
            }
            Action::Attack { target } => {
                let victim = map.actor_mut(target).ok_or(WorldError::ActorNotFound(target))?;
                victim.hp.sub(damage);
                if actor_undead && !victim.is_undead() {
                    victim.infection = victim.infection.saturating_add(BITE_INFECTION);
                }
                if victim.is_sleeping {
                    victim.is_sleeping = false;
                }
                if check_death(victim).is_some() {
                    kill(victim, DeathCause::Injury);
                    outcome.killed.push(target);
                }
                debug!(attacker = %actor_id, target = %target, damage, "Melee hit");
            }
            Action::Eat { item } => {
                if let Some(actor) = map.actors.get_mut(actor_index) {
                    let slot = actor.inventory.iter().position(|i| i.id == item);
                    if let Some(eaten) = slot.map(|s| actor.inventory.remove(s)) {
                        if let ItemKind::Food { nutrition } = eaten.kind {
                            actor.food.add(nutrition);
                        }
                    }
                }
            }
            Action::Sleep => {
                if let Some(actor) = map.actors.get_mut(actor_index) {
                    actor.is_sleeping = true;
                }
            }
            Action::TakeItem { item } => {
                let taken = map.take_item(actor_pos, item);
                if let (Some(taken), Some(actor)) = (taken, map.actors.get_mut(actor_index)) {
                    actor.inventory.push(taken);
                }
            }
            Action::PrimeExplosive { item, fuse } => {
                let primed = map.actors.get_mut(actor_index).and_then(|actor| {
                    let slot = actor.inventory.iter().position(|i| i.id == item)?;
                    let mut explosive = actor.inventory.remove(slot);
                    if let ItemKind::Explosive { fuse: f, .. } = &mut explosive.kind {
                        *f = Some(fuse);
                    }
                    Some(explosive)
                });
                if let Some(explosive) = primed {
                    map.drop_item(actor_pos, explosive)?;
                }
            }
        }

        if let Some(actor) = map.actors.get_mut(actor_index) {
            actor.action_points = actor.action_points.saturating_sub(outcome.ap_spent);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use holdout_types::{Actor, ActorModel, Direction, Item, MapKind, Point};

    fn map_with(actors: Vec<Actor>) -> Map {
        let mut map = Map::new(MapKind::Surface, 6, 6);
        for mut a in actors {
            a.action_points = BASE_ACTION_COST;
            map.spawn_actor(a);
        }
        map
    }

    #[test]
    fn move_is_charged_and_applied() {
        let mut map = map_with(vec![Actor::new("a", ActorModel::Civilian, Point::new(1, 1))]);
        let action = Action::Move {
            dir: Direction::East,
        };
        let mut exec = RulesActionExecutor;
        assert!(exec.is_legal(&map, 0, &action));
        let out = exec.perform(&mut map, 0, &action).unwrap();
        assert_eq!(out.ap_spent, BASE_ACTION_COST);
        assert_eq!(map.actors[0].pos, Point::new(2, 1));
        assert_eq!(map.actors[0].action_points, 0);
    }

    #[test]
    fn move_off_map_is_illegal() {
        let map = map_with(vec![Actor::new("a", ActorModel::Civilian, Point::new(0, 0))]);
        let action = Action::Move {
            dir: Direction::North,
        };
        assert!(!RulesActionExecutor.is_legal(&map, 0, &action));
    }

    #[test]
    fn undead_bite_infects_and_kills() {
        let zombie = Actor::new("z", ActorModel::Zombie, Point::new(1, 1));
        let mut victim = Actor::new("v", ActorModel::Civilian, Point::new(2, 1));
        victim.hp.set(1);
        let victim_id = victim.id;
        let mut map = map_with(vec![zombie, victim]);
        let action = Action::Attack { target: victim_id };
        let mut exec = RulesActionExecutor;
        assert!(exec.is_legal(&map, 0, &action));
        let out = exec.perform(&mut map, 0, &action).unwrap();
        assert_eq!(out.killed, vec![victim_id]);
        let victim = map.actor(victim_id).unwrap();
        assert!(victim.is_dead);
        assert_eq!(victim.infection, 1);
    }

    #[test]
    fn eating_restores_food() {
        let mut actor = Actor::new("a", ActorModel::Civilian, Point::new(1, 1));
        actor.food.set(100);
        let food = Item::new(ItemKind::Food { nutrition: 200 });
        actor.inventory.push(food);
        let mut map = map_with(vec![actor]);
        let action = Action::Eat { item: food.id };
        RulesActionExecutor.perform(&mut map, 0, &action).unwrap();
        assert_eq!(map.actors[0].food.value, 300);
        assert!(map.actors[0].inventory.is_empty());
    }

    #[test]
    fn priming_drops_a_live_explosive() {
        let mut actor = Actor::new("a", ActorModel::Soldier, Point::new(3, 3));
        let grenade = Item::new(ItemKind::Explosive {
            fuse: None,
            radius: 1,
            damage: 10,
        });
        actor.inventory.push(grenade);
        let mut map = map_with(vec![actor]);
        let action = Action::PrimeExplosive {
            item: grenade.id,
            fuse: 3,
        };
        let mut exec = RulesActionExecutor;
        assert!(exec.is_legal(&map, 0, &action));
        exec.perform(&mut map, 0, &action).unwrap();
        assert!(map.items_at(Point::new(3, 3))[0].is_primed_explosive());
    }

    #[test]
    fn sleepers_cannot_act() {
        let mut actor = Actor::new("a", ActorModel::Civilian, Point::new(1, 1));
        actor.is_sleeping = true;
        let map = map_with(vec![actor]);
        assert!(!RulesActionExecutor.is_legal(&map, 0, &Action::Wait));
    }
}
