//! Skill upgrades at the day/night edges.
//!
//! Living NPCs learn a random living skill at dawn. Undead of the evolving
//! branches learn a random undead skill at dusk. The player levels through
//! its own UI and is never upgraded here.

use holdout_types::{Actor, Skill};
use rand::Rng;

/// Hit points gained per toughness level.
const TOUGHNESS_HP_BONUS: i32 = 2;

/// Speed gained per agility level.
const AGILITY_SPEED_BONUS: i32 = 5;

/// Give a living NPC one random living skill. Returns the skill learned.
pub fn upgrade_living_npc(actor: &mut Actor, rng: &mut impl Rng) -> Option<Skill> {
    if actor.is_player || actor.is_undead() || actor.is_dead {
        return None;
    }
    let skill = *Skill::LIVING.get(rng.random_range(0..Skill::LIVING.len()))?;
    learn(actor, skill);
    Some(skill)
}

/// Give an evolving undead one random undead skill. Returns the skill
/// learned; non-evolving branches learn nothing.
pub fn upgrade_undead(actor: &mut Actor, rng: &mut impl Rng) -> Option<Skill> {
    if !actor.model.evolves_at_dusk() || actor.is_dead {
        return None;
    }
    let skill = *Skill::UNDEAD.get(rng.random_range(0..Skill::UNDEAD.len()))?;
    learn(actor, skill);
    Some(skill)
}

/// Raise a skill and apply its passive stat bonus.
fn learn(actor: &mut Actor, skill: Skill) {
    actor.gain_skill(skill);
    match skill {
        Skill::Toughness | Skill::ZombieToughness => {
            actor.hp.max = actor.hp.max.saturating_add(TOUGHNESS_HP_BONUS);
            actor.hp.add(TOUGHNESS_HP_BONUS);
        }
        Skill::Agile | Skill::ZombieAgile => {
            actor.speed = actor.speed.saturating_add(AGILITY_SPEED_BONUS);
        }
        Skill::Awake
        | Skill::Firearms
        | Skill::Medic
        | Skill::Strong
        | Skill::ZombieStrong => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdout_types::{ActorModel, Point};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn living_npc_learns_living_skill() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut a = Actor::new("Cop", ActorModel::Policeman, Point::new(0, 0));
        let skill = upgrade_living_npc(&mut a, &mut rng);
        assert!(skill.is_some_and(|s| Skill::LIVING.contains(&s)));
        assert_eq!(a.skills.values().copied().sum::<u8>(), 1);
    }

    #[test]
    fn player_is_never_upgraded() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut a = Actor::new("You", ActorModel::Civilian, Point::new(0, 0));
        a.is_player = true;
        assert_eq!(upgrade_living_npc(&mut a, &mut rng), None);
    }

    #[test]
    fn only_evolving_undead_upgrade() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut z = Actor::new("Z", ActorModel::Zombie, Point::new(0, 0));
        let mut s = Actor::new("S", ActorModel::Skeleton, Point::new(0, 0));
        assert!(upgrade_undead(&mut z, &mut rng).is_some_and(|k| Skill::UNDEAD.contains(&k)));
        assert_eq!(upgrade_undead(&mut s, &mut rng), None);
        assert_eq!(upgrade_living_npc(&mut z, &mut rng), None);
    }

    #[test]
    fn toughness_raises_max_hp() {
        let mut a = Actor::new("Cop", ActorModel::Policeman, Point::new(0, 0));
        let before = a.hp.max;
        learn(&mut a, Skill::Toughness);
        assert_eq!(a.hp.max, before.saturating_add(TOUGHNESS_HP_BONUS));
        assert!(a.hp.is_full());
    }
}
