//! Sleep handling for sleeping living actors.
//!
//! A sleeper regenerates its sleep gauge and may heal. It wakes when danger
//! is adjacent, when hunger gets urgent, when fully rested, or when a
//! nightmare strikes an actor whose sanity has run low.

use holdout_types::{Actor, Skill};
use rand::Rng;

use crate::chance::roll_percent;
use crate::config::VitalsConfig;

/// Extra heal chance per level of the medic skill.
const MEDIC_HEAL_BONUS_PER_LEVEL: u32 = 2;

/// Why a sleeper woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Sleep gauge is full.
    Rested,
    /// Food gauge fell too low.
    Hungry,
    /// A hostile actor is adjacent.
    Danger,
    /// A nightmare interrupted sleep.
    Nightmare,
}

/// Result of one sleeping turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The actor was not asleep; nothing happened.
    Awake,
    /// Still sleeping.
    StillAsleep {
        /// A hit point was healed this turn.
        healed: bool,
    },
    /// The actor woke up.
    Woke(WakeReason),
}

/// Apply one turn of sleep to a living actor.
///
/// `hostile_adjacent` is computed by the caller from the map.
pub fn apply_sleep_turn(
    actor: &mut Actor,
    config: &VitalsConfig,
    hostile_adjacent: bool,
    rng: &mut impl Rng,
) -> SleepOutcome {
    if !actor.is_sleeping || actor.is_undead() || actor.is_dead {
        return SleepOutcome::Awake;
    }

    actor.sleep.add(config.sleep_regen);
    let heal_chance = config.sleep_heal_chance.saturating_add(
        MEDIC_HEAL_BONUS_PER_LEVEL.saturating_mul(u32::from(actor.skill_level(Skill::Medic))),
    );
    let healed = !actor.hp.is_full() && roll_percent(rng, heal_chance);
    if healed {
        actor.hp.add(1);
    }

    let reason = if hostile_adjacent {
        Some(WakeReason::Danger)
    } else if actor.food.percent() < config.hungry_wake_pct {
        Some(WakeReason::Hungry)
    } else if actor.sleep.is_full() {
        Some(WakeReason::Rested)
    } else if actor.sanity.percent() < config.nightmare_sanity_pct
        && roll_percent(rng, config.nightmare_chance)
    {
        actor.sanity.sub(config.nightmare_sanity_loss);
        Some(WakeReason::Nightmare)
    } else {
        None
    };

    match reason {
        Some(reason) => {
            actor.is_sleeping = false;
            SleepOutcome::Woke(reason)
        }
        None => SleepOutcome::StillAsleep { healed },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdout_types::{ActorModel, Point};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn sleeper() -> Actor {
        let mut a = Actor::new("Sam", ActorModel::Civilian, Point::new(0, 0));
        a.is_sleeping = true;
        a.sleep.set(100);
        a
    }

    #[test]
    fn awake_actor_is_untouched() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut a = Actor::new("Sam", ActorModel::Civilian, Point::new(0, 0));
        let before = a.clone();
        let out = apply_sleep_turn(&mut a, &VitalsConfig::default(), false, &mut rng);
        assert_eq!(out, SleepOutcome::Awake);
        assert_eq!(a, before);
    }

    #[test]
    fn sleep_regenerates() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut a = sleeper();
        let out = apply_sleep_turn(&mut a, &VitalsConfig::default(), false, &mut rng);
        assert!(matches!(out, SleepOutcome::StillAsleep { .. }));
        assert_eq!(a.sleep.value, 104);
    }

    #[test]
    fn danger_wakes_immediately() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut a = sleeper();
        let out = apply_sleep_turn(&mut a, &VitalsConfig::default(), true, &mut rng);
        assert_eq!(out, SleepOutcome::Woke(WakeReason::Danger));
        assert!(!a.is_sleeping);
    }

    #[test]
    fn hunger_wakes() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut a = sleeper();
        a.food.set(10);
        let out = apply_sleep_turn(&mut a, &VitalsConfig::default(), false, &mut rng);
        assert_eq!(out, SleepOutcome::Woke(WakeReason::Hungry));
    }

    #[test]
    fn full_sleep_wakes_rested() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut a = sleeper();
        a.sleep.set(a.sleep.max);
        let out = apply_sleep_turn(&mut a, &VitalsConfig::default(), false, &mut rng);
        assert_eq!(out, SleepOutcome::Woke(WakeReason::Rested));
    }

    #[test]
    fn nightmares_hit_the_insane() {
        let cfg = VitalsConfig {
            nightmare_chance: 100,
            ..VitalsConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let mut a = sleeper();
        a.sanity.set(100);
        let out = apply_sleep_turn(&mut a, &cfg, false, &mut rng);
        assert_eq!(out, SleepOutcome::Woke(WakeReason::Nightmare));
        assert_eq!(a.sanity.value, 70);
    }
}
