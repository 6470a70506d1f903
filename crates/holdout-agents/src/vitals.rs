//! Gauge decay applied to living actors each full-detail map turn.
//!
//! Order of operations:
//!
//! 1. Stamina regenerates.
//! 2. Food, sleep (awake only), and sanity decay.
//! 3. Starvation damage when the food gauge is empty.
//! 4. Exhaustion collapse when the sleep gauge is empty.
//! 5. Death check.
//!
//! Leader trust drift is separate ([`apply_trust_drift`]) because it needs to
//! know whether the leader shares the actor's map.

use holdout_types::Actor;
use holdout_types::structs::TRUST_BOUND;
use rand::Rng;

use crate::chance::roll_percent;
use crate::config::VitalsConfig;
use crate::death::{DeathCause, check_death, kill};
use crate::error::AgentError;

/// Result of applying one turn of vitals to an actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VitalTickResult {
    /// The actor collapsed asleep from exhaustion this turn.
    pub collapsed: bool,
    /// If the actor died this turn, the cause.
    pub death: Option<DeathCause>,
}

/// Apply one turn of gauge decay to a living actor.
///
/// # Errors
///
/// Returns [`AgentError::NotLiving`] for undead actors.
pub fn apply_vital_tick(
    actor: &mut Actor,
    config: &VitalsConfig,
    rng: &mut impl Rng,
) -> Result<VitalTickResult, AgentError> {
    if actor.is_undead() {
        return Err(AgentError::NotLiving(actor.id));
    }
    let mut result = VitalTickResult::default();

    // 1-2. Regen and decay
    actor.stamina.add(config.stamina_regen);
    actor.food.sub(config.food_decay);
    if !actor.is_sleeping {
        actor.sleep.sub(config.sleep_decay);
    }
    actor.sanity.sub(config.sanity_decay);

    // 3. Starvation
    if config.starvation_enabled
        && actor.food.is_empty()
        && roll_percent(rng, config.starvation_damage_chance)
    {
        actor.hp.sub(1);
    }

    // 4. Exhaustion
    if !actor.is_sleeping
        && actor.sleep.is_empty()
        && roll_percent(rng, config.exhaustion_collapse_chance)
    {
        actor.is_sleeping = true;
        result.collapsed = true;
    }

    // 5. Death
    if let Some(cause) = check_death(actor) {
        result.death = Some(kill(actor, cause));
    }

    Ok(result)
}

/// Drift a follower's trust toward its leader: up when the leader is on the
/// same map, down otherwise. Actors without a leader are untouched.
///
/// # Errors
///
/// Returns [`AgentError::ArithmeticOverflow`] if the trust computation
/// overflows.
pub fn apply_trust_drift(
    actor: &mut Actor,
    leader_nearby: bool,
    config: &VitalsConfig,
) -> Result<(), AgentError> {
    if actor.leader.is_none() {
        return Ok(());
    }
    let delta = if leader_nearby {
        config.trust_drift
    } else {
        config.trust_drift.checked_neg().ok_or_else(|| AgentError::ArithmeticOverflow {
            context: String::from("trust drift negation overflow"),
        })?
    };
    let trust = actor
        .trust_in_leader
        .checked_add(delta)
        .ok_or_else(|| AgentError::ArithmeticOverflow {
            context: String::from("trust drift overflow"),
        })?;
    actor.trust_in_leader = trust.clamp(TRUST_BOUND.saturating_neg(), TRUST_BOUND);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use holdout_types::{ActorId, ActorModel, Point};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn civilian() -> Actor {
        Actor::new("Ann", ActorModel::Civilian, Point::new(0, 0))
    }

    #[test]
    fn gauges_decay_by_configured_rates() {
        let cfg = VitalsConfig::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut a = civilian();
        a.stamina.set(50);
        let food = a.food.value;
        let sleep = a.sleep.value;
        apply_vital_tick(&mut a, &cfg, &mut rng).unwrap();
        assert_eq!(a.stamina.value, 52);
        assert_eq!(a.food.value, food - 1);
        assert_eq!(a.sleep.value, sleep - 1);
    }

    #[test]
    fn sleepers_do_not_lose_sleep() {
        let cfg = VitalsConfig::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut a = civilian();
        a.sleep.set(100);
        a.is_sleeping = true;
        apply_vital_tick(&mut a, &cfg, &mut rng).unwrap();
        assert_eq!(a.sleep.value, 100);
    }

    #[test]
    fn starvation_eventually_kills() {
        let cfg = VitalsConfig {
            starvation_damage_chance: 100,
            ..VitalsConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(7);
        let mut a = civilian();
        a.food.set(0);
        let mut death = None;
        for _ in 0..100 {
            let r = apply_vital_tick(&mut a, &cfg, &mut rng).unwrap();
            if r.death.is_some() {
                death = r.death;
                break;
            }
        }
        assert_eq!(death, Some(DeathCause::Starvation));
        assert!(a.is_dead);
    }

    #[test]
    fn starvation_can_be_disabled() {
        let cfg = VitalsConfig {
            starvation_enabled: false,
            starvation_damage_chance: 100,
            ..VitalsConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(7);
        let mut a = civilian();
        a.food.set(0);
        let hp = a.hp.value;
        apply_vital_tick(&mut a, &cfg, &mut rng).unwrap();
        assert_eq!(a.hp.value, hp);
    }

    #[test]
    fn exhaustion_collapses() {
        let cfg = VitalsConfig {
            exhaustion_collapse_chance: 100,
            ..VitalsConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(3);
        let mut a = civilian();
        a.sleep.set(0);
        let r = apply_vital_tick(&mut a, &cfg, &mut rng).unwrap();
        assert!(r.collapsed);
        assert!(a.is_sleeping);
    }

    #[test]
    fn undead_are_rejected() {
        let cfg = VitalsConfig::default();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut z = Actor::new("Z", ActorModel::Zombie, Point::new(0, 0));
        assert!(matches!(
            apply_vital_tick(&mut z, &cfg, &mut rng),
            Err(AgentError::NotLiving(_))
        ));
    }

    #[test]
    fn trust_follows_leader_presence() {
        let cfg = VitalsConfig::default();
        let mut a = civilian();
        apply_trust_drift(&mut a, true, &cfg).unwrap();
        assert_eq!(a.trust_in_leader, 0);

        a.leader = Some(ActorId::new());
        apply_trust_drift(&mut a, true, &cfg).unwrap();
        apply_trust_drift(&mut a, true, &cfg).unwrap();
        assert_eq!(a.trust_in_leader, 2);
        apply_trust_drift(&mut a, false, &cfg).unwrap();
        assert_eq!(a.trust_in_leader, 1);
    }

    #[test]
    fn trust_is_bounded() {
        let cfg = VitalsConfig {
            trust_drift: 5000,
            ..VitalsConfig::default()
        };
        let mut a = civilian();
        a.leader = Some(ActorId::new());
        apply_trust_drift(&mut a, false, &cfg).unwrap();
        assert_eq!(a.trust_in_leader, -TRUST_BOUND);
    }
}
