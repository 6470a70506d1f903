//! Infection growth and its cascading symptoms.
//!
//! Infection is measured against the lethal amount (`hp.max`). Each turn the
//! infection may grow; then a symptom may trigger, with a per-mille chance
//! that rises with the infection percent. The symptom is the worst stage the
//! percent has reached:
//!
//! | Percent | Stage    | Effect                              |
//! |---------|----------|-------------------------------------|
//! | 10+     | Weak     | stamina loss                        |
//! | 30+     | Tired    | sleep loss                          |
//! | 50+     | Vomiting | food and action point loss          |
//! | 75+     | Bleeding | hit point loss                      |
//! | 100     | Death    | the actor dies (and will rise)      |

use holdout_types::Actor;
use rand::Rng;

use crate::chance::{roll_per_mille, roll_percent};
use crate::config::VitalsConfig;
use crate::death::{DeathCause, check_death, kill};
use crate::error::AgentError;

/// Percent at which the weak stage starts.
pub const WEAK_PCT: i32 = 10;
/// Percent at which the tired stage starts.
pub const TIRED_PCT: i32 = 30;
/// Percent at which the vomiting stage starts.
pub const VOMIT_PCT: i32 = 50;
/// Percent at which the bleeding stage starts.
pub const BLEED_PCT: i32 = 75;

/// Base per-mille chance for a symptom to trigger.
const SYMPTOM_BASE_PER_MILLE: u32 = 2;

/// Symptom triggered by an infection this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfectionSymptom {
    /// Stamina drained.
    Weak,
    /// Sleep drained.
    Tired,
    /// Food and action points lost; leaves a vomit puddle.
    Vomit,
    /// Hit points lost.
    Bleed,
    /// The infection killed the actor.
    Death,
}

/// Per-mille chance for a symptom at `percent` infection.
pub fn symptom_chance_per_mille(percent: i32) -> u32 {
    let scaled = u32::try_from(percent.clamp(0, 100)).unwrap_or(0) / 5;
    SYMPTOM_BASE_PER_MILLE.saturating_add(scaled)
}

/// Apply one turn of infection to a living actor.
///
/// Returns the symptom that triggered, if any. Uninfected and undead actors
/// are untouched.
///
/// # Errors
///
/// Returns [`AgentError::ArithmeticOverflow`] if the infection counter
/// overflows.
pub fn apply_infection_turn(
    actor: &mut Actor,
    config: &VitalsConfig,
    rng: &mut impl Rng,
) -> Result<Option<InfectionSymptom>, AgentError> {
    if actor.infection <= 0 || actor.is_undead() || actor.is_dead {
        return Ok(None);
    }

    if roll_percent(rng, config.infection_growth_chance) {
        actor.infection = actor
            .infection
            .checked_add(1)
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: String::from("infection growth overflow"),
            })?;
    }

    let percent = actor.infection_percent();
    if percent >= 100 {
        kill(actor, DeathCause::Infection);
        return Ok(Some(InfectionSymptom::Death));
    }
    if percent < WEAK_PCT || !roll_per_mille(rng, symptom_chance_per_mille(percent)) {
        return Ok(None);
    }

    let symptom = if percent >= BLEED_PCT {
        actor.hp.sub(config.bleed_hp_loss);
        InfectionSymptom::Bleed
    } else if percent >= VOMIT_PCT {
        actor.food.sub(config.vomit_food_loss);
        actor.action_points = actor.action_points.saturating_sub(config.vomit_ap_loss);
        InfectionSymptom::Vomit
    } else if percent >= TIRED_PCT {
        actor.sleep.sub(config.tired_sleep_loss);
        InfectionSymptom::Tired
    } else {
        actor.stamina.sub(config.weak_stamina_loss);
        InfectionSymptom::Weak
    };

    if let Some(cause) = check_death(actor) {
        kill(actor, cause);
        return Ok(Some(InfectionSymptom::Death));
    }
    Ok(Some(symptom))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use holdout_types::{ActorModel, Point};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn infected(percent: i32) -> Actor {
        let mut a = Actor::new("Ivy", ActorModel::Civilian, Point::new(0, 0));
        a.infection = a.hp.max * percent / 100;
        a
    }

    /// Run turns until a symptom shows up, with growth disabled.
    fn first_symptom(mut actor: Actor) -> (Actor, InfectionSymptom) {
        let cfg = VitalsConfig {
            infection_growth_chance: 0,
            ..VitalsConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..100_000 {
            if let Some(s) = apply_infection_turn(&mut actor, &cfg, &mut rng).unwrap() {
                return (actor, s);
            }
        }
        panic!("no symptom in 100000 turns");
    }

    #[test]
    fn uninfected_actor_is_untouched() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut a = infected(0);
        let out = apply_infection_turn(&mut a, &VitalsConfig::default(), &mut rng).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn chance_grows_with_percent() {
        assert!(symptom_chance_per_mille(80) > symptom_chance_per_mille(20));
        assert_eq!(symptom_chance_per_mille(0), SYMPTOM_BASE_PER_MILLE);
    }

    #[test]
    fn stages_follow_percent() {
        // Civilian max hp is 15: 2 -> 13%, 5 -> 33%, 8 -> 53%, 12 -> 80%.
        let stage = |points: i32| {
            let mut a = Actor::new("Ivy", ActorModel::Civilian, Point::new(0, 0));
            a.infection = points;
            first_symptom(a).1
        };
        assert_eq!(stage(2), InfectionSymptom::Weak);
        assert_eq!(stage(5), InfectionSymptom::Tired);
        assert_eq!(stage(8), InfectionSymptom::Vomit);
        assert_eq!(stage(12), InfectionSymptom::Bleed);
    }

    #[test]
    fn vomiting_costs_food_and_action_points() {
        let mut a = Actor::new("Ivy", ActorModel::Civilian, Point::new(0, 0));
        a.infection = 8;
        a.action_points = 100;
        let food = a.food.value;
        let (a, s) = first_symptom(a);
        assert_eq!(s, InfectionSymptom::Vomit);
        assert_eq!(a.food.value, food - 90);
        assert_eq!(a.action_points, 0);
    }

    #[test]
    fn full_infection_kills() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut a = infected(100);
        let out = apply_infection_turn(&mut a, &VitalsConfig::default(), &mut rng).unwrap();
        assert_eq!(out, Some(InfectionSymptom::Death));
        assert!(a.is_dead);
    }
}
