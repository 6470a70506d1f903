//! Death conditions for actors.
//!
//! An actor dies when its hit points reach 0 or its infection reaches the
//! lethal amount. Dead actors stay in the map arena flagged `is_dead` until
//! the map removes them and leaves a corpse.

use holdout_types::Actor;

/// The cause of an actor's death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// Hit points drained by hunger.
    Starvation,
    /// Infection reached 100%.
    Infection,
    /// Caught in a blast.
    Explosion,
    /// Any other damage (combat, bleeding).
    Injury,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Starvation => write!(f, "starvation"),
            Self::Infection => write!(f, "infection"),
            Self::Explosion => write!(f, "explosion"),
            Self::Injury => write!(f, "injury"),
        }
    }
}

/// Check whether a living actor meets a death condition.
///
/// Returns `None` for actors that are already flagged dead.
pub fn check_death(actor: &Actor) -> Option<DeathCause> {
    if actor.is_dead {
        return None;
    }
    if !actor.is_undead() && actor.infection_percent() >= 100 {
        return Some(DeathCause::Infection);
    }
    if actor.hp.is_empty() {
        if !actor.is_undead() && actor.food.is_empty() {
            return Some(DeathCause::Starvation);
        }
        return Some(DeathCause::Injury);
    }
    None
}

/// Flag an actor dead and drain its hit points.
pub fn kill(actor: &mut Actor, cause: DeathCause) -> DeathCause {
    actor.hp.set(0);
    actor.is_dead = true;
    actor.is_sleeping = false;
    tracing::debug!(actor = %actor.id, name = %actor.name, %cause, "Actor died");
    cause
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdout_types::{ActorModel, Point};

    fn civilian() -> Actor {
        Actor::new("Ann", ActorModel::Civilian, Point::new(0, 0))
    }

    #[test]
    fn healthy_actor_is_alive() {
        assert_eq!(check_death(&civilian()), None);
    }

    #[test]
    fn lethal_infection_kills() {
        let mut a = civilian();
        a.infection = a.hp.max;
        assert_eq!(check_death(&a), Some(DeathCause::Infection));
    }

    #[test]
    fn empty_hp_while_starving_is_starvation() {
        let mut a = civilian();
        a.food.set(0);
        a.hp.set(0);
        assert_eq!(check_death(&a), Some(DeathCause::Starvation));
    }

    #[test]
    fn kill_flags_and_is_idempotent_for_checks() {
        let mut a = civilian();
        a.is_sleeping = true;
        kill(&mut a, DeathCause::Injury);
        assert!(a.is_dead);
        assert!(!a.is_sleeping);
        assert_eq!(check_death(&a), None);
    }
}
