//! Configuration constants and defaults for per-actor rules.
//!
//! The [`VitalsConfig`] struct bundles every tunable so that callers (turn
//! effects, tests) can override defaults. It deserializes from the `vitals`
//! section of `holdout-config.yaml`; missing keys take the defaults below.

use serde::Deserialize;

/// Configuration for per-turn actor rules.
///
/// Rates are whole points per map turn; chances are percents unless the
/// name says per mille.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    /// Stamina regenerated per turn (default: 2).
    pub stamina_regen: i32,

    /// Food lost per turn (default: 1).
    pub food_decay: i32,

    /// Sleep lost per turn while awake (default: 1).
    pub sleep_decay: i32,

    /// Sanity lost per turn (default: 1).
    pub sanity_decay: i32,

    /// Whether an empty food gauge damages hit points (default: true).
    pub starvation_enabled: bool,

    /// Percent chance per turn to lose a hit point while starving (default: 5).
    pub starvation_damage_chance: u32,

    /// Percent chance per turn to collapse asleep when exhausted (default: 10).
    pub exhaustion_collapse_chance: u32,

    /// Sleep regenerated per turn while asleep (default: 4).
    pub sleep_regen: i32,

    /// Percent chance per turn to heal a hit point while asleep (default: 5).
    pub sleep_heal_chance: u32,

    /// Food percent below which a sleeper wakes up hungry (default: 10).
    pub hungry_wake_pct: i32,

    /// Sanity percent below which nightmares can happen (default: 25).
    pub nightmare_sanity_pct: i32,

    /// Percent chance per turn of a nightmare when insane enough (default: 2).
    pub nightmare_chance: u32,

    /// Sanity lost by a nightmare (default: 30).
    pub nightmare_sanity_loss: i32,

    /// Trust gained per turn near the leader, lost when apart (default: 1).
    pub trust_drift: i32,

    /// Percent chance per turn that an infection grows by one point (default: 5).
    pub infection_growth_chance: u32,

    /// Stamina lost by the "weak" symptom (default: 20).
    pub weak_stamina_loss: i32,

    /// Sleep lost by the "tired" symptom (default: 60).
    pub tired_sleep_loss: i32,

    /// Food lost by vomiting (default: 90).
    pub vomit_food_loss: i32,

    /// Action points lost by vomiting (default: 100).
    pub vomit_ap_loss: i32,

    /// Hit points lost by the "bleeding" symptom (default: 1).
    pub bleed_hp_loss: i32,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            stamina_regen: 2,
            food_decay: 1,
            sleep_decay: 1,
            sanity_decay: 1,
            starvation_enabled: true,
            starvation_damage_chance: 5,
            exhaustion_collapse_chance: 10,
            sleep_regen: 4,
            sleep_heal_chance: 5,
            hungry_wake_pct: 10,
            nightmare_sanity_pct: 25,
            nightmare_chance: 2,
            nightmare_sanity_loss: 30,
            trust_drift: 1,
            infection_growth_chance: 5,
            weak_stamina_loss: 20,
            tired_sleep_loss: 60,
            vomit_food_loss: 90,
            vomit_ap_loss: 100,
            bleed_hp_loss: 1,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_positive_rates() {
        let cfg = VitalsConfig::default();
        assert!(cfg.food_decay > 0);
        assert!(cfg.sleep_regen > cfg.sleep_decay);
        assert!(cfg.starvation_enabled);
    }

    #[test]
    fn partial_section_keeps_defaults() {
        let cfg: VitalsConfig = serde_json::from_str(r#"{"food_decay": 3}"#).unwrap();
        assert_eq!(cfg.food_decay, 3);
        assert_eq!(cfg.sleep_decay, VitalsConfig::default().sleep_decay);
    }
}
