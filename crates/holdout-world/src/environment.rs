//! Weather for the Holdout world.
//!
//! Weather is global: one value shared by every outdoor map, changed by the
//! main thread at scheduled turns. Transitions are weighted by the current
//! weather so that storms build up and clear gradually.
//!
//! | From \ To  | Clear | Cloudy | Rain | Heavy rain |
//! |------------|-------|--------|------|------------|
//! | Clear      |   0   |   70   |  30  |     0      |
//! | Cloudy     |  40   |    0   |  45  |    15      |
//! | Rain       |  30   |   40   |   0  |    30      |
//! | Heavy rain |   0   |   30   |  70  |     0      |
//!
//! # Determinism
//!
//! The RNG is a simple `xorshift64` seeded from `(world_seed, turn)`, so the
//! same seed and turn always produce the same weather and the same next
//! change turn.

use holdout_types::Weather;

use crate::clock::TURNS_PER_HOUR;

/// Minimum hours between weather changes.
const MIN_HOURS_BETWEEN_CHANGES: u64 = 2;

/// Maximum hours between weather changes.
const MAX_HOURS_BETWEEN_CHANGES: u64 = 12;

/// Salt mixed into the change-delay roll so it is independent from the
/// weather roll of the same turn.
const DELAY_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Weighted transitions out of one weather state.
#[derive(Debug, Clone)]
pub struct TransitionWeights {
    /// Weighted entries: `(weather, weight)`.
    entries: Vec<(Weather, u32)>,
}

impl TransitionWeights {
    /// Return the transition weights out of `current`.
    pub fn from_weather(current: Weather) -> Self {
        let entries = match current {
            Weather::Clear => vec![(Weather::Cloudy, 70), (Weather::Rain, 30)],
            Weather::Cloudy => vec![
                (Weather::Clear, 40),
                (Weather::Rain, 45),
                (Weather::HeavyRain, 15),
            ],
            Weather::Rain => vec![
                (Weather::Clear, 30),
                (Weather::Cloudy, 40),
                (Weather::HeavyRain, 30),
            ],
            Weather::HeavyRain => vec![(Weather::Cloudy, 30), (Weather::Rain, 70)],
        };
        Self { entries }
    }

    /// Select a weather given a roll in `[0, total_weight())`.
    fn select(&self, roll: u32) -> Weather {
        let mut cumulative: u32 = 0;
        for &(weather, weight) in &self.entries {
            cumulative = cumulative.saturating_add(weight);
            if roll < cumulative {
                return weather;
            }
        }
        Weather::Clear
    }

    /// Return the sum of all weights.
    fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0_u32, |acc, &(_, weight)| acc.saturating_add(weight))
    }
}

/// Deterministic weather generator.
#[derive(Debug, Clone, Copy)]
pub struct WeatherSystem {
    /// The world seed used to derive per-turn randomness.
    world_seed: u64,
}

impl WeatherSystem {
    /// Create a weather system with the given world seed.
    pub const fn new(world_seed: u64) -> Self {
        Self { world_seed }
    }

    /// The weather that follows `current` when a change happens at `turn`.
    pub fn next_weather(&self, current: Weather, turn: u64) -> Weather {
        let weights = TransitionWeights::from_weather(current);
        let total = weights.total_weight();
        if total == 0 {
            return current;
        }
        let random = deterministic_random(self.world_seed, turn);
        let remainder = random.checked_rem(u64::from(total)).unwrap_or(0);
        let roll = u32::try_from(remainder).unwrap_or(0);
        weights.select(roll)
    }

    /// Turn of the change after the one happening at `turn`.
    pub fn next_change_turn(&self, turn: u64) -> u64 {
        let span = MAX_HOURS_BETWEEN_CHANGES
            .saturating_sub(MIN_HOURS_BETWEEN_CHANGES)
            .saturating_add(1);
        let random = deterministic_random(self.world_seed ^ DELAY_SALT, turn);
        let hours = MIN_HOURS_BETWEEN_CHANGES.saturating_add(random.checked_rem(span).unwrap_or(0));
        turn.saturating_add(hours.saturating_mul(TURNS_PER_HOUR))
    }

    /// Return the world seed.
    pub const fn world_seed(&self) -> u64 {
        self.world_seed
    }
}

/// Percent chance per map turn that the weather puts out a given fire.
pub const fn fire_extinguish_chance(weather: Weather) -> u32 {
    match weather {
        Weather::Rain => 10,
        Weather::HeavyRain => 30,
        Weather::Clear | Weather::Cloudy => 0,
    }
}

/// Deterministic pseudo-random number generator using `xorshift64`.
///
/// Combines the world seed and turn number to produce a unique random value
/// for each `(seed, turn)` pair.
const fn deterministic_random(world_seed: u64, turn: u64) -> u64 {
    let mut state = world_seed.wrapping_add(turn.wrapping_mul(0x517c_c1b7_2722_0a95));

    // xorshift requires a non-zero state.
    if state == 0 {
        state = 0xdead_beef_cafe_babe;
    }

    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;

    state
}
