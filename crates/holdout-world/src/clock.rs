//! World and local time.
//!
//! [`WorldTime`] is a bare turn counter with pure derivations for day, hour,
//! night, and phase. The same type serves as the global world clock and as
//! every map's local clock, which may lag behind the world clock.
//!
//! # Design Principles
//!
//! - The turn counter is the only stored state; everything else is derived.
//! - The counter only moves forward, through [`WorldTime::increment`] or
//!   [`WorldTime::jump_to`], both using checked arithmetic.

use holdout_types::DayPhase;
use serde::{Deserialize, Serialize};

/// Turns in one in-game hour.
pub const TURNS_PER_HOUR: u64 = 30;

/// Hours in one in-game day.
pub const HOURS_PER_DAY: u64 = 24;

/// Turns in one in-game day.
pub const TURNS_PER_DAY: u64 = TURNS_PER_HOUR * HOURS_PER_DAY;

/// First hour of the day (inclusive).
const DAY_START_HOUR: u64 = 6;

/// First hour of the night (inclusive).
const NIGHT_START_HOUR: u64 = 18;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum TimeError {
    /// Turn counter would overflow.
    #[error("turn counter overflow: cannot advance beyond u64::MAX")]
    TurnOverflow,
}

/// A monotonically increasing turn counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorldTime {
    turn: u64,
}

impl WorldTime {
    /// A clock positioned at `turn`.
    pub const fn at(turn: u64) -> Self {
        Self { turn }
    }

    /// Advance by one turn. Returns the new turn number.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::TurnOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn increment(&mut self) -> Result<u64, TimeError> {
        self.turn = self.turn.checked_add(1).ok_or(TimeError::TurnOverflow)?;
        Ok(self.turn)
    }

    /// Move forward to `turn` without simulating the turns in between.
    /// Targets in the past are ignored; the counter never decreases.
    pub const fn jump_to(&mut self, turn: u64) {
        if turn > self.turn {
            self.turn = turn;
        }
    }

    /// Current turn number.
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// Zero-based day number.
    pub const fn day(&self) -> u64 {
        self.turn / TURNS_PER_DAY
    }

    /// Hour of the day, `0..24`.
    pub const fn hour(&self) -> u64 {
        (self.turn / TURNS_PER_HOUR) % HOURS_PER_DAY
    }

    /// Whether the current hour falls in the night (18:00 to 05:59).
    pub const fn is_night(&self) -> bool {
        let hour = self.hour();
        hour < DAY_START_HOUR || hour >= NIGHT_START_HOUR
    }

    /// Coarse phase of the day.
    pub const fn phase(&self) -> DayPhase {
        match self.hour() {
            0 => DayPhase::Midnight,
            1..=5 => DayPhase::DeepNight,
            6 => DayPhase::Sunrise,
            7..=11 => DayPhase::Morning,
            12 => DayPhase::Midday,
            13..=17 => DayPhase::Afternoon,
            18 => DayPhase::Sunset,
            _ => DayPhase::Evening,
        }
    }

    /// Whether this is the first turn of a day (turn 0 included).
    pub const fn is_strike_of_midnight(&self) -> bool {
        self.turn % TURNS_PER_DAY == 0
    }

    /// Whether this is the first turn of the noon hour.
    pub const fn is_strike_of_midday(&self) -> bool {
        self.turn % TURNS_PER_DAY == TURNS_PER_DAY / 2
    }

    /// Whether this is the first turn of any hour.
    pub const fn is_strike_of_hour(&self) -> bool {
        self.turn % TURNS_PER_HOUR == 0
    }
}

impl core::fmt::Display for WorldTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let minute = (self.turn % TURNS_PER_HOUR).saturating_mul(2);
        write!(f, "day {} {:02}:{:02}", self.day(), self.hour(), minute)
    }
}
