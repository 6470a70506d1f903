//! Detail-level flags for one district advance.
//!
//! The player's district always runs at full detail ([`SimFlags::NOT_SIMULATING`]).
//! Every other district runs some turns at low detail, skipping the costly
//! per-actor and per-tile effects. Which turns are low detail is a pure
//! table lookup on a preset [`SimRatio`] and the turn number, so skipping is
//! reproducible.

use serde::Deserialize;

/// Preset ratio of fully simulated turns for districts the player is not in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimRatio {
    /// No off-screen simulation: districts jump straight to world time.
    Off,
    /// Every turn at full detail.
    Full,
    /// Three turns in four at full detail.
    ThreeQuarters,
    /// Two turns in three at full detail.
    TwoThirds,
    /// Every other turn at full detail.
    #[default]
    Half,
    /// One turn in three at full detail.
    OneThird,
    /// One turn in four at full detail.
    OneQuarter,
}

impl SimRatio {
    /// Whether off-screen simulation is disabled.
    pub const fn is_off(self) -> bool {
        matches!(self, Self::Off)
    }

    /// Whether `turn` is a low-detail turn under this ratio.
    pub const fn is_low_detail_turn(self, turn: u64) -> bool {
        match self {
            Self::Off => true,
            Self::Full => false,
            Self::ThreeQuarters => turn % 4 == 3,
            Self::TwoThirds => turn % 3 == 2,
            Self::Half => turn % 2 == 1,
            Self::OneThird => turn % 3 != 0,
            Self::OneQuarter => turn % 4 != 0,
        }
    }
}

impl core::str::FromStr for SimRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "full" => Ok(Self::Full),
            "three_quarters" | "3/4" => Ok(Self::ThreeQuarters),
            "two_thirds" | "2/3" => Ok(Self::TwoThirds),
            "half" | "1/2" => Ok(Self::Half),
            "one_third" | "1/3" => Ok(Self::OneThird),
            "one_quarter" | "1/4" => Ok(Self::OneQuarter),
            other => Err(format!("unknown sim ratio: {other}")),
        }
    }
}

/// A small flag set gating the turn effects of one district advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SimFlags(u8);

impl SimFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// The district is the player's own; simulated live at full detail.
    pub const NOT_SIMULATING: Self = Self(1);
    /// Off-screen turn at full detail.
    pub const HIDETAIL_TURN: Self = Self(2);
    /// Off-screen turn at low detail; the expensive effects are skipped.
    pub const LODETAIL_TURN: Self = Self(4);

    /// Flags for an off-screen district advancing from `turn`.
    pub const fn for_turn(ratio: SimRatio, turn: u64) -> Self {
        if ratio.is_low_detail_turn(turn) {
            Self::LODETAIL_TURN
        } else {
            Self::HIDETAIL_TURN
        }
    }

    /// Whether every flag of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether the expensive effects must be skipped.
    pub const fn is_low_detail(self) -> bool {
        self.contains(Self::LODETAIL_TURN)
    }
}

impl core::ops::BitOr for SimFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}
