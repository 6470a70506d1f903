//! Scent fields laid by actors and followed by trackers.
//!
//! Each tile holds at most one strength per [`ScentKind`]. Emitting keeps the
//! strongest value; decay subtracts a fixed amount and forgets dead cells.

use std::collections::BTreeMap;

use holdout_types::{Point, ScentKind};

/// Strength an actor leaves on its own tile each map turn.
pub const SCENT_EMIT_STRENGTH: i32 = 256;

/// Strength lost per map turn.
pub const SCENT_DECAY_PER_TURN: i32 = 8;

/// All scents on one map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScentField {
    cells: BTreeMap<(Point, ScentKind), i32>,
}

impl ScentField {
    /// Create an empty field.
    pub const fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }

    /// Lay scent at `pos`, keeping the stronger of old and new.
    pub fn emit(&mut self, pos: Point, kind: ScentKind, strength: i32) {
        let cell = self.cells.entry((pos, kind)).or_insert(0);
        *cell = (*cell).max(strength);
    }

    /// Weaken every cell by `amount`, dropping the ones that fade out.
    pub fn decay(&mut self, amount: i32) {
        self.cells.retain(|_, strength| {
            *strength = strength.saturating_sub(amount);
            *strength > 0
        });
    }

    /// Strength at `pos` (0 when absent).
    pub fn strength_at(&self, pos: Point, kind: ScentKind) -> i32 {
        self.cells.get(&(pos, kind)).copied().unwrap_or(0)
    }

    /// Number of live cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no scent remains.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_keeps_strongest() {
        let mut field = ScentField::new();
        let p = Point::new(2, 3);
        field.emit(p, ScentKind::Living, 100);
        field.emit(p, ScentKind::Living, 40);
        assert_eq!(field.strength_at(p, ScentKind::Living), 100);
        assert_eq!(field.strength_at(p, ScentKind::Undead), 0);
    }

    #[test]
    fn decay_removes_faded_cells() {
        let mut field = ScentField::new();
        field.emit(Point::new(0, 0), ScentKind::Undead, 10);
        field.emit(Point::new(1, 0), ScentKind::Undead, 30);
        field.decay(10);
        assert_eq!(field.len(), 1);
        assert_eq!(field.strength_at(Point::new(1, 0), ScentKind::Undead), 20);
    }
}
