//! The world grid of districts.
//!
//! Every district sits behind its own [`Mutex`]: the district is the unit of
//! mutual exclusion between the main thread and the background worker. The
//! grid itself is immutable once built and is shared through an [`Arc`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use holdout_types::DistrictPos;

use crate::district::District;
use crate::error::WorldError;

/// A district shared between threads.
pub type SharedDistrict = Arc<Mutex<District>>;

/// Lock a district, recovering from poisoning.
///
/// A panic inside the worker poisons the lock of the district it was
/// advancing; the district data is still structurally valid, so the main
/// thread keeps using it.
pub fn lock_district(district: &Mutex<District>) -> MutexGuard<'_, District> {
    district.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Rectangular grid of districts in row-major order.
#[derive(Debug)]
pub struct DistrictGrid {
    width: i32,
    height: i32,
    districts: Vec<SharedDistrict>,
}

impl DistrictGrid {
    /// Build a grid from districts listed in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::GridShape`] if the count does not match the
    /// dimensions, or a district's own position disagrees with its slot.
    pub fn new(width: i32, height: i32, districts: Vec<District>) -> Result<Self, WorldError> {
        let shape_err = || WorldError::GridShape {
            width,
            height,
            count: districts.len(),
        };
        let expected = usize::try_from(width.max(0))
            .ok()
            .zip(usize::try_from(height.max(0)).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .ok_or_else(shape_err)?;
        if expected != districts.len() || expected == 0 {
            return Err(shape_err());
        }
        let mut slots = Vec::with_capacity(districts.len());
        for (slot, district) in districts.iter().enumerate() {
            let pos = district.pos();
            if index_of(width, height, pos) != Some(slot) {
                return Err(shape_err());
            }
        }
        for district in districts {
            slots.push(Arc::new(Mutex::new(district)));
        }
        Ok(Self {
            width,
            height,
            districts: slots,
        })
    }

    /// Grid width.
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Grid height.
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Whether `pos` lies on the grid.
    pub const fn contains(&self, pos: DistrictPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// The district at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DistrictNotFound`] if `pos` is off the grid.
    pub fn get(&self, pos: DistrictPos) -> Result<&SharedDistrict, WorldError> {
        index_of(self.width, self.height, pos)
            .and_then(|i| self.districts.get(i))
            .ok_or(WorldError::DistrictNotFound(pos))
    }

    /// Lock the district at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DistrictNotFound`] if `pos` is off the grid.
    pub fn lock(&self, pos: DistrictPos) -> Result<MutexGuard<'_, District>, WorldError> {
        self.get(pos).map(|d| lock_district(d))
    }

    /// In-grid neighbors of `pos` (up to eight).
    pub fn neighbors(&self, pos: DistrictPos) -> Vec<DistrictPos> {
        pos.neighbors()
            .into_iter()
            .filter(|&n| self.contains(n))
            .collect()
    }

    /// Every grid position in row-major order.
    pub fn positions(&self) -> Vec<DistrictPos> {
        let mut out = Vec::with_capacity(self.districts.len());
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(DistrictPos::new(x, y));
            }
        }
        out
    }
}

/// Row-major slot of `pos`, or `None` when off-grid.
fn index_of(width: i32, height: i32, pos: DistrictPos) -> Option<usize> {
    if pos.x < 0 || pos.y < 0 || pos.x >= width || pos.y >= height {
        return None;
    }
    let row = pos.y.checked_mul(width)?;
    usize::try_from(row.checked_add(pos.x)?).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::map::Map;
    use holdout_types::MapKind;

    fn grid(w: i32, h: i32) -> DistrictGrid {
        let mut districts = Vec::new();
        for y in 0..h {
            for x in 0..w {
                districts.push(District::new(
                    DistrictPos::new(x, y),
                    vec![Map::new(MapKind::Surface, 4, 4)],
                ));
            }
        }
        DistrictGrid::new(w, h, districts).unwrap()
    }

    #[test]
    fn lookup_by_position() {
        let g = grid(3, 2);
        let d = g.lock(DistrictPos::new(2, 1)).unwrap();
        assert_eq!(d.pos(), DistrictPos::new(2, 1));
    }

    #[test]
    fn off_grid_lookup_fails() {
        let g = grid(2, 2);
        assert!(matches!(
            g.get(DistrictPos::new(2, 0)),
            Err(WorldError::DistrictNotFound(_))
        ));
    }

    #[test]
    fn corner_has_three_neighbors() {
        let g = grid(3, 3);
        assert_eq!(g.neighbors(DistrictPos::new(0, 0)).len(), 3);
        assert_eq!(g.neighbors(DistrictPos::new(1, 1)).len(), 8);
        assert_eq!(g.neighbors(DistrictPos::new(2, 1)).len(), 5);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let districts = vec![District::new(DistrictPos::new(0, 0), Vec::new())];
        assert!(matches!(
            DistrictGrid::new(2, 1, districts),
            Err(WorldError::GridShape { .. })
        ));
    }

    #[test]
    fn misplaced_district_is_rejected() {
        let districts = vec![
            District::new(DistrictPos::new(1, 0), Vec::new()),
            District::new(DistrictPos::new(0, 0), Vec::new()),
        ];
        assert!(DistrictGrid::new(2, 1, districts).is_err());
    }

    #[test]
    fn positions_are_row_major() {
        let g = grid(2, 2);
        assert_eq!(
            g.positions(),
            vec![
                DistrictPos::new(0, 0),
                DistrictPos::new(1, 0),
                DistrictPos::new(0, 1),
                DistrictPos::new(1, 1),
            ]
        );
    }
}
