//! Chance rolls shared by every rule.

use rand::Rng;

/// Roll a `pct` percent chance.
pub fn roll_percent(rng: &mut impl Rng, pct: u32) -> bool {
    pct > 0 && rng.random_range(0..100_u32) < pct
}

/// Roll a `per_mille` chance out of 1000.
pub fn roll_per_mille(rng: &mut impl Rng, per_mille: u32) -> bool {
    per_mille > 0 && rng.random_range(0..1000_u32) < per_mille
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn zero_never_hits() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!((0..1000).all(|_| !roll_percent(&mut rng, 0)));
        assert!((0..1000).all(|_| !roll_per_mille(&mut rng, 0)));
    }

    #[test]
    fn full_always_hits() {
        let mut rng = SmallRng::seed_from_u64(2);
        assert!((0..1000).all(|_| roll_percent(&mut rng, 100)));
        assert!((0..1000).all(|_| roll_per_mille(&mut rng, 1000)));
    }
}
