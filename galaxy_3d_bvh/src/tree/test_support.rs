/// Seeded random geometry shared by the tree unit tests.

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::math::Aabb;

/// Reproducible generator for a given seed
pub(crate) fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Point with every coordinate in `[lo, hi)`
pub(crate) fn random_vec3(rng: &mut impl Rng, lo: f64, hi: f64) -> DVec3 {
    DVec3::new(
        rng.random_range(lo..hi),
        rng.random_range(lo..hi),
        rng.random_range(lo..hi),
    )
}

/// Box with its min corner in `[-50, 50)^3` and each side in `[0.1, 5.1)`
pub(crate) fn random_box(rng: &mut impl Rng) -> Aabb {
    let min = random_vec3(rng, -50.0, 50.0);
    Aabb::new(min, min + random_vec3(rng, 0.1, 5.1))
}
