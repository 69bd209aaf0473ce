//! Seeded randomness for reproducible configuration sampling.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// `dof` joint values drawn uniformly from `[-limit, limit]`.
pub fn random_configuration(rng: &mut impl Rng, dof: usize, limit: f64) -> Vec<f64> {
    (0..dof).map(|_| rng.gen_range(-limit..=limit)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
