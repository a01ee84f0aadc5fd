//! Seedable random-generator handles.
//!
//! Every stochastic routine in the crate takes `&mut R where R: Rng`
//! explicitly. These helpers create the concrete generator used by the
//! solvers so that a run is reproducible from its seed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Generator type used by the solvers.
pub type TimetableRng = SmallRng;

/// Creates a generator from a fixed seed.
pub fn create_rng(seed: u64) -> TimetableRng {
    SmallRng::seed_from_u64(seed)
}

/// Creates a generator from an optional seed, drawing one from the
/// thread-local source when none is given.
pub fn rng_from_seed(seed: Option<u64>) -> TimetableRng {
    create_rng(seed.unwrap_or_else(rand::random))
}

/// Draws a child seed, used to hand an independent stream to a worker.
pub fn split_seed<R: Rng>(rng: &mut R) -> u64 {
    rng.random()
}
