//! Deterministic per-trial seeds.
//!
//! A trial's random stream depends only on `(run seed, element, trial index)`,
//! never on which worker runs it or in what order chunks complete.

use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// One SplitMix64 output step.
#[inline]
pub fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Stable key of an element, independent of its slot in the index.
pub fn element_key(id: &str) -> u64 {
    fxhash::hash64(id)
}

#[inline]
pub fn trial_seed(run_seed: u64, element_key: u64, trial: u64) -> u64 {
    splitmix64(splitmix64(splitmix64(run_seed) ^ element_key) ^ trial)
}

#[inline]
pub fn trial_rng(run_seed: u64, element_key: u64, trial: u64) -> StdRng {
    StdRng::seed_from_u64(trial_seed(run_seed, element_key, trial))
}

///
/// The configured seed, or a fresh one from OS entropy. The drawn seed is
/// logged so that an unseeded run can still be replayed.
///
pub fn resolve_run_seed(configured: Option<u64>) -> u64 {
    match configured {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<u64>();
            info!("No seed configured, using random seed {}", seed);
            seed
        }
    }
}
