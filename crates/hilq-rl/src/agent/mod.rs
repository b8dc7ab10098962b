//! Tabular agents learning from one human rating per episode
//!
//! - [`SimpleAgent`]: one-step Q-learning backups seeded by the terminal rating
//! - [`ExtendedAgent`]: reward shaping, TD-error tracking and generalisation
//!   of a rating to similar, not yet visited endings

pub mod extended;
pub mod simple;

pub use extended::ExtendedAgent;
pub use simple::SimpleAgent;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Deterministic generator when a seed is configured, entropy otherwise
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Sort states deepest first so shallower backups see fresh deeper values
pub(crate) fn deepest_first(states: &mut [crate::state::State]) {
    states.sort_by_key(|s| std::cmp::Reverse(s.len()));
}
