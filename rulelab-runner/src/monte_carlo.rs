//! Monte Carlo resampling — bootstrapped trade populations.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use rulelab_core::Trade;

/// Options for [`monte_carlo`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonteCarloOptions {
    pub random_seed: u64,
}

/// Draw `num_iterations` samples of `num_samples` trades each, with
/// replacement, from the given population.
///
/// An empty population yields an empty result; zero iterations or samples
/// yield the correspondingly empty structure.
pub fn monte_carlo(
    trades: &[Trade],
    num_iterations: usize,
    num_samples: usize,
    options: &MonteCarloOptions,
) -> Vec<Vec<Trade>> {
    if trades.is_empty() {
        return Vec::new();
    }
    let mut rng = ChaCha8Rng::seed_from_u64(options.random_seed);
    (0..num_iterations)
        .map(|_| {
            (0..num_samples)
                .map(|_| trades[rng.gen_range(0..trades.len())].clone())
                .collect()
        })
        .collect()
}
