//! Bootstrap reweighting of pair weights.
//!
//! Only two bootstrap types change anything for pairwise objectives:
//! `Bernoulli` lowers the query sample rate (see
//! [`BootstrapConfig::query_sample_rate`]) and `Bayesian` multiplies every pair
//! weight by its own random factor. `Poisson` is rejected up front.

use rand::Rng;

use crate::training::config::{BootstrapConfig, BootstrapType};
use crate::training::random::{RandomStream, RoundSeed};
use crate::training::TargetError;
use crate::utils::{split_blocks_mut, Parallelism};

/// Reject bootstrap types that `objective` cannot honor.
pub fn check_supported(config: &BootstrapConfig, objective: &'static str) -> Result<(), TargetError> {
    match config.bootstrap_type {
        BootstrapType::Poisson => Err(TargetError::UnsupportedBootstrap {
            bootstrap: BootstrapType::Poisson,
            objective,
        }),
        _ => Ok(()),
    }
}

/// Bayesian bootstrap factor `(-ln u)^temperature` with `u` uniform in `(0, 1]`.
#[inline]
pub fn bayesian_weight<R: Rng>(rng: &mut R, temperature: f32) -> f32 {
    let u = 1.0 - rng.r#gen::<f64>();
    (-u.ln()).powf(temperature as f64) as f32
}

/// Apply the bootstrap to per-pair weights laid out in per-query blocks.
///
/// `pair_offsets` delimits the blocks (as produced by
/// [`exclusive_scan`](crate::utils::exclusive_scan)); `global_queries[k]` is the
/// global id of the query owning block `k`. Bayesian factors of a block are
/// drawn in block order from the query's own generator, one per slot.
pub fn apply_to_pair_weights(
    config: &BootstrapConfig,
    weights: &mut [f32],
    pair_offsets: &[usize],
    global_queries: &[usize],
    seed: RoundSeed,
    parallelism: Parallelism,
) {
    debug_assert_eq!(pair_offsets.len(), global_queries.len() + 1);
    match config.bootstrap_type {
        BootstrapType::No | BootstrapType::Bernoulli | BootstrapType::Poisson => {}
        BootstrapType::Bayesian => {
            let temperature = config.bagging_temperature;
            let blocks: Vec<(&mut [f32], usize)> = split_blocks_mut(weights, pair_offsets)
                .into_iter()
                .zip(global_queries.iter().copied())
                .collect();
            parallelism.maybe_par_for_each(blocks, |(block, query)| {
                let mut rng = seed.query_rng(RandomStream::Bayesian, query);
                for w in block.iter_mut() {
                    *w *= bayesian_weight(&mut rng, temperature);
                }
            });
        }
    }
}
