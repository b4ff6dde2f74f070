//! Monte-Carlo PFound pair weights.
//!
//! PFound models a user scanning a ranked list top to bottom and stopping after
//! each document with probability `P_BREAK`, so position `k` is looked at with
//! decay `(1 - P_BREAK)^k`. The estimator samples rankings around the current
//! scores and, for every adjacent pair `(a, b)` at positions `(k, k + 1)` with
//! different labels, credits `P_BREAK * (1 - P_BREAK)^k * |t_a - t_b|` to the
//! pair `(winner, loser)`, averaged over all sampled rankings. Labels are used
//! as graded gains without clamping.
//!
//! Rankings are drawn in log space: document `i` gets the key
//! `s_i + ln(u_i / (1 - u_i))`, a logistic perturbation of its centered score.

use rand::distributions::Open01;
use rand::Rng;

use crate::training::objectives::pairs::SampledQueries;
use crate::training::random::{RandomStream, RoundSeed};
use crate::utils::{split_blocks_mut, Parallelism};

/// Probability that the user stops scanning after any document.
pub const P_BREAK: f64 = 0.15;

/// Subtract each query's mean score.
///
/// `values` holds one score per sampled document; `query_offsets` delimits the
/// queries.
pub fn remove_query_means(values: &mut [f32], query_offsets: &[usize]) {
    for window in query_offsets.windows(2) {
        let block = &mut values[window[0]..window[1]];
        if block.is_empty() {
            continue;
        }
        let mean = block.iter().map(|&v| v as f64).sum::<f64>() / block.len() as f64;
        for v in block.iter_mut() {
            *v = ((*v as f64) - mean) as f32;
        }
    }
}

/// PFound pair weight estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PFoundWeights {
    permutation_count: u32,
}

impl PFoundWeights {
    /// Create an estimator drawing `permutation_count` rankings per query.
    ///
    /// # Panics
    ///
    /// Panics if `permutation_count` is zero.
    pub fn new(permutation_count: u32) -> Self {
        assert!(permutation_count > 0, "permutation_count must be positive");
        Self { permutation_count }
    }

    #[inline]
    pub fn permutation_count(&self) -> u32 {
        self.permutation_count
    }

    /// Compute one weight per candidate pair.
    ///
    /// `scores` (mean-centered) and `targets` hold one entry per sampled document. The
    /// result follows the block layout of `queries.pair_offsets`: pair
    /// `(i, j)` of a query with `n` sampled documents is at block index
    /// `i * n + j`.
    pub fn compute(
        &self,
        scores: &[f32],
        targets: &[f32],
        queries: &SampledQueries,
        seed: RoundSeed,
        parallelism: Parallelism,
    ) -> Vec<f32> {
        debug_assert_eq!(scores.len(), queries.n_docs());
        debug_assert_eq!(targets.len(), queries.n_docs());

        let mut weights = vec![0.0f32; queries.n_pairs()];
        let blocks: Vec<(usize, &mut [f32])> = split_blocks_mut(&mut weights, &queries.pair_offsets)
            .into_iter()
            .enumerate()
            .collect();

        parallelism.maybe_par_for_each(blocks, |(k, block)| {
            let range = queries.query_range(k);
            let mut rng = seed.query_rng(RandomStream::PFound, queries.global_queries[k]);
            self.query_weights(&scores[range.clone()], &targets[range], &mut rng, block);
        });
        weights
    }

    /// Accumulate the weights of one query into its `n * n` block.
    fn query_weights<R: Rng>(&self, scores: &[f32], targets: &[f32], rng: &mut R, block: &mut [f32]) {
        let n = scores.len();
        if n < 2 {
            return;
        }

        let scale = P_BREAK / self.permutation_count as f64;
        let mut acc = vec![0.0f64; n * n];
        let mut keys = vec![0.0f64; n];
        let mut order: Vec<usize> = (0..n).collect();

        for _ in 0..self.permutation_count {
            for (key, &s) in keys.iter_mut().zip(scores) {
                let u: f64 = rng.sample(Open01);
                *key = s as f64 + (u / (1.0 - u)).ln();
            }
            for (pos, slot) in order.iter_mut().enumerate() {
                *slot = pos;
            }
            // Descending by key, lower position first on ties
            order.sort_by(|&a, &b| keys[b].total_cmp(&keys[a]));

            let mut decay = 1.0f64;
            for k in 0..n - 1 {
                let (a, b) = (order[k], order[k + 1]);
                let (t_a, t_b) = (targets[a], targets[b]);
                if t_a != t_b {
                    let (winner, loser) = if t_a > t_b { (a, b) } else { (b, a) };
                    acc[winner * n + loser] += scale * decay * (t_a as f64 - t_b as f64).abs();
                }
                decay *= 1.0 - P_BREAK;
            }
        }

        for (w, &a) in block.iter_mut().zip(&acc) {
            *w = a as f32;
        }
    }
}
