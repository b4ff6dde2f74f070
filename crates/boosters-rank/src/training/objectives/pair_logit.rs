//! Pairwise logistic derivatives.
//!
//! For a pair `(i, j)` where `i` is preferred, the model probability of the
//! correct order is `p = sigmoid(s_i - s_j)`. Derivatives follow the direction of
//! increasing log-likelihood: `d ln p / d s_i = 1 - p`, `d ln p / d s_j = p - 1`.
//! The second derivative magnitude of the pair is `p * (1 - p)`.
//!
//! Two entry points:
//! - [`assemble_pair_derivatives`]: scatter sampled pair derivatives into
//!   per-document and per-pair buffers of one shard
//! - [`pair_logit_pairwise`]: exact derivatives on a fixed pair list

use crate::training::objectives::pairs::{DocPair, SampledQueries};
use crate::training::TargetError;
use crate::utils::{exclusive_scan, split_blocks_mut, Parallelism};

/// What the per-pair buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivativeMode {
    /// Pair weights (`W`).
    Gradient,
    /// Pair second derivatives (`W * p * (1 - p)`).
    Newton,
}

/// Numerically stable sigmoid.
#[inline]
pub(crate) fn sigmoid(x: f64) -> f64 {
    let clamped = x.clamp(-500.0, 500.0);
    if clamped >= 0.0 {
        1.0 / (1.0 + (-clamped).exp())
    } else {
        let e = clamped.exp();
        e / (1.0 + e)
    }
}

// =============================================================================
// Sampled assembly
// =============================================================================

/// Scatter pair derivatives of one shard's round.
///
/// `scores` (mean-centered) and `observation_weights` hold one entry per sampled document,
/// `pairs` are positions in the sampled set in block order (as left by the
/// zero filter) and `pair_weights` their weights.
///
/// Returns `(point_weighted_der, pair_der2_or_weights)`. Pairs are accumulated
/// query by query in input order, so the result does not depend on how queries
/// are spread over shards or threads.
pub fn assemble_pair_derivatives(
    scores: &[f32],
    observation_weights: &[f32],
    queries: &SampledQueries,
    pairs: &[DocPair],
    pair_weights: &[f32],
    mode: DerivativeMode,
    parallelism: Parallelism,
) -> (Vec<f32>, Vec<f32>) {
    debug_assert_eq!(pairs.len(), pair_weights.len());

    // Surviving pairs of each query are contiguous
    let mut counts = vec![0usize; queries.n_queries()];
    for pair in pairs {
        counts[queries.query_ids[pair.first as usize] as usize] += 1;
    }
    let surviving_offsets = exclusive_scan(&counts);

    let mut point_der = vec![0.0f32; queries.n_docs()];
    let mut pair_der2 = vec![0.0f32; pairs.len()];

    let jobs: Vec<(usize, &mut [f32], &mut [f32])> = split_blocks_mut(&mut point_der, &queries.query_offsets)
        .into_iter()
        .zip(split_blocks_mut(&mut pair_der2, &surviving_offsets))
        .enumerate()
        .map(|(k, (der, der2))| (k, der, der2))
        .collect();

    parallelism.maybe_par_for_each(jobs, |(k, der, der2)| {
        let base = queries.query_offsets[k];
        let range = surviving_offsets[k]..surviving_offsets[k + 1];
        for ((pair, &w), out) in pairs[range.clone()].iter().zip(&pair_weights[range]).zip(der2.iter_mut()) {
            let (i, j) = (pair.first as usize, pair.second as usize);
            let p = sigmoid(scores[i] as f64 - scores[j] as f64);
            let weight = w as f64 * (observation_weights[i] as f64 * observation_weights[j] as f64).sqrt();
            let d = (weight * (1.0 - p)) as f32;

            der[i - base] += d;
            der[j - base] -= d;
            *out = match mode {
                DerivativeMode::Gradient => weight as f32,
                DerivativeMode::Newton => (weight * p * (1.0 - p)) as f32,
            };
        }
    });

    (point_der, pair_der2)
}

// =============================================================================
// Exact pair logit
// =============================================================================

/// Result of [`pair_logit_pairwise`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairLogitDerivatives {
    /// Weighted log-likelihood `sum w * ln p`.
    pub value: f64,
    /// Per-document first derivatives.
    pub der: Vec<f32>,
    /// Per-pair second derivatives `w * p * (1 - p)`.
    pub pair_der2: Vec<f32>,
}

/// Exact pairwise logistic derivatives at `point`.
///
/// `pairs` index into `point`. When `scatter_der_indices` is given, the
/// derivative of document `d` is written to `der[scatter_der_indices[d]]`
/// instead of `der[d]`.
pub fn pair_logit_pairwise(
    point: &[f32],
    pairs: &[DocPair],
    pair_weights: &[f32],
    scatter_der_indices: Option<&[u32]>,
) -> Result<PairLogitDerivatives, TargetError> {
    let n = point.len();
    TargetError::check_len("pair weights", pairs.len(), pair_weights.len())?;
    if let Some(scatter) = scatter_der_indices {
        TargetError::check_len("scatter der indices", n, scatter.len())?;
        if let Some(&bad) = scatter.iter().find(|&&idx| idx as usize >= n) {
            return Err(TargetError::IndexOutOfRange { what: "scatter der indices", index: bad as usize, len: n });
        }
    }
    if let Some(bad) = pairs.iter().flat_map(|p| [p.first, p.second]).find(|&d| d as usize >= n) {
        return Err(TargetError::IndexOutOfRange { what: "pairs", index: bad as usize, len: n });
    }

    let target = |doc: u32| match scatter_der_indices {
        Some(scatter) => scatter[doc as usize] as usize,
        None => doc as usize,
    };

    let mut value = 0.0f64;
    let mut der = vec![0.0f32; n];
    let mut pair_der2 = Vec::with_capacity(pairs.len());
    for (pair, &w) in pairs.iter().zip(pair_weights) {
        let diff = point[pair.first as usize] as f64 - point[pair.second as usize] as f64;
        let p = sigmoid(diff);
        let w = w as f64;

        // ln p = -ln(1 + exp(-diff))
        value -= w * if diff >= 0.0 { (-diff).exp().ln_1p() } else { -diff + diff.exp().ln_1p() };

        let d = (w * (1.0 - p)) as f32;
        der[target(pair.first)] += d;
        der[target(pair.second)] -= d;
        pair_der2.push((w * p * (1.0 - p)) as f32);
    }

    Ok(PairLogitDerivatives { value, der, pair_der2 })
}
