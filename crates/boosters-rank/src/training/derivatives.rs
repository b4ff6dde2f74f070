//! Derivative buffers produced by targets.
//!
//! - [`GradsTuple`]: per-document derivatives of pointwise targets
//! - [`NonDiagDerivatives`]: per-shard derivatives of pairwise targets

use crate::training::objectives::DocPair;

/// First and second derivative of one document.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradsTuple {
    pub grad: f32,
    pub hess: f32,
}

/// Per-shard derivatives of a pairwise target.
///
/// Per-document vectors are indexed like `docs`; `pairs` are positions into
/// `docs` and `pair_der2_or_weights` has one entry per pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NonDiagDerivatives {
    /// Sampled shard-local document indices.
    pub docs: Vec<u32>,
    /// First derivative per sampled document.
    pub point_weighted_der: Vec<f32>,
    /// Diagonal second derivatives or weights. Empty for purely pairwise targets.
    pub point_der2_or_weights: Vec<f32>,
    /// Surviving pairs.
    pub pairs: Vec<DocPair>,
    /// Pair second derivative (Newton) or pair weight (gradient).
    pub pair_der2_or_weights: Vec<f32>,
}

impl NonDiagDerivatives {
    /// Number of sampled documents.
    #[inline]
    pub fn n_docs(&self) -> usize {
        self.docs.len()
    }

    /// Number of surviving pairs.
    #[inline]
    pub fn n_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Pairs expressed as shard-local document indices.
    pub fn doc_pairs(&self) -> impl Iterator<Item = DocPair> + '_ {
        self.pairs
            .iter()
            .map(|p| DocPair::new(self.docs[p.first as usize], self.docs[p.second as usize]))
    }

    /// Flatten per-shard buffers into one buffer over the unsharded documents.
    ///
    /// `shard_starts[s]` is the first document of shard `s`. Document indices
    /// are shifted to target-local indices; pair positions are shifted to the
    /// concatenated `docs`.
    pub fn merge(shards: &[NonDiagDerivatives], shard_starts: &[usize]) -> NonDiagDerivatives {
        debug_assert_eq!(shards.len(), shard_starts.len());
        let mut merged = NonDiagDerivatives::default();
        for (shard, &start) in shards.iter().zip(shard_starts) {
            let position_base = merged.docs.len() as u32;
            merged.docs.extend(shard.docs.iter().map(|&d| d + start as u32));
            merged.point_weighted_der.extend_from_slice(&shard.point_weighted_der);
            merged.point_der2_or_weights.extend_from_slice(&shard.point_der2_or_weights);
            merged
                .pairs
                .extend(shard.pairs.iter().map(|p| DocPair::new(p.first + position_base, p.second + position_base)));
            merged.pair_der2_or_weights.extend_from_slice(&shard.pair_der2_or_weights);
        }
        merged
    }
}
