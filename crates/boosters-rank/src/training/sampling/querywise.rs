//! Query-wise document sampling.
//!
//! Pairwise objectives generate `size^2` candidate pairs per query, so the
//! sampler both subsamples whole queries (Bernoulli bootstrap) and caps the
//! number of documents taken from any single query.
//!
//! # Usage
//!
//! ```
//! use boosters_rank::data::QueryGrouping;
//! use boosters_rank::training::RoundSeed;
//! use boosters_rank::training::sampling::QuerywiseSampler;
//!
//! let grouping = QueryGrouping::from_sizes(&[2, 3, 2]).unwrap();
//! let sampler = QuerywiseSampler::new(QuerywiseSampler::max_query_size_for(&grouping));
//! let sample = sampler.sample(&grouping, 1.0, RoundSeed::new(1));
//! assert_eq!(sample.len(), 7);
//! ```

use rand::Rng;

use crate::data::QueryGrouping;
use crate::training::random::{RandomStream, RoundSeed};

/// Hard cap on documents taken from one query.
pub const MAX_QUERY_SIZE_LIMIT: usize = 1023;

// ============================================================================
// SampledSet (sampling result)
// ============================================================================

/// Documents selected for one round.
///
/// Documents are ordered by query, then by document index. Both columns have
/// one entry per sampled document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampledSet {
    /// Shard-local document indices.
    pub docs: Vec<u32>,
    /// Local query (in the sampled grouping) of each sampled document.
    pub query_ids: Vec<u32>,
}

impl SampledSet {
    /// Number of sampled documents.
    #[inline]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether nothing was sampled.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

// ============================================================================
// QuerywiseSampler
// ============================================================================

/// Samples queries with a fixed rate and caps per-query document counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerywiseSampler {
    max_query_size: usize,
}

impl QuerywiseSampler {
    /// Create a sampler with the given per-query document cap.
    ///
    /// # Panics
    ///
    /// Panics if `max_query_size` is zero.
    pub fn new(max_query_size: usize) -> Self {
        assert!(max_query_size > 0, "max_query_size must be positive");
        Self { max_query_size }
    }

    /// Per-query cap derived from the mean query size:
    /// `min(2 * mean + 8, 1023)`.
    pub fn max_query_size_for(grouping: &QueryGrouping) -> usize {
        let estimated = (2.0 * grouping.mean_query_size() + 8.0) as usize;
        estimated.min(MAX_QUERY_SIZE_LIMIT)
    }

    /// Per-query document cap.
    #[inline]
    pub fn max_query_size(&self) -> usize {
        self.max_query_size
    }

    /// Sample documents of `grouping` for one round.
    ///
    /// Each query is kept with probability `rate` (`rate >= 1` keeps all of
    /// them). Kept queries larger than the cap are reduced to a uniformly random
    /// subset of `max_query_size` documents.
    pub fn sample(&self, grouping: &QueryGrouping, rate: f64, seed: RoundSeed) -> SampledSet {
        let mut sample = SampledSet::default();
        if rate <= 0.0 {
            return sample;
        }

        for q in 0..grouping.n_queries() {
            let mut rng = seed.query_rng(RandomStream::Sampler, grouping.global_query(q));
            if rate < 1.0 && rng.r#gen::<f64>() >= rate {
                continue;
            }

            let range = grouping.query_range(q);
            let size = range.len();
            if size <= self.max_query_size {
                sample.docs.extend(range.map(|d| d as u32));
            } else {
                // Partial Fisher-Yates shuffle, then restore document order
                let mut docs: Vec<u32> = range.map(|d| d as u32).collect();
                for i in 0..self.max_query_size {
                    let j = rng.gen_range(i..size);
                    docs.swap(i, j);
                }
                docs.truncate(self.max_query_size);
                docs.sort_unstable();
                sample.docs.extend(docs);
            }
            sample.query_ids.resize(sample.docs.len(), q as u32);
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn grouping(sizes: &[usize]) -> QueryGrouping {
        QueryGrouping::from_sizes(sizes).unwrap()
    }

    #[test]
    fn max_query_size_formula() {
        // mean = 7 / 3
        assert_eq!(QuerywiseSampler::max_query_size_for(&grouping(&[2, 3, 2])), 12);
        assert_eq!(QuerywiseSampler::max_query_size_for(&grouping(&[4000, 2000])), 1023);
    }

    #[test]
    fn full_rate_takes_everything() {
        let g = grouping(&[2, 3, 2]);
        let sample = QuerywiseSampler::new(16).sample(&g, 1.0, RoundSeed::new(9));
        assert_eq!(sample.docs, (0..7).collect::<Vec<u32>>());
        assert_eq!(sample.query_ids, vec![0, 0, 1, 1, 1, 2, 2]);
    }

    #[test]
    fn zero_rate_takes_nothing() {
        let g = grouping(&[2, 3, 2]);
        assert!(QuerywiseSampler::new(16).sample(&g, 0.0, RoundSeed::new(9)).is_empty());
    }

    #[test]
    fn caps_large_queries() {
        let g = grouping(&[3, 50, 2]);
        let sample = QuerywiseSampler::new(10).sample(&g, 1.0, RoundSeed::new(5));
        let from_big: Vec<u32> = sample
            .docs
            .iter()
            .zip(&sample.query_ids)
            .filter(|&(_, &q)| q == 1)
            .map(|(&d, _)| d)
            .collect();
        assert_eq!(from_big.len(), 10);
        assert!(from_big.windows(2).all(|w| w[0] < w[1]));
        assert!(from_big.iter().all(|&d| (3..53).contains(&d)));
        assert_eq!(sample.len(), 3 + 10 + 2);
    }

    #[rstest]
    #[case(0.2)]
    #[case(0.5)]
    #[case(0.8)]
    fn partial_rate_keeps_whole_queries(#[case] rate: f64) {
        let sizes = vec![4usize; 200];
        let g = grouping(&sizes);
        let sample = QuerywiseSampler::new(16).sample(&g, rate, RoundSeed::new(11));

        // Every kept query is complete
        assert_eq!(sample.len() % 4, 0);
        for chunk in sample.query_ids.chunks(4) {
            assert!(chunk.iter().all(|&q| q == chunk[0]));
        }
        let kept = sample.len() / 4;
        let expected = rate * 200.0;
        assert!((kept as f64 - expected).abs() < 40.0, "kept {kept} of 200 at rate {rate}");
    }

    #[test]
    fn sampling_is_independent_of_slicing() {
        let g = grouping(&[3, 4, 5, 6, 2, 3]);
        let sampler = QuerywiseSampler::new(4);
        let seed = RoundSeed::new(77);
        let full = sampler.sample(&g, 0.6, seed);

        let left = g.slice(0..12).unwrap();
        let right = g.slice(12..23).unwrap();
        let mut docs = sampler.sample(&left, 0.6, seed).docs;
        docs.extend(sampler.sample(&right, 0.6, seed).docs.iter().map(|d| d + 12));
        assert_eq!(docs, full.docs);
    }
}
