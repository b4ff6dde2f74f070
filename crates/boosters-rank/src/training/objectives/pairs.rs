//! Pair layout of a sampled round.
//!
//! Every sampled query of size `n` owns a dense block of `n * n` candidate
//! pairs. [`SampledQueries`] records where each query's documents and pair block
//! live; [`make_pairs`] fills the blocks.

use std::ops::Range;

use crate::data::QueryGrouping;
use crate::training::sampling::SampledSet;
use crate::utils::{exclusive_scan, split_blocks_mut, Parallelism};

/// Ordered document pair. The first document is the preferred one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPair {
    pub first: u32,
    pub second: u32,
}

impl DocPair {
    #[inline]
    pub const fn new(first: u32, second: u32) -> Self {
        Self { first, second }
    }

    /// The same pair with documents exchanged.
    #[inline]
    pub const fn swapped(self) -> Self {
        Self { first: self.second, second: self.first }
    }

    /// Whether both entries name the same document.
    #[inline]
    pub const fn is_self_pair(self) -> bool {
        self.first == self.second
    }
}

/// Query structure of a sampled set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampledQueries {
    /// Dense sampled-query id of each sampled document.
    pub query_ids: Vec<u32>,
    /// Offsets of each sampled query within the sampled set (`k + 1` entries).
    pub query_offsets: Vec<usize>,
    /// Global query id of each sampled query.
    pub global_queries: Vec<usize>,
    /// Offsets of each query's pair block (`k + 1` entries).
    pub pair_offsets: Vec<usize>,
}

impl SampledQueries {
    /// Derive the query layout of `sample`, drawn from `grouping`.
    pub fn build(sample: &SampledSet, grouping: &QueryGrouping) -> Self {
        let mut query_ids = Vec::with_capacity(sample.len());
        let mut sizes = Vec::new();
        let mut global_queries = Vec::new();

        let mut previous = None;
        for &local in &sample.query_ids {
            if previous != Some(local) {
                previous = Some(local);
                sizes.push(0usize);
                global_queries.push(grouping.global_query(local as usize));
            }
            let last = sizes.len() - 1;
            sizes[last] += 1;
            query_ids.push(last as u32);
        }

        let block_sizes: Vec<usize> = sizes.iter().map(|&n| n * n).collect();
        Self {
            query_ids,
            query_offsets: exclusive_scan(&sizes),
            global_queries,
            pair_offsets: exclusive_scan(&block_sizes),
        }
    }

    /// Number of sampled queries.
    #[inline]
    pub fn n_queries(&self) -> usize {
        self.global_queries.len()
    }

    /// Number of sampled documents.
    #[inline]
    pub fn n_docs(&self) -> usize {
        self.query_ids.len()
    }

    /// Total number of candidate pairs.
    #[inline]
    pub fn n_pairs(&self) -> usize {
        self.pair_offsets.last().copied().unwrap_or(0)
    }

    /// Positions of query `k`'s documents within the sampled set.
    #[inline]
    pub fn query_range(&self, k: usize) -> Range<usize> {
        self.query_offsets[k]..self.query_offsets[k + 1]
    }

    /// Range of query `k`'s pair block.
    #[inline]
    pub fn pair_range(&self, k: usize) -> Range<usize> {
        self.pair_offsets[k]..self.pair_offsets[k + 1]
    }
}

/// Emit every ordered pair of each sampled query, diagonal included.
///
/// Pairs are positions in the sampled set. Block `k` is row-major: the first
/// position is the outer loop.
pub fn make_pairs(queries: &SampledQueries, parallelism: Parallelism) -> Vec<DocPair> {
    let mut pairs = vec![DocPair::default(); queries.n_pairs()];
    let blocks: Vec<(usize, &mut [DocPair])> = split_blocks_mut(&mut pairs, &queries.pair_offsets)
        .into_iter()
        .enumerate()
        .collect();

    parallelism.maybe_par_for_each(blocks, |(k, block)| {
        let range = queries.query_range(k);
        let n = range.len();
        for (i, row) in range.clone().zip(block.chunks_exact_mut(n)) {
            for (j, pair) in range.clone().zip(row.iter_mut()) {
                *pair = DocPair::new(i as u32, j as u32);
            }
        }
    });
    pairs
}
