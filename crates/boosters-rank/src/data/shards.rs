//! Shard descriptor table for stripe-partitioned documents.
//!
//! A [`ShardLayout`] maps shard ids to contiguous document ranges made of whole
//! queries. It is planned once per shard-count change and then consulted by
//! every training round, so no round ever walks query boundaries itself.

use std::ops::Range;

use super::{DataError, QueryGrouping};

/// Shard id -> document range table.
///
/// Ranges are contiguous, non-empty, non-overlapping and cover
/// `0..n_docs` in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardLayout {
    slices: Vec<Range<usize>>,
}

impl ShardLayout {
    /// A single shard covering all documents.
    pub fn single(n_docs: usize) -> Self {
        Self { slices: vec![0..n_docs] }
    }

    /// Split `grouping` into `n_shards` runs of whole queries.
    ///
    /// Each shard targets `n_docs / n_shards` documents (the last one takes the
    /// remainder) and is then extended to the end of the query containing its
    /// last targeted document.
    ///
    /// # Errors
    ///
    /// [`DataError::InsufficientData`] if any shard would be empty.
    pub fn plan(grouping: &QueryGrouping, n_shards: usize) -> Result<Self, DataError> {
        let n_docs = grouping.n_docs();
        let insufficient = DataError::InsufficientData { n_shards, n_docs };
        if n_shards == 0 {
            return Err(insufficient);
        }

        let docs_per_shard = n_docs / n_shards;
        let mut slices = Vec::with_capacity(n_shards);
        let mut total = 0usize;

        for shard in 0..n_shards {
            let target_size = if shard + 1 != n_shards {
                docs_per_shard
            } else {
                n_docs.saturating_sub(total)
            };
            if target_size == 0 || total >= n_docs {
                return Err(insufficient);
            }
            let last_doc = (total + target_size - 1).min(n_docs - 1);
            let end = grouping.next_query_offset(last_doc);
            slices.push(total..end);
            total = end;
        }

        debug_assert_eq!(total, n_docs);
        tracing::debug!(n_shards, n_docs, ?slices, "planned shard layout");
        Ok(Self { slices })
    }

    /// Number of shards.
    #[inline]
    pub fn n_shards(&self) -> usize {
        self.slices.len()
    }

    /// Total number of documents.
    #[inline]
    pub fn n_docs(&self) -> usize {
        self.slices.last().map_or(0, |s| s.end)
    }

    /// Document range of `shard`.
    #[inline]
    pub fn slice(&self, shard: usize) -> Range<usize> {
        self.slices[shard].clone()
    }

    /// All shard ranges in order.
    #[inline]
    pub fn slices(&self) -> &[Range<usize>] {
        &self.slices
    }

    /// Split a per-document buffer into per-shard slices.
    pub fn split<'a, T>(&self, values: &'a [T]) -> Vec<&'a [T]> {
        self.slices.iter().map(|r| &values[r.clone()]).collect()
    }
}
