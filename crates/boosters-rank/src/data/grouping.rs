//! Query grouping: an ordered partition of documents into queries.
//!
//! Documents of one query are contiguous. The grouping is stored as an offsets
//! array with `n_queries + 1` entries, so query `q` owns documents
//! `offsets[q]..offsets[q + 1]`.
//!
//! Every grouping also remembers the *global* index of its first query. Slices
//! and shards keep that index stable, which is what lets per-query randomness
//! be derived independently of how the data was partitioned.

use std::ops::Range;

use super::DataError;

/// Immutable partition of a contiguous document range into queries.
///
/// # Example
///
/// ```
/// use boosters_rank::data::QueryGrouping;
///
/// let grouping = QueryGrouping::from_sizes(&[2, 3, 2]).unwrap();
/// assert_eq!(grouping.n_queries(), 3);
/// assert_eq!(grouping.n_docs(), 7);
/// assert_eq!(grouping.query_range(1), 2..5);
/// assert_eq!(grouping.query_of(4), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryGrouping {
    offsets: Vec<usize>,
    first_query: usize,
}

impl QueryGrouping {
    /// Create from query offsets.
    ///
    /// `offsets` must start at 0 and be strictly increasing; the last entry is
    /// the document count.
    pub fn from_offsets(offsets: Vec<usize>) -> Result<Self, DataError> {
        if offsets.len() < 2 {
            return Err(DataError::EmptyGrouping);
        }
        if offsets[0] != 0 {
            return Err(DataError::InvalidOffsets { position: 0 });
        }
        if let Some(position) = offsets.windows(2).position(|w| w[0] >= w[1]) {
            return Err(DataError::InvalidOffsets { position: position + 1 });
        }
        Ok(Self { offsets, first_query: 0 })
    }

    /// Create from per-query document counts.
    pub fn from_sizes(sizes: &[usize]) -> Result<Self, DataError> {
        Self::from_offsets(crate::utils::exclusive_scan(sizes))
    }

    /// Create from a per-document query id column.
    ///
    /// Ids need not be sorted, but each id must occupy a single contiguous run.
    pub fn from_query_ids(query_ids: &[u32]) -> Result<Self, DataError> {
        if query_ids.is_empty() {
            return Err(DataError::EmptyGrouping);
        }
        let mut offsets = vec![0];
        let mut seen = std::collections::HashSet::new();
        seen.insert(query_ids[0]);
        for (doc, w) in query_ids.windows(2).enumerate() {
            if w[0] != w[1] {
                if !seen.insert(w[1]) {
                    return Err(DataError::NonContiguousQueryIds { query_id: w[1], doc: doc + 1 });
                }
                offsets.push(doc + 1);
            }
        }
        offsets.push(query_ids.len());
        Ok(Self { offsets, first_query: 0 })
    }

    /// Number of queries.
    #[inline]
    pub fn n_queries(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of documents.
    #[inline]
    pub fn n_docs(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    /// Query offsets (`n_queries + 1` entries).
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Global index of this grouping's first query.
    #[inline]
    pub fn first_query(&self) -> usize {
        self.first_query
    }

    /// Global index of local query `q`.
    #[inline]
    pub fn global_query(&self, q: usize) -> usize {
        self.first_query + q
    }

    /// Document range of query `q`.
    #[inline]
    pub fn query_range(&self, q: usize) -> Range<usize> {
        self.offsets[q]..self.offsets[q + 1]
    }

    /// Number of documents in query `q`.
    #[inline]
    pub fn query_size(&self, q: usize) -> usize {
        self.offsets[q + 1] - self.offsets[q]
    }

    /// Iterator over query sizes.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.offsets.windows(2).map(|w| w[1] - w[0])
    }

    /// Local query containing `doc`.
    ///
    /// # Panics
    ///
    /// Panics if `doc >= n_docs()`.
    #[inline]
    pub fn query_of(&self, doc: usize) -> usize {
        assert!(doc < self.n_docs(), "document {doc} out of range");
        self.offsets.partition_point(|&o| o <= doc) - 1
    }

    /// End offset of the query containing `doc`.
    #[inline]
    pub fn next_query_offset(&self, doc: usize) -> usize {
        self.offsets[self.query_of(doc) + 1]
    }

    /// Whether `doc` is a query boundary (including `0` and `n_docs()`).
    #[inline]
    pub fn is_boundary(&self, doc: usize) -> bool {
        self.offsets.binary_search(&doc).is_ok()
    }

    /// Mean number of documents per query.
    pub fn mean_query_size(&self) -> f64 {
        self.n_docs() as f64 / self.n_queries() as f64
    }

    /// Restrict to a query-aligned document range.
    ///
    /// The result is re-based so its first document is 0 and keeps the global
    /// index of its first query.
    pub fn slice(&self, range: Range<usize>) -> Result<Self, DataError> {
        let misaligned = DataError::MisalignedSlice { start: range.start, end: range.end };
        if range.start >= range.end || range.end > self.n_docs() {
            return Err(misaligned);
        }
        let first = self.offsets.binary_search(&range.start).map_err(|_| misaligned.clone())?;
        let last = self.offsets.binary_search(&range.end).map_err(|_| misaligned)?;
        let offsets = self.offsets[first..=last].iter().map(|&o| o - range.start).collect();
        Ok(Self { offsets, first_query: self.first_query + first })
    }
}
