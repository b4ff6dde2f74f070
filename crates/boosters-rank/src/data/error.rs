//! Error types for query-grouped data.

/// Errors raised while building or partitioning query-grouped data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    /// A grouping needs at least one query.
    #[error("query grouping must contain at least one query")]
    EmptyGrouping,

    /// Offsets must start at 0 and be strictly increasing.
    #[error("query offsets must start at 0 and be strictly increasing (violated at position {position})")]
    InvalidOffsets { position: usize },

    /// Per-document query ids must form contiguous runs.
    #[error("query id {query_id} reappears at document {doc} after its run ended")]
    NonContiguousQueryIds { query_id: u32, doc: usize },

    /// Two buffers describing the same documents disagree on length.
    #[error("{what}: expected length {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A slice boundary falls inside a query.
    #[error("slice {start}..{end} does not align with query boundaries")]
    MisalignedSlice { start: usize, end: usize },

    /// Shard planning produced an empty shard.
    #[error(
        "insufficient query (or document) count to split {n_docs} documents between {n_shards} shards"
    )]
    InsufficientData { n_shards: usize, n_docs: usize },
}
