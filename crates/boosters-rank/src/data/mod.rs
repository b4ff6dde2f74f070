//! Query-grouped data inputs.
//!
//! Ranking targets never look at features. They consume labels, observation
//! weights and the partition of documents into queries:
//!
//! - [`QueryGrouping`]: immutable, query-aligned partition with stable global
//!   query ids across slices
//! - [`QueryDataset`]: labels + weights + grouping for one dataset
//! - [`ShardLayout`]: shard id -> document range table built from a grouping

mod dataset;
mod error;
mod grouping;
mod shards;

pub use dataset::{QueryDataset, WeightsView};
pub use error::DataError;
pub use grouping::QueryGrouping;
pub use shards::ShardLayout;
