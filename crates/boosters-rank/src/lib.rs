//! boosters-rank: pairwise ranking derivatives for gradient boosting.
//!
//! Computes sampled pairwise gradients and Hessians of the YetiRank objective
//! over query-grouped data split into shards of whole queries. Each round
//! subsamples queries, builds per-query pair blocks, weights pairs with a
//! Monte-Carlo PFound estimate, applies the bootstrap, drops zero-weight pairs
//! and scatters pairwise logistic derivatives into per-document and per-pair
//! buffers.
//!
//! # Key Types
//!
//! - [`QueryDataset`] / [`QueryGrouping`] - labels, weights and query structure
//! - [`TargetFunc`] - target data plus shard layout and seed stream
//! - [`YetiRankPairwise`] - the pairwise ranking objective
//! - [`NonDiagDerivatives`] - per-shard derivative buffers
//!
//! # Sharding
//!
//! [`TargetFunc::to_stripe`] plans contiguous shards of whole queries. All
//! randomness is derived from global query ids, so merged results are the same
//! for any shard count.

// Re-export approx traits for users who compare derivatives
pub use approx;

pub mod data;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use data::{DataError, QueryDataset, QueryGrouping, ShardLayout, WeightsView};

pub use training::{
    BootstrapConfig, BootstrapType, LossConfig, LossKind, NonDiagDerivatives, Profiler, TargetAtPoint,
    TargetError, TargetFunc, TrainingRandom, YetiRankPairwise,
};

// Shared utilities
pub use utils::Parallelism;
