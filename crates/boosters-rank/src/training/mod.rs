//! Training-time ranking targets.
//!
//! ## Shared Infrastructure
//!
//! - [`TargetFunc`]: labels, weights, grouping and shard layout
//! - [`TargetAtPoint`]: category-driven evaluation strategy
//! - [`TrainingRandom`]: partition-independent seed stream
//! - [`Profiler`]: explicit step timing
//! - [`LossConfig`], [`BootstrapConfig`]: typed configuration
//!
//! ## Objectives
//!
//! - [`YetiRankPairwise`]: sampled pairwise ranking derivatives
//! - [`Rmse`]: pointwise squared error

mod config;
mod derivatives;
mod error;
mod metrics;
pub mod objectives;
mod profiler;
mod random;
pub mod sampling;
mod target;

pub use config::{
    BootstrapConfig, BootstrapType, ConfigError, LossConfig, LossKind, DEFAULT_PERMUTATION_COUNT,
    PERMUTATIONS_PARAM,
};
pub use derivatives::{GradsTuple, NonDiagDerivatives};
pub use error::TargetError;
pub use metrics::AdditiveStatistic;
pub use objectives::{DerivativeMode, DocPair, PairLogitDerivatives, Rmse, YetiRankPairwise};
pub use profiler::{ProfileGuard, ProfileRecord, Profiler};
pub use random::{mix64, RandomStream, RoundSeed, TrainingRandom};
pub use target::{PairwiseTarget, PointwiseTarget, Target, TargetAtPoint, TargetCategory, TargetFunc};
