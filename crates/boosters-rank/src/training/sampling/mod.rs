//! Per-round sampling for pairwise objectives.
//!
//! - [`QuerywiseSampler`]: query subsampling and per-query document caps
//! - [`bootstrap`]: bootstrap validation and pair weight reweighting

pub mod bootstrap;
mod querywise;

pub use querywise::{QuerywiseSampler, SampledSet, MAX_QUERY_SIZE_LIMIT};
