//! Ranking objectives and their building blocks.
//!
//! # Available Objectives
//!
//! - [`YetiRankPairwise`]: pairwise logistic loss with PFound-sampled pair weights
//! - [`Rmse`]: pointwise squared error
//!
//! # Building Blocks
//!
//! - [`pairs`]: per-query pair blocks of a sampled round
//! - [`pfound`]: Monte-Carlo PFound pair weights
//! - [`pair_logit`]: pairwise logistic derivatives (sampled and exact)

pub mod pair_logit;
pub mod pairs;
pub mod pfound;
mod rmse;
mod yeti_rank;

pub use pair_logit::{DerivativeMode, PairLogitDerivatives};
pub use pairs::{DocPair, SampledQueries};
pub use pfound::PFoundWeights;
pub use rmse::Rmse;
pub use yeti_rank::YetiRankPairwise;
