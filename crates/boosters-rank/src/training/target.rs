//! Target functions and point composition.
//!
//! [`TargetFunc`] bundles everything an objective reads: labels, observation
//! weights, the query grouping, the shard layout and the shared seed stream.
//! Objectives wrap a `TargetFunc` and declare a [`TargetCategory`]; the
//! category decides, once, how [`TargetAtPoint`] evaluates them.

use std::ops::Range;
use std::sync::{Arc, OnceLock};

use ndarray::ArrayView1;

use crate::data::{QueryDataset, QueryGrouping, ShardLayout, WeightsView};
use crate::training::config::BootstrapConfig;
use crate::training::derivatives::{GradsTuple, NonDiagDerivatives};
use crate::training::objectives::DerivativeMode;
use crate::training::profiler::Profiler;
use crate::training::random::TrainingRandom;
use crate::training::TargetError;
use crate::utils::Parallelism;

// =============================================================================
// TargetFunc
// =============================================================================

/// Labels, weights and layout shared by all objectives.
///
/// Cloning is cheap apart from the label and weight columns; the seed stream is
/// shared.
#[derive(Debug, Clone)]
pub struct TargetFunc {
    targets: Vec<f32>,
    weights: Option<Vec<f32>>,
    grouping: QueryGrouping,
    layout: ShardLayout,
    shard_groupings: Vec<QueryGrouping>,
    random: Arc<TrainingRandom>,
    parallelism: Parallelism,
    total_weight: OnceLock<f64>,
}

impl TargetFunc {
    /// Single-shard target over a whole dataset.
    pub fn new(dataset: &QueryDataset, random: Arc<TrainingRandom>, parallelism: Parallelism) -> Self {
        let weights = match dataset.weights() {
            WeightsView::None => None,
            WeightsView::Some(w) => Some(w.to_vec()),
        };
        let grouping = dataset.grouping().clone();
        Self {
            targets: dataset.targets().to_vec(),
            weights,
            layout: ShardLayout::single(grouping.n_docs()),
            shard_groupings: vec![grouping.clone()],
            grouping,
            random,
            parallelism,
            total_weight: OnceLock::new(),
        }
    }

    /// Restrict to a query-aligned document range.
    ///
    /// The result is single-shard and shares the seed stream.
    pub fn slice(&self, range: Range<usize>) -> Result<Self, TargetError> {
        let grouping = self.grouping.slice(range.clone())?;
        Ok(Self {
            targets: self.targets[range.clone()].to_vec(),
            weights: self.weights.as_ref().map(|w| w[range].to_vec()),
            layout: ShardLayout::single(grouping.n_docs()),
            shard_groupings: vec![grouping.clone()],
            grouping,
            random: Arc::clone(&self.random),
            parallelism: self.parallelism,
            total_weight: OnceLock::new(),
        })
    }

    /// Re-plan this target over `n_shards` stripes of whole queries.
    pub fn to_stripe(&self, n_shards: usize) -> Result<Self, TargetError> {
        let layout = ShardLayout::plan(&self.grouping, n_shards)?;
        let shard_groupings = layout
            .slices()
            .iter()
            .map(|range| self.grouping.slice(range.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            layout,
            shard_groupings,
            ..self.clone()
        })
    }

    /// Number of documents.
    #[inline]
    pub fn n_docs(&self) -> usize {
        self.targets.len()
    }

    /// Relevance labels.
    #[inline]
    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    /// Observation weights.
    #[inline]
    pub fn weights(&self) -> WeightsView<'_> {
        match &self.weights {
            Some(w) => WeightsView::Some(ArrayView1::from(w.as_slice())),
            None => WeightsView::None,
        }
    }

    /// Query grouping of all documents.
    #[inline]
    pub fn grouping(&self) -> &QueryGrouping {
        &self.grouping
    }

    /// Shard descriptor table.
    #[inline]
    pub fn layout(&self) -> &ShardLayout {
        &self.layout
    }

    /// Grouping of one shard, re-based to the shard's first document.
    #[inline]
    pub fn shard_grouping(&self, shard: usize) -> &QueryGrouping {
        &self.shard_groupings[shard]
    }

    /// Shared seed stream.
    #[inline]
    pub fn random(&self) -> &TrainingRandom {
        &self.random
    }

    #[inline]
    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    /// Sum of observation weights, computed on first successful call.
    ///
    /// # Errors
    ///
    /// [`TargetError::NonPositiveTotalWeight`] if a weight is negative or the
    /// total is not positive.
    pub fn total_weight(&self) -> Result<f64, TargetError> {
        if let Some(&total) = self.total_weight.get() {
            return Ok(total);
        }
        let weights = self.weights();
        let total = weights.total(self.n_docs());
        let has_negative = match &self.weights {
            Some(w) => w.iter().any(|&x| x < 0.0),
            None => false,
        };
        if has_negative || !(total > 0.0) {
            return Err(TargetError::NonPositiveTotalWeight(total));
        }
        Ok(*self.total_weight.get_or_init(|| total))
    }

    /// Fail unless `point` has one entry per document.
    pub(crate) fn check_point(&self, point: &[f32]) -> Result<(), TargetError> {
        TargetError::check_len("point", self.n_docs(), point.len())
    }
}

// =============================================================================
// Target categories
// =============================================================================

/// How a target's derivatives are structured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCategory {
    /// Independent per-document derivatives.
    Pointwise,
    /// Per-document derivatives that depend on the whole query.
    Querywise,
    /// Pairwise derivatives with off-diagonal second-order terms.
    NonDiagQuerywise,
}

/// Target with elementwise derivatives.
pub trait PointwiseTarget: Send + Sync {
    /// Derivatives at `point` for documents in `docs`.
    ///
    /// `point` covers exactly `docs`. In [`DerivativeMode::Gradient`] the
    /// second component holds observation weights.
    fn derivatives_at(
        &self,
        point: &[f32],
        docs: Range<usize>,
        mode: DerivativeMode,
    ) -> Result<Vec<GradsTuple>, TargetError>;
}

/// Target with sampled pairwise derivatives.
pub trait PairwiseTarget: Send + Sync {
    /// Sampled derivatives at `point`, one buffer per shard.
    fn stochastic_derivatives(
        &self,
        point: &[f32],
        bootstrap: &BootstrapConfig,
        mode: DerivativeMode,
        profiler: &Profiler,
    ) -> Result<Vec<NonDiagDerivatives>, TargetError>;
}

/// A target that declares its category.
pub trait Target: Send + Sync {
    /// Display name.
    fn name(&self) -> &'static str;

    fn category(&self) -> TargetCategory;

    /// Number of documents.
    fn n_docs(&self) -> usize;

    fn as_pointwise(&self) -> Option<&dyn PointwiseTarget> {
        None
    }

    fn as_pairwise(&self) -> Option<&dyn PairwiseTarget> {
        None
    }
}

// =============================================================================
// TargetAtPoint
// =============================================================================

/// A target composed with a point.
///
/// The evaluation strategy is chosen at construction from the target's
/// category. Calling the capability of the other strategy fails with
/// [`TargetError::UnsupportedEvaluation`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use boosters_rank::data::{QueryDataset, QueryGrouping};
/// use boosters_rank::training::{
///     LossConfig, LossKind, Rmse, TargetAtPoint, TargetFunc, TrainingRandom,
/// };
/// use boosters_rank::Parallelism;
/// use ndarray::array;
///
/// let grouping = QueryGrouping::from_sizes(&[2, 1]).unwrap();
/// let dataset = QueryDataset::new(array![1.0, 0.0, 2.0], None, grouping).unwrap();
/// let target = TargetFunc::new(&dataset, Arc::new(TrainingRandom::new(0)), Parallelism::Sequential);
/// let rmse = Rmse::new(target, &LossConfig::new(LossKind::Rmse)).unwrap();
///
/// let shift = [0.0f32, 0.0, 0.0];
/// let at_point = TargetAtPoint::new(&rmse, &shift).unwrap();
/// let grads = at_point.gradient_at_zero().unwrap();
/// assert_eq!(grads[2].grad, 2.0);
/// ```
pub enum TargetAtPoint<'a> {
    /// Elementwise evaluation at `shift`, restricted to `docs`.
    Shifted {
        target: &'a dyn PointwiseTarget,
        shift: &'a [f32],
        docs: Range<usize>,
    },
    /// Sampled pairwise evaluation at `point`.
    Pairwise {
        target: &'a dyn PairwiseTarget,
        point: &'a [f32],
    },
}

impl std::fmt::Debug for TargetAtPoint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetAtPoint::Shifted { docs, .. } => f.debug_struct("Shifted").field("docs", docs).finish(),
            TargetAtPoint::Pairwise { point, .. } => {
                f.debug_struct("Pairwise").field("n_docs", &point.len()).finish()
            }
        }
    }
}

impl<'a> TargetAtPoint<'a> {
    /// Compose `target` with `shift`, one entry per document.
    pub fn new<T: Target + ?Sized>(target: &'a T, shift: &'a [f32]) -> Result<Self, TargetError> {
        TargetError::check_len("shift", target.n_docs(), shift.len())?;
        match target.category() {
            TargetCategory::Pointwise | TargetCategory::Querywise => {
                let inner = target.as_pointwise().ok_or(TargetError::UnsupportedEvaluation("shifted"))?;
                Ok(TargetAtPoint::Shifted { target: inner, shift, docs: 0..shift.len() })
            }
            TargetCategory::NonDiagQuerywise => {
                let inner = target.as_pairwise().ok_or(TargetError::UnsupportedEvaluation("pairwise"))?;
                Ok(TargetAtPoint::Pairwise { target: inner, point: shift })
            }
        }
    }

    /// Restrict a shifted target to `docs`, relative to its current range.
    pub fn slice(&self, docs: Range<usize>) -> Result<Self, TargetError> {
        match self {
            TargetAtPoint::Shifted { target, shift, docs: current } => {
                if docs.start > docs.end || docs.end > current.len() {
                    return Err(TargetError::IndexOutOfRange {
                        what: "shifted slice",
                        index: docs.end,
                        len: current.len(),
                    });
                }
                let start = current.start + docs.start;
                Ok(TargetAtPoint::Shifted {
                    target: *target,
                    shift: *shift,
                    docs: start..start + docs.len(),
                })
            }
            TargetAtPoint::Pairwise { .. } => Err(TargetError::UnsupportedEvaluation("slice")),
        }
    }

    /// Whether this composition uses the shifted strategy.
    pub fn is_shifted(&self) -> bool {
        matches!(self, TargetAtPoint::Shifted { .. })
    }

    /// First derivatives and weights at the shift.
    pub fn gradient_at_zero(&self) -> Result<Vec<GradsTuple>, TargetError> {
        self.shifted(DerivativeMode::Gradient)
    }

    /// First and second derivatives at the shift.
    pub fn newton_at_zero(&self) -> Result<Vec<GradsTuple>, TargetError> {
        self.shifted(DerivativeMode::Newton)
    }

    fn shifted(&self, mode: DerivativeMode) -> Result<Vec<GradsTuple>, TargetError> {
        match self {
            TargetAtPoint::Shifted { target, shift, docs } => {
                target.derivatives_at(&shift[docs.clone()], docs.clone(), mode)
            }
            TargetAtPoint::Pairwise { .. } => Err(TargetError::UnsupportedEvaluation("shifted")),
        }
    }

    /// Sampled pairwise derivatives at the point.
    pub fn compute_stochastic_derivatives(
        &self,
        bootstrap: &BootstrapConfig,
        is_gradient: bool,
        profiler: &Profiler,
    ) -> Result<Vec<NonDiagDerivatives>, TargetError> {
        match self {
            TargetAtPoint::Pairwise { target, point } => {
                let mode = if is_gradient { DerivativeMode::Gradient } else { DerivativeMode::Newton };
                target.stochastic_derivatives(point, bootstrap, mode, profiler)
            }
            TargetAtPoint::Shifted { .. } => Err(TargetError::UnsupportedEvaluation("pairwise")),
        }
    }
}
