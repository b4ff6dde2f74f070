//! Pointwise squared error.

use std::ops::Range;

use crate::training::config::{LossConfig, LossKind};
use crate::training::derivatives::GradsTuple;
use crate::training::objectives::DerivativeMode;
use crate::training::target::{PointwiseTarget, Target, TargetCategory, TargetFunc};
use crate::training::TargetError;

/// Squared error `0.5 * w * (t - s)^2`.
///
/// Derivatives point towards the label: `grad = w * (t - s)`, `hess = w`.
#[derive(Debug, Clone)]
pub struct Rmse {
    target: TargetFunc,
}

impl Rmse {
    /// Wrap `target`; `loss` must describe [`LossKind::Rmse`].
    pub fn new(target: TargetFunc, loss: &LossConfig) -> Result<Self, TargetError> {
        loss.ensure_kind(LossKind::Rmse)?;
        Ok(Self { target })
    }

    pub fn target(&self) -> &TargetFunc {
        &self.target
    }
}

impl PointwiseTarget for Rmse {
    fn derivatives_at(
        &self,
        point: &[f32],
        docs: Range<usize>,
        _mode: DerivativeMode,
    ) -> Result<Vec<GradsTuple>, TargetError> {
        TargetError::check_len("point", docs.len(), point.len())?;
        if docs.end > self.target.n_docs() {
            return Err(TargetError::IndexOutOfRange { what: "documents", index: docs.end, len: self.target.n_docs() });
        }
        let targets = &self.target.targets()[docs.clone()];
        let weights = self.target.weights();
        Ok(docs
            .zip(point.iter().zip(targets))
            .map(|(doc, (&s, &t))| {
                let w = weights.get(doc);
                GradsTuple { grad: w * (t - s), hess: w }
            })
            .collect())
    }
}

impl Target for Rmse {
    fn name(&self) -> &'static str {
        "RMSE"
    }

    fn category(&self) -> TargetCategory {
        TargetCategory::Pointwise
    }

    fn n_docs(&self) -> usize {
        self.target.n_docs()
    }

    fn as_pointwise(&self) -> Option<&dyn PointwiseTarget> {
        Some(self)
    }
}
