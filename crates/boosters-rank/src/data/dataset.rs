//! Query-grouped ranking dataset.

use ndarray::{Array1, ArrayView1, s};

use super::{DataError, QueryGrouping};

// =============================================================================
// WeightsView
// =============================================================================

/// Read-only view into observation weights.
///
/// - `None`: No weights specified - all documents have implicit weight 1.0
/// - `Some(ArrayView1)`: Explicit weights per document
#[derive(Clone, Copy, Debug, Default)]
pub enum WeightsView<'a> {
    /// No weights - all documents have implicit weight 1.0.
    #[default]
    None,
    /// Explicit weights per document.
    Some(ArrayView1<'a, f32>),
}

impl<'a> WeightsView<'a> {
    /// Get weight for a document.
    #[inline]
    pub fn get(&self, idx: usize) -> f32 {
        match self {
            WeightsView::None => 1.0,
            WeightsView::Some(w) => w[idx],
        }
    }

    /// Returns true if no weights are specified (all 1.0).
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, WeightsView::None)
    }

    /// Sum of weights over `n_docs` documents.
    pub fn total(&self, n_docs: usize) -> f64 {
        match self {
            WeightsView::None => n_docs as f64,
            WeightsView::Some(w) => w.iter().map(|&x| x as f64).sum(),
        }
    }

    /// Restrict to a document range.
    pub fn slice(self, start: usize, end: usize) -> Self {
        match self {
            WeightsView::None => WeightsView::None,
            WeightsView::Some(w) => WeightsView::Some(w.slice_move(s![start..end])),
        }
    }
}

// =============================================================================
// QueryDataset
// =============================================================================

/// Labels, observation weights and query grouping for one dataset.
///
/// This is the read-only input every ranking target is built from. Feature
/// data lives elsewhere; targets only ever need labels and groups.
///
/// # Example
///
/// ```
/// use boosters_rank::data::{QueryDataset, QueryGrouping};
/// use ndarray::array;
///
/// let grouping = QueryGrouping::from_sizes(&[2, 3]).unwrap();
/// let dataset = QueryDataset::new(array![1.0, 0.0, 0.5, 0.0, 1.0], None, grouping).unwrap();
/// assert_eq!(dataset.n_docs(), 5);
/// assert_eq!(dataset.weights().get(3), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct QueryDataset {
    targets: Array1<f32>,
    weights: Option<Array1<f32>>,
    grouping: QueryGrouping,
}

impl QueryDataset {
    /// Create a dataset, validating that all columns describe the same documents.
    pub fn new(
        targets: Array1<f32>,
        weights: Option<Array1<f32>>,
        grouping: QueryGrouping,
    ) -> Result<Self, DataError> {
        if targets.len() != grouping.n_docs() {
            return Err(DataError::LengthMismatch {
                what: "targets",
                expected: grouping.n_docs(),
                actual: targets.len(),
            });
        }
        if let Some(w) = &weights {
            if w.len() != grouping.n_docs() {
                return Err(DataError::LengthMismatch {
                    what: "weights",
                    expected: grouping.n_docs(),
                    actual: w.len(),
                });
            }
        }
        Ok(Self { targets, weights, grouping })
    }

    /// Number of documents.
    #[inline]
    pub fn n_docs(&self) -> usize {
        self.targets.len()
    }

    /// Relevance labels.
    #[inline]
    pub fn targets(&self) -> ArrayView1<'_, f32> {
        self.targets.view()
    }

    /// Observation weights.
    #[inline]
    pub fn weights(&self) -> WeightsView<'_> {
        match &self.weights {
            Some(w) => WeightsView::Some(w.view()),
            None => WeightsView::None,
        }
    }

    /// Query grouping.
    #[inline]
    pub fn grouping(&self) -> &QueryGrouping {
        &self.grouping
    }
}
