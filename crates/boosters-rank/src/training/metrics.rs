//! Additive metric statistics.

use std::ops::{Add, AddAssign};

/// Fixed-size vector of `f64` components that combine by elementwise addition.
///
/// The two-component form `[sum, weight]` is the common case; its score is
/// `sum / weight`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdditiveStatistic {
    stats: Vec<f64>,
}

impl AdditiveStatistic {
    /// Statistic with the given components.
    pub fn new(stats: Vec<f64>) -> Self {
        Self { stats }
    }

    /// Two-component `[sum, weight]` statistic.
    pub fn simple(sum: f64, weight: f64) -> Self {
        Self { stats: vec![sum, weight] }
    }

    #[inline]
    pub fn stats(&self) -> &[f64] {
        &self.stats
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Component `i`, or 0 when absent.
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        self.stats.get(i).copied().unwrap_or(0.0)
    }
}

impl AddAssign<&AdditiveStatistic> for AdditiveStatistic {
    fn add_assign(&mut self, other: &AdditiveStatistic) {
        if self.stats.len() < other.stats.len() {
            self.stats.resize(other.stats.len(), 0.0);
        }
        for (a, &b) in self.stats.iter_mut().zip(&other.stats) {
            *a += b;
        }
    }
}

impl Add for AdditiveStatistic {
    type Output = AdditiveStatistic;

    fn add(mut self, other: AdditiveStatistic) -> AdditiveStatistic {
        self += &other;
        self
    }
}

impl std::iter::Sum for AdditiveStatistic {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(AdditiveStatistic::default(), Add::add)
    }
}
