//! Seeded synthetic ranking data for tests and doc examples.

use ndarray::Array1;
use rand::prelude::*;

use crate::data::{QueryDataset, QueryGrouping};

/// Relevance grades used by [`synthetic_ranking_dataset`].
pub const GRADES: [f32; 3] = [0.0, 0.5, 1.0];

/// Random query sizes, uniform in `[min_size, max_size]`.
pub fn random_query_sizes(n_queries: usize, min_size: usize, max_size: usize, seed: u64) -> Vec<usize> {
    assert!(min_size >= 1 && max_size >= min_size);
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_queries).map(|_| rng.gen_range(min_size..=max_size)).collect()
}

/// Random labels drawn from `grades`.
pub fn random_grades(n_docs: usize, grades: &[f32], seed: u64) -> Vec<f32> {
    assert!(!grades.is_empty());
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_docs).map(|_| grades[rng.gen_range(0..grades.len())]).collect()
}

/// Random scores uniform in `[-amplitude, amplitude]`.
pub fn random_scores(n_docs: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_docs).map(|_| (rng.r#gen::<f32>() * 2.0 - 1.0) * amplitude).collect()
}

/// Ranking dataset with graded labels and optional random weights in `[0.5, 1.5)`.
pub fn synthetic_ranking_dataset(sizes: &[usize], weighted: bool, seed: u64) -> QueryDataset {
    let grouping = QueryGrouping::from_sizes(sizes).expect("query sizes must be positive");
    let n_docs = grouping.n_docs();
    let targets = random_grades(n_docs, &GRADES, seed);
    let weights = weighted.then(|| {
        let mut rng = StdRng::seed_from_u64(seed ^ 0x5EED);
        Array1::from_iter((0..n_docs).map(|_| 0.5 + rng.r#gen::<f32>()))
    });
    QueryDataset::new(Array1::from(targets), weights, grouping).expect("columns match the grouping")
}
