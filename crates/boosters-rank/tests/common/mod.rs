#![allow(dead_code)]

use std::sync::Arc;

use boosters_rank::training::PERMUTATIONS_PARAM;
use boosters_rank::{
    LossConfig, LossKind, NonDiagDerivatives, Parallelism, QueryDataset, TargetFunc, TrainingRandom,
    YetiRankPairwise,
};

/// Route `tracing` events to the test writer, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// YetiRank objective over `dataset` with its own seed stream.
pub fn yeti_rank(
    dataset: &QueryDataset,
    seed: u64,
    permutations: u32,
    n_shards: usize,
    parallelism: Parallelism,
) -> YetiRankPairwise {
    let target = TargetFunc::new(dataset, Arc::new(TrainingRandom::new(seed)), parallelism)
        .to_stripe(n_shards)
        .expect("enough documents for every shard");
    let loss = LossConfig::new(LossKind::YetiRankPairwise).with_param(PERMUTATIONS_PARAM, permutations.to_string());
    YetiRankPairwise::new(target, &loss).expect("valid loss config")
}

/// Merge per-shard buffers into one buffer over target-local documents.
pub fn merged(objective: &YetiRankPairwise, shards: &[NonDiagDerivatives]) -> NonDiagDerivatives {
    let starts: Vec<usize> = objective.target().layout().slices().iter().map(|r| r.start).collect();
    NonDiagDerivatives::merge(shards, &starts)
}
