//! Results must not depend on how documents are split into shards.

mod common;

use boosters_rank::data::DataError;
use boosters_rank::testing::{random_query_sizes, random_scores, synthetic_ranking_dataset};
use boosters_rank::training::BootstrapType;
use boosters_rank::{BootstrapConfig, Parallelism, Profiler, TargetError};
use common::{merged, yeti_rank};
use proptest::prelude::*;
use rstest::rstest;

const SIZES: [usize; 10] = [3, 5, 4, 2, 6, 4, 3, 5, 4, 4];

fn bootstrap(bootstrap_type: BootstrapType) -> BootstrapConfig {
    BootstrapConfig::builder()
        .bootstrap_type(bootstrap_type)
        .subsample(0.6)
        .bagging_temperature(0.8)
        .build()
        .unwrap()
}

#[rstest]
#[case(BootstrapType::No)]
#[case(BootstrapType::Bernoulli)]
#[case(BootstrapType::Bayesian)]
fn one_and_four_shards_agree(#[case] bootstrap_type: BootstrapType) {
    common::init_tracing();
    let dataset = synthetic_ranking_dataset(&SIZES, true, 3);
    assert_eq!(dataset.n_docs(), 40);
    let point = random_scores(40, 2.0, 4);
    let config = bootstrap(bootstrap_type);

    let single = yeti_rank(&dataset, 101, 10, 1, Parallelism::Sequential);
    let striped = yeti_rank(&dataset, 101, 10, 4, Parallelism::Parallel);
    assert_eq!(striped.target().layout().slices(), &[0..12, 12..24, 24..36, 36..40]);

    for _ in 0..3 {
        let a = merged(&single, &single.stochastic_newton(&point, &config, &Profiler::disabled()).unwrap());
        let shards = striped.stochastic_newton(&point, &config, &Profiler::disabled()).unwrap();
        assert_eq!(shards.len(), 4);
        let b = merged(&striped, &shards);

        assert_eq!(a.docs, b.docs);
        assert_eq!(a.pairs, b.pairs);
        assert_eq!(a.point_weighted_der, b.point_weighted_der);
        assert_eq!(a.pair_der2_or_weights, b.pair_der2_or_weights);
    }
}

#[test]
fn pairs_never_cross_queries() {
    let dataset = synthetic_ranking_dataset(&SIZES, false, 5);
    let objective = yeti_rank(&dataset, 8, 4, 3, Parallelism::Sequential);
    let point = random_scores(40, 1.0, 6);
    let shards = objective.stochastic_gradient(&point, &BootstrapConfig::default(), &Profiler::disabled()).unwrap();

    for (shard, der) in shards.iter().enumerate() {
        let grouping = objective.target().shard_grouping(shard);
        for pair in der.doc_pairs() {
            assert_eq!(grouping.query_of(pair.first as usize), grouping.query_of(pair.second as usize));
        }
    }
}

#[test]
fn too_many_shards_is_an_error() {
    let dataset = synthetic_ranking_dataset(&[2, 2, 2], false, 1);
    let target = common::yeti_rank(&dataset, 0, 1, 1, Parallelism::Sequential).target().clone();
    assert_eq!(
        target.to_stripe(4).unwrap_err(),
        TargetError::Data(DataError::InsufficientData { n_shards: 4, n_docs: 6 })
    );
    assert!(target.to_stripe(0).is_err());
    assert_eq!(target.to_stripe(3).unwrap().layout().n_shards(), 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn shard_count_never_changes_results(seed in 0u64..1000, n_shards in 1usize..5) {
        let sizes = random_query_sizes(12, 1, 7, seed);
        let dataset = synthetic_ranking_dataset(&sizes, seed % 2 == 0, seed);
        let n_docs = dataset.n_docs();
        let point = random_scores(n_docs, 1.0, seed + 1);
        let config = bootstrap(BootstrapType::Bayesian);

        let single = yeti_rank(&dataset, seed, 3, 1, Parallelism::Sequential);
        let target = single.target().clone();
        prop_assume!(target.to_stripe(n_shards).is_ok());
        let striped = yeti_rank(&dataset, seed, 3, n_shards, Parallelism::Sequential);

        let a = merged(&single, &single.stochastic_gradient(&point, &config, &Profiler::disabled()).unwrap());
        let b = merged(&striped, &striped.stochastic_gradient(&point, &config, &Profiler::disabled()).unwrap());
        prop_assert_eq!(a, b);
    }
}
