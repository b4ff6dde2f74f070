//! End-to-end behavior of the YetiRank pairwise pipeline.

mod common;

use approx::assert_abs_diff_eq;
use boosters_rank::data::QueryGrouping;
use boosters_rank::testing::{random_scores, synthetic_ranking_dataset};
use boosters_rank::training::objectives::pairs::make_pairs;
use boosters_rank::training::objectives::{DocPair, PFoundWeights, SampledQueries};
use boosters_rank::training::sampling::QuerywiseSampler;
use boosters_rank::training::{BootstrapType, RoundSeed, TargetAtPoint};
use boosters_rank::utils::filter_zero_entries;
use boosters_rank::{BootstrapConfig, Parallelism, Profiler, QueryDataset, TargetError};
use common::{merged, yeti_rank};
use ndarray::array;

fn two_three_two() -> QueryDataset {
    let grouping = QueryGrouping::from_sizes(&[2, 3, 2]).unwrap();
    QueryDataset::new(array![1.0, 0.0, 0.0, 0.5, 1.0, 1.0, 0.0], None, grouping).unwrap()
}

#[test]
fn two_three_two_pair_blocks() {
    let dataset = two_three_two();
    let grouping = dataset.grouping();
    let sample = QuerywiseSampler::new(QuerywiseSampler::max_query_size_for(grouping)).sample(grouping, 1.0, RoundSeed::new(17));
    let queries = SampledQueries::build(&sample, grouping);
    assert_eq!(queries.pair_offsets, vec![0, 4, 13, 17]);

    let pairs = make_pairs(&queries, Parallelism::Sequential);
    assert_eq!(pairs.len(), 17);

    let targets = dataset.targets().to_vec();
    let weights = PFoundWeights::new(1).compute(&[0.0; 7], &targets, &queries, RoundSeed::new(17), Parallelism::Sequential);
    let self_pairs: Vec<usize> = (0..pairs.len()).filter(|&i| pairs[i].is_self_pair()).collect();
    assert_eq!(self_pairs.len(), 7);
    assert!(self_pairs.iter().all(|&i| weights[i] == 0.0));

    let (kept, retained) = filter_zero_entries(&weights);
    assert!(kept.len() <= 10);
    assert!(retained.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn two_three_two_end_to_end() {
    common::init_tracing();
    let dataset = two_three_two();
    let objective = yeti_rank(&dataset, 5, 1, 1, Parallelism::Sequential);
    let ders = objective
        .stochastic_newton(&[0.0; 7], &BootstrapConfig::default(), &Profiler::disabled())
        .unwrap();

    assert_eq!(ders.len(), 1);
    let der = &ders[0];
    assert_eq!(der.docs, (0..7).collect::<Vec<u32>>());
    assert!(der.n_pairs() <= 10);
    assert!(der.pairs.iter().all(|p| !p.is_self_pair()));
    assert_eq!(der.pair_der2_or_weights.len(), der.n_pairs());
}

#[test]
fn constant_label_query_contributes_no_pairs() {
    let grouping = QueryGrouping::from_sizes(&[3, 2]).unwrap();
    let dataset = QueryDataset::new(array![1.0, 1.0, 1.0, 1.0, 0.0], None, grouping).unwrap();
    let objective = yeti_rank(&dataset, 9, 10, 1, Parallelism::Sequential);
    let point = random_scores(5, 1.0, 2);

    let ders = objective.stochastic_gradient(&point, &BootstrapConfig::default(), &Profiler::disabled()).unwrap();
    let pairs: Vec<_> = ders[0].doc_pairs().collect();
    assert!(!pairs.is_empty());
    assert!(pairs.iter().all(|p| p.first >= 3 && p.second >= 3));
    // Documents of the constant query get no gradient
    assert!(ders[0].point_weighted_der[..3].iter().all(|&d| d == 0.0));
}

#[test]
fn poisson_bootstrap_fails_before_any_work() {
    let dataset = two_three_two();
    let objective = yeti_rank(&dataset, 5, 1, 1, Parallelism::Sequential);
    let profiler = Profiler::new();
    let bootstrap = BootstrapConfig::builder().bootstrap_type(BootstrapType::Poisson).build().unwrap();

    let err = objective.stochastic_newton(&[0.0; 7], &bootstrap, &profiler).unwrap_err();
    assert!(matches!(err, TargetError::UnsupportedBootstrap { bootstrap: BootstrapType::Poisson, .. }));
    assert_eq!(objective.target().random().rounds_drawn(), 0);
    assert!(profiler.report().is_empty());
}

#[test]
fn gradient_and_newton_differ_only_in_pair_buffer() {
    let dataset = synthetic_ranking_dataset(&[4, 6, 3, 5], true, 12);
    let point = random_scores(18, 2.0, 3);
    let bootstrap = BootstrapConfig::default();

    let gradient = yeti_rank(&dataset, 21, 5, 1, Parallelism::Sequential)
        .stochastic_gradient(&point, &bootstrap, &Profiler::disabled())
        .unwrap();
    let newton = yeti_rank(&dataset, 21, 5, 1, Parallelism::Sequential)
        .stochastic_newton(&point, &bootstrap, &Profiler::disabled())
        .unwrap();

    let (g, n) = (&gradient[0], &newton[0]);
    assert_eq!(g.docs, n.docs);
    assert_eq!(g.point_weighted_der, n.point_weighted_der);
    assert_eq!(g.pairs, n.pairs);
    assert!(g.n_pairs() > 0);
    for (&weight, &der2) in g.pair_der2_or_weights.iter().zip(&n.pair_der2_or_weights) {
        // p * (1 - p) <= 1 / 4
        assert!(der2 <= 0.25 * weight + 1e-6);
        assert!(der2 < weight);
    }
}

#[test]
fn full_rate_samples_every_document() {
    let dataset = synthetic_ranking_dataset(&[3, 4, 2, 5], false, 1);
    let objective = yeti_rank(&dataset, 2, 2, 1, Parallelism::Sequential);
    let ders = objective
        .stochastic_gradient(&[0.0; 14], &BootstrapConfig::default(), &Profiler::disabled())
        .unwrap();
    assert_eq!(ders[0].docs, (0..14).collect::<Vec<u32>>());
}

#[test]
fn bernoulli_keeps_whole_queries() {
    let sizes = vec![3usize; 60];
    let dataset = synthetic_ranking_dataset(&sizes, false, 8);
    let objective = yeti_rank(&dataset, 4, 2, 1, Parallelism::Sequential);
    let bootstrap = BootstrapConfig::builder()
        .bootstrap_type(BootstrapType::Bernoulli)
        .subsample(0.5)
        .build()
        .unwrap();

    let ders = objective.stochastic_gradient(&[0.0; 180], &bootstrap, &Profiler::disabled()).unwrap();
    let docs = &ders[0].docs;
    assert!(!docs.is_empty() && docs.len() < 180);
    assert_eq!(docs.len() % 3, 0);
    for chunk in docs.chunks(3) {
        assert_eq!(chunk[0] % 3, 0);
        assert_eq!(chunk[1], chunk[0] + 1);
        assert_eq!(chunk[2], chunk[0] + 2);
    }
}

#[test]
fn bayesian_bootstrap_rescales_pairs() {
    let dataset = synthetic_ranking_dataset(&[4, 5, 3], false, 30);
    let point = random_scores(12, 1.0, 31);
    let plain = yeti_rank(&dataset, 6, 4, 1, Parallelism::Sequential)
        .stochastic_gradient(&point, &BootstrapConfig::default(), &Profiler::disabled())
        .unwrap();
    let bayesian_config = BootstrapConfig::builder()
        .bootstrap_type(BootstrapType::Bayesian)
        .bagging_temperature(1.0)
        .build()
        .unwrap();
    let bayesian = yeti_rank(&dataset, 6, 4, 1, Parallelism::Sequential)
        .stochastic_gradient(&point, &bayesian_config, &Profiler::disabled())
        .unwrap();

    assert_eq!(plain[0].pairs, bayesian[0].pairs);
    assert_ne!(plain[0].pair_der2_or_weights, bayesian[0].pair_der2_or_weights);
}

#[test]
fn fill_pairs_matches_exact_derivatives() {
    let dataset = synthetic_ranking_dataset(&[4, 3, 5, 4], false, 40);
    let point = random_scores(16, 1.5, 41);
    let profiler = Profiler::disabled();

    let (pairs, weights) = yeti_rank(&dataset, 77, 6, 1, Parallelism::Sequential)
        .fill_pairs_and_weights_at_point(&point, &profiler)
        .unwrap();
    let objective = yeti_rank(&dataset, 77, 6, 1, Parallelism::Sequential);
    let sampled = merged(&objective, &objective.stochastic_gradient(&point, &BootstrapConfig::default(), &profiler).unwrap());

    let targets = dataset.targets();
    assert!(pairs.iter().all(|p| targets[p.first as usize] > targets[p.second as usize]));
    assert_eq!(weights, sampled.pair_der2_or_weights);

    let exact = objective.approximate_at(&point, &pairs, &weights, None).unwrap();
    for (position, &doc) in sampled.docs.iter().enumerate() {
        assert_abs_diff_eq!(exact.der[doc as usize], sampled.point_weighted_der[position], epsilon = 1e-5);
    }
}

#[test]
fn target_at_point_selects_pairwise_strategy() {
    let dataset = two_three_two();
    let objective = yeti_rank(&dataset, 5, 2, 1, Parallelism::Sequential);
    let point = [0.0f32; 7];
    let at_point = TargetAtPoint::new(&objective, &point).unwrap();
    assert!(!at_point.is_shifted());
    assert!(matches!(at_point.newton_at_zero(), Err(TargetError::UnsupportedEvaluation(_))));

    let ders = at_point.compute_stochastic_derivatives(&BootstrapConfig::default(), true, &Profiler::disabled()).unwrap();
    assert_eq!(ders[0].docs.len(), 7);
}

#[test]
fn profiler_records_pipeline_steps() {
    let dataset = two_three_two();
    let objective = yeti_rank(&dataset, 5, 2, 1, Parallelism::Sequential);
    let profiler = Profiler::new();
    objective.stochastic_newton(&[0.0; 7], &BootstrapConfig::default(), &profiler).unwrap();

    let labels: Vec<&str> = profiler.report().iter().map(|(label, _)| *label).collect();
    assert_eq!(labels, vec!["Make final gradients", "Make pairs", "PFound weights", "Querywise sampling"]);
}

#[test]
fn graded_labels_above_one_produce_pairs() {
    let grouping = QueryGrouping::from_sizes(&[3, 5]).unwrap();
    let dataset = QueryDataset::new(array![3.0, 2.0, 1.0, 4.0, 0.0, 2.0, 3.0, 1.0], None, grouping).unwrap();
    let objective = yeti_rank(&dataset, 13, 10, 1, Parallelism::Sequential);

    let (pairs, weights) = objective.fill_pairs_and_weights_at_point(&[0.0; 8], &Profiler::disabled()).unwrap();
    let targets = dataset.targets();
    // Every adjacent pair of distinct grades is creditable, deep positions included
    assert!(pairs.iter().any(|p| (p.first, p.second) == (0, 1)));
    assert!(pairs.iter().any(|p| (p.first, p.second) == (1, 2)));
    assert!(pairs.iter().filter(|p| p.first >= 3).count() >= 4);
    assert!(pairs.iter().all(|p| targets[p.first as usize] > targets[p.second as usize]));
    assert!(weights.iter().all(|&w| w > 0.0));
}

#[test]
fn extreme_scores_give_finite_derivatives() {
    let grouping = QueryGrouping::from_sizes(&[2]).unwrap();
    let dataset = QueryDataset::new(array![1.0, 0.0], None, grouping).unwrap();
    let objective = yeti_rank(&dataset, 3, 4, 1, Parallelism::Sequential);

    for point in [[100.0f32, -100.0], [-100.0, 100.0], [1e30, -1e30]] {
        let ders = objective.stochastic_newton(&point, &BootstrapConfig::default(), &Profiler::disabled()).unwrap();
        let der = &ders[0];
        assert_eq!(der.n_pairs(), 1);
        assert!(der.point_weighted_der.iter().chain(&der.pair_der2_or_weights).all(|v| v.is_finite()));
    }

    // Badly misordered: the preferred document gets the full pair weight
    let ders = objective.stochastic_gradient(&[-100.0, 100.0], &BootstrapConfig::default(), &Profiler::disabled()).unwrap();
    assert_abs_diff_eq!(ders[0].point_weighted_der[0], ders[0].pair_der2_or_weights[0], epsilon = 1e-6);
}

#[test]
fn invalid_weights_fail_before_drawing_seed() {
    for weights in [array![1.0, -1.0], array![0.0, 0.0], array![2.0, -1.0]] {
        let grouping = QueryGrouping::from_sizes(&[2]).unwrap();
        let dataset = QueryDataset::new(array![1.0, 0.0], Some(weights), grouping).unwrap();
        let objective = yeti_rank(&dataset, 3, 2, 1, Parallelism::Sequential);

        let err = objective
            .stochastic_gradient(&[0.5, 0.0], &BootstrapConfig::default(), &Profiler::disabled())
            .unwrap_err();
        assert!(matches!(err, TargetError::NonPositiveTotalWeight(_)));
        assert!(matches!(
            objective.fill_pairs_and_weights_at_point(&[0.5, 0.0], &Profiler::disabled()),
            Err(TargetError::NonPositiveTotalWeight(_))
        ));
        assert!(matches!(
            objective.approximate_at(&[0.5, 0.0], &[DocPair::new(0, 1)], &[1.0], None),
            Err(TargetError::NonPositiveTotalWeight(_))
        ));
        assert_eq!(objective.target().random().rounds_drawn(), 0);
    }
}
