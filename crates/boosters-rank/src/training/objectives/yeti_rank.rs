//! YetiRank pairwise objective.
//!
//! Each stochastic call runs one round per shard:
//!
//! 1. sample queries and cap per-query document counts
//! 2. lay out one `n * n` pair block per sampled query and fill it
//! 3. estimate PFound pair weights from mean-centered scores
//! 4. apply the bootstrap to pair weights
//! 5. drop zero-weight pairs
//! 6. scatter pairwise logistic derivatives into document and pair buffers
//!
//! All randomness of a call is derived from one round seed and global query
//! ids, so the merged output does not depend on the number of shards.

use std::ops::Range;

use crate::training::config::{BootstrapConfig, LossConfig, LossKind};
use crate::training::derivatives::NonDiagDerivatives;
use crate::training::metrics::AdditiveStatistic;
use crate::training::objectives::pair_logit::{
    assemble_pair_derivatives, pair_logit_pairwise, DerivativeMode, PairLogitDerivatives,
};
use crate::training::objectives::pairs::{make_pairs, DocPair, SampledQueries};
use crate::training::objectives::pfound::{remove_query_means, PFoundWeights};
use crate::training::profiler::Profiler;
use crate::training::random::RoundSeed;
use crate::training::sampling::{bootstrap, QuerywiseSampler};
use crate::training::target::{PairwiseTarget, Target, TargetCategory, TargetFunc};
use crate::training::TargetError;
use crate::utils::{filter_zero_entries, gather};

const OBJECTIVE_NAME: &str = "YetiRankPairwise";

/// Pairwise ranking objective with PFound-sampled pair weights.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use boosters_rank::data::{QueryDataset, QueryGrouping};
/// use boosters_rank::training::{
///     BootstrapConfig, LossConfig, LossKind, Profiler, TargetFunc, TrainingRandom, YetiRankPairwise,
/// };
/// use boosters_rank::Parallelism;
/// use ndarray::array;
///
/// let grouping = QueryGrouping::from_sizes(&[2, 3]).unwrap();
/// let dataset = QueryDataset::new(array![1.0, 0.0, 0.0, 1.0, 0.5], None, grouping).unwrap();
/// let target = TargetFunc::new(&dataset, Arc::new(TrainingRandom::new(7)), Parallelism::Sequential);
/// let objective = YetiRankPairwise::new(target, &LossConfig::new(LossKind::YetiRankPairwise)).unwrap();
///
/// let point = [0.0f32; 5];
/// let ders = objective
///     .stochastic_gradient(&point, &BootstrapConfig::default(), &Profiler::disabled())
///     .unwrap();
/// assert_eq!(ders.len(), 1);
/// assert_eq!(ders[0].docs, vec![0, 1, 2, 3, 4]);
/// ```
#[derive(Debug, Clone)]
pub struct YetiRankPairwise {
    target: TargetFunc,
    sampler: QuerywiseSampler,
    pfound: PFoundWeights,
}

impl YetiRankPairwise {
    /// Wrap `target`; `loss` must describe [`LossKind::YetiRankPairwise`].
    pub fn new(target: TargetFunc, loss: &LossConfig) -> Result<Self, TargetError> {
        loss.ensure_kind(LossKind::YetiRankPairwise)?;
        let permutation_count = loss.permutation_count()?;
        let sampler = QuerywiseSampler::new(QuerywiseSampler::max_query_size_for(target.grouping()));
        tracing::debug!(
            permutation_count,
            max_query_size = sampler.max_query_size(),
            n_shards = target.layout().n_shards(),
            "created {OBJECTIVE_NAME} target"
        );
        Ok(Self { target, sampler, pfound: PFoundWeights::new(permutation_count) })
    }

    pub fn target(&self) -> &TargetFunc {
        &self.target
    }

    /// Number of Monte-Carlo permutations per query.
    pub fn permutation_count(&self) -> u32 {
        self.pfound.permutation_count()
    }

    /// Per-query document cap of the sampler.
    pub fn max_query_size(&self) -> usize {
        self.sampler.max_query_size()
    }

    /// Higher PFound is better.
    pub fn is_min_optimal(&self) -> bool {
        false
    }

    /// Metric reported for this objective.
    pub fn score_metric(&self) -> LossKind {
        LossKind::PFound
    }

    // -------------------------------------------------------------------------
    // Stochastic derivatives
    // -------------------------------------------------------------------------

    /// Sampled first derivatives; the pair buffer holds pair weights.
    pub fn stochastic_gradient(
        &self,
        point: &[f32],
        bootstrap: &BootstrapConfig,
        profiler: &Profiler,
    ) -> Result<Vec<NonDiagDerivatives>, TargetError> {
        self.compute(point, bootstrap, DerivativeMode::Gradient, profiler)
    }

    /// Sampled first derivatives; the pair buffer holds pair second derivatives.
    pub fn stochastic_newton(
        &self,
        point: &[f32],
        bootstrap: &BootstrapConfig,
        profiler: &Profiler,
    ) -> Result<Vec<NonDiagDerivatives>, TargetError> {
        self.compute(point, bootstrap, DerivativeMode::Newton, profiler)
    }

    fn compute(
        &self,
        point: &[f32],
        bootstrap_config: &BootstrapConfig,
        mode: DerivativeMode,
        profiler: &Profiler,
    ) -> Result<Vec<NonDiagDerivatives>, TargetError> {
        bootstrap::check_supported(bootstrap_config, OBJECTIVE_NAME)?;
        bootstrap_config.validate()?;
        self.target.check_point(point)?;
        self.target.total_weight()?;

        let round = self.target.random().next_round();
        let layout = self.target.layout();
        let shard_points = layout.split(point);

        Ok(self.target.parallelism().maybe_par_map(0..layout.n_shards(), |shard| {
            self.shard_round(shard, shard_points[shard], bootstrap_config, round, mode, profiler)
        }))
    }

    /// One round on one shard. `point` covers exactly the shard's documents.
    fn shard_round(
        &self,
        shard: usize,
        point: &[f32],
        bootstrap_config: &BootstrapConfig,
        round: RoundSeed,
        mode: DerivativeMode,
        profiler: &Profiler,
    ) -> NonDiagDerivatives {
        let parallelism = self.target.parallelism();
        let grouping = self.target.shard_grouping(shard);
        let docs: Range<usize> = self.target.layout().slice(shard);

        let sample = {
            let _guard = profiler.profile("Querywise sampling");
            self.sampler.sample(grouping, bootstrap_config.query_sample_rate(), round)
        };
        if sample.is_empty() {
            tracing::debug!(shard, "no documents sampled");
            return NonDiagDerivatives::default();
        }

        let (queries, candidate_pairs) = {
            let _guard = profiler.profile("Make pairs");
            let queries = SampledQueries::build(&sample, grouping);
            let pairs = make_pairs(&queries, parallelism);
            (queries, pairs)
        };

        let mut scores = gather(point, &sample.docs);
        let targets = gather(&self.target.targets()[docs.clone()], &sample.docs);
        let weights = self.target.weights().slice(docs.start, docs.end);
        let observation_weights: Vec<f32> = sample.docs.iter().map(|&d| weights.get(d as usize)).collect();
        remove_query_means(&mut scores, &queries.query_offsets);

        let pair_weights = {
            let _guard = profiler.profile("PFound weights");
            let mut pair_weights = self.pfound.compute(&scores, &targets, &queries, round, parallelism);
            bootstrap::apply_to_pair_weights(
                bootstrap_config,
                &mut pair_weights,
                &queries.pair_offsets,
                &queries.global_queries,
                round,
                parallelism,
            );
            pair_weights
        };

        let (pair_weights, retained) = filter_zero_entries(&pair_weights);
        let pairs: Vec<DocPair> = retained.iter().map(|&idx| candidate_pairs[idx]).collect();

        let (point_weighted_der, pair_der2_or_weights) = {
            let _guard = profiler.profile("Make final gradients");
            assemble_pair_derivatives(
                &scores,
                &observation_weights,
                &queries,
                &pairs,
                &pair_weights,
                mode,
                parallelism,
            )
        };

        tracing::debug!(
            shard,
            sampled_docs = sample.len(),
            sampled_queries = queries.n_queries(),
            candidate_pairs = candidate_pairs.len(),
            surviving_pairs = pairs.len(),
            "computed pairwise derivatives"
        );

        NonDiagDerivatives {
            docs: sample.docs,
            point_weighted_der,
            point_der2_or_weights: Vec::new(),
            pairs,
            pair_der2_or_weights,
        }
    }

    // -------------------------------------------------------------------------
    // Exact path
    // -------------------------------------------------------------------------

    /// Exact pairwise logistic derivatives on a fixed pair list.
    ///
    /// `pairs` are target-local document indices with the preferred document
    /// first.
    pub fn approximate_at(
        &self,
        point: &[f32],
        pairs: &[DocPair],
        pair_weights: &[f32],
        scatter_der_indices: Option<&[u32]>,
    ) -> Result<PairLogitDerivatives, TargetError> {
        self.target.check_point(point)?;
        self.target.total_weight()?;
        pair_logit_pairwise(point, pairs, pair_weights, scatter_der_indices)
    }

    /// Surviving pairs and their weights at `point`, without bootstrap.
    ///
    /// Pairs are target-local document indices ordered so that the first
    /// document has the higher label; equal labels keep the lower index first.
    pub fn fill_pairs_and_weights_at_point(
        &self,
        point: &[f32],
        profiler: &Profiler,
    ) -> Result<(Vec<DocPair>, Vec<f32>), TargetError> {
        let shards = self.stochastic_gradient(point, &BootstrapConfig::default(), profiler)?;
        let starts: Vec<usize> = self.target.layout().slices().iter().map(|r| r.start).collect();
        let merged = NonDiagDerivatives::merge(&shards, &starts);

        let targets = self.target.targets();
        let pairs = merged
            .doc_pairs()
            .map(|pair| {
                let (first, second) = (targets[pair.first as usize], targets[pair.second as usize]);
                if first < second || (first == second && pair.first > pair.second) {
                    pair.swapped()
                } else {
                    pair
                }
            })
            .collect();
        Ok((pairs, merged.pair_der2_or_weights))
    }

    // -------------------------------------------------------------------------
    // Scoring
    // -------------------------------------------------------------------------

    /// Additive PFound statistics are not computed by this target.
    pub fn compute_stats(&self, _point: &[f32]) -> Result<AdditiveStatistic, TargetError> {
        Err(TargetError::Unimplemented("compute_stats"))
    }

    /// Score at `point`.
    pub fn score(&self, point: &[f32]) -> Result<f64, TargetError> {
        let stats = self.compute_stats(point)?;
        Ok(self.score_stats(&stats))
    }

    /// Score from combined statistics: `stats[0] / stats[1]`.
    pub fn score_stats(&self, stats: &AdditiveStatistic) -> f64 {
        stats.get(0) / stats.get(1)
    }
}

impl PairwiseTarget for YetiRankPairwise {
    fn stochastic_derivatives(
        &self,
        point: &[f32],
        bootstrap: &BootstrapConfig,
        mode: DerivativeMode,
        profiler: &Profiler,
    ) -> Result<Vec<NonDiagDerivatives>, TargetError> {
        self.compute(point, bootstrap, mode, profiler)
    }
}

impl Target for YetiRankPairwise {
    fn name(&self) -> &'static str {
        OBJECTIVE_NAME
    }

    fn category(&self) -> TargetCategory {
        TargetCategory::NonDiagQuerywise
    }

    fn n_docs(&self) -> usize {
        self.target.n_docs()
    }

    fn as_pairwise(&self) -> Option<&dyn PairwiseTarget> {
        Some(self)
    }
}
