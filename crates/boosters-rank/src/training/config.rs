//! Loss and bootstrap configuration consumed by ranking targets.
//!
//! Parsing user input (CLI flags, option files) happens elsewhere; this module
//! only defines the typed configuration and its validation.
//!
//! # Example
//!
//! ```
//! use boosters_rank::training::{BootstrapConfig, BootstrapType, LossConfig, LossKind};
//!
//! let loss = LossConfig::new(LossKind::YetiRankPairwise).with_param("permutations", "4");
//! assert_eq!(loss.permutation_count().unwrap(), 4);
//!
//! let bootstrap = BootstrapConfig::builder()
//!     .bootstrap_type(BootstrapType::Bayesian)
//!     .bagging_temperature(0.5)
//!     .build()
//!     .unwrap();
//! assert_eq!(bootstrap.bootstrap_type, BootstrapType::Bayesian);
//! ```

use std::collections::BTreeMap;

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::TargetError;

/// Name of the loss parameter holding the Monte-Carlo permutation count.
pub const PERMUTATIONS_PARAM: &str = "permutations";

/// Permutation count used when the loss configuration does not set one.
pub const DEFAULT_PERMUTATION_COUNT: u32 = 10;

// =============================================================================
// Loss configuration
// =============================================================================

/// Loss function tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossKind {
    /// Pointwise squared error.
    Rmse,
    /// Pairwise logistic loss on given pairs.
    PairLogit,
    /// Pairwise loss with PFound-sampled pair weights.
    YetiRankPairwise,
    /// PFound ranking metric (evaluation only).
    PFound,
}

/// Loss function description: a kind tag plus free-form string parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossConfig {
    pub kind: LossKind,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl LossConfig {
    /// Create a configuration without parameters.
    pub fn new(kind: LossKind) -> Self {
        Self { kind, params: BTreeMap::new() }
    }

    /// Set a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Fail unless this configuration describes `expected`.
    pub fn ensure_kind(&self, expected: LossKind) -> Result<(), TargetError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(TargetError::LossMismatch { expected, actual: self.kind })
        }
    }

    /// Number of Monte-Carlo permutations for PFound weights.
    ///
    /// Defaults to [`DEFAULT_PERMUTATION_COUNT`]; must parse as an integer >= 1.
    pub fn permutation_count(&self) -> Result<u32, TargetError> {
        match self.params.get(PERMUTATIONS_PARAM) {
            None => Ok(DEFAULT_PERMUTATION_COUNT),
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(count) if count > 0 => Ok(count),
                _ => Err(TargetError::InvalidParam {
                    name: PERMUTATIONS_PARAM.to_string(),
                    value: raw.clone(),
                }),
            },
        }
    }
}

// =============================================================================
// Bootstrap configuration
// =============================================================================

/// Bootstrap strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BootstrapType {
    /// No bootstrap.
    #[default]
    No,
    /// Sample whole queries with probability `subsample`.
    Bernoulli,
    /// Multiply pair weights by `(-ln u)^temperature`.
    Bayesian,
    /// Poisson resampling of documents.
    Poisson,
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// subsample must be in (0, 1].
    #[error("subsample must be in (0, 1], got {0}")]
    InvalidSubsample(f32),

    /// bagging_temperature must be >= 0.
    #[error("bagging_temperature must be >= 0, got {0}")]
    InvalidBaggingTemperature(f32),
}

/// Bootstrap configuration for one boosting run.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct BootstrapConfig {
    /// Bootstrap strategy. Default: `No`.
    #[builder(default)]
    pub bootstrap_type: BootstrapType,

    /// Query sampling rate for `Bernoulli`. Default: 0.66.
    #[builder(default = BootstrapConfig::DEFAULT_SUBSAMPLE)]
    pub subsample: f32,

    /// Exponent for `Bayesian` weights. Default: 1.0.
    ///
    /// Larger values increase the variance of pair weights; 0 disables the
    /// perturbation.
    #[builder(default = BootstrapConfig::DEFAULT_BAGGING_TEMPERATURE)]
    pub bagging_temperature: f32,
}

impl<S: bootstrap_config_builder::IsComplete> BootstrapConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `subsample` is outside (0, 1] or the
    /// temperature is negative.
    pub fn build(self) -> Result<BootstrapConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl BootstrapConfig {
    pub const DEFAULT_SUBSAMPLE: f32 = 0.66;
    pub const DEFAULT_BAGGING_TEMPERATURE: f32 = 1.0;

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ConfigError::InvalidSubsample(self.subsample));
        }
        if !(self.bagging_temperature >= 0.0) {
            return Err(ConfigError::InvalidBaggingTemperature(self.bagging_temperature));
        }
        Ok(())
    }

    /// Query sample rate implied by this configuration.
    ///
    /// Only `Bernoulli` subsamples queries; every other type keeps all of them.
    pub fn query_sample_rate(&self) -> f64 {
        match self.bootstrap_type {
            BootstrapType::Bernoulli => self.subsample as f64,
            _ => 1.0,
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            bootstrap_type: BootstrapType::No,
            subsample: Self::DEFAULT_SUBSAMPLE,
            bagging_temperature: Self::DEFAULT_BAGGING_TEMPERATURE,
        }
    }
}
