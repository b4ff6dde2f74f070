//! Reproducible, partition-independent randomness.
//!
//! [`TrainingRandom`] is the shared seed stream of a training run. Each
//! stochastic evaluation draws one *round seed* from it; every random draw in
//! that round is then derived from `(round seed, stream, global query id)`.
//! Because the query id is global, the same query sees the same random numbers
//! whether it is processed on one shard or on the fourth of four.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Independent random streams used within one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomStream {
    /// Query and document selection.
    Sampler,
    /// PFound permutation draws.
    PFound,
    /// Bayesian bootstrap weights.
    Bayesian,
}

impl RandomStream {
    #[inline]
    fn salt(self) -> u64 {
        match self {
            RandomStream::Sampler => 0x5A4D_504C_4552_0001,
            RandomStream::PFound => 0x5046_4F55_4E44_0002,
            RandomStream::Bayesian => 0x4241_5945_5349_0003,
        }
    }
}

/// SplitMix64 finalizer.
#[inline]
pub fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for one round of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSeed(u64);

impl RoundSeed {
    /// Wrap a raw seed.
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Raw value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Generator for `stream` of the query with global id `query`.
    pub fn query_rng(self, stream: RandomStream, query: usize) -> Xoshiro256PlusPlus {
        let seed = mix64(mix64(self.0 ^ stream.salt()) ^ query as u64);
        Xoshiro256PlusPlus::seed_from_u64(seed)
    }
}

/// Shared seed stream.
///
/// Advancing the stream is the only mutation shared between rounds. Two
/// evaluations running concurrently against the same stream stay memory-safe,
/// but the order in which they receive seeds is unspecified; serialize calls
/// when reproducibility matters.
///
/// # Example
///
/// ```
/// use boosters_rank::training::TrainingRandom;
///
/// let a = TrainingRandom::new(42);
/// let b = TrainingRandom::new(42);
/// assert_eq!(a.next_round(), b.next_round());
/// assert_ne!(a.next_round(), a.next_round());
/// ```
#[derive(Debug)]
pub struct TrainingRandom {
    seed: u64,
    counter: AtomicU64,
}

impl TrainingRandom {
    /// Create a stream from a logical seed.
    pub fn new(seed: u64) -> Self {
        Self { seed, counter: AtomicU64::new(0) }
    }

    /// The logical seed this stream was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of rounds drawn so far.
    pub fn rounds_drawn(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Draw the seed of the next round.
    pub fn next_round(&self) -> RoundSeed {
        let round = self.counter.fetch_add(1, Ordering::Relaxed);
        RoundSeed(mix64(self.seed ^ mix64(round)))
    }
}
