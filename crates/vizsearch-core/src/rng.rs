#![forbid(unsafe_code)]

//! The seeded random stream shared by every generation step.
//!
//! One [`TrialRng`] is created per run and passed by `&mut` into the
//! builder, the sampler, the partition scheme and the shuffler. Nothing
//! else draws from it, so output depends only on the seed and on the call
//! order documented in [`crate::builder`].
//!
//! The stream is ChaCha8, which is specified bit-for-bit and therefore
//! reproduces the same trial file on every platform.

use rand::seq::SliceRandom;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{GenerationError, Result};

/// A parsed integer seed together with the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    value: i64,
    raw: String,
}

impl Seed {
    /// Parse a seed strictly. Surrounding whitespace is an error.
    pub fn parse(raw: &str) -> Result<Self> {
        let value = raw.parse::<i64>().map_err(|_| GenerationError::SeedParse {
            raw: raw.to_string(),
        })?;
        Ok(Self {
            value,
            raw: raw.to_string(),
        })
    }

    #[must_use]
    pub fn from_value(value: i64) -> Self {
        Self {
            value,
            raw: value.to_string(),
        }
    }

    #[inline]
    pub const fn value(&self) -> i64 {
        self.value
    }

    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

#[derive(Debug, Clone)]
pub struct TrialRng {
    inner: ChaCha8Rng,
    draws: u64,
}

impl TrialRng {
    #[must_use]
    pub fn from_seed(seed: &Seed) -> Self {
        Self::from_u64(seed.value() as u64)
    }

    #[must_use]
    pub fn from_u64(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Number of draw operations performed so far.
    #[inline]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform value in `[low, high]`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.draws += 1;
        self.inner.random_range(low..=high)
    }

    /// Uniform index in `0..upper`. `upper` must be non-zero.
    pub fn index(&mut self, upper: usize) -> usize {
        debug_assert!(upper > 0, "index range must be non-empty");
        self.draws += 1;
        self.inner.random_range(0..upper)
    }

    /// `amount` distinct elements of `pool`, in selection order.
    pub fn sample_without_replacement<T: Copy>(
        &mut self,
        pool: &[T],
        amount: usize,
    ) -> Result<Vec<T>> {
        if amount > pool.len() {
            return Err(GenerationError::invalid_schema(format!(
                "cannot draw {amount} distinct items from a pool of {}",
                pool.len()
            )));
        }
        self.draws += 1;
        Ok(index::sample(&mut self.inner, pool.len(), amount)
            .into_iter()
            .map(|i| pool[i])
            .collect())
    }

    /// Uniform permutation in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        self.draws += 1;
        items.shuffle(&mut self.inner);
    }
}
