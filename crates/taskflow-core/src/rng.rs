//! Random source injected into stages that produce placeholder model output.
//!
//! Stages never call a global generator; they hold a [`SharedRandom`] so
//! tests can pin every draw.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

pub trait RandomSource: Send + Sync {
    /// Uniform draw in `[0, 1)`.
    fn next_f64(&self) -> f64;

    /// Index into a candidate list of length `len`. `len` must be non-zero.
    fn pick(&self, len: usize) -> usize {
        let index = (self.next_f64() * len as f64).floor() as usize;
        index.min(len.saturating_sub(1))
    }

    /// Uniform draw in `[low, low + span)`.
    fn in_range(&self, low: f64, span: f64) -> f64 {
        self.next_f64() * span + low
    }
}

pub type SharedRandom = Arc<dyn RandomSource>;

/// `StdRng` behind a lock; reproducible when built with [`SeededRandom::seeded`].
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.rng.lock().random::<f64>()
    }
}

/// Always returns the same value. `FixedRandom::first()` makes every
/// [`pick`](RandomSource::pick) select the first candidate.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(f64);

impl FixedRandom {
    /// `value` is clamped into `[0, 1)`.
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0 - f64::EPSILON))
    }

    pub fn first() -> Self {
        Self(0.0)
    }
}

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.0
    }
}

/// Shared source for a configuration: seeded when `seed` is set.
pub fn shared_random(seed: Option<u64>) -> SharedRandom {
    match seed {
        Some(seed) => Arc::new(SeededRandom::seeded(seed)),
        None => Arc::new(SeededRandom::from_entropy()),
    }
}
