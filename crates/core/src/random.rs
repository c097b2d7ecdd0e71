//! Injectable randomness for the activity simulator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the random choices a simulator tick makes.
///
/// Implementations must honor the documented ranges; the simulator relies on
/// them to keep increments inside each counter's configured bounds.
pub trait RandomSource {
    /// Uniform index in `0..len`. `len` is never zero.
    fn index(&mut self, len: usize) -> usize;

    /// Uniform integer in `min..=max`. `min <= max` always holds.
    fn between(&mut self, min: u64, max: u64) -> u64;
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn index(&mut self, len: usize) -> usize {
        (**self).index(len)
    }

    fn between(&mut self, min: u64, max: u64) -> u64 {
        (**self).between(min, max)
    }
}

/// Reproducible source backed by a seeded `StdRng`.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn between(&mut self, min: u64, max: u64) -> u64 {
        self.rng.gen_range(min..=max)
    }
}

/// Entropy-seeded source for production widgets.
#[derive(Debug, Clone)]
pub struct ThreadRandom {
    rng: StdRng,
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RandomSource for ThreadRandom {
    fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn between(&mut self, min: u64, max: u64) -> u64 {
        self.rng.gen_range(min..=max)
    }
}
