//! # RandomNumberGenerator
//!
//! The `RandomNumberGenerator` struct wraps the `rand` crate's `StdRng` and provides
//! the draws the chemotaxis operator needs to place gaps. Every optimization run
//! owns its own generator, so runs executed in parallel never share random state.
//!
//! ## Example
//!
//! ```rust
//! use bfoalign::rng::RandomNumberGenerator;
//!
//! let mut rng = RandomNumberGenerator::from_seed(7);
//! let row = rng.gen_index(3);
//! assert!(row < 3);
//! ```

use rand::{rngs::StdRng, Rng, SeedableRng};

/// A wrapper around `StdRng` with the sampling helpers used by the operators.
#[derive(Clone)]
pub struct RandomNumberGenerator {
    pub rng: StdRng,
}

impl RandomNumberGenerator {
    /// Creates a new `RandomNumberGenerator` instance seeded from the system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new `RandomNumberGenerator` instance with a specific seed.
    ///
    /// This is useful for reproducible tests and benchmarks.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns a uniformly drawn index in `0..upper`, or `0` when `upper` is zero.
    pub fn gen_index(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        self.rng.gen_range(0..upper)
    }

    /// Returns a uniformly drawn position in `0..=len`, i.e. any insertion point
    /// of a row with `len` symbols.
    pub fn gen_insertion_point(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..=len)
    }
}

impl Default for RandomNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}
