use std::cell::RefCell;

use rand::{RngCore, SeedableRng};
use rand::rngs::StdRng;

/// A uniform `u32` draw, injected so the height sampler never reaches into
/// hidden global state and tests can be made deterministic.
pub trait RandomSource {
    fn next_u32(&self) -> u32;
}

/// Default source: a thread-local RNG, so concurrent inserters never
/// contend on a shared generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRng;

impl RandomSource for ThreadRng {
    fn next_u32(&self) -> u32 {
        rand::rng().next_u32()
    }
}

/// Seeded, reproducible source so height-distribution tests can assert
/// exact draws instead of statistical ranges.
pub struct SeededRng {
    inner: RefCell<StdRng>,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRng {
    fn next_u32(&self) -> u32 {
        self.inner.borrow_mut().next_u32()
    }
}
