use super::rng::RandomSource;

/// Draws a geometric height in `[1, max_height]` with branching factor `B`:
/// `P(height >= k) = B^(1-k)`, clamped to `max_height`.
pub struct HeightSampler<R> {
    max_height: usize,
    // (u32::MAX + 1) / branching, precomputed once so the height draw only
    // needs an integer compare.
    scaled_inverse_branching: u32,
    rng: R,
}

impl<R: RandomSource> HeightSampler<R> {
    pub fn new(max_height: usize, branching: u32, rng: R) -> Self {
        assert!(max_height > 0, "max_height must be positive");
        assert!(branching > 1, "branching factor must be greater than 1");
        let scaled_inverse_branching = ((u64::from(u32::MAX) + 1) / u64::from(branching)) as u32;
        assert!(scaled_inverse_branching > 0);
        Self {
            max_height,
            scaled_inverse_branching,
            rng,
        }
    }

    pub fn max_height(&self) -> usize {
        self.max_height
    }

    /// Sample a height, starting at 1 and promoting while the draw falls in
    /// the bottom `1/B` of its range.
    pub fn sample(&self) -> usize {
        let mut height = 1;
        while height < self.max_height && self.rng.next_u32() < self.scaled_inverse_branching {
            height += 1;
        }
        debug_assert!(height > 0 && height <= self.max_height);
        height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::rng::SeededRng;

    #[test]
    fn sample_never_exceeds_max_height() {
        let sampler = HeightSampler::new(7, 4, SeededRng::new(42));
        for _ in 0..10_000 {
            let h = sampler.sample();
            assert!(h >= 1 && h <= 7);
        }
    }

    #[test]
    fn sample_distribution_approaches_branching_factor() {
        const MAX_HEIGHT: usize = 10;
        const BRANCHING: u32 = 4;
        const N: usize = 200_000;

        let sampler = HeightSampler::new(MAX_HEIGHT, BRANCHING, SeededRng::new(7));
        let mut counts = [0u64; MAX_HEIGHT + 1];
        for _ in 0..N {
            counts[sampler.sample()] += 1;
        }

        // fraction of samples with height >= level should approach B^(1-level)
        for level in 1..=4 {
            let at_least: u64 = counts[level..=MAX_HEIGHT].iter().sum();
            let observed = at_least as f64 / N as f64;
            let expected = (BRANCHING as f64).powi(1 - level as i32);
            assert!(
                (observed - expected).abs() < 0.05,
                "level {level}: observed {observed}, expected {expected}"
            );
        }
    }
}
