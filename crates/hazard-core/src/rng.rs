//! The single random source of the engine.
//!
//! Every stochastic rule draws from one seeded [`SimRng`], so a run is fully
//! reproducible from its seed and its inputs.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use miasma::Tripoint;

/// Deterministic random source with the dice helpers the rules use.
#[derive(Debug, Clone)]
pub struct SimRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SimRng {
    /// Seeded source.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this source started from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart from a seed.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Uniform integer in `lo..=hi`; `lo` when the range is empty.
    pub fn range(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            lo
        } else {
            self.rng.gen_range(lo..=hi)
        }
    }

    /// True with probability `1 / n`; always true for `n <= 1`.
    pub fn one_in(&mut self, n: i32) -> bool {
        n <= 1 || self.rng.gen_range(0..n) == 0
    }

    /// True with probability `x / y`.
    pub fn x_in_y(&mut self, x: f64, y: f64) -> bool {
        if x >= y {
            return true;
        }
        if x <= 0.0 || y <= 0.0 {
            return false;
        }
        self.rng.gen::<f64>() < x / y
    }

    /// Sum of `count` rolls of a `sides`-sided die; zero for no sides.
    pub fn dice(&mut self, count: u32, sides: i64) -> i64 {
        if sides < 1 {
            return 0;
        }
        (0..count).map(|_| self.rng.gen_range(1..=sides)).sum()
    }

    /// Round a fractional amount up or down, weighted by the fraction.
    pub fn roll_remainder(&mut self, value: f32) -> i32 {
        let whole = value.floor();
        let frac = f64::from(value - whole);
        #[allow(clippy::cast_possible_truncation)]
        let base = whole as i32;
        if self.x_in_y(frac, 1.0) {
            base + 1
        } else {
            base
        }
    }

    /// Uniform index below `len`; zero for an empty range.
    pub fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            0
        } else {
            self.rng.gen_range(0..len)
        }
    }

    /// A random element of a slice.
    pub fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            None
        } else {
            Some(items[self.index(items.len())])
        }
    }

    /// Random horizontal offset with each axis in `-radius..=radius`.
    pub fn offset(&mut self, radius: i32) -> Tripoint {
        Tripoint::new(self.range(-radius, radius), self.range(-radius, radius), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        for _ in 0..100 {
            assert_eq!(a.range(0, 1000), b.range(0, 1000));
        }
    }

    #[test]
    fn test_reseed_restarts() {
        let mut a = SimRng::new(9);
        let first: Vec<i32> = (0..10).map(|_| a.range(0, 99)).collect();
        a.reseed(9);
        let again: Vec<i32> = (0..10).map(|_| a.range(0, 99)).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_degenerate_ranges() {
        let mut rng = SimRng::new(1);
        assert_eq!(rng.range(5, 5), 5);
        assert_eq!(rng.range(5, 2), 5);
        assert!(rng.one_in(1));
        assert!(rng.one_in(0));
        assert!(rng.one_in(-3));
        assert_eq!(rng.dice(2, 0), 0);
        assert!(rng.pick::<u8>(&[]).is_none());
    }

    #[test]
    fn test_dice_bounds() {
        let mut rng = SimRng::new(3);
        for _ in 0..200 {
            let roll = rng.dice(2, 6);
            assert!((2..=12).contains(&roll));
        }
    }

    #[test]
    fn test_roll_remainder_bounds() {
        let mut rng = SimRng::new(11);
        for _ in 0..100 {
            let r = rng.roll_remainder(2.25);
            assert!(r == 2 || r == 3);
        }
        assert_eq!(rng.roll_remainder(4.0), 4);
    }

    #[test]
    fn test_x_in_y_extremes() {
        let mut rng = SimRng::new(5);
        assert!(rng.x_in_y(3.0, 3.0));
        assert!(!rng.x_in_y(0.0, 3.0));
    }
}
