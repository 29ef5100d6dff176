//! Scalar samplers for emission parameters.
//!
//! Lifetimes, start speeds, shape radii and modifier parameters are all
//! drawn from a [`Sampler`]: a scalar distribution with a defined
//! `min`/`max` envelope. The envelope matters beyond sampling: the pool
//! capacity is derived from `lifetime.max()`, and lifetime resampling on
//! resize uses both bounds.
//!
//! # Example
//!
//! ```ignore
//! use cinder::Sampler;
//!
//! let lifetime = Sampler::Uniform { min: 1.0, max: 2.5 };
//! assert_eq!(lifetime.max(), 2.5);
//! ```

use rand::rngs::SmallRng;
use rand::Rng;

/// A scalar distribution with a known min/max envelope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sampler {
    /// Always the same value.
    Constant(f32),
    /// Uniformly distributed in `[min, max)`.
    Uniform {
        /// Lower bound (inclusive).
        min: f32,
        /// Upper bound (exclusive).
        max: f32,
    },
}

impl Sampler {
    /// Draw one value from the distribution.
    pub fn value(&self, rng: &mut SmallRng) -> f32 {
        match *self {
            Sampler::Constant(v) => v,
            Sampler::Uniform { min, max } => {
                if max > min {
                    rng.gen_range(min..max)
                } else {
                    min
                }
            }
        }
    }

    /// Smallest value the distribution can produce.
    pub fn min(&self) -> f32 {
        match *self {
            Sampler::Constant(v) => v,
            Sampler::Uniform { min, .. } => min,
        }
    }

    /// Largest value the distribution can produce.
    pub fn max(&self) -> f32 {
        match *self {
            Sampler::Constant(v) => v,
            Sampler::Uniform { max, .. } => max,
        }
    }

    /// Whether `min <= max` and both bounds are finite.
    pub fn is_well_formed(&self) -> bool {
        self.min().is_finite() && self.max().is_finite() && self.min() <= self.max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_constant_sampler() {
        let mut rng = SmallRng::seed_from_u64(7);
        let s = Sampler::Constant(1.5);
        assert_eq!(s.value(&mut rng), 1.5);
        assert_eq!(s.min(), 1.5);
        assert_eq!(s.max(), 1.5);
    }

    #[test]
    fn test_uniform_sampler_stays_in_range() {
        let mut rng = SmallRng::seed_from_u64(7);
        let s = Sampler::Uniform { min: 0.5, max: 2.0 };
        for _ in 0..1000 {
            let v = s.value(&mut rng);
            assert!((0.5..2.0).contains(&v));
        }
    }

    #[test]
    fn test_degenerate_uniform_is_constant() {
        let mut rng = SmallRng::seed_from_u64(7);
        let s = Sampler::Uniform { min: 3.0, max: 3.0 };
        assert_eq!(s.value(&mut rng), 3.0);
    }

    #[test]
    fn test_well_formed() {
        assert!(Sampler::Uniform { min: 0.0, max: 1.0 }.is_well_formed());
        assert!(!Sampler::Uniform { min: 1.0, max: 0.0 }.is_well_formed());
        assert!(!Sampler::Constant(f32::NAN).is_well_formed());
    }
}
