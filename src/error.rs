//! Error types for system construction.
//!
//! The simulation itself is deterministic numeric code with no I/O; the
//! only failure class is configuration inconsistency, which fails fast at
//! construction instead of silently defaulting. The one documented
//! exception: a missing emitter shape substitutes the default sphere.

use std::fmt;

/// Errors produced while validating a [`ParticleSystem`] configuration.
///
/// [`ParticleSystem`]: crate::ParticleSystem
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Emission rate must be finite and strictly positive.
    InvalidRate(f32),
    /// Lifetime sampler has a non-positive maximum or an inverted range.
    InvalidLifetime { min: f32, max: f32 },
    /// Start-speed sampler has a non-finite or inverted range.
    InvalidStartSpeed { min: f32, max: f32 },
    /// Fixed update step must be finite and non-negative (0 = variable).
    InvalidUpdateStep(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidRate(rate) => {
                write!(f, "emission rate must be finite and > 0, got {}", rate)
            }
            ConfigError::InvalidLifetime { min, max } => write!(
                f,
                "lifetime sampler must have 0 < max and min <= max, got [{}, {}]",
                min, max
            ),
            ConfigError::InvalidStartSpeed { min, max } => write!(
                f,
                "start speed sampler must have finite min <= max, got [{}, {}]",
                min, max
            ),
            ConfigError::InvalidUpdateStep(step) => {
                write!(f, "update step must be finite and >= 0, got {}", step)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_offending_value() {
        let err = ConfigError::InvalidRate(-3.0);
        assert!(err.to_string().contains("-3"));

        let err = ConfigError::InvalidLifetime { min: 2.0, max: 1.0 };
        assert!(err.to_string().contains("[2, 1]"));
    }
}
