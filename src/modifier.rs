//! Particle modifiers.
//!
//! A modifier either initializes a particle once at creation time or
//! updates the whole pool every simulation step. Each modifier declares
//! the vertex components it needs; registering one merges that mask into
//! the system's vertex format, removing one triggers a full format
//! recompute.
//!
//! Updaters receive the full particle slice, dead slots included, and are
//! responsible for checking `alive` themselves.
//!
//! # Modifier Types
//!
//! | Variant | Kind | Needs |
//! |---------|------|-------|
//! | [`Modifier::StartColor`] | initializer | COLOR |
//! | [`Modifier::StartSize`] | initializer | SIZE |
//! | [`Modifier::StartRotation`] | initializer | ROTATION |
//! | [`Modifier::StartSprite`] | initializer | SPRITE_INDEX |
//! | [`Modifier::StartForce`] | initializer | — |
//! | [`Modifier::ColorOverTime`] | updater | COLOR, TIME |
//! | [`Modifier::SizeOverTime`] | updater | SIZE, TIME |
//! | [`Modifier::ConstantForce`] | updater | — |
//! | [`Modifier::Drag`] | updater | — |

use crate::format::VertexComponents;
use crate::particle::Particle;
use crate::sampler::Sampler;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::Rng;

/// Which phase of the simulation a modifier runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierKind {
    /// Runs once per particle, at creation.
    Initializer,
    /// Runs once per step over the whole pool.
    Updater,
}

/// A pluggable particle modifier.
///
/// Modifiers compare by value, so [`ParticleSystem::remove`] and
/// [`ParticleSystem::has`] take the same modifier that was added.
///
/// [`ParticleSystem::remove`]: crate::ParticleSystem::remove
/// [`ParticleSystem::has`]: crate::ParticleSystem::has
#[derive(Clone, Debug, PartialEq)]
pub enum Modifier {
    /// Set the initial color.
    StartColor {
        /// RGB color at birth.
        color: Vec3,
    },
    /// Sample the initial size.
    StartSize {
        /// Size distribution.
        size: Sampler,
    },
    /// Sample the initial rotation angle and angular velocity.
    StartRotation {
        /// Initial angle in radians.
        angle: Sampler,
        /// Angular velocity in radians per second.
        angular_velocity: Sampler,
    },
    /// Pick a random sprite sheet cell.
    StartSprite {
        /// Number of cells in the sprite sheet.
        count: u32,
    },
    /// Set the initial accumulating force.
    StartForce {
        /// Force applied from birth on.
        force: Vec3,
    },
    /// Blend color from `start` to `end` over the particle's lifetime.
    ColorOverTime {
        /// Color at birth.
        start: Vec3,
        /// Color at death.
        end: Vec3,
    },
    /// Blend size from `start` to `end` over the particle's lifetime.
    SizeOverTime {
        /// Size at birth.
        start: f32,
        /// Size at death.
        end: f32,
    },
    /// Hold the accumulating force at a constant value (gravity, wind).
    ConstantForce {
        /// Force applied every step.
        force: Vec3,
    },
    /// Exponential velocity damping.
    Drag {
        /// Damping coefficient per second.
        coefficient: f32,
    },
}

impl Modifier {
    /// Whether this modifier runs at creation or every step.
    pub fn kind(&self) -> ModifierKind {
        match self {
            Modifier::StartColor { .. }
            | Modifier::StartSize { .. }
            | Modifier::StartRotation { .. }
            | Modifier::StartSprite { .. }
            | Modifier::StartForce { .. } => ModifierKind::Initializer,
            Modifier::ColorOverTime { .. }
            | Modifier::SizeOverTime { .. }
            | Modifier::ConstantForce { .. }
            | Modifier::Drag { .. } => ModifierKind::Updater,
        }
    }

    /// Vertex components this modifier needs in the packed stream.
    pub fn required_components(&self) -> VertexComponents {
        match self {
            Modifier::StartColor { .. } => VertexComponents::COLOR,
            Modifier::StartSize { .. } => VertexComponents::SIZE,
            Modifier::StartRotation { .. } => VertexComponents::ROTATION,
            Modifier::StartSprite { .. } => VertexComponents::SPRITE_INDEX,
            Modifier::StartForce { .. } => VertexComponents::DEFAULT,
            Modifier::ColorOverTime { .. } => VertexComponents::COLOR | VertexComponents::TIME,
            Modifier::SizeOverTime { .. } => VertexComponents::SIZE | VertexComponents::TIME,
            Modifier::ConstantForce { .. } => VertexComponents::DEFAULT,
            Modifier::Drag { .. } => VertexComponents::DEFAULT,
        }
    }

    /// Apply an initializer to one freshly created particle.
    ///
    /// `time_lived` is the emission-timer residue the particle was born
    /// with; initializers that pre-age their effect can use it. No-op for
    /// updater variants.
    pub fn init(&self, particle: &mut Particle, _time_lived: f32, rng: &mut SmallRng) {
        match *self {
            Modifier::StartColor { color } => particle.color = color,
            Modifier::StartSize { size } => particle.size = size.value(rng),
            Modifier::StartRotation {
                angle,
                angular_velocity,
            } => {
                particle.rotation = angle.value(rng);
                particle.angular_velocity = angular_velocity.value(rng);
            }
            Modifier::StartSprite { count } => {
                particle.sprite_index = if count > 1 {
                    rng.gen_range(0..count) as f32
                } else {
                    0.0
                };
            }
            Modifier::StartForce { force } => particle.force = force,
            _ => {}
        }
    }

    /// Apply an updater to the whole pool. No-op for initializer variants.
    pub fn update(&self, particles: &mut [Particle], time_step: f32) {
        match *self {
            Modifier::ColorOverTime { start, end } => {
                for p in particles.iter_mut().filter(|p| p.alive) {
                    p.color = start.lerp(end, p.age_fraction());
                }
            }
            Modifier::SizeOverTime { start, end } => {
                for p in particles.iter_mut().filter(|p| p.alive) {
                    p.size = start + (end - start) * p.age_fraction();
                }
            }
            Modifier::ConstantForce { force } => {
                for p in particles.iter_mut().filter(|p| p.alive) {
                    p.force = force;
                }
            }
            Modifier::Drag { coefficient } => {
                let damping = (coefficient * time_step).min(1.0);
                for p in particles.iter_mut().filter(|p| p.alive) {
                    p.velocity *= 1.0 - damping;
                }
            }
            _ => {}
        }
    }
}
