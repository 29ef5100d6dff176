//! Emitter shapes for particle spawning.
//!
//! A shape decides where a new particle appears and, when the system runs
//! in [`StartDirection::Shape`] mode, which way it initially points.
//! Directions produced here are not normalized; the system normalizes and
//! rescales them to the sampled start speed after any world transform.
//!
//! # Shape Types
//!
//! | Type | Position | Direction |
//! |------|----------|-----------|
//! | [`EmitterShape::Point`] | fixed at the origin | random unit vector |
//! | [`EmitterShape::Sphere`] | uniform in the volume | radial from center |
//! | [`EmitterShape::Cylinder`] | uniform in the volume, Y axis | radial in the XZ plane |
//! | [`EmitterShape::Box`] | uniform in the volume | random unit vector |

use crate::particle::Particle;
use crate::sampler::Sampler;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// How a freshly created particle picks its initial velocity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartDirection {
    /// Position from shape only; velocity zeroed.
    None,
    /// Shape supplies both position and direction.
    Shape,
    /// Position from shape; velocity left as whatever the slot last held.
    ///
    /// Despite the name, no random direction is generated. The stale
    /// velocity is still normalized and rescaled to the start speed like
    /// any directional mode.
    Random,
    /// Position from shape; velocity forced to `(0, 1, 0)`.
    Up,
    /// Position from shape; velocity set equal to the (pre-transform)
    /// position, so particles radiate from the emitter origin.
    Outward,
}

/// Strategy that computes an initial position (and optionally direction)
/// for a new particle.
#[derive(Clone, Debug, PartialEq)]
pub enum EmitterShape {
    /// Emit from the local origin.
    Point,
    /// Emit uniformly inside a sphere centered at the origin.
    Sphere {
        /// Sphere radius, sampled per particle.
        radius: Sampler,
    },
    /// Emit uniformly inside a Y-axis cylinder centered at the origin.
    Cylinder {
        /// Cylinder radius in the XZ plane, sampled per particle.
        radius: Sampler,
        /// Full cylinder height, sampled per particle.
        height: Sampler,
    },
    /// Emit uniformly inside an axis-aligned box.
    Box {
        /// Minimum corner.
        min: Vec3,
        /// Maximum corner.
        max: Vec3,
    },
}

impl EmitterShape {
    /// The documented default: a sphere of radius 10.
    pub fn default_sphere() -> Self {
        EmitterShape::Sphere {
            radius: Sampler::Constant(10.0),
        }
    }

    /// Initialize only the particle's position.
    pub fn init_position(&self, particle: &mut Particle, rng: &mut SmallRng) {
        particle.position = match self {
            EmitterShape::Point => Vec3::ZERO,
            EmitterShape::Sphere { radius } => {
                // Cube root for uniform volume distribution.
                let r = radius.value(rng) * rng.gen::<f32>().cbrt();
                r * unit_vector(rng)
            }
            EmitterShape::Cylinder { radius, height } => {
                let theta = rng.gen_range(0.0..TAU);
                // Square root for a uniform disk.
                let r = radius.value(rng) * rng.gen::<f32>().sqrt();
                let h = height.value(rng);
                Vec3::new(
                    r * theta.cos(),
                    rng.gen_range(-0.5..0.5) * h,
                    r * theta.sin(),
                )
            }
            EmitterShape::Box { min, max } => Vec3::new(
                lerp(min.x, max.x, rng.gen()),
                lerp(min.y, max.y, rng.gen()),
                lerp(min.z, max.z, rng.gen()),
            ),
        };
    }

    /// Initialize the particle's position and an (un-normalized) direction.
    pub fn init_position_and_direction(&self, particle: &mut Particle, rng: &mut SmallRng) {
        self.init_position(particle, rng);

        particle.velocity = match self {
            EmitterShape::Point => unit_vector(rng),
            EmitterShape::Sphere { .. } => {
                if particle.position.length_squared() > 0.0 {
                    particle.position
                } else {
                    unit_vector(rng)
                }
            }
            EmitterShape::Cylinder { .. } => {
                let radial = Vec3::new(particle.position.x, 0.0, particle.position.z);
                if radial.length_squared() > 0.0 {
                    radial
                } else {
                    let theta = rng.gen_range(0.0..TAU);
                    Vec3::new(theta.cos(), 0.0, theta.sin())
                }
            }
            EmitterShape::Box { .. } => unit_vector(rng),
        };
    }
}

impl Default for EmitterShape {
    fn default() -> Self {
        Self::default_sphere()
    }
}

/// Uniformly distributed unit vector.
fn unit_vector(rng: &mut SmallRng) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let phi = (rng.gen_range(-1.0f32..1.0)).acos();
    Vec3::new(
        phi.sin() * theta.cos(),
        phi.sin() * theta.sin(),
        phi.cos(),
    )
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_point_shape_spawns_at_origin() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut p = Particle::default();
        EmitterShape::Point.init_position(&mut p, &mut rng);
        assert_eq!(p.position, Vec3::ZERO);
    }

    #[test]
    fn test_sphere_positions_within_radius() {
        let mut rng = SmallRng::seed_from_u64(3);
        let shape = EmitterShape::Sphere {
            radius: Sampler::Constant(2.0),
        };
        let mut p = Particle::default();
        for _ in 0..500 {
            shape.init_position(&mut p, &mut rng);
            assert!(p.position.length() <= 2.0 + 1e-4);
        }
    }

    #[test]
    fn test_sphere_direction_is_radial() {
        let mut rng = SmallRng::seed_from_u64(3);
        let shape = EmitterShape::Sphere {
            radius: Sampler::Constant(5.0),
        };
        let mut p = Particle::default();
        shape.init_position_and_direction(&mut p, &mut rng);
        let cross = p.position.cross(p.velocity);
        assert!(cross.length() < 1e-4, "direction not radial: {:?}", cross);
    }

    #[test]
    fn test_cylinder_positions_within_bounds() {
        let mut rng = SmallRng::seed_from_u64(3);
        let shape = EmitterShape::Cylinder {
            radius: Sampler::Constant(1.0),
            height: Sampler::Constant(4.0),
        };
        let mut p = Particle::default();
        for _ in 0..500 {
            shape.init_position(&mut p, &mut rng);
            let radial = (p.position.x * p.position.x + p.position.z * p.position.z).sqrt();
            assert!(radial <= 1.0 + 1e-4);
            assert!(p.position.y.abs() <= 2.0 + 1e-4);
        }
    }

    #[test]
    fn test_box_positions_within_corners() {
        let mut rng = SmallRng::seed_from_u64(3);
        let shape = EmitterShape::Box {
            min: Vec3::new(-1.0, 0.0, -2.0),
            max: Vec3::new(1.0, 3.0, 2.0),
        };
        let mut p = Particle::default();
        for _ in 0..500 {
            shape.init_position(&mut p, &mut rng);
            assert!(p.position.x >= -1.0 && p.position.x <= 1.0);
            assert!(p.position.y >= 0.0 && p.position.y <= 3.0);
            assert!(p.position.z >= -2.0 && p.position.z <= 2.0);
        }
    }

    #[test]
    fn test_unit_vector_is_unit_length() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..100 {
            let v = unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }
}
