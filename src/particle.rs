//! The particle record.
//!
//! One [`Particle`] is a fixed-size value type stored contiguously in the
//! pool. Dead slots are recycled in place: slot indices are not stable
//! across frames, only liveness and attribute values matter.

use glam::Vec3;

/// One simulated particle.
///
/// Invariant: `alive == true` implies `0.0 <= time_lived <= lifetime`.
/// Dead slots keep their last values until a new particle is created in
/// them; the packer never samples a dead slot.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    /// Position, in the system's emission space (local or world).
    pub position: Vec3,
    /// Position at the previous simulation step.
    ///
    /// Only meaningful while the `OLD_POSITION` vertex component is active
    /// or a modifier snapshots it.
    pub old_position: Vec3,
    /// Current velocity.
    pub velocity: Vec3,
    /// Velocity-accumulating force. Integrated into `velocity` each step.
    pub force: Vec3,
    /// Rotation angle in radians.
    pub rotation: f32,
    /// Angular velocity in radians per second.
    pub angular_velocity: f32,
    /// Render size multiplier.
    pub size: f32,
    /// RGB color, each channel 0.0 to 1.0.
    pub color: Vec3,
    /// Sprite sheet cell index, stored as a float for the vertex stream.
    pub sprite_index: f32,
    /// Seconds since this particle was created.
    pub time_lived: f32,
    /// Seconds this particle lives before being recycled.
    pub lifetime: f32,
    /// Liveness flag. Dead slots are skipped when packing.
    pub alive: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            old_position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            size: 1.0,
            color: Vec3::ONE,
            sprite_index: 0.0,
            time_lived: 0.0,
            lifetime: 0.0,
            alive: false,
        }
    }
}

impl Particle {
    /// Copy the current position into `old_position`.
    #[inline]
    pub fn snapshot_position(&mut self) {
        self.old_position = self.position;
    }

    /// Normalized age: `time_lived / lifetime`, clamped to 0..1.
    ///
    /// Returns 0.0 for a zero lifetime instead of dividing by zero.
    #[inline]
    pub fn age_fraction(&self) -> f32 {
        if self.lifetime > 0.0 {
            (self.time_lived / self.lifetime).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
