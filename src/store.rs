//! The fixed-capacity particle pool.
//!
//! [`ParticleStore`] owns the contiguous particle array, the live-count
//! bookkeeping, and the depth-sort auxiliary arrays (squared camera
//! distances and the order permutation). Storage is allocated on resize
//! only; particle liveness changes every step without reallocating.

use crate::particle::Particle;
use crate::sampler::Sampler;
use glam::{Mat4, Vec3};
use log::debug;
use rand::rngs::SmallRng;
use std::cmp::Ordering;

/// Depth-sort policy applied when packing the vertex stream.
///
/// The comparison is fixed per policy; equal distances fall back to the
/// original slot index so an unchanged particle set always sorts to the
/// identical permutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DepthSorting {
    /// No sorting; particles pack in storage order.
    #[default]
    Disabled,
    /// Farthest particles first, for blended transparency.
    BackToFront,
    /// Nearest particles first, for early-z opaque passes.
    FrontToBack,
}

/// Fixed-capacity pool of particle records with lifetime-driven recycling.
#[derive(Debug, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
    live_count: usize,
    distances: Vec<f32>,
    order: Vec<usize>,
}

impl ParticleStore {
    /// Create an empty store. Call [`resize`](Self::resize) before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current capacity in particle slots.
    #[inline]
    pub fn max_count(&self) -> usize {
        self.particles.len()
    }

    /// Number of slots currently alive.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Read access to every slot, dead ones included.
    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutable access to every slot, dead ones included.
    #[inline]
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// The current order permutation (identity until sorted).
    #[inline]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Mark a slot dead. No-op if it already is.
    pub fn kill(&mut self, index: usize) {
        if self.particles[index].alive {
            self.particles[index].alive = false;
            self.live_count -= 1;
        }
    }

    /// Mark a slot alive and return it for initialization.
    pub fn revive(&mut self, index: usize) -> &mut Particle {
        if !self.particles[index].alive {
            self.particles[index].alive = true;
            self.live_count += 1;
        }
        &mut self.particles[index]
    }

    /// Kill every particle immediately.
    pub fn reset(&mut self) {
        if self.live_count == 0 {
            return;
        }
        self.live_count = 0;
        for particle in &mut self.particles {
            particle.alive = false;
        }
    }

    /// Resize the pool to `new_max` slots.
    ///
    /// Idempotent: returns `false` without touching anything when the
    /// capacity is unchanged. Otherwise live particles survive in storage
    /// order up to the new capacity; particles past `lifetime.max()` or in
    /// slots beyond the new capacity are killed deterministically,
    /// survivors with a lifetime outside the sampler's envelope get a
    /// fresh one, and the sort auxiliary arrays reset to identity order.
    pub fn resize(&mut self, new_max: usize, lifetime: &Sampler, rng: &mut SmallRng) -> bool {
        if new_max == self.max_count() {
            return false;
        }
        debug!(
            "particle store resize: {} -> {} slots",
            self.max_count(),
            new_max
        );

        self.live_count = 0;
        let lifetime_min = lifetime.min();
        let lifetime_max = lifetime.max();
        for (index, particle) in self.particles.iter_mut().enumerate() {
            if !particle.alive {
                continue;
            }
            // Slots past the new capacity are about to be truncated; they
            // must not stay counted as alive.
            if index >= new_max || particle.time_lived >= lifetime_max {
                particle.alive = false;
            } else {
                self.live_count += 1;
                if particle.lifetime > lifetime_max || particle.lifetime < lifetime_min {
                    particle.lifetime = lifetime.value(rng);
                }
            }
        }

        self.particles.resize(new_max, Particle::default());
        self.distances.clear();
        self.distances.resize(new_max, 0.0);
        self.order.clear();
        self.order.extend(0..new_max);
        true
    }

    /// Recompute every slot's squared distance to the camera.
    ///
    /// `local_to_world` is applied first when the particles live in the
    /// emitter's local frame; pass `None` for world-space systems. Dead
    /// slots get stale distances; they are never packed.
    pub fn compute_distances(&mut self, camera: Vec3, local_to_world: Option<&Mat4>) {
        for (distance, particle) in self.distances.iter_mut().zip(&self.particles) {
            let world = match local_to_world {
                Some(transform) => transform.transform_point3(particle.position),
                None => particle.position,
            };
            *distance = camera.distance_squared(world);
        }
    }

    /// Sort the order permutation by the configured policy.
    ///
    /// The permutation is rebuilt to identity first, then stable-sorted
    /// with original-index tie-breaking, so the same unchanged particle
    /// set always yields the identical order.
    pub fn sort_order(&mut self, sorting: DepthSorting) -> &[usize] {
        self.order.clear();
        self.order.extend(0..self.particles.len());

        let distances = &self.distances;
        match sorting {
            DepthSorting::Disabled => {}
            DepthSorting::BackToFront => self.order.sort_by(|&a, &b| {
                distances[b]
                    .partial_cmp(&distances[a])
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.cmp(&b))
            }),
            DepthSorting::FrontToBack => self.order.sort_by(|&a, &b| {
                distances[a]
                    .partial_cmp(&distances[b])
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.cmp(&b))
            }),
        }
        &self.order
    }
}
