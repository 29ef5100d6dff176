//! The particle system orchestrator.
//!
//! [`ParticleSystem`] owns the pool, the modifiers, the vertex format and
//! the CPU-side buffers, and exposes the public API: configure, attach,
//! tick, pack. One instance is single-threaded and driven exclusively by
//! per-frame ticks from its renderer; simulation and packing never run
//! concurrently.
//!
//! # Quick Start
//!
//! ```ignore
//! use cinder::prelude::*;
//!
//! let mut system = ParticleSystem::new(
//!     60.0,                                  // particles per second
//!     Sampler::Uniform { min: 1.0, max: 2.0 },
//!     Some(EmitterShape::Sphere { radius: Sampler::Constant(0.5) }),
//!     StartDirection::Outward,
//!     Some(Sampler::Constant(2.0)),
//! )?;
//! system.add(Modifier::StartColor { color: Vec3::new(1.0, 0.6, 0.1) });
//! system.add(Modifier::ColorOverTime { start: Vec3::ONE, end: Vec3::ZERO });
//!
//! system.on_target_added();
//! system.on_renderer_added();
//! system.play();
//!
//! // Per frame, from the render loop:
//! system.enter_frame();
//! upload(system.vertex_buffer().live_bytes());
//! ```

use crate::buffer::{IndexSink, QuadIndexBuffer, QuadVertexBuffer, VertexSink};
use crate::error::ConfigError;
use crate::format::{VertexComponents, VertexFormat};
use crate::modifier::{Modifier, ModifierKind};
use crate::particle::Particle;
use crate::sampler::Sampler;
use crate::shape::{EmitterShape, StartDirection};
use crate::store::{DepthSorting, ParticleStore};
use crate::time::FrameClock;
use glam::{Mat4, Vec3};
use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Slack subtracted before the capacity ceiling, so an exact multiple of
/// the emission period does not allocate one slot too many.
const EPSILON: f32 = 0.001;

/// Directions shorter than this are a degenerate emission and fall back
/// to zero velocity instead of producing NaNs.
const MIN_DIRECTION_LENGTH: f32 = 1e-6;

/// Hard cap on the pool: 4 vertices per quad must stay addressable by the
/// u16 index buffer.
const MAX_COUNT_LIMIT: usize = 16384;

/// CPU particle simulation driving a GPU quad renderer.
pub struct ParticleSystem {
    // Emission configuration.
    period: f32,
    lifetime: Sampler,
    shape: EmitterShape,
    start_direction: StartDirection,
    start_speed: Option<Sampler>,
    count_limit: usize,

    // Pool and per-frame state.
    store: ParticleStore,
    create_timer: f32,
    previous_live_count: usize,

    // Output negotiation.
    format: VertexFormat,
    use_old_position: bool,
    vertices: QuadVertexBuffer,
    indices: QuadIndexBuffer,

    // Space and sorting.
    is_in_world_space: bool,
    depth_sorting: DepthSorting,
    local_to_world: Mat4,
    camera_position: Vec3,

    // Modifiers, split by capability at registration time.
    initializers: Vec<Modifier>,
    updaters: Vec<Modifier>,

    // Tick state.
    update_step: f32,
    time: f32,
    playing: bool,
    emitting: bool,
    attached: bool,
    renderer_count: usize,
    clock: FrameClock,

    rng: SmallRng,
}

impl ParticleSystem {
    /// Create a system.
    ///
    /// * `rate` - emission rate in particles per second
    /// * `lifetime` - per-particle lifetime distribution
    /// * `shape` - emitter shape; `None` substitutes the default sphere
    /// * `start_direction` - initial velocity policy
    /// * `start_speed` - speed applied to directional modes; `None` keeps
    ///   unit speed
    ///
    /// Fails fast on inconsistent configuration rather than defaulting.
    pub fn new(
        rate: f32,
        lifetime: Sampler,
        shape: Option<EmitterShape>,
        start_direction: StartDirection,
        start_speed: Option<Sampler>,
    ) -> Result<Self, ConfigError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidRate(rate));
        }
        if !lifetime.is_well_formed() || lifetime.max() <= 0.0 {
            return Err(ConfigError::InvalidLifetime {
                min: lifetime.min(),
                max: lifetime.max(),
            });
        }
        if let Some(speed) = &start_speed {
            if !speed.is_well_formed() {
                return Err(ConfigError::InvalidStartSpeed {
                    min: speed.min(),
                    max: speed.max(),
                });
            }
        }

        let mut system = Self {
            period: 1.0 / rate,
            lifetime,
            shape: shape.unwrap_or_default(),
            start_direction,
            start_speed,
            count_limit: MAX_COUNT_LIMIT,
            store: ParticleStore::new(),
            create_timer: 0.0,
            previous_live_count: 0,
            format: VertexFormat::new(),
            use_old_position: false,
            vertices: QuadVertexBuffer::new(),
            indices: QuadIndexBuffer::new(),
            is_in_world_space: false,
            depth_sorting: DepthSorting::Disabled,
            local_to_world: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            initializers: Vec::new(),
            updaters: Vec::new(),
            update_step: 0.0,
            time: 0.0,
            playing: false,
            emitting: true,
            attached: false,
            renderer_count: 0,
            clock: FrameClock::new(),
            rng: SmallRng::from_entropy(),
        };
        system.update_max_particle_count();
        system.update_vertex_format();
        Ok(system)
    }

    // =========================================================================
    // BUILDER-STYLE CONFIGURATION
    // =========================================================================

    /// Seed the internal RNG for reproducible emission.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Enable depth sorting with the given policy.
    pub fn with_depth_sorting(mut self, sorting: DepthSorting) -> Self {
        self.depth_sorting = sorting;
        self
    }

    /// Emit into world space instead of the owning node's local frame.
    pub fn with_world_space(mut self, in_world_space: bool) -> Self {
        self.is_in_world_space = in_world_space;
        self
    }

    /// Cap the pool below the derived capacity.
    pub fn with_count_limit(mut self, limit: usize) -> Self {
        self.set_count_limit(limit);
        self
    }

    // =========================================================================
    // PUBLIC SURFACE
    // =========================================================================

    /// Start processing ticks. Resets the reference clock so the first
    /// frame after resuming does not integrate the paused interval.
    pub fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.clock.reset();
        }
    }

    /// Stop processing ticks. While stopped, ticks are ignored entirely.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Whether ticks are currently processed.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Gate emission without pausing the simulation of live particles.
    pub fn set_emitting(&mut self, emitting: bool) {
        self.emitting = emitting;
    }

    /// Whether new particles are being emitted.
    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    /// Emission rate in particles per second.
    pub fn rate(&self) -> f32 {
        1.0 / self.period
    }

    /// Change the emission rate; recomputes the pool capacity.
    pub fn set_rate(&mut self, rate: f32) -> Result<(), ConfigError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidRate(rate));
        }
        self.period = 1.0 / rate;
        self.update_max_particle_count();
        Ok(())
    }

    /// Change the lifetime distribution; recomputes the pool capacity.
    pub fn set_lifetime(&mut self, lifetime: Sampler) -> Result<(), ConfigError> {
        if !lifetime.is_well_formed() || lifetime.max() <= 0.0 {
            return Err(ConfigError::InvalidLifetime {
                min: lifetime.min(),
                max: lifetime.max(),
            });
        }
        self.lifetime = lifetime;
        self.update_max_particle_count();
        Ok(())
    }

    /// Cap the pool size. Clamped to the u16-indexable maximum of 16384.
    pub fn set_count_limit(&mut self, limit: usize) {
        self.count_limit = limit.min(MAX_COUNT_LIMIT);
        self.update_max_particle_count();
    }

    /// Switch between local-frame and world-frame emission.
    pub fn set_in_world_space(&mut self, in_world_space: bool) {
        self.is_in_world_space = in_world_space;
    }

    /// Whether particles are emitted into world space.
    pub fn is_in_world_space(&self) -> bool {
        self.is_in_world_space
    }

    /// Set the depth-sort policy applied when packing.
    pub fn set_depth_sorting(&mut self, sorting: DepthSorting) {
        self.depth_sorting = sorting;
    }

    /// Keep previous-step positions in the vertex stream (motion trails).
    pub fn retain_old_position(&mut self, retain: bool) {
        if self.use_old_position != retain {
            self.use_old_position = retain;
            self.update_vertex_format();
        }
    }

    /// Fixed sub-step in seconds; 0 runs one variable step per tick.
    pub fn set_update_step(&mut self, step: f32) -> Result<(), ConfigError> {
        if !step.is_finite() || step < 0.0 {
            return Err(ConfigError::InvalidUpdateStep(step));
        }
        self.update_step = step;
        Ok(())
    }

    /// Current world transform of the owning node, queried by the host
    /// each frame. Used for world-space emission and local-frame depth
    /// comparison.
    pub fn set_local_to_world(&mut self, transform: Mat4) {
        self.local_to_world = transform;
    }

    /// Camera position for the depth sort, in world space.
    pub fn set_camera_position(&mut self, position: Vec3) {
        self.camera_position = position;
    }

    /// Pool capacity in particle slots.
    pub fn max_count(&self) -> usize {
        self.store.max_count()
    }

    /// Number of live particles.
    pub fn live_count(&self) -> usize {
        self.store.live_count()
    }

    /// Every particle slot, dead ones included.
    pub fn particles(&self) -> &[Particle] {
        self.store.particles()
    }

    /// The negotiated vertex format.
    pub fn format(&self) -> &VertexFormat {
        &self.format
    }

    /// The packed vertex stream.
    pub fn vertex_buffer(&self) -> &QuadVertexBuffer {
        &self.vertices
    }

    /// The quad index stream.
    pub fn index_buffer(&self) -> &QuadIndexBuffer {
        &self.indices
    }

    /// Kill every live particle immediately.
    pub fn reset(&mut self) {
        self.store.reset();
    }

    // =========================================================================
    // MODIFIERS
    // =========================================================================

    /// Register a modifier, merging its required vertex components.
    ///
    /// Initializers and updaters each run in registration order.
    pub fn add(&mut self, modifier: Modifier) {
        self.add_components(modifier.required_components(), false);
        match modifier.kind() {
            ModifierKind::Initializer => self.initializers.push(modifier),
            ModifierKind::Updater => self.updaters.push(modifier),
        }
    }

    /// Remove a previously added modifier (compared by value) and
    /// recompute the vertex format from the survivors.
    ///
    /// Returns `false` when the modifier was not registered.
    pub fn remove(&mut self, modifier: &Modifier) -> bool {
        let list = match modifier.kind() {
            ModifierKind::Initializer => &mut self.initializers,
            ModifierKind::Updater => &mut self.updaters,
        };
        match list.iter().position(|m| m == modifier) {
            Some(position) => {
                list.remove(position);
                self.update_vertex_format();
                true
            }
            None => false,
        }
    }

    /// Whether an equal modifier is registered.
    pub fn has(&self, modifier: &Modifier) -> bool {
        let list = match modifier.kind() {
            ModifierKind::Initializer => &self.initializers,
            ModifierKind::Updater => &self.updaters,
        };
        list.iter().any(|m| m == modifier)
    }

    // =========================================================================
    // LIFECYCLE EVENTS
    // =========================================================================

    /// The system was attached to a renderable scene node.
    pub fn on_target_added(&mut self) {
        self.attached = true;
        self.refresh_clock();
    }

    /// The system was detached from its scene node; ticks stop.
    pub fn on_target_removed(&mut self) {
        self.attached = false;
    }

    /// A renderer able to drive this system appeared.
    pub fn on_renderer_added(&mut self) {
        self.renderer_count += 1;
        self.refresh_clock();
    }

    /// A renderer went away.
    pub fn on_renderer_removed(&mut self) {
        self.renderer_count = self.renderer_count.saturating_sub(1);
    }

    fn can_tick(&self) -> bool {
        self.playing && self.attached && self.renderer_count > 0
    }

    /// Re-reference the clock when the system (re)gains tickability, so a
    /// long detached interval is not integrated in one burst.
    fn refresh_clock(&mut self) {
        if self.can_tick() {
            self.clock.reset();
        }
    }

    // =========================================================================
    // TICKING
    // =========================================================================

    /// Process one frame using wall-clock elapsed time.
    pub fn enter_frame(&mut self) {
        if !self.can_tick() {
            return;
        }
        let delta = self.clock.tick();
        self.step_frame(delta);
    }

    /// Process one frame with an explicit delta, for hosts that own the
    /// clock (and for deterministic tests).
    pub fn enter_frame_with(&mut self, delta: f32) {
        if !self.can_tick() {
            return;
        }
        self.step_frame(delta);
    }

    fn step_frame(&mut self, delta: f32) {
        if self.update_step == 0.0 {
            self.update_system(delta, self.emitting);
            self.update_vertex_buffer();
        } else {
            self.time += delta;
            let mut stepped = false;
            while self.time > self.update_step {
                self.update_system(self.update_step, self.emitting);
                self.time -= self.update_step;
                stepped = true;
            }
            if stepped {
                self.update_vertex_buffer();
            }
        }
    }

    /// Pre-roll the simulation without touching the buffers.
    ///
    /// Runs fixed sub-steps of `1 / updates_per_second` (or the configured
    /// update step when `updates_per_second` is 0) until `time` is
    /// exhausted.
    pub fn fast_forward(&mut self, mut time: f32, updates_per_second: u32) {
        let step = if updates_per_second != 0 {
            1.0 / updates_per_second as f32
        } else {
            self.update_step
        };
        if step <= 0.0 {
            return;
        }
        while time > step {
            self.update_system(step, self.emitting);
            time -= step;
        }
    }

    // =========================================================================
    // SIMULATION STEP
    // =========================================================================

    /// Advance the simulation by one step.
    ///
    /// The five phases, in order: emission-timer accumulation, aging and
    /// same-step death (with a pre-integration old-position snapshot),
    /// the unconditional old-position re-snapshot when the component is
    /// active, updaters in registration order over the full pool, and the
    /// per-slot emission + Euler integration pass.
    pub fn update_system(&mut self, time_step: f32, emit: bool) {
        // The timer saturates at one period; it resumes accumulating once
        // an emission consumes it.
        if emit && self.create_timer < self.period {
            self.create_timer += time_step;
        }

        for index in 0..self.store.max_count() {
            let particle = &mut self.store.particles_mut()[index];
            if !particle.alive {
                continue;
            }
            particle.time_lived += time_step;
            particle.snapshot_position();
            if particle.time_lived >= particle.lifetime {
                self.store.kill(index);
            }
        }

        // Second snapshot pass, alive or not, when old positions are part
        // of the vertex stream.
        if self.format.components().contains(VertexComponents::OLD_POSITION) {
            for particle in self.store.particles_mut() {
                particle.snapshot_position();
            }
        }

        let updaters = &self.updaters;
        let store = &mut self.store;
        for updater in updaters {
            updater.update(store.particles_mut(), time_step);
        }

        for index in 0..self.store.max_count() {
            if !self.store.particles()[index].alive && emit && self.create_timer >= self.period {
                self.create_timer -= self.period;
                self.create_particle(index);
            }
            // Dead slots integrate too; their data is never packed, and a
            // recycled slot inherits the accumulated numeric state.
            Self::integrate(&mut self.store.particles_mut()[index], time_step);
        }
    }

    /// Angular and linear Euler integration for one slot.
    fn integrate(particle: &mut Particle, time_step: f32) {
        particle.rotation += particle.angular_velocity * time_step;
        particle.velocity += particle.force * time_step;
        particle.position += particle.velocity * time_step;
    }

    /// Create a particle in a dead slot via the shape / direction /
    /// initializer pipeline.
    ///
    /// The new particle starts with the emission-timer residue as its age,
    /// staggering the ages of particles born within one step.
    fn create_particle(&mut self, index: usize) {
        let time_lived = self.create_timer;
        let Self {
            store,
            rng,
            shape,
            start_direction,
            start_speed,
            lifetime,
            is_in_world_space,
            local_to_world,
            initializers,
            ..
        } = self;
        let directional = *start_direction != StartDirection::None;
        let particle = store.revive(index);

        match start_direction {
            StartDirection::None => {
                shape.init_position(particle, rng);
                particle.velocity = Vec3::ZERO;
            }
            StartDirection::Shape => shape.init_position_and_direction(particle, rng),
            // Position only; velocity keeps the slot's previous contents.
            StartDirection::Random => shape.init_position(particle, rng),
            StartDirection::Up => {
                shape.init_position(particle, rng);
                particle.velocity = Vec3::Y;
            }
            StartDirection::Outward => {
                shape.init_position(particle, rng);
                particle.velocity = particle.position;
            }
        }

        particle.snapshot_position();

        if *is_in_world_space {
            particle.position = local_to_world.transform_point3(particle.position);
            if directional {
                particle.velocity = local_to_world.transform_vector3(particle.velocity);
            }
        }

        if directional {
            let speed = match start_speed {
                Some(sampler) => sampler.value(rng),
                None => 1.0,
            };
            let length = particle.velocity.length();
            particle.velocity = if length > MIN_DIRECTION_LENGTH {
                particle.velocity * (speed / length)
            } else {
                // Degenerate direction: zero velocity beats NaN in the
                // vertex stream.
                Vec3::ZERO
            };
        }

        particle.rotation = 0.0;
        particle.angular_velocity = 0.0;
        particle.force = Vec3::ZERO;
        particle.time_lived = time_lived;
        particle.lifetime = lifetime.value(rng);

        for initializer in initializers.iter() {
            initializer.init(particle, time_lived, rng);
        }
    }

    // =========================================================================
    // CAPACITY
    // =========================================================================

    /// Recompute `max_count = min(count_limit, ceil(lifetime_max / period
    /// - epsilon))` and resize the pool and buffers when it changed.
    fn update_max_particle_count(&mut self) {
        let derived = (self.lifetime.max() / self.period - EPSILON).ceil().max(0.0) as usize;
        let new_max = derived.min(self.count_limit);

        let lifetime = self.lifetime;
        if self.store.resize(new_max, &lifetime, &mut self.rng) {
            debug!("particle system capacity now {}", new_max);
            self.vertices.resize(new_max, self.format.vertex_size());
            self.previous_live_count = 0;
            self.indices.commit(0);
        }
    }

    // =========================================================================
    // VERTEX FORMAT & PACKING
    // =========================================================================

    /// Merge components into the format; reallocates the vertex storage
    /// unless `defer_alloc` (used while batching during a full recompute).
    fn add_components(&mut self, components: VertexComponents, defer_alloc: bool) {
        if !self.format.add_components(components) {
            return;
        }
        debug!(
            "vertex format now [{}], stride {} floats",
            self.format.components(),
            self.format.vertex_size()
        );
        self.vertices.set_attributes(self.format.attributes());
        if !defer_alloc {
            self.vertices
                .resize(self.store.max_count(), self.format.vertex_size());
        }
    }

    /// Full format recompute: reset to the default mask, re-query every
    /// modifier, re-add the retained old position, reallocate storage.
    ///
    /// Must run whenever a modifier is added or removed; `remove` calls it
    /// for you.
    pub fn update_vertex_format(&mut self) {
        self.format.reset();
        let mut required = VertexComponents::DEFAULT;
        for modifier in self.initializers.iter().chain(self.updaters.iter()) {
            required |= modifier.required_components();
        }
        if self.use_old_position {
            required |= VertexComponents::OLD_POSITION;
        }
        self.add_components(required, true);
        self.vertices.set_attributes(self.format.attributes());
        self.vertices
            .resize(self.store.max_count(), self.format.vertex_size());
    }

    /// Serialize live particles into the vertex stream.
    ///
    /// No-op while no particle is alive: the buffer keeps its previous
    /// frame's data and the committed live count is unchanged. When depth
    /// sorting is active the pack order follows the sorted permutation;
    /// live particles always compact to the front of the stream.
    pub fn update_vertex_buffer(&mut self) {
        let live_count = self.store.live_count();
        if live_count == 0 {
            return;
        }

        let sorted = self.depth_sorting != DepthSorting::Disabled;
        if sorted {
            let local_to_world = if self.is_in_world_space {
                None
            } else {
                Some(&self.local_to_world)
            };
            self.store
                .compute_distances(self.camera_position, local_to_world);
            self.store.sort_order(self.depth_sorting);
        }

        let vertex_size = self.format.vertex_size();
        let components = self.format.components();
        let store = &self.store;
        let data = self.vertices.data_mut();

        let mut cursor = 0;
        for slot in 0..store.max_count() {
            let index = if sorted { store.order()[slot] } else { slot };
            let particle = &store.particles()[index];
            if !particle.alive {
                continue;
            }
            write_quad(data, cursor, vertex_size, particle, components);
            cursor += 4 * vertex_size;
        }

        self.vertices.commit(live_count, vertex_size);
        if live_count != self.previous_live_count {
            self.indices.commit(live_count);
            self.previous_live_count = live_count;
        }
    }
}

/// Write one particle's attributes into its quad's 4 vertices.
///
/// Floats 0..2 of each vertex are the pre-filled corner offsets and are
/// left untouched; attributes start at float 2 and follow the canonical
/// component order.
fn write_quad(
    data: &mut [f32],
    base: usize,
    vertex_size: usize,
    particle: &Particle,
    components: VertexComponents,
) {
    for vertex in 0..4 {
        let start = base + vertex * vertex_size;
        data[start + 2] = particle.position.x;
        data[start + 3] = particle.position.y;
        data[start + 4] = particle.position.z;

        let mut i = start + 5;
        if components.contains(VertexComponents::SIZE) {
            data[i] = particle.size;
            i += 1;
        }
        if components.contains(VertexComponents::COLOR) {
            data[i] = particle.color.x;
            data[i + 1] = particle.color.y;
            data[i + 2] = particle.color.z;
            i += 3;
        }
        if components.contains(VertexComponents::TIME) {
            data[i] = particle.age_fraction();
            i += 1;
        }
        if components.contains(VertexComponents::OLD_POSITION) {
            data[i] = particle.old_position.x;
            data[i + 1] = particle.old_position.y;
            data[i + 2] = particle.old_position.z;
            i += 3;
        }
        if components.contains(VertexComponents::ROTATION) {
            data[i] = particle.rotation;
            i += 1;
        }
        if components.contains(VertexComponents::SPRITE_INDEX) {
            data[i] = particle.sprite_index;
        }
    }
}
