//! # Cinder - CPU Particle Simulation Core
//!
//! A CPU-side particle engine that feeds GPU point/quad renderers: a
//! fixed-capacity pool, composable emission and over-lifetime modifiers,
//! and a per-frame packing pass that serializes live particles into an
//! interleaved float stream ready for upload.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cinder::prelude::*;
//!
//! let mut fire = ParticleSystem::new(
//!     120.0,                                   // particles per second
//!     Sampler::Uniform { min: 0.8, max: 1.4 }, // lifetime in seconds
//!     Some(EmitterShape::Cylinder {
//!         radius: Sampler::Constant(0.3),
//!         height: Sampler::Constant(0.05),
//!     }),
//!     StartDirection::Up,
//!     Some(Sampler::Uniform { min: 1.0, max: 2.0 }),
//! )?;
//!
//! fire.add(Modifier::StartSize {
//!     size: Sampler::Uniform { min: 0.1, max: 0.3 },
//! });
//! fire.add(Modifier::ColorOverTime {
//!     start: Vec3::new(1.0, 0.8, 0.2),
//!     end: Vec3::new(0.6, 0.0, 0.0),
//! });
//!
//! fire.on_target_added();
//! fire.on_renderer_added();
//! fire.play();
//!
//! // Per frame, from the render loop:
//! fire.set_local_to_world(node_transform);
//! fire.enter_frame();
//! upload_vertices(fire.vertex_buffer().live_bytes());
//! upload_indices(fire.index_buffer().bytes());
//! ```
//!
//! ## Core Concepts
//!
//! ### Emission
//!
//! A system emits at a fixed rate from an [`EmitterShape`], with initial
//! velocity set by a [`StartDirection`] policy. The pool capacity is
//! derived automatically from the rate and the lifetime distribution, so
//! a steady-state system never runs out of slots.
//!
//! ### Modifiers
//!
//! [`Modifier`]s compose particle behavior. Initializers run once at
//! birth; updaters run every simulation step, in registration order:
//!
//! ```ignore
//! fire.add(Modifier::StartColor { color: Vec3::ONE }); // at birth
//! fire.add(Modifier::ConstantForce { force: Vec3::new(0.0, 2.0, 0.0) });
//! fire.add(Modifier::Drag { coefficient: 0.5 });       // every step
//! ```
//!
//! ### Vertex Format
//!
//! The vertex stream always carries a corner offset and the position.
//! Everything else is negotiated: each modifier declares the
//! [`VertexComponents`] it needs, and the system grows (or, on removal,
//! shrinks) the interleaved layout to exactly what the active modifier
//! set requires.
//!
//! | Component | Floats | Fed by |
//! |-----------|--------|--------|
//! | offset + position | 2 + 3 | always present |
//! | size | 1 | [`Modifier::StartSize`], [`Modifier::SizeOverTime`] |
//! | color | 3 | [`Modifier::StartColor`], [`Modifier::ColorOverTime`] |
//! | time | 1 | any over-lifetime modifier |
//! | old position | 3 | [`ParticleSystem::retain_old_position`] |
//! | rotation | 1 | [`Modifier::StartRotation`] |
//! | sprite index | 1 | [`Modifier::StartSprite`] |
//!
//! ### Ticking
//!
//! The system simulates only while playing, attached to a scene node and
//! observed by at least one renderer. [`ParticleSystem::enter_frame`]
//! measures the elapsed time itself; hosts that own the frame clock call
//! [`ParticleSystem::enter_frame_with`] instead.

mod buffer;
mod error;
mod format;
mod modifier;
mod particle;
mod sampler;
mod shape;
mod store;
mod system;
pub mod time;

pub use buffer::{IndexSink, QuadIndexBuffer, QuadVertexBuffer, VertexSink, QUAD_CORNERS, QUAD_INDICES};
pub use bytemuck;
pub use error::ConfigError;
pub use format::{VertexAttribute, VertexComponents, VertexFormat};
pub use glam::{Mat4, Vec3};
pub use modifier::{Modifier, ModifierKind};
pub use particle::Particle;
pub use sampler::Sampler;
pub use shape::{EmitterShape, StartDirection};
pub use store::{DepthSorting, ParticleStore};
pub use system::ParticleSystem;

/// Convenience re-exports for the common case.
///
/// ```ignore
/// use cinder::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::{IndexSink, QuadIndexBuffer, QuadVertexBuffer, VertexSink};
    pub use crate::error::ConfigError;
    pub use crate::format::{VertexComponents, VertexFormat};
    pub use crate::modifier::{Modifier, ModifierKind};
    pub use crate::particle::Particle;
    pub use crate::sampler::Sampler;
    pub use crate::shape::{EmitterShape, StartDirection};
    pub use crate::store::DepthSorting;
    pub use crate::system::ParticleSystem;
    pub use crate::time::FrameClock;
    pub use crate::{Mat4, Vec3};
}
