//! Ember Particles - pooled 2D particle system
//!
//! Provides a single-emitter particle system with:
//! - Fixed-capacity particle pool, no allocation after construction
//! - Frame-rate independent continuous emission and timed bursts
//! - Swap-remove compaction of expired particles
//! - Spawn distributors (box, circle, cone, ring, spiral, ...)
//! - Quad-per-particle or batched point-sprite rendering, with
//!   round-robin draw throttling

pub mod curves;
pub mod distributor;
pub mod emitter;
pub mod particle;
pub mod rand;
pub mod render;
pub mod system;
pub mod trig;

pub use distributor::SpawnDistributor;
pub use emitter::EmitterConfig;
pub use particle::{Particle, ParticleHandle, ParticlePool};
pub use render::{QuadBrush, QuadDraw, RenderBackend, SharedBrush};
pub use system::{FrameStats, ParticleSystem, DEFAULT_BURST_SPREAD};
