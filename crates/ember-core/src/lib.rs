//! Ember Core - Foundational types for the Ember particle engine
//!
//! This crate provides the core types that the other Ember crates depend on:
//! - `Vec2`, `Color` - Spatial and color types
//! - `TextureRegion` - Pixel sub-rectangle of a texture
//! - Error types and Result alias

mod error;
mod types;

pub use error::{EmberError, Result};
pub use types::{Color, TextureRegion, Vec2};
