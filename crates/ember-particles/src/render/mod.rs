//! Render backends for the particle system
//!
//! Two strategies share the same simulation and differ only in how the
//! visible window of particles reaches the GPU:
//! - [`QuadRenderer`]: one quad draw per particle through the shared brush
//! - [`PointSpriteRenderer`]: one interleaved vertex per particle, one upload,
//!   one point-primitive draw call

pub mod headless;
mod point_sprite;
mod quad;

use crate::emitter::EmitterConfig;
use crate::particle::Particle;
use ember_core::{Color, TextureRegion};
use std::cell::RefCell;
use std::rc::Rc;

pub use point_sprite::{
    BufferId, GpuBufferDevice, PointSpriteRenderer, PointSpriteVertex, ShaderProgram,
    VertexAttribute, POINT_SPRITE_FRAGMENT_SHADER, POINT_SPRITE_LAYOUT,
    POINT_SPRITE_VERTEX_SHADER, UNIFORM_TEXTURE, UNIFORM_UV_RECT,
};
pub use quad::QuadRenderer;

/// Everything needed to draw one textured, tinted, rotated quad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadDraw {
    /// Bottom-left corner before rotation
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Rotation pivot, relative to the bottom-left corner
    pub origin_x: f32,
    pub origin_y: f32,
    /// Degrees counter-clockwise
    pub rotation: f32,
    pub color: Color,
    /// Sub-rectangle of the brush texture; the whole texture when `None`
    pub region: Option<TextureRegion>,
}

impl QuadDraw {
    /// Quad of `base * scale` centered on the particle, pivoting on its center
    pub fn for_particle(
        p: &Particle,
        base_width: f32,
        base_height: f32,
        region: Option<TextureRegion>,
    ) -> Self {
        let width = base_width * p.scale;
        let height = base_height * p.scale;
        Self {
            x: p.x - width * 0.5,
            y: p.y - height * 0.5,
            width,
            height,
            origin_x: width * 0.5,
            origin_y: height * 0.5,
            rotation: p.rotation,
            color: p.color,
            region,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.origin_x, self.y + self.origin_y)
    }
}

/// The shared drawable primitive: a texture plus the means to draw quads with it.
///
/// A particle system borrows the brush for its whole life and never disposes it.
pub trait QuadBrush {
    /// Pixel dimensions of the backing texture
    fn texture_size(&self) -> (u32, u32);

    /// Bind the backing texture to a sampler unit
    fn bind_texture(&mut self, unit: u32);

    /// Draw one quad with the backing texture
    fn draw_quad(&mut self, quad: &QuadDraw);
}

/// Brush handle shared between the host and any number of particle systems
pub type SharedBrush = Rc<RefCell<dyn QuadBrush>>;

/// The slice of the active list drawn this frame, starting at the draw cursor
/// and wrapping around the end of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawWindow {
    pub start: usize,
    pub count: usize,
}

impl DrawWindow {
    pub fn new(cursor: usize, active: usize, max_draw: usize) -> Self {
        if active == 0 {
            return Self { start: 0, count: 0 };
        }
        let start = if cursor < active { cursor } else { 0 };
        Self {
            start,
            count: active.min(max_draw),
        }
    }

    /// Active-list indices in draw order
    pub fn indices(&self, active: usize) -> impl Iterator<Item = usize> {
        let start = self.start;
        (0..self.count).map(move |k| (start + k) % active)
    }

    /// Where the next window starts
    pub fn next_cursor(&self, active: usize) -> usize {
        if active == 0 {
            0
        } else {
            (self.start + self.count) % active
        }
    }
}

/// Draw strategy chosen when the particle system is constructed
pub enum RenderBackend {
    Quad(QuadRenderer),
    PointSprite(PointSpriteRenderer),
}

impl RenderBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Quad(_) => "quad",
            Self::PointSprite(_) => "point_sprite",
        }
    }

    /// The point-sprite path derives launch velocity from the trig lookup table
    pub fn uses_trig_table(&self) -> bool {
        matches!(self, Self::PointSprite(_))
    }

    /// Submit the given particles; returns how many were drawn
    pub fn draw<'p>(
        &mut self,
        particles: impl Iterator<Item = &'p Particle>,
        emitter: &EmitterConfig,
    ) -> usize {
        match self {
            Self::Quad(r) => r.draw(particles, emitter),
            Self::PointSprite(r) => r.draw(particles, emitter),
        }
    }

    /// Release GPU resources owned by the backend (never the shared brush)
    pub fn dispose(&mut self) {
        match self {
            Self::Quad(_) => {}
            Self::PointSprite(r) => r.dispose(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_wraps_around() {
        let window = DrawWindow::new(3, 5, 4);
        let order: Vec<_> = window.indices(5).collect();
        assert_eq!(order, vec![3, 4, 0, 1]);
        assert_eq!(window.next_cursor(5), 2);
    }

    #[test]
    fn window_resets_stale_cursor() {
        let window = DrawWindow::new(7, 3, 10);
        assert_eq!(window, DrawWindow { start: 0, count: 3 });
        assert_eq!(window.next_cursor(3), 0);
    }

    #[test]
    fn empty_window() {
        let window = DrawWindow::new(2, 0, 10);
        assert_eq!(window.count, 0);
        assert_eq!(window.next_cursor(0), 0);
    }

    #[test]
    fn zero_max_draw_draws_nothing() {
        let window = DrawWindow::new(1, 4, 0);
        assert_eq!(window.indices(4).count(), 0);
        assert_eq!(window.next_cursor(4), 1);
    }

    #[test]
    fn quad_is_centered_on_particle() {
        let mut p = Particle::dead();
        p.x = 10.0;
        p.y = 20.0;
        p.scale = 0.5;
        p.rotation = 45.0;
        let quad = QuadDraw::for_particle(&p, 8.0, 4.0, None);
        assert_eq!((quad.width, quad.height), (4.0, 2.0));
        assert_eq!((quad.x, quad.y), (8.0, 19.0));
        assert_eq!(quad.center(), (10.0, 20.0));
        assert_eq!(quad.rotation, 45.0);
    }
}
