//! Point-sprite batch renderer
//!
//! Packs the visible particles into one interleaved vertex buffer and issues a
//! single point-primitive draw. Each vertex carries a point size of
//! `max(width, height)` plus an aspect ratio `(width, height) / size`; the
//! fragment stage rescales `gl_PointCoord` by the aspect and discards outside
//! the quad, so one square sprite stands in for a non-square particle.

use super::SharedBrush;
use crate::emitter::EmitterConfig;
use crate::particle::Particle;
use bytemuck::{Pod, Zeroable};
use ember_core::Result;

pub const POINT_SPRITE_VERTEX_SHADER: &str = include_str!("point_sprite.vert");
pub const POINT_SPRITE_FRAGMENT_SHADER: &str = include_str!("point_sprite.frag");

/// Sampler unit uniform (i32)
pub const UNIFORM_TEXTURE: &str = "u_texture";
/// Atlas rectangle uniform, `[u0, v0, u1, v1]`
pub const UNIFORM_UV_RECT: &str = "u_uv_rect";

const TEXTURE_UNIT: u32 = 0;

/// One interleaved vertex per particle. 40 bytes, tightly packed f32s.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointSpriteVertex {
    pub position: [f32; 2],
    /// Point size in pixels: `max(width, height)`
    pub size: f32,
    /// `(width, height) / size`
    pub aspect: [f32; 2],
    /// Degrees
    pub rotation: f32,
    pub color: [f32; 4],
}

impl PointSpriteVertex {
    pub fn from_particle(p: &Particle, base_width: f32, base_height: f32) -> Self {
        let width = base_width * p.scale;
        let height = base_height * p.scale;
        let size = width.max(height);
        let aspect = if size > 0.0 {
            [width / size, height / size]
        } else {
            [1.0, 1.0]
        };
        Self {
            position: [p.x, p.y],
            size,
            aspect,
            rotation: p.rotation,
            color: p.color.to_array(),
        }
    }
}

/// One attribute of the vertex layout handed to the GPU device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub components: u32,
    /// Byte offset within [`PointSpriteVertex`]
    pub offset: usize,
}

/// Matches the attribute declarations in `point_sprite.vert`
pub const POINT_SPRITE_LAYOUT: &[VertexAttribute] = &[
    VertexAttribute {
        name: "a_position",
        components: 2,
        offset: 0,
    },
    VertexAttribute {
        name: "a_size",
        components: 1,
        offset: 8,
    },
    VertexAttribute {
        name: "a_aspect",
        components: 2,
        offset: 12,
    },
    VertexAttribute {
        name: "a_rotation",
        components: 1,
        offset: 20,
    },
    VertexAttribute {
        name: "a_color",
        components: 4,
        offset: 24,
    },
];

/// Opaque GPU buffer name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Shader program wrapper provided by the host
pub trait ShaderProgram {
    fn bind(&mut self);
    fn set_uniform_i32(&mut self, name: &str, value: i32);
    fn set_uniform_vec4(&mut self, name: &str, value: [f32; 4]);
    fn unbind(&mut self);
}

/// Vertex buffer operations provided by the host graphics layer
pub trait GpuBufferDevice {
    /// Allocate a dynamic vertex buffer of `byte_len` bytes
    fn create_buffer(&mut self, byte_len: usize) -> Result<BufferId>;

    /// Overwrite `data.len()` bytes starting at `byte_offset`
    fn upload(&mut self, buffer: BufferId, byte_offset: usize, data: &[u8]);

    /// Draw `count` vertices from the start of `buffer` as points
    fn draw_points(&mut self, buffer: BufferId, layout: &[VertexAttribute], count: usize);

    fn delete_buffer(&mut self, buffer: BufferId);
}

pub struct PointSpriteRenderer {
    brush: SharedBrush,
    shader: Box<dyn ShaderProgram>,
    device: Box<dyn GpuBufferDevice>,
    /// `None` once disposed
    buffer: Option<BufferId>,
    staging: Vec<PointSpriteVertex>,
}

impl PointSpriteRenderer {
    /// Allocates a GPU buffer large enough for `capacity` vertices.
    pub fn new(
        brush: SharedBrush,
        shader: Box<dyn ShaderProgram>,
        mut device: Box<dyn GpuBufferDevice>,
        capacity: usize,
    ) -> Result<Self> {
        let byte_len = capacity * std::mem::size_of::<PointSpriteVertex>();
        let buffer = device.create_buffer(byte_len)?;
        log::debug!("Point-sprite buffer {buffer:?} allocated: {byte_len} bytes");
        Ok(Self {
            brush,
            shader,
            device,
            buffer: Some(buffer),
            staging: Vec::with_capacity(capacity),
        })
    }

    pub fn is_disposed(&self) -> bool {
        self.buffer.is_none()
    }

    pub fn draw<'p>(
        &mut self,
        particles: impl Iterator<Item = &'p Particle>,
        emitter: &EmitterConfig,
    ) -> usize {
        let Some(buffer) = self.buffer else {
            log::warn!("Point-sprite renderer used after dispose, skipping draw");
            return 0;
        };
        let Ok(mut brush) = self.brush.try_borrow_mut() else {
            log::warn!("Quad brush is already borrowed, skipping particle draw");
            return 0;
        };

        // Atlas rectangle is per draw, not per particle
        let (tex_w, tex_h) = brush.texture_size();
        let uv_rect = emitter
            .texture_region()
            .map(|r| r.uv_rect(tex_w, tex_h))
            .unwrap_or([0.0, 0.0, 1.0, 1.0]);

        let (base_width, base_height) = emitter.base_size();
        self.staging.clear();
        self.staging.extend(
            particles.map(|p| PointSpriteVertex::from_particle(p, base_width, base_height)),
        );
        let count = self.staging.len();
        if count == 0 {
            return 0;
        }

        self.device
            .upload(buffer, 0, bytemuck::cast_slice(&self.staging));

        self.shader.bind();
        brush.bind_texture(TEXTURE_UNIT);
        self.shader.set_uniform_i32(UNIFORM_TEXTURE, TEXTURE_UNIT as i32);
        self.shader.set_uniform_vec4(UNIFORM_UV_RECT, uv_rect);
        self.device.draw_points(buffer, POINT_SPRITE_LAYOUT, count);
        self.shader.unbind();

        count
    }

    /// Delete the vertex buffer. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.device.delete_buffer(buffer);
            log::debug!("Point-sprite buffer {buffer:?} deleted");
        }
    }
}
