//! Headless collaborators that record draw traffic instead of talking to a GPU
//!
//! Useful for servers, tools and tests that run particle systems without a
//! window. The shader and buffer device share one [`GpuLog`] so command order
//! across both is preserved.

use super::point_sprite::{BufferId, GpuBufferDevice, PointSpriteVertex, ShaderProgram};
use super::{QuadBrush, QuadDraw, VertexAttribute};
use ember_core::{EmberError, Result};
use std::cell::RefCell;
use std::rc::Rc;

/// Brush that keeps every quad it is asked to draw
#[derive(Debug, Default)]
pub struct HeadlessBrush {
    pub width: u32,
    pub height: u32,
    pub quads: Vec<QuadDraw>,
    pub texture_binds: Vec<u32>,
}

impl HeadlessBrush {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }
}

impl QuadBrush for HeadlessBrush {
    fn texture_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn bind_texture(&mut self, unit: u32) {
        self.texture_binds.push(unit);
    }

    fn draw_quad(&mut self, quad: &QuadDraw) {
        self.quads.push(*quad);
    }
}

/// One recorded shader or buffer call
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateBuffer { buffer: BufferId, byte_len: usize },
    Upload { buffer: BufferId, offset: usize, bytes: Vec<u8> },
    DrawPoints { buffer: BufferId, count: usize, attributes: usize },
    DeleteBuffer { buffer: BufferId },
    BindShader,
    SetUniformI32 { name: String, value: i32 },
    SetUniformVec4 { name: String, value: [f32; 4] },
    UnbindShader,
}

impl GpuCommand {
    /// Decode the vertices carried by an `Upload`
    pub fn uploaded_vertices(&self) -> Vec<PointSpriteVertex> {
        match self {
            GpuCommand::Upload { bytes, .. } => bytes
                .chunks_exact(std::mem::size_of::<PointSpriteVertex>())
                .map(bytemuck::pod_read_unaligned)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Shared, ordered command log
#[derive(Debug, Clone, Default)]
pub struct GpuLog(Rc<RefCell<Vec<GpuCommand>>>);

impl GpuLog {
    pub fn push(&self, command: GpuCommand) {
        self.0.borrow_mut().push(command);
    }

    /// Drain and return everything recorded so far
    pub fn take(&self) -> Vec<GpuCommand> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

pub struct HeadlessShader {
    log: GpuLog,
}

impl HeadlessShader {
    pub fn new(log: GpuLog) -> Self {
        Self { log }
    }
}

impl ShaderProgram for HeadlessShader {
    fn bind(&mut self) {
        self.log.push(GpuCommand::BindShader);
    }

    fn set_uniform_i32(&mut self, name: &str, value: i32) {
        self.log.push(GpuCommand::SetUniformI32 {
            name: name.to_string(),
            value,
        });
    }

    fn set_uniform_vec4(&mut self, name: &str, value: [f32; 4]) {
        self.log.push(GpuCommand::SetUniformVec4 {
            name: name.to_string(),
            value,
        });
    }

    fn unbind(&mut self) {
        self.log.push(GpuCommand::UnbindShader);
    }
}

pub struct HeadlessGpu {
    log: GpuLog,
    next_id: u32,
    fail_allocation: bool,
}

impl HeadlessGpu {
    pub fn new(log: GpuLog) -> Self {
        Self {
            log,
            next_id: 1,
            fail_allocation: false,
        }
    }

    /// A device whose buffer allocations always fail
    pub fn failing(log: GpuLog) -> Self {
        Self {
            fail_allocation: true,
            ..Self::new(log)
        }
    }
}

impl GpuBufferDevice for HeadlessGpu {
    fn create_buffer(&mut self, byte_len: usize) -> Result<BufferId> {
        if self.fail_allocation {
            return Err(EmberError::RenderError(format!(
                "headless device refused a {byte_len}-byte buffer"
            )));
        }
        let buffer = BufferId(self.next_id);
        self.next_id += 1;
        self.log.push(GpuCommand::CreateBuffer { buffer, byte_len });
        Ok(buffer)
    }

    fn upload(&mut self, buffer: BufferId, byte_offset: usize, data: &[u8]) {
        self.log.push(GpuCommand::Upload {
            buffer,
            offset: byte_offset,
            bytes: data.to_vec(),
        });
    }

    fn draw_points(&mut self, buffer: BufferId, layout: &[VertexAttribute], count: usize) {
        self.log.push(GpuCommand::DrawPoints {
            buffer,
            count,
            attributes: layout.len(),
        });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.log.push(GpuCommand::DeleteBuffer { buffer });
    }
}
