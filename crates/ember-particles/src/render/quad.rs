//! Per-particle quad submission through the shared brush

use super::{QuadDraw, SharedBrush};
use crate::emitter::EmitterConfig;
use crate::particle::Particle;

pub struct QuadRenderer {
    brush: SharedBrush,
}

impl QuadRenderer {
    pub fn new(brush: SharedBrush) -> Self {
        Self { brush }
    }

    /// One `draw_quad` per particle. Skips the frame if the host is holding
    /// the brush borrowed.
    pub fn draw<'p>(
        &mut self,
        particles: impl Iterator<Item = &'p Particle>,
        emitter: &EmitterConfig,
    ) -> usize {
        let Ok(mut brush) = self.brush.try_borrow_mut() else {
            log::warn!("Quad brush is already borrowed, skipping particle draw");
            return 0;
        };
        let (base_width, base_height) = emitter.base_size();
        let region = emitter.texture_region();

        let mut drawn = 0;
        for p in particles {
            brush.draw_quad(&QuadDraw::for_particle(p, base_width, base_height, region));
            drawn += 1;
        }
        drawn
    }
}
