//! The particle system: spawn accounting, integration, compaction, draw dispatch

use crate::curves::{lerp_color, lerp_f32};
use crate::emitter::{take_whole, EmitterConfig};
use crate::particle::{Particle, ParticleHandle, ParticlePool};
use crate::rand::ParticleRng;
use crate::render::{
    DrawWindow, GpuBufferDevice, PointSpriteRenderer, QuadRenderer, RenderBackend, ShaderProgram,
    SharedBrush,
};
use crate::trig;
use ember_core::{EmberError, Result, Vec2};

/// Spread used by [`ParticleSystem::burst`]
pub const DEFAULT_BURST_SPREAD: f32 = 0.10;

const DEFAULT_SEED: u32 = 0xDEAD_BEEF;

/// What the last `update` did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Particles spawned from both sources
    pub spawned: usize,
    /// Portion of `spawned` released by a burst
    pub burst_spawned: usize,
    /// Particles that reached the end of their life
    pub expired: usize,
}

/// A single emitter with its own pool, active list and render backend
pub struct ParticleSystem {
    pool: ParticlePool,
    /// Live handles; swap-removed on death, capacity fixed at `max_particles`
    active: Vec<ParticleHandle>,
    emitter: EmitterConfig,
    rng: ParticleRng,
    position: Vec2,

    burst_remaining: u32,
    /// `f32::INFINITY` releases everything remaining in one update
    burst_rate: f32,
    burst_accumulator: f32,

    render_interval: f32,
    render_timer: f32,
    max_draw_per_frame: usize,
    draw_cursor: usize,

    backend: RenderBackend,
    last_frame: FrameStats,
    total_spawned: u64,
}

impl ParticleSystem {
    /// Quad-per-particle system drawing through `brush`
    pub fn new(brush: SharedBrush, max_particles: usize) -> Result<Self> {
        check_capacity(max_particles)?;
        Ok(Self::with_backend(
            RenderBackend::Quad(QuadRenderer::new(brush)),
            max_particles,
        ))
    }

    /// Point-sprite batch system. Allocates one vertex buffer sized for
    /// `max_particles` on `device`.
    pub fn with_point_sprites(
        brush: SharedBrush,
        shader: Box<dyn ShaderProgram>,
        device: Box<dyn GpuBufferDevice>,
        max_particles: usize,
    ) -> Result<Self> {
        check_capacity(max_particles)?;
        let renderer = PointSpriteRenderer::new(brush, shader, device, max_particles)?;
        Ok(Self::with_backend(
            RenderBackend::PointSprite(renderer),
            max_particles,
        ))
    }

    fn with_backend(backend: RenderBackend, max_particles: usize) -> Self {
        log::debug!(
            "Particle system created: capacity={max_particles} backend={}",
            backend.name()
        );
        Self {
            pool: ParticlePool::new(max_particles),
            active: Vec::with_capacity(max_particles),
            emitter: EmitterConfig::default(),
            rng: ParticleRng::new(DEFAULT_SEED),
            position: Vec2::ZERO,
            burst_remaining: 0,
            burst_rate: 0.0,
            burst_accumulator: 0.0,
            render_interval: 0.0,
            render_timer: 0.0,
            max_draw_per_frame: usize::MAX,
            draw_cursor: 0,
            backend,
            last_frame: FrameStats::default(),
            total_spawned: 0,
        }
    }

    // ── Configuration ──

    pub fn emitter(&self) -> &EmitterConfig {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut EmitterConfig {
        &mut self.emitter
    }

    pub fn set_emitter(&mut self, emitter: EmitterConfig) {
        self.emitter = emitter;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Emitter position; affects particles spawned from now on
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    /// Restart the random stream
    pub fn reseed(&mut self, seed: u32) {
        self.rng = ParticleRng::new(seed);
    }

    // ── Bursts ──

    /// Queue `count` particles released over [`DEFAULT_BURST_SPREAD`] seconds
    pub fn burst(&mut self, count: u32) {
        self.burst_over(count, DEFAULT_BURST_SPREAD);
    }

    /// Queue `count` particles released evenly over `spread_seconds`; all at
    /// once on the next update when `spread_seconds <= 0`.
    ///
    /// Counts from overlapping calls add up, but the release rate is replaced
    /// by the latest call, so everything still queued drains at the new rate.
    pub fn burst_over(&mut self, count: u32, spread_seconds: f32) {
        self.burst_remaining = self.burst_remaining.saturating_add(count);
        self.burst_rate = if spread_seconds > 0.0 {
            count as f32 / spread_seconds
        } else {
            f32::INFINITY
        };
    }

    /// Override the release rate of queued burst particles
    pub fn set_burst_rate_per_second(&mut self, rate: f32) {
        self.burst_rate = rate.max(0.0);
    }

    pub fn burst_remaining(&self) -> u32 {
        self.burst_remaining
    }

    pub fn burst_rate_per_second(&self) -> f32 {
        self.burst_rate
    }

    pub fn burst_accumulator(&self) -> f32 {
        self.burst_accumulator
    }

    // ── Draw throttling ──

    /// Minimum seconds between draws; 0 draws every call
    pub fn set_render_interval(&mut self, seconds: f32) {
        self.render_interval = seconds.max(0.0);
    }

    pub fn render_interval(&self) -> f32 {
        self.render_interval
    }

    pub fn render_timer(&self) -> f32 {
        self.render_timer
    }

    /// Cap on particles submitted per draw. Does not affect simulation.
    pub fn set_max_draw_per_frame(&mut self, max: usize) {
        self.max_draw_per_frame = max;
    }

    pub fn max_draw_per_frame(&self) -> usize {
        self.max_draw_per_frame
    }

    pub fn draw_cursor(&self) -> usize {
        self.draw_cursor
    }

    // ── State ──

    pub fn max_particles(&self) -> usize {
        self.pool.capacity()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Pool slots not currently in use
    pub fn free_slots(&self) -> usize {
        self.pool.free_count()
    }

    /// Live particles in active-list order
    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.active.iter().map(|h| self.pool.get(h))
    }

    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_frame
    }

    /// Particles spawned since construction (not reset by `clear`)
    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    pub fn backend(&self) -> &RenderBackend {
        &self.backend
    }

    // ── Frame ──

    /// Spawn due particles, then integrate and compact the ones alive before
    /// this call. No-op unless `delta` is positive and finite.
    pub fn update(&mut self, delta: f32) {
        if !(delta > 0.0 && delta.is_finite()) {
            return;
        }

        let continuous = self.emitter.accumulate_spawns(delta) as usize;
        let burst_due = self.burst_due(delta) as usize;
        let room = self.pool.capacity() - self.active.len();
        let wanted = continuous.saturating_add(burst_due).min(room);

        let mut spawned = 0;
        while spawned < wanted && self.spawn_one() {
            spawned += 1;
        }

        // Burst particles take precedence over continuous ones for the slots we got
        let burst_spawned = spawned.min(burst_due);
        self.burst_remaining -= burst_spawned as u32;
        if self.burst_remaining == 0 {
            self.burst_accumulator = 0.0;
        }

        let expired = self.integrate(delta, spawned);

        if self.render_interval > 0.0 {
            self.render_timer += delta;
        }
        if self.draw_cursor >= self.active.len() {
            self.draw_cursor = 0;
        }

        self.total_spawned += spawned as u64;
        self.last_frame = FrameStats {
            spawned,
            burst_spawned,
            expired,
        };
        if spawned > 0 || expired > 0 {
            log::trace!(
                "particles: +{spawned} (burst {burst_spawned}) -{expired} = {}",
                self.active.len()
            );
        }
    }

    /// Submit up to `max_draw_per_frame` particles, round-robin from the draw
    /// cursor. Skipped entirely while the render interval has not elapsed.
    pub fn draw(&mut self) {
        if self.render_interval > 0.0 {
            if self.render_timer < self.render_interval {
                return;
            }
            // Keep the remainder so the cadence does not drift
            self.render_timer -= self.render_interval;
        }

        let count = self.active.len();
        let window = DrawWindow::new(self.draw_cursor, count, self.max_draw_per_frame);
        if window.count == 0 {
            return;
        }

        let pool = &self.pool;
        let active = &self.active;
        let particles = window.indices(count).map(|i| pool.get(&active[i]));
        // A skipped draw (brush held elsewhere, backend disposed) retries the
        // same window next time
        if self.backend.draw(particles, &self.emitter) > 0 {
            self.draw_cursor = window.next_cursor(count);
        }
    }

    /// Kill every particle immediately and zero all accumulators. The system
    /// stays usable.
    pub fn clear(&mut self) {
        for handle in self.active.drain(..) {
            self.pool.free(handle);
        }
        self.emitter.reset_accumulator();
        self.burst_remaining = 0;
        self.burst_rate = 0.0;
        self.burst_accumulator = 0.0;
        self.render_timer = 0.0;
        self.draw_cursor = 0;
        self.last_frame = FrameStats::default();
    }

    /// Release GPU buffers owned by the backend. The shared brush is left alone.
    pub fn dispose(&mut self) {
        self.backend.dispose();
        log::debug!("Particle system disposed ({} backend)", self.backend.name());
    }

    // ── Internals ──

    /// Whole burst particles due this frame, at most `burst_remaining`
    fn burst_due(&mut self, delta: f32) -> u32 {
        if self.burst_remaining == 0 {
            return 0;
        }
        if self.burst_rate.is_infinite() {
            return self.burst_remaining;
        }
        let due = take_whole(&mut self.burst_accumulator, self.burst_rate * delta);
        due.min(self.burst_remaining)
    }

    /// Obtain and initialize one particle; false when the pool is exhausted
    fn spawn_one(&mut self) -> bool {
        let Some(handle) = self.pool.obtain() else {
            return false;
        };
        let trig_table = self.backend.uses_trig_table();
        init_particle(
            self.pool.get_mut(&handle),
            &self.emitter,
            &mut self.rng,
            self.position,
            trig_table,
        );
        self.active.push(handle);
        true
    }

    /// Age, integrate and compact the particles that existed before this
    /// update. The last `fresh` entries were spawned this update and are left
    /// untouched. Returns how many particles expired.
    fn integrate(&mut self, delta: f32, fresh: usize) -> usize {
        let wind_x = self.emitter.wind_x();
        let gravity_y = self.emitter.gravity_y();

        let mut end = self.active.len() - fresh;
        let mut expired = 0;
        let mut i = 0;
        while i < end {
            let p = self.pool.get_mut(&self.active[i]);
            p.age += delta;

            if p.is_expired() {
                // Move the last unprocessed particle into slot i, then close
                // the gap at `end` with the last active entry. Slot i is
                // reprocessed since it now holds a different particle.
                end -= 1;
                self.active.swap(i, end);
                let dead = self.active.swap_remove(end);
                self.pool.free(dead);
                expired += 1;
                continue;
            }

            p.vel_x += wind_x * delta;
            p.vel_y += gravity_y * delta;
            p.x += p.vel_x * delta;
            p.y += p.vel_y * delta;
            p.rotation += p.rotation_speed * delta;

            let t = p.age_ratio();
            p.scale = lerp_f32(p.start_scale, p.end_scale, t);
            p.color = lerp_color(p.start_color, p.end_color, t);

            i += 1;
        }
        expired
    }
}

fn check_capacity(max_particles: usize) -> Result<()> {
    if max_particles == 0 {
        return Err(EmberError::InvalidArgument(
            "max_particles must be greater than zero".into(),
        ));
    }
    if max_particles > u32::MAX as usize {
        return Err(EmberError::InvalidArgument(format!(
            "max_particles must be at most {}, got {max_particles}",
            u32::MAX
        )));
    }
    Ok(())
}

fn init_particle(
    p: &mut Particle,
    emitter: &EmitterConfig,
    rng: &mut ParticleRng,
    origin: Vec2,
    trig_table: bool,
) {
    p.reset();

    let (life_min, life_max) = emitter.life_range();
    p.life = rng.range(life_min, life_max);
    p.age = 0.0;
    p.active = true;

    let (dx, dy) = emitter.distributor().compute_offset(rng);
    let spawn = origin + Vec2::new(dx, dy);
    p.x = spawn.x;
    p.y = spawn.y;

    let (speed_min, speed_max) = emitter.speed_range();
    let (angle_min, angle_max) = emitter.angle_range_deg();
    let speed = rng.range(speed_min, speed_max);
    let angle = rng.range(angle_min, angle_max);
    let direction = if trig_table {
        let (sin, cos) = trig::sin_cos_deg(angle);
        Vec2::new(cos, sin)
    } else {
        Vec2::from_angle_deg(angle)
    };
    let velocity = direction * speed;
    p.vel_x = velocity.x;
    p.vel_y = velocity.y;

    let (rot_min, rot_max) = emitter.start_rotation_range_deg();
    let (spin_min, spin_max) = emitter.rotation_speed_range_deg();
    p.rotation = rng.range(rot_min, rot_max);
    p.rotation_speed = rng.range(spin_min, spin_max);

    let (start_scale, end_scale) = emitter.scale_range();
    p.start_scale = start_scale;
    p.end_scale = end_scale;
    p.scale = start_scale;
    p.start_color = emitter.start_color();
    p.end_color = emitter.end_color();
    p.color = p.start_color;
}
