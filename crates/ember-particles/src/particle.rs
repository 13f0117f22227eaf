//! Particle records and the fixed-capacity pool that owns them

use ember_core::Color;

/// CPU-side simulation state for one particle
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub active: bool,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub age: f32,
    pub life: f32,
    /// Degrees
    pub rotation: f32,
    /// Degrees per second
    pub rotation_speed: f32,
    pub start_scale: f32,
    pub end_scale: f32,
    pub scale: f32,
    pub start_color: Color,
    pub end_color: Color,
    pub color: Color,
}

impl Particle {
    pub fn dead() -> Self {
        Self {
            active: false,
            x: 0.0,
            y: 0.0,
            vel_x: 0.0,
            vel_y: 0.0,
            age: 0.0,
            life: 0.0,
            rotation: 0.0,
            rotation_speed: 0.0,
            start_scale: 1.0,
            end_scale: 1.0,
            scale: 1.0,
            start_color: Color::WHITE,
            end_color: Color::WHITE,
            color: Color::WHITE,
        }
    }

    /// Restore every field to the `dead()` defaults
    pub fn reset(&mut self) {
        *self = Self::dead();
    }

    /// Normalized age in [0, 1]
    pub fn age_ratio(&self) -> f32 {
        if self.life <= 0.0 {
            1.0
        } else {
            (self.age / self.life).min(1.0)
        }
    }

    pub fn is_expired(&self) -> bool {
        self.age >= self.life
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::dead()
    }
}

/// Exclusive claim on one pool slot.
///
/// Handles are move-only: the only way to give one back is [`ParticlePool::free`],
/// which consumes it, so a slot can never be live twice.
#[derive(Debug, PartialEq, Eq)]
pub struct ParticleHandle(u32);

impl ParticleHandle {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Fixed-capacity free-list pool. All records are allocated up front;
/// `obtain` and `free` never allocate.
pub struct ParticlePool {
    particles: Vec<Particle>,
    free: Vec<u32>,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        let particles = vec![Particle::dead(); capacity];
        // Reverse so the lowest index is handed out first
        let free = (0..capacity as u32).rev().collect();
        Self { particles, free }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn in_use(&self) -> usize {
        self.capacity() - self.free_count()
    }

    /// Hand out an unused slot, or `None` when every slot is live.
    pub fn obtain(&mut self) -> Option<ParticleHandle> {
        self.free.pop().map(ParticleHandle)
    }

    /// Return a slot to the pool and mark its record inactive.
    pub fn free(&mut self, handle: ParticleHandle) {
        debug_assert!(handle.index() < self.particles.len());
        self.particles[handle.index()].active = false;
        self.free.push(handle.0);
    }

    pub fn get(&self, handle: &ParticleHandle) -> &Particle {
        &self.particles[handle.index()]
    }

    pub fn get_mut(&mut self, handle: &ParticleHandle) -> &mut Particle {
        &mut self.particles[handle.index()]
    }
}
