//! Spawn distributors: stochastic 2D offsets that shape where particles are born
//!
//! Each shape is a small value type holding only its parameters. Distances and
//! radii are clamped to be non-negative on construction and on every setter,
//! and non-finite parameters become 0, so sampling has no error path and
//! never yields NaN.

use crate::curves::lerp_f32;
use crate::rand::ParticleRng;
use std::f32::consts::TAU;

fn finite(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn non_negative(v: f32) -> f32 {
    finite(v).max(0.0)
}

/// Disk radius for one sample: the rim when `edge_only`, otherwise
/// area-uniform (`radius * sqrt(u)`).
fn disk_radius(rng: &mut ParticleRng, radius: f32, edge_only: bool) -> f32 {
    if edge_only {
        radius
    } else {
        radius * rng.next_f32().sqrt()
    }
}

fn polar(angle_rad: f32, r: f32) -> (f32, f32) {
    let (sin, cos) = angle_rad.sin_cos();
    (cos * r, sin * r)
}

/// Uniform over an axis-aligned box centered on the emitter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape {
    half_width: f32,
    half_height: f32,
}

impl BoxShape {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half_width: non_negative(half_width),
            half_height: non_negative(half_height),
        }
    }

    pub fn half_extents(&self) -> (f32, f32) {
        (self.half_width, self.half_height)
    }

    pub fn set_half_extents(&mut self, half_width: f32, half_height: f32) -> &mut Self {
        self.half_width = non_negative(half_width);
        self.half_height = non_negative(half_height);
        self
    }

    pub fn compute_offset(&self, rng: &mut ParticleRng) -> (f32, f32) {
        let dx = rng.range(-self.half_width, self.half_width);
        let dy = rng.range(-self.half_height, self.half_height);
        (dx, dy)
    }
}

/// Disk (area-uniform) or circle rim
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleShape {
    radius: f32,
    edge_only: bool,
}

impl CircleShape {
    pub fn new(radius: f32, edge_only: bool) -> Self {
        Self {
            radius: non_negative(radius),
            edge_only,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn edge_only(&self) -> bool {
        self.edge_only
    }

    pub fn set_radius(&mut self, radius: f32) -> &mut Self {
        self.radius = non_negative(radius);
        self
    }

    pub fn set_edge_only(&mut self, edge_only: bool) -> &mut Self {
        self.edge_only = edge_only;
        self
    }

    pub fn compute_offset(&self, rng: &mut ParticleRng) -> (f32, f32) {
        let angle = rng.angle();
        let r = disk_radius(rng, self.radius, self.edge_only);
        polar(angle, r)
    }
}

/// Wedge of a disk: `spread_deg` wide, centered on `direction_deg`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeShape {
    radius: f32,
    direction_deg: f32,
    spread_deg: f32,
    edge_only: bool,
}

impl ConeShape {
    pub fn new(radius: f32, direction_deg: f32, spread_deg: f32, edge_only: bool) -> Self {
        Self {
            radius: non_negative(radius),
            direction_deg: finite(direction_deg),
            spread_deg: finite(spread_deg),
            edge_only,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn direction_deg(&self) -> f32 {
        self.direction_deg
    }

    pub fn spread_deg(&self) -> f32 {
        self.spread_deg
    }

    pub fn set_radius(&mut self, radius: f32) -> &mut Self {
        self.radius = non_negative(radius);
        self
    }

    pub fn set_direction_deg(&mut self, direction_deg: f32) -> &mut Self {
        self.direction_deg = finite(direction_deg);
        self
    }

    pub fn set_spread_deg(&mut self, spread_deg: f32) -> &mut Self {
        self.spread_deg = finite(spread_deg);
        self
    }

    pub fn set_edge_only(&mut self, edge_only: bool) -> &mut Self {
        self.edge_only = edge_only;
        self
    }

    pub fn compute_offset(&self, rng: &mut ParticleRng) -> (f32, f32) {
        let half = self.spread_deg * 0.5;
        let angle_deg = lerp_f32(
            self.direction_deg - half,
            self.direction_deg + half,
            rng.next_f32(),
        );
        let r = disk_radius(rng, self.radius, self.edge_only);
        polar(angle_deg.to_radians(), r)
    }
}

/// Perimeter of an axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectEdgeShape {
    half_width: f32,
    half_height: f32,
}

impl RectEdgeShape {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half_width: non_negative(half_width),
            half_height: non_negative(half_height),
        }
    }

    pub fn half_extents(&self) -> (f32, f32) {
        (self.half_width, self.half_height)
    }

    pub fn set_half_extents(&mut self, half_width: f32, half_height: f32) -> &mut Self {
        self.half_width = non_negative(half_width);
        self.half_height = non_negative(half_height);
        self
    }

    pub fn compute_offset(&self, rng: &mut ParticleRng) -> (f32, f32) {
        let (hw, hh) = (self.half_width, self.half_height);
        let edge = rng.next_bits(2);
        let u = rng.next_f32();
        match edge {
            0 => (lerp_f32(-hw, hw, u), -hh),
            1 => (lerp_f32(-hw, hw, u), hh),
            2 => (-hw, lerp_f32(-hh, hh, u)),
            _ => (hw, lerp_f32(-hh, hh, u)),
        }
    }
}

/// Annulus between `inner` and `outer`, area-uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingShape {
    inner: f32,
    outer: f32,
}

impl RingShape {
    pub fn new(inner: f32, outer: f32) -> Self {
        let inner = non_negative(inner);
        Self {
            inner,
            outer: non_negative(outer).max(inner),
        }
    }

    pub fn radii(&self) -> (f32, f32) {
        (self.inner, self.outer)
    }

    /// Outer radius is raised to the inner radius when smaller.
    pub fn set_radii(&mut self, inner: f32, outer: f32) -> &mut Self {
        *self = Self::new(inner, outer);
        self
    }

    pub fn compute_offset(&self, rng: &mut ParticleRng) -> (f32, f32) {
        let angle = rng.angle();
        let r2 = lerp_f32(
            self.inner * self.inner,
            self.outer * self.outer,
            rng.next_f32(),
        );
        polar(angle, r2.sqrt())
    }
}

/// Always exactly on a circle of `radius`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialBurstShape {
    radius: f32,
}

impl RadialBurstShape {
    pub fn new(radius: f32) -> Self {
        Self {
            radius: non_negative(radius),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) -> &mut Self {
        self.radius = non_negative(radius);
        self
    }

    pub fn compute_offset(&self, rng: &mut ParticleRng) -> (f32, f32) {
        polar(rng.angle(), self.radius)
    }
}

/// Archimedean spiral arm. Samples are uniform in the curve parameter, not in
/// arc length, so density increases toward the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralShape {
    max_radius: f32,
    turns: f32,
}

impl SpiralShape {
    pub fn new(max_radius: f32, turns: f32) -> Self {
        Self {
            max_radius: non_negative(max_radius),
            turns: finite(turns),
        }
    }

    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    pub fn turns(&self) -> f32 {
        self.turns
    }

    pub fn set_max_radius(&mut self, max_radius: f32) -> &mut Self {
        self.max_radius = non_negative(max_radius);
        self
    }

    pub fn set_turns(&mut self, turns: f32) -> &mut Self {
        self.turns = finite(turns);
        self
    }

    pub fn compute_offset(&self, rng: &mut ParticleRng) -> (f32, f32) {
        let t = rng.next_f32();
        polar(t * self.turns * TAU, self.max_radius * t)
    }
}

/// Birth geometry for an emitter
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SpawnDistributor {
    #[default]
    Point,
    Box(BoxShape),
    Circle(CircleShape),
    Cone(ConeShape),
    RectEdge(RectEdgeShape),
    Ring(RingShape),
    RadialBurst(RadialBurstShape),
    Spiral(SpiralShape),
}

impl SpawnDistributor {
    pub fn point() -> Self {
        Self::Point
    }

    pub fn boxed(half_width: f32, half_height: f32) -> Self {
        Self::Box(BoxShape::new(half_width, half_height))
    }

    pub fn circle(radius: f32, edge_only: bool) -> Self {
        Self::Circle(CircleShape::new(radius, edge_only))
    }

    pub fn cone(radius: f32, direction_deg: f32, spread_deg: f32, edge_only: bool) -> Self {
        Self::Cone(ConeShape::new(radius, direction_deg, spread_deg, edge_only))
    }

    pub fn rect_edge(half_width: f32, half_height: f32) -> Self {
        Self::RectEdge(RectEdgeShape::new(half_width, half_height))
    }

    pub fn ring(inner: f32, outer: f32) -> Self {
        Self::Ring(RingShape::new(inner, outer))
    }

    pub fn radial_burst(radius: f32) -> Self {
        Self::RadialBurst(RadialBurstShape::new(radius))
    }

    pub fn spiral(max_radius: f32, turns: f32) -> Self {
        Self::Spiral(SpiralShape::new(max_radius, turns))
    }

    /// Short lowercase name, as used in TOML presets
    pub fn name(&self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Box(_) => "box",
            Self::Circle(_) => "circle",
            Self::Cone(_) => "cone",
            Self::RectEdge(_) => "rect_edge",
            Self::Ring(_) => "ring",
            Self::RadialBurst(_) => "burst",
            Self::Spiral(_) => "spiral",
        }
    }

    /// Sample one offset from the emitter position
    pub fn compute_offset(&self, rng: &mut ParticleRng) -> (f32, f32) {
        match self {
            Self::Point => (0.0, 0.0),
            Self::Box(s) => s.compute_offset(rng),
            Self::Circle(s) => s.compute_offset(rng),
            Self::Cone(s) => s.compute_offset(rng),
            Self::RectEdge(s) => s.compute_offset(rng),
            Self::Ring(s) => s.compute_offset(rng),
            Self::RadialBurst(s) => s.compute_offset(rng),
            Self::Spiral(s) => s.compute_offset(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: usize = 10_000;

    fn magnitude((dx, dy): (f32, f32)) -> f32 {
        (dx * dx + dy * dy).sqrt()
    }

    #[test]
    fn point_is_origin() {
        let mut rng = ParticleRng::new(1);
        for _ in 0..10 {
            assert_eq!(SpawnDistributor::Point.compute_offset(&mut rng), (0.0, 0.0));
        }
    }

    #[test]
    fn point_consumes_no_randomness() {
        let mut a = ParticleRng::new(5);
        let mut b = ParticleRng::new(5);
        SpawnDistributor::Point.compute_offset(&mut a);
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn box_stays_in_extents() {
        let mut rng = ParticleRng::new(11);
        let shape = SpawnDistributor::boxed(3.0, 1.5);
        for _ in 0..SAMPLES {
            let (dx, dy) = shape.compute_offset(&mut rng);
            assert!(dx >= -3.0 && dx <= 3.0);
            assert!(dy >= -1.5 && dy <= 1.5);
        }
    }

    #[test]
    fn circle_interior_is_bounded_and_area_uniform() {
        let r = 4.0;
        let mut rng = ParticleRng::new(2024);
        let shape = SpawnDistributor::circle(r, false);
        let mut bins = [0usize; 10];
        for _ in 0..SAMPLES {
            let m = magnitude(shape.compute_offset(&mut rng));
            assert!(m <= r + 1e-4);
            // Area-uniform ⇔ m²/r² uniform on [0, 1)
            let bin = ((m * m) / (r * r) * 10.0) as usize;
            bins[bin.min(9)] += 1;
        }
        let expected = SAMPLES / 10;
        for count in bins {
            assert!(
                count.abs_diff(expected) < expected / 5,
                "bin count {count} too far from {expected}"
            );
        }
    }

    #[test]
    fn circle_edge_only_lands_on_rim() {
        let r = 2.5;
        let mut rng = ParticleRng::new(9);
        let shape = SpawnDistributor::circle(r, true);
        for _ in 0..SAMPLES {
            let m = magnitude(shape.compute_offset(&mut rng));
            assert!((m - r).abs() < 1e-4 * r, "magnitude {m} off rim {r}");
        }
    }

    #[test]
    fn cone_stays_within_spread() {
        let mut rng = ParticleRng::new(77);
        let shape = SpawnDistributor::cone(5.0, 90.0, 60.0, false);
        for _ in 0..SAMPLES {
            let (dx, dy) = shape.compute_offset(&mut rng);
            let m = magnitude((dx, dy));
            assert!(m <= 5.0 + 1e-4);
            if m > 1e-3 {
                let deg = dy.atan2(dx).to_degrees();
                assert!(deg >= 60.0 - 1e-2 && deg <= 120.0 + 1e-2, "angle {deg}");
            }
        }
    }

    #[test]
    fn cone_zero_spread_follows_direction() {
        let mut rng = ParticleRng::new(4);
        let shape = SpawnDistributor::cone(1.0, 0.0, 0.0, true);
        let (dx, dy) = shape.compute_offset(&mut rng);
        assert!((dx - 1.0).abs() < 1e-6);
        assert!(dy.abs() < 1e-6);
    }

    #[test]
    fn rect_edge_is_on_perimeter() {
        let (hw, hh) = (2.0, 1.0);
        let mut rng = ParticleRng::new(31);
        let shape = SpawnDistributor::rect_edge(hw, hh);
        let mut edges = [0usize; 4];
        for _ in 0..SAMPLES {
            let (dx, dy) = shape.compute_offset(&mut rng);
            let on_horizontal = (dy.abs() - hh).abs() < 1e-6 && dx.abs() <= hw;
            let on_vertical = (dx.abs() - hw).abs() < 1e-6 && dy.abs() <= hh;
            assert!(on_horizontal || on_vertical, "({dx}, {dy}) off perimeter");
            let edge = match (on_horizontal, dy < 0.0, dx < 0.0) {
                (true, true, _) => 0,
                (true, false, _) => 1,
                (false, _, true) => 2,
                (false, _, false) => 3,
            };
            edges[edge] += 1;
        }
        assert!(edges.iter().all(|&n| n > SAMPLES / 8));
    }

    #[test]
    fn ring_stays_in_annulus() {
        let mut rng = ParticleRng::new(123);
        let shape = SpawnDistributor::ring(2.0, 3.0);
        for _ in 0..SAMPLES {
            let m = magnitude(shape.compute_offset(&mut rng));
            assert!(m >= 2.0 - 1e-4 && m <= 3.0 + 1e-4, "magnitude {m}");
        }
    }

    #[test]
    fn radial_burst_is_fixed_radius() {
        let mut rng = ParticleRng::new(8);
        let shape = SpawnDistributor::radial_burst(6.0);
        for _ in 0..1000 {
            let m = magnitude(shape.compute_offset(&mut rng));
            assert!((m - 6.0).abs() < 1e-4);
        }
    }

    #[test]
    fn spiral_radius_tracks_angle() {
        let mut rng = ParticleRng::new(55);
        let shape = SpawnDistributor::spiral(10.0, 0.25);
        for _ in 0..1000 {
            let (dx, dy) = shape.compute_offset(&mut rng);
            let m = magnitude((dx, dy));
            assert!(m <= 10.0 + 1e-4);
            // With a quarter turn, t = m / max_radius and angle = t * 90°
            if m > 1e-2 {
                let expected = (m / 10.0) * 90.0;
                let deg = dy.atan2(dx).to_degrees();
                assert!((deg - expected).abs() < 0.05, "{deg} vs {expected}");
            }
        }
    }

    #[test]
    fn negative_distances_are_clamped() {
        assert_eq!(CircleShape::new(-1.0, false).radius(), 0.0);
        assert_eq!(BoxShape::new(-2.0, 3.0).half_extents(), (0.0, 3.0));
        assert_eq!(RectEdgeShape::new(1.0, f32::NAN).half_extents(), (1.0, 0.0));
        assert_eq!(RadialBurstShape::new(-4.0).radius(), 0.0);
        assert_eq!(SpiralShape::new(-1.0, 2.0).max_radius(), 0.0);
        assert_eq!(ConeShape::new(-3.0, 0.0, 30.0, false).radius(), 0.0);
        assert_eq!(CircleShape::new(f32::INFINITY, true).radius(), 0.0);
        assert_eq!(SpiralShape::new(5.0, f32::NAN).turns(), 0.0);
        let cone = ConeShape::new(1.0, f32::NAN, f32::INFINITY, false);
        assert_eq!((cone.direction_deg(), cone.spread_deg()), (0.0, 0.0));

        let mut circle = CircleShape::new(2.0, false);
        circle.set_radius(-5.0);
        assert_eq!(circle.radius(), 0.0);
    }

    #[test]
    fn ring_outer_raised_to_inner() {
        assert_eq!(RingShape::new(3.0, 1.0).radii(), (3.0, 3.0));
        let mut ring = RingShape::new(1.0, 2.0);
        ring.set_radii(-1.0, -2.0);
        assert_eq!(ring.radii(), (0.0, 0.0));
    }

    #[test]
    fn same_seed_same_offsets() {
        let shape = SpawnDistributor::ring(1.0, 4.0);
        let mut a = ParticleRng::new(99);
        let mut b = ParticleRng::new(99);
        for _ in 0..100 {
            assert_eq!(shape.compute_offset(&mut a), shape.compute_offset(&mut b));
        }
    }
}
