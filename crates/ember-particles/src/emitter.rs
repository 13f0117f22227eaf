//! Emitter configuration: emission rate, randomized ranges, forces and looks
//!
//! Every `min`/`max` pair is kept ordered by its setter (the max is raised to
//! the min), and rates, lifetimes, speeds and sizes are clamped to be
//! non-negative. Nothing non-finite is ever stored: NaN becomes 0, signed
//! values that are infinite become 0, and non-negative ones saturate at
//! `f32::MAX`. Setters return `&mut Self` so tuning code can chain them.

use crate::distributor::SpawnDistributor;
use ember_core::{Color, Result, TextureRegion};

fn non_negative(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, f32::MAX)
    }
}

fn finite(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Order a range by raising `max` to `min`
fn ordered(min: f32, max: f32) -> (f32, f32) {
    let (min, max) = (finite(min), finite(max));
    (min, max.max(min))
}

/// Add `amount` to a fractional accumulator and take out the whole part.
/// An overflowing sum saturates the count and empties the accumulator, so the
/// accumulator itself always stays finite.
pub(crate) fn take_whole(accumulator: &mut f32, amount: f32) -> u32 {
    let total = *accumulator + amount;
    if !total.is_finite() {
        *accumulator = 0.0;
        return if total > 0.0 { u32::MAX } else { 0 };
    }
    let whole = total.floor();
    *accumulator = total - whole;
    whole as u32
}

/// Parameters for one particle system's emitter
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    emission_rate: f32,
    /// Fractional particles carried between frames
    spawn_accumulator: f32,
    life_min: f32,
    life_max: f32,
    speed_min: f32,
    speed_max: f32,
    angle_min_deg: f32,
    angle_max_deg: f32,
    gravity_y: f32,
    wind_x: f32,
    base_width: f32,
    base_height: f32,
    start_scale: f32,
    end_scale: f32,
    start_rot_min_deg: f32,
    start_rot_max_deg: f32,
    rot_speed_min: f32,
    rot_speed_max: f32,
    start_color: Color,
    end_color: Color,
    texture_region: Option<TextureRegion>,
    distributor: SpawnDistributor,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            emission_rate: 10.0,
            spawn_accumulator: 0.0,
            life_min: 1.0,
            life_max: 2.0,
            speed_min: 50.0,
            speed_max: 100.0,
            angle_min_deg: 0.0,
            angle_max_deg: 360.0,
            gravity_y: 0.0,
            wind_x: 0.0,
            base_width: 16.0,
            base_height: 16.0,
            start_scale: 1.0,
            end_scale: 0.0,
            start_rot_min_deg: 0.0,
            start_rot_max_deg: 0.0,
            rot_speed_min: 0.0,
            rot_speed_max: 0.0,
            start_color: Color::WHITE,
            end_color: Color::TRANSPARENT,
            texture_region: None,
            distributor: SpawnDistributor::Point,
        }
    }
}

impl EmitterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Getters ──

    pub fn emission_rate(&self) -> f32 {
        self.emission_rate
    }

    pub fn spawn_accumulator(&self) -> f32 {
        self.spawn_accumulator
    }

    pub fn life_range(&self) -> (f32, f32) {
        (self.life_min, self.life_max)
    }

    pub fn speed_range(&self) -> (f32, f32) {
        (self.speed_min, self.speed_max)
    }

    pub fn angle_range_deg(&self) -> (f32, f32) {
        (self.angle_min_deg, self.angle_max_deg)
    }

    pub fn gravity_y(&self) -> f32 {
        self.gravity_y
    }

    pub fn wind_x(&self) -> f32 {
        self.wind_x
    }

    pub fn base_size(&self) -> (f32, f32) {
        (self.base_width, self.base_height)
    }

    pub fn scale_range(&self) -> (f32, f32) {
        (self.start_scale, self.end_scale)
    }

    pub fn start_rotation_range_deg(&self) -> (f32, f32) {
        (self.start_rot_min_deg, self.start_rot_max_deg)
    }

    pub fn rotation_speed_range_deg(&self) -> (f32, f32) {
        (self.rot_speed_min, self.rot_speed_max)
    }

    pub fn start_color(&self) -> Color {
        self.start_color
    }

    pub fn end_color(&self) -> Color {
        self.end_color
    }

    pub fn texture_region(&self) -> Option<TextureRegion> {
        self.texture_region
    }

    pub fn distributor(&self) -> &SpawnDistributor {
        &self.distributor
    }

    // ── Setters ──

    /// Particles per second of continuous emission
    pub fn set_emission_rate(&mut self, rate: f32) -> &mut Self {
        self.emission_rate = non_negative(rate);
        self
    }

    /// Lifetime range in seconds
    pub fn set_life(&mut self, min: f32, max: f32) -> &mut Self {
        (self.life_min, self.life_max) = ordered(non_negative(min), non_negative(max));
        self
    }

    /// Initial speed range in units per second
    pub fn set_speed(&mut self, min: f32, max: f32) -> &mut Self {
        (self.speed_min, self.speed_max) = ordered(non_negative(min), non_negative(max));
        self
    }

    /// Launch direction range, degrees counter-clockwise from +X
    pub fn set_angle_deg(&mut self, min: f32, max: f32) -> &mut Self {
        (self.angle_min_deg, self.angle_max_deg) = ordered(min, max);
        self
    }

    /// Constant vertical acceleration
    pub fn set_gravity_y(&mut self, gravity_y: f32) -> &mut Self {
        self.gravity_y = finite(gravity_y);
        self
    }

    /// Constant horizontal acceleration
    pub fn set_wind_x(&mut self, wind_x: f32) -> &mut Self {
        self.wind_x = finite(wind_x);
        self
    }

    /// Unscaled quad size
    pub fn set_base_size(&mut self, width: f32, height: f32) -> &mut Self {
        self.base_width = non_negative(width);
        self.base_height = non_negative(height);
        self
    }

    /// Scale at birth and at death. Not a range: `end` may be below `start`.
    pub fn set_scale(&mut self, start: f32, end: f32) -> &mut Self {
        self.start_scale = non_negative(start);
        self.end_scale = non_negative(end);
        self
    }

    pub fn set_start_rotation_deg(&mut self, min: f32, max: f32) -> &mut Self {
        (self.start_rot_min_deg, self.start_rot_max_deg) = ordered(min, max);
        self
    }

    pub fn set_rotation_speed_deg(&mut self, min: f32, max: f32) -> &mut Self {
        (self.rot_speed_min, self.rot_speed_max) = ordered(min, max);
        self
    }

    pub fn set_start_color(&mut self, color: Color) -> &mut Self {
        self.start_color = color;
        self
    }

    pub fn set_end_color(&mut self, color: Color) -> &mut Self {
        self.end_color = color;
        self
    }

    pub fn set_colors(&mut self, start: Color, end: Color) -> &mut Self {
        self.start_color = start;
        self.end_color = end;
        self
    }

    /// Restrict drawing to a sub-rectangle of the shared texture
    pub fn set_texture_region(&mut self, region: Option<TextureRegion>) -> &mut Self {
        self.texture_region = region;
        self
    }

    pub fn set_distributor(&mut self, distributor: SpawnDistributor) -> &mut Self {
        self.distributor = distributor;
        self
    }

    /// Shape parameters stay clamped through the shape setters
    pub fn distributor_mut(&mut self) -> &mut SpawnDistributor {
        &mut self.distributor
    }

    // ── Owned by the particle system ──

    /// Advance continuous emission by `delta` seconds and return how many whole
    /// particles are due. The fractional remainder carries to the next frame.
    pub(crate) fn accumulate_spawns(&mut self, delta: f32) -> u32 {
        take_whole(&mut self.spawn_accumulator, delta * self.emission_rate)
    }

    pub(crate) fn reset_accumulator(&mut self) {
        self.spawn_accumulator = 0.0;
    }

    // ── TOML presets ──

    /// Build a config from a TOML preset table. Missing keys keep their
    /// defaults, and every value goes through the clamping setters.
    pub fn from_toml(table: &toml::value::Table) -> Self {
        let mut config = Self::default();

        if let Some(v) = table.get("emission_rate") {
            config.set_emission_rate(toml_f32(v, config.emission_rate));
        }

        let (min, max) = toml_pair(table, "life_min", "life_max", config.life_range());
        config.set_life(min, max);
        let (min, max) = toml_pair(table, "speed_min", "speed_max", config.speed_range());
        config.set_speed(min, max);
        let (min, max) = toml_pair(table, "angle_min", "angle_max", config.angle_range_deg());
        config.set_angle_deg(min, max);

        if let Some(v) = table.get("gravity_y") {
            config.set_gravity_y(toml_f32(v, config.gravity_y));
        }
        if let Some(v) = table.get("wind_x") {
            config.set_wind_x(toml_f32(v, config.wind_x));
        }

        let (w, h) = toml_pair(table, "base_width", "base_height", config.base_size());
        config.set_base_size(w, h);
        let (start, end) = toml_pair(table, "start_scale", "end_scale", config.scale_range());
        config.set_scale(start, end);
        let (min, max) = toml_pair(
            table,
            "start_rotation_min",
            "start_rotation_max",
            config.start_rotation_range_deg(),
        );
        config.set_start_rotation_deg(min, max);
        let (min, max) = toml_pair(
            table,
            "rotation_speed_min",
            "rotation_speed_max",
            config.rotation_speed_range_deg(),
        );
        config.set_rotation_speed_deg(min, max);

        if let Some(v) = table.get("start_color") {
            config.set_start_color(toml_color(v, config.start_color));
        }
        if let Some(v) = table.get("end_color") {
            config.set_end_color(toml_color(v, config.end_color));
        }
        if let Some(v) = table.get("texture_region") {
            config.set_texture_region(toml_region(v));
        }

        config.set_distributor(toml_distributor(table));
        config
    }

    /// Parse a preset from TOML source text
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let table: toml::value::Table = toml::from_str(source)?;
        let config = Self::from_toml(&table);
        log::info!(
            "Loaded emitter preset: rate={} shape={}",
            config.emission_rate,
            config.distributor.name()
        );
        Ok(config)
    }
}

// ── TOML helpers (handle integer/float coercion) ──

fn toml_f32(v: &toml::Value, default: f32) -> f32 {
    v.as_float()
        .map(|f| f as f32)
        .or_else(|| v.as_integer().map(|i| i as f32))
        .unwrap_or(default)
}

fn toml_pair(
    table: &toml::value::Table,
    first_key: &str,
    second_key: &str,
    default: (f32, f32),
) -> (f32, f32) {
    let first = table
        .get(first_key)
        .map(|v| toml_f32(v, default.0))
        .unwrap_or(default.0);
    let second = table
        .get(second_key)
        .map(|v| toml_f32(v, default.1))
        .unwrap_or(default.1);
    (first, second)
}

/// `[r, g, b]`, `[r, g, b, a]` or a `0xRRGGBB` integer; alpha defaults to 1
fn toml_color(v: &toml::Value, default: Color) -> Color {
    if let Some(hex) = v.as_integer() {
        return Color::from_hex(hex.clamp(0, 0xFF_FFFF) as u32);
    }
    if let Some(arr) = v.as_array() {
        if arr.len() >= 3 {
            return Color::new(
                toml_f32(&arr[0], default.r),
                toml_f32(&arr[1], default.g),
                toml_f32(&arr[2], default.b),
                arr.get(3).map(|a| toml_f32(a, 1.0)).unwrap_or(1.0),
            );
        }
    }
    default
}

/// `[x, y, width, height]` in pixels
fn toml_region(v: &toml::Value) -> Option<TextureRegion> {
    let arr = v.as_array()?;
    if arr.len() < 4 {
        return None;
    }
    let px = |i: usize| arr[i].as_integer().map(|n| n.max(0) as u32);
    Some(TextureRegion::new(px(0)?, px(1)?, px(2)?, px(3)?))
}

fn toml_distributor(table: &toml::value::Table) -> SpawnDistributor {
    let shape = table
        .get("shape")
        .and_then(|v| v.as_str())
        .unwrap_or("point");
    let param = |key: &str, default: f32| {
        table
            .get(key)
            .map(|v| toml_f32(v, default))
            .unwrap_or(default)
    };
    let edge_only = table
        .get("shape_edge_only")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    match shape {
        "box" => SpawnDistributor::boxed(
            param("shape_half_width", 10.0),
            param("shape_half_height", 10.0),
        ),
        "circle" => SpawnDistributor::circle(param("shape_radius", 10.0), edge_only),
        "cone" => SpawnDistributor::cone(
            param("shape_radius", 10.0),
            param("shape_direction", 90.0),
            param("shape_spread", 30.0),
            edge_only,
        ),
        "rect_edge" => SpawnDistributor::rect_edge(
            param("shape_half_width", 10.0),
            param("shape_half_height", 10.0),
        ),
        "ring" => SpawnDistributor::ring(
            param("shape_inner_radius", 5.0),
            param("shape_radius", 10.0),
        ),
        "burst" => SpawnDistributor::radial_burst(param("shape_radius", 10.0)),
        "spiral" => {
            SpawnDistributor::spiral(param("shape_radius", 10.0), param("shape_turns", 2.0))
        }
        _ => SpawnDistributor::Point,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = EmitterConfig::default();
        assert!(config.emission_rate() > 0.0);
        let (min, max) = config.life_range();
        assert!(max >= min);
        assert_eq!(config.spawn_accumulator(), 0.0);
        assert_eq!(*config.distributor(), SpawnDistributor::Point);
    }

    #[test]
    fn setters_raise_max_to_min() {
        let mut config = EmitterConfig::new();
        config
            .set_life(3.0, 1.0)
            .set_speed(10.0, 5.0)
            .set_angle_deg(90.0, 45.0)
            .set_start_rotation_deg(10.0, -10.0)
            .set_rotation_speed_deg(-5.0, -20.0);
        assert_eq!(config.life_range(), (3.0, 3.0));
        assert_eq!(config.speed_range(), (10.0, 10.0));
        assert_eq!(config.angle_range_deg(), (90.0, 90.0));
        assert_eq!(config.start_rotation_range_deg(), (10.0, 10.0));
        assert_eq!(config.rotation_speed_range_deg(), (-5.0, -5.0));
    }

    #[test]
    fn negative_values_are_clamped() {
        let mut config = EmitterConfig::new();
        config
            .set_emission_rate(-4.0)
            .set_life(-1.0, -0.5)
            .set_speed(-3.0, 2.0)
            .set_base_size(-8.0, 4.0)
            .set_scale(-1.0, f32::NAN);
        assert_eq!(config.emission_rate(), 0.0);
        assert_eq!(config.life_range(), (0.0, 0.0));
        assert_eq!(config.speed_range(), (0.0, 2.0));
        assert_eq!(config.base_size(), (0.0, 4.0));
        assert_eq!(config.scale_range(), (0.0, 0.0));
    }

    #[test]
    fn non_finite_values_are_clamped() {
        let mut config = EmitterConfig::new();
        config
            .set_emission_rate(f32::INFINITY)
            .set_angle_deg(f32::NAN, 10.0)
            .set_start_rotation_deg(f32::NEG_INFINITY, f32::NAN)
            .set_rotation_speed_deg(5.0, f32::INFINITY)
            .set_gravity_y(f32::NAN)
            .set_wind_x(f32::NEG_INFINITY)
            .set_life(1.0, f32::INFINITY);
        assert_eq!(config.emission_rate(), f32::MAX);
        assert_eq!(config.angle_range_deg(), (0.0, 10.0));
        assert_eq!(config.start_rotation_range_deg(), (0.0, 0.0));
        assert_eq!(config.rotation_speed_range_deg(), (5.0, 5.0));
        assert_eq!(config.gravity_y(), 0.0);
        assert_eq!(config.wind_x(), 0.0);
        assert_eq!(config.life_range(), (1.0, f32::MAX));
    }

    #[test]
    fn saturated_rate_keeps_accumulator_finite() {
        let mut config = EmitterConfig::new();
        config.set_emission_rate(f32::INFINITY);
        assert_eq!(config.accumulate_spawns(2.0), u32::MAX);
        assert_eq!(config.spawn_accumulator(), 0.0);

        // Emission recovers as soon as the rate is sane again
        config.set_emission_rate(10.0);
        assert_eq!(config.accumulate_spawns(0.25), 2);
        assert!((config.spawn_accumulator() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn take_whole_saturates_on_overflow() {
        let mut acc = 0.75;
        assert_eq!(take_whole(&mut acc, f32::MAX * 2.0), u32::MAX);
        assert_eq!(acc, 0.0);
        assert_eq!(take_whole(&mut acc, 1.5), 1);
        assert!((acc - 0.5).abs() < 1e-6);
    }

    #[test]
    fn scale_may_shrink() {
        let mut config = EmitterConfig::new();
        config.set_scale(2.0, 0.5);
        assert_eq!(config.scale_range(), (2.0, 0.5));
    }

    #[test]
    fn accumulator_carries_fraction() {
        let mut config = EmitterConfig::new();
        config.set_emission_rate(10.0);
        assert_eq!(config.accumulate_spawns(0.25), 2);
        assert!((config.spawn_accumulator() - 0.5).abs() < 1e-6);
        assert_eq!(config.accumulate_spawns(0.05), 1);
        assert!(config.spawn_accumulator().abs() < 1e-6);
        config.reset_accumulator();
        assert_eq!(config.spawn_accumulator(), 0.0);
    }

    #[test]
    fn distributor_mut_keeps_clamping() {
        let mut config = EmitterConfig::new();
        config.set_distributor(SpawnDistributor::circle(5.0, false));
        if let SpawnDistributor::Circle(circle) = config.distributor_mut() {
            circle.set_radius(-2.0);
        }
        match config.distributor() {
            SpawnDistributor::Circle(circle) => assert_eq!(circle.radius(), 0.0),
            other => panic!("Expected Circle, got {other:?}"),
        }
    }

    #[test]
    fn parse_from_toml() {
        let toml_str = r#"
emission_rate = 50
life_min = 0.5
life_max = 1.5
angle_min = 60
angle_max = 120
gravity_y = -98.0
base_width = 8
base_height = 4
start_color = [1.0, 0.5, 0.0]
end_color = [1.0, 0.0, 0.0, 0.0]
texture_region = [32, 0, 32, 32]
shape = "cone"
shape_spread = 45.0
shape_edge_only = true
"#;
        let config = EmitterConfig::from_toml_str(toml_str).unwrap();
        assert!((config.emission_rate() - 50.0).abs() < 0.01);
        assert_eq!(config.life_range(), (0.5, 1.5));
        assert_eq!(config.angle_range_deg(), (60.0, 120.0));
        assert!((config.gravity_y() + 98.0).abs() < 0.01);
        assert_eq!(config.base_size(), (8.0, 4.0));
        assert_eq!(config.start_color(), Color::new(1.0, 0.5, 0.0, 1.0));
        assert_eq!(config.end_color().a, 0.0);
        assert_eq!(
            config.texture_region(),
            Some(TextureRegion::new(32, 0, 32, 32))
        );
        match config.distributor() {
            SpawnDistributor::Cone(cone) => {
                assert!((cone.spread_deg() - 45.0).abs() < 0.01);
                assert!((cone.direction_deg() - 90.0).abs() < 0.01);
            }
            other => panic!("Expected Cone shape, got {other:?}"),
        }
    }

    #[test]
    fn toml_values_pass_through_setters() {
        let config = EmitterConfig::from_toml_str(
            "emission_rate = -5\nlife_min = 2.0\nlife_max = 1.0\nshape = \"ring\"\nshape_inner_radius = 8\nshape_radius = 4",
        )
        .unwrap();
        assert_eq!(config.emission_rate(), 0.0);
        assert_eq!(config.life_range(), (2.0, 2.0));
        assert_eq!(*config.distributor(), SpawnDistributor::ring(8.0, 8.0));
    }

    #[test]
    fn hex_color_from_toml() {
        let config = EmitterConfig::from_toml_str("start_color = 0xFF0000").unwrap();
        assert_eq!(config.start_color(), Color::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(config.end_color(), Color::TRANSPARENT);
    }

    #[test]
    fn unknown_shape_falls_back_to_point() {
        let config = EmitterConfig::from_toml_str("shape = \"hexagon\"").unwrap();
        assert_eq!(*config.distributor(), SpawnDistributor::Point);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(EmitterConfig::from_toml_str("emission_rate = = 3").is_err());
    }
}
