//! Process-wide sine/cosine lookup table for degree angles
//!
//! 2048 steps over a full turn (about 0.18° per step). Indexing masks with
//! `SIZE - 1`, so any finite angle, negative or beyond 360°, wraps in O(1).

use std::f32::consts::TAU;
use std::sync::OnceLock;

pub const TABLE_SIZE: usize = 2048;
const MASK: i32 = TABLE_SIZE as i32 - 1;
const STEPS_PER_DEGREE: f32 = TABLE_SIZE as f32 / 360.0;

struct TrigTable {
    sin: [f32; TABLE_SIZE],
    cos: [f32; TABLE_SIZE],
}

fn table() -> &'static TrigTable {
    static TABLE: OnceLock<TrigTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut sin = [0.0; TABLE_SIZE];
        let mut cos = [0.0; TABLE_SIZE];
        for i in 0..TABLE_SIZE {
            let rad = i as f32 / TABLE_SIZE as f32 * TAU;
            sin[i] = rad.sin();
            cos[i] = rad.cos();
        }
        TrigTable { sin, cos }
    })
}

fn index(degrees: f32) -> usize {
    ((degrees * STEPS_PER_DEGREE) as i32 & MASK) as usize
}

pub fn sin_deg(degrees: f32) -> f32 {
    table().sin[index(degrees)]
}

pub fn cos_deg(degrees: f32) -> f32 {
    table().cos[index(degrees)]
}

/// `(sin, cos)` from a single index computation
pub fn sin_cos_deg(degrees: f32) -> (f32, f32) {
    let t = table();
    let i = index(degrees);
    (t.sin[i], t.cos[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One table step in radians bounds the lookup error
    const STEP: f32 = TAU / TABLE_SIZE as f32;

    #[test]
    fn matches_std_within_one_step() {
        let mut deg = -720.0f32;
        while deg <= 720.0 {
            let (s, c) = sin_cos_deg(deg);
            let rad = deg.to_radians();
            assert!((s - rad.sin()).abs() <= STEP + 1e-5, "sin({deg})");
            assert!((c - rad.cos()).abs() <= STEP + 1e-5, "cos({deg})");
            deg += 0.37;
        }
    }

    #[test]
    fn cardinal_angles_are_exact_entries() {
        assert_eq!(sin_deg(0.0), 0.0);
        assert_eq!(cos_deg(0.0), 1.0);
        assert!((sin_deg(90.0) - 1.0).abs() < 1e-6);
        assert!(cos_deg(90.0).abs() < 1e-6);
        assert!((cos_deg(180.0) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn wraps_full_turns() {
        assert_eq!(sin_deg(30.0), sin_deg(390.0));
        assert_eq!(cos_deg(-90.0), cos_deg(270.0));
    }
}
