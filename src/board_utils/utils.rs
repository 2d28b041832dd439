use egui::{Pos2, Vec2};
use rand::Rng;

/// Linear remap of `t` from `[min_in, max_in]` to `[min_out, max_out]`, unclamped.
pub fn lerp(t: f64, min_in: f64, max_in: f64, min_out: f64, max_out: f64) -> f64 {
    if max_in == min_in {
        return max_out;
    }
    min_out + (t - min_in) * (max_out - min_out) / (max_in - min_in)
}

pub fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 { 2.0 * t * t } else { -1.0 + (4.0 - 2.0 * t) * t }
}

// Random point in one of the four diagonal quadrants around `center`, at least 70% of
// `magnitude` away on each axis so spawned bubbles do not land on the anchor.
pub fn random_pos_around_center<R: Rng + ?Sized>(rng: &mut R, center: Pos2, magnitude: f32) -> Pos2 {
    let mut offset = || {
        let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        sign * rng.gen_range(0.0f32..1.0).max(0.7) * magnitude
    };
    let dx = offset();
    let dy = offset();
    center + Vec2::new(dx, dy)
}
