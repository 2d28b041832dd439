use egui::{Color32, Context, Id, Painter, Pos2, Stroke};

use crate::board_utils::color::Color;
use crate::board_utils::utils::ease_in_out_quad;

/// Side effects of popping a bubble that the board does not render itself.
pub trait Feedback {
    fn play_pop_sound(&mut self);
    /// `center` is in screen space, `size` is the popped bubble's on-screen radius.
    fn play_pop_animation(&mut self, center: Pos2, size: f32, color: Color);
}

/// Headless feedback: only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingFeedback;

impl Feedback for LoggingFeedback {
    fn play_pop_sound(&mut self) {
        log::debug!("pop");
    }

    fn play_pop_animation(&mut self, center: Pos2, size: f32, color: Color) {
        log::debug!("pop animation at {center:?} size {size:.1} color {color}");
    }
}

const RING_SECONDS: f64 = 0.6;
const RING_GROWTH: f32 = 0.8;

#[derive(Clone, Debug)]
struct PopRing {
    center: Pos2,
    size: f32,
    color: Color,
    started: f64,
}

fn rings_id() -> Id {
    Id::new("bubble_board_pop_rings")
}

/// Pop rings kept in the egui context so the frontend can paint them after the
/// board recorded them during input handling.
#[derive(Clone)]
pub struct EguiFeedback {
    ctx: Context,
    sounds_enabled: bool,
}

impl EguiFeedback {
    pub fn new(ctx: Context, sounds_enabled: bool) -> Self {
        Self { ctx, sounds_enabled }
    }
}

impl Feedback for EguiFeedback {
    fn play_pop_sound(&mut self) {
        if self.sounds_enabled {
            // no audio backend on desktop, keep the cue visible in the logs
            log::debug!("pop");
        }
    }

    fn play_pop_animation(&mut self, center: Pos2, size: f32, color: Color) {
        let started = self.ctx.input(|i| i.time);
        self.ctx.data_mut(|d| {
            d.get_temp_mut_or_default::<Vec<PopRing>>(rings_id())
                .push(PopRing { center, size, color, started });
        });
        self.ctx.request_repaint();
    }
}

/// Paint and expire the pending pop rings.
pub fn paint_pop_rings(ctx: &Context, painter: &Painter) {
    let now = ctx.input(|i| i.time);
    let rings: Vec<PopRing> = ctx.data_mut(|d| {
        let rings = d.get_temp_mut_or_default::<Vec<PopRing>>(rings_id());
        rings.retain(|r| now - r.started < RING_SECONDS);
        rings.clone()
    });
    if rings.is_empty() {
        return;
    }
    for ring in &rings {
        let t = ((now - ring.started) / RING_SECONDS).clamp(0.0, 1.0) as f32;
        let eased = ease_in_out_quad(t);
        let radius = ring.size * (1.0 + eased * RING_GROWTH);
        let fade = Color { a: ring.color.a * (1.0 - t), ..ring.color };
        let width = (ring.size * 0.15 * (1.0 - eased)).max(1.0);
        painter.circle_stroke(ring.center, radius, Stroke::new(width, Color32::from(fade)));
    }
    ctx.request_repaint();
}
