use egui::{Pos2, Rect};

use crate::board_utils::color::Color;
use crate::physics::{BodyId, BodyOptions, PhysicsWorld};

pub const ANCHOR_FILL: Color = Color::rgb(0x29, 0x26, 0x2D);
pub const ANCHOR_FILL_PRESSED: Color = Color::rgb(0x50, 0x50, 0x5F);
const PLUS_FONT_SIZE: f32 = 80.0;

/// The static "+" button at the centre of the pristine frame. Bubbles are
/// attracted towards it and tapping it starts a new task.
#[derive(Clone, Debug)]
pub struct AddButtonAnchor {
    body: BodyId,
    pressed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnchorDraw {
    pub center: Pos2,
    pub radius: f32,
    pub fill: Color,
    pub plus_font_size: f32,
}

impl AddButtonAnchor {
    pub fn new<W: PhysicsWorld + ?Sized>(world: &mut W, initial: Rect) -> Self {
        let body = world.create_circle(initial.center(), Self::radius_for(initial), BodyOptions::fixed());
        Self { body, pressed: false }
    }

    pub fn radius_for(initial: Rect) -> f32 {
        initial.width() * 0.025 + initial.height() * 0.025
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn position<W: PhysicsWorld + ?Sized>(&self, world: &W) -> Pos2 {
        world.position(self.body).unwrap_or_default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn start_press(&mut self) {
        self.pressed = true;
    }

    pub fn end_press(&mut self) {
        self.pressed = false;
    }

    /// Re-centre after the canvas changed size.
    pub fn relocate<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, initial: Rect) {
        world.set_position(self.body, initial.center());
        if let Some(r) = world.radius(self.body) {
            let target = Self::radius_for(initial);
            if r > 0.0 {
                world.scale_body(self.body, target / r);
            }
        }
    }

    pub fn draw_params<W: PhysicsWorld + ?Sized>(
        &self,
        world: &W,
        viewport: &crate::board_utils::viewport::ViewportController,
    ) -> AnchorDraw {
        let scale = viewport.view_scale();
        AnchorDraw {
            center: viewport.to_screen(self.position(world)),
            radius: world.radius(self.body).unwrap_or_default() * scale,
            fill: if self.pressed { ANCHOR_FILL_PRESSED } else { ANCHOR_FILL },
            plus_font_size: PLUS_FONT_SIZE * scale,
        }
    }
}
