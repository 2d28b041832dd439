use egui::{Pos2, Rect, Vec2};

const WHEEL_ZOOM_FACTOR: f32 = 1.2;
const TOUCH_PAN_INTENSITY: f32 = 1.2;
// relative tolerance when comparing bounds against the pristine frame
const FRAME_EPSILON: f32 = 1e-4;

/// Visible world region plus the gesture bookkeeping that moves it.
///
/// World coordinates coincide with canvas pixels at startup: `initial` is the
/// canvas rectangle anchored at the origin and is the outermost region the view
/// may ever show.
#[derive(Clone, Debug)]
pub struct ViewportController {
    initial: Rect,
    bounds: Rect,
    mouse_drag: Option<Pos2>,
    pinch_distance: f32,
    touch_midpoint: Pos2,
    touch_gesture: bool,
}

impl ViewportController {
    pub fn new(canvas_size: Vec2) -> Self {
        let initial = Rect::from_min_size(Pos2::ZERO, canvas_size.max(Vec2::splat(1.0)));
        Self {
            initial,
            bounds: initial,
            mouse_drag: None,
            pinch_distance: 0.0,
            touch_midpoint: Pos2::ZERO,
            touch_gesture: false,
        }
    }

    pub fn initial_bounds(&self) -> Rect {
        self.initial
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn is_zoomed(&self) -> bool {
        let (cur, init) = (self.bounds.size(), self.initial.size());
        (cur.x - init.x).abs() > init.x * FRAME_EPSILON || (cur.y - init.y).abs() > init.y * FRAME_EPSILON
    }

    pub fn is_touch_gesture(&self) -> bool {
        self.touch_gesture
    }

    /// Ratio between the pristine and the current frame; 1 when not zoomed.
    pub fn view_scale(&self) -> f32 {
        let (cur, init) = (self.bounds.size(), self.initial.size());
        (init.x / cur.x).min(init.y / cur.y)
    }

    pub fn to_screen(&self, world: Pos2) -> Pos2 {
        ((world - self.bounds.min) * self.view_scale()).to_pos2()
    }

    pub fn from_screen(&self, screen: Pos2) -> Pos2 {
        self.bounds.min + screen.to_vec2() / self.view_scale()
    }

    pub fn reset(&mut self) {
        self.bounds = self.initial;
    }

    /// Scale the frame by `factor` (< 1 zooms in) keeping the point at the
    /// normalized screen position `focal` fixed. A frame that would reach the
    /// pristine size snaps back to it.
    pub fn zoom(&mut self, factor: f32, focal: Vec2) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let size = self.bounds.size();
        let new_size = size * factor;
        let init = self.initial.size();
        if new_size.x >= init.x * (1.0 - FRAME_EPSILON) || new_size.y >= init.y * (1.0 - FRAME_EPSILON) {
            self.reset();
            return;
        }
        let focal = focal.clamp(Vec2::ZERO, Vec2::splat(1.0));
        let anchor = self.bounds.min + size * focal;
        let min = anchor - (anchor - self.bounds.min) * factor;
        self.bounds = Rect::from_min_size(min, new_size);
        self.keep_inside();
    }

    /// Move the frame by a screen-space delta; content follows the pointer.
    pub fn pan(&mut self, screen_delta: Vec2) {
        let world_delta = screen_delta / self.view_scale();
        self.bounds = self.bounds.translate(-world_delta);
        self.keep_inside();
    }

    /// Mouse wheel step. `towards_viewer` is a scroll up, which zooms in.
    pub fn wheel(&mut self, towards_viewer: bool, pointer: Pos2) {
        let factor = if towards_viewer { 1.0 / WHEEL_ZOOM_FACTOR } else { WHEEL_ZOOM_FACTOR };
        self.zoom(factor, self.normalized(pointer));
    }

    /// Middle-button drag only pans when zoomed in on both axes.
    pub fn begin_drag(&mut self, pointer: Pos2) -> bool {
        let (cur, init) = (self.bounds.size(), self.initial.size());
        if cur.x < init.x && cur.y < init.y {
            self.mouse_drag = Some(pointer);
            true
        } else {
            false
        }
    }

    pub fn drag_to(&mut self, pointer: Pos2) {
        if let Some(last) = self.mouse_drag {
            self.pan(pointer - last);
            self.mouse_drag = Some(pointer);
        }
    }

    pub fn end_drag(&mut self) {
        self.mouse_drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.mouse_drag.is_some()
    }

    /// Returns true when the touches start a two-finger gesture; the caller
    /// then detaches direct manipulation until [`Self::touch_end`].
    pub fn touch_start(&mut self, touches: &[Pos2]) -> bool {
        if let [a, b, ..] = touches {
            self.touch_gesture = true;
            self.pinch_distance = a.distance(*b);
            self.touch_midpoint = midpoint(*a, *b);
            true
        } else {
            false
        }
    }

    /// Pinch zoom around the finger midpoint combined with midpoint panning.
    pub fn touch_move(&mut self, touches: &[Pos2]) {
        let [a, b, ..] = touches else { return };
        if !self.touch_gesture {
            self.touch_start(touches);
            return;
        }
        let distance = a.distance(*b);
        let mid = midpoint(*a, *b);
        if distance > f32::EPSILON && self.pinch_distance > f32::EPSILON {
            self.zoom(self.pinch_distance / distance, self.normalized(mid));
        }
        self.pinch_distance = distance;
        let delta = (mid - self.touch_midpoint) * TOUCH_PAN_INTENSITY;
        self.touch_midpoint = mid;
        self.pan(delta);
    }

    /// Returns true when the last finger lifted and direct manipulation may resume.
    pub fn touch_end(&mut self, remaining: usize) -> bool {
        if remaining == 0 {
            self.pinch_distance = 0.0;
            self.mouse_drag = None;
            self.touch_gesture = false;
            true
        } else {
            false
        }
    }

    fn normalized(&self, screen: Pos2) -> Vec2 {
        let size = self.initial.size();
        Vec2::new(screen.x / size.x, screen.y / size.y)
    }

    // translate back inside the pristine frame; size is never larger than it
    fn keep_inside(&mut self) {
        let mut shift = Vec2::ZERO;
        if self.bounds.min.x < self.initial.min.x {
            shift.x = self.initial.min.x - self.bounds.min.x;
        } else if self.bounds.max.x > self.initial.max.x {
            shift.x = self.initial.max.x - self.bounds.max.x;
        }
        if self.bounds.min.y < self.initial.min.y {
            shift.y = self.initial.min.y - self.bounds.min.y;
        } else if self.bounds.max.y > self.initial.max.y {
            shift.y = self.initial.max.y - self.bounds.max.y;
        }
        self.bounds = self.bounds.translate(shift);
    }
}

fn midpoint(a: Pos2, b: Pos2) -> Pos2 {
    a.lerp(b, 0.5)
}
