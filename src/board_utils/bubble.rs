use egui::Pos2;
use time::Date;

use crate::board_utils::color::Color;
use crate::board_utils::text::{self, MAX_TITLE_LINES, TextMeasure};
use crate::board_utils::utils::lerp;
use crate::board_utils::viewport::ViewportController;
use crate::physics::{BodyId, BodyOptions, PhysicsWorld};

pub type TaskId = u64;

pub const DEFAULT_TASK_TITLE: &str = "Task Name";
pub const DEFAULT_BUBBLE_SIZE: f32 = 100.0;
const COMPLETED_MARK: &str = " \u{2714}";

/// Plain data of one task, as persisted. Carries no physics.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskRecord {
    pub identifier: TaskId,
    pub title: String,
    /// `YYYY-MM-DDTHH:MM`, empty when unset
    pub date: String,
    pub color: Color,
    pub scale: f32,
    pub completed: bool,
}

impl TaskRecord {
    pub fn has_placeholder_title(&self) -> bool {
        self.title == DEFAULT_TASK_TITLE
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outline {
    pub width: f32,
    pub color: Color,
}

/// Everything a renderer needs for one bubble, already in screen space.
#[derive(Clone, Debug, PartialEq)]
pub struct BubbleDraw {
    pub center: Pos2,
    pub radius: f32,
    pub fill: Color,
    pub gradient: (Color, Color),
    pub outline: Option<Outline>,
    pub title_lines: Vec<String>,
    pub title_font_size: f32,
    /// Vertical centre of the first title line.
    pub title_top: f32,
    pub date_lines: Vec<String>,
    pub date_font_size: f32,
    /// Top of the first date line.
    pub date_top: f32,
}

/// Press-and-hold outline settings.
#[derive(Clone, Copy, Debug)]
pub struct ChargeStyle {
    pub hold_delay_ms: f64,
    pub max_width: f32,
}

/// A task that currently owns a physical body.
#[derive(Clone, Debug)]
pub struct Bubble {
    record: TaskRecord,
    body: BodyId,
    fill: Color,
    press_started: Option<f64>,
    wrapped_title: Option<Vec<String>>,
}

impl Bubble {
    /// Create the body at `position`, sized so it matches siblings that have
    /// already been through `cluster_scaler` worth of auto-scaling.
    pub fn create<W: PhysicsWorld + ?Sized>(
        world: &mut W,
        record: TaskRecord,
        position: Pos2,
        cluster_scaler: f32,
    ) -> Self {
        let body = world.create_circle(position, DEFAULT_BUBBLE_SIZE, BodyOptions::bubble());
        world.scale_body(body, cluster_scaler * record.scale);
        let mut bubble = Self {
            fill: record.color,
            record,
            body,
            press_started: None,
            wrapped_title: None,
        };
        let color = bubble.record.color;
        bubble.set_color(color);
        bubble
    }

    pub fn id(&self) -> TaskId {
        self.record.identifier
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn record(&self) -> &TaskRecord {
        &self.record
    }

    pub fn into_record(self) -> TaskRecord {
        self.record
    }

    pub fn title(&self) -> &str {
        &self.record.title
    }

    pub fn date(&self) -> &str {
        &self.record.date
    }

    /// Canonical colour, never the disabled variant.
    pub fn color(&self) -> Color {
        self.record.color
    }

    /// Colour actually painted.
    pub fn fill(&self) -> Color {
        self.fill
    }

    pub fn scale(&self) -> f32 {
        self.record.scale
    }

    pub fn is_completed(&self) -> bool {
        self.record.completed
    }

    pub fn has_placeholder_title(&self) -> bool {
        self.record.has_placeholder_title()
    }

    pub fn position<W: PhysicsWorld + ?Sized>(&self, world: &W) -> Option<Pos2> {
        world.position(self.body)
    }

    pub fn set_color(&mut self, color: Color) {
        self.record.color = color;
        self.fill = if self.record.completed { color.disabled() } else { color };
    }

    pub fn set_title(&mut self, title: &str) {
        self.record.title = if title.is_empty() { DEFAULT_TASK_TITLE.to_string() } else { title.to_string() };
        self.wrapped_title = None;
    }

    pub fn set_date(&mut self, date: &str) {
        self.record.date = date.to_string();
    }

    /// Rescale relative to the current user scale; the body already carries
    /// the compounded cluster scaling.
    pub fn set_scale<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, scale: f32) {
        if !(scale.is_finite() && scale > 0.0) {
            return;
        }
        let ratio = scale / self.record.scale;
        world.scale_body(self.body, ratio);
        self.record.scale = scale;
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.record.completed = completed;
        let color = self.record.color;
        self.set_color(color);
        self.wrapped_title = None;
    }

    pub fn start_press(&mut self, now: f64) {
        self.press_started = Some(now);
    }

    pub fn is_pressing(&self) -> bool {
        self.press_started.is_some()
    }

    /// Stop charging and settle the body where it is.
    pub fn end_press<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        self.clear_outline();
        world.set_velocity(self.body, egui::Vec2::ZERO);
    }

    pub fn clear_outline(&mut self) {
        self.press_started = None;
    }

    /// Charging outline at simulation time `now`: grows linearly to the cap over
    /// the hold delay, then switches to a brighter stroke.
    pub fn outline(&self, now: f64, style: ChargeStyle) -> Option<Outline> {
        let start = self.press_started?;
        let max = style.max_width as f64;
        let width = lerp(now, start, start + style.hold_delay_ms, 0.0, max).clamp(0.0, max) as f32;
        let charged = width >= style.max_width;
        Some(Outline {
            width,
            color: self.fill.brighter(if charged { 100 } else { 50 }),
        })
    }

    pub fn remove_body<W: PhysicsWorld + ?Sized>(&self, world: &mut W) {
        world.remove_body(self.body);
    }

    /// Screen-space draw parameters. The wrapped title is cached until the
    /// title or completion changes; font size and wrap width both scale with
    /// the body, so cluster scaling never invalidates it.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_params<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &W,
        viewport: &ViewportController,
        measure: &dyn TextMeasure,
        now: f64,
        charge: ChargeStyle,
        today: Date,
    ) -> Option<BubbleDraw> {
        let position = world.position(self.body)?;
        let radius = world.radius(self.body)?;
        let area = world.area(self.body)?;
        let scale = viewport.view_scale();
        let center = viewport.to_screen(position);

        let title_len = self.record.title.chars().count().max(1) as f32;
        let title_font_size = (area / title_len).sqrt() * 0.5 * scale;
        if self.wrapped_title.is_none() {
            let mut text = self.record.title.clone();
            if self.record.completed {
                text.push_str(COMPLETED_MARK);
            }
            let max_width = area.sqrt() * scale;
            self.wrapped_title = Some(text::wrap_text(measure, &text, max_width, title_font_size, MAX_TITLE_LINES));
        }
        let title_lines = self.wrapped_title.clone().unwrap_or_default();
        let text_height = title_lines.len() as f32 * title_font_size;
        let title_top = center.y - text_height / 2.0 + title_font_size / 2.0;

        let date_len = self.record.date.chars().count().max(1) as f32;
        let date_font_size = (area / date_len * 0.1).sqrt() * scale;

        Some(BubbleDraw {
            center,
            radius: radius * scale,
            fill: self.fill,
            gradient: (self.fill.brighter(40), self.fill.brighter(-15)),
            outline: self.outline(now, charge).map(|o| Outline { width: o.width * scale, ..o }),
            title_lines,
            title_font_size,
            title_top,
            date_lines: text::date_label_lines(&self.record.date, today),
            date_font_size,
            date_top: center.y.round() + date_font_size * 3.0,
        })
    }
}

/// Where a task lives. Completed tasks exist either as a bare record (hidden)
/// or as a materialized bubble (visible); active tasks always have a body.
#[derive(Clone, Debug)]
pub enum Task {
    Active(Bubble),
    CompletedHidden(TaskRecord),
    CompletedVisible(Bubble),
}

impl Task {
    pub fn id(&self) -> TaskId {
        match self {
            Task::Active(b) | Task::CompletedVisible(b) => b.id(),
            Task::CompletedHidden(r) => r.identifier,
        }
    }

    pub fn record(&self) -> &TaskRecord {
        match self {
            Task::Active(b) | Task::CompletedVisible(b) => b.record(),
            Task::CompletedHidden(r) => r,
        }
    }

    pub fn bubble(&self) -> Option<&Bubble> {
        match self {
            Task::Active(b) | Task::CompletedVisible(b) => Some(b),
            Task::CompletedHidden(_) => None,
        }
    }

    pub fn bubble_mut(&mut self) -> Option<&mut Bubble> {
        match self {
            Task::Active(b) | Task::CompletedVisible(b) => Some(b),
            Task::CompletedHidden(_) => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        !matches!(self, Task::Active(_))
    }

    /// Wrap a bubble in the variant matching its completion flag.
    pub fn from_bubble(bubble: Bubble) -> Self {
        if bubble.is_completed() { Task::CompletedVisible(bubble) } else { Task::Active(bubble) }
    }

    /// Drop the body, keeping only the record. Active tasks stay active.
    pub fn hide<W: PhysicsWorld + ?Sized>(self, world: &mut W) -> Self {
        match self {
            Task::CompletedVisible(b) => {
                b.remove_body(world);
                Task::CompletedHidden(b.into_record())
            }
            other => other,
        }
    }

    /// Give a bodiless record a body at `position`.
    pub fn materialize<W: PhysicsWorld + ?Sized>(self, world: &mut W, position: Pos2, cluster_scaler: f32) -> Self {
        match self {
            Task::CompletedHidden(r) => Task::from_bubble(Bubble::create(world, r, position, cluster_scaler)),
            other => other,
        }
    }

    /// Release whatever physics the task owns.
    pub fn discard<W: PhysicsWorld + ?Sized>(self, world: &mut W) -> TaskRecord {
        match self {
            Task::Active(b) | Task::CompletedVisible(b) => {
                b.remove_body(world);
                b.into_record()
            }
            Task::CompletedHidden(r) => r,
        }
    }
}
