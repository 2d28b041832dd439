//! The board: every task, the anchor, the view and the gesture state wired
//! to one physics world, a key-value store and a feedback sink.
//!
//! Structural changes (create, pop, delete, completion toggles) only ever
//! happen from the event handlers, never inside [`Board::tick`], so one tick
//! always works on a single snapshot of the active bodies.

use egui::{Pos2, Vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use time::Date;

use crate::board_utils::anchor::{AddButtonAnchor, AnchorDraw};
use crate::board_utils::bubble::{
    Bubble, BubbleDraw, ChargeStyle, DEFAULT_BUBBLE_SIZE, DEFAULT_TASK_TITLE, Task, TaskId, TaskRecord,
};
use crate::board_utils::cluster::{ClusterConfig, ClusterLayout, ScaleOutcome};
use crate::board_utils::color::Color;
use crate::board_utils::interaction::{Interaction, InteractionConfig, PressTarget, Release, ReleaseAction};
use crate::board_utils::store::{BoardState, EditSession};
use crate::board_utils::text::TextMeasure;
use crate::board_utils::utils::random_pos_around_center;
use crate::board_utils::viewport::ViewportController;
use crate::gui::feedback::Feedback;
use crate::persistence::persist::{self, BoardSnapshot, KeyValueStore, PersistError};
use crate::physics::{BodyId, PhysicsWorld};

const TUTORIAL: [(&str, f32); 5] = [
    ("Hold Bubble To POP!", 3.0),
    ("Tap Bubble To Edit", 2.0),
    ("Press + To Add Bubble", 1.0),
    ("Scroll To Zoom & Pan", 0.5),
    ("Press Eye To See Past Tasks", 0.1),
];
const TOUCH_ZOOM_HINT: &str = "Pinch to Zoom and Pan";
// velocity gained per unit of distance to the pointer while dragging
const DRAG_STIFFNESS: f32 = 0.2;
const CHARGE_MAX_WIDTH: f32 = 30.0;

/// Tunables the board is built with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardOptions {
    pub cluster: ClusterConfig,
    pub interaction: InteractionConfig,
    /// Word the zoom tutorial bubble for touch screens.
    pub touch_hints: bool,
    /// Seed for spawn positions and random swatches; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            interaction: InteractionConfig::default(),
            touch_hints: false,
            seed: None,
        }
    }
}

/// Optional fields for a new task; anything unset gets its default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskSeed {
    pub title: Option<String>,
    pub date: Option<String>,
    pub color: Option<Color>,
    pub scale: Option<f32>,
    pub completed: bool,
    pub identifier: Option<TaskId>,
}

impl From<TaskRecord> for TaskSeed {
    fn from(r: TaskRecord) -> Self {
        Self {
            title: Some(r.title),
            date: Some(r.date),
            color: Some(r.color),
            scale: Some(r.scale),
            completed: r.completed,
            identifier: Some(r.identifier),
        }
    }
}

pub struct Board<W: PhysicsWorld> {
    state: BoardState,
    world: W,
    anchor: AddButtonAnchor,
    viewport: ViewportController,
    layout: ClusterLayout,
    interaction: Interaction,
    store: Box<dyn KeyValueStore>,
    feedback: Box<dyn Feedback>,
    rng: StdRng,
    touch_hints: bool,
    /// Last known pointer position in world space.
    pointer: Option<Pos2>,
    save_error: Option<String>,
}

impl<W: PhysicsWorld> Board<W> {
    pub fn new(
        mut world: W,
        store: Box<dyn KeyValueStore>,
        feedback: Box<dyn Feedback>,
        canvas_size: Vec2,
        options: BoardOptions,
    ) -> Self {
        let viewport = ViewportController::new(canvas_size);
        let anchor = AddButtonAnchor::new(&mut world, viewport.initial_bounds());
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: BoardState::new(),
            world,
            anchor,
            viewport,
            layout: ClusterLayout::new(options.cluster),
            interaction: Interaction::new(options.interaction),
            store,
            feedback,
            rng,
            touch_hints: options.touch_hints,
            pointer: None,
            save_error: None,
        }
    }

    // Accessors

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn anchor(&self) -> &AddButtonAnchor {
        &self.anchor
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn is_zoomed(&self) -> bool {
        self.viewport.is_zoomed()
    }

    pub fn completed_count(&self) -> usize {
        self.state.completed_count()
    }

    pub fn dark_theme(&self) -> bool {
        self.state.dark_theme()
    }

    pub fn completed_visible(&self) -> bool {
        self.state.completed_visible()
    }

    pub fn editing(&self) -> Option<EditSession> {
        self.state.editing()
    }

    pub fn edited_record(&self) -> Option<&TaskRecord> {
        let session = self.state.editing()?;
        self.state.get(session.task).map(Task::record)
    }

    /// Fixed spot edited bubbles are pinned to: centred, a quarter down.
    pub fn edit_position(&self) -> Pos2 {
        let initial = self.viewport.initial_bounds();
        Pos2::new(initial.center().x, initial.min.y + initial.height() * 0.25)
    }

    /// Last failed save, cleared once read.
    pub fn take_save_error(&mut self) -> Option<String> {
        self.save_error.take()
    }

    fn spawn_position(&mut self) -> Pos2 {
        let initial = self.viewport.initial_bounds();
        let magnitude = initial.width().min(initial.height()) * 0.25;
        random_pos_around_center(&mut self.rng, initial.center(), magnitude)
    }

    // Lifecycle

    /// Create a task from `seed`. Completed tasks only get a body while the
    /// completed view is showing.
    pub fn create_task_bubble(&mut self, position: Pos2, seed: TaskSeed) -> TaskId {
        let identifier = self.state.claim_id(seed.identifier);
        let title = match seed.title {
            Some(t) if !t.is_empty() => t,
            _ => DEFAULT_TASK_TITLE.to_string(),
        };
        let color = match seed.color {
            Some(c) => c,
            None => Color::random_swatch(&mut self.rng),
        };
        let scale = seed.scale.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(1.0);
        let record = TaskRecord {
            identifier,
            title,
            date: seed.date.unwrap_or_default(),
            color,
            scale,
            completed: seed.completed,
        };
        let task = if record.completed && !self.state.completed_visible() {
            Task::CompletedHidden(record)
        } else {
            Task::from_bubble(Bubble::create(&mut self.world, record, position, self.state.cluster_scaler()))
        };
        self.state.insert(task);
        identifier
    }

    pub fn spawn_tutorial_bubbles(&mut self) {
        for (title, scale) in TUTORIAL {
            let title = if self.touch_hints && title.starts_with("Scroll") { TOUCH_ZOOM_HINT } else { title };
            let position = self.spawn_position();
            let seed = TaskSeed { title: Some(title.to_string()), scale: Some(scale), ..TaskSeed::default() };
            self.create_task_bubble(position, seed);
        }
        self.save_all();
    }

    /// Replace the board with what the store holds. Unreadable tasks are
    /// backed up by the persistence layer and the board starts empty; the
    /// error is handed back for the UI to show.
    pub fn load(&mut self) -> Option<PersistError> {
        self.clear_tasks();
        self.state.set_dark_theme(persist::load_theme(self.store.as_ref()));
        let (loaded, error) = persist::load_tasks_or_recover(self.store.as_mut());
        let first_session = error.is_none() && loaded.is_empty();
        let (active, completed) = (loaded.active.len(), loaded.completed.len());
        self.state.set_next_id(loaded.next_id);
        for record in loaded.active.into_iter().chain(loaded.completed) {
            let position = self.spawn_position();
            self.create_task_bubble(position, TaskSeed::from(record));
        }
        log::info!(
            "loaded {active} active and {completed} completed tasks, next id {}",
            self.state.next_id()
        );
        if first_session {
            log::info!("first session, adding tutorial bubbles");
            self.spawn_tutorial_bubbles();
        }
        error
    }

    fn clear_tasks(&mut self) {
        let ids: Vec<TaskId> = self.state.tasks().map(Task::id).collect();
        for id in ids {
            if let Some(task) = self.state.take(id) {
                task.discard(&mut self.world);
            }
        }
        self.state.set_editing(None);
        self.interaction.cancel();
        self.interaction.attach_constraint();
    }

    /// Persist every task exactly once. A completed task is either a hidden
    /// record or a visible bubble, never both, so the stored array is the same
    /// whichever way the completed view is set.
    pub fn save_all(&mut self) {
        let records = self.state.records();
        if let Err(e) = persist::save_tasks(self.store.as_mut(), &records) {
            log::error!("saving tasks failed: {e}");
            self.save_error = Some(e.to_string());
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::from_records(&self.state.records(), self.state.dark_theme())
    }

    pub fn toggle_theme(&mut self) {
        let dark = !self.state.dark_theme();
        self.state.set_dark_theme(dark);
        if let Err(e) = persist::save_theme(self.store.as_mut(), dark) {
            log::error!("saving theme failed: {e}");
            self.save_error = Some(e.to_string());
        }
    }

    pub fn toggle_completed_view(&mut self) {
        let visible = !self.state.completed_visible();
        self.set_completed_view(visible);
    }

    /// Materialize or hide every completed task. The bubble open in the edit
    /// form keeps its body until the edit concludes.
    fn set_completed_view(&mut self, visible: bool) {
        self.state.set_completed_visible(visible);
        let edited = self.state.editing().map(|s| s.task);
        let ids = if visible { self.state.hidden_ids() } else { self.state.visible_completed_ids() };
        for id in ids {
            if !visible && Some(id) == edited {
                continue;
            }
            let Some(task) = self.state.take(id) else { continue };
            let task = if visible {
                let position = self.spawn_position();
                task.materialize(&mut self.world, position, self.state.cluster_scaler())
            } else {
                if self.interaction.grabbed() == Some(id) {
                    self.interaction.release_grab();
                }
                task.hide(&mut self.world)
            };
            self.state.insert(task);
        }
        log::debug!("completed view {}", if visible { "shown" } else { "hidden" });
    }

    /// Switch completion. Turning it on while the completed view is hidden
    /// drops the body and keeps the record; turning it off gives hidden records
    /// a body again.
    pub fn set_task_completed(&mut self, id: TaskId, completed: bool) -> bool {
        let Some(task) = self.state.take(id) else { return false };
        let task = match (task, completed) {
            (Task::Active(mut b), true) => {
                b.set_completed(true);
                if self.state.completed_visible() {
                    Task::CompletedVisible(b)
                } else {
                    if self.interaction.grabbed() == Some(id) {
                        self.interaction.release_grab();
                    }
                    Task::CompletedVisible(b).hide(&mut self.world)
                }
            }
            (Task::CompletedVisible(mut b), false) => {
                b.set_completed(false);
                Task::Active(b)
            }
            (Task::CompletedHidden(mut r), false) => {
                r.completed = false;
                let position = self.spawn_position();
                Task::Active(Bubble::create(&mut self.world, r, position, self.state.cluster_scaler()))
            }
            (unchanged, _) => unchanged,
        };
        self.state.insert(task);
        true
    }

    /// Remove a task and its body without recording anything.
    pub fn delete_task(&mut self, id: TaskId) -> bool {
        let Some(task) = self.state.take(id) else { return false };
        task.discard(&mut self.world);
        if self.interaction.grabbed() == Some(id) {
            self.interaction.release_grab();
        }
        if self.state.editing().is_some_and(|s| s.task == id) {
            self.state.set_editing(None);
            self.interaction.attach_constraint();
        }
        log::debug!("deleted task {id}");
        true
    }

    /// Complete a bubble with feedback. A bubble still carrying the
    /// placeholder title was never a real task and is deleted instead.
    /// Returns false when the bubble no longer exists.
    pub fn pop_bubble(&mut self, id: TaskId) -> bool {
        let Some(bubble) = self.state.bubble(id) else { return false };
        let placeholder = bubble.has_placeholder_title();
        let fill = bubble.fill();
        let scale = bubble.scale();
        let center = bubble.position(&self.world).map(|p| self.viewport.to_screen(p));

        self.feedback.play_pop_sound();
        if let Some(center) = center {
            let size = self.viewport.view_scale() * scale * self.state.cluster_scaler() * DEFAULT_BUBBLE_SIZE;
            self.feedback.play_pop_animation(center, size, fill);
        }

        if placeholder {
            self.delete_task(id);
        } else {
            if let Some(b) = self.state.bubble_mut(id) {
                b.end_press(&mut self.world);
            }
            self.set_task_completed(id, true);
            log::debug!("popped task {id}");
        }
        self.save_all();
        true
    }

    // Edit flow

    /// Open the form on a fresh placeholder bubble at the edit position.
    pub fn start_creating_task(&mut self) -> Option<TaskId> {
        if self.state.is_editing() {
            return None;
        }
        let position = self.edit_position();
        let id = self.create_task_bubble(position, TaskSeed::default());
        self.begin_edit(id, true);
        Some(id)
    }

    /// Open the form on an existing bubble. The view is reset so the pinned
    /// bubble appears where the form expects it.
    pub fn start_editing_task(&mut self, id: TaskId) -> bool {
        if self.state.is_editing() || self.state.bubble(id).is_none() {
            return false;
        }
        self.reset_zoom();
        self.begin_edit(id, false);
        true
    }

    fn begin_edit(&mut self, id: TaskId, creating: bool) {
        if let Some(b) = self.state.bubble_mut(id) {
            b.clear_outline();
            self.world.set_static(b.body(), true);
        }
        self.state.set_editing(Some(EditSession { task: id, creating }));
        self.interaction.detach_constraint();
        self.pin_edited();
    }

    fn edited_bubble_mut(&mut self) -> Option<&mut Bubble> {
        let session = self.state.editing()?;
        self.state.bubble_mut(session.task)
    }

    pub fn set_edited_title(&mut self, title: &str) {
        if let Some(b) = self.edited_bubble_mut() {
            b.set_title(title);
        }
    }

    pub fn set_edited_date(&mut self, date: &str) {
        if let Some(b) = self.edited_bubble_mut() {
            b.set_date(date);
        }
    }

    pub fn set_edited_color(&mut self, color: Color) {
        if let Some(b) = self.edited_bubble_mut() {
            b.set_color(color);
        }
    }

    pub fn set_edited_scale(&mut self, scale: f32) {
        let Some(session) = self.state.editing() else { return };
        if let Some(b) = self.state.bubble_mut(session.task) {
            b.set_scale(&mut self.world, scale);
        }
    }

    /// Completing the edited bubble while completed tasks are hidden shows
    /// them, so the bubble under the form keeps its body.
    pub fn set_edited_completed(&mut self, completed: bool) {
        let Some(session) = self.state.editing() else { return };
        if completed && !self.state.completed_visible() {
            self.set_completed_view(true);
        }
        self.set_task_completed(session.task, completed);
    }

    /// Close the form: un-pin, drop the bubble if it never got a title, and save.
    pub fn confirm_edit(&mut self) {
        let Some(session) = self.state.editing() else { return };
        self.state.set_editing(None);
        let id = session.task;
        let mut hide = false;
        let mut placeholder = false;
        if let Some(b) = self.state.bubble(id) {
            self.world.set_static(b.body(), false);
            placeholder = b.has_placeholder_title();
            hide = b.is_completed() && !self.state.completed_visible();
        }
        if placeholder {
            self.delete_task(id);
        } else if hide && let Some(task) = self.state.take(id) {
            let task = task.hide(&mut self.world);
            self.state.insert(task);
        }
        self.interaction.attach_constraint();
        self.save_all();
    }

    pub fn delete_edited(&mut self) {
        let Some(session) = self.state.editing() else { return };
        self.state.set_editing(None);
        self.delete_task(session.task);
        self.interaction.attach_constraint();
        self.save_all();
    }

    fn pin_edited(&mut self) {
        let position = self.edit_position();
        let Some(session) = self.state.editing() else { return };
        if let Some(b) = self.state.bubble(session.task) {
            self.world.set_position(b.body(), position);
            self.world.set_velocity(b.body(), Vec2::ZERO);
        }
    }

    // Pointer input, all positions in screen space

    fn hit_test(&self, world_pos: Pos2) -> Option<PressTarget> {
        let mut candidates: Vec<BodyId> = vec![self.anchor.body()];
        candidates.extend(self.state.active_bodies());
        let body = self.world.query_point(&candidates, world_pos)?;
        if body == self.anchor.body() {
            Some(PressTarget::Anchor)
        } else {
            self.state.task_for_body(body).map(PressTarget::Bubble)
        }
    }

    pub fn pointer_down(&mut self, screen: Pos2) {
        let world_pos = self.viewport.from_screen(screen);
        self.pointer = Some(world_pos);
        self.state.set_scaling_enabled(false);
        if self.state.is_editing() || self.viewport.is_touch_gesture() {
            return;
        }
        let Some(target) = self.hit_test(world_pos) else { return };
        let now = self.world.timestamp();
        self.interaction.begin_press(target, now, world_pos);
        match target {
            PressTarget::Anchor => self.anchor.start_press(),
            PressTarget::Bubble(id) => {
                if let Some(b) = self.state.bubble_mut(id) {
                    b.start_press(now);
                }
                self.interaction.grab(id);
            }
        }
    }

    pub fn pointer_move(&mut self, screen: Pos2) {
        self.pointer = Some(self.viewport.from_screen(screen));
    }

    pub fn pointer_up(&mut self, screen: Pos2) {
        let world_pos = self.viewport.from_screen(screen);
        self.pointer = Some(world_pos);
        self.state.set_scaling_enabled(true);
        self.interaction.release_grab();
        self.anchor.end_press();
        if let Some(PressTarget::Bubble(id)) = self.interaction.pressed_target()
            && let Some(b) = self.state.bubble_mut(id)
        {
            b.end_press(&mut self.world);
        }
        if self.state.is_editing() {
            self.interaction.cancel();
            return;
        }
        let under = self.hit_test(world_pos);
        let now = self.world.timestamp();
        match self.interaction.release(now, world_pos, self.viewport.view_scale(), under) {
            Release::Anchor => {
                self.start_creating_task();
            }
            Release::Bubble { task, action: ReleaseAction::Pop } => {
                self.pop_bubble(task);
            }
            Release::Bubble { task, action: ReleaseAction::Edit } => {
                self.start_editing_task(task);
            }
            Release::Bubble { action: ReleaseAction::Cancel, .. } | Release::Nothing => {}
        }
    }

    /// Pointer left the canvas: abandon whatever was in flight.
    pub fn pointer_leave(&mut self) {
        self.pointer = None;
        self.state.set_scaling_enabled(true);
        self.interaction.release_grab();
        self.abandon_press();
    }

    fn abandon_press(&mut self) {
        match self.interaction.cancel() {
            Some(PressTarget::Anchor) => self.anchor.end_press(),
            Some(PressTarget::Bubble(id)) => {
                if let Some(b) = self.state.bubble_mut(id) {
                    b.end_press(&mut self.world);
                }
            }
            None => {}
        }
    }

    // View gestures

    pub fn wheel(&mut self, towards_viewer: bool, screen: Pos2) {
        self.viewport.wheel(towards_viewer, screen);
    }

    pub fn middle_down(&mut self, screen: Pos2) -> bool {
        self.viewport.begin_drag(screen)
    }

    pub fn middle_drag(&mut self, screen: Pos2) {
        self.viewport.drag_to(screen);
    }

    pub fn middle_up(&mut self) {
        self.viewport.end_drag();
    }

    pub fn touch_start(&mut self, touches: &[Pos2]) {
        if self.viewport.touch_start(touches) {
            self.abandon_press();
            self.interaction.detach_constraint();
        }
    }

    pub fn touch_move(&mut self, touches: &[Pos2]) {
        let was_gesture = self.viewport.is_touch_gesture();
        self.viewport.touch_move(touches);
        if !was_gesture && self.viewport.is_touch_gesture() {
            self.abandon_press();
            self.interaction.detach_constraint();
        }
    }

    pub fn touch_end(&mut self, remaining: usize) {
        if self.viewport.touch_end(remaining) && !self.state.is_editing() {
            self.interaction.attach_constraint();
        }
    }

    pub fn reset_zoom(&mut self) {
        if self.viewport.is_zoomed() {
            log::debug!("viewport reset");
        }
        self.viewport.reset();
    }

    /// New canvas size: the pristine frame, the anchor and the edit spot follow.
    pub fn resize(&mut self, canvas_size: Vec2) {
        let current = self.viewport.initial_bounds().size();
        if (current - canvas_size).length() < 0.5 {
            return;
        }
        self.viewport = ViewportController::new(canvas_size);
        self.anchor.relocate(&mut self.world, self.viewport.initial_bounds());
        self.pin_edited();
    }

    // Simulation

    /// One simulation tick: layout on a snapshot of the active bodies, then
    /// the per-tick polls that stand in for timers, then the physics step.
    pub fn tick(&mut self, delta_ms: f64) -> ScaleOutcome {
        let bodies = self.state.active_bodies();
        let frame = self.viewport.initial_bounds();
        let active = self.state.scaling_enabled() && !self.viewport.is_zoomed();
        let mut scaler = self.state.cluster_scaler();
        let outcome = self.layout.rescale(&mut self.world, &bodies, frame, active, &mut scaler);
        self.state.set_cluster_scaler(scaler);

        let anchor = self.anchor.position(&self.world);
        self.layout.apply_attraction(&mut self.world, &bodies, anchor);

        if let Some(pointer) = self.pointer
            && self.interaction.moved_too_far(pointer, self.viewport.view_scale())
        {
            self.abandon_press();
        }

        self.pin_edited();

        if self.interaction.constraint_attached()
            && let (Some(id), Some(pointer)) = (self.interaction.grabbed(), self.pointer)
            && let Some(b) = self.state.bubble(id)
            && let Some(position) = b.position(&self.world)
        {
            self.world.set_velocity(b.body(), (pointer - position) * DRAG_STIFFNESS);
        }

        self.world.step(delta_ms);
        outcome
    }

    // Rendering

    /// Screen-space draw parameters for every bubble with a body, the edited
    /// one last so it paints on top.
    pub fn bubble_draws(&mut self, measure: &dyn TextMeasure, today: Date) -> Vec<BubbleDraw> {
        let now = self.world.timestamp();
        let charge = ChargeStyle {
            hold_delay_ms: self.interaction.config().pop_hold_delay_ms,
            max_width: CHARGE_MAX_WIDTH,
        };
        let edited = self.state.editing().map(|s| s.task);
        let mut draws: Vec<(bool, BubbleDraw)> = Vec::new();
        for b in self.state.bubbles_mut() {
            let is_edited = Some(b.id()) == edited;
            if let Some(d) = b.draw_params(&self.world, &self.viewport, measure, now, charge, today) {
                draws.push((is_edited, d));
            }
        }
        draws.sort_by_key(|(is_edited, _)| *is_edited);
        draws.into_iter().map(|(_, d)| d).collect()
    }

    pub fn anchor_draw(&self) -> AnchorDraw {
        self.anchor.draw_params(&self.world, &self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui::feedback::LoggingFeedback;
    use crate::persistence::persist::MemoryStore;
    use crate::physics::CircleWorld;

    fn board() -> Board<CircleWorld> {
        let options = BoardOptions { seed: Some(7), ..BoardOptions::default() };
        Board::new(
            CircleWorld::new(),
            Box::new(MemoryStore::new()),
            Box::new(LoggingFeedback),
            Vec2::new(800.0, 600.0),
            options,
        )
    }

    #[test]
    fn seed_defaults() {
        let mut b = board();
        let id = b.create_task_bubble(Pos2::new(100.0, 100.0), TaskSeed::default());
        let bubble = b.state().bubble(id).unwrap();
        assert!(bubble.has_placeholder_title());
        assert_eq!(bubble.scale(), 1.0);
        assert!(Color::swatches().any(|c| c == bubble.color()));
    }

    #[test]
    fn completed_seed_stays_bodiless_while_hidden() {
        let mut b = board();
        let id = b.create_task_bubble(Pos2::ZERO, TaskSeed { completed: true, ..TaskSeed::default() });
        assert!(matches!(b.state().get(id), Some(Task::CompletedHidden(_))));
        assert_eq!(b.world().body_count(), 1);
    }

    #[test]
    fn edit_spot_is_a_quarter_down() {
        let b = board();
        assert_eq!(b.edit_position(), Pos2::new(400.0, 150.0));
    }

    #[test]
    fn touch_gesture_detaches_and_restores_constraint() {
        let mut b = board();
        b.touch_start(&[Pos2::new(100.0, 100.0), Pos2::new(200.0, 200.0)]);
        assert!(!b.interaction().constraint_attached());
        b.touch_end(1);
        assert!(!b.interaction().constraint_attached());
        b.touch_end(0);
        assert!(b.interaction().constraint_attached());
    }
}
