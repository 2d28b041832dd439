use egui::Pos2;

use crate::board_utils::bubble::TaskId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionConfig {
    /// Holding longer than this pops the bubble.
    pub pop_hold_delay_ms: f64,
    /// Releasing sooner than this opens the edit form.
    pub edit_cancel_delay_ms: f64,
    /// Pointer travel (screen units at 1x) that turns a press into a drag.
    pub cancel_movement_buffer: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            pop_hold_delay_ms: 600.0,
            edit_cancel_delay_ms: 250.0,
            cancel_movement_buffer: 20.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressTarget {
    Anchor,
    Bubble(TaskId),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PressState {
    Idle,
    Pressing { target: PressTarget, started_at: f64, start_pos: Pos2 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseAction {
    Pop,
    Edit,
    /// Released between the edit and pop thresholds, or after moving.
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// No press in flight, or released over something else.
    Nothing,
    Anchor,
    Bubble { task: TaskId, action: ReleaseAction },
}

/// Pointer gesture tracking: one press at a time, plus whether the pointer
/// constraint (direct dragging of bubbles) is currently attached.
#[derive(Clone, Debug)]
pub struct Interaction {
    config: InteractionConfig,
    press: PressState,
    constraint_attached: bool,
    grabbed: Option<TaskId>,
}

impl Interaction {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            press: PressState::Idle,
            constraint_attached: true,
            grabbed: None,
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn state(&self) -> PressState {
        self.press
    }

    pub fn pressed_target(&self) -> Option<PressTarget> {
        match self.press {
            PressState::Pressing { target, .. } => Some(target),
            PressState::Idle => None,
        }
    }

    pub fn begin_press(&mut self, target: PressTarget, now: f64, pointer: Pos2) {
        self.press = PressState::Pressing { target, started_at: now, start_pos: pointer };
    }

    /// Forget the press without resolving it.
    pub fn cancel(&mut self) -> Option<PressTarget> {
        let target = self.pressed_target();
        self.press = PressState::Idle;
        target
    }

    /// True once the pointer strayed far enough from the press origin. The
    /// threshold shrinks in world units as the view zooms in.
    pub fn moved_too_far(&self, pointer: Pos2, view_scale: f32) -> bool {
        match self.press {
            PressState::Pressing { start_pos, .. } => start_pos.distance(pointer) >= self.movement_buffer(view_scale),
            PressState::Idle => false,
        }
    }

    /// Cancel distance in world units at the given zoom.
    fn movement_buffer(&self, view_scale: f32) -> f32 {
        self.config.cancel_movement_buffer / view_scale.max(f32::EPSILON)
    }

    /// `moved` is in world units, like the press origin.
    pub fn classify(&self, held_ms: f64, moved: f32, view_scale: f32) -> ReleaseAction {
        if moved > self.movement_buffer(view_scale) {
            ReleaseAction::Cancel
        } else if held_ms > self.config.pop_hold_delay_ms {
            ReleaseAction::Pop
        } else if held_ms < self.config.edit_cancel_delay_ms {
            ReleaseAction::Edit
        } else {
            ReleaseAction::Cancel
        }
    }

    /// Resolve the press against whatever is under the pointer on release.
    /// Always returns to idle.
    pub fn release(
        &mut self,
        now: f64,
        pointer: Pos2,
        view_scale: f32,
        under_pointer: Option<PressTarget>,
    ) -> Release {
        let PressState::Pressing { target, started_at, start_pos } = self.press else {
            return Release::Nothing;
        };
        self.press = PressState::Idle;
        if under_pointer != Some(target) {
            return Release::Nothing;
        }
        match target {
            PressTarget::Anchor => Release::Anchor,
            PressTarget::Bubble(task) => Release::Bubble {
                task,
                action: self.classify(now - started_at, start_pos.distance(pointer), view_scale),
            },
        }
    }

    // Pointer constraint

    pub fn constraint_attached(&self) -> bool {
        self.constraint_attached
    }

    pub fn detach_constraint(&mut self) {
        self.constraint_attached = false;
        self.grabbed = None;
    }

    pub fn attach_constraint(&mut self) {
        self.constraint_attached = true;
    }

    pub fn grabbed(&self) -> Option<TaskId> {
        self.grabbed
    }

    pub fn grab(&mut self, task: TaskId) {
        if self.constraint_attached {
            self.grabbed = Some(task);
        }
    }

    pub fn release_grab(&mut self) -> Option<TaskId> {
        self.grabbed.take()
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}
