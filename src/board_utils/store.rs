use std::collections::BTreeMap;

use crate::board_utils::bubble::{Bubble, Task, TaskId, TaskRecord};
use crate::physics::BodyId;

/// The bubble currently open in the edit form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditSession {
    pub task: TaskId,
    /// Started from the anchor rather than from an existing bubble.
    pub creating: bool,
}

/// Session-wide mutable state: every task, the cluster scaler, the edit
/// cursor and the UI flags. One instance lives for the whole session and is
/// only touched from the event thread.
#[derive(Debug)]
pub struct BoardState {
    tasks: BTreeMap<TaskId, Task>,
    next_id: TaskId,
    cluster_scaler: f32,
    editing: Option<EditSession>,
    dark_theme: bool,
    completed_visible: bool,
    scaling_enabled: bool,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 1,
            cluster_scaler: 1.0,
            editing: None,
            dark_theme: false,
            completed_visible: false,
            scaling_enabled: true,
        }
    }
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    // Identifiers

    pub fn next_id(&self) -> TaskId {
        self.next_id
    }

    pub fn set_next_id(&mut self, next: TaskId) {
        self.next_id = next.max(1);
    }

    pub fn allocate_id(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Use `requested` when it is set and free, otherwise allocate. The counter
    /// always stays ahead of every identifier handed out, so a requested
    /// identifier with no successor is not honoured.
    pub fn claim_id(&mut self, requested: Option<TaskId>) -> TaskId {
        match requested {
            Some(id) if id != 0 && !self.tasks.contains_key(&id) => match id.checked_add(1) {
                Some(next) => {
                    self.next_id = self.next_id.max(next);
                    id
                }
                None => self.allocate_id(),
            },
            _ => self.allocate_id(),
        }
    }

    // Tasks

    pub fn insert(&mut self, task: Task) {
        let id = task.id();
        self.next_id = self.next_id.max(id.saturating_add(1));
        self.tasks.insert(id, task);
    }

    pub fn take(&mut self, id: TaskId) -> Option<Task> {
        self.tasks.remove(&id)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn bubble(&self, id: TaskId) -> Option<&Bubble> {
        self.tasks.get(&id).and_then(Task::bubble)
    }

    pub fn bubble_mut(&mut self, id: TaskId) -> Option<&mut Bubble> {
        self.tasks.get_mut(&id).and_then(Task::bubble_mut)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn bubbles(&self) -> impl Iterator<Item = &Bubble> {
        self.tasks.values().filter_map(Task::bubble)
    }

    pub fn bubbles_mut(&mut self) -> impl Iterator<Item = &mut Bubble> {
        self.tasks.values_mut().filter_map(Task::bubble_mut)
    }

    /// Snapshot of every body in the cluster, taken once per tick.
    pub fn active_bodies(&self) -> Vec<BodyId> {
        self.bubbles().map(Bubble::body).collect()
    }

    pub fn task_for_body(&self, body: BodyId) -> Option<TaskId> {
        self.bubbles().find(|b| b.body() == body).map(Bubble::id)
    }

    /// Completed tasks, materialized or not.
    pub fn completed_records(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.values().filter(|t| t.is_completed()).map(Task::record)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.values().filter(|t| t.is_completed()).count()
    }

    pub fn hidden_ids(&self) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| matches!(t, Task::CompletedHidden(_)))
            .map(Task::id)
            .collect()
    }

    pub fn visible_completed_ids(&self) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| matches!(t, Task::CompletedVisible(_)))
            .map(Task::id)
            .collect()
    }

    /// Records in storage order: every task exactly once.
    pub fn records(&self) -> Vec<TaskRecord> {
        self.tasks.values().map(|t| t.record().clone()).collect()
    }

    // Scaler

    pub fn cluster_scaler(&self) -> f32 {
        self.cluster_scaler
    }

    pub fn set_cluster_scaler(&mut self, value: f32) {
        self.cluster_scaler = value;
    }

    // Edit cursor

    pub fn editing(&self) -> Option<EditSession> {
        self.editing
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn set_editing(&mut self, session: Option<EditSession>) {
        self.editing = session;
    }

    // Flags

    pub fn dark_theme(&self) -> bool {
        self.dark_theme
    }

    pub fn set_dark_theme(&mut self, dark: bool) {
        self.dark_theme = dark;
    }

    pub fn completed_visible(&self) -> bool {
        self.completed_visible
    }

    pub fn set_completed_visible(&mut self, visible: bool) {
        self.completed_visible = visible;
    }

    pub fn scaling_enabled(&self) -> bool {
        self.scaling_enabled
    }

    pub fn set_scaling_enabled(&mut self, enabled: bool) {
        self.scaling_enabled = enabled;
    }
}
