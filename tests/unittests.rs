use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use bubble_board::board_utils::board::{Board, BoardOptions, TaskSeed};
use bubble_board::board_utils::bubble::{DEFAULT_BUBBLE_SIZE, Task, TaskId};
use bubble_board::board_utils::cluster::ClusterLayout;
use bubble_board::board_utils::color::Color;
use bubble_board::board_utils::interaction::PressState;
use bubble_board::board_utils::text::MonospaceMeasure;
use bubble_board::gui::feedback::Feedback;
use bubble_board::persistence::persist::{KeyValueStore, MemoryStore, TASKS_KEY};
use bubble_board::physics::{CircleWorld, PhysicsWorld};
use eframe::egui::{Pos2, Rect, Vec2};
use time::macros::date;

const TICK_MS: f64 = 16.0;

#[derive(Clone, Default)]
struct RecordingFeedback {
    events: Rc<RefCell<Vec<String>>>,
}

impl Feedback for RecordingFeedback {
    fn play_pop_sound(&mut self) {
        self.events.borrow_mut().push("sound".into());
    }

    fn play_pop_animation(&mut self, _center: Pos2, size: f32, color: Color) {
        self.events.borrow_mut().push(format!("ring {size:.0} {color}"));
    }
}

fn board_with(store: MemoryStore, feedback: RecordingFeedback) -> Board<CircleWorld> {
    let options = BoardOptions { seed: Some(42), ..BoardOptions::default() };
    Board::new(CircleWorld::new(), Box::new(store), Box::new(feedback), Vec2::new(800.0, 600.0), options)
}

fn board() -> Board<CircleWorld> {
    board_with(MemoryStore::new(), RecordingFeedback::default())
}

fn titled(title: &str) -> TaskSeed {
    TaskSeed { title: Some(title.into()), color: Some(Color::rgb(0x19, 0x82, 0xC4)), ..TaskSeed::default() }
}

fn stored_tasks(board: &Board<CircleWorld>) -> serde_json::Value {
    let raw = board.store().get(TASKS_KEY).unwrap().unwrap_or_else(|| "[]".into());
    serde_json::from_str(&raw).unwrap()
}

fn position_of(board: &Board<CircleWorld>, id: TaskId) -> Pos2 {
    board.state().bubble(id).and_then(|b| b.position(board.world())).expect("bubble has a body")
}

fn run(board: &mut Board<CircleWorld>, ticks: usize) {
    for _ in 0..ticks {
        board.tick(TICK_MS);
    }
}

// Identifiers

#[test]
fn loading_sets_next_identifier_past_the_largest() {
    let mut store = MemoryStore::new();
    store
        .set(
            TASKS_KEY,
            r##"[{"title":"a","date":"","color":"#FF595E","scale":1,"completed":false,"identifier":3},
                {"title":"b","date":"","color":"#FF595E","scale":1,"completed":true,"identifier":7},
                {"title":"c","date":"","color":"#FF595E","scale":1,"completed":false,"identifier":2}]"##,
        )
        .unwrap();
    let mut board = board_with(store, RecordingFeedback::default());
    assert!(board.load().is_none());
    assert_eq!(board.state().next_id(), 8);
    let id = board.create_task_bubble(Pos2::new(100.0, 100.0), titled("new"));
    assert_eq!(id, 8);
}

#[test]
fn identifiers_stay_unique_across_create_delete_and_duplicates() {
    let mut board = board();
    let a = board.create_task_bubble(Pos2::new(100.0, 100.0), titled("a"));
    let b = board.create_task_bubble(Pos2::new(200.0, 100.0), titled("b"));
    assert!(board.delete_task(a));
    let c = board.create_task_bubble(Pos2::new(300.0, 100.0), titled("c"));
    // a stored duplicate must not collide with a live task
    let d = board.create_task_bubble(Pos2::new(400.0, 100.0), TaskSeed { identifier: Some(b), ..titled("d") });
    let ids: BTreeSet<TaskId> = board.state().tasks().map(Task::id).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains(&b) && ids.contains(&c) && ids.contains(&d));
    assert_ne!(c, a);
}

// Popping

#[test]
fn popping_placeholder_bubble_deletes_it() {
    let feedback = RecordingFeedback::default();
    let mut board = board_with(MemoryStore::new(), feedback.clone());
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), TaskSeed::default());
    assert!(board.pop_bubble(id));
    assert!(board.state().get(id).is_none());
    assert_eq!(board.completed_count(), 0);
    assert_eq!(board.world().body_count(), 1, "only the anchor is left");
    assert_eq!(feedback.events.borrow()[0], "sound");
}

#[test]
fn popping_titled_bubble_completes_and_drops_body_when_hidden() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Write report"));
    let body = board.state().bubble(id).unwrap().body();
    assert!(board.pop_bubble(id));
    assert_eq!(board.completed_count(), 1);
    assert!(matches!(board.state().get(id), Some(Task::CompletedHidden(r)) if r.completed));
    assert!(!board.world().contains(body));
    assert_eq!(stored_tasks(&board)[0]["completed"], true);
}

#[test]
fn popping_with_completed_view_shown_keeps_body() {
    let mut board = board();
    board.toggle_completed_view();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Call plumber"));
    let body = board.state().bubble(id).unwrap().body();
    board.pop_bubble(id);
    assert!(matches!(board.state().get(id), Some(Task::CompletedVisible(_))));
    assert!(board.world().contains(body));
    assert_eq!(board.completed_count(), 1);
    // popping it again records nothing new
    board.pop_bubble(id);
    assert_eq!(board.completed_count(), 1);
}

#[test]
fn pop_animation_is_sized_by_view_scale_and_scaler() {
    let feedback = RecordingFeedback::default();
    let mut board = board_with(MemoryStore::new(), feedback.clone());
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), TaskSeed { scale: Some(2.0), ..titled("x") });
    board.pop_bubble(id);
    let expected = format!("ring {:.0} {}", DEFAULT_BUBBLE_SIZE * 2.0, Color::rgb(0x19, 0x82, 0xC4));
    assert_eq!(feedback.events.borrow()[1], expected);
}

// Completed view

#[test]
fn completed_view_materializes_and_hides_records() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::ZERO, TaskSeed { completed: true, ..titled("done") });
    assert_eq!(board.world().body_count(), 1);
    board.toggle_completed_view();
    assert!(matches!(board.state().get(id), Some(Task::CompletedVisible(_))));
    assert_eq!(board.world().body_count(), 2);
    board.toggle_completed_view();
    assert!(matches!(board.state().get(id), Some(Task::CompletedHidden(_))));
    assert_eq!(board.world().body_count(), 1);
}

#[test]
fn uncompleting_a_hidden_record_gives_it_a_body() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::ZERO, TaskSeed { completed: true, ..titled("again") });
    assert!(board.set_task_completed(id, false));
    assert!(matches!(board.state().get(id), Some(Task::Active(b)) if !b.is_completed()));
    assert_eq!(board.completed_count(), 0);
}

// Persistence

#[test]
fn persistence_round_trip_keeps_counts_and_fields() {
    let mut board = board();
    for i in 0..4 {
        board.create_task_bubble(
            Pos2::new(100.0 + i as f32 * 50.0, 100.0),
            TaskSeed { date: Some("2024-06-01T09:30".into()), scale: Some(1.5), ..titled(&format!("active {i}")) },
        );
    }
    for i in 0..3 {
        board.create_task_bubble(Pos2::ZERO, TaskSeed { completed: true, ..titled(&format!("done {i}")) });
    }
    board.save_all();
    assert_eq!(stored_tasks(&board).as_array().unwrap().len(), 7);

    let raw = board.store().get(TASKS_KEY).unwrap().unwrap();
    let mut store = MemoryStore::new();
    store.set(TASKS_KEY, &raw).unwrap();
    let mut reloaded = board_with(store, RecordingFeedback::default());
    assert!(reloaded.load().is_none());

    let before = board.state().records();
    let after = reloaded.state().records();
    assert_eq!(before, after);
    let active: BTreeSet<TaskId> = after.iter().filter(|r| !r.completed).map(|r| r.identifier).collect();
    let done: BTreeSet<TaskId> = after.iter().filter(|r| r.completed).map(|r| r.identifier).collect();
    assert_eq!((active.len(), done.len()), (4, 3));
    assert!(active.is_disjoint(&done));
}

#[test]
fn saved_array_does_not_depend_on_completed_view() {
    let mut board = board();
    board.create_task_bubble(Pos2::new(100.0, 100.0), titled("open"));
    board.create_task_bubble(Pos2::ZERO, TaskSeed { completed: true, ..titled("closed") });
    board.save_all();
    let hidden = stored_tasks(&board);
    board.toggle_completed_view();
    board.save_all();
    assert_eq!(stored_tasks(&board), hidden);
}

#[test]
fn first_session_gets_tutorial_bubbles() {
    let mut board = board();
    assert!(board.load().is_none());
    assert_eq!(board.state().task_count(), 5);
    let titles: Vec<String> = board.state().records().into_iter().map(|r| r.title).collect();
    assert!(titles.iter().any(|t| t == "Hold Bubble To POP!"));
    assert_eq!(stored_tasks(&board).as_array().unwrap().len(), 5);
}

#[test]
fn corrupt_storage_starts_empty_and_keeps_a_backup() {
    let mut store = MemoryStore::new();
    store
        .set(TASKS_KEY, r#"[{"title":"x","date":"","color":"not-a-color","scale":1,"completed":false,"identifier":1}]"#)
        .unwrap();
    let mut board = board_with(store, RecordingFeedback::default());
    assert!(board.load().is_some());
    assert_eq!(board.state().task_count(), 0, "no tutorial over unreadable data");
    assert!(board.store().get(TASKS_KEY).unwrap().is_some());
}

#[test]
fn exhausted_identifier_starts_empty_instead_of_crashing() {
    let mut store = MemoryStore::new();
    store
        .set(
            TASKS_KEY,
            r##"[{"title":"x","date":"","color":"#1982C4","scale":1,"completed":false,"identifier":18446744073709551615}]"##,
        )
        .unwrap();
    let mut board = board_with(store, RecordingFeedback::default());
    assert!(board.load().is_some());
    assert_eq!(board.state().task_count(), 0);
    let id = board.create_task_bubble(Pos2::new(200.0, 200.0), titled("Fresh"));
    assert_eq!(id, 1);
}

#[test]
fn theme_toggle_is_persisted() {
    let mut board = board();
    board.toggle_theme();
    assert!(board.dark_theme());
    assert_eq!(board.store().get("dark-theme").unwrap().as_deref(), Some("true"));
}

// Gestures

#[test]
fn holding_a_bubble_pops_it() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Hold me"));
    let at = position_of(&board, id);
    board.pointer_down(at);
    assert!(board.state().bubble(id).unwrap().is_pressing());
    run(&mut board, 45);
    board.pointer_up(at);
    assert_eq!(board.completed_count(), 1);
    assert!(board.state().bubble(id).is_none());
}

#[test]
fn short_tap_opens_edit_and_pins_bubble() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Tap me"));
    let at = position_of(&board, id);
    board.pointer_down(at);
    run(&mut board, 5);
    board.pointer_up(at);
    let session = board.editing().expect("edit opened");
    assert_eq!(session.task, id);
    assert!(!session.creating);
    assert!(!board.interaction().constraint_attached());

    run(&mut board, 30);
    assert_eq!(position_of(&board, id), board.edit_position());

    board.confirm_edit();
    assert!(board.editing().is_none());
    assert!(board.interaction().constraint_attached());
    run(&mut board, 10);
    assert_ne!(position_of(&board, id), board.edit_position(), "un-pinned bubble moves again");
}

#[test]
fn release_between_thresholds_does_nothing() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Maybe"));
    let at = position_of(&board, id);
    board.pointer_down(at);
    run(&mut board, 25);
    board.pointer_up(at);
    assert!(board.editing().is_none());
    assert_eq!(board.completed_count(), 0);
    assert!(!board.state().bubble(id).unwrap().is_pressing());
}

#[test]
fn moving_away_cancels_the_press() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Drag me"));
    let at = position_of(&board, id);
    board.pointer_down(at);
    board.pointer_move(at + Vec2::new(60.0, 0.0));
    run(&mut board, 1);
    assert_eq!(board.interaction().state(), PressState::Idle);
    assert!(!board.state().bubble(id).unwrap().is_pressing());
    run(&mut board, 50);
    board.pointer_up(at + Vec2::new(60.0, 0.0));
    assert_eq!(board.completed_count(), 0);
    assert!(board.editing().is_none());
}

#[test]
fn moving_away_while_zoomed_cancels_on_release() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Zoomed"));
    let focus = board.viewport().to_screen(position_of(&board, id));
    for _ in 0..4 {
        board.wheel(true, focus);
    }
    assert!(board.viewport().view_scale() > 2.0);
    let at = board.viewport().to_screen(position_of(&board, id));
    board.pointer_down(at);
    // past the on-screen buffer, but still over the bubble in world units
    let away = at + Vec2::new(36.0, 0.0);
    board.pointer_move(away);
    board.pointer_up(away);
    assert!(board.editing().is_none());
    assert_eq!(board.completed_count(), 0);
    assert_eq!(board.interaction().state(), PressState::Idle);
}

#[test]
fn release_over_vanished_target_is_a_no_op() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Gone"));
    let at = position_of(&board, id);
    board.pointer_down(at);
    board.delete_task(id);
    board.pointer_up(at);
    assert!(board.editing().is_none());
    assert_eq!(board.state().task_count(), 0);
    assert_eq!(board.interaction().state(), PressState::Idle);
}

#[test]
fn tapping_the_anchor_creates_a_task() {
    let mut board = board();
    let center = board.viewport().initial_bounds().center();
    board.pointer_down(center);
    assert!(board.anchor().is_pressed());
    board.pointer_up(center);
    assert!(!board.anchor().is_pressed());
    let session = board.editing().expect("create flow opened");
    assert!(session.creating);
    assert_eq!(position_of(&board, session.task), board.edit_position());

    board.set_edited_title("Buy milk");
    board.confirm_edit();
    assert_eq!(board.state().get(session.task).unwrap().record().title, "Buy milk");
    assert_eq!(stored_tasks(&board).as_array().unwrap().len(), 1);
}

#[test]
fn confirming_an_untitled_bubble_deletes_it() {
    let mut board = board();
    let id = board.start_creating_task().unwrap();
    assert!(board.start_creating_task().is_none(), "one edit at a time");
    board.confirm_edit();
    assert!(board.state().get(id).is_none());
    assert_eq!(board.world().body_count(), 1);

    let kept = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Keep me"));
    assert!(board.start_editing_task(kept));
    board.set_edited_title("");
    board.confirm_edit();
    assert!(board.state().get(kept).is_none());
}

#[test]
fn deleting_the_edited_bubble_ends_the_session() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Delete me"));
    board.start_editing_task(id);
    board.delete_edited();
    assert!(board.editing().is_none());
    assert!(board.state().get(id).is_none());
    assert!(board.interaction().constraint_attached());
    run(&mut board, 3);
}

#[test]
fn edit_form_updates_the_bubble() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Edit me"));
    board.start_editing_task(id);
    board.set_edited_date("2024-06-01T08:00");
    board.set_edited_color(Color::rgb(0x8A, 0xC9, 0x26));
    board.set_edited_scale(2.0);
    let radius = board.world().radius(board.state().bubble(id).unwrap().body()).unwrap();
    board.set_edited_scale(2.0);
    let again = board.world().radius(board.state().bubble(id).unwrap().body()).unwrap();
    assert_eq!(radius, again);
    board.confirm_edit();
    let stored = &stored_tasks(&board)[0];
    assert_eq!(stored["date"], "2024-06-01T08:00");
    assert_eq!(stored["color"], "#8AC926FF");
    assert_eq!(stored["scale"], 2.0);
}

#[test]
fn completing_in_the_form_reveals_completed_view() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("Finish me"));
    board.start_editing_task(id);
    board.set_edited_completed(true);
    assert!(board.completed_visible());
    assert!(matches!(board.state().get(id), Some(Task::CompletedVisible(_))));
    board.confirm_edit();
    assert!(matches!(board.state().get(id), Some(Task::CompletedVisible(_))));
}

#[test]
fn pointer_is_ignored_while_editing() {
    let mut board = board();
    let a = board.create_task_bubble(Pos2::new(150.0, 450.0), titled("a"));
    let b = board.create_task_bubble(Pos2::new(650.0, 450.0), titled("b"));
    board.start_editing_task(a);
    let at = position_of(&board, b);
    board.pointer_down(at);
    run(&mut board, 50);
    board.pointer_up(at);
    assert_eq!(board.editing().map(|s| s.task), Some(a));
    assert_eq!(board.completed_count(), 0);
}

// Viewport

#[test]
fn zooming_out_never_exceeds_initial_bounds_and_reset_restores() {
    let mut board = board();
    let initial = board.viewport().initial_bounds();
    for _ in 0..5 {
        board.wheel(true, Pos2::new(100.0, 80.0));
    }
    assert!(board.is_zoomed());
    for _ in 0..20 {
        board.wheel(false, Pos2::new(700.0, 500.0));
        let b = board.viewport().bounds();
        assert!(b.width() <= initial.width() && b.height() <= initial.height());
        assert!(initial.contains_rect(b));
    }
    assert_eq!(board.viewport().bounds(), initial);

    board.wheel(true, Pos2::new(400.0, 300.0));
    board.reset_zoom();
    assert_eq!(board.viewport().bounds(), initial);
}

#[test]
fn editing_resets_zoom() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("z"));
    board.wheel(true, Pos2::new(400.0, 300.0));
    assert!(board.is_zoomed());
    board.start_editing_task(id);
    assert!(!board.is_zoomed());
}

#[test]
fn middle_drag_pans_only_when_zoomed() {
    let mut board = board();
    assert!(!board.middle_down(Pos2::new(100.0, 100.0)));
    board.wheel(true, Pos2::new(400.0, 300.0));
    let before = board.viewport().bounds();
    assert!(board.middle_down(Pos2::new(100.0, 100.0)));
    board.middle_drag(Pos2::new(80.0, 90.0));
    board.middle_up();
    assert_ne!(board.viewport().bounds(), before);
}

// Layout

#[test]
fn oversized_cluster_shrinks_to_fit_the_frame() {
    let mut board = board();
    board.create_task_bubble(Pos2::new(200.0, 300.0), TaskSeed { scale: Some(6.0), ..titled("big") });
    let frame: Rect = board.viewport().initial_bounds();
    run(&mut board, 200);
    assert!(board.state().cluster_scaler() < 1.0);
    run(&mut board, 4800);
    let bodies = board.state().active_bodies();
    let cluster = board.world().bounds(&bodies).unwrap();
    let margin = ClusterLayout::default().overflow_margin(cluster, frame);
    assert!(margin > -5.0, "margin {margin}");
    assert!(board.state().cluster_scaler() >= 0.01);
}

#[test]
fn empty_board_resets_scaler() {
    let mut board = board();
    let id = board.create_task_bubble(Pos2::new(200.0, 300.0), TaskSeed { scale: Some(6.0), ..titled("big") });
    run(&mut board, 100);
    assert!(board.state().cluster_scaler() < 1.0);
    board.delete_task(id);
    run(&mut board, 1);
    assert_eq!(board.state().cluster_scaler(), 1.0);
}

#[test]
fn new_bubbles_match_scaled_siblings() {
    let mut board = board();
    board.create_task_bubble(Pos2::new(200.0, 300.0), TaskSeed { scale: Some(6.0), ..titled("big") });
    run(&mut board, 100);
    let scaler = board.state().cluster_scaler();
    let id = board.create_task_bubble(Pos2::new(600.0, 300.0), titled("small"));
    let radius = board.world().radius(board.state().bubble(id).unwrap().body()).unwrap();
    assert!((radius - DEFAULT_BUBBLE_SIZE * scaler).abs() < 1e-3);
}

// Rendering

#[test]
fn long_titles_render_in_at_most_three_lines() {
    let mut board = board();
    let title = "alpha bravo charlie delta echo foxtrot golf hotel india juliet";
    let id = board.create_task_bubble(Pos2::new(150.0, 150.0), TaskSeed { date: Some("2024-06-02T10:15".into()), ..titled(title) });
    board.set_task_completed(id, false);
    let draws = board.bubble_draws(&MonospaceMeasure::default(), date!(2024 - 06 - 01));
    assert_eq!(draws.len(), 1);
    let d = &draws[0];
    assert!(d.title_lines.len() <= 3);
    let words: Vec<&str> = d.title_lines.iter().flat_map(|l| l.split_whitespace()).collect();
    assert_eq!(words.join(" "), title);
    assert_eq!(d.date_lines, vec!["Tomorrow".to_string(), "10:15".to_string()]);
}

#[test]
fn edited_bubble_is_drawn_last() {
    let mut board = board();
    let a = board.create_task_bubble(Pos2::new(150.0, 150.0), titled("first"));
    board.create_task_bubble(Pos2::new(650.0, 450.0), titled("second"));
    board.start_editing_task(a);
    let draws = board.bubble_draws(&MonospaceMeasure::default(), date!(2024 - 06 - 01));
    let edit_center = board.viewport().to_screen(board.edit_position());
    assert_eq!(draws.last().unwrap().center, edit_center);
}
