use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Stroke, Vec2};

use crate::board_utils::board::Board;
use crate::board_utils::bubble::{BubbleDraw, DEFAULT_TASK_TITLE, TaskId};
use crate::board_utils::color::{Color, DARK_BACKGROUND, LIGHT_BACKGROUND};
use crate::board_utils::text::TextMeasure;
use crate::gui::feedback::{self, EguiFeedback};
use crate::persistence::persist::{self, KeyValueStore};
use crate::persistence::settings::AppSettings;
use crate::physics::CircleWorld;

// longest step fed to the simulation after a stall
const MAX_TICK_MS: f64 = 1000.0 / 30.0;
const MIN_FONT_SIZE: f32 = 1.0;
const START_SIZE: Vec2 = Vec2::new(1100.0, 720.0);

// Style for toast notifications
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NoticeStyle {
    Subtle,
    Prominent,
}

/// Width measurement through egui's font atlas.
struct PainterMeasure<'a> {
    painter: &'a Painter,
}

impl TextMeasure for PainterMeasure<'_> {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let font = FontId::proportional(font_size.max(MIN_FONT_SIZE));
        self.painter.layout_no_wrap(text.to_owned(), font, Color32::WHITE).size().x
    }
}

/// Edit form buffers, synced from the edited record when a session opens.
#[derive(Default)]
struct EditForm {
    task: Option<TaskId>,
    title: String,
    date: String,
    scale: f32,
    completed: bool,
}

pub struct BubbleApp {
    board: Board<CircleWorld>,
    settings: AppSettings,
    form: EditForm,
    touches: BTreeMap<u64, Pos2>,
    last_canvas: Option<Rect>,
    save_error: Option<String>,
    last_info: Option<String>,
    last_info_time: Option<Instant>,
    last_info_style: NoticeStyle,
    show_snapshots: bool,
    show_help: bool,
}

impl BubbleApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: AppSettings, store: Box<dyn KeyValueStore>) -> Self {
        let feedback = EguiFeedback::new(cc.egui_ctx.clone(), settings.sounds_enabled);
        let mut board = Board::new(
            CircleWorld::new(),
            store,
            Box::new(feedback),
            START_SIZE,
            settings.board_options(),
        );
        let load_error = board.load();
        let mut app = Self {
            board,
            settings,
            form: EditForm::default(),
            touches: BTreeMap::new(),
            last_canvas: None,
            save_error: None,
            last_info: None,
            last_info_time: None,
            last_info_style: NoticeStyle::Subtle,
            show_snapshots: false,
            show_help: false,
        };
        if let Some(e) = load_error {
            app.save_error = Some(format!("Stored tasks could not be read ({e}); a backup was kept"));
        }
        app
    }

    fn notify(&mut self, msg: String, style: NoticeStyle) {
        self.last_info = Some(msg);
        self.last_info_time = Some(Instant::now());
        self.last_info_style = style;
    }

    fn save_snapshot_now(&mut self) {
        let dir = self.settings.snapshot_dir();
        match persist::save_snapshot(&dir, &self.board.snapshot()) {
            Ok(path) => {
                log::info!("snapshot written to {}", path.display());
                self.notify(format!("Snapshot saved to {}", path.display()), NoticeStyle::Prominent);
            }
            Err(e) => {
                log::error!("snapshot failed: {e}");
                self.save_error = Some(format!("Snapshot failed: {e}"));
            }
        }
    }

    fn background(&self) -> Color32 {
        let index = if self.board.dark_theme() { DARK_BACKGROUND } else { LIGHT_BACKGROUND };
        Color::palette(index).into()
    }

    fn sync_form(&mut self) {
        let session = self.board.editing().map(|s| s.task);
        if session == self.form.task {
            return;
        }
        self.form = match self.board.edited_record() {
            Some(r) => EditForm {
                task: Some(r.identifier),
                title: if r.has_placeholder_title() { String::new() } else { r.title.clone() },
                date: r.date.clone(),
                scale: r.scale,
                completed: r.completed,
            },
            None => EditForm::default(),
        };
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Bubble-Board");
                ui.separator();

                let theme_label = if self.board.dark_theme() { "☀ Light" } else { "🌙 Dark" };
                if ui.button(theme_label).clicked() {
                    self.board.toggle_theme();
                }

                let eye = if self.board.completed_visible() { "🙈" } else { "👁" };
                if ui
                    .button(format!("{eye} {}", self.board.completed_count()))
                    .on_hover_text("Show or hide completed tasks")
                    .clicked()
                {
                    self.board.toggle_completed_view();
                }

                if self.board.is_zoomed() && ui.button("⟲ Reset zoom").clicked() {
                    self.board.reset_zoom();
                }

                ui.menu_button("Snapshots", |ui| {
                    if ui.button("Save snapshot").clicked() {
                        self.save_snapshot_now();
                        ui.close();
                    }
                    if ui.button("Browse…").clicked() {
                        self.show_snapshots = true;
                        ui.close();
                    }
                });

                if ui.button("?").clicked() {
                    self.show_help = !self.show_help;
                }

                if let Some(err) = &self.save_error {
                    ui.separator();
                    ui.colored_label(Color32::RED, err);
                    if ui.small_button("✕").clicked() {
                        self.save_error = None;
                    }
                }
            });
        });
    }

    fn edit_window(&mut self, ctx: &egui::Context) {
        self.sync_form();
        let Some(session) = self.board.editing() else { return };
        let heading = if session.creating { "New Task" } else { "Edit Task" };
        let mut confirm = false;
        let mut delete = false;
        egui::Window::new(heading)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_BOTTOM, egui::vec2(0.0, -24.0))
            .show(ctx, |ui| {
                egui::Grid::new("edit_form").num_columns(2).spacing([8.0, 6.0]).show(ui, |ui| {
                    ui.label("Title");
                    let title = ui.add(egui::TextEdit::singleline(&mut self.form.title).hint_text(DEFAULT_TASK_TITLE));
                    if title.changed() {
                        self.board.set_edited_title(&self.form.title);
                    }
                    if submits_title(title.lost_focus(), ui.input(|i| i.key_pressed(egui::Key::Enter))) {
                        confirm = true;
                    }
                    ui.end_row();

                    ui.label("Date");
                    if ui
                        .add(egui::TextEdit::singleline(&mut self.form.date).hint_text("YYYY-MM-DDTHH:MM"))
                        .changed()
                    {
                        self.board.set_edited_date(&self.form.date);
                    }
                    ui.end_row();

                    ui.label("Color");
                    ui.horizontal(|ui| {
                        let current = self.board.edited_record().map(|r| r.color);
                        for swatch in Color::swatches() {
                            let selected = current == Some(swatch);
                            let stroke = if selected {
                                Stroke::new(2.0, ui.visuals().strong_text_color())
                            } else {
                                Stroke::NONE
                            };
                            let button = egui::Button::new("")
                                .fill(Color32::from(swatch))
                                .stroke(stroke)
                                .min_size(egui::vec2(22.0, 22.0));
                            if ui.add(button).clicked() {
                                self.board.set_edited_color(swatch);
                            }
                        }
                    });
                    ui.end_row();

                    ui.label("Size");
                    if ui.add(egui::Slider::new(&mut self.form.scale, 0.1..=3.0)).changed() {
                        self.board.set_edited_scale(self.form.scale);
                    }
                    ui.end_row();

                    ui.label("Done");
                    if ui.checkbox(&mut self.form.completed, "Completed").changed() {
                        self.board.set_edited_completed(self.form.completed);
                    }
                    ui.end_row();
                });
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("🗑 Delete").clicked() {
                        delete = true;
                    }
                    if ui.button("✔ Done").clicked() {
                        confirm = true;
                    }
                });
            });
        if delete {
            self.board.delete_edited();
        } else if confirm {
            self.board.confirm_edit();
        }
    }

    fn snapshots_window(&mut self, ctx: &egui::Context) {
        if !self.show_snapshots {
            return;
        }
        let mut open = true;
        let dir = self.settings.snapshot_dir();
        egui::Window::new("Snapshots")
            .collapsible(false)
            .resizable(true)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.small(dir.display().to_string());
                match persist::list_snapshots(&dir) {
                    Ok(list) => {
                        if list.is_empty() {
                            ui.label("No snapshots yet");
                        }
                        for p in list.iter() {
                            let label = p.file_name().and_then(|s| s.to_str()).unwrap_or("<unknown>");
                            match persist::load_snapshot(p) {
                                Ok(snap) => {
                                    ui.label(format!("{label}: {} tasks", snap.tasks.len()));
                                }
                                Err(e) => {
                                    ui.colored_label(Color32::RED, format!("{label}: {e}"));
                                }
                            }
                        }
                    }
                    Err(e) => {
                        ui.colored_label(Color32::RED, format!("List failed: {e}"));
                    }
                }
            });
        self.show_snapshots = open;
    }

    fn help_window(&mut self, ctx: &egui::Context) {
        if !self.show_help {
            return;
        }
        let mut open = true;
        egui::Window::new("How it works").collapsible(false).open(&mut open).show(ctx, |ui| {
            ui.label("Press + to add a bubble.");
            ui.label("Tap a bubble to edit it, hold it to pop it.");
            ui.label("Drag bubbles around; they drift back towards +.");
            ui.label("Scroll or pinch to zoom, middle-drag to pan while zoomed.");
            ui.label("The eye shows tasks you already popped.");
        });
        self.show_help = open;
    }

    fn handle_canvas_input(&mut self, ui: &egui::Ui, canvas: Rect, hovered: bool) {
        let local = |p: Pos2| (p - canvas.min).to_pos2();
        let events = ui.input(|i| i.events.clone());
        for event in events {
            match event {
                egui::Event::PointerButton { pos, button, pressed, .. } => match (button, pressed) {
                    (egui::PointerButton::Primary, true) if hovered => self.board.pointer_down(local(pos)),
                    (egui::PointerButton::Primary, false) => self.board.pointer_up(local(pos)),
                    (egui::PointerButton::Middle, true) if hovered => {
                        self.board.middle_down(local(pos));
                    }
                    (egui::PointerButton::Middle, false) => self.board.middle_up(),
                    _ => {}
                },
                egui::Event::PointerMoved(pos) => {
                    self.board.pointer_move(local(pos));
                    self.board.middle_drag(local(pos));
                }
                egui::Event::PointerGone => self.board.pointer_leave(),
                egui::Event::Touch { id, phase, pos, .. } => {
                    let pos = local(pos);
                    match phase {
                        egui::TouchPhase::Start => {
                            self.touches.insert(id.0, pos);
                            let points: Vec<Pos2> = self.touches.values().copied().collect();
                            self.board.touch_start(&points);
                        }
                        egui::TouchPhase::Move => {
                            self.touches.insert(id.0, pos);
                            let points: Vec<Pos2> = self.touches.values().copied().collect();
                            self.board.touch_move(&points);
                        }
                        egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                            self.touches.remove(&id.0);
                            self.board.touch_end(self.touches.len());
                        }
                    }
                }
                _ => {}
            }
        }

        if hovered {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0
                && let Some(pos) = ui.input(|i| i.pointer.hover_pos())
            {
                self.board.wheel(scroll > 0.0, local(pos));
            }
        }
    }

    fn paint_bubble(painter: &Painter, offset: Vec2, d: &BubbleDraw) {
        let center = d.center + offset;
        painter.circle_filled(center, d.radius, Color32::from(d.gradient.1));
        painter.circle_filled(center - Vec2::splat(d.radius * 0.08), d.radius * 0.9, Color32::from(d.fill));
        painter.circle_filled(center - Vec2::splat(d.radius * 0.25), d.radius * 0.35, Color32::from(d.gradient.0).gamma_multiply(0.35));
        if let Some(outline) = d.outline
            && outline.width > 0.0
        {
            painter.circle_stroke(center, d.radius + outline.width / 2.0, Stroke::new(outline.width, Color32::from(outline.color)));
        }
        let title_font = FontId::proportional(d.title_font_size.max(MIN_FONT_SIZE));
        for (i, line) in d.title_lines.iter().enumerate() {
            let y = d.title_top + i as f32 * d.title_font_size + offset.y;
            painter.text(Pos2::new(center.x, y), Align2::CENTER_CENTER, line, title_font.clone(), Color32::WHITE);
        }
        let date_font = FontId::proportional(d.date_font_size.max(MIN_FONT_SIZE));
        for (i, line) in d.date_lines.iter().enumerate() {
            let y = d.date_top + i as f32 * d.date_font_size + offset.y;
            painter.text(Pos2::new(center.x, y), Align2::CENTER_TOP, line, date_font.clone(), Color32::WHITE);
        }
    }

    fn paint_toast(&self, ctx: &egui::Context) {
        let (Some(msg), Some(when)) = (&self.last_info, self.last_info_time) else { return };
        if Instant::now().duration_since(when) > Duration::from_secs(3) {
            return;
        }
        let margin = egui::vec2(12.0, 12.0);
        egui::Area::new("bottom_right_toast".into())
            .anchor(Align2::RIGHT_BOTTOM, egui::vec2(-margin.x, -margin.y))
            .interactable(false)
            .show(ctx, |ui| {
                let (fill, stroke_col, stroke_w, text_col) = match self.last_info_style {
                    NoticeStyle::Subtle => (
                        Color32::from_rgba_premultiplied(20, 20, 20, 170),
                        Color32::from_gray(60),
                        0.5,
                        Color32::from_gray(200),
                    ),
                    NoticeStyle::Prominent => (
                        Color32::from_rgba_premultiplied(30, 30, 30, 230),
                        Color32::from_gray(100),
                        1.5,
                        Color32::LIGHT_GREEN,
                    ),
                };
                egui::Frame::popup(ui.style())
                    .corner_radius(egui::CornerRadius::same(8))
                    .stroke(Stroke { width: stroke_w, color: stroke_col })
                    .fill(fill)
                    .inner_margin(egui::Margin::symmetric(10, 6))
                    .show(ui, |ui| match self.last_info_style {
                        NoticeStyle::Subtle => {
                            ui.small(egui::RichText::new(msg).color(text_col));
                        }
                        NoticeStyle::Prominent => {
                            ui.colored_label(text_col, msg);
                        }
                    });
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

/// Enter only confirms from the title field, which drops focus on Enter.
fn submits_title(lost_focus: bool, enter_pressed: bool) -> bool {
    lost_focus && enter_pressed
}

impl eframe::App for BubbleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.board.dark_theme() { egui::Visuals::dark() } else { egui::Visuals::light() });

        self.top_bar(ctx);
        self.edit_window(ctx);
        self.snapshots_window(ctx);
        self.help_window(ctx);

        let background = self.background();
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(background))
            .show(ctx, |ui| {
                let canvas = ui.available_rect_before_wrap();
                if self.last_canvas.map(|r| r.size()) != Some(canvas.size()) {
                    self.board.resize(canvas.size());
                }
                self.last_canvas = Some(canvas);

                let resp = ui.allocate_rect(canvas, Sense::click_and_drag());
                self.handle_canvas_input(ui, canvas, resp.hovered());

                let delta_ms = (ui.input(|i| i.stable_dt) as f64 * 1000.0).clamp(0.0, MAX_TICK_MS);
                self.board.tick(delta_ms);

                let painter = ui.painter_at(canvas);
                let offset = canvas.min.to_vec2();
                let anchor = self.board.anchor_draw();
                painter.circle_filled(anchor.center + offset, anchor.radius, Color32::from(anchor.fill));
                painter.text(
                    anchor.center + offset,
                    Align2::CENTER_CENTER,
                    "+",
                    FontId::proportional(anchor.plus_font_size.max(MIN_FONT_SIZE)),
                    Color32::WHITE,
                );

                let today = time::OffsetDateTime::now_utc().date();
                let measure = PainterMeasure { painter: &painter };
                let draws = self.board.bubble_draws(&measure, today);
                for d in &draws {
                    Self::paint_bubble(&painter, offset, d);
                }
                feedback::paint_pop_rings(ctx, &painter);
            });

        if let Some(err) = self.board.take_save_error() {
            self.save_error = Some(format!("Save failed: {err}"));
        }
        self.paint_toast(ctx);
        // the simulation never rests
        ctx.request_repaint();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.board.save_all();
        if let Err(e) = self.settings.save() {
            log::warn!("settings not saved: {e}");
        }
    }
}
