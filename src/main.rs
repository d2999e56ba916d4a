//! Main application logic: views, modal dialogs and storage round trips.

use eframe::{App, Frame, NativeOptions, egui};
use egui::{Color32, Key, RichText, Sense, Stroke, pos2, vec2};
use egui_extras::{Column, TableBuilder};
use rfd::FileDialog;
use std::collections::VecDeque;

mod chart;
mod draft;
mod editor;
mod export;
mod model;
mod neon;
mod progress;
mod reorder;
mod sets;
mod settings;
mod storage;
mod units;
mod wizard;
mod worker;

use chart::{PainterCanvas, hit_test, tooltip_text};
use draft::{DraftEntry, EntryKey};
use editor::{EditorEffect, EditorIntent, EditorMode, WorkoutEditor};
use export::DEFAULT_EXPORT_NAME;
use model::{Exercise, ExerciseId, Workout, WorkoutId, exercise_name};
use neon::resolve_database_url;
use progress::{ProgressData, format_label};
use reorder::Span;
use sets::summarize_sets;
use settings::Settings;
use units::ALL_UNITS;
use wizard::{ValidationError, step_count, step_weight};
use worker::{
    BackendConfig, RequestKind, StorageReply, StorageRequest, StorageResult, StorageWorker, Ticket,
};

/// Number of past workouts offered as templates.
const RECENT_WORKOUTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Home,
    Exercises,
    NewWorkout,
    PastWorkouts,
    Progress,
}

impl View {
    const ALL: [View; 5] = [
        View::Home,
        View::Exercises,
        View::NewWorkout,
        View::PastWorkouts,
        View::Progress,
    ];

    fn title(self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Exercises => "Manage Exercises",
            View::NewWorkout => "New Workout",
            View::PastWorkouts => "Past Workouts",
            View::Progress => "Progress",
        }
    }
}

/// Action performed once the user confirms.
#[derive(Debug, Clone, PartialEq)]
enum Pending {
    DeleteExercise(ExerciseId),
    DeleteWorkout(WorkoutId),
    FinishWorkout,
}

#[derive(Debug, Clone, PartialEq)]
enum Modal {
    Confirm { message: String, action: Pending },
    Alert(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowAction {
    None,
    Edit,
    Remove,
    StartDrag,
}

struct PumpingIronApp {
    settings: Settings,
    settings_dirty: bool,
    show_settings: bool,
    worker: Option<StorageWorker>,
    backend: Option<&'static str>,
    /// Bumped on every navigation; replies for older views are dropped.
    generation: u64,
    view: View,
    exercises: Vec<Exercise>,
    workouts: Vec<Workout>,
    editor: WorkoutEditor,
    new_exercise_name: String,
    renaming: Option<(ExerciseId, String)>,
    selected_exercise: Option<ExerciseId>,
    set_count: usize,
    open_workout: Option<WorkoutId>,
    progress: ProgressData,
    progress_dirty: bool,
    modals: VecDeque<Modal>,
}

impl PumpingIronApp {
    fn new(ctx: &egui::Context) -> Self {
        let settings = Settings::load();
        let config = BackendConfig {
            database_url: resolve_database_url(settings.database_url.as_deref()),
            data_path: settings.data_path(),
        };
        let mut app = match StorageWorker::spawn(config, Some(ctx.clone())) {
            Ok(worker) => Self::with_worker(settings, Some(worker)),
            Err(e) => {
                log::error!("Failed to start storage worker: {e}");
                let mut app = Self::with_worker(settings, None);
                app.alert(format!("Cannot open storage. {e}"));
                app
            }
        };
        app.navigate(View::Home);
        app
    }

    fn with_worker(settings: Settings, worker: Option<StorageWorker>) -> Self {
        let editor = WorkoutEditor::new(settings.last_unit);
        Self {
            settings,
            settings_dirty: false,
            show_settings: false,
            worker,
            backend: None,
            generation: 0,
            view: View::Home,
            exercises: Vec::new(),
            workouts: Vec::new(),
            editor,
            new_exercise_name: String::new(),
            renaming: None,
            selected_exercise: None,
            set_count: 3,
            open_workout: None,
            progress: ProgressData::default(),
            progress_dirty: true,
            modals: VecDeque::new(),
        }
    }

    fn alert(&mut self, message: impl Into<String>) {
        self.modals.push_back(Modal::Alert(message.into()));
    }

    fn confirm(&mut self, message: &str, action: Pending) {
        self.modals.push_back(Modal::Confirm {
            message: message.to_string(),
            action,
        });
    }

    fn send(&self, ticket: Ticket, request: StorageRequest) {
        match &self.worker {
            Some(worker) => worker.send(ticket, request),
            None => log::warn!("No storage available for {:?}", request.kind()),
        }
    }

    /// Request scoped to the current view.
    fn request(&self, request: StorageRequest) {
        self.send(Ticket::view(self.generation), request);
    }

    fn navigate(&mut self, view: View) {
        self.generation += 1;
        self.view = view;
        self.renaming = None;
        self.editor.drag_mut().cancel();
        log::debug!("Showing {} (generation {})", view.title(), self.generation);
        match view {
            View::Home => {}
            View::Exercises => self.request(StorageRequest::ListExercises),
            View::PastWorkouts => {
                self.open_workout = None;
                self.request(StorageRequest::ListWorkouts);
                self.request(StorageRequest::ListExercises);
            }
            View::NewWorkout | View::Progress => {
                self.request(StorageRequest::ListExercises);
                self.request(StorageRequest::ListWorkouts);
            }
        }
    }

    fn poll_storage(&mut self) {
        let replies: Vec<StorageReply> = match &self.worker {
            Some(worker) => std::iter::from_fn(|| worker.try_recv()).collect(),
            None => Vec::new(),
        };
        for reply in replies {
            self.apply_reply(reply);
        }
    }

    fn apply_reply(&mut self, reply: StorageReply) {
        if !reply.ticket.is_current(self.generation) {
            log::debug!("Discarding stale {:?} reply", reply.kind);
            return;
        }
        match reply.result {
            Ok(StorageResult::Ready { backend, notice }) => {
                self.backend = Some(backend);
                if let Some(notice) = notice {
                    self.alert(notice);
                }
            }
            Ok(StorageResult::Exercises(list)) => {
                self.exercises = list;
                self.progress_dirty = true;
            }
            Ok(StorageResult::Workouts(list)) => {
                self.workouts = list;
                self.progress_dirty = true;
                if let Some(id) = &self.open_workout {
                    if !self.workouts.iter().any(|w| &w.id == id) {
                        self.open_workout = None;
                    }
                }
            }
            Ok(StorageResult::WorkoutSaved(list)) => {
                self.editor.save_succeeded();
                self.workouts = list;
                self.progress_dirty = true;
                self.navigate(View::PastWorkouts);
            }
            Ok(StorageResult::Exported { path, rows }) => {
                self.alert(format!("Exported {rows} sets to {}", path.display()));
            }
            Err(e) => {
                if reply.kind == RequestKind::CreateWorkout {
                    self.editor.save_failed();
                }
                self.alert(format!("{} {e}", reply.kind.failure_message()));
            }
        }
    }

    fn dispatch(&mut self, intent: EditorIntent) {
        match self.editor.dispatch(intent) {
            Ok(EditorEffect::None) => {}
            Ok(EditorEffect::UnitRemembered(unit)) => {
                if self.settings.last_unit != unit {
                    self.settings.last_unit = unit;
                    self.settings_dirty = true;
                }
            }
            Ok(EditorEffect::ConfirmFinish) => {
                self.confirm("Finish workout and save?", Pending::FinishWorkout)
            }
            Ok(EditorEffect::Persist(workout)) => {
                self.send(Ticket::global(), StorageRequest::CreateWorkout(workout))
            }
            Err(e) => self.alert(e.to_string()),
        }
    }

    fn run_confirmed(&mut self, action: Pending) {
        match action {
            Pending::DeleteExercise(id) => self.request(StorageRequest::DeleteExercise(id)),
            Pending::DeleteWorkout(id) => {
                if self.open_workout.as_ref() == Some(&id) {
                    self.open_workout = None;
                }
                self.request(StorageRequest::DeleteWorkout(id));
            }
            Pending::FinishWorkout => self.dispatch(EditorIntent::Finish),
        }
    }

    fn export_csv(&mut self) {
        if let Some(path) = FileDialog::new()
            .set_file_name(DEFAULT_EXPORT_NAME)
            .add_filter("CSV", &["csv"])
            .save_file()
        {
            self.send(Ticket::global(), StorageRequest::Export(path));
        }
    }

    fn show_modal(&mut self, ctx: &egui::Context) {
        let Some(modal) = self.modals.front().cloned() else {
            return;
        };
        let mut close = false;
        let mut confirmed = None;
        let title = match &modal {
            Modal::Confirm { .. } => "Confirm",
            Modal::Alert(_) => "Notice",
        };
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| match &modal {
                Modal::Confirm { message, action } => {
                    ui.label(message.as_str());
                    ui.horizontal(|ui| {
                        if ui.button("OK").clicked() {
                            confirmed = Some(action.clone());
                            close = true;
                        }
                        if ui.button("Cancel").clicked() {
                            close = true;
                        }
                    });
                }
                Modal::Alert(message) => {
                    ui.label(message.as_str());
                    if ui.button("OK").clicked() {
                        close = true;
                    }
                }
            });
        if close {
            self.modals.pop_front();
        }
        if let Some(action) = confirmed {
            self.run_confirmed(action);
        }
    }

    fn settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        egui::Window::new("Settings").open(&mut open).show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Weight step");
                if ui
                    .add(egui::DragValue::new(&mut self.settings.weight_step).speed(0.5).clamp_range(0.5..=50.0))
                    .changed()
                {
                    self.settings_dirty = true;
                }
            });
            ui.horizontal(|ui| {
                ui.label("Chart height");
                if ui
                    .add(egui::DragValue::new(&mut self.settings.chart_height).clamp_range(160.0..=800.0))
                    .changed()
                {
                    self.settings_dirty = true;
                }
            });
            ui.label("Database URL (used after restart)");
            let mut url = self.settings.database_url.clone().unwrap_or_default();
            if ui
                .add(egui::TextEdit::singleline(&mut url).password(true))
                .changed()
            {
                self.settings.database_url = Some(url).filter(|u| !u.trim().is_empty());
                self.settings_dirty = true;
            }
            if let Some(path) = self.settings.data_path() {
                ui.label(RichText::new(format!("Local data: {}", path.display())).small());
            }
        });
        self.show_settings = open;
    }

    fn home_view(&mut self, ui: &mut egui::Ui) {
        let mut nav = None;
        let mut export = false;
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            ui.heading("Pumping Iron");
            ui.add_space(16.0);
            for view in &View::ALL[1..] {
                if ui.add_sized([220.0, 32.0], egui::Button::new(view.title())).clicked() {
                    nav = Some(*view);
                }
            }
            if ui.add_sized([220.0, 32.0], egui::Button::new("Export CSV")).clicked() {
                export = true;
            }
        });
        if let Some(view) = nav {
            self.navigate(view);
        }
        if export {
            self.export_csv();
        }
    }

    fn exercises_view(&mut self, ui: &mut egui::Ui) {
        ui.heading("Manage Exercises");
        ui.horizontal(|ui| {
            let resp = ui.add(
                egui::TextEdit::singleline(&mut self.new_exercise_name).hint_text("New exercise name"),
            );
            let entered = resp.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
            if ui.button("Add").clicked() || entered {
                let name = self.new_exercise_name.trim().to_string();
                if name.is_empty() {
                    self.alert(ValidationError::EmptyExerciseName.to_string());
                } else {
                    self.request(StorageRequest::CreateExercise(name));
                    self.new_exercise_name.clear();
                }
            }
        });
        ui.separator();

        if self.exercises.is_empty() {
            ui.label("No exercises yet.");
            return;
        }

        let mut start_rename = None;
        let mut save_rename = None;
        let mut cancel_rename = false;
        let mut delete = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for ex in &self.exercises {
                ui.horizontal(|ui| match &mut self.renaming {
                    Some((id, text)) if id == &ex.id => {
                        ui.text_edit_singleline(text);
                        if ui.button("Save").clicked() {
                            save_rename = Some((id.clone(), text.trim().to_string()));
                        }
                        if ui.button("Cancel").clicked() {
                            cancel_rename = true;
                        }
                    }
                    _ => {
                        ui.label(ex.name.as_str());
                        if ui.small_button("Rename").clicked() {
                            start_rename = Some((ex.id.clone(), ex.name.clone()));
                        }
                        if ui.small_button("Delete").clicked() {
                            delete = Some(ex.id.clone());
                        }
                    }
                });
            }
        });

        if let Some(r) = start_rename {
            self.renaming = Some(r);
        }
        if cancel_rename {
            self.renaming = None;
        }
        if let Some((id, name)) = save_rename {
            if name.is_empty() {
                self.alert(ValidationError::EmptyExerciseName.to_string());
            } else {
                self.renaming = None;
                self.request(StorageRequest::RenameExercise(id, name));
            }
        }
        if let Some(id) = delete {
            self.confirm(
                "Delete this exercise? This will not remove past workouts.",
                Pending::DeleteExercise(id),
            );
        }
    }

    fn new_workout_view(&mut self, ui: &mut egui::Ui) {
        ui.heading("New Workout");
        match self.editor.mode() {
            EditorMode::Chooser => self.chooser(ui),
            EditorMode::Builder => self.builder(ui),
        }
    }

    fn chooser(&mut self, ui: &mut egui::Ui) {
        let mut intent = None;
        if ui.button("Start Fresh").clicked() {
            intent = Some(EditorIntent::StartFresh);
        }
        ui.add_space(8.0);
        ui.label(RichText::new("Or start from a recent workout").strong());
        if self.workouts.is_empty() {
            ui.label("No past workouts yet.");
        }
        for w in self.workouts.iter().take(RECENT_WORKOUTS) {
            ui.horizontal(|ui| {
                ui.label(w.name.as_str());
                ui.label(
                    RichText::new(format!(
                        "{} • {} exercises",
                        format_label(&w.date),
                        w.entries.len()
                    ))
                    .small(),
                );
                if ui.small_button("Start").clicked() {
                    intent = Some(EditorIntent::StartFromRecent(w.clone()));
                }
            });
        }
        if let Some(intent) = intent {
            self.dispatch(intent);
        }
    }

    fn builder(&mut self, ui: &mut egui::Ui) {
        let saving = self.editor.is_saving();
        let wizard_open = self.editor.wizard().is_open();

        if saving {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Saving…");
            });
        }

        let mut intent = None;
        ui.add_enabled_ui(!saving, |ui| {
            ui.horizontal(|ui| {
                if ui.button("← Back").clicked() {
                    intent = Some(EditorIntent::BackToChooser);
                }
                let mut name = self.editor.draft().name.clone();
                if ui
                    .add(egui::TextEdit::singleline(&mut name).hint_text("Workout name"))
                    .changed()
                {
                    intent = Some(EditorIntent::Rename(name));
                }
            });

            if self.exercises.is_empty() {
                ui.label("Add exercises first in Manage Exercises.");
            } else {
                if let Some(id) = &self.selected_exercise {
                    if !self.exercises.iter().any(|e| &e.id == id) {
                        self.selected_exercise = None;
                    }
                }
                ui.add_enabled_ui(!wizard_open, |ui| {
                    ui.horizontal(|ui| {
                        let selected_text = self
                            .selected_exercise
                            .as_ref()
                            .map(|id| exercise_name(&self.exercises, id))
                            .unwrap_or("Select exercise");
                        egui::ComboBox::from_id_source("builder_exercise")
                            .selected_text(selected_text)
                            .show_ui(ui, |ui| {
                                for ex in &self.exercises {
                                    ui.selectable_value(
                                        &mut self.selected_exercise,
                                        Some(ex.id.clone()),
                                        ex.name.as_str(),
                                    );
                                }
                            });
                        ui.label("Sets");
                        if ui.small_button("−").clicked() {
                            self.set_count = step_count(self.set_count, -1);
                        }
                        ui.label(self.set_count.to_string());
                        if ui.small_button("+").clicked() {
                            self.set_count = step_count(self.set_count, 1);
                        }
                        let add = egui::Button::new("Add Exercise");
                        if ui.add_enabled(self.selected_exercise.is_some(), add).clicked() {
                            if let Some(exercise_id) = self.selected_exercise.clone() {
                                intent = Some(EditorIntent::BeginSets {
                                    exercise_id,
                                    total: self.set_count,
                                });
                            }
                        }
                    });
                });
            }
        });
        if let Some(intent) = intent {
            self.dispatch(intent);
        }

        ui.separator();
        self.plan_list(ui);
        ui.add_space(8.0);
        self.wizard_panel(ui);
        ui.add_space(8.0);

        let finish = egui::Button::new("Finish Workout");
        if ui.add_enabled(!saving && !wizard_open, finish).clicked() {
            self.dispatch(EditorIntent::RequestFinish);
        }
    }

    fn plan_list(&mut self, ui: &mut egui::Ui) {
        let entries: Vec<DraftEntry> = self.editor.draft().entries().to_vec();
        if entries.is_empty() {
            ui.label("No exercises in this workout yet.");
            return;
        }
        let enabled = !self.editor.is_saving() && !self.editor.wizard().is_open();
        let top = ui.cursor().top();
        let left = ui.cursor().left();
        let width = ui.available_width();

        if self.editor.drag().is_active() {
            let others: Vec<EntryKey> = self.editor.drag().others().to_vec();
            let placeholder = self.editor.drag().placeholder_index().unwrap_or(0);
            let height = self.editor.drag().dragged_height().unwrap_or(0.0);
            let mut spans = Vec::with_capacity(others.len());
            for (i, key) in others.iter().enumerate() {
                if i == placeholder {
                    placeholder_slot(ui, height);
                }
                if let Some(entry) = entries.iter().find(|e| &e.key == key) {
                    let name = exercise_name(&self.exercises, &entry.exercise_id);
                    let (rect, _) = plan_row(ui, entry, name, false, false);
                    spans.push(Span::new(rect.top() - top, rect.height()));
                }
            }
            if placeholder >= others.len() {
                placeholder_slot(ui, height);
            }
            let container_height = ui.cursor().top() - top;
            self.drive_drag(ui.ctx(), &entries, pos2(left, top), width, container_height, &spans);
            return;
        }

        let mut action = None;
        for entry in &entries {
            let name = exercise_name(&self.exercises, &entry.exercise_id);
            let (rect, a) = plan_row(ui, entry, name, enabled, enabled && entries.len() > 1);
            if a != RowAction::None {
                action = Some((entry.key.clone(), a, rect));
            }
        }
        let Some((key, action, rect)) = action else {
            return;
        };
        match action {
            RowAction::Edit => self.dispatch(EditorIntent::EditEntry(key)),
            RowAction::Remove => self.dispatch(EditorIntent::RemoveEntry(key)),
            RowAction::StartDrag => {
                let pointer_y = ui
                    .ctx()
                    .input(|i| i.pointer.interact_pos())
                    .map_or(rect.center().y, |p| p.y);
                let order = self.editor.draft().keys();
                let item = Span::new(rect.top() - top, rect.height());
                if self.editor.drag_mut().start(&order, &key, item, pointer_y - top) {
                    ui.ctx().request_repaint();
                }
            }
            RowAction::None => {}
        }
    }

    /// Feed pointer input to the drag controller and draw the floating row.
    fn drive_drag(
        &mut self,
        ctx: &egui::Context,
        entries: &[DraftEntry],
        origin: egui::Pos2,
        width: f32,
        container_height: f32,
        spans: &[Span],
    ) {
        let (pointer, down, released, escape) = ctx.input(|i| {
            (
                i.pointer.interact_pos(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.key_pressed(Key::Escape),
            )
        });
        if escape {
            self.editor.drag_mut().cancel();
            return;
        }
        if released {
            if let Some(order) = self.editor.drag_mut().release() {
                self.dispatch(EditorIntent::Reorder(order));
            }
            return;
        }
        let Some(pointer) = pointer.filter(|_| down) else {
            self.editor.drag_mut().cancel();
            return;
        };

        let local_y = pointer.y - origin.y;
        self.editor.drag_mut().update(local_y, spans);

        let Some(key) = self.editor.drag().dragged_key().cloned() else {
            return;
        };
        let Some(entry) = entries.iter().find(|e| e.key == key) else {
            return;
        };
        let floating_top = self
            .editor
            .drag()
            .floating_top(local_y, container_height)
            .unwrap_or(0.0);
        let name = exercise_name(&self.exercises, &entry.exercise_id);
        egui::Area::new(egui::Id::new("dragged_entry"))
            .order(egui::Order::Foreground)
            .fixed_pos(pos2(origin.x, origin.y + floating_top))
            .show(ctx, |ui| {
                ui.set_width(width);
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    plan_row(ui, entry, name, false, false);
                });
            });
        ctx.request_repaint();
    }

    fn wizard_panel(&mut self, ui: &mut egui::Ui) {
        let Some(session) = self.editor.wizard().session() else {
            return;
        };
        let title = session.title(exercise_name(&self.exercises, session.exercise_id()));
        let set_label = session.set_label();
        let action_label = session.action_label();
        let chips = session.chips();
        let current = session.index();
        let step = self.settings.weight_step;

        let mut submit = false;
        let mut cancel = false;
        ui.group(|ui| {
            ui.label(RichText::new(title).heading());
            ui.label(set_label);
            ui.horizontal_wrapped(|ui| {
                for (i, chip) in chips.iter().enumerate() {
                    let text = RichText::new(chip.as_str()).small();
                    ui.label(if i == current { text.strong() } else { text });
                }
            });
            if let Some(form) = self.editor.wizard_mut().form_mut() {
                ui.horizontal(|ui| {
                    ui.label("Weight");
                    if ui.small_button("−").clicked() {
                        form.weight = step_weight(&form.weight, -step);
                    }
                    ui.add(
                        egui::TextEdit::singleline(&mut form.weight)
                            .desired_width(70.0)
                            .hint_text("bodyweight"),
                    );
                    if ui.small_button("+").clicked() {
                        form.weight = step_weight(&form.weight, step);
                    }
                    egui::ComboBox::from_id_source("wizard_unit")
                        .selected_text(form.unit.label())
                        .show_ui(ui, |ui| {
                            for unit in ALL_UNITS {
                                ui.selectable_value(&mut form.unit, unit, unit.label());
                            }
                        });
                });
                ui.horizontal(|ui| {
                    ui.label("Reps");
                    let resp = ui.add(egui::TextEdit::singleline(&mut form.reps).desired_width(50.0));
                    if resp.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                        submit = true;
                    }
                });
            }
            ui.horizontal(|ui| {
                if ui.button(action_label).clicked() {
                    submit = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });
        if submit {
            self.dispatch(EditorIntent::SubmitSet);
        } else if cancel {
            self.dispatch(EditorIntent::CancelSet);
        }
    }

    fn past_workouts_view(&mut self, ui: &mut egui::Ui) {
        ui.heading("Past Workouts");
        if self.workouts.is_empty() {
            ui.label("No workouts saved yet.");
            return;
        }

        let mut open = None;
        let mut delete = None;
        let row_height = ui.text_style_height(&egui::TextStyle::Body) + 6.0;
        ui.push_id("past_workouts_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(260.0)
                .column(Column::auto().at_least(160.0))
                .column(Column::auto())
                .column(Column::auto())
                .column(Column::remainder())
                .header(row_height, |mut header| {
                    header.col(|ui| {
                        ui.strong("Workout");
                    });
                    header.col(|ui| {
                        ui.strong("Date");
                    });
                    header.col(|ui| {
                        ui.strong("Exercises");
                    });
                    header.col(|_ui| {});
                })
                .body(|mut body| {
                    for w in &self.workouts {
                        body.row(row_height, |mut row| {
                            row.col(|ui| {
                                ui.label(w.name.as_str());
                            });
                            row.col(|ui| {
                                ui.label(format_label(&w.date));
                            });
                            row.col(|ui| {
                                ui.label(w.entries.len().to_string());
                            });
                            row.col(|ui| {
                                if ui.small_button("Open").clicked() {
                                    open = Some(w.id.clone());
                                }
                                if ui.small_button("Delete").clicked() {
                                    delete = Some(w.id.clone());
                                }
                            });
                        });
                    }
                });
        });

        if let Some(id) = open {
            self.open_workout = Some(id);
        }
        if let Some(id) = delete {
            self.confirm(
                "Delete this workout? This cannot be undone.",
                Pending::DeleteWorkout(id),
            );
        }

        let Some(workout) = self
            .open_workout
            .as_ref()
            .and_then(|id| self.workouts.iter().find(|w| &w.id == id))
        else {
            return;
        };
        ui.separator();
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(workout.name.as_str()).heading());
                ui.label(format_label(&workout.date));
            });
            for entry in &workout.entries {
                ui.label(RichText::new(exercise_name(&self.exercises, &entry.exercise_id)).strong());
                ui.label(RichText::new(summarize_sets(&entry.sets)).small());
            }
        });
    }

    /// Exercise shown on the progress view: the remembered one if it still
    /// exists, else the first.
    fn progress_exercise(&self) -> Option<ExerciseId> {
        self.settings
            .progress_exercise
            .as_ref()
            .and_then(|id| self.exercises.iter().find(|e| &e.id.0 == id))
            .or_else(|| self.exercises.first())
            .map(|e| e.id.clone())
    }

    fn progress_view(&mut self, ui: &mut egui::Ui) {
        ui.heading("Progress");
        if self.exercises.is_empty() {
            ui.label("No exercises yet.");
            return;
        }

        let current = self.progress_exercise();
        let mut selected = current.clone();
        let selected_text = selected
            .as_ref()
            .map(|id| exercise_name(&self.exercises, id))
            .unwrap_or("Select exercise");
        egui::ComboBox::from_id_source("progress_exercise")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for ex in &self.exercises {
                    ui.selectable_value(&mut selected, Some(ex.id.clone()), ex.name.as_str());
                }
            });
        if selected != current {
            self.settings.progress_exercise = selected.as_ref().map(|id| id.0.clone());
            self.settings_dirty = true;
            self.progress_dirty = true;
        }
        if self.progress_dirty {
            self.progress = match &selected {
                Some(id) => progress::gather(id, &self.workouts),
                None => ProgressData::default(),
            };
            self.progress_dirty = false;
        }

        if self.progress.labels.is_empty() {
            ui.label("No workouts recorded for this exercise yet.");
            return;
        }
        if self.progress.is_empty() {
            ui.label("Only bodyweight sets recorded; nothing to chart.");
        }

        let mut toggled = None;
        ui.horizontal_wrapped(|ui| {
            for (i, series) in self.progress.series.iter().enumerate() {
                let color = if series.visible {
                    series.color
                } else {
                    Color32::GRAY
                };
                let text = RichText::new(format!("● {}", series.label)).color(color);
                if ui.selectable_label(series.visible, text).clicked() {
                    toggled = Some(i);
                }
            }
        });
        if let Some(i) = toggled {
            self.progress.toggle(i);
        }

        let size = vec2(ui.available_width(), self.settings.chart_height);
        let (response, painter) = ui.allocate_painter(size, Sense::hover());
        let rect = response.rect;
        let mut canvas = PainterCanvas::new(&painter, rect);
        let layout = chart::render(&mut canvas, &self.progress, rect.size());

        let Some(pos) = response.hover_pos() else {
            return;
        };
        let local = pos2(pos.x - rect.min.x, pos.y - rect.min.y);
        let Some(hit) = hit_test(&layout, &self.progress, local) else {
            return;
        };
        if let Some(series) = self.progress.series.get(hit.series) {
            if let Some(point) = series.points.get(hit.point) {
                let center = rect.min + layout.point_px(point).to_vec2();
                painter.circle_stroke(center, 6.0, Stroke::new(2.0, series.color));
            }
        }
        if let Some(text) = tooltip_text(&self.progress, &hit) {
            response.on_hover_text_at_pointer(text);
        }
    }
}

/// One plan card. Returns its rectangle and what the user did with it.
fn plan_row(
    ui: &mut egui::Ui,
    entry: &DraftEntry,
    name: &str,
    enabled: bool,
    draggable: bool,
) -> (egui::Rect, RowAction) {
    let mut action = RowAction::None;
    let inner = ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            let sense = if draggable { Sense::drag() } else { Sense::hover() };
            let handle = ui.add(egui::Label::new(RichText::new("⋮⋮").strong()).sense(sense));
            if draggable {
                let handle = handle.on_hover_cursor(egui::CursorIcon::Grab);
                if handle.drag_started() {
                    action = RowAction::StartDrag;
                }
            }
            ui.vertical(|ui| {
                ui.label(RichText::new(name).strong());
                ui.label(RichText::new(summarize_sets(&entry.sets)).small());
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.add_enabled(enabled, egui::Button::new("Remove")).clicked() {
                    action = RowAction::Remove;
                }
                if ui.add_enabled(enabled, egui::Button::new("Edit")).clicked() {
                    action = RowAction::Edit;
                }
            });
        });
    });
    (inner.response.rect, action)
}

fn placeholder_slot(ui: &mut egui::Ui, height: f32) {
    let (rect, _) = ui.allocate_exact_size(vec2(ui.available_width(), height), Sense::hover());
    ui.painter()
        .rect_stroke(rect, 6.0, Stroke::new(1.0, Color32::from_gray(160)));
}

impl App for PumpingIronApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_storage();

        let modal_open = !self.modals.is_empty();
        let mut nav = None;
        egui::TopBottomPanel::top("nav_bar").show(ctx, |ui| {
            ui.add_enabled_ui(!modal_open, |ui| {
                ui.horizontal(|ui| {
                    for view in View::ALL {
                        if ui.selectable_label(self.view == view, view.title()).clicked() {
                            nav = Some(view);
                        }
                    }
                    ui.separator();
                    if ui.button("Settings").clicked() {
                        self.show_settings = true;
                    }
                    if let Some(backend) = self.backend {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(RichText::new(format!("Storage: {backend}")).small());
                        });
                    }
                });
            });
        });
        if let Some(view) = nav {
            self.navigate(view);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!modal_open, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| match self.view {
                        View::Home => self.home_view(ui),
                        View::Exercises => self.exercises_view(ui),
                        View::NewWorkout => self.new_workout_view(ui),
                        View::PastWorkouts => self.past_workouts_view(ui),
                        View::Progress => self.progress_view(ui),
                    });
            });
        });

        if self.show_settings {
            self.settings_window(ctx);
        }
        self.show_modal(ctx);

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let options = NativeOptions::default();
    eframe::run_native(
        "Pumping Iron",
        options,
        Box::new(|cc| Box::new(PumpingIronApp::new(&cc.egui_ctx))),
    )
}
