// Main application state and UI rendering logic for the virtual environment manager

// Environment discovery, actions, theming and the background runner
use crate::gui::{
    action_button, color_swatch, env_actions, env_scanner, plain_button, section_card,
    tasks::{EXIT_GRACE, TaskRunner},
    theme::{self, Palette},
};
// Data models shared with the worker threads
use crate::models::settings::interpreter_is_executable;
use crate::models::{CreateRequest, Settings, TaskKind, TaskMessage, TaskSuccess, ThemeKind};
// Import egui for UI rendering
use eframe::egui;
// Collections for dialog queues and in-flight bookkeeping
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
// Paths for environment roots and import sources
use std::path::{Path, PathBuf};
// Duration and Instant for the title and busy animations
use std::time::{Duration, Instant};

/// The two tabs of the main window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Environments,
    Settings,
}

/// Everything a widget can ask the application to do.
/// Rendering only records actions; [`AppState::perform`] carries them out
/// after the frame's widgets are laid out.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Select(usize),
    Activate,
    OpenCreate,
    BrowseCreatePython,
    SubmitCreate,
    CancelCreate,
    Import,
    SubmitImport,
    CancelImport,
    Delete,
    ConfirmYes,
    ConfirmNo,
    Refresh,
    ChangeDirectory,
    BrowsePython,
    PythonPathEdited,
    SaveSettings,
    SetTheme(ThemeKind),
    OpenColors,
    ApplyColors,
    CancelColors,
    ShowAbout,
    CloseAbout,
    DismissMessage,
}

/// Severity of a message dialog
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Error,
}

/// A queued message dialog.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageBox {
    pub title: String,
    pub body: String,
    pub level: MessageLevel,
}

/// A queued yes/no question.
#[derive(Clone, Debug, PartialEq)]
pub enum Confirm {
    /// Delete a managed environment
    DeleteEnv(String),
    /// Delete the source directory of a finished import
    DeleteOriginal { source: PathBuf, name: String },
}

impl Confirm {
    fn title(&self) -> &'static str {
        match self {
            Confirm::DeleteEnv(_) => "Confirm Delete",
            Confirm::DeleteOriginal { .. } => "Delete Original",
        }
    }

    fn question(&self) -> String {
        match self {
            Confirm::DeleteEnv(name) => format!("Are you sure you want to delete '{}'?", name),
            Confirm::DeleteOriginal { source, name } => format!(
                "Environment '{}' has been imported successfully. \
                 Do you want to delete the original environment at:\n{}?",
                name,
                source.display()
            ),
        }
    }
}

/// Fields of the create dialog.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateForm {
    pub name: String,
    pub python_path: String,
    pub packages: String,
    pub system_site_packages: bool,
    pub without_pip: bool,
}

impl CreateForm {
    fn to_request(&self) -> CreateRequest {
        CreateRequest {
            name: self.name.trim().to_string(),
            python_path: PathBuf::from(self.python_path.trim()),
            packages: self.packages.clone(),
            system_site_packages: self.system_site_packages,
            without_pip: self.without_pip,
        }
    }
}

/// Fields of the import dialog.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportForm {
    /// Directory picked by the user
    pub source: PathBuf,
    /// Name the copy gets under the root path
    pub name: String,
}

/// Working copy of the palette while the customize dialog is open.
#[derive(Clone, Debug, PartialEq)]
struct ColorEditor {
    colors: Vec<(&'static str, [u8; 3])>,
}

/// Main application state for the eframe app.
/// Owns the settings, the environment list and every open dialog; only the
/// UI thread touches it.
pub struct AppState {
    /// Loaded at startup, written on explicit save
    settings: Settings,

    /// Where settings are saved; `None` means the per-user default location
    settings_path: Option<PathBuf>,

    /// Colors resolved from the theme and custom overrides
    palette: Palette,

    /// Set when the palette changed and egui's visuals must be refreshed
    theme_dirty: bool,

    /// Environment names from the last scan
    envs: Vec<String>,

    /// Index into `envs` of the highlighted row
    selected: Option<usize>,

    /// Status bar text
    status: String,

    /// Active tab
    view: View,

    /// Spawns workers and hands their results back
    tasks: TaskRunner,

    /// Tasks that have not reported back yet, by id
    in_flight: BTreeMap<u64, (TaskKind, String)>,

    /// Environment names with a create/import/delete/activate running
    busy_names: HashSet<String>,

    /// Name each task holds in `busy_names`, by task id
    locks: HashMap<u64, String>,

    /// When the busy dialog last appeared, for the dots animation
    busy_since: Instant,

    /// Interpreter text field on the settings tab
    python_path_input: String,

    /// Whether `python_path_input` resolves to an executable
    python_ok: bool,

    /// Open create dialog
    create_form: Option<CreateForm>,

    /// Open import dialog
    import_form: Option<ImportForm>,

    /// Open customize colors dialog
    color_editor: Option<ColorEditor>,

    /// Pending yes/no questions, front one is shown
    confirms: VecDeque<Confirm>,

    /// Pending message dialogs, front one is shown
    messages: VecDeque<MessageBox>,

    /// About window visibility
    show_about: bool,

    /// Application start, drives the title animation
    started: Instant,
}

impl AppState {
    /// Creates the application state from the persisted settings and
    /// performs the first scan.
    ///
    /// # Arguments
    /// * `cc` - eframe creation context containing egui context
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::load();
        settings.ensure_venv_dir();
        Self::with_settings(settings, None, Some(cc.egui_ctx.clone()))
    }

    /// Builds the state around explicit settings. `ctx` is used to wake the
    /// UI when background work finishes and may be `None` outside a window.
    pub fn with_settings(
        settings: Settings,
        settings_path: Option<PathBuf>,
        ctx: Option<egui::Context>,
    ) -> Self {
        let palette = Palette::resolve(&settings);
        if let Some(ctx) = &ctx {
            theme::apply(ctx, settings.theme, &palette);
        }
        let python_path_input = settings.python_path.display().to_string();
        let python_ok = settings.python_is_executable();

        let mut s = Self {
            settings,
            settings_path,
            palette,
            theme_dirty: false,
            envs: Vec::new(),
            selected: None,
            status: "Ready".to_string(),
            view: View::Environments,
            tasks: TaskRunner::new(ctx),
            in_flight: BTreeMap::new(),
            busy_names: HashSet::new(),
            locks: HashMap::new(),
            busy_since: Instant::now(),
            python_path_input,
            python_ok,
            create_form: None,
            import_form: None,
            color_editor: None,
            confirms: VecDeque::new(),
            messages: VecDeque::new(),
            show_about: false,
            started: Instant::now(),
        };

        s.refresh();
        s
    }

    pub fn envs(&self) -> &[String] {
        &self.envs
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn messages(&self) -> &VecDeque<MessageBox> {
        &self.messages
    }

    pub fn pending_confirm(&self) -> Option<&Confirm> {
        self.confirms.front()
    }

    pub fn create_form_mut(&mut self) -> Option<&mut CreateForm> {
        self.create_form.as_mut()
    }

    pub fn import_form_mut(&mut self) -> Option<&mut ImportForm> {
        self.import_form.as_mut()
    }

    /// Number of background tasks that have not reported back.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Carries out one user action.
    pub fn perform(&mut self, action: Action) {
        match action {
            Action::Select(i) => {
                if i < self.envs.len() {
                    self.selected = Some(i);
                }
            }
            Action::Activate => self.activate_selected(),
            Action::OpenCreate => {
                self.create_form = Some(CreateForm {
                    python_path: self.settings.python_path.display().to_string(),
                    ..Default::default()
                });
            }
            Action::BrowseCreatePython => {
                if let Some(path) = pick_python_executable() {
                    if let Some(form) = &mut self.create_form {
                        form.python_path = path.display().to_string();
                    }
                }
            }
            Action::SubmitCreate => self.submit_create(),
            Action::CancelCreate => self.create_form = None,
            Action::Import => {
                if let Some(source) = rfd::FileDialog::new()
                    .set_title("Select Virtual Environment Directory")
                    .pick_folder()
                {
                    self.open_import_form(source);
                }
            }
            Action::SubmitImport => self.submit_import(),
            Action::CancelImport => self.import_form = None,
            Action::Delete => {
                if let Some(name) = self.selected_env("delete") {
                    self.confirms.push_back(Confirm::DeleteEnv(name));
                }
            }
            Action::ConfirmYes => self.answer_confirm(true),
            Action::ConfirmNo => self.answer_confirm(false),
            Action::Refresh => self.refresh(),
            Action::ChangeDirectory => {
                if let Some(dir) = rfd::FileDialog::new()
                    .set_title("Select Directory for Virtual Environments")
                    .pick_folder()
                {
                    self.set_venv_dir(dir);
                }
            }
            Action::BrowsePython => {
                if let Some(path) = pick_python_executable() {
                    self.python_path_input = path.display().to_string();
                    self.perform(Action::PythonPathEdited);
                }
            }
            Action::PythonPathEdited => {
                self.python_ok =
                    interpreter_is_executable(Path::new(self.python_path_input.trim()));
            }
            Action::SaveSettings => self.save_settings_from_ui(),
            Action::SetTheme(kind) => {
                self.settings.theme = kind;
                self.reload_palette();
            }
            Action::OpenColors => {
                let colors = theme::SLOTS
                    .iter()
                    .filter_map(|slot| {
                        self.palette
                            .get(slot)
                            .map(|c| (*slot, [c.r(), c.g(), c.b()]))
                    })
                    .collect();
                self.color_editor = Some(ColorEditor { colors });
            }
            Action::ApplyColors => {
                if let Some(editor) = self.color_editor.take() {
                    let mut edited = self.palette;
                    for (slot, [r, g, b]) in &editor.colors {
                        edited.set(slot, egui::Color32::from_rgb(*r, *g, *b));
                    }
                    self.settings.custom_colors = Some(edited.to_custom_colors());
                    self.reload_palette();
                }
            }
            Action::CancelColors => self.color_editor = None,
            Action::ShowAbout => self.show_about = true,
            Action::CloseAbout => self.show_about = false,
            Action::DismissMessage => {
                self.messages.pop_front();
            }
        }
    }

    /// Rescans the root path and updates the list and status bar.
    /// Keeps the highlighted environment selected if it still exists.
    pub fn refresh(&mut self) {
        let previous = self.selected.and_then(|i| self.envs.get(i).cloned());
        match env_scanner::scan_environments(&self.settings.venv_dir) {
            Ok(list) => {
                self.status = env_scanner::scan_status(list.len());
                self.envs = list;
            }
            Err(e @ crate::error::VenvError::RootNotFound(_)) => {
                self.envs.clear();
                self.status = e.to_string();
            }
            Err(e) => {
                self.envs.clear();
                self.status = format!("Error: {}", e);
                self.error("Error", format!("Failed to list environments: {}", e));
            }
        }
        self.selected = previous.and_then(|name| self.envs.iter().position(|e| *e == name));
    }

    /// Drains finished background tasks. Call once per frame.
    pub fn poll_tasks(&mut self) {
        for msg in self.tasks.poll() {
            self.handle_task_message(msg);
        }
    }

    /// Pre-fills the import dialog for `source`.
    pub fn open_import_form(&mut self, source: PathBuf) {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.import_form = Some(ImportForm { source, name });
    }

    /// Points the manager at a new root path, saves and rescans.
    pub fn set_venv_dir(&mut self, dir: PathBuf) {
        self.settings.venv_dir = dir;
        if self.save_settings() {
            self.refresh();
            self.status = format!(
                "Environment directory changed to {}",
                self.settings.venv_dir.display()
            );
        }
    }

    fn handle_task_message(&mut self, msg: TaskMessage) {
        self.in_flight.remove(&msg.id);
        if let Some(key) = self.locks.remove(&msg.id) {
            self.busy_names.remove(&key);
        }

        match msg.result {
            Ok(success) => {
                if matches!(
                    success,
                    TaskSuccess::Created
                        | TaskSuccess::Deleted
                        | TaskSuccess::Imported { .. }
                        | TaskSuccess::OriginalDeleted
                ) {
                    self.refresh();
                }
                if let TaskSuccess::Imported { source, .. } = &success {
                    self.confirms.push_back(Confirm::DeleteOriginal {
                        source: source.clone(),
                        name: msg.env_name.clone(),
                    });
                }
                self.status = success.status_message(&msg.env_name);
            }
            Err(e) => {
                self.error(msg.kind.failure_title(), e.to_string());
                self.status = msg.kind.failure_status().to_string();
            }
        }
    }

    /// Starts a background task unless `name` already has one running.
    fn dispatch<F>(&mut self, kind: TaskKind, name: &str, work: F)
    where
        F: FnOnce() -> Result<TaskSuccess, crate::error::VenvError> + Send + 'static,
    {
        self.dispatch_locked(kind, name, Some(name.to_string()), work);
    }

    /// Starts a background task reported under `name`. When `lock` is set the
    /// task holds that environment name until it reports back, and is refused
    /// if another task already holds it.
    fn dispatch_locked<F>(&mut self, kind: TaskKind, name: &str, lock: Option<String>, work: F)
    where
        F: FnOnce() -> Result<TaskSuccess, crate::error::VenvError> + Send + 'static,
    {
        if let Some(key) = &lock {
            if !self.busy_names.insert(key.clone()) {
                self.status = format!("'{}' is busy with another operation", key);
                return;
            }
        }
        if self.in_flight.is_empty() {
            self.busy_since = Instant::now();
        }
        let id = self.tasks.spawn(kind, name, work);
        self.in_flight.insert(id, (kind, name.to_string()));
        if let Some(key) = lock {
            self.locks.insert(id, key);
        }
    }

    /// Environment name `path` is listed under when it sits directly in the root path.
    fn managed_name(&self, path: &Path) -> Option<String> {
        let root = self.settings.venv_dir.canonicalize().ok()?;
        let path = path.canonicalize().ok()?;
        if path.parent() != Some(root.as_path()) {
            return None;
        }
        path.file_name().map(|n| n.to_string_lossy().into_owned())
    }

    fn selected_env(&mut self, verb: &str) -> Option<String> {
        let name = self.selected.and_then(|i| self.envs.get(i).cloned());
        if name.is_none() {
            self.info(
                "Selection Required",
                format!("Please select a virtual environment to {}", verb),
            );
        }
        name
    }

    fn activate_selected(&mut self) {
        let Some(name) = self.selected_env("activate") else {
            return;
        };
        let root = self.settings.venv_dir.clone();
        if let Err(e) = env_actions::require_activation_script(&root, &name) {
            self.error("Error", e.to_string());
            return;
        }
        let env = name.clone();
        self.dispatch(TaskKind::Activate, &name, move || {
            env_actions::activate_environment(&root, &env)
        });
    }

    fn submit_create(&mut self) {
        let Some(form) = &self.create_form else {
            return;
        };
        let req = form.to_request();
        let root = self.settings.venv_dir.clone();

        // Rejected here so no process ever starts for a bad or taken name
        if let Err(e) = env_actions::check_new_target(&root, &req.name) {
            self.error("Error", e.to_string());
            return;
        }

        self.create_form = None;
        let name = req.name.clone();
        self.dispatch(TaskKind::Create, &name, move || {
            env_actions::create_environment(&root, &req)
        });
    }

    fn submit_import(&mut self) {
        let Some(form) = &self.import_form else {
            return;
        };
        let name = form.name.trim().to_string();
        let source = form.source.clone();
        let root = self.settings.venv_dir.clone();

        if let Err(e) = env_actions::check_new_target(&root, &name) {
            self.error("Error", e.to_string());
            return;
        }

        self.import_form = None;
        let env = name.clone();
        self.dispatch(TaskKind::Import, &name, move || {
            env_actions::import_environment(&root, &source, &env)
        });
    }

    fn answer_confirm(&mut self, yes: bool) {
        let Some(confirm) = self.confirms.pop_front() else {
            return;
        };
        if !yes {
            return;
        }
        match confirm {
            Confirm::DeleteEnv(name) => {
                let root = self.settings.venv_dir.clone();
                let env = name.clone();
                self.dispatch(TaskKind::Delete, &name, move || {
                    env_actions::delete_environment(&root, &env)
                });
            }
            Confirm::DeleteOriginal { source, name } => {
                // A source picked from inside the root is itself a listed environment
                let lock = self.managed_name(&source);
                self.dispatch_locked(TaskKind::DeleteOriginal, &name, lock, move || {
                    env_actions::delete_original(&source)
                });
            }
        }
    }

    fn save_settings_from_ui(&mut self) {
        self.settings.python_path = PathBuf::from(self.python_path_input.trim());
        if self.save_settings() {
            self.info("Settings Saved", "Your settings have been saved successfully");
            self.status = "Settings saved".to_string();
        }
    }

    /// Writes the settings; a failure becomes an error dialog.
    fn save_settings(&mut self) -> bool {
        let result = match &self.settings_path {
            Some(path) => self.settings.save_to(path),
            None => self.settings.save(),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("could not save settings: {:#}", e);
                self.error("Save Error", format!("Could not save settings: {:#}", e));
                false
            }
        }
    }

    fn reload_palette(&mut self) {
        self.palette = Palette::resolve(&self.settings);
        self.theme_dirty = true;
    }

    fn info(&mut self, title: &str, body: impl Into<String>) {
        self.messages.push_back(MessageBox {
            title: title.to_string(),
            body: body.into(),
            level: MessageLevel::Info,
        });
    }

    fn error(&mut self, title: &str, body: impl Into<String>) {
        self.messages.push_back(MessageBox {
            title: title.to_string(),
            body: body.into(),
            level: MessageLevel::Error,
        });
    }

    /// Environment list with the action buttons underneath.
    fn environments_view(&self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        let list_height = (ui.available_height() - 50.0).max(80.0);
        section_card(ui, "Available Environments", |ui| {
            egui::ScrollArea::vertical()
                .max_height(list_height)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for (i, env) in self.envs.iter().enumerate() {
                        let text = egui::RichText::new(format!("{}. {}", i + 1, env)).monospace();
                        let row = ui.selectable_label(self.selected == Some(i), text);
                        if row.clicked() {
                            actions.push(Action::Select(i));
                        }
                        // Double-click to activate
                        if row.double_clicked() {
                            actions.push(Action::Select(i));
                            actions.push(Action::Activate);
                        }
                    }
                });
        });

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let p = &self.palette;
            if action_button(ui, "Activate", p.primary).clicked() {
                actions.push(Action::Activate);
            }
            if action_button(ui, "Create New", p.secondary).clicked() {
                actions.push(Action::OpenCreate);
            }
            if action_button(ui, "Import", p.secondary).clicked() {
                actions.push(Action::Import);
            }
            if action_button(ui, "Delete", p.accent).clicked() {
                actions.push(Action::Delete);
            }
            if plain_button(ui, "Refresh", p.background, p.text).clicked() {
                actions.push(Action::Refresh);
            }
        });
    }

    /// Directory, interpreter and theme controls.
    fn settings_view(&mut self, ui: &mut egui::Ui, actions: &mut Vec<Action>) {
        let p = self.palette;
        egui::ScrollArea::vertical().show(ui, |ui| {
            section_card(ui, "Environment Directory", |ui| {
                ui.label("Current Directory:");
                ui.label(
                    egui::RichText::new(self.settings.venv_dir.display().to_string()).monospace(),
                );
                ui.add_space(4.0);
                if action_button(ui, "Change Directory", p.primary).clicked() {
                    actions.push(Action::ChangeDirectory);
                }
            });

            ui.add_space(8.0);
            section_card(ui, "Python Executable", |ui| {
                ui.horizontal(|ui| {
                    let edit = ui.add(
                        egui::TextEdit::singleline(&mut self.python_path_input)
                            .desired_width(ui.available_width() - 90.0),
                    );
                    if edit.changed() {
                        actions.push(Action::PythonPathEdited);
                    }
                    if plain_button(ui, "Browse", p.background, p.text).clicked() {
                        actions.push(Action::BrowsePython);
                    }
                });
                if !self.python_ok {
                    ui.colored_label(p.accent, "Interpreter not found or not executable");
                }
            });

            ui.add_space(8.0);
            section_card(ui, "Theme Settings", |ui| {
                ui.label("Choose Theme:");
                let mut theme = self.settings.theme;
                ui.radio_value(&mut theme, ThemeKind::Light, "Light");
                ui.radio_value(&mut theme, ThemeKind::Dark, "Dark");
                if theme != self.settings.theme {
                    actions.push(Action::SetTheme(theme));
                }
                ui.add_space(4.0);
                if plain_button(ui, "Customize Colors", p.background, p.text).clicked() {
                    actions.push(Action::OpenColors);
                }
            });

            ui.add_space(10.0);
            ui.vertical_centered(|ui| {
                if action_button(ui, "Save Settings", p.primary).clicked() {
                    actions.push(Action::SaveSettings);
                }
            });
        });
    }

    /// Create, import, colors, about, confirmation and message windows.
    fn dialogs(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let p = self.palette;

        if let Some(form) = &mut self.create_form {
            modal_window("Create New Virtual Environment").show(ctx, |ui| {
                egui::Grid::new("create_grid")
                    .num_columns(2)
                    .spacing([10.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Environment Name:");
                        ui.text_edit_singleline(&mut form.name);
                        ui.end_row();

                        ui.label("Python Executable:");
                        ui.horizontal(|ui| {
                            ui.text_edit_singleline(&mut form.python_path);
                            if ui.button("Browse").clicked() {
                                actions.push(Action::BrowseCreatePython);
                            }
                        });
                        ui.end_row();

                        ui.label("Packages to Install:");
                        ui.text_edit_singleline(&mut form.packages)
                            .on_hover_text("Space separated, e.g. requests flask");
                        ui.end_row();
                    });
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    ui.checkbox(&mut form.system_site_packages, "System site packages");
                    ui.checkbox(&mut form.without_pip, "Without pip");
                });
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if action_button(ui, "Create", p.secondary).clicked() {
                        actions.push(Action::SubmitCreate);
                    }
                    if plain_button(ui, "Cancel", p.background, p.text).clicked() {
                        actions.push(Action::CancelCreate);
                    }
                });
            });
        }

        if let Some(form) = &mut self.import_form {
            modal_window("Import Environment").show(ctx, |ui| {
                ui.label("Source:");
                ui.label(egui::RichText::new(form.source.display().to_string()).monospace());
                ui.add_space(4.0);
                ui.label("Enter name for imported environment:");
                ui.text_edit_singleline(&mut form.name);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if action_button(ui, "Import", p.secondary).clicked() {
                        actions.push(Action::SubmitImport);
                    }
                    if plain_button(ui, "Cancel", p.background, p.text).clicked() {
                        actions.push(Action::CancelImport);
                    }
                });
            });
        }

        if let Some(editor) = &mut self.color_editor {
            modal_window("Customize Colors").show(ctx, |ui| {
                egui::Grid::new("color_grid")
                    .num_columns(3)
                    .spacing([12.0, 8.0])
                    .show(ui, |ui| {
                        for (slot, rgb) in editor.colors.iter_mut() {
                            ui.label(format!("{}:", capitalize(*slot)));
                            ui.color_edit_button_srgb(rgb);
                            color_swatch(ui, egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2]));
                            ui.end_row();
                        }
                    });
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if action_button(ui, "Apply Colors", p.primary).clicked() {
                        actions.push(Action::ApplyColors);
                    }
                    if plain_button(ui, "Cancel", p.background, p.text).clicked() {
                        actions.push(Action::CancelColors);
                    }
                });
            });
        }

        if self.show_about {
            modal_window("About Python Virtual Environment Manager").show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new("Python Virtual Environment Manager")
                            .size(16.0)
                            .strong()
                            .color(p.primary),
                    );
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(8.0);
                    ui.label(
                        "A tool to create, manage, and activate Python virtual environments \
                         with an easy-to-use graphical interface.",
                    );
                    ui.add_space(8.0);
                    ui.label(egui::RichText::new("© PyVenvManager").small());
                    ui.add_space(8.0);
                    if action_button(ui, "OK", p.primary).clicked() {
                        actions.push(Action::CloseAbout);
                    }
                });
            });
        }

        if let Some(confirm) = self.confirms.front() {
            modal_window(confirm.title()).show(ctx, |ui| {
                ui.label(confirm.question());
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if action_button(ui, "Yes", p.accent).clicked() {
                        actions.push(Action::ConfirmYes);
                    }
                    if plain_button(ui, "No", p.background, p.text).clicked() {
                        actions.push(Action::ConfirmNo);
                    }
                });
            });
        }

        if let Some(msg) = self.messages.front() {
            modal_window(&msg.title).show(ctx, |ui| {
                let color = match msg.level {
                    MessageLevel::Info => p.text,
                    MessageLevel::Error => p.accent,
                };
                ui.colored_label(color, &msg.body);
                ui.add_space(8.0);
                if action_button(ui, "OK", p.primary).clicked() {
                    actions.push(Action::DismissMessage);
                }
            });
        }

        // Busy indicator while any worker is running
        if let Some((kind, name)) = self.in_flight.values().next_back() {
            let dots = theme::loading_dots(self.busy_since.elapsed());
            modal_window("Please Wait").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.add(egui::Spinner::new());
                    ui.label(format!("{} {}", kind.busy_message(name), dots));
                });
            });
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl eframe::App for AppState {
    /// Main UI update function called every frame.
    /// Applies finished background work, then lays out the window and runs
    /// whatever actions the widgets produced.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_tasks();

        if self.theme_dirty {
            theme::apply(ctx, self.settings.theme, &self.palette);
            self.theme_dirty = false;
        }

        // Keep the title animation moving
        ctx.request_repaint_after(Duration::from_millis(500));

        let mut actions = Vec::new();

        // TOP: menu, animated title and root path
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        actions.push(Action::ShowAbout);
                        ui.close_menu();
                    }
                });
            });
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new("Python Virtual Environment Manager")
                        .size(18.0)
                        .strong()
                        .color(theme::title_color(&self.palette, self.started.elapsed())),
                );
            });
            ui.horizontal(|ui| {
                ui.label("Environments Path:");
                ui.label(
                    egui::RichText::new(self.settings.venv_dir.display().to_string())
                        .monospace()
                        .size(11.0),
                );
            });
            ui.add_space(4.0);
        });

        // BOTTOM: status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.add_space(2.0);
            ui.label(&self.status);
            ui.add_space(2.0);
        });

        // CENTER: tabs
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.view, View::Environments, "Environments");
                ui.selectable_value(&mut self.view, View::Settings, "Settings");
            });
            ui.separator();
            match self.view {
                View::Environments => self.environments_view(ui, &mut actions),
                View::Settings => self.settings_view(ui, &mut actions),
            }
        });

        self.dialogs(ctx, &mut actions);

        for action in actions {
            self.perform(action);
        }
    }

    /// Gives running workers a short grace period before the window closes.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.tasks.shutdown(EXIT_GRACE);
    }
}

/// Fixed, centered window used for every dialog.
fn modal_window(title: &str) -> egui::Window<'static> {
    egui::Window::new(title.to_string())
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
}

/// Native file picker for an interpreter.
fn pick_python_executable() -> Option<PathBuf> {
    let dialog = rfd::FileDialog::new().set_title("Select Python Executable");
    let dialog = if cfg!(windows) {
        dialog.add_filter("Python", &["exe"])
    } else {
        dialog
    };
    dialog.pick_file()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
