use crate::logic::{HttpPingApi, LauncherConfig, PING_API_GRACE, PollerSet, SharedState};
use crate::model::app_record::{icon_glyph, seed_apps, upsert};
use crate::model::{
    AppDraft, AppMode, AppRecord, AppState, DisplayStatus, DraftErrors, DraftField, ICON_OPTIONS,
    ThemeMode,
};
use eframe::egui;
use eframe::egui::{Color32, RichText};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tr::tr;
use tracing::{info, warn};

const TILE_WIDTH: f32 = 250.0;

/// Add/edit window state.
pub(crate) struct Editor {
    /// Id of the app being edited, `None` when adding a new one.
    editing: Option<String>,
    errors: DraftErrors,
}

enum TileAction {
    Edit,
    Delete,
}

pub struct HomelabLauncher {
    pub(crate) state: SharedState,
    pollers: Option<PollerSet>,
    pub search: String,
    pub draft: AppDraft,
    pub(crate) editor: Option<Editor>,
    pub(crate) deleting_app: Option<String>,
    pub(crate) notice: Option<String>,
    /// Shown until restart when live status cannot reach a ping API.
    api_warning: Option<String>,
}

/// Badge colors adapted for light/dark themes.
struct TileVisuals {
    pub is_dark: bool,
}

impl TileVisuals {
    fn from_ctx(ctx: &egui::Context) -> Self {
        Self {
            is_dark: ctx.style().visuals.dark_mode,
        }
    }

    fn status_color(&self, status: DisplayStatus) -> Color32 {
        match status {
            DisplayStatus::Online => {
                if self.is_dark {
                    Color32::from_rgb(0, 190, 140)
                } else {
                    Color32::from_rgb(0, 130, 95)
                }
            }
            DisplayStatus::Offline => Color32::from_rgb(213, 94, 0), // Vermilion
            DisplayStatus::Unknown => {
                if self.is_dark {
                    Color32::from_rgb(240, 228, 66)
                } else {
                    Color32::from_rgb(230, 159, 0)
                }
            }
            DisplayStatus::Checking => {
                if self.is_dark {
                    Color32::from_rgb(86, 180, 233)
                } else {
                    Color32::from_rgb(0, 114, 178)
                }
            }
        }
    }

    fn muted(&self) -> Color32 {
        if self.is_dark {
            Color32::from_gray(160)
        } else {
            Color32::from_gray(90)
        }
    }
}

fn mode_label(mode: AppMode) -> String {
    match mode {
        AppMode::Domain => tr!("Domain"),
        AppMode::HostPort => tr!("IP:Port"),
    }
}

impl HomelabLauncher {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        runtime: tokio::runtime::Handle,
        config: &LauncherConfig,
    ) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let stored = cc
            .storage
            .and_then(|storage| storage.get_string(eframe::APP_KEY));
        let apps = match stored.map(|serialized| serde_json::from_str::<AppState>(&serialized)) {
            Some(Ok(stored)) => stored.apps,
            Some(Err(err)) => {
                warn!(error = %err, "stored app list is unreadable, starting from examples");
                seed_apps()
            }
            None => seed_apps(),
        };
        info!(apps = apps.len(), ping_enabled = config.ping_enabled, "loaded app list");

        let state = Arc::new(Mutex::new(AppState::with_apps(apps, config.ping_enabled)));
        let api = Arc::new(
            HttpPingApi::new(config.api_base_url.clone())
                .with_request_timeout(config.probe_timeout + PING_API_GRACE),
        );
        let pollers = PollerSet::new(runtime, api, state.clone(), config.poll_interval);

        let mut app = Self::from_state(state);
        app.pollers = Some(pollers);
        app
    }

    /// Builds the UI over existing state without starting any pollers.
    pub fn from_state(state: SharedState) -> Self {
        Self {
            state,
            pollers: None,
            search: String::new(),
            draft: AppDraft::default(),
            editor: None,
            deleting_app: None,
            notice: None,
            api_warning: None,
        }
    }

    pub fn with_api_warning(mut self, warning: impl Into<String>) -> Self {
        self.api_warning = Some(warning.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open_add_dialog(&mut self) {
        self.draft = AppDraft::default();
        self.notice = None;
        self.editor = Some(Editor {
            editing: None,
            errors: DraftErrors::default(),
        });
    }

    pub fn open_edit_dialog(&mut self, app_id: &str) {
        let existing = self.lock().apps.iter().find(|app| app.id == app_id).cloned();
        if let Some(app) = existing {
            self.draft = AppDraft::from_record(&app);
            self.notice = None;
            self.editor = Some(Editor {
                editing: Some(app.id),
                errors: DraftErrors::default(),
            });
        }
    }

    pub fn is_editor_open(&self) -> bool {
        self.editor.is_some()
    }

    fn submit_draft(&mut self) {
        let editing = self.editor.as_ref().and_then(|editor| editor.editing.clone());
        let existing = editing
            .as_deref()
            .and_then(|id| self.lock().apps.iter().find(|app| app.id == id).cloned());

        match self.draft.validate(existing.as_ref()) {
            Ok(record) => {
                info!(app_id = %record.id, name = %record.name, "saved app");
                self.notice = Some(if existing.is_some() {
                    tr!("Changes saved successfully.")
                } else {
                    tr!("App added successfully.")
                });
                upsert(&mut self.lock().apps, record);
                self.editor = None;
            }
            Err(errors) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.errors = errors;
                }
            }
        }
    }

    fn apply_theme(&self, ctx: &egui::Context) {
        let mode = ThemeMode::for_time(chrono::Local::now().time());
        let wanted = if mode.is_dark() {
            egui::ThemePreference::Dark
        } else {
            egui::ThemePreference::Light
        };
        if ctx.options(|o| o.theme_preference) != wanted {
            ctx.options_mut(|o| o.theme_preference = wanted);
        }
    }

    pub fn ui_layout(&mut self, ctx: &egui::Context) {
        self.apply_theme(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            self.top_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.tile_grid(ui);
            });
        });

        self.editor_window(ctx);
        self.delete_window(ctx);
    }

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        let now = chrono::Local::now();
        let mode = ThemeMode::for_time(now.time());

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label(RichText::new("🕑").size(28.0));
            ui.vertical(|ui| {
                ui.label(RichText::new(now.format("%H:%M").to_string()).size(22.0).strong());
                ui.label(format!(
                    "{} · {}: {}",
                    now.format("%a, %b %-d"),
                    tr!("Mode"),
                    mode.label()
                ));
            });

            ui.separator();

            ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text(tr!("Search apps..."))
                    .desired_width(220.0),
            );

            if ui.button(tr!("Add app")).clicked() {
                self.open_add_dialog();
            }

            let mut enabled = self.lock().ping_enabled;
            if ui
                .checkbox(&mut enabled, tr!("Live status"))
                .on_hover_text(tr!("Check every app once a minute"))
                .changed()
            {
                self.lock().ping_enabled = enabled;
            }

            if let Some(warning) = &self.api_warning {
                ui.colored_label(Color32::from_rgb(213, 94, 0), format!("⚠ {warning}"));
            }

            if let Some(notice) = &self.notice {
                ui.label(RichText::new(notice.as_str()).italics());
            }
        });
        ui.add_space(6.0);
    }

    fn tile_grid(&mut self, ui: &mut egui::Ui) {
        let visible: Vec<(AppRecord, DisplayStatus)> = {
            let state = self.lock();
            state
                .apps
                .iter()
                .filter(|app| app.matches(&self.search))
                .map(|app| (app.clone(), state.status_of(&app.id)))
                .collect()
        };

        if visible.is_empty() {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(tr!("No apps match your search.")).size(16.0));
                ui.label(tr!("Add a new app to populate your dashboard."));
            });
            return;
        }

        let visuals = TileVisuals::from_ctx(ui.ctx());
        let mut to_edit = None;
        let mut to_delete = None;

        ui.horizontal_wrapped(|ui| {
            for (app, status) in &visible {
                match tile_ui(ui, &visuals, app, *status) {
                    Some(TileAction::Edit) => to_edit = Some(app.id.clone()),
                    Some(TileAction::Delete) => to_delete = Some(app.id.clone()),
                    None => {}
                }
            }
        });

        if let Some(app_id) = to_edit {
            self.open_edit_dialog(&app_id);
        }
        if to_delete.is_some() {
            self.deleting_app = to_delete;
        }
    }

    fn editor_window(&mut self, ctx: &egui::Context) {
        let Some(editor) = self.editor.as_ref() else {
            return;
        };
        let title = if editor.editing.is_some() {
            tr!("Edit app")
        } else {
            tr!("Add a new app")
        };
        let errors = editor.errors.clone();

        let mut open = true;
        let mut submit = false;
        let mut cancel = false;
        let draft = &mut self.draft;

        egui::Window::new(title)
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                egui::Grid::new("app_form")
                    .num_columns(2)
                    .spacing([8.0, 6.0])
                    .show(ui, |ui| {
                        ui.label(tr!("Name"));
                        ui.vertical(|ui| {
                            ui.add(egui::TextEdit::singleline(&mut draft.name).hint_text("Jellyfin"));
                            field_error(ui, &errors, DraftField::Name);
                        });
                        ui.end_row();

                        ui.label(tr!("Icon"));
                        ui.horizontal(|ui| {
                            egui::ComboBox::from_id_salt("icon_picker")
                                .selected_text(icon_glyph(Some(draft.icon.as_str())))
                                .show_ui(ui, |ui| {
                                    for name in ICON_OPTIONS {
                                        ui.selectable_value(
                                            &mut draft.icon,
                                            name.to_string(),
                                            format!("{} {}", icon_glyph(Some(name)), name),
                                        );
                                    }
                                });
                            ui.add(
                                egui::TextEdit::singleline(&mut draft.icon)
                                    .hint_text(tr!("Glyph name or image URL"))
                                    .desired_width(160.0),
                            );
                        });
                        ui.end_row();

                        ui.label(tr!("Address"));
                        ui.horizontal(|ui| {
                            ui.radio_value(&mut draft.mode, AppMode::Domain, mode_label(AppMode::Domain));
                            ui.radio_value(
                                &mut draft.mode,
                                AppMode::HostPort,
                                mode_label(AppMode::HostPort),
                            );
                        });
                        ui.end_row();

                        match draft.mode {
                            AppMode::Domain => {
                                ui.label(tr!("Domain"));
                                ui.vertical(|ui| {
                                    ui.text_edit_singleline(&mut draft.domain);
                                    field_error(ui, &errors, DraftField::Domain);
                                });
                                ui.end_row();
                            }
                            AppMode::HostPort => {
                                ui.label(tr!("IP or hostname"));
                                ui.vertical(|ui| {
                                    ui.add(
                                        egui::TextEdit::singleline(&mut draft.host)
                                            .hint_text("192.168.1.10"),
                                    );
                                    field_error(ui, &errors, DraftField::Host);
                                });
                                ui.end_row();

                                ui.label(tr!("Port"));
                                ui.vertical(|ui| {
                                    ui.add(
                                        egui::TextEdit::singleline(&mut draft.port)
                                            .hint_text("8080")
                                            .desired_width(80.0),
                                    );
                                    field_error(ui, &errors, DraftField::Port);
                                });
                                ui.end_row();
                            }
                        }

                        ui.label(tr!("Description"));
                        ui.text_edit_singleline(&mut draft.description);
                        ui.end_row();

                        ui.label(tr!("Tags"));
                        ui.add(
                            egui::TextEdit::singleline(&mut draft.tags)
                                .hint_text(tr!("media, storage")),
                        );
                        ui.end_row();
                    });

                if !errors.fields.is_empty() {
                    ui.add_space(6.0);
                    ui.colored_label(
                        Color32::from_rgb(213, 94, 0),
                        tr!("Please correct the highlighted fields."),
                    );
                }

                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button(tr!("Save")).clicked() {
                        submit = true;
                    }
                    if ui.button(tr!("Cancel")).clicked() {
                        cancel = true;
                    }
                });
            });

        if submit {
            self.submit_draft();
        }
        if cancel || !open {
            self.editor = None;
        }
    }

    fn delete_window(&mut self, ctx: &egui::Context) {
        let Some(app_id) = self.deleting_app.clone() else {
            return;
        };
        let name = self
            .lock()
            .apps
            .iter()
            .find(|app| app.id == app_id)
            .map(|app| app.name.clone())
            .unwrap_or_else(|| app_id.clone());

        egui::Window::new(tr!("Confirm Deletion"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!(
                    "{}: {}?",
                    tr!("Are you sure you want to remove this app"),
                    name
                ));
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button(tr!("Delete")).clicked() {
                        self.lock().apps.retain(|app| app.id != app_id);
                        info!(app_id = %app_id, "removed app");
                        self.deleting_app = None;
                    }
                    if ui.button(tr!("Cancel")).clicked() {
                        self.deleting_app = None;
                    }
                });
            });
    }
}

fn field_error(ui: &mut egui::Ui, errors: &DraftErrors, field: DraftField) {
    if let Some(message) = errors.get(field) {
        ui.colored_label(Color32::from_rgb(213, 94, 0), RichText::new(message).small());
    }
}

fn tile_ui(
    ui: &mut egui::Ui,
    visuals: &TileVisuals,
    app: &AppRecord,
    status: DisplayStatus,
) -> Option<TileAction> {
    let mut action = None;

    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(TILE_WIDTH);
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                match app.icon.as_deref() {
                    Some(uri) if app.icon_is_image_url() => {
                        ui.add(egui::Image::new(uri).fit_to_exact_size(egui::vec2(40.0, 40.0)));
                    }
                    icon => {
                        ui.label(RichText::new(icon_glyph(icon)).size(30.0));
                    }
                }
                ui.vertical(|ui| {
                    ui.label(RichText::new(app.name.as_str()).strong().size(16.0));
                    if let Some(description) = app.description.as_deref() {
                        ui.label(RichText::new(description).color(visuals.muted()));
                    }
                });
            });

            ui.colored_label(
                visuals.status_color(status),
                RichText::new(format!("● {}", status.label())).strong(),
            );

            ui.horizontal(|ui| {
                ui.label(RichText::new(mode_label(app.mode)).small().monospace());
                ui.label(RichText::new(app.display_address()).monospace());
            });

            if !app.tags.is_empty() {
                ui.horizontal_wrapped(|ui| {
                    for tag in &app.tags {
                        ui.label(RichText::new(format!("#{tag}")).small().color(visuals.muted()));
                    }
                });
            }

            ui.horizontal(|ui| {
                let target = app.target_url();
                if target.is_empty() {
                    ui.add_enabled(false, egui::Button::new(tr!("Open")));
                } else {
                    ui.hyperlink_to(tr!("Open"), target);
                }
                if ui.button("✏").clicked() {
                    action = Some(TileAction::Edit);
                }
                if ui.button("x").clicked() {
                    action = Some(TileAction::Delete);
                }
            });
        });
    });

    action
}

impl eframe::App for HomelabLauncher {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let serialized = serde_json::to_string_pretty(&*self.lock());
        match serialized {
            Ok(serialized) => storage.set_string(eframe::APP_KEY, serialized),
            Err(err) => warn!(error = %err, "failed to serialize app list"),
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(pollers) = self.pollers.as_mut() {
            pollers.sync();
        }
        self.ui_layout(ctx);
        ctx.request_repaint_after(Duration::from_millis(1000));
    }
}
