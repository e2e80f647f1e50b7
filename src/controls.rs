// controls.rs — egui chrome around the viewer: menu bar, transport bar,
// loading / error overlays and the Open URL dialog.
//
// Drawing never touches the viewer directly; it returns `UiAction`s that the
// event loop applies after the egui pass.

use egui::{Align2, Color32, RichText};

use crate::i18n::{tr, tr_with, LANGUAGES};
use crate::viewer::ViewerSession;

pub const VOLUME_STEP: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    TogglePlay,
    Seek(f64),
    SetVolume(f32),
    ToggleFullscreen,
    OpenFile,
    OpenUrl(String),
    ResetView,
    SetLanguage(String),
    Quit,
}

/// UI-only state that outlives a single frame.
#[derive(Debug, Default)]
pub struct UiState {
    pub url_dialog_open: bool,
    pub url_input: String,
    pub lang: String,
}

/// `m:ss`, minutes unbounded. Negative and non-finite input reads as 0.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn format_progress(current: f64, duration: f64) -> String {
    format!("{} / {}", format_time(current), format_time(duration))
}

/// Centered status over the video: the error if any, else the loading notice.
fn status_text(session: &ViewerSession) -> Option<RichText> {
    if let Some(err) = &session.error {
        Some(
            RichText::new(tr_with("status.error", &[("err", err.clone())]))
                .size(18.0)
                .color(Color32::LIGHT_RED),
        )
    } else if session.loading {
        Some(
            RichText::new(tr("status.loading"))
                .size(20.0)
                .color(Color32::WHITE),
        )
    } else {
        None
    }
}

pub fn draw_ui(ctx: &egui::Context, session: &ViewerSession, state: &mut UiState) -> Vec<UiAction> {
    let mut actions = Vec::new();

    menu_bar(ctx, session, state, &mut actions);
    if session.controls_visible() {
        transport_bar(ctx, session, &mut actions);
    }

    if let Some(status) = status_text(session) {
        egui::Area::new("status_overlay")
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(status);
            });
    }
    egui::Area::new("hint")
        .anchor(Align2::CENTER_TOP, [0.0, 36.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(RichText::new(tr("status.hint")).color(Color32::from_white_alpha(180)));
        });

    if state.url_dialog_open {
        url_dialog(ctx, state, &mut actions);
    }
    actions
}

fn menu_bar(
    ctx: &egui::Context,
    session: &ViewerSession,
    state: &mut UiState,
    actions: &mut Vec<UiAction>,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(tr("menu.file"), |ui| {
                if ui.button(tr("menu.open_video")).clicked() {
                    actions.push(UiAction::OpenFile);
                    ui.close_menu();
                }
                if ui.button(tr("menu.open_url")).clicked() {
                    state.url_dialog_open = true;
                    ui.close_menu();
                }
                ui.separator();
                if ui.button(tr("menu.exit")).clicked() {
                    actions.push(UiAction::Quit);
                    ui.close_menu();
                }
            });

            ui.menu_button(tr("menu.view"), |ui| {
                if ui.button(tr("view.reset")).clicked() {
                    actions.push(UiAction::ResetView);
                    ui.close_menu();
                }
                let label = if session.fullscreen {
                    tr("view.fullscreen.exit")
                } else {
                    tr("view.fullscreen.enter")
                };
                if ui.button(label).clicked() {
                    actions.push(UiAction::ToggleFullscreen);
                    ui.close_menu();
                }
            });

            ui.menu_button(tr("menu.language"), |ui| {
                for (code, name) in LANGUAGES {
                    if ui.radio(state.lang == code, name).clicked() {
                        state.lang = code.to_string();
                        actions.push(UiAction::SetLanguage(code.to_string()));
                        ui.close_menu();
                    }
                }
            });
        });
    });
}

fn transport_bar(ctx: &egui::Context, session: &ViewerSession, actions: &mut Vec<UiAction>) {
    egui::TopBottomPanel::bottom("transport").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let play_label = if session.playing {
                tr("control.pause")
            } else {
                tr("control.play")
            };
            if ui.button(play_label).clicked() {
                actions.push(UiAction::TogglePlay);
            }

            ui.label(format_progress(session.current_time, session.duration));

            let mut position = session.current_time.min(session.duration);
            let scrubber = ui.add_enabled(
                session.duration > 0.0,
                egui::Slider::new(&mut position, 0.0..=session.duration.max(0.0))
                    .show_value(false),
            );
            if scrubber.changed() {
                actions.push(UiAction::Seek(position));
            }

            ui.separator();
            ui.label(tr("control.volume"));
            let mut volume = session.volume;
            if ui
                .add(
                    egui::Slider::new(&mut volume, 0.0..=1.0)
                        .step_by(VOLUME_STEP)
                        .show_value(false),
                )
                .changed()
            {
                actions.push(UiAction::SetVolume(volume));
            }

            ui.separator();
            if ui.button(tr("control.fullscreen")).clicked() {
                actions.push(UiAction::ToggleFullscreen);
            }
        });
    });
}

fn url_dialog(ctx: &egui::Context, state: &mut UiState, actions: &mut Vec<UiAction>) {
    let mut open = true;
    let mut submitted = false;
    let mut cancelled = false;

    egui::Window::new(tr("url.title"))
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .open(&mut open)
        .show(ctx, |ui| {
            let edit = ui.text_edit_singleline(&mut state.url_input);
            let entered = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            ui.horizontal(|ui| {
                submitted = ui.button(tr("url.open")).clicked() || entered;
                cancelled = ui.button(tr("url.cancel")).clicked();
            });
        });

    let url = state.url_input.trim().to_string();
    if submitted && !url.is_empty() {
        actions.push(UiAction::OpenUrl(url));
        state.url_input.clear();
        state.url_dialog_open = false;
    } else if cancelled || !open {
        state.url_dialog_open = false;
    }
}
