// main.rs — AnyWhereDoor window: event loop, menu/transport UI and shortcuts

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::Path;
use std::sync::Arc;

use anywheredoor::config::AppConfig;
use anywheredoor::controls::{draw_ui, UiAction, UiState};
use anywheredoor::error::ViewerError;
use anywheredoor::fullscreen::WindowFullscreen;
use anywheredoor::i18n::{self, tr, tr_with};
use anywheredoor::input::{InputEvent, InputTranslator};
use anywheredoor::media::ffmpeg::FfmpegElement;
use anywheredoor::overlay::Overlay;
use anywheredoor::renderer::WgpuBackend;
use anywheredoor::viewer::{ViewerConfig, ViewerController};

use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

type Viewer = ViewerController<WgpuBackend, FfmpegElement>;

const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "m4v", "mov", "mkv", "webm", "avi", "ts"];

fn show_error(message: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(&tr("error.title"))
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

fn pick_video_file() -> Option<String> {
    rfd::FileDialog::new()
        .set_title(&tr("file.pick_title"))
        .add_filter(&tr("file.filter.videos"), &VIDEO_EXTENSIONS)
        .pick_file()
        .map(|path| path_to_source(&path))
}

fn path_to_source(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn mount_viewer(window: &Arc<Window>, config: ViewerConfig) -> Result<Viewer, ViewerError> {
    let backend = pollster::block_on(WgpuBackend::new(window.clone()))?;
    let size = window.inner_size();
    Viewer::mount(
        config,
        backend,
        (size.width, size.height),
        FfmpegElement::open,
        &**window,
        window.fullscreen().is_some(),
    )
}

struct App {
    window: Arc<Window>,
    viewer: Viewer,
    overlay: Overlay,
    translator: InputTranslator,
    ui: UiState,
    config: AppConfig,
}

impl App {
    fn reload(&mut self, url: &str) -> Result<(), ViewerError> {
        let window = self.window.clone();
        let size = self.window.inner_size();
        self.viewer.reload(
            self.config.viewer_config(url),
            (size.width, size.height),
            move || pollster::block_on(WgpuBackend::new(window)),
            FfmpegElement::open,
            &*self.window,
        )?;
        // The old egui textures died with the old renderer.
        self.overlay = Overlay::new(&self.window);
        Ok(())
    }

    /// Switches to `url`, falling back to the current source on failure.
    /// Returns `false` when neither could be opened.
    fn open(&mut self, url: String) -> bool {
        let previous = self.viewer.session().source_url.clone();
        let Err(err) = self.reload(&url) else {
            return true;
        };
        log::error!("failed to open {url}: {err}");
        show_error(&tr_with(
            "error.open_failed",
            &[("url", url), ("err", err.to_string())],
        ));

        match self.reload(&previous) {
            Ok(()) => true,
            Err(err) => {
                log::error!("failed to restore {previous}: {err}");
                false
            }
        }
    }

    fn apply(&mut self, action: UiAction) -> bool {
        match action {
            UiAction::TogglePlay => self.viewer.toggle_play(),
            UiAction::Seek(time) => {
                self.viewer.seek(time);
            }
            UiAction::SetVolume(level) => {
                self.viewer.set_volume(level);
            }
            UiAction::ToggleFullscreen => {
                self.viewer
                    .toggle_fullscreen(&WindowFullscreen::new(&self.window));
            }
            UiAction::ResetView => self.viewer.reset_view(),
            UiAction::OpenFile => {
                if let Some(source) = pick_video_file() {
                    return self.open(source);
                }
            }
            UiAction::OpenUrl(url) => return self.open(url),
            UiAction::SetLanguage(code) => {
                i18n::init(code);
                self.window.set_title(&tr("app.title"));
            }
            UiAction::Quit => return false,
        }
        true
    }

    fn handle_key(&mut self, key: VirtualKeyCode) -> bool {
        let action = match key {
            VirtualKeyCode::Space => UiAction::TogglePlay,
            VirtualKeyCode::F11 => UiAction::ToggleFullscreen,
            VirtualKeyCode::O => UiAction::OpenFile,
            VirtualKeyCode::R => UiAction::ResetView,
            _ => return true,
        };
        self.apply(action)
    }

    fn handle_window_event(&mut self, event: &WindowEvent<'_>) -> bool {
        let consumed = self.overlay.on_event(event);

        match event {
            WindowEvent::CloseRequested => return false,
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state: ElementState::Pressed,
                        virtual_keycode: Some(key),
                        ..
                    },
                ..
            } if !consumed => return self.handle_key(*key),
            WindowEvent::DroppedFile(path) => return self.open(path_to_source(path)),
            WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                self.viewer.dispatch(InputEvent::Resize {
                    width: new_inner_size.width,
                    height: new_inner_size.height,
                });
                return true;
            }
            _ => {}
        }

        let Some(input) = self.translator.translate(event) else {
            return true;
        };
        // Releases always reach the viewer so a drag cannot get stuck.
        let always = matches!(
            input,
            InputEvent::PointerUp
                | InputEvent::PointerLeave
                | InputEvent::TouchEnd { .. }
                | InputEvent::Resize { .. }
        );
        if always || !consumed {
            self.viewer.dispatch(input);
        }
        if let InputEvent::Resize { .. } = input {
            // Entering or leaving fullscreen always resizes the window.
            self.viewer.dispatch(InputEvent::FullscreenChange {
                fullscreen: self.window.fullscreen().is_some(),
            });
        }
        true
    }

    fn redraw(&mut self) -> Result<bool, ViewerError> {
        let session = self.viewer.session().clone();
        let ui = &mut self.ui;
        let mut actions = Vec::new();
        let frame = self
            .overlay
            .run(&self.window, |ctx| actions = draw_ui(ctx, &session, ui));
        if let Some(backend) = self.viewer.backend_mut() {
            backend.set_overlay(frame);
        }

        self.viewer.on_frame(&*self.window)?;

        for action in actions {
            if !self.apply(action) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            show_error(&tr_with("error.bad_args", &[("err", err.to_string())]));
            std::process::exit(2);
        }
    };
    i18n::init(config.lang.clone());

    let Some(source) = config.source.clone().or_else(pick_video_file) else {
        log::info!("{}", tr("error.no_source"));
        return;
    };

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(tr("app.title"))
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(err) => {
            log::error!("failed to create window: {err}");
            show_error(&err.to_string());
            std::process::exit(1);
        }
    };

    let viewer = match mount_viewer(&window, config.viewer_config(&source)) {
        Ok(viewer) => viewer,
        Err(err) => {
            log::error!("failed to open {source}: {err}");
            show_error(&tr_with(
                "error.open_failed",
                &[("url", source), ("err", err.to_string())],
            ));
            std::process::exit(1);
        }
    };

    let mut app = App {
        overlay: Overlay::new(&window),
        window,
        viewer,
        translator: InputTranslator::new(),
        ui: UiState {
            lang: i18n::current_lang(),
            ..Default::default()
        },
        config,
    };

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        let keep_running = match event {
            Event::WindowEvent { event, window_id } if window_id == app.window.id() => {
                app.handle_window_event(&event)
            }
            Event::MainEventsCleared => {
                app.viewer.poll_media();
                true
            }
            Event::RedrawRequested(window_id) if window_id == app.window.id() => {
                match app.redraw() {
                    Ok(keep) => keep,
                    Err(err) => {
                        log::error!("rendering stopped: {err}");
                        show_error(&err.to_string());
                        false
                    }
                }
            }
            Event::LoopDestroyed => {
                app.viewer.unmount();
                true
            }
            _ => true,
        };

        if !keep_running {
            app.viewer.unmount();
            *control_flow = ControlFlow::Exit;
        }
    });
}
