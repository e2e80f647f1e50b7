// overlay.rs — egui context, winit input bridge and UI font discovery

use std::path::PathBuf;

use winit::event::WindowEvent;
use winit::window::Window;

use crate::i18n::{tr, tr_with};
use crate::renderer::OverlayFrame;

/// Fonts with broad script coverage, tried in order. egui's built-in fonts
/// cover Latin, so a miss only affects CJK and similar scripts.
fn font_candidates() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if cfg!(windows) {
        let dir = PathBuf::from(r"C:\Windows\Fonts");
        for f in ["msyh.ttf", "simhei.ttf", "meiryo.ttf", "malgun.ttf", "arialuni.ttf"] {
            candidates.push(dir.join(f));
        }
    } else if cfg!(target_os = "macos") {
        for f in [
            "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
            "/Library/Fonts/NotoSansCJK-Regular.ttc",
            "/System/Library/Fonts/PingFang.ttc",
        ] {
            candidates.push(PathBuf::from(f));
        }
    } else if cfg!(unix) {
        for f in [
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
        ] {
            candidates.push(PathBuf::from(f));
        }
        if let Ok(home) = std::env::var("HOME") {
            candidates.push(PathBuf::from(home).join(".local/share/fonts/NotoSansCJK-Regular.ttc"));
        }
    }

    let asset_dirs = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.join("assets")))
        .into_iter()
        .chain(std::iter::once(PathBuf::from("assets")));
    for dir in asset_dirs {
        candidates.push(dir.join("NotoSansCJK-Regular.ttc"));
        candidates.push(dir.join("NotoSans-Regular.ttf"));
    }
    candidates
}

fn load_font(path: &PathBuf) -> Option<Vec<u8>> {
    let bytes = std::fs::read(path).ok()?;
    // ab_glyph rejects some collections that egui would also fail on.
    ab_glyph::FontRef::try_from_slice(&bytes).ok()?;
    Some(bytes)
}

fn install_ui_font(ctx: &egui::Context) {
    let Some((path, bytes)) = font_candidates()
        .into_iter()
        .find_map(|p| load_font(&p).map(|bytes| (p, bytes)))
    else {
        log::info!("{}", tr("font.not_found"));
        return;
    };
    log::info!(
        "{}",
        tr_with("font.using", &[("path", path.display().to_string())])
    );

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("ui".to_owned(), egui::FontData::from_owned(bytes));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        if let Some(list) = fonts.families.get_mut(&family) {
            // After the defaults, so Latin keeps egui's look.
            list.push("ui".to_owned());
        }
    }
    ctx.set_fonts(fonts);
}

pub struct Overlay {
    ctx: egui::Context,
    state: egui_winit::State,
}

impl Overlay {
    pub fn new(window: &Window) -> Self {
        let ctx = egui::Context::default();
        install_ui_font(&ctx);

        let mut state = egui_winit::State::new(window);
        state.set_pixels_per_point(window.scale_factor() as f32);
        Self { ctx, state }
    }

    /// Feeds a window event to egui; `true` when egui consumed it.
    pub fn on_event(&mut self, event: &WindowEvent<'_>) -> bool {
        self.state.on_event(&self.ctx, event).consumed
    }

    pub fn run(&mut self, window: &Window, ui: impl FnOnce(&egui::Context)) -> OverlayFrame {
        let raw_input = self.state.take_egui_input(window);
        let output = self.ctx.run(raw_input, ui);
        self.state
            .handle_platform_output(window, &self.ctx, output.platform_output);

        OverlayFrame {
            primitives: self.ctx.tessellate(output.shapes),
            textures_delta: output.textures_delta,
            pixels_per_point: self.ctx.pixels_per_point(),
        }
    }
}
