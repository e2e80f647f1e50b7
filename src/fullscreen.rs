// fullscreen.rs — fullscreen behind a small capability probe
//
// winit exposes two variants (borderless and exclusive video mode) whose
// availability depends on the platform and monitor. The probe picks one at
// request time so the viewer only ever sees request / exit / query.

use crate::error::FullscreenError;
use winit::monitor::{MonitorHandle, VideoMode};
use winit::window::{Fullscreen, Window};

pub trait FullscreenApi {
    fn is_fullscreen(&self) -> bool;
    fn request(&self) -> Result<(), FullscreenError>;
    fn exit(&self) -> Result<(), FullscreenError>;
}

#[derive(Debug, Clone)]
pub enum FullscreenVariant {
    Borderless(MonitorHandle),
    Exclusive(VideoMode),
}

impl FullscreenVariant {
    /// Borderless on the window's monitor when there is one, otherwise the
    /// largest exclusive mode of the primary monitor.
    pub fn probe(window: &Window) -> Option<Self> {
        if let Some(monitor) = window.current_monitor() {
            return Some(FullscreenVariant::Borderless(monitor));
        }
        let monitor = window.primary_monitor()?;
        monitor
            .video_modes()
            .max_by_key(|mode| {
                let size = mode.size();
                (
                    size.width as u64 * size.height as u64,
                    mode.refresh_rate_millihertz(),
                )
            })
            .map(FullscreenVariant::Exclusive)
    }

    fn into_winit(self) -> Fullscreen {
        match self {
            FullscreenVariant::Borderless(monitor) => Fullscreen::Borderless(Some(monitor)),
            FullscreenVariant::Exclusive(mode) => Fullscreen::Exclusive(mode),
        }
    }
}

pub struct WindowFullscreen<'a> {
    window: &'a Window,
}

impl<'a> WindowFullscreen<'a> {
    pub fn new(window: &'a Window) -> Self {
        Self { window }
    }
}

impl FullscreenApi for WindowFullscreen<'_> {
    fn is_fullscreen(&self) -> bool {
        self.window.fullscreen().is_some()
    }

    fn request(&self) -> Result<(), FullscreenError> {
        let variant = FullscreenVariant::probe(self.window).ok_or(FullscreenError::Unsupported)?;
        log::debug!("entering fullscreen via {variant:?}");
        self.window.set_fullscreen(Some(variant.into_winit()));
        Ok(())
    }

    fn exit(&self) -> Result<(), FullscreenError> {
        self.window.set_fullscreen(None);
        Ok(())
    }
}
