// media/mod.rs — video source adapter
//
// `MediaElement` is the platform seam: something that can stream a video
// by URL, decode frames and report lifecycle events. `VideoSource` wraps
// one element, applies the viewer's playback policy (looping, inline, muted
// autoplay) and clamps transport requests.

pub mod audio;
pub mod ffmpeg;

use crate::error::MediaError;
use image::RgbaImage;

/// One decoded video frame, ready for texture upload.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub image: RgbaImage,
    /// Presentation time in seconds.
    pub timestamp: f64,
}

impl VideoFrame {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Options fixed when an element is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaOptions {
    pub autoplay: bool,
    pub looping: bool,
    pub muted: bool,
    /// Hint for platforms that would otherwise take over the screen on play.
    pub plays_inline: bool,
}

impl MediaOptions {
    /// Autoplay is only permitted muted, so `autoplay` wins over `muted`.
    pub fn for_viewer(autoplay: bool, muted: bool) -> Self {
        Self {
            autoplay,
            looping: true,
            muted: muted || autoplay,
            plays_inline: true,
        }
    }
}

/// Lifecycle notifications, drained with [`MediaElement::poll_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    MetadataReady { duration: f64 },
    TimeUpdate { position: f64 },
    PlayStarted,
    PlayPaused,
    Failed(String),
}

pub trait MediaElement {
    /// Starts or resumes playback. A no-op while already playing.
    fn play(&mut self) -> Result<(), MediaError>;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;

    fn current_time(&self) -> f64;
    fn seek(&mut self, time: f64);
    /// Total duration, once metadata has been read.
    fn duration(&self) -> Option<f64>;

    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);

    fn poll_events(&mut self) -> Vec<MediaEvent>;
    /// Latest decoded frame since the previous call, if any.
    fn take_frame(&mut self) -> Option<VideoFrame>;

    /// Halts playback and releases the decoding pipeline.
    fn stop(&mut self);
}

pub struct VideoSource<M: MediaElement> {
    element: M,
    url: String,
    options: MediaOptions,
    stopped: bool,
}

impl<M: MediaElement> VideoSource<M> {
    pub fn open<F>(url: &str, autoplay: bool, muted: bool, opener: F) -> Result<Self, MediaError>
    where
        F: FnOnce(&str, &MediaOptions) -> Result<M, MediaError>,
    {
        let options = MediaOptions::for_viewer(autoplay, muted);
        let mut element = opener(url, &options)?;
        element.set_muted(options.muted);
        log::debug!("opened video source {url} ({options:?})");

        Ok(Self {
            element,
            url: url.to_string(),
            options,
            stopped: false,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> MediaOptions {
        self.options
    }

    pub fn element(&self) -> &M {
        &self.element
    }

    pub fn is_playing(&self) -> bool {
        !self.element.is_paused()
    }

    /// Known duration, or 0 before metadata is ready.
    pub fn duration(&self) -> f64 {
        self.element.duration().unwrap_or(0.0).max(0.0)
    }

    pub fn play(&mut self) -> Result<(), MediaError> {
        if self.stopped || self.is_playing() {
            return Ok(());
        }
        self.element.play()
    }

    pub fn pause(&mut self) {
        if self.stopped || self.element.is_paused() {
            return;
        }
        self.element.pause();
    }

    /// Seeks to `time` clamped into `[0, duration]`; returns the applied time.
    pub fn seek(&mut self, time: f64) -> f64 {
        let target = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, self.duration())
        };
        if !self.stopped {
            self.element.seek(target);
        }
        target
    }

    /// Sets volume clamped into `[0, 1]`; returns the applied level.
    pub fn set_volume(&mut self, level: f32) -> f32 {
        let level = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        };
        self.element.set_volume(level);
        level
    }

    pub fn volume(&self) -> f32 {
        self.element.volume()
    }

    pub fn poll(&mut self) -> Vec<MediaEvent> {
        if self.stopped {
            return Vec::new();
        }
        let events = self.element.poll_events();
        let mut out = Vec::with_capacity(events.len());
        for event in events {
            let autoplay = matches!(event, MediaEvent::MetadataReady { .. }) && self.options.autoplay;
            out.push(event);
            if autoplay && self.element.is_paused() {
                if let Err(err) = self.element.play() {
                    log::warn!("autoplay failed for {}: {err}", self.url);
                    out.push(MediaEvent::Failed(err.to_string()));
                }
            }
        }
        out
    }

    pub fn take_frame(&mut self) -> Option<VideoFrame> {
        if self.stopped {
            return None;
        }
        self.element.take_frame()
    }

    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.element.stop();
        log::debug!("stopped video source {}", self.url);
    }
}

impl<M: MediaElement> Drop for VideoSource<M> {
    fn drop(&mut self) {
        self.stop();
    }
}
