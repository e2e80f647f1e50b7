// testing.rs — test doubles for the render backend, media element, frame
// scheduler and fullscreen API

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Mat4;
use image::RgbaImage;

use crate::error::{FullscreenError, MediaError, RenderError};
use crate::fullscreen::FullscreenApi;
use crate::media::{MediaElement, MediaEvent, MediaOptions, VideoFrame};
use crate::mesh::SphereMesh;
use crate::render_loop::FrameScheduler;
use crate::scene::RenderBackend;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveResources {
    pub renderers: usize,
    pub geometries: usize,
    pub textures: usize,
    pub materials: usize,
}

impl LiveResources {
    pub fn is_empty(&self) -> bool {
        *self == LiveResources::default()
    }
}

#[derive(Debug, Default)]
struct StatsInner {
    live: LiveResources,
    frames: Vec<RenderedFrame>,
    uploads: usize,
    detached: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedFrame {
    pub size: (u32, u32),
    pub view_projection: Mat4,
}

/// Shared across every backend a test creates, so leaks show up across
/// mount/unmount cycles.
#[derive(Debug, Clone, Default)]
pub struct BackendStats(Rc<RefCell<StatsInner>>);

impl BackendStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> LiveResources {
        self.0.borrow().live
    }

    pub fn frames(&self) -> Vec<RenderedFrame> {
        self.0.borrow().frames.clone()
    }

    pub fn uploads(&self) -> usize {
        self.0.borrow().uploads
    }

    pub fn detached(&self) -> usize {
        self.0.borrow().detached
    }

    fn update(&self, f: impl FnOnce(&mut StatsInner)) {
        f(&mut self.0.borrow_mut());
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Geometry,
    Texture,
    Material,
}

/// Counts itself live until dropped.
#[derive(Debug)]
pub struct Tracked {
    stats: BackendStats,
    kind: Kind,
}

impl Tracked {
    fn new(stats: &BackendStats, kind: Kind) -> Self {
        stats.update(|s| match kind {
            Kind::Geometry => s.live.geometries += 1,
            Kind::Texture => s.live.textures += 1,
            Kind::Material => s.live.materials += 1,
        });
        Self {
            stats: stats.clone(),
            kind,
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        let kind = self.kind;
        self.stats.update(|s| match kind {
            Kind::Geometry => s.live.geometries -= 1,
            Kind::Texture => s.live.textures -= 1,
            Kind::Material => s.live.materials -= 1,
        });
    }
}

pub struct CountingBackend {
    stats: BackendStats,
    size: (u32, u32),
    fail_material: bool,
    fail_render: bool,
}

impl CountingBackend {
    pub fn new(stats: &BackendStats) -> Self {
        stats.update(|s| s.live.renderers += 1);
        Self {
            stats: stats.clone(),
            size: (0, 0),
            fail_material: false,
            fail_render: false,
        }
    }

    pub fn fail_material(mut self) -> Self {
        self.fail_material = true;
        self
    }

    pub fn fail_render(mut self) -> Self {
        self.fail_render = true;
        self
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl Drop for CountingBackend {
    fn drop(&mut self) {
        self.stats.update(|s| s.live.renderers -= 1);
    }
}

impl RenderBackend for CountingBackend {
    type Geometry = Tracked;
    type Texture = Tracked;
    type Material = Tracked;

    fn create_geometry(&mut self, _mesh: &SphereMesh) -> Result<Tracked, RenderError> {
        Ok(Tracked::new(&self.stats, Kind::Geometry))
    }

    fn create_video_texture(&mut self) -> Result<Tracked, RenderError> {
        Ok(Tracked::new(&self.stats, Kind::Texture))
    }

    fn create_material(&mut self, _texture: &Tracked) -> Result<Tracked, RenderError> {
        if self.fail_material {
            return Err(RenderError::OutOfMemory);
        }
        Ok(Tracked::new(&self.stats, Kind::Material))
    }

    fn upload_frame(
        &mut self,
        _texture: &mut Tracked,
        _material: &mut Tracked,
        _frame: &VideoFrame,
    ) -> Result<(), RenderError> {
        self.stats.update(|s| s.uploads += 1);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn render(
        &mut self,
        _geometry: &Tracked,
        _material: &Tracked,
        view_projection: Mat4,
    ) -> Result<(), RenderError> {
        if self.fail_render {
            return Err(RenderError::OutOfMemory);
        }
        let size = self.size;
        self.stats.update(|s| {
            s.frames.push(RenderedFrame {
                size,
                view_projection,
            })
        });
        Ok(())
    }

    fn detach(&mut self) {
        self.stats.update(|s| s.detached += 1);
    }
}

#[derive(Debug, Default)]
struct ElementInner {
    opened_with: Option<MediaOptions>,
    pending: VecDeque<MediaEvent>,
    frames: VecDeque<VideoFrame>,
    play_calls: usize,
    pause_calls: usize,
    stop_calls: usize,
    fail_play: bool,
}

/// Script and observe a [`ScriptedElement`] from the test body.
#[derive(Debug, Clone, Default)]
pub struct ElementLog(Rc<RefCell<ElementInner>>);

impl ElementLog {
    pub fn opened_with(&self) -> Option<MediaOptions> {
        self.0.borrow().opened_with
    }

    pub fn push_event(&self, event: MediaEvent) {
        self.0.borrow_mut().pending.push_back(event);
    }

    pub fn push_frame(&self, timestamp: f64) {
        let frame = VideoFrame {
            image: RgbaImage::new(4, 2),
            timestamp,
        };
        self.0.borrow_mut().frames.push_back(frame);
    }

    pub fn fail_play(&self) {
        self.0.borrow_mut().fail_play = true;
    }

    pub fn play_calls(&self) -> usize {
        self.0.borrow().play_calls
    }

    pub fn pause_calls(&self) -> usize {
        self.0.borrow().pause_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.0.borrow().stop_calls
    }
}

pub struct ScriptedElement {
    log: ElementLog,
    paused: bool,
    time: f64,
    duration: Option<f64>,
    volume: f32,
    muted: bool,
}

impl ScriptedElement {
    pub fn new(_url: &str, options: MediaOptions, log: ElementLog) -> Self {
        log.0.borrow_mut().opened_with = Some(options);
        Self {
            log,
            paused: true,
            time: 0.0,
            duration: None,
            volume: 1.0,
            muted: false,
        }
    }
}

impl MediaElement for ScriptedElement {
    fn play(&mut self) -> Result<(), MediaError> {
        let mut inner = self.log.0.borrow_mut();
        if inner.fail_play {
            return Err(MediaError::Failed("playback blocked".into()));
        }
        inner.play_calls += 1;
        self.paused = false;
        inner.pending.push_back(MediaEvent::PlayStarted);
        Ok(())
    }

    fn pause(&mut self) {
        let mut inner = self.log.0.borrow_mut();
        inner.pause_calls += 1;
        self.paused = true;
        inner.pending.push_back(MediaEvent::PlayPaused);
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn seek(&mut self, time: f64) {
        self.time = time;
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        let events: Vec<_> = self.log.0.borrow_mut().pending.drain(..).collect();
        for event in &events {
            match event {
                MediaEvent::MetadataReady { duration } => self.duration = Some(*duration),
                MediaEvent::TimeUpdate { position } => self.time = *position,
                _ => {}
            }
        }
        events
    }

    fn take_frame(&mut self) -> Option<VideoFrame> {
        self.log.0.borrow_mut().frames.pop_front()
    }

    fn stop(&mut self) {
        self.log.0.borrow_mut().stop_calls += 1;
        self.paused = true;
    }
}

#[derive(Debug, Default)]
pub struct CountingScheduler {
    requests: Cell<usize>,
}

impl CountingScheduler {
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl FrameScheduler for CountingScheduler {
    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

/// Fullscreen API whose requests either take effect or get refused.
#[derive(Debug, Default)]
pub struct ScriptedFullscreen {
    pub active: Cell<bool>,
    pub deny: bool,
}

impl FullscreenApi for ScriptedFullscreen {
    fn is_fullscreen(&self) -> bool {
        self.active.get()
    }

    fn request(&self) -> Result<(), FullscreenError> {
        if self.deny {
            return Err(FullscreenError::Denied("not allowed".into()));
        }
        self.active.set(true);
        Ok(())
    }

    fn exit(&self) -> Result<(), FullscreenError> {
        if self.deny {
            return Err(FullscreenError::Denied("not allowed".into()));
        }
        self.active.set(false);
        Ok(())
    }
}
