// viewer.rs — controller owning one video source, one panoramic scene, the
// orientation tracker and the render loop, with lifetimes tied to mount and
// unmount
//
// Teardown always runs in the same order: stop the render loop, drop the
// input bindings, release the scene, stop the media. `unmount` is
// idempotent and is also called from `Drop`.

use crate::error::{MediaError, RenderError, ViewerError};
use crate::fullscreen::FullscreenApi;
use crate::input::{Handler, InputBindings, InputEvent, InputKind};
use crate::media::{MediaElement, MediaEvent, MediaOptions, VideoSource};
use crate::orientation::{OrientationState, OrientationTracker};
use crate::render_loop::{FrameScheduler, RenderLoop};
use crate::scene::{PanoramicScene, RenderBackend};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub url: String,
    pub autoplay: bool,
    pub muted: bool,
    pub show_controls: bool,
}

impl ViewerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            autoplay: false,
            muted: false,
            show_controls: true,
        }
    }
}

/// UI-facing state of one mounted viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSession {
    pub source_url: String,
    pub autoplay: bool,
    pub show_controls: bool,
    pub playing: bool,
    pub loading: bool,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f32,
    pub fullscreen: bool,
    /// Terminal load or playback failure.
    pub error: Option<String>,
}

impl ViewerSession {
    fn new(config: &ViewerConfig, volume: f32, fullscreen: bool) -> Self {
        Self {
            source_url: config.url.clone(),
            autoplay: config.autoplay,
            show_controls: config.show_controls,
            playing: false,
            loading: true,
            current_time: 0.0,
            duration: 0.0,
            volume,
            fullscreen,
            error: None,
        }
    }

    fn fail(&mut self, message: String) {
        self.loading = false;
        self.playing = false;
        self.error = Some(message);
    }

    /// Transport controls are shown only once the video is ready.
    pub fn controls_visible(&self) -> bool {
        self.show_controls && !self.loading && self.error.is_none()
    }
}

pub struct ViewerController<B: RenderBackend, M: MediaElement> {
    session: ViewerSession,
    tracker: OrientationTracker,
    source: VideoSource<M>,
    scene: Option<PanoramicScene<B>>,
    render_loop: RenderLoop,
    bindings: InputBindings<Self>,
}

impl<B: RenderBackend, M: MediaElement> ViewerController<B, M> {
    pub fn mount<F>(
        config: ViewerConfig,
        backend: B,
        size: (u32, u32),
        open_media: F,
        scheduler: &dyn FrameScheduler,
        fullscreen: bool,
    ) -> Result<Self, ViewerError>
    where
        F: FnOnce(&str, &MediaOptions) -> Result<M, MediaError>,
    {
        let source = VideoSource::open(&config.url, config.autoplay, config.muted, open_media)?;
        let scene = PanoramicScene::new(backend, size.0, size.1)?;

        let mut viewer = Self {
            session: ViewerSession::new(&config, source.volume(), fullscreen),
            tracker: OrientationTracker::new(),
            source,
            scene: Some(scene),
            render_loop: RenderLoop::new(),
            bindings: InputBindings::new(),
        };
        viewer.bindings.bind_all(Self::default_bindings());
        viewer.render_loop.start(scheduler);

        log::info!("viewer mounted for {}", config.url);
        Ok(viewer)
    }

    /// Tears down and rebuilds the viewer for a new source at the container's
    /// current `size`.
    ///
    /// The old renderer is released before `make_backend` runs, so both
    /// never hold the output surface at once. On error the viewer stays
    /// unmounted.
    pub fn reload<F, G>(
        &mut self,
        config: ViewerConfig,
        size: (u32, u32),
        make_backend: G,
        open_media: F,
        scheduler: &dyn FrameScheduler,
    ) -> Result<(), ViewerError>
    where
        F: FnOnce(&str, &MediaOptions) -> Result<M, MediaError>,
        G: FnOnce() -> Result<B, RenderError>,
    {
        let fullscreen = self.session.fullscreen;
        self.unmount();

        let backend = make_backend()?;
        *self = Self::mount(config, backend, size, open_media, scheduler, fullscreen)?;
        Ok(())
    }

    pub fn unmount(&mut self) {
        if self.scene.is_none() {
            return;
        }
        self.render_loop.cancel();
        self.bindings.unbind_all();
        if let Some(scene) = self.scene.take() {
            scene.dispose();
        }
        self.source.stop();
        log::info!("viewer unmounted for {}", self.session.source_url);
    }

    pub fn is_mounted(&self) -> bool {
        self.scene.is_some()
    }

    pub fn session(&self) -> &ViewerSession {
        &self.session
    }

    pub fn orientation(&self) -> OrientationState {
        self.tracker.orientation()
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn scene(&self) -> Option<&PanoramicScene<B>> {
        self.scene.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.scene.as_mut().map(|s| s.backend_mut())
    }

    pub fn source(&self) -> &VideoSource<M> {
        &self.source
    }

    pub fn play(&mut self) {
        if !self.is_mounted() {
            return;
        }
        if let Err(err) = self.source.play() {
            log::error!("play failed: {err}");
            self.session.fail(err.to_string());
        }
    }

    pub fn pause(&mut self) {
        if self.is_mounted() {
            self.source.pause();
        }
    }

    pub fn toggle_play(&mut self) {
        if self.session.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Returns the clamped position actually sought to.
    pub fn seek(&mut self, time: f64) -> f64 {
        let applied = self.source.seek(time);
        self.session.current_time = applied;
        applied
    }

    pub fn set_volume(&mut self, level: f32) -> f32 {
        let applied = self.source.set_volume(level);
        self.session.volume = applied;
        applied
    }

    /// Requests or exits fullscreen. Success is confirmed later by a
    /// `FullscreenChange` event; a refused request re-reads the real state.
    pub fn toggle_fullscreen(&mut self, api: &dyn FullscreenApi) {
        let result = if api.is_fullscreen() {
            api.exit()
        } else {
            api.request()
        };
        if let Err(err) = result {
            log::warn!("fullscreen toggle failed: {err}");
            self.session.fullscreen = api.is_fullscreen();
        }
    }

    pub fn reset_view(&mut self) {
        self.tracker.reset();
        if let Some(scene) = self.scene.as_mut() {
            scene.reset_zoom();
        }
    }

    pub fn dispatch(&mut self, event: InputEvent) {
        if let Some(handler) = self.bindings.handler(event.kind()) {
            handler(self, &event);
        }
    }

    /// Applies pending media events to the session.
    pub fn poll_media(&mut self) {
        for event in self.source.poll() {
            match event {
                MediaEvent::MetadataReady { duration } => {
                    self.session.duration = duration;
                    self.session.loading = false;
                }
                MediaEvent::TimeUpdate { position } => self.session.current_time = position,
                MediaEvent::PlayStarted => self.session.playing = true,
                MediaEvent::PlayPaused => self.session.playing = false,
                MediaEvent::Failed(message) => self.session.fail(message),
            }
        }
    }

    /// One render-loop iteration: latest video frame into the texture,
    /// current orientation into the camera, then draw.
    ///
    /// Returns `Ok(false)` once the loop has been cancelled.
    pub fn on_frame(&mut self, scheduler: &dyn FrameScheduler) -> Result<bool, ViewerError> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(false);
        };
        let orientation = self.tracker.orientation();
        let source = &mut self.source;

        self.render_loop.run_frame(scheduler, || {
            if let Some(frame) = source.take_frame() {
                scene.update_texture(&frame)?;
            }
            scene.render(orientation)
        })
        .map_err(ViewerError::from)
    }

    fn default_bindings() -> [(InputKind, Handler<Self>); 10] {
        [
            (InputKind::PointerDown, Self::on_pointer_down),
            (InputKind::PointerMove, Self::on_pointer_move),
            (InputKind::PointerUp, Self::on_pointer_up),
            (InputKind::PointerLeave, Self::on_pointer_up),
            (InputKind::TouchStart, Self::on_touch_start),
            (InputKind::TouchMove, Self::on_touch_move),
            (InputKind::TouchEnd, Self::on_touch_end),
            (InputKind::Wheel, Self::on_wheel),
            (InputKind::Resize, Self::on_resize),
            (InputKind::FullscreenChange, Self::on_fullscreen_change),
        ]
    }

    fn on_pointer_down(&mut self, event: &InputEvent) {
        if let InputEvent::PointerDown { x, y } = *event {
            self.tracker.pointer_down(x, y);
        }
    }

    fn on_pointer_move(&mut self, event: &InputEvent) {
        if let InputEvent::PointerMove { x, y } = *event {
            self.tracker.pointer_move(x, y);
        }
    }

    fn on_pointer_up(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerLeave => self.tracker.pointer_leave(),
            _ => self.tracker.pointer_up(),
        }
    }

    fn on_touch_start(&mut self, event: &InputEvent) {
        if let InputEvent::TouchStart { id, x, y } = *event {
            self.tracker.touch_start(id, x, y);
        }
    }

    fn on_touch_move(&mut self, event: &InputEvent) {
        if let InputEvent::TouchMove { id, x, y } = *event {
            self.tracker.touch_move(id, x, y);
        }
    }

    fn on_touch_end(&mut self, event: &InputEvent) {
        if let InputEvent::TouchEnd { id } = *event {
            self.tracker.touch_end(id);
        }
    }

    fn on_wheel(&mut self, event: &InputEvent) {
        if let (InputEvent::Wheel { lines }, Some(scene)) = (*event, self.scene.as_mut()) {
            scene.zoom(lines);
        }
    }

    fn on_resize(&mut self, event: &InputEvent) {
        if let (InputEvent::Resize { width, height }, Some(scene)) = (*event, self.scene.as_mut()) {
            scene.resize(width, height);
        }
    }

    fn on_fullscreen_change(&mut self, event: &InputEvent) {
        if let InputEvent::FullscreenChange { fullscreen } = *event {
            self.session.fullscreen = fullscreen;
        }
    }
}

impl<B: RenderBackend, M: MediaElement> Drop for ViewerController<B, M> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::DRAG_SENSITIVITY;
    use crate::testing::{
        BackendStats, CountingBackend, CountingScheduler, ElementLog, ScriptedElement,
        ScriptedFullscreen,
    };

    type TestViewer = ViewerController<CountingBackend, ScriptedElement>;

    struct Harness {
        stats: BackendStats,
        log: ElementLog,
        scheduler: CountingScheduler,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                stats: BackendStats::new(),
                log: ElementLog::default(),
                scheduler: CountingScheduler::default(),
            }
        }

        fn mount(&self, config: ViewerConfig) -> TestViewer {
            self.try_mount(config, CountingBackend::new(&self.stats)).unwrap()
        }

        fn try_mount(
            &self,
            config: ViewerConfig,
            backend: CountingBackend,
        ) -> Result<TestViewer, ViewerError> {
            let log = self.log.clone();
            ViewerController::mount(
                config,
                backend,
                (800, 450),
                move |url, options| Ok(ScriptedElement::new(url, *options, log)),
                &self.scheduler,
                false,
            )
        }
    }

    fn config() -> ViewerConfig {
        ViewerConfig::new("https://cdn.example/videos/falls-360.mp4")
    }

    #[test]
    fn mount_starts_loading_and_the_render_loop() {
        let h = Harness::new();
        let viewer = h.mount(config());
        let session = viewer.session();
        assert!(session.loading);
        assert!(!session.playing);
        assert_eq!(session.volume, 1.0);
        assert!(!session.controls_visible());
        assert!(viewer.render_loop().is_running());
        assert_eq!(h.scheduler.requests(), 1);
    }

    #[test]
    fn resources_return_to_baseline_across_cycles() {
        let h = Harness::new();
        for _ in 0..5 {
            let mut viewer = h.mount(config());
            viewer.on_frame(&h.scheduler).unwrap();
            assert_eq!(h.stats.live().renderers, 1);
            assert_eq!(h.stats.live().geometries, 1);
            viewer.unmount();
            assert!(h.stats.live().is_empty());
            drop(viewer);
            assert!(h.stats.live().is_empty());
        }
        assert_eq!(h.stats.detached(), 5);
        assert_eq!(h.log.stop_calls(), 5);
    }

    #[test]
    fn dropping_a_mounted_viewer_tears_down() {
        let h = Harness::new();
        {
            let _viewer = h.mount(config());
        }
        assert!(h.stats.live().is_empty());
        assert_eq!(h.log.stop_calls(), 1);
    }

    #[test]
    fn failed_scene_construction_is_surfaced_and_releases_everything() {
        let h = Harness::new();
        let backend = CountingBackend::new(&h.stats).fail_material();
        let result = h.try_mount(config(), backend);
        assert!(matches!(result, Err(ViewerError::Render(_))));
        assert!(h.stats.live().is_empty());
        assert_eq!(h.log.stop_calls(), 1);
    }

    #[test]
    fn failed_media_open_is_surfaced() {
        let h = Harness::new();
        let result: Result<TestViewer, _> = ViewerController::mount(
            config(),
            CountingBackend::new(&h.stats),
            (800, 450),
            |_, _| Err(MediaError::Probe("404 Not Found".into())),
            &h.scheduler,
            false,
        );
        assert!(matches!(result, Err(ViewerError::Media(MediaError::Probe(_)))));
        assert!(h.stats.live().is_empty());
    }

    #[test]
    fn drag_right_changes_yaw_only() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        viewer.dispatch(InputEvent::PointerDown { x: 400.0, y: 200.0 });
        viewer.dispatch(InputEvent::PointerMove { x: 500.0, y: 200.0 });
        viewer.dispatch(InputEvent::PointerUp);

        let o = viewer.orientation();
        assert!((o.yaw - 100.0 * DRAG_SENSITIVITY).abs() < 1e-5);
        assert_eq!(o.pitch, 0.0);
    }

    #[test]
    fn multi_touch_leaves_orientation_alone() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        viewer.dispatch(InputEvent::TouchStart { id: 1, x: 100.0, y: 100.0 });
        viewer.dispatch(InputEvent::TouchStart { id: 2, x: 200.0, y: 100.0 });
        viewer.dispatch(InputEvent::TouchMove { id: 1, x: 160.0, y: 40.0 });
        viewer.dispatch(InputEvent::TouchMove { id: 2, x: 260.0, y: 40.0 });
        assert_eq!(viewer.orientation(), OrientationState::default());
    }

    #[test]
    fn autoplay_mounts_muted_even_when_unmute_requested() {
        let h = Harness::new();
        let mut cfg = config();
        cfg.autoplay = true;
        cfg.muted = false;
        let viewer = h.mount(cfg);
        assert!(viewer.source().element().muted());
        assert!(h.log.opened_with().unwrap().muted);
    }

    #[test]
    fn metadata_clears_loading_and_reveals_controls() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        h.log.push_event(MediaEvent::MetadataReady { duration: 95.5 });
        viewer.poll_media();
        assert!(!viewer.session().loading);
        assert_eq!(viewer.session().duration, 95.5);
        assert!(viewer.session().controls_visible());
    }

    #[test]
    fn play_state_follows_media_events() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        h.log.push_event(MediaEvent::MetadataReady { duration: 60.0 });
        viewer.poll_media();

        viewer.toggle_play();
        assert!(!viewer.session().playing);
        viewer.poll_media();
        assert!(viewer.session().playing);

        h.log.push_event(MediaEvent::TimeUpdate { position: 3.25 });
        viewer.poll_media();
        assert_eq!(viewer.session().current_time, 3.25);

        viewer.toggle_play();
        viewer.poll_media();
        assert!(!viewer.session().playing);
        assert_eq!(h.log.play_calls(), 1);
        assert_eq!(h.log.pause_calls(), 1);
    }

    #[test]
    fn media_failure_is_terminal_not_loading() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        h.log.push_event(MediaEvent::Failed("unsupported codec".into()));
        viewer.poll_media();

        let session = viewer.session();
        assert!(!session.loading);
        assert!(!session.playing);
        assert_eq!(session.error.as_deref(), Some("unsupported codec"));
        assert!(!session.controls_visible());
        // Rendering carries on so the last frame stays visible.
        assert!(viewer.render_loop().is_running());
    }

    #[test]
    fn refused_play_sets_error_state() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        h.log.fail_play();
        viewer.play();
        assert_eq!(
            viewer.session().error.as_deref(),
            Some("media source is in an error state: playback blocked")
        );
    }

    #[test]
    fn seek_and_volume_are_clamped() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        h.log.push_event(MediaEvent::MetadataReady { duration: 42.0 });
        viewer.poll_media();

        assert_eq!(viewer.seek(100.0), 42.0);
        assert_eq!(viewer.session().current_time, 42.0);
        assert_eq!(viewer.seek(-1.0), 0.0);

        assert_eq!(viewer.set_volume(3.0), 1.0);
        assert_eq!(viewer.set_volume(-3.0), 0.0);
        assert_eq!(viewer.session().volume, 0.0);
    }

    #[test]
    fn resize_applies_before_the_next_frame() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        viewer.on_frame(&h.scheduler).unwrap();

        viewer.dispatch(InputEvent::Resize {
            width: 400,
            height: 225,
        });
        viewer.on_frame(&h.scheduler).unwrap();

        let frames = h.stats.frames();
        assert_eq!(frames[0].size, (800, 450));
        assert_eq!(frames[1].size, (400, 225));
        let camera = viewer.scene().unwrap().camera();
        assert!((camera.aspect - 400.0 / 225.0).abs() < 1e-6);
        assert_eq!(frames[1].view_projection, camera.view_projection());
    }

    #[test]
    fn frame_applies_orientation_read_before_render() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        viewer.dispatch(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        viewer.dispatch(InputEvent::PointerMove { x: 120.0, y: -40.0 });
        viewer.on_frame(&h.scheduler).unwrap();

        let mut expected = *viewer.scene().unwrap().camera();
        expected.set_orientation(viewer.orientation());
        assert_eq!(h.stats.frames()[0].view_projection, expected.view_projection());
    }

    #[test]
    fn frames_render_while_paused_and_upload_video() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        assert!(viewer.on_frame(&h.scheduler).unwrap());
        h.log.push_frame(0.0);
        assert!(viewer.on_frame(&h.scheduler).unwrap());
        assert!(viewer.on_frame(&h.scheduler).unwrap());

        assert_eq!(h.stats.frames().len(), 3);
        assert_eq!(h.stats.uploads(), 1);
        assert_eq!(h.scheduler.requests(), 4);
    }

    #[test]
    fn nothing_runs_after_unmount() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        viewer.on_frame(&h.scheduler).unwrap();
        let requested = h.scheduler.requests();
        viewer.unmount();

        // The frame requested just before unmount arrives anyway.
        assert!(!viewer.on_frame(&h.scheduler).unwrap());
        assert_eq!(h.stats.frames().len(), 1);
        assert_eq!(h.scheduler.requests(), requested);

        viewer.dispatch(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        viewer.dispatch(InputEvent::PointerMove { x: 300.0, y: 300.0 });
        viewer.dispatch(InputEvent::Resize {
            width: 10,
            height: 10,
        });
        assert_eq!(viewer.orientation(), OrientationState::default());
        assert!(h.stats.live().is_empty());
    }

    #[test]
    fn render_failure_cancels_and_surfaces() {
        let h = Harness::new();
        let backend = CountingBackend::new(&h.stats).fail_render();
        let mut viewer = h.try_mount(config(), backend).unwrap();
        assert!(matches!(
            viewer.on_frame(&h.scheduler),
            Err(ViewerError::Render(RenderError::OutOfMemory))
        ));
        assert!(!viewer.render_loop().is_running());
        assert!(!viewer.on_frame(&h.scheduler).unwrap());
    }

    #[test]
    fn reload_swaps_the_source_with_full_teardown() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        viewer.dispatch(InputEvent::Resize {
            width: 1024,
            height: 512,
        });
        viewer.dispatch(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        viewer.dispatch(InputEvent::PointerMove { x: 50.0, y: 0.0 });

        let stats = h.stats.clone();
        let log = h.log.clone();
        viewer
            .reload(
                ViewerConfig::new("file:///videos/canyon.mp4"),
                (1024, 512),
                || {
                    // The previous renderer is gone before the new one exists.
                    assert!(stats.live().is_empty());
                    Ok(CountingBackend::new(&stats))
                },
                move |url, options| Ok(ScriptedElement::new(url, *options, log)),
                &h.scheduler,
            )
            .unwrap();

        assert_eq!(viewer.session().source_url, "file:///videos/canyon.mp4");
        assert!(viewer.session().loading);
        assert_eq!(viewer.orientation(), OrientationState::default());
        assert_eq!(viewer.scene().unwrap().size(), (1024, 512));
        assert_eq!(h.stats.live().renderers, 1);
        assert_eq!(h.log.stop_calls(), 1);
    }

    #[test]
    fn restore_after_failed_reload_uses_the_container_size() {
        let h = Harness::new();
        let mut viewer = h.mount(config());

        let stats = h.stats.clone();
        let result = viewer.reload(
            ViewerConfig::new("https://cdn.example/missing.mp4"),
            (1280, 720),
            || Ok(CountingBackend::new(&stats)),
            |_, _| Err(MediaError::NoVideoStream),
            &h.scheduler,
        );
        assert!(matches!(result, Err(ViewerError::Media(MediaError::NoVideoStream))));
        assert!(!viewer.is_mounted());
        assert!(h.stats.live().is_empty());

        let log = h.log.clone();
        viewer
            .reload(
                config(),
                (1280, 720),
                || Ok(CountingBackend::new(&stats)),
                move |url, options| Ok(ScriptedElement::new(url, *options, log)),
                &h.scheduler,
            )
            .unwrap();
        assert!(viewer.is_mounted());
        assert_eq!(viewer.scene().unwrap().size(), (1280, 720));
        let camera = viewer.scene().unwrap().camera();
        assert!((camera.aspect - 1280.0 / 720.0).abs() < 1e-6);

        viewer.on_frame(&h.scheduler).unwrap();
        assert_eq!(h.stats.frames().last().unwrap().size, (1280, 720));
    }

    #[test]
    fn fullscreen_follows_change_notifications() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        let api = ScriptedFullscreen::default();

        viewer.toggle_fullscreen(&api);
        assert!(api.is_fullscreen());
        assert!(!viewer.session().fullscreen);
        viewer.dispatch(InputEvent::FullscreenChange { fullscreen: true });
        assert!(viewer.session().fullscreen);

        viewer.toggle_fullscreen(&api);
        assert!(!api.is_fullscreen());
        viewer.dispatch(InputEvent::FullscreenChange { fullscreen: false });
        assert!(!viewer.session().fullscreen);
    }

    #[test]
    fn refused_fullscreen_rederives_the_flag() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        viewer.dispatch(InputEvent::FullscreenChange { fullscreen: true });

        let api = ScriptedFullscreen {
            deny: true,
            ..Default::default()
        };
        viewer.toggle_fullscreen(&api);
        assert!(!viewer.session().fullscreen);
    }

    #[test]
    fn wheel_zooms_and_reset_view_restores() {
        let h = Harness::new();
        let mut viewer = h.mount(config());
        viewer.dispatch(InputEvent::Wheel { lines: 2.0 });
        assert_eq!(viewer.scene().unwrap().camera().fov_degrees, 70.0);

        viewer.dispatch(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        viewer.dispatch(InputEvent::PointerMove { x: 10.0, y: 10.0 });
        viewer.reset_view();
        assert_eq!(viewer.orientation(), OrientationState::default());
        assert_eq!(viewer.scene().unwrap().camera().fov_degrees, 75.0);
    }
}
