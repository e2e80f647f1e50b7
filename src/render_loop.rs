// render_loop.rs — cancellable per-frame task
//
// Each frame is requested from the platform (a winit redraw request), runs
// once, and asks for the next one only while the loop is still running.

use winit::window::Window;

pub trait FrameScheduler {
    /// Asks the platform for one more frame callback at display refresh.
    fn request_frame(&self);
}

impl FrameScheduler for Window {
    fn request_frame(&self) {
        self.request_redraw();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
    Cancelled,
}

#[derive(Debug, Default)]
pub struct RenderLoop {
    state: LoopState,
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames
    }

    pub fn start(&mut self, scheduler: &dyn FrameScheduler) {
        if self.state == LoopState::Idle {
            self.state = LoopState::Running;
            scheduler.request_frame();
        }
    }

    /// Stops the loop for good; any already-requested frame becomes a no-op.
    pub fn cancel(&mut self) {
        self.state = LoopState::Cancelled;
    }

    /// Runs `frame` if the loop is live and schedules the next one.
    ///
    /// Returns `Ok(false)` when the loop is not running. An error cancels the
    /// loop before it is returned.
    pub fn run_frame<E>(
        &mut self,
        scheduler: &dyn FrameScheduler,
        frame: impl FnOnce() -> Result<(), E>,
    ) -> Result<bool, E> {
        if !self.is_running() {
            return Ok(false);
        }
        if let Err(err) = frame() {
            self.cancel();
            return Err(err);
        }
        self.frames += 1;
        if self.is_running() {
            scheduler.request_frame();
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingScheduler;

    #[test]
    fn start_requests_first_frame_once() {
        let scheduler = CountingScheduler::default();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&scheduler);
        render_loop.start(&scheduler);
        assert_eq!(scheduler.requests(), 1);
        assert!(render_loop.is_running());
    }

    #[test]
    fn each_frame_reschedules_the_next() {
        let scheduler = CountingScheduler::default();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&scheduler);
        for _ in 0..3 {
            assert!(render_loop.run_frame(&scheduler, || Ok::<_, ()>(())).unwrap());
        }
        assert_eq!(render_loop.frames_submitted(), 3);
        assert_eq!(scheduler.requests(), 4);
    }

    #[test]
    fn idle_loop_runs_nothing() {
        let scheduler = CountingScheduler::default();
        let mut render_loop = RenderLoop::new();
        let mut ran = false;
        let result = render_loop.run_frame(&scheduler, || {
            ran = true;
            Ok::<_, ()>(())
        });
        assert_eq!(result, Ok(false));
        assert!(!ran);
    }

    #[test]
    fn cancel_stops_pending_and_future_frames() {
        let scheduler = CountingScheduler::default();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&scheduler);
        render_loop.run_frame(&scheduler, || Ok::<_, ()>(())).unwrap();
        let requested = scheduler.requests();

        render_loop.cancel();
        let mut ran = false;
        let result = render_loop.run_frame(&scheduler, || {
            ran = true;
            Ok::<_, ()>(())
        });
        assert_eq!(result, Ok(false));
        assert!(!ran);
        assert_eq!(scheduler.requests(), requested);

        // A cancelled loop cannot be restarted.
        render_loop.start(&scheduler);
        assert_eq!(render_loop.state(), LoopState::Cancelled);
    }

    #[test]
    fn frame_error_cancels_the_loop() {
        let scheduler = CountingScheduler::default();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&scheduler);
        assert_eq!(render_loop.run_frame(&scheduler, || Err("lost")), Err("lost"));
        assert_eq!(render_loop.state(), LoopState::Cancelled);
        assert_eq!(scheduler.requests(), 1);
    }
}
