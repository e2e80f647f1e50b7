// orientation.rs — drag gestures to camera yaw/pitch

use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;

/// Radians of rotation per pixel of drag, shared by mouse and touch.
pub const DRAG_SENSITIVITY: f32 = 0.005;

/// Camera look direction in radians.
///
/// Yaw is unbounded; pitch always stays within [-π/2, π/2] so the camera
/// never flips over the poles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationState {
    pub yaw: f32,
    pub pitch: f32,
}

impl OrientationState {
    fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * DRAG_SENSITIVITY;
        self.pitch = (self.pitch + dy * DRAG_SENSITIVITY).clamp(-FRAC_PI_2, FRAC_PI_2);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragGesture {
    pub active: bool,
    pub last: (f64, f64),
}

impl DragGesture {
    fn begin(&mut self, x: f64, y: f64) {
        self.active = true;
        self.last = (x, y);
    }

    /// Delta from the last recorded point; records the new one.
    fn advance(&mut self, x: f64, y: f64) -> (f32, f32) {
        let dx = (x - self.last.0) as f32;
        let dy = (y - self.last.1) as f32;
        self.last = (x, y);
        (dx, dy)
    }
}

#[derive(Debug, Default)]
pub struct OrientationTracker {
    orientation: OrientationState,
    drag: DragGesture,
    touches: HashSet<u64>,
}

impl OrientationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orientation(&self) -> OrientationState {
        self.orientation
    }

    pub fn drag(&self) -> DragGesture {
        self.drag
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.drag.begin(x, y);
    }

    /// Returns true when the orientation changed.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        if !self.drag.active {
            return false;
        }
        let (dx, dy) = self.drag.advance(x, y);
        self.orientation.rotate(dx, dy);
        true
    }

    pub fn pointer_up(&mut self) {
        self.drag.active = false;
    }

    pub fn pointer_leave(&mut self) {
        self.drag.active = false;
    }

    pub fn touch_start(&mut self, id: u64, x: f64, y: f64) {
        self.touches.insert(id);
        if self.touches.len() == 1 {
            self.drag.begin(x, y);
        }
    }

    /// Only a single-finger drag rotates; pinches and multi-finger pans do not.
    pub fn touch_move(&mut self, id: u64, x: f64, y: f64) -> bool {
        if self.touches.len() != 1 || !self.touches.contains(&id) {
            return false;
        }
        self.pointer_move(x, y)
    }

    pub fn touch_end(&mut self, id: u64) {
        self.touches.remove(&id);
        self.drag.active = false;
    }

    pub fn active_touches(&self) -> usize {
        self.touches.len()
    }

    pub fn reset(&mut self) {
        self.orientation = OrientationState::default();
        self.drag = DragGesture::default();
        self.touches.clear();
    }
}
