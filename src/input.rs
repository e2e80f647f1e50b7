// input.rs — platform events normalized into `InputEvent`s, and a binding
// table that routes each event kind to one handler
//
// The table is bound and unbound as a whole, so a torn-down viewer cannot
// keep a stray subset of handlers alive.

use std::collections::HashMap;

use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

/// Pixels of trackpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    PointerLeave,
    TouchStart { id: u64, x: f64, y: f64 },
    TouchMove { id: u64, x: f64, y: f64 },
    TouchEnd { id: u64 },
    /// Positive values scroll "up" (zoom in).
    Wheel { lines: f32 },
    Resize { width: u32, height: u32 },
    FullscreenChange { fullscreen: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    PointerDown,
    PointerMove,
    PointerUp,
    PointerLeave,
    TouchStart,
    TouchMove,
    TouchEnd,
    Wheel,
    Resize,
    FullscreenChange,
}

impl InputEvent {
    pub fn kind(&self) -> InputKind {
        match self {
            InputEvent::PointerDown { .. } => InputKind::PointerDown,
            InputEvent::PointerMove { .. } => InputKind::PointerMove,
            InputEvent::PointerUp => InputKind::PointerUp,
            InputEvent::PointerLeave => InputKind::PointerLeave,
            InputEvent::TouchStart { .. } => InputKind::TouchStart,
            InputEvent::TouchMove { .. } => InputKind::TouchMove,
            InputEvent::TouchEnd { .. } => InputKind::TouchEnd,
            InputEvent::Wheel { .. } => InputKind::Wheel,
            InputEvent::Resize { .. } => InputKind::Resize,
            InputEvent::FullscreenChange { .. } => InputKind::FullscreenChange,
        }
    }
}

pub type Handler<T> = fn(&mut T, &InputEvent);

pub struct InputBindings<T> {
    table: HashMap<InputKind, Handler<T>>,
}

impl<T> Default for InputBindings<T> {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
        }
    }
}

impl<T> InputBindings<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole table in one step.
    pub fn bind_all(&mut self, bindings: impl IntoIterator<Item = (InputKind, Handler<T>)>) {
        self.table = bindings.into_iter().collect();
    }

    pub fn unbind_all(&mut self) {
        self.table = HashMap::new();
    }

    pub fn is_bound(&self) -> bool {
        !self.table.is_empty()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn handler(&self, kind: InputKind) -> Option<Handler<T>> {
        self.table.get(&kind).copied()
    }
}

/// Turns winit window events into viewer input.
///
/// Mouse buttons carry no position in winit, so the last cursor position is
/// remembered here.
#[derive(Debug, Default)]
pub struct InputTranslator {
    cursor: Option<PhysicalPosition<f64>>,
}

impl InputTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&mut self, event: &WindowEvent<'_>) -> Option<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(*position);
                Some(InputEvent::PointerMove {
                    x: position.x,
                    y: position.y,
                })
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                Some(InputEvent::PointerLeave)
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    let pos = self.cursor?;
                    Some(InputEvent::PointerDown { x: pos.x, y: pos.y })
                }
                ElementState::Released => Some(InputEvent::PointerUp),
            },
            WindowEvent::Touch(touch) => {
                let (id, x, y) = (touch.id, touch.location.x, touch.location.y);
                Some(match touch.phase {
                    TouchPhase::Started => InputEvent::TouchStart { id, x, y },
                    TouchPhase::Moved => InputEvent::TouchMove { id, x, y },
                    TouchPhase::Ended | TouchPhase::Cancelled => InputEvent::TouchEnd { id },
                })
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
                };
                Some(InputEvent::Wheel { lines })
            }
            WindowEvent::Resized(size) => Some(InputEvent::Resize {
                width: size.width,
                height: size.height,
            }),
            _ => None,
        }
    }
}
