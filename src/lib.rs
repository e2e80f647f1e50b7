// lib.rs — AnyWhereDoor: an interactive 360° video viewer
//
// An equirectangular video is streamed through ffmpeg, uploaded every frame
// onto the inside of a sphere and viewed through a perspective camera that
// the user turns by dragging. `viewer::ViewerController` owns one such
// session from mount to unmount.

pub mod config;
pub mod controls;
pub mod error;
pub mod fullscreen;
pub mod i18n;
pub mod input;
pub mod media;
pub mod mesh;
pub mod orientation;
pub mod overlay;
pub mod render_loop;
pub mod renderer;
pub mod scene;
pub mod viewer;

#[cfg(test)]
mod testing;
