// error.rs — error types for the viewer
//
// Each concern gets its own enum; `ViewerError` is what mount/reload and the
// frame loop hand back to the embedding application.

use thiserror::Error;

/// Failures while creating or driving the GPU renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter found")]
    NoAdapter,

    #[error("failed to acquire graphics device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("renderer output surface was already released")]
    Detached,

    #[error("graphics device ran out of memory")]
    OutOfMemory,

    #[error("invalid video frame: {0}")]
    InvalidFrame(String),
}

/// Failures of the media element (probe, decode, playback).
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read media information: {0}")]
    Probe(String),

    #[error("source has no video stream")]
    NoVideoStream,

    #[error("decoding failed: {0}")]
    Decode(String),

    #[error("media source is in an error state: {0}")]
    Failed(String),
}

/// Fullscreen requests that the platform could not honor.
#[derive(Error, Debug)]
pub enum FullscreenError {
    #[error("fullscreen is not supported on this display")]
    Unsupported,

    #[error("fullscreen request was denied: {0}")]
    Denied(String),
}

/// Command line problems.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing value for {0}")]
    MissingValue(String),

    #[error("unknown option {0}")]
    UnknownOption(String),

    #[error("more than one video source given ({0})")]
    DuplicateSource(String),
}

/// Top-level error surfaced to the embedding application.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Media(#[from] MediaError),
}
