//! Error types shared by context setup and per-frame rendering

use thiserror::Error;

/// Errors surfaced by the GPU context and the renderers
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No suitable GPU adapter found")]
    AdapterNotFound,

    #[error("Failed to create presentation surface: {0}")]
    SurfaceCreationFailed(String),

    #[error("Failed to create device: {0}")]
    DeviceCreationFailed(String),

    #[error("Surface lost, reconfiguration required")]
    SurfaceLost,

    #[error("Out of GPU memory")]
    OutOfMemory,

    #[error("Failed to acquire frame: {0}")]
    AcquireFrameFailed(String),

    #[error("Operation requires a presentation surface")]
    NoSurface,
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
