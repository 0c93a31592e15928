//! Lumen - a scene renderer for many dynamic point lights
//!
//! Three interchangeable render strategies draw the same stage:
//! - **Naive forward**: every fragment shades every light
//! - **Forward+**: fragments shade only the lights a compute pass binned
//!   into their view-frustum cluster
//! - **Clustered deferred**: geometry attributes captured in a G-buffer,
//!   then one full-screen clustered lighting pass
//!
//! The stage (camera, scene content, animated light set) is shared across
//! strategies, so they can be swapped at runtime and compared on identical
//! input.

pub mod context;
pub mod engine;
pub mod error;
pub mod renderer;
pub mod shaders;
pub mod stage;
pub mod window;

pub use context::GpuContext;
pub use engine::Engine;
pub use error::{RenderError, RenderResult};
pub use renderer::{Renderer, RendererKind};
pub use stage::Stage;
pub use window::Window;

/// Configuration for initializing the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Render strategy selected at startup
    pub renderer: RendererKind,
    /// Enable vsync
    pub vsync: bool,
    /// Number of animated lights active at startup
    pub light_count: u32,
    /// Capacity of the light buffer
    pub max_lights: u32,
    /// Cluster tile size in pixels
    pub tile_size: u32,
    /// Number of depth slices in the cluster grid
    pub depth_slices: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Lumen".to_string(),
            width: 1280,
            height: 720,
            renderer: RendererKind::default(),
            vsync: true,
            light_count: 500,
            max_lights: 1024,
            tile_size: 16,
            depth_slices: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_consistent() {
        let config = EngineConfig::default();
        assert!(config.light_count <= config.max_lights);
        assert!(config.tile_size > 0 && config.depth_slices > 0);
        assert_eq!(config.renderer, RendererKind::Naive);
    }
}
