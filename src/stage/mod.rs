//! Scene-side state shared by every render strategy.

pub mod camera;
pub mod lights;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod transform;

pub use camera::{Camera, CameraUniforms, Projection};
pub use lights::{ClusterGrid, LightCount, LightSet, PointLight, MAX_LIGHTS_PER_CLUSTER};
pub use material::{Material, MaterialUniforms};
pub use mesh::{MeshData, Vertex};
pub use scene::{MaterialBatch, MaterialId, MeshId, NodeId, Scene, SceneItem};
pub use transform::{ModelUniforms, Transform};

use crate::context::GpuContext;
use crate::EngineConfig;

/// Everything the renderers draw: camera, scene content, and the shared
/// light set. Strategies can be swapped without touching any of it.
pub struct Stage {
    pub camera: Camera,
    pub scene: Scene,
    pub lights: LightSet,
}

impl Stage {
    pub fn new(ctx: &GpuContext, config: &EngineConfig) -> Self {
        let camera = Camera::new(ctx);
        let lights = LightSet::new(ctx, &camera, config);
        Self {
            camera,
            scene: Scene::new(),
            lights,
        }
    }

    /// Per-frame upload of camera state. Renderers call this from their
    /// `on_frame` after the light set has advanced.
    pub fn on_frame(&mut self, queue: &wgpu::Queue) {
        self.camera.write_uniforms(queue);
    }

    /// Tracks a surface resize: updates the projection and rebuilds the
    /// cluster grid for the new pixel dimensions.
    pub fn resize(&mut self, ctx: &GpuContext) {
        let (width, height) = ctx.surface_size();
        self.camera.set_aspect(width, height);
        self.lights.resize(ctx, &self.camera);
    }
}
