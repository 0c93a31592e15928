//! Render strategies over the shared stage.
//!
//! All three renderers draw the same scene through the same iteration
//! contract and read the same light set; they differ only in how many
//! lights each fragment pays for.

pub mod clustered_deferred;
pub mod forward_plus;
pub mod naive;
pub mod profiler;

pub use clustered_deferred::ClusteredDeferredRenderer;
pub use forward_plus::ForwardPlusRenderer;
pub use naive::NaiveRenderer;
pub use profiler::{FrameProfiler, FrameSummary, MAX_SAMPLES};

use crate::context::GpuContext;
use crate::error::RenderResult;
use crate::stage::{Scene, SceneItem, Stage};

/// Depth attachment format for the depth-tested passes.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// G-buffer attachment formats: world position, world normal, albedo.
pub const GBUFFER_FORMATS: [wgpu::TextureFormat; 3] = [
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba8Unorm,
];

/// Selects a render strategy at startup or at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererKind {
    #[default]
    Naive,
    ForwardPlus,
    ClusteredDeferred,
}

impl RendererKind {
    pub fn name(&self) -> &'static str {
        match self {
            RendererKind::Naive => "naive",
            RendererKind::ForwardPlus => "forward+",
            RendererKind::ClusteredDeferred => "clustered deferred",
        }
    }
}

/// A complete render strategy.
///
/// Implementations own their pipelines and frame-sized attachments; the
/// stage owns everything they draw. Call order per frame is `on_frame`
/// then `draw`, and `resize` whenever the surface changes size.
pub trait Renderer {
    /// Advances per-frame state: light simulation and cluster assignment,
    /// frame time sampling, and the camera upload.
    fn on_frame(&mut self, ctx: &GpuContext, stage: &mut Stage, delta_time: f32);

    /// Acquires the next surface frame, draws the stage into it, and
    /// presents it.
    fn draw(&mut self, ctx: &GpuContext, stage: &Stage) -> RenderResult<()>;

    /// Draws the stage into the given color target, submitting exactly one
    /// command buffer.
    fn draw_to(
        &mut self,
        ctx: &GpuContext,
        stage: &Stage,
        target: &wgpu::TextureView,
    ) -> RenderResult<()>;

    /// Rebuilds the frame-sized attachments for the current surface size.
    fn resize(&mut self, ctx: &GpuContext, stage: &Stage);

    /// Releases the textures allocated by the constructor.
    fn destroy(&mut self);
}

/// Builds the renderer for `kind` against an already constructed stage.
pub fn create_renderer(
    kind: RendererKind,
    ctx: &GpuContext,
    stage: &Stage,
) -> Box<dyn Renderer> {
    match kind {
        RendererKind::Naive => Box::new(NaiveRenderer::new(ctx, stage)),
        RendererKind::ForwardPlus => Box::new(ForwardPlusRenderer::new(ctx, stage)),
        RendererKind::ClusteredDeferred => Box::new(ClusteredDeferredRenderer::new(ctx, stage)),
    }
}

/// Bind group slots a pass assigns while walking the scene.
pub(crate) struct DrawSlots {
    pub model: u32,
    pub material: u32,
}

/// Records one draw-indexed call per visible primitive, rebinding the model
/// and material groups as iteration enters them.
pub(crate) fn record_scene_draws<'a>(
    pass: &mut wgpu::RenderPass<'a>,
    scene: &'a Scene,
    slots: DrawSlots,
) {
    scene.iterate(|item| match item {
        SceneItem::Node(node) => {
            pass.set_bind_group(slots.model, &node.model_bind_group, &[]);
        }
        SceneItem::Material(material) => {
            pass.set_bind_group(slots.material, &material.bind_group, &[]);
        }
        SceneItem::Primitive(primitive) => {
            pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
            pass.set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..primitive.index_count, 0, 0..1);
        }
    });
}

/// Creates the surface-sized depth attachment.
pub(crate) fn create_depth_texture(ctx: &GpuContext) -> (wgpu::Texture, wgpu::TextureView) {
    let (width, height) = ctx.surface_size();
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(RendererKind::Naive.name(), "naive");
        assert_eq!(RendererKind::ForwardPlus.name(), "forward+");
        assert_eq!(RendererKind::ClusteredDeferred.name(), "clustered deferred");
        assert_eq!(RendererKind::default(), RendererKind::Naive);
    }
}
