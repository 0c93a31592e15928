//! Engine: owns the GPU context, the stage, and the active renderer.

use std::sync::Arc;

use crate::context::GpuContext;
use crate::error::RenderResult;
use crate::renderer::{create_renderer, Renderer, RendererKind};
use crate::stage::Stage;
use crate::EngineConfig;

/// Ties the context, stage, and active render strategy together. The
/// strategy can be swapped at runtime without rebuilding the stage.
pub struct Engine {
    ctx: GpuContext,
    stage: Stage,
    renderer: Box<dyn Renderer>,
    kind: RendererKind,
}

impl Engine {
    /// Builds an engine presenting to the given window.
    pub fn new(window: Arc<winit::window::Window>, config: &EngineConfig) -> RenderResult<Self> {
        let ctx = GpuContext::new(window, config.vsync)?;
        Ok(Self::with_context(ctx, config))
    }

    /// Builds an engine without a presentation surface, for offscreen
    /// rendering and tests.
    pub fn headless(width: u32, height: u32, config: &EngineConfig) -> RenderResult<Self> {
        let ctx = GpuContext::headless(width, height)?;
        Ok(Self::with_context(ctx, config))
    }

    fn with_context(ctx: GpuContext, config: &EngineConfig) -> Self {
        let stage = Stage::new(&ctx, config);
        let renderer = create_renderer(config.renderer, &ctx, &stage);
        log::info!("Renderer: {}", config.renderer.name());
        Self {
            ctx,
            stage,
            renderer,
            kind: config.renderer,
        }
    }

    pub fn ctx(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Split borrow for scene building: the context plus mutable stage.
    pub fn parts_mut(&mut self) -> (&GpuContext, &mut Stage) {
        (&self.ctx, &mut self.stage)
    }

    pub fn renderer_kind(&self) -> RendererKind {
        self.kind
    }

    /// Swaps the active render strategy. The outgoing renderer's textures
    /// are released; the stage carries over untouched.
    pub fn set_renderer(&mut self, kind: RendererKind) {
        if kind == self.kind {
            return;
        }
        self.renderer.destroy();
        self.renderer = create_renderer(kind, &self.ctx, &self.stage);
        self.kind = kind;
        log::info!("Renderer: {}", kind.name());
    }

    /// Advances one frame of simulation and per-frame uploads.
    pub fn on_frame(&mut self, delta_time: f32) {
        self.renderer
            .on_frame(&self.ctx, &mut self.stage, delta_time);
    }

    /// Draws to the presentation surface.
    pub fn draw(&mut self) -> RenderResult<()> {
        self.renderer.draw(&self.ctx, &self.stage)
    }

    /// Draws to an arbitrary color target of the surface format.
    pub fn draw_to(&mut self, target: &wgpu::TextureView) -> RenderResult<()> {
        self.renderer.draw_to(&self.ctx, &self.stage, target)
    }

    /// Propagates a surface resize: context first, then the stage's cluster
    /// grid and projection, then the renderer's attachments.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.ctx.resize(width, height);
        self.stage.resize(&self.ctx);
        self.renderer.resize(&self.ctx, &self.stage);
    }
}
