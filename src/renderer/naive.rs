//! Forward renderer shading every fragment against every light.

use crate::context::{storage_entry, uniform_entry, GpuContext};
use crate::error::RenderResult;
use crate::renderer::{
    create_depth_texture, record_scene_draws, DrawSlots, FrameProfiler, Renderer, DEPTH_FORMAT,
};
use crate::shaders;
use crate::stage::{Stage, Vertex};

/// The baseline strategy: one forward pass, every fragment loops over the
/// full light list. Cost scales with fragments times lights.
pub struct NaiveRenderer {
    scene_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    pipeline: wgpu::RenderPipeline,
    profiler: FrameProfiler,
}

impl NaiveRenderer {
    pub fn new(ctx: &GpuContext, stage: &Stage) -> Self {
        let scene_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Naive Scene Bind Group Layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::VERTEX),
                    storage_entry(1, wgpu::ShaderStages::FRAGMENT, true),
                ],
            });
        let scene_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Naive Scene Bind Group"),
            layout: &scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: stage.camera.uniforms_buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: stage.lights.light_buffer().as_entire_binding(),
                },
            ],
        });

        let (depth_texture, depth_view) = create_depth_texture(ctx);

        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Naive Shader"),
                source: wgpu::ShaderSource::Wgsl(shaders::NAIVE_SHADER.into()),
            });
        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Naive Pipeline Layout"),
                bind_group_layouts: &[
                    &scene_layout,
                    ctx.model_bind_group_layout(),
                    ctx.material_bind_group_layout(),
                ],
                push_constant_ranges: &[],
            });
        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Naive Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[Vertex::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        Self {
            scene_bind_group,
            depth_texture,
            depth_view,
            pipeline,
            profiler: FrameProfiler::new("naive"),
        }
    }
}

impl Renderer for NaiveRenderer {
    fn on_frame(&mut self, ctx: &GpuContext, stage: &mut Stage, delta_time: f32) {
        stage.lights.on_frame(ctx, delta_time);
        self.profiler.sample_and_log(stage.lights.light_count());
        stage.on_frame(&ctx.queue);
    }

    fn draw(&mut self, ctx: &GpuContext, stage: &Stage) -> RenderResult<()> {
        let frame = ctx.acquire_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.draw_to(ctx, stage, &view)?;
        frame.present();
        Ok(())
    }

    fn draw_to(
        &mut self,
        ctx: &GpuContext,
        stage: &Stage,
        target: &wgpu::TextureView,
    ) -> RenderResult<()> {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Naive Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Naive Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.scene_bind_group, &[]);
            record_scene_draws(
                &mut pass,
                &stage.scene,
                DrawSlots {
                    model: 1,
                    material: 2,
                },
            );
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn resize(&mut self, ctx: &GpuContext, _stage: &Stage) {
        let (depth_texture, depth_view) = create_depth_texture(ctx);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    fn destroy(&mut self) {
        self.depth_texture.destroy();
    }
}
