//! Deferred renderer: geometry pass into a G-buffer, then one full-screen
//! clustered lighting pass.

use crate::context::{storage_entry, uniform_entry, GpuContext};
use crate::error::RenderResult;
use crate::renderer::{
    create_depth_texture, record_scene_draws, DrawSlots, FrameProfiler, Renderer, DEPTH_FORMAT,
    GBUFFER_FORMATS,
};
use crate::shaders;
use crate::stage::{Stage, Vertex};

/// Clustered deferred strategy. Shading cost depends on screen resolution
/// and per-cluster light density instead of draw count or overdraw, paid
/// for with G-buffer bandwidth and fixed attribute precision.
pub struct ClusteredDeferredRenderer {
    gbuffer: GBuffer,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    camera_bind_group: wgpu::BindGroup,
    lighting_layout: wgpu::BindGroupLayout,
    lighting_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    geometry_pipeline: wgpu::RenderPipeline,
    lighting_pipeline: wgpu::RenderPipeline,
    profiler: FrameProfiler,
}

/// Position, normal, and albedo attachments, in that order.
struct GBuffer {
    textures: [wgpu::Texture; 3],
    views: [wgpu::TextureView; 3],
}

impl ClusteredDeferredRenderer {
    pub fn new(ctx: &GpuContext, stage: &Stage) -> Self {
        let gbuffer = create_gbuffer(ctx);
        let (depth_texture, depth_view) = create_depth_texture(ctx);

        let camera_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Geometry Camera Bind Group Layout"),
                entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
            });
        let camera_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Geometry Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: stage.camera.uniforms_buffer().as_entire_binding(),
            }],
        });

        let geometry_shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Geometry Shader"),
                source: wgpu::ShaderSource::Wgsl(shaders::GEOMETRY_SHADER.into()),
            });
        let geometry_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Geometry Pipeline Layout"),
                bind_group_layouts: &[
                    ctx.model_bind_group_layout(),
                    &camera_layout,
                    ctx.material_bind_group_layout(),
                ],
                push_constant_ranges: &[],
            });
        let geometry_pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Geometry Pipeline"),
                layout: Some(&geometry_layout),
                vertex: wgpu::VertexState {
                    module: &geometry_shader,
                    entry_point: "vs_main",
                    buffers: &[Vertex::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &geometry_shader,
                    entry_point: "fs_main",
                    targets: &[
                        Some(wgpu::ColorTargetState {
                            format: GBUFFER_FORMATS[0],
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        }),
                        Some(wgpu::ColorTargetState {
                            format: GBUFFER_FORMATS[1],
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        }),
                        Some(wgpu::ColorTargetState {
                            format: GBUFFER_FORMATS[2],
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        }),
                    ],
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

        let lighting_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Lighting Bind Group Layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                    storage_entry(1, wgpu::ShaderStages::FRAGMENT, true),
                    storage_entry(2, wgpu::ShaderStages::FRAGMENT, true),
                    texture_entry(3),
                    texture_entry(4),
                    texture_entry(5),
                    wgpu::BindGroupLayoutEntry {
                        binding: 6,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });
        let sampler = ctx
            .device
            .create_sampler(&wgpu::SamplerDescriptor::default());
        let lighting_bind_group =
            create_lighting_bind_group(ctx, &lighting_layout, stage, &gbuffer, &sampler);

        let lighting_shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Lighting Shader"),
                source: wgpu::ShaderSource::Wgsl(shaders::DEFERRED_LIGHTING_SHADER.into()),
            });
        let lighting_pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("Lighting Pipeline Layout"),
                    bind_group_layouts: &[&lighting_layout],
                    push_constant_ranges: &[],
                });
        let lighting_pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Lighting Pipeline"),
                layout: Some(&lighting_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &lighting_shader,
                    entry_point: "vs_main",
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &lighting_shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        Self {
            gbuffer,
            depth_texture,
            depth_view,
            camera_bind_group,
            lighting_layout,
            lighting_bind_group,
            sampler,
            geometry_pipeline,
            lighting_pipeline,
            profiler: FrameProfiler::new("clustered deferred"),
        }
    }
}

fn create_gbuffer(ctx: &GpuContext) -> GBuffer {
    let (position, position_view) =
        create_gbuffer_texture(ctx, "G-buffer Position Texture", GBUFFER_FORMATS[0]);
    let (normal, normal_view) =
        create_gbuffer_texture(ctx, "G-buffer Normal Texture", GBUFFER_FORMATS[1]);
    let (albedo, albedo_view) =
        create_gbuffer_texture(ctx, "G-buffer Albedo Texture", GBUFFER_FORMATS[2]);
    GBuffer {
        textures: [position, normal, albedo],
        views: [position_view, normal_view, albedo_view],
    }
}

fn create_gbuffer_texture(
    ctx: &GpuContext,
    label: &str,
    format: wgpu::TextureFormat,
) -> (wgpu::Texture, wgpu::TextureView) {
    let (width, height) = ctx.surface_size();
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn create_lighting_bind_group(
    ctx: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    stage: &Stage,
    gbuffer: &GBuffer,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Lighting Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: stage.camera.uniforms_buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: stage.lights.light_buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: stage.lights.cluster_buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&gbuffer.views[0]),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::TextureView(&gbuffer.views[1]),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::TextureView(&gbuffer.views[2]),
            },
            wgpu::BindGroupEntry {
                binding: 6,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn gbuffer_attachment(view: &wgpu::TextureView) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            store: wgpu::StoreOp::Store,
        },
    })
}

impl Renderer for ClusteredDeferredRenderer {
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

    /// Both passes are recorded into one command buffer. The geometry pass
    /// writing the G-buffer always precedes the lighting pass reading it;
    /// that fixed order within a single submission is the only
    /// synchronization between the two.
    fn draw_to(
        &mut self,
        ctx: &GpuContext,
        stage: &Stage,
        target: &wgpu::TextureView,
    ) -> RenderResult<()> {
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Deferred Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Geometry Pass"),
                color_attachments: &[
                    gbuffer_attachment(&self.gbuffer.views[0]),
                    gbuffer_attachment(&self.gbuffer.views[1]),
                    gbuffer_attachment(&self.gbuffer.views[2]),
                ],
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
            pass.set_pipeline(&self.geometry_pipeline);
            pass.set_bind_group(1, &self.camera_bind_group, &[]);
            record_scene_draws(
                &mut pass,
                &stage.scene,
                DrawSlots {
                    model: 0,
                    material: 2,
                },
            );
        }
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Lighting Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.lighting_pipeline);
            pass.set_bind_group(0, &self.lighting_bind_group, &[]);
            pass.draw(0..6, 0..1);
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// G-buffer and depth attachments are pixel-sized, so all of them are
    /// rebuilt, and with them the lighting bind group that references the
    /// G-buffer views and the resized cluster buffer.
    fn resize(&mut self, ctx: &GpuContext, stage: &Stage) {
        self.gbuffer = create_gbuffer(ctx);
        let (depth_texture, depth_view) = create_depth_texture(ctx);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
        self.lighting_bind_group = create_lighting_bind_group(
            ctx,
            &self.lighting_layout,
            stage,
            &self.gbuffer,
            &self.sampler,
        );
    }

    fn destroy(&mut self) {
        for texture in &self.gbuffer.textures {
            texture.destroy();
        }
        self.depth_texture.destroy();
    }
}
