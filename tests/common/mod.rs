//! Shared helpers for the GPU integration tests.

use glam::Vec3;
use lumen_engine::stage::{Material, MeshData, Transform};
use lumen_engine::{Engine, EngineConfig, GpuContext, RendererKind};

pub const WIDTH: u32 = 256;
pub const HEIGHT: u32 = 256;

/// Build a headless engine, or `None` when no GPU adapter is available.
pub fn headless_engine(kind: RendererKind) -> Option<Engine> {
    let config = EngineConfig {
        renderer: kind,
        light_count: 64,
        ..EngineConfig::default()
    };
    match Engine::headless(WIDTH, HEIGHT, &config) {
        Ok(engine) => Some(engine),
        Err(err) => {
            eprintln!("No GPU available ({err}), skipping");
            None
        }
    }
}

/// Fill the stage with a floor plane and a cube standing on it.
pub fn populate_stage(engine: &mut Engine) {
    let (ctx, stage) = engine.parts_mut();
    let scene = &mut stage.scene;
    let floor = scene.add_mesh(ctx, &MeshData::plane(20.0, 20.0, 4));
    let cube = scene.add_mesh(ctx, &MeshData::cube());
    let slate = scene.add_material(ctx, Material::slate());
    let brick = scene.add_material(ctx, Material::brick());
    scene.add_object(ctx, Transform::default(), slate, floor);
    scene.add_object(
        ctx,
        Transform::from_position(Vec3::new(0.0, 0.5, 0.0)),
        brick,
        cube,
    );
}

/// Offscreen color target matching the engine's surface format.
pub fn create_target(ctx: &GpuContext, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ctx.surface_format(),
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Copy an RGBA8 texture to the CPU, dropping row padding.
pub fn read_texture_rgba(
    ctx: &GpuContext,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let padded_row = (width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
    let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: (padded_row * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
    encoder.copy_texture_to_buffer(
        texture.as_image_copy(),
        wgpu::ImageCopyBuffer {
            buffer: &buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: None,
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    ctx.device.poll(wgpu::Maintain::Wait);
    rx.recv().unwrap().unwrap();

    let mapped = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for row in mapped.chunks(padded_row as usize) {
        pixels.extend_from_slice(&row[..(width * 4) as usize]);
    }
    drop(mapped);
    buffer.unmap();
    pixels
}

/// The RGBA bytes of one pixel.
pub fn pixel(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [data[i], data[i + 1], data[i + 2], data[i + 3]]
}
