use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use std::fmt;

use crate::context::{storage_entry, uniform_entry, GpuContext};
use crate::stage::camera::Camera;
use crate::EngineConfig;

/// Hard cap on the light indices stored per cluster.
pub const MAX_LIGHTS_PER_CLUSTER: u32 = 256;

/// Workgroup edge used by the cluster assignment shader.
const CLUSTER_WORKGROUP_SIZE: u32 = 4;

/// Light count reported by a renderer for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCount {
    Known(u32),
    Unknown,
}

impl fmt::Display for LightCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightCount::Known(count) => write!(f, "{count}"),
            LightCount::Unknown => f.write_str("unknown"),
        }
    }
}

/// One animated point light.
///
/// The motion is a pure function of the parameters and the elapsed time, so
/// a light's position can be recomputed for any instant without mutating it.
#[derive(Debug, Clone)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    /// Influence radius in world units. Fragments beyond it get no light.
    pub radius: f32,
    pub orbit_radius: f32,
    pub anchor_height: f32,
    /// Angular speed in radians per second.
    pub speed: f32,
    pub phase: f32,
}

impl PointLight {
    /// Builds the light at `index` of the deterministic distribution that
    /// fills the scene volume. The same index always yields the same light.
    pub fn distributed(index: u32) -> Self {
        let i = index as f32;
        // Golden-angle increments keep neighbours in index order far apart
        // in angle, so any prefix of the sequence covers the full circle.
        let phase = i * 2.399_963;
        Self {
            color: Vec3::new(
                phase.sin().abs().max(0.15),
                (phase * 1.3 + 2.0).sin().abs().max(0.15),
                (phase * 1.7 + 4.0).sin().abs().max(0.15),
            ),
            intensity: 1.2,
            radius: 3.5,
            orbit_radius: 2.0 + 9.0 * (i * 0.618_034).fract(),
            anchor_height: 0.6 + 4.0 * (i * 0.381_966).fract(),
            speed: 0.15 + 0.35 * (i * 0.754_877).fract(),
            phase,
        }
    }

    /// World position at `time` seconds: a slow orbit around the scene
    /// center plus a vertical bob.
    pub fn position_at(&self, time: f32) -> Vec3 {
        let angle = self.phase + time * self.speed;
        let bob = (self.phase * 3.1 + time * 0.8).sin() * 0.6;
        Vec3::new(
            angle.cos() * self.orbit_radius,
            self.anchor_height + bob,
            angle.sin() * self.orbit_radius,
        )
    }

    fn gpu_data(&self, time: f32) -> GpuLight {
        GpuLight {
            position_radius: self.position_at(time).extend(self.radius),
            color_intensity: self.color.extend(self.intensity),
        }
    }
}

/// Per-light record in the light storage buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz = world position, w = influence radius.
    pub position_radius: Vec4,
    /// xyz = color, w = intensity.
    pub color_intensity: Vec4,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct LightSetHeader {
    num_lights: u32,
    _padding: [u32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ClusterHeader {
    /// xyz = cluster grid dimensions, w = tile size in pixels.
    dims: [u32; 4],
    /// xy = surface size in pixels.
    screen: [f32; 4],
}

/// Per-cluster record in the cluster storage buffer.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ClusterRecord {
    pub light_count: u32,
    pub _padding: [u32; 3],
    pub light_indices: [u32; MAX_LIGHTS_PER_CLUSTER as usize],
}

/// Cluster grid dimensions derived from the surface size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterGrid {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub tile_size: u32,
}

impl ClusterGrid {
    pub fn for_surface(width: u32, height: u32, tile_size: u32, depth_slices: u32) -> Self {
        let tile_size = tile_size.max(1);
        Self {
            x: (width.max(1) + tile_size - 1) / tile_size,
            y: (height.max(1) + tile_size - 1) / tile_size,
            z: depth_slices.max(1),
            tile_size,
        }
    }

    pub fn cluster_count(&self) -> u32 {
        self.x * self.y * self.z
    }

    /// Size in bytes of the cluster storage buffer: header plus one record
    /// per cluster.
    pub fn buffer_size(&self) -> u64 {
        std::mem::size_of::<ClusterHeader>() as u64
            + self.cluster_count() as u64 * std::mem::size_of::<ClusterRecord>() as u64
    }

    pub fn dispatch_size(&self) -> (u32, u32, u32) {
        let round_up = |n: u32| (n + CLUSTER_WORKGROUP_SIZE - 1) / CLUSTER_WORKGROUP_SIZE;
        (round_up(self.x), round_up(self.y), round_up(self.z))
    }

    fn header(&self, width: u32, height: u32) -> ClusterHeader {
        ClusterHeader {
            dims: [self.x, self.y, self.z, self.tile_size],
            screen: [width as f32, height as f32, 0.0, 0.0],
        }
    }
}

/// The shared light set: CPU light state, the light and cluster storage
/// buffers, and the compute pipeline that assigns lights to clusters.
///
/// All three render strategies read the light buffer; the clustered ones
/// also read the cluster buffer written by [`LightSet::on_frame`].
pub struct LightSet {
    lights: Vec<PointLight>,
    active: u32,
    max_lights: u32,
    depth_slices: u32,
    time: f32,
    grid: ClusterGrid,
    light_buffer: wgpu::Buffer,
    cluster_buffer: wgpu::Buffer,
    cluster_layout: wgpu::BindGroupLayout,
    cluster_pipeline: wgpu::ComputePipeline,
    cluster_bind_group: wgpu::BindGroup,
}

impl LightSet {
    pub fn new(ctx: &GpuContext, camera: &Camera, config: &EngineConfig) -> Self {
        let max_lights = config.max_lights.max(1);
        let active = config.light_count.min(max_lights);
        let lights = (0..max_lights).map(PointLight::distributed).collect();

        let light_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Buffer"),
            size: std::mem::size_of::<LightSetHeader>() as u64
                + max_lights as u64 * std::mem::size_of::<GpuLight>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let (width, height) = ctx.surface_size();
        let grid = ClusterGrid::for_surface(width, height, config.tile_size, config.depth_slices);
        let cluster_buffer = create_cluster_buffer(ctx, grid);

        let cluster_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Cluster Bind Group Layout"),
                    entries: &[
                        uniform_entry(0, wgpu::ShaderStages::COMPUTE),
                        storage_entry(1, wgpu::ShaderStages::COMPUTE, true),
                        storage_entry(2, wgpu::ShaderStages::COMPUTE, false),
                    ],
                });

        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Cluster Shader"),
                source: wgpu::ShaderSource::Wgsl(crate::shaders::CLUSTER_SHADER.into()),
            });
        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Cluster Pipeline Layout"),
                bind_group_layouts: &[&cluster_layout],
                push_constant_ranges: &[],
            });
        let cluster_pipeline =
            ctx.device
                .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("Cluster Pipeline"),
                    layout: Some(&pipeline_layout),
                    module: &shader,
                    entry_point: "main",
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                });

        let cluster_bind_group = create_cluster_bind_group(
            ctx,
            &cluster_layout,
            camera,
            &light_buffer,
            &cluster_buffer,
        );

        let light_set = Self {
            lights,
            active,
            max_lights,
            depth_slices: grid.z,
            time: 0.0,
            grid,
            light_buffer,
            cluster_buffer,
            cluster_layout,
            cluster_pipeline,
            cluster_bind_group,
        };
        light_set.write_cluster_header(&ctx.queue, width, height);
        light_set.write_lights(&ctx.queue);
        light_set
    }

    /// Advances the simulation, uploads the light buffer, and submits the
    /// cluster assignment dispatch. Renderers call this before recording
    /// their draw passes so the frame's cluster data is queued first.
    pub fn on_frame(&mut self, ctx: &GpuContext, delta_time: f32) {
        self.time += delta_time.max(0.0);
        self.write_lights(&ctx.queue);

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Cluster Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Cluster Assignment Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.cluster_pipeline);
            pass.set_bind_group(0, &self.cluster_bind_group, &[]);
            let (x, y, z) = self.grid.dispatch_size();
            pass.dispatch_workgroups(x, y, z);
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Rebuilds the cluster buffer for the new surface size. The light
    /// buffer is sized by `max_lights` and survives resizes untouched.
    pub fn resize(&mut self, ctx: &GpuContext, camera: &Camera) {
        let (width, height) = ctx.surface_size();
        self.grid = ClusterGrid::for_surface(width, height, self.grid.tile_size, self.depth_slices);
        self.cluster_buffer = create_cluster_buffer(ctx, self.grid);
        self.cluster_bind_group = create_cluster_bind_group(
            ctx,
            &self.cluster_layout,
            camera,
            &self.light_buffer,
            &self.cluster_buffer,
        );
        self.write_cluster_header(&ctx.queue, width, height);
    }

    /// Sets how many lights are active. Clamped to the buffer capacity;
    /// takes effect on the next frame's upload.
    pub fn set_light_count(&mut self, count: u32) {
        self.active = count.min(self.max_lights);
    }

    pub fn light_count(&self) -> LightCount {
        LightCount::Known(self.active)
    }

    pub fn max_lights(&self) -> u32 {
        self.max_lights
    }

    pub fn grid(&self) -> ClusterGrid {
        self.grid
    }

    pub fn light_buffer(&self) -> &wgpu::Buffer {
        &self.light_buffer
    }

    pub fn cluster_buffer(&self) -> &wgpu::Buffer {
        &self.cluster_buffer
    }

    fn write_lights(&self, queue: &wgpu::Queue) {
        let header = LightSetHeader {
            num_lights: self.active,
            _padding: [0; 3],
        };
        queue.write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&header));
        if self.active > 0 {
            let data: Vec<GpuLight> = self.lights[..self.active as usize]
                .iter()
                .map(|light| light.gpu_data(self.time))
                .collect();
            queue.write_buffer(
                &self.light_buffer,
                std::mem::size_of::<LightSetHeader>() as u64,
                bytemuck::cast_slice(&data),
            );
        }
    }

    fn write_cluster_header(&self, queue: &wgpu::Queue, width: u32, height: u32) {
        let header = self.grid.header(width, height);
        queue.write_buffer(&self.cluster_buffer, 0, bytemuck::bytes_of(&header));
    }
}

fn create_cluster_buffer(ctx: &GpuContext, grid: ClusterGrid) -> wgpu::Buffer {
    ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Cluster Buffer"),
        size: grid.buffer_size(),
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_cluster_bind_group(
    ctx: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    camera: &Camera,
    light_buffer: &wgpu::Buffer,
    cluster_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Cluster Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: camera.uniforms_buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: light_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: cluster_buffer.as_entire_binding(),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_light_is_two_vec4s() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 32);
        assert_eq!(std::mem::size_of::<LightSetHeader>(), 16);
    }

    #[test]
    fn cluster_record_matches_shader_stride() {
        assert_eq!(std::mem::size_of::<ClusterRecord>(), 1040);
        assert_eq!(std::mem::size_of::<ClusterHeader>(), 32);
    }

    #[test]
    fn grid_covers_partial_tiles() {
        let grid = ClusterGrid::for_surface(1280, 720, 16, 24);
        assert_eq!((grid.x, grid.y, grid.z), (80, 45, 24));

        let grid = ClusterGrid::for_surface(1281, 721, 16, 24);
        assert_eq!((grid.x, grid.y), (81, 46));
    }

    #[test]
    fn grid_survives_degenerate_input() {
        let grid = ClusterGrid::for_surface(0, 0, 0, 0);
        assert!(grid.x >= 1 && grid.y >= 1 && grid.z >= 1);
        assert!(grid.buffer_size() > 0);
    }

    #[test]
    fn dispatch_covers_every_cluster() {
        let grid = ClusterGrid::for_surface(1280, 720, 16, 24);
        let (x, y, z) = grid.dispatch_size();
        assert!(x * CLUSTER_WORKGROUP_SIZE >= grid.x);
        assert!(y * CLUSTER_WORKGROUP_SIZE >= grid.y);
        assert!(z * CLUSTER_WORKGROUP_SIZE >= grid.z);
    }

    #[test]
    fn distributed_lights_are_deterministic() {
        let a = PointLight::distributed(17);
        let b = PointLight::distributed(17);
        assert_eq!(a.position_at(3.0), b.position_at(3.0));
        assert_eq!(a.color, b.color);
    }

    #[test]
    fn lights_stay_inside_the_scene_volume() {
        for index in 0..512 {
            let light = PointLight::distributed(index);
            for step in 0..100 {
                let position = light.position_at(step as f32 * 0.37);
                assert!(position.x.abs() <= 11.0);
                assert!(position.z.abs() <= 11.0);
                assert!(position.y >= -0.1 && position.y <= 5.3);
            }
        }
    }

    #[test]
    fn light_count_display() {
        assert_eq!(LightCount::Known(42).to_string(), "42");
        assert_eq!(LightCount::Unknown.to_string(), "unknown");
    }
}
