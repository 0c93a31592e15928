//! GPU context: device, queue, presentation surface, and the bind group
//! layouts shared by every pipeline.

use std::sync::Arc;

use crate::error::{RenderError, RenderResult};

/// Owns the wgpu device/queue pair, the optional presentation surface, and
/// the layouts all renderers agree on. Constructed once at startup and passed
/// by reference into every renderer.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    surface: Option<wgpu::Surface<'static>>,
    surface_config: wgpu::SurfaceConfiguration,
    model_bind_group_layout: wgpu::BindGroupLayout,
    material_bind_group_layout: wgpu::BindGroupLayout,
}

impl GpuContext {
    /// Create a context presenting to the given window.
    pub fn new(window: Arc<winit::window::Window>, vsync: bool) -> RenderResult<Self> {
        pollster::block_on(Self::new_async(window, vsync))
    }

    /// Create a context without a presentation surface, for offscreen
    /// rendering and tests. The surface configuration is synthesized so that
    /// surface-sized resources and pipelines still work.
    pub fn headless(width: u32, height: u32) -> RenderResult<Self> {
        pollster::block_on(Self::headless_async(width, height))
    }

    async fn new_async(window: Arc<winit::window::Window>, vsync: bool) -> RenderResult<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| RenderError::SurfaceCreationFailed(e.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await;

        let (surface, adapter) = match adapter {
            Some(adapter) => (surface, adapter),
            None => {
                log::warn!("No adapter on primary backends, retrying with all backends");
                let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
                    backends: wgpu::Backends::all(),
                    ..Default::default()
                });
                let surface = instance
                    .create_surface(window)
                    .map_err(|e| RenderError::SurfaceCreationFailed(e.to_string()))?;
                let adapter = instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await
                    .ok_or(RenderError::AdapterNotFound)?;
                (surface, adapter)
            }
        };

        let info = adapter.get_info();
        log::info!("Selected GPU: {} ({:?} backend)", info.name, info.backend);

        let (device, queue) = request_device(&adapter).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);
        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let max_dim = device.limits().max_texture_dimension_2d;
        let (width, height) = clamp_surface_size(size.width.max(1), size.height.max(1), max_dim);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let (model_bind_group_layout, material_bind_group_layout) = shared_layouts(&device);

        Ok(Self {
            device,
            queue,
            surface: Some(surface),
            surface_config,
            model_bind_group_layout,
            material_bind_group_layout,
        })
    }

    async fn headless_async(width: u32, height: u32) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterNotFound)?;

        let info = adapter.get_info();
        log::info!("Selected GPU: {} ({:?} backend)", info.name, info.backend);

        let (device, queue) = request_device(&adapter).await?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu::TextureFormat::Rgba8Unorm,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let (model_bind_group_layout, material_bind_group_layout) = shared_layouts(&device);

        Ok(Self {
            device,
            queue,
            surface: None,
            surface_config,
            model_bind_group_layout,
            material_bind_group_layout,
        })
    }

    /// Reconfigure for a new surface size. Zero dimensions are ignored;
    /// oversized dimensions are clamped to the device limit preserving
    /// aspect ratio.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let max_dim = self.device.limits().max_texture_dimension_2d;
        let (width, height) = clamp_surface_size(width, height, max_dim);
        self.surface_config.width = width;
        self.surface_config.height = height;
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.surface_config);
        }
    }

    /// Acquire the next frame from the presentation surface.
    pub fn acquire_frame(&self) -> RenderResult<wgpu::SurfaceTexture> {
        let surface = self.surface.as_ref().ok_or(RenderError::NoSurface)?;
        surface.get_current_texture().map_err(|e| match e {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => RenderError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            other => RenderError::AcquireFrameFailed(other.to_string()),
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.surface_config.width as f32 / self.surface_config.height.max(1) as f32
    }

    /// Layout of the per-node model bind group (binding 0: vertex uniform).
    pub fn model_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.model_bind_group_layout
    }

    /// Layout of the per-material bind group (binding 0: fragment uniform).
    pub fn material_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_bind_group_layout
    }
}

async fn request_device(adapter: &wgpu::Adapter) -> RenderResult<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Primary Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .map_err(|e| RenderError::DeviceCreationFailed(e.to_string()))
}

fn shared_layouts(device: &wgpu::Device) -> (wgpu::BindGroupLayout, wgpu::BindGroupLayout) {
    let model = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Model Bind Group Layout"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
    });
    let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Material Bind Group Layout"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
    });
    (model, material)
}

pub(crate) fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn storage_entry(binding: u32, visibility: wgpu::ShaderStages, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn clamp_surface_size(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    if width <= max_dim && height <= max_dim {
        return (width, height);
    }
    let scale = max_dim as f32 / width.max(height) as f32;
    let w = ((width as f32 * scale) as u32).clamp(1, max_dim);
    let h = ((height as f32 * scale) as u32).clamp(1, max_dim);
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_small_sizes() {
        assert_eq!(clamp_surface_size(1280, 720, 8192), (1280, 720));
    }

    #[test]
    fn clamp_preserves_aspect() {
        let (w, h) = clamp_surface_size(16384, 8192, 8192);
        assert_eq!(w, 8192);
        assert_eq!(h, 4096);
    }

    #[test]
    fn clamp_never_returns_zero() {
        let (w, h) = clamp_surface_size(100_000, 1, 8192);
        assert_eq!(w, 8192);
        assert!(h >= 1);
    }
}
