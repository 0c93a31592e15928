//! Camera state and its GPU uniform block

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::context::GpuContext;

/// Projection type
#[derive(Debug, Clone, Copy)]
pub enum Projection {
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        height: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::Perspective {
            fov_y,
            aspect,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Projection::Orthographic {
                height,
                aspect,
                near,
                far,
            } => {
                let half_h = height * 0.5;
                let half_w = half_h * aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, near, far)
            }
        }
    }

    pub fn near(&self) -> f32 {
        match *self {
            Projection::Perspective { near, .. } | Projection::Orthographic { near, .. } => near,
        }
    }

    pub fn far(&self) -> f32 {
        match *self {
            Projection::Perspective { far, .. } | Projection::Orthographic { far, .. } => far,
        }
    }

    pub fn set_aspect(&mut self, new_aspect: f32) {
        match self {
            Projection::Perspective { aspect, .. } | Projection::Orthographic { aspect, .. } => {
                *aspect = new_aspect
            }
        }
    }
}

/// Camera uniform block, bound by every pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view: Mat4,
    pub proj: Mat4,
    pub view_proj: Mat4,
    pub inv_view: Mat4,
    pub inv_proj: Mat4,
    /// xyz = eye position, w unused
    pub position: Vec4,
    /// x = near, y = far, zw unused
    pub near_far: Vec4,
}

/// Look-at camera owning its uniform buffer. Renderers and the clustering
/// subsystem see the buffer as an opaque handle; the stage rewrites it once
/// per frame.
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
    uniforms_buffer: wgpu::Buffer,
}

impl Camera {
    pub fn new(ctx: &GpuContext) -> Self {
        let uniforms_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            position: Vec3::new(0.0, 4.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            projection: Projection::perspective(
                std::f32::consts::FRAC_PI_4,
                ctx.aspect_ratio(),
                0.1,
                100.0,
            ),
            uniforms_buffer,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn uniforms(&self) -> CameraUniforms {
        let view = self.view_matrix();
        let proj = self.projection.matrix();
        CameraUniforms {
            view,
            proj,
            view_proj: proj * view,
            inv_view: view.inverse(),
            inv_proj: proj.inverse(),
            position: self.position.extend(1.0),
            near_far: Vec4::new(self.projection.near(), self.projection.far(), 0.0, 0.0),
        }
    }

    /// Upload the current camera state. Called once per frame by the stage.
    pub fn write_uniforms(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.uniforms_buffer, 0, bytemuck::bytes_of(&self.uniforms()));
    }

    pub fn uniforms_buffer(&self) -> &wgpu::Buffer {
        &self.uniforms_buffer
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.projection.set_aspect(width as f32 / height as f32);
        }
    }

    /// Rotate the eye around the target by yaw/pitch deltas in radians.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        self.position = self.target + orbit_offset(self.position - self.target, yaw, pitch);
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    /// Move the eye toward or away from the target along the current axis.
    pub fn set_distance(&mut self, distance: f32) {
        let offset = self.position - self.target;
        let dir = if offset.length_squared() > 1e-6 {
            offset.normalize()
        } else {
            Vec3::Z
        };
        self.position = self.target + dir * distance.max(0.5);
    }
}

fn orbit_offset(offset: Vec3, yaw: f32, pitch: f32) -> Vec3 {
    let radius = offset.length();
    if radius < 1e-6 {
        return offset;
    }
    let cur_yaw = offset.z.atan2(offset.x) + yaw;
    let cur_pitch = ((offset.y / radius).clamp(-1.0, 1.0).asin() + pitch).clamp(-1.5, 1.5);
    let (sp, cp) = cur_pitch.sin_cos();
    let (sy, cy) = cur_yaw.sin_cos();
    Vec3::new(cp * cy, sp, cp * sy) * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_size() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 352);
    }

    #[test]
    fn inverse_matrices_invert() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 4.0, 10.0), Vec3::ZERO, Vec3::Y);
        let proj = Projection::perspective(1.0, 16.0 / 9.0, 0.1, 100.0).matrix();
        assert!((view.inverse() * view).abs_diff_eq(Mat4::IDENTITY, 1e-5));
        assert!((proj.inverse() * proj).abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn orbit_preserves_distance() {
        let offset = Vec3::new(3.0, 4.0, 5.0);
        let rotated = orbit_offset(offset, 0.4, 0.2);
        assert!((rotated.length() - offset.length()).abs() < 1e-4);
    }

    #[test]
    fn orbit_half_turn_flips_horizontal_offset() {
        let rotated = orbit_offset(Vec3::new(5.0, 0.0, 0.0), std::f32::consts::PI, 0.0);
        assert!((rotated.x + 5.0).abs() < 1e-4);
        assert!(rotated.z.abs() < 1e-3);
    }

    #[test]
    fn set_aspect_updates_projection() {
        let mut proj = Projection::perspective(1.0, 1.0, 0.1, 100.0);
        proj.set_aspect(2.0);
        match proj {
            Projection::Perspective { aspect, .. } => assert_eq!(aspect, 2.0),
            _ => unreachable!(),
        }
    }
}
