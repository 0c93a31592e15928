//! Object placement in the scene

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// Per-node uniform block: model matrix plus its inverse-transpose for
/// normal transformation.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelUniforms {
    pub model: Mat4,
    pub normal_matrix: Mat4,
}

/// Position, rotation, and scale of a scene node
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn normal_matrix(&self) -> Mat4 {
        self.matrix().inverse().transpose()
    }

    pub fn uniforms(&self) -> ModelUniforms {
        ModelUniforms {
            model: self.matrix(),
            normal_matrix: self.normal_matrix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_size() {
        assert_eq!(std::mem::size_of::<ModelUniforms>(), 128);
    }

    #[test]
    fn normal_matrix_matches_rotation_for_rigid_transforms() {
        let t = Transform::from_position(Vec3::new(3.0, -1.0, 2.0))
            .with_rotation(Quat::from_rotation_y(0.7));
        let n = glam::Mat3::from_mat4(t.normal_matrix());
        let r = glam::Mat3::from_quat(t.rotation);
        assert!(n.abs_diff_eq(r, 1e-5));
    }

    #[test]
    fn normal_matrix_corrects_nonuniform_scale() {
        let t = Transform::default().with_scale(Vec3::new(1.0, 4.0, 1.0));
        let n = t.normal_matrix();
        let normal = n.transform_vector3(Vec3::Y).normalize();
        assert!((normal - Vec3::Y).length() < 1e-5);
        let slanted = n.transform_vector3(Vec3::new(1.0, 1.0, 0.0).normalize());
        // Squashing in y tilts a 45-degree normal toward the x axis.
        assert!(slanted.x > slanted.y * 2.0);
    }
}
