//! Material description and its uniform block

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Per-material uniform block
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub base_color: Vec4,
}

/// CPU-side material description
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub base_color: Vec4,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: Vec4::ONE,
        }
    }

    pub fn with_base_color(mut self, color: Vec3) -> Self {
        self.base_color = color.extend(1.0);
        self
    }

    pub fn uniforms(&self) -> MaterialUniforms {
        MaterialUniforms {
            base_color: self.base_color,
        }
    }

    pub fn matte_white() -> Self {
        Self::new("matte white").with_base_color(Vec3::splat(0.9))
    }

    pub fn slate() -> Self {
        Self::new("slate").with_base_color(Vec3::new(0.35, 0.38, 0.42))
    }

    pub fn brick() -> Self {
        Self::new("brick").with_base_color(Vec3::new(0.65, 0.25, 0.20))
    }

    pub fn moss() -> Self {
        Self::new("moss").with_base_color(Vec3::new(0.30, 0.55, 0.25))
    }

    pub fn sand() -> Self {
        Self::new("sand").with_base_color(Vec3::new(0.80, 0.70, 0.50))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_size() {
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 16);
    }

    #[test]
    fn base_color_keeps_full_alpha() {
        let m = Material::new("test").with_base_color(Vec3::new(0.2, 0.4, 0.6));
        assert_eq!(m.uniforms().base_color, Vec4::new(0.2, 0.4, 0.6, 1.0));
    }
}
