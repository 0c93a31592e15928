//! Vertex definition and procedural mesh generation

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};

/// Standard vertex with position, normal, UV, and tangent
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub tangent: Vec4,
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// CPU-side mesh, uploaded to the GPU by the scene.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub name: String,
}

impl MeshData {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Unit cube centered at the origin, 4 vertices per face.
    pub fn cube() -> Self {
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        let normals = [
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ];
        for normal in normals {
            let tangent = if normal.y.abs() > 0.9 {
                Vec3::X
            } else {
                Vec3::Y.cross(normal).normalize()
            };
            let bitangent = normal.cross(tangent);
            let base = vertices.len() as u32;
            let corners = [
                (-0.5, -0.5, [0.0, 1.0]),
                (0.5, -0.5, [1.0, 1.0]),
                (0.5, 0.5, [1.0, 0.0]),
                (-0.5, 0.5, [0.0, 0.0]),
            ];
            for (tc, bc, uv) in corners {
                vertices.push(Vertex {
                    position: normal * 0.5 + tangent * tc + bitangent * bc,
                    normal,
                    uv: Vec2::from_array(uv),
                    tangent: tangent.extend(1.0),
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self {
            vertices,
            indices,
            name: "cube".to_string(),
        }
    }

    /// UV sphere of radius 0.5 centered at the origin.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);

        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * std::f32::consts::PI;
            let (st, ct) = theta.sin_cos();
            for seg in 0..=segments {
                let u = seg as f32 / segments as f32;
                let phi = u * std::f32::consts::TAU;
                let (sp, cp) = phi.sin_cos();
                let normal = Vec3::new(st * cp, ct, st * sp);
                let tangent = Vec3::new(-sp, 0.0, cp);
                vertices.push(Vertex {
                    position: normal * 0.5,
                    normal,
                    uv: Vec2::new(u, v),
                    tangent: tangent.extend(1.0),
                });
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for seg in 0..segments {
                let a = ring * stride + seg;
                let b = a + stride;
                indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }

        Self {
            vertices,
            indices,
            name: "sphere".to_string(),
        }
    }

    /// Flat grid in the xz plane at y = 0, facing +y.
    pub fn plane(width: f32, depth: f32, subdivisions: u32) -> Self {
        let n = subdivisions.max(1);
        let stride = n + 1;
        let mut vertices = Vec::with_capacity((stride * stride) as usize);
        let mut indices = Vec::with_capacity((n * n * 6) as usize);

        for z in 0..=n {
            for x in 0..=n {
                let u = x as f32 / n as f32;
                let v = z as f32 / n as f32;
                vertices.push(Vertex {
                    position: Vec3::new((u - 0.5) * width, 0.0, (v - 0.5) * depth),
                    normal: Vec3::Y,
                    uv: Vec2::new(u, v),
                    tangent: Vec4::new(1.0, 0.0, 0.0, 1.0),
                });
            }
        }

        for z in 0..n {
            for x in 0..n {
                let a = z * stride + x;
                let b = a + 1;
                let c = a + stride;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        Self {
            vertices,
            indices,
            name: "plane".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_in_bounds(mesh: &MeshData) {
        let len = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < len), "{}", mesh.name);
    }

    fn assert_unit_normals(mesh: &MeshData) {
        for v in &mesh.vertices {
            assert!((v.normal.length() - 1.0).abs() < 1e-4, "{}", mesh.name);
        }
    }

    #[test]
    fn vertex_stride() {
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
    }

    #[test]
    fn cube_counts() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_indices_in_bounds(&cube);
        assert_unit_normals(&cube);
    }

    #[test]
    fn sphere_counts() {
        let sphere = MeshData::sphere(32, 16);
        assert_eq!(sphere.vertices.len(), 33 * 17);
        assert_eq!(sphere.index_count(), 32 * 16 * 6);
        assert_indices_in_bounds(&sphere);
        assert_unit_normals(&sphere);
        for v in &sphere.vertices {
            assert!((v.position.length() - 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_clamps_degenerate_resolution() {
        let sphere = MeshData::sphere(1, 1);
        assert_eq!(sphere.vertices.len(), 4 * 3);
        assert_indices_in_bounds(&sphere);
    }

    #[test]
    fn plane_counts() {
        let plane = MeshData::plane(20.0, 20.0, 10);
        assert_eq!(plane.vertices.len(), 11 * 11);
        assert_eq!(plane.index_count(), 10 * 10 * 6);
        assert_indices_in_bounds(&plane);
        for v in &plane.vertices {
            assert_eq!(v.position.y, 0.0);
            assert!(v.position.x.abs() <= 10.0 && v.position.z.abs() <= 10.0);
        }
    }
}
