//! Retained scene with the node → material → primitive iteration contract

use wgpu::util::DeviceExt;

use crate::context::GpuContext;
use crate::stage::material::Material;
use crate::stage::mesh::MeshData;
use crate::stage::transform::Transform;

pub type MaterialId = usize;
pub type MeshId = usize;
pub type NodeId = usize;

/// Mesh buffers uploaded to the GPU
pub struct ScenePrimitive {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Material with its uniform buffer and bind group
pub struct SceneMaterial {
    pub material: Material,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// Primitives drawn with one material under one node
pub struct MaterialBatch {
    pub material: MaterialId,
    pub primitives: Vec<MeshId>,
}

/// Node with its model uniform and bind group
pub struct SceneNode {
    pub transform: Transform,
    pub model_buffer: wgpu::Buffer,
    pub model_bind_group: wgpu::BindGroup,
    pub batches: Vec<MaterialBatch>,
}

/// One step of scene iteration
pub enum SceneItem<'a> {
    Node(&'a SceneNode),
    Material(&'a SceneMaterial),
    Primitive(&'a ScenePrimitive),
}

/// Retained scene. Renderers consume it exclusively through [`Scene::iterate`].
#[derive(Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    materials: Vec<SceneMaterial>,
    primitives: Vec<ScenePrimitive>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload a material's uniform and create its bind group.
    pub fn add_material(&mut self, ctx: &GpuContext, material: Material) -> MaterialId {
        let buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(format!("Material Buffer: {}", material.name).as_str()),
                contents: bytemuck::bytes_of(&material.uniforms()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(format!("Material Bind Group: {}", material.name).as_str()),
            layout: ctx.material_bind_group_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        self.materials.push(SceneMaterial {
            material,
            buffer,
            bind_group,
        });
        self.materials.len() - 1
    }

    /// Upload a mesh's vertex and index buffers.
    pub fn add_mesh(&mut self, ctx: &GpuContext, mesh: &MeshData) -> MeshId {
        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(format!("Vertex Buffer: {}", mesh.name).as_str()),
                contents: mesh.vertex_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(format!("Index Buffer: {}", mesh.name).as_str()),
                contents: mesh.index_bytes(),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.primitives.push(ScenePrimitive {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        });
        self.primitives.len() - 1
    }

    /// Add a node drawing several material batches.
    pub fn add_node(
        &mut self,
        ctx: &GpuContext,
        transform: Transform,
        batches: Vec<MaterialBatch>,
    ) -> NodeId {
        let model_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Model Buffer"),
                contents: bytemuck::bytes_of(&transform.uniforms()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let model_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout: ctx.model_bind_group_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });
        self.nodes.push(SceneNode {
            transform,
            model_buffer,
            model_bind_group,
            batches,
        });
        self.nodes.len() - 1
    }

    /// Add a node drawing one mesh with one material.
    pub fn add_object(
        &mut self,
        ctx: &GpuContext,
        transform: Transform,
        material: MaterialId,
        mesh: MeshId,
    ) -> NodeId {
        self.add_node(
            ctx,
            transform,
            vec![MaterialBatch {
                material,
                primitives: vec![mesh],
            }],
        )
    }

    /// Move a node and rewrite its model uniform.
    pub fn set_transform(&mut self, queue: &wgpu::Queue, node: NodeId, transform: Transform) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.transform = transform;
            queue.write_buffer(&n.model_buffer, 0, bytemuck::bytes_of(&transform.uniforms()));
        }
    }

    /// Visit every visible primitive in strict node → material → primitive
    /// nesting order. Batches referencing unknown ids are skipped.
    pub fn iterate<'s>(&'s self, mut f: impl FnMut(SceneItem<'s>)) {
        for node in &self.nodes {
            f(SceneItem::Node(node));
            for batch in &node.batches {
                let Some(material) = self.materials.get(batch.material) else {
                    continue;
                };
                f(SceneItem::Material(material));
                for &prim in &batch.primitives {
                    let Some(primitive) = self.primitives.get(prim) else {
                        continue;
                    };
                    f(SceneItem::Primitive(primitive));
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }
}
