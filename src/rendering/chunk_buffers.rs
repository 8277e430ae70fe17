//! GPU-side payload for an installed chunk.
//!
//! Mesh data and GPU handles are deliberately separate types: a
//! [`ChunkMesh`](crate::meshing::ChunkMesh) moves freely between threads,
//! while `ChunkBuffers` is created here, on the device-owning thread, and
//! dropped there when the chunk is pruned. A live buffer handle never
//! crosses the worker/owner boundary.

use cgmath::{EuclideanSpace, Matrix4};
use wgpu::util::DeviceExt;

use crate::meshing::ChunkMesh;
use crate::world::chunk_min_corner;

/// Uniform carrying a chunk's model translation.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ChunkUniform {
    model: [[f32; 4]; 4],
}

/// Vertex buffers and model binding for one installed chunk.
///
/// The three vertex buffers mirror the mesh's parallel attribute streams:
/// positions, normals, texture coordinates.
pub struct ChunkBuffers {
    /// Vertex positions, 3 floats per vertex.
    pub positions: wgpu::Buffer,
    /// Vertex normals, 3 floats per vertex.
    pub normals: wgpu::Buffer,
    /// Texture coordinates, 2 floats per vertex.
    pub uvs: wgpu::Buffer,
    /// Bind group carrying the chunk's model matrix.
    pub model_bind_group: wgpu::BindGroup,
    _model_uniform: wgpu::Buffer,
}

impl ChunkBuffers {
    /// Uploads a finished mesh. Must run on the thread owning the device.
    pub fn upload(
        device: &wgpu::Device,
        chunk_layout: &wgpu::BindGroupLayout,
        mesh: &ChunkMesh,
    ) -> Self {
        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("chunk positions"),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let normals = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("chunk normals"),
            contents: bytemuck::cast_slice(&mesh.normals),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uvs = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("chunk uvs"),
            contents: bytemuck::cast_slice(&mesh.uvs),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Vertices are chunk-local; the model matrix moves the chunk to its
        // world-space minimum corner.
        let translation = chunk_min_corner(mesh.coord);
        let uniform = ChunkUniform {
            model: Matrix4::from_translation(translation.to_vec()).into(),
        };
        let model_uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("chunk model uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("chunk model bind group"),
            layout: chunk_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_uniform.as_entire_binding(),
            }],
        });

        ChunkBuffers {
            positions,
            normals,
            uvs,
            model_bind_group,
            _model_uniform: model_uniform,
        }
    }
}
