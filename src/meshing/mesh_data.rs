//! The mesh produced for one chunk: three parallel flat attribute streams.

use crate::world::ChunkPos;

/// Triangle mesh for a single chunk, in chunk-local coordinates.
///
/// The three sequences are parallel: 3 floats per vertex position, 3 per
/// normal, 2 per texture coordinate. Triangles are non-indexed — every 3
/// consecutive vertices form one triangle, every 6 one quad. The mesh is
/// plain data and freely crosses threads; GPU buffers for it are created
/// separately, on the thread that owns the graphics device.
///
/// A mesh is immutable once the mesher returns it.
pub struct ChunkMesh {
    /// The chunk this mesh belongs to.
    pub coord: ChunkPos,
    /// Vertex positions, chunk-local.
    pub positions: Vec<f32>,
    /// Axis-aligned unit normals, one per vertex.
    pub normals: Vec<f32>,
    /// Atlas texture coordinates, one pair per vertex.
    pub uvs: Vec<f32>,
}

impl ChunkMesh {
    /// Creates an empty mesh owned by `coord`.
    pub fn new(coord: ChunkPos) -> Self {
        ChunkMesh {
            coord,
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
        }
    }

    /// Number of vertices in the mesh.
    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }

    /// Whether the mesh has no geometry at all.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub(crate) fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) {
        self.positions.extend_from_slice(&position);
        self.normals.extend_from_slice(&normal);
        self.uvs.extend_from_slice(&uv);
    }
}
