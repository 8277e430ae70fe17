//! # Meshing Module
//!
//! Turns a chunk's voxel occupancy into a minimal non-indexed triangle
//! list. The mesher walks the six face directions independently and merges
//! coplanar boundary faces into larger quads, so a flat 16×16 chunk face
//! costs one quad instead of 256.

pub mod direction;
pub mod greedy;
mod mesh_data;

pub use mesh_data::ChunkMesh;

/// Rows of tiles in the texture atlas.
pub const ATLAS_ROWS: u32 = 16;
/// Columns of tiles in the texture atlas.
pub const ATLAS_COLS: u32 = 16;
/// Atlas row assigned to solid terrain voxels.
pub const SOLID_TILE_ROW: u32 = 0;
/// Atlas column assigned to solid terrain voxels.
pub const SOLID_TILE_COL: u32 = 1;
