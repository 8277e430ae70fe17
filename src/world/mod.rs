//! # World Module
//!
//! Chunk-grid layout for the streamed voxel world. A chunk is a cube of
//! `CHUNK_EDGE`³ voxels addressed by an integer coordinate in chunk-grid
//! units; everything else in the pipeline (generation, meshing, install,
//! culling) is keyed by that coordinate.

use cgmath::Point3;

pub mod noise_field;
pub mod required;
pub mod voxel_field;

/// The edge length of a chunk in voxels.
pub const CHUNK_EDGE: i32 = 16;
/// Voxel-grid edge including the one-cell halo on each side.
pub const CHUNK_EDGE_PADDED: usize = (CHUNK_EDGE + 2) as usize;
/// The number of cells in a single padded 2D plane of a chunk.
pub const CHUNK_PLANE_PADDED: usize = CHUNK_EDGE_PADDED * CHUNK_EDGE_PADDED;
/// The total number of cells in a padded chunk grid.
pub const CHUNK_VOLUME_PADDED: usize = CHUNK_PLANE_PADDED * CHUNK_EDGE_PADDED;

/// How far the streamed neighborhood extends from the observer, in chunks.
pub const RENDER_DISTANCE: i32 = 10;

/// Identifies a chunk in chunk-grid units.
///
/// The chunk's world-space minimum corner is the coordinate scaled by
/// [`CHUNK_EDGE`]. Equality and hashing are componentwise.
pub type ChunkPos = Point3<i32>;

/// World-space minimum corner of a chunk.
pub fn chunk_min_corner(pos: ChunkPos) -> Point3<f32> {
    Point3::new(
        (pos.x * CHUNK_EDGE) as f32,
        (pos.y * CHUNK_EDGE) as f32,
        (pos.z * CHUNK_EDGE) as f32,
    )
}

/// World-space axis-aligned bounding box of a chunk.
pub fn chunk_aabb(pos: ChunkPos) -> (Point3<f32>, Point3<f32>) {
    let min = chunk_min_corner(pos);
    let edge = CHUNK_EDGE as f32;
    (min, Point3::new(min.x + edge, min.y + edge, min.z + edge))
}

/// The chunk containing a world-space position (floor division per axis).
pub fn chunk_containing(position: Point3<f32>) -> ChunkPos {
    let edge = CHUNK_EDGE as f32;
    Point3::new(
        (position.x / edge).floor() as i32,
        (position.y / edge).floor() as i32,
        (position.z / edge).floor() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_containing_floors_negative_coordinates() {
        assert_eq!(
            chunk_containing(Point3::new(0.5, 0.0, 31.9)),
            Point3::new(0, 0, 1)
        );
        assert_eq!(
            chunk_containing(Point3::new(-0.5, -16.0, -16.1)),
            Point3::new(-1, -1, -2)
        );
    }

    #[test]
    fn chunk_aabb_spans_one_edge_length() {
        let (min, max) = chunk_aabb(Point3::new(-1, 2, 0));
        assert_eq!(min, Point3::new(-16.0, 32.0, 0.0));
        assert_eq!(max, Point3::new(0.0, 48.0, 16.0));
    }
}
