//! # Greedy Meshing
//!
//! Extracts the visible surface of a voxel field as merged quads. The six
//! face directions are processed independently: each direction slices the
//! chunk along its normal axis, finds boundary cells (solid with an empty
//! neighbor in the face direction), and grows axis-aligned rectangles over
//! them before emitting one quad per rectangle.
//!
//! Rectangle growth is axis-ordered: a seed cell extends along the
//! direction's first in-layer axis while every newly covered cell is an
//! uncovered boundary cell, then along the second axis by whole rows,
//! alternating until a full pass grows nothing. There is no backtracking;
//! cells covered by an emitted quad are never reconsidered within the
//! layer.
//!
//! Boundary decisions at the chunk shell come from the field's halo, so a
//! chunk meshes without any neighbor data. Adjoining chunks each emit
//! their own boundary face; seams are not stitched.

use crate::world::{voxel_field::VoxelField, ChunkPos, CHUNK_EDGE};

use super::direction::FaceDir;
use super::{ChunkMesh, ATLAS_COLS, ATLAS_ROWS, SOLID_TILE_COL, SOLID_TILE_ROW};

/// Meshes a built voxel field into the chunk's triangle list.
pub fn mesh_chunk(coord: ChunkPos, field: &VoxelField) -> ChunkMesh {
    let mut mesh = ChunkMesh::new(coord);
    // One coverage mask, reused for every layer of every direction.
    let mut covered = vec![false; (CHUNK_EDGE * CHUNK_EDGE) as usize];
    for dir in FaceDir::all() {
        mesh_direction(field, dir, &mut covered, &mut mesh);
    }
    mesh
}

fn cell_index(u: i32, v: i32) -> usize {
    (v * CHUNK_EDGE + u) as usize
}

/// A cell whose face in `dir` must be drawn: solid, with an empty neighbor
/// in the face direction. The halo answers for neighbors outside the
/// chunk.
fn is_boundary(field: &VoxelField, dir: FaceDir, layer: i32, u: i32, v: i32) -> bool {
    let (x, y, z) = dir.cell(layer, u, v);
    if !field.is_solid(x, y, z) {
        return false;
    }
    let (dx, dy, dz) = dir.neighbor_offset();
    !field.is_solid(x + dx, y + dy, z + dz)
}

fn can_join(field: &VoxelField, dir: FaceDir, covered: &[bool], layer: i32, u: i32, v: i32) -> bool {
    !covered[cell_index(u, v)] && is_boundary(field, dir, layer, u, v)
}

fn mesh_direction(field: &VoxelField, dir: FaceDir, covered: &mut [bool], mesh: &mut ChunkMesh) {
    for layer in 0..CHUNK_EDGE {
        covered.fill(false);
        for v0 in 0..CHUNK_EDGE {
            for u0 in 0..CHUNK_EDGE {
                if covered[cell_index(u0, v0)] || !is_boundary(field, dir, layer, u0, v0) {
                    continue;
                }

                let (width, height) = grow_rect(field, dir, covered, layer, u0, v0);
                for v in v0..v0 + height {
                    for u in u0..u0 + width {
                        covered[cell_index(u, v)] = true;
                    }
                }
                emit_quad(dir, layer, u0, v0, width, height, mesh);
            }
        }
    }
}

/// Grows the rectangle seeded at `(u0, v0)` as far as the boundary
/// condition allows, u axis first.
fn grow_rect(
    field: &VoxelField,
    dir: FaceDir,
    covered: &[bool],
    layer: i32,
    u0: i32,
    v0: i32,
) -> (i32, i32) {
    let mut width = 1;
    let mut height = 1;
    loop {
        let mut grew = false;
        while u0 + width < CHUNK_EDGE
            && (v0..v0 + height).all(|v| can_join(field, dir, covered, layer, u0 + width, v))
        {
            width += 1;
            grew = true;
        }
        while v0 + height < CHUNK_EDGE
            && (u0..u0 + width).all(|u| can_join(field, dir, covered, layer, u, v0 + height))
        {
            height += 1;
            grew = true;
        }
        if !grew {
            break;
        }
    }
    (width, height)
}

fn emit_quad(dir: FaceDir, layer: i32, u0: i32, v0: i32, width: i32, height: i32, mesh: &mut ChunkMesh) {
    let corners = [
        dir.plane_point(layer, u0 as f32, v0 as f32),
        dir.plane_point(layer, (u0 + width) as f32, v0 as f32),
        dir.plane_point(layer, (u0 + width) as f32, (v0 + height) as f32),
        dir.plane_point(layer, u0 as f32, (v0 + height) as f32),
    ];

    // The atlas cell stretched over the merged extent, so the tile repeats
    // across the quad instead of smearing.
    let cell_w = 1.0 / ATLAS_COLS as f32;
    let cell_h = 1.0 / ATLAS_ROWS as f32;
    let mut u_lo = SOLID_TILE_COL as f32 * cell_w;
    let mut u_hi = (SOLID_TILE_COL as f32 + width as f32) * cell_w;
    let v_lo = SOLID_TILE_ROW as f32 * cell_h;
    let v_hi = (SOLID_TILE_ROW as f32 + height as f32) * cell_h;
    if dir.u_runs_screen_left() {
        std::mem::swap(&mut u_lo, &mut u_hi);
    }

    // Corner order matches `corners`; the v growth axis climbs the tile.
    let corner_uvs = [[u_lo, v_hi], [u_hi, v_hi], [u_hi, v_lo], [u_lo, v_lo]];

    let normal = dir.normal();
    for index in dir.winding() {
        mesh.push_vertex(corners[index], normal, corner_uvs[index]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    fn origin() -> ChunkPos {
        Point3::new(0, 0, 0)
    }

    fn vertices_with_normal(mesh: &ChunkMesh, normal: [f32; 3]) -> Vec<usize> {
        (0..mesh.vertex_count() as usize)
            .filter(|i| mesh.normals[i * 3..i * 3 + 3] == normal)
            .collect()
    }

    #[test]
    fn empty_field_yields_empty_mesh() {
        let mesh = mesh_chunk(origin(), &VoxelField::empty());
        assert!(mesh.is_empty());
    }

    #[test]
    fn single_voxel_yields_six_quads() {
        let mut field = VoxelField::empty();
        field.set_solid(0, 0, 0, true);
        let mesh = mesh_chunk(origin(), &field);

        // 6 quads of 2 triangles, 36 vertices total.
        assert_eq!(mesh.vertex_count(), 36);
        for dir in FaceDir::all() {
            assert_eq!(
                vertices_with_normal(&mesh, dir.normal()).len(),
                6,
                "{dir:?} should contribute one quad"
            );
        }
    }

    #[test]
    fn single_voxel_normals_are_unit_axes() {
        let mut field = VoxelField::empty();
        field.set_solid(4, 5, 6, true);
        let mesh = mesh_chunk(origin(), &field);

        for i in 0..mesh.vertex_count() as usize {
            let n = &mesh.normals[i * 3..i * 3 + 3];
            let length_sq: f32 = n.iter().map(|c| c * c).sum();
            assert_eq!(length_sq, 1.0);
            assert_eq!(n.iter().filter(|c| **c != 0.0).count(), 1);
        }
    }

    #[test]
    fn solid_chunk_meshes_to_outer_shell_only() {
        let mesh = mesh_chunk(origin(), &VoxelField::solid());

        // Every internal solid-solid face pair must vanish; each chunk face
        // merges into a single full-extent quad.
        assert_eq!(mesh.vertex_count(), 36);
        for c in &mesh.positions {
            assert!((0.0..=CHUNK_EDGE as f32).contains(c));
        }
        // The +Y quad spans the whole chunk face.
        let top = vertices_with_normal(&mesh, [0.0, 1.0, 0.0]);
        let xs: Vec<f32> = top.iter().map(|i| mesh.positions[i * 3]).collect();
        let zs: Vec<f32> = top.iter().map(|i| mesh.positions[i * 3 + 2]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 0.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), CHUNK_EDGE as f32);
        assert_eq!(zs.iter().cloned().fold(f32::MAX, f32::min), 0.0);
        assert_eq!(zs.iter().cloned().fold(f32::MIN, f32::max), CHUNK_EDGE as f32);
    }

    #[test]
    fn adjacent_voxels_merge_into_one_quad_per_side() {
        let mut field = VoxelField::empty();
        field.set_solid(0, 0, 0, true);
        field.set_solid(1, 0, 0, true);
        let mesh = mesh_chunk(origin(), &field);

        // The shared face is culled and every outer side merges, leaving
        // the same six quads a single voxel would have.
        assert_eq!(mesh.vertex_count(), 36);
    }

    #[test]
    fn uv_extent_scales_with_merged_size() {
        let mesh = mesh_chunk(origin(), &VoxelField::solid());
        let top = vertices_with_normal(&mesh, [0.0, 1.0, 0.0]);

        let us: Vec<f32> = top.iter().map(|i| mesh.uvs[i * 2]).collect();
        let vs: Vec<f32> = top.iter().map(|i| mesh.uvs[i * 2 + 1]).collect();
        let u_extent = us.iter().cloned().fold(f32::MIN, f32::max)
            - us.iter().cloned().fold(f32::MAX, f32::min);
        let v_extent = vs.iter().cloned().fold(f32::MIN, f32::max)
            - vs.iter().cloned().fold(f32::MAX, f32::min);

        // 16 merged cells at 1/16 of the atlas each.
        assert!((u_extent - CHUNK_EDGE as f32 / ATLAS_COLS as f32).abs() < 1e-6);
        assert!((v_extent - CHUNK_EDGE as f32 / ATLAS_ROWS as f32).abs() < 1e-6);
    }

    #[test]
    fn quads_sit_on_their_face_plane() {
        let mut field = VoxelField::empty();
        field.set_solid(2, 3, 4, true);
        let mesh = mesh_chunk(origin(), &field);

        // Each +X vertex lies on x = 3, each -X vertex on x = 2.
        for i in vertices_with_normal(&mesh, [1.0, 0.0, 0.0]) {
            assert_eq!(mesh.positions[i * 3], 3.0);
        }
        for i in vertices_with_normal(&mesh, [-1.0, 0.0, 0.0]) {
            assert_eq!(mesh.positions[i * 3], 2.0);
        }
    }

    #[test]
    fn l_shape_covers_without_overlap() {
        // Three voxels in an L on the floor layer: the top faces must be
        // covered by rectangles that neither overlap nor miss a cell.
        let mut field = VoxelField::empty();
        field.set_solid(0, 0, 0, true);
        field.set_solid(1, 0, 0, true);
        field.set_solid(0, 0, 1, true);
        let mesh = mesh_chunk(origin(), &field);

        let top = vertices_with_normal(&mesh, [0.0, 1.0, 0.0]);
        // Two rectangles (2x1 and 1x1) rather than three singles: u grows
        // before v, so the seed at (0,0) takes its row first.
        assert_eq!(top.len(), 12);
    }
}
