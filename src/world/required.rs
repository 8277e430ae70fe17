//! Required-set computation: which chunks must exist for a given observer.
//!
//! Recomputed from scratch every frame; pure and side-effect-free. The
//! neighborhood is a stack of square rings: for each vertical offset the
//! rings expand outward from the observer's column, which biases dispatch
//! toward the chunks closest to the camera.

use std::collections::HashSet;

use cgmath::Point3;

use super::{chunk_containing, ChunkPos, RENDER_DISTANCE};

/// The set of chunk coordinates required around an observer position.
pub fn required_chunks(observer: Point3<f32>) -> HashSet<ChunkPos> {
    required_chunks_within(chunk_containing(observer), RENDER_DISTANCE)
}

/// Required set around an explicit center chunk with an explicit render
/// distance.
///
/// For vertical offset `k` in `[-⌈r/2⌉, ⌈r/2⌉]` and ring radius in
/// `[0, ⌈r/2⌉]`, emits the square ring of that radius around the center
/// column. Rings are emitted edge by edge with corner-exclusive side runs,
/// so every coordinate appears exactly once.
pub fn required_chunks_within(center: ChunkPos, render_distance: i32) -> HashSet<ChunkPos> {
    let half = (render_distance + 1) / 2;
    let mut required = HashSet::new();

    for k in -half..=half {
        let y = center.y + k;
        for radius in 0..=half {
            emit_ring(center, y, radius, &mut required);
        }
    }

    required
}

fn emit_ring(center: ChunkPos, y: i32, radius: i32, out: &mut HashSet<ChunkPos>) {
    if radius == 0 {
        out.insert(Point3::new(center.x, y, center.z));
        return;
    }

    // Two full edges along X, then the two Z sides without their corners.
    for dx in -radius..=radius {
        out.insert(Point3::new(center.x + dx, y, center.z - radius));
        out.insert(Point3::new(center.x + dx, y, center.z + radius));
    }
    for dz in (-radius + 1)..=(radius - 1) {
        out.insert(Point3::new(center.x - radius, y, center.z + dz));
        out.insert(Point3::new(center.x + radius, y, center.z + dz));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighborhood_is_a_full_box() {
        // Rings 0..=half tile the (2·half+1)² square at every layer.
        let required = required_chunks_within(Point3::new(0, 0, 0), 4);
        assert_eq!(required.len(), 5 * 5 * 5);
        assert!(required.contains(&Point3::new(0, 0, 0)));
        assert!(required.contains(&Point3::new(2, -2, -2)));
        assert!(!required.contains(&Point3::new(3, 0, 0)));
        assert!(!required.contains(&Point3::new(0, 3, 0)));
    }

    #[test]
    fn neighborhood_follows_the_observer() {
        let required = required_chunks_within(Point3::new(10, -4, 2), 2);
        assert!(required.contains(&Point3::new(10, -4, 2)));
        assert!(required.contains(&Point3::new(11, -3, 1)));
        assert!(!required.contains(&Point3::new(12, -4, 2)));
    }

    #[test]
    fn odd_render_distance_rounds_up() {
        let half = 2; // ⌈3/2⌉
        let required = required_chunks_within(Point3::new(0, 0, 0), 3);
        assert_eq!(
            required.len(),
            ((2 * half + 1) * (2 * half + 1) * (2 * half + 1)) as usize
        );
    }
}
