//! # Voxel Field Module
//!
//! The padded occupancy grid a generation task builds for one chunk before
//! meshing. The grid covers `(CHUNK_EDGE + 2)³` cells: the chunk's own
//! voxels plus a one-cell halo on every side, sampled from the same noise
//! field the neighboring chunks would use. The halo lets the mesher decide
//! boundary faces without ever touching another chunk's data, which is what
//! keeps generation tasks fully independent.
//!
//! A field exists only for the duration of one generation task; it is
//! dropped as soon as the mesh has been extracted.
//!
//! ## Storage
//!
//! Occupancy is a bit vector, one bit per cell, in row-major x → y → z
//! order over the padded dimensions. A 16³ chunk costs 18³ bits ≈ 730
//! bytes per in-flight task.

use bitvec::prelude::BitVec;

use super::noise_field::{NoiseField, NOISE_LANES, SOLID_THRESHOLD, WORLD_SAMPLE_BIAS};
use super::{ChunkPos, CHUNK_EDGE, CHUNK_EDGE_PADDED, CHUNK_PLANE_PADDED, CHUNK_VOLUME_PADDED};

/// Padded solid/empty grid for a single chunk.
pub struct VoxelField {
    cells: BitVec,
}

impl VoxelField {
    /// Creates a field with every cell empty.
    pub fn empty() -> Self {
        VoxelField {
            cells: BitVec::repeat(false, CHUNK_VOLUME_PADDED),
        }
    }

    /// Creates a field whose interior is entirely solid and whose halo is
    /// empty, i.e. an isolated fully solid chunk.
    pub fn solid() -> Self {
        let mut field = Self::empty();
        for y in 0..CHUNK_EDGE {
            for z in 0..CHUNK_EDGE {
                for x in 0..CHUNK_EDGE {
                    field.set_solid(x, y, z, true);
                }
            }
        }
        field
    }

    /// Builds the field for `pos` by thresholding the noise field at every
    /// padded cell, halo included.
    ///
    /// Each cell is sampled at its world coordinate: the padded index
    /// shifted by -1 (so the halo reaches one voxel into the neighbors),
    /// offset by the chunk's world origin, plus the fixed sampling bias.
    /// Sampling runs in rows of [`NOISE_LANES`] into a stack buffer reused
    /// for the whole build.
    pub fn from_noise(pos: ChunkPos, noise: &NoiseField) -> Self {
        let mut cells = BitVec::repeat(false, CHUNK_VOLUME_PADDED);

        let origin_x = (pos.x * CHUNK_EDGE - 1) as f64 + WORLD_SAMPLE_BIAS;
        let origin_y = (pos.y * CHUNK_EDGE - 1) as f64 + WORLD_SAMPLE_BIAS;
        let origin_z = (pos.z * CHUNK_EDGE - 1) as f64 + WORLD_SAMPLE_BIAS;

        let mut row = [0.0_f64; NOISE_LANES];
        for z in 0..CHUNK_EDGE_PADDED {
            for y in 0..CHUNK_EDGE_PADDED {
                let mut x = 0;
                while x < CHUNK_EDGE_PADDED {
                    noise.sample_row(
                        origin_x + x as f64,
                        origin_y + y as f64,
                        origin_z + z as f64,
                        &mut row,
                    );
                    let lanes = NOISE_LANES.min(CHUNK_EDGE_PADDED - x);
                    for (lane, sample) in row.iter().take(lanes).enumerate() {
                        if *sample >= SOLID_THRESHOLD {
                            cells.set(Self::index(x + lane, y, z), true);
                        }
                    }
                    x += lanes;
                }
            }
        }

        VoxelField { cells }
    }

    /// Solidity of a cell in chunk-local coordinates.
    ///
    /// Accepts `-1..=CHUNK_EDGE` on each axis; the out-of-chunk values read
    /// the halo.
    pub fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        debug_assert!((-1..=CHUNK_EDGE).contains(&x));
        debug_assert!((-1..=CHUNK_EDGE).contains(&y));
        debug_assert!((-1..=CHUNK_EDGE).contains(&z));
        self.cells[Self::index((x + 1) as usize, (y + 1) as usize, (z + 1) as usize)]
    }

    /// Sets the solidity of an interior cell (`0..CHUNK_EDGE` on each axis).
    pub fn set_solid(&mut self, x: i32, y: i32, z: i32, solid: bool) {
        self.cells.set(
            Self::index((x + 1) as usize, (y + 1) as usize, (z + 1) as usize),
            solid,
        );
    }

    fn index(x: usize, y: usize, z: usize) -> usize {
        x + CHUNK_EDGE_PADDED * y + CHUNK_PLANE_PADDED * z
    }
}
