//! # Chunk Store
//!
//! The authoritative "what exists and is drawable" state: a map from chunk
//! coordinate to installed mesh. The store lives on the thread that owns
//! the graphics device — installing builds GPU buffers, pruning drops them
//! — so it needs no locking.
//!
//! The store is generic over the installed GPU payload; lifecycle logic is
//! exercised in tests with a unit payload, the renderer installs real
//! vertex buffers.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::mpsc::Receiver;

use web_time::{Duration, Instant};

use crate::meshing::ChunkMesh;
use crate::rendering::frustum::Frustum;
use crate::world::{chunk_aabb, ChunkPos};

use super::pending::PendingSet;

/// Wall-clock budget for installing finished meshes each frame, in
/// milliseconds. Overflow work carries over to later frames.
pub const INSTALL_BUDGET_MS: u64 = 20;

/// A mesh that has been uploaded and is drawable.
pub struct InstalledChunk<G> {
    /// Number of vertices in the chunk's mesh.
    pub vertex_count: u32,
    /// The GPU-side payload (buffers and bindings).
    pub gpu: G,
}

/// Owns the active map of installed chunks.
pub struct ChunkStore<G> {
    active: HashMap<ChunkPos, InstalledChunk<G>>,
}

impl<G> ChunkStore<G> {
    /// Creates an empty store.
    pub fn new() -> Self {
        ChunkStore {
            active: HashMap::new(),
        }
    }

    /// Whether a chunk is installed.
    pub fn contains(&self, pos: &ChunkPos) -> bool {
        self.active.contains_key(pos)
    }

    /// Number of installed chunks.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no chunk is installed.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// The installed entry for a chunk, if present.
    pub fn get(&self, pos: &ChunkPos) -> Option<&InstalledChunk<G>> {
        self.active.get(pos)
    }

    /// Drains finished meshes until the channel is empty or `budget`
    /// elapses, installing each mesh that is still required.
    ///
    /// `upload` runs here, on the calling thread, which must be the one
    /// that owns the graphics device. Meshes whose coordinate has left the
    /// required set are discarded without upload. Either way the
    /// coordinate's pending claim is released, so an abandoned chunk can be
    /// regenerated once it is required again.
    ///
    /// Returns the number of meshes installed.
    pub fn install_ready<F>(
        &mut self,
        required: &HashSet<ChunkPos>,
        budget: Duration,
        finished: &Receiver<ChunkMesh>,
        pending: &PendingSet,
        mut upload: F,
    ) -> usize
    where
        F: FnMut(&ChunkMesh) -> G,
    {
        let start = Instant::now();
        let mut installed = 0;

        while start.elapsed() < budget {
            let Ok(mesh) = finished.try_recv() else {
                break;
            };
            let coord = mesh.coord;

            if required.contains(&coord) {
                let gpu = upload(&mesh);
                self.active.insert(
                    coord,
                    InstalledChunk {
                        vertex_count: mesh.vertex_count(),
                        gpu,
                    },
                );
                installed += 1;
            } else {
                log::debug!("discarding stale mesh for chunk {coord:?}");
            }
            pending.release(coord);
        }

        installed
    }

    /// Removes every installed chunk that is no longer required, dropping
    /// its GPU resources with it.
    pub fn prune(&mut self, required: &HashSet<ChunkPos>) {
        self.active.retain(|pos, _| required.contains(pos));
    }

    /// Installed chunks with geometry whose world-space bounding box passes
    /// the frustum test, ready to be drawn.
    pub fn visible<'a>(
        &'a self,
        frustum: &'a Frustum,
    ) -> impl Iterator<Item = (&'a ChunkPos, &'a InstalledChunk<G>)> {
        self.active.iter().filter(|(pos, chunk)| {
            if chunk.vertex_count == 0 {
                return false;
            }
            let (min, max) = chunk_aabb(**pos);
            frustum.is_box_visible(min, max)
        })
    }
}

impl<G> Default for ChunkStore<G> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::{ChunkGenerator, ChunkScheduler};
    use cgmath::Point3;
    use std::sync::mpsc::channel;

    fn mesh_for(coord: ChunkPos) -> ChunkMesh {
        let mut mesh = ChunkMesh::new(coord);
        mesh.push_vertex([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]);
        mesh
    }

    fn set(coords: &[ChunkPos]) -> HashSet<ChunkPos> {
        coords.iter().copied().collect()
    }

    #[test]
    fn zero_budget_installs_nothing() {
        let mut store = ChunkStore::<()>::new();
        let pending = PendingSet::new();
        let (tx, rx) = channel();
        let p = Point3::new(0, 0, 0);
        pending.try_claim(p);
        tx.send(mesh_for(p)).unwrap();

        let installed = store.install_ready(&set(&[p]), Duration::ZERO, &rx, &pending, |_| ());

        assert_eq!(installed, 0);
        assert!(store.is_empty());
        // The mesh is still queued and the claim still held for later frames.
        assert!(pending.contains(&p));
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn install_is_fifo_and_releases_claims() {
        let mut store = ChunkStore::<()>::new();
        let pending = PendingSet::new();
        let (tx, rx) = channel();
        let coords: Vec<ChunkPos> = (0..3).map(|i| Point3::new(i, 0, 0)).collect();
        for c in &coords {
            pending.try_claim(*c);
            tx.send(mesh_for(*c)).unwrap();
        }

        let mut order = Vec::new();
        let installed = store.install_ready(
            &coords.iter().copied().collect(),
            Duration::from_secs(1),
            &rx,
            &pending,
            |mesh| order.push(mesh.coord),
        );

        assert_eq!(installed, 3);
        assert_eq!(order, coords);
        assert!(pending.is_empty());
        for c in &coords {
            assert!(store.contains(c));
        }
    }

    #[test]
    fn backlog_installs_across_frames_without_drops() {
        let mut store = ChunkStore::<()>::new();
        let pending = PendingSet::new();
        let (tx, rx) = channel();
        let coords: Vec<ChunkPos> = (0..32).map(|i| Point3::new(i, 0, 0)).collect();
        let required: HashSet<ChunkPos> = coords.iter().copied().collect();
        for c in &coords {
            pending.try_claim(*c);
            tx.send(mesh_for(*c)).unwrap();
        }

        // Tiny per-frame budgets: each frame installs a prefix of what is
        // left, and enough frames drain everything.
        let mut frames = 0;
        while store.len() < coords.len() {
            store.install_ready(&required, Duration::from_micros(50), &rx, &pending, |_| ());
            frames += 1;
            assert!(frames < 10_000, "backlog never drained");
        }

        assert_eq!(store.len(), coords.len());
        assert!(pending.is_empty());
    }

    #[test]
    fn stale_mesh_is_discarded_but_claim_released() {
        let mut store = ChunkStore::<()>::new();
        let pending = PendingSet::new();
        let (tx, rx) = channel();
        let stale = Point3::new(9, 9, 9);
        let wanted = Point3::new(1, 0, 0);
        pending.try_claim(stale);
        pending.try_claim(wanted);
        tx.send(mesh_for(stale)).unwrap();
        tx.send(mesh_for(wanted)).unwrap();

        let installed =
            store.install_ready(&set(&[wanted]), Duration::from_secs(1), &rx, &pending, |_| ());

        assert_eq!(installed, 1);
        assert!(!store.contains(&stale));
        assert!(store.contains(&wanted));
        assert!(pending.is_empty());
    }

    #[test]
    fn prune_removes_exactly_the_unrequired() {
        let mut store = ChunkStore::<u32>::new();
        let pending = PendingSet::new();
        let (tx, rx) = channel();
        let a = Point3::new(0, 0, 0);
        let b = Point3::new(1, 0, 0);
        let c = Point3::new(2, 0, 0);
        for p in [a, b, c] {
            pending.try_claim(p);
            tx.send(mesh_for(p)).unwrap();
        }
        let mut tag = 0;
        store.install_ready(&set(&[a, b, c]), Duration::from_secs(1), &rx, &pending, |_| {
            tag += 1;
            tag
        });

        let payload_a = store.get(&a).unwrap().gpu;
        store.prune(&set(&[a, c]));

        assert_eq!(store.len(), 2);
        assert!(store.contains(&a));
        assert!(!store.contains(&b));
        assert!(store.contains(&c));
        // Survivors are untouched.
        assert_eq!(store.get(&a).unwrap().gpu, payload_a);
    }

    #[test]
    fn end_to_end_single_chunk_generation_and_install() {
        // required = {(0,0,0)}, empty maps, fully solid generator: one task,
        // one outer-shell mesh, installed under its coordinate.
        let mut scheduler = ChunkScheduler::with_workers(1, ChunkGenerator::Solid);
        let mut store = ChunkStore::<()>::new();
        let p = Point3::new(0, 0, 0);
        let required = set(&[p]);

        scheduler.dispatch(&required, |pos| store.contains(pos));

        let mut frames = 0;
        while store.is_empty() {
            store.install_ready(
                &required,
                Duration::from_millis(INSTALL_BUDGET_MS),
                scheduler.finished(),
                scheduler.pending(),
                |_| (),
            );
            frames += 1;
            assert!(frames < 10_000, "mesh never arrived");
            std::thread::yield_now();
        }

        assert_eq!(store.len(), 1);
        // A fully solid isolated chunk meshes to its six-face shell.
        assert_eq!(store.get(&p).unwrap().vertex_count, 36);
        assert!(scheduler.pending().is_empty());

        // Re-dispatching while installed does nothing.
        scheduler.dispatch(&required, |pos| store.contains(pos));
        assert_eq!(scheduler.in_flight_count(), 0);
        assert!(scheduler.pending().is_empty());
    }
}
