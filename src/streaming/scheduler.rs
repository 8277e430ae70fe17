//! # Chunk Generation Scheduler
//!
//! Owns the worker pool that turns required chunk coordinates into
//! finished meshes. The scheduler is the only component that creates
//! generation work; it guarantees at most one in-flight task per
//! coordinate at any time.
//!
//! ## Architecture
//!
//! Each worker thread owns a dedicated job channel; submission
//! round-robins across workers and never blocks. All workers share one
//! clone of the finished-mesh sender, so the mesh channel is the single
//! structure touched by both the workers and the owning thread — a
//! multi-producer/single-consumer handoff by construction.
//!
//! ## Task body
//!
//! A job carries its coordinate and a snapshot of the required set taken
//! at dispatch time. The task first re-checks the snapshot: if the
//! coordinate is no longer in it the task releases its pending claim and
//! exits without generating (cooperative cancellation — running work is
//! never interrupted). Otherwise it builds the voxel field, meshes it,
//! and pushes the result onto the finished channel.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::meshing::{greedy, ChunkMesh};
use crate::world::noise_field::NoiseField;
use crate::world::voxel_field::VoxelField;
use crate::world::ChunkPos;

use super::pending::PendingSet;

/// Selects how generation tasks fill a chunk's voxel field.
#[derive(Clone)]
pub enum ChunkGenerator {
    /// Threshold the world noise field (normal operation).
    Noise(NoiseField),
    /// Every interior cell solid (testing).
    Solid,
    /// Every cell empty (testing).
    Empty,
}

impl ChunkGenerator {
    /// Builds the voxel field for one chunk.
    pub fn build(&self, pos: ChunkPos) -> VoxelField {
        match self {
            ChunkGenerator::Noise(noise) => VoxelField::from_noise(pos, noise),
            ChunkGenerator::Solid => VoxelField::solid(),
            ChunkGenerator::Empty => VoxelField::empty(),
        }
    }
}

struct GenerationJob {
    coord: ChunkPos,
    required: Arc<HashSet<ChunkPos>>,
}

struct WorkerChannel {
    job_sender: Sender<GenerationJob>,
    _worker: JoinHandle<()>,
}

/// Dispatches chunk generation to a fixed pool of worker threads.
pub struct ChunkScheduler {
    workers: Vec<WorkerChannel>,
    next_worker: usize,
    pending: PendingSet,
    in_flight: Arc<AtomicUsize>,
    finished: Receiver<ChunkMesh>,
}

impl ChunkScheduler {
    /// Creates a scheduler with a worker per available core.
    pub fn new(generator: ChunkGenerator) -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .max(1);
        Self::with_workers(workers, generator)
    }

    /// Creates a scheduler with an explicit worker count (at least 1).
    pub fn with_workers(worker_count: usize, generator: ChunkGenerator) -> Self {
        let pending = PendingSet::new();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let (mesh_sender, finished) = channel::<ChunkMesh>();

        let workers = (0..worker_count.max(1))
            .map(|_| {
                let (job_sender, job_receiver) = channel::<GenerationJob>();
                let meshes = mesh_sender.clone();
                let pending = pending.clone();
                let in_flight = in_flight.clone();
                let generator = generator.clone();
                let worker = thread::spawn(move || {
                    worker_loop(job_receiver, meshes, pending, in_flight, generator);
                });
                WorkerChannel {
                    job_sender,
                    _worker: worker,
                }
            })
            .collect();

        ChunkScheduler {
            workers,
            next_worker: 0,
            pending,
            in_flight,
            finished,
        }
    }

    /// Dispatches generation for every required coordinate that is neither
    /// active (per `is_active`) nor already pending.
    ///
    /// Each newly claimed coordinate gets exactly one task, carrying a
    /// shared snapshot of `required` for the staleness check. Calling
    /// `dispatch` again before a task completes never duplicates it.
    pub fn dispatch<F>(&mut self, required: &HashSet<ChunkPos>, is_active: F)
    where
        F: Fn(&ChunkPos) -> bool,
    {
        let mut snapshot: Option<Arc<HashSet<ChunkPos>>> = None;

        for pos in required {
            if is_active(pos) {
                continue;
            }
            if !self.pending.try_claim(*pos) {
                continue;
            }

            let snapshot = snapshot
                .get_or_insert_with(|| Arc::new(required.clone()))
                .clone();
            self.in_flight.fetch_add(1, Ordering::Relaxed);
            self.submit(GenerationJob {
                coord: *pos,
                required: snapshot,
            });
        }
    }

    fn submit(&mut self, job: GenerationJob) {
        let index = self.next_worker % self.workers.len();
        self.next_worker = self.next_worker.wrapping_add(1);

        if let Err(failed) = self.workers[index].job_sender.send(job) {
            // A worker died; undo the claim so the chunk is not lost forever.
            log::error!("generation worker {index} disconnected");
            self.pending.release(failed.0.coord);
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Number of generation tasks currently in flight (diagnostics).
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// The pending set shared with the workers.
    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    /// Consumer side of the finished-mesh channel. Only the thread owning
    /// the graphics device should drain it.
    pub fn finished(&self) -> &Receiver<ChunkMesh> {
        &self.finished
    }
}

fn worker_loop(
    jobs: Receiver<GenerationJob>,
    meshes: Sender<ChunkMesh>,
    pending: PendingSet,
    in_flight: Arc<AtomicUsize>,
    generator: ChunkGenerator,
) {
    while let Ok(job) = jobs.recv() {
        if !job.required.contains(&job.coord) {
            // Stale before it started. Free the claim so the coordinate can
            // be redispatched if it becomes required again.
            pending.release(job.coord);
            continue;
        }

        let field = generator.build(job.coord);
        let mesh = greedy::mesh_chunk(job.coord, &field);
        in_flight.fetch_sub(1, Ordering::Relaxed);
        if meshes.send(mesh).is_err() {
            // Consumer is gone; the scheduler is shutting down.
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;
    use std::time::Duration;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);
    const SETTLE: Duration = Duration::from_millis(100);

    #[test]
    fn dispatch_generates_each_coordinate_once() {
        let mut scheduler = ChunkScheduler::with_workers(2, ChunkGenerator::Solid);
        let p = Point3::new(0, 0, 0);
        let required: HashSet<ChunkPos> = [p].into_iter().collect();

        for _ in 0..10 {
            scheduler.dispatch(&required, |_| false);
        }

        // Exactly one mesh arrives; the claim is still held until install,
        // so the repeated dispatches above were all deduplicated.
        let mesh = scheduler.finished().recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(mesh.coord, p);
        assert!(scheduler.finished().recv_timeout(SETTLE).is_err());
        assert!(scheduler.pending().contains(&p));
        assert_eq!(scheduler.in_flight_count(), 0);

        // Releasing the claim (as install would) re-enables dispatch.
        scheduler.pending().release(p);
        scheduler.dispatch(&required, |_| false);
        let again = scheduler.finished().recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(again.coord, p);
    }

    #[test]
    fn dispatch_skips_active_coordinates() {
        let mut scheduler = ChunkScheduler::with_workers(1, ChunkGenerator::Solid);
        let active = Point3::new(1, 0, 0);
        let fresh = Point3::new(2, 0, 0);
        let required: HashSet<ChunkPos> = [active, fresh].into_iter().collect();

        scheduler.dispatch(&required, |pos| *pos == active);

        let mesh = scheduler.finished().recv_timeout(RECV_TIMEOUT).unwrap();
        assert_eq!(mesh.coord, fresh);
        assert!(scheduler.finished().recv_timeout(SETTLE).is_err());
        assert!(!scheduler.pending().contains(&active));
    }

    #[test]
    fn stale_task_releases_claim_without_meshing() {
        // Drive a worker directly with a job whose snapshot no longer
        // contains its coordinate.
        let pending = PendingSet::new();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let (job_tx, job_rx) = channel::<GenerationJob>();
        let (mesh_tx, mesh_rx) = channel::<ChunkMesh>();
        let worker = {
            let pending = pending.clone();
            let in_flight = in_flight.clone();
            thread::spawn(move || {
                worker_loop(job_rx, mesh_tx, pending, in_flight, ChunkGenerator::Solid)
            })
        };

        let p = Point3::new(7, 7, 7);
        assert!(pending.try_claim(p));
        job_tx
            .send(GenerationJob {
                coord: p,
                required: Arc::new(HashSet::new()),
            })
            .unwrap();

        // No mesh is produced and the claim is freed.
        assert!(mesh_rx.recv_timeout(SETTLE).is_err());
        assert!(!pending.contains(&p));

        drop(job_tx);
        worker.join().unwrap();
    }

    #[test]
    fn meshes_from_many_workers_all_arrive() {
        let mut scheduler = ChunkScheduler::with_workers(4, ChunkGenerator::Solid);
        let required: HashSet<ChunkPos> = (0..8).map(|i| Point3::new(i, 0, 0)).collect();

        scheduler.dispatch(&required, |_| false);

        let mut seen = HashSet::new();
        for _ in 0..8 {
            let mesh = scheduler.finished().recv_timeout(RECV_TIMEOUT).unwrap();
            assert!(seen.insert(mesh.coord), "duplicate mesh for {:?}", mesh.coord);
        }
        assert_eq!(seen, required);
    }
}
