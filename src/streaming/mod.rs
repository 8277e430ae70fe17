//! # Streaming Module
//!
//! The concurrent half of the pipeline: deciding which chunks need
//! generating, running generation on a worker pool, and handing finished
//! meshes back to the thread that owns the graphics device.
//!
//! ## Lifecycle
//!
//! A chunk coordinate moves through three states:
//! 1. **pending** — claimed by [`ChunkScheduler::dispatch`], a generation
//!    task is in flight;
//! 2. **active** — its mesh was installed into the [`ChunkStore`] and is
//!    drawable;
//! 3. **pruned** — no longer required; removed from the store, GPU
//!    resources dropped with it.
//!
//! A coordinate enters the pending set exactly once per generation and
//! leaves it exactly once: on installation, on discard of a stale mesh, or
//! on a task's early-stale exit.

mod pending;
mod scheduler;
mod store;

pub use pending::PendingSet;
pub use scheduler::{ChunkGenerator, ChunkScheduler};
pub use store::{ChunkStore, InstalledChunk, INSTALL_BUDGET_MS};
