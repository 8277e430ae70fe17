#![warn(missing_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Streamer
//!
//! Streams an effectively infinite procedural voxel world around a moving
//! observer: it decides which chunks must exist, fills them from a noise
//! field on a worker pool, reduces the voxels to merged quads with a
//! greedy mesher, hands finished meshes to the render thread through a
//! channel, and draws whatever survives frustum culling — all under a
//! per-frame installation time budget.
//!
//! ## Key Modules
//!
//! * `world` - chunk-grid layout, noise sampling, voxel fields, the
//!   required-chunk neighborhood
//! * `meshing` - greedy quad extraction and the chunk mesh data model
//! * `streaming` - generation scheduling, the worker pool, and chunk
//!   lifecycle (pending / active / pruned)
//! * `rendering` - the WGPU pipeline, per-chunk buffers, frustum culling
//! * `camera` / `application` - observer state and the windowed shell
//!
//! ## Architecture
//!
//! Generation is fire-and-collect: the scheduler deduplicates required
//! coordinates against what is already active or pending, workers mesh
//! chunks independently using a one-cell halo instead of neighbor
//! lookups, and the single device-owning thread installs results as time
//! allows. No other state crosses the worker/render boundary.

use winit::event_loop::EventLoop;

use application::Application;

pub mod application;
pub mod camera;
pub mod meshing;
pub mod rendering;
pub mod streaming;
pub mod world;

/// Initializes logging and runs the application until the window closes.
pub fn run() {
    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    log::info!("logger initialized");

    let event_loop = EventLoop::with_user_event()
        .build()
        .expect("failed to build event loop");
    let mut application = Application::new(event_loop.create_proxy());
    let _ = event_loop.run_app(&mut application);
}
