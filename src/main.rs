//! Native entry point: hands control to the library's `run()`.
//!
//! ```bash
//! cargo run --release
//! ```

fn main() {
    voxel_streamer::run();
}
