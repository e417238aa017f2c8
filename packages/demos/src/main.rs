//! Runs the demonstration pipelines in sequence on the shared worker pool.
//!
//! Configure logging through `RUST_LOG`, e.g. `RUST_LOG=debug`.

use std::sync::Arc;

use coldcell::WorkerPool;
use coldcell_demos::pipelines::{self, Sink};

fn main() {
    env_logger::init();

    let sink: Sink = Arc::new(|report| println!("{report}"));
    pipelines::run_all(WorkerPool::shared(), &sink);
}
