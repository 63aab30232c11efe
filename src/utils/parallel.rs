/// Parallel processing utilities

use crate::AnnoshardError;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Worker count from the command line: 0 means one worker per CPU
pub fn resolve_workers(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get()
    } else {
        requested
    }
}

/// Threads needed to run `units` independent units at once, optionally capped
pub fn phase_threads(units: usize, max_workers: Option<usize>) -> usize {
    let cap = max_workers.unwrap_or(units);
    units.min(cap).max(1)
}

/// Dedicated pool for one phase; dropped when the phase completes
pub fn phase_pool(units: usize, max_workers: Option<usize>) -> Result<ThreadPool, AnnoshardError> {
    ThreadPoolBuilder::new()
        .num_threads(phase_threads(units, max_workers))
        .thread_name(|i| format!("annoshard-worker-{}", i))
        .build()
        .map_err(|e| AnnoshardError::Worker(format!("cannot start worker pool: {}", e)))
}
