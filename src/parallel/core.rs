use thiserror::Error;

#[derive(Debug, Error)]
#[error("a worker thread panicked")]
pub struct WorkerPanic;

/// Execution strategy enum for choosing between sequential and parallel runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    /// Strategy for a fixed amount of work
    ///
    /// A single worker (or a single work item) runs on the calling thread;
    /// otherwise one OS thread per worker is spawned for the run.
    pub fn for_workload(requested_workers: usize, work_items: usize) -> Self {
        let workers = Self::calculate_optimal_workers(requested_workers).min(work_items.max(1));
        if workers <= 1 {
            ExecutionStrategy::Sequential
        } else {
            ExecutionStrategy::Parallel { workers }
        }
    }

    /// Calculate workers from the configured limit and available CPU cores
    ///
    /// ```text
    /// requested > 0  → requested
    /// requested == 0 → num_cpus::get()
    /// always at least 1
    /// ```
    pub fn calculate_optimal_workers(requested_workers: usize) -> usize {
        let workers = if requested_workers > 0 {
            requested_workers
        } else {
            num_cpus::get()
        };
        workers.max(1)
    }

    pub fn workers(&self) -> usize {
        match self {
            ExecutionStrategy::Sequential => 1,
            ExecutionStrategy::Parallel { workers } => *workers,
        }
    }

    /// Run `worker(worker_id)` once per worker and wait for all of them
    ///
    /// Workers share whatever `worker` borrows; the threads are scoped to
    /// this call, so nothing outlives it.
    pub fn run<F>(&self, worker: F) -> Result<(), WorkerPanic>
    where
        F: Fn(usize) + Sync,
    {
        match self {
            ExecutionStrategy::Sequential => {
                worker(0);
                Ok(())
            }
            ExecutionStrategy::Parallel { workers } => {
                let worker = &worker;
                crossbeam::thread::scope(|s| {
                    start_workers(*workers, worker, |worker_id| {
                        s.builder()
                            .name(format!("shredscan-worker-{worker_id}"))
                            .spawn(move |_| worker(worker_id))
                            .map(|_| ())
                    });
                })
                .map_err(|_| WorkerPanic)
            }
        }
    }
}

/// Start `workers` threads through `spawn`, returning how many started
///
/// When not a single thread can be started, one worker runs on the calling
/// thread so the work still gets done.
fn start_workers<F, S>(workers: usize, worker: &F, mut spawn: S) -> usize
where
    F: Fn(usize),
    S: FnMut(usize) -> std::io::Result<()>,
{
    let mut started = 0;
    for worker_id in 0..workers {
        match spawn(worker_id) {
            Ok(()) => started += 1,
            Err(e) => tracing::error!("Failed to spawn worker {}: {}", worker_id, e),
        }
    }
    if started == 0 && workers > 0 {
        tracing::warn!("No worker thread could be started, running on the calling thread");
        worker(0);
    }
    started
}
