//! Pluggable execution contexts for pipeline dispatch

use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use once_cell::sync::Lazy;

/// A unit of work submitted to an execution context
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Selects which worker executes a submitted computation
pub trait ExecutionContext: Send + Sync {
    /// Submit a job for execution.
    ///
    /// Every implementation except [`InlineContext`] must return to the
    /// caller without waiting for the job to run.
    fn dispatch(&self, job: Job);

    /// Context name used for log attribution
    fn name(&self) -> &str;
}

/// Runs jobs synchronously on the calling thread.
///
/// Deterministic and single-threaded, which makes it the context tests reach
/// for. A panicking job propagates to the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineContext;

impl ExecutionContext for InlineContext {
    fn dispatch(&self, job: Job) {
        job();
    }

    fn name(&self) -> &str {
        "inline"
    }
}

/// Builder for [`WorkerPool`]
#[derive(Debug, Clone)]
pub struct WorkerPoolBuilder {
    name: String,
    workers: usize,
}

impl WorkerPoolBuilder {
    /// Set the pool name; worker threads are named `<name>-<index>`
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the number of worker threads (at least one)
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Spawn the worker threads and hand back the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system refuses to spawn a worker
    /// thread.
    pub fn build(self) -> io::Result<WorkerPool> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let mut handles = Vec::with_capacity(self.workers);

        for index in 0..self.workers {
            let receiver = receiver.clone();
            let label = format!("{}-{index}", self.name);
            let handle = thread::Builder::new().name(label.clone()).spawn(move || {
                tracing::trace!(worker = %label, "worker starting");
                for job in receiver {
                    // A panicking job must not take the worker down with it;
                    // the pipeline's handoff cell is dropped, so the consumer
                    // observes a disconnect instead of a hang.
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!(worker = %label, "job panicked");
                    }
                }
                tracing::trace!(worker = %label, "worker exiting");
            })?;
            handles.push(handle);
        }

        Ok(WorkerPool {
            name: self.name,
            sender: Some(sender),
            handles,
        })
    }
}

/// OS-thread pool fed by an unbounded job queue.
///
/// Dropping the pool closes the queue, lets the workers drain any jobs still
/// queued, and joins the threads.
pub struct WorkerPool {
    name: String,
    sender: Option<Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Builder with a single worker and a default name
    #[must_use]
    pub fn builder() -> WorkerPoolBuilder {
        WorkerPoolBuilder {
            name: "coldcell-worker".to_string(),
            workers: 1,
        }
    }

    /// Process-wide single-threaded pool, created once and never torn down
    pub fn shared() -> Arc<Self> {
        static SHARED: Lazy<Arc<WorkerPool>> = Lazy::new(|| {
            let pool = WorkerPool::builder()
                .name("coldcell-shared")
                .build()
                .unwrap_or_else(|err| panic!("failed to spawn the shared worker pool: {err}"));
            Arc::new(pool)
        });
        Arc::clone(&SHARED)
    }
}

impl ExecutionContext for WorkerPool {
    fn dispatch(&self, job: Job) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(job).is_err() {
            tracing::error!(pool = %self.name, "job queue disconnected, dropping job");
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for handle in self.handles.drain(..) {
            if handle.join().is_err() && !thread::panicking() {
                tracing::error!(pool = %self.name, "worker thread panicked");
            }
        }
    }
}
