//! FIFO job scheduler on dedicated worker threads.
//!
//! Submitted jobs go into a scheduler-owned queue and every submission
//! sends one wake-up over a `flume` channel. A worker that receives a
//! wake-up runs whatever job is at the front of the queue at that moment.
//! Jobs therefore start in submission order, and a cancelled job can simply
//! be taken out of the queue.
//!
//! Workers are plain named threads, not rayon workers. Kernels and filters
//! that use rayon inside a job run on the global rayon pool, so a worker
//! blocked in a parallel loop never picks up another job while it still
//! holds a node lock.

use crate::config::SchedulerConfig;
use crate::context::{JobContext, ProgressState};
use crate::error::{JobError, JobResult};
use crate::job::{JobHandle, JobId, JobShared};
use flume::{Receiver, Sender};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

type Task = Box<dyn FnOnce() + Send>;

struct Queued {
    id: JobId,
    run: Task,
    abandon: Box<dyn FnOnce() + Send>,
}

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<Queued>,
    active: usize,
}

/// Jobs waiting for a worker plus the running count.
#[derive(Default)]
pub(crate) struct JobQueue {
    state: Mutex<QueueState>,
    idle: Condvar,
}

impl JobQueue {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, job: Queued) {
        self.lock().jobs.push_back(job);
    }

    /// Removes a queued job. Returns `false` if it is not in the queue.
    pub(crate) fn remove(&self, id: JobId) -> bool {
        let mut state = self.lock();
        let Some(pos) = state.jobs.iter().position(|j| j.id == id) else {
            return false;
        };
        // Dropping the entry releases the captured work and payload
        let _ = state.jobs.remove(pos);
        if state.jobs.is_empty() && state.active == 0 {
            self.idle.notify_all();
        }
        true
    }

    /// Runs the front job, if any. Called once per wake-up.
    fn run_next(&self) {
        let job = {
            let mut state = self.lock();
            let job = state.jobs.pop_front();
            if job.is_some() {
                state.active += 1;
            }
            job
        };
        let Some(job) = job else {
            return;
        };
        trace!(job = %job.id, "dequeued");
        (job.run)();

        let mut state = self.lock();
        state.active -= 1;
        if state.jobs.is_empty() && state.active == 0 {
            self.idle.notify_all();
        }
    }

    fn drain(&self) -> Vec<Queued> {
        self.lock().jobs.drain(..).collect()
    }
}

/// Worker body: one queued job per wake-up until the sender is gone.
fn worker_loop(queue: Arc<JobQueue>, wakeups: Receiver<()>) {
    while wakeups.recv().is_ok() {
        queue.run_next();
    }
    trace!("worker exiting");
}

/// Runs work functions on a fixed set of worker threads.
///
/// Dropping the scheduler lets the workers finish what is already queued
/// and then joins them.
///
/// # Example
///
/// ```rust
/// use rawpipe_jobs::{JobScheduler, SchedulerConfig};
///
/// let scheduler = JobScheduler::new(SchedulerConfig::new().with_workers(2)).unwrap();
/// let job = scheduler.submit_with(21u32, |x, _ctx| x * 2, true);
/// assert_eq!(job.wait().unwrap(), 42);
/// ```
pub struct JobScheduler {
    /// Option for Drop: taking it disconnects the workers.
    wakeups: Option<Sender<()>>,
    workers: Vec<JoinHandle<()>>,
    queue: Arc<JobQueue>,
    config: SchedulerConfig,
}

impl JobScheduler {
    /// Creates a scheduler and its worker threads.
    ///
    /// # Errors
    ///
    /// [`JobError::Pool`] if a worker thread cannot be started.
    pub fn new(config: SchedulerConfig) -> JobResult<Self> {
        let count = config.worker_count();
        let queue: Arc<JobQueue> = Arc::default();
        let (tx, rx) = flume::unbounded();

        // Threads started before a failure exit once `tx` is dropped
        let workers = (0..count)
            .map(|i| {
                let queue = queue.clone();
                let rx = rx.clone();
                thread::Builder::new()
                    .name(format!("{}-{}", config.thread_name, i))
                    .spawn(move || worker_loop(queue, rx))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(workers = count, name = %config.thread_name, "job scheduler started");
        Ok(Self {
            wakeups: Some(tx),
            workers,
            queue,
            config,
        })
    }

    /// Scheduler with default configuration.
    pub fn with_defaults() -> JobResult<Self> {
        Self::new(SchedulerConfig::default())
    }

    /// Configuration in use.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Enqueues `work`.
    ///
    /// With `waitable` the result is kept for [`JobHandle::wait`];
    /// otherwise it is dropped when the job ends.
    pub fn submit<T, F>(&self, work: F, waitable: bool) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&JobContext) -> T + Send + 'static,
    {
        self.submit_with((), move |(), ctx| work(ctx), waitable)
    }

    /// Enqueues `work` with an owned payload.
    pub fn submit_with<P, T, F>(&self, payload: P, work: F, waitable: bool) -> JobHandle<T>
    where
        P: Send + 'static,
        T: Send + 'static,
        F: FnOnce(P, &JobContext) -> T + Send + 'static,
    {
        let id = JobId::next();
        let shared = JobShared::<T>::new(id, waitable);
        let progress = ProgressState::new(id, shared.cancel_flag(), self.config.listener.clone());

        let job = shared.clone();
        let run: Task = Box::new(move || {
            if !job.start() {
                trace!(job = %id, "cancelled before start");
                return;
            }
            let ctx = JobContext::root(progress);
            let result = panic::catch_unwind(AssertUnwindSafe(|| work(payload, &ctx)))
                .map_err(|e| {
                    let msg = panic_message(e.as_ref());
                    warn!(job = %id, panic = %msg, "job panicked");
                    JobError::Panicked(msg)
                });
            job.complete(result);
            trace!(job = %id, "finished");
        });
        let abandoned = shared.clone();
        self.queue.push(Queued {
            id,
            run,
            abandon: Box::new(move || abandoned.abandon()),
        });

        // Receivers live as long as the workers, which outlive `self`
        if let Some(tx) = &self.wakeups {
            let _ = tx.send(());
        }
        trace!(job = %id, waitable, "submitted");
        JobHandle::new(shared, Arc::downgrade(&self.queue))
    }

    /// Jobs waiting for a worker.
    pub fn pending(&self) -> usize {
        self.queue.lock().jobs.len()
    }

    /// Jobs currently running.
    pub fn active(&self) -> usize {
        self.queue.lock().active
    }

    /// Blocks until no job is queued or running.
    pub fn wait_idle(&self) {
        let mut state = self.queue.lock();
        while !state.jobs.is_empty() || state.active > 0 {
            state = self
                .queue
                .idle
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cancels every queued job; running jobs are unaffected. Returns the
    /// number removed.
    pub fn cancel_pending(&self) -> usize {
        let jobs = self.queue.drain();
        let n = jobs.len();
        for job in jobs {
            (job.abandon)();
        }
        self.queue.idle.notify_all();
        if n > 0 {
            debug!(count = n, "cancelled pending jobs");
        }
        n
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        // Workers drain the remaining wake-ups, then see the disconnect
        drop(self.wakeups.take());

        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            // The last owner may be a job running on one of the workers
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                warn!("job worker terminated abnormally");
            }
        }
        debug!("job scheduler stopped");
    }
}

impl std::fmt::Debug for JobScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobScheduler")
            .field("workers", &self.workers())
            .field("pending", &self.pending())
            .field("active", &self.active())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
