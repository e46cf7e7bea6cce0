//! Job handles and per-job state.

use crate::error::{JobError, JobResult};
use crate::scheduler::JobQueue;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use tracing::debug;

/// Process-unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// Lifecycle of a job.
///
/// ```text
/// Queued ──► Running ──► Completed
///   │           │
///   └───────────┴──────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Waiting in the scheduler queue.
    Queued,
    /// Executing on a worker.
    Running,
    /// Finished normally (including a panic in the work function).
    Completed,
    /// Cancelled while queued, or finished after a cancel request.
    Cancelled,
}

impl JobState {
    /// Returns `true` for `Completed` and `Cancelled`.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

struct Slot<T> {
    state: JobState,
    result: Option<JobResult<T>>,
}

/// State shared between a [`JobHandle`] and the worker running the job.
pub(crate) struct JobShared<T> {
    id: JobId,
    waitable: bool,
    cancelled: Arc<AtomicBool>,
    slot: Mutex<Slot<T>>,
    done: Condvar,
}

impl<T> JobShared<T> {
    pub(crate) fn new(id: JobId, waitable: bool) -> Arc<Self> {
        Arc::new(Self {
            id,
            waitable,
            cancelled: Arc::new(AtomicBool::new(false)),
            slot: Mutex::new(Slot {
                state: JobState::Queued,
                result: None,
            }),
            done: Condvar::new(),
        })
    }

    pub(crate) fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves a queued job to `Running`. Returns `false` if it was cancelled
    /// first; the job is then finished and must not run.
    pub(crate) fn start(&self) -> bool {
        let mut slot = self.lock();
        if slot.state != JobState::Queued {
            return false;
        }
        if self.cancelled.load(Ordering::Acquire) {
            self.finish_locked(&mut slot, JobState::Cancelled, None);
            return false;
        }
        slot.state = JobState::Running;
        true
    }

    /// Stores the outcome of a run.
    pub(crate) fn complete(&self, result: JobResult<T>) {
        let mut slot = self.lock();
        let state = if self.cancelled.load(Ordering::Acquire) {
            JobState::Cancelled
        } else {
            JobState::Completed
        };
        self.finish_locked(&mut slot, state, Some(result));
    }

    /// Finishes a job that was removed from the queue.
    pub(crate) fn abandon(&self) {
        let mut slot = self.lock();
        if !slot.state.is_finished() {
            self.finish_locked(&mut slot, JobState::Cancelled, None);
        }
    }

    fn finish_locked(&self, slot: &mut Slot<T>, state: JobState, result: Option<JobResult<T>>) {
        slot.state = state;
        if self.waitable {
            slot.result = match (state, result) {
                (JobState::Cancelled, _) => Some(Err(JobError::Cancelled)),
                (_, result) => result,
            };
        }
        self.done.notify_all();
    }
}

/// Handle to a submitted job.
///
/// Dropping the handle does not cancel the job.
pub struct JobHandle<T> {
    shared: Arc<JobShared<T>>,
    queue: Weak<JobQueue>,
}

impl<T> JobHandle<T> {
    pub(crate) fn new(shared: Arc<JobShared<T>>, queue: Weak<JobQueue>) -> Self {
        Self { shared, queue }
    }

    /// Job id.
    pub fn id(&self) -> JobId {
        self.shared.id
    }

    /// Returns `true` if [`wait`](Self::wait) can return the result.
    pub fn is_waitable(&self) -> bool {
        self.shared.waitable
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.shared.lock().state
    }

    /// Returns `true` once the job completed or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.state().is_finished()
    }

    /// Requests cancellation.
    ///
    /// A queued job is removed from the queue and never runs. A running
    /// job only sees [`JobContext::is_cancelled`](crate::JobContext::is_cancelled)
    /// turn `true`. Returns `false` if the job had already finished.
    pub fn cancel(&self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.shared.cancelled.store(true, Ordering::Release);
        let removed = self
            .queue
            .upgrade()
            .is_some_and(|q| q.remove(self.shared.id));
        if removed {
            self.shared.abandon();
        }
        debug!(job = %self.shared.id, removed, "cancel requested");
        true
    }

    /// Blocks until the job finishes and returns its result.
    ///
    /// # Errors
    ///
    /// - [`JobError::NotWaitable`] for jobs submitted with `waitable = false`
    /// - [`JobError::Cancelled`] if the job was cancelled
    /// - [`JobError::Panicked`] if the work function panicked
    pub fn wait(self) -> JobResult<T> {
        if !self.shared.waitable {
            return Err(JobError::NotWaitable);
        }
        let mut slot = self.shared.lock();
        while !slot.state.is_finished() {
            slot = self
                .shared
                .done
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        slot.result.take().unwrap_or(Err(JobError::Cancelled))
    }
}

impl<T> fmt::Debug for JobHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.shared.id)
            .field("waitable", &self.shared.waitable)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let shared = JobShared::<u32>::new(JobId::next(), true);
        assert!(shared.start());
        assert!(!shared.start());
        shared.complete(Ok(7));
        let handle = JobHandle::new(shared, Weak::new());
        assert_eq!(handle.state(), JobState::Completed);
        assert!(!handle.cancel());
        assert_eq!(handle.wait().unwrap(), 7);
    }

    #[test]
    fn test_cancel_before_start() {
        let shared = JobShared::<u32>::new(JobId::next(), true);
        let handle = JobHandle::new(shared.clone(), Weak::new());
        assert!(handle.cancel());
        assert!(!shared.start());
        assert_eq!(handle.state(), JobState::Cancelled);
        assert!(matches!(handle.wait(), Err(JobError::Cancelled)));
    }

    #[test]
    fn test_cancel_while_running_discards_result() {
        let shared = JobShared::<u32>::new(JobId::next(), true);
        let handle = JobHandle::new(shared.clone(), Weak::new());
        assert!(shared.start());
        assert!(handle.cancel());
        assert_eq!(handle.state(), JobState::Running);
        shared.complete(Ok(1));
        assert!(matches!(handle.wait(), Err(JobError::Cancelled)));
    }

    #[test]
    fn test_not_waitable() {
        let shared = JobShared::<()>::new(JobId::next(), false);
        shared.start();
        shared.complete(Ok(()));
        let handle = JobHandle::new(shared, Weak::new());
        assert!(handle.is_finished());
        assert!(matches!(handle.wait(), Err(JobError::NotWaitable)));
    }
}
