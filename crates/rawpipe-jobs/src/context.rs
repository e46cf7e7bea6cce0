//! Progress and cancellation access for running work.

use crate::config::ProgressListener;
use crate::job::JobId;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Reported progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Completed fraction of the whole job, 0 to 1.
    Fraction(f32),
    /// Activity without a measurable fraction.
    Pulse,
}

/// One report sent to the [`ProgressListener`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Reporting job.
    pub job: JobId,
    /// New progress.
    pub progress: Progress,
    /// Current description.
    pub description: String,
}

/// State shared by every context of one job.
pub(crate) struct ProgressState {
    job: JobId,
    cancelled: Arc<AtomicBool>,
    /// Whole-job fraction as `f32` bits.
    fraction: AtomicU32,
    description: Mutex<String>,
    listener: Option<ProgressListener>,
}

impl ProgressState {
    pub(crate) fn new(
        job: JobId,
        cancelled: Arc<AtomicBool>,
        listener: Option<ProgressListener>,
    ) -> Arc<Self> {
        Arc::new(Self {
            job,
            cancelled,
            fraction: AtomicU32::new(0.0f32.to_bits()),
            description: Mutex::new(String::new()),
            listener,
        })
    }

    fn fraction(&self) -> f32 {
        f32::from_bits(self.fraction.load(Ordering::Acquire))
    }

    fn emit(&self, progress: Progress) {
        if let Some(listener) = &self.listener {
            let description = self
                .description
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            listener(&ProgressEvent {
                job: self.job,
                progress,
                description,
            });
        }
    }
}

/// Handed to every work function.
///
/// A context covers a slice of the job's total progress; the root context
/// covers all of it and [`scope`](Self::scope) carves out sub-ranges for
/// nested steps:
///
/// ```rust
/// use rawpipe_jobs::{JobScheduler, SchedulerConfig};
///
/// let scheduler = JobScheduler::new(SchedulerConfig::new().with_workers(1)).unwrap();
/// let job = scheduler.submit(|ctx| {
///     let load = ctx.scope(0.25);
///     load.set_progress(1.0);
///     let render = ctx.scope(0.75);
///     render.set_progress(0.5);
///     ctx.progress()
/// }, true);
/// assert!((job.wait().unwrap() - 0.625).abs() < 1e-6);
/// ```
pub struct JobContext {
    state: Arc<ProgressState>,
    start: f32,
    span: f32,
}

impl JobContext {
    pub(crate) fn root(state: Arc<ProgressState>) -> Self {
        Self {
            state,
            start: 0.0,
            span: 1.0,
        }
    }

    /// Id of the running job.
    pub fn job(&self) -> JobId {
        self.state.job
    }

    /// Returns `true` once the job was cancelled. Long work should poll
    /// this and return early.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Reports progress of this context, `0..=1` (clamped).
    pub fn set_progress(&self, fraction: f32) {
        let local = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let global = self.start + self.span * local;
        self.state.fraction.store(global.to_bits(), Ordering::Release);
        self.state.emit(Progress::Fraction(global));
    }

    /// Progress of this context, `0..=1`.
    pub fn progress(&self) -> f32 {
        if self.span <= 0.0 {
            return 1.0;
        }
        ((self.state.fraction() - self.start) / self.span).clamp(0.0, 1.0)
    }

    /// Reports activity without a fraction.
    pub fn pulse(&self) {
        self.state.emit(Progress::Pulse);
    }

    /// Sets the description shown with progress reports.
    pub fn set_description(&self, description: impl Into<String>) {
        *self
            .state
            .description
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = description.into();
        self.state.emit(Progress::Fraction(self.state.fraction()));
    }

    /// Sub-context covering the next `fraction` of this context's range,
    /// starting at the current progress.
    pub fn scope(&self, fraction: f32) -> JobContext {
        let end = self.start + self.span;
        let start = self.state.fraction().clamp(self.start, end);
        let span = (self.span * fraction.clamp(0.0, 1.0)).min(end - start);
        JobContext {
            state: self.state.clone(),
            start,
            span,
        }
    }
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobContext")
            .field("job", &self.state.job)
            .field("start", &self.start)
            .field("span", &self.span)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
