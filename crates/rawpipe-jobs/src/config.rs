//! Scheduler configuration.

use crate::context::ProgressEvent;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Receives progress reports from running jobs.
///
/// Called on the worker thread; keep it short.
pub type ProgressListener = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Default worker thread name prefix.
pub const DEFAULT_THREAD_NAME: &str = "rawpipe-worker";

/// Settings for a [`JobScheduler`](crate::JobScheduler).
///
/// # Example
///
/// ```rust
/// use rawpipe_jobs::SchedulerConfig;
///
/// let config = SchedulerConfig::new()
///     .with_workers(2)
///     .with_thread_name("render")
///     .with_listener(|ev| println!("{:?}", ev.progress));
/// assert_eq!(config.worker_count(), 2);
/// ```
#[derive(Clone)]
pub struct SchedulerConfig {
    /// Worker threads; 0 uses the detected core count.
    pub workers: usize,
    /// Worker thread name prefix; threads are named `<prefix>-<index>`.
    pub thread_name: String,
    /// Optional progress listener.
    pub listener: Option<ProgressListener>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            listener: None,
        }
    }
}

impl SchedulerConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker count (0 = detected core count).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the thread name prefix.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Sets the progress listener.
    pub fn with_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Effective number of workers.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            detected_cores()
        }
    }
}

impl fmt::Debug for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerConfig")
            .field("workers", &self.workers)
            .field("thread_name", &self.thread_name)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Number of CPU cores, at least 1.
///
/// Asks the OS through `sys-info`, falling back to the standard library's
/// estimate.
pub fn detected_cores() -> usize {
    let cores = match sys_info::cpu_num() {
        Ok(n) if n > 0 => n as usize,
        other => {
            debug!(result = ?other, "sys-info core count unavailable");
            std::thread::available_parallelism().map_or(1, |n| n.get())
        }
    };
    cores.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count() {
        assert_eq!(SchedulerConfig::new().with_workers(3).worker_count(), 3);
        assert!(SchedulerConfig::new().worker_count() >= 1);
        assert!(detected_cores() >= 1);
    }

    #[test]
    fn test_debug_hides_listener() {
        let config = SchedulerConfig::new().with_listener(|_| {});
        let s = format!("{:?}", config);
        assert!(s.contains("listener: true"));
        assert!(s.contains(DEFAULT_THREAD_NAME));
    }
}
