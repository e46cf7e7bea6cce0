//! # rawpipe-jobs
//!
//! Background job scheduler for long-running graph work.
//!
//! Work functions run on a dedicated worker pool in submission order. Each
//! one receives a [`JobContext`] for progress reports and cooperative
//! cancellation; the caller keeps a [`JobHandle`] to cancel or wait.
//!
//! ```text
//! submit ──► queue (FIFO) ──► worker ──► Completed ──► wait()
//!              │                │
//!           cancel()         cancel() sets flag, work polls is_cancelled()
//!              ▼                ▼
//!          Cancelled        Cancelled
//! ```
//!
//! # Example
//!
//! ```rust
//! use rawpipe_jobs::{JobScheduler, SchedulerConfig};
//!
//! let scheduler = JobScheduler::new(SchedulerConfig::new().with_workers(2)).unwrap();
//! let job = scheduler.submit(|ctx| {
//!     ctx.set_description("summing");
//!     (1..=10u32).sum::<u32>()
//! }, true);
//! assert_eq!(job.wait().unwrap(), 55);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod job;
pub mod render;
pub mod scheduler;

pub use config::{detected_cores, ProgressListener, SchedulerConfig};
pub use context::{JobContext, Progress, ProgressEvent};
pub use error::{JobError, JobResult};
pub use job::{JobHandle, JobId, JobState};
pub use render::submit_render;
pub use scheduler::JobScheduler;
