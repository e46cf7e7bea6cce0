//! Error types for job execution.

use thiserror::Error;

/// Errors returned by [`JobHandle::wait`](crate::JobHandle::wait) and
/// scheduler construction.
#[derive(Debug, Error)]
pub enum JobError {
    /// The job was submitted without a waitable result.
    #[error("job was submitted as non-waitable")]
    NotWaitable,

    /// The job was cancelled before or while running.
    #[error("job was cancelled")]
    Cancelled,

    /// The work function panicked.
    #[error("job panicked: {0}")]
    Panicked(String),

    /// A worker thread could not be started.
    #[error("failed to start worker thread: {0}")]
    Pool(#[from] std::io::Error),
}

/// Result type for job operations.
pub type JobResult<T> = std::result::Result<T, JobError>;
