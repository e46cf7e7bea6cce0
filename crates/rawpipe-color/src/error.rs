//! Error types for the color transform engine.

use crate::kernel::KernelKey;
use thiserror::Error;

/// Errors raised by [`ColorTransform`](crate::ColorTransform) and the
/// kernel registry.
#[derive(Debug, Error)]
pub enum ColorError {
    /// A parameter was rejected; the previous value is retained.
    #[error("invalid {name}: {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Rejected value, formatted
        value: String,
    },

    /// Tone-curve knots could not be interpolated.
    #[error("invalid tone curve: {0}")]
    InvalidCurve(String),

    /// No portable kernel exists for a depth/CMS combination.
    ///
    /// This is a configuration error of the kernel registry.
    #[error("no reference kernel registered for {0}")]
    NoReferenceKernel(KernelKey),

    /// A kernel entry's function does not produce the depth its key declares.
    #[error("kernel '{name}' does not match key {key}")]
    KernelMismatch {
        /// Kernel name
        name: &'static str,
        /// Declared key
        key: KernelKey,
    },

    /// Output buffer does not fit the source or the output depth.
    #[error("output mismatch: {0}")]
    OutputMismatch(String),

    /// Settings could not be (de)serialized.
    #[error("settings: {0}")]
    Settings(#[from] serde_yaml::Error),

    /// Image buffer error.
    #[error(transparent)]
    Core(#[from] rawpipe_core::Error),
}

impl ColorError {
    pub(crate) fn invalid(name: &'static str, value: impl std::fmt::Debug) -> Self {
        Self::InvalidParameter {
            name,
            value: format!("{:?}", value),
        }
    }
}

/// Result type for color operations.
pub type ColorResult<T> = Result<T, ColorError>;
