//! Error types for rawpipe-core operations.
//!
//! The [`Error`] enum covers buffer construction and geometry failures.
//! Higher crates wrap it in their own error enums (`ColorError`,
//! `GraphError`) through `#[from]`.
//!
//! # Usage
//!
//! ```rust
//! use rawpipe_core::{Error, Result};
//!
//! fn check(width: u32, height: u32) -> Result<()> {
//!     if width == 0 || height == 0 {
//!         return Err(Error::invalid_dimensions(width, height, "zero sized"));
//!     }
//!     Ok(())
//! }
//! assert!(check(0, 4).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by image buffers and rectangles.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid image dimensions or a data length that does not match them.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Stride is too small for the given width and channel count.
    ///
    /// Strides are counted in samples, not bytes.
    #[error("stride {stride} is less than minimum {min_stride} for width {width}")]
    InvalidStride {
        /// Provided stride
        stride: usize,
        /// Minimum required stride
        min_stride: usize,
        /// Image width
        width: u32,
    },

    /// Channel count is outside the supported range.
    #[error("unsupported channel count {channels} (expected {expected})")]
    UnsupportedChannels {
        /// Provided channel count
        channels: usize,
        /// Human readable expectation
        expected: &'static str,
    },

    /// Region does not overlap the image at all.
    #[error("region ({x}, {y}, {w}x{h}) lies outside image bounds {width}x{height}")]
    InvalidRegion {
        /// Region X origin
        x: i32,
        /// Region Y origin
        y: i32,
        /// Region width
        w: i32,
        /// Region height
        h: i32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Two images were expected to have identical dimensions.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First image width
        a_width: u32,
        /// First image height
        a_height: u32,
        /// Second image width
        b_width: u32,
        /// Second image height
        b_height: u32,
    },
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Returns `true` if this is a geometry error (region or dimensions).
    #[inline]
    pub fn is_geometry_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRegion { .. } | Self::InvalidDimensions { .. } | Self::DimensionMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dimensions_message() {
        let err = Error::invalid_dimensions(0, 10, "zero width");
        let msg = err.to_string();
        assert!(msg.contains("0x10"));
        assert!(msg.contains("zero width"));
        assert!(err.is_geometry_error());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::dimension_mismatch((100, 100), (200, 50));
        let msg = err.to_string();
        assert!(msg.contains("100x100"));
        assert!(msg.contains("200x50"));
    }

    #[test]
    fn test_stride_is_not_geometry() {
        let err = Error::InvalidStride {
            stride: 3,
            min_stride: 4,
            width: 1,
        };
        assert!(!err.is_geometry_error());
    }
}
