//! # rawpipe-core
//!
//! Core types shared by every rawpipe crate.
//!
//! - [`Rect`] - Signed integer rectangle used for regions of interest
//! - [`ImageBuffer`], [`Image16`], [`Image8`] - Interleaved pixel buffers with stride
//! - [`Error`] - Buffer and geometry errors
//!
//! ## Crate Structure
//!
//! ```text
//! rawpipe-core (this crate)
//!    ^
//!    |
//!    +-- rawpipe-math  (spline, matrices, SIMD helpers)
//!    +-- rawpipe-color (LUTs, pixel kernels, transform engine)
//!    +-- rawpipe-graph (filter nodes, requests, responses)
//!    +-- rawpipe-jobs  (background scheduler)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod rect;

pub use error::{Error, Result};
pub use image::{Image16, Image8, ImageBuffer, Sample, SharedImage16, SharedImage8};
pub use rect::Rect;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::{Image16, Image8, ImageBuffer, SharedImage16, SharedImage8};
    pub use crate::rect::Rect;
}
