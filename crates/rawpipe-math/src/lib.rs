//! # rawpipe-math
//!
//! Math primitives for the rawpipe color engine:
//!
//! - [`CubicSpline`] - Natural cubic spline through tone-curve knots
//! - [`ColorMatrix`] - 3x3 / 4x4 color matrices (row-major, column vectors)
//! - [`simd`] - `wide`-based helpers for structure-of-arrays pixel math
//!
//! # Design
//!
//! Matrices are stored row-major and applied to column vectors, with
//! [`glam`] doing composition and inversion:
//!
//! ```text
//! | m00 m01 m02 m03 |   | r  |
//! | m10 m11 m12 m13 | * | g  |
//! | m20 m21 m22 m23 |   | b  |
//! | m30 m31 m32 m33 |   | g2 |
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod matrix;
pub mod simd;
mod spline;

pub use matrix::*;
pub use spline::*;
