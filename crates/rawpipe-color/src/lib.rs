//! # rawpipe-color
//!
//! Color transform execution engine for the rawpipe filter graph.
//!
//! Converts 16-bit sensor/linear pixels into displayable 8-bit or 16-bit
//! RGB through premultipliers, a color matrix and gamma / contrast /
//! tone-curve lookup tables:
//!
//! ```text
//! Image16 ──► premultiply ──► matrix ──► LUT8 ──────────────► Image8
//!                                    └─► LUT16 ─► [CMS] ─────► Image8 / Image16
//! ```
//!
//! # Modules
//!
//! - [`engine`] - [`ColorTransform`], the per-instance engine
//! - [`kernel`] - Pixel kernels and [`KernelRegistry`]
//! - [`cpu`] - [`CapabilityTier`] detection
//! - [`lut`] - Lookup table generation
//! - [`cms`] - [`ColorManagement`] staging handles
//! - [`settings`] - YAML-serializable [`TransformSettings`]
//!
//! # Example
//!
//! ```rust
//! use rawpipe_color::{ColorTransform, OutputDepth};
//! use rawpipe_core::Image16;
//!
//! let mut ct = ColorTransform::new();
//! ct.set_gamma(1.0).unwrap();
//! ct.set_output_depth(OutputDepth::Sixteen).unwrap();
//!
//! let src = Image16::new(64, 64, 4);
//! let out = ct.render(&src, None).unwrap();
//! assert_eq!(out.dimensions(), (64, 64));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cms;
pub mod cpu;
pub mod engine;
mod error;
pub mod histogram;
pub mod kernel;
pub mod lut;
pub mod settings;

pub use cms::{CmsHandle, ColorManagement, IdentityCms, MatrixCms};
pub use cpu::CapabilityTier;
pub use engine::{ColorTransform, RenderedImage};
pub use error::{ColorError, ColorResult};
pub use histogram::Histogram;
pub use kernel::{KernelEntry, KernelFn, KernelKey, KernelParams, KernelRegistry, OutputDepth};
pub use lut::{ToneTables, LUT_SIZE};
pub use rawpipe_math::ColorMatrix;
pub use settings::TransformSettings;
