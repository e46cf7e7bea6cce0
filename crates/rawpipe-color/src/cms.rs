//! Color-management staging.
//!
//! When a [`ColorManagement`] handle is attached to a
//! [`ColorTransform`](crate::ColorTransform), kernels write each row through
//! the 16-bit table into a staging buffer and hand it to the handle, which
//! produces the final output samples. Profile parsing lives outside this
//! crate; a handle is an already-built transform.

use rawpipe_math::ColorMatrix;
use std::fmt;
use std::sync::Arc;

/// An opaque, thread-safe RGB transform.
///
/// Buffers hold packed RGB triplets for one row: `src.len() == dst.len()`
/// and both are multiples of 3.
pub trait ColorManagement: Send + Sync + fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &str {
        "cms"
    }

    /// Transforms 16-bit RGB into 16-bit RGB.
    fn transform_rgb16(&self, src: &[u16], dst: &mut [u16]);

    /// Transforms 16-bit RGB into 8-bit RGB.
    fn transform_rgb16_to_8(&self, src: &[u16], dst: &mut [u8]);
}

/// Shared handle to a color-management transform.
pub type CmsHandle = Arc<dyn ColorManagement>;

/// Scales a 16-bit sample to 8 bits with rounding.
#[inline]
pub fn to_u8(v: u16) -> u8 {
    ((v as u32 * 255 + 32767) / 65535) as u8
}

/// Pass-through transform.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityCms;

impl ColorManagement for IdentityCms {
    fn name(&self) -> &str {
        "identity"
    }

    fn transform_rgb16(&self, src: &[u16], dst: &mut [u16]) {
        dst.copy_from_slice(src);
    }

    fn transform_rgb16_to_8(&self, src: &[u16], dst: &mut [u8]) {
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = to_u8(s);
        }
    }
}

/// Linear matrix transform in normalized RGB, for display-space conversion
/// between two matrix-shaper profiles.
#[derive(Debug, Clone)]
pub struct MatrixCms {
    matrix: ColorMatrix,
}

impl MatrixCms {
    /// Creates a transform applying `matrix` to normalized RGB.
    pub fn new(matrix: ColorMatrix) -> Self {
        Self { matrix }
    }

    /// Matrix in use.
    pub fn matrix(&self) -> &ColorMatrix {
        &self.matrix
    }

    #[inline]
    fn map(&self, px: &[u16]) -> [f32; 3] {
        let scale = 1.0 / 65535.0;
        let out = self.matrix.apply([
            px[0] as f32 * scale,
            px[1] as f32 * scale,
            px[2] as f32 * scale,
            0.0,
        ]);
        out.map(|v| v.clamp(0.0, 1.0))
    }
}

impl ColorManagement for MatrixCms {
    fn name(&self) -> &str {
        "matrix"
    }

    fn transform_rgb16(&self, src: &[u16], dst: &mut [u16]) {
        for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
            let rgb = self.map(s);
            for c in 0..3 {
                d[c] = (rgb[c] * 65535.0).round() as u16;
            }
        }
    }

    fn transform_rgb16_to_8(&self, src: &[u16], dst: &mut [u8]) {
        for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
            let rgb = self.map(s);
            for c in 0..3 {
                d[c] = (rgb[c] * 255.0).round() as u8;
            }
        }
    }
}
