//! SIMD helpers for structure-of-arrays pixel math.
//!
//! Uses the `wide` crate for portable SIMD on stable Rust. Pixel kernels
//! gather N pixels into one register per channel, run the
//! premultiply/clamp/matrix chain lane-wise and scatter the results back.
//!
//! Every operation here performs the same IEEE operations, in the same
//! order, as the scalar path (separate multiply and add, no fused
//! multiply-add), so vector and scalar results are bit-identical.
//!
//! # Example
//!
//! ```rust
//! use rawpipe_math::simd::{Lanes, matrix_row};
//! use wide::f32x4;
//!
//! let r = f32x4::splat(1.0);
//! let g = f32x4::splat(2.0);
//! let b = f32x4::splat(3.0);
//! let g2 = f32x4::splat(0.0);
//! let out = matrix_row([1.0, 1.0, 1.0, 0.0], r, g, b, g2);
//! assert_eq!(out.to_array()[0], 6.0);
//! ```

use std::ops::{Add, Mul};
use wide::{f32x4, f32x8};

/// A vector of `f32` lanes.
pub trait Lanes: Copy + Add<Output = Self> + Mul<Output = Self> {
    /// Number of lanes.
    const LANES: usize;

    /// Broadcasts `v` to every lane.
    fn splat(v: f32) -> Self;

    /// Loads `LANES` values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() < LANES`.
    fn load(values: &[f32]) -> Self;

    /// Stores `LANES` values into `out`.
    fn store(self, out: &mut [f32]);

    /// Lane-wise minimum.
    fn min(self, rhs: Self) -> Self;

    /// Lane-wise maximum.
    fn max(self, rhs: Self) -> Self;
}

impl Lanes for f32x4 {
    const LANES: usize = 4;

    #[inline]
    fn splat(v: f32) -> Self {
        f32x4::splat(v)
    }

    #[inline]
    fn load(values: &[f32]) -> Self {
        let arr: [f32; 4] = [values[0], values[1], values[2], values[3]];
        f32x4::from(arr)
    }

    #[inline]
    fn store(self, out: &mut [f32]) {
        out[..4].copy_from_slice(&self.to_array());
    }

    #[inline]
    fn min(self, rhs: Self) -> Self {
        f32x4::min(self, rhs)
    }

    #[inline]
    fn max(self, rhs: Self) -> Self {
        f32x4::max(self, rhs)
    }
}

impl Lanes for f32x8 {
    const LANES: usize = 8;

    #[inline]
    fn splat(v: f32) -> Self {
        f32x8::splat(v)
    }

    #[inline]
    fn load(values: &[f32]) -> Self {
        let mut arr = [0.0f32; 8];
        arr.copy_from_slice(&values[..8]);
        f32x8::from(arr)
    }

    #[inline]
    fn store(self, out: &mut [f32]) {
        out[..8].copy_from_slice(&self.to_array());
    }

    #[inline]
    fn min(self, rhs: Self) -> Self {
        f32x8::min(self, rhs)
    }

    #[inline]
    fn max(self, rhs: Self) -> Self {
        f32x8::max(self, rhs)
    }
}

/// Clamps every lane to `[lo, hi]`.
#[inline]
pub fn clamp<L: Lanes>(v: L, lo: f32, hi: f32) -> L {
    v.max(L::splat(lo)).min(L::splat(hi))
}

/// Dot product of one matrix row with `(r, g, b, g2)`, lane-wise.
///
/// Evaluated left to right: `((m0*r + m1*g) + m2*b) + m3*g2`.
#[inline]
pub fn matrix_row<L: Lanes>(row: [f32; 4], r: L, g: L, b: L, g2: L) -> L {
    L::splat(row[0]) * r + L::splat(row[1]) * g + L::splat(row[2]) * b + L::splat(row[3]) * g2
}

/// Applies slope and offset to a slice in place: `v = v * slope + offset`.
///
/// Processes 8 values at a time, with scalar fallback for the tail.
pub fn mul_add_in_place(values: &mut [f32], slope: f32, offset: f32) {
    let s = f32x8::splat(slope);
    let o = f32x8::splat(offset);
    let mut chunks = values.chunks_exact_mut(8);
    for chunk in &mut chunks {
        let v = <f32x8 as Lanes>::load(chunk);
        (v * s + o).store(chunk);
    }
    for v in chunks.into_remainder() {
        *v = *v * slope + offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_x4() {
        let v = f32x4::from([-1.0, 0.5, 2.0, 70000.0]);
        let c = clamp(v, 0.0, 65535.0).to_array();
        assert_eq!(c, [0.0, 0.5, 2.0, 65535.0]);
    }

    #[test]
    fn test_matrix_row_matches_scalar() {
        let row = [0.7, 0.2, 0.1, 0.05];
        let rs = [0.1f32, 0.3, 0.5, 0.7, 0.9, 0.2, 0.4, 0.6];
        let gs = [0.2f32, 0.4, 0.6, 0.8, 0.1, 0.3, 0.5, 0.7];
        let bs = [0.9f32, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2];
        let g2 = [0.5f32; 8];
        let out = matrix_row(
            row,
            <f32x8 as Lanes>::load(&rs),
            <f32x8 as Lanes>::load(&gs),
            <f32x8 as Lanes>::load(&bs),
            <f32x8 as Lanes>::load(&g2),
        )
        .to_array();
        for i in 0..8 {
            let scalar = row[0] * rs[i] + row[1] * gs[i] + row[2] * bs[i] + row[3] * g2[i];
            assert_eq!(out[i].to_bits(), scalar.to_bits());
        }
    }

    #[test]
    fn test_mul_add_in_place_tail() {
        let mut v: Vec<f32> = (0..11).map(|i| i as f32).collect();
        mul_add_in_place(&mut v, 2.0, 1.0);
        assert_eq!(v[0], 1.0);
        assert_eq!(v[10], 21.0);
    }
}
