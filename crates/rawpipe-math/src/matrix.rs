//! Color matrix applied after premultiplication.
//!
//! A [`ColorMatrix`] is either 3x3 (camera RGB to output RGB) or 4x4, where
//! the fourth input is the second green channel of a 4-color sensor. Both
//! are stored as a 4x4 row-major array; a 3x3 matrix has a zero fourth
//! column and an identity fourth row.
//!
//! # Usage
//!
//! ```rust
//! use rawpipe_math::ColorMatrix;
//!
//! let m = ColorMatrix::from_rows3([
//!     [2.0, 0.0, 0.0],
//!     [0.0, 1.0, 0.0],
//!     [0.0, 0.0, 0.5],
//! ]);
//! assert_eq!(m.apply([1.0, 1.0, 1.0, 0.0]), [2.0, 1.0, 0.5]);
//! ```

use std::ops::Mul;

/// 3x3 or 4x4 color matrix, row-major, column vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    rows: [[f32; 4]; 4],
    four_channel: bool,
}

impl ColorMatrix {
    /// Identity (3x3).
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
        four_channel: false,
    };

    /// Creates a 3x3 matrix from rows.
    pub const fn from_rows3(r: [[f32; 3]; 3]) -> Self {
        Self {
            rows: [
                [r[0][0], r[0][1], r[0][2], 0.0],
                [r[1][0], r[1][1], r[1][2], 0.0],
                [r[2][0], r[2][1], r[2][2], 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            four_channel: false,
        }
    }

    /// Creates a 4x4 matrix from rows.
    pub const fn from_rows4(rows: [[f32; 4]; 4]) -> Self {
        Self {
            rows,
            four_channel: true,
        }
    }

    /// Creates a matrix from 9 (3x3) or 16 (4x4) row-major values.
    ///
    /// Returns `None` for any other length or non-finite values.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        match values.len() {
            9 => Some(Self::from_rows3([
                [values[0], values[1], values[2]],
                [values[3], values[4], values[5]],
                [values[6], values[7], values[8]],
            ])),
            16 => {
                let mut rows = [[0.0; 4]; 4];
                for (i, row) in rows.iter_mut().enumerate() {
                    row.copy_from_slice(&values[i * 4..i * 4 + 4]);
                }
                Some(Self::from_rows4(rows))
            }
            _ => None,
        }
    }

    /// Flattens back to 9 or 16 row-major values.
    pub fn to_vec(&self) -> Vec<f32> {
        if self.four_channel {
            self.rows.iter().flatten().copied().collect()
        } else {
            self.rows[..3].iter().flat_map(|r| r[..3].to_vec()).collect()
        }
    }

    /// Returns `true` for a 4x4 matrix.
    #[inline]
    pub fn is_four_channel(&self) -> bool {
        self.four_channel
    }

    /// Row `i` as four coefficients.
    #[inline]
    pub fn row(&self, i: usize) -> [f32; 4] {
        self.rows[i]
    }

    /// All four rows.
    #[inline]
    pub fn rows(&self) -> &[[f32; 4]; 4] {
        &self.rows
    }

    /// Returns `true` if this is the identity transform.
    pub fn is_identity(&self) -> bool {
        self.rows == Self::IDENTITY.rows
    }

    /// Maps `(r, g, b, g2)` to output RGB.
    #[inline]
    pub fn apply(&self, v: [f32; 4]) -> [f32; 3] {
        let m = &self.rows;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2] + m[0][3] * v[3],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2] + m[1][3] * v[3],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2] + m[2][3] * v[3],
        ]
    }

    /// Composes `other` after `self`: `other * self`.
    pub fn then(&self, other: &Self) -> Self {
        let m = other.to_glam() * self.to_glam();
        Self::from_glam(m, self.four_channel || other.four_channel)
    }

    /// Inverse matrix, or `None` if singular.
    pub fn inverse(&self) -> Option<Self> {
        let m = self.to_glam();
        if m.determinant().abs() < 1e-10 {
            return None;
        }
        Some(Self::from_glam(m.inverse(), self.four_channel))
    }

    /// Converts to glam Mat4 (column-major).
    pub fn to_glam(&self) -> glam::Mat4 {
        glam::Mat4::from_cols_array_2d(&self.rows).transpose()
    }

    fn from_glam(m: glam::Mat4, four_channel: bool) -> Self {
        Self {
            rows: m.transpose().to_cols_array_2d(),
            four_channel,
        }
    }
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// A * B
impl Mul for ColorMatrix {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        rhs.then(&self)
    }
}
