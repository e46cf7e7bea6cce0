//! Gamma / tone-curve / contrast lookup tables.
//!
//! Both tables are indexed by a 16-bit linear level (the output of the
//! premultiply and matrix stage). For each level `n`:
//!
//! ```text
//! v = (n / 65535) ^ (1 / gamma)        encode
//! v = curve[round(v * 65535)]          tone curve
//! v = v * contrast + (0.5 - contrast/2) contrast around mid-grey
//! lut8[n]  = clamp(round(v * 255))
//! lut16[n] = clamp(round(max(v, 0) ^ gamma * 65535))
//! ```
//!
//! The 16-bit table re-applies gamma so its output stays linear.

use rayon::prelude::*;
use std::fmt;

/// Number of entries per table (one per 16-bit level).
pub const LUT_SIZE: usize = 65536;

/// 8-bit and 16-bit output tables for one parameter set.
#[derive(Clone, PartialEq)]
pub struct ToneTables {
    lut8: Vec<u8>,
    lut16: Vec<u16>,
}

impl ToneTables {
    /// Builds both tables.
    ///
    /// `curve` must hold [`LUT_SIZE`] samples in [0, 1]. `gamma` and
    /// `contrast` must be positive and finite; callers validate them.
    pub fn generate(gamma: f32, contrast: f32, curve: &[f32]) -> Self {
        debug_assert_eq!(curve.len(), LUT_SIZE);
        let gamma = gamma as f64;
        let contrast = contrast as f64;
        let inv_gamma = 1.0 / gamma;
        let offset = 0.5 - contrast / 2.0;
        let last = (curve.len() - 1) as f64;

        let shaped: Vec<f64> = (0..LUT_SIZE)
            .into_par_iter()
            .map(|n| {
                let v = (n as f64 / 65535.0).powf(inv_gamma);
                let idx = (v * last).round().clamp(0.0, last) as usize;
                curve[idx] as f64 * contrast + offset
            })
            .collect();

        let lut8 = shaped
            .par_iter()
            .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect();
        let lut16 = shaped
            .par_iter()
            .map(|&v| (v.max(0.0).powf(gamma) * 65535.0).round().clamp(0.0, 65535.0) as u16)
            .collect();

        Self { lut8, lut16 }
    }

    /// 8-bit display table.
    #[inline]
    pub fn lut8(&self) -> &[u8] {
        &self.lut8
    }

    /// 16-bit linear table.
    #[inline]
    pub fn lut16(&self) -> &[u16] {
        &self.lut16
    }
}

impl fmt::Debug for ToneTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToneTables")
            .field("lut8[0]", &self.lut8[0])
            .field("lut8[max]", &self.lut8[LUT_SIZE - 1])
            .field("lut16[0]", &self.lut16[0])
            .field("lut16[max]", &self.lut16[LUT_SIZE - 1])
            .finish()
    }
}
