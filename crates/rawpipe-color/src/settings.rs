//! Serializable transform parameters.
//!
//! # Example
//!
//! ```rust
//! use rawpipe_color::TransformSettings;
//!
//! let yaml = "gamma: 1.8\ncontrast: 1.2\ncurve: [[0.0, 0.0], [0.5, 0.6], [1.0, 1.0]]\n";
//! let s = TransformSettings::from_yaml(yaml).unwrap();
//! assert_eq!(s.gamma, 1.8);
//! assert_eq!(s.premultipliers, [1.0; 4]);
//! ```

use crate::{ColorError, ColorResult, OutputDepth};
use rawpipe_math::ColorMatrix;
use serde::{Deserialize, Serialize};

/// Default display gamma.
pub const DEFAULT_GAMMA: f32 = 2.2;

/// Parameters of a [`ColorTransform`](crate::ColorTransform).
///
/// Missing fields take their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Display gamma (> 0).
    pub gamma: f32,
    /// Contrast around mid-grey (> 0).
    pub contrast: f32,
    /// Per-channel multipliers `[r, g, b, g2]` (> 0).
    pub premultipliers: [f32; 4],
    /// Row-major color matrix, 9 or 16 values.
    pub matrix: Vec<f32>,
    /// Tone-curve knots `[x, y]`; empty for identity.
    pub curve: Vec<[f32; 2]>,
    /// Output depth.
    pub output_depth: OutputDepth,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            contrast: 1.0,
            premultipliers: [1.0; 4],
            matrix: ColorMatrix::IDENTITY.to_vec(),
            curve: Vec::new(),
            output_depth: OutputDepth::Eight,
        }
    }
}

impl TransformSettings {
    /// Parses YAML.
    pub fn from_yaml(s: &str) -> ColorResult<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Serializes to YAML.
    pub fn to_yaml(&self) -> ColorResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Matrix as a [`ColorMatrix`].
    pub fn color_matrix(&self) -> ColorResult<ColorMatrix> {
        ColorMatrix::from_slice(&self.matrix).ok_or_else(|| ColorError::invalid("matrix", &self.matrix))
    }

    /// Curve knots as tuples.
    pub fn knots(&self) -> Vec<(f32, f32)> {
        self.curve.iter().map(|k| (k[0], k[1])).collect()
    }
}
