//! Pixel kernels and the capability-indexed kernel registry.
//!
//! A kernel maps rows of interleaved 16-bit source pixels to packed RGB
//! output:
//!
//! ```text
//! per pixel: premultiply -> clamp [0, 65535] -> matrix -> clamp -> LUT
//!            (or LUT16 -> staging row -> CMS handle)
//! ```
//!
//! Every `{depth, cms}` combination has a portable scalar reference kernel.
//! Vectorized variants ([`wide`] `f32x4` / `f32x8`) are registered for the
//! non-CMS combinations and produce identical output.
//!
//! # Selection
//!
//! ```rust
//! use rawpipe_color::{CapabilityTier, KernelKey, KernelRegistry, OutputDepth};
//!
//! let registry = KernelRegistry::builtin();
//! let key = KernelKey::new(OutputDepth::Eight, false);
//! let k = registry.select(key, CapabilityTier::Baseline).unwrap();
//! assert_eq!(k.tier, CapabilityTier::Baseline);
//! ```

pub mod scalar;
pub mod vector;

use crate::cms::ColorManagement;
use crate::{CapabilityTier, ColorError, ColorResult};
use rawpipe_math::ColorMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use wide::{f32x4, f32x8};

/// Output sample depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputDepth {
    /// 8 bits per channel, gamma encoded (preview).
    #[default]
    Eight,
    /// 16 bits per channel, linear.
    Sixteen,
}

impl OutputDepth {
    /// Bits per sample.
    pub fn bits(&self) -> u32 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }
}

impl fmt::Display for OutputDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Registry key: output depth and whether a CMS handle is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelKey {
    /// Output depth.
    pub depth: OutputDepth,
    /// CMS staging.
    pub cms: bool,
}

impl KernelKey {
    /// Creates a key.
    pub const fn new(depth: OutputDepth, cms: bool) -> Self {
        Self { depth, cms }
    }
}

impl fmt::Display for KernelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.depth, if self.cms { "+cms" } else { "" })
    }
}

/// Engine state visible to kernels for one render call.
#[derive(Clone, Copy)]
pub struct KernelParams<'a> {
    /// Interleaved channels per source pixel (3 or 4).
    pub src_channels: usize,
    /// Per-channel multipliers `[r, g, b, g2]`.
    pub premultipliers: [f32; 4],
    /// Color matrix.
    pub matrix: &'a ColorMatrix,
    /// 8-bit output table.
    pub lut8: &'a [u8],
    /// 16-bit output table.
    pub lut16: &'a [u16],
    /// Attached color management, if any.
    pub cms: Option<&'a dyn ColorManagement>,
}

/// Kernel writing 8-bit RGB:
/// `(width, height, src, src_stride, dst, dst_stride, params)`.
///
/// Strides are in samples. Row `y` of the source starts at
/// `src[y * src_stride]`, row `y` of the destination at `dst[y * dst_stride]`.
pub type Kernel8 = fn(usize, usize, &[u16], usize, &mut [u8], usize, &KernelParams<'_>);

/// Kernel writing 16-bit RGB; same layout as [`Kernel8`].
pub type Kernel16 = fn(usize, usize, &[u16], usize, &mut [u16], usize, &KernelParams<'_>);

/// Kernel function pointer, tagged by output depth.
#[derive(Clone, Copy)]
pub enum KernelFn {
    /// 8-bit output.
    Eight(Kernel8),
    /// 16-bit output.
    Sixteen(Kernel16),
}

impl KernelFn {
    /// Depth written by this kernel.
    pub fn depth(&self) -> OutputDepth {
        match self {
            Self::Eight(_) => OutputDepth::Eight,
            Self::Sixteen(_) => OutputDepth::Sixteen,
        }
    }
}

impl fmt::Debug for KernelFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KernelFn({})", self.depth())
    }
}

/// A registered kernel.
#[derive(Debug, Clone, Copy)]
pub struct KernelEntry {
    /// Name for logs and benches.
    pub name: &'static str,
    /// Combination this kernel serves.
    pub key: KernelKey,
    /// Minimum CPU tier.
    pub tier: CapabilityTier,
    /// Entry point.
    pub run: KernelFn,
}

/// Maps `{depth, cms}` keys to tiered kernels.
#[derive(Debug, Default, Clone)]
pub struct KernelRegistry {
    entries: Vec<KernelEntry>,
}

impl KernelRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all built-in kernels.
    pub fn with_builtins() -> Self {
        use CapabilityTier::*;
        use OutputDepth::*;

        let entries = vec![
            entry("scalar-8", Eight, false, Baseline, KernelFn::Eight(scalar::eight)),
            entry("scalar-16", Sixteen, false, Baseline, KernelFn::Sixteen(scalar::sixteen)),
            entry("scalar-8-cms", Eight, true, Baseline, KernelFn::Eight(scalar::eight_cms)),
            entry("scalar-16-cms", Sixteen, true, Baseline, KernelFn::Sixteen(scalar::sixteen_cms)),
            entry("f32x4-8", Eight, false, Vector128, KernelFn::Eight(vector::eight::<f32x4>)),
            entry("f32x4-16", Sixteen, false, Vector128, KernelFn::Sixteen(vector::sixteen::<f32x4>)),
            entry("f32x8-8", Eight, false, Vector256, KernelFn::Eight(vector::eight::<f32x8>)),
            entry("f32x8-16", Sixteen, false, Vector256, KernelFn::Sixteen(vector::sixteen::<f32x8>)),
        ];
        Self { entries }
    }

    /// Shared registry with the built-in kernels.
    pub fn builtin() -> Arc<Self> {
        static INSTANCE: OnceLock<Arc<KernelRegistry>> = OnceLock::new();
        INSTANCE.get_or_init(|| Arc::new(Self::with_builtins())).clone()
    }

    /// Adds a kernel.
    ///
    /// # Errors
    ///
    /// [`ColorError::KernelMismatch`] if the function's depth differs from
    /// the key's.
    pub fn register(&mut self, entry: KernelEntry) -> ColorResult<()> {
        if entry.run.depth() != entry.key.depth {
            return Err(ColorError::KernelMismatch {
                name: entry.name,
                key: entry.key,
            });
        }
        tracing::debug!(name = entry.name, key = %entry.key, tier = %entry.tier, "register kernel");
        self.entries.push(entry);
        Ok(())
    }

    /// All entries in registration order.
    pub fn entries(&self) -> &[KernelEntry] {
        &self.entries
    }

    /// Picks the most capable kernel for `key` that runs at `tier`.
    ///
    /// # Errors
    ///
    /// [`ColorError::NoReferenceKernel`] if `key` has no baseline kernel.
    pub fn select(&self, key: KernelKey, tier: CapabilityTier) -> ColorResult<&KernelEntry> {
        let mut candidates = self.entries.iter().filter(|e| e.key == key);
        if !candidates.clone().any(|e| e.tier == CapabilityTier::Baseline) {
            return Err(ColorError::NoReferenceKernel(key));
        }
        candidates
            .by_ref()
            .filter(|e| e.tier <= tier)
            .max_by_key(|e| e.tier)
            .ok_or(ColorError::NoReferenceKernel(key))
    }
}

fn entry(
    name: &'static str,
    depth: OutputDepth,
    cms: bool,
    tier: CapabilityTier,
    run: KernelFn,
) -> KernelEntry {
    KernelEntry {
        name,
        key: KernelKey::new(depth, cms),
        tier,
        run,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_combination_has_reference() {
        let reg = KernelRegistry::with_builtins();
        for depth in [OutputDepth::Eight, OutputDepth::Sixteen] {
            for cms in [false, true] {
                let k = reg.select(KernelKey::new(depth, cms), CapabilityTier::Baseline).unwrap();
                assert_eq!(k.tier, CapabilityTier::Baseline);
                assert_eq!(k.run.depth(), depth);
            }
        }
    }

    #[test]
    fn test_select_most_capable() {
        let reg = KernelRegistry::with_builtins();
        let key = KernelKey::new(OutputDepth::Eight, false);
        assert_eq!(reg.select(key, CapabilityTier::Vector128).unwrap().name, "f32x4-8");
        assert_eq!(reg.select(key, CapabilityTier::Vector256).unwrap().name, "f32x8-8");
        // CMS kernels are scalar only
        let cms = KernelKey::new(OutputDepth::Sixteen, true);
        assert_eq!(reg.select(cms, CapabilityTier::Vector256).unwrap().name, "scalar-16-cms");
    }

    #[test]
    fn test_missing_reference_is_error() {
        let mut reg = KernelRegistry::new();
        reg.register(entry(
            "f32x4-8",
            OutputDepth::Eight,
            false,
            CapabilityTier::Vector128,
            KernelFn::Eight(vector::eight::<f32x4>),
        ))
        .unwrap();
        let err = reg
            .select(KernelKey::new(OutputDepth::Eight, false), CapabilityTier::Vector256)
            .unwrap_err();
        assert!(matches!(err, ColorError::NoReferenceKernel(_)));
    }

    #[test]
    fn test_register_rejects_depth_mismatch() {
        let mut reg = KernelRegistry::new();
        let bad = entry(
            "bad",
            OutputDepth::Sixteen,
            false,
            CapabilityTier::Baseline,
            KernelFn::Eight(scalar::eight),
        );
        assert!(matches!(reg.register(bad), Err(ColorError::KernelMismatch { .. })));
    }
}
