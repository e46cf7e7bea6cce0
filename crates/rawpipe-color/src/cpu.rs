//! Runtime CPU capability detection.
//!
//! Kernels declare the [`CapabilityTier`] they are tuned for; the registry
//! picks the most capable kernel the running CPU supports. Detection runs
//! once per process and can be capped with the `RAWPIPE_MAX_TIER`
//! environment variable (`baseline`, `vector128`, `vector256`).

use std::fmt;
use std::sync::OnceLock;

/// Environment variable capping the detected tier.
pub const MAX_TIER_ENV: &str = "RAWPIPE_MAX_TIER";

/// SIMD capability tier, ordered from least to most capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CapabilityTier {
    /// Portable scalar code only.
    #[default]
    Baseline,
    /// 128-bit vectors (SSE2, NEON).
    Vector128,
    /// 256-bit vectors (AVX2).
    Vector256,
}

impl CapabilityTier {
    /// All tiers in ascending order.
    pub const ALL: [CapabilityTier; 3] = [Self::Baseline, Self::Vector128, Self::Vector256];

    /// Queries the running CPU.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub fn detect() -> Self {
        if is_x86_feature_detected!("avx2") {
            Self::Vector256
        } else if is_x86_feature_detected!("sse2") {
            Self::Vector128
        } else {
            Self::Baseline
        }
    }

    /// Queries the running CPU.
    #[cfg(target_arch = "aarch64")]
    pub fn detect() -> Self {
        if std::arch::is_aarch64_feature_detected!("neon") {
            Self::Vector128
        } else {
            Self::Baseline
        }
    }

    /// Queries the running CPU.
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    pub fn detect() -> Self {
        Self::Baseline
    }

    /// Detected tier, capped by `RAWPIPE_MAX_TIER`. Cached for the process.
    pub fn detected() -> Self {
        static DETECTED: OnceLock<CapabilityTier> = OnceLock::new();
        *DETECTED.get_or_init(|| {
            let hw = Self::detect();
            let tier = match std::env::var(MAX_TIER_ENV) {
                Ok(value) => match Self::parse(&value) {
                    Some(cap) => hw.min(cap),
                    None => {
                        tracing::warn!(value = %value, "ignoring unknown {}", MAX_TIER_ENV);
                        hw
                    }
                },
                Err(_) => hw,
            };
            tracing::debug!(hardware = %hw, selected = %tier, "CPU capability tier");
            tier
        })
    }

    /// Parses a tier name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" | "scalar" => Some(Self::Baseline),
            "vector128" | "sse2" | "neon" => Some(Self::Vector128),
            "vector256" | "avx2" => Some(Self::Vector256),
            _ => None,
        }
    }

    /// Lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Vector128 => "vector128",
            Self::Vector256 => "vector256",
        }
    }
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
