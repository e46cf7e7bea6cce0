//! Change notifications.
//!
//! A [`ChangeMask`] tells downstream nodes what kind of upstream change
//! happened. A dimension change always implies a pixel-data change:
//!
//! ```rust
//! use rawpipe_graph::ChangeMask;
//!
//! assert!(ChangeMask::DIMENSION.contains(ChangeMask::PIXELDATA));
//! assert!(!ChangeMask::PIXELDATA.contains(ChangeMask::DIMENSION));
//! ```

use crate::NodeId;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Set of change flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChangeMask(u32);

impl ChangeMask {
    /// No change.
    pub const NONE: Self = Self(0);
    /// Pixel values changed.
    pub const PIXELDATA: Self = Self(1);
    /// Output size changed (implies pixel data).
    pub const DIMENSION: Self = Self(2 | 1);
    /// Color profile changed.
    pub const PROFILE: Self = Self(4);
    /// Everything.
    pub const ALL: Self = Self(7);

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every flag of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if any flag of `other` is set in `self`.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if no flag is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ChangeMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChangeMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for ChangeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::DIMENSION) {
            names.push("DIMENSION");
        } else if self.contains(Self::PIXELDATA) {
            names.push("PIXELDATA");
        }
        if self.contains(Self::PROFILE) {
            names.push("PROFILE");
        }
        if names.is_empty() {
            names.push("NONE");
        }
        write!(f, "ChangeMask({})", names.join(" | "))
    }
}

/// Emitted to observers after a node's downstream has been notified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Node that changed.
    pub node: NodeId,
    /// Its filter type.
    pub type_name: &'static str,
    /// What changed.
    pub mask: ChangeMask,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superset() {
        assert!(ChangeMask::ALL.contains(ChangeMask::DIMENSION));
        assert!((ChangeMask::PIXELDATA | ChangeMask::PROFILE).contains(ChangeMask::PROFILE));
        assert!(!ChangeMask::PROFILE.intersects(ChangeMask::PIXELDATA));
        assert!(ChangeMask::NONE.is_empty());
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", ChangeMask::DIMENSION), "ChangeMask(DIMENSION)");
        assert_eq!(
            format!("{:?}", ChangeMask::PIXELDATA | ChangeMask::PROFILE),
            "ChangeMask(PIXELDATA | PROFILE)"
        );
    }
}
