//! Dynamically typed property values.
//!
//! Requests, responses and filters exchange loosely typed parameters through
//! a [`Properties`] map of [`Value`]s. Strongly typed filter APIs remain the
//! primary configuration path; properties serve generic tooling and
//! recursive lookups along a chain.
//!
//! # Example
//!
//! ```rust
//! use rawpipe_graph::Value;
//!
//! let v = Value::from(2.2f32);
//! assert_eq!(v.as_f32(), Some(2.2));
//! assert_eq!(Value::Int(3).as_f64(), Some(3.0));
//! ```

use rawpipe_core::{Rect, SharedImage16, SharedImage8};
use std::collections::HashMap;
use std::fmt;

/// Open property map.
pub type Properties = HashMap<String, Value>;

/// A property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Rectangle.
    Rect(Rect),
    /// List of floats (matrices, curves, multipliers).
    FloatList(Vec<f32>),
    /// Shared 16-bit image.
    Image16(SharedImage16),
    /// Shared 8-bit image.
    Image8(SharedImage8),
}

/// Discriminant of a [`Value`], used in property tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`]
    Int,
    /// [`Value::Float`]
    Float,
    /// [`Value::Str`]
    Str,
    /// [`Value::Rect`]
    Rect,
    /// [`Value::FloatList`]
    FloatList,
    /// [`Value::Image16`]
    Image16,
    /// [`Value::Image8`]
    Image8,
}

impl Value {
    /// Kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::Rect(_) => ValueKind::Rect,
            Self::FloatList(_) => ValueKind::FloatList,
            Self::Image16(_) => ValueKind::Image16,
            Self::Image8(_) => ValueKind::Image8,
        }
    }

    /// Boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value; integers are converted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Float value narrowed to `f32`.
    pub fn as_f32(&self) -> Option<f32> {
        self.as_f64().map(|v| v as f32)
    }

    /// String value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Rectangle value.
    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            Self::Rect(v) => Some(*v),
            _ => None,
        }
    }

    /// Float list.
    pub fn as_float_list(&self) -> Option<&[f32]> {
        match self {
            Self::FloatList(v) => Some(v),
            _ => None,
        }
    }

    /// 16-bit image.
    pub fn as_image16(&self) -> Option<&SharedImage16> {
        match self {
            Self::Image16(v) => Some(v),
            _ => None,
        }
    }

    /// 8-bit image.
    pub fn as_image8(&self) -> Option<&SharedImage8> {
        match self {
            Self::Image8(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Rect> for Value {
    fn from(v: Rect) -> Self {
        Self::Rect(v)
    }
}

impl From<Vec<f32>> for Value {
    fn from(v: Vec<f32>) -> Self {
        Self::FloatList(v)
    }
}

impl From<SharedImage16> for Value {
    fn from(v: SharedImage16) -> Self {
        Self::Image16(v)
    }
}

impl From<SharedImage8> for Value {
    fn from(v: SharedImage8) -> Self {
        Self::Image8(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "{:?}", v),
            Self::Rect(v) => write!(f, "{}", v),
            Self::FloatList(v) => write!(f, "{:?}", v),
            Self::Image16(img) => write!(f, "<image16 {}x{}>", img.width(), img.height()),
            Self::Image8(img) => write!(f, "<image8 {}x{}>", img.width(), img.height()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawpipe_core::Image16;
    use std::sync::Arc;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(Rect::new(1, 2, 3, 4)).as_rect(), Some(Rect::new(1, 2, 3, 4)));
        assert_eq!(Value::Str("1".into()).as_f64(), None);
        assert_eq!(Value::from(vec![1.0f32]).as_float_list(), Some(&[1.0f32][..]));
        assert_eq!(Value::Float(1.0).kind(), ValueKind::Float);
    }

    #[test]
    fn test_image_display() {
        let v = Value::from(Arc::new(Image16::new(3, 2, 4)));
        assert_eq!(v.to_string(), "<image16 3x2>");
        assert_eq!(v.kind(), ValueKind::Image16);
    }
}
