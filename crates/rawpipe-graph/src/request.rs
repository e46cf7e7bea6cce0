//! What a consumer asks a node for.

use crate::value::{Properties, Value};
use rawpipe_core::Rect;

/// Request travelling upstream through the graph.
///
/// An absent region of interest means the full frame. `quick` asks for a
/// fast provisional result (e.g. while a slider is being dragged).
///
/// # Example
///
/// ```rust
/// use rawpipe_graph::FilterRequest;
/// use rawpipe_core::Rect;
///
/// let req = FilterRequest::new()
///     .with_roi(Rect::new(0, 0, 64, 64))
///     .with_quick(true)
///     .with_property("preview", true);
/// assert!(req.is_quick());
/// assert_eq!(req.roi(), Some(Rect::new(0, 0, 64, 64)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRequest {
    roi: Option<Rect>,
    quick: bool,
    properties: Properties,
}

impl FilterRequest {
    /// Full-frame, full-quality request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the region of interest.
    pub fn with_roi(mut self, roi: Rect) -> Self {
        self.roi = Some(roi);
        self
    }

    /// Sets the quick flag.
    pub fn with_quick(mut self, quick: bool) -> Self {
        self.quick = quick;
        self
    }

    /// Adds a property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Region of interest; `None` is the full frame.
    #[inline]
    pub fn roi(&self) -> Option<Rect> {
        self.roi
    }

    /// Replaces the region of interest.
    pub fn set_roi(&mut self, roi: Option<Rect>) {
        self.roi = roi;
    }

    /// Returns `true` for a quick (provisional) request.
    #[inline]
    pub fn is_quick(&self) -> bool {
        self.quick
    }

    /// Sets the quick flag.
    pub fn set_quick(&mut self, quick: bool) {
        self.quick = quick;
    }

    /// Property by name.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Inserts a property.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// All properties.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_independent() {
        let a = FilterRequest::new()
            .with_roi(Rect::new(1, 1, 5, 5))
            .with_property("k", 1i64);
        let mut b = a.clone();
        b.set_roi(None);
        b.set_quick(true);
        b.set_property("k", 2i64);
        assert_eq!(a.roi(), Some(Rect::new(1, 1, 5, 5)));
        assert!(!a.is_quick());
        assert_eq!(a.property("k"), Some(&Value::Int(1)));
        assert_eq!(b.property("k"), Some(&Value::Int(2)));
    }
}
