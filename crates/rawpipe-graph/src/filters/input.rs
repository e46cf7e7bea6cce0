//! Root producer.

use super::impl_any;
use crate::change::ChangeMask;
use crate::filter::{Filter, PropertySpec, PropertyWrite, Upstream};
use crate::request::FilterRequest;
use crate::response::FilterResponse;
use crate::value::{Value, ValueKind};
use rawpipe_core::SharedImage16;
use std::sync::Arc;

const PROPERTIES: &[PropertySpec] = &[
    PropertySpec::rw("image", ValueKind::Image16),
    PropertySpec::ro("width", ValueKind::Int),
    PropertySpec::ro("height", ValueKind::Int),
];

/// Holds a decoded 16-bit image and serves it to the graph.
///
/// The whole image is returned regardless of the requested region.
#[derive(Debug, Default, Clone)]
pub struct InputImage16 {
    image: Option<SharedImage16>,
}

impl InputImage16 {
    /// Registry name.
    pub const NAME: &'static str = "InputImage16";

    /// Producer for `image`.
    pub fn new(image: SharedImage16) -> Self {
        Self { image: Some(image) }
    }

    /// Current image.
    pub fn image(&self) -> Option<&SharedImage16> {
        self.image.as_ref()
    }

    /// Replaces the image; returns the change to notify.
    pub fn set_image(&mut self, image: Option<SharedImage16>) -> ChangeMask {
        let same = match (&self.image, &image) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return ChangeMask::NONE;
        }
        self.image = image;
        ChangeMask::DIMENSION
    }
}

impl Filter for InputImage16 {
    fn type_name(&self) -> &'static str {
        Self::NAME
    }

    fn get_image(&mut self, _upstream: &Upstream, _request: &FilterRequest) -> FilterResponse {
        self.image
            .as_ref()
            .map_or_else(FilterResponse::empty, |img| FilterResponse::with_image(img.clone()))
    }

    fn get_image8(&mut self, _upstream: &Upstream, _request: &FilterRequest) -> FilterResponse {
        let mut resp = FilterResponse::empty();
        if let Some(img) = &self.image {
            let (w, h) = img.dimensions();
            resp.set_dimensions(w, h);
        }
        resp
    }

    fn get_size(&mut self, _upstream: &Upstream, _request: &FilterRequest) -> (u32, u32) {
        self.image.as_ref().map_or((0, 0), |img| img.dimensions())
    }

    fn property_specs(&self) -> &'static [PropertySpec] {
        PROPERTIES
    }

    fn set_property(&mut self, name: &str, value: &Value) -> PropertyWrite {
        match (name, value) {
            ("image", Value::Image16(img)) => match self.set_image(Some(img.clone())) {
                ChangeMask::NONE => PropertyWrite::Unchanged,
                mask => PropertyWrite::Changed(mask),
            },
            ("image", other) => PropertyWrite::Rejected(format!("expected image16, got {}", other)),
            _ => PropertyWrite::Unknown,
        }
    }

    fn property(&self, name: &str) -> Option<Value> {
        let img = self.image.as_ref();
        match name {
            "image" => img.map(|i| Value::Image16(i.clone())),
            "width" => img.map(|i| Value::from(i.width())),
            "height" => img.map(|i| Value::from(i.height())),
            _ => None,
        }
    }

    impl_any!();
}
