//! What a node hands back.

use crate::value::{Properties, Value};
use rawpipe_core::{Rect, SharedImage16, SharedImage8};

/// Result of evaluating a node.
///
/// Images are shared and must be treated as immutable. When a region is
/// set, only pixels inside it are valid; the rest of the buffer is stale.
/// `width`/`height` carry the predicted output size even when no image is
/// attached.
#[derive(Debug, Clone, Default)]
pub struct FilterResponse {
    image: Option<SharedImage16>,
    image8: Option<SharedImage8>,
    roi: Option<Rect>,
    quick: bool,
    width: u32,
    height: u32,
    properties: Properties,
}

impl FilterResponse {
    /// Response without image data or size.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Response carrying a 16-bit image; size is taken from the image.
    pub fn with_image(image: SharedImage16) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image: Some(image),
            width,
            height,
            ..Default::default()
        }
    }

    /// Response carrying an 8-bit image; size is taken from the image.
    pub fn with_image8(image: SharedImage8) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image8: Some(image),
            width,
            height,
            ..Default::default()
        }
    }

    /// 16-bit image.
    pub fn image(&self) -> Option<&SharedImage16> {
        self.image.as_ref()
    }

    /// 8-bit image.
    pub fn image8(&self) -> Option<&SharedImage8> {
        self.image8.as_ref()
    }

    /// Takes the 16-bit image out of the response.
    pub fn take_image(&mut self) -> Option<SharedImage16> {
        self.image.take()
    }

    /// Replaces the 16-bit image and updates the size.
    pub fn set_image(&mut self, image: Option<SharedImage16>) {
        if let Some(img) = &image {
            (self.width, self.height) = img.dimensions();
        }
        self.image = image;
    }

    /// Replaces the 8-bit image and updates the size.
    pub fn set_image8(&mut self, image: Option<SharedImage8>) {
        if let Some(img) = &image {
            (self.width, self.height) = img.dimensions();
        }
        self.image8 = image;
    }

    /// Returns `true` if a 16-bit image is attached.
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Returns `true` if an 8-bit image is attached.
    pub fn has_image8(&self) -> bool {
        self.image8.is_some()
    }

    /// Valid region; `None` means the whole image is valid.
    pub fn roi(&self) -> Option<Rect> {
        self.roi
    }

    /// Sets the valid region.
    pub fn set_roi(&mut self, roi: Option<Rect>) {
        self.roi = roi;
    }

    /// Returns `true` if the data is provisional.
    pub fn is_quick(&self) -> bool {
        self.quick
    }

    /// Marks the data provisional.
    pub fn set_quick(&mut self, quick: bool) {
        self.quick = quick;
    }

    /// Predicted (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Sets the predicted size.
    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
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

    /// Copies flags and properties of `other` (not images or size).
    pub fn inherit(&mut self, other: &FilterResponse) {
        self.quick |= other.quick;
        for (k, v) in &other.properties {
            self.properties.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}
