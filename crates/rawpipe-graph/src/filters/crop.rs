//! Rectangular crop.

use super::impl_any;
use crate::change::ChangeMask;
use crate::filter::{Filter, PropertySpec, PropertyWrite, Upstream};
use crate::request::FilterRequest;
use crate::response::FilterResponse;
use crate::value::{Value, ValueKind};
use rawpipe_core::{ImageBuffer, Rect, Sample};
use std::sync::Arc;
use tracing::warn;

const PROPERTIES: &[PropertySpec] = &[PropertySpec::rw("rectangle", ValueKind::Rect)];

/// Cuts a rectangle out of the upstream image.
///
/// The rectangle is clamped to the upstream size; without one the filter
/// passes everything through. Requested regions are in output (cropped)
/// coordinates and are shifted by the crop origin before going upstream.
#[derive(Debug, Default, Clone)]
pub struct Crop {
    rect: Option<Rect>,
}

impl Crop {
    /// Registry name.
    pub const NAME: &'static str = "Crop";

    /// Crop to `rect`.
    pub fn new(rect: Rect) -> Self {
        Self { rect: Some(rect) }
    }

    /// Configured rectangle (unclamped).
    pub fn rectangle(&self) -> Option<Rect> {
        self.rect
    }

    /// Sets or clears the rectangle; returns the change to notify.
    pub fn set_rectangle(&mut self, rect: Option<Rect>) -> ChangeMask {
        if self.rect == rect {
            return ChangeMask::NONE;
        }
        self.rect = rect;
        ChangeMask::DIMENSION
    }

    /// Crop rectangle clamped to an upstream of `size`; `None` passes through.
    fn effective(&self, (width, height): (u32, u32)) -> Option<Rect> {
        self.rect
            .map(|r| r.clamp_to(width, height).unwrap_or_default())
    }

    /// Runs one evaluation path: maps the request, fetches upstream and
    /// copies the crop out of whichever image `pick` selects.
    fn crop_response<T: Sample>(
        &self,
        upstream: &Upstream,
        request: &FilterRequest,
        fetch: impl FnOnce(&Upstream, &FilterRequest) -> FilterResponse,
        pick: impl FnOnce(&FilterResponse) -> Option<&Arc<ImageBuffer<T>>>,
        store: impl FnOnce(&mut FilterResponse, Arc<ImageBuffer<T>>),
    ) -> FilterResponse {
        let size = upstream.get_size(request);
        let Some(crop) = self.effective(size) else {
            return fetch(upstream, request);
        };
        let (cw, ch) = (crop.width.max(0) as u32, crop.height.max(0) as u32);
        if crop.is_empty() {
            let mut resp = FilterResponse::empty();
            resp.set_dimensions(cw, ch);
            return resp;
        }

        let mut up_request = request.clone();
        up_request.set_roi(Some(match request.roi() {
            Some(roi) => roi.translate(crop.x, crop.y),
            None => crop,
        }));
        let up = fetch(upstream, &up_request);

        let mut resp = FilterResponse::empty();
        resp.inherit(&up);
        resp.set_dimensions(cw, ch);
        resp.set_roi(request.roi());
        if let Some(img) = pick(&up) {
            match img.copy_region(crop) {
                Ok(out) => store(&mut resp, Arc::new(out)),
                Err(e) => warn!(error = %e, %crop, "crop outside upstream image"),
            }
        }
        resp
    }
}

impl Filter for Crop {
    fn type_name(&self) -> &'static str {
        Self::NAME
    }

    fn get_image(&mut self, upstream: &Upstream, request: &FilterRequest) -> FilterResponse {
        self.crop_response(
            upstream,
            request,
            Upstream::get_image,
            FilterResponse::image,
            |resp, img| resp.set_image(Some(img)),
        )
    }

    fn get_image8(&mut self, upstream: &Upstream, request: &FilterRequest) -> FilterResponse {
        self.crop_response(
            upstream,
            request,
            Upstream::get_image8,
            FilterResponse::image8,
            |resp, img| resp.set_image8(Some(img)),
        )
    }

    fn get_size(&mut self, upstream: &Upstream, request: &FilterRequest) -> (u32, u32) {
        let size = upstream.get_size(request);
        match self.effective(size) {
            Some(r) => (r.width.max(0) as u32, r.height.max(0) as u32),
            None => size,
        }
    }

    fn property_specs(&self) -> &'static [PropertySpec] {
        PROPERTIES
    }

    fn set_property(&mut self, name: &str, value: &Value) -> PropertyWrite {
        if name != "rectangle" {
            return PropertyWrite::Unknown;
        }
        match value.as_rect() {
            Some(r) => match self.set_rectangle(Some(r)) {
                ChangeMask::NONE => PropertyWrite::Unchanged,
                mask => PropertyWrite::Changed(mask),
            },
            None => PropertyWrite::Rejected(format!("expected rect, got {}", value)),
        }
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "rectangle" => self.rect.map(Value::Rect),
            _ => None,
        }
    }

    impl_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::InputImage16;
    use crate::FilterNode;
    use rawpipe_core::Image16;

    fn gradient(w: u32, h: u32) -> FilterNode {
        let mut img = Image16::new(w, h, 3);
        for y in 0..h {
            for x in 0..w {
                let v = (y * 100 + x) as u16;
                img.pixel_mut(x, y).copy_from_slice(&[v, v, v]);
            }
        }
        FilterNode::from_filter(InputImage16::new(Arc::new(img)))
    }

    #[test]
    fn test_size_is_clamped() {
        let input = gradient(10, 8);
        let crop = FilterNode::from_filter(Crop::new(Rect::new(6, 4, 10, 10)));
        crop.set_previous(&input).unwrap();
        assert_eq!(crop.get_size(&FilterRequest::new()), (4, 4));
    }

    #[test]
    fn test_copies_rectangle() {
        let input = gradient(10, 8);
        let crop = FilterNode::from_filter(Crop::new(Rect::new(2, 3, 4, 2)));
        crop.set_previous(&input).unwrap();
        let resp = crop.get_image(&FilterRequest::new());
        let img = resp.image().unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(img.pixel(0, 0), &[302, 302, 302]);
        assert_eq!(img.pixel(3, 1), &[405, 405, 405]);
        assert_eq!(resp.roi(), None);
    }

    #[test]
    fn test_roi_stays_in_output_coordinates() {
        let input = gradient(10, 8);
        let crop = FilterNode::from_filter(Crop::new(Rect::new(2, 2, 6, 6)));
        crop.set_previous(&input).unwrap();
        let roi = Rect::new(1, 1, 2, 2);
        let resp = crop.get_image(&FilterRequest::new().with_roi(roi));
        assert_eq!(resp.roi(), Some(roi));
        assert_eq!(resp.image().unwrap().pixel(1, 1)[0], 303);
    }

    #[test]
    fn test_no_rectangle_passes_through() {
        let input = gradient(5, 5);
        let crop = FilterNode::new("Crop", Some(&input)).unwrap();
        assert_eq!(crop.get_size(&FilterRequest::new()), (5, 5));
        assert_eq!(crop.property("rectangle"), None);
    }

    #[test]
    fn test_rectangle_property_notifies_dimension() {
        let input = gradient(5, 5);
        let crop = FilterNode::new("Crop", Some(&input)).unwrap();
        let rx = crop.subscribe();
        let w = crop.set_property("rectangle", &Value::Rect(Rect::new(0, 0, 2, 2)));
        assert_eq!(w, PropertyWrite::Changed(ChangeMask::DIMENSION));
        assert_eq!(rx.try_recv().unwrap().mask, ChangeMask::DIMENSION);
        assert!(matches!(
            crop.set_property("rectangle", &Value::Int(3)),
            PropertyWrite::Rejected(_)
        ));
        assert_eq!(crop.get_size(&FilterRequest::new()), (2, 2));
    }
}
