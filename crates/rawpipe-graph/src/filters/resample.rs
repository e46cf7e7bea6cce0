//! Image scaling.

use super::impl_any;
use crate::change::ChangeMask;
use crate::filter::{Filter, PropertySpec, PropertyWrite, Upstream};
use crate::request::FilterRequest;
use crate::response::FilterResponse;
use crate::value::{Value, ValueKind};
use rawpipe_core::{ImageBuffer, Rect, Sample};
use rayon::prelude::*;
use std::sync::Arc;

const PROPERTIES: &[PropertySpec] = &[
    PropertySpec::rw("width", ValueKind::Int),
    PropertySpec::rw("height", ValueKind::Int),
];

/// Resampling method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleQuality {
    /// Nearest neighbour; used for quick requests.
    Nearest,
    /// Box-filter area averaging.
    #[default]
    Area,
}

impl ResampleQuality {
    /// Method for a request.
    pub fn for_request(request: &FilterRequest) -> Self {
        if request.is_quick() {
            Self::Nearest
        } else {
            Self::Area
        }
    }
}

/// Scales the upstream image to a fixed size.
///
/// A zero width or height disables the filter. The response is marked
/// quick when either the request or the upstream data was quick.
#[derive(Debug, Default, Clone)]
pub struct Resample {
    width: u32,
    height: u32,
}

impl Resample {
    /// Registry name.
    pub const NAME: &'static str = "Resample";

    /// Scale to `width` x `height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Target size.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Sets the target size; returns the change to notify.
    pub fn set_size(&mut self, width: u32, height: u32) -> ChangeMask {
        if (width, height) == (self.width, self.height) {
            return ChangeMask::NONE;
        }
        self.width = width;
        self.height = height;
        ChangeMask::DIMENSION
    }

    fn active(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    fn scaled<T>(
        &self,
        upstream: &Upstream,
        request: &FilterRequest,
        fetch: impl FnOnce(&Upstream, &FilterRequest) -> FilterResponse,
        pick: impl FnOnce(&FilterResponse) -> Option<&Arc<ImageBuffer<T>>>,
        store: impl FnOnce(&mut FilterResponse, Arc<ImageBuffer<T>>),
    ) -> FilterResponse
    where
        T: Sample + Into<u32> + TryFrom<u32>,
    {
        if !self.active() {
            return fetch(upstream, request);
        }
        let (src_w, src_h) = upstream.get_size(request);
        let roi = request
            .roi()
            .unwrap_or(Rect::from_size(self.width, self.height));

        let mut up_request = request.clone();
        if src_w > 0 && src_h > 0 {
            let sx = src_w as f64 / self.width as f64;
            let sy = src_h as f64 / self.height as f64;
            up_request.set_roi(roi.scale(sx, sy).clamp_to(src_w, src_h));
        }
        let up = fetch(upstream, &up_request);

        let mut resp = FilterResponse::empty();
        resp.inherit(&up);
        resp.set_quick(request.is_quick() || up.is_quick());
        resp.set_dimensions(self.width, self.height);
        resp.set_roi(request.roi());
        if let Some(img) = pick(&up) {
            let quality = ResampleQuality::for_request(request);
            let out = resample(img, self.width, self.height, roi, quality);
            store(&mut resp, Arc::new(out));
        }
        resp
    }
}

/// Scales `src` to `width` x `height`, computing only pixels inside `roi`.
///
/// Pixels outside `roi` are left zero.
pub fn resample<T>(
    src: &ImageBuffer<T>,
    width: u32,
    height: u32,
    roi: Rect,
    quality: ResampleQuality,
) -> ImageBuffer<T>
where
    T: Sample + Into<u32> + TryFrom<u32>,
{
    let channels = src.channels();
    let mut out = ImageBuffer::<T>::new(width, height, channels);
    let Some(roi) = roi.clamp_to(width, height) else {
        return out;
    };
    if src.is_empty() {
        return out;
    }

    let sx = src.width() as f64 / width as f64;
    let sy = src.height() as f64 / height as f64;
    let (x0, x1) = (roi.x as u32, roi.right() as u32);
    let (y0, y1) = (roi.y as u32, roi.bottom() as u32);
    let stride = out.stride();

    out.data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .skip(y0 as usize)
        .take((y1 - y0) as usize)
        .for_each(|(y, row)| {
            let (sy0, sy1) = span(y as u32, sy, src.height());
            let mut sums = vec![0u64; channels];
            for x in x0..x1 {
                let dst = &mut row[x as usize * channels..(x as usize + 1) * channels];
                match quality {
                    ResampleQuality::Nearest => {
                        let px = ((x as f64 + 0.5) * sx) as u32;
                        let py = ((y as f64 + 0.5) * sy) as u32;
                        dst.copy_from_slice(
                            src.pixel(px.min(src.width() - 1), py.min(src.height() - 1)),
                        );
                    }
                    ResampleQuality::Area => {
                        let (sx0, sx1) = span(x, sx, src.width());
                        average(src, sx0..sx1, sy0..sy1, &mut sums, dst);
                    }
                }
            }
        });
    out
}

/// Source interval covered by output index `i` at `scale`.
fn span(i: u32, scale: f64, limit: u32) -> (u32, u32) {
    let lo = ((i as f64 * scale).floor() as u32).min(limit - 1);
    let hi = (((i + 1) as f64 * scale).ceil() as u32).clamp(lo + 1, limit);
    (lo, hi)
}

fn average<T>(
    src: &ImageBuffer<T>,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
    sums: &mut [u64],
    dst: &mut [T],
) where
    T: Sample + Into<u32> + TryFrom<u32>,
{
    sums.fill(0);
    for y in ys.clone() {
        for x in xs.clone() {
            for (sum, v) in sums.iter_mut().zip(src.pixel(x, y)) {
                *sum += u64::from((*v).into());
            }
        }
    }
    let n = u64::from(xs.len() as u32) * u64::from(ys.len() as u32);
    for (d, sum) in dst.iter_mut().zip(sums.iter()) {
        let avg = ((sum + n / 2) / n) as u32;
        *d = T::try_from(avg).unwrap_or(T::MAX);
    }
}

impl Filter for Resample {
    fn type_name(&self) -> &'static str {
        Self::NAME
    }

    fn get_image(&mut self, upstream: &Upstream, request: &FilterRequest) -> FilterResponse {
        self.scaled(
            upstream,
            request,
            Upstream::get_image,
            FilterResponse::image,
            |resp, img| resp.set_image(Some(img)),
        )
    }

    fn get_image8(&mut self, upstream: &Upstream, request: &FilterRequest) -> FilterResponse {
        self.scaled(
            upstream,
            request,
            Upstream::get_image8,
            FilterResponse::image8,
            |resp, img| resp.set_image8(Some(img)),
        )
    }

    fn get_size(&mut self, upstream: &Upstream, request: &FilterRequest) -> (u32, u32) {
        if self.active() {
            (self.width, self.height)
        } else {
            upstream.get_size(request)
        }
    }

    fn property_specs(&self) -> &'static [PropertySpec] {
        PROPERTIES
    }

    fn set_property(&mut self, name: &str, value: &Value) -> PropertyWrite {
        let (w, h) = (self.width, self.height);
        let parsed = value.as_int().and_then(|v| u32::try_from(v).ok());
        let change = match (name, parsed) {
            ("width", Some(v)) => self.set_size(v, h),
            ("height", Some(v)) => self.set_size(w, v),
            ("width" | "height", None) => {
                return PropertyWrite::Rejected(format!("expected non-negative int, got {}", value));
            }
            _ => return PropertyWrite::Unknown,
        };
        if change.is_empty() {
            PropertyWrite::Unchanged
        } else {
            PropertyWrite::Changed(change)
        }
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "width" => Some(Value::from(self.width)),
            "height" => Some(Value::from(self.height)),
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

    fn checker() -> Image16 {
        // 4x2, left half 0, right half 1000
        let mut img = Image16::new(4, 2, 3);
        for y in 0..2 {
            for x in 0..4 {
                let v = if x < 2 { 0 } else { 1000 };
                img.pixel_mut(x, y).copy_from_slice(&[v, v + 1, v + 2]);
            }
        }
        img
    }

    #[test]
    fn test_area_average() {
        let img = checker();
        let out = resample(&img, 1, 1, Rect::from_size(1, 1), ResampleQuality::Area);
        assert_eq!(out.pixel(0, 0), &[500, 501, 502]);
    }

    #[test]
    fn test_nearest() {
        let img = checker();
        let out = resample(&img, 2, 1, Rect::from_size(2, 1), ResampleQuality::Nearest);
        assert_eq!(out.pixel(0, 0)[0], 0);
        assert_eq!(out.pixel(1, 0)[0], 1000);
    }

    #[test]
    fn test_upscale_area() {
        let img = checker();
        let out = resample(&img, 8, 4, Rect::from_size(8, 4), ResampleQuality::Area);
        assert_eq!(out.pixel(0, 0)[0], 0);
        assert_eq!(out.pixel(7, 3)[0], 1000);
    }

    #[test]
    fn test_roi_only() {
        let img = checker();
        let out = resample(&img, 4, 2, Rect::new(2, 0, 2, 1), ResampleQuality::Area);
        assert_eq!(out.pixel(2, 0)[0], 1000);
        assert_eq!(out.pixel(3, 1)[0], 0);
    }

    #[test]
    fn test_quick_propagates() {
        let input = FilterNode::from_filter(InputImage16::new(Arc::new(checker())));
        let node = FilterNode::from_filter(Resample::new(2, 1));
        node.set_previous(&input).unwrap();
        assert_eq!(node.get_size(&FilterRequest::new()), (2, 1));

        let full = node.get_image(&FilterRequest::new());
        assert!(!full.is_quick());
        assert_eq!(full.image().unwrap().pixel(1, 0)[0], 1000);

        let quick = node.get_image(&FilterRequest::new().with_quick(true));
        assert!(quick.is_quick());
    }

    #[test]
    fn test_zero_size_passes_through() {
        let input = FilterNode::from_filter(InputImage16::new(Arc::new(checker())));
        let node = FilterNode::new("Resample", Some(&input)).unwrap();
        assert_eq!(node.get_size(&FilterRequest::new()), (4, 2));
        assert_eq!(node.set_property_recursive("width", 2i64), 1);
        assert_eq!(node.get_size(&FilterRequest::new()), (4, 2));
        assert_eq!(node.set_property_recursive("height", 1i64), 1);
        assert_eq!(node.get_size(&FilterRequest::new()), (2, 1));
    }
}
