//! Response memoisation.

use super::impl_any;
use crate::change::ChangeMask;
use crate::filter::{Filter, Upstream};
use crate::node::NodeId;
use crate::request::FilterRequest;
use crate::response::FilterResponse;
use tracing::trace;

/// Keeps the last 16-bit and 8-bit responses.
///
/// A stored response answers a later request when its valid region covers
/// the requested one and it is at least as good: full-quality data also
/// serves quick requests, quick data never serves a full-quality request.
/// Any upstream change flushes both slots.
#[derive(Debug, Default)]
pub struct Cache {
    image: Option<FilterResponse>,
    image8: Option<FilterResponse>,
    hits: u64,
    misses: u64,
}

impl Cache {
    /// Registry name.
    pub const NAME: &'static str = "Cache";

    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops both stored responses.
    pub fn flush(&mut self) {
        self.image = None;
        self.image8 = None;
    }

    /// Returns `true` if a 16-bit response is stored.
    pub fn is_cached(&self) -> bool {
        self.image.is_some()
    }

    /// Returns `true` if an 8-bit response is stored.
    pub fn is_cached8(&self) -> bool {
        self.image8.is_some()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    fn lookup(
        slot: &mut Option<FilterResponse>,
        stats: (&mut u64, &mut u64),
        request: &FilterRequest,
        fetch: impl FnOnce() -> FilterResponse,
    ) -> FilterResponse {
        if let Some(cached) = slot.as_ref().filter(|c| covers(c, request)) {
            *stats.0 += 1;
            trace!(roi = ?request.roi(), "cache hit");
            return cached.clone();
        }
        *stats.1 += 1;
        let resp = fetch();
        *slot = Some(resp.clone());
        resp
    }
}

/// Returns `true` if `cached` can answer `request`.
fn covers(cached: &FilterResponse, request: &FilterRequest) -> bool {
    if cached.is_quick() && !request.is_quick() {
        return false;
    }
    match (cached.roi(), request.roi()) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(have), Some(want)) => have.contains_rect(&want),
    }
}

impl Filter for Cache {
    fn type_name(&self) -> &'static str {
        Self::NAME
    }

    fn get_image(&mut self, upstream: &Upstream, request: &FilterRequest) -> FilterResponse {
        Self::lookup(
            &mut self.image,
            (&mut self.hits, &mut self.misses),
            request,
            || upstream.get_image(request),
        )
    }

    fn get_image8(&mut self, upstream: &Upstream, request: &FilterRequest) -> FilterResponse {
        Self::lookup(
            &mut self.image8,
            (&mut self.hits, &mut self.misses),
            request,
            || upstream.get_image8(request),
        )
    }

    fn upstream_changed(&mut self, origin: NodeId, mask: ChangeMask) -> ChangeMask {
        trace!(%origin, ?mask, "upstream changed, flushing");
        self.flush();
        mask
    }

    impl_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::InputImage16;
    use crate::FilterNode;
    use rawpipe_core::{Image16, Rect};
    use std::sync::Arc;

    fn pipeline() -> (FilterNode, FilterNode) {
        let input = FilterNode::from_filter(InputImage16::new(Arc::new(Image16::new(8, 8, 3))));
        let cache = FilterNode::new("Cache", Some(&input)).unwrap();
        (input, cache)
    }

    fn stats(node: &FilterNode) -> (u64, u64) {
        node.with_filter::<Cache, _>(|c| c.stats()).unwrap()
    }

    #[test]
    fn test_full_response_serves_roi_and_quick() {
        let (_input, cache) = pipeline();
        let first = cache.get_image(&FilterRequest::new());
        cache.get_image(&FilterRequest::new().with_roi(Rect::new(1, 1, 2, 2)));
        let again = cache.get_image(&FilterRequest::new().with_quick(true));
        assert_eq!(stats(&cache), (2, 1));
        assert!(Arc::ptr_eq(first.image().unwrap(), again.image().unwrap()));
    }

    #[test]
    fn test_covers() {
        let mut resp = FilterResponse::empty();
        resp.set_roi(Some(Rect::new(0, 0, 4, 4)));
        let inner = FilterRequest::new().with_roi(Rect::new(1, 1, 2, 2));
        let outer = FilterRequest::new().with_roi(Rect::new(2, 2, 4, 4));
        assert!(covers(&resp, &inner));
        assert!(!covers(&resp, &outer));
        assert!(!covers(&resp, &FilterRequest::new()));

        resp.set_quick(true);
        assert!(!covers(&resp, &inner));
        assert!(covers(&resp, &inner.clone().with_quick(true)));
    }

    #[test]
    fn test_upstream_change_flushes() {
        let (input, cache) = pipeline();
        cache.get_image(&FilterRequest::new());
        cache.get_image8(&FilterRequest::new());
        assert!(cache.with_filter::<Cache, _>(|c| c.is_cached() && c.is_cached8()).unwrap());

        let rx = cache.subscribe();
        input.set_property_recursive("image", Arc::new(Image16::new(4, 4, 3)));
        assert!(!cache.with_filter::<Cache, _>(|c| c.is_cached()).unwrap());
        assert_eq!(rx.try_recv().unwrap().mask, ChangeMask::DIMENSION);
        assert_eq!(cache.get_image(&FilterRequest::new()).dimensions(), (4, 4));
    }
}
