//! Whole-pipeline behaviour through the public API.

use approx::assert_abs_diff_eq;
use rawpipe_core::{Image16, Rect};
use rawpipe_graph::filters::{Cache, ColorTransformFilter, InputImage16};
use rawpipe_graph::{
    ChangeMask, FilterNode, FilterRegistry, FilterRequest, GraphError, PropertyWrite, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn source(w: u32, h: u32) -> Arc<Image16> {
    let mut img = Image16::new(w, h, 4);
    for y in 0..h {
        for x in 0..w {
            let v = ((x + y * w) * 1000) as u16;
            img.pixel_mut(x, y).copy_from_slice(&[v, v, v, v]);
        }
    }
    Arc::new(img)
}

struct Pipeline {
    input: FilterNode,
    crop: FilterNode,
    transform: FilterNode,
    cache: FilterNode,
}

fn pipeline() -> Pipeline {
    let input = FilterNode::from_filter(InputImage16::new(source(8, 6)));
    let crop = FilterNode::new("Crop", Some(&input)).unwrap();
    crop.set_property("rectangle", &Value::Rect(Rect::new(2, 1, 4, 4)));
    let transform = FilterNode::new("ColorTransform", Some(&crop)).unwrap();
    transform.set_property("gamma", &Value::Float(1.0));
    let cache = FilterNode::new("Cache", Some(&transform)).unwrap();
    Pipeline {
        input,
        crop,
        transform,
        cache,
    }
}

#[test]
fn sizes_flow_downstream() {
    let p = pipeline();
    let req = FilterRequest::new();
    assert_eq!(p.input.get_size(&req), (8, 6));
    assert_eq!(p.crop.get_size(&req), (4, 4));
    assert_eq!(p.transform.get_size(&req), (4, 4));
    assert_eq!(p.cache.get_size(&req), (4, 4));
}

#[test]
fn preview_matches_cropped_source() {
    let p = pipeline();
    let resp = p.cache.get_image8(&FilterRequest::new());
    let img = resp.image8().unwrap();
    assert_eq!(img.dimensions(), (4, 4));
    // output (0, 0) is source (2, 1): 10 * 1000
    let expected = (10_000.0f64 / 65535.0 * 255.0).round() as u8;
    assert_eq!(img.pixel(0, 0), &[expected; 3]);
    assert!(resp.property("ColorTransform-time").is_some());
    assert!(resp.property("Crop-time").is_some());
}

#[test]
fn roi_request_is_clamped_and_echoed() {
    let p = pipeline();
    let resp = p
        .transform
        .get_image(&FilterRequest::new().with_roi(Rect::new(2, 2, 10, 10)));
    assert_eq!(resp.roi(), Some(Rect::new(2, 2, 2, 2)));
    assert_eq!(resp.image().unwrap().dimensions(), (4, 4));
}

#[test]
fn disabled_node_is_transparent() {
    let p = pipeline();
    p.crop.set_enabled(false);
    assert_eq!(p.cache.get_size(&FilterRequest::new()), (8, 6));
    let resp = p.cache.get_image8(&FilterRequest::new());
    assert_eq!(resp.image8().unwrap().dimensions(), (8, 6));

    for req in [
        FilterRequest::new(),
        FilterRequest::new().with_roi(Rect::new(1, 2, 3, 3)),
    ] {
        let through = p.crop.get_image(&req);
        let direct = p.input.get_image(&req);
        assert_eq!(through.image().unwrap().data(), direct.image().unwrap().data());
        assert_eq!(through.roi(), direct.roi());
        assert_eq!(through.dimensions(), direct.dimensions());
    }

    assert!(!p.crop.set_enabled(true));
    assert_eq!(p.cache.get_size(&FilterRequest::new()), (4, 4));

    p.transform.set_enabled(false);
    let req = FilterRequest::new();
    assert_eq!(
        p.transform.get_image(&req).image().unwrap().data(),
        p.crop.get_image(&req).image().unwrap().data()
    );
}

#[test]
fn parameter_change_reaches_cache_and_observers() {
    let p = pipeline();
    let first = p.cache.get_image8(&FilterRequest::new());
    assert!(p.cache.with_filter::<Cache, _>(|c| c.is_cached8()).unwrap());

    let events = Arc::new(AtomicUsize::new(0));
    let seen = events.clone();
    p.cache.connect_changed(move |ev| {
        assert_eq!(ev.mask, ChangeMask::PIXELDATA);
        seen.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(p.cache.set_property_recursive("contrast", 1.5), 1);
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert!(!p.cache.with_filter::<Cache, _>(|c| c.is_cached8()).unwrap());

    let second = p.cache.get_image8(&FilterRequest::new());
    assert_ne!(first.image8().unwrap().data(), second.image8().unwrap().data());
}

#[test]
fn recursive_property_lookup() {
    let p = pipeline();
    let gamma = p.cache.get_property_recursive("gamma").and_then(|v| v.as_f64());
    assert_abs_diff_eq!(gamma.unwrap(), 1.0);
    assert_eq!(
        p.cache.get_property_recursive("rectangle"),
        Some(Value::Rect(Rect::new(2, 1, 4, 4)))
    );
    p.transform.set_enabled(false);
    assert_eq!(p.cache.get_property_recursive("gamma"), None);
    assert_eq!(p.cache.get_property_recursive("width"), Some(Value::Int(8)));
}

#[test]
fn read_only_property_is_not_writable() {
    let p = pipeline();
    assert_eq!(p.input.set_property("width", &Value::Int(3)), PropertyWrite::Unknown);
    assert_eq!(p.input.property("width"), Some(Value::Int(8)));
}

#[test]
fn quick_request_is_reported() {
    let p = pipeline();
    let resample = FilterNode::new("Resample", Some(&p.cache)).unwrap();
    resample.set_property_recursive("width", 2i64);
    resample.set_property_recursive("height", 2i64);
    let resp = resample.get_image8(&FilterRequest::new().with_quick(true));
    assert!(resp.is_quick());
    assert_eq!(resp.image8().unwrap().dimensions(), (2, 2));
}

#[test]
fn unknown_filter_type_is_an_error() {
    assert!(matches!(
        FilterNode::new("Bogus", None),
        Err(GraphError::UnknownFilterType(name)) if name == "Bogus"
    ));
    assert!(!FilterRegistry::global().contains("Bogus"));
}

#[test]
fn typed_access_through_node() {
    let p = pipeline();
    let gamma = p
        .transform
        .with_filter::<ColorTransformFilter, _>(|f| f.engine().gamma())
        .unwrap();
    assert_eq!(gamma, 1.0);
    assert!(p.transform.with_filter::<Cache, _>(|_| ()).is_none());
    assert!(p.cache.to_dot().contains("ColorTransform"));
}

#[test]
fn roi_beyond_coordinate_range_is_empty() {
    let p = pipeline();
    let req = FilterRequest::new().with_roi(Rect::new(i32::MAX - 5, 0, 100, 100));
    let resp = p.input.get_image(&req);
    assert!(!resp.has_image());
    assert_eq!(resp.dimensions(), (8, 6));
    assert_eq!(resp.roi(), Some(Rect::default()));
    assert!(!p.cache.get_image8(&req).has_image8());
}
