//! Benchmarks for rawpipe operations.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use rawpipe_color::{CapabilityTier, ColorTransform, OutputDepth, ToneTables, LUT_SIZE};
use rawpipe_core::{Image16, Rect};
use rawpipe_graph::filters::InputImage16;
use rawpipe_graph::{FilterNode, FilterRequest};
use rawpipe_math::{identity_samples, CubicSpline};

fn source(w: u32, h: u32) -> Image16 {
    let mut img = Image16::new(w, h, 4);
    for y in 0..h {
        for x in 0..w {
            let v = ((x * 31 + y * 17) % 65536) as u16;
            img.pixel_mut(x, y).copy_from_slice(&[v, v / 2, 65535 - v, v / 3]);
        }
    }
    img
}

/// Benchmark kernel dispatch per capability tier and output depth.
fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel");
    let src = source(1024, 768);
    group.throughput(Throughput::Elements(1024 * 768));

    let tiers = CapabilityTier::ALL
        .into_iter()
        .filter(|t| *t <= CapabilityTier::detected());
    for tier in tiers {
        for depth in [OutputDepth::Eight, OutputDepth::Sixteen] {
            let mut ct = ColorTransform::new();
            ct.set_max_tier(tier).unwrap();
            ct.set_output_depth(depth).unwrap();
            let id = BenchmarkId::new(tier.name(), depth);
            group.bench_with_input(id, &src, |b, src| {
                b.iter(|| ct.render(black_box(src), None).unwrap())
            });
        }
    }

    group.finish();
}

/// Benchmark LUT regeneration after a parameter change.
fn bench_lut(c: &mut Criterion) {
    let mut group = c.benchmark_group("lut");
    group.throughput(Throughput::Elements(LUT_SIZE as u64));

    let identity = identity_samples(LUT_SIZE);
    group.bench_function("generate_identity", |b| {
        b.iter(|| ToneTables::generate(black_box(2.2), black_box(1.2), &identity))
    });

    let spline = CubicSpline::new(&[(0.0, 0.0), (0.25, 0.3), (0.75, 0.8), (1.0, 1.0)]).unwrap();
    group.bench_function("sample_curve", |b| b.iter(|| spline.sample(black_box(LUT_SIZE))));

    group.finish();
}

/// Benchmark graph pulls with and without a cache.
fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph");
    let input = FilterNode::from_filter(InputImage16::new(Arc::new(source(512, 512))));
    let view = FilterNode::new("ColorTransform", Some(&input)).unwrap();
    let cache = FilterNode::new("Cache", Some(&view)).unwrap();

    for (name, roi) in [("full", None), ("roi_128", Some(Rect::new(64, 64, 128, 128)))] {
        let mut request = FilterRequest::new();
        request.set_roi(roi);
        group.bench_with_input(BenchmarkId::new("preview", name), &request, |b, r| {
            b.iter(|| view.get_image8(black_box(r)))
        });
    }
    group.bench_function("cached_preview", |b| {
        b.iter(|| cache.get_image8(black_box(&FilterRequest::new())))
    });

    group.finish();
}

criterion_group!(benches, bench_kernels, bench_lut, bench_graph);
criterion_main!(benches);
