//! End-to-end rendering through the public API.

use rawpipe_color::{
    CapabilityTier, ColorMatrix, ColorTransform, KernelRegistry, OutputDepth, TransformSettings,
    LUT_SIZE,
};
use rawpipe_core::{Image16, Rect};
use std::sync::Arc;

fn two_by_two() -> Image16 {
    Image16::from_data(
        2,
        2,
        4,
        vec![
            0, 0, 0, 0, //
            65535, 65535, 65535, 65535, //
            32768, 32768, 32768, 32768, //
            10000, 10000, 10000, 10000,
        ],
    )
    .unwrap()
}

#[test]
fn linear_2x2_renders_expected_8bit() {
    let mut ct = ColorTransform::new();
    ct.set_gamma(1.0).unwrap();
    ct.set_contrast(1.0).unwrap();
    ct.set_premultipliers([1.0; 4]).unwrap();
    ct.set_color_matrix(ColorMatrix::IDENTITY);

    for tier in CapabilityTier::ALL {
        ct.set_max_tier(tier).unwrap();
        let out = ct.render(&two_by_two(), None).unwrap().into_eight().unwrap();
        assert_eq!(out.channels(), 3);
        let expected = [0u8, 255, 128, 39];
        for (i, px) in out.data().chunks_exact(3).enumerate() {
            assert_eq!(px, &[expected[i]; 3], "pixel {i} at {tier}");
        }
    }
}

#[test]
fn linear_2x2_renders_identity_16bit() {
    let mut ct = ColorTransform::new();
    ct.set_gamma(1.0).unwrap();
    ct.set_output_depth(OutputDepth::Sixteen).unwrap();
    let out = ct.render(&two_by_two(), None).unwrap().into_sixteen().unwrap();
    let expected = [0u16, 65535, 32768, 10000];
    for (i, px) in out.data().chunks_exact(3).enumerate() {
        assert_eq!(px, &[expected[i]; 3]);
    }
}

#[test]
fn lut_monotonic_across_parameters() {
    let mut ct = ColorTransform::new();
    ct.set_tone_curve(&[(0.0, 0.05), (0.3, 0.25), (0.7, 0.8), (1.0, 0.95)]);
    for gamma in [0.5, 1.0, 2.2, 3.0] {
        for contrast in [0.5, 1.0, 2.0] {
            ct.set_gamma(gamma).unwrap();
            ct.set_contrast(contrast).unwrap();
            let t = ct.tables();
            assert_eq!(t.lut8().len(), LUT_SIZE);
            assert!(t.lut8().windows(2).all(|w| w[0] <= w[1]));
            assert!(t.lut16().windows(2).all(|w| w[0] <= w[1]));
        }
    }
}

#[test]
fn roi_outside_image_renders_nothing() {
    let ct = ColorTransform::new();
    let mut src = Image16::new(10, 10, 4);
    src.fill(&[65535; 4]);
    let out = ct.render(&src, Some(Rect::new(-30, -30, 10, 10))).unwrap();
    assert!(out.as_eight().unwrap().data().iter().all(|&v| v == 0));
}

#[test]
fn engines_are_independent() {
    let mut a = ColorTransform::new();
    a.set_gamma(1.0).unwrap();
    let b = a.clone();
    a.set_gamma(2.0).unwrap();
    assert_eq!(b.gamma(), 1.0);
    assert_ne!(a.tables(), b.tables());

    let src = two_by_two();
    std::thread::scope(|s| {
        let ha = s.spawn(|| a.render(&src, None).unwrap());
        let hb = s.spawn(|| b.render(&src, None).unwrap());
        assert_ne!(ha.join().unwrap(), hb.join().unwrap());
    });
}

#[test]
fn settings_from_yaml() {
    let yaml = r#"
gamma: 1.0
contrast: 1.0
premultipliers: [2.0, 1.0, 1.0, 1.0]
matrix: [1, 0, 0, 0, 1, 0, 0, 0, 1]
output_depth: eight
"#;
    let s = TransformSettings::from_yaml(yaml).unwrap();
    let ct = ColorTransform::from_settings(&s).unwrap();
    let mut src = Image16::new(1, 1, 3);
    src.fill(&[16384, 16384, 16384]);
    let out = ct.render(&src, None).unwrap().into_eight().unwrap();
    // Red doubled, green and blue untouched
    assert_eq!(out.pixel(0, 0), &[128, 64, 64]);
}

#[test]
fn builtin_registry_is_shared() {
    assert!(Arc::ptr_eq(&KernelRegistry::builtin(), &KernelRegistry::builtin()));
}
