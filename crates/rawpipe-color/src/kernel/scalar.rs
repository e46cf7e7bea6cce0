//! Portable reference kernels.

use super::KernelParams;

/// Runs premultiply, clamp, matrix and clamp on one source pixel and
/// returns the three LUT indices.
#[inline]
pub(crate) fn map_pixel(px: &[u16], p: &KernelParams<'_>) -> [usize; 3] {
    let g2 = if px.len() > 3 { px[3] } else { 0 };
    let raw = [px[0], px[1], px[2], g2];
    let mut v = [0.0f32; 4];
    for c in 0..4 {
        v[c] = (raw[c] as f32 * p.premultipliers[c]).max(0.0).min(65535.0);
    }
    p.matrix.apply(v).map(|x| x.max(0.0).min(65535.0) as usize)
}

#[inline]
fn source_row<'s>(src: &'s [u16], y: usize, stride: usize, width: usize, ch: usize) -> &'s [u16] {
    &src[y * stride..y * stride + width * ch]
}

/// 8-bit output through the display table.
pub fn eight(
    width: usize,
    height: usize,
    src: &[u16],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    p: &KernelParams<'_>,
) {
    let ch = p.src_channels;
    for y in 0..height {
        let s = source_row(src, y, src_stride, width, ch);
        let d = &mut dst[y * dst_stride..y * dst_stride + width * 3];
        for (px, out) in s.chunks_exact(ch).zip(d.chunks_exact_mut(3)) {
            let idx = map_pixel(px, p);
            out[0] = p.lut8[idx[0]];
            out[1] = p.lut8[idx[1]];
            out[2] = p.lut8[idx[2]];
        }
    }
}

/// 16-bit output through the linear table.
pub fn sixteen(
    width: usize,
    height: usize,
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    p: &KernelParams<'_>,
) {
    let ch = p.src_channels;
    for y in 0..height {
        let s = source_row(src, y, src_stride, width, ch);
        let d = &mut dst[y * dst_stride..y * dst_stride + width * 3];
        stage_row(s, d, p);
    }
}

/// 8-bit output staged through the 16-bit table and the CMS handle.
pub fn eight_cms(
    width: usize,
    height: usize,
    src: &[u16],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    p: &KernelParams<'_>,
) {
    let Some(cms) = p.cms else {
        return eight(width, height, src, src_stride, dst, dst_stride, p);
    };
    let ch = p.src_channels;
    let mut staging = vec![0u16; width * 3];
    for y in 0..height {
        let s = source_row(src, y, src_stride, width, ch);
        stage_row(s, &mut staging, p);
        cms.transform_rgb16_to_8(&staging, &mut dst[y * dst_stride..y * dst_stride + width * 3]);
    }
}

/// 16-bit output staged through the CMS handle.
pub fn sixteen_cms(
    width: usize,
    height: usize,
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    p: &KernelParams<'_>,
) {
    let Some(cms) = p.cms else {
        return sixteen(width, height, src, src_stride, dst, dst_stride, p);
    };
    let ch = p.src_channels;
    let mut staging = vec![0u16; width * 3];
    for y in 0..height {
        let s = source_row(src, y, src_stride, width, ch);
        stage_row(s, &mut staging, p);
        cms.transform_rgb16(&staging, &mut dst[y * dst_stride..y * dst_stride + width * 3]);
    }
}

fn stage_row(s: &[u16], d: &mut [u16], p: &KernelParams<'_>) {
    for (px, out) in s.chunks_exact(p.src_channels).zip(d.chunks_exact_mut(3)) {
        let idx = map_pixel(px, p);
        out[0] = p.lut16[idx[0]];
        out[1] = p.lut16[idx[1]];
        out[2] = p.lut16[idx[2]];
    }
}
