//! Structure-of-arrays kernels over [`Lanes`] vectors.
//!
//! Each block gathers `L::LANES` pixels into one vector per channel. Tail
//! pixels go through the scalar path; both paths share the same operation
//! order, so results match the reference bit for bit.

use super::KernelParams;
use super::scalar::map_pixel;
use rawpipe_math::simd::{clamp, matrix_row, Lanes};

const MAX_LANES: usize = 8;

/// 8-bit output.
pub fn eight<L: Lanes>(
    width: usize,
    height: usize,
    src: &[u16],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    p: &KernelParams<'_>,
) {
    run_rows::<L, u8>(width, height, src, src_stride, dst, dst_stride, p, p.lut8);
}

/// 16-bit output.
pub fn sixteen<L: Lanes>(
    width: usize,
    height: usize,
    src: &[u16],
    src_stride: usize,
    dst: &mut [u16],
    dst_stride: usize,
    p: &KernelParams<'_>,
) {
    run_rows::<L, u16>(width, height, src, src_stride, dst, dst_stride, p, p.lut16);
}

#[allow(clippy::too_many_arguments)]
fn run_rows<L: Lanes, T: Copy>(
    width: usize,
    height: usize,
    src: &[u16],
    src_stride: usize,
    dst: &mut [T],
    dst_stride: usize,
    p: &KernelParams<'_>,
    lut: &[T],
) {
    debug_assert!(L::LANES <= MAX_LANES);
    let n = L::LANES;
    let ch = p.src_channels;
    let rows = [p.matrix.row(0), p.matrix.row(1), p.matrix.row(2)];
    let pm = p.premultipliers.map(L::splat);
    let full = width - width % n;

    let mut gather = [[0.0f32; MAX_LANES]; 4];
    let mut scatter = [[0.0f32; MAX_LANES]; 3];

    for y in 0..height {
        let s = &src[y * src_stride..y * src_stride + width * ch];
        let d = &mut dst[y * dst_stride..y * dst_stride + width * 3];

        for x0 in (0..full).step_by(n) {
            for i in 0..n {
                let px = &s[(x0 + i) * ch..(x0 + i + 1) * ch];
                gather[0][i] = px[0] as f32;
                gather[1][i] = px[1] as f32;
                gather[2][i] = px[2] as f32;
                gather[3][i] = if ch > 3 { px[3] as f32 } else { 0.0 };
            }

            let r = clamp(L::load(&gather[0]) * pm[0], 0.0, 65535.0);
            let g = clamp(L::load(&gather[1]) * pm[1], 0.0, 65535.0);
            let b = clamp(L::load(&gather[2]) * pm[2], 0.0, 65535.0);
            let g2 = clamp(L::load(&gather[3]) * pm[3], 0.0, 65535.0);

            for c in 0..3 {
                clamp(matrix_row(rows[c], r, g, b, g2), 0.0, 65535.0).store(&mut scatter[c]);
            }

            for i in 0..n {
                let out = &mut d[(x0 + i) * 3..(x0 + i) * 3 + 3];
                out[0] = lut[scatter[0][i] as usize];
                out[1] = lut[scatter[1][i] as usize];
                out[2] = lut[scatter[2][i] as usize];
            }
        }

        for x in full..width {
            let idx = map_pixel(&s[x * ch..(x + 1) * ch], p);
            let out = &mut d[x * 3..x * 3 + 3];
            out[0] = lut[idx[0]];
            out[1] = lut[idx[1]];
            out[2] = lut[idx[2]];
        }
    }
}
