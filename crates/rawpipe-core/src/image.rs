//! Interleaved pixel buffers.
//!
//! [`ImageBuffer`] stores samples row-major with interleaved channels and an
//! explicit row stride (counted in samples). Decoded sensor data usually
//! arrives as 4 channels of `u16` (`R G B G2`), rendered output as 3
//! channels of `u8` or `u16`:
//!
//! ```text
//! Memory: [R G B G2 R G B G2 ... pad]  ← Row 0 (stride samples)
//!         [R G B G2 R G B G2 ... pad]  ← Row 1
//! ```
//!
//! Buffers handed between filter stages are wrapped in [`Arc`]
//! ([`SharedImage16`], [`SharedImage8`]) and treated as immutable by every
//! holder that is not the sole owner.
//!
//! # Usage
//!
//! ```rust
//! use rawpipe_core::Image16;
//!
//! let mut img = Image16::new(4, 2, 4);
//! img.pixel_mut(1, 1).copy_from_slice(&[100, 200, 300, 200]);
//! assert_eq!(img.pixel(1, 1), &[100, 200, 300, 200]);
//! ```

use crate::{Error, Rect, Result};
use std::sync::Arc;

/// Sample type stored in an [`ImageBuffer`].
pub trait Sample: Copy + Default + PartialEq + Send + Sync + std::fmt::Debug + 'static {
    /// Largest representable sample value.
    const MAX: Self;
    /// Bits per sample.
    const BITS: u32;
}

impl Sample for u8 {
    const MAX: Self = u8::MAX;
    const BITS: u32 = 8;
}

impl Sample for u16 {
    const MAX: Self = u16::MAX;
    const BITS: u32 = 16;
}

/// Owned, interleaved image buffer with row stride.
#[derive(Clone, PartialEq)]
pub struct ImageBuffer<T: Sample> {
    data: Vec<T>,
    width: u32,
    height: u32,
    channels: usize,
    stride: usize,
}

/// 16-bit per channel image.
pub type Image16 = ImageBuffer<u16>;
/// 8-bit per channel image.
pub type Image8 = ImageBuffer<u8>;
/// Reference-counted immutable 16-bit image.
pub type SharedImage16 = Arc<Image16>;
/// Reference-counted immutable 8-bit image.
pub type SharedImage8 = Arc<Image8>;

impl<T: Sample> ImageBuffer<T> {
    /// Creates a zero-filled image with a tight stride.
    pub fn new(width: u32, height: u32, channels: usize) -> Self {
        let stride = width as usize * channels;
        Self {
            data: vec![T::default(); stride * height as usize],
            width,
            height,
            channels,
            stride,
        }
    }

    /// Creates a zero-filled image with a padded stride.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStride`] if `stride < width * channels`.
    pub fn with_stride(width: u32, height: u32, channels: usize, stride: usize) -> Result<Self> {
        check_stride(width, channels, stride)?;
        Ok(Self {
            data: vec![T::default(); stride * height as usize],
            width,
            height,
            channels,
            stride,
        })
    }

    /// Wraps tightly packed sample data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `data.len()` doesn't match.
    pub fn from_data(width: u32, height: u32, channels: usize, data: Vec<T>) -> Result<Self> {
        Self::from_data_with_stride(width, height, channels, width as usize * channels, data)
    }

    /// Wraps sample data laid out with `stride` samples per row.
    pub fn from_data_with_stride(
        width: u32,
        height: u32,
        channels: usize,
        stride: usize,
        data: Vec<T>,
    ) -> Result<Self> {
        check_stride(width, channels, stride)?;
        let expected = stride * height as usize;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} samples, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            stride,
        })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns (width, height).
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Interleaved channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Samples per row, including padding.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Full-image rectangle.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Returns `true` if the image has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw sample data, row-major with stride.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable raw sample data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the image and returns its samples.
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Samples of row `y` (without padding).
    #[inline]
    pub fn row(&self, y: u32) -> &[T] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.channels]
    }

    /// Mutable samples of row `y` (without padding).
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [T] {
        let start = y as usize * self.stride;
        let len = self.width as usize * self.channels;
        &mut self.data[start..start + len]
    }

    /// Channels of the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the image.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[T] {
        let start = y as usize * self.stride + x as usize * self.channels;
        &self.data[start..start + self.channels]
    }

    /// Mutable channels of the pixel at (x, y).
    #[inline]
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [T] {
        let start = y as usize * self.stride + x as usize * self.channels;
        &mut self.data[start..start + self.channels]
    }

    /// Fills every pixel with `value` (one sample per channel).
    pub fn fill(&mut self, value: &[T]) {
        debug_assert_eq!(value.len(), self.channels);
        for y in 0..self.height {
            for px in self.row_mut(y).chunks_exact_mut(value.len()) {
                px.copy_from_slice(value);
            }
        }
    }

    /// Copies `region` (clamped to the image) into a new tightly packed image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegion`] if the region misses the image.
    pub fn copy_region(&self, region: Rect) -> Result<Self> {
        let r = self.clamp_region(region)?;
        let mut out = Self::new(r.width as u32, r.height as u32, self.channels);
        let x0 = r.x as usize * self.channels;
        let len = r.width as usize * self.channels;
        for row in 0..r.height as u32 {
            let src_start = (r.y as usize + row as usize) * self.stride + x0;
            out.row_mut(row)
                .copy_from_slice(&self.data[src_start..src_start + len]);
        }
        Ok(out)
    }

    /// Copies the pixels of `region` from `src` into the same place in `self`.
    ///
    /// Both images must have identical dimensions and channel counts.
    pub fn copy_region_from(&mut self, src: &Self, region: Rect) -> Result<()> {
        if src.dimensions() != self.dimensions() {
            return Err(Error::dimension_mismatch(self.dimensions(), src.dimensions()));
        }
        if src.channels != self.channels {
            return Err(Error::UnsupportedChannels {
                channels: src.channels,
                expected: "same channel count as destination",
            });
        }
        let r = self.clamp_region(region)?;
        let x0 = r.x as usize * self.channels;
        let len = r.width as usize * self.channels;
        for y in r.y as usize..r.bottom() as usize {
            let s = y * src.stride + x0;
            let d = y * self.stride + x0;
            self.data[d..d + len].copy_from_slice(&src.data[s..s + len]);
        }
        Ok(())
    }

    fn clamp_region(&self, region: Rect) -> Result<Rect> {
        region
            .clamp_to(self.width, self.height)
            .ok_or(Error::InvalidRegion {
                x: region.x,
                y: region.y,
                w: region.width,
                h: region.height,
                width: self.width,
                height: self.height,
            })
    }
}

impl<T: Sample> std::fmt::Debug for ImageBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("stride", &self.stride)
            .field("bits", &T::BITS)
            .finish()
    }
}

fn check_stride(width: u32, channels: usize, stride: usize) -> Result<()> {
    if channels == 0 {
        return Err(Error::UnsupportedChannels {
            channels,
            expected: "at least one channel",
        });
    }
    let min_stride = width as usize * channels;
    if stride < min_stride {
        return Err(Error::InvalidStride {
            stride,
            min_stride,
            width,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let img = Image16::new(3, 2, 4);
        assert_eq!(img.stride(), 12);
        assert_eq!(img.data().len(), 24);
        assert!(img.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_from_data_length_check() {
        assert!(Image8::from_data(2, 2, 3, vec![0; 12]).is_ok());
        let err = Image8::from_data(2, 2, 3, vec![0; 11]).unwrap_err();
        assert!(err.to_string().contains("expected 12"));
    }

    #[test]
    fn test_padded_stride_rows() {
        let mut img = Image16::with_stride(2, 2, 3, 8).unwrap();
        img.row_mut(1).copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(img.row(1), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(&img.data()[8..14], &[1, 2, 3, 4, 5, 6]);
        assert!(Image16::with_stride(4, 1, 3, 11).is_err());
    }

    #[test]
    fn test_copy_region_clamps() {
        let mut img = Image8::new(4, 4, 1);
        for y in 0..4 {
            for x in 0..4 {
                img.pixel_mut(x, y)[0] = (y * 4 + x) as u8;
            }
        }
        let crop = img.copy_region(Rect::new(2, 2, 10, 10)).unwrap();
        assert_eq!(crop.dimensions(), (2, 2));
        assert_eq!(crop.data(), &[10, 11, 14, 15]);
        assert!(img.copy_region(Rect::new(10, 10, 2, 2)).is_err());
    }

    #[test]
    fn test_copy_region_from() {
        let mut dst = Image8::new(3, 3, 1);
        let mut src = Image8::new(3, 3, 1);
        src.fill(&[9]);
        dst.copy_region_from(&src, Rect::new(1, 1, 1, 1)).unwrap();
        assert_eq!(dst.pixel(1, 1), &[9]);
        assert_eq!(dst.pixel(0, 0), &[0]);
    }
}
