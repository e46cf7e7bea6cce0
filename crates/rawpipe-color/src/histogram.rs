//! Per-channel histogram of rendered 8-bit output.

use rawpipe_core::{Image8, Rect};

/// Number of bins per channel.
pub const BINS: usize = 256;

/// RGB histogram with 256 bins per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: [Vec<u32>; 3],
    count: u64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            bins: [vec![0; BINS], vec![0; BINS], vec![0; BINS]],
            count: 0,
        }
    }
}

impl Histogram {
    /// Counts the pixels of `region` in a 3-channel image.
    pub fn from_image(img: &Image8, region: Rect) -> Self {
        let mut hist = Self::default();
        let Some(r) = region.clamp_to(img.width(), img.height()) else {
            return hist;
        };
        let ch = img.channels();
        for y in r.y..r.bottom() {
            let row = img.row(y as u32);
            let start = r.x as usize * ch;
            let end = r.right() as usize * ch;
            for px in row[start..end].chunks_exact(ch) {
                hist.bins[0][px[0] as usize] += 1;
                hist.bins[1][px[1] as usize] += 1;
                hist.bins[2][px[2] as usize] += 1;
            }
        }
        hist.count = r.area();
        hist
    }

    /// Bins of channel `c` (0 = R, 1 = G, 2 = B).
    pub fn channel(&self, c: usize) -> &[u32] {
        &self.bins[c]
    }

    /// Pixels counted.
    pub fn pixel_count(&self) -> u64 {
        self.count
    }

    /// Largest bin over all channels.
    pub fn max(&self) -> u32 {
        self.bins.iter().flatten().copied().max().unwrap_or(0)
    }
}
