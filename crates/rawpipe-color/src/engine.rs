//! The color transform engine.
//!
//! [`ColorTransform`] owns the parameters of one display transform and the
//! lookup tables derived from them. Setters validate their input, keep the
//! previous value on rejection and regenerate the tables synchronously, so
//! the tables always match the parameters at render time.
//!
//! # Example
//!
//! ```rust
//! use rawpipe_color::{ColorTransform, OutputDepth};
//! use rawpipe_core::Image16;
//!
//! let mut ct = ColorTransform::new();
//! ct.set_gamma(1.0).unwrap();
//! assert!(ct.set_gamma(-1.0).is_err());
//! assert_eq!(ct.gamma(), 1.0);
//!
//! let mut src = Image16::new(2, 1, 4);
//! src.pixel_mut(1, 0).copy_from_slice(&[65535, 65535, 65535, 65535]);
//! let out = ct.render(&src, None).unwrap();
//! assert_eq!(out.as_eight().unwrap().pixel(1, 0), &[255, 255, 255]);
//! ```

use crate::cms::CmsHandle;
use crate::histogram::Histogram;
use crate::kernel::{KernelEntry, KernelFn, KernelKey, KernelParams, KernelRegistry, OutputDepth};
use crate::lut::{ToneTables, LUT_SIZE};
use crate::settings::{TransformSettings, DEFAULT_GAMMA};
use crate::{CapabilityTier, ColorError, ColorResult};
use rawpipe_core::{Image16, Image8, ImageBuffer, Rect, Sample};
use rawpipe_math::{identity_samples, ColorMatrix, CubicSpline};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Output of a render call: packed 3-channel RGB.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedImage {
    /// 8-bit output.
    Eight(Image8),
    /// 16-bit output.
    Sixteen(Image16),
}

impl RenderedImage {
    /// Zeroed 3-channel output of the given depth.
    pub fn new(depth: OutputDepth, width: u32, height: u32) -> Self {
        match depth {
            OutputDepth::Eight => Self::Eight(Image8::new(width, height, 3)),
            OutputDepth::Sixteen => Self::Sixteen(Image16::new(width, height, 3)),
        }
    }

    /// Output depth.
    pub fn depth(&self) -> OutputDepth {
        match self {
            Self::Eight(_) => OutputDepth::Eight,
            Self::Sixteen(_) => OutputDepth::Sixteen,
        }
    }

    /// Returns (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Eight(img) => img.dimensions(),
            Self::Sixteen(img) => img.dimensions(),
        }
    }

    /// 8-bit image, if this is 8-bit output.
    pub fn as_eight(&self) -> Option<&Image8> {
        match self {
            Self::Eight(img) => Some(img),
            Self::Sixteen(_) => None,
        }
    }

    /// 16-bit image, if this is 16-bit output.
    pub fn as_sixteen(&self) -> Option<&Image16> {
        match self {
            Self::Sixteen(img) => Some(img),
            Self::Eight(_) => None,
        }
    }

    /// Consumes into the 8-bit image.
    pub fn into_eight(self) -> Option<Image8> {
        match self {
            Self::Eight(img) => Some(img),
            Self::Sixteen(_) => None,
        }
    }

    /// Consumes into the 16-bit image.
    pub fn into_sixteen(self) -> Option<Image16> {
        match self {
            Self::Sixteen(img) => Some(img),
            Self::Eight(_) => None,
        }
    }

    fn channels(&self) -> usize {
        match self {
            Self::Eight(img) => img.channels(),
            Self::Sixteen(img) => img.channels(),
        }
    }
}

/// Premultiply / matrix / gamma / contrast / tone-curve transform.
#[derive(Clone)]
pub struct ColorTransform {
    gamma: f32,
    contrast: f32,
    premultipliers: [f32; 4],
    matrix: ColorMatrix,
    knots: Vec<(f32, f32)>,
    curve: Vec<f32>,
    tables: ToneTables,
    depth: OutputDepth,
    cms: Option<CmsHandle>,
    registry: Arc<KernelRegistry>,
    max_tier: CapabilityTier,
    kernel: Option<KernelEntry>,
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorTransform {
    /// Engine with default parameters, built-in kernels and the detected
    /// CPU tier.
    pub fn new() -> Self {
        Self::with_registry(KernelRegistry::builtin())
    }

    /// Engine selecting kernels from `registry`.
    ///
    /// A registry without a reference kernel for the default key leaves
    /// the engine without a kernel; [`render`](Self::render) then fails.
    pub fn with_registry(registry: Arc<KernelRegistry>) -> Self {
        let curve = identity_samples(LUT_SIZE);
        let tables = ToneTables::generate(DEFAULT_GAMMA, 1.0, &curve);
        let mut ct = Self {
            gamma: DEFAULT_GAMMA,
            contrast: 1.0,
            premultipliers: [1.0; 4],
            matrix: ColorMatrix::IDENTITY,
            knots: Vec::new(),
            curve,
            tables,
            depth: OutputDepth::Eight,
            cms: None,
            registry,
            max_tier: CapabilityTier::detected(),
            kernel: None,
        };
        // Failure is recorded as a missing kernel and reported by render
        let _ = ct.reselect();
        ct
    }

    /// Engine configured from settings.
    pub fn from_settings(settings: &TransformSettings) -> ColorResult<Self> {
        let mut ct = Self::new();
        ct.apply_settings(settings)?;
        Ok(ct)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Display gamma.
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Contrast.
    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    /// Premultipliers `[r, g, b, g2]`.
    pub fn premultipliers(&self) -> [f32; 4] {
        self.premultipliers
    }

    /// Color matrix.
    pub fn color_matrix(&self) -> &ColorMatrix {
        &self.matrix
    }

    /// Tone-curve knots; empty for identity.
    pub fn tone_curve(&self) -> &[(f32, f32)] {
        &self.knots
    }

    /// Sampled tone curve ([`LUT_SIZE`] entries).
    pub fn curve_samples(&self) -> &[f32] {
        &self.curve
    }

    /// Current lookup tables.
    pub fn tables(&self) -> &ToneTables {
        &self.tables
    }

    /// Output depth.
    pub fn output_depth(&self) -> OutputDepth {
        self.depth
    }

    /// Attached CMS handle.
    pub fn color_management(&self) -> Option<&CmsHandle> {
        self.cms.as_ref()
    }

    /// Highest CPU tier kernels may use.
    pub fn max_tier(&self) -> CapabilityTier {
        self.max_tier
    }

    /// Selected kernel, if the registry could provide one.
    pub fn kernel(&self) -> Option<&KernelEntry> {
        self.kernel.as_ref()
    }

    /// Current parameters as settings.
    pub fn settings(&self) -> TransformSettings {
        TransformSettings {
            gamma: self.gamma,
            contrast: self.contrast,
            premultipliers: self.premultipliers,
            matrix: self.matrix.to_vec(),
            curve: self.knots.iter().map(|&(x, y)| [x, y]).collect(),
            output_depth: self.depth,
        }
    }

    // ========================================================================
    // Setters
    // ========================================================================

    /// Sets display gamma and regenerates the tables.
    ///
    /// # Errors
    ///
    /// [`ColorError::InvalidParameter`] unless `gamma` is finite and > 0.
    pub fn set_gamma(&mut self, gamma: f32) -> ColorResult<()> {
        check_positive("gamma", gamma)?;
        if gamma != self.gamma {
            self.gamma = gamma;
            self.regenerate();
        }
        Ok(())
    }

    /// Sets contrast and regenerates the tables.
    ///
    /// # Errors
    ///
    /// [`ColorError::InvalidParameter`] unless `contrast` is finite and > 0.
    pub fn set_contrast(&mut self, contrast: f32) -> ColorResult<()> {
        check_positive("contrast", contrast)?;
        if contrast != self.contrast {
            self.contrast = contrast;
            self.regenerate();
        }
        Ok(())
    }

    /// Sets per-channel multipliers `[r, g, b, g2]`.
    pub fn set_premultipliers(&mut self, premultipliers: [f32; 4]) -> ColorResult<()> {
        for &p in &premultipliers {
            check_positive("premultipliers", p)?;
        }
        self.premultipliers = premultipliers;
        Ok(())
    }

    /// Replaces the color matrix.
    pub fn set_color_matrix(&mut self, matrix: ColorMatrix) {
        self.matrix = matrix;
    }

    /// Sets tone-curve knots; an empty slice selects the identity curve.
    ///
    /// Returns `true` if the curve changed. Invalid knots are logged and
    /// ignored.
    pub fn set_tone_curve(&mut self, knots: &[(f32, f32)]) -> bool {
        match self.try_set_tone_curve(knots) {
            Ok(changed) => changed,
            Err(e) => {
                warn!(error = %e, "tone curve rejected");
                false
            }
        }
    }

    /// Like [`set_tone_curve`](Self::set_tone_curve) but reports invalid knots.
    pub fn try_set_tone_curve(&mut self, knots: &[(f32, f32)]) -> ColorResult<bool> {
        let Some(curve) = self.curve_for(knots)? else {
            return Ok(false);
        };
        self.knots = knots.to_vec();
        self.curve = curve;
        self.regenerate();
        Ok(true)
    }

    /// Sets output depth and reselects the kernel.
    pub fn set_output_depth(&mut self, depth: OutputDepth) -> ColorResult<()> {
        self.depth = depth;
        self.reselect()
    }

    /// Attaches or detaches a CMS handle and reselects the kernel.
    pub fn attach_color_management(&mut self, cms: Option<CmsHandle>) -> ColorResult<()> {
        if let Some(c) = &cms {
            debug!(cms = c.name(), "attach color management");
        }
        self.cms = cms;
        self.reselect()
    }

    /// Caps the CPU tier used for kernel selection.
    pub fn set_max_tier(&mut self, tier: CapabilityTier) -> ColorResult<()> {
        self.max_tier = tier;
        self.reselect()
    }

    /// Replaces the kernel registry.
    pub fn set_registry(&mut self, registry: Arc<KernelRegistry>) -> ColorResult<()> {
        self.registry = registry;
        self.reselect()
    }

    /// Applies all settings at once.
    ///
    /// Everything is validated before anything is applied; on error the
    /// engine is unchanged.
    pub fn apply_settings(&mut self, s: &TransformSettings) -> ColorResult<()> {
        check_positive("gamma", s.gamma)?;
        check_positive("contrast", s.contrast)?;
        for &p in &s.premultipliers {
            check_positive("premultipliers", p)?;
        }
        let matrix = s.color_matrix()?;
        let knots = s.knots();
        let curve = self.curve_for(&knots)?;

        let regen = curve.is_some() || s.gamma != self.gamma || s.contrast != self.contrast;
        self.gamma = s.gamma;
        self.contrast = s.contrast;
        self.premultipliers = s.premultipliers;
        self.matrix = matrix;
        if let Some(curve) = curve {
            self.knots = knots;
            self.curve = curve;
        }
        if regen {
            self.regenerate();
        }
        if s.output_depth != self.depth {
            self.set_output_depth(s.output_depth)?;
        }
        Ok(())
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Renders `src` (3 or 4 channels) into a new full-size 3-channel buffer.
    ///
    /// With a region, only the pixels inside it (clamped to the image) are
    /// written; the rest of the buffer stays zero.
    pub fn render(&self, src: &Image16, roi: Option<Rect>) -> ColorResult<RenderedImage> {
        let entry = self.current_kernel()?;
        let mut out = RenderedImage::new(self.depth, src.width(), src.height());
        self.run(&entry, src, roi, &mut out)?;
        Ok(out)
    }

    /// Renders at `depth` instead of the configured output depth.
    ///
    /// Used by graph nodes that serve both a 16-bit and an 8-bit preview
    /// from one engine.
    pub fn render_as(
        &self,
        src: &Image16,
        roi: Option<Rect>,
        depth: OutputDepth,
    ) -> ColorResult<RenderedImage> {
        let entry = if depth == self.depth {
            self.current_kernel()?
        } else {
            let key = KernelKey::new(depth, self.cms.is_some());
            *self.registry.select(key, self.max_tier)?
        };
        let mut out = RenderedImage::new(depth, src.width(), src.height());
        self.run(&entry, src, roi, &mut out)?;
        Ok(out)
    }

    /// Renders into an existing buffer of the current depth and the
    /// source's dimensions. Pixels outside the region are left untouched.
    pub fn render_into(
        &self,
        src: &Image16,
        roi: Option<Rect>,
        out: &mut RenderedImage,
    ) -> ColorResult<()> {
        let entry = self.current_kernel()?;
        if out.dimensions() != src.dimensions() || out.channels() != 3 {
            return Err(ColorError::OutputMismatch(format!(
                "output {:?}x{} for source {:?}",
                out.dimensions(),
                out.channels(),
                src.dimensions()
            )));
        }
        self.run(&entry, src, roi, out)
    }

    /// Histogram of the 8-bit rendering of `src` (optionally a region).
    ///
    /// Uses the same pipeline as [`render`](Self::render), including CMS
    /// staging, regardless of the configured output depth.
    pub fn compute_histogram(&self, src: &Image16, roi: Option<Rect>) -> ColorResult<Histogram> {
        let key = KernelKey::new(OutputDepth::Eight, self.cms.is_some());
        let entry = *self.registry.select(key, self.max_tier)?;
        let mut preview = RenderedImage::new(OutputDepth::Eight, src.width(), src.height());
        self.run(&entry, src, roi, &mut preview)?;
        let region = roi.unwrap_or_else(|| src.bounds());
        Ok(match &preview {
            RenderedImage::Eight(img) => Histogram::from_image(img, region),
            RenderedImage::Sixteen(_) => Histogram::default(),
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn kernel_key(&self) -> KernelKey {
        KernelKey::new(self.depth, self.cms.is_some())
    }

    fn current_kernel(&self) -> ColorResult<KernelEntry> {
        self.kernel
            .ok_or_else(|| ColorError::NoReferenceKernel(self.kernel_key()))
    }

    fn reselect(&mut self) -> ColorResult<()> {
        let key = self.kernel_key();
        match self.registry.select(key, self.max_tier) {
            Ok(entry) => {
                debug!(kernel = entry.name, key = %key, tier = %self.max_tier, "kernel selected");
                self.kernel = Some(*entry);
                Ok(())
            }
            Err(e) => {
                warn!(key = %key, "no kernel available");
                self.kernel = None;
                Err(e)
            }
        }
    }

    /// Samples for `knots`, or `None` if they equal the cached knots.
    fn curve_for(&self, knots: &[(f32, f32)]) -> ColorResult<Option<Vec<f32>>> {
        if knots == self.knots.as_slice() {
            return Ok(None);
        }
        if knots.is_empty() {
            return Ok(Some(identity_samples(LUT_SIZE)));
        }
        let spline = CubicSpline::new(knots).ok_or_else(|| {
            ColorError::InvalidCurve(format!(
                "{} knots; need at least 2 with strictly ascending finite x",
                knots.len()
            ))
        })?;
        Ok(Some(spline.sample(LUT_SIZE)))
    }

    fn regenerate(&mut self) {
        let start = Instant::now();
        self.tables = ToneTables::generate(self.gamma, self.contrast, &self.curve);
        debug!(
            gamma = self.gamma,
            contrast = self.contrast,
            knots = self.knots.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "LUTs regenerated"
        );
    }

    fn params(&self, src_channels: usize) -> KernelParams<'_> {
        KernelParams {
            src_channels,
            premultipliers: self.premultipliers,
            matrix: &self.matrix,
            lut8: self.tables.lut8(),
            lut16: self.tables.lut16(),
            cms: self.cms.as_deref(),
        }
    }

    fn run(
        &self,
        entry: &KernelEntry,
        src: &Image16,
        roi: Option<Rect>,
        out: &mut RenderedImage,
    ) -> ColorResult<()> {
        if src.channels() < 3 {
            return Err(rawpipe_core::Error::UnsupportedChannels {
                channels: src.channels(),
                expected: "3 or 4",
            }
            .into());
        }
        let region = match roi {
            Some(r) => r.clamp_to(src.width(), src.height()),
            None => src.bounds().clamp_to(src.width(), src.height()),
        };
        let Some(region) = region else {
            trace!(?roi, "nothing to render");
            return Ok(());
        };

        let start = Instant::now();
        let p = self.params(src.channels());
        match (entry.run, out) {
            (KernelFn::Eight(run), RenderedImage::Eight(img)) => dispatch(run, src, region, img, &p),
            (KernelFn::Sixteen(run), RenderedImage::Sixteen(img)) => {
                dispatch(run, src, region, img, &p)
            }
            (run, out) => {
                return Err(ColorError::OutputMismatch(format!(
                    "kernel '{}' writes {}, buffer is {}",
                    entry.name,
                    run.depth(),
                    out.depth()
                )));
            }
        }
        trace!(
            kernel = entry.name,
            width = region.width,
            height = region.height,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "render"
        );
        Ok(())
    }
}

impl fmt::Debug for ColorTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorTransform")
            .field("gamma", &self.gamma)
            .field("contrast", &self.contrast)
            .field("premultipliers", &self.premultipliers)
            .field("matrix", &self.matrix)
            .field("knots", &self.knots)
            .field("depth", &self.depth)
            .field("cms", &self.cms)
            .field("kernel", &self.kernel.map(|k| k.name))
            .finish()
    }
}

type RowKernel<T> = fn(usize, usize, &[u16], usize, &mut [T], usize, &KernelParams<'_>);

/// Runs `kernel` over `region` in parallel bands of rows.
fn dispatch<T: Sample>(
    kernel: RowKernel<T>,
    src: &Image16,
    region: Rect,
    dst: &mut ImageBuffer<T>,
    p: &KernelParams<'_>,
) {
    let width = region.width as usize;
    let height = region.height as usize;
    let x0 = region.x as usize;
    let y0 = region.y as usize;
    let ch = src.channels();
    let src_stride = src.stride();
    let dst_stride = dst.stride();
    let band = height.div_ceil(rayon::current_num_threads() * 4).max(1);

    let src_data = src.data();
    let rows = &mut dst.data_mut()[y0 * dst_stride..(y0 + height) * dst_stride];
    rows.par_chunks_mut(band * dst_stride)
        .enumerate()
        .for_each(|(i, chunk)| {
            let y = y0 + i * band;
            let n = chunk.len() / dst_stride;
            let s = &src_data[y * src_stride + x0 * ch..];
            kernel(width, n, s, src_stride, &mut chunk[x0 * 3..], dst_stride, p);
        });
}

fn check_positive(name: &'static str, value: f32) -> ColorResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        warn!(name, value, "rejected parameter");
        Err(ColorError::invalid(name, value))
    }
}
