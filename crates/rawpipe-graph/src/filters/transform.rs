//! Color transform stage.

use super::impl_any;
use crate::change::ChangeMask;
use crate::filter::{Filter, PropertySpec, PropertyWrite, Upstream};
use crate::request::FilterRequest;
use crate::response::FilterResponse;
use crate::value::{Value, ValueKind};
use rawpipe_color::{
    CmsHandle, ColorMatrix, ColorResult, ColorTransform, OutputDepth, RenderedImage,
    TransformSettings,
};
use std::sync::Arc;
use tracing::warn;

const PROPERTIES: &[PropertySpec] = &[
    PropertySpec::rw("gamma", ValueKind::Float),
    PropertySpec::rw("contrast", ValueKind::Float),
    PropertySpec::rw("premultipliers", ValueKind::FloatList),
    PropertySpec::rw("matrix", ValueKind::FloatList),
    PropertySpec::rw("curve", ValueKind::FloatList),
    PropertySpec::rw("settings", ValueKind::Str),
];

/// Runs a [`ColorTransform`] over the upstream 16-bit image.
///
/// The 16-bit path renders 16-bit output and the 8-bit path renders the
/// display preview, both from the same engine. A requested region is
/// honoured: the response buffer is full size and only the region is
/// valid.
#[derive(Debug, Default)]
pub struct ColorTransformFilter {
    engine: ColorTransform,
}

impl ColorTransformFilter {
    /// Registry name.
    pub const NAME: &'static str = "ColorTransform";

    /// Wraps an engine.
    pub fn new(engine: ColorTransform) -> Self {
        Self { engine }
    }

    /// The engine.
    pub fn engine(&self) -> &ColorTransform {
        &self.engine
    }

    /// Mutable engine. Callers going through
    /// [`FilterNode::update`](crate::FilterNode::update) return
    /// [`ChangeMask::PIXELDATA`] after changing parameters.
    pub fn engine_mut(&mut self) -> &mut ColorTransform {
        &mut self.engine
    }

    /// Attaches or detaches color management; returns the change to notify.
    pub fn set_color_management(&mut self, cms: Option<CmsHandle>) -> ColorResult<ChangeMask> {
        self.engine.attach_color_management(cms)?;
        Ok(ChangeMask::PROFILE)
    }

    fn render(
        &self,
        upstream: &Upstream,
        request: &FilterRequest,
        depth: OutputDepth,
    ) -> FilterResponse {
        let up = upstream.get_image(request);
        let mut resp = FilterResponse::empty();
        resp.inherit(&up);
        let (w, h) = up.dimensions();
        resp.set_dimensions(w, h);
        resp.set_roi(request.roi());

        let Some(src) = up.image() else {
            return resp;
        };
        match self.engine.render_as(src, request.roi(), depth) {
            Ok(RenderedImage::Sixteen(img)) => resp.set_image(Some(Arc::new(img))),
            Ok(RenderedImage::Eight(img)) => resp.set_image8(Some(Arc::new(img))),
            Err(e) => warn!(error = %e, %depth, "color transform failed"),
        }
        resp
    }

    fn write(&mut self, name: &str, value: &Value) -> Result<bool, String> {
        let e = &mut self.engine;
        match name {
            "gamma" | "contrast" => {
                let v = value
                    .as_f32()
                    .ok_or_else(|| format!("expected number, got {}", value))?;
                let current = if name == "gamma" { e.gamma() } else { e.contrast() };
                if v == current {
                    return Ok(false);
                }
                let r = if name == "gamma" { e.set_gamma(v) } else { e.set_contrast(v) };
                r.map_err(|err| err.to_string())?;
                Ok(true)
            }
            "premultipliers" => {
                let list = float_list(value)?;
                let p: [f32; 4] = list
                    .try_into()
                    .map_err(|_| format!("expected 4 values, got {}", list.len()))?;
                if p == e.premultipliers() {
                    return Ok(false);
                }
                e.set_premultipliers(p).map_err(|err| err.to_string())?;
                Ok(true)
            }
            "matrix" => {
                let list = float_list(value)?;
                let m = ColorMatrix::from_slice(list)
                    .ok_or_else(|| format!("expected 9 or 16 finite values, got {}", list.len()))?;
                if &m == e.color_matrix() {
                    return Ok(false);
                }
                e.set_color_matrix(m);
                Ok(true)
            }
            "curve" => {
                let list = float_list(value)?;
                if list.len() % 2 != 0 {
                    return Err(format!("odd number of curve values: {}", list.len()));
                }
                let knots: Vec<(f32, f32)> = list.chunks_exact(2).map(|k| (k[0], k[1])).collect();
                e.try_set_tone_curve(&knots).map_err(|err| err.to_string())
            }
            "settings" => {
                let yaml = value
                    .as_str()
                    .ok_or_else(|| format!("expected string, got {}", value))?;
                let s = TransformSettings::from_yaml(yaml).map_err(|err| err.to_string())?;
                if s == e.settings() {
                    return Ok(false);
                }
                e.apply_settings(&s).map_err(|err| err.to_string())?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn float_list(value: &Value) -> Result<&[f32], String> {
    value
        .as_float_list()
        .ok_or_else(|| format!("expected float list, got {}", value))
}

impl Filter for ColorTransformFilter {
    fn type_name(&self) -> &'static str {
        Self::NAME
    }

    fn get_image(&mut self, upstream: &Upstream, request: &FilterRequest) -> FilterResponse {
        self.render(upstream, request, OutputDepth::Sixteen)
    }

    fn get_image8(&mut self, upstream: &Upstream, request: &FilterRequest) -> FilterResponse {
        self.render(upstream, request, OutputDepth::Eight)
    }

    fn property_specs(&self) -> &'static [PropertySpec] {
        PROPERTIES
    }

    fn set_property(&mut self, name: &str, value: &Value) -> PropertyWrite {
        if !PROPERTIES.iter().any(|p| p.name == name) {
            return PropertyWrite::Unknown;
        }
        match self.write(name, value) {
            Ok(true) => PropertyWrite::Changed(ChangeMask::PIXELDATA),
            Ok(false) => PropertyWrite::Unchanged,
            Err(reason) => PropertyWrite::Rejected(reason),
        }
    }

    fn property(&self, name: &str) -> Option<Value> {
        let e = &self.engine;
        match name {
            "gamma" => Some(Value::from(e.gamma())),
            "contrast" => Some(Value::from(e.contrast())),
            "premultipliers" => Some(Value::from(e.premultipliers().to_vec())),
            "matrix" => Some(Value::from(e.color_matrix().to_vec())),
            "curve" => Some(Value::from(
                e.tone_curve().iter().flat_map(|&(x, y)| [x, y]).collect::<Vec<f32>>(),
            )),
            "settings" => e.settings().to_yaml().ok().map(Value::from),
            _ => None,
        }
    }

    impl_any!();
}
