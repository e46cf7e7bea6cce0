//! The [`Filter`] trait implemented by every node's stage logic.
//!
//! A filter computes its output from the output of the node before it,
//! reachable through [`Upstream`]. Every method has a pass-through default,
//! so a filter only overrides what it changes.
//!
//! # Example
//!
//! ```rust
//! use rawpipe_graph::{Filter, FilterNode, FilterRequest, FilterResponse, Upstream};
//! use std::any::Any;
//!
//! /// Reports half the upstream size.
//! struct Half;
//!
//! impl Filter for Half {
//!     fn type_name(&self) -> &'static str {
//!         "Half"
//!     }
//!
//!     fn get_size(&mut self, up: &Upstream, request: &FilterRequest) -> (u32, u32) {
//!         let (w, h) = up.get_size(request);
//!         (w / 2, h / 2)
//!     }
//!
//!     fn as_any(&self) -> &dyn Any { self }
//!     fn as_any_mut(&mut self) -> &mut dyn Any { self }
//! }
//!
//! let node = FilterNode::from_filter(Half);
//! assert_eq!(node.get_size(&FilterRequest::new()), (0, 0));
//! ```

use crate::change::ChangeMask;
use crate::node::{FilterNode, NodeId};
use crate::request::FilterRequest;
use crate::response::FilterResponse;
use crate::value::{Value, ValueKind};
use std::any::Any;

/// Handle to the node feeding a filter.
#[derive(Debug, Clone, Default)]
pub struct Upstream {
    previous: Option<FilterNode>,
}

impl Upstream {
    pub(crate) fn new(previous: Option<FilterNode>) -> Self {
        Self { previous }
    }

    /// Previous node, if any.
    pub fn node(&self) -> Option<&FilterNode> {
        self.previous.as_ref()
    }

    /// 16-bit output of the previous node; empty for a root.
    pub fn get_image(&self, request: &FilterRequest) -> FilterResponse {
        match &self.previous {
            Some(node) => node.get_image(request),
            None => FilterResponse::empty(),
        }
    }

    /// 8-bit output of the previous node; empty for a root.
    pub fn get_image8(&self, request: &FilterRequest) -> FilterResponse {
        match &self.previous {
            Some(node) => node.get_image8(request),
            None => FilterResponse::empty(),
        }
    }

    /// Output size of the previous node; `(0, 0)` for a root.
    pub fn get_size(&self, request: &FilterRequest) -> (u32, u32) {
        match &self.previous {
            Some(node) => node.get_size(request),
            None => (0, 0),
        }
    }
}

/// Static description of one filter property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    /// Property name.
    pub name: &'static str,
    /// Value kind accepted and returned.
    pub kind: ValueKind,
    /// Can be read through [`Filter::property`].
    pub readable: bool,
    /// Can be written through [`Filter::set_property`].
    pub writable: bool,
}

impl PropertySpec {
    /// Read-write property.
    pub const fn rw(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            readable: true,
            writable: true,
        }
    }

    /// Read-only property.
    pub const fn ro(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            readable: true,
            writable: false,
        }
    }
}

/// Outcome of [`Filter::set_property`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyWrite {
    /// The filter has no writable property of that name.
    Unknown,
    /// The value was invalid and ignored.
    Rejected(String),
    /// Accepted, but equal to the current value.
    Unchanged,
    /// Accepted and applied; downstream must be notified with this mask.
    Changed(ChangeMask),
}

impl PropertyWrite {
    /// Returns `true` if the filter took the value.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Unchanged | Self::Changed(_))
    }
}

/// Stage logic of a [`FilterNode`].
///
/// Implementations are owned by exactly one node and called with that
/// node's filter lock held, so `&mut self` is exclusive.
pub trait Filter: Send + 'static {
    /// Registry name of this filter type.
    fn type_name(&self) -> &'static str;

    /// Produces 16-bit output. Default: pass upstream output through.
    fn get_image(&mut self, upstream: &Upstream, request: &FilterRequest) -> FilterResponse {
        upstream.get_image(request)
    }

    /// Produces 8-bit output. Default: pass upstream output through.
    fn get_image8(&mut self, upstream: &Upstream, request: &FilterRequest) -> FilterResponse {
        upstream.get_image8(request)
    }

    /// Predicts output size. Default: upstream size.
    fn get_size(&mut self, upstream: &Upstream, request: &FilterRequest) -> (u32, u32) {
        upstream.get_size(request)
    }

    /// Reacts to a change of the upstream node `origin` and returns the
    /// mask to forward downstream (empty stops propagation). Default:
    /// forward unchanged.
    ///
    /// When this node is relinked, `origin` is the new upstream, or the old
    /// one after a detach.
    fn upstream_changed(&mut self, _origin: NodeId, mask: ChangeMask) -> ChangeMask {
        mask
    }

    /// Property table.
    fn property_specs(&self) -> &'static [PropertySpec] {
        &[]
    }

    /// Writes a property listed as writable in [`property_specs`](Self::property_specs).
    fn set_property(&mut self, _name: &str, _value: &Value) -> PropertyWrite {
        PropertyWrite::Unknown
    }

    /// Reads a property listed as readable in [`property_specs`](Self::property_specs).
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Upcast for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Looks up `name` in a property table.
pub fn find_spec(specs: &[PropertySpec], name: &str) -> Option<PropertySpec> {
    specs.iter().find(|s| s.name == name).copied()
}
