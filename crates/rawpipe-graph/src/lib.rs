//! # rawpipe-graph
//!
//! Pull-based image filter graph.
//!
//! A pipeline is a chain of [`FilterNode`]s, each wrapping one [`Filter`].
//! Output is pulled from the last node; every node asks its upstream for
//! exactly the region it needs. Parameter changes are pushed the other way
//! as [`ChangeMask`]s so caches and views downstream can react.
//!
//! ```text
//!  pull  ─────────────────────────────────────────────►
//!  InputImage16 ◄── Crop ◄── ColorTransform ◄── Cache ◄── view
//!  ◄──────────────────────────────────────────── notify
//! ```
//!
//! # Modules
//!
//! - [`node`] - [`FilterNode`] handles, links and notification
//! - [`filter`] - The [`Filter`] trait and [`Upstream`] access
//! - [`filters`] - Built-in filter types
//! - [`registry`] - Name to constructor lookup
//! - [`request`] / [`response`] - What flows through a pull
//! - [`change`] - Change masks and events
//! - [`value`] - Dynamic property values
//!
//! # Example
//!
//! ```rust
//! use rawpipe_core::{Image16, Rect};
//! use rawpipe_graph::{FilterNode, FilterRequest, Value};
//! use rawpipe_graph::filters::InputImage16;
//! use std::sync::Arc;
//!
//! let input = FilterNode::from_filter(InputImage16::new(Arc::new(Image16::new(64, 48, 4))));
//! let crop = FilterNode::new("Crop", Some(&input)).unwrap();
//! crop.set_property("rectangle", &Value::Rect(Rect::new(8, 8, 32, 16)));
//! let view = FilterNode::new("ColorTransform", Some(&crop)).unwrap();
//!
//! let preview = view.get_image8(&FilterRequest::new());
//! assert_eq!(preview.image8().unwrap().dimensions(), (32, 16));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod change;
pub mod error;
pub mod filter;
pub mod filters;
pub mod node;
pub mod registry;
pub mod request;
pub mod response;
pub mod value;

pub use change::{ChangeEvent, ChangeMask};
pub use error::{GraphError, GraphResult};
pub use filter::{find_spec, Filter, PropertySpec, PropertyWrite, Upstream};
pub use node::{FilterNode, NodeId, ObserverId};
pub use registry::{FilterConstructor, FilterInfo, FilterRegistry};
pub use request::FilterRequest;
pub use response::FilterResponse;
pub use value::{Properties, Value, ValueKind};
