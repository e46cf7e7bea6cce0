//! Filter nodes and the links between them.
//!
//! A [`FilterNode`] is a cheap, cloneable handle to one stage of a linear
//! pipeline. Each node owns a strong link to its previous (upstream) node and
//! keeps weak links to the nodes after it, used only to fan out change
//! notifications:
//!
//! ```text
//! InputImage16 ◄── Crop ◄── ColorTransform ◄── Cache      (strong, upstream)
//!      │            │             │
//!      └──────────► └───────────► └──────────►             (weak, downstream)
//! ```
//!
//! Dropping the last handle to a node unlinks it from its upstream's
//! downstream set.
//!
//! # Example
//!
//! ```rust
//! use rawpipe_graph::{FilterNode, FilterRequest};
//! use rawpipe_graph::filters::InputImage16;
//! use rawpipe_core::Image16;
//! use std::sync::Arc;
//!
//! let input = FilterNode::from_filter(InputImage16::new(Arc::new(Image16::new(10, 10, 4))));
//! let crop = FilterNode::new("Crop", Some(&input)).unwrap();
//! assert_eq!(crop.get_size(&FilterRequest::new()), (10, 10));
//! ```

use crate::change::{ChangeEvent, ChangeMask};
use crate::filter::{find_spec, Filter, PropertyWrite, Upstream};
use crate::registry::FilterRegistry;
use crate::request::FilterRequest;
use crate::response::FilterResponse;
use crate::value::Value;
use rawpipe_core::Rect;
use crate::{GraphError, GraphResult};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Instant;
use tracing::{debug, trace};

/// Process-unique node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Handle returned by [`FilterNode::connect_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct Observers {
    next_id: u64,
    callbacks: Vec<(ObserverId, Callback)>,
    channels: Vec<Sender<ChangeEvent>>,
}

struct NodeInner {
    id: NodeId,
    type_name: &'static str,
    label: RwLock<Option<String>>,
    enabled: AtomicBool,
    previous: RwLock<Option<FilterNode>>,
    next: Mutex<Vec<Weak<NodeInner>>>,
    filter: Mutex<Box<dyn Filter>>,
    observers: Mutex<Observers>,
}

impl Drop for NodeInner {
    fn drop(&mut self) {
        let previous = self
            .previous
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(prev) = previous {
            // Our own weak entry is dead by now
            lock(&prev.0.next).retain(|w| w.strong_count() > 0);
        }
    }
}

/// Shared handle to a node in a filter graph.
///
/// Cloning the handle does not clone the node. Equality is identity.
#[derive(Clone)]
pub struct FilterNode(Arc<NodeInner>);

impl FilterNode {
    /// Creates a node of a registered filter type, optionally linked after
    /// `previous`.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownFilterType`] if `type_name` is not registered.
    pub fn new(type_name: &str, previous: Option<&FilterNode>) -> GraphResult<Self> {
        let filter = FilterRegistry::global().create(type_name)?;
        let node = Self::from_boxed(filter);
        if let Some(prev) = previous {
            node.set_previous(prev)?;
        }
        Ok(node)
    }

    /// Wraps a filter instance in a new unlinked node.
    pub fn from_filter<F: Filter>(filter: F) -> Self {
        Self::from_boxed(Box::new(filter))
    }

    /// Wraps a boxed filter in a new unlinked node.
    pub fn from_boxed(filter: Box<dyn Filter>) -> Self {
        let id = NodeId::next();
        let type_name = filter.type_name();
        trace!(%id, type_name, "node created");
        Self(Arc::new(NodeInner {
            id,
            type_name,
            label: RwLock::new(None),
            enabled: AtomicBool::new(true),
            previous: RwLock::new(None),
            next: Mutex::new(Vec::new()),
            filter: Mutex::new(filter),
            observers: Mutex::new(Observers::default()),
        }))
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Node identifier.
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    /// Filter type name.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name
    }

    /// Debug label.
    pub fn label(&self) -> Option<String> {
        read(&self.0.label).clone()
    }

    /// Sets the debug label.
    pub fn set_label(&self, label: impl Into<String>) {
        *write(&self.0.label) = Some(label.into());
    }

    /// Returns `true` if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &FilterNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // ========================================================================
    // Links
    // ========================================================================

    /// Upstream node.
    pub fn previous(&self) -> Option<FilterNode> {
        read(&self.0.previous).clone()
    }

    /// Live downstream nodes.
    pub fn downstream(&self) -> Vec<FilterNode> {
        let mut next = lock(&self.0.next);
        next.retain(|w| w.strong_count() > 0);
        next.iter().filter_map(|w| w.upgrade().map(FilterNode)).collect()
    }

    /// Links this node after `previous`, unlinking it from its old upstream,
    /// and notifies a dimension change.
    ///
    /// # Errors
    ///
    /// [`GraphError::SelfReference`] or [`GraphError::Cycle`]; the link is
    /// left unchanged.
    pub fn set_previous(&self, previous: &FilterNode) -> GraphResult<()> {
        if self.ptr_eq(previous) {
            return Err(GraphError::SelfReference(self.id()));
        }
        if previous.chain().iter().any(|n| n.ptr_eq(self)) {
            return Err(GraphError::Cycle {
                node: self.id(),
                previous: previous.id(),
            });
        }
        if self.previous().is_some_and(|p| p.ptr_eq(previous)) {
            return Ok(());
        }

        let old = write(&self.0.previous).replace(previous.clone());
        if let Some(old) = old {
            old.remove_downstream(self);
        }
        lock(&previous.0.next).push(Arc::downgrade(&self.0));
        debug!(node = %self, previous = %previous, "linked");

        self.input_replaced(previous.id());
        Ok(())
    }

    /// Removes the upstream link and notifies a dimension change.
    pub fn detach(&self) {
        let old = write(&self.0.previous).take();
        if let Some(old) = old {
            old.remove_downstream(self);
            debug!(node = %self, previous = %old, "detached");
            self.input_replaced(old.id());
        }
    }

    // The filter's own input changed as well as everything downstream.
    fn input_replaced(&self, origin: NodeId) {
        self.lock_filter().upstream_changed(origin, ChangeMask::DIMENSION);
        self.notify_changed(ChangeMask::DIMENSION);
    }

    fn remove_downstream(&self, node: &FilterNode) {
        let target = Arc::as_ptr(&node.0);
        lock(&self.0.next).retain(|w| w.strong_count() > 0 && w.as_ptr() != target);
    }

    /// This node followed by every node up to the root.
    pub fn chain(&self) -> Vec<FilterNode> {
        let mut chain = vec![self.clone()];
        let mut cur = self.previous();
        while let Some(node) = cur {
            cur = node.previous();
            chain.push(node);
        }
        chain
    }

    /// Graphviz description of the graph reachable from this node's root.
    pub fn to_dot(&self) -> String {
        let root = self.chain().pop().unwrap_or_else(|| self.clone());
        let mut out = String::from("digraph rawpipe {\n");
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !seen.insert(node.id()) {
                continue;
            }
            let name = match node.label() {
                Some(label) => format!("{} ({})", node.type_name(), label),
                None => node.type_name().to_string(),
            };
            let style = if node.is_enabled() { "" } else { ", style=dashed" };
            out.push_str(&format!("  n{} [label=\"{}\"{}];\n", node.id().get(), name, style));
            for next in node.downstream() {
                out.push_str(&format!("  n{} -> n{};\n", node.id().get(), next.id().get()));
                stack.push(next);
            }
        }
        out.push_str("}\n");
        out
    }

    // ========================================================================
    // Enable / disable
    // ========================================================================

    /// Returns `true` if the filter is active.
    pub fn is_enabled(&self) -> bool {
        self.0.enabled.load(Ordering::Acquire)
    }

    /// Enables or disables the filter; a disabled node passes upstream
    /// output through. Returns the previous state.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        let was = self.0.enabled.swap(enabled, Ordering::AcqRel);
        if was != enabled {
            debug!(node = %self, enabled, "toggled");
            self.notify_changed(ChangeMask::DIMENSION);
        }
        was
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    fn upstream(&self) -> Upstream {
        Upstream::new(self.previous())
    }

    /// Predicted output size.
    pub fn get_size(&self, request: &FilterRequest) -> (u32, u32) {
        let upstream = self.upstream();
        if !self.is_enabled() {
            return upstream.get_size(request);
        }
        self.lock_filter().get_size(&upstream, request)
    }

    /// Evaluates 16-bit output.
    ///
    /// The request's region is clamped to this node's size first. A region
    /// with nothing inside the image is not evaluated at all: the response
    /// carries no pixels, this node's dimensions and an empty ROI at the
    /// origin.
    pub fn get_image(&self, request: &FilterRequest) -> FilterResponse {
        self.evaluate(request, "get_image", |f, up, req| f.get_image(up, req), Upstream::get_image)
    }

    /// Evaluates 8-bit output, clamping the region like [`get_image`](Self::get_image).
    pub fn get_image8(&self, request: &FilterRequest) -> FilterResponse {
        self.evaluate(request, "get_image8", |f, up, req| f.get_image8(up, req), Upstream::get_image8)
    }

    fn evaluate(
        &self,
        request: &FilterRequest,
        op: &'static str,
        run: impl FnOnce(&mut dyn Filter, &Upstream, &FilterRequest) -> FilterResponse,
        pass: impl FnOnce(&Upstream, &FilterRequest) -> FilterResponse,
    ) -> FilterResponse {
        let size = self.get_size(request);
        let Some(clamped) = clamp_request(request, size) else {
            trace!(node = %self, op, roi = ?request.roi(), "region outside image");
            let mut response = FilterResponse::empty();
            response.set_dimensions(size.0, size.1);
            response.set_roi(Some(Rect::default()));
            return response;
        };
        let request: &FilterRequest = &clamped;
        let upstream = self.upstream();
        if !self.is_enabled() {
            trace!(node = %self, op, "disabled, passing through");
            return pass(&upstream, request);
        }

        let start = Instant::now();
        let mut response = {
            let mut filter = self.lock_filter();
            run(&mut **filter, &upstream, request)
        };
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        response.set_property(format!("{}-time", self.type_name()), ms);
        trace!(node = %self, op, roi = ?request.roi(), quick = request.is_quick(), ms, "evaluated");
        response
    }

    // ========================================================================
    // Change propagation
    // ========================================================================

    /// Notifies every downstream node depth-first, then this node's observers.
    ///
    /// Each downstream filter sees this node's id and the mask in
    /// [`Filter::upstream_changed`] and decides what to forward.
    pub fn notify_changed(&self, mask: ChangeMask) {
        if mask.is_empty() {
            return;
        }
        trace!(node = %self, ?mask, "changed");
        for node in self.downstream() {
            let forward = node.lock_filter().upstream_changed(self.id(), mask);
            node.notify_changed(forward);
        }
        self.emit(ChangeEvent {
            node: self.id(),
            type_name: self.type_name(),
            mask,
        });
    }

    fn emit(&self, event: ChangeEvent) {
        let callbacks: Vec<Callback> = {
            let mut obs = lock(&self.0.observers);
            obs.channels.retain(|tx| tx.send(event.clone()).is_ok());
            obs.callbacks.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for cb in callbacks {
            cb(&event);
        }
    }

    /// Registers a change callback, called after downstream propagation.
    pub fn connect_changed<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let mut obs = lock(&self.0.observers);
        obs.next_id += 1;
        let id = ObserverId(obs.next_id);
        obs.callbacks.push((id, Arc::new(callback)));
        id
    }

    /// Removes a callback. Returns `false` if it was not connected.
    pub fn disconnect(&self, id: ObserverId) -> bool {
        let mut obs = lock(&self.0.observers);
        let before = obs.callbacks.len();
        obs.callbacks.retain(|(i, _)| *i != id);
        obs.callbacks.len() != before
    }

    /// Returns a channel receiving this node's change events.
    ///
    /// The sender is dropped once the receiver is gone.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.0.observers).channels.push(tx);
        rx
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Writes `name` on every node from this one to the root that has a
    /// writable property of that name. Returns how many nodes accepted it.
    pub fn set_property_recursive(&self, name: &str, value: impl Into<Value>) -> usize {
        let value = value.into();
        let mut accepted = 0;
        for node in self.chain() {
            match node.set_property(name, &value) {
                PropertyWrite::Changed(_) | PropertyWrite::Unchanged => accepted += 1,
                PropertyWrite::Rejected(reason) => {
                    debug!(node = %node, name, reason = %reason, "property rejected");
                }
                PropertyWrite::Unknown => {}
            }
        }
        accepted
    }

    /// Writes a property on this node only, notifying downstream on change.
    pub fn set_property(&self, name: &str, value: &Value) -> PropertyWrite {
        let result = {
            let mut filter = self.lock_filter();
            match find_spec(filter.property_specs(), name) {
                Some(spec) if spec.writable => filter.set_property(name, value),
                _ => PropertyWrite::Unknown,
            }
        };
        if let PropertyWrite::Changed(mask) = &result {
            trace!(node = %self, name, %value, "property changed");
            self.notify_changed(*mask);
        }
        result
    }

    /// Reads `name` from the nearest enabled node that has it, walking
    /// towards the root.
    pub fn get_property_recursive(&self, name: &str) -> Option<Value> {
        self.chain()
            .into_iter()
            .filter(|n| n.is_enabled())
            .find_map(|n| n.property(name))
    }

    /// Reads a property from this node only.
    pub fn property(&self, name: &str) -> Option<Value> {
        let filter = self.lock_filter();
        match find_spec(filter.property_specs(), name) {
            Some(spec) if spec.readable => filter.property(name),
            _ => None,
        }
    }

    // ========================================================================
    // Typed access
    // ========================================================================

    /// Runs `f` on the filter if it is an `F`.
    pub fn with_filter<F: Filter, R>(&self, f: impl FnOnce(&mut F) -> R) -> Option<R> {
        let mut filter = self.lock_filter();
        filter.as_any_mut().downcast_mut::<F>().map(f)
    }

    /// Runs `f` on the filter if it is an `F` and notifies the returned mask.
    ///
    /// Returns `false` if the filter has a different type.
    pub fn update<F: Filter>(&self, f: impl FnOnce(&mut F) -> ChangeMask) -> bool {
        match self.with_filter(f) {
            Some(mask) => {
                self.notify_changed(mask);
                true
            }
            None => false,
        }
    }

    fn lock_filter(&self) -> MutexGuard<'_, Box<dyn Filter>> {
        lock(&self.0.filter)
    }
}

impl PartialEq for FilterNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for FilterNode {}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "{}({}, {:?})", self.type_name(), self.id(), label),
            None => write!(f, "{}({})", self.type_name(), self.id()),
        }
    }
}

impl fmt::Debug for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterNode")
            .field("id", &self.id())
            .field("type_name", &self.type_name())
            .field("label", &self.label())
            .field("enabled", &self.is_enabled())
            .field("previous", &self.previous().map(|p| p.id()))
            .finish()
    }
}

/// Clamps the request's region to `size`, borrowing when nothing changes.
///
/// `None` when the region lies entirely outside the image.
fn clamp_request(
    request: &FilterRequest,
    (width, height): (u32, u32),
) -> Option<Cow<'_, FilterRequest>> {
    match request.roi() {
        Some(roi) if !roi.fits_within(width, height) => {
            let mut clamped = request.clone();
            clamped.set_roi(Some(roi.clamp_to(width, height)?));
            Some(Cow::Owned(clamped))
        }
        _ => Some(Cow::Borrowed(request)),
    }
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(l: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(l: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::PropertySpec;
    use crate::value::ValueKind;
    use rawpipe_core::Image16;
    use std::any::Any;
    use std::sync::atomic::AtomicUsize;

    /// Root producer recording the ROI it was asked for.
    #[derive(Default)]
    struct Recorder {
        size: (u32, u32),
        seen_roi: Arc<Mutex<Option<Option<Rect>>>>,
        level: i64,
    }

    const RECORDER_PROPS: &[PropertySpec] = &[PropertySpec::rw("level", ValueKind::Int)];

    impl Filter for Recorder {
        fn type_name(&self) -> &'static str {
            "Recorder"
        }

        fn get_image(&mut self, _up: &Upstream, request: &FilterRequest) -> FilterResponse {
            *self.seen_roi.lock().unwrap() = Some(request.roi());
            FilterResponse::with_image(Arc::new(Image16::new(self.size.0, self.size.1, 4)))
        }

        fn get_size(&mut self, _up: &Upstream, _request: &FilterRequest) -> (u32, u32) {
            self.size
        }

        fn property_specs(&self) -> &'static [PropertySpec] {
            RECORDER_PROPS
        }

        fn set_property(&mut self, name: &str, value: &Value) -> PropertyWrite {
            match (name, value.as_int()) {
                ("level", Some(v)) if v == self.level => PropertyWrite::Unchanged,
                ("level", Some(v)) => {
                    self.level = v;
                    PropertyWrite::Changed(ChangeMask::PIXELDATA)
                }
                _ => PropertyWrite::Rejected("expected int".into()),
            }
        }

        fn property(&self, name: &str) -> Option<Value> {
            (name == "level").then_some(Value::Int(self.level))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Pass-through that counts upstream notifications.
    struct Counter(Arc<AtomicUsize>, &'static str);

    impl Filter for Counter {
        fn type_name(&self) -> &'static str {
            self.1
        }

        fn upstream_changed(&mut self, _origin: NodeId, mask: ChangeMask) -> ChangeMask {
            self.0.fetch_add(1, Ordering::SeqCst);
            mask
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Pass-through that logs which node each notification came from.
    #[derive(Default)]
    struct OriginLog(Arc<Mutex<Vec<(NodeId, ChangeMask)>>>);

    impl Filter for OriginLog {
        fn type_name(&self) -> &'static str {
            "OriginLog"
        }

        fn upstream_changed(&mut self, origin: NodeId, mask: ChangeMask) -> ChangeMask {
            self.0.lock().unwrap().push((origin, mask));
            mask
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn recorder(w: u32, h: u32) -> (FilterNode, Arc<Mutex<Option<Option<Rect>>>>) {
        let p = Recorder {
            size: (w, h),
            ..Default::default()
        };
        let seen = p.seen_roi.clone();
        (FilterNode::from_filter(p), seen)
    }

    #[test]
    fn test_roi_clamped_before_producer() {
        let (root, seen) = recorder(10, 10);
        let req = FilterRequest::new().with_roi(Rect::new(-5, -5, 20, 20));
        root.get_image(&req);
        assert_eq!(*seen.lock().unwrap(), Some(Some(Rect::new(0, 0, 10, 10))));

        let inside = FilterRequest::new().with_roi(Rect::new(2, 2, 3, 3));
        assert!(matches!(clamp_request(&inside, (10, 10)), Some(Cow::Borrowed(_))));
    }

    #[test]
    fn test_root_without_producer_is_empty() {
        let node = FilterNode::from_filter(Counter(Arc::default(), "Pass"));
        let resp = node.get_image(&FilterRequest::new());
        assert!(!resp.has_image());
        assert_eq!(node.get_size(&FilterRequest::new()), (0, 0));
    }

    #[test]
    fn test_timing_property() {
        let (root, _) = recorder(4, 4);
        let resp = root.get_image(&FilterRequest::new());
        assert!(resp.property("Recorder-time").and_then(Value::as_f64).is_some());
    }

    #[test]
    fn test_self_and_cycle_rejected() {
        let a = FilterNode::from_filter(Counter(Arc::default(), "A"));
        let b = FilterNode::from_filter(Counter(Arc::default(), "B"));
        let c = FilterNode::from_filter(Counter(Arc::default(), "C"));
        assert!(matches!(a.set_previous(&a), Err(GraphError::SelfReference(_))));
        b.set_previous(&a).unwrap();
        c.set_previous(&b).unwrap();
        assert!(matches!(a.set_previous(&c), Err(GraphError::Cycle { .. })));
        assert!(a.previous().is_none());
    }

    #[test]
    fn test_relink_moves_downstream_entry() {
        let a = FilterNode::from_filter(Counter(Arc::default(), "A"));
        let b = FilterNode::from_filter(Counter(Arc::default(), "B"));
        let c = FilterNode::from_filter(Counter(Arc::default(), "C"));
        c.set_previous(&a).unwrap();
        assert_eq!(a.downstream(), vec![c.clone()]);
        c.set_previous(&b).unwrap();
        assert!(a.downstream().is_empty());
        assert_eq!(b.downstream(), vec![c.clone()]);
        c.detach();
        assert!(b.downstream().is_empty());
        assert!(c.previous().is_none());
    }

    #[test]
    fn test_drop_unlinks_from_upstream() {
        let a = FilterNode::from_filter(Counter(Arc::default(), "A"));
        {
            let b = FilterNode::from_filter(Counter(Arc::default(), "B"));
            b.set_previous(&a).unwrap();
            assert_eq!(lock(&a.0.next).len(), 1);
        }
        assert_eq!(lock(&a.0.next).len(), 0);
    }

    #[test]
    fn test_notification_depth_first_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let root = FilterNode::from_filter(Counter(Arc::default(), "root"));
        let left = FilterNode::from_filter(Counter(Arc::default(), "left"));
        let leaf = FilterNode::from_filter(Counter(Arc::default(), "leaf"));
        let right = FilterNode::from_filter(Counter(Arc::default(), "right"));
        left.set_previous(&root).unwrap();
        leaf.set_previous(&left).unwrap();
        right.set_previous(&root).unwrap();

        for node in [&root, &left, &leaf, &right] {
            let order = order.clone();
            node.connect_changed(move |ev| order.lock().unwrap().push(ev.type_name));
        }
        root.notify_changed(ChangeMask::PIXELDATA);
        assert_eq!(*order.lock().unwrap(), vec!["leaf", "left", "right", "root"]);
    }

    #[test]
    fn test_upstream_changed_called_once_per_downstream() {
        let hits = Arc::new(AtomicUsize::new(0));
        let root = FilterNode::from_filter(Counter(Arc::default(), "root"));
        let a = FilterNode::from_filter(Counter(hits.clone(), "a"));
        let b = FilterNode::from_filter(Counter(hits.clone(), "b"));
        a.set_previous(&root).unwrap();
        b.set_previous(&a).unwrap();
        hits.store(0, Ordering::SeqCst);
        root.notify_changed(ChangeMask::PROFILE);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_upstream_changed_receives_origin() {
        let root = FilterNode::from_filter(Counter(Arc::default(), "root"));
        let other = FilterNode::from_filter(Counter(Arc::default(), "other"));
        let mid_log = OriginLog::default();
        let leaf_log = OriginLog::default();
        let (mid_seen, leaf_seen) = (mid_log.0.clone(), leaf_log.0.clone());
        let mid = FilterNode::from_filter(mid_log);
        let leaf = FilterNode::from_filter(leaf_log);

        mid.set_previous(&root).unwrap();
        leaf.set_previous(&mid).unwrap();
        mid_seen.lock().unwrap().clear();
        leaf_seen.lock().unwrap().clear();

        root.notify_changed(ChangeMask::PIXELDATA);
        assert_eq!(*mid_seen.lock().unwrap(), vec![(root.id(), ChangeMask::PIXELDATA)]);
        assert_eq!(*leaf_seen.lock().unwrap(), vec![(mid.id(), ChangeMask::PIXELDATA)]);

        // Relinking reports the new upstream, detaching the old one
        mid_seen.lock().unwrap().clear();
        mid.set_previous(&other).unwrap();
        mid.detach();
        assert_eq!(
            *mid_seen.lock().unwrap(),
            vec![(other.id(), ChangeMask::DIMENSION), (other.id(), ChangeMask::DIMENSION)]
        );
    }

    #[test]
    fn test_region_outside_image_skips_producer() {
        let (root, seen) = recorder(10, 10);
        let req = FilterRequest::new().with_roi(Rect::new(-30, -30, 10, 10));
        let resp = root.get_image(&req);
        assert_eq!(*seen.lock().unwrap(), None);
        assert!(!resp.has_image());
        assert_eq!(resp.dimensions(), (10, 10));
        assert_eq!(resp.roi(), Some(Rect::default()));
        assert!(clamp_request(&req, (10, 10)).is_none());

        let far = FilterRequest::new().with_roi(Rect::new(i32::MAX - 5, 0, 100, 100));
        assert!(!root.get_image8(&far).has_image8());
        assert_eq!(*seen.lock().unwrap(), None);
    }

    #[test]
    fn test_subscribe_and_disconnect() {
        let node = FilterNode::from_filter(Counter(Arc::default(), "n"));
        let rx = node.subscribe();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let id = node.connect_changed(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        node.notify_changed(ChangeMask::PIXELDATA);
        assert!(node.disconnect(id));
        assert!(!node.disconnect(id));
        node.notify_changed(ChangeMask::PROFILE);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let events: Vec<_> = rx.try_iter().map(|e| e.mask).collect();
        assert_eq!(events, vec![ChangeMask::PIXELDATA, ChangeMask::PROFILE]);
    }

    #[test]
    fn test_enable_notifies_dimension_and_passes_through() {
        let (root, _) = recorder(8, 6);
        let mid = FilterNode::from_filter(Recorder {
            size: (2, 2),
            ..Default::default()
        });
        mid.set_previous(&root).unwrap();
        let rx = mid.subscribe();

        assert_eq!(mid.get_size(&FilterRequest::new()), (2, 2));
        assert!(mid.set_enabled(false));
        assert!(!mid.set_enabled(false));
        assert_eq!(mid.get_size(&FilterRequest::new()), (8, 6));
        let resp = mid.get_image(&FilterRequest::new());
        assert_eq!(resp.dimensions(), (8, 6));
        assert_eq!(rx.try_iter().map(|e| e.mask).collect::<Vec<_>>(), vec![ChangeMask::DIMENSION]);
    }

    #[test]
    fn test_properties_recursive() {
        let (root, _) = recorder(4, 4);
        let (mid, _) = recorder(4, 4);
        let top = FilterNode::from_filter(Counter(Arc::default(), "top"));
        mid.set_previous(&root).unwrap();
        top.set_previous(&mid).unwrap();

        assert_eq!(top.set_property_recursive("level", 3i64), 2);
        assert_eq!(top.set_property_recursive("level", 3i64), 2);
        assert_eq!(top.set_property_recursive("level", "bad"), 0);
        assert_eq!(top.set_property_recursive("missing", 1i64), 0);

        mid.with_filter::<Recorder, _>(|p| p.level = 7).unwrap();
        assert_eq!(top.get_property_recursive("level"), Some(Value::Int(7)));
        mid.set_enabled(false);
        assert_eq!(top.get_property_recursive("level"), Some(Value::Int(3)));
        assert_eq!(top.get_property_recursive("missing"), None);
    }

    #[test]
    fn test_typed_access_and_dot() {
        let (root, _) = recorder(4, 4);
        let top = FilterNode::from_filter(Counter(Arc::default(), "top"));
        top.set_previous(&root).unwrap();
        top.set_label("preview");
        assert!(top.with_filter::<Recorder, _>(|_| ()).is_none());
        assert!(root.update::<Recorder>(|p| {
            p.level = 1;
            ChangeMask::PIXELDATA
        }));

        let dot = top.to_dot();
        assert!(dot.starts_with("digraph rawpipe {"));
        assert!(dot.contains("top (preview)"));
        assert!(dot.contains(&format!("n{} -> n{}", root.id().get(), top.id().get())));
        assert_eq!(top.chain().len(), 2);
    }
}
