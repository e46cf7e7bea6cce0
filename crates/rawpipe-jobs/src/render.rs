//! Background evaluation of graph nodes.

use crate::context::JobContext;
use crate::job::JobHandle;
use crate::scheduler::JobScheduler;
use rawpipe_color::OutputDepth;
use rawpipe_graph::{FilterNode, FilterRequest, FilterResponse};
use tracing::debug;

/// Pulls `node` on one of the scheduler's workers.
///
/// The size is predicted first so the description can name it; the pull
/// itself is synchronous and cannot be interrupted, so cancellation is
/// checked before it starts. The handle is always waitable.
///
/// # Example
///
/// ```rust
/// use rawpipe_color::OutputDepth;
/// use rawpipe_core::Image16;
/// use rawpipe_graph::filters::InputImage16;
/// use rawpipe_graph::{FilterNode, FilterRequest};
/// use rawpipe_jobs::{render::submit_render, JobScheduler, SchedulerConfig};
/// use std::sync::Arc;
///
/// let scheduler = JobScheduler::new(SchedulerConfig::new().with_workers(1)).unwrap();
/// let input = FilterNode::from_filter(InputImage16::new(Arc::new(Image16::new(8, 8, 4))));
/// let view = FilterNode::new("ColorTransform", Some(&input)).unwrap();
///
/// let job = submit_render(&scheduler, &view, FilterRequest::new(), OutputDepth::Eight);
/// let resp = job.wait().unwrap();
/// assert_eq!(resp.image8().unwrap().dimensions(), (8, 8));
/// ```
pub fn submit_render(
    scheduler: &JobScheduler,
    node: &FilterNode,
    request: FilterRequest,
    depth: OutputDepth,
) -> JobHandle<FilterResponse> {
    let node = node.clone();
    scheduler.submit_with(
        (node, request),
        move |(node, request), ctx| render(&node, &request, depth, ctx),
        true,
    )
}

fn render(
    node: &FilterNode,
    request: &FilterRequest,
    depth: OutputDepth,
    ctx: &JobContext,
) -> FilterResponse {
    let (w, h) = node.get_size(request);
    ctx.set_description(format!("{} {}x{} {}", node.type_name(), w, h, depth));
    ctx.set_progress(0.05);
    if ctx.is_cancelled() {
        debug!(job = %ctx.job(), node = %node, "render cancelled before pull");
        return FilterResponse::empty();
    }

    ctx.pulse();
    let resp = match depth {
        OutputDepth::Sixteen => node.get_image(request),
        OutputDepth::Eight => node.get_image8(request),
    };
    ctx.set_progress(1.0);
    resp
}
