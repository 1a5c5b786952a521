//! Promise job queue interface

use crate::context::Context;
use crate::error::JsResult;
use crate::object::ObjectId;

/// Receives promise reaction jobs from the engine.
///
/// The embedder owns the queue and drains it between turns.
pub trait JobQueue {
    /// Global object of the incumbent settings, if any
    fn incumbent_global(&self, cx: &mut Context) -> Option<ObjectId>;

    /// Queue `job`. A failure must leave an exception pending.
    fn enqueue_promise_job(
        &self,
        cx: &mut Context,
        promise: Option<ObjectId>,
        job: ObjectId,
        allocation_site: Option<ObjectId>,
        incumbent_global: Option<ObjectId>,
    ) -> JsResult<()>;

    /// Whether no job is waiting
    fn is_empty(&self) -> bool;
}
