//! Promise job queue backed by foreign callbacks

use std::ffi::c_void;
use std::rc::Rc;

use jsproxy_host::{Context, ErrorKind, JobQueue, JsResult, ObjectId, Throw};
use tracing::{trace, warn};

/// Incumbent global lookup
pub type GetIncumbentGlobalTrap =
    unsafe extern "C" fn(queue: *const c_void, cx: *mut Context) -> Option<ObjectId>;

/// Queue one promise job
pub type EnqueuePromiseJobTrap = unsafe extern "C" fn(
    queue: *const c_void,
    cx: *mut Context,
    promise: Option<ObjectId>,
    job: ObjectId,
    allocation_site: Option<ObjectId>,
    incumbent_global: Option<ObjectId>,
) -> bool;

/// Whether the queue is empty
pub type EmptyTrap = unsafe extern "C" fn(queue: *const c_void) -> bool;

/// Job queue callback table
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct JobQueueTraps {
    /// Null answers the context's global object
    pub get_incumbent_global: Option<GetIncumbentGlobalTrap>,
    /// Null fails with an `InternalError`
    pub enqueue_promise_job: Option<EnqueuePromiseJobTrap>,
    /// Null answers "empty"
    pub empty: Option<EmptyTrap>,
}

/// [`JobQueue`] whose operations are foreign callbacks over an opaque queue
pub struct ForeignJobQueue {
    traps: JobQueueTraps,
    queue: *const c_void,
}

impl ForeignJobQueue {
    /// Wrap `queue`.
    ///
    /// # Safety
    /// Every filled slot of `traps` must be callable with `queue` for as
    /// long as the job queue is installed.
    pub unsafe fn new(traps: JobQueueTraps, queue: *const c_void) -> Self {
        Self { traps, queue }
    }

    /// The opaque queue pointer
    pub fn queue(&self) -> *const c_void {
        self.queue
    }
}

impl JobQueue for ForeignJobQueue {
    fn incumbent_global(&self, cx: &mut Context) -> Option<ObjectId> {
        match self.traps.get_incumbent_global {
            // SAFETY: guaranteed by the constructor's contract
            Some(trap) => unsafe { trap(self.queue, cx) },
            None => Some(cx.global()),
        }
    }

    fn enqueue_promise_job(
        &self,
        cx: &mut Context,
        promise: Option<ObjectId>,
        job: ObjectId,
        allocation_site: Option<ObjectId>,
        incumbent_global: Option<ObjectId>,
    ) -> JsResult<()> {
        let Some(trap) = self.traps.enqueue_promise_job else {
            return Err(cx.report_error(
                ErrorKind::InternalError,
                "job queue cannot accept promise jobs",
            ));
        };
        trace!(?job, "enqueuePromiseJob trap");
        // SAFETY: guaranteed by the constructor's contract
        let ok = unsafe { trap(self.queue, cx, promise, job, allocation_site, incumbent_global) };
        if ok {
            Ok(())
        } else {
            if !cx.is_exception_pending() {
                warn!("enqueuePromiseJob failed without a pending exception");
            }
            Err(Throw)
        }
    }

    fn is_empty(&self) -> bool {
        match self.traps.empty {
            // SAFETY: guaranteed by the constructor's contract
            Some(trap) => unsafe { trap(self.queue) },
            None => true,
        }
    }
}

/// Install a foreign job queue on `cx`.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `traps` must be null or point at a valid table; it is copied
/// - see [`ForeignJobQueue::new`] for `queue`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_set_job_queue(
    cx: *mut Context,
    traps: *const JobQueueTraps,
    queue: *const c_void,
) -> bool {
    if cx.is_null() || traps.is_null() {
        return false;
    }
    // SAFETY: checked non-null, validity guaranteed by the caller
    let (cx, traps) = unsafe { (&mut *cx, *traps) };
    // SAFETY: forwarded from the caller
    let queue = unsafe { ForeignJobQueue::new(traps, queue) };
    cx.set_job_queue(Rc::new(queue));
    true
}

/// Queue a promise job on the installed queue.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_enqueue_promise_job(
    cx: *mut Context,
    promise: Option<ObjectId>,
    job: ObjectId,
    allocation_site: Option<ObjectId>,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let Some(cx) = (unsafe { cx.as_mut() }) else {
        return false;
    };
    cx.enqueue_promise_job(promise, job, allocation_site).is_ok()
}
