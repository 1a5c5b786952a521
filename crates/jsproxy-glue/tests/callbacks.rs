//! Callback Table Tests
//!
//! Job queue and principals trampolines, and the collector-facing
//! `trace`/`finalize` traps.

mod common;

use std::cell::{Cell, RefCell};
use std::ffi::c_void;

use common::{context, forwarding_proxy, record, take_calls};
use jsproxy_glue::ffi::{jsproxy_get_proxy_private, jsproxy_trace_object, jsproxy_trace_value};
use jsproxy_glue::job_queue::{jsproxy_enqueue_promise_job, jsproxy_set_job_queue};
use jsproxy_glue::principals::{
    jsproxy_clone_writer_write_bytes, jsproxy_get_principals_private, jsproxy_set_principals,
};
use jsproxy_glue::{JobQueueTraps, PrincipalsCallbacks, ProxyTraps};
use jsproxy_host::{
    CloneWriter, Context, JsError, ObjectId, ProxyOptions, Throw, Tracer, Value,
};

// ============================================================================
// Job queue
// ============================================================================

/// Foreign-side queue reached through the opaque pointer
#[derive(Default)]
struct Jobs {
    incumbent: Cell<Option<ObjectId>>,
    queued: RefCell<Vec<(Option<ObjectId>, ObjectId, Option<ObjectId>)>>,
}

unsafe extern "C" fn jobs_incumbent(queue: *const c_void, _cx: *mut Context) -> Option<ObjectId> {
    let jobs = unsafe { &*(queue as *const Jobs) };
    jobs.incumbent.get()
}

unsafe extern "C" fn jobs_enqueue(
    queue: *const c_void,
    _cx: *mut Context,
    promise: Option<ObjectId>,
    job: ObjectId,
    _allocation_site: Option<ObjectId>,
    incumbent_global: Option<ObjectId>,
) -> bool {
    let jobs = unsafe { &*(queue as *const Jobs) };
    jobs.queued.borrow_mut().push((promise, job, incumbent_global));
    true
}

unsafe extern "C" fn jobs_empty(queue: *const c_void) -> bool {
    let jobs = unsafe { &*(queue as *const Jobs) };
    jobs.queued.borrow().is_empty()
}

#[test]
fn test_job_queue_trampolines() {
    let mut cx = context();
    let jobs = Jobs::default();
    let window = cx.new_object();
    jobs.incumbent.set(Some(window));
    let traps = JobQueueTraps {
        get_incumbent_global: Some(jobs_incumbent),
        enqueue_promise_job: Some(jobs_enqueue),
        empty: Some(jobs_empty),
    };
    let queue = &jobs as *const Jobs as *const c_void;

    assert!(unsafe { jsproxy_set_job_queue(&mut cx, &traps, queue) });
    assert!(!cx.has_pending_jobs());

    let promise = cx.new_object();
    let job = cx.new_function("reaction", |_cx, _this, _args| Ok(Value::undefined()));
    assert!(unsafe { jsproxy_enqueue_promise_job(&mut cx, Some(promise), job, None) });
    assert!(cx.has_pending_jobs());
    assert_eq!(
        jobs.queued.borrow().as_slice(),
        &[(Some(promise), job, Some(window))]
    );
}

#[test]
fn test_job_queue_null_slots() {
    let mut cx = context();
    let traps = JobQueueTraps::default();
    assert!(unsafe { jsproxy_set_job_queue(&mut cx, &traps, std::ptr::null()) });

    // Null `empty` answers empty
    assert!(!cx.has_pending_jobs());

    // Null `get_incumbent_global` answers the context global
    let queue = cx.job_queue().unwrap();
    assert_eq!(queue.incumbent_global(&mut cx), Some(cx.global()));

    // Null `enqueue_promise_job` fails with a pending error
    let job = cx.new_object();
    assert!(!unsafe { jsproxy_enqueue_promise_job(&mut cx, None, job, None) });
    let err = cx.finish::<()>(Err(Throw)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Uncaught exception: InternalError: job queue cannot accept promise jobs"
    );
}

#[test]
fn test_job_queue_rejects_null_pointers() {
    let mut cx = context();
    let traps = JobQueueTraps::default();
    unsafe {
        assert!(!jsproxy_set_job_queue(std::ptr::null_mut(), &traps, std::ptr::null()));
        assert!(!jsproxy_set_job_queue(&mut cx, std::ptr::null(), std::ptr::null()));
    }
    let job = cx.new_object();
    // Nothing installed
    assert!(!unsafe { jsproxy_enqueue_promise_job(&mut cx, None, job, None) });
    assert!(cx.is_exception_pending());
}

// ============================================================================
// Principals
// ============================================================================

struct Origin {
    id: u32,
    system: bool,
}

unsafe extern "C" fn origin_write(
    private: *mut c_void,
    _cx: *mut Context,
    writer: *mut CloneWriter,
) -> bool {
    let origin = unsafe { &*(private as *const Origin) };
    let bytes = origin.id.to_le_bytes();
    unsafe { jsproxy_clone_writer_write_bytes(writer, bytes.as_ptr(), bytes.len()) }
}

unsafe extern "C" fn origin_is_system(private: *mut c_void) -> bool {
    let origin = unsafe { &*(private as *const Origin) };
    origin.system
}

#[test]
fn test_principals_trampolines() {
    let mut cx = context();
    let mut origin = Origin {
        id: 0x0102_0304,
        system: true,
    };
    let private = &mut origin as *mut Origin as *mut c_void;
    let callbacks = PrincipalsCallbacks {
        write: Some(origin_write),
        is_system_or_addon_principal: Some(origin_is_system),
    };

    assert!(unsafe { jsproxy_set_principals(&mut cx, &callbacks, private) });
    assert_eq!(unsafe { jsproxy_get_principals_private(&cx) }, private);
    assert!(cx.is_system_principal());

    let mut writer = CloneWriter::new();
    cx.write_principals(&mut writer).unwrap();
    assert_eq!(writer.as_bytes(), &[0x04, 0x03, 0x02, 0x01]);
}

#[test]
fn test_principals_null_slots() {
    let mut cx = context();
    let callbacks = PrincipalsCallbacks::default();
    let mut marker = 0u8;
    let private = &mut marker as *mut u8 as *mut c_void;

    assert!(unsafe { jsproxy_set_principals(&mut cx, &callbacks, private) });
    assert!(!cx.is_system_principal());

    // A null writer fails without an exception
    let mut writer = CloneWriter::new();
    let result = cx.write_principals(&mut writer);
    assert!(result.is_err());
    assert!(!cx.is_exception_pending());
    assert!(matches!(cx.finish(result), Err(JsError::Uncatchable)));
    assert!(writer.as_bytes().is_empty());

    cx.set_principals(None);
    assert!(unsafe { jsproxy_get_principals_private(&cx) }.is_null());
}

// ============================================================================
// Collector traps
// ============================================================================

thread_local! {
    static HELD: Cell<Option<ObjectId>> = const { Cell::new(None) };
}

unsafe extern "C" fn trace_held(trc: *mut Tracer, proxy: ObjectId) {
    record("trace", proxy, None, &[]);
    if let Some(held) = HELD.with(Cell::get) {
        unsafe {
            jsproxy_trace_object(trc, held);
            jsproxy_trace_value(trc, Value::int32(0));
        }
    }
}

unsafe extern "C" fn finalize_reads_private(cx: *mut Context, proxy: ObjectId) {
    let mut private = Value::undefined();
    // The proxy is still readable during finalization
    let readable = unsafe { jsproxy_get_proxy_private(cx, proxy, &mut private) };
    record("finalize", proxy, None, &[Value::boolean(readable)]);
}

#[test]
fn test_trace_keeps_foreign_edges_alive() {
    let mut cx = context();
    let traps = ProxyTraps {
        trace: Some(trace_held),
        finalize: Some(finalize_reads_private),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());
    let held = cx.new_object();
    HELD.with(|h| h.set(Some(held)));
    cx.add_root(proxy);

    cx.collect_garbage();
    assert!(cx.is_alive(proxy));
    assert!(cx.is_alive(held));
    let calls = take_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].trap, "trace");
    assert_eq!(calls[0].proxy, proxy);

    assert!(cx.remove_root(proxy));
    let reclaimed = cx.collect_garbage();
    assert!(reclaimed >= 2);
    assert!(!cx.is_alive(proxy));
    assert!(!cx.is_alive(held));

    let calls = take_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].trap, "finalize");
    assert_eq!(calls[0].proxy, proxy);
    assert_eq!(calls[0].values, vec![Value::boolean(true)]);

    // Finalized exactly once
    cx.collect_garbage();
    assert!(take_calls().is_empty());
    HELD.with(|h| h.set(None));
}

#[test]
fn test_dropping_context_finalizes_live_proxies() {
    let mut cx = context();
    let traps = ProxyTraps {
        finalize: Some(finalize_reads_private),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());
    cx.add_root(proxy);
    drop(cx);

    let calls = take_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].proxy, proxy);
}
