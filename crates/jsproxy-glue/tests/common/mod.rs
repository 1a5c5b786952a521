//! Shared helpers: tracing setup and a per-thread trap call log.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use jsproxy_glue::{ForwardingProxyHandler, ProxyTraps, WrapperProxyHandler};
use jsproxy_host::{Context, ObjectId, PropertyKey, ProxyOptions, Value};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a test subscriber once per binary. `RUST_LOG` overrides the
/// default `warn` filter.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// One observed trap invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub trap: &'static str,
    pub proxy: ObjectId,
    pub id: Option<PropertyKey>,
    pub values: Vec<Value>,
}

thread_local! {
    static CALLS: RefCell<Vec<Call>> = const { RefCell::new(Vec::new()) };
}

pub fn record(trap: &'static str, proxy: ObjectId, id: Option<PropertyKey>, values: &[Value]) {
    CALLS.with(|calls| {
        calls.borrow_mut().push(Call {
            trap,
            proxy,
            id,
            values: values.to_vec(),
        })
    });
}

/// Drain the log
pub fn take_calls() -> Vec<Call> {
    CALLS.with(|calls| std::mem::take(&mut *calls.borrow_mut()))
}

/// Names of the logged traps, draining the log
pub fn take_trap_names() -> Vec<&'static str> {
    take_calls().into_iter().map(|call| call.trap).collect()
}

/// Fresh context with logging set up and an empty call log
pub fn context() -> Context {
    init_tracing();
    take_calls();
    Context::new()
}

/// Forwarding proxy over `traps`
pub fn forwarding_proxy(cx: &mut Context, traps: ProxyTraps, options: ProxyOptions) -> ObjectId {
    // SAFETY: test traps are plain `extern "C"` functions
    let handler = unsafe { ForwardingProxyHandler::forwarding(traps, std::ptr::null()) };
    cx.new_proxy(Rc::new(handler), Value::undefined(), None, options)
}

/// Wrapper proxy around `target` over `traps`
pub fn wrapper_proxy(cx: &mut Context, traps: ProxyTraps, target: ObjectId) -> ObjectId {
    // SAFETY: test traps are plain `extern "C"` functions
    let handler = unsafe { WrapperProxyHandler::wrapper(traps) };
    cx.new_proxy(
        Rc::new(handler),
        Value::object(target),
        None,
        ProxyOptions::new().lazy_proto(true),
    )
}
