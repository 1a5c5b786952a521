//! Flat C entry points
//!
//! Every function takes and returns layout-stable types only: handles,
//! NaN-boxed values, `#[repr(C)]` structs and raw pointers. Contexts and
//! handlers are passed as opaque pointers and null-checked on entry.
//! Boolean results follow the trap convention: `false` is failure, with
//! the reason (if any) pending on the context.

use std::ffi::{CStr, c_char, c_void};
use std::rc::Rc;

use jsproxy_host::{
    Context, ErrorKind, ObjectId, ObjectOpResult, PropertyAttributes, PropertyDescriptor,
    PropertyKey, ProxyHandler, ProxyOptions, Tracer, Value,
};
use tracing::debug;

use crate::adapter::{ForwardingProxyHandler, WrapperProxyHandler};
use crate::maybe::write_maybe;
use crate::traps::ProxyTraps;

/// Property is enumerable
pub const PROP_ENUMERATE: u32 = 0x01;
/// Property is read-only
pub const PROP_READONLY: u32 = 0x02;
/// Property is non-configurable
pub const PROP_PERMANENT: u32 = 0x04;

fn attrs_from_flags(flags: u32) -> PropertyAttributes {
    PropertyAttributes {
        writable: flags & PROP_READONLY == 0,
        enumerable: flags & PROP_ENUMERATE != 0,
        configurable: flags & PROP_PERMANENT == 0,
    }
}

/// Owned reference to a handler, handed out to foreign code
pub struct HandlerRef {
    handler: Rc<dyn ProxyHandler>,
}

impl HandlerRef {
    /// The handler
    pub fn handler(&self) -> &Rc<dyn ProxyHandler> {
        &self.handler
    }
}

fn utf8<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    // SAFETY: non-null; callers document NUL termination
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

// ----------------------------------------------------------------------
// Handlers
// ----------------------------------------------------------------------

/// Create a forwarding handler over a copy of `traps`.
///
/// # Safety
/// - `traps` must be null or point at a valid table
/// - every filled slot must stay callable while the handler or any proxy
///   created with it lives
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_create_forwarding_handler(
    traps: *const ProxyTraps,
    extra: *const c_void,
) -> *mut HandlerRef {
    // SAFETY: null-checked, validity guaranteed by the caller
    let Some(&traps) = (unsafe { traps.as_ref() }) else {
        return std::ptr::null_mut();
    };
    // SAFETY: forwarded from the caller
    let handler = unsafe { ForwardingProxyHandler::forwarding(traps, extra) };
    Box::into_raw(Box::new(HandlerRef {
        handler: Rc::new(handler),
    }))
}

/// Create a wrapper handler over a copy of `traps`.
///
/// # Safety
/// Same as [`jsproxy_create_forwarding_handler`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_create_wrapper_handler(
    traps: *const ProxyTraps,
) -> *mut HandlerRef {
    // SAFETY: null-checked, validity guaranteed by the caller
    let Some(&traps) = (unsafe { traps.as_ref() }) else {
        return std::ptr::null_mut();
    };
    // SAFETY: forwarded from the caller
    let handler = unsafe { WrapperProxyHandler::wrapper(traps) };
    Box::into_raw(Box::new(HandlerRef {
        handler: Rc::new(handler),
    }))
}

/// Release a handler reference. Proxies created with it keep working.
///
/// # Safety
/// - `handler` must be null or come from a `jsproxy_create_*_handler` call
/// - `handler` must not be used after this call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_destroy_handler(handler: *mut HandlerRef) {
    if handler.is_null() {
        return;
    }
    // SAFETY: allocated by a `jsproxy_create_*_handler` call
    drop(unsafe { Box::from_raw(handler) });
}

// ----------------------------------------------------------------------
// Proxies
// ----------------------------------------------------------------------

/// Create a proxy object. Returns null on failure.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `handler` must be null or a live handler reference
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_new_proxy_object(
    cx: *mut Context,
    handler: *const HandlerRef,
    private: Value,
    proto: Option<ObjectId>,
    lazy_proto: bool,
    callable: bool,
    reserved_slots: u32,
) -> Option<ObjectId> {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (cx, handler) = unsafe { (cx.as_mut()?, handler.as_ref()?) };
    let options = ProxyOptions::new()
        .lazy_proto(lazy_proto)
        .callable(callable)
        .reserved_slots(reserved_slots as usize);
    Some(cx.new_proxy(handler.handler.clone(), private, proto, options))
}

/// Create a wrapper around `target`. The prototype is read through the
/// handler and callability follows the target.
///
/// # Safety
/// Same as [`jsproxy_new_proxy_object`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_new_wrapper(
    cx: *mut Context,
    target: ObjectId,
    handler: *const HandlerRef,
) -> Option<ObjectId> {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (cx, handler) = unsafe { (cx.as_mut()?, handler.as_ref()?) };
    let options = ProxyOptions::new()
        .lazy_proto(true)
        .callable(cx.is_callable(target));
    let wrapper = cx.new_proxy(handler.handler.clone(), Value::object(target), None, options);
    debug!(?wrapper, ?target, "created wrapper");
    Some(wrapper)
}

/// `extra` of a forwarding handler. Wrapper handlers are not part of the
/// forwarding family and answer `None`.
fn forwarding_extra(handler: &dyn ProxyHandler) -> Option<*const c_void> {
    handler
        .as_any()
        .downcast_ref::<ForwardingProxyHandler>()
        .map(ForwardingProxyHandler::extra)
}

/// The `extra` pointer of a forwarding proxy's handler, or null for any
/// other object, wrappers included.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_get_proxy_handler_extra(
    cx: *const Context,
    obj: ObjectId,
) -> *const c_void {
    // SAFETY: null-checked, validity guaranteed by the caller
    let Some(cx) = (unsafe { cx.as_ref() }) else {
        return std::ptr::null();
    };
    cx.proxy_handler(obj)
        .and_then(|handler| forwarding_extra(&*handler))
        .unwrap_or(std::ptr::null())
}

/// Whether `obj` is a proxy whose handler came from
/// [`jsproxy_create_forwarding_handler`]. Wrappers answer `false`.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_is_forwarding_proxy(cx: *const Context, obj: ObjectId) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let Some(cx) = (unsafe { cx.as_ref() }) else {
        return false;
    };
    cx.proxy_handler(obj)
        .is_some_and(|handler| forwarding_extra(&*handler).is_some())
}

/// Whether `obj` is a transparent wrapper.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_is_wrapper(cx: *const Context, obj: ObjectId) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let Some(cx) = (unsafe { cx.as_ref() }) else {
        return false;
    };
    cx.proxy_handler(obj)
        .is_some_and(|handler| handler.is_wrapper())
}

/// Strip wrappers from `obj`.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_unwrap_object(cx: *const Context, obj: ObjectId) -> ObjectId {
    // SAFETY: null-checked, validity guaranteed by the caller
    match unsafe { cx.as_ref() } {
        Some(cx) => cx.unwrap_object(obj),
        None => obj,
    }
}

/// Read a proxy's private slot.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `out` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_get_proxy_private(
    cx: *const Context,
    obj: ObjectId,
    out: *mut Value,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (Some(cx), Some(out)) = (unsafe { (cx.as_ref(), out.as_mut()) }) else {
        return false;
    };
    match cx.proxy_private(obj) {
        Some(value) => {
            *out = value;
            true
        }
        None => false,
    }
}

/// Overwrite a proxy's private slot.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_set_proxy_private(
    cx: *mut Context,
    obj: ObjectId,
    value: Value,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    match unsafe { cx.as_mut() } {
        Some(cx) => cx.set_proxy_private(obj, value),
        None => false,
    }
}

/// Read a proxy reserved slot.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `out` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_get_proxy_reserved_slot(
    cx: *const Context,
    obj: ObjectId,
    slot: u32,
    out: *mut Value,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (Some(cx), Some(out)) = (unsafe { (cx.as_ref(), out.as_mut()) }) else {
        return false;
    };
    match cx.proxy_reserved_slot(obj, slot as usize) {
        Some(value) => {
            *out = value;
            true
        }
        None => false,
    }
}

/// Overwrite a proxy reserved slot.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_set_proxy_reserved_slot(
    cx: *mut Context,
    obj: ObjectId,
    slot: u32,
    value: Value,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    match unsafe { cx.as_mut() } {
        Some(cx) => cx.set_proxy_reserved_slot(obj, slot as usize, value),
        None => false,
    }
}

// ----------------------------------------------------------------------
// Re-entry helpers for trap implementations
// ----------------------------------------------------------------------

/// Run `handler`'s `getOwnPropertyDescriptor` directly, bypassing the
/// proxy's own dispatch.
///
/// # Safety
/// - `handler` and `cx` must be null or valid
/// - `desc` and `is_none` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_invoke_get_own_property_descriptor(
    handler: *const HandlerRef,
    cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    desc: *mut PropertyDescriptor,
    is_none: *mut bool,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (Some(handler), Some(cx), Some(desc), Some(is_none)) =
        (unsafe { (handler.as_ref(), cx.as_mut(), desc.as_mut(), is_none.as_mut()) })
    else {
        return false;
    };
    match handler.handler.get_own_property_descriptor(cx, proxy, id) {
        Ok(found) => {
            write_maybe(found, desc, is_none);
            true
        }
        Err(_) => false,
    }
}

/// Run `handler`'s `hasOwn` directly.
///
/// # Safety
/// - `handler` and `cx` must be null or valid
/// - `bp` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_invoke_has_own(
    handler: *const HandlerRef,
    cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    bp: *mut bool,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (Some(handler), Some(cx), Some(bp)) =
        (unsafe { (handler.as_ref(), cx.as_mut(), bp.as_mut()) })
    else {
        return false;
    };
    match handler.handler.has_own(cx, proxy, id) {
        Ok(found) => {
            *bp = found;
            true
        }
        Err(_) => false,
    }
}

/// `[[GetOwnProperty]]` on any object.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `desc` and `is_none` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_get_own_property_descriptor(
    cx: *mut Context,
    obj: ObjectId,
    id: PropertyKey,
    desc: *mut PropertyDescriptor,
    is_none: *mut bool,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (Some(cx), Some(desc), Some(is_none)) =
        (unsafe { (cx.as_mut(), desc.as_mut(), is_none.as_mut()) })
    else {
        return false;
    };
    match cx.get_own_property_descriptor(obj, id) {
        Ok(found) => {
            write_maybe(found, desc, is_none);
            true
        }
        Err(_) => false,
    }
}

/// `[[DefineOwnProperty]]` on any object.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `desc` must be null or valid for reads
/// - `result` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_define_property(
    cx: *mut Context,
    obj: ObjectId,
    id: PropertyKey,
    desc: *const PropertyDescriptor,
    result: *mut ObjectOpResult,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (Some(cx), Some(desc), Some(result)) =
        (unsafe { (cx.as_mut(), desc.as_ref(), result.as_mut()) })
    else {
        return false;
    };
    match cx.define_property(obj, id, desc) {
        Ok(outcome) => {
            *result = outcome;
            true
        }
        Err(_) => false,
    }
}

/// `[[Get]]` on `target`, typically a wrapper's target.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `vp` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_forward_get(
    cx: *mut Context,
    target: ObjectId,
    receiver: Value,
    id: PropertyKey,
    vp: *mut Value,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (Some(cx), Some(vp)) = (unsafe { (cx.as_mut(), vp.as_mut()) }) else {
        return false;
    };
    match cx.get(target, receiver, id) {
        Ok(value) => {
            *vp = value;
            true
        }
        Err(_) => false,
    }
}

/// `[[Set]]` on `target`.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `result` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_forward_set(
    cx: *mut Context,
    target: ObjectId,
    id: PropertyKey,
    v: Value,
    receiver: Value,
    result: *mut ObjectOpResult,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (Some(cx), Some(result)) = (unsafe { (cx.as_mut(), result.as_mut()) }) else {
        return false;
    };
    match cx.set(target, id, v, receiver) {
        Ok(outcome) => {
            *result = outcome;
            true
        }
        Err(_) => false,
    }
}

// ----------------------------------------------------------------------
// Descriptors
// ----------------------------------------------------------------------

/// Fill `desc` as a complete data descriptor. `attrs` is a combination
/// of the `PROP_*` flags.
///
/// # Safety
/// - `desc` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_set_data_property_descriptor(
    desc: *mut PropertyDescriptor,
    value: Value,
    attrs: u32,
) {
    // SAFETY: null-checked, validity guaranteed by the caller
    if let Some(desc) = unsafe { desc.as_mut() } {
        *desc = PropertyDescriptor::data_with_attrs(value, attrs_from_flags(attrs));
    }
}

/// Fill `desc` as a complete accessor descriptor.
///
/// # Safety
/// - `desc` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_set_accessor_property_descriptor(
    desc: *mut PropertyDescriptor,
    getter: Option<ObjectId>,
    setter: Option<ObjectId>,
    attrs: u32,
) {
    // SAFETY: null-checked, validity guaranteed by the caller
    if let Some(desc) = unsafe { desc.as_mut() } {
        *desc = PropertyDescriptor::accessor(getter, setter, attrs_from_flags(attrs));
    }
}

// ----------------------------------------------------------------------
// Exceptions
// ----------------------------------------------------------------------

/// Set a pending `Error` with a UTF-8 message.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `msg` must be null or a NUL-terminated string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_report_error_utf8(cx: *mut Context, msg: *const c_char) {
    // SAFETY: null-checked, validity guaranteed by the caller
    let Some(cx) = (unsafe { cx.as_mut() }) else {
        return;
    };
    let message = utf8(msg).unwrap_or("");
    cx.report_error(ErrorKind::Error, message);
}

/// Whether an exception is pending.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_is_exception_pending(cx: *const Context) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    unsafe { cx.as_ref() }.is_some_and(Context::is_exception_pending)
}

/// Read the pending exception without clearing it.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `out` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_get_pending_exception(cx: *const Context, out: *mut Value) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (Some(cx), Some(out)) = (unsafe { (cx.as_ref(), out.as_mut()) }) else {
        return false;
    };
    match cx.pending_exception() {
        Some(value) => {
            *out = value;
            true
        }
        None => false,
    }
}

/// Make `value` the pending exception.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_set_pending_exception(cx: *mut Context, value: Value) {
    // SAFETY: null-checked, validity guaranteed by the caller
    if let Some(cx) = unsafe { cx.as_mut() } {
        cx.throw(value);
    }
}

/// Drop the pending exception.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_clear_pending_exception(cx: *mut Context) {
    // SAFETY: null-checked, validity guaranteed by the caller
    if let Some(cx) = unsafe { cx.as_mut() } {
        cx.clear_pending_exception();
    }
}

// ----------------------------------------------------------------------
// Keys and strings
// ----------------------------------------------------------------------

/// Integer key
#[unsafe(no_mangle)]
pub extern "C" fn jsproxy_int_to_id(i: u32) -> PropertyKey {
    PropertyKey::index(i)
}

/// Whether `id` is an integer key
#[unsafe(no_mangle)]
pub extern "C" fn jsproxy_id_is_int(id: PropertyKey) -> bool {
    id.is_int()
}

/// Integer payload of `id`, 0 for other keys
#[unsafe(no_mangle)]
pub extern "C" fn jsproxy_id_to_int(id: PropertyKey) -> u32 {
    id.as_int().unwrap_or(0)
}

/// Whether `id` is a string key
#[unsafe(no_mangle)]
pub extern "C" fn jsproxy_id_is_string(id: PropertyKey) -> bool {
    id.is_atom()
}

/// Whether `id` is a symbol key
#[unsafe(no_mangle)]
pub extern "C" fn jsproxy_id_is_symbol(id: PropertyKey) -> bool {
    id.is_symbol()
}

/// Property key for a UTF-8 name; canonical indices become integer keys.
/// Reports a `TypeError` for invalid UTF-8.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `name` must be null or a NUL-terminated string
/// - `out` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_atomize_utf8(
    cx: *mut Context,
    name: *const c_char,
    out: *mut PropertyKey,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (Some(cx), Some(out)) = (unsafe { (cx.as_mut(), out.as_mut()) }) else {
        return false;
    };
    match utf8(name) {
        Some(name) => {
            *out = cx.key(name);
            true
        }
        None => {
            cx.report_error(ErrorKind::TypeError, "property name is not valid UTF-8");
            false
        }
    }
}

/// String value from UTF-8. Reports a `TypeError` for invalid UTF-8.
///
/// # Safety
/// Same as [`jsproxy_atomize_utf8`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_new_string_utf8(
    cx: *mut Context,
    s: *const c_char,
    out: *mut Value,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let (Some(cx), Some(out)) = (unsafe { (cx.as_mut(), out.as_mut()) }) else {
        return false;
    };
    match utf8(s) {
        Some(s) => {
            *out = cx.new_string(s);
            true
        }
        None => {
            cx.report_error(ErrorKind::TypeError, "string is not valid UTF-8");
            false
        }
    }
}

// ----------------------------------------------------------------------
// Tracing
// ----------------------------------------------------------------------

/// Report a value edge from a `trace` trap.
///
/// # Safety
/// - `trc` must be null or the tracer passed to the trap
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_trace_value(trc: *mut Tracer, value: Value) {
    // SAFETY: null-checked, validity guaranteed by the caller
    if let Some(trc) = unsafe { trc.as_mut() } {
        trc.trace_value(value);
    }
}

/// Report an object edge from a `trace` trap.
///
/// # Safety
/// - `trc` must be null or the tracer passed to the trap
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_trace_object(trc: *mut Tracer, obj: ObjectId) {
    // SAFETY: null-checked, validity guaranteed by the caller
    if let Some(trc) = unsafe { trc.as_mut() } {
        trc.trace_object(obj);
    }
}
