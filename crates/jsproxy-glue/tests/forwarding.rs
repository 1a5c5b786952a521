//! Forwarding Handler Tests
//!
//! Filled trap slots are called exactly once with the operation's
//! arguments and their answer is returned unchanged. Null slots behave like
//! the minimal base handler.

mod common;

use common::{context, forwarding_proxy, record, take_calls, take_trap_names};
use jsproxy_glue::ProxyTraps;
use jsproxy_host::{
    Context, ErrorKind, FailureCode, IdVector, JsError, ObjectId, ObjectOpResult,
    OrdinaryPrototype, PropertyAttributes, PropertyDescriptor, PropertyKey, ProxyOptions, Value,
};

// ============================================================================
// Trap functions
// ============================================================================

unsafe extern "C" fn get_answers_99(
    _cx: *mut Context,
    proxy: ObjectId,
    receiver: Value,
    id: PropertyKey,
    vp: *mut Value,
) -> bool {
    record("get", proxy, Some(id), &[receiver]);
    unsafe { *vp = Value::int32(99) };
    true
}

unsafe extern "C" fn get_throws(
    cx: *mut Context,
    proxy: ObjectId,
    receiver: Value,
    id: PropertyKey,
    _vp: *mut Value,
) -> bool {
    record("get", proxy, Some(id), &[receiver]);
    let cx = unsafe { &mut *cx };
    cx.report_error(ErrorKind::TypeError, "get refused");
    false
}

unsafe extern "C" fn get_fails_silently(
    _cx: *mut Context,
    proxy: ObjectId,
    receiver: Value,
    id: PropertyKey,
    _vp: *mut Value,
) -> bool {
    record("get", proxy, Some(id), &[receiver]);
    false
}

unsafe extern "C" fn has_records(
    _cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    bp: *mut bool,
) -> bool {
    record("has", proxy, Some(id), &[]);
    unsafe { *bp = true };
    true
}

unsafe extern "C" fn has_own_records(
    _cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    bp: *mut bool,
) -> bool {
    record("hasOwn", proxy, Some(id), &[]);
    unsafe { *bp = true };
    true
}

unsafe extern "C" fn gopd_records(
    _cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    _desc: *mut PropertyDescriptor,
    _is_none: *mut bool,
) -> bool {
    record("getOwnPropertyDescriptor", proxy, Some(id), &[]);
    true
}

unsafe extern "C" fn set_read_only(
    _cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    v: Value,
    receiver: Value,
    result: *mut ObjectOpResult,
) -> bool {
    record("set", proxy, Some(id), &[v, receiver]);
    unsafe { (*result).fail(FailureCode::ReadOnly) };
    true
}

unsafe extern "C" fn define_records_value(
    _cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    desc: *const PropertyDescriptor,
    result: *mut ObjectOpResult,
) -> bool {
    let desc = unsafe { &*desc };
    record("defineProperty", proxy, Some(id), &[desc.value]);
    unsafe { (*result).fail(FailureCode::CantDefineProperty) };
    true
}

unsafe extern "C" fn call_sums(
    _cx: *mut Context,
    proxy: ObjectId,
    this: Value,
    argc: u32,
    argv: *const Value,
    rval: *mut Value,
) -> bool {
    let args = if argc == 0 {
        &[][..]
    } else {
        unsafe { std::slice::from_raw_parts(argv, argc as usize) }
    };
    let mut values = vec![this];
    values.extend_from_slice(args);
    record("call", proxy, None, &values);
    let sum = args.iter().filter_map(|v| v.as_int32()).sum();
    unsafe { *rval = Value::int32(sum) };
    true
}

unsafe extern "C" fn construct_returns_target(
    _cx: *mut Context,
    proxy: ObjectId,
    argc: u32,
    _argv: *const Value,
    new_target: Value,
    rval: *mut Value,
) -> bool {
    record("construct", proxy, None, &[Value::int32(argc as i32), new_target]);
    unsafe { *rval = new_target };
    true
}

unsafe extern "C" fn prototype_is_global(
    cx: *mut Context,
    proxy: ObjectId,
    protop: *mut Option<ObjectId>,
) -> bool {
    record("getPrototype", proxy, None, &[]);
    let global = unsafe { (*cx).global() };
    unsafe { *protop = Some(global) };
    true
}

unsafe extern "C" fn not_ordinary(
    _cx: *mut Context,
    proxy: ObjectId,
    is_ordinary: *mut bool,
    _protop: *mut Option<ObjectId>,
) -> bool {
    record("getPrototypeIfOrdinary", proxy, None, &[]);
    unsafe { *is_ordinary = false };
    true
}

unsafe extern "C" fn always_callable(_cx: *mut Context, proxy: ObjectId) -> bool {
    record("isCallable", proxy, None, &[]);
    true
}

unsafe extern "C" fn delete_refuses(
    _cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    result: *mut ObjectOpResult,
) -> bool {
    record("delete", proxy, Some(id), &[]);
    unsafe { (*result).fail(FailureCode::CantDelete) };
    true
}

// ============================================================================
// Present traps
// ============================================================================

#[test]
fn test_get_trap_called_once_with_arguments() {
    let mut cx = context();
    let traps = ProxyTraps {
        get: Some(get_answers_99),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());
    let receiver = Value::object(cx.new_object());
    let id = cx.key("p");

    assert_eq!(cx.get(proxy, receiver, id), Ok(Value::int32(99)));
    assert_eq!(
        take_calls(),
        vec![common::Call {
            trap: "get",
            proxy,
            id: Some(id),
            values: vec![receiver],
        }]
    );
}

#[test]
fn test_set_refusal_returned_verbatim() {
    let mut cx = context();
    let traps = ProxyTraps {
        set: Some(set_read_only),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());
    let id = cx.key("p");

    let result = cx.set(proxy, id, Value::int32(1), Value::object(proxy)).unwrap();
    assert_eq!(result.failure_code(), Some(FailureCode::ReadOnly));
    assert_eq!(take_trap_names(), vec!["set"]);

    // Strict callers turn the refusal into a TypeError
    let err = cx.set_property(proxy, "p", Value::int32(1)).unwrap_err();
    assert!(cx.is_exception_pending());
    let err = cx.finish::<()>(Err(err)).unwrap_err();
    assert!(err.to_string().contains("read-only"));
}

#[test]
fn test_define_property_sees_descriptor() {
    let mut cx = context();
    let traps = ProxyTraps {
        define_property: Some(define_records_value),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());
    let id = cx.key("p");

    let result = cx
        .define_property(proxy, id, &PropertyDescriptor::data(Value::number(2.5)))
        .unwrap();
    assert_eq!(result.failure_code(), Some(FailureCode::CantDefineProperty));
    let calls = take_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].values, vec![Value::number(2.5)]);
}

#[test]
fn test_call_and_construct_flat_arguments() {
    let mut cx = context();
    let traps = ProxyTraps {
        call: Some(call_sums),
        construct: Some(construct_returns_target),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new().callable(true));
    let this = Value::boolean(true);
    let args = [Value::int32(1), Value::int32(2), Value::int32(3)];

    assert_eq!(cx.call(proxy, this, &args), Ok(Value::int32(6)));
    let calls = take_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].values, vec![this, args[0], args[1], args[2]]);

    assert_eq!(cx.call(proxy, this, &[]), Ok(Value::int32(0)));
    assert_eq!(take_calls()[0].values, vec![this]);

    let new_target = Value::object(cx.new_object());
    assert_eq!(cx.construct(proxy, &args[..2], new_target), Ok(new_target));
    assert_eq!(take_calls()[0].values, vec![Value::int32(2), new_target]);
}

#[test]
fn test_prototype_traps() {
    let mut cx = context();
    let traps = ProxyTraps {
        get_prototype: Some(prototype_is_global),
        get_prototype_if_ordinary: Some(not_ordinary),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());

    assert_eq!(
        cx.get_prototype_if_ordinary(proxy),
        Ok(OrdinaryPrototype::NotOrdinary)
    );
    assert_eq!(cx.get_prototype(proxy), Ok(Some(cx.global())));
    assert_eq!(
        take_trap_names(),
        vec!["getPrototypeIfOrdinary", "getPrototype"]
    );
}

#[test]
fn test_capability_trap_overrides_stored_flag() {
    let mut cx = context();
    let traps = ProxyTraps {
        is_callable: Some(always_callable),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());

    assert!(cx.is_callable(proxy));
    // Null is_constructor falls back to the base, which asks is_callable
    assert!(cx.is_constructor(proxy));
    assert_eq!(take_trap_names(), vec!["isCallable", "isCallable"]);
    // No call trap: the base call succeeds with undefined
    assert_eq!(cx.call(proxy, Value::undefined(), &[]), Ok(Value::undefined()));
}

#[test]
fn test_delete_refusal() {
    let mut cx = context();
    let traps = ProxyTraps {
        delete: Some(delete_refuses),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());
    let id = cx.key("gone");

    let result = cx.delete_property(proxy, id).unwrap();
    assert_eq!(result.failure_code(), Some(FailureCode::CantDelete));
    assert!(result.check_strict(&mut cx, id).is_err());
}

// ============================================================================
// Failure channels
// ============================================================================

#[test]
fn test_trap_failure_keeps_exception() {
    let mut cx = context();
    let traps = ProxyTraps {
        get: Some(get_throws),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());

    let result = cx.get_property(proxy, "p");
    assert!(result.is_err());
    assert!(cx.is_exception_pending());
    match cx.finish(result) {
        Err(JsError::Exception { message, .. }) => assert_eq!(message, "TypeError: get refused"),
        other => panic!("expected exception, got {other:?}"),
    }
}

#[test]
fn test_trap_failure_without_exception_is_uncatchable() {
    let mut cx = context();
    let traps = ProxyTraps {
        get: Some(get_fails_silently),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());

    let result = cx.get_property(proxy, "p");
    assert!(!cx.is_exception_pending());
    assert!(matches!(cx.finish(result), Err(JsError::Uncatchable)));
}

#[test]
fn test_get_does_not_synthesize_has() {
    let mut cx = context();
    let traps = ProxyTraps {
        has: None,
        get: Some(get_fails_silently),
        has_own: Some(has_own_records),
        get_own_property_descriptor: Some(gopd_records),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());
    let id = cx.key("p");

    assert!(cx.get(proxy, Value::object(proxy), id).is_err());
    assert_eq!(take_trap_names(), vec!["get"]);
}

#[test]
fn test_null_has_composes_from_descriptor_lookup() {
    let mut cx = context();
    let traps = ProxyTraps {
        get_own_property_descriptor: Some(gopd_records),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());
    let id = cx.key("p");

    // The trap leaves is_none set, so the property is absent
    assert_eq!(cx.has(proxy, id), Ok(false));
    assert_eq!(take_trap_names(), vec!["getOwnPropertyDescriptor"]);

    let traps = ProxyTraps {
        has: Some(has_records),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());
    assert_eq!(cx.has(proxy, id), Ok(true));
    assert_eq!(take_trap_names(), vec!["has"]);
}

// ============================================================================
// Null traps: minimal base behavior
// ============================================================================

#[test]
fn test_all_null_forwarding_is_noop_success() {
    let mut cx = context();
    let proto = cx.new_object();
    let global = cx.global();
    let handler = unsafe {
        jsproxy_glue::ForwardingProxyHandler::forwarding(ProxyTraps::default(), std::ptr::null())
    };
    let proxy = cx.new_proxy(
        std::rc::Rc::new(handler),
        Value::undefined(),
        Some(proto),
        ProxyOptions::new(),
    );
    let id = cx.key("p");

    assert_eq!(cx.get_own_property_descriptor(proxy, id), Ok(None));
    let defined = cx
        .define_property(proxy, id, &PropertyDescriptor::data(Value::int32(1)))
        .unwrap();
    assert!(defined.is_ok());
    assert_eq!(cx.get_own_property_descriptor(proxy, id), Ok(None));

    let mut keys = IdVector::new();
    cx.own_property_keys(proxy, &mut keys).unwrap();
    assert!(keys.is_empty());

    assert!(cx.delete_property(proxy, id).unwrap().is_ok());
    assert_eq!(cx.has(proxy, id), Ok(false));
    assert_eq!(cx.has_own(proxy, id), Ok(false));
    assert_eq!(cx.get(proxy, Value::object(proxy), id), Ok(Value::undefined()));
    assert!(cx.set(proxy, id, Value::int32(5), Value::object(proxy)).unwrap().is_ok());
    assert_eq!(cx.get(proxy, Value::object(proxy), id), Ok(Value::undefined()));

    assert_eq!(cx.get_prototype(proxy), Ok(Some(proto)));
    assert_eq!(
        cx.get_prototype_if_ordinary(proxy),
        Ok(OrdinaryPrototype::Ordinary(Some(proto)))
    );
    assert!(cx.set_prototype(proxy, Some(global)).unwrap().is_ok());
    assert_eq!(cx.get_prototype(proxy), Ok(Some(global)));
    assert_eq!(cx.set_immutable_prototype(proxy), Ok(false));

    assert_eq!(cx.is_extensible(proxy), Ok(true));
    assert!(cx.prevent_extensions(proxy).unwrap().is_ok());
    assert_eq!(cx.is_extensible(proxy), Ok(false));

    assert_eq!(cx.class_name(proxy), "Object");
    assert!(!cx.is_callable(proxy));
    assert!(!cx.is_constructor(proxy));
    assert_eq!(cx.boxed_value_unbox(proxy), Ok(Value::undefined()));
    assert!(cx.fun_to_string(proxy, true).is_err());
    cx.clear_pending_exception();
    assert!(cx.call(proxy, Value::undefined(), &[]).is_err());
    cx.clear_pending_exception();
}

#[test]
fn test_null_get_reads_through_prototype() {
    let mut cx = context();
    let proto = cx.new_object();
    cx.define_data(proto, "inherited", Value::int32(3), PropertyAttributes::data())
        .unwrap();
    let handler = unsafe {
        jsproxy_glue::ForwardingProxyHandler::forwarding(ProxyTraps::default(), std::ptr::null())
    };
    let proxy = cx.new_proxy(
        std::rc::Rc::new(handler),
        Value::undefined(),
        Some(proto),
        ProxyOptions::new(),
    );

    assert_eq!(cx.get_property(proxy, "inherited"), Ok(Value::int32(3)));
    let id = cx.key("inherited");
    assert_eq!(cx.has(proxy, id), Ok(true));
    assert_eq!(cx.has_own(proxy, id), Ok(false));

    let mut keys = IdVector::new();
    cx.enumerate(proxy, &mut keys).unwrap();
    assert_eq!(keys.as_slice(), &[id]);
}

// ============================================================================
// Optional descriptors across the boundary
// ============================================================================

unsafe extern "C" fn gopd_negative_zero(
    _cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    desc: *mut PropertyDescriptor,
    is_none: *mut bool,
) -> bool {
    record("getOwnPropertyDescriptor", proxy, Some(id), &[]);
    unsafe {
        *desc = PropertyDescriptor::data_with_attrs(
            Value::number(-0.0),
            PropertyAttributes::hidden(),
        );
        *is_none = false;
    }
    true
}

unsafe extern "C" fn gopd_scribbles_but_absent(
    _cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    desc: *mut PropertyDescriptor,
    _is_none: *mut bool,
) -> bool {
    record("getOwnPropertyDescriptor", proxy, Some(id), &[]);
    unsafe { *desc = PropertyDescriptor::data(Value::int32(9)) };
    true
}

#[test]
fn test_descriptor_presence_crosses_boundary() {
    let mut cx = context();
    let id = cx.key("p");

    let traps = ProxyTraps {
        get_own_property_descriptor: Some(gopd_negative_zero),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());
    let desc = cx.get_own_property_descriptor(proxy, id).unwrap().unwrap();
    assert_eq!(desc.value.to_bits(), Value::number(-0.0).to_bits());
    assert!(desc.has_enumerable && !desc.enumerable);
    // Derived reads observe the same descriptor
    assert_eq!(
        cx.get(proxy, Value::object(proxy), id).map(Value::to_bits),
        Ok(Value::number(-0.0).to_bits())
    );

    // The flag decides, whatever the trap left in the value
    let traps = ProxyTraps {
        get_own_property_descriptor: Some(gopd_scribbles_but_absent),
        ..ProxyTraps::default()
    };
    let proxy = forwarding_proxy(&mut cx, traps, ProxyOptions::new());
    assert_eq!(cx.get_own_property_descriptor(proxy, id), Ok(None));
}
