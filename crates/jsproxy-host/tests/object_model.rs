//! Ordinary Object Tests
//!
//! Property semantics of non-proxy objects, which the base and wrapper
//! handlers reach back into.

use jsproxy_host::{
    Context, ContextOptions, FailureCode, IdVector, JsError, PropertyAttributes,
    PropertyDescriptor, Value,
};

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_get_and_set_through_prototype_chain() {
    let mut cx = Context::new();
    let base = cx.new_object();
    cx.define_data(base, "shared", Value::int32(1), PropertyAttributes::data())
        .unwrap();
    let derived = cx.new_object_with_proto(Some(base));

    assert_eq!(cx.get_property(derived, "shared"), Ok(Value::int32(1)));

    // Assignment shadows on the receiver
    cx.set_property(derived, "shared", Value::int32(2)).unwrap();
    assert_eq!(cx.get_property(derived, "shared"), Ok(Value::int32(2)));
    assert_eq!(cx.get_property(base, "shared"), Ok(Value::int32(1)));
}

#[test]
fn test_read_only_inherited_blocks_assignment() {
    let mut cx = Context::new();
    let base = cx.new_object();
    cx.define_data(base, "fixed", Value::int32(1), PropertyAttributes::frozen())
        .unwrap();
    let derived = cx.new_object_with_proto(Some(base));
    let id = cx.key("fixed");

    let result = cx.set(derived, id, Value::int32(2), Value::object(derived)).unwrap();
    assert_eq!(result.failure_code(), Some(FailureCode::ReadOnly));
    assert_eq!(cx.has_own(derived, id), Ok(false));
}

#[test]
fn test_accessors() {
    let mut cx = Context::new();
    let obj = cx.new_object();
    let getter = cx.new_function("get", |_cx, _this, _args| Ok(Value::int32(10)));
    let store = cx.new_object();
    let setter = cx.new_function("set", move |cx, _this, args| {
        let v = args.first().copied().unwrap_or(Value::undefined());
        cx.set_property(store, "last", v)?;
        Ok(Value::undefined())
    });
    let both = cx.key("both");
    let read_only = cx.key("readOnly");
    cx.define_property(
        obj,
        both,
        &PropertyDescriptor::accessor(Some(getter), Some(setter), PropertyAttributes::data()),
    )
    .unwrap();
    cx.define_property(
        obj,
        read_only,
        &PropertyDescriptor::accessor(Some(getter), None, PropertyAttributes::data()),
    )
    .unwrap();

    assert_eq!(cx.get_property(obj, "both"), Ok(Value::int32(10)));
    cx.set_property(obj, "both", Value::int32(4)).unwrap();
    assert_eq!(cx.get_property(store, "last"), Ok(Value::int32(4)));

    let result = cx.set(obj, read_only, Value::int32(1), Value::object(obj)).unwrap();
    assert_eq!(result.failure_code(), Some(FailureCode::GetterOnly));
}

#[test]
fn test_non_extensible_and_non_configurable() {
    let mut cx = Context::new();
    let obj = cx.new_object();
    cx.define_data(obj, "kept", Value::int32(1), PropertyAttributes::frozen())
        .unwrap();
    let kept = cx.key("kept");
    let fresh = cx.key("fresh");

    let result = cx.delete_property(obj, kept).unwrap();
    assert_eq!(result.failure_code(), Some(FailureCode::CantDelete));

    cx.prevent_extensions(obj).unwrap();
    assert_eq!(cx.is_extensible(obj), Ok(false));
    let result = cx
        .define_property(obj, fresh, &PropertyDescriptor::data(Value::int32(2)))
        .unwrap();
    assert_eq!(result.failure_code(), Some(FailureCode::NotExtensible));

    let err = cx.set_property(obj, "fresh", Value::int32(2)).unwrap_err();
    match cx.finish::<()>(Err(err)) {
        Err(JsError::Exception { message, .. }) => {
            assert_eq!(message, "TypeError: property fresh can't be added: object is not extensible");
        }
        other => panic!("expected exception, got {other:?}"),
    }
}

#[test]
fn test_enumerate_reports_shadowed_keys_once() {
    let mut cx = Context::new();
    let base = cx.new_object();
    cx.define_data(base, "a", Value::int32(1), PropertyAttributes::data())
        .unwrap();
    cx.define_data(base, "hidden", Value::int32(1), PropertyAttributes::hidden())
        .unwrap();
    let derived = cx.new_object_with_proto(Some(base));
    cx.define_data(derived, "b", Value::int32(2), PropertyAttributes::data())
        .unwrap();
    cx.define_data(derived, "a", Value::int32(3), PropertyAttributes::data())
        .unwrap();

    let mut keys = IdVector::new();
    cx.enumerate(derived, &mut keys).unwrap();
    let names: Vec<String> = keys.iter().map(|&id| cx.key_to_string(id)).collect();
    assert_eq!(names, vec!["b", "a"]);
}

// ============================================================================
// Prototypes
// ============================================================================

#[test]
fn test_prototype_cycles_and_immutability() {
    let mut cx = Context::new();
    let a = cx.new_object();
    let b = cx.new_object_with_proto(Some(a));

    let result = cx.set_prototype(a, Some(b)).unwrap();
    assert_eq!(result.failure_code(), Some(FailureCode::CantSetProto));

    assert_eq!(cx.set_immutable_prototype(b), Ok(true));
    assert!(cx.set_prototype(b, Some(a)).unwrap().is_ok());
    let result = cx.set_prototype(b, None).unwrap();
    assert_eq!(result.failure_code(), Some(FailureCode::CantSetProto));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_construct_uses_new_target_prototype() {
    let mut cx = Context::new();
    let point = cx.new_constructor("Point", |cx, this, args| {
        let this = this.as_object().unwrap_or_else(|| cx.global());
        cx.set_property(this, "x", args.first().copied().unwrap_or(Value::int32(0)))?;
        Ok(Value::undefined())
    });

    let instance = cx.construct(point, &[Value::int32(3)], Value::undefined()).unwrap();
    let instance = instance.as_object().unwrap();
    assert_eq!(cx.get_property(instance, "x"), Ok(Value::int32(3)));
    let proto = cx.get_property(point, "prototype").unwrap().as_object();
    assert_eq!(cx.get_prototype(instance), Ok(proto));

    let plain = cx.new_function("plain", |_cx, _this, _args| Ok(Value::undefined()));
    assert!(cx.is_callable(plain));
    assert!(!cx.is_constructor(plain));
    assert!(cx.construct(plain, &[], Value::undefined()).is_err());
    let err = cx.finish::<Value>(Err(jsproxy_host::Throw)).unwrap_err();
    assert!(err.to_string().ends_with("is not a constructor"));
}

#[test]
fn test_call_and_source_text() {
    let mut cx = Context::new();
    let double = cx.new_function("double", |_cx, _this, args| {
        Ok(Value::int32(args.first().and_then(|v| v.as_int32()).unwrap_or(0) * 2))
    });
    assert_eq!(cx.call(double, Value::undefined(), &[Value::int32(4)]), Ok(Value::int32(8)));

    let source = cx.fun_to_string(double, true).unwrap();
    assert_eq!(
        cx.value_to_string(source),
        "function double() {\n    [native code]\n}"
    );

    let obj = cx.new_object();
    assert!(cx.call(obj, Value::undefined(), &[]).is_err());
    let err = cx.finish::<Value>(Err(jsproxy_host::Throw)).unwrap_err();
    assert_eq!(err.to_string(), "Uncaught exception: TypeError: [object Object] is not a function");
    assert!(cx.fun_to_string(obj, true).is_err());
}

#[test]
fn test_boxed_values_and_class_names() {
    let mut cx = Context::new();
    let boxed = cx.new_boxed(Value::number(1.5));
    assert_eq!(cx.boxed_value_unbox(boxed), Ok(Value::number(1.5)));
    let plain = cx.new_object();
    assert_eq!(cx.boxed_value_unbox(plain), Ok(Value::undefined()));
    assert_eq!(cx.class_name(plain), "Object");
    let global = cx.global();
    assert_eq!(cx.class_name(global), "global");
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_options_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("context.json");
    std::fs::write(&path, r#"{ "maxDispatchDepth": 8 }"#).unwrap();

    let options = ContextOptions::from_path(&path).unwrap();
    assert_eq!(options, ContextOptions::new().max_dispatch_depth(8));
    let cx = Context::with_options(options);
    assert_eq!(cx.options().max_dispatch_depth, 8);

    assert!(matches!(
        ContextOptions::from_path(dir.path().join("missing.json")),
        Err(JsError::Io(_))
    ));
}
