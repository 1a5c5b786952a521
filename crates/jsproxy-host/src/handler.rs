//! Proxy handler interface
//!
//! A proxy object forwards every fundamental operation to its
//! [`ProxyHandler`]. Each method has a default that reproduces
//! [`BaseProxyHandler`]: the fundamental operations succeed without effect
//! and the derived ones (`has`, `get`, `set`, ...) are rebuilt from the
//! fundamental ones through the [`Context`], so they observe whatever the
//! concrete handler overrides.
//!
//! [`Wrapper`] replaces every default with a pass-through to the object
//! stored in the proxy's private slot.

use std::any::Any;

use crate::context::Context;
use crate::descriptor::PropertyDescriptor;
use crate::error::{ErrorKind, JsResult};
use crate::gc::Tracer;
use crate::id::{IdVector, PropertyKey};
use crate::object::ObjectId;
use crate::op_result::ObjectOpResult;
use crate::value::Value;

/// Result of `[[GetPrototypeIfOrdinary]]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrdinaryPrototype {
    /// The prototype is static and was read without side effects
    Ordinary(Option<ObjectId>),
    /// The prototype must be obtained through `get_prototype`
    NotOrdinary,
}

/// Source text reported for callable objects without source
pub const NATIVE_CODE_SOURCE: &str = "function () {\n    [native code]\n}";

/// Operations a proxy object delegates to its handler.
///
/// Handlers are shared between all proxies created with them and are only
/// used on the context's thread.
#[allow(unused_variables)]
pub trait ProxyHandler: 'static {
    /// Concrete type access, for handler inspection
    fn as_any(&self) -> &dyn Any;

    /// Whether this handler transparently wraps its private target
    fn is_wrapper(&self) -> bool {
        false
    }

    /// `[[GetOwnProperty]]`
    fn get_own_property_descriptor(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        id: PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        Ok(None)
    }

    /// `[[DefineOwnProperty]]`
    fn define_property(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        id: PropertyKey,
        desc: &PropertyDescriptor,
    ) -> JsResult<ObjectOpResult> {
        Ok(ObjectOpResult::ok())
    }

    /// `[[OwnPropertyKeys]]`, appended to `props`
    fn own_property_keys(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        props: &mut IdVector,
    ) -> JsResult<()> {
        Ok(())
    }

    /// `[[Delete]]`
    fn delete(&self, cx: &mut Context, proxy: ObjectId, id: PropertyKey) -> JsResult<ObjectOpResult> {
        Ok(ObjectOpResult::ok())
    }

    /// String keys visited by `for-in`, own and inherited, appended to `props`
    fn enumerate(&self, cx: &mut Context, proxy: ObjectId, props: &mut IdVector) -> JsResult<()> {
        cx.enumerate_through_prototypes(proxy, props)
    }

    /// `[[GetPrototypeOf]]` when it has no side effects
    fn get_prototype_if_ordinary(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
    ) -> JsResult<OrdinaryPrototype> {
        Ok(cx.stored_proxy_prototype(proxy))
    }

    /// `[[GetPrototypeOf]]`
    fn get_prototype(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<Option<ObjectId>> {
        Ok(cx.stored_prototype(proxy))
    }

    /// `[[SetPrototypeOf]]`
    fn set_prototype(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        proto: Option<ObjectId>,
    ) -> JsResult<ObjectOpResult> {
        Ok(cx.store_prototype(proxy, proto))
    }

    /// Freeze the prototype; `Ok(false)` when unsupported
    fn set_immutable_prototype(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<bool> {
        Ok(false)
    }

    /// `[[PreventExtensions]]`
    fn prevent_extensions(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<ObjectOpResult> {
        cx.store_extensible(proxy, false);
        Ok(ObjectOpResult::ok())
    }

    /// `[[IsExtensible]]`
    fn is_extensible(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<bool> {
        Ok(cx.stored_extensible(proxy))
    }

    /// `[[HasProperty]]`
    fn has(&self, cx: &mut Context, proxy: ObjectId, id: PropertyKey) -> JsResult<bool> {
        if cx.get_own_property_descriptor(proxy, id)?.is_some() {
            return Ok(true);
        }
        match cx.get_prototype(proxy)? {
            Some(proto) => cx.has(proto, id),
            None => Ok(false),
        }
    }

    /// `[[Get]]`
    fn get(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        receiver: Value,
        id: PropertyKey,
    ) -> JsResult<Value> {
        match cx.get_own_property_descriptor(proxy, id)? {
            Some(desc) => cx.get_from_descriptor(&desc, receiver),
            None => match cx.get_prototype(proxy)? {
                Some(proto) => cx.get(proto, receiver, id),
                None => Ok(Value::undefined()),
            },
        }
    }

    /// `[[Set]]`
    fn set(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        id: PropertyKey,
        v: Value,
        receiver: Value,
    ) -> JsResult<ObjectOpResult> {
        let own = cx.get_own_property_descriptor(proxy, id)?;
        cx.ordinary_set_with_own_descriptor(proxy, id, v, receiver, own)
    }

    /// `[[Call]]`. Only reached when `is_callable` answered `true`.
    fn call(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        this: Value,
        args: &[Value],
    ) -> JsResult<Value> {
        Ok(Value::undefined())
    }

    /// `[[Construct]]`. Only reached when `is_constructor` answered `true`.
    fn construct(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        args: &[Value],
        new_target: Value,
    ) -> JsResult<Value> {
        Ok(Value::undefined())
    }

    /// Own-property existence check
    fn has_own(&self, cx: &mut Context, proxy: ObjectId, id: PropertyKey) -> JsResult<bool> {
        Ok(cx.get_own_property_descriptor(proxy, id)?.is_some())
    }

    /// Own enumerable keys, appended to `props`
    fn get_own_enumerable_property_keys(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        props: &mut IdVector,
    ) -> JsResult<()> {
        let mut all = IdVector::new();
        cx.own_property_keys(proxy, &mut all)?;
        for &id in all.iter() {
            if let Some(desc) = cx.get_own_property_descriptor(proxy, id)? {
                if desc.has_enumerable && desc.enumerable {
                    props.push(id);
                }
            }
        }
        Ok(())
    }

    /// Class name used by `Object.prototype.toString`
    fn class_name(&self, cx: &mut Context, proxy: ObjectId) -> String {
        if cx.is_callable(proxy) {
            "Function".to_string()
        } else {
            "Object".to_string()
        }
    }

    /// `Function.prototype.toString`
    fn fun_to_string(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        is_to_string: bool,
    ) -> JsResult<Value> {
        if cx.is_callable(proxy) {
            Ok(cx.new_string(NATIVE_CODE_SOURCE))
        } else {
            Err(cx.report_error(
                ErrorKind::TypeError,
                "Function.prototype.toString called on incompatible object",
            ))
        }
    }

    /// Primitive held by a boxed object
    fn boxed_value_unbox(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<Value> {
        Ok(Value::undefined())
    }

    /// Report handler-owned edges to the collector
    fn trace(&self, trc: &mut Tracer, proxy: ObjectId) {}

    /// Called once before the proxy is freed. The proxy is still readable.
    fn finalize(&self, cx: &mut Context, proxy: ObjectId) {}

    /// Whether `[[Call]]` is supported
    fn is_callable(&self, cx: &mut Context, proxy: ObjectId) -> bool {
        cx.stored_callable(proxy)
    }

    /// Whether `[[Construct]]` is supported
    fn is_constructor(&self, cx: &mut Context, proxy: ObjectId) -> bool {
        cx.is_callable(proxy)
    }
}

/// Handler with every default: fundamental operations succeed without
/// effect. Used for opaque objects whose behavior lives elsewhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseProxyHandler;

impl ProxyHandler for BaseProxyHandler {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Handler that behaves exactly like the object in the proxy's private slot
#[derive(Clone, Copy, Debug, Default)]
pub struct Wrapper;

impl Wrapper {
    fn target(cx: &mut Context, proxy: ObjectId) -> JsResult<ObjectId> {
        match cx.proxy_target(proxy) {
            Some(target) => Ok(target),
            None => Err(cx.report_error(ErrorKind::TypeError, "wrapper has no target object")),
        }
    }
}

impl ProxyHandler for Wrapper {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_wrapper(&self) -> bool {
        true
    }

    fn get_own_property_descriptor(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        id: PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        let target = Self::target(cx, proxy)?;
        cx.get_own_property_descriptor(target, id)
    }

    fn define_property(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        id: PropertyKey,
        desc: &PropertyDescriptor,
    ) -> JsResult<ObjectOpResult> {
        let target = Self::target(cx, proxy)?;
        cx.define_property(target, id, desc)
    }

    fn own_property_keys(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        props: &mut IdVector,
    ) -> JsResult<()> {
        let target = Self::target(cx, proxy)?;
        cx.own_property_keys(target, props)
    }

    fn delete(&self, cx: &mut Context, proxy: ObjectId, id: PropertyKey) -> JsResult<ObjectOpResult> {
        let target = Self::target(cx, proxy)?;
        cx.delete_property(target, id)
    }

    fn enumerate(&self, cx: &mut Context, proxy: ObjectId, props: &mut IdVector) -> JsResult<()> {
        let target = Self::target(cx, proxy)?;
        cx.enumerate(target, props)
    }

    fn get_prototype_if_ordinary(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
    ) -> JsResult<OrdinaryPrototype> {
        let target = Self::target(cx, proxy)?;
        cx.get_prototype_if_ordinary(target)
    }

    fn get_prototype(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<Option<ObjectId>> {
        let target = Self::target(cx, proxy)?;
        cx.get_prototype(target)
    }

    fn set_prototype(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        proto: Option<ObjectId>,
    ) -> JsResult<ObjectOpResult> {
        let target = Self::target(cx, proxy)?;
        cx.set_prototype(target, proto)
    }

    fn set_immutable_prototype(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<bool> {
        let target = Self::target(cx, proxy)?;
        cx.set_immutable_prototype(target)
    }

    fn prevent_extensions(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<ObjectOpResult> {
        let target = Self::target(cx, proxy)?;
        cx.prevent_extensions(target)
    }

    fn is_extensible(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<bool> {
        let target = Self::target(cx, proxy)?;
        cx.is_extensible(target)
    }

    fn has(&self, cx: &mut Context, proxy: ObjectId, id: PropertyKey) -> JsResult<bool> {
        let target = Self::target(cx, proxy)?;
        cx.has(target, id)
    }

    fn get(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        receiver: Value,
        id: PropertyKey,
    ) -> JsResult<Value> {
        let target = Self::target(cx, proxy)?;
        cx.get(target, receiver, id)
    }

    fn set(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        id: PropertyKey,
        v: Value,
        receiver: Value,
    ) -> JsResult<ObjectOpResult> {
        let target = Self::target(cx, proxy)?;
        cx.set(target, id, v, receiver)
    }

    fn call(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        this: Value,
        args: &[Value],
    ) -> JsResult<Value> {
        let target = Self::target(cx, proxy)?;
        cx.call(target, this, args)
    }

    fn construct(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        args: &[Value],
        new_target: Value,
    ) -> JsResult<Value> {
        let target = Self::target(cx, proxy)?;
        // A construct aimed at the wrapper is aimed at the target
        let new_target = if new_target.as_object() == Some(proxy) {
            Value::object(target)
        } else {
            new_target
        };
        cx.construct(target, args, new_target)
    }

    fn has_own(&self, cx: &mut Context, proxy: ObjectId, id: PropertyKey) -> JsResult<bool> {
        let target = Self::target(cx, proxy)?;
        cx.has_own(target, id)
    }

    fn get_own_enumerable_property_keys(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        props: &mut IdVector,
    ) -> JsResult<()> {
        let target = Self::target(cx, proxy)?;
        cx.get_own_enumerable_property_keys(target, props)
    }

    fn class_name(&self, cx: &mut Context, proxy: ObjectId) -> String {
        match cx.proxy_target(proxy) {
            Some(target) => cx.class_name(target),
            None => "Object".to_string(),
        }
    }

    fn fun_to_string(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        is_to_string: bool,
    ) -> JsResult<Value> {
        let target = Self::target(cx, proxy)?;
        cx.fun_to_string(target, is_to_string)
    }

    fn boxed_value_unbox(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<Value> {
        let target = Self::target(cx, proxy)?;
        cx.boxed_value_unbox(target)
    }

    fn is_callable(&self, cx: &mut Context, proxy: ObjectId) -> bool {
        cx.proxy_target(proxy).is_some_and(|target| cx.is_callable(target))
    }

    fn is_constructor(&self, cx: &mut Context, proxy: ObjectId) -> bool {
        cx.proxy_target(proxy)
            .is_some_and(|target| cx.is_constructor(target))
    }
}
