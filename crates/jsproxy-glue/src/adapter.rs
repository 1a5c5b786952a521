//! Trap-table proxy handlers
//!
//! [`TrapProxyHandler`] implements [`ProxyHandler`] by calling the foreign
//! trap for each operation when its slot is filled and the base handler
//! `B` otherwise. A filled slot is invoked exactly once per operation and
//! its answer is returned as is: no retry, no fallback after failure, no
//! reentrancy guard.

use std::any::Any;
use std::ffi::{CStr, c_void};

use jsproxy_host::{
    BaseProxyHandler, Context, IdVector, JsResult, ObjectId, ObjectOpResult, OrdinaryPrototype,
    PropertyDescriptor, PropertyKey, ProxyHandler, Throw, Tracer, Value, Wrapper,
};
use tracing::{debug, trace, warn};

use crate::maybe::FfiMaybe;
use crate::traps::ProxyTraps;

/// Handler whose traps come from a foreign [`ProxyTraps`] table
pub struct TrapProxyHandler<B> {
    traps: ProxyTraps,
    extra: *const c_void,
    base: B,
}

/// Null traps fall back to [`BaseProxyHandler`]
pub type ForwardingProxyHandler = TrapProxyHandler<BaseProxyHandler>;

/// Null traps fall back to [`Wrapper`], forwarding to the proxy target
pub type WrapperProxyHandler = TrapProxyHandler<Wrapper>;

impl ForwardingProxyHandler {
    /// Forwarding handler carrying an opaque `extra` pointer for the
    /// foreign side.
    ///
    /// # Safety
    /// Every filled slot of `traps` must be callable with the documented
    /// signature for as long as the handler or any proxy using it lives.
    pub unsafe fn forwarding(traps: ProxyTraps, extra: *const c_void) -> Self {
        // SAFETY: forwarded from the caller
        unsafe { Self::new(traps, extra, BaseProxyHandler) }
    }
}

impl WrapperProxyHandler {
    /// Wrapper handler
    ///
    /// # Safety
    /// Same as [`ForwardingProxyHandler::forwarding`].
    pub unsafe fn wrapper(traps: ProxyTraps) -> Self {
        // SAFETY: forwarded from the caller
        unsafe { Self::new(traps, std::ptr::null(), Wrapper) }
    }
}

impl<B: ProxyHandler> TrapProxyHandler<B> {
    /// Handler over `traps` with `base` as the fallback
    ///
    /// # Safety
    /// Same as [`ForwardingProxyHandler::forwarding`].
    pub unsafe fn new(traps: ProxyTraps, extra: *const c_void, base: B) -> Self {
        debug!(present = traps.len(), "created trap proxy handler");
        Self { traps, extra, base }
    }

    /// The trap table
    pub fn traps(&self) -> &ProxyTraps {
        &self.traps
    }

    /// Opaque pointer handed over at creation
    pub fn extra(&self) -> *const c_void {
        self.extra
    }

    /// Fallback handler
    pub fn base(&self) -> &B {
        &self.base
    }
}

/// Map a trap's boolean onto the result channel
fn check(cx: &Context, trap: &'static str, ok: bool) -> JsResult<()> {
    if ok {
        return Ok(());
    }
    if !cx.is_exception_pending() {
        warn!(trap, "trap failed without a pending exception");
    }
    Err(Throw)
}

fn argv(args: &[Value]) -> (u32, *const Value) {
    if args.is_empty() {
        (0, std::ptr::null())
    } else {
        (args.len() as u32, args.as_ptr())
    }
}

// SAFETY (every `unsafe` block below): the slot was checked to be filled,
// and the constructor's contract makes filled slots callable. All pointer
// arguments point at locals that outlive the call.
impl<B: ProxyHandler> ProxyHandler for TrapProxyHandler<B> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_wrapper(&self) -> bool {
        self.base.is_wrapper()
    }

    fn get_own_property_descriptor(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        id: PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        let Some(trap) = self.traps.get_own_property_descriptor else {
            return self.base.get_own_property_descriptor(cx, proxy, id);
        };
        trace!(?proxy, ?id, "getOwnPropertyDescriptor trap");
        let mut out = FfiMaybe::<PropertyDescriptor>::none();
        let ok = unsafe { trap(cx, proxy, id, &mut out.value, &mut out.is_none) };
        check(cx, "getOwnPropertyDescriptor", ok)?;
        Ok(out.into_option())
    }

    fn define_property(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        id: PropertyKey,
        desc: &PropertyDescriptor,
    ) -> JsResult<ObjectOpResult> {
        let Some(trap) = self.traps.define_property else {
            return self.base.define_property(cx, proxy, id, desc);
        };
        trace!(?proxy, ?id, "defineProperty trap");
        let mut result = ObjectOpResult::ok();
        let ok = unsafe { trap(cx, proxy, id, desc, &mut result) };
        check(cx, "defineProperty", ok)?;
        Ok(result)
    }

    fn own_property_keys(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        props: &mut IdVector,
    ) -> JsResult<()> {
        let Some(trap) = self.traps.own_property_keys else {
            return self.base.own_property_keys(cx, proxy, props);
        };
        trace!(?proxy, "ownPropertyKeys trap");
        let ok = unsafe { trap(cx, proxy, props) };
        check(cx, "ownPropertyKeys", ok)
    }

    fn delete(&self, cx: &mut Context, proxy: ObjectId, id: PropertyKey) -> JsResult<ObjectOpResult> {
        let Some(trap) = self.traps.delete else {
            return self.base.delete(cx, proxy, id);
        };
        trace!(?proxy, ?id, "delete trap");
        let mut result = ObjectOpResult::ok();
        let ok = unsafe { trap(cx, proxy, id, &mut result) };
        check(cx, "delete", ok)?;
        Ok(result)
    }

    fn enumerate(&self, cx: &mut Context, proxy: ObjectId, props: &mut IdVector) -> JsResult<()> {
        let Some(trap) = self.traps.enumerate else {
            return self.base.enumerate(cx, proxy, props);
        };
        trace!(?proxy, "enumerate trap");
        let ok = unsafe { trap(cx, proxy, props) };
        check(cx, "enumerate", ok)
    }

    fn get_prototype_if_ordinary(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
    ) -> JsResult<OrdinaryPrototype> {
        let Some(trap) = self.traps.get_prototype_if_ordinary else {
            return self.base.get_prototype_if_ordinary(cx, proxy);
        };
        trace!(?proxy, "getPrototypeIfOrdinary trap");
        let mut is_ordinary = false;
        let mut proto = None;
        let ok = unsafe { trap(cx, proxy, &mut is_ordinary, &mut proto) };
        check(cx, "getPrototypeIfOrdinary", ok)?;
        Ok(if is_ordinary {
            OrdinaryPrototype::Ordinary(proto)
        } else {
            OrdinaryPrototype::NotOrdinary
        })
    }

    fn get_prototype(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<Option<ObjectId>> {
        let Some(trap) = self.traps.get_prototype else {
            return self.base.get_prototype(cx, proxy);
        };
        trace!(?proxy, "getPrototype trap");
        let mut proto = None;
        let ok = unsafe { trap(cx, proxy, &mut proto) };
        check(cx, "getPrototype", ok)?;
        Ok(proto)
    }

    fn set_prototype(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        proto: Option<ObjectId>,
    ) -> JsResult<ObjectOpResult> {
        let Some(trap) = self.traps.set_prototype else {
            return self.base.set_prototype(cx, proxy, proto);
        };
        trace!(?proxy, ?proto, "setPrototype trap");
        let mut result = ObjectOpResult::ok();
        let ok = unsafe { trap(cx, proxy, proto, &mut result) };
        check(cx, "setPrototype", ok)?;
        Ok(result)
    }

    fn set_immutable_prototype(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<bool> {
        let Some(trap) = self.traps.set_immutable_prototype else {
            return self.base.set_immutable_prototype(cx, proxy);
        };
        trace!(?proxy, "setImmutablePrototype trap");
        let mut succeeded = false;
        let ok = unsafe { trap(cx, proxy, &mut succeeded) };
        check(cx, "setImmutablePrototype", ok)?;
        Ok(succeeded)
    }

    fn prevent_extensions(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<ObjectOpResult> {
        let Some(trap) = self.traps.prevent_extensions else {
            return self.base.prevent_extensions(cx, proxy);
        };
        trace!(?proxy, "preventExtensions trap");
        let mut result = ObjectOpResult::ok();
        let ok = unsafe { trap(cx, proxy, &mut result) };
        check(cx, "preventExtensions", ok)?;
        Ok(result)
    }

    fn is_extensible(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<bool> {
        let Some(trap) = self.traps.is_extensible else {
            return self.base.is_extensible(cx, proxy);
        };
        trace!(?proxy, "isExtensible trap");
        let mut extensible = false;
        let ok = unsafe { trap(cx, proxy, &mut extensible) };
        check(cx, "isExtensible", ok)?;
        Ok(extensible)
    }

    fn has(&self, cx: &mut Context, proxy: ObjectId, id: PropertyKey) -> JsResult<bool> {
        let Some(trap) = self.traps.has else {
            return self.base.has(cx, proxy, id);
        };
        trace!(?proxy, ?id, "has trap");
        let mut bp = false;
        let ok = unsafe { trap(cx, proxy, id, &mut bp) };
        check(cx, "has", ok)?;
        Ok(bp)
    }

    fn get(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        receiver: Value,
        id: PropertyKey,
    ) -> JsResult<Value> {
        let Some(trap) = self.traps.get else {
            return self.base.get(cx, proxy, receiver, id);
        };
        trace!(?proxy, ?id, "get trap");
        let mut vp = Value::undefined();
        let ok = unsafe { trap(cx, proxy, receiver, id, &mut vp) };
        check(cx, "get", ok)?;
        Ok(vp)
    }

    fn set(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        id: PropertyKey,
        v: Value,
        receiver: Value,
    ) -> JsResult<ObjectOpResult> {
        let Some(trap) = self.traps.set else {
            return self.base.set(cx, proxy, id, v, receiver);
        };
        trace!(?proxy, ?id, "set trap");
        let mut result = ObjectOpResult::ok();
        let ok = unsafe { trap(cx, proxy, id, v, receiver, &mut result) };
        check(cx, "set", ok)?;
        Ok(result)
    }

    fn call(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        this: Value,
        args: &[Value],
    ) -> JsResult<Value> {
        let Some(trap) = self.traps.call else {
            return self.base.call(cx, proxy, this, args);
        };
        trace!(?proxy, argc = args.len(), "call trap");
        let (argc, argv) = argv(args);
        let mut rval = Value::undefined();
        let ok = unsafe { trap(cx, proxy, this, argc, argv, &mut rval) };
        check(cx, "call", ok)?;
        Ok(rval)
    }

    fn construct(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        args: &[Value],
        new_target: Value,
    ) -> JsResult<Value> {
        let Some(trap) = self.traps.construct else {
            return self.base.construct(cx, proxy, args, new_target);
        };
        trace!(?proxy, argc = args.len(), "construct trap");
        let (argc, argv) = argv(args);
        let mut rval = Value::undefined();
        let ok = unsafe { trap(cx, proxy, argc, argv, new_target, &mut rval) };
        check(cx, "construct", ok)?;
        Ok(rval)
    }

    fn has_own(&self, cx: &mut Context, proxy: ObjectId, id: PropertyKey) -> JsResult<bool> {
        let Some(trap) = self.traps.has_own else {
            return self.base.has_own(cx, proxy, id);
        };
        trace!(?proxy, ?id, "hasOwn trap");
        let mut bp = false;
        let ok = unsafe { trap(cx, proxy, id, &mut bp) };
        check(cx, "hasOwn", ok)?;
        Ok(bp)
    }

    fn get_own_enumerable_property_keys(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        props: &mut IdVector,
    ) -> JsResult<()> {
        let Some(trap) = self.traps.get_own_enumerable_property_keys else {
            return self.base.get_own_enumerable_property_keys(cx, proxy, props);
        };
        trace!(?proxy, "getOwnEnumerablePropertyKeys trap");
        let ok = unsafe { trap(cx, proxy, props) };
        check(cx, "getOwnEnumerablePropertyKeys", ok)
    }

    fn class_name(&self, cx: &mut Context, proxy: ObjectId) -> String {
        let Some(trap) = self.traps.class_name else {
            return self.base.class_name(cx, proxy);
        };
        trace!(?proxy, "className trap");
        let name = unsafe { trap(cx, proxy) };
        if name.is_null() {
            return String::new();
        }
        // SAFETY: a non-null class name is a NUL-terminated string that
        // stays valid until the next call into the trap table
        unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned()
    }

    fn fun_to_string(
        &self,
        cx: &mut Context,
        proxy: ObjectId,
        is_to_string: bool,
    ) -> JsResult<Value> {
        let Some(trap) = self.traps.fun_to_string else {
            return self.base.fun_to_string(cx, proxy, is_to_string);
        };
        trace!(?proxy, is_to_string, "fun_toString trap");
        let mut rval = Value::undefined();
        let ok = unsafe { trap(cx, proxy, is_to_string, &mut rval) };
        check(cx, "fun_toString", ok)?;
        Ok(rval)
    }

    fn boxed_value_unbox(&self, cx: &mut Context, proxy: ObjectId) -> JsResult<Value> {
        let Some(trap) = self.traps.boxed_value_unbox else {
            return self.base.boxed_value_unbox(cx, proxy);
        };
        trace!(?proxy, "boxedValue_unbox trap");
        let mut vp = Value::undefined();
        let ok = unsafe { trap(cx, proxy, &mut vp) };
        check(cx, "boxedValue_unbox", ok)?;
        Ok(vp)
    }

    fn trace(&self, trc: &mut Tracer, proxy: ObjectId) {
        match self.traps.trace {
            Some(trap) => unsafe { trap(trc, proxy) },
            None => self.base.trace(trc, proxy),
        }
    }

    fn finalize(&self, cx: &mut Context, proxy: ObjectId) {
        match self.traps.finalize {
            Some(trap) => {
                trace!(?proxy, "finalize trap");
                unsafe { trap(cx, proxy) }
            }
            None => self.base.finalize(cx, proxy),
        }
    }

    fn is_callable(&self, cx: &mut Context, proxy: ObjectId) -> bool {
        match self.traps.is_callable {
            Some(trap) => unsafe { trap(cx, proxy) },
            None => self.base.is_callable(cx, proxy),
        }
    }

    fn is_constructor(&self, cx: &mut Context, proxy: ObjectId) -> bool {
        match self.traps.is_constructor {
            Some(trap) => unsafe { trap(cx, proxy) },
            None => self.base.is_constructor(cx, proxy),
        }
    }
}
