//! Foreign trap table layout
//!
//! Every slot is independently nullable. A null slot defers to the
//! adapter's base handler, see [`TrapProxyHandler`](crate::TrapProxyHandler).
//!
//! All traps returning `bool` follow one convention: `true` means success
//! and the out-parameters are filled, `false` means failure and the
//! context may hold a pending exception.

use std::ffi::c_char;

use jsproxy_host::{
    Context, IdVector, ObjectId, ObjectOpResult, PropertyDescriptor, PropertyKey, Tracer, Value,
};

/// `[[GetOwnProperty]]`. Sets `*is_none` to `false` and fills `*desc`
/// when the property exists.
pub type GetOwnPropertyDescriptorTrap = unsafe extern "C" fn(
    cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    desc: *mut PropertyDescriptor,
    is_none: *mut bool,
) -> bool;

/// `[[DefineOwnProperty]]`
pub type DefinePropertyTrap = unsafe extern "C" fn(
    cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    desc: *const PropertyDescriptor,
    result: *mut ObjectOpResult,
) -> bool;

/// Key-listing traps (`ownPropertyKeys`, `enumerate`,
/// `getOwnEnumerablePropertyKeys`). Keys are appended to `props`.
pub type KeysTrap =
    unsafe extern "C" fn(cx: *mut Context, proxy: ObjectId, props: *mut IdVector) -> bool;

/// `[[Delete]]`
pub type DeleteTrap = unsafe extern "C" fn(
    cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    result: *mut ObjectOpResult,
) -> bool;

/// Side-effect-free prototype lookup. `*protop` is only read when
/// `*is_ordinary` is set.
pub type GetPrototypeIfOrdinaryTrap = unsafe extern "C" fn(
    cx: *mut Context,
    proxy: ObjectId,
    is_ordinary: *mut bool,
    protop: *mut Option<ObjectId>,
) -> bool;

/// `[[GetPrototypeOf]]`
pub type GetPrototypeTrap =
    unsafe extern "C" fn(cx: *mut Context, proxy: ObjectId, protop: *mut Option<ObjectId>) -> bool;

/// `[[SetPrototypeOf]]`
pub type SetPrototypeTrap = unsafe extern "C" fn(
    cx: *mut Context,
    proxy: ObjectId,
    proto: Option<ObjectId>,
    result: *mut ObjectOpResult,
) -> bool;

/// Traps answering a single boolean (`setImmutablePrototype`,
/// `isExtensible`)
pub type BoolOutTrap =
    unsafe extern "C" fn(cx: *mut Context, proxy: ObjectId, out: *mut bool) -> bool;

/// `[[PreventExtensions]]`
pub type PreventExtensionsTrap =
    unsafe extern "C" fn(cx: *mut Context, proxy: ObjectId, result: *mut ObjectOpResult) -> bool;

/// Key queries answering a boolean (`has`, `hasOwn`)
pub type HasTrap =
    unsafe extern "C" fn(cx: *mut Context, proxy: ObjectId, id: PropertyKey, bp: *mut bool) -> bool;

/// `[[Get]]`
pub type GetTrap = unsafe extern "C" fn(
    cx: *mut Context,
    proxy: ObjectId,
    receiver: Value,
    id: PropertyKey,
    vp: *mut Value,
) -> bool;

/// `[[Set]]`
pub type SetTrap = unsafe extern "C" fn(
    cx: *mut Context,
    proxy: ObjectId,
    id: PropertyKey,
    v: Value,
    receiver: Value,
    result: *mut ObjectOpResult,
) -> bool;

/// `[[Call]]`. `argv` points at `argc` values and is null when `argc` is 0.
pub type CallTrap = unsafe extern "C" fn(
    cx: *mut Context,
    proxy: ObjectId,
    this: Value,
    argc: u32,
    argv: *const Value,
    rval: *mut Value,
) -> bool;

/// `[[Construct]]`. `argv` points at `argc` values and is null when `argc` is 0.
pub type ConstructTrap = unsafe extern "C" fn(
    cx: *mut Context,
    proxy: ObjectId,
    argc: u32,
    argv: *const Value,
    new_target: Value,
    rval: *mut Value,
) -> bool;

/// Class name. The returned string must stay valid until the next call
/// into the trap table; null is read as the empty string.
pub type ClassNameTrap = unsafe extern "C" fn(cx: *mut Context, proxy: ObjectId) -> *const c_char;

/// `Function.prototype.toString`
pub type FunToStringTrap = unsafe extern "C" fn(
    cx: *mut Context,
    proxy: ObjectId,
    is_to_string: bool,
    rval: *mut Value,
) -> bool;

/// Primitive held by a boxed object
pub type BoxedValueUnboxTrap =
    unsafe extern "C" fn(cx: *mut Context, proxy: ObjectId, vp: *mut Value) -> bool;

/// Report edges owned by the trap implementation
pub type TraceTrap = unsafe extern "C" fn(trc: *mut Tracer, proxy: ObjectId);

/// Called once before the proxy is freed
pub type FinalizeTrap = unsafe extern "C" fn(cx: *mut Context, proxy: ObjectId);

/// Capability checks (`isCallable`, `isConstructor`)
pub type CapabilityTrap = unsafe extern "C" fn(cx: *mut Context, proxy: ObjectId) -> bool;

/// Proxy trap table.
///
/// Filled by foreign code and copied into the handler that uses it; later
/// changes to the caller's copy are not observed.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct ProxyTraps {
    /// `[[GetOwnProperty]]`
    pub get_own_property_descriptor: Option<GetOwnPropertyDescriptorTrap>,
    /// `[[DefineOwnProperty]]`
    pub define_property: Option<DefinePropertyTrap>,
    /// `[[OwnPropertyKeys]]`
    pub own_property_keys: Option<KeysTrap>,
    /// `[[Delete]]`
    pub delete: Option<DeleteTrap>,
    /// `for-in` keys
    pub enumerate: Option<KeysTrap>,
    /// Side-effect-free prototype lookup
    pub get_prototype_if_ordinary: Option<GetPrototypeIfOrdinaryTrap>,
    /// `[[GetPrototypeOf]]`
    pub get_prototype: Option<GetPrototypeTrap>,
    /// `[[SetPrototypeOf]]`
    pub set_prototype: Option<SetPrototypeTrap>,
    /// Make the prototype immutable
    pub set_immutable_prototype: Option<BoolOutTrap>,
    /// `[[PreventExtensions]]`
    pub prevent_extensions: Option<PreventExtensionsTrap>,
    /// `[[IsExtensible]]`
    pub is_extensible: Option<BoolOutTrap>,
    /// `[[HasProperty]]`
    pub has: Option<HasTrap>,
    /// `[[Get]]`
    pub get: Option<GetTrap>,
    /// `[[Set]]`
    pub set: Option<SetTrap>,
    /// `[[Call]]`
    pub call: Option<CallTrap>,
    /// `[[Construct]]`
    pub construct: Option<ConstructTrap>,
    /// Own-property existence
    pub has_own: Option<HasTrap>,
    /// Own enumerable keys
    pub get_own_enumerable_property_keys: Option<KeysTrap>,
    /// Class name
    pub class_name: Option<ClassNameTrap>,
    /// `Function.prototype.toString`
    pub fun_to_string: Option<FunToStringTrap>,
    /// Boxed primitive
    pub boxed_value_unbox: Option<BoxedValueUnboxTrap>,
    /// GC tracing
    pub trace: Option<TraceTrap>,
    /// Finalization
    pub finalize: Option<FinalizeTrap>,
    /// `[[Call]]` support
    pub is_callable: Option<CapabilityTrap>,
    /// `[[Construct]]` support
    pub is_constructor: Option<CapabilityTrap>,
}

impl ProxyTraps {
    /// Table with every slot null
    pub const fn empty() -> Self {
        Self {
            get_own_property_descriptor: None,
            define_property: None,
            own_property_keys: None,
            delete: None,
            enumerate: None,
            get_prototype_if_ordinary: None,
            get_prototype: None,
            set_prototype: None,
            set_immutable_prototype: None,
            prevent_extensions: None,
            is_extensible: None,
            has: None,
            get: None,
            set: None,
            call: None,
            construct: None,
            has_own: None,
            get_own_enumerable_property_keys: None,
            class_name: None,
            fun_to_string: None,
            boxed_value_unbox: None,
            trace: None,
            finalize: None,
            is_callable: None,
            is_constructor: None,
        }
    }

    /// Number of non-null slots
    pub fn len(&self) -> usize {
        [
            self.get_own_property_descriptor.is_some(),
            self.define_property.is_some(),
            self.own_property_keys.is_some(),
            self.delete.is_some(),
            self.enumerate.is_some(),
            self.get_prototype_if_ordinary.is_some(),
            self.get_prototype.is_some(),
            self.set_prototype.is_some(),
            self.set_immutable_prototype.is_some(),
            self.prevent_extensions.is_some(),
            self.is_extensible.is_some(),
            self.has.is_some(),
            self.get.is_some(),
            self.set.is_some(),
            self.call.is_some(),
            self.construct.is_some(),
            self.has_own.is_some(),
            self.get_own_enumerable_property_keys.is_some(),
            self.class_name.is_some(),
            self.fun_to_string.is_some(),
            self.boxed_value_unbox.is_some(),
            self.trace.is_some(),
            self.finalize.is_some(),
            self.is_callable.is_some(),
            self.is_constructor.is_some(),
        ]
        .into_iter()
        .filter(|&present| present)
        .count()
    }

    /// Every slot is null
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ProxyTraps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyTraps")
            .field("present", &self.len())
            .finish_non_exhaustive()
    }
}
