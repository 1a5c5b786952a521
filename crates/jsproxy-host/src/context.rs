//! Execution context
//!
//! A [`Context`] owns every object, atom and symbol it hands out, plus the
//! pending exception. It is `!Send` and `!Sync`: handlers are shared through
//! `Rc` and all dispatch happens on the thread that created the context.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::smallvec;
use tracing::{debug, error};

use crate::atom::{Atom, AtomTable, SymbolId};
use crate::config::ContextOptions;
use crate::descriptor::{PropertyAttributes, PropertyDescriptor};
use crate::error::{ErrorKind, JsError, JsResult, Throw};
use crate::handler::{OrdinaryPrototype, ProxyHandler};
use crate::id::{PropertyKey, parse_index};
use crate::job_queue::JobQueue;
use crate::object::{
    Heap, NativeFn, ObjectCell, ObjectId, ObjectKind, Property, ProxyData, ProxyOptions,
};
use crate::op_result::{FailureCode, ObjectOpResult};
use crate::principals::Principals;
use crate::value::Value;

/// An engine instance: heap, atoms, pending exception and callbacks
pub struct Context {
    pub(crate) options: ContextOptions,
    pub(crate) heap: Heap,
    atoms: AtomTable,
    symbols: Vec<Option<Atom>>,
    pending_exception: Option<Value>,
    pub(crate) roots: FxHashMap<ObjectId, u32>,
    pub(crate) gc: crate::gc::GcStats,
    depth: u32,
    object_prototype: ObjectId,
    function_prototype: ObjectId,
    global: ObjectId,
    job_queue: Option<Rc<dyn JobQueue>>,
    principals: Option<Rc<dyn Principals>>,
}

impl Context {
    /// Create a context with default options
    pub fn new() -> Self {
        Self::with_options(ContextOptions::default())
    }

    /// Create a context
    pub fn with_options(options: ContextOptions) -> Self {
        let mut heap = Heap::with_capacity(options.initial_heap_capacity);
        let object_prototype = heap.alloc(ObjectCell::new(ObjectKind::Ordinary, None));
        let function_prototype =
            heap.alloc(ObjectCell::new(ObjectKind::Ordinary, Some(object_prototype)));
        let global = heap.alloc(ObjectCell::new(ObjectKind::Ordinary, Some(object_prototype)));
        if let Some(cell) = heap.get_mut(global) {
            cell.class_name = "global";
        }
        heap.allocated_since_gc = 0;
        debug!(
            max_dispatch_depth = options.max_dispatch_depth,
            "created context"
        );
        Self {
            options,
            heap,
            atoms: AtomTable::new(),
            symbols: Vec::new(),
            pending_exception: None,
            roots: FxHashMap::default(),
            gc: Default::default(),
            depth: 0,
            object_prototype,
            function_prototype,
            global,
            job_queue: None,
            principals: None,
        }
    }

    /// Options this context was created with
    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    /// The global object
    pub fn global(&self) -> ObjectId {
        self.global
    }

    /// `Object.prototype`
    pub fn object_prototype(&self) -> ObjectId {
        self.object_prototype
    }

    /// `Function.prototype`
    pub fn function_prototype(&self) -> ObjectId {
        self.function_prototype
    }

    // ------------------------------------------------------------------
    // Atoms, symbols and keys
    // ------------------------------------------------------------------

    /// Intern a string
    pub fn atomize(&mut self, s: &str) -> Atom {
        self.atoms.intern(s)
    }

    /// Contents of an atom; empty for atoms from another context
    pub fn atom_str(&self, atom: Atom) -> &str {
        self.atoms.get(atom).unwrap_or("")
    }

    /// String value
    pub fn new_string(&mut self, s: &str) -> Value {
        Value::string(self.atomize(s))
    }

    /// Property key for `name`, using the index form for canonical indices
    pub fn key(&mut self, name: &str) -> PropertyKey {
        match parse_index(name) {
            Some(i) => PropertyKey::index(i),
            None => PropertyKey::atom(self.atomize(name)),
        }
    }

    /// Create a fresh symbol
    pub fn new_symbol(&mut self, description: Option<&str>) -> SymbolId {
        let description = description.map(|d| self.atomize(d));
        let sym = SymbolId::from_index(self.symbols.len() as u32);
        self.symbols.push(description);
        sym
    }

    /// Human-readable key, used in error messages
    pub fn key_to_string(&self, id: PropertyKey) -> String {
        if let Some(i) = id.as_int() {
            i.to_string()
        } else if let Some(atom) = id.as_atom() {
            self.atom_str(atom).to_string()
        } else if let Some(sym) = id.as_symbol() {
            let description = self
                .symbols
                .get(sym.index() as usize)
                .copied()
                .flatten()
                .map(|atom| self.atom_str(atom))
                .unwrap_or("");
            format!("Symbol({description})")
        } else {
            "<void>".to_string()
        }
    }

    /// Human-readable value, used in error messages
    pub fn value_to_string(&self, v: Value) -> String {
        if let Some(atom) = v.as_string() {
            self.atom_str(atom).to_string()
        } else if let Some(sym) = v.as_symbol() {
            self.key_to_string(PropertyKey::symbol(sym))
        } else if let Some(obj) = v.as_object() {
            let class = self.heap.get(obj).map_or("dead", |cell| cell.class_name);
            format!("[object {class}]")
        } else if let Some(n) = v.as_int32() {
            n.to_string()
        } else if let Some(n) = v.as_number() {
            n.to_string()
        } else {
            format!("{v:?}")
        }
    }

    /// Value of a key as seen by script (`"0"` for index 0)
    pub fn key_to_value(&mut self, id: PropertyKey) -> Value {
        if let Some(atom) = id.as_atom() {
            Value::string(atom)
        } else if let Some(sym) = id.as_symbol() {
            Value::symbol(sym)
        } else if let Some(i) = id.as_int() {
            self.new_string(&i.to_string())
        } else {
            Value::undefined()
        }
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    fn alloc(&mut self, cell: ObjectCell) -> ObjectId {
        self.heap.alloc(cell)
    }

    /// Plain object inheriting from `Object.prototype`
    pub fn new_object(&mut self) -> ObjectId {
        self.new_object_with_proto(Some(self.object_prototype))
    }

    /// Plain object with an explicit prototype
    pub fn new_object_with_proto(&mut self, proto: Option<ObjectId>) -> ObjectId {
        self.alloc(ObjectCell::new(ObjectKind::Ordinary, proto))
    }

    /// Host function; not a constructor
    pub fn new_function<F>(&mut self, name: &str, f: F) -> ObjectId
    where
        F: Fn(&mut Context, Value, &[Value]) -> JsResult<Value> + 'static,
    {
        self.new_native(name, Rc::new(f), false)
    }

    /// Host function usable with `new`. A fresh `prototype` object is
    /// created and installed on the function.
    pub fn new_constructor<F>(&mut self, name: &str, f: F) -> ObjectId
    where
        F: Fn(&mut Context, Value, &[Value]) -> JsResult<Value> + 'static,
    {
        let ctor = self.new_native(name, Rc::new(f), true);
        let proto = self.new_object();
        let key = self.key("prototype");
        self.ordinary_define_own_property(
            ctor,
            key,
            &PropertyDescriptor::data_with_attrs(
                Value::object(proto),
                PropertyAttributes {
                    writable: true,
                    enumerable: false,
                    configurable: false,
                },
            ),
        );
        ctor
    }

    fn new_native(&mut self, name: &str, call: NativeFn, constructor: bool) -> ObjectId {
        let name = self.atomize(name);
        self.alloc(ObjectCell::new(
            ObjectKind::Function {
                call,
                name,
                constructor,
            },
            Some(self.function_prototype),
        ))
    }

    /// Primitive wrapper object
    pub fn new_boxed(&mut self, value: Value) -> ObjectId {
        self.alloc(ObjectCell::new(
            ObjectKind::Boxed(value),
            Some(self.object_prototype),
        ))
    }

    /// Proxy object dispatching to `handler`.
    ///
    /// `private` is the wrapped target for [`Wrapper`](crate::Wrapper)
    /// handlers and free-form data otherwise.
    pub fn new_proxy(
        &mut self,
        handler: Rc<dyn ProxyHandler>,
        private: Value,
        proto: Option<ObjectId>,
        options: ProxyOptions,
    ) -> ObjectId {
        let data = ProxyData {
            handler,
            private,
            reserved: smallvec![Value::undefined(); options.reserved_slots],
            lazy_proto: options.lazy_proto,
            callable: options.callable,
        };
        let proxy = self.alloc(ObjectCell::new(ObjectKind::Proxy(data), proto));
        debug!(?proxy, lazy_proto = options.lazy_proto, "created proxy");
        proxy
    }

    // ------------------------------------------------------------------
    // Proxy slots
    // ------------------------------------------------------------------

    /// Whether `obj` is a live proxy
    pub fn is_proxy(&self, obj: ObjectId) -> bool {
        self.heap.get(obj).is_some_and(|cell| cell.proxy().is_some())
    }

    /// Handler of a proxy
    pub fn proxy_handler(&self, obj: ObjectId) -> Option<Rc<dyn ProxyHandler>> {
        self.heap
            .get(obj)
            .and_then(ObjectCell::proxy)
            .map(|data| data.handler.clone())
    }

    /// Private slot of a proxy
    pub fn proxy_private(&self, obj: ObjectId) -> Option<Value> {
        self.heap
            .get(obj)
            .and_then(ObjectCell::proxy)
            .map(|data| data.private)
    }

    /// Overwrite the private slot; `false` if `obj` is not a proxy
    pub fn set_proxy_private(&mut self, obj: ObjectId, value: Value) -> bool {
        match self.heap.get_mut(obj).and_then(ObjectCell::proxy_mut) {
            Some(data) => {
                data.private = value;
                true
            }
            None => false,
        }
    }

    /// Object held in the private slot
    pub fn proxy_target(&self, obj: ObjectId) -> Option<ObjectId> {
        self.proxy_private(obj).and_then(Value::as_object)
    }

    /// Reserved slot of a proxy
    pub fn proxy_reserved_slot(&self, obj: ObjectId, slot: usize) -> Option<Value> {
        self.heap
            .get(obj)
            .and_then(ObjectCell::proxy)
            .and_then(|data| data.reserved.get(slot).copied())
    }

    /// Overwrite a reserved slot; `false` if out of range or not a proxy
    pub fn set_proxy_reserved_slot(&mut self, obj: ObjectId, slot: usize, value: Value) -> bool {
        match self
            .heap
            .get_mut(obj)
            .and_then(ObjectCell::proxy_mut)
            .and_then(|data| data.reserved.get_mut(slot))
        {
            Some(stored) => {
                *stored = value;
                true
            }
            None => false,
        }
    }

    /// Strip wrapper proxies until a non-wrapper is reached
    pub fn unwrap_object(&self, mut obj: ObjectId) -> ObjectId {
        let mut remaining = self.options.max_dispatch_depth;
        while remaining > 0 {
            let Some(handler) = self.proxy_handler(obj) else {
                break;
            };
            if !handler.is_wrapper() {
                break;
            }
            match self.proxy_target(obj) {
                Some(target) => obj = target,
                None => break,
            }
            remaining -= 1;
        }
        obj
    }

    // ------------------------------------------------------------------
    // State stored on the object itself, read by the base handler
    // ------------------------------------------------------------------

    /// Prototype stored on the object
    pub fn stored_prototype(&self, obj: ObjectId) -> Option<ObjectId> {
        self.heap.get(obj).and_then(|cell| cell.prototype)
    }

    /// Stored prototype, or `NotOrdinary` for lazy-prototype proxies
    pub fn stored_proxy_prototype(&self, obj: ObjectId) -> OrdinaryPrototype {
        match self.heap.get(obj) {
            Some(cell) if cell.proxy().is_some_and(|data| data.lazy_proto) => {
                OrdinaryPrototype::NotOrdinary
            }
            Some(cell) => OrdinaryPrototype::Ordinary(cell.prototype),
            None => OrdinaryPrototype::Ordinary(None),
        }
    }

    /// Replace the stored prototype, honoring the immutable-prototype flag,
    /// extensibility, and cycles through ordinary objects
    pub fn store_prototype(&mut self, obj: ObjectId, proto: Option<ObjectId>) -> ObjectOpResult {
        let Some(cell) = self.heap.get(obj) else {
            return ObjectOpResult::failed(FailureCode::CantSetProto);
        };
        if cell.prototype == proto {
            return ObjectOpResult::ok();
        }
        if cell.immutable_prototype || !cell.extensible {
            return ObjectOpResult::failed(FailureCode::CantSetProto);
        }
        let mut p = proto;
        while let Some(current) = p {
            if current == obj {
                return ObjectOpResult::failed(FailureCode::CantSetProto);
            }
            match self.heap.get(current) {
                Some(cell) if cell.proxy().is_none() => p = cell.prototype,
                _ => break,
            }
        }
        if let Some(cell) = self.heap.get_mut(obj) {
            cell.prototype = proto;
        }
        ObjectOpResult::ok()
    }

    /// Extensibility flag stored on the object
    pub fn stored_extensible(&self, obj: ObjectId) -> bool {
        self.heap.get(obj).is_some_and(|cell| cell.extensible)
    }

    /// Overwrite the stored extensibility flag
    pub fn store_extensible(&mut self, obj: ObjectId, extensible: bool) {
        if let Some(cell) = self.heap.get_mut(obj) {
            cell.extensible = extensible;
        }
    }

    /// Whether the proxy was created with a callable class
    pub fn stored_callable(&self, obj: ObjectId) -> bool {
        self.heap
            .get(obj)
            .and_then(ObjectCell::proxy)
            .is_some_and(|data| data.callable)
    }

    // ------------------------------------------------------------------
    // Pending exception
    // ------------------------------------------------------------------

    /// Set `value` as the pending exception
    pub fn throw(&mut self, value: Value) -> Throw {
        self.pending_exception = Some(value);
        Throw
    }

    /// Create an error object and set it as the pending exception.
    ///
    /// Only `name` is stored as a property. The message lives on the object
    /// itself, see [`Context::error_message`].
    pub fn report_error(&mut self, kind: ErrorKind, message: impl Into<String>) -> Throw {
        let error = self.alloc(ObjectCell::new(
            ObjectKind::Error {
                kind,
                message: message.into().into_boxed_str(),
            },
            Some(self.object_prototype),
        ));
        let name_key = self.key("name");
        let name_value = self.new_string(kind.name());
        self.ordinary_define_own_property(
            error,
            name_key,
            &PropertyDescriptor::data_with_attrs(name_value, PropertyAttributes::hidden()),
        );
        self.throw(Value::object(error))
    }

    /// Message of an error created by [`Context::report_error`]
    pub fn error_message(&self, obj: ObjectId) -> Option<&str> {
        match &self.heap.get(obj)?.kind {
            ObjectKind::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Kind of an error created by [`Context::report_error`]
    pub fn error_kind(&self, obj: ObjectId) -> Option<ErrorKind> {
        match &self.heap.get(obj)?.kind {
            ObjectKind::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Number of interned strings
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Whether an exception is pending
    pub fn is_exception_pending(&self) -> bool {
        self.pending_exception.is_some()
    }

    /// Pending exception, left in place
    pub fn pending_exception(&self) -> Option<Value> {
        self.pending_exception
    }

    /// Pending exception, cleared
    pub fn take_pending_exception(&mut self) -> Option<Value> {
        self.pending_exception.take()
    }

    /// Drop the pending exception
    pub fn clear_pending_exception(&mut self) {
        self.pending_exception = None;
    }

    /// Leave the engine: turn a failure into a [`JsError`], consuming the
    /// pending exception. A failure without one is uncatchable.
    pub fn finish<T>(&mut self, result: JsResult<T>) -> Result<T, JsError> {
        match result {
            Ok(value) => Ok(value),
            Err(Throw) => match self.take_pending_exception() {
                Some(value) => Err(JsError::Exception {
                    message: self.describe_exception(value),
                    value,
                }),
                None => {
                    error!("operation failed without a pending exception");
                    Err(JsError::Uncatchable)
                }
            },
        }
    }

    fn describe_exception(&self, value: Value) -> String {
        let Some(obj) = value.as_object() else {
            return self.value_to_string(value);
        };
        if let (Some(kind), Some(message)) = (self.error_kind(obj), self.error_message(obj)) {
            return format!("{}: {message}", kind.name());
        }
        let read = |name: &str| {
            let atom = self.atoms.find(name)?;
            match self.heap.get(obj)?.properties.get(&PropertyKey::atom(atom))? {
                Property::Data { value, .. } => value.as_string(),
                Property::Accessor { .. } => None,
            }
        };
        match (read("name"), read("message")) {
            (Some(name), Some(message)) => {
                format!("{}: {}", self.atom_str(name), self.atom_str(message))
            }
            (None, Some(message)) => self.atom_str(message).to_string(),
            _ => self.value_to_string(value),
        }
    }

    // ------------------------------------------------------------------
    // Dispatch depth
    // ------------------------------------------------------------------

    pub(crate) fn enter_dispatch(&mut self) -> JsResult<()> {
        if self.depth >= self.options.max_dispatch_depth {
            return Err(self.report_error(ErrorKind::InternalError, "too much recursion"));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit_dispatch(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn dispatch_available(&self) -> bool {
        self.depth < self.options.max_dispatch_depth
    }

    /// Current proxy dispatch nesting
    pub fn dispatch_depth(&self) -> u32 {
        self.depth
    }

    // ------------------------------------------------------------------
    // Job queue and principals
    // ------------------------------------------------------------------

    /// Install the queue that receives promise jobs
    pub fn set_job_queue(&mut self, queue: Rc<dyn JobQueue>) {
        self.job_queue = Some(queue);
    }

    /// Installed job queue
    pub fn job_queue(&self) -> Option<Rc<dyn JobQueue>> {
        self.job_queue.clone()
    }

    /// Hand a promise reaction job to the installed queue
    pub fn enqueue_promise_job(
        &mut self,
        promise: Option<ObjectId>,
        job: ObjectId,
        allocation_site: Option<ObjectId>,
    ) -> JsResult<()> {
        let Some(queue) = self.job_queue.clone() else {
            return Err(self.report_error(ErrorKind::InternalError, "no job queue installed"));
        };
        let incumbent = queue.incumbent_global(self);
        queue.enqueue_promise_job(self, promise, job, allocation_site, incumbent)
    }

    /// Whether the installed queue holds jobs
    pub fn has_pending_jobs(&self) -> bool {
        self.job_queue.as_ref().is_some_and(|queue| !queue.is_empty())
    }

    /// Install the principals of this context
    pub fn set_principals(&mut self, principals: Option<Rc<dyn Principals>>) {
        self.principals = principals;
    }

    /// Installed principals
    pub fn principals(&self) -> Option<Rc<dyn Principals>> {
        self.principals.clone()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        let proxies: Vec<ObjectId> = self
            .heap
            .ids()
            .into_iter()
            .filter(|&obj| self.is_proxy(obj))
            .collect();
        for proxy in proxies {
            if let Some(handler) = self.proxy_handler(proxy) {
                handler.finalize(self, proxy);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_canonicalize_indices() {
        let mut cx = Context::new();
        assert_eq!(cx.key("3"), PropertyKey::index(3));
        assert!(cx.key("03").is_atom());
        let k = cx.key("x");
        assert_eq!(cx.key_to_string(k), "x");
        let sym = cx.new_symbol(Some("tag"));
        assert_eq!(cx.key_to_string(PropertyKey::symbol(sym)), "Symbol(tag)");
    }

    #[test]
    fn test_report_error_sets_pending() {
        let mut cx = Context::new();
        let throw = cx.report_error(ErrorKind::TypeError, "bad thing");
        assert_eq!(throw, Throw);
        assert!(cx.is_exception_pending());
        let err = cx.finish::<()>(Err(throw)).unwrap_err();
        assert_eq!(err.to_string(), "Uncaught exception: TypeError: bad thing");
        assert!(!cx.is_exception_pending());
    }

    #[test]
    fn test_error_message_is_not_interned() {
        let mut cx = Context::new();
        let throw = cx.report_error(ErrorKind::RangeError, "first");
        cx.finish::<()>(Err(throw)).unwrap_err();
        let atoms = cx.atom_count();

        let throw = cx.report_error(ErrorKind::RangeError, "index 7 out of range");
        let err = cx.pending_exception().and_then(|v| v.as_object()).unwrap();
        assert_eq!(cx.error_message(err), Some("index 7 out of range"));
        assert_eq!(cx.error_kind(err), Some(ErrorKind::RangeError));
        assert_eq!(cx.class_name(err), "Error");
        assert_eq!(cx.atom_count(), atoms);
        assert!(cx.atoms.find("index 7 out of range").is_none());

        let err = cx.finish::<()>(Err(throw)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Uncaught exception: RangeError: index 7 out of range"
        );
    }

    #[test]
    fn test_failure_without_exception_is_uncatchable() {
        let mut cx = Context::new();
        let err = cx.finish::<()>(Err(Throw)).unwrap_err();
        assert!(matches!(err, JsError::Uncatchable));
    }

    #[test]
    fn test_store_prototype_rejects_cycles() {
        let mut cx = Context::new();
        let a = cx.new_object();
        let b = cx.new_object_with_proto(Some(a));
        assert_eq!(
            cx.store_prototype(a, Some(b)).failure_code(),
            Some(FailureCode::CantSetProto)
        );
        assert!(cx.store_prototype(a, None).is_ok());
        assert_eq!(cx.stored_prototype(a), None);
    }

    #[test]
    fn test_dispatch_depth_limit() {
        let mut cx = Context::with_options(ContextOptions::new().max_dispatch_depth(1));
        assert!(cx.enter_dispatch().is_ok());
        assert!(cx.enter_dispatch().is_err());
        assert!(cx.is_exception_pending());
        cx.exit_dispatch();
        assert_eq!(cx.dispatch_depth(), 0);
    }
}
