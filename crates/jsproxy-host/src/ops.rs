//! Fundamental object operations
//!
//! Every operation dispatches to the handler for proxy objects and runs the
//! ordinary algorithm otherwise. Handler dispatch is depth-limited by
//! [`ContextOptions::max_dispatch_depth`](crate::ContextOptions).

use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::context::Context;
use crate::descriptor::{PropertyAttributes, PropertyDescriptor};
use crate::error::{ErrorKind, JsResult, Throw};
use crate::handler::{NATIVE_CODE_SOURCE, OrdinaryPrototype, ProxyHandler};
use crate::id::{IdVector, PropertyKey};
use crate::object::{ObjectId, ObjectKind, Property};
use crate::op_result::{FailureCode, ObjectOpResult};
use crate::value::Value;

enum Dispatch {
    Dead,
    Ordinary,
    Proxy(Rc<dyn ProxyHandler>),
}

/// SameValue, with int32 and double encodings of one number comparing equal
pub fn same_value(a: Value, b: Value) -> bool {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) if x.is_nan() && y.is_nan() => true,
        (Some(x), Some(y)) => x == y && x.is_sign_negative() == y.is_sign_negative(),
        _ => a == b,
    }
}

/// ValidateAndApplyPropertyDescriptor against an existing property
fn apply_descriptor(current: &Property, desc: &PropertyDescriptor) -> Result<Property, FailureCode> {
    let attrs = current.attrs();
    if !attrs.configurable {
        if desc.has_configurable && desc.configurable {
            return Err(FailureCode::CantRedefineProperty);
        }
        if desc.has_enumerable && desc.enumerable != attrs.enumerable {
            return Err(FailureCode::CantRedefineProperty);
        }
        if !desc.is_generic() && desc.is_accessor() != current.is_accessor() {
            return Err(FailureCode::CantRedefineProperty);
        }
        match *current {
            Property::Accessor { getter, setter, .. } => {
                if (desc.has_getter && desc.getter != getter)
                    || (desc.has_setter && desc.setter != setter)
                {
                    return Err(FailureCode::CantRedefineProperty);
                }
            }
            Property::Data { value, attrs } if !attrs.writable => {
                if desc.has_writable && desc.writable {
                    return Err(FailureCode::CantRedefineProperty);
                }
                if desc.has_value && !same_value(desc.value, value) {
                    return Err(FailureCode::ReadOnly);
                }
            }
            Property::Data { .. } => {}
        }
    }

    let configurable = if desc.has_configurable {
        desc.configurable
    } else {
        attrs.configurable
    };
    let enumerable = if desc.has_enumerable {
        desc.enumerable
    } else {
        attrs.enumerable
    };

    let to_accessor = desc.is_accessor() || (desc.is_generic() && current.is_accessor());
    if to_accessor {
        let (mut getter, mut setter) = match *current {
            Property::Accessor { getter, setter, .. } => (getter, setter),
            Property::Data { .. } => (None, None),
        };
        if desc.has_getter {
            getter = desc.getter;
        }
        if desc.has_setter {
            setter = desc.setter;
        }
        Ok(Property::Accessor {
            getter,
            setter,
            attrs: PropertyAttributes {
                writable: false,
                enumerable,
                configurable,
            },
        })
    } else {
        let (mut value, mut writable) = match *current {
            Property::Data { value, attrs } => (value, attrs.writable),
            Property::Accessor { .. } => (Value::undefined(), false),
        };
        if desc.has_value {
            value = desc.value;
        }
        if desc.has_writable {
            writable = desc.writable;
        }
        Ok(Property::Data {
            value,
            attrs: PropertyAttributes {
                writable,
                enumerable,
                configurable,
            },
        })
    }
}

impl Context {
    fn dispatch(&self, obj: ObjectId) -> Dispatch {
        match self.heap.get(obj) {
            None => Dispatch::Dead,
            Some(cell) => match cell.proxy() {
                Some(data) => Dispatch::Proxy(data.handler.clone()),
                None => Dispatch::Ordinary,
            },
        }
    }

    fn dead_object(&mut self) -> Throw {
        self.report_error(ErrorKind::InternalError, "can't access dead object")
    }

    fn with_handler<T>(
        &mut self,
        handler: Rc<dyn ProxyHandler>,
        f: impl FnOnce(&dyn ProxyHandler, &mut Context) -> JsResult<T>,
    ) -> JsResult<T> {
        self.enter_dispatch()?;
        let result = f(&*handler, self);
        self.exit_dispatch();
        result
    }

    /// Handler query that cannot fail; past the depth limit it answers `fallback`
    fn query_handler<T>(
        &mut self,
        handler: Rc<dyn ProxyHandler>,
        fallback: T,
        f: impl FnOnce(&dyn ProxyHandler, &mut Context) -> T,
    ) -> T {
        if !self.dispatch_available() || self.enter_dispatch().is_err() {
            return fallback;
        }
        let result = f(&*handler, self);
        self.exit_dispatch();
        result
    }

    // ------------------------------------------------------------------
    // Ordinary algorithms
    // ------------------------------------------------------------------

    fn ordinary_get_own_property(&self, obj: ObjectId, id: PropertyKey) -> Option<PropertyDescriptor> {
        self.heap
            .get(obj)?
            .properties
            .get(&id)
            .map(Property::to_descriptor)
    }

    /// OrdinaryDefineOwnProperty, without handler dispatch
    pub(crate) fn ordinary_define_own_property(
        &mut self,
        obj: ObjectId,
        id: PropertyKey,
        desc: &PropertyDescriptor,
    ) -> ObjectOpResult {
        let Some(cell) = self.heap.get_mut(obj) else {
            return ObjectOpResult::failed(FailureCode::CantDefineProperty);
        };
        if let Some(current) = cell.properties.get_mut(&id) {
            return match apply_descriptor(current, desc) {
                Ok(updated) => {
                    *current = updated;
                    ObjectOpResult::ok()
                }
                Err(code) => ObjectOpResult::failed(code),
            };
        }
        if !cell.extensible {
            return ObjectOpResult::failed(FailureCode::NotExtensible);
        }
        cell.properties.insert(id, Property::from_descriptor(desc));
        ObjectOpResult::ok()
    }

    fn ordinary_own_keys(&self, obj: ObjectId, props: &mut IdVector) {
        let Some(cell) = self.heap.get(obj) else {
            return;
        };
        let mut indices: Vec<u32> = cell.properties.keys().filter_map(|k| k.as_int()).collect();
        indices.sort_unstable();
        props.extend(indices.into_iter().map(PropertyKey::index));
        props.extend(cell.properties.keys().copied().filter(|k| k.is_atom()));
        props.extend(cell.properties.keys().copied().filter(|k| k.is_symbol()));
    }

    /// `for-in` key collection: own and inherited enumerable string keys,
    /// shadowed keys reported once
    pub fn enumerate_through_prototypes(
        &mut self,
        obj: ObjectId,
        props: &mut IdVector,
    ) -> JsResult<()> {
        let mut seen = FxHashSet::default();
        let mut visited = FxHashSet::default();
        let mut current = Some(obj);
        while let Some(o) = current {
            if !visited.insert(o) {
                break;
            }
            let mut keys = IdVector::new();
            self.own_property_keys(o, &mut keys)?;
            for &id in keys.iter() {
                if id.is_symbol() || !seen.insert(id) {
                    continue;
                }
                if let Some(desc) = self.get_own_property_descriptor(o, id)? {
                    if desc.has_enumerable && desc.enumerable {
                        props.push(id);
                    }
                }
            }
            current = self.get_prototype(o)?;
        }
        Ok(())
    }

    /// Value read through a descriptor: the value, or the getter called
    /// with `receiver`
    pub fn get_from_descriptor(
        &mut self,
        desc: &PropertyDescriptor,
        receiver: Value,
    ) -> JsResult<Value> {
        if desc.is_accessor() {
            match desc.getter.filter(|_| desc.has_getter) {
                Some(getter) => self.call(getter, receiver, &[]),
                None => Ok(Value::undefined()),
            }
        } else {
            Ok(desc.value_or_undefined())
        }
    }

    /// OrdinarySetWithOwnDescriptor. `own` is the result of
    /// `[[GetOwnProperty]]` on `obj`.
    pub fn ordinary_set_with_own_descriptor(
        &mut self,
        obj: ObjectId,
        id: PropertyKey,
        v: Value,
        receiver: Value,
        own: Option<PropertyDescriptor>,
    ) -> JsResult<ObjectOpResult> {
        let own = match own {
            Some(desc) => desc,
            None => match self.get_prototype(obj)? {
                Some(proto) => return self.set(proto, id, v, receiver),
                None => PropertyDescriptor::data(Value::undefined()),
            },
        };

        if own.is_accessor() {
            return match own.setter.filter(|_| own.has_setter) {
                Some(setter) => {
                    self.call(setter, receiver, &[v])?;
                    Ok(ObjectOpResult::ok())
                }
                None => Ok(ObjectOpResult::failed(FailureCode::GetterOnly)),
            };
        }

        if !(own.has_writable && own.writable) {
            return Ok(ObjectOpResult::failed(FailureCode::ReadOnly));
        }
        let Some(receiver) = receiver.as_object() else {
            return Ok(ObjectOpResult::failed(FailureCode::NotObjectReceiver));
        };
        match self.get_own_property_descriptor(receiver, id)? {
            Some(existing) if existing.is_accessor() => {
                Ok(ObjectOpResult::failed(FailureCode::CantRedefineProperty))
            }
            Some(existing) if !(existing.has_writable && existing.writable) => {
                Ok(ObjectOpResult::failed(FailureCode::ReadOnly))
            }
            Some(_) => self.define_property(receiver, id, &PropertyDescriptor::value_only(v)),
            None => self.define_property(receiver, id, &PropertyDescriptor::data(v)),
        }
    }

    // ------------------------------------------------------------------
    // Fundamental operations
    // ------------------------------------------------------------------

    /// `[[GetOwnProperty]]`
    pub fn get_own_property_descriptor(
        &mut self,
        obj: ObjectId,
        id: PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => Ok(self.ordinary_get_own_property(obj, id)),
            Dispatch::Proxy(handler) => self.with_handler(handler, |h, cx| {
                h.get_own_property_descriptor(cx, obj, id)
            }),
        }
    }

    /// `[[DefineOwnProperty]]`
    pub fn define_property(
        &mut self,
        obj: ObjectId,
        id: PropertyKey,
        desc: &PropertyDescriptor,
    ) -> JsResult<ObjectOpResult> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => Ok(self.ordinary_define_own_property(obj, id, desc)),
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.define_property(cx, obj, id, desc))
            }
        }
    }

    /// `[[OwnPropertyKeys]]`: integer keys ascending, then strings and
    /// symbols in insertion order
    pub fn own_property_keys(&mut self, obj: ObjectId, props: &mut IdVector) -> JsResult<()> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => {
                self.ordinary_own_keys(obj, props);
                Ok(())
            }
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.own_property_keys(cx, obj, props))
            }
        }
    }

    /// `[[Delete]]`
    pub fn delete_property(&mut self, obj: ObjectId, id: PropertyKey) -> JsResult<ObjectOpResult> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => {
                let Some(cell) = self.heap.get_mut(obj) else {
                    return Ok(ObjectOpResult::ok());
                };
                match cell.properties.get(&id) {
                    None => Ok(ObjectOpResult::ok()),
                    Some(prop) if !prop.attrs().configurable => {
                        Ok(ObjectOpResult::failed(FailureCode::CantDelete))
                    }
                    Some(_) => {
                        cell.properties.shift_remove(&id);
                        Ok(ObjectOpResult::ok())
                    }
                }
            }
            Dispatch::Proxy(handler) => self.with_handler(handler, |h, cx| h.delete(cx, obj, id)),
        }
    }

    /// Keys visited by `for-in`
    pub fn enumerate(&mut self, obj: ObjectId, props: &mut IdVector) -> JsResult<()> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => self.enumerate_through_prototypes(obj, props),
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.enumerate(cx, obj, props))
            }
        }
    }

    /// Prototype, when it can be read without side effects
    pub fn get_prototype_if_ordinary(&mut self, obj: ObjectId) -> JsResult<OrdinaryPrototype> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => Ok(OrdinaryPrototype::Ordinary(self.stored_prototype(obj))),
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.get_prototype_if_ordinary(cx, obj))
            }
        }
    }

    /// `[[GetPrototypeOf]]`
    pub fn get_prototype(&mut self, obj: ObjectId) -> JsResult<Option<ObjectId>> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => Ok(self.stored_prototype(obj)),
            Dispatch::Proxy(handler) => self.with_handler(handler, |h, cx| h.get_prototype(cx, obj)),
        }
    }

    /// `[[SetPrototypeOf]]`
    pub fn set_prototype(
        &mut self,
        obj: ObjectId,
        proto: Option<ObjectId>,
    ) -> JsResult<ObjectOpResult> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => Ok(self.store_prototype(obj, proto)),
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.set_prototype(cx, obj, proto))
            }
        }
    }

    /// Make the prototype immutable; `Ok(false)` when unsupported
    pub fn set_immutable_prototype(&mut self, obj: ObjectId) -> JsResult<bool> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => {
                if let Some(cell) = self.heap.get_mut(obj) {
                    cell.immutable_prototype = true;
                }
                Ok(true)
            }
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.set_immutable_prototype(cx, obj))
            }
        }
    }

    /// `[[PreventExtensions]]`
    pub fn prevent_extensions(&mut self, obj: ObjectId) -> JsResult<ObjectOpResult> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => {
                self.store_extensible(obj, false);
                Ok(ObjectOpResult::ok())
            }
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.prevent_extensions(cx, obj))
            }
        }
    }

    /// `[[IsExtensible]]`
    pub fn is_extensible(&mut self, obj: ObjectId) -> JsResult<bool> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => Ok(self.stored_extensible(obj)),
            Dispatch::Proxy(handler) => self.with_handler(handler, |h, cx| h.is_extensible(cx, obj)),
        }
    }

    /// `[[HasProperty]]`
    pub fn has(&mut self, obj: ObjectId, id: PropertyKey) -> JsResult<bool> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => {
                if self.ordinary_get_own_property(obj, id).is_some() {
                    return Ok(true);
                }
                match self.stored_prototype(obj) {
                    Some(proto) => self.has(proto, id),
                    None => Ok(false),
                }
            }
            Dispatch::Proxy(handler) => self.with_handler(handler, |h, cx| h.has(cx, obj, id)),
        }
    }

    /// `[[Get]]`
    pub fn get(&mut self, obj: ObjectId, receiver: Value, id: PropertyKey) -> JsResult<Value> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => match self.ordinary_get_own_property(obj, id) {
                Some(desc) => self.get_from_descriptor(&desc, receiver),
                None => match self.stored_prototype(obj) {
                    Some(proto) => self.get(proto, receiver, id),
                    None => Ok(Value::undefined()),
                },
            },
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.get(cx, obj, receiver, id))
            }
        }
    }

    /// `[[Set]]`
    pub fn set(
        &mut self,
        obj: ObjectId,
        id: PropertyKey,
        v: Value,
        receiver: Value,
    ) -> JsResult<ObjectOpResult> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => {
                let own = self.ordinary_get_own_property(obj, id);
                self.ordinary_set_with_own_descriptor(obj, id, v, receiver, own)
            }
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.set(cx, obj, id, v, receiver))
            }
        }
    }

    /// `[[Call]]`
    pub fn call(&mut self, obj: ObjectId, this: Value, args: &[Value]) -> JsResult<Value> {
        if !self.is_callable(obj) {
            let name = self.value_to_string(Value::object(obj));
            return Err(self.report_error(ErrorKind::TypeError, format!("{name} is not a function")));
        }
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.call(cx, obj, this, args))
            }
            Dispatch::Ordinary => {
                let call = match self.heap.get(obj).map(|cell| &cell.kind) {
                    Some(ObjectKind::Function { call, .. }) => call.clone(),
                    _ => return Err(self.dead_object()),
                };
                self.enter_dispatch()?;
                let result = call(self, this, args);
                self.exit_dispatch();
                result
            }
        }
    }

    /// `[[Construct]]`. A `new_target` that is not an object means `obj`.
    pub fn construct(&mut self, obj: ObjectId, args: &[Value], new_target: Value) -> JsResult<Value> {
        if !self.is_constructor(obj) {
            let name = self.value_to_string(Value::object(obj));
            return Err(self.report_error(
                ErrorKind::TypeError,
                format!("{name} is not a constructor"),
            ));
        }
        let new_target = if new_target.is_object() {
            new_target
        } else {
            Value::object(obj)
        };
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.construct(cx, obj, args, new_target))
            }
            Dispatch::Ordinary => {
                let call = match self.heap.get(obj).map(|cell| &cell.kind) {
                    Some(ObjectKind::Function { call, .. }) => call.clone(),
                    _ => return Err(self.dead_object()),
                };
                let proto = match new_target.as_object() {
                    Some(target) => {
                        let key = self.key("prototype");
                        self.get(target, new_target, key)?.as_object()
                    }
                    None => None,
                };
                let proto = proto.unwrap_or(self.object_prototype());
                let this = self.new_object_with_proto(Some(proto));
                self.enter_dispatch()?;
                let result = call(self, Value::object(this), args);
                self.exit_dispatch();
                let result = result?;
                Ok(if result.is_object() {
                    result
                } else {
                    Value::object(this)
                })
            }
        }
    }

    /// Own-property existence check
    pub fn has_own(&mut self, obj: ObjectId, id: PropertyKey) -> JsResult<bool> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => Ok(self.ordinary_get_own_property(obj, id).is_some()),
            Dispatch::Proxy(handler) => self.with_handler(handler, |h, cx| h.has_own(cx, obj, id)),
        }
    }

    /// Own enumerable keys, in `own_property_keys` order
    pub fn get_own_enumerable_property_keys(
        &mut self,
        obj: ObjectId,
        props: &mut IdVector,
    ) -> JsResult<()> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Ordinary => {
                let mut all = IdVector::new();
                self.ordinary_own_keys(obj, &mut all);
                let Some(cell) = self.heap.get(obj) else {
                    return Ok(());
                };
                props.extend(all.iter().copied().filter(|id| {
                    cell.properties
                        .get(id)
                        .is_some_and(|prop| prop.attrs().enumerable)
                }));
                Ok(())
            }
            Dispatch::Proxy(handler) => self.with_handler(handler, |h, cx| {
                h.get_own_enumerable_property_keys(cx, obj, props)
            }),
        }
    }

    /// Class name used by `Object.prototype.toString`
    pub fn class_name(&mut self, obj: ObjectId) -> String {
        match self.dispatch(obj) {
            Dispatch::Dead => "Object".to_string(),
            Dispatch::Ordinary => self
                .heap
                .get(obj)
                .map_or("Object", |cell| cell.class_name)
                .to_string(),
            Dispatch::Proxy(handler) => {
                self.query_handler(handler, "Object".to_string(), |h, cx| h.class_name(cx, obj))
            }
        }
    }

    /// `Function.prototype.toString`
    pub fn fun_to_string(&mut self, obj: ObjectId, is_to_string: bool) -> JsResult<Value> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.fun_to_string(cx, obj, is_to_string))
            }
            Dispatch::Ordinary => {
                let name = match self.heap.get(obj).map(|cell| &cell.kind) {
                    Some(ObjectKind::Function { name, .. }) => Some(*name),
                    _ => None,
                };
                match name {
                    Some(name) => {
                        let source = NATIVE_CODE_SOURCE
                            .replacen("function ", &format!("function {}", self.atom_str(name)), 1);
                        Ok(self.new_string(&source))
                    }
                    None => Err(self.report_error(
                        ErrorKind::TypeError,
                        "Function.prototype.toString called on incompatible object",
                    )),
                }
            }
        }
    }

    /// Primitive held by a boxed object, `undefined` for other objects
    pub fn boxed_value_unbox(&mut self, obj: ObjectId) -> JsResult<Value> {
        match self.dispatch(obj) {
            Dispatch::Dead => Err(self.dead_object()),
            Dispatch::Proxy(handler) => {
                self.with_handler(handler, |h, cx| h.boxed_value_unbox(cx, obj))
            }
            Dispatch::Ordinary => Ok(match self.heap.get(obj).map(|cell| &cell.kind) {
                Some(ObjectKind::Boxed(value)) => *value,
                _ => Value::undefined(),
            }),
        }
    }

    /// Whether `[[Call]]` is supported
    pub fn is_callable(&mut self, obj: ObjectId) -> bool {
        match self.dispatch(obj) {
            Dispatch::Dead => false,
            Dispatch::Ordinary => matches!(
                self.heap.get(obj).map(|cell| &cell.kind),
                Some(ObjectKind::Function { .. })
            ),
            Dispatch::Proxy(handler) => {
                self.query_handler(handler, false, |h, cx| h.is_callable(cx, obj))
            }
        }
    }

    /// Whether `[[Construct]]` is supported
    pub fn is_constructor(&mut self, obj: ObjectId) -> bool {
        match self.dispatch(obj) {
            Dispatch::Dead => false,
            Dispatch::Ordinary => matches!(
                self.heap.get(obj).map(|cell| &cell.kind),
                Some(ObjectKind::Function {
                    constructor: true,
                    ..
                })
            ),
            Dispatch::Proxy(handler) => {
                self.query_handler(handler, false, |h, cx| h.is_constructor(cx, obj))
            }
        }
    }

    // ------------------------------------------------------------------
    // Convenience
    // ------------------------------------------------------------------

    /// `obj[name]`
    pub fn get_property(&mut self, obj: ObjectId, name: &str) -> JsResult<Value> {
        let id = self.key(name);
        self.get(obj, Value::object(obj), id)
    }

    /// `obj[name] = v` in strict mode: a refusal becomes a `TypeError`
    pub fn set_property(&mut self, obj: ObjectId, name: &str, v: Value) -> JsResult<()> {
        let id = self.key(name);
        let result = self.set(obj, id, v, Value::object(obj))?;
        result.check_strict(self, id)
    }

    /// Define a data property, throwing on refusal
    pub fn define_data(
        &mut self,
        obj: ObjectId,
        name: &str,
        v: Value,
        attrs: PropertyAttributes,
    ) -> JsResult<()> {
        let id = self.key(name);
        let result = self.define_property(obj, id, &PropertyDescriptor::data_with_attrs(v, attrs))?;
        result.check_strict(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_value() {
        assert!(same_value(Value::int32(1), Value::number(1.0)));
        assert!(same_value(Value::number(f64::NAN), Value::number(f64::NAN)));
        assert!(!same_value(Value::number(0.0), Value::number(-0.0)));
        assert!(!same_value(Value::int32(1), Value::boolean(true)));
    }

    #[test]
    fn test_non_configurable_rejects_redefinition() {
        let frozen = Property::Data {
            value: Value::int32(1),
            attrs: PropertyAttributes::frozen(),
        };
        assert_eq!(
            apply_descriptor(&frozen, &PropertyDescriptor::value_only(Value::int32(2))),
            Err(FailureCode::ReadOnly)
        );
        assert!(apply_descriptor(&frozen, &PropertyDescriptor::value_only(Value::int32(1))).is_ok());
        let mut to_accessor = PropertyDescriptor::default();
        to_accessor.has_getter = true;
        assert_eq!(
            apply_descriptor(&frozen, &to_accessor),
            Err(FailureCode::CantRedefineProperty)
        );
    }

    #[test]
    fn test_partial_descriptor_keeps_attributes() {
        let prop = Property::Data {
            value: Value::int32(1),
            attrs: PropertyAttributes::data(),
        };
        let updated = apply_descriptor(&prop, &PropertyDescriptor::value_only(Value::int32(7))).unwrap();
        assert_eq!(
            updated,
            Property::Data {
                value: Value::int32(7),
                attrs: PropertyAttributes::data()
            }
        );
    }

    #[test]
    fn test_own_keys_order() {
        let mut cx = Context::new();
        let obj = cx.new_object();
        let b = cx.key("b");
        let a = cx.key("a");
        let sym = PropertyKey::symbol(cx.new_symbol(None));
        for id in [b, PropertyKey::index(2), sym, a, PropertyKey::index(0)] {
            cx.define_property(obj, id, &PropertyDescriptor::data(Value::int32(0)))
                .unwrap();
        }
        let mut keys = IdVector::new();
        cx.own_property_keys(obj, &mut keys).unwrap();
        assert_eq!(
            keys.as_slice(),
            &[PropertyKey::index(0), PropertyKey::index(2), b, a, sym]
        );
    }
}
