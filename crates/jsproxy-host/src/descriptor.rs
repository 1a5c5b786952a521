//! Property descriptors
//!
//! [`PropertyDescriptor`] is a plain `#[repr(C)]` struct with one explicit
//! `has_*` flag per field so a foreign caller can build or read it without
//! modelling bit-fields. Absence of a whole descriptor is never encoded in
//! the struct itself; callers use `Option<PropertyDescriptor>` natively and
//! a separate `is_none` flag at the C boundary.

use crate::object::ObjectId;
use crate::value::Value;

/// Property attributes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropertyAttributes {
    /// Property is writable (data properties only)
    pub writable: bool,
    /// Property is enumerable
    pub enumerable: bool,
    /// Property is configurable
    pub configurable: bool,
}

impl PropertyAttributes {
    /// Default data property attributes
    pub const fn data() -> Self {
        Self {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Non-writable, non-enumerable, non-configurable
    pub const fn frozen() -> Self {
        Self {
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    /// Writable and configurable but hidden from enumeration
    pub const fn hidden() -> Self {
        Self {
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }
}

/// A (possibly partial) property descriptor
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// `configurable` is present
    pub has_configurable: bool,
    /// `[[Configurable]]`
    pub configurable: bool,
    /// `enumerable` is present
    pub has_enumerable: bool,
    /// `[[Enumerable]]`
    pub enumerable: bool,
    /// `writable` is present
    pub has_writable: bool,
    /// `[[Writable]]`
    pub writable: bool,
    /// `value` is present
    pub has_value: bool,
    /// `get` is present
    pub has_getter: bool,
    /// `set` is present
    pub has_setter: bool,
    /// `[[Value]]`
    pub value: Value,
    /// `[[Get]]`, `None` for an explicitly undefined getter
    pub getter: Option<ObjectId>,
    /// `[[Set]]`, `None` for an explicitly undefined setter
    pub setter: Option<ObjectId>,
}

impl PropertyDescriptor {
    /// Complete data descriptor with default attributes
    pub fn data(value: Value) -> Self {
        Self::data_with_attrs(value, PropertyAttributes::data())
    }

    /// Complete data descriptor
    pub fn data_with_attrs(value: Value, attrs: PropertyAttributes) -> Self {
        Self {
            has_configurable: true,
            configurable: attrs.configurable,
            has_enumerable: true,
            enumerable: attrs.enumerable,
            has_writable: true,
            writable: attrs.writable,
            has_value: true,
            value,
            ..Self::default()
        }
    }

    /// Complete accessor descriptor. `attrs.writable` is ignored.
    pub fn accessor(
        getter: Option<ObjectId>,
        setter: Option<ObjectId>,
        attrs: PropertyAttributes,
    ) -> Self {
        Self {
            has_configurable: true,
            configurable: attrs.configurable,
            has_enumerable: true,
            enumerable: attrs.enumerable,
            has_getter: true,
            getter,
            has_setter: true,
            setter,
            ..Self::default()
        }
    }

    /// Partial descriptor carrying only a value, as produced by `x = v`
    /// on an existing writable property
    pub fn value_only(value: Value) -> Self {
        Self {
            has_value: true,
            value,
            ..Self::default()
        }
    }

    /// Has `get` or `set`
    pub fn is_accessor(&self) -> bool {
        self.has_getter || self.has_setter
    }

    /// Has `value` or `writable`
    pub fn is_data(&self) -> bool {
        self.has_value || self.has_writable
    }

    /// Neither accessor nor data
    pub fn is_generic(&self) -> bool {
        !self.is_accessor() && !self.is_data()
    }

    /// Every field of its kind is present
    pub fn is_complete(&self) -> bool {
        let common = self.has_configurable && self.has_enumerable;
        if self.is_accessor() {
            common && self.has_getter && self.has_setter
        } else {
            common && self.has_value && self.has_writable
        }
    }

    /// Attributes, treating absent flags as `false`
    pub fn attributes(&self) -> PropertyAttributes {
        PropertyAttributes {
            writable: self.has_writable && self.writable,
            enumerable: self.has_enumerable && self.enumerable,
            configurable: self.has_configurable && self.configurable,
        }
    }

    /// Value, or `undefined` when absent
    pub fn value_or_undefined(&self) -> Value {
        if self.has_value {
            self.value
        } else {
            Value::undefined()
        }
    }
}
