//! Object storage
//!
//! Objects live in a slot heap owned by the context and are addressed by
//! [`ObjectId`]. Freed slots go on a free list and are reused. Every handle
//! carries its slot's generation, bumped on each free, so a stale handle is
//! detected as a dead object rather than silently aliasing a newer one.
//! A slot whose generation is exhausted is retired instead of reused.

use std::fmt;
use std::num::NonZeroU32;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;

use crate::atom::Atom;
use crate::context::Context;
use crate::descriptor::{PropertyAttributes, PropertyDescriptor};
use crate::error::{ErrorKind, JsResult};
use crate::handler::ProxyHandler;
use crate::id::PropertyKey;
use crate::value::Value;

const SLOT_BITS: u32 = 20;
const SLOT_MASK: u32 = (1 << SLOT_BITS) - 1;

/// Slots a heap can hold; the slot field stores `index + 1`
pub(crate) const MAX_SLOTS: usize = (SLOT_MASK - 1) as usize;

/// Last generation a slot can reach before it is retired
pub(crate) const MAX_GENERATION: u32 = (1 << (32 - SLOT_BITS)) - 1;

/// Handle to an object in a [`Context`] heap.
///
/// The low 20 bits hold the slot index plus one, the high 12 bits the
/// slot's generation. `Option<ObjectId>` has the same layout as `u32`,
/// with `0` meaning `None`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(NonZeroU32);

impl ObjectId {
    /// Rebuild a handle from its raw form, `None` for raw forms no heap
    /// hands out
    pub const fn from_raw(raw: u32) -> Option<Self> {
        if raw & SLOT_MASK == 0 {
            return None;
        }
        match NonZeroU32::new(raw) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Raw form, never 0
    pub const fn raw(self) -> u32 {
        self.0.get()
    }

    fn from_parts(slot: usize, generation: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(slot as u32) | (generation << SLOT_BITS))
    }

    fn slot(self) -> usize {
        ((self.0.get() & SLOT_MASK) - 1) as usize
    }

    fn generation(self) -> u32 {
        self.0.get() >> SLOT_BITS
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object(#{})", self.0)
    }
}

/// Host function called for `[[Call]]` and `[[Construct]]`
pub type NativeFn = Rc<dyn Fn(&mut Context, Value, &[Value]) -> JsResult<Value>>;

/// A stored own property
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Property {
    /// Data property
    Data {
        /// The value
        value: Value,
        /// Attributes
        attrs: PropertyAttributes,
    },
    /// Accessor property
    Accessor {
        /// Getter function
        getter: Option<ObjectId>,
        /// Setter function
        setter: Option<ObjectId>,
        /// Attributes (`writable` unused)
        attrs: PropertyAttributes,
    },
}

impl Property {
    /// Attributes
    pub fn attrs(&self) -> PropertyAttributes {
        match self {
            Self::Data { attrs, .. } | Self::Accessor { attrs, .. } => *attrs,
        }
    }

    /// Is an accessor
    pub fn is_accessor(&self) -> bool {
        matches!(self, Self::Accessor { .. })
    }

    /// Complete descriptor for this property
    pub fn to_descriptor(&self) -> PropertyDescriptor {
        match *self {
            Self::Data { value, attrs } => PropertyDescriptor::data_with_attrs(value, attrs),
            Self::Accessor {
                getter,
                setter,
                attrs,
            } => PropertyDescriptor::accessor(getter, setter, attrs),
        }
    }

    /// Build a new property from a (possibly partial) descriptor,
    /// absent fields defaulting to `false`/`undefined`
    pub fn from_descriptor(desc: &PropertyDescriptor) -> Self {
        let attrs = desc.attributes();
        if desc.is_accessor() {
            Self::Accessor {
                getter: if desc.has_getter { desc.getter } else { None },
                setter: if desc.has_setter { desc.setter } else { None },
                attrs,
            }
        } else {
            Self::Data {
                value: desc.value_or_undefined(),
                attrs,
            }
        }
    }
}

/// Construction options for proxy objects
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProxyOptions {
    /// The prototype is computed by the handler (`get_prototype`) instead of
    /// being stored on the proxy
    pub lazy_proto: bool,
    /// The proxy's class has a call hook
    pub callable: bool,
    /// Number of reserved slots, initialized to `undefined`
    pub reserved_slots: usize,
}

impl ProxyOptions {
    /// Options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `lazy_proto`
    pub fn lazy_proto(mut self, lazy: bool) -> Self {
        self.lazy_proto = lazy;
        self
    }

    /// Set `callable`
    pub fn callable(mut self, callable: bool) -> Self {
        self.callable = callable;
        self
    }

    /// Set the number of reserved slots
    pub fn reserved_slots(mut self, count: usize) -> Self {
        self.reserved_slots = count;
        self
    }
}

/// Proxy-specific state
pub struct ProxyData {
    pub(crate) handler: Rc<dyn ProxyHandler>,
    pub(crate) private: Value,
    pub(crate) reserved: SmallVec<[Value; 2]>,
    pub(crate) lazy_proto: bool,
    pub(crate) callable: bool,
}

/// What kind of object a cell holds
pub enum ObjectKind {
    /// Plain object
    Ordinary,
    /// Host function
    Function {
        /// Implementation
        call: NativeFn,
        /// Function name
        name: Atom,
        /// Whether `[[Construct]]` is supported
        constructor: bool,
    },
    /// Primitive wrapper (`new Number(1)` and friends)
    Boxed(Value),
    /// Proxy dispatching through a handler
    Proxy(ProxyData),
    /// Error raised by the host. The message stays out of the atom table.
    Error {
        /// Error constructor
        kind: ErrorKind,
        /// Formatted message
        message: Box<str>,
    },
}

/// One heap slot
pub struct ObjectCell {
    pub(crate) properties: IndexMap<PropertyKey, Property, FxBuildHasher>,
    pub(crate) prototype: Option<ObjectId>,
    pub(crate) extensible: bool,
    pub(crate) immutable_prototype: bool,
    pub(crate) class_name: &'static str,
    pub(crate) kind: ObjectKind,
    pub(crate) marked: bool,
}

impl ObjectCell {
    pub(crate) fn new(kind: ObjectKind, prototype: Option<ObjectId>) -> Self {
        let class_name = match &kind {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Function { .. } => "Function",
            ObjectKind::Boxed(v) if v.is_number() => "Number",
            ObjectKind::Boxed(v) if v.is_boolean() => "Boolean",
            ObjectKind::Boxed(v) if v.is_string() => "String",
            ObjectKind::Boxed(_) => "Object",
            ObjectKind::Proxy(_) => "Proxy",
            ObjectKind::Error { .. } => "Error",
        };
        Self {
            properties: IndexMap::default(),
            prototype,
            extensible: true,
            immutable_prototype: false,
            class_name,
            kind,
            marked: false,
        }
    }

    /// Proxy state, for proxy objects
    pub(crate) fn proxy(&self) -> Option<&ProxyData> {
        match &self.kind {
            ObjectKind::Proxy(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn proxy_mut(&mut self) -> Option<&mut ProxyData> {
        match &mut self.kind {
            ObjectKind::Proxy(data) => Some(data),
            _ => None,
        }
    }
}

struct Slot {
    generation: u32,
    cell: Option<ObjectCell>,
}

/// Slot heap with generational handles
pub(crate) struct Heap {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    live: usize,
    pub(crate) allocated_since_gc: usize,
}

impl Heap {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            live: 0,
            allocated_since_gc: 0,
        }
    }

    /// Store `cell` in a free slot, growing the heap when none is free.
    ///
    /// # Panics
    /// When [`MAX_SLOTS`] slots are live or retired.
    pub(crate) fn alloc(&mut self, cell: ObjectCell) -> ObjectId {
        let index = match self.free_list.pop() {
            Some(index) => index as usize,
            None => {
                if self.slots.len() >= MAX_SLOTS {
                    panic!("object heap exhausted ({MAX_SLOTS} slots)");
                }
                self.slots.push(Slot {
                    generation: 0,
                    cell: None,
                });
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        debug_assert!(slot.cell.is_none(), "free list returned an occupied slot");
        slot.cell = Some(cell);
        self.live += 1;
        self.allocated_since_gc += 1;
        ObjectId::from_parts(index, slot.generation)
    }

    fn slot(&self, obj: ObjectId) -> Option<&Slot> {
        self.slots
            .get(obj.slot())
            .filter(|slot| slot.generation == obj.generation())
    }

    pub(crate) fn get(&self, obj: ObjectId) -> Option<&ObjectCell> {
        self.slot(obj).and_then(|slot| slot.cell.as_ref())
    }

    pub(crate) fn get_mut(&mut self, obj: ObjectId) -> Option<&mut ObjectCell> {
        self.slots
            .get_mut(obj.slot())
            .filter(|slot| slot.generation == obj.generation())
            .and_then(|slot| slot.cell.as_mut())
    }

    pub(crate) fn free(&mut self, obj: ObjectId) -> Option<ObjectCell> {
        let index = obj.slot();
        let slot = self
            .slots
            .get_mut(index)
            .filter(|slot| slot.generation == obj.generation())?;
        let cell = slot.cell.take()?;
        self.live -= 1;
        if slot.generation < MAX_GENERATION {
            slot.generation += 1;
            self.free_list.push(index as u32);
        }
        Some(cell)
    }

    pub(crate) fn live(&self) -> usize {
        self.live
    }

    /// Slots ever created, live, free and retired
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Handles of every live object, in slot order
    pub(crate) fn ids(&self) -> Vec<ObjectId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.cell.is_some())
            .map(|(i, slot)| ObjectId::from_parts(i, slot.generation))
            .collect()
    }

    pub(crate) fn cells_mut(&mut self) -> impl Iterator<Item = &mut ObjectCell> {
        self.slots.iter_mut().filter_map(|slot| slot.cell.as_mut())
    }
}
