//! NaN-boxed values
//!
//! Every value fits in 64 bits so it can cross the C ABI by value. Heap
//! references are handles into the owning [`Context`](crate::Context), never
//! raw pointers.
//!
//! ## Encoding Scheme
//!
//! ```text
//! Double:     stored directly (NaN is canonicalized)
//! NaN:        0x7FFA_0000_0000_0000
//! Undefined:  0x7FF8_0000_0000_0000
//! Null:       0x7FF8_0000_0000_0001
//! True:       0x7FF8_0000_0000_0002
//! False:      0x7FF8_0000_0000_0003
//! Int32:      0x7FF8_0001_XXXX_XXXX
//! String:     0x7FF9_0000_XXXX_XXXX (atom index)
//! Symbol:     0x7FFB_0000_XXXX_XXXX (symbol index)
//! Object:     0x7FFC_0000_XXXX_XXXX (object handle)
//! ```

use std::fmt;

use crate::atom::{Atom, SymbolId};
use crate::object::ObjectId;

const QUIET_NAN: u64 = 0x7FF8_0000_0000_0000;
const TAG_MASK: u64 = 0xFFFF_0000_0000_0000;
const SUBTAG_MASK: u64 = 0xFFFF_FFFF_0000_0000;
const PAYLOAD_MASK: u64 = 0x0000_0000_FFFF_FFFF;

const TAG_UNDEFINED: u64 = 0x7FF8_0000_0000_0000;
const TAG_NULL: u64 = 0x7FF8_0000_0000_0001;
const TAG_TRUE: u64 = 0x7FF8_0000_0000_0002;
const TAG_FALSE: u64 = 0x7FF8_0000_0000_0003;
const TAG_INT32: u64 = 0x7FF8_0001_0000_0000;
const TAG_STRING: u64 = 0x7FF9_0000_0000_0000;
const TAG_NAN: u64 = 0x7FFA_0000_0000_0000;
const TAG_SYMBOL: u64 = 0x7FFB_0000_0000_0000;
const TAG_OBJECT: u64 = 0x7FFC_0000_0000_0000;

/// A JavaScript value using NaN-boxing
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value {
    bits: u64,
}

impl Default for Value {
    fn default() -> Self {
        Self::undefined()
    }
}

impl Value {
    /// The `undefined` value
    pub const fn undefined() -> Self {
        Self {
            bits: TAG_UNDEFINED,
        }
    }

    /// The `null` value
    pub const fn null() -> Self {
        Self { bits: TAG_NULL }
    }

    /// A boolean value
    pub const fn boolean(b: bool) -> Self {
        Self {
            bits: if b { TAG_TRUE } else { TAG_FALSE },
        }
    }

    /// A 32-bit integer value
    pub const fn int32(n: i32) -> Self {
        Self {
            bits: TAG_INT32 | (n as u32 as u64),
        }
    }

    /// A number value
    pub fn number(n: f64) -> Self {
        if n.is_nan() {
            Self { bits: TAG_NAN }
        } else {
            Self { bits: n.to_bits() }
        }
    }

    /// An interned string value
    pub const fn string(atom: Atom) -> Self {
        Self {
            bits: TAG_STRING | atom.index() as u64,
        }
    }

    /// A symbol value
    pub const fn symbol(sym: SymbolId) -> Self {
        Self {
            bits: TAG_SYMBOL | sym.index() as u64,
        }
    }

    /// An object value
    pub const fn object(obj: ObjectId) -> Self {
        Self {
            bits: TAG_OBJECT | obj.raw() as u64,
        }
    }

    /// `Value::object` for an optional handle, `null` when absent
    pub fn object_or_null(obj: Option<ObjectId>) -> Self {
        obj.map_or(Self::null(), Self::object)
    }

    /// Raw bit pattern
    pub const fn to_bits(self) -> u64 {
        self.bits
    }

    /// Rebuild a value from a bit pattern produced by [`Value::to_bits`]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    fn is_double(self) -> bool {
        (self.bits & QUIET_NAN) != QUIET_NAN
    }

    /// Is `undefined`
    pub const fn is_undefined(self) -> bool {
        self.bits == TAG_UNDEFINED
    }

    /// Is `null`
    pub const fn is_null(self) -> bool {
        self.bits == TAG_NULL
    }

    /// Is `null` or `undefined`
    pub const fn is_nullish(self) -> bool {
        self.is_null() || self.is_undefined()
    }

    /// Is a boolean
    pub const fn is_boolean(self) -> bool {
        self.bits == TAG_TRUE || self.bits == TAG_FALSE
    }

    /// Is a number (int32, double or NaN)
    pub fn is_number(self) -> bool {
        self.is_double() || self.bits == TAG_NAN || (self.bits & SUBTAG_MASK) == TAG_INT32
    }

    /// Is a string
    pub const fn is_string(self) -> bool {
        (self.bits & TAG_MASK) == TAG_STRING
    }

    /// Is a symbol
    pub const fn is_symbol(self) -> bool {
        (self.bits & TAG_MASK) == TAG_SYMBOL
    }

    /// Is an object
    pub const fn is_object(self) -> bool {
        (self.bits & TAG_MASK) == TAG_OBJECT
    }

    /// Boolean payload
    pub const fn as_boolean(self) -> Option<bool> {
        match self.bits {
            TAG_TRUE => Some(true),
            TAG_FALSE => Some(false),
            _ => None,
        }
    }

    /// Int32 payload (doubles are not converted)
    pub fn as_int32(self) -> Option<i32> {
        if (self.bits & SUBTAG_MASK) == TAG_INT32 {
            Some((self.bits & PAYLOAD_MASK) as u32 as i32)
        } else {
            None
        }
    }

    /// Numeric payload
    pub fn as_number(self) -> Option<f64> {
        if let Some(n) = self.as_int32() {
            Some(n as f64)
        } else if self.bits == TAG_NAN {
            Some(f64::NAN)
        } else if self.is_double() {
            Some(f64::from_bits(self.bits))
        } else {
            None
        }
    }

    /// String payload
    pub fn as_string(self) -> Option<Atom> {
        self.is_string()
            .then(|| Atom::from_index((self.bits & PAYLOAD_MASK) as u32))
    }

    /// Symbol payload
    pub fn as_symbol(self) -> Option<SymbolId> {
        self.is_symbol()
            .then(|| SymbolId::from_index((self.bits & PAYLOAD_MASK) as u32))
    }

    /// Object payload
    pub fn as_object(self) -> Option<ObjectId> {
        if self.is_object() {
            ObjectId::from_raw((self.bits & PAYLOAD_MASK) as u32)
        } else {
            None
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undefined() {
            write!(f, "undefined")
        } else if self.is_null() {
            write!(f, "null")
        } else if let Some(b) = self.as_boolean() {
            write!(f, "{b}")
        } else if let Some(n) = self.as_int32() {
            write!(f, "{n}")
        } else if let Some(n) = self.as_number() {
            write!(f, "{n:?}")
        } else if let Some(atom) = self.as_string() {
            write!(f, "String({})", atom.index())
        } else if let Some(sym) = self.as_symbol() {
            write!(f, "Symbol({})", sym.index())
        } else if let Some(obj) = self.as_object() {
            write!(f, "{obj:?}")
        } else {
            write!(f, "Value({:#018x})", self.bits)
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::int32(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::number(n)
    }
}

impl From<ObjectId> for Value {
    fn from(obj: ObjectId) -> Self {
        Self::object(obj)
    }
}
