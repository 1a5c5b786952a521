//! Property keys and key vectors

use std::fmt;
use std::ops::Deref;

use crate::atom::{Atom, SymbolId};

const TAG_SHIFT: u32 = 32;
const TAG_INT: u64 = 1 << TAG_SHIFT;
const TAG_ATOM: u64 = 2 << TAG_SHIFT;
const TAG_SYMBOL: u64 = 3 << TAG_SHIFT;
const TAG_MASK: u64 = 0xFFFF_FFFF << TAG_SHIFT;
const PAYLOAD_MASK: u64 = 0xFFFF_FFFF;

/// Property key: integer index, interned string or symbol.
///
/// Strings that spell a canonical array index are always stored in the
/// integer form, see [`Context::key`](crate::Context::key).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PropertyKey(u64);

impl PropertyKey {
    /// The void key, used where "no key" must be encoded in-band
    pub const VOID: Self = Self(0);

    /// Integer index key
    pub const fn index(i: u32) -> Self {
        Self(TAG_INT | i as u64)
    }

    /// String key. The caller is responsible for index canonicalization.
    pub const fn atom(atom: Atom) -> Self {
        Self(TAG_ATOM | atom.index() as u64)
    }

    /// Symbol key
    pub const fn symbol(sym: SymbolId) -> Self {
        Self(TAG_SYMBOL | sym.index() as u64)
    }

    /// Raw bit pattern
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Is the void key
    pub const fn is_void(self) -> bool {
        self.0 == 0
    }

    /// Is an integer index
    pub const fn is_int(self) -> bool {
        (self.0 & TAG_MASK) == TAG_INT
    }

    /// Is a string key
    pub const fn is_atom(self) -> bool {
        (self.0 & TAG_MASK) == TAG_ATOM
    }

    /// Is a symbol key
    pub const fn is_symbol(self) -> bool {
        (self.0 & TAG_MASK) == TAG_SYMBOL
    }

    /// Integer payload
    pub fn as_int(self) -> Option<u32> {
        self.is_int().then_some((self.0 & PAYLOAD_MASK) as u32)
    }

    /// String payload
    pub fn as_atom(self) -> Option<Atom> {
        self.is_atom()
            .then(|| Atom::from_index((self.0 & PAYLOAD_MASK) as u32))
    }

    /// Symbol payload
    pub fn as_symbol(self) -> Option<SymbolId> {
        self.is_symbol()
            .then(|| SymbolId::from_index((self.0 & PAYLOAD_MASK) as u32))
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(i) = self.as_int() {
            write!(f, "Index({i})")
        } else if let Some(atom) = self.as_atom() {
            write!(f, "Atom({})", atom.index())
        } else if let Some(sym) = self.as_symbol() {
            write!(f, "Symbol({})", sym.index())
        } else {
            write!(f, "Void")
        }
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        Self::index(i)
    }
}

impl From<Atom> for PropertyKey {
    fn from(atom: Atom) -> Self {
        Self::atom(atom)
    }
}

impl From<SymbolId> for PropertyKey {
    fn from(sym: SymbolId) -> Self {
        Self::symbol(sym)
    }
}

/// Growable list of property keys filled by key-enumerating operations.
///
/// Operations append; they never clear or dedupe what is already there.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdVector {
    keys: Vec<PropertyKey>,
}

impl IdVector {
    /// Create an empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one key
    pub fn push(&mut self, key: PropertyKey) {
        self.keys.push(key);
    }

    /// Remove every key
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Keys in append order
    pub fn as_slice(&self) -> &[PropertyKey] {
        &self.keys
    }

    /// Take ownership of the keys
    pub fn into_vec(self) -> Vec<PropertyKey> {
        self.keys
    }
}

impl Deref for IdVector {
    type Target = [PropertyKey];

    fn deref(&self) -> &[PropertyKey] {
        &self.keys
    }
}

impl Extend<PropertyKey> for IdVector {
    fn extend<I: IntoIterator<Item = PropertyKey>>(&mut self, iter: I) {
        self.keys.extend(iter);
    }
}

impl From<Vec<PropertyKey>> for IdVector {
    fn from(keys: Vec<PropertyKey>) -> Self {
        Self { keys }
    }
}

/// Parse a canonical array index ("0", "17", but not "017" or "4294967295")
pub(crate) fn parse_index(s: &str) -> Option<u32> {
    if s.is_empty() || (s.len() > 1 && s.starts_with('0')) {
        return None;
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match s.parse::<u32>() {
        Ok(n) if n != u32::MAX => Some(n),
        _ => None,
    }
}
