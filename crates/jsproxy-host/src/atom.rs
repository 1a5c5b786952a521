//! Interned strings and symbols

use rustc_hash::FxHashMap;

/// Handle to an interned string
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    /// Rebuild an atom from its table index
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Index into the owning atom table
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Handle to a symbol
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Rebuild a symbol id from its index
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Index into the owning symbol table
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Interned string table. Atoms are never freed, so only property names and
/// other bounded sets of strings are interned.
#[derive(Debug, Default)]
pub struct AtomTable {
    strings: Vec<Box<str>>,
    lookup: FxHashMap<Box<str>, Atom>,
}

impl AtomTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning the existing atom when already present
    pub fn intern(&mut self, s: &str) -> Atom {
        if let Some(atom) = self.lookup.get(s) {
            return *atom;
        }
        let atom = Atom(self.strings.len() as u32);
        self.strings.push(s.into());
        self.lookup.insert(s.into(), atom);
        atom
    }

    /// Look up an atom without interning
    pub fn find(&self, s: &str) -> Option<Atom> {
        self.lookup.get(s).copied()
    }

    /// Contents of an atom
    pub fn get(&self, atom: Atom) -> Option<&str> {
        self.strings.get(atom.0 as usize).map(|s| &**s)
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
