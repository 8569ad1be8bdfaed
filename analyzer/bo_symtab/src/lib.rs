//! The shared symbol table from which fresh interval symbols are drawn.
//!
//! Spec §5 calls this "the only shared mutable resource touched during
//! symbolic-value construction" and says the domain "passes it through as an
//! opaque handle and does not itself synchronize" — callers driving several
//! procedure analyses concurrently are responsible for serializing access to
//! a single `SymbolTable` (or, more commonly, giving each analysis its own).

use std::cell::Cell;

/// One step of where a symbolic value came from: a field projection, a
/// pointer dereference, or an array index.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum PathElem {
    Field(String),
    Deref,
    Index,
}

/// The provenance path a symbol was drawn for. `represents_multiple_values`
/// is true exactly when the path passes through a dereference or index,
/// i.e. the symbol summarizes more than one concrete cell.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SymbolPath {
    elems: Vec<PathElem>,
}

impl SymbolPath {
    /// Build a "normal" path (spec §6's `SymbolPath.normal`) from its
    /// elements, root first.
    pub fn normal(elems: Vec<PathElem>) -> Self {
        SymbolPath { elems }
    }

    pub fn root(name: impl Into<String>) -> Self {
        SymbolPath {
            elems: vec![PathElem::Field(name.into())],
        }
    }

    pub fn push(&self, elem: PathElem) -> Self {
        let mut elems = self.elems.clone();
        elems.push(elem);
        SymbolPath { elems }
    }

    pub fn represents_multiple_values(&self) -> bool {
        self.elems
            .iter()
            .any(|e| matches!(e, PathElem::Deref | PathElem::Index))
    }

    pub fn elems(&self) -> &[PathElem] {
        &self.elems
    }
}

impl std::fmt::Display for SymbolPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.elems.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            match e {
                PathElem::Field(name) => write!(f, "{}", name)?,
                PathElem::Deref => write!(f, "*")?,
                PathElem::Index => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}

/// A fresh, interned numeric symbol used inside `Itv` bounds.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Symbol {
    id: u64,
    path: SymbolPath,
    unsigned: bool,
}

impl Symbol {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &SymbolPath {
        &self.path
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s${}[{}]", self.id, self.path)
    }
}

/// A set of symbols; `Itv::get_symbols`/`ArrayBlk::get_symbols` return this.
pub type SymbolSet = std::collections::BTreeSet<Symbol>;

/// The shared resource that hands out fresh `Symbol`s. One instance is
/// created per analyzed procedure (or shared across a batch if the driver
/// serializes access itself, per spec §5).
#[derive(Debug, Default)]
pub struct SymbolTable {
    next: Cell<u64>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable { next: Cell::new(0) }
    }

    /// Draw a fresh symbol naming `path`, recording whether it should be
    /// treated as an unsigned quantity (e.g. a `size_t`-typed formal).
    pub fn make_fresh(&self, path: SymbolPath, unsigned: bool) -> Symbol {
        let id = self.next.get();
        self.next.set(id + 1);
        Symbol { id, path, unsigned }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_symbols_are_distinct() {
        let tab = SymbolTable::new();
        let a = tab.make_fresh(SymbolPath::root("x"), false);
        let b = tab.make_fresh(SymbolPath::root("x"), false);
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn deref_path_represents_multiple_values() {
        let path = SymbolPath::root("p").push(PathElem::Deref);
        assert!(path.represents_multiple_values());
        assert!(!SymbolPath::root("x").represents_multiple_values());
    }
}
