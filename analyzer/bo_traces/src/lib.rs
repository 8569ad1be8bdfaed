//! Sets of provenance traces, attached to every `AbstractValue` so a checker
//! can explain *why* a value has the shape it does (spec §3's `traces`
//! field). Declared out of scope in spec §1 as "the external `TraceSet`" —
//! implemented here as the concrete collaborator `bo_domain` links against.

use bo_ir::{Location, ProcName};
use im::HashSet;

/// One step in the provenance of an `AbstractValue`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TraceElem {
    /// A plain assignment at `Location`.
    Assign(Location),
    /// A symbolic value was assigned to `loc` at `Location` (spec's
    /// `make_symbolic`).
    SymAssign(bo_ir::Loc, Location),
    /// An array was declared/allocated at `Location`.
    ArrDecl(Location),
    /// The value came back from a call to `callee` (or an unresolved
    /// callee) at `Location`, with no summary to substitute.
    UnknownFrom(Option<ProcName>, Location),
    /// Wraps a callee's traces behind the call site that instantiated them,
    /// alongside whatever the caller had already accumulated there.
    Call(Location),
}

/// A join-semilattice set of `TraceElem`s.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TraceSet(HashSet<TraceElem>);

impl TraceSet {
    pub fn empty() -> Self {
        TraceSet(HashSet::new())
    }

    pub fn singleton(elem: TraceElem) -> Self {
        let mut s = HashSet::new();
        s.insert(elem);
        TraceSet(s)
    }

    pub fn add_elem(&self, elem: TraceElem) -> Self {
        let mut s = self.0.clone();
        s.insert(elem);
        TraceSet(s)
    }

    pub fn join(&self, other: &Self) -> Self {
        if std::ptr::eq(self, other) {
            return self.clone();
        }
        TraceSet(self.0.clone().union(other.0.clone()))
    }

    pub fn leq(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn widen(&self, other: &Self, _num_iters: usize) -> Self {
        self.join(other)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, elem: &TraceElem) -> bool {
        self.0.contains(elem)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraceElem> {
        self.0.iter()
    }

    /// Combine a callee's traces with the caller's at a call site:
    /// substitution (spec §4.1 `substitute`) wraps the callee's traces
    /// behind the call site and unions in whatever the caller already
    /// accumulated for the symbols being substituted.
    pub fn call(location: Location, caller: &TraceSet, callee: &TraceSet) -> TraceSet {
        let wrapped = callee.add_elem(TraceElem::Call(location));
        caller.join(&wrapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_union() {
        let loc = Location::new(1, 1);
        let a = TraceSet::singleton(TraceElem::Assign(loc));
        let b = TraceSet::singleton(TraceElem::ArrDecl(loc));
        let j = a.join(&b);
        assert_eq!(j.len(), 2);
        assert!(j.leq(&j));
        assert!(a.leq(&j));
        assert!(b.leq(&j));
    }

    #[test]
    fn call_wraps_callee_traces() {
        let loc = Location::new(2, 0);
        let caller = TraceSet::singleton(TraceElem::Assign(loc));
        let callee = TraceSet::singleton(TraceElem::UnknownFrom(None, loc));
        let combined = TraceSet::call(loc, &caller, &callee);
        assert!(combined.contains(&TraceElem::Assign(loc)));
        assert!(combined.contains(&TraceElem::Call(loc)));
    }
}
