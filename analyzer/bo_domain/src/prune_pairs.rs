//! `PrunePairs` (spec §3/§4.4): the refinements a single branch condition
//! applies to each location it mentions, recorded so they can be replayed
//! against memory at the branch target (`Memory::apply_latest_prune`).
//!
//! The map is inverted relative to a plain `Loc -> AbstractValue` map: an
//! absent key means "no information", so *more* entries is *more* precise
//! and therefore *smaller* in the lattice order, with the empty map as top.
//! Spec §4.4 calls the binary operation that respects this order "meet";
//! because it is computed by pointwise-joining the `AbstractValue`s at
//! shared keys and dropping anything not shared, it is written here as
//! `join` to keep the uniform `leq`/`join`/`widen` vocabulary every other
//! sub-lattice in this crate uses — the name describes the implementation,
//! not which end of the order it moves towards.

use crate::value::AbstractValue;
use bo_ir::Loc;
use im::HashMap;

#[derive(Clone, PartialEq, Debug, Default)]
pub struct PrunePairs(HashMap<Loc, AbstractValue>);

impl PrunePairs {
    /// The empty map: top, "nothing pruned yet".
    pub fn top() -> Self {
        PrunePairs(HashMap::new())
    }

    pub fn find_opt(&self, l: &Loc) -> Option<&AbstractValue> {
        self.0.get(l)
    }

    pub fn add(&self, l: Loc, v: AbstractValue) -> Self {
        let mut m = self.0.clone();
        m.insert(l, v);
        PrunePairs(m)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Loc> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Loc, &AbstractValue)> {
        self.0.iter()
    }

    /// `self <= other` iff `self` has at least every key `other` has, with
    /// at-least-as-precise values — the inverted map order (more entries,
    /// tighter values, is lower).
    pub fn leq(&self, other: &Self) -> bool {
        other
            .0
            .iter()
            .all(|(k, ov)| self.0.get(k).is_some_and(|v| v.leq(ov)))
    }

    /// Keep only keys present in both, pointwise-joining their values
    /// (spec §4.4's "meet" — see module docs for the naming note).
    pub fn join(&self, other: &Self) -> Self {
        if std::ptr::eq(self, other) {
            return self.clone();
        }
        let mut out = HashMap::new();
        for (k, v) in self.0.iter() {
            if let Some(ov) = other.0.get(k) {
                out.insert(k.clone(), v.join(ov));
            }
        }
        PrunePairs(out)
    }

    pub fn widen(&self, other: &Self, _num_iters: usize) -> Self {
        self.join(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_is_empty() {
        assert!(PrunePairs::top().is_empty());
    }

    #[test]
    fn join_keeps_only_shared_keys() {
        let a = PrunePairs::top()
            .add(Loc::var("x"), AbstractValue::of_int(0))
            .add(Loc::var("y"), AbstractValue::of_int(1));
        let b = PrunePairs::top().add(Loc::var("x"), AbstractValue::of_int(5));
        let j = a.join(&b);
        assert!(j.find_opt(&Loc::var("y")).is_none());
        assert!(j.find_opt(&Loc::var("x")).is_some());
    }

    #[test]
    fn leq_respects_inverted_order() {
        let empty = PrunePairs::top();
        let refined = PrunePairs::top().add(Loc::var("x"), AbstractValue::of_int(0));
        assert!(refined.leq(&empty));
        assert!(!empty.leq(&refined));
    }
}
