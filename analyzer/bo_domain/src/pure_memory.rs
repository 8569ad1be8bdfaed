//! `PureMemory` (spec §3/§4.2): a finite map `Loc -> AbstractValue` with
//! lattice-map semantics (pointwise join of values at shared keys, union of
//! keys). Not every location carries an entry; `ReachableMemory` supplies
//! the read-default policy for absent keys (bottom on the stack, top on the
//! heap) — this map only stores what's actually been written.

use crate::value::AbstractValue;
use bo_ir::Loc;
use bo_polynomials::NonNegativePolynomial;
use im::HashMap;

#[derive(Clone, PartialEq, Debug, Default)]
pub struct PureMemory(HashMap<Loc, AbstractValue>);

impl PureMemory {
    pub fn empty() -> Self {
        PureMemory(HashMap::new())
    }

    pub fn find_opt(&self, l: &Loc) -> Option<&AbstractValue> {
        self.0.get(l)
    }

    pub fn insert(&self, l: Loc, v: AbstractValue) -> Self {
        let mut m = self.0.clone();
        m.insert(l, v);
        PureMemory(m)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Loc> {
        self.0.keys()
    }

    pub fn leq(&self, other: &Self) -> bool {
        self.0
            .iter()
            .all(|(k, v)| other.0.get(k).is_some_and(|ov| v.leq(ov)))
    }

    pub fn join(&self, other: &Self) -> Self {
        if std::ptr::eq(self, other) {
            return self.clone();
        }
        let mut out = self.0.clone();
        for (k, v) in other.0.iter() {
            out.entry(k.clone())
                .and_modify(|existing| *existing = existing.join(v))
                .or_insert_with(|| v.clone());
        }
        PureMemory(out)
    }

    pub fn widen(&self, other: &Self, num_iters: usize) -> Self {
        let mut out = self.0.clone();
        for (k, v) in other.0.iter() {
            match self.0.get(k) {
                Some(prev) => {
                    out.insert(k.clone(), prev.widen(v, num_iters));
                }
                None => {
                    out.insert(k.clone(), v.clone());
                }
            }
        }
        PureMemory(out)
    }

    /// Product, over every location passing `filter`, of the top-lifted
    /// polynomial range of that location's interval — used to bound loop
    /// trip counts (spec §4.2 `range`).
    pub fn range(&self, filter: impl Fn(&Loc) -> bool) -> NonNegativePolynomial {
        self.0
            .iter()
            .filter(|(l, _)| filter(l))
            .fold(NonNegativePolynomial::one(), |acc, (_, v)| {
                acc.mult(&NonNegativePolynomial::to_top_lifted_polynomial(
                    v.itv.range(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bo_itv::Itv;

    #[test]
    fn insert_then_find() {
        let m = PureMemory::empty().insert(Loc::var("x"), AbstractValue::of_int(3));
        assert_eq!(m.find_opt(&Loc::var("x")).unwrap().itv, Itv::of_int(3));
        assert!(m.find_opt(&Loc::var("y")).is_none());
    }

    #[test]
    fn join_merges_shared_keys() {
        let a = PureMemory::empty().insert(Loc::var("x"), AbstractValue::of_int(0));
        let b = PureMemory::empty().insert(Loc::var("x"), AbstractValue::of_int(5));
        let j = a.join(&b);
        assert_eq!(
            j.find_opt(&Loc::var("x")).unwrap().itv,
            Itv::of_int(0).join(&Itv::of_int(5))
        );
    }

    #[test]
    fn range_multiplies_concrete_ranges() {
        let m = PureMemory::empty()
            .insert(Loc::var("i"), AbstractValue::of_interval(Itv::of_int(0).join(&Itv::of_int(3)), None))
            .insert(Loc::var("j"), AbstractValue::of_interval(Itv::of_int(0).join(&Itv::of_int(1)), None));
        let p = m.range(|_| true);
        assert!(!p.is_top());
    }
}
