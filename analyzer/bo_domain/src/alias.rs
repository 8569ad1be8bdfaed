//! `AliasTarget` / `AliasMap` / `AliasReturn` / `Alias` (spec §3/§4.3): the
//! map from SSA temporary to the program-variable location it currently
//! stands for, used to relate a boolean temporary back to the program
//! variable a pruning refined, or a return-slot alias back to the formal it
//! came from.

use crate::value::AbstractValue;
use bo_ir::{Exp, Ident, Loc};
use im::HashMap;

/// "This temporary holds the current value of `loc`", or (for `empty()`
/// style container queries) "this temporary equals 1 iff `loc` is
/// logically empty". A flat lattice: `x <= y` iff `x == y`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AliasTarget {
    Simple(Loc),
    Empty(Loc),
}

impl AliasTarget {
    pub fn leq(&self, other: &Self) -> bool {
        self == other
    }

    /// The flat lattice's join is defined only on equal operands (spec
    /// §4.3/§7: a precondition violation otherwise, which a well-behaved
    /// caller never triggers because `AliasMap::join` only ever calls this
    /// on keys it has already checked are equal).
    pub fn join(&self, other: &Self) -> Self {
        assert_eq!(self, other, "AliasTarget::join requires equal operands");
        self.clone()
    }

    /// The location(s) this target's condition is actually about — `loc`
    /// for both variants — used by `AliasMap::store`'s "mentions `loc`"
    /// invalidation rule.
    fn mentions(&self) -> &Loc {
        match self {
            AliasTarget::Simple(l) | AliasTarget::Empty(l) => l,
        }
    }
}

/// `Ident -> AliasTarget` (spec §4.3). The order is the inverse of a plain
/// map's: more entries means more is known, so a bigger map is *smaller* in
/// the lattice. `join` therefore keeps only the keys both sides agree on
/// (dropping anything present in just one side, or mapped to different
/// targets in both, rather than ever calling `AliasTarget::join` on unequal
/// operands).
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct AliasMap(HashMap<Ident, AliasTarget>);

impl AliasMap {
    pub fn empty() -> Self {
        AliasMap(HashMap::new())
    }

    pub fn find(&self, id: &Ident) -> Option<&AliasTarget> {
        self.0.get(id)
    }

    /// Bind `id -> target` (spec's `load`).
    pub fn load(&self, id: Ident, target: AliasTarget) -> Self {
        let mut m = self.0.clone();
        m.insert(id, target);
        AliasMap(m)
    }

    /// Drop every binding whose target mentions `loc` — the post-write
    /// invalidation rule every store performs (spec §3.3's `AliasMap`
    /// invariant).
    pub fn store(&self, loc: &Loc) -> Self {
        AliasMap(
            self.0
                .iter()
                .filter(|(_, target)| target.mentions() != loc)
                .map(|(id, target)| (id.clone(), target.clone()))
                .collect(),
        )
    }

    pub fn remove_temp(&self, id: &Ident) -> Self {
        let mut m = self.0.clone();
        m.remove(id);
        AliasMap(m)
    }

    pub fn leq(&self, other: &Self) -> bool {
        other.0.iter().all(|(k, v)| self.0.get(k) == Some(v))
    }

    pub fn join(&self, other: &Self) -> Self {
        if std::ptr::eq(self, other) {
            return self.clone();
        }
        AliasMap(
            self.0
                .iter()
                .filter_map(|(k, v)| match other.0.get(k) {
                    Some(ov) if ov == v => Some((k.clone(), v.clone())),
                    _ => None,
                })
                .collect(),
        )
    }

    pub fn widen(&self, other: &Self, _num_iters: usize) -> Self {
        self.join(other)
    }
}

/// Flat lattice over `AliasTarget`, bottom-lifted: holds the alias attached
/// to the procedure's return slot (spec §3.3 `AliasReturn`).
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct AliasReturn(Option<AliasTarget>);

impl AliasReturn {
    pub fn bot() -> Self {
        AliasReturn(None)
    }

    pub fn of_target(t: AliasTarget) -> Self {
        AliasReturn(Some(t))
    }

    pub fn get(&self) -> Option<&AliasTarget> {
        self.0.as_ref()
    }

    pub fn leq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a == b,
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        match (&self.0, &other.0) {
            (None, x) | (x, None) => AliasReturn(x.clone()),
            (Some(a), Some(b)) if a == b => AliasReturn(Some(a.clone())),
            _ => AliasReturn(None),
        }
    }

    pub fn widen(&self, other: &Self, _num_iters: usize) -> Self {
        self.join(other)
    }
}

/// `{ map, ret }` (spec §3.3 `Alias`).
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Alias {
    pub map: AliasMap,
    pub ret: AliasReturn,
}

impl Alias {
    pub fn empty() -> Self {
        Alias {
            map: AliasMap::empty(),
            ret: AliasReturn::bot(),
        }
    }

    pub fn leq(&self, other: &Self) -> bool {
        self.map.leq(&other.map) && self.ret.leq(&other.ret)
    }

    pub fn join(&self, other: &Self) -> Self {
        Alias {
            map: self.map.join(&other.map),
            ret: self.ret.join(&other.ret),
        }
    }

    pub fn widen(&self, other: &Self, num_iters: usize) -> Self {
        Alias {
            map: self.map.widen(&other.map, num_iters),
            ret: self.ret.widen(&other.ret, num_iters),
        }
    }

    /// Store through `loc`, invalidating aliases that mention it; when
    /// `loc` is the return slot and `expr` is a temporary the (pre-store)
    /// map says is `Simple(l)`, also set the return alias to `Simple(l)`
    /// (spec §4.3 `store_simple`).
    pub fn store_simple(&self, loc: &Loc, expr: &Exp) -> Self {
        let new_map = self.map.store(loc);
        let new_ret = if loc == &Loc::ret() {
            match expr {
                Exp::Var(id) => match self.map.find(id) {
                    Some(AliasTarget::Simple(l)) => AliasReturn::of_target(AliasTarget::Simple(l.clone())),
                    _ => self.ret.clone(),
                },
                _ => self.ret.clone(),
            }
        } else {
            self.ret.clone()
        };
        Alias {
            map: new_map,
            ret: new_ret,
        }
    }

    /// Store through `loc`; when `formal`'s reachable locations collapse to
    /// a single `l`, also set the return alias to `Empty(l)` (spec §4.3
    /// `store_empty`, modeling an `empty()`-style API result).
    pub fn store_empty(&self, formal: &AbstractValue, loc: &Loc) -> Self {
        let new_map = self.map.store(loc);
        let new_ret = match formal.get_all_locs().singleton_elem() {
            Some(l) => AliasReturn::of_target(AliasTarget::Empty(l.clone())),
            None => self.ret.clone(),
        };
        Alias {
            map: new_map,
            ret: new_ret,
        }
    }

    pub fn remove_temp(&self, id: &Ident) -> Self {
        Alias {
            map: self.map.remove_temp(id),
            ret: self.ret.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bo_utils::idx::Idx;

    #[test]
    fn store_invalidates_bindings_mentioning_loc() {
        let l = Loc::var("x");
        let id = Ident::new(0);
        let m = AliasMap::empty().load(id, AliasTarget::Simple(l.clone()));
        assert!(m.find(&id).is_some());
        let m2 = m.store(&l);
        assert!(m2.find(&id).is_none());
    }

    #[test]
    fn store_after_load_same_as_direct_store() {
        let l = Loc::var("x");
        let id = Ident::new(7);
        let base = AliasMap::empty();
        let loaded = base.load(id, AliasTarget::Simple(l.clone()));
        assert_eq!(loaded.store(&l), base.store(&l));
    }

    #[test]
    fn join_keeps_only_agreeing_keys() {
        let l = Loc::var("x");
        let id = Ident::new(1);
        let a = AliasMap::empty().load(id, AliasTarget::Simple(l.clone()));
        let b = AliasMap::empty().load(id, AliasTarget::Simple(Loc::var("y")));
        let j = a.join(&b);
        assert!(j.find(&id).is_none());
        let c = AliasMap::empty().load(id, AliasTarget::Simple(l));
        let j2 = a.join(&c);
        assert!(j2.find(&id).is_some());
    }

    #[test]
    fn store_simple_sets_return_alias() {
        let id = Ident::new(2);
        let target_loc = Loc::var("container");
        let alias = Alias::empty().map.load(id, AliasTarget::Simple(target_loc.clone()));
        let alias = Alias {
            map: alias,
            ret: AliasReturn::bot(),
        };
        let stored = alias.store_simple(&Loc::ret(), &Exp::Var(id));
        assert_eq!(stored.ret.get(), Some(&AliasTarget::Simple(target_loc)));
    }

    #[test]
    #[should_panic]
    fn alias_target_join_panics_on_unequal_operands() {
        AliasTarget::Simple(Loc::var("x")).join(&AliasTarget::Simple(Loc::var("y")));
    }
}
