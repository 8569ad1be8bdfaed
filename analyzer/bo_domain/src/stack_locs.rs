//! `StackLocSet` (spec §3/§4.6): the set of locations known to live on the
//! current frame's stack. Membership drives `ReachableMemory`'s
//! read-default (`find_stack` vs `find_heap`) and strong-update policy.

use bo_ir::Loc;
use im::HashSet;

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct StackLocSet(HashSet<Loc>);

impl StackLocSet {
    pub fn empty() -> Self {
        StackLocSet(HashSet::new())
    }

    pub fn contains(&self, l: &Loc) -> bool {
        self.0.contains(l)
    }

    pub fn insert(&self, l: Loc) -> Self {
        let mut s = self.0.clone();
        s.insert(l);
        StackLocSet(s)
    }

    pub fn leq(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn join(&self, other: &Self) -> Self {
        if std::ptr::eq(self, other) {
            return self.clone();
        }
        StackLocSet(self.0.clone().union(other.0.clone()))
    }

    pub fn widen(&self, other: &Self, _num_iters: usize) -> Self {
        self.join(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_contains() {
        let s = StackLocSet::empty().insert(Loc::var("x"));
        assert!(s.contains(&Loc::var("x")));
        assert!(!s.contains(&Loc::var("y")));
    }

    #[test]
    fn join_is_union() {
        let a = StackLocSet::empty().insert(Loc::var("x"));
        let b = StackLocSet::empty().insert(Loc::var("y"));
        let j = a.join(&b);
        assert!(j.contains(&Loc::var("x")));
        assert!(j.contains(&Loc::var("y")));
        assert!(a.leq(&j));
        assert!(b.leq(&j));
    }
}
