use crate::loc::Loc;
use std::collections::BTreeSet;

/// A set of `Loc`s, with a top element `unknown` standing for "could point
/// anywhere". Used both as `AbstractValue::powloc` and as the target set of
/// writes (`ReachableMemory::update_mem`).
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PowLoc {
    /// A precise, finite set of locations.
    Set(BTreeSet<Loc>),
    /// Top: any location whatsoever.
    Unknown,
}

impl PowLoc {
    pub fn bot() -> Self {
        PowLoc::Set(BTreeSet::new())
    }

    pub fn empty() -> Self {
        Self::bot()
    }

    pub fn unknown() -> Self {
        PowLoc::Unknown
    }

    pub fn singleton(l: Loc) -> Self {
        let mut s = BTreeSet::new();
        s.insert(l);
        PowLoc::Set(s)
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, PowLoc::Set(s) if s.is_empty())
    }

    /// True for a non-empty, non-top set: the one case a write through this
    /// set could ever be a strong update.
    pub fn is_singleton_or_more(&self) -> bool {
        match self {
            PowLoc::Set(s) => !s.is_empty(),
            PowLoc::Unknown => true,
        }
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self, PowLoc::Set(s) if s.len() == 1)
    }

    pub fn singleton_elem(&self) -> Option<&Loc> {
        match self {
            PowLoc::Set(s) if s.len() == 1 => s.iter().next(),
            _ => None,
        }
    }

    pub fn add(&self, l: Loc) -> Self {
        match self {
            PowLoc::Unknown => PowLoc::Unknown,
            PowLoc::Set(s) => {
                let mut s = s.clone();
                s.insert(l);
                PowLoc::Set(s)
            }
        }
    }

    pub fn mem(&self, l: &Loc) -> bool {
        match self {
            PowLoc::Unknown => true,
            PowLoc::Set(s) => s.contains(l),
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (PowLoc::Unknown, _) | (_, PowLoc::Unknown) => PowLoc::Unknown,
            (PowLoc::Set(a), PowLoc::Set(b)) => PowLoc::Set(a.union(b).cloned().collect()),
        }
    }

    pub fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (_, PowLoc::Unknown) => true,
            (PowLoc::Unknown, _) => false,
            (PowLoc::Set(a), PowLoc::Set(b)) => a.is_subset(b),
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        self.union(other)
    }

    pub fn widen(&self, other: &Self, _num_iters: usize) -> Self {
        // Finite powerset lattice over a growing universe of locations: a
        // single join already stabilizes in practice, so widening is join.
        self.join(other)
    }

    pub fn fold<B>(&self, init: B, mut f: impl FnMut(B, &Loc) -> B) -> B
    where
        B: Clone,
    {
        match self {
            PowLoc::Unknown => init,
            PowLoc::Set(s) => s.iter().fold(init, |acc, l| f(acc, l)),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Loc> + '_> {
        match self {
            PowLoc::Unknown => Box::new(std::iter::empty()),
            PowLoc::Set(s) => Box::new(s.iter()),
        }
    }
}

impl Default for PowLoc {
    fn default() -> Self {
        PowLoc::bot()
    }
}

impl std::fmt::Display for PowLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowLoc::Unknown => write!(f, "{{<unknown>}}"),
            PowLoc::Set(s) => {
                write!(f, "{{")?;
                for (i, l) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", l)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_of_known_sets_is_precise() {
        let a = PowLoc::singleton(Loc::var("x"));
        let b = PowLoc::singleton(Loc::var("y"));
        let u = a.union(&b);
        assert!(u.mem(&Loc::var("x")));
        assert!(u.mem(&Loc::var("y")));
        assert!(!u.is_singleton());
    }

    #[test]
    fn unknown_absorbs_union() {
        let a = PowLoc::singleton(Loc::var("x"));
        assert_eq!(a.union(&PowLoc::unknown()), PowLoc::unknown());
    }

    #[test]
    fn leq_is_subset() {
        let a = PowLoc::singleton(Loc::var("x"));
        let ab = a.add(Loc::var("y"));
        assert!(a.leq(&ab));
        assert!(!ab.leq(&a));
    }
}
