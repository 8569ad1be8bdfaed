//! Per-allocation-site array descriptors (spec §6's external `ArrayBlk`):
//! for every `Allocsite` an array pointer may denote, the stride, the
//! offset interval (how far into the array), and the size interval.
//!
//! Declared out of scope by spec §1 alongside `Itv`; implemented here as
//! the concrete collaborator `bo_domain::AbstractValue::arrayblk` is built
//! on.

use bo_ir::{Allocsite, Loc, PowLoc};
use bo_itv::{CompOp, Itv};
use bo_symtab::SymbolSet;
use std::collections::BTreeMap;

/// The per-allocation-site record: `stride` is the element size, `offset`
/// how far a pointer into this array currently sits, `size` the array's
/// total length — all three as intervals, since a single allocation site
/// reached through a loop or recursion may have summarized several
/// concrete arrays.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ArrayInfo {
    pub offset: Itv,
    pub size: Itv,
    pub stride: Itv,
}

impl ArrayInfo {
    fn leq(&self, other: &Self) -> bool {
        self.offset.leq(&other.offset) && self.size.leq(&other.size) && self.stride.leq(&other.stride)
    }

    fn join(&self, other: &Self) -> Self {
        ArrayInfo {
            offset: self.offset.join(&other.offset),
            size: self.size.join(&other.size),
            stride: self.stride.join(&other.stride),
        }
    }

    fn widen(&self, other: &Self, num_iters: usize) -> Self {
        ArrayInfo {
            offset: self.offset.widen(&other.offset, num_iters),
            size: self.size.widen(&other.size, num_iters),
            stride: self.stride.widen(&other.stride, num_iters),
        }
    }

    fn is_bot(&self) -> bool {
        self.offset.is_bot() || self.size.is_bot()
    }
}

/// `bot ⊔ Map(...) ⊔ Unknown`: an empty map is bottom (no allocation site
/// reachable through this value); `Unknown` is top ("could be any array,
/// with any offset/size").
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ArrayBlk {
    Map(BTreeMap<Allocsite, ArrayInfo>),
    Unknown,
}

impl ArrayBlk {
    pub fn bot() -> Self {
        ArrayBlk::Map(BTreeMap::new())
    }

    pub fn unknown() -> Self {
        ArrayBlk::Unknown
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, ArrayBlk::Map(m) if m.is_empty())
    }

    /// Build a value pointing only at `allocsite`, with the given offset
    /// and size; `stride` defaults to the natural-number interval when
    /// unknown (spec §4.1's `of_array_alloc`).
    pub fn make(allocsite: Allocsite, offset: Itv, size: Itv, stride: Option<Itv>) -> Self {
        let mut m = BTreeMap::new();
        m.insert(
            allocsite,
            ArrayInfo {
                offset,
                size,
                stride: stride.unwrap_or_else(Itv::nat),
            },
        );
        ArrayBlk::Map(m)
    }

    pub fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (_, ArrayBlk::Unknown) => true,
            (ArrayBlk::Unknown, _) => false,
            (ArrayBlk::Map(a), ArrayBlk::Map(b)) => a
                .iter()
                .all(|(k, v)| b.get(k).is_some_and(|bv| v.leq(bv))),
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (ArrayBlk::Unknown, _) | (_, ArrayBlk::Unknown) => ArrayBlk::Unknown,
            (ArrayBlk::Map(a), ArrayBlk::Map(b)) => {
                let mut out = a.clone();
                for (k, v) in b {
                    out.entry(k.clone())
                        .and_modify(|existing| *existing = existing.join(v))
                        .or_insert_with(|| v.clone());
                }
                ArrayBlk::Map(out)
            }
        }
    }

    pub fn widen(&self, other: &Self, num_iters: usize) -> Self {
        match (self, other) {
            (ArrayBlk::Unknown, _) | (_, ArrayBlk::Unknown) => ArrayBlk::Unknown,
            (ArrayBlk::Map(a), ArrayBlk::Map(b)) => {
                let mut out = BTreeMap::new();
                for (k, v) in b {
                    match a.get(k) {
                        Some(prev) => {
                            out.insert(k.clone(), prev.widen(v, num_iters));
                        }
                        None => {
                            out.insert(k.clone(), v.clone());
                        }
                    }
                }
                for (k, v) in a {
                    out.entry(k.clone()).or_insert_with(|| v.clone());
                }
                ArrayBlk::Map(out)
            }
        }
    }

    /// Drop entries whose offset or size interval collapsed to bottom.
    pub fn normalize(self) -> Self {
        match self {
            ArrayBlk::Unknown => ArrayBlk::Unknown,
            ArrayBlk::Map(m) => {
                ArrayBlk::Map(m.into_iter().filter(|(_, v)| !v.is_bot()).collect())
            }
        }
    }

    pub fn set_length(&self, len: &Itv) -> Self {
        self.map_fields(|info| ArrayInfo {
            size: len.clone(),
            ..info.clone()
        })
    }

    pub fn set_stride(&self, new_stride: &Itv) -> Self {
        self.map_fields(|info| {
            if &info.stride == new_stride {
                info.clone()
            } else {
                ArrayInfo {
                    stride: new_stride.clone(),
                    ..info.clone()
                }
            }
        })
    }

    pub fn strideof(&self) -> Itv {
        self.fold_itv(Itv::bot(), |acc, info| acc.join(&info.stride))
    }

    /// The locations an array value's elements occupy — one `Loc` per
    /// reachable allocation site — used by `get_all_locs` (spec §3.1).
    pub fn get_pow_loc(&self) -> PowLoc {
        match self {
            ArrayBlk::Unknown => PowLoc::unknown(),
            ArrayBlk::Map(m) => m
                .keys()
                .fold(PowLoc::bot(), |acc, a| acc.add(Loc::allocsite(a.clone()))),
        }
    }

    pub fn get_symbols(&self) -> SymbolSet {
        let mut out = SymbolSet::new();
        if let ArrayBlk::Map(m) = self {
            for info in m.values() {
                out.extend(info.offset.get_symbols());
                out.extend(info.size.get_symbols());
            }
        }
        out
    }

    pub fn plus_offset(&self, i: &Itv) -> Self {
        self.map_fields(|info| ArrayInfo {
            offset: info.offset.plus(i),
            ..info.clone()
        })
    }

    pub fn minus_offset(&self, i: &Itv) -> Self {
        self.map_fields(|info| ArrayInfo {
            offset: info.offset.minus(i),
            ..info.clone()
        })
    }

    /// Pointer difference: the offset delta between two descriptors that
    /// share at least one allocation site. Unrelated arrays (no common
    /// site, or either side `Unknown`) yield top — the domain has no way
    /// to relate their offsets.
    pub fn diff(&self, other: &Self) -> Itv {
        match (self, other) {
            (ArrayBlk::Map(a), ArrayBlk::Map(b)) => {
                let mut acc = Itv::bot();
                let mut any = false;
                for (k, v) in a {
                    if let Some(w) = b.get(k) {
                        any = true;
                        acc = acc.join(&v.offset.minus(&w.offset));
                    }
                }
                if any {
                    acc
                } else {
                    Itv::top()
                }
            }
            _ => Itv::top(),
        }
    }

    /// Refine every entry's `size` by `op` against `other` — used when a
    /// pruned condition relates an array's offset to its size (e.g. a
    /// bounds check `idx < arr.length`); see spec §4.1.
    pub fn prune_comp(&self, op: CompOp, other: &Itv) -> Self {
        self.map_fields_normalize(|info| ArrayInfo {
            size: info.size.prune_comp(op, other),
            ..info.clone()
        })
    }

    pub fn prune_eq(&self, other: &Itv) -> Self {
        self.map_fields_normalize(|info| ArrayInfo {
            size: info.size.prune_eq(other),
            ..info.clone()
        })
    }

    pub fn prune_ne(&self, other: &Itv) -> Self {
        self.map_fields_normalize(|info| ArrayInfo {
            size: info.size.prune_ne(other),
            ..info.clone()
        })
    }

    pub fn subst(&self, eval: &impl Fn(&bo_symtab::Symbol) -> Itv) -> Self {
        self.map_fields(|info| ArrayInfo {
            offset: info.offset.subst(eval),
            size: info.size.subst(eval),
            stride: info.stride.clone(),
        })
        .normalize()
    }

    fn map_fields(&self, f: impl Fn(&ArrayInfo) -> ArrayInfo) -> Self {
        match self {
            ArrayBlk::Unknown => ArrayBlk::Unknown,
            ArrayBlk::Map(m) => ArrayBlk::Map(m.iter().map(|(k, v)| (k.clone(), f(v))).collect()),
        }
    }

    fn map_fields_normalize(&self, f: impl Fn(&ArrayInfo) -> ArrayInfo) -> Self {
        self.map_fields(f).normalize()
    }

    fn fold_itv(&self, init: Itv, f: impl Fn(Itv, &ArrayInfo) -> Itv) -> Itv {
        match self {
            ArrayBlk::Unknown => Itv::top(),
            ArrayBlk::Map(m) => m.values().fold(init, f),
        }
    }
}

impl std::fmt::Display for ArrayBlk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayBlk::Unknown => write!(f, "<unknown array>"),
            ArrayBlk::Map(m) => {
                write!(f, "{{")?;
                for (i, (a, info)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(
                        f,
                        "{} -> (offset={}, size={}, stride={})",
                        a, info.offset, info.size, info.stride
                    )?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(tag: &str) -> Allocsite {
        Allocsite::new(tag)
    }

    #[test]
    fn make_defaults_stride_to_nat() {
        let blk = ArrayBlk::make(site("a"), Itv::of_int(0), Itv::of_int(10), None);
        assert_eq!(blk.strideof(), Itv::nat());
    }

    #[test]
    fn plus_offset_shifts_range() {
        let blk = ArrayBlk::make(site("a"), Itv::of_int(0), Itv::of_int(10), Some(Itv::of_int(4)));
        let shifted = blk.plus_offset(&Itv::of_int(3));
        if let ArrayBlk::Map(m) = &shifted {
            assert_eq!(m[&site("a")].offset, Itv::of_int(3));
        } else {
            panic!("expected Map");
        }
    }

    #[test]
    fn set_length_replaces_size() {
        let blk = ArrayBlk::make(site("a"), Itv::of_int(0), Itv::of_int(10), None);
        let grown = blk.set_length(&Itv::of_int(20));
        if let ArrayBlk::Map(m) = &grown {
            assert_eq!(m[&site("a")].size, Itv::of_int(20));
        } else {
            panic!("expected Map");
        }
    }

    #[test]
    fn diff_of_unrelated_sites_is_top() {
        let a = ArrayBlk::make(site("a"), Itv::of_int(0), Itv::of_int(10), None);
        let b = ArrayBlk::make(site("b"), Itv::of_int(0), Itv::of_int(10), None);
        assert_eq!(a.diff(&b), Itv::top());
    }

    #[test]
    fn join_of_disjoint_sites_keeps_both() {
        let a = ArrayBlk::make(site("a"), Itv::of_int(0), Itv::of_int(10), None);
        let b = ArrayBlk::make(site("b"), Itv::of_int(0), Itv::of_int(10), None);
        let j = a.join(&b);
        if let ArrayBlk::Map(m) = &j {
            assert_eq!(m.len(), 2);
        } else {
            panic!("expected Map");
        }
        assert!(a.leq(&j));
        assert!(b.leq(&j));
    }

    #[test]
    fn unknown_is_top() {
        let a = ArrayBlk::make(site("a"), Itv::of_int(0), Itv::of_int(10), None);
        assert!(a.leq(&ArrayBlk::unknown()));
        assert_eq!(a.join(&ArrayBlk::unknown()), ArrayBlk::unknown());
    }

    #[test]
    fn get_pow_loc_has_one_loc_per_site() {
        let a = ArrayBlk::make(site("a"), Itv::of_int(0), Itv::of_int(10), None);
        let locs = a.get_pow_loc();
        assert!(locs.mem(&Loc::allocsite(site("a"))));
        assert!(locs.is_singleton());
    }
}
