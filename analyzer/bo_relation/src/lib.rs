//! The relational-constraints engine (spec §6's external `Relation`):
//! linear relations between the offset/size symbols of locations and
//! allocation sites, strong enough to discharge bounds checks like
//! `idx < arr.length` that the purely-interval part of the domain can't
//! see because `idx` and `arr.length` are different abstract locations.
//!
//! Declared out of scope by spec §1; gated process-wide by
//! `bo_config::Config::relational_domain_enabled` — `bo_domain` skips every
//! call into this crate when the flag is off (spec §6: "affects printing
//! only" is the spec's own minimum bar, but skipping the work entirely is a
//! valid, sound strengthening since an empty relation store is always a
//! safe over-approximation).
//!
//! Represented as a sparse difference-bound matrix: each tracked pair of
//! symbols `(a, b)` carries the tightest known bound on `a - b`, with a
//! distinguished `Zero` vertex standing in for the constant `0` so unary
//! bounds (`x >= 0`) fit the same two-variable-difference shape as binary
//! ones (`offset < size`).

use bo_ir::{Allocsite, Loc, PowLoc};
use num_bigint::BigInt;
use std::collections::BTreeMap;

/// The symbolic term a constraint can be written in terms of.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum SymVar {
    /// The relational symbol naming a location's current value.
    Loc(Loc),
    /// The relational symbol naming a location's array offset.
    LocOffset(Loc),
    /// The relational symbol naming a location's array size.
    LocSize(Loc),
    /// The relational symbol naming an allocation site's offset, before a
    /// value has been stored to any location pointing at it.
    AllocOffset(Allocsite),
    /// The relational symbol naming an allocation site's size.
    AllocSize(Allocsite),
}

/// A symbol in the relation engine's own small lattice: `Bot` (no symbol —
/// the constraint this term appeared in should be dropped), a concrete
/// `Var`, the constant-zero vertex, or `Top` (an unconstrained symbol about
/// which nothing may be assumed).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Sym {
    Bot,
    Top,
    Zero,
    Var(SymVar),
}

impl Sym {
    pub fn of_loc(l: Loc) -> Self {
        Sym::Var(SymVar::Loc(l))
    }

    pub fn of_loc_offset(l: Loc) -> Self {
        Sym::Var(SymVar::LocOffset(l))
    }

    pub fn of_loc_size(l: Loc) -> Self {
        Sym::Var(SymVar::LocSize(l))
    }

    pub fn of_allocsite_offset(a: Allocsite) -> Self {
        Sym::Var(SymVar::AllocOffset(a))
    }

    pub fn of_allocsite_size(a: Allocsite) -> Self {
        Sym::Var(SymVar::AllocSize(a))
    }

    pub fn bot() -> Self {
        Sym::Bot
    }

    pub fn top() -> Self {
        Sym::Top
    }

    pub fn get_var(&self) -> Option<&SymVar> {
        match self {
            Sym::Var(v) => Some(v),
            _ => None,
        }
    }

    pub fn leq(&self, other: &Self) -> bool {
        self == other || matches!(self, Sym::Bot) || matches!(other, Sym::Top)
    }

    /// Two distinct variables join to `Top`: the engine can't name "either
    /// of these two symbols" as one term, so it gives up precision rather
    /// than invent a third symbol.
    pub fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a.clone(),
            (Sym::Bot, x) | (x, Sym::Bot) => x.clone(),
            _ => Sym::Top,
        }
    }
}

impl std::fmt::Display for Sym {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sym::Bot => write!(f, "bot"),
            Sym::Top => write!(f, "top"),
            Sym::Zero => write!(f, "0"),
            Sym::Var(SymVar::Loc(l)) => write!(f, "val({})", l),
            Sym::Var(SymVar::LocOffset(l)) => write!(f, "off({})", l),
            Sym::Var(SymVar::LocSize(l)) => write!(f, "size({})", l),
            Sym::Var(SymVar::AllocOffset(a)) => write!(f, "off({})", a),
            Sym::Var(SymVar::AllocSize(a)) => write!(f, "size({})", a),
        }
    }
}

/// A linear symbolic expression `coeff * sym + offset`, used where the
/// front-end can supply more than "this location's size symbol" — e.g. an
/// array declared `n * 4` bytes wide (spec §6's optional `SymExp`).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SymExp {
    pub coeff: BigInt,
    pub sym: Sym,
    pub offset: BigInt,
}

impl SymExp {
    pub fn of_sym(sym: Sym) -> Self {
        SymExp {
            coeff: BigInt::from(1),
            sym,
            offset: BigInt::from(0),
        }
    }
}

/// Renames symbols from a callee's vocabulary into the caller's, applied
/// during `instantiate` when a call site's summary is substituted in.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct SubstMap(BTreeMap<Sym, Sym>);

impl SubstMap {
    pub fn empty() -> Self {
        SubstMap(BTreeMap::new())
    }

    pub fn insert(&mut self, callee: Sym, caller: Sym) {
        self.0.insert(callee, caller);
    }

    pub fn get(&self, callee: &Sym) -> Option<&Sym> {
        self.0.get(callee)
    }
}

/// One tracked bound: `a - b <= bound`.
type Edge = (Sym, Sym);

/// The constraint store proper: a sparse difference-bound matrix. Absent
/// edges mean "no known bound" (equivalent to `+inf`), which is the
/// identity for `meet` (tightening) and the top element of the store's own
/// lattice.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Constraints {
    bounds: BTreeMap<Edge, BigInt>,
}

impl Constraints {
    fn tighten(&mut self, a: Sym, b: Sym, bound: BigInt) {
        if a == Sym::Bot || b == Sym::Bot || a == Sym::Top || b == Sym::Top {
            return;
        }
        let key = (a, b);
        match self.bounds.get(&key) {
            Some(existing) if existing <= &bound => {}
            _ => {
                self.bounds.insert(key, bound);
            }
        }
    }

    /// One round of 2-hop closure (`a-c <= a-b + b-c`) over the edges just
    /// touched; sufficient for the acyclic, shallow constraint graphs this
    /// analysis produces (chains of `offset < size`, `idx <= offset`,
    /// parameter equalities) without paying for full Floyd–Warshall.
    fn close_from(&mut self, touched: &[Edge]) {
        let snapshot: Vec<(Edge, BigInt)> =
            self.bounds.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        for (a, b) in touched {
            for ((x, y), xy) in &snapshot {
                if y == a {
                    if let Some(bc) = self.bounds.get(&(a.clone(), b.clone())) {
                        self.tighten(x.clone(), b.clone(), xy + bc);
                    }
                }
                if x == b {
                    if let Some(ab) = self.bounds.get(&(a.clone(), b.clone())) {
                        self.tighten(a.clone(), y.clone(), ab + xy);
                    }
                }
            }
        }
    }

    /// A negative self-loop (`a - a <= c < 0`) witnesses inconsistency.
    fn has_negative_cycle(&self) -> bool {
        self.bounds
            .iter()
            .any(|((a, b), c)| a == b && c < &BigInt::from(0))
            || self.bounds.iter().any(|((a, b), ab)| {
                self.bounds
                    .get(&(b.clone(), a.clone()))
                    .is_some_and(|ba| ab + ba < BigInt::from(0))
            })
    }
}

/// The bottom-lifted constraint store: `Bot` models an unreachable /
/// provably-inconsistent state.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Relation {
    Bot,
    NonBot(Constraints),
}

impl Relation {
    pub fn bot() -> Self {
        Relation::Bot
    }

    pub fn empty() -> Self {
        Relation::NonBot(Constraints::default())
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Relation::Bot)
    }

    /// `true` when the store is unreachable, either because it already is
    /// `Bot` or because its constraints admit no solution.
    pub fn is_unsat(&self) -> bool {
        match self {
            Relation::Bot => true,
            Relation::NonBot(c) => c.has_negative_cycle(),
        }
    }

    pub fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (Relation::Bot, _) => true,
            (_, Relation::Bot) => false,
            (Relation::NonBot(a), Relation::NonBot(b)) => b
                .bounds
                .iter()
                .all(|(k, bv)| a.bounds.get(k).is_some_and(|av| av <= bv)),
        }
    }

    /// Join keeps only bounds present (and implied) on both sides, each
    /// relaxed to the looser of the two — the standard DBM join.
    pub fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Relation::Bot, x) | (x, Relation::Bot) => x.clone(),
            (Relation::NonBot(a), Relation::NonBot(b)) => {
                let mut out = BTreeMap::new();
                for (k, av) in &a.bounds {
                    if let Some(bv) = b.bounds.get(k) {
                        out.insert(k.clone(), av.max(bv).clone());
                    }
                }
                Relation::NonBot(Constraints { bounds: out })
            }
        }
    }

    /// Widening drops any bound that grew looser between iterations,
    /// matching the finite-height discipline every other sub-lattice in
    /// this domain uses.
    pub fn widen(&self, other: &Self, _num_iters: usize) -> Self {
        match (self, other) {
            (Relation::Bot, x) | (x, Relation::Bot) => x.clone(),
            (Relation::NonBot(a), Relation::NonBot(b)) => {
                let mut out = BTreeMap::new();
                for (k, av) in &a.bounds {
                    if let Some(bv) = b.bounds.get(k) {
                        if bv <= av {
                            out.insert(k.clone(), av.clone());
                        }
                    }
                }
                Relation::NonBot(Constraints { bounds: out })
            }
        }
    }

    /// Tighten the store with `sym_a - sym_b <= bound` for every
    /// constraint in `cs`, propagating one round of transitive closure;
    /// returns `Bot` if the result is inconsistent.
    pub fn meet_constraints(&self, cs: &[(Sym, Sym, BigInt)]) -> Self {
        let mut c = match self {
            Relation::Bot => return Relation::Bot,
            Relation::NonBot(c) => c.clone(),
        };
        let mut touched = Vec::with_capacity(cs.len());
        for (a, b, bound) in cs {
            c.tighten(a.clone(), b.clone(), bound.clone());
            touched.push((a.clone(), b.clone()));
        }
        c.close_from(&touched);
        if c.has_negative_cycle() {
            Relation::Bot
        } else {
            Relation::NonBot(c)
        }
    }

    /// Record that every location in `locs` currently carries value symbol
    /// `sym_val`, offset symbol `sym_off`, and size symbol `sym_size` — an
    /// equality between each location's own symbols and the shared triple
    /// (spec §4.6 `store_relation`).
    pub fn store_relation(&self, locs: &PowLoc, sym_val: &Sym, sym_off: &Sym, sym_size: &Sym) -> Self {
        let mut cs = Vec::new();
        locs.fold((), |(), l| {
            let triples = [
                (Sym::of_loc(l.clone()), sym_val.clone()),
                (Sym::of_loc_offset(l.clone()), sym_off.clone()),
                (Sym::of_loc_size(l.clone()), sym_size.clone()),
            ];
            for (loc_sym, shared) in triples {
                cs.push((loc_sym.clone(), shared.clone(), BigInt::from(0)));
                cs.push((shared, loc_sym, BigInt::from(0)));
            }
        });
        self.meet_constraints(&cs)
    }

    /// Drop every constraint mentioning any of `locs`'s value/offset/size
    /// symbols — called whenever those locations are written, since their
    /// old relational facts no longer hold (spec §4.6 `forget_locs`).
    pub fn forget_locs(&self, locs: &PowLoc) -> Self {
        let c = match self {
            Relation::Bot => return Relation::Bot,
            Relation::NonBot(c) => c,
        };
        let forgotten: Vec<Sym> = locs.fold(Vec::new(), |mut acc, l| {
            acc.push(Sym::of_loc(l.clone()));
            acc.push(Sym::of_loc_offset(l.clone()));
            acc.push(Sym::of_loc_size(l.clone()));
            acc
        });
        let bounds = c
            .bounds
            .iter()
            .filter(|((a, b), _)| !forgotten.contains(a) && !forgotten.contains(b))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Relation::NonBot(Constraints { bounds })
    }

    /// Register a formal parameter's location as a tracked variable with
    /// no initial constraints beyond reflexivity — a no-op on the store
    /// itself, kept as an explicit entry point so callers don't need to
    /// special-case "first mention of a formal" (spec §4.6 `init_param`).
    pub fn init_param(&self, _l: &Loc) -> Self {
        self.clone()
    }

    /// Record the baseline invariant every freshly-allocated array
    /// satisfies: its offset starts at the given `offset` symbol and is
    /// strictly less than its `size` symbol (or, if `size_exp` names a
    /// scaled expression, less than that expression's symbol).
    pub fn init_array(
        &self,
        allocsite: &Allocsite,
        offset: &Sym,
        size: &Sym,
        size_exp: Option<&SymExp>,
    ) -> Self {
        let off_sym = Sym::of_allocsite_offset(allocsite.clone());
        let size_sym = Sym::of_allocsite_size(allocsite.clone());
        let mut cs = vec![
            (off_sym.clone(), offset.clone(), BigInt::from(0)),
            (offset.clone(), off_sym.clone(), BigInt::from(0)),
            (size_sym.clone(), size.clone(), BigInt::from(0)),
            (size.clone(), size_sym.clone(), BigInt::from(0)),
            (off_sym.clone(), size_sym.clone(), BigInt::from(-1)),
            (Sym::Zero, off_sym, BigInt::from(0)),
        ];
        if let Some(exp) = size_exp {
            cs.push((size.clone(), exp.sym.clone(), -exp.offset.clone()));
        }
        self.meet_constraints(&cs)
    }

    /// Specialize a callee's constraint store into the caller's vocabulary
    /// via `substmap`, then meet it into `caller`'s store. The
    /// `Memory`-level wrapper (spec §4.7) handles the "callee is `Bottom`"
    /// case by returning `caller` unchanged before this is ever called.
    pub fn instantiate(substmap: &SubstMap, caller: &Relation, callee: &Relation) -> Self {
        let callee_c = match callee {
            Relation::Bot => return caller.clone(),
            Relation::NonBot(c) => c,
        };
        let mut cs = Vec::new();
        for ((a, b), bound) in &callee_c.bounds {
            let ra = substmap.get(a).cloned().unwrap_or_else(|| a.clone());
            let rb = substmap.get(b).cloned().unwrap_or_else(|| b.clone());
            cs.push((ra, rb, bound.clone()));
        }
        caller.meet_constraints(&cs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l(name: &str) -> Loc {
        Loc::var(name)
    }

    #[test]
    fn meet_tightens_and_propagates() {
        let r = Relation::empty();
        let r = r.meet_constraints(&[
            (Sym::of_loc(l("x")), Sym::of_loc(l("y")), BigInt::from(3)),
            (Sym::of_loc(l("y")), Sym::of_loc(l("z")), BigInt::from(2)),
        ]);
        // x - z <= (x - y) + (y - z) = 5, via one round of closure.
        if let Relation::NonBot(c) = &r {
            let bound = c
                .bounds
                .get(&(Sym::of_loc(l("x")), Sym::of_loc(l("z"))))
                .cloned();
            assert_eq!(bound, Some(BigInt::from(5)));
        } else {
            panic!("expected NonBot");
        }
    }

    #[test]
    fn negative_cycle_is_unsat() {
        let r = Relation::empty();
        let r = r.meet_constraints(&[
            (Sym::of_loc(l("x")), Sym::of_loc(l("y")), BigInt::from(1)),
            (Sym::of_loc(l("y")), Sym::of_loc(l("x")), BigInt::from(-5)),
        ]);
        assert!(r.is_unsat());
    }

    #[test]
    fn init_array_implies_offset_lt_size() {
        let a = Allocsite::new("arr");
        let off = Sym::of_allocsite_offset(a.clone());
        let size = Sym::of_allocsite_size(a.clone());
        let r = Relation::empty().init_array(&a, &off, &size, None);
        assert!(!r.is_unsat());
        if let Relation::NonBot(c) = &r {
            let bound = c.bounds.get(&(off, size)).cloned();
            assert_eq!(bound, Some(BigInt::from(-1)));
        } else {
            panic!("expected NonBot");
        }
    }

    #[test]
    fn forget_locs_drops_their_constraints() {
        let r = Relation::empty().meet_constraints(&[(
            Sym::of_loc(l("x")),
            Sym::of_loc(l("y")),
            BigInt::from(0),
        )]);
        let r = r.forget_locs(&PowLoc::singleton(l("x")));
        if let Relation::NonBot(c) = &r {
            assert!(c.bounds.is_empty());
        } else {
            panic!("expected NonBot");
        }
    }

    #[test]
    fn instantiate_renames_through_substmap() {
        let callee = Relation::empty().meet_constraints(&[(
            Sym::of_loc(l("formal")),
            Sym::Zero,
            BigInt::from(10),
        )]);
        let mut subst = SubstMap::empty();
        subst.insert(Sym::of_loc(l("formal")), Sym::of_loc(l("actual")));
        let caller = Relation::empty();
        let result = Relation::instantiate(&subst, &caller, &callee);
        if let Relation::NonBot(c) = &result {
            assert_eq!(
                c.bounds.get(&(Sym::of_loc(l("actual")), Sym::Zero)).cloned(),
                Some(BigInt::from(10))
            );
        } else {
            panic!("expected NonBot");
        }
    }
}
