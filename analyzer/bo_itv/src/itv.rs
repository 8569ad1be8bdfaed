use crate::bound::Bound;
use bo_symtab::{Symbol, SymbolPath, SymbolSet, SymbolTable};
use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, ToPrimitive, Zero};

/// The interval lattice: bottom, or a closed range `[lb, ub]` whose
/// endpoints are each either infinite, concrete, or a single symbolic term
/// (`Bound`).
///
/// This is the domain's external `Itv` collaborator (spec §6) — every
/// `AbstractValue::itv` field lives here.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Itv {
    Bottom,
    NonBottom { lb: Bound, ub: Bound },
}

impl Itv {
    fn closed(lb: Bound, ub: Bound) -> Self {
        Itv::NonBottom { lb, ub }
    }

    pub fn bot() -> Self {
        Itv::Bottom
    }

    pub fn top() -> Self {
        Itv::closed(Bound::NegInf, Bound::PosInf)
    }

    /// `[0, +inf)`: the natural numbers.
    pub fn nat() -> Self {
        Itv::closed(Bound::of_int(0), Bound::PosInf)
    }

    pub fn one() -> Self {
        Itv::of_int(1)
    }

    pub fn zero() -> Self {
        Itv::of_int(0)
    }

    /// `[1, +inf)`.
    pub fn pos() -> Self {
        Itv::closed(Bound::of_int(1), Bound::PosInf)
    }

    /// `[-1, 255]`: the classic "signed byte went through an unsigned read,
    /// or `-1` sentinel from something like `getc`" range.
    pub fn m1_255() -> Self {
        Itv::closed(Bound::of_int(-1), Bound::of_int(255))
    }

    pub fn of_int(n: i64) -> Self {
        Itv::closed(Bound::of_int(n), Bound::of_int(n))
    }

    pub fn of_big_int(n: BigInt) -> Self {
        Itv::closed(Bound::of_big_int(n.clone()), Bound::of_big_int(n))
    }

    /// Boolean-as-interval: `Some(true) -> [1,1]`, `Some(false) -> [0,0]`,
    /// `None -> [0,1]` (top boolean, used whenever a comparison can't be
    /// decided, e.g. spec §4.1's pointer-operand comparisons).
    pub fn of_bool(b: Option<bool>) -> Self {
        match b {
            Some(true) => Itv::one(),
            Some(false) => Itv::zero(),
            None => Itv::closed(Bound::of_int(0), Bound::of_int(1)),
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Itv::Bottom)
    }

    /// True when the range is provably empty (`lb > ub`, both concrete).
    /// Symbolic bounds can't be proven empty here, so they're left alone —
    /// the caller is responsible for normalizing obviously-bottom results.
    pub fn is_empty(&self) -> bool {
        match self {
            Itv::Bottom => true,
            Itv::NonBottom { lb, ub } => match lb.partial_le(ub) {
                Some(le) => !le,
                None => false,
            },
        }
    }

    /// Collapse a concretely-empty range to `Bottom`.
    pub fn normalize(self) -> Self {
        if self.is_empty() {
            Itv::Bottom
        } else {
            self
        }
    }

    pub fn lb(&self) -> Option<&Bound> {
        match self {
            Itv::Bottom => None,
            Itv::NonBottom { lb, .. } => Some(lb),
        }
    }

    pub fn ub(&self) -> Option<&Bound> {
        match self {
            Itv::Bottom => None,
            Itv::NonBottom { ub, .. } => Some(ub),
        }
    }

    pub fn eq_const(&self, n: i64) -> bool {
        match self {
            Itv::NonBottom {
                lb: Bound::Const(a),
                ub: Bound::Const(b),
            } => a == &BigInt::from(n) && b == &BigInt::from(n),
            _ => false,
        }
    }

    pub fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (Itv::Bottom, _) => true,
            (_, Itv::Bottom) => false,
            (
                Itv::NonBottom { lb: l1, ub: u1 },
                Itv::NonBottom { lb: l2, ub: u2 },
            ) => {
                let lb_ok = l2.partial_le(l1).unwrap_or(false);
                let ub_ok = u1.partial_le(u2).unwrap_or(false);
                lb_ok && ub_ok
            }
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        if std::ptr::eq(self, other) || self == other {
            return self.clone();
        }
        match (self, other) {
            (Itv::Bottom, x) | (x, Itv::Bottom) => x.clone(),
            (Itv::NonBottom { lb: l1, ub: u1 }, Itv::NonBottom { lb: l2, ub: u2 }) => {
                Itv::closed(l1.min_lb(l2), u1.max_ub(u2))
            }
        }
    }

    /// `widen(prev, next, _)`: if `next`'s lower bound dropped below
    /// `prev`'s, jump straight to `-inf`; symmetrically for the upper
    /// bound. Ignores the iteration count — this lattice widens to the
    /// extremes in one step, matching the external interval library's
    /// actual widening (spec §6 lists `widen(prev, next, num_iters)` on
    /// every sub-lattice, but `Itv` itself has no staged thresholds).
    pub fn widen(&self, next: &Self, _num_iters: usize) -> Self {
        match (self, next) {
            (Itv::Bottom, x) => x.clone(),
            (x, Itv::Bottom) => x.clone(),
            (Itv::NonBottom { lb: l1, ub: u1 }, Itv::NonBottom { lb: l2, ub: u2 }) => {
                let lb = match l2.partial_le(l1) {
                    Some(true) => l1.clone(),
                    _ => Bound::NegInf,
                };
                let ub = match u1.partial_le(u2) {
                    Some(true) => u2.clone(),
                    _ => Bound::PosInf,
                };
                Itv::closed(lb, ub)
            }
        }
    }

    // -- arithmetic --------------------------------------------------

    pub fn plus(&self, other: &Self) -> Self {
        self.lift_binop(other, |l1, u1, l2, u2| (l1.add_lb(l2), u1.add_ub(u2)))
    }

    pub fn minus(&self, other: &Self) -> Self {
        self.lift_binop(other, |l1, u1, l2, u2| {
            (l1.add_lb(&u2.neg_lb()), u1.add_ub(&l2.neg()))
        })
    }

    /// Multiplication and the remaining ops below only preserve precision
    /// over concrete corners; a symbolic operand collapses the result to
    /// top. Array offset/size arithmetic — the case that actually needs
    /// symbolic precision — goes through `bo_arrayblk`, not through general
    /// `Itv` multiplication.
    pub fn mult(&self, other: &Self) -> Self {
        self.concrete_corners(other, |a, b| a * b)
    }

    pub fn div(&self, other: &Self) -> Self {
        match (self.as_concrete_range(), other.as_concrete_range()) {
            (Some((a_lo, a_hi)), Some((b_lo, b_hi)))
                if !(b_lo <= BigInt::zero() && BigInt::zero() <= b_hi) =>
            {
                let corners = [&a_lo / &b_lo, &a_lo / &b_hi, &a_hi / &b_lo, &a_hi / &b_hi];
                Itv::from_corners(corners.into_iter())
            }
            _ => Itv::top(),
        }
    }

    pub fn mod_sem(&self, other: &Self) -> Self {
        match other.as_concrete_range() {
            Some((b_lo, b_hi)) if b_lo > BigInt::zero() || b_hi < BigInt::zero() => {
                let bound = b_lo.abs().max(b_hi.abs()) - 1;
                Itv::closed(Bound::of_big_int(-bound.clone()), Bound::of_big_int(bound))
            }
            _ => Itv::top(),
        }
    }

    pub fn shiftlt(&self, other: &Self) -> Self {
        match other.as_concrete_range() {
            Some((_, hi)) if hi >= BigInt::zero() => self.concrete_corners(other, |a, b| {
                match b.to_u32() {
                    Some(shift) if shift <= 63 => a << shift,
                    _ => a.clone(),
                }
            }),
            _ => Itv::top(),
        }
    }

    pub fn shiftrt(&self, other: &Self) -> Self {
        match other.as_concrete_range() {
            Some((_, hi)) if hi >= BigInt::zero() => self.concrete_corners(other, |a, b| {
                match b.to_u32() {
                    Some(shift) if shift <= 63 => a >> shift,
                    _ => a.clone(),
                }
            }),
            _ => Itv::top(),
        }
    }

    /// Bitwise AND keeps precision only for a non-negative concrete right
    /// operand, in which case the result is bounded by `[0, max(rhs)]`.
    pub fn band_sem(&self, other: &Self) -> Self {
        match other.as_concrete_range() {
            Some((lo, hi)) if lo >= BigInt::zero() => {
                Itv::closed(Bound::of_int(0), Bound::of_big_int(hi))
            }
            _ => Itv::top(),
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            Itv::Bottom => Itv::Bottom,
            Itv::NonBottom { lb, ub } => Itv::closed(ub.neg_lb(), lb.neg()),
        }
    }

    /// Logical not on a boolean-as-interval value.
    pub fn lnot(&self) -> Self {
        if self.eq_const(0) {
            Itv::one()
        } else if self.eq_const(1) {
            Itv::zero()
        } else {
            Itv::of_bool(None)
        }
    }

    // -- comparisons ---------------------------------------------------

    pub fn lt_sem(&self, other: &Self) -> Self {
        self.compare(other, |a, b| a < b, |a, b| !(a < b))
    }

    pub fn le_sem(&self, other: &Self) -> Self {
        self.compare(other, |a, b| a <= b, |a, b| !(a <= b))
    }

    pub fn gt_sem(&self, other: &Self) -> Self {
        other.lt_sem(self)
    }

    pub fn ge_sem(&self, other: &Self) -> Self {
        other.le_sem(self)
    }

    pub fn eq_sem(&self, other: &Self) -> Self {
        match (self.as_concrete_point(), other.as_concrete_point()) {
            (Some(a), Some(b)) => Itv::of_bool(Some(a == b)),
            _ => {
                if self.disjoint_from(other) {
                    Itv::zero()
                } else {
                    Itv::of_bool(None)
                }
            }
        }
    }

    pub fn ne_sem(&self, other: &Self) -> Self {
        self.eq_sem(other).lnot()
    }

    pub fn land_sem(&self, other: &Self) -> Self {
        if self.eq_const(0) || other.eq_const(0) {
            Itv::zero()
        } else if self.definitely_nonzero() && other.definitely_nonzero() {
            Itv::one()
        } else {
            Itv::of_bool(None)
        }
    }

    pub fn lor_sem(&self, other: &Self) -> Self {
        if self.definitely_nonzero() || other.definitely_nonzero() {
            Itv::one()
        } else if self.eq_const(0) && other.eq_const(0) {
            Itv::zero()
        } else {
            Itv::of_bool(None)
        }
    }

    fn definitely_nonzero(&self) -> bool {
        match self.as_concrete_range() {
            Some((lo, hi)) => lo > BigInt::zero() || hi < BigInt::zero(),
            None => false,
        }
    }

    // -- pruning ---------------------------------------------------------

    pub fn prune_eq_zero(&self) -> Self {
        self.meet(&Itv::zero())
    }

    pub fn prune_ne_zero(&self) -> Self {
        match self {
            Itv::NonBottom { lb, ub } => {
                let lb = if lb == &Bound::of_int(0) {
                    Bound::of_int(1)
                } else {
                    lb.clone()
                };
                let ub = if ub == &Bound::of_int(0) {
                    Bound::of_int(-1)
                } else {
                    ub.clone()
                };
                Itv::closed(lb, ub).normalize()
            }
            Itv::Bottom => Itv::Bottom,
        }
    }

    /// Refine `self` under the assumption that `self op other` holds.
    pub fn prune_comp(&self, op: CompOp, other: &Self) -> Self {
        let (lb, ub) = match self {
            Itv::NonBottom { lb, ub } => (lb.clone(), ub.clone()),
            Itv::Bottom => return Itv::Bottom,
        };
        let (olb, oub) = match other {
            Itv::NonBottom { lb, ub } => (lb.clone(), ub.clone()),
            Itv::Bottom => return Itv::Bottom,
        };
        let refined = match op {
            CompOp::Lt => (lb, ub.min_ub_candidate(&oub.shift(&BigInt::from(-1)))),
            CompOp::Le => (lb, ub.min_ub_candidate(&oub)),
            CompOp::Gt => (lb.max_lb_candidate(&olb.shift(&BigInt::from(1))), ub),
            CompOp::Ge => (lb.max_lb_candidate(&olb), ub),
        };
        Itv::closed(refined.0, refined.1).normalize()
    }

    pub fn prune_eq(&self, other: &Self) -> Self {
        self.meet(other)
    }

    pub fn prune_ne(&self, other: &Self) -> Self {
        match (self, other.as_concrete_point()) {
            (_, Some(n)) => {
                let n_itv = Itv::of_big_int(n);
                if self == &n_itv {
                    Itv::Bottom
                } else {
                    self.clone()
                }
            }
            _ => self.clone(),
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Itv::Bottom, _) | (_, Itv::Bottom) => Itv::Bottom,
            (Itv::NonBottom { lb: l1, ub: u1 }, Itv::NonBottom { lb: l2, ub: u2 }) => {
                let lb = l1.max_lb_candidate(l2);
                let ub = u1.min_ub_candidate(u2);
                Itv::closed(lb, ub).normalize()
            }
        }
    }

    // -- symbols / substitution ------------------------------------------

    pub fn make_sym(
        symtab: &SymbolTable,
        path: SymbolPath,
        unsigned: bool,
    ) -> (Self, Symbol) {
        let sym = symtab.make_fresh(path, unsigned);
        let itv = if unsigned {
            Itv::closed(Bound::of_int(0), Bound::sym(sym.clone()))
        } else {
            Itv::closed(Bound::sym(sym.clone()), Bound::sym(sym.clone()))
        };
        (itv, sym)
    }

    pub fn get_symbols(&self) -> SymbolSet {
        let mut set = SymbolSet::new();
        if let Itv::NonBottom { lb, ub } = self {
            if let Some(s) = lb.symbols() {
                set.insert(s.clone());
            }
            if let Some(s) = ub.symbols() {
                set.insert(s.clone());
            }
        }
        set
    }

    /// Substitute every symbol in this interval by the interval `eval`
    /// returns for it, widening lb/ub by that substituted interval's own
    /// lb/ub (spec §4.1 `substitute`).
    pub fn subst(&self, eval: &impl Fn(&Symbol) -> Itv) -> Self {
        match self {
            Itv::Bottom => Itv::Bottom,
            Itv::NonBottom { lb, ub } => {
                let new_lb = Self::subst_lb(lb, eval);
                let new_ub = Self::subst_ub(ub, eval);
                Itv::closed(new_lb, new_ub).normalize()
            }
        }
    }

    fn subst_lb(b: &Bound, eval: &impl Fn(&Symbol) -> Itv) -> Bound {
        match b {
            Bound::Sym(s, k) => match eval(s) {
                Itv::Bottom => Bound::PosInf,
                Itv::NonBottom { lb, .. } => lb.shift(k),
            },
            other => other.clone(),
        }
    }

    fn subst_ub(b: &Bound, eval: &impl Fn(&Symbol) -> Itv) -> Bound {
        match b {
            Bound::Sym(s, k) => match eval(s) {
                Itv::Bottom => Bound::NegInf,
                Itv::NonBottom { ub, .. } => ub.shift(k),
            },
            other => other.clone(),
        }
    }

    // -- queries -----------------------------------------------------------

    /// The number of integers the interval spans, or `None` if unbounded
    /// or symbolic — feeds `PureMemory::range`'s loop-trip-count bound.
    pub fn range(&self) -> Option<BigUint> {
        let (lo, hi) = self.as_concrete_range()?;
        if hi < lo {
            Some(BigUint::zero())
        } else {
            (&hi - &lo + 1).to_biguint()
        }
    }

    /// The interval to hand a `begin()..end()`-style iterator transfer
    /// function: clamp the lower bound at zero (an iterator's remaining
    /// count is never negative) while leaving the upper bound alone.
    pub fn get_iterator_itv(&self) -> Self {
        match self {
            Itv::Bottom => Itv::Bottom,
            Itv::NonBottom { lb, ub } => {
                let lb = match lb {
                    Bound::Const(n) if n < &BigInt::zero() => Bound::of_int(0),
                    Bound::NegInf => Bound::of_int(0),
                    other => other.clone(),
                };
                Itv::closed(lb, ub.clone())
            }
        }
    }

    fn as_concrete_range(&self) -> Option<(BigInt, BigInt)> {
        match self {
            Itv::NonBottom {
                lb: Bound::Const(lo),
                ub: Bound::Const(hi),
            } => Some((lo.clone(), hi.clone())),
            _ => None,
        }
    }

    fn as_concrete_point(&self) -> Option<BigInt> {
        let (lo, hi) = self.as_concrete_range()?;
        (lo == hi).then_some(lo)
    }

    fn disjoint_from(&self, other: &Self) -> bool {
        match (self, other) {
            (Itv::NonBottom { lb: l1, ub: u1 }, Itv::NonBottom { lb: l2, ub: u2 }) => {
                matches!(u1.partial_le(l2), Some(true)) || matches!(u2.partial_le(l1), Some(true))
            }
            _ => false,
        }
    }

    fn concrete_corners(&self, other: &Self, f: impl Fn(&BigInt, &BigInt) -> BigInt) -> Self {
        match (self.as_concrete_range(), other.as_concrete_range()) {
            (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => {
                let corners = [
                    f(&a_lo, &b_lo),
                    f(&a_lo, &b_hi),
                    f(&a_hi, &b_lo),
                    f(&a_hi, &b_hi),
                ];
                Itv::from_corners(corners.into_iter())
            }
            _ => Itv::top(),
        }
    }

    fn from_corners(corners: impl Iterator<Item = BigInt>) -> Self {
        let mut it = corners;
        let first = it.next().expect("corners non-empty");
        let (lo, hi) = it.fold((first.clone(), first), |(lo, hi), c| {
            (lo.min(c.clone()), hi.max(c))
        });
        Itv::closed(Bound::of_big_int(lo), Bound::of_big_int(hi))
    }

    fn lift_binop(
        &self,
        other: &Self,
        f: impl FnOnce(&Bound, &Bound, &Bound, &Bound) -> (Bound, Bound),
    ) -> Self {
        match (self, other) {
            (Itv::Bottom, _) | (_, Itv::Bottom) => Itv::Bottom,
            (Itv::NonBottom { lb: l1, ub: u1 }, Itv::NonBottom { lb: l2, ub: u2 }) => {
                let (lb, ub) = f(l1, u1, l2, u2);
                Itv::closed(lb, ub)
            }
        }
    }

    fn compare(
        &self,
        other: &Self,
        definitely: impl Fn(&BigInt, &BigInt) -> bool,
        definitely_not: impl Fn(&BigInt, &BigInt) -> bool,
    ) -> Self {
        if self.has_pointer_shaped_operand() || other.has_pointer_shaped_operand() {
            return Itv::of_bool(None);
        }
        match (self.as_concrete_range(), other.as_concrete_range()) {
            (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => {
                if definitely(&a_hi, &b_lo) {
                    Itv::one()
                } else if definitely_not(&a_lo, &b_hi) {
                    Itv::zero()
                } else {
                    Itv::of_bool(None)
                }
            }
            _ => Itv::of_bool(None),
        }
    }

    /// `Itv` itself never carries pointer information (that lives in
    /// `AbstractValue::powloc`/`arrayblk`); this always returns `false` and
    /// exists so `bo_domain`'s comparison transfer functions can route
    /// pointer-operand detection through one place. See `AbstractValue::lt`
    /// and friends, which call this only after checking the *value's* other
    /// components.
    fn has_pointer_shaped_operand(&self) -> bool {
        false
    }
}

/// Comparison operators accepted by `prune_comp` (strict/non-strict, both
/// directions — `>`/`>=` are expressed by swapping operands before calling
/// in `AbstractValue`, but `Itv::prune_comp` takes all four directly since
/// the refinement math differs by direction).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Bound {
    fn min_ub_candidate(&self, other: &Self) -> Self {
        match self.partial_le(other) {
            Some(true) => self.clone(),
            Some(false) => other.clone(),
            None => self.clone(),
        }
    }

    fn max_lb_candidate(&self, other: &Self) -> Self {
        match self.partial_le(other) {
            Some(true) => other.clone(),
            Some(false) => self.clone(),
            None => self.clone(),
        }
    }
}

impl std::fmt::Display for Itv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Itv::Bottom => write!(f, "bottom"),
            Itv::NonBottom { lb, ub } => write!(f, "[{}, {}]", lb, ub),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_of_ints_matches_arithmetic() {
        let a = Itv::of_int(3);
        let b = Itv::of_int(4);
        assert_eq!(a.plus(&b), Itv::of_int(7));
    }

    #[test]
    fn join_widens_range() {
        let a = Itv::of_int(0);
        let b = Itv::of_int(5);
        let j = a.join(&b);
        assert_eq!(j, Itv::closed(Bound::of_int(0), Bound::of_int(5)));
        assert!(a.leq(&j));
        assert!(b.leq(&j));
    }

    #[test]
    fn widen_jumps_to_infinity_on_growth() {
        let prev = Itv::closed(Bound::of_int(0), Bound::of_int(0));
        let next = Itv::closed(Bound::of_int(0), Bound::of_int(1));
        let w = prev.widen(&next, 0);
        assert_eq!(w, Itv::closed(Bound::of_int(0), Bound::PosInf));
    }

    #[test]
    fn prune_ne_zero_shrinks_point_at_zero() {
        let x = Itv::closed(Bound::of_int(0), Bound::of_int(5));
        let pruned = x.prune_ne_zero();
        assert_eq!(pruned, Itv::closed(Bound::of_int(1), Bound::of_int(5)));
    }

    #[test]
    fn prune_eq_zero_of_exact_zero_is_zero() {
        assert_eq!(Itv::zero().prune_eq_zero(), Itv::zero());
        assert_eq!(Itv::one().prune_eq_zero(), Itv::Bottom);
    }

    #[test]
    fn lt_of_disjoint_ranges_is_definite() {
        let a = Itv::closed(Bound::of_int(0), Bound::of_int(2));
        let b = Itv::closed(Bound::of_int(5), Bound::of_int(9));
        assert_eq!(a.lt_sem(&b), Itv::one());
        assert_eq!(b.lt_sem(&a), Itv::zero());
    }

    #[test]
    fn lt_of_overlapping_ranges_is_top_bool() {
        let a = Itv::closed(Bound::of_int(0), Bound::of_int(5));
        let b = Itv::closed(Bound::of_int(3), Bound::of_int(9));
        assert_eq!(a.lt_sem(&b), Itv::of_bool(None));
    }

    #[test]
    fn range_of_concrete_interval() {
        let a = Itv::closed(Bound::of_int(2), Bound::of_int(5));
        assert_eq!(a.range(), Some(BigUint::from(4u32)));
        assert_eq!(Itv::top().range(), None);
    }

    #[test]
    fn subst_expands_symbol_to_its_interval() {
        let tab = SymbolTable::new();
        let (sym_itv, sym) = Itv::make_sym(&tab, SymbolPath::root("n"), false);
        assert_eq!(sym_itv, Itv::closed(Bound::sym(sym.clone()), Bound::sym(sym.clone())));
        let concrete = Itv::closed(Bound::of_int(0), Bound::of_int(10));
        let subst = sym_itv.subst(&|s| if *s == sym { concrete.clone() } else { Itv::top() });
        assert_eq!(subst, concrete);
    }

    #[test]
    fn make_sym_unsigned_floors_at_zero() {
        let tab = SymbolTable::new();
        let (itv, _) = Itv::make_sym(&tab, SymbolPath::root("len"), true);
        assert_eq!(itv.lb(), Some(&Bound::of_int(0)));
    }
}
