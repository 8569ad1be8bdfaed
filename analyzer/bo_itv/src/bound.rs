use bo_symtab::Symbol;
use num_bigint::BigInt;

/// One side of an interval: `-inf`, `+inf`, a concrete integer, or a single
/// symbolic term `symbol + k`.
///
/// A bound never carries more than one symbol — this mirrors the real
/// interval library's "linear in at most one unknown" restriction, which is
/// what keeps `subst` a simple interval-valued substitution rather than a
/// general linear-programming problem.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Bound {
    NegInf,
    PosInf,
    Const(BigInt),
    Sym(Symbol, BigInt),
}

impl Bound {
    pub fn of_int(n: i64) -> Self {
        Bound::Const(BigInt::from(n))
    }

    pub fn of_big_int(n: BigInt) -> Self {
        Bound::Const(n)
    }

    pub fn sym(s: Symbol) -> Self {
        Bound::Sym(s, BigInt::from(0))
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Bound::Const(_))
    }

    pub fn as_const(&self) -> Option<&BigInt> {
        match self {
            Bound::Const(n) => Some(n),
            _ => None,
        }
    }

    pub fn symbols(&self) -> Option<&Symbol> {
        match self {
            Bound::Sym(s, _) => Some(s),
            _ => None,
        }
    }

    /// The bound `k` steps further from zero in the direction this bound
    /// already leans (`+k` for everything — callers negate `k` for the
    /// upper-bound side of a subtraction).
    pub fn shift(&self, k: &BigInt) -> Self {
        match self {
            Bound::NegInf => Bound::NegInf,
            Bound::PosInf => Bound::PosInf,
            Bound::Const(n) => Bound::Const(n + k),
            Bound::Sym(s, off) => Bound::Sym(s.clone(), off + k),
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            Bound::NegInf => Bound::PosInf,
            Bound::PosInf => Bound::NegInf,
            Bound::Const(n) => Bound::Const(-n),
            // A bound cannot name a negated symbol, so negating a symbolic
            // term loses precision to the corresponding infinity; callers
            // pick which infinity by calling `neg_as_lower`/`neg_as_upper`.
            Bound::Sym(_, _) => Bound::PosInf,
        }
    }

    /// `neg`, but for use on what will become a *lower* bound (loses
    /// precision towards `-inf` instead of `+inf`).
    pub fn neg_lb(&self) -> Self {
        match self {
            Bound::Sym(_, _) => Bound::NegInf,
            other => other.neg(),
        }
    }

    /// True ordering on the subset of bounds that are actually comparable
    /// (both concrete, both infinite on the same side, or the same
    /// symbol). Incomparable symbolic pairs return `None`.
    pub fn partial_le(&self, other: &Self) -> Option<bool> {
        use Bound::*;
        match (self, other) {
            (NegInf, _) | (_, PosInf) => Some(true),
            (_, NegInf) | (PosInf, _) => Some(false),
            (Const(a), Const(b)) => Some(a <= b),
            (Sym(s1, k1), Sym(s2, k2)) if s1 == s2 => Some(k1 <= k2),
            _ => None,
        }
    }

    /// The smaller of two lower bounds; falls back to `-inf` when the pair
    /// is incomparable (sound: it only widens the interval).
    pub fn min_lb(&self, other: &Self) -> Self {
        if self == other {
            return self.clone();
        }
        match self.partial_le(other) {
            Some(true) => self.clone(),
            Some(false) => other.clone(),
            None => Bound::NegInf,
        }
    }

    /// The larger of two upper bounds; falls back to `+inf` when
    /// incomparable.
    pub fn max_ub(&self, other: &Self) -> Self {
        if self == other {
            return self.clone();
        }
        match self.partial_le(other) {
            Some(true) => other.clone(),
            Some(false) => self.clone(),
            None => Bound::PosInf,
        }
    }

    pub fn add_lb(&self, other: &Self) -> Self {
        use Bound::*;
        match (self, other) {
            (NegInf, _) | (_, NegInf) => NegInf,
            (PosInf, _) | (_, PosInf) => PosInf,
            (Const(a), Const(b)) => Const(a + b),
            (Const(c), Sym(s, k)) | (Sym(s, k), Const(c)) => Sym(s.clone(), k + c),
            (Sym(s1, k1), Sym(s2, k2)) if s1 == s2 => Sym(s1.clone(), k1 + k2),
            _ => NegInf,
        }
    }

    pub fn add_ub(&self, other: &Self) -> Self {
        use Bound::*;
        match (self, other) {
            (PosInf, _) | (_, PosInf) => PosInf,
            (NegInf, _) | (_, NegInf) => NegInf,
            (Const(a), Const(b)) => Const(a + b),
            (Const(c), Sym(s, k)) | (Sym(s, k), Const(c)) => Sym(s.clone(), k + c),
            (Sym(s1, k1), Sym(s2, k2)) if s1 == s2 => Sym(s1.clone(), k1 + k2),
            _ => PosInf,
        }
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::NegInf => write!(f, "-oo"),
            Bound::PosInf => write!(f, "+oo"),
            Bound::Const(n) => write!(f, "{}", n),
            Bound::Sym(s, k) if k.sign() == num_bigint::Sign::NoSign => write!(f, "{}", s),
            Bound::Sym(s, k) => write!(f, "{}+{}", s, k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomparable_symbols_widen_on_min_max() {
        let tab = bo_symtab::SymbolTable::new();
        let a = tab.make_fresh(bo_symtab::SymbolPath::root("a"), false);
        let b = tab.make_fresh(bo_symtab::SymbolPath::root("b"), false);
        let ba = Bound::sym(a);
        let bb = Bound::sym(b);
        assert_eq!(ba.min_lb(&bb), Bound::NegInf);
        assert_eq!(ba.max_ub(&bb), Bound::PosInf);
    }

    #[test]
    fn same_symbol_min_max_pick_offsets() {
        let tab = bo_symtab::SymbolTable::new();
        let s = tab.make_fresh(bo_symtab::SymbolPath::root("x"), false);
        let lo = Bound::Sym(s.clone(), BigInt::from(0));
        let hi = Bound::Sym(s, BigInt::from(3));
        assert_eq!(lo.min_lb(&hi), lo);
        assert_eq!(lo.max_ub(&hi), hi);
    }
}
