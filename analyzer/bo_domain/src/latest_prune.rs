//! `LatestPrune` (spec §3/§4.4): a finite-state record of which boolean
//! program variable carries the most recent branch pruning, and with which
//! refinement, so that a later read of that variable (typically the
//! condition of an `if`) can replay the refinement into memory via
//! `Memory::apply_latest_prune`.

use crate::prune_pairs::PrunePairs;
use bo_ir::Loc;

#[derive(Clone, PartialEq, Debug)]
pub enum LatestPrune {
    /// No information.
    Top,
    /// Most recent pruning produced refinement `p`; no boolean variable
    /// attached to it yet.
    Latest(PrunePairs),
    /// After pruning `p`, variable `x` was assigned `1`.
    TrueBranch(Loc, PrunePairs),
    /// After pruning `p`, variable `x` was assigned `0`.
    FalseBranch(Loc, PrunePairs),
    /// Joined state of the two branches of an if-then-else that pruned the
    /// same variable: `x = 1` refines by `p_true`, `x = 0` by `p_false`.
    V(Loc, PrunePairs, PrunePairs),
}

impl Default for LatestPrune {
    fn default() -> Self {
        LatestPrune::Top
    }
}

impl LatestPrune {
    pub fn top() -> Self {
        LatestPrune::Top
    }

    pub fn latest(p: PrunePairs) -> Self {
        LatestPrune::Latest(p)
    }

    pub fn leq(&self, other: &Self) -> bool {
        use LatestPrune::*;
        match (self, other) {
            (_, Top) => true,
            (Top, _) => false,
            (Latest(p1), Latest(p2)) => p1.leq(p2),
            (TrueBranch(x, p), TrueBranch(y, q)) => x == y && p.leq(q),
            (FalseBranch(x, p), FalseBranch(y, q)) => x == y && p.leq(q),
            (TrueBranch(x, p), V(y, pt, _)) => x == y && p.leq(pt),
            (FalseBranch(x, p), V(y, _, pf)) => x == y && p.leq(pf),
            (V(x, pt1, pf1), V(y, pt2, pf2)) => x == y && pt1.leq(pt2) && pf1.leq(pf2),
            _ => false,
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        use LatestPrune::*;
        if self.leq(other) {
            return other.clone();
        }
        if other.leq(self) {
            return self.clone();
        }
        match (self, other) {
            (Latest(p1), Latest(p2)) => Latest(p1.join(p2)),
            (TrueBranch(x, p1), TrueBranch(y, p2)) if x == y => TrueBranch(x.clone(), p1.join(p2)),
            (FalseBranch(x, p1), FalseBranch(y, p2)) if x == y => FalseBranch(x.clone(), p1.join(p2)),
            (TrueBranch(x, pt), FalseBranch(y, pf)) if x == y => V(x.clone(), pt.clone(), pf.clone()),
            (FalseBranch(x, pf), TrueBranch(y, pt)) if x == y => V(x.clone(), pt.clone(), pf.clone()),
            (V(x, pt1, pf1), V(y, pt2, pf2)) if x == y => V(x.clone(), pt1.join(pt2), pf1.join(pf2)),
            _ => Top,
        }
    }

    pub fn widen(&self, other: &Self, _num_iters: usize) -> Self {
        self.join(other)
    }

    /// Any write to a location unrelated to the tracked variable demotes
    /// the record to `Top` (spec §4.4 invariant).
    pub fn demote_unless(&self, written: &Loc) -> Self {
        match self {
            LatestPrune::TrueBranch(x, _)
            | LatestPrune::FalseBranch(x, _)
            | LatestPrune::V(x, _, _)
                if x == written =>
            {
                self.clone()
            }
            LatestPrune::Latest(_) | LatestPrune::Top => self.clone(),
            _ => LatestPrune::Top,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AbstractValue;

    fn pair(l: Loc) -> PrunePairs {
        PrunePairs::top().add(l, AbstractValue::of_int(0))
    }

    #[test]
    fn true_and_false_branch_join_into_v() {
        let x = Loc::var("b");
        let a = LatestPrune::TrueBranch(x.clone(), pair(Loc::var("p")));
        let b = LatestPrune::FalseBranch(x.clone(), pair(Loc::var("q")));
        let j = a.join(&b);
        assert!(matches!(j, LatestPrune::V(v, _, _) if v == x));
    }

    #[test]
    fn true_branch_leq_v_iff_pairs_leq() {
        let x = Loc::var("b");
        let p = pair(Loc::var("p"));
        let v = LatestPrune::V(x.clone(), p.clone(), PrunePairs::top());
        let tb = LatestPrune::TrueBranch(x, p);
        assert!(tb.leq(&v));
    }

    #[test]
    fn different_variables_join_to_top() {
        let a = LatestPrune::TrueBranch(Loc::var("b1"), PrunePairs::top());
        let b = LatestPrune::FalseBranch(Loc::var("b2"), PrunePairs::top());
        assert_eq!(a.join(&b), LatestPrune::Top);
    }

    #[test]
    fn demote_unrelated_write_to_top() {
        let x = Loc::var("b");
        let lp = LatestPrune::TrueBranch(x.clone(), PrunePairs::top());
        assert_eq!(lp.demote_unless(&Loc::var("other")), LatestPrune::Top);
        assert_eq!(lp.demote_unless(&x), lp);
    }

    #[test]
    fn joining_with_top_yields_top() {
        let lp = LatestPrune::Latest(pair(Loc::var("p")));
        assert_eq!(lp.join(&LatestPrune::Top), LatestPrune::Top);
        assert_eq!(LatestPrune::Top.join(&lp), LatestPrune::Top);
    }
}
