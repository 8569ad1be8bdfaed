//! `Memory` (spec §3/§4.7): `Bottom ⊔ NonBottom(ReachableMemory)`, the
//! publicly exposed domain element. Every `ReachableMemory` operation gets
//! a bottom-aware wrapper here that returns a documented default on
//! `Bottom` instead of delegating.

use crate::alias::AliasTarget;
use crate::latest_prune::LatestPrune;
use crate::prune_pairs::PrunePairs;
use crate::reachable_memory::ReachableMemory;
use crate::value::AbstractValue;
use bo_config::Config;
use bo_ir::{Allocsite, Exp, Ident, Loc, Location, PowLoc, ProcName};
use bo_relation::{Relation, SubstMap, Sym, SymExp};
use std::collections::BTreeSet;

#[derive(Clone, PartialEq, Debug)]
pub enum Memory {
    Bottom,
    NonBottom(ReachableMemory),
}

impl Memory {
    pub fn bottom() -> Self {
        Memory::Bottom
    }

    /// Procedure-entry state (spec §3 Lifecycle): empty stack set, empty
    /// pure memory, empty alias, `LatestPrune = Top`, empty relational
    /// store.
    pub fn init() -> Self {
        Memory::NonBottom(ReachableMemory::init())
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Memory::Bottom)
    }

    pub fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (Memory::Bottom, _) => true,
            (_, Memory::Bottom) => false,
            (Memory::NonBottom(a), Memory::NonBottom(b)) => a.leq(b),
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Memory::Bottom, x) | (x, Memory::Bottom) => x.clone(),
            (Memory::NonBottom(a), Memory::NonBottom(b)) => Memory::NonBottom(a.join(b)),
        }
    }

    pub fn widen(&self, other: &Self, num_iters: usize) -> Self {
        match (self, other) {
            (Memory::Bottom, x) | (x, Memory::Bottom) => x.clone(),
            (Memory::NonBottom(a), Memory::NonBottom(b)) => Memory::NonBottom(a.widen(b, num_iters)),
        }
    }

    // -- read discipline ------------------------------------------------------

    pub fn is_stack_loc(&self, l: &Loc) -> bool {
        match self {
            Memory::Bottom => false,
            Memory::NonBottom(m) => m.is_stack_loc(l),
        }
    }

    pub fn find_opt(&self, l: &Loc) -> Option<&AbstractValue> {
        match self {
            Memory::Bottom => None,
            Memory::NonBottom(m) => m.find_opt(l),
        }
    }

    pub fn find_stack(&self, l: &Loc) -> AbstractValue {
        match self {
            Memory::Bottom => AbstractValue::bot(),
            Memory::NonBottom(m) => m.find_stack(l),
        }
    }

    pub fn find_heap(&self, l: &Loc) -> AbstractValue {
        match self {
            Memory::Bottom => AbstractValue::bot(),
            Memory::NonBottom(m) => m.find_heap(l),
        }
    }

    pub fn find(&self, l: &Loc) -> AbstractValue {
        match self {
            Memory::Bottom => AbstractValue::bot(),
            Memory::NonBottom(m) => m.find(l),
        }
    }

    pub fn find_set(&self, p: &PowLoc) -> AbstractValue {
        match self {
            Memory::Bottom => AbstractValue::bot(),
            Memory::NonBottom(m) => m.find_set(p),
        }
    }

    // -- write discipline -------------------------------------------------------
    //
    // A write against an unreachable program point stays unreachable: every
    // mutator below is a no-op on `Bottom` (the "Bottom" default spec §4.7
    // documents).

    pub fn add_stack(&self, l: Loc, v: AbstractValue) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.add_stack(l, v)),
        }
    }

    pub fn replace_stack(&self, l: Loc, v: AbstractValue) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.replace_stack(l, v)),
        }
    }

    pub fn add_heap(&self, l: Loc, v: AbstractValue) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.add_heap(l, v)),
        }
    }

    pub fn strong_update(&self, p: &PowLoc, v: &AbstractValue) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.strong_update(p, v)),
        }
    }

    pub fn weak_update(&self, p: &PowLoc, v: &AbstractValue) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.weak_update(p, v)),
        }
    }

    pub fn can_strong_update(&self, p: &PowLoc) -> bool {
        match self {
            Memory::Bottom => false,
            Memory::NonBottom(m) => m.can_strong_update(p),
        }
    }

    pub fn update_mem(&self, p: &PowLoc, v: &AbstractValue) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.update_mem(p, v)),
        }
    }

    pub fn transform_mem(&self, f: impl Fn(&AbstractValue) -> AbstractValue, p: &PowLoc) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.transform_mem(f, p)),
        }
    }

    pub fn add_unknown_from(&self, id: Ident, callee: Option<ProcName>, location: Location) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.add_unknown_from(id, callee, location)),
        }
    }

    // -- pruning integration ----------------------------------------------------

    pub fn set_prune_pairs(&self, p: PrunePairs) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.set_prune_pairs(p)),
        }
    }

    pub fn update_latest_prune(&self, lhs: &Loc, rhs: &AbstractValue) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.update_latest_prune(lhs, rhs)),
        }
    }

    pub fn apply_latest_prune(&self, cond: &Exp) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.apply_latest_prune(cond)),
        }
    }

    pub fn latest_prune(&self) -> LatestPrune {
        match self {
            Memory::Bottom => LatestPrune::top(),
            Memory::NonBottom(m) => m.latest_prune.clone(),
        }
    }

    pub fn alias_target_of(&self, id: &Ident) -> Option<AliasTarget> {
        match self {
            Memory::Bottom => None,
            Memory::NonBottom(m) => m.alias.map.find(id).cloned(),
        }
    }

    // -- reachability -------------------------------------------------------------

    pub fn get_reachable_locs_from(&self, roots: &[Loc]) -> BTreeSet<Loc> {
        match self {
            Memory::Bottom => BTreeSet::new(),
            Memory::NonBottom(m) => m.get_reachable_locs_from(roots),
        }
    }

    // -- relational store -------------------------------------------------------------

    pub fn get_relation(&self) -> Relation {
        match self {
            Memory::Bottom => Relation::bot(),
            Memory::NonBottom(m) => m.get_relation().clone(),
        }
    }

    /// Deliberately does *not* default to the spec's literal `false` on
    /// `Bottom`: an unreachable memory is trivially unsatisfiable, so `true`
    /// is the semantically right answer here (see DESIGN.md).
    pub fn is_relation_unsat(&self) -> bool {
        match self {
            Memory::Bottom => true,
            Memory::NonBottom(m) => m.is_relation_unsat(),
        }
    }

    pub fn meet_constraints(&self, cs: &[(Sym, Sym, num_bigint::BigInt)], cfg: &Config) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.meet_constraints(cs, cfg)),
        }
    }

    pub fn store_relation(&self, p: &PowLoc, sym_val: &Sym, sym_off: &Sym, sym_size: &Sym, cfg: &Config) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.store_relation(p, sym_val, sym_off, sym_size, cfg)),
        }
    }

    pub fn forget_locs(&self, p: &PowLoc, cfg: &Config) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.forget_locs(p, cfg)),
        }
    }

    pub fn init_param_relation(&self, l: &Loc, cfg: &Config) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.init_param_relation(l, cfg)),
        }
    }

    pub fn init_array_relation(
        &self,
        allocsite: &Allocsite,
        offset: &Sym,
        size: &Sym,
        size_exp: Option<&SymExp>,
        cfg: &Config,
    ) -> Self {
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => {
                Memory::NonBottom(m.init_array_relation(allocsite, offset, size, size_exp, cfg))
            }
        }
    }

    /// Specializes the general bottom-lift rule (spec §4.7): if `callee` is
    /// `Bottom` (the callee never returns), the caller is returned
    /// unchanged rather than this call itself becoming a no-op-to-Bottom.
    pub fn instantiate_relation(&self, substmap: &SubstMap, callee: &Memory, cfg: &Config) -> Self {
        let callee_relation = match callee {
            Memory::Bottom => return self.clone(),
            Memory::NonBottom(m) => m.get_relation(),
        };
        match self {
            Memory::Bottom => Memory::Bottom,
            Memory::NonBottom(m) => Memory::NonBottom(m.instantiate_relation(substmap, callee_relation, cfg)),
        }
    }

    /// A multi-line, human-readable dump of the non-bottom state — emitted
    /// only when `cfg.write_html` asks for the diagnostic-HTML detail level
    /// (spec §2 supplemental feature; §6 configuration `write_html`).
    pub fn pp_for_debug(&self, cfg: &Config) -> String {
        if !cfg.write_html {
            return String::new();
        }
        match self {
            Memory::Bottom => "<bottom>".to_string(),
            Memory::NonBottom(m) => {
                let mut out = String::new();
                for l in m.mem_pure.keys() {
                    let v = m.find_opt(l).expect("key came from mem_pure itself");
                    out.push_str(&format!("{} -> {}\n", l, v));
                }
                out
            }
        }
    }
}

impl std::fmt::Display for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Memory::Bottom => write!(f, "<unreachable>"),
            Memory::NonBottom(m) => write!(f, "{} location(s) mapped", m.mem_pure.keys().count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_is_leq_everything() {
        assert!(Memory::bottom().leq(&Memory::init()));
        assert!(!Memory::init().leq(&Memory::bottom()));
    }

    #[test]
    fn writes_to_bottom_stay_bottom() {
        let m = Memory::bottom().add_stack(Loc::var("x"), AbstractValue::of_int(1));
        assert!(m.is_bottom());
    }

    #[test]
    fn find_on_bottom_is_bot_value() {
        assert!(Memory::bottom().find(&Loc::var("x")).is_bot());
    }

    #[test]
    fn is_relation_unsat_defaults_true_on_bottom() {
        assert!(Memory::bottom().is_relation_unsat());
    }

    #[test]
    fn instantiate_relation_with_bottom_callee_returns_caller_unchanged() {
        let caller = Memory::init().add_stack(Loc::var("x"), AbstractValue::of_int(1));
        let cfg = Config::default();
        let result = caller.instantiate_relation(&SubstMap::empty(), &Memory::bottom(), &cfg);
        assert_eq!(result, caller);
    }

    #[test]
    fn join_with_bottom_is_identity() {
        let m = Memory::init().add_stack(Loc::var("x"), AbstractValue::of_int(1));
        assert_eq!(m.join(&Memory::bottom()), m);
    }
}
