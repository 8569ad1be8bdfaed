//! `ReachableMemory` (spec §3/§4.6): `{ stack_locs, mem_pure, alias,
//! latest_prune, relation }` — the working abstract memory at a reachable
//! program point. `Memory` bottom-lifts this.

use crate::alias::Alias;
use crate::latest_prune::LatestPrune;
use crate::prune_pairs::PrunePairs;
use crate::pure_memory::PureMemory;
use crate::stack_locs::StackLocSet;
use crate::value::AbstractValue;
use bo_config::Config;
use bo_ir::{Allocsite, Exp, Ident, Loc, Location, PowLoc, ProcName};
use bo_relation::{Relation, SubstMap, Sym, SymExp};
use std::collections::BTreeSet;

/// A location collapsing more than one concrete runtime cell — currently
/// just array allocation sites (spec's `bo_arrayblk` docs: one `Allocsite`
/// stands for every array ever allocated at that program point). Writing
/// through one can never soundly be a strong update.
fn is_summary_node(l: &Loc) -> bool {
    matches!(l, Loc::Allocsite(_))
}

#[derive(Clone, PartialEq, Debug)]
pub struct ReachableMemory {
    pub stack_locs: StackLocSet,
    pub mem_pure: PureMemory,
    pub alias: Alias,
    pub latest_prune: LatestPrune,
    pub relation: Relation,
}

impl ReachableMemory {
    /// Procedure-entry state (spec §3 Lifecycle).
    pub fn init() -> Self {
        ReachableMemory {
            stack_locs: StackLocSet::empty(),
            mem_pure: PureMemory::empty(),
            alias: Alias::empty(),
            latest_prune: LatestPrune::top(),
            relation: Relation::empty(),
        }
    }

    pub fn leq(&self, other: &Self) -> bool {
        self.stack_locs.leq(&other.stack_locs)
            && self.mem_pure.leq(&other.mem_pure)
            && self.alias.leq(&other.alias)
            && self.latest_prune.leq(&other.latest_prune)
            && self.relation.leq(&other.relation)
    }

    pub fn join(&self, other: &Self) -> Self {
        ReachableMemory {
            stack_locs: self.stack_locs.join(&other.stack_locs),
            mem_pure: self.mem_pure.join(&other.mem_pure),
            alias: self.alias.join(&other.alias),
            latest_prune: self.latest_prune.join(&other.latest_prune),
            relation: self.relation.join(&other.relation),
        }
    }

    pub fn widen(&self, other: &Self, num_iters: usize) -> Self {
        ReachableMemory {
            stack_locs: self.stack_locs.widen(&other.stack_locs, num_iters),
            mem_pure: self.mem_pure.widen(&other.mem_pure, num_iters),
            alias: self.alias.widen(&other.alias, num_iters),
            latest_prune: self.latest_prune.widen(&other.latest_prune, num_iters),
            relation: self.relation.widen(&other.relation, num_iters),
        }
    }

    // -- read discipline --------------------------------------------------

    pub fn is_stack_loc(&self, l: &Loc) -> bool {
        self.stack_locs.contains(l)
    }

    pub fn find_opt(&self, l: &Loc) -> Option<&AbstractValue> {
        self.mem_pure.find_opt(l)
    }

    pub fn find_stack(&self, l: &Loc) -> AbstractValue {
        self.find_opt(l).cloned().unwrap_or_else(AbstractValue::bot)
    }

    /// An unmapped heap cell defaults to top interval, not bottom — unlike
    /// the stack, the absence of an entry means "not modeled yet", not
    /// "unreachable" (spec §4.6).
    pub fn find_heap(&self, l: &Loc) -> AbstractValue {
        self.find_opt(l)
            .cloned()
            .unwrap_or_else(AbstractValue::top_interval)
    }

    pub fn find(&self, l: &Loc) -> AbstractValue {
        if self.is_stack_loc(l) {
            self.find_stack(l)
        } else {
            self.find_heap(l)
        }
    }

    /// Join of `find(l)` over every `l` in `p`; a target set that's itself
    /// top (`PowLoc::Unknown`) has no enumerable locations to fold over, so
    /// it reads as a fully-top value instead (spec §4.6).
    pub fn find_set(&self, p: &PowLoc) -> AbstractValue {
        if matches!(p, PowLoc::Unknown) {
            return AbstractValue::top_value();
        }
        p.fold(AbstractValue::bot(), |acc, l| acc.join(&self.find(l)))
    }

    // -- write discipline ---------------------------------------------------

    fn demote_latest_prune(&self, written: &Loc) -> LatestPrune {
        self.latest_prune.demote_unless(written)
    }

    pub fn add_stack(&self, l: Loc, v: AbstractValue) -> Self {
        ReachableMemory {
            stack_locs: self.stack_locs.insert(l.clone()),
            mem_pure: self.mem_pure.insert(l.clone(), v),
            latest_prune: self.demote_latest_prune(&l),
            ..self.clone()
        }
    }

    pub fn replace_stack(&self, l: Loc, v: AbstractValue) -> Self {
        ReachableMemory {
            mem_pure: self.mem_pure.insert(l.clone(), v),
            latest_prune: self.demote_latest_prune(&l),
            ..self.clone()
        }
    }

    /// Materialize `v`'s relational symbols to name `l` itself (spec §4.6
    /// `add_heap`): `sym` becomes `of_loc(l)` unless the interval is empty
    /// (an unreachable numeric value has nothing to name); `offset_sym`/
    /// `size_sym` become `of_loc_offset`/`of_loc_size` unless `arrayblk` is
    /// bottom (a non-pointer value has no array offset/size to name).
    fn materialize_symbols(l: &Loc, v: &AbstractValue) -> AbstractValue {
        let sym = if v.itv.is_empty() {
            v.sym.clone()
        } else {
            Sym::of_loc(l.clone())
        };
        let (offset_sym, size_sym) = if v.arrayblk.is_bot() {
            (v.offset_sym.clone(), v.size_sym.clone())
        } else {
            (Sym::of_loc_offset(l.clone()), Sym::of_loc_size(l.clone()))
        };
        AbstractValue {
            sym,
            offset_sym,
            size_sym,
            ..v.clone()
        }
    }

    pub fn add_heap(&self, l: Loc, v: AbstractValue) -> Self {
        let v = Self::materialize_symbols(&l, &v);
        ReachableMemory {
            mem_pure: self.mem_pure.insert(l.clone(), v),
            latest_prune: self.demote_latest_prune(&l),
            ..self.clone()
        }
    }

    fn write_one(&self, l: &Loc, v: AbstractValue) -> Self {
        if self.is_stack_loc(l) {
            self.replace_stack(l.clone(), v)
        } else {
            self.add_heap(l.clone(), v)
        }
    }

    pub fn strong_update(&self, p: &PowLoc, v: &AbstractValue) -> Self {
        p.fold(self.clone(), |mem, l| mem.write_one(l, v.clone()))
    }

    pub fn weak_update(&self, p: &PowLoc, v: &AbstractValue) -> Self {
        p.fold(self.clone(), |mem, l| {
            let joined = mem.find(l).join(v);
            mem.write_one(l, joined)
        })
    }

    /// A singleton target whose sole location isn't a summary node is the
    /// only case where overwriting is sound (spec §4.6 `can_strong_update`).
    pub fn can_strong_update(&self, p: &PowLoc) -> bool {
        p.singleton_elem().is_some_and(|l| !is_summary_node(l))
    }

    pub fn update_mem(&self, p: &PowLoc, v: &AbstractValue) -> Self {
        if self.can_strong_update(p) {
            self.strong_update(p, v)
        } else {
            self.weak_update(p, v)
        }
    }

    /// Like `weak_update`, but the value written at each location is
    /// `f(current) ⊔ current` rather than a caller-supplied fixed value
    /// (spec §4.6 `transform_mem`).
    pub fn transform_mem(&self, f: impl Fn(&AbstractValue) -> AbstractValue, p: &PowLoc) -> Self {
        p.fold(self.clone(), |mem, l| {
            let cur = mem.find(l);
            let next = cur.join(&f(&cur));
            mem.write_one(l, next)
        })
    }

    // -- unknown calls ------------------------------------------------------

    /// Bind `Loc::of_id(id)` to `unknown_from(callee, location)` as a stack
    /// entry, and also join that value into `Loc::unknown` on the heap so
    /// downstream reads through `unknown` observe the pollution (spec §4.6
    /// `add_unknown_from`).
    pub fn add_unknown_from(&self, id: Ident, callee: Option<ProcName>, location: Location) -> Self {
        let v = AbstractValue::unknown_from(callee, location);
        let with_stack = self.add_stack(Loc::of_id(id), v.clone());
        with_stack.weak_update(&PowLoc::singleton(Loc::unknown()), &v)
    }

    // -- pruning integration --------------------------------------------------

    pub fn set_prune_pairs(&self, p: PrunePairs) -> Self {
        ReachableMemory {
            latest_prune: LatestPrune::latest(p),
            ..self.clone()
        }
    }

    /// Promote `Latest(p)` to `TrueBranch`/`FalseBranch(x, p)` when `lhs` is
    /// a program variable and `rhs` is the constant `0` or `1`; any other
    /// write demotes the record to `Top` (spec §4.6 `update_latest_prune`).
    pub fn update_latest_prune(&self, lhs: &Loc, rhs: &AbstractValue) -> Self {
        let latest_prune = match &self.latest_prune {
            LatestPrune::Latest(p) if matches!(lhs, Loc::Var(_)) && rhs.itv.eq_const(1) => {
                LatestPrune::TrueBranch(lhs.clone(), p.clone())
            }
            LatestPrune::Latest(p) if matches!(lhs, Loc::Var(_)) && rhs.itv.eq_const(0) => {
                LatestPrune::FalseBranch(lhs.clone(), p.clone())
            }
            _ => LatestPrune::Top,
        };
        ReachableMemory {
            latest_prune,
            ..self.clone()
        }
    }

    /// When `cond` names a temporary the alias map currently equates with
    /// the variable `latest_prune` tracked a branch on, fold the matching
    /// `PrunePairs` side back into memory (spec §4.6 `apply_latest_prune`).
    pub fn apply_latest_prune(&self, cond: &Exp) -> Self {
        let (id, negated) = match cond {
            Exp::Var(id) => (*id, false),
            Exp::UnOp(bo_ir::UnOp::LNot, inner) => match inner.as_ref() {
                Exp::Var(id) => (*id, true),
                _ => return self.clone(),
            },
            _ => return self.clone(),
        };
        let LatestPrune::V(x, p_true, p_false) = &self.latest_prune else {
            return self.clone();
        };
        let aliases_x = matches!(
            self.alias.map.find(&id),
            Some(crate::alias::AliasTarget::Simple(l)) if l == x
        );
        if !aliases_x {
            return self.clone();
        }
        let chosen = if negated { p_false } else { p_true };
        chosen
            .iter()
            .fold(self.clone(), |mem, (l, v)| mem.update_mem(&PowLoc::singleton(l.clone()), v))
    }

    // -- reachability --------------------------------------------------------

    /// Smallest set containing `roots` and closed under "if `l` is in, add
    /// `get_all_locs(mem_pure[l])` and every field-of-`l`" (spec §4.6
    /// `get_reachable_locs_from`). Used to restrict a procedure summary to
    /// locations actually reachable from its formals/globals.
    pub fn get_reachable_locs_from(&self, roots: &[Loc]) -> BTreeSet<Loc> {
        let mut reached: BTreeSet<Loc> = roots.iter().cloned().collect();
        loop {
            let mut grew = false;
            for k in self.mem_pure.keys() {
                if reached.contains(k) {
                    continue;
                }
                if k.base_chain().iter().any(|b| reached.contains(*b)) {
                    reached.insert(k.clone());
                    grew = true;
                }
            }
            let mut newly_reachable = Vec::new();
            for l in &reached {
                if let Some(v) = self.mem_pure.find_opt(l) {
                    for loc in v.get_all_locs().iter() {
                        if !reached.contains(loc) {
                            newly_reachable.push(loc.clone());
                        }
                    }
                }
            }
            if !newly_reachable.is_empty() {
                grew = true;
                reached.extend(newly_reachable);
            }
            if !grew {
                break;
            }
        }
        reached
    }

    // -- relational store -----------------------------------------------------

    pub fn get_relation(&self) -> &Relation {
        &self.relation
    }

    pub fn is_relation_unsat(&self) -> bool {
        self.relation.is_unsat()
    }

    pub fn meet_constraints(&self, cs: &[(Sym, Sym, num_bigint::BigInt)], cfg: &Config) -> Self {
        if !cfg.relational_domain_enabled {
            return self.clone();
        }
        ReachableMemory {
            relation: self.relation.meet_constraints(cs),
            ..self.clone()
        }
    }

    pub fn store_relation(&self, p: &PowLoc, sym_val: &Sym, sym_off: &Sym, sym_size: &Sym, cfg: &Config) -> Self {
        if !cfg.relational_domain_enabled {
            return self.clone();
        }
        ReachableMemory {
            relation: self.relation.store_relation(p, sym_val, sym_off, sym_size),
            ..self.clone()
        }
    }

    pub fn forget_locs(&self, p: &PowLoc, cfg: &Config) -> Self {
        if !cfg.relational_domain_enabled {
            return self.clone();
        }
        ReachableMemory {
            relation: self.relation.forget_locs(p),
            ..self.clone()
        }
    }

    pub fn init_param_relation(&self, l: &Loc, cfg: &Config) -> Self {
        if !cfg.relational_domain_enabled {
            return self.clone();
        }
        ReachableMemory {
            relation: self.relation.init_param(l),
            ..self.clone()
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
        if !cfg.relational_domain_enabled {
            return self.clone();
        }
        ReachableMemory {
            relation: self.relation.init_array(allocsite, offset, size, size_exp),
            ..self.clone()
        }
    }

    pub fn instantiate_relation(&self, substmap: &SubstMap, callee: &Relation, cfg: &Config) -> Self {
        if !cfg.relational_domain_enabled {
            return self.clone();
        }
        ReachableMemory {
            relation: Relation::instantiate(substmap, &self.relation, callee),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bo_itv::Itv;
    use bo_utils::idx::Idx;

    #[test]
    fn find_stack_defaults_to_bottom() {
        let m = ReachableMemory::init();
        assert!(m.find_stack(&Loc::var("x")).is_bot());
    }

    #[test]
    fn find_heap_defaults_to_top_interval() {
        let m = ReachableMemory::init();
        assert_eq!(m.find_heap(&Loc::var("x")).itv, Itv::top());
    }

    #[test]
    fn add_stack_then_find_roundtrips() {
        let m = ReachableMemory::init().add_stack(Loc::var("x"), AbstractValue::of_int(3));
        assert!(m.is_stack_loc(&Loc::var("x")));
        assert_eq!(m.find(&Loc::var("x")).itv, Itv::of_int(3));
    }

    #[test]
    fn weak_update_joins_with_current() {
        let m = ReachableMemory::init().add_stack(Loc::var("x"), AbstractValue::of_int(3));
        let m2 = m.weak_update(&PowLoc::singleton(Loc::var("x")), &AbstractValue::of_int(5));
        assert_eq!(
            m2.find(&Loc::var("x")).itv,
            Itv::of_int(3).join(&Itv::of_int(5))
        );
    }

    #[test]
    fn can_strong_update_false_for_summary_node() {
        let site = bo_ir::Allocsite::new("a");
        let p = PowLoc::singleton(Loc::allocsite(site));
        let m = ReachableMemory::init();
        assert!(!m.can_strong_update(&p));
    }

    #[test]
    fn update_mem_strong_updates_singleton_non_summary() {
        let m = ReachableMemory::init().add_stack(Loc::var("x"), AbstractValue::of_int(3));
        let m2 = m.update_mem(&PowLoc::singleton(Loc::var("x")), &AbstractValue::of_int(9));
        assert_eq!(m2.find(&Loc::var("x")).itv, Itv::of_int(9));
    }

    #[test]
    fn add_heap_materializes_symbols() {
        let m = ReachableMemory::init();
        let m = m.add_heap(Loc::var("h"), AbstractValue::of_int(1));
        let v = m.find_opt(&Loc::var("h")).unwrap();
        assert_eq!(v.sym, Sym::of_loc(Loc::var("h")));
    }

    #[test]
    fn update_latest_prune_promotes_on_boolean_assign() {
        let m = ReachableMemory::init().set_prune_pairs(PrunePairs::top());
        let m = m.update_latest_prune(&Loc::var("b"), &AbstractValue::of_int(1));
        assert!(matches!(m.latest_prune, LatestPrune::TrueBranch(ref x, _) if x == &Loc::var("b")));
    }

    #[test]
    fn unrelated_write_demotes_latest_prune_to_top() {
        let m = ReachableMemory::init().set_prune_pairs(PrunePairs::top());
        let m = m.update_latest_prune(&Loc::var("b"), &AbstractValue::of_int(1));
        let m = m.add_stack(Loc::var("other"), AbstractValue::of_int(0));
        assert_eq!(m.latest_prune, LatestPrune::Top);
    }

    #[test]
    fn apply_latest_prune_refines_through_alias() {
        let x = Loc::var("x");
        let r_id = Ident::new(0);
        let pairs = PrunePairs::top().add(x.clone(), AbstractValue::of_int(1));
        let lp = LatestPrune::V(x.clone(), pairs, PrunePairs::top());
        let m = ReachableMemory {
            alias: Alias::empty(),
            latest_prune: lp,
            ..ReachableMemory::init()
        };
        let m = ReachableMemory {
            alias: Alias {
                map: m.alias.map.load(r_id, crate::alias::AliasTarget::Simple(x.clone())),
                ret: m.alias.ret.clone(),
            },
            ..m
        };
        let m = m.add_stack(x.clone(), AbstractValue::of_interval(Itv::top(), None));
        let m = ReachableMemory {
            latest_prune: LatestPrune::V(
                x.clone(),
                PrunePairs::top().add(x.clone(), AbstractValue::of_int(1)),
                PrunePairs::top(),
            ),
            ..m
        };
        let refined = m.apply_latest_prune(&Exp::Var(r_id));
        assert_eq!(refined.find(&x).itv, Itv::of_int(1));
    }

    #[test]
    fn get_reachable_locs_from_follows_powloc_chain() {
        let a = Loc::var("a");
        let b = Loc::var("b");
        let c = Loc::var("c");
        let m = ReachableMemory::init()
            .add_stack(a.clone(), AbstractValue::of_location(b.clone()))
            .add_stack(b.clone(), AbstractValue::of_location(c.clone()))
            .add_stack(c.clone(), AbstractValue::bot());
        let reached = m.get_reachable_locs_from(&[a.clone()]);
        assert!(reached.contains(&a) && reached.contains(&b) && reached.contains(&c));
    }
}
