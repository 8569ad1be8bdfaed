//! End-to-end scenarios, one per numbered example in the domain's testable
//! properties: each builds a small memory by hand and checks the
//! user-visible behavior a checker built on this crate would rely on.

use bo_domain::alias::AliasTarget;
use bo_domain::{AbstractValue, Memory, PrunePairs};
use bo_ir::{Allocsite, Exp, Ident, Loc, Location, PowLoc, ProcName};
use bo_itv::Itv;
use bo_symtab::{SymbolPath, SymbolTable};
use bo_traces::TraceElem;
use bo_utils::idx::Idx;

#[test]
fn scenario_1_symbolic_input() {
    let tab = SymbolTable::new();
    let loc = Loc::var("a");
    let proc: ProcName = "P".into();
    let site = Location::new(10, 0);
    let v = AbstractValue::make_symbolic(
        &loc,
        &proc,
        &tab,
        SymbolPath::root("a"),
        0,
        site,
        false,
    );
    assert!(!v.get_symbols().is_empty());
    assert_eq!(v.traces.len(), 1);
    assert!(v.traces.contains(&TraceElem::SymAssign(loc, site)));
    assert_eq!(v.represents_multiple_values, SymbolPath::root("a").represents_multiple_values());
}

#[test]
fn scenario_2_branch_merge_applies_the_taken_side() {
    let x = Loc::var("x");
    let r = Ident::new(0);

    let m0 = Memory::init().add_stack(x.clone(), AbstractValue::top_interval());

    let m_true = m0
        .update_mem(&PowLoc::singleton(x.clone()), &AbstractValue::of_int(1))
        .set_prune_pairs(PrunePairs::top().add(x.clone(), AbstractValue::of_int(5)))
        .update_latest_prune(&x, &AbstractValue::of_int(1));

    let m_false = m0
        .update_mem(&PowLoc::singleton(x.clone()), &AbstractValue::of_int(0))
        .set_prune_pairs(PrunePairs::top().add(x.clone(), AbstractValue::of_int(6)))
        .update_latest_prune(&x, &AbstractValue::of_int(0));

    let joined = m_true.join(&m_false);
    let expected_prune = bo_domain::LatestPrune::V(
        x.clone(),
        PrunePairs::top().add(x.clone(), AbstractValue::of_int(5)),
        PrunePairs::top().add(x.clone(), AbstractValue::of_int(6)),
    );
    assert_eq!(joined.latest_prune(), expected_prune);

    let with_alias = match joined {
        Memory::NonBottom(rm) => Memory::NonBottom(bo_domain::ReachableMemory {
            alias: bo_domain::Alias {
                map: rm.alias.map.load(r, AliasTarget::Simple(x.clone())),
                ret: rm.alias.ret.clone(),
            },
            ..rm
        }),
        Memory::Bottom => panic!("expected reachable memory"),
    };

    let refined = with_alias.apply_latest_prune(&Exp::Var(r));
    assert_eq!(refined.find(&x).itv, Itv::of_int(5));
}

#[test]
fn scenario_3_array_allocation_and_growth() {
    let site = Allocsite::new("arr");
    let v = AbstractValue::of_array_alloc(
        site.clone(),
        Some(Itv::of_int(4)),
        Itv::of_int(0),
        Itv::of_int(10),
        bo_traces::TraceSet::empty(),
    );
    assert!(v.get_all_locs().mem(&Loc::allocsite(site)));

    let decl_site = Location::new(3, 1);
    let grown = v.set_array_length(decl_site, &AbstractValue::of_int(20));
    assert!(grown.traces.contains(&TraceElem::ArrDecl(decl_site)));
}

#[test]
fn scenario_4_unknown_call_pollutes_stack_and_unknown_loc() {
    let id = Ident::new(7);
    let callee: ProcName = "memcpy".into();
    let call_site = Location::new(5, 2);

    let m = Memory::init().add_unknown_from(id, Some(callee.clone()), call_site);

    let at_id = m.find(&Loc::of_id(id));
    assert_eq!(at_id.itv, Itv::top());
    assert!(at_id.traces.contains(&TraceElem::UnknownFrom(Some(callee.clone()), call_site)));

    let at_unknown = m.find(&Loc::unknown());
    assert_eq!(at_unknown.itv, Itv::top());
    assert!(at_unknown.traces.contains(&TraceElem::UnknownFrom(Some(callee), call_site)));
}

#[test]
fn scenario_5_comparison_with_pointer_is_top_boolean() {
    let ptr = AbstractValue::of_location(Loc::var("p"));
    let result = ptr.lt(&AbstractValue::of_int(3));
    assert_eq!(result.itv, Itv::of_bool(None));
}

#[test]
fn scenario_6_reachability_closure_follows_powloc_chain() {
    let a = Loc::var("a");
    let b = Loc::var("b");
    let c = Loc::var("c");
    let m = Memory::init()
        .add_stack(a.clone(), AbstractValue::of_location(b.clone()))
        .add_stack(b.clone(), AbstractValue::of_location(c.clone()))
        .add_stack(c.clone(), AbstractValue::bot());

    let reached = m.get_reachable_locs_from(&[a.clone()]);
    assert_eq!(reached.len(), 3);
    assert!(reached.contains(&a) && reached.contains(&b) && reached.contains(&c));
}
