//! `AbstractValue` (spec §3/§4.1): the lattice element attached to every
//! location and expression. A product of six lattice components (`itv`,
//! `sym`, `powloc`, `arrayblk`, `offset_sym`, `size_sym`) plus two scalar
//! fields (`traces`, `represents_multiple_values`).

use bo_arrayblk::ArrayBlk;
use bo_config::Config;
use bo_ir::{Allocsite, BinOp, Loc, Location, PowLoc, ProcName};
use bo_itv::{CompOp, Itv};
use bo_relation::Sym;
use bo_symtab::{SymbolPath, SymbolSet, SymbolTable};
use bo_traces::{TraceElem, TraceSet};

/// A numeric interval, pointer descriptor, and relational-symbol bundle,
/// with provenance traces attached.
///
/// See spec §3 for the field-by-field meaning and the invariants every
/// constructor is expected to respect (bottom has all six components at
/// their bottoms; `arrayblk` bottom implies `offset_sym`/`size_sym` bottom
/// for values built by array allocation).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AbstractValue {
    pub itv: Itv,
    pub sym: Sym,
    pub powloc: PowLoc,
    pub arrayblk: ArrayBlk,
    pub offset_sym: Sym,
    pub size_sym: Sym,
    pub traces: TraceSet,
    pub represents_multiple_values: bool,
}

impl AbstractValue {
    pub fn bot() -> Self {
        AbstractValue {
            itv: Itv::bot(),
            sym: Sym::bot(),
            powloc: PowLoc::bot(),
            arrayblk: ArrayBlk::bot(),
            offset_sym: Sym::bot(),
            size_sym: Sym::bot(),
            traces: TraceSet::empty(),
            represents_multiple_values: false,
        }
    }

    /// `itv = top`, every other component bottom: the value of a numeric
    /// cell about which nothing is known (spec §4.6's `find_heap` default
    /// on miss).
    pub fn top_interval() -> Self {
        AbstractValue {
            itv: Itv::top(),
            ..AbstractValue::bot()
        }
    }

    /// Top across every component: "this could be any number, or point
    /// anywhere, into any array". Used where a target location set is
    /// itself `PowLoc::Unknown` and no finite join can be taken (spec §4.6
    /// `find_set`).
    pub fn top_value() -> Self {
        AbstractValue {
            itv: Itv::top(),
            powloc: PowLoc::unknown(),
            arrayblk: ArrayBlk::unknown(),
            represents_multiple_values: true,
            ..AbstractValue::bot()
        }
    }

    pub fn of_int(n: i64) -> Self {
        AbstractValue {
            itv: Itv::of_int(n),
            ..AbstractValue::bot()
        }
    }

    pub fn of_big_int(n: num_bigint::BigInt) -> Self {
        AbstractValue {
            itv: Itv::of_big_int(n),
            ..AbstractValue::bot()
        }
    }

    pub fn of_interval(i: Itv, traces: Option<TraceSet>) -> Self {
        AbstractValue {
            itv: i,
            traces: traces.unwrap_or_else(TraceSet::empty),
            ..AbstractValue::bot()
        }
    }

    pub fn of_location(l: Loc) -> Self {
        AbstractValue {
            powloc: PowLoc::singleton(l),
            ..AbstractValue::bot()
        }
    }

    pub fn of_powloc(p: PowLoc, traces: TraceSet) -> Self {
        AbstractValue {
            powloc: p,
            traces,
            ..AbstractValue::bot()
        }
    }

    /// Build an array value pointing only at `allocsite` (spec §4.1
    /// `of_array_alloc`). `stride` defaults to the natural-number interval
    /// when unknown (delegated to `ArrayBlk::make`). `offset_sym`/`size_sym`
    /// are set to the relational symbols named after `allocsite` itself —
    /// the one case where those symbols exist before the value has ever
    /// been stored through a location (`add_heap` normally materializes
    /// them by location instead).
    pub fn of_array_alloc(
        allocsite: Allocsite,
        stride: Option<Itv>,
        offset: Itv,
        size: Itv,
        traces: TraceSet,
    ) -> Self {
        AbstractValue {
            arrayblk: ArrayBlk::make(allocsite.clone(), offset, size, stride),
            offset_sym: Sym::of_allocsite_offset(allocsite.clone()),
            size_sym: Sym::of_allocsite_size(allocsite),
            traces,
            ..AbstractValue::bot()
        }
    }

    /// Build a symbolic input value (spec §4.1 `make_symbolic`): a fresh
    /// interval symbol drawn from `symtab`, a relational symbol naming
    /// `loc`, and a trace recording the symbolic assignment.
    ///
    /// The spec's signature also names a `proc` and a `counter` parameter;
    /// both are accepted here for call-site fidelity but unused — freshness
    /// comes entirely from `symtab` (see `SymbolTable::make_fresh`), and a
    /// symbol doesn't need to be tagged with its owning procedure once the
    /// table itself is scoped per-procedure (see DESIGN.md).
    pub fn make_symbolic(
        loc: &Loc,
        _proc: &ProcName,
        symtab: &SymbolTable,
        path: SymbolPath,
        _counter: u32,
        location: Location,
        unsigned: bool,
    ) -> Self {
        let represents_multiple_values = path.represents_multiple_values();
        let (itv, _sym) = Itv::make_sym(symtab, path, unsigned);
        AbstractValue {
            itv,
            sym: Sym::of_loc(loc.clone()),
            traces: TraceSet::singleton(TraceElem::SymAssign(loc.clone(), location)),
            represents_multiple_values,
            ..AbstractValue::bot()
        }
    }

    /// A fully top value tagged with an `UnknownFrom` trace, returned
    /// whenever a call to an unmodeled procedure produces a value (spec
    /// §4.1). Top across `itv`/`powloc`/`arrayblk` since the domain has no
    /// summary to say whether the callee returned a number, a pointer, or
    /// an array.
    pub fn unknown_from(callee: Option<ProcName>, location: Location) -> Self {
        AbstractValue {
            itv: Itv::top(),
            powloc: PowLoc::unknown(),
            arrayblk: ArrayBlk::unknown(),
            traces: TraceSet::singleton(TraceElem::UnknownFrom(callee, location)),
            represents_multiple_values: true,
            ..AbstractValue::bot()
        }
    }

    // -- lattice -----------------------------------------------------

    pub fn is_bot(&self) -> bool {
        self.itv.is_bot()
            && self.sym == Sym::bot()
            && self.powloc.is_bot()
            && self.arrayblk.is_bot()
            && self.offset_sym == Sym::bot()
            && self.size_sym == Sym::bot()
    }

    /// Pointwise over the six lattice components (spec §4.1); `traces` and
    /// `represents_multiple_values` aren't part of the order.
    pub fn leq(&self, other: &Self) -> bool {
        self.itv.leq(&other.itv)
            && self.sym.leq(&other.sym)
            && self.powloc.leq(&other.powloc)
            && self.arrayblk.leq(&other.arrayblk)
            && self.offset_sym.leq(&other.offset_sym)
            && self.size_sym.leq(&other.size_sym)
    }

    pub fn join(&self, other: &Self) -> Self {
        if self == other {
            return self.clone();
        }
        AbstractValue {
            itv: self.itv.join(&other.itv),
            sym: self.sym.join(&other.sym),
            powloc: self.powloc.join(&other.powloc),
            arrayblk: self.arrayblk.join(&other.arrayblk),
            offset_sym: self.offset_sym.join(&other.offset_sym),
            size_sym: self.size_sym.join(&other.size_sym),
            traces: self.traces.join(&other.traces),
            represents_multiple_values: self.represents_multiple_values
                || other.represents_multiple_values,
        }
    }

    pub fn widen(&self, other: &Self, num_iters: usize) -> Self {
        if self == other {
            return self.clone();
        }
        AbstractValue {
            itv: self.itv.widen(&other.itv, num_iters),
            sym: self.sym.join(&other.sym),
            powloc: self.powloc.widen(&other.powloc, num_iters),
            arrayblk: self.arrayblk.widen(&other.arrayblk, num_iters),
            offset_sym: self.offset_sym.join(&other.offset_sym),
            size_sym: self.size_sym.join(&other.size_sym),
            traces: self.traces.widen(&other.traces, num_iters),
            represents_multiple_values: self.represents_multiple_values
                || other.represents_multiple_values,
        }
    }

    /// `get_all_locs(v) = powloc(v) ∪ locations(arrayblk(v))` (spec §3).
    pub fn get_all_locs(&self) -> PowLoc {
        self.powloc.union(&self.arrayblk.get_pow_loc())
    }

    pub fn get_symbols(&self) -> SymbolSet {
        let mut out = self.itv.get_symbols();
        out.extend(self.arrayblk.get_symbols());
        out
    }

    // -- arithmetic ----------------------------------------------------

    fn arith(&self, other: &Self, f: impl FnOnce(&Itv, &Itv) -> Itv) -> Self {
        AbstractValue::of_interval(f(&self.itv, &other.itv), Some(self.traces.join(&other.traces)))
    }

    pub fn plus(&self, other: &Self) -> Self {
        self.arith(other, Itv::plus)
    }

    pub fn minus(&self, other: &Self) -> Self {
        self.arith(other, Itv::minus)
    }

    pub fn mult(&self, other: &Self) -> Self {
        self.arith(other, Itv::mult)
    }

    pub fn div(&self, other: &Self) -> Self {
        self.arith(other, Itv::div)
    }

    pub fn modulo(&self, other: &Self) -> Self {
        self.arith(other, Itv::mod_sem)
    }

    pub fn shiftlt(&self, other: &Self) -> Self {
        self.arith(other, Itv::shiftlt)
    }

    pub fn shiftrt(&self, other: &Self) -> Self {
        self.arith(other, Itv::shiftrt)
    }

    pub fn band(&self, other: &Self) -> Self {
        self.arith(other, Itv::band_sem)
    }

    pub fn neg(&self) -> Self {
        AbstractValue::of_interval(self.itv.neg(), Some(self.traces.clone()))
    }

    pub fn lnot(&self) -> Self {
        AbstractValue::of_interval(self.itv.lnot(), Some(self.traces.clone()))
    }

    // -- comparison ------------------------------------------------------

    /// True when this value carries any non-bottom pointer/array
    /// information — the condition under which a comparison loses
    /// precision to top-boolean (spec §4.1).
    fn has_pointer_info(&self) -> bool {
        !self.powloc.is_bot() || !self.arrayblk.is_bot()
    }

    fn compare(&self, other: &Self, f: impl FnOnce(&Itv, &Itv) -> Itv) -> Self {
        let traces = self.traces.join(&other.traces);
        if self.has_pointer_info() || other.has_pointer_info() {
            return AbstractValue::of_interval(Itv::of_bool(None), Some(traces));
        }
        AbstractValue::of_interval(f(&self.itv, &other.itv), Some(traces))
    }

    pub fn lt(&self, other: &Self) -> Self {
        self.compare(other, Itv::lt_sem)
    }

    pub fn le(&self, other: &Self) -> Self {
        self.compare(other, Itv::le_sem)
    }

    pub fn gt(&self, other: &Self) -> Self {
        self.compare(other, Itv::gt_sem)
    }

    pub fn ge(&self, other: &Self) -> Self {
        self.compare(other, Itv::ge_sem)
    }

    pub fn eq_val(&self, other: &Self) -> Self {
        self.compare(other, Itv::eq_sem)
    }

    pub fn ne_val(&self, other: &Self) -> Self {
        self.compare(other, Itv::ne_sem)
    }

    pub fn land(&self, other: &Self) -> Self {
        self.compare(other, Itv::land_sem)
    }

    pub fn lor(&self, other: &Self) -> Self {
        self.compare(other, Itv::lor_sem)
    }

    /// Dispatch a front-end `BinOp` to the matching arithmetic or
    /// comparison method; used by transfer functions that evaluate a
    /// generic `Exp::BinOp` node.
    pub fn apply_binop(&self, op: BinOp, other: &Self) -> Self {
        match op {
            BinOp::Plus => self.plus(other),
            BinOp::Minus => self.minus(other),
            BinOp::Mult => self.mult(other),
            BinOp::Div => self.div(other),
            BinOp::Mod => self.modulo(other),
            BinOp::Shiftlt => self.shiftlt(other),
            BinOp::Shiftrt => self.shiftrt(other),
            BinOp::Band => self.band(other),
            BinOp::Lt => self.lt(other),
            BinOp::Le => self.le(other),
            BinOp::Gt => self.gt(other),
            BinOp::Ge => self.ge(other),
            BinOp::Eq => self.eq_val(other),
            BinOp::Ne => self.ne_val(other),
            BinOp::LAnd => self.land(other),
            BinOp::LOr => self.lor(other),
        }
    }

    // -- pointer arithmetic ----------------------------------------------

    /// `plus_pointer`/`minus_pointer` (spec §4.1): shift an array
    /// descriptor's offset by `i`; a pointer-to-non-array collapses to top
    /// interval (model precision loss), with traces unioned either way.
    pub fn plus_pointer(&self, i: &Self) -> Self {
        self.shift_pointer(i, ArrayBlk::plus_offset)
    }

    pub fn minus_pointer(&self, i: &Self) -> Self {
        self.shift_pointer(i, ArrayBlk::minus_offset)
    }

    fn shift_pointer(&self, i: &Self, f: impl FnOnce(&ArrayBlk, &Itv) -> ArrayBlk) -> Self {
        let traces = self.traces.join(&i.traces);
        if !self.arrayblk.is_bot() {
            return AbstractValue {
                arrayblk: f(&self.arrayblk, &i.itv),
                traces,
                ..AbstractValue::bot()
            };
        }
        AbstractValue::of_interval(Itv::top(), Some(traces))
    }

    /// `minus_pointer_pointer` (spec §4.1): the offset delta between two
    /// array descriptors, or top if they share no allocation site (which
    /// also covers "both are pointers-to-non-array", since a bottom
    /// `arrayblk` never shares a site with anything).
    pub fn minus_pointer_pointer(&self, other: &Self) -> Self {
        let traces = self.traces.join(&other.traces);
        AbstractValue::of_interval(self.arrayblk.diff(&other.arrayblk), Some(traces))
    }

    // -- pruning ---------------------------------------------------------

    fn note_multi_valued_prune(&self, cfg: &Config) {
        if self.represents_multiple_values && cfg.write_html {
            tracing::debug!("pruned a multi-valued slot");
        }
    }

    /// Refines only the interval (spec §4.1).
    pub fn prune_eq_zero(&self) -> Self {
        AbstractValue {
            itv: self.itv.prune_eq_zero(),
            ..self.clone()
        }
    }

    pub fn prune_ne_zero(&self) -> Self {
        AbstractValue {
            itv: self.itv.prune_ne_zero(),
            ..self.clone()
        }
    }

    /// Refines both `itv` and `arrayblk` under the assumption `self op
    /// bound` holds — `arrayblk`'s size interval is what lets an
    /// array-length bounds check (`idx < arr.length`) refine `arr` itself.
    pub fn prune_comp(&self, op: CompOp, bound: &Itv, cfg: &Config) -> Self {
        self.note_multi_valued_prune(cfg);
        AbstractValue {
            itv: self.itv.prune_comp(op, bound),
            arrayblk: self.arrayblk.prune_comp(op, bound),
            ..self.clone()
        }
    }

    pub fn prune_eq(&self, bound: &Itv, cfg: &Config) -> Self {
        self.note_multi_valued_prune(cfg);
        AbstractValue {
            itv: self.itv.prune_eq(bound),
            arrayblk: self.arrayblk.prune_eq(bound),
            ..self.clone()
        }
    }

    pub fn prune_ne(&self, bound: &Itv, cfg: &Config) -> Self {
        self.note_multi_valued_prune(cfg);
        AbstractValue {
            itv: self.itv.prune_ne(bound),
            arrayblk: self.arrayblk.prune_ne(bound),
            ..self.clone()
        }
    }

    // -- substitution ------------------------------------------------------

    /// Instantiate a callee's value into the caller's vocabulary at a call
    /// site (spec §4.1 `substitute`): substitute every interval/array
    /// symbol through `eval_symbol`, and wrap this value's traces behind
    /// `call_site`, joined with whatever traces the caller already had for
    /// the symbols being substituted (looked up via `trace_of_symbol`).
    ///
    /// `sym`/`offset_sym`/`size_sym` are left untouched: those relational
    /// symbols are renamed by the relation store's own `instantiate`, not
    /// per-value (see `ReachableMemory::instantiate_relation`).
    pub fn substitute(
        &self,
        eval_symbol: &impl Fn(&bo_symtab::Symbol) -> Itv,
        trace_of_symbol: &impl Fn(&bo_symtab::Symbol) -> TraceSet,
        call_site: Location,
    ) -> Self {
        let symbols = self.get_symbols();
        let caller_traces = symbols
            .iter()
            .fold(TraceSet::empty(), |acc, s| acc.join(&trace_of_symbol(s)));
        let traces = TraceSet::call(call_site, &caller_traces, &self.traces);
        AbstractValue {
            itv: self.itv.subst(eval_symbol),
            arrayblk: self.arrayblk.subst(eval_symbol),
            traces,
            ..self.clone()
        }
    }

    // -- misc --------------------------------------------------------------

    /// Replace the array size interval with `len`'s interval and append an
    /// `ArrDecl` trace (spec §4.1 `set_array_length`).
    pub fn set_array_length(&self, location: Location, len: &Self) -> Self {
        AbstractValue {
            arrayblk: self.arrayblk.set_length(&len.itv),
            traces: self.traces.add_elem(TraceElem::ArrDecl(location)),
            ..self.clone()
        }
    }

    /// Replace the array stride if it differs from `new_stride` (spec §4.1
    /// `set_array_stride`; `ArrayBlk::set_stride` already no-ops when equal).
    pub fn set_array_stride(&self, new_stride: &Itv) -> Self {
        AbstractValue {
            arrayblk: self.arrayblk.set_stride(new_stride),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for AbstractValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{itv={}, sym={}, powloc={}, arrayblk={}, multi={}}}",
            self.itv, self.sym, self.powloc, self.arrayblk, self.represents_multiple_values
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bo_ir::Allocsite;

    #[test]
    fn bottom_has_every_component_at_bottom() {
        let v = AbstractValue::bot();
        assert!(v.is_bot());
        assert!(!v.represents_multiple_values);
    }

    #[test]
    fn plus_of_ints_matches_arithmetic() {
        let a = AbstractValue::of_int(3);
        let b = AbstractValue::of_int(4);
        assert_eq!(a.plus(&b).itv, Itv::of_int(7));
    }

    #[test]
    fn get_all_locs_of_location_is_singleton() {
        let l = Loc::var("x");
        let v = AbstractValue::of_location(l.clone());
        assert_eq!(v.get_all_locs(), PowLoc::singleton(l));
    }

    #[test]
    fn comparison_with_pointer_operand_is_top_boolean() {
        let ptr = AbstractValue::of_location(Loc::var("p"));
        let three = AbstractValue::of_int(3);
        let result = ptr.lt(&three);
        assert_eq!(result.itv, Itv::of_bool(None));
    }

    #[test]
    fn plus_pointer_shifts_offset_on_array_value() {
        let site = Allocsite::new("a");
        let v = AbstractValue::of_array_alloc(
            site.clone(),
            Some(Itv::of_int(4)),
            Itv::of_int(0),
            Itv::of_int(10),
            TraceSet::empty(),
        );
        let shifted = v.plus_pointer(&AbstractValue::of_int(3));
        assert_eq!(shifted.itv, Itv::bot());
        assert!(!shifted.arrayblk.is_bot());
    }

    #[test]
    fn plus_pointer_on_non_array_pointer_loses_precision() {
        let v = AbstractValue::of_location(Loc::var("p"));
        let shifted = v.plus_pointer(&AbstractValue::of_int(3));
        assert_eq!(shifted.itv, Itv::top());
        assert!(shifted.arrayblk.is_bot());
    }

    #[test]
    fn make_symbolic_tags_sym_assign_trace() {
        let tab = SymbolTable::new();
        let loc = Loc::var("n");
        let proc: ProcName = "foo".into();
        let location = Location::new(1, 0);
        let v = AbstractValue::make_symbolic(
            &loc,
            &proc,
            &tab,
            SymbolPath::root("n"),
            0,
            location,
            false,
        );
        assert!(!v.get_symbols().is_empty());
        assert_eq!(v.traces.len(), 1);
        assert!(v.traces.contains(&TraceElem::SymAssign(loc, location)));
    }

    #[test]
    fn unknown_from_is_top_with_trace() {
        let location = Location::new(4, 0);
        let v = AbstractValue::unknown_from(None, location);
        assert_eq!(v.itv, Itv::top());
        assert!(v.traces.contains(&TraceElem::UnknownFrom(None, location)));
    }

    #[test]
    fn set_array_length_replaces_size_and_appends_trace() {
        let site = Allocsite::new("a");
        let v = AbstractValue::of_array_alloc(
            site,
            None,
            Itv::of_int(0),
            Itv::of_int(10),
            TraceSet::empty(),
        );
        let location = Location::new(2, 0);
        let grown = v.set_array_length(location, &AbstractValue::of_int(20));
        assert!(grown.traces.contains(&TraceElem::ArrDecl(location)));
    }
}
