//! A toy fixed-point driver wiring `bo_domain` together end to end.
//!
//! Analyzes a single synthetic loop:
//!
//! ```text
//! arr = alloc(size = 10)
//! i = 0
//! while i < 10 {
//!     // would be: arr[i] = 0
//!     i = i + 1
//! }
//! ```
//!
//! and reports, at the loop exit, whether every write the loop performed
//! stayed within `arr`'s bounds. This crate is not itself a checker (spec
//! §1 places front-ends and checkers out of scope) — it exists to show the
//! lattice converging the way a real driver would use it.

use bo_arrayblk::ArrayBlk;
use bo_domain::{AbstractValue, Memory};
use bo_ir::{Allocsite, Loc, PowLoc};
use bo_itv::{CompOp, Itv};
use bo_traces::TraceSet;
use tracing::{debug, info};

fn main() {
    init_bo_logger();

    let cfg = bo_config::Config::from_env("BO").unwrap_or_default();
    debug!(?cfg, "loaded configuration");

    let arr = Loc::var("arr");
    let i = Loc::var("i");
    let site = Allocsite::new("arr_alloc");

    let initial_array = AbstractValue::of_array_alloc(
        site.clone(),
        Some(Itv::of_int(1)),
        Itv::of_int(0),
        Itv::of_int(10),
        TraceSet::empty(),
    );

    let m0 = Memory::init()
        .add_stack(arr.clone(), initial_array)
        .add_stack(i.clone(), AbstractValue::of_int(0));

    let final_mem = run_loop_to_fixpoint(m0, &i, &cfg);

    let i_val = final_mem.find(&i);
    let arr_val = final_mem.find(&arr);
    info!(%i_val, %arr_val, "loop reached fixpoint");

    report_bounds_check(&i_val, &arr_val);
}

/// Repeatedly apply the loop body until the memory stabilizes, widening
/// after the first couple of rounds so an unbounded trip count still
/// converges in finitely many steps (spec §5's termination requirement).
fn run_loop_to_fixpoint(entry: Memory, i: &Loc, cfg: &bo_config::Config) -> Memory {
    let mut mem = entry;
    for iter in 0.. {
        let after_body = loop_body(&mem, i, cfg);
        let next = if iter < 2 {
            mem.join(&after_body)
        } else {
            mem.widen(&after_body, iter)
        };
        debug!(iter, %next, "post-iteration memory");
        if next.leq(&mem) {
            return next;
        }
        mem = next;
        if iter > 1000 {
            panic!("fixed point failed to converge after 1000 iterations");
        }
    }
    unreachable!()
}

/// One pass of `i < 10 { i = i + 1 }`: prune `i` under the loop condition,
/// then increment it.
fn loop_body(mem: &Memory, i: &Loc, cfg: &bo_config::Config) -> Memory {
    let i_val = mem.find(i);
    let pruned = i_val.prune_comp(CompOp::Lt, &Itv::of_int(10), cfg);
    let incremented = pruned.plus(&AbstractValue::of_int(1));
    mem.update_mem(&PowLoc::singleton(i.clone()), &incremented)
}

/// Compare the index interval against the array's size interval and print
/// a verdict — the kind of query a real buffer-overrun checker would run
/// against this domain at every array access.
fn report_bounds_check(i_val: &AbstractValue, arr_val: &AbstractValue) {
    let ArrayBlk::Map(sites) = &arr_val.arrayblk else {
        println!("array value has no concrete allocation site; cannot bound-check");
        return;
    };
    for (site, info) in sites {
        let in_bounds = i_val.itv.lt_sem(&info.size);
        if in_bounds.eq_const(1) {
            println!("{}: every access via `i` (itv={}) stays within size {}", site, i_val.itv, info.size);
        } else if in_bounds.eq_const(0) {
            println!("{}: `i` (itv={}) can reach or exceed size {}", site, i_val.itv, info.size);
        } else {
            println!(
                "{}: cannot prove `i` (itv={}) stays within size {} (possible overrun)",
                site, i_val.itv, info.size
            );
        }
    }
}

fn init_bo_logger() {
    if let Err(err) = bo_log::Logger::init_logger(
        bo_log::LoggerConfig::from_env("BO").expect("BO_* environment variables must be valid unicode"),
    ) {
        eprintln!("error initializing logger: {}", err);
        std::process::exit(1);
    }
}
