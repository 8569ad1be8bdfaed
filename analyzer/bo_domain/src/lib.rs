//! The buffer-overrun abstract domain: the lattice of abstract values and
//! the lattice of abstract memories a fixed-point iteration computes over.
//!
//! This crate is the core this workspace exists to teach: every other
//! `bo_*` crate is either front-end vocabulary (`bo_ir`) or an external
//! collaborator lattice (`bo_itv`, `bo_arrayblk`, `bo_relation`) this domain
//! is built on top of. Nothing here drives a fixed point itself — that's
//! the `bo` binary's toy driver, or in a real deployment an external
//! fixed-point engine — this crate only supplies the lattice element and
//! its operations.

pub mod alias;
pub mod latest_prune;
pub mod memory;
pub mod prune_pairs;
pub mod pure_memory;
pub mod reachable_memory;
pub mod stack_locs;
pub mod value;

pub use alias::{Alias, AliasMap, AliasReturn, AliasTarget};
pub use latest_prune::LatestPrune;
pub use memory::Memory;
pub use prune_pairs::PrunePairs;
pub use pure_memory::PureMemory;
pub use reachable_memory::ReachableMemory;
pub use stack_locs::StackLocSet;
pub use value::AbstractValue;
