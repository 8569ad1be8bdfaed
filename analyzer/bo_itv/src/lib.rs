//! The interval lattice (spec §6's external `Itv`): bottom, or a closed
//! range whose endpoints are infinite, concrete, or a single symbolic term.
//!
//! Declared out of scope by spec §1 ("the interval library itself ...
//! assumed to provide a complete bounded lattice with widening and
//! arithmetic"); implemented here as the concrete collaborator the rest of
//! the workspace links against.

pub mod bound;
pub mod itv;

pub use bound::Bound;
pub use itv::{CompOp, Itv};
