//! Front-end vocabulary shared by the abstract domain: abstract locations,
//! allocation sites, SSA-style identifiers, and a minimal expression tree.
//!
//! None of this crate's types model the actual SIL/CFG front-end (spec §1
//! calls that an external collaborator); they only give the domain crates
//! something concrete to index maps and lattice elements by.

pub mod allocsite;
pub mod exp;
pub mod ident;
pub mod loc;
pub mod location;
pub mod pow_loc;
pub mod proc_name;

pub use allocsite::Allocsite;
pub use exp::{BinOp, Exp, UnOp};
pub use ident::Ident;
pub use loc::Loc;
pub use location::Location;
pub use pow_loc::PowLoc;
pub use proc_name::ProcName;
