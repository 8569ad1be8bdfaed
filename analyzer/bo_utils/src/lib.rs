//! Small, dependency-light building blocks shared by every `bo_*` crate:
//! newtype-indexed collections and variadic logging macros.
//!
//! This crate exists so that leaf crates (e.g. `bo_itv`, `bo_ir`) don't have
//! to pull in the whole `bo_domain` dependency graph just to get an
//! `IdxVec`.

pub mod idx;
pub mod index_slice;
pub mod index_vec;
pub mod variadic_log_macros;
