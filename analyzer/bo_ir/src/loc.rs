use crate::allocsite::Allocsite;
use crate::ident::Ident;
use std::sync::Arc;

/// An abstract location: a symbolic name for a run-time storage cell.
///
/// `Loc` has a total order so it can key a `BTreeMap`-backed pure memory and
/// so `PrunePairs`/`AliasMap` can be compared deterministically. Field
/// projections nest (`base.field`), matching how the front-end builds lvalues
/// one projection at a time.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Loc {
    /// A named program variable (a stack local, a formal, or a global).
    Var(Arc<str>),
    /// A field projection off another location.
    Field { base: Arc<Loc>, field: Arc<str> },
    /// The array object created at `Allocsite`.
    Allocsite(Allocsite),
    /// An SSA temporary treated as its own addressable slot — used when a
    /// value needs to live somewhere before any program variable aliases
    /// it (e.g. the direct result of a call to an unmodeled procedure).
    Temp(Ident),
    /// The distinguished top location: "could be anywhere". Reads/writes
    /// through `unknown` model pollution from unmodeled calls (spec §4.6).
    Unknown,
}

impl Loc {
    pub fn var(name: impl Into<Arc<str>>) -> Self {
        Loc::Var(name.into())
    }

    pub fn field(base: Loc, field: impl Into<Arc<str>>) -> Self {
        Loc::Field {
            base: Arc::new(base),
            field: field.into(),
        }
    }

    pub fn allocsite(site: Allocsite) -> Self {
        Loc::Allocsite(site)
    }

    pub fn of_id(id: Ident) -> Self {
        Loc::Temp(id)
    }

    pub fn unknown() -> Self {
        Loc::Unknown
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Loc::Unknown)
    }

    /// The distinguished variable a procedure's return value is written
    /// through, by convention — used by `Alias::store_simple`/`store_empty`
    /// to recognize a store to the return slot.
    pub fn ret() -> Self {
        Loc::Var(Arc::from("$ret"))
    }

    /// The locations this location is a field-projection chain on top of,
    /// innermost first; used by `get_reachable_locs_from`'s "every
    /// field-of-`l`" closure rule.
    pub fn base_chain(&self) -> Vec<&Loc> {
        let mut chain = Vec::new();
        let mut cur = self;
        while let Loc::Field { base, .. } = cur {
            chain.push(base.as_ref());
            cur = base.as_ref();
        }
        chain
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Loc::Var(name) => write!(f, "{}", name),
            Loc::Field { base, field } => write!(f, "{}.{}", base, field),
            Loc::Allocsite(a) => write!(f, "{}", a),
            Loc::Temp(id) => write!(f, "{}", id),
            Loc::Unknown => write!(f, "<unknown>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_projection_displays_dotted() {
        let l = Loc::field(Loc::var("x"), "f");
        assert_eq!(l.to_string(), "x.f");
    }

    #[test]
    fn unknown_is_unknown() {
        assert!(Loc::unknown().is_unknown());
        assert!(!Loc::var("x").is_unknown());
    }

    #[test]
    fn ret_is_a_plain_variable() {
        assert_eq!(Loc::ret(), Loc::var("$ret"));
    }
}
