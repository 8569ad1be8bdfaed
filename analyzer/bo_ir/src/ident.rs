use bo_utils::idx::Idx;

/// An SSA-style logical temporary introduced by the front-end.
///
/// `Ident`s are scoped to a single procedure; the alias map (`bo_domain`)
/// binds them to the program-variable `Loc` they currently stand for.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Ident(usize);

impl Idx for Ident {
    fn new(idx: usize) -> Self {
        Ident(idx)
    }

    fn idx(&self) -> usize {
        self.0
    }

    fn incr(&mut self) {
        self.0 += 1;
    }

    fn incr_by(&mut self, by: usize) {
        self.0 += by;
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idents_compare_by_index() {
        assert!(Ident::new(1) < Ident::new(2));
        assert_eq!(Ident::new(3).idx(), 3);
    }
}
