//! Source locations, used only to tag traces and symbolic assignments; the
//! domain never inspects their contents.

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Location {
    pub line: u32,
    pub col: u32,
}

impl Location {
    pub fn new(line: u32, col: u32) -> Self {
        Location { line, col }
    }

    /// A placeholder location for synthesized values that don't correspond
    /// to any single source position (e.g. procedure-entry initialization).
    pub fn synthetic() -> Self {
        Location { line: 0, col: 0 }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
