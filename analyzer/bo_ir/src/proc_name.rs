/// The name of a procedure, used to tag `UnknownFrom` traces when a call to
/// an unmodeled callee returns a top value.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ProcName(pub String);

impl std::fmt::Display for ProcName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProcName {
    fn from(s: &str) -> Self {
        ProcName(s.to_string())
    }
}
