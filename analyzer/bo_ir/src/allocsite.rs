/// Identifies the array object created at a single allocation program point.
///
/// Two allocations executed by the same source construct in different loop
/// iterations or recursive calls collapse to the same `Allocsite`, which is
/// exactly why array descriptors (`bo_arrayblk`) must track an *interval* of
/// possible sizes/offsets rather than a single concrete value.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Allocsite(pub String);

impl Allocsite {
    pub fn new(tag: impl Into<String>) -> Self {
        Allocsite(tag.into())
    }
}

impl std::fmt::Display for Allocsite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "alloc({})", self.0)
    }
}
