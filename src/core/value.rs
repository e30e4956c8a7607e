/// The token carried through every stage. Values have no identity beyond
/// their numeric content; duplicates flow independently.
pub type Value = i64;
