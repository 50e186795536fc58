//! Building the path strings that locate a change, such as
//! `.validations.login-user.[#item:{"message":"x"}]`.

use std::fmt;

/// One step down from a value to one of its children.
///
/// Paths are plain strings built by appending segments, `""` being the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Key of a mapping, rendered as `.key`.
    Field(&'a str),
    /// Position in a scalar sequence, rendered as `[i]`.
    Index(usize),
    /// Element of an unordered sequence, rendered as `.[#item:<fragment>]`.
    Item(&'a str),
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, ".{name}"),
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Item(fragment) => write!(f, ".[#item:{fragment}]"),
        }
    }
}

/// Append `segment` to `json_path`.
pub fn join(json_path: &str, segment: Segment<'_>) -> String {
    format!("{json_path}{segment}")
}
