use std::fmt;

use serde::ser::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// An "atomic" difference found going from LHS to RHS.
///
/// Just a wrapper container for `ChangeKind`. Serializes to the flat record
/// `{"type", "path", "left", "right"}`, with absent sides written as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// JSON path for the given change. `""` for the root value. `".foo"` for key foo, `"[2]"` for
    /// the third element of a scalar list, `".[#item:{...}]"` for an element of a record list.
    pub path: String,
    /// Data specific to the kind of change.
    pub change: ChangeKind,
}

impl Change {
    /// The change that comparing RHS against LHS would report at the same path.
    pub fn inverse(&self) -> Change {
        Change {
            path: self.path.clone(),
            change: self.change.inverse(),
        }
    }
}

/// The kind of change + data relevant to the change.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    /// Both sides are present but of a different kind. Nothing below this path is compared.
    TypeDiff {
        /// Kind of the LHS value.
        left: SemanticKind,
        /// Kind of the RHS value.
        right: SemanticKind,
    },
    /// Two scalars of the same kind hold different values.
    ValueDiff {
        /// The old value.
        left: Value,
        /// The new value.
        right: Value,
    },
    /// A key exists only in RHS.
    AddedKey {
        /// The value of the new key.
        added: Value,
    },
    /// A key exists only in LHS.
    DeletedKey {
        /// The value the key used to hold.
        removed: Value,
    },
    /// A sequence element exists only in RHS.
    AddedItem {
        /// The new element.
        added: Value,
    },
    /// A sequence element exists only in LHS.
    DeletedItem {
        /// The element that is gone.
        removed: Value,
    },
}

impl ChangeKind {
    /// The flat tag of this change.
    pub fn change_type(&self) -> ChangeType {
        match self {
            Self::TypeDiff { .. } => ChangeType::TypeDiff,
            Self::ValueDiff { .. } => ChangeType::ValueDiff,
            Self::AddedKey { .. } => ChangeType::AddedKey,
            Self::DeletedKey { .. } => ChangeType::DeletedKey,
            Self::AddedItem { .. } => ChangeType::AddedItem,
            Self::DeletedItem { .. } => ChangeType::DeletedItem,
        }
    }

    /// The LHS side of the change. `None` means the value is absent, which is not the same as
    /// `Some(Value::Null)`.
    ///
    /// For type differences this is the kind name as a string.
    pub fn left(&self) -> Option<Value> {
        match self {
            Self::TypeDiff { left, .. } => Some(Value::from(left.as_str())),
            Self::ValueDiff { left, .. } => Some(left.clone()),
            Self::DeletedKey { removed } | Self::DeletedItem { removed } => Some(removed.clone()),
            Self::AddedKey { .. } | Self::AddedItem { .. } => None,
        }
    }

    /// The RHS side of the change. See [`ChangeKind::left`].
    pub fn right(&self) -> Option<Value> {
        match self {
            Self::TypeDiff { right, .. } => Some(Value::from(right.as_str())),
            Self::ValueDiff { right, .. } => Some(right.clone()),
            Self::AddedKey { added } | Self::AddedItem { added } => Some(added.clone()),
            Self::DeletedKey { .. } | Self::DeletedItem { .. } => None,
        }
    }

    /// Swap sides: additions become deletions and vice versa.
    pub fn inverse(&self) -> ChangeKind {
        match self.clone() {
            Self::TypeDiff { left, right } => Self::TypeDiff {
                left: right,
                right: left,
            },
            Self::ValueDiff { left, right } => Self::ValueDiff {
                left: right,
                right: left,
            },
            Self::AddedKey { added } => Self::DeletedKey { removed: added },
            Self::DeletedKey { removed } => Self::AddedKey { added: removed },
            Self::AddedItem { added } => Self::DeletedItem { removed: added },
            Self::DeletedItem { removed } => Self::AddedItem { added: removed },
        }
    }
}

impl Serialize for Change {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Record<'a> {
            #[serde(rename = "type")]
            ty: ChangeType,
            path: &'a str,
            left: Option<Value>,
            right: Option<Value>,
        }

        Record {
            ty: self.change.change_type(),
            path: &self.path,
            left: self.change.left(),
            right: self.change.right(),
        }
        .serialize(serializer)
    }
}

/// The flat tag of a [`ChangeKind`], as it appears in serialized records.
#[derive(serde::Serialize, Clone, Copy, Ord, Eq, PartialEq, PartialOrd, Hash, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum ChangeType {
    TypeDiff,
    ValueDiff,
    AddedKey,
    DeletedKey,
    AddedItem,
    DeletedItem,
}

/// The errors that can happen in this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A sequence element had to be named, but none of its fields can serve as identity.
    ///
    /// See [`crate::IdentityStrategy`] for which fields are considered.
    #[error("no identity field found for sequence element under {path:?}")]
    MissingIdentity {
        /// Path of the sequence containing the element.
        path: String,
    },
    /// Failed to convert an input into a JSON value, or to encode an identity fragment.
    #[error("failed to convert value to JSON")]
    Serde(#[from] serde_json::Error),
}

/// The semantic kinds a JSON value can have.
#[derive(serde::Serialize, Clone, Copy, Ord, Eq, PartialEq, PartialOrd, Hash, Debug)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum SemanticKind {
    Null,
    Boolean,
    Number,
    String,
    Sequence,
    Mapping,
}

impl SemanticKind {
    /// Classify a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Sequence,
            Value::Object(_) => Self::Mapping,
        }
    }

    /// Whether values of this kind have no children.
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::Sequence | Self::Mapping)
    }

    /// The name used in serialized records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        }
    }
}

impl fmt::Display for SemanticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
