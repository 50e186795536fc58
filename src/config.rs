use serde::{Deserialize, Serialize};

use crate::IdentityStrategy;

/// Options controlling a comparison.
///
/// All fields have defaults, so a partial JSON document deserializes fine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// How elements of unordered sequences are named.
    pub identity: IdentityStrategy,
    /// What to do with elements that changed but kept their identity.
    pub matched_items: MatchedItemPolicy,
}

/// What to report for an element of an unordered sequence that has no equal counterpart on the
/// other side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedItemPolicy {
    /// Report it as a deleted (LHS) or added (RHS) item, even if an element with the same identity
    /// exists on the other side.
    #[default]
    Replace,
    /// Pair it with an element of the same identity on the other side, if any, and diff the pair
    /// below the item's path.
    Recurse,
}
