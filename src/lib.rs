#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

use serde::Serialize;
use serde_json::Value;

mod config;
mod diff_walker;
mod identity;
pub mod path;
mod types;

pub use config::{DiffConfig, MatchedItemPolicy};
pub use identity::IdentityStrategy;
pub use types::*;

/// Take two JSON values, and compare them using the default [`DiffConfig`].
///
/// `lhs` (left-hand side) is the original value, `rhs` (right-hand side) is the updated value.
/// An empty list means the values are equal.
pub fn diff(lhs: &Value, rhs: &Value) -> Result<Vec<Change>, Error> {
    diff_with_config(lhs, rhs, &DiffConfig::default())
}

/// Take two JSON values, and compare them.
///
/// Fails if an element of an unordered sequence has to be reported and `config` cannot derive an
/// identity for it. No partial result is returned in that case.
pub fn diff_with_config(
    lhs: &Value,
    rhs: &Value,
    config: &DiffConfig,
) -> Result<Vec<Change>, Error> {
    let mut walker = diff_walker::DiffWalker::new(config);
    walker.diff("", lhs, rhs)?;
    tracing::debug!(changes = walker.changes.len(), "finished comparison");

    Ok(walker.changes)
}

/// Convert two serializable values into JSON, and compare them.
///
/// Values that have no JSON representation (such as maps with non-string keys) fail with
/// [`Error::Serde`].
pub fn diff_serializable<T>(lhs: &T, rhs: &T, config: &DiffConfig) -> Result<Vec<Change>, Error>
where
    T: Serialize + ?Sized,
{
    let lhs = serde_json::to_value(lhs)?;
    let rhs = serde_json::to_value(rhs)?;
    diff_with_config(&lhs, &rhs, config)
}
