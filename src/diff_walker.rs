use std::collections::HashSet;

use serde_json::{Map, Number, Value};

use crate::path::{join, Segment};
use crate::{Change, ChangeKind, DiffConfig, Error, MatchedItemPolicy, SemanticKind};

pub struct DiffWalker<'a> {
    pub changes: Vec<Change>,
    config: &'a DiffConfig,
}

impl<'a> DiffWalker<'a> {
    pub fn new(config: &'a DiffConfig) -> Self {
        Self {
            changes: vec![],
            config,
        }
    }

    fn push(&mut self, json_path: String, change: ChangeKind) {
        self.changes.push(Change {
            path: json_path,
            change,
        });
    }

    /// Drop repeated records among those emitted since `start`.
    ///
    /// Only item paths can repeat: identical elements within one sequence, or pairs sharing an
    /// identity in `MatchedItemPolicy::Recurse`.
    fn dedup_from(&mut self, start: usize) -> Result<(), Error> {
        if self.changes.len() - start < 2 {
            return Ok(());
        }

        let mut seen = HashSet::new();
        for change in self.changes.split_off(start) {
            if seen.insert(serde_json::to_string(&change)?) {
                self.changes.push(change);
            }
        }
        Ok(())
    }

    fn diff_scalar(&mut self, json_path: &str, lhs: &Value, rhs: &Value) {
        if !values_equal(lhs, rhs) {
            self.push(
                json_path.to_owned(),
                ChangeKind::ValueDiff {
                    left: lhs.clone(),
                    right: rhs.clone(),
                },
            );
        }
    }

    fn diff_mapping(
        &mut self,
        json_path: &str,
        lhs: &Map<String, Value>,
        rhs: &Map<String, Value>,
    ) -> Result<(), Error> {
        for (key, removed) in lhs.iter().filter(|(key, _)| !rhs.contains_key(*key)) {
            self.push(
                join(json_path, Segment::Field(key)),
                ChangeKind::DeletedKey {
                    removed: removed.clone(),
                },
            );
        }

        for (key, added) in rhs.iter().filter(|(key, _)| !lhs.contains_key(*key)) {
            self.push(
                join(json_path, Segment::Field(key)),
                ChangeKind::AddedKey {
                    added: added.clone(),
                },
            );
        }

        for (key, lhs_child) in lhs {
            if let Some(rhs_child) = rhs.get(key) {
                self.diff(&join(json_path, Segment::Field(key)), lhs_child, rhs_child)?;
            }
        }

        Ok(())
    }

    fn diff_sequence(
        &mut self,
        json_path: &str,
        lhs: &[Value],
        rhs: &[Value],
    ) -> Result<(), Error> {
        let positional = lhs
            .iter()
            .chain(rhs)
            .all(|value| SemanticKind::of(value).is_scalar());

        if positional {
            tracing::debug!(path = json_path, "comparing scalar sequence by position");
            self.diff_positions(json_path, lhs, rhs)
        } else {
            tracing::debug!(path = json_path, "comparing sequence by element identity");
            self.diff_items(json_path, lhs, rhs)
        }
    }

    fn diff_positions(
        &mut self,
        json_path: &str,
        lhs: &[Value],
        rhs: &[Value],
    ) -> Result<(), Error> {
        for (i, (lhs_inner, rhs_inner)) in lhs.iter().zip(rhs).enumerate() {
            self.diff(&join(json_path, Segment::Index(i)), lhs_inner, rhs_inner)?;
        }

        for (i, removed) in lhs.iter().enumerate().skip(rhs.len()) {
            self.push(
                join(json_path, Segment::Index(i)),
                ChangeKind::DeletedItem {
                    removed: removed.clone(),
                },
            );
        }

        for (i, added) in rhs.iter().enumerate().skip(lhs.len()) {
            self.push(
                join(json_path, Segment::Index(i)),
                ChangeKind::AddedItem {
                    added: added.clone(),
                },
            );
        }

        Ok(())
    }

    fn diff_items(&mut self, json_path: &str, lhs: &[Value], rhs: &[Value]) -> Result<(), Error> {
        let start = self.changes.len();

        // Cancel out equal elements first, as a multiset: order does not matter.
        let mut rhs_used = vec![false; rhs.len()];
        let mut lhs_unmatched = vec![];
        for lhs_inner in lhs {
            let partner = rhs
                .iter()
                .enumerate()
                .find(|(j, rhs_inner)| !rhs_used[*j] && values_equal(lhs_inner, rhs_inner))
                .map(|(j, _)| j);
            match partner {
                Some(j) => rhs_used[j] = true,
                None => lhs_unmatched.push(lhs_inner),
            }
        }
        let rhs_unmatched = rhs
            .iter()
            .zip(&rhs_used)
            .filter(|(_, used)| !**used)
            .map(|(rhs_inner, _)| rhs_inner)
            .collect::<Vec<_>>();

        let config = self.config;
        let name = |element: &Value| config.identity.fragment(json_path, element);

        match config.matched_items {
            MatchedItemPolicy::Replace => {
                for removed in lhs_unmatched {
                    let fragment = name(removed)?;
                    self.push(
                        join(json_path, Segment::Item(&fragment)),
                        ChangeKind::DeletedItem {
                            removed: removed.clone(),
                        },
                    );
                }
                for added in rhs_unmatched {
                    let fragment = name(added)?;
                    self.push(
                        join(json_path, Segment::Item(&fragment)),
                        ChangeKind::AddedItem {
                            added: added.clone(),
                        },
                    );
                }
            }
            MatchedItemPolicy::Recurse => {
                let mut rhs_named = rhs_unmatched
                    .into_iter()
                    .map(|added| -> Result<_, Error> { Ok(Some((name(added)?, added))) })
                    .collect::<Result<Vec<_>, Error>>()?;

                for removed in lhs_unmatched {
                    let fragment = name(removed)?;
                    let item_path = join(json_path, Segment::Item(&fragment));
                    let partner = rhs_named
                        .iter_mut()
                        .find(|slot| matches!(slot, Some((f, _)) if *f == fragment))
                        .and_then(Option::take);
                    match partner {
                        Some((_, added)) => self.diff(&item_path, removed, added)?,
                        None => self.push(
                            item_path,
                            ChangeKind::DeletedItem {
                                removed: removed.clone(),
                            },
                        ),
                    }
                }

                for (fragment, added) in rhs_named.into_iter().flatten() {
                    self.push(
                        join(json_path, Segment::Item(&fragment)),
                        ChangeKind::AddedItem {
                            added: added.clone(),
                        },
                    );
                }
            }
        }

        self.dedup_from(start)
    }

    pub fn diff(&mut self, json_path: &str, lhs: &Value, rhs: &Value) -> Result<(), Error> {
        tracing::trace!(path = json_path, "comparing");
        if lhs == rhs {
            return Ok(());
        }

        let lhs_kind = SemanticKind::of(lhs);
        let rhs_kind = SemanticKind::of(rhs);
        if lhs_kind != rhs_kind {
            self.push(
                json_path.to_owned(),
                ChangeKind::TypeDiff {
                    left: lhs_kind,
                    right: rhs_kind,
                },
            );
            return Ok(());
        }

        match (lhs, rhs) {
            (Value::Object(lhs), Value::Object(rhs)) => self.diff_mapping(json_path, lhs, rhs),
            (Value::Array(lhs), Value::Array(rhs)) => self.diff_sequence(json_path, lhs, rhs),
            _ => {
                self.diff_scalar(json_path, lhs, rhs);
                Ok(())
            }
        }
    }
}

/// Deep equality where numbers compare by value, so `1` equals `1.0`.
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => numbers_equal(l, r),
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, l)| r.get(key).map_or(false, |r| values_equal(l, r)))
        }
        _ => lhs == rhs,
    }
}

/// Integers compare exactly. A float equals an integer only if it is integral and has the same
/// value, so precision is not lost above 2^53.
fn numbers_equal(lhs: &Number, rhs: &Number) -> bool {
    match (integer(lhs), integer(rhs)) {
        (Some(l), Some(r)) => l == r,
        (Some(i), None) => float_equals_integer(rhs, i),
        (None, Some(i)) => float_equals_integer(lhs, i),
        (None, None) => lhs.as_f64() == rhs.as_f64(),
    }
}

fn integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

fn float_equals_integer(float: &Number, integer: i128) -> bool {
    float.as_f64().map_or(false, |f| {
        f.fract() == 0.0 && f.abs() < 2f64.powi(64) && f as i128 == integer
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn walk(config: &DiffConfig, lhs: Value, rhs: Value) -> Result<Vec<Change>, Error> {
        let mut walker = DiffWalker::new(config);
        walker.diff("", &lhs, &rhs)?;
        Ok(walker.changes)
    }

    fn change(path: &str, change: ChangeKind) -> Change {
        Change {
            path: path.to_owned(),
            change,
        }
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!(1), &json!(1.5)));
        assert!(values_equal(&json!({"a": [1, 2.0]}), &json!({"a": [1.0, 2]})));

        let changes = walk(&DiffConfig::default(), json!({"a": 1}), json!({"a": 1.0})).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn large_integers_compare_exactly() {
        assert!(values_equal(&json!(-3), &json!(-3.0)));
        assert!(values_equal(
            &json!(9007199254740992u64),
            &json!(9007199254740992.0)
        ));
        assert!(!values_equal(
            &json!(9007199254740993u64),
            &json!(9007199254740992.0)
        ));
        assert!(!values_equal(&json!(u64::MAX), &json!(1.8446744073709552e19)));

        let changes = walk(
            &DiffConfig::default(),
            json!({"id": 9007199254740993u64}),
            json!({"id": 9007199254740992.0}),
        )
        .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change.change_type(), crate::ChangeType::ValueDiff);
    }

    #[test]
    fn many_added_keys() {
        let rhs = (0..50_000)
            .map(|i| (format!("k{i}"), json!(i)))
            .collect::<Map<_, _>>();
        let changes = walk(&DiffConfig::default(), json!({}), Value::Object(rhs)).unwrap();
        assert_eq!(changes.len(), 50_000);
        assert!(changes
            .iter()
            .all(|change| change.change.change_type() == crate::ChangeType::AddedKey));
    }

    #[test]
    fn matched_pairs_with_equal_changes_are_reported_once() {
        let config = DiffConfig {
            matched_items: MatchedItemPolicy::Recurse,
            ..Default::default()
        };
        let changes = walk(
            &config,
            json!([{"message": "a", "x": 1, "k": 0}, {"message": "a", "x": 1, "k": 1}]),
            json!([{"message": "a", "x": 2, "k": 0}, {"message": "a", "x": 2, "k": 1}]),
        )
        .unwrap();
        assert_eq!(
            changes,
            vec![change(
                r#".[#item:{"message":"a"}].x"#,
                ChangeKind::ValueDiff {
                    left: json!(1),
                    right: json!(2)
                }
            )]
        );
    }

    #[test]
    fn type_diff_stops_descent() {
        let changes = walk(
            &DiffConfig::default(),
            json!({"a": {"b": 1, "c": 2}}),
            json!({"a": [1, 2]}),
        )
        .unwrap();
        assert_eq!(
            changes,
            vec![change(
                ".a",
                ChangeKind::TypeDiff {
                    left: SemanticKind::Mapping,
                    right: SemanticKind::Sequence,
                }
            )]
        );
    }

    #[test]
    fn null_value_is_not_a_missing_key() {
        let changes = walk(&DiffConfig::default(), json!({"a": null}), json!({})).unwrap();
        assert_eq!(
            changes,
            vec![change(".a", ChangeKind::DeletedKey { removed: Value::Null })]
        );
        assert_eq!(changes[0].change.left(), Some(Value::Null));
        assert_eq!(changes[0].change.right(), None);
    }

    #[test]
    fn scalar_sequences_are_positional() {
        let changes = walk(
            &DiffConfig::default(),
            json!(["a", "b", "c"]),
            json!(["a", 2]),
        )
        .unwrap();
        assert_eq!(
            changes,
            vec![
                change(
                    "[1]",
                    ChangeKind::TypeDiff {
                        left: SemanticKind::String,
                        right: SemanticKind::Number,
                    }
                ),
                change("[2]", ChangeKind::DeletedItem { removed: json!("c") }),
            ]
        );
    }

    #[test]
    fn reordered_records_are_equal() {
        let changes = walk(
            &DiffConfig::default(),
            json!([{"message": "a"}, {"message": "b"}]),
            json!([{"message": "b"}, {"message": "a"}]),
        )
        .unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn replace_reports_add_and_delete() {
        let changes = walk(
            &DiffConfig::default(),
            json!([{"message": "a", "rank": 1}]),
            json!([{"message": "a", "rank": 2}]),
        )
        .unwrap();
        let path = r#".[#item:{"message":"a"}]"#;
        assert_eq!(
            changes,
            vec![
                change(
                    path,
                    ChangeKind::DeletedItem {
                        removed: json!({"message": "a", "rank": 1})
                    }
                ),
                change(
                    path,
                    ChangeKind::AddedItem {
                        added: json!({"message": "a", "rank": 2})
                    }
                ),
            ]
        );
    }

    #[test]
    fn recurse_diffs_matched_items() {
        let config = DiffConfig {
            matched_items: MatchedItemPolicy::Recurse,
            ..Default::default()
        };
        let changes = walk(
            &config,
            json!([{"message": "a", "rank": 1}, {"message": "b"}]),
            json!([{"message": "c"}, {"message": "a", "rank": 2, "ref": "7"}]),
        )
        .unwrap();
        assert_eq!(
            changes,
            vec![
                change(
                    r#".[#item:{"message":"a"}].ref"#,
                    ChangeKind::AddedKey { added: json!("7") }
                ),
                change(
                    r#".[#item:{"message":"a"}].rank"#,
                    ChangeKind::ValueDiff {
                        left: json!(1),
                        right: json!(2)
                    }
                ),
                change(
                    r#".[#item:{"message":"b"}]"#,
                    ChangeKind::DeletedItem {
                        removed: json!({"message": "b"})
                    }
                ),
                change(
                    r#".[#item:{"message":"c"}]"#,
                    ChangeKind::AddedItem {
                        added: json!({"message": "c"})
                    }
                ),
            ]
        );
    }

    #[test]
    fn duplicate_records_are_reported_once() {
        let changes = walk(
            &DiffConfig::default(),
            json!([{"message": "a"}, {"message": "a"}]),
            json!([]),
        )
        .unwrap();
        assert_eq!(changes.len(), 1);

        let changes = walk(
            &DiffConfig::default(),
            json!([{"message": "a"}, {"message": "a"}]),
            json!([{"message": "a"}]),
        )
        .unwrap();
        assert_eq!(
            changes,
            vec![change(
                r#".[#item:{"message":"a"}]"#,
                ChangeKind::DeletedItem {
                    removed: json!({"message": "a"})
                }
            )]
        );
    }

    #[test]
    fn mixed_sequences_use_identity() {
        let changes = walk(
            &DiffConfig::default(),
            json!([1, {"message": "a"}]),
            json!([1]),
        )
        .unwrap();
        assert_eq!(
            changes,
            vec![change(
                r#".[#item:{"message":"a"}]"#,
                ChangeKind::DeletedItem {
                    removed: json!({"message": "a"})
                }
            )]
        );

        let changes = walk(&DiffConfig::default(), json!([[1]]), json!([[2]])).unwrap();
        assert_eq!(
            changes,
            vec![
                change(".[#item:[1]]", ChangeKind::DeletedItem { removed: json!([1]) }),
                change(".[#item:[2]]", ChangeKind::AddedItem { added: json!([2]) }),
            ]
        );
    }

    #[test]
    fn unnamed_item_fails_only_when_reported() {
        let config = DiffConfig::default();
        let list = json!({"rules": [{"rank": 1}]});
        assert!(walk(&config, list.clone(), list.clone()).unwrap().is_empty());

        let err = walk(&config, list, json!({"rules": []})).unwrap_err();
        assert!(matches!(err, Error::MissingIdentity { ref path } if path == ".rules"));
    }
}
