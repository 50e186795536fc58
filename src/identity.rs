use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, SemanticKind};

/// How elements of an unordered sequence are named.
///
/// For a mapping element, the first field of `fields` holding a non-null scalar is used. If there
/// is none and `fallback_to_first_string` is set, the first string-valued field in sorted key
/// order (not document order) is used instead. The chosen field is encoded as the compact JSON
/// fragment `{"<name>":<value>}`, which ends up in the path as `.[#item:<fragment>]`.
///
/// Elements that are not mappings (in sequences mixing kinds) are named by their own compact JSON
/// encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityStrategy {
    /// Identifying field names, most preferred first.
    pub fields: Vec<String>,
    /// Whether to use the alphabetically first string field when none of `fields` is usable.
    pub fallback_to_first_string: bool,
}

impl Default for IdentityStrategy {
    fn default() -> Self {
        Self {
            fields: vec!["message".to_owned()],
            fallback_to_first_string: true,
        }
    }
}

impl IdentityStrategy {
    /// A strategy preferring the given fields, in order.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Disable the first-string-field fallback.
    pub fn without_fallback(mut self) -> Self {
        self.fallback_to_first_string = false;
        self
    }

    /// Derive the identity fragment of `element`, a member of the sequence at `json_path`.
    pub fn fragment(&self, json_path: &str, element: &Value) -> Result<String, Error> {
        let object = match element {
            Value::Object(object) => object,
            other => return Ok(serde_json::to_string(other)?),
        };

        let preferred = self.fields.iter().find_map(|name| {
            object
                .get(name)
                .filter(|value| is_usable(value))
                .map(|value| (name, value))
        });

        let (name, value) = match preferred {
            Some(found) => found,
            None if self.fallback_to_first_string => {
                let found = object
                    .iter()
                    .find(|(_, value)| value.is_string())
                    .ok_or_else(|| Error::MissingIdentity {
                        path: json_path.to_owned(),
                    })?;
                tracing::debug!(
                    path = json_path,
                    field = found.0.as_str(),
                    "no preferred identity field, using first string field"
                );
                found
            }
            None => {
                return Err(Error::MissingIdentity {
                    path: json_path.to_owned(),
                })
            }
        };

        let mut fragment = Map::new();
        fragment.insert(name.clone(), value.clone());
        Ok(serde_json::to_string(&Value::Object(fragment))?)
    }
}

fn is_usable(value: &Value) -> bool {
    SemanticKind::of(value).is_scalar() && !value.is_null()
}
