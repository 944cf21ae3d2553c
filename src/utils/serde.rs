/*!
 * Serde utilities for the loosely-typed values the host catalog hands us.
 *
 * Catalog dictionaries and settings files carry booleans as `"True"` /
 * `"false"` strings and lists as whitespace separated strings. These helpers
 * accept both the typed and the stringly representation.
 */

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeSet;

/// Interpret a loosely typed value as a boolean.
///
/// Accepts JSON booleans, numbers (non-zero is true) and the strings
/// `true/yes/on/1` and `false/no/off/0/""` in any case.
pub fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Null => Some(false),
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => str_as_bool(s),
        _ => None,
    }
}

/// String form of [`value_as_bool`]
pub fn str_as_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" | "t" | "y" => Some(true),
        "false" | "no" | "off" | "0" | "f" | "n" | "" => Some(false),
        _ => None,
    }
}

/// Split a setting into a list: arrays are taken as-is, strings are split
/// on whitespace and commas.
pub fn value_as_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        other => vec![other.to_string()],
    }
}

/// Deserialize a boolean that may be represented as a bool, number or string.
///
/// ```rust
/// use serde::Deserialize;
/// use spatial_ingestor::utils::serde::deserialize_asbool;
///
/// #[derive(Deserialize)]
/// struct Resource {
///     #[serde(default, deserialize_with = "deserialize_asbool")]
///     spatial_parent: bool,
/// }
///
/// let resource: Resource = serde_json::from_str(r#"{"spatial_parent": "True"}"#).unwrap();
/// assert!(resource.spatial_parent);
/// ```
pub fn deserialize_asbool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    value_as_bool(&value)
        .ok_or_else(|| D::Error::custom(format!("Cannot interpret {value} as a boolean")))
}

/// Deserialize a list that may be an array or a separated string.
pub fn deserialize_aslist<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    Ok(value_as_list(&value))
}

/// Deserialize a list setting into a set, dropping duplicates.
pub fn deserialize_asset<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_aslist(deserializer)?.into_iter().collect())
}

/// Deserialize an optional string, mapping empty strings to `None`.
pub fn deserialize_non_empty<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_as_bool() {
        assert_eq!(value_as_bool(&json!("True")), Some(true));
        assert_eq!(value_as_bool(&json!("False")), Some(false));
        assert_eq!(value_as_bool(&json!(true)), Some(true));
        assert_eq!(value_as_bool(&json!(null)), Some(false));
        assert_eq!(value_as_bool(&json!("maybe")), None);
    }

    #[test]
    fn test_value_as_list() {
        assert_eq!(
            value_as_list(&json!("shp  kml,kmz")),
            vec!["shp".to_string(), "kml".to_string(), "kmz".to_string()]
        );
        assert_eq!(
            value_as_list(&json!(["org-a", " org-b "])),
            vec!["org-a".to_string(), "org-b".to_string()]
        );
        assert!(value_as_list(&json!(null)).is_empty());
    }

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "deserialize_asbool")]
        flag: bool,
        #[serde(default, deserialize_with = "deserialize_non_empty")]
        parent: Option<String>,
    }

    #[test]
    fn test_struct_deserialization() {
        let sample: Sample = serde_json::from_value(json!({"flag": "true", "parent": ""})).unwrap();
        assert!(sample.flag);
        assert_eq!(sample.parent, None);

        let sample: Sample = serde_json::from_value(json!({})).unwrap();
        assert!(!sample.flag);
    }
}
