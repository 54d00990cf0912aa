//! Forgiving deserializers for values written by older app versions.
//!
//! Stored payloads and records outlive the code that wrote them, so numbers
//! may arrive as strings, text as numbers, and enums in any letter case.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Renders a scalar JSON value as text. Arrays, objects and null yield `None`.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Text field that also accepts numbers, booleans and null.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).unwrap_or_default())
}

/// Optional number that accepts numeric strings; blanks and garbage become `None`.
pub(crate) fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite()))
}

/// Optional enum parsed through `FromStr`; unparseable values count as absent.
pub(crate) fn parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).and_then(|s| s.trim().parse().ok()))
}

/// List of strings that tolerates null and skips non-scalar entries.
pub(crate) fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    })
}

/// List decoded entry by entry. Null, non-arrays and entries that do not
/// decode are dropped instead of failing the whole value.
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Non-negative count that accepts numeric strings. Anything else is zero.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let n = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(n.map(|n| u32::try_from(n).unwrap_or(u32::MAX)).unwrap_or(0))
}

/// Boolean that accepts `"true"`/`"1"` strings and numbers.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "number")]
        km: Option<f64>,
        #[serde(default, deserialize_with = "text")]
        name: String,
        #[serde(default, deserialize_with = "text_list")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "flag")]
        on: bool,
        #[serde(default, deserialize_with = "list")]
        pairs: Vec<(String, u32)>,
        #[serde(default, deserialize_with = "count")]
        seen: u32,
    }

    fn probe(json: &str) -> Probe {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_number_accepts_strings_and_decimal_comma() {
        assert_eq!(probe(r#"{"km": "12,5"}"#).km, Some(12.5));
        assert_eq!(probe(r#"{"km": 7}"#).km, Some(7.0));
        assert_eq!(probe(r#"{"km": ""}"#).km, None);
        assert_eq!(probe(r#"{"km": null}"#).km, None);
        assert_eq!(probe(r#"{}"#).km, None);
    }

    #[test]
    fn test_text_accepts_numbers() {
        assert_eq!(probe(r#"{"name": 42}"#).name, "42");
        assert_eq!(probe(r#"{"name": null}"#).name, "");
    }

    #[test]
    fn test_text_list_skips_objects() {
        let p = probe(r#"{"tags": ["a", 1, {"x": 1}, null]}"#);
        assert_eq!(p.tags, vec!["a", "1"]);
        assert!(probe(r#"{"tags": "nope"}"#).tags.is_empty());
    }

    #[test]
    fn test_flag_variants() {
        assert!(probe(r#"{"on": true}"#).on);
        assert!(probe(r#"{"on": "1"}"#).on);
        assert!(probe(r#"{"on": 1}"#).on);
        assert!(!probe(r#"{"on": "no"}"#).on);
    }

    #[test]
    fn test_list_drops_null_and_bad_entries() {
        let p = probe(r#"{"pairs": [["a", 1], null, "x", ["b", 2]]}"#);
        assert_eq!(p.pairs, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
        assert!(probe(r#"{"pairs": null}"#).pairs.is_empty());
    }

    #[test]
    fn test_count_variants() {
        assert_eq!(probe(r#"{"seen": 3}"#).seen, 3);
        assert_eq!(probe(r#"{"seen": "4"}"#).seen, 4);
        assert_eq!(probe(r#"{"seen": null}"#).seen, 0);
        assert_eq!(probe(r#"{"seen": -2}"#).seen, 0);
    }
}
