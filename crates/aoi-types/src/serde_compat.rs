//! Lenient serde deserializers for the identity daemon's JSON.
//!
//! The daemon omits empty collections, sends `null` for them, and encodes
//! user IDs as integers while other producers send strings. These helpers
//! normalise all of that instead of failing the whole status document.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Deserialize a `Vec<T>`, treating `null` as an empty list.
pub fn vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a `HashMap<K, V>`, treating `null` as an empty map.
pub fn map_or_null<'de, D, K, V>(deserializer: D) -> Result<HashMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
{
    Ok(Option::<HashMap<K, V>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a string from either a JSON string or a JSON number.
///
/// `null` yields an empty string.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or an integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(String::new())
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Doc {
        #[serde(default, deserialize_with = "vec_or_null")]
        items: Vec<String>,
        #[serde(default, deserialize_with = "map_or_null")]
        table: HashMap<String, u32>,
        #[serde(default, deserialize_with = "string_or_number")]
        user: String,
    }

    #[test]
    fn null_collections_become_empty() {
        let doc: Doc = serde_json::from_str(r#"{"items": null, "table": null}"#).unwrap();
        assert!(doc.items.is_empty());
        assert!(doc.table.is_empty());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let doc: Doc = serde_json::from_str("{}").unwrap();
        assert!(doc.items.is_empty());
        assert_eq!(doc.user, "");
    }

    #[test]
    fn present_collections_are_kept() {
        let doc: Doc =
            serde_json::from_str(r#"{"items": ["a", "b"], "table": {"x": 1}}"#).unwrap();
        assert_eq!(doc.items, vec!["a", "b"]);
        assert_eq!(doc.table["x"], 1);
    }

    #[test]
    fn user_id_accepts_number_and_string() {
        let doc: Doc = serde_json::from_str(r#"{"user": 123456789}"#).unwrap();
        assert_eq!(doc.user, "123456789");
        let doc: Doc = serde_json::from_str(r#"{"user": "u-42"}"#).unwrap();
        assert_eq!(doc.user, "u-42");
        let doc: Doc = serde_json::from_str(r#"{"user": null}"#).unwrap();
        assert_eq!(doc.user, "");
    }

    #[test]
    fn wrong_collection_type_is_rejected() {
        let result: Result<Doc, _> = serde_json::from_str(r#"{"items": 42}"#);
        assert!(result.is_err());
    }
}
