//! Field path resolution and value comparison over JSON payloads.
//!
//! Document payloads are generic JSON value trees. This module resolves
//! dotted field paths (`"category.name"`) against those trees and provides
//! the comparison wrapper used by query evaluation.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Resolves a dotted field path against a JSON value.
///
/// Each path segment is looked up verbatim first; if that fails, a single
/// case-insensitive fallback lookup is attempted before the resolution
/// fails with [`StoreError::FieldNotFound`].
///
/// # Errors
///
/// Returns [`StoreError::FieldNotFound`] if any segment cannot be resolved.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> StoreResult<&'a Value> {
    let mut current = value;

    for segment in path.split('.') {
        current = resolve_segment(current, segment)
            .ok_or_else(|| StoreError::FieldNotFound(path.to_string()))?;
    }

    Ok(current)
}

fn resolve_segment<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    let map = value.as_object()?;

    if let Some(found) = map.get(segment) {
        return Some(found);
    }

    // One case-insensitive fallback per segment.
    map.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(segment))
        .map(|(_, found)| found)
}

/// Type-erased, comparable representation of JSON values.
///
/// This enum wraps JSON values and provides the comparison operations used
/// for query evaluation. It normalizes all numeric values to f64.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => Comparable::Number(value.as_f64().unwrap_or(0.0)),
            Value::String(value) => Comparable::String(value),
            Value::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Value::Object(map) => Comparable::Map(
                map
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_top_level_fields() {
        let value = json!({ "name": "Widget", "price": 9.99 });

        assert_eq!(resolve_path(&value, "name").unwrap(), &json!("Widget"));
        assert_eq!(resolve_path(&value, "price").unwrap(), &json!(9.99));
    }

    #[test]
    fn resolves_nested_paths() {
        let value = json!({ "category": { "name": "tools", "rank": 3 } });

        assert_eq!(resolve_path(&value, "category.name").unwrap(), &json!("tools"));
        assert_eq!(resolve_path(&value, "category.rank").unwrap(), &json!(3));
    }

    #[test]
    fn falls_back_to_case_insensitive_lookup() {
        let value = json!({ "Name": "Widget" });

        assert_eq!(resolve_path(&value, "name").unwrap(), &json!("Widget"));
    }

    #[test]
    fn missing_field_is_an_error() {
        let value = json!({ "name": "Widget" });

        assert!(matches!(
            resolve_path(&value, "price"),
            Err(StoreError::FieldNotFound(path)) if path == "price"
        ));
    }

    #[test]
    fn scalars_are_not_traversable() {
        let value = json!({ "name": "Widget" });

        assert!(resolve_path(&value, "name.length").is_err());
    }

    #[test]
    fn numbers_compare_across_integer_and_float() {
        let a = json!(10);
        let b = json!(9.99);

        assert_eq!(
            Comparable::from(&a).partial_cmp(&Comparable::from(&b)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn mixed_kinds_are_incomparable() {
        let a = json!("10");
        let b = json!(10);

        assert_eq!(Comparable::from(&a).partial_cmp(&Comparable::from(&b)), None);
        assert!(Comparable::from(&a) != Comparable::from(&b));
    }
}
