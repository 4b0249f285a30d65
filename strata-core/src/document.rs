//! Document representation and the typed model trait.
//!
//! A document is the atomic unit of storage: a string identifier plus an
//! opaque JSON payload. Documents are replaced wholesale on update; there
//! are no in-place field mutation methods.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::config::IndexConfig;
use crate::error::StoreResult;
use crate::value::resolve_path;

/// A stored document: a unique string identifier plus a JSON payload.
///
/// The payload is a generic JSON value tree, so a collection can hold
/// documents produced from different concrete types. Field access goes
/// through dotted paths regardless of the payload's original shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The document identifier, unique within its collection.
    pub id: String,
    /// The opaque payload.
    pub data: Value,
}

impl Document {
    /// Creates a document from an id and a single payload value.
    pub fn new(id: impl Into<String>, data: impl Into<Value>) -> Self {
        Self { id: id.into(), data: data.into() }
    }

    /// Creates a document from an id and any number of payload values.
    ///
    /// More than one value is wrapped as an array, exactly one is stored
    /// directly, and zero values yield a null payload.
    pub fn from_values(id: impl Into<String>, mut values: Vec<Value>) -> Self {
        let data = match values.len() {
            0 => Value::Null,
            1 => values.remove(0),
            _ => Value::Array(values),
        };

        Self { id: id.into(), data }
    }

    /// Creates a document by serializing a typed model.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the model cannot be represented as JSON.
    pub fn from_model<M: Model>(model: &M) -> StoreResult<Self> {
        Ok(Self {
            id: model.id(),
            data: serde_json::to_value(model)?,
        })
    }

    /// Resolves a dotted field path against this document's payload.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FieldNotFound`](crate::error::StoreError::FieldNotFound)
    /// if the path cannot be resolved.
    pub fn field(&self, path: &str) -> StoreResult<&Value> {
        resolve_path(&self.data, path)
    }

    /// Returns the JSON representation of the document.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Trait for types that map onto documents of a named collection.
///
/// Implementing `Model` lets a plain serde type flow through a typed
/// collection: values are serialized into document payloads on write and
/// deserialized back on read. [`Model::indexes`] supplies the declarative
/// index metadata consumed when the collection is first created.
///
/// # Example
///
/// ```ignore
/// use serde::{Serialize, Deserialize};
/// use strata_core::{config::{IndexConfig, IndexOptions}, document::Model};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Product {
///     pub id: String,
///     pub name: String,
///     pub price: f64,
/// }
///
/// impl Model for Product {
///     fn id(&self) -> String {
///         self.id.clone()
///     }
///
///     fn collection_name() -> &'static str {
///         "products"
///     }
///
///     fn indexes() -> IndexConfig {
///         IndexConfig::new().field("price", IndexOptions::new())
///     }
/// }
/// ```
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns this model's document identifier.
    fn id(&self) -> String;

    /// Returns the name of the collection documents of this type belong to.
    fn collection_name() -> &'static str;

    /// Returns the fields of this model that should carry a secondary index.
    fn indexes() -> IndexConfig {
        IndexConfig::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_values_handles_arity() {
        let none = Document::from_values("d1", vec![]);
        assert_eq!(none.data, Value::Null);

        let one = Document::from_values("d2", vec![json!({ "a": 1 })]);
        assert_eq!(one.data, json!({ "a": 1 }));

        let many = Document::from_values("d3", vec![json!(1), json!(2)]);
        assert_eq!(many.data, json!([1, 2]));
    }

    #[test]
    fn json_round_trip_preserves_shape() {
        let doc = Document::new("p1", json!({ "name": "Widget", "price": 9.99 }));
        let encoded = doc.to_json().unwrap();
        let decoded: Document = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, doc);
    }

    #[test]
    fn field_resolves_nested_payloads() {
        let doc = Document::new("p1", json!({ "category": { "name": "tools" } }));

        assert_eq!(doc.field("category.name").unwrap(), &json!("tools"));
        assert!(doc.field("category.missing").is_err());
    }
}
