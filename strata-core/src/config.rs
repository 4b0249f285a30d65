//! Declarative index configuration.
//!
//! Collections do not inspect the types stored in them. Which fields get a
//! secondary index is declared up front through an [`IndexConfig`], a plain
//! mapping from field path to [`IndexOptions`] that the collection consumes
//! once at creation time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Options for a single secondary index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Whether the index enforces uniqueness of the indexed value.
    pub unique: bool,
}

impl IndexOptions {
    /// Options for a plain (non-unique) index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a unique index.
    pub fn unique() -> Self {
        Self { unique: true }
    }
}

/// A mapping from field path to index options, consumed at collection creation.
///
/// # Example
///
/// ```ignore
/// use strata_core::config::{IndexConfig, IndexOptions};
///
/// let config = IndexConfig::new()
///     .field("price", IndexOptions::new())
///     .field("sku", IndexOptions::unique());
/// ```
#[derive(Debug, Clone, Default)]
pub struct IndexConfig {
    fields: BTreeMap<String, IndexOptions>,
}

impl IndexConfig {
    /// Creates an empty configuration (no indexed fields).
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a field as indexed with the given options. Returns self for chaining.
    pub fn field(mut self, name: impl Into<String>, options: IndexOptions) -> Self {
        self.fields.insert(name.into(), options);
        self
    }

    /// Returns true if no fields are marked as indexed.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true if the given field is marked as indexed.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterates over the indexed fields and their options, in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, IndexOptions)> {
        self.fields.iter().map(|(name, options)| (name.as_str(), *options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_fields() {
        let config = IndexConfig::new()
            .field("price", IndexOptions::new())
            .field("sku", IndexOptions::unique());

        assert!(config.contains("price"));
        assert!(config.contains("sku"));
        assert!(!config.contains("name"));

        let fields: Vec<_> = config.iter().collect();
        assert_eq!(fields, vec![
            ("price", IndexOptions { unique: false }),
            ("sku", IndexOptions { unique: true }),
        ]);
    }
}
