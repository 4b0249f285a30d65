//! Ordered secondary indexes.
//!
//! An index maps one field's values to the set of document ids holding that
//! value, kept in a single ordered structure so equality and range lookups
//! walk contiguous entries. Indexes are derived data: the collection keeps
//! them in lock-step with its document map and they are never persisted.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use serde_json::Value;

use strata_core::config::IndexOptions;
use strata_core::document::Document;
use strata_core::error::{StoreError, StoreResult};
use strata_core::query::{Condition, Operator};
use strata_core::value::resolve_path;

/// Ordering key for index entries.
///
/// Numbers (integer or float) normalize to f64 and compare by total order;
/// strings compare by primitive order; every other value shape falls back
/// to its canonical JSON text. Variants order after one another, so the
/// comparator is monotonic across the whole index even when a field holds
/// mixed kinds.
#[derive(Debug, Clone)]
pub enum IndexKey {
    /// A numeric value, normalized to f64.
    Number(f64),
    /// A string value.
    Text(String),
    /// Canonical JSON text of any other value shape.
    Canonical(String),
}

impl IndexKey {
    /// Derives the key for a JSON value.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(number) => IndexKey::Number(number.as_f64().unwrap_or(0.0)),
            Value::String(text) => IndexKey::Text(text.clone()),
            other => IndexKey::Canonical(other.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            IndexKey::Number(_) => 0,
            IndexKey::Text(_) => 1,
            IndexKey::Canonical(_) => 2,
        }
    }
}

// Equality must agree with the comparator, so it goes through cmp rather
// than a derived f64 comparison.
impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (IndexKey::Number(a), IndexKey::Number(b)) => a.total_cmp(b),
            (IndexKey::Text(a), IndexKey::Text(b)) => a.cmp(b),
            (IndexKey::Canonical(a), IndexKey::Canonical(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// An ordered secondary index over one field of a collection.
#[derive(Debug)]
pub struct Index {
    field: String,
    options: IndexOptions,
    tree: BTreeMap<IndexKey, BTreeSet<String>>,
    by_doc: HashMap<String, IndexKey>,
}

impl Index {
    /// Creates an empty index over the given field.
    pub fn new(field: impl Into<String>, options: IndexOptions) -> Self {
        Self {
            field: field.into(),
            options,
            tree: BTreeMap::new(),
            by_doc: HashMap::new(),
        }
    }

    /// Returns the indexed field path.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the index options.
    pub fn options(&self) -> IndexOptions {
        self.options
    }

    /// Returns the number of indexed documents.
    pub fn len(&self) -> usize {
        self.by_doc.len()
    }

    /// Returns true if no documents are indexed.
    pub fn is_empty(&self) -> bool {
        self.by_doc.is_empty()
    }

    /// Returns true if this index holds an entry for the given document id.
    pub fn contains(&self, doc_id: &str) -> bool {
        self.by_doc.contains_key(doc_id)
    }

    /// Returns true if the document's payload resolves the indexed field.
    pub fn covers(&self, doc: &Document) -> bool {
        resolve_path(&doc.data, &self.field).is_ok()
    }

    /// Inserts a document into the index.
    ///
    /// Re-inserting the same document replaces its prior entry. On a
    /// uniqueness violation no change is made.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FieldNotFound`] if the document does not
    /// resolve the indexed field, or [`StoreError::UniqueViolation`] if
    /// the index is unique and a different document holds an equal value.
    pub fn insert(&mut self, doc: &Document) -> StoreResult<()> {
        let value = resolve_path(&doc.data, &self.field)?;
        let key = IndexKey::from_value(value);

        if self.options.unique
            && let Some(ids) = self.tree.get(&key)
            && ids.iter().any(|id| id != &doc.id)
        {
            return Err(StoreError::UniqueViolation(self.field.clone(), doc.id.clone()));
        }

        self.remove(&doc.id);
        self.tree
            .entry(key.clone())
            .or_default()
            .insert(doc.id.clone());
        self.by_doc.insert(doc.id.clone(), key);

        Ok(())
    }

    /// Removes the entry for a document id, returning the key it held.
    ///
    /// A no-op when the id is not indexed; removal must never block cleanup.
    pub fn remove(&mut self, doc_id: &str) -> Option<IndexKey> {
        let key = self.by_doc.remove(doc_id)?;

        if let Some(ids) = self.tree.get_mut(&key) {
            ids.remove(doc_id);
            if ids.is_empty() {
                self.tree.remove(&key);
            }
        }

        Some(key)
    }

    /// Removes a document from the index.
    ///
    /// A no-op when the document is not indexed, even if its payload no
    /// longer resolves the indexed field.
    pub fn delete(&mut self, doc: &Document) {
        self.remove(&doc.id);
    }

    /// Replaces the entry for `old` with one for `new` as a single step.
    ///
    /// If the insert fails the prior entry is restored, so a failed update
    /// leaves the index unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Index::insert`].
    pub fn update(&mut self, old: &Document, new: &Document) -> StoreResult<()> {
        let prior = self.remove(&old.id);

        match self.insert(new) {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Some(key) = prior {
                    self.tree
                        .entry(key.clone())
                        .or_default()
                        .insert(old.id.clone());
                    self.by_doc.insert(old.id.clone(), key);
                }
                Err(err)
            }
        }
    }

    /// Returns true iff this index can answer the given condition.
    pub fn can_serve(&self, condition: &Condition) -> bool {
        condition.field == self.field && condition.operator.index_servable()
    }

    /// Returns the ids of all documents matching the condition.
    ///
    /// Equality ascends from the lower bound and stops at the first entry
    /// greater than the target (ties only, no prefix matches). Range
    /// operators scan from the appropriate bound. An empty result is not
    /// an error.
    pub fn find(&self, condition: &Condition) -> Vec<String> {
        let key = IndexKey::from_value(&condition.value);

        match condition.operator {
            Operator::Eq => self
                .tree
                .range(key.clone()..)
                .take_while(|(entry, _)| **entry == key)
                .flat_map(|(_, ids)| ids.iter().cloned())
                .collect(),
            Operator::Gt => self
                .tree
                .range((Bound::Excluded(key), Bound::Unbounded))
                .flat_map(|(_, ids)| ids.iter().cloned())
                .collect(),
            Operator::Gte => self
                .tree
                .range(key..)
                .flat_map(|(_, ids)| ids.iter().cloned())
                .collect(),
            Operator::Lt => self
                .tree
                .range(..key)
                .flat_map(|(_, ids)| ids.iter().cloned())
                .collect(),
            Operator::Lte => self
                .tree
                .range(..=key)
                .flat_map(|(_, ids)| ids.iter().cloned())
                .collect(),
            // Not servable; the collection falls back to a scan.
            Operator::Ne => Vec::new(),
        }
    }
}
