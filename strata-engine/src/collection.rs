//! Collections: the document map, its indexes, and the mutation state machine.
//!
//! A collection owns one map from document id to document plus every
//! secondary index over that map, all guarded by a single read-write lock
//! so no reader ever observes updated documents next to stale indexes.
//! Every mutation follows the same order: exclusive lock, precondition,
//! document map, indexes, durable snapshot. If an index update or the
//! snapshot write fails, the earlier steps are rolled back before the
//! error surfaces.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use mea::rwlock::RwLock;
use tracing::debug;

use strata_core::config::{IndexConfig, IndexOptions};
use strata_core::document::Document;
use strata_core::error::{StoreError, StoreResult};
use strata_core::query::Query;

use crate::index::Index;
use crate::snapshot;

/// A named, independently locked set of documents plus its indexes.
///
/// Collections are handed out by the [`Store`](crate::store::Store) as
/// `Arc<Collection>`; all methods take `&self` and serialize through the
/// internal lock.
#[derive(Debug)]
pub struct Collection {
    name: String,
    path: PathBuf,
    state: RwLock<CollectionState>,
}

#[derive(Debug, Default)]
struct CollectionState {
    documents: HashMap<String, Document>,
    indexes: HashMap<String, Index>,
}

impl Collection {
    /// Creates an empty collection persisting to the given snapshot path.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::with_documents(name, path, HashMap::new())
    }

    /// Creates a collection pre-filled with documents loaded from a snapshot.
    ///
    /// Indexes are not persisted, so a loaded collection starts without
    /// any; they are re-derived when declared metadata is supplied.
    pub fn with_documents(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        documents: HashMap<String, Document>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            state: RwLock::new(CollectionState { documents, indexes: HashMap::new() }),
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of documents currently stored.
    pub async fn count(&self) -> usize {
        self.state.read().await.documents.len()
    }

    /// Inserts a new document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DocumentAlreadyExists`] if the id is taken,
    /// [`StoreError::UniqueViolation`] if a unique index rejects the
    /// document, or a persistence error if the snapshot write fails. On
    /// any error the collection is left unchanged.
    pub async fn insert(&self, doc: Document) -> StoreResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if state.documents.contains_key(&doc.id) {
            return Err(StoreError::DocumentAlreadyExists(doc.id, self.name.clone()));
        }

        let id = doc.id.clone();
        state.documents.insert(id.clone(), doc.clone());

        if let Err(err) = index_insert(&mut state.indexes, &doc) {
            state.documents.remove(&id);
            return Err(err);
        }

        if let Err(err) = snapshot::write(&self.path, &state.documents) {
            index_discard(&mut state.indexes, &id);
            state.documents.remove(&id);
            return Err(err);
        }

        debug!(collection = %self.name, id = %id, "inserted document");
        Ok(())
    }

    /// Retrieves a document by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DocumentNotFound`] if the id is absent.
    pub async fn get(&self, id: &str) -> StoreResult<Document> {
        let state = self.state.read().await;

        state
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string(), self.name.clone()))
    }

    /// Replaces an existing document wholesale and re-syncs every index.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DocumentNotFound`] if the id is absent. On
    /// any index or persistence failure the previous document and its
    /// index entries are restored.
    pub async fn update(&self, doc: Document) -> StoreResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let Some(old) = state.documents.get(&doc.id).cloned() else {
            return Err(StoreError::DocumentNotFound(doc.id, self.name.clone()));
        };

        state.documents.insert(doc.id.clone(), doc.clone());

        if let Err(err) = index_update(&mut state.indexes, &old, &doc) {
            state.documents.insert(old.id.clone(), old);
            return Err(err);
        }

        if let Err(err) = snapshot::write(&self.path, &state.documents) {
            // Reverting to the previous document cannot violate uniqueness.
            let _ = index_update(&mut state.indexes, &doc, &old);
            state.documents.insert(old.id.clone(), old);
            return Err(err);
        }

        debug!(collection = %self.name, id = %doc.id, "updated document");
        Ok(())
    }

    /// Removes a document and its index entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DocumentNotFound`] if the id is absent, or a
    /// persistence error (with the document restored) if the snapshot
    /// write fails.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let Some(doc) = state.documents.remove(id) else {
            return Err(StoreError::DocumentNotFound(id.to_string(), self.name.clone()));
        };

        index_discard(&mut state.indexes, id);

        if let Err(err) = snapshot::write(&self.path, &state.documents) {
            // Restoring a document that was indexed before cannot fail.
            let _ = index_insert(&mut state.indexes, &doc);
            state.documents.insert(doc.id.clone(), doc);
            return Err(err);
        }

        debug!(collection = %self.name, id = %id, "deleted document");
        Ok(())
    }

    /// Finds all documents matching the query's conditions.
    ///
    /// If some index can serve one of the conditions, its candidate ids
    /// narrow the search; every candidate is still re-validated against
    /// the full query, so an index never changes the logical result. With
    /// no servable index, or an empty candidate set, every document is
    /// scanned.
    pub async fn find(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let state = self.state.read().await;

        let docs = match index_candidates(&state.indexes, query) {
            Some(ids) if !ids.is_empty() => ids
                .iter()
                .filter_map(|id| state.documents.get(id))
                .filter(|doc| query.matches(doc))
                .cloned()
                .collect(),
            _ => state
                .documents
                .values()
                .filter(|doc| query.matches(doc))
                .cloned()
                .collect(),
        };

        Ok(docs)
    }

    /// Inserts many documents with one durable write.
    ///
    /// Documents merge into the map in `batch_size` chunks under a single
    /// lock hold; indexes are then built over the full inserted set and
    /// the snapshot is written exactly once. A duplicate id, whether
    /// within the batch or against existing data, aborts with the
    /// offending id before anything is applied; a later failure rolls the
    /// whole batch back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DocumentAlreadyExists`] naming the duplicate
    /// id, [`StoreError::UniqueViolation`], or a persistence error.
    pub async fn bulk_insert(&self, docs: Vec<Document>, batch_size: usize) -> StoreResult<()> {
        if docs.is_empty() {
            return Ok(());
        }
        let batch_size = batch_size.max(1);

        // Intra-batch duplicates are detectable before taking the lock.
        let mut seen = HashSet::with_capacity(docs.len());
        for doc in &docs {
            if !seen.insert(doc.id.as_str()) {
                return Err(StoreError::DocumentAlreadyExists(doc.id.clone(), self.name.clone()));
            }
        }

        let mut guard = self.state.write().await;
        let state = &mut *guard;

        for doc in &docs {
            if state.documents.contains_key(&doc.id) {
                return Err(StoreError::DocumentAlreadyExists(doc.id.clone(), self.name.clone()));
            }
        }

        for batch in docs.chunks(batch_size) {
            for doc in batch {
                state.documents.insert(doc.id.clone(), doc.clone());
            }
        }

        for (pos, doc) in docs.iter().enumerate() {
            if let Err(err) = index_insert(&mut state.indexes, doc) {
                for prior in &docs[..pos] {
                    index_discard(&mut state.indexes, &prior.id);
                }
                for doc in &docs {
                    state.documents.remove(&doc.id);
                }
                return Err(err);
            }
        }

        if let Err(err) = snapshot::write(&self.path, &state.documents) {
            for doc in &docs {
                index_discard(&mut state.indexes, &doc.id);
                state.documents.remove(&doc.id);
            }
            return Err(err);
        }

        debug!(collection = %self.name, count = docs.len(), batch_size, "bulk inserted documents");
        Ok(())
    }

    /// Creates a secondary index over a field, replaying every current document.
    ///
    /// Documents that do not resolve the field are skipped. Indexes are
    /// in-memory derived data; creating one does not touch the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IndexAlreadyExists`] if the field is already
    /// indexed, or [`StoreError::UniqueViolation`] if the replay breaks a
    /// uniqueness constraint (the new index is discarded).
    pub async fn create_index(&self, field: &str, options: IndexOptions) -> StoreResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if state.indexes.contains_key(field) {
            return Err(StoreError::IndexAlreadyExists(field.to_string()));
        }

        let mut index = Index::new(field, options);
        for doc in state.documents.values() {
            if !index.covers(doc) {
                continue;
            }
            index.insert(doc)?;
        }

        state.indexes.insert(field.to_string(), index);
        debug!(collection = %self.name, field, unique = options.unique, "created index");
        Ok(())
    }

    /// Creates one index per field marked in the configuration.
    ///
    /// Fields that already carry an index are skipped, so declaring the
    /// same configuration twice is harmless.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Collection::create_index`] other than
    /// [`StoreError::IndexAlreadyExists`].
    pub async fn declare_indexes(&self, config: &IndexConfig) -> StoreResult<()> {
        for (field, options) in config.iter() {
            match self.create_index(field, options).await {
                Ok(()) | Err(StoreError::IndexAlreadyExists(_)) => {}
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    /// Writes the current document set to the snapshot file.
    ///
    /// Mutations persist themselves; this exists for explicit saves
    /// driven by the store.
    pub async fn persist(&self) -> StoreResult<()> {
        let state = self.state.read().await;
        snapshot::write(&self.path, &state.documents)
    }

    #[cfg(test)]
    pub(crate) async fn index_contains(&self, field: &str, doc_id: &str) -> bool {
        let state = self.state.read().await;
        state
            .indexes
            .get(field)
            .is_some_and(|index| index.contains(doc_id))
    }
}

/// Applies a fresh document to every index that resolves its field,
/// undoing earlier indexes if a later one rejects it.
fn index_insert(indexes: &mut HashMap<String, Index>, doc: &Document) -> StoreResult<()> {
    let fields: Vec<String> = indexes.keys().cloned().collect();

    for (pos, field) in fields.iter().enumerate() {
        let Some(index) = indexes.get_mut(field) else { continue };
        if !index.covers(doc) {
            continue;
        }

        if let Err(err) = index.insert(doc) {
            for prior in &fields[..pos] {
                if let Some(index) = indexes.get_mut(prior) {
                    index.remove(&doc.id);
                }
            }
            return Err(err);
        }
    }

    Ok(())
}

/// Switches every index from the old document to the new one, restoring
/// the old entries if any index rejects the new document.
fn index_update(
    indexes: &mut HashMap<String, Index>,
    old: &Document,
    new: &Document,
) -> StoreResult<()> {
    let fields: Vec<String> = indexes.keys().cloned().collect();

    for (pos, field) in fields.iter().enumerate() {
        let Some(index) = indexes.get_mut(field) else { continue };

        let result = if index.covers(new) {
            index.update(old, new)
        } else {
            // The new payload no longer resolves the field; drop the entry.
            index.remove(&new.id);
            Ok(())
        };

        if let Err(err) = result {
            for prior in &fields[..pos] {
                if let Some(index) = indexes.get_mut(prior) {
                    index.remove(&new.id);
                    if index.covers(old) {
                        // The old document was indexed before, so this cannot fail.
                        let _ = index.insert(old);
                    }
                }
            }
            return Err(err);
        }
    }

    Ok(())
}

/// Removes a document id from every index. Never fails.
fn index_discard(indexes: &mut HashMap<String, Index>, doc_id: &str) {
    for index in indexes.values_mut() {
        index.remove(doc_id);
    }
}

/// Finds the first index able to serve one of the query's conditions and
/// returns its candidate ids.
fn index_candidates(indexes: &HashMap<String, Index>, query: &Query) -> Option<Vec<String>> {
    for condition in &query.conditions {
        for index in indexes.values() {
            if index.can_serve(condition) {
                return Some(index.find(condition));
            }
        }
    }

    None
}
