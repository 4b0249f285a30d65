//! The store: collection registry plus durable snapshot files.
//!
//! A [`Store`] owns the data directory and the map from collection name to
//! collection instance. The registry has its own lock, independent of
//! every collection's lock, so creating or looking up collections never
//! contends with document mutation inside an existing collection.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use mea::rwlock::RwLock;
use tracing::info;

use strata_core::error::{StoreError, StoreResult};

use crate::collection::Collection;
use crate::snapshot;

/// File extension for collection snapshot files.
const SNAPSHOT_EXT: &str = "json";

/// Creates and looks up collections and manages their durable snapshots.
#[derive(Debug)]
pub struct Store {
    data_dir: PathBuf,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl Store {
    /// Opens a store rooted at the given data directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if the directory cannot be created.
    pub fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        Ok(Self {
            data_dir,
            collections: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the data directory this store persists into.
    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }

    /// Allocates a fresh empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CollectionAlreadyExists`] if the name is taken.
    pub async fn create_collection(&self, name: &str) -> StoreResult<Arc<Collection>> {
        let mut collections = self.collections.write().await;

        if collections.contains_key(name) {
            return Err(StoreError::CollectionAlreadyExists(name.to_string()));
        }

        let collection = Arc::new(Collection::new(name, self.snapshot_path(name)));
        collections.insert(name.to_string(), collection.clone());
        info!(collection = name, "created collection");

        Ok(collection)
    }

    /// Looks up a collection by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CollectionNotFound`] if it was never created.
    pub async fn get_collection(&self, name: &str) -> StoreResult<Arc<Collection>> {
        self.collections
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    /// Lists the names of all collections currently registered.
    pub async fn list_collections(&self) -> Vec<String> {
        self.collections.read().await.keys().cloned().collect()
    }

    /// Loads every persisted collection snapshot from the data directory.
    ///
    /// Each `<name>.json` file becomes a freshly constructed collection
    /// holding its persisted documents. Indexes are not persisted, so
    /// loaded collections carry none until declared metadata is supplied
    /// again. Returns the number of collections loaded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if the directory cannot be read
    /// or a snapshot fails to load.
    pub async fn load_all(&self) -> StoreResult<usize> {
        let mut loaded = 0;
        let mut collections = self.collections.write().await;

        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXT) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let documents = snapshot::read(&path)?;
            info!(collection = name, documents = documents.len(), "loaded collection");
            let collection = Collection::with_documents(name, path.clone(), documents);
            collections.insert(name.to_string(), Arc::new(collection));
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Writes the named collection's full document set to its snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CollectionNotFound`] if the collection does
    /// not exist, or a persistence error if the write fails.
    pub async fn save(&self, name: &str) -> StoreResult<()> {
        let collection = self.get_collection(name).await?;
        collection.persist().await
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.{SNAPSHOT_EXT}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_core::document::Document;
    use strata_core::query::{Operator, Query};
    use tempfile::tempdir;

    #[tokio::test]
    async fn create_then_get() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        store.create_collection("products").await.unwrap();
        assert_eq!(store.get_collection("products").await.unwrap().name(), "products");

        let err = store.create_collection("products").await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionAlreadyExists(name) if name == "products"));

        let err = store.get_collection("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(name) if name == "missing"));
    }

    #[tokio::test]
    async fn load_all_restores_persisted_collections() {
        let dir = tempdir().unwrap();

        {
            let store = Store::open(dir.path()).unwrap();
            let products = store.create_collection("products").await.unwrap();
            products
                .insert(Document::new("p1", json!({ "name": "Widget", "price": 9.99 })))
                .await
                .unwrap();
            let users = store.create_collection("users").await.unwrap();
            users
                .insert(Document::new("u1", json!({ "email": "a@example.com" })))
                .await
                .unwrap();
        }

        let store = Store::open(dir.path()).unwrap();
        assert_eq!(store.load_all().await.unwrap(), 2);

        let products = store.get_collection("products").await.unwrap();
        let restored = products.get("p1").await.unwrap();
        assert_eq!(restored.data, json!({ "name": "Widget", "price": 9.99 }));

        // Loaded collections keep working: mutations and scans behave as before.
        products
            .insert(Document::new("p2", json!({ "name": "Gadget", "price": 19.99 })))
            .await
            .unwrap();
        let found = products
            .find(&Query::new().filter("price", Operator::Gte, 10))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "p2");
    }

    #[tokio::test]
    async fn load_all_on_an_empty_directory_loads_nothing() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        assert_eq!(store.load_all().await.unwrap(), 0);
        assert!(store.list_collections().await.is_empty());
    }

    #[tokio::test]
    async fn save_writes_the_snapshot() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.create_collection("products").await.unwrap();

        store.save("products").await.unwrap();
        assert!(dir.path().join("products.json").exists());

        let err = store.save("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(_)));
    }
}
