//! Main strata crate providing an embedded JSON document store.
//!
//! This crate is the primary entry point for users of strata. It re-exports
//! the core types and the storage engine, and provides the [`Database`]
//! facade: idempotent collection creation, cross-collection population
//! (joins), and typed collections over plain serde models.
//!
//! # Features
//!
//! - **Embedded storage** - Documents live in-process, one JSON snapshot file
//!   per collection, written atomically on every mutation
//! - **Secondary indexes** - Ordered per-field indexes with optional
//!   uniqueness, declared through a plain configuration object
//! - **Flexible querying** - Fluent condition builder with cross-collection
//!   population directives
//! - **Typed models** - Define your data structures with serde and read them
//!   back as the same type
//!
//! # Quick Start
//!
//! ```ignore
//! use strata::prelude::*;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Product {
//!     pub id: String,
//!     pub name: String,
//!     pub price: f64,
//! }
//!
//! impl Model for Product {
//!     fn id(&self) -> String { self.id.clone() }
//!     fn collection_name() -> &'static str { "products" }
//!     fn indexes() -> IndexConfig {
//!         IndexConfig::new().field("price", IndexOptions::new())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open("./data")?;
//!     db.load().await?;
//!
//!     let products = db.typed::<Product>().await?;
//!     products.insert(&Product {
//!         id: "p1".to_string(),
//!         name: "Widget".to_string(),
//!         price: 9.99,
//!     }).await?;
//!
//!     let cheap = products
//!         .find(&Query::new().filter("price", Operator::Lt, 10))
//!         .await?;
//!     println!("found {} products", cheap.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Population
//!
//! A query can carry population directives that attach related documents
//! from another collection onto each result:
//!
//! ```ignore
//! // orders hold a "product_id" field naming a document in "products"
//! let query = Query::new()
//!     .filter("status", Operator::Eq, "open")
//!     .populate("product_id", "products", "product", None);
//! let orders = db.collection("orders").await?.find(&query).await?;
//! ```

pub mod prelude;

pub use strata_core::{config, document, error, query, value};
pub use strata_engine::{collection, index, snapshot, store};

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use strata_core::config::{IndexConfig, IndexOptions};
use strata_core::document::{Document, Model};
use strata_core::error::{StoreError, StoreResult};
use strata_core::query::{Populate, Query};
use strata_engine::collection::Collection;
use strata_engine::store::Store;

/// The top-level database: a store plus the population and typed-model layers.
///
/// A `Database` is created once per process and passed by reference to any
/// consumer; there is no ambient global state.
#[derive(Debug)]
pub struct Database {
    store: Store,
}

impl Database {
    /// Wraps an already opened store.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Opens a database rooted at the given data directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if the directory cannot be created.
    pub fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        Ok(Self::new(Store::open(data_dir)?))
    }

    /// Loads every persisted collection snapshot from the data directory.
    ///
    /// Returns the number of collections loaded. Call this once at startup,
    /// before collections are created or used.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if a snapshot fails to load.
    pub async fn load(&self) -> StoreResult<usize> {
        self.store.load_all().await
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Creates a collection, or returns the existing one with the same name.
    ///
    /// The index configuration is declared either way, so a collection
    /// loaded from a snapshot (which carries no indexes) gets its declared
    /// indexes rebuilt here.
    ///
    /// # Errors
    ///
    /// Propagates index creation failures, e.g.
    /// [`StoreError::UniqueViolation`] when existing documents break a
    /// declared unique index.
    pub async fn create_collection(
        &self,
        name: &str,
        indexes: IndexConfig,
    ) -> StoreResult<CollectionHandle<'_>> {
        let collection = match self.store.create_collection(name).await {
            Ok(collection) => collection,
            Err(StoreError::CollectionAlreadyExists(_)) => self.store.get_collection(name).await?,
            Err(err) => return Err(err),
        };

        collection.declare_indexes(&indexes).await?;

        Ok(CollectionHandle { database: self, inner: collection })
    }

    /// Retrieves a handle to an existing collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CollectionNotFound`] if it was never created.
    pub async fn collection(&self, name: &str) -> StoreResult<CollectionHandle<'_>> {
        let collection = self.store.get_collection(name).await?;

        Ok(CollectionHandle { database: self, inner: collection })
    }

    /// Returns a typed collection for the given model type.
    ///
    /// The collection is created on first use with the model's declared
    /// indexes ([`Model::indexes`]).
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Database::create_collection`].
    pub async fn typed<M: Model>(&self) -> StoreResult<TypedCollection<'_, M>> {
        let handle = self
            .create_collection(M::collection_name(), M::indexes())
            .await?;

        Ok(TypedCollection { handle, _marker: PhantomData })
    }

    /// Resolves population directives against the base result set.
    ///
    /// For each matched document and each directive, the field named by
    /// the directive must hold the string id of a document in the target
    /// collection; that document's payload is attached under the output
    /// field. The source field is left untouched. Any lookup failure
    /// fails the whole find.
    async fn resolve_populates(
        &self,
        docs: &mut [Document],
        populates: &[Populate],
    ) -> StoreResult<()> {
        for populate in populates {
            let target = self
                .store
                .get_collection(&populate.collection)
                .await
                .map_err(|err| StoreError::Population(populate.field.clone(), err.to_string()))?;

            for doc in docs.iter_mut() {
                let related_id = match doc.field(&populate.field) {
                    Ok(value) => value.as_str().map(str::to_owned).ok_or_else(|| {
                        StoreError::Population(
                            populate.field.clone(),
                            format!("field does not hold a string id in document {}", doc.id),
                        )
                    })?,
                    Err(err) => {
                        return Err(StoreError::Population(populate.field.clone(), err.to_string()));
                    }
                };

                let related = target.get(&related_id).await.map_err(|err| {
                    StoreError::Population(populate.field.clone(), err.to_string())
                })?;

                // A sub-filter guards attachment; a non-matching related
                // document is simply not attached.
                if let Some(filter) = &populate.filter
                    && !filter.matches(&related)
                {
                    continue;
                }

                let Some(map) = doc.data.as_object_mut() else {
                    return Err(StoreError::Population(
                        populate.field.clone(),
                        format!("document {} payload is not an object", doc.id),
                    ));
                };
                map.insert(populate.output_field.clone(), related.data);
            }
        }

        Ok(())
    }
}

/// A handle to one collection, carrying the database reference needed to
/// resolve cross-collection populations.
#[derive(Debug)]
pub struct CollectionHandle<'a> {
    database: &'a Database,
    inner: Arc<Collection>,
}

impl CollectionHandle<'_> {
    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the number of documents currently stored.
    pub async fn count(&self) -> usize {
        self.inner.count().await
    }

    /// Inserts a new document. See [`Collection::insert`].
    pub async fn insert(&self, doc: Document) -> StoreResult<()> {
        self.inner.insert(doc).await
    }

    /// Retrieves a document by id. See [`Collection::get`].
    pub async fn get(&self, id: &str) -> StoreResult<Document> {
        self.inner.get(id).await
    }

    /// Replaces an existing document wholesale. See [`Collection::update`].
    pub async fn update(&self, doc: Document) -> StoreResult<()> {
        self.inner.update(doc).await
    }

    /// Removes a document. See [`Collection::delete`].
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.inner.delete(id).await
    }

    /// Inserts many documents with one durable write. See [`Collection::bulk_insert`].
    pub async fn bulk_insert(&self, docs: Vec<Document>, batch_size: usize) -> StoreResult<()> {
        self.inner.bulk_insert(docs, batch_size).await
    }

    /// Creates a secondary index over a field. See [`Collection::create_index`].
    pub async fn create_index(&self, field: &str, options: IndexOptions) -> StoreResult<()> {
        self.inner.create_index(field, options).await
    }

    /// Finds all documents matching the query, resolving populations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Population`] naming the directive's field if
    /// a population lookup fails.
    pub async fn find(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let mut docs = self.inner.find(query).await?;

        if query.has_populates() {
            self.database
                .resolve_populates(&mut docs, &query.populates)
                .await?;
        }

        Ok(docs)
    }
}

/// A type-safe collection for a specific model type.
///
/// Models serialize into document payloads on write and deserialize back
/// on read, so callers never handle raw documents.
#[derive(Debug)]
pub struct TypedCollection<'a, M: Model> {
    handle: CollectionHandle<'a>,
    _marker: PhantomData<M>,
}

impl<M: Model> TypedCollection<'_, M> {
    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Inserts a new model instance.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the model cannot be encoded, plus
    /// the errors of [`Collection::insert`].
    pub async fn insert(&self, model: &M) -> StoreResult<()> {
        self.handle.insert(Document::from_model(model)?).await
    }

    /// Retrieves a model by id.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the stored payload does not decode
    /// as `M`, plus the errors of [`Collection::get`].
    pub async fn get(&self, id: &str) -> StoreResult<M> {
        let doc = self.handle.get(id).await?;
        Ok(serde_json::from_value(doc.data)?)
    }

    /// Replaces an existing model instance wholesale.
    pub async fn update(&self, model: &M) -> StoreResult<()> {
        self.handle.update(Document::from_model(model)?).await
    }

    /// Removes a model by id.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.handle.delete(id).await
    }

    /// Inserts many models with one durable write.
    pub async fn bulk_insert(&self, models: &[M], batch_size: usize) -> StoreResult<()> {
        let docs = models
            .iter()
            .map(Document::from_model)
            .collect::<StoreResult<Vec<_>>>()?;

        self.handle.bulk_insert(docs, batch_size).await
    }

    /// Finds all models matching the query.
    pub async fn find(&self, query: &Query) -> StoreResult<Vec<M>> {
        self.handle
            .find(query)
            .await?
            .into_iter()
            .map(|doc| Ok(serde_json::from_value(doc.data)?))
            .collect()
    }
}
