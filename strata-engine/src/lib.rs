//! Storage engine for the strata document store.
//!
//! This crate implements the storage side of strata:
//!
//! - **Secondary indexes** ([`index`]) - Ordered value-to-ids structures kept
//!   in lock-step with the document map
//! - **Collections** ([`collection`]) - The document map, its indexes, and the
//!   atomic mutation state machine
//! - **Snapshots** ([`snapshot`]) - One JSON file per collection, replaced
//!   atomically on every mutation
//! - **The store** ([`store`]) - Collection registry over a data directory
//!
//! # Concurrency
//!
//! Each collection guards its documents and indexes with one async-aware
//! read-write lock; readers see either the full pre-mutation state or the
//! full post-mutation state, never a mix. The store's registry has its own
//! lock, so collection lookup never contends with document mutation.
//!
//! # Quick Start
//!
//! ```ignore
//! use strata_engine::store::Store;
//! use strata_core::{document::Document, query::{Operator, Query}};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::open("./data")?;
//!     store.load_all().await?;
//!
//!     let products = store.create_collection("products").await?;
//!     products.insert(Document::new("p1", json!({ "price": 9.99 }))).await?;
//!
//!     let cheap = products
//!         .find(&Query::new().filter("price", Operator::Lt, 10))
//!         .await?;
//!     assert_eq!(cheap.len(), 1);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as strata_engine;

pub mod collection;
pub mod index;
pub mod snapshot;
pub mod store;

pub use collection::Collection;
pub use index::{Index, IndexKey};
pub use store::Store;
