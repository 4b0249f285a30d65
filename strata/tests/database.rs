//! End-to-end tests for the database facade: idempotent collection
//! creation, population resolution, typed models, and restart behavior.

use serde::{Deserialize, Serialize};
use serde_json::json;
use strata::prelude::*;
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Product {
    id: String,
    name: String,
    sku: String,
    price: f64,
}

impl Model for Product {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn collection_name() -> &'static str {
        "products"
    }

    fn indexes() -> IndexConfig {
        IndexConfig::new()
            .field("price", IndexOptions::new())
            .field("sku", IndexOptions::unique())
    }
}

fn product(id: &str, name: &str, sku: &str, price: f64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        sku: sku.to_string(),
        price,
    }
}

#[tokio::test]
async fn create_collection_is_idempotent() {
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();

    let first = db.create_collection("products", IndexConfig::new()).await.unwrap();
    first
        .insert(Document::new("p1", json!({ "name": "Widget" })))
        .await
        .unwrap();

    // A second create returns the same collection, documents intact.
    let second = db.create_collection("products", IndexConfig::new()).await.unwrap();
    assert_eq!(second.count().await, 1);

    assert!(matches!(
        db.collection("missing").await.unwrap_err(),
        StoreError::CollectionNotFound(name) if name == "missing"
    ));
}

#[tokio::test]
async fn populate_attaches_related_documents() {
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();

    let products = db.create_collection("products", IndexConfig::new()).await.unwrap();
    products
        .insert(Document::new("p1", json!({ "name": "Widget", "price": 9.99 })))
        .await
        .unwrap();

    let orders = db.create_collection("orders", IndexConfig::new()).await.unwrap();
    orders
        .insert(Document::new("o1", json!({ "product_id": "p1", "quantity": 3 })))
        .await
        .unwrap();

    let query = Query::new().populate("product_id", "products", "product", None);
    let found = orders.find(&query).await.unwrap();

    assert_eq!(found.len(), 1);
    // The related payload lands under the output field; the source field
    // is untouched.
    assert_eq!(found[0].data["product_id"], json!("p1"));
    assert_eq!(found[0].data["product"], json!({ "name": "Widget", "price": 9.99 }));

    // The stored order itself was not mutated by the join.
    let stored = orders.get("o1").await.unwrap();
    assert_eq!(stored.data, json!({ "product_id": "p1", "quantity": 3 }));
}

#[tokio::test]
async fn populate_failures_name_the_field() {
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();

    let orders = db.create_collection("orders", IndexConfig::new()).await.unwrap();
    orders
        .insert(Document::new("o1", json!({ "product_id": "p1" })))
        .await
        .unwrap();

    // Target collection does not exist.
    let query = Query::new().populate("product_id", "products", "product", None);
    let err = orders.find(&query).await.unwrap_err();
    assert!(matches!(err, StoreError::Population(field, _) if field == "product_id"));

    // Target exists but the related document does not.
    db.create_collection("products", IndexConfig::new()).await.unwrap();
    let err = orders.find(&query).await.unwrap_err();
    assert!(matches!(err, StoreError::Population(field, _) if field == "product_id"));
}

#[tokio::test]
async fn populate_sub_filter_guards_attachment() {
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();

    let products = db.create_collection("products", IndexConfig::new()).await.unwrap();
    products
        .insert(Document::new("p1", json!({ "name": "Widget", "price": 9.99 })))
        .await
        .unwrap();

    let orders = db.create_collection("orders", IndexConfig::new()).await.unwrap();
    orders
        .insert(Document::new("o1", json!({ "product_id": "p1" })))
        .await
        .unwrap();

    let matching = Query::new().populate(
        "product_id",
        "products",
        "product",
        Some(Query::new().filter("price", Operator::Lt, 10)),
    );
    let found = orders.find(&matching).await.unwrap();
    assert_eq!(found[0].data["product"], json!({ "name": "Widget", "price": 9.99 }));

    let non_matching = Query::new().populate(
        "product_id",
        "products",
        "product",
        Some(Query::new().filter("price", Operator::Gte, 10)),
    );
    let found = orders.find(&non_matching).await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].data.get("product").is_none());
}

#[tokio::test]
async fn typed_collections_round_trip_models() {
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();

    let products = db.typed::<Product>().await.unwrap();
    products.insert(&product("p1", "Widget", "W-1", 9.99)).await.unwrap();
    products.insert(&product("p2", "Gadget", "G-1", 19.99)).await.unwrap();

    let stored = products.get("p1").await.unwrap();
    assert_eq!(stored, product("p1", "Widget", "W-1", 9.99));

    // The declared price index serves this query; results come back typed.
    let expensive = products
        .find(&Query::new().filter("price", Operator::Gte, 10))
        .await
        .unwrap();
    assert_eq!(expensive, vec![product("p2", "Gadget", "G-1", 19.99)]);

    // The declared unique sku index rejects duplicates.
    let err = products
        .insert(&product("p3", "Clone", "W-1", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(field, _) if field == "sku"));
}

#[tokio::test]
async fn typed_bulk_insert_reaches_every_model() {
    let dir = tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();

    let products = db.typed::<Product>().await.unwrap();
    let models: Vec<Product> = (0..20)
        .map(|i| product(&format!("p{i}"), "Widget", &format!("W-{i}"), f64::from(i)))
        .collect();

    products.bulk_insert(&models, 7).await.unwrap();

    for model in &models {
        assert_eq!(&products.get(&model.id).await.unwrap(), model);
    }

    let found = products
        .find(&Query::new().filter("price", Operator::Gte, 10))
        .await
        .unwrap();
    assert_eq!(found.len(), 10);
}

#[tokio::test]
async fn reopening_restores_documents_and_rebuilds_declared_indexes() {
    let dir = tempdir().unwrap();

    {
        let db = Database::open(dir.path()).unwrap();
        let products = db.typed::<Product>().await.unwrap();
        products.insert(&product("p1", "Widget", "W-1", 9.99)).await.unwrap();
        products.insert(&product("p2", "Gadget", "G-1", 19.99)).await.unwrap();
    }

    let db = Database::open(dir.path()).unwrap();
    assert_eq!(db.load().await.unwrap(), 1);

    // Indexes are not persisted; typed access re-declares them over the
    // loaded documents.
    let products = db.typed::<Product>().await.unwrap();
    assert_eq!(
        products.get("p1").await.unwrap(),
        product("p1", "Widget", "W-1", 9.99)
    );

    let expensive = products
        .find(&Query::new().filter("price", Operator::Gte, 10))
        .await
        .unwrap();
    assert_eq!(expensive, vec![product("p2", "Gadget", "G-1", 19.99)]);

    // The rebuilt unique index still enforces uniqueness.
    let err = products
        .insert(&product("p3", "Clone", "W-1", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(field, _) if field == "sku"));
}
