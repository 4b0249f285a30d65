//! Core types for the strata embedded document store.
//!
//! This crate holds everything that is independent of storage:
//!
//! - **Documents** ([`document`]) - The stored unit: a string id plus an opaque JSON payload
//! - **Value access** ([`value`]) - Dotted-path field resolution and value comparison
//! - **Queries** ([`query`]) - Condition/population model with a fluent builder
//! - **Index configuration** ([`config`]) - Declarative field-to-options index metadata
//! - **Error handling** ([`error`]) - The error and result types shared by every crate
//!
//! # Example
//!
//! ```ignore
//! use strata_core::{document::Document, query::{Operator, Query}};
//! use serde_json::json;
//!
//! let doc = Document::new("p1", json!({ "name": "Widget", "price": 9.99 }));
//! let query = Query::new().filter("price", Operator::Lt, 10);
//! assert!(query.matches(&doc));
//! ```

#[allow(unused_extern_crates)]
extern crate self as strata_core;

pub mod config;
pub mod document;
pub mod error;
pub mod query;
pub mod value;
