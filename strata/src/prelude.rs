//! Convenient re-exports of commonly used types from strata.
//!
//! Import this prelude module to quickly access the most frequently used
//! types without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use strata::prelude::*;
//! ```

pub use crate::{CollectionHandle, Database, TypedCollection};

pub use strata_core::{
    config::{IndexConfig, IndexOptions},
    document::{Document, Model},
    error::{StoreError, StoreResult},
    query::{Condition, Operator, Populate, Query},
};

pub use strata_engine::{collection::Collection, store::Store};
