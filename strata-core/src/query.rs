//! Query construction and document matching.
//!
//! A query is an immutable value object: a conjunction of field conditions
//! plus optional population (join) directives, built through a fluent API.
//! Evaluation happens against a document's payload as a generic JSON value
//! tree, independent of which concrete type was originally inserted.
//!
//! # Query Building
//!
//! ```ignore
//! use strata_core::query::{Operator, Query};
//!
//! let query = Query::new()
//!     .filter("price", Operator::Gte, 10)
//!     .filter("category.name", Operator::Eq, "tools");
//! ```

use std::cmp::Ordering;

use serde_json::Value;

use crate::document::Document;
use crate::value::{Comparable, resolve_path};

/// Comparison operators for query conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal to (full structural equality).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
}

impl Operator {
    /// Returns true if an ordered index can answer this operator.
    ///
    /// `Ne` always requires a full scan.
    pub fn index_servable(self) -> bool {
        !matches!(self, Operator::Ne)
    }
}

/// A single field/operator/value test within a query.
#[derive(Debug, Clone)]
pub struct Condition {
    /// The dotted field path to test.
    pub field: String,
    /// The comparison operator.
    pub operator: Operator,
    /// The value to compare against.
    pub value: Value,
}

impl Condition {
    /// Evaluates this condition against a document.
    ///
    /// An unresolvable field path or a comparison between values of
    /// different primitive kinds makes the condition false; neither
    /// aborts evaluation.
    pub fn matches(&self, doc: &Document) -> bool {
        let Ok(field_value) = resolve_path(&doc.data, &self.field) else {
            return false;
        };

        match self.operator {
            Operator::Eq => Comparable::from(field_value) == Comparable::from(&self.value),
            Operator::Ne => Comparable::from(field_value) != Comparable::from(&self.value),
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                match Comparable::from(field_value).partial_cmp(&Comparable::from(&self.value)) {
                    Some(ordering) => match self.operator {
                        Operator::Gt => ordering == Ordering::Greater,
                        Operator::Gte => ordering != Ordering::Less,
                        Operator::Lt => ordering == Ordering::Less,
                        Operator::Lte => ordering != Ordering::Greater,
                        _ => unreachable!(),
                    },
                    None => false,
                }
            }
        }
    }
}

/// A join-like directive attaching a related document onto each result.
///
/// `field` names the payload field holding the related document's id,
/// `collection` names the target collection, and the related payload is
/// attached under `output_field` (the source field is left untouched).
#[derive(Debug, Clone)]
pub struct Populate {
    /// The payload field holding the related document id.
    pub field: String,
    /// The target collection name.
    pub collection: String,
    /// The payload field the related document is attached under.
    pub output_field: String,
    /// Optional filter the related document must match to be attached.
    pub filter: Option<Query>,
}

/// A conjunction of conditions plus optional population directives.
///
/// Queries have no ownership relation to any collection; the same query
/// can be evaluated against any document or submitted to any collection.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// The conditions, all of which must match.
    pub conditions: Vec<Condition>,
    /// The population directives, applied to the base result in order.
    pub populates: Vec<Populate>,
}

impl Query {
    /// Creates a new empty query that matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a condition. Returns self for chaining.
    pub fn filter(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.conditions.push(Condition {
            field: field.into(),
            operator,
            value: value.into(),
        });
        self
    }

    /// Appends a population directive. Returns self for chaining.
    pub fn populate(
        mut self,
        field: impl Into<String>,
        collection: impl Into<String>,
        output_field: impl Into<String>,
        filter: Option<Query>,
    ) -> Self {
        self.populates.push(Populate {
            field: field.into(),
            collection: collection.into(),
            output_field: output_field.into(),
            filter,
        });
        self
    }

    /// Returns true iff every condition matches the document.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|condition| condition.matches(doc))
    }

    /// Returns true if this query carries population directives.
    pub fn has_populates(&self) -> bool {
        !self.populates.is_empty()
    }
}
