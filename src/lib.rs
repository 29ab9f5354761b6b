//! statusql - Boolean filter queries for status data
//!
//! Parses queries such as `host_name LIKE 'web%' AND (state = 2 OR COUNT{comments} > 0)`
//! into a [`FilterTree`] that can be inspected, pruned for a backend's
//! capabilities and evaluated against records. Python bindings are available
//! behind the `python` feature.

pub mod config;
pub mod dataset;
pub mod error;
pub mod expression;
pub mod group;
pub mod query;
pub mod tree;

#[cfg(feature = "python")]
mod python;

pub use config::QueryConfig;
pub use dataset::{Dataset, FieldValue};
pub use error::{QueryError, Result};
pub use expression::{parse_expression, Aggregate, Expression, Operator, Param, Params};
pub use group::{Group, GroupItem};
pub use query::{parse_query, parse_query_with_config, QueryParser};
pub use tree::{
    AttributeAllowList, Condition, Conjunction, ConjunctionKind, FilterTree, Filterable, Node,
};
