//! Query entry points
//!
//! Turns a full query string plus its arguments into a [`FilterTree`].

pub mod cache;

use crate::config::QueryConfig;
use crate::error::{QueryError, Result};
use crate::expression::Params;
use crate::group::{parse_group, Group};
use crate::tree::FilterTree;
use std::str::FromStr;

pub use cache::{cache_size, clear_cache, get_or_parse, get_or_parse_with_config};

/// Parser for boolean queries with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct QueryParser {
    config: QueryConfig,
}

impl QueryParser {
    pub fn new(config: QueryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Parse into the intermediate group structure
    pub fn parse_group(&self, text: &str, params: &mut Params) -> Result<Group> {
        parse_group(text, params, &self.config)
    }

    /// Parse into a normalized filter tree
    ///
    /// Blank input yields an empty tree. Arguments left over after parsing
    /// are ignored.
    pub fn parse(&self, text: &str, params: &mut Params) -> Result<FilterTree> {
        let group = self.parse_group(text, params)?;
        if params.remaining() > 0 {
            tracing::debug!(unused = params.remaining(), query = text, "unused query arguments");
        }

        Ok(match group.into_node() {
            Some(root) => FilterTree::from_root(root),
            None => FilterTree::new(),
        })
    }
}

/// Parse a query with the default configuration
pub fn parse_query(text: &str, params: Params) -> Result<FilterTree> {
    parse_query_with_config(text, params, &QueryConfig::default())
}

pub fn parse_query_with_config(
    text: &str,
    mut params: Params,
    config: &QueryConfig,
) -> Result<FilterTree> {
    QueryParser::new(config.clone())?.parse(text, &mut params)
}

impl FromStr for FilterTree {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        parse_query(s, Params::none())
    }
}
