//! Parser and evaluation configuration
//!
//! Every field has a serde default, so a partial JSON object such as
//! `{"max_nesting_depth": 8}` is a valid configuration.

use crate::error::{QueryError, Result};
use serde::{Deserialize, Serialize};

/// Options shared by the query parser and the filter evaluator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Deepest allowed parenthesized group
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
    /// Most conditions a single query may hold
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,
    /// Match LIKE / IN patterns without regard to case
    #[serde(default)]
    pub case_insensitive_like: bool,
    /// Strip one pair of matching quotes around literal values
    #[serde(default = "default_strip_quotes")]
    pub strip_quotes: bool,
    /// Separator for literal IN / NOT_IN lists
    #[serde(default = "default_list_separator")]
    pub list_separator: char,
}

fn default_max_nesting_depth() -> usize {
    32
}

fn default_max_terms() -> usize {
    1024
}

fn default_strip_quotes() -> bool {
    true
}

fn default_list_separator() -> char {
    ','
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: default_max_nesting_depth(),
            max_terms: default_max_terms(),
            case_insensitive_like: false,
            strip_quotes: default_strip_quotes(),
            list_separator: default_list_separator(),
        }
    }
}

impl QueryConfig {
    /// Deserialize and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: QueryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the parser cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_nesting_depth == 0 {
            return Err(QueryError::InvalidConfig(
                "max_nesting_depth must be at least 1".to_string(),
            ));
        }
        if self.max_terms == 0 {
            return Err(QueryError::InvalidConfig(
                "max_terms must be at least 1".to_string(),
            ));
        }
        if self.list_separator.is_whitespace()
            || matches!(self.list_separator, '(' | ')' | '\'' | '"')
        {
            return Err(QueryError::InvalidConfig(format!(
                "list_separator '{}' is reserved",
                self.list_separator
            )));
        }
        Ok(())
    }
}
