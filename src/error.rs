//! Error types for query parsing and filter evaluation

use thiserror::Error;

/// Main error type for query parsing and evaluation
///
/// Positions are byte offsets into the full query text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Malformed expression '{expression}': expected FIELD OPERATOR VALUE")]
    Parse { expression: String },

    #[error("Unknown operator '{operator}' in expression '{expression}'")]
    UnknownOperator { operator: String, expression: String },

    #[error("Unknown aggregation function '{function}' in expression '{expression}'")]
    UnknownAggregate { function: String, expression: String },

    #[error("Unexpected ')' at position {position} in query '{query}'")]
    UnbalancedParenthesis { position: usize, query: String },

    #[error("Unterminated group opened at position {position} in query '{query}', are you missing a parenthesis?")]
    UnterminatedGroup { position: usize, query: String },

    #[error("Unterminated quoted literal starting at position {position} in query '{query}'")]
    UnterminatedQuote { position: usize, query: String },

    #[error("Query has more than {limit} conditions, exceeded at position {position}")]
    TooManyTerms { limit: usize, position: usize },

    #[error("Unexpected conjunction '{keyword}' at position {position} in query '{query}'")]
    UnexpectedConjunction {
        keyword: String,
        position: usize,
        query: String,
    },

    #[error("No positional argument left for '?' in expression '{expression}'")]
    PositionalArgumentExhausted { expression: String },

    #[error("Named argument ':{name}' missing for expression '{expression}'")]
    NamedArgumentMissing { name: String, expression: String },

    #[error("Maximum group nesting depth {limit} exceeded at position {position}")]
    MaxNestingExceeded { limit: usize, position: usize },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl QueryError {
    /// Whether this error was raised while resolving `?` or `:name` placeholders
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            QueryError::PositionalArgumentExhausted { .. } | QueryError::NamedArgumentMissing { .. }
        )
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Deserialization(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<QueryError> for pyo3::PyErr {
    fn from(err: QueryError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyValueError};

        match err {
            QueryError::NamedArgumentMissing { .. } => PyKeyError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Result type alias for query operations
pub type Result<T> = std::result::Result<T, QueryError>;
