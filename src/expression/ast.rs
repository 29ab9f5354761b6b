//! Parsed single-condition expressions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Equal (=)
    #[serde(rename = "=")]
    Equal,
    /// Not equal (!=)
    #[serde(rename = "!=")]
    NotEqual,
    /// Greater than (>)
    #[serde(rename = ">")]
    Greater,
    /// Less than (<)
    #[serde(rename = "<")]
    Less,
    /// Greater than or equal (>=)
    #[serde(rename = ">=")]
    GreaterEqual,
    /// Less than or equal (<=)
    #[serde(rename = "<=")]
    LessEqual,
    /// Wildcard match, `%` is any sequence (LIKE)
    #[serde(rename = "LIKE")]
    Like,
    /// Negated wildcard match (NOT_LIKE)
    #[serde(rename = "NOT_LIKE")]
    NotLike,
    /// Any value matches any set element (IN)
    #[serde(rename = "IN")]
    In,
    /// No value matches any set element (NOT_IN)
    #[serde(rename = "NOT_IN")]
    NotIn,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::Greater,
        Operator::Less,
        Operator::GreaterEqual,
        Operator::LessEqual,
        Operator::Like,
        Operator::NotLike,
        Operator::In,
        Operator::NotIn,
    ];

    /// Map an operator token, ignoring case
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token.trim().to_ascii_uppercase().as_str() {
            "=" => Operator::Equal,
            "!=" => Operator::NotEqual,
            ">" => Operator::Greater,
            "<" => Operator::Less,
            ">=" => Operator::GreaterEqual,
            "<=" => Operator::LessEqual,
            "LIKE" => Operator::Like,
            "NOT_LIKE" => Operator::NotLike,
            "IN" => Operator::In,
            "NOT_IN" => Operator::NotIn,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterEqual => ">=",
            Operator::LessEqual => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT_LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
        }
    }

    /// Operators whose right-hand side is a set of values
    pub fn is_set_operator(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// Operators whose right-hand values are wildcard patterns
    pub fn uses_patterns(&self) -> bool {
        matches!(
            self,
            Operator::Like | Operator::NotLike | Operator::In | Operator::NotIn
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation function wrapping the field path, as in `COUNT{comments}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aggregate {
    Count,
}

impl Aggregate {
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("count") {
            Some(Aggregate::Count)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Count => "COUNT",
        }
    }

    /// Reduce the field values to the single aggregated value
    pub fn apply(&self, values: &[String]) -> Vec<String> {
        match self {
            Aggregate::Count => vec![values.len().to_string()],
        }
    }
}

/// Where an expression's right-hand value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`, consumed from the positional arguments
    Positional,
    /// `:name`, looked up in the named arguments
    Named(String),
}

/// A single parsed `FIELD OPERATOR VALUE` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// Source text, trimmed
    pub raw: String,
    pub aggregate: Option<Aggregate>,
    /// Dotted field path split into segments
    pub fields: Vec<String>,
    pub operator: Operator,
    /// Right-hand values, trimmed
    pub values: Vec<String>,
    pub placeholder: Option<Placeholder>,
}

impl Expression {
    /// Field name used for filtering: the last path segment
    pub fn field(&self) -> &str {
        self.fields.last().map(String::as_str).unwrap_or_default()
    }

    /// The dotted attribute path as written
    pub fn attribute(&self) -> String {
        self.fields.join(".")
    }

    /// First right-hand value, if any
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}
