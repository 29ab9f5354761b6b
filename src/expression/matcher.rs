//! Value matching for a single condition

use crate::error::{QueryError, Result};
use crate::expression::ast::{Aggregate, Expression, Operator};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

/// A condition prepared for repeated evaluation
///
/// LIKE patterns are compiled once; numeric right-hand values are parsed once.
#[derive(Debug, Clone)]
pub struct Matcher {
    operator: Operator,
    aggregate: Option<Aggregate>,
    targets: Vec<Target>,
    patterns: Vec<Regex>,
}

#[derive(Debug, Clone)]
struct Target {
    lowered: String,
    raw: String,
    number: Option<f64>,
}

impl Target {
    fn new(value: &str) -> Self {
        Self {
            lowered: value.to_lowercase(),
            raw: value.to_string(),
            number: parse_number(value),
        }
    }
}

impl Matcher {
    pub fn new(
        operator: Operator,
        values: &[String],
        aggregate: Option<Aggregate>,
        case_insensitive_like: bool,
    ) -> Result<Self> {
        let patterns = if operator.uses_patterns() {
            values
                .iter()
                .map(|v| like_pattern(v, case_insensitive_like))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(Self {
            operator,
            aggregate,
            targets: values.iter().map(|v| Target::new(v)).collect(),
            patterns,
        })
    }

    /// Build a matcher for a parsed expression
    pub fn for_expression(expression: &Expression, case_insensitive_like: bool) -> Result<Self> {
        Self::new(
            expression.operator,
            &expression.values,
            expression.aggregate,
            case_insensitive_like,
        )
    }

    /// Check the (possibly multi-valued) field values
    ///
    /// A condition holds when any value satisfies it; NOT_IN holds when no
    /// value matches any element of the set.
    pub fn matches(&self, field_values: &[String]) -> bool {
        let aggregated;
        let field_values = match self.aggregate {
            Some(aggregate) => {
                aggregated = aggregate.apply(field_values);
                aggregated.as_slice()
            }
            None => field_values,
        };

        match self.operator {
            Operator::In | Operator::Like => field_values.iter().any(|v| self.like_any(v)),
            Operator::NotIn => !field_values.iter().any(|v| self.like_any(v)),
            Operator::NotLike => field_values.iter().any(|v| !self.like_any(v)),
            Operator::Equal => field_values
                .iter()
                .any(|v| self.targets.iter().any(|t| is_equal(v, t))),
            Operator::NotEqual => field_values
                .iter()
                .any(|v| self.targets.iter().all(|t| !is_equal(v, t))),
            Operator::Greater => self.compare_any(field_values, |o| o == Ordering::Greater),
            Operator::Less => self.compare_any(field_values, |o| o == Ordering::Less),
            Operator::GreaterEqual => self.compare_any(field_values, |o| o != Ordering::Less),
            Operator::LessEqual => self.compare_any(field_values, |o| o != Ordering::Greater),
        }
    }

    fn like_any(&self, value: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(value))
    }

    fn compare_any(&self, field_values: &[String], accept: impl Fn(Ordering) -> bool) -> bool {
        field_values.iter().any(|v| {
            self.targets
                .iter()
                .filter_map(|t| compare(v, t))
                .any(&accept)
        })
    }
}

impl Expression {
    /// Evaluate this expression against field values with case-sensitive LIKE
    pub fn matches(&self, field_values: &[String]) -> Result<bool> {
        Ok(Matcher::for_expression(self, false)?.matches(field_values))
    }
}

/// Compile a SQL-style wildcard into an anchored regex: `%` is any sequence,
/// everything else is literal
pub fn like_pattern(value: &str, case_insensitive: bool) -> Result<Regex> {
    let body = value
        .split('%')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    let pattern = format!("^{}$", body);

    RegexBuilder::new(&pattern)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| QueryError::InvalidPattern {
            pattern: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_equal(value: &str, target: &Target) -> bool {
    match (parse_number(value), target.number) {
        (Some(a), Some(b)) => a == b,
        _ => value.to_lowercase() == target.lowered,
    }
}

fn compare(value: &str, target: &Target) -> Option<Ordering> {
    match (parse_number(value), target.number) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(value.cmp(target.raw.as_str())),
    }
}
