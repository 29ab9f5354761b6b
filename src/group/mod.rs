//! Boolean query structure
//!
//! Splits a query such as `a = 1 AND (b = 2 OR c = 3)` into nested groups of
//! expressions, resolving AND-over-OR precedence on the way.

mod builder;
pub mod lexer;

#[cfg(test)]
mod property_tests;

pub use builder::{Group, GroupItem};
pub(crate) use builder::parse_group;
