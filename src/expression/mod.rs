//! Single-condition expressions
//!
//! This module handles parsing condition strings like `host_name = ?` or
//! `COUNT{comments} > 2` and matching field values against them.

mod ast;
pub mod matcher;
mod params;
pub mod parser;

#[cfg(test)]
mod property_tests;

pub use ast::*;
pub use matcher::*;
pub use params::*;
pub use parser::*;
