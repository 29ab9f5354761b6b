//! Filter tree module
//!
//! A binary tree of AND/OR conjunctions over single conditions, with
//! precedence-aware insertion, copying, pruning and evaluation.

mod evaluate;
mod filter_tree;
pub mod filterable;
mod node;


pub use filter_tree::*;
pub use filterable::*;
pub use node::*;
