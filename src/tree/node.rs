//! Filter tree nodes

use crate::expression::{Aggregate, Expression, Operator};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Owned child link
pub type Link = Option<Box<Node>>;

/// Conjunction kinds; AND binds tighter than OR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConjunctionKind {
    And,
    Or,
}

impl ConjunctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConjunctionKind::And => "AND",
            ConjunctionKind::Or => "OR",
        }
    }
}

impl fmt::Display for ConjunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Child position below a conjunction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// AND / OR node with up to two children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conjunction {
    pub kind: ConjunctionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Link,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Link,
}

impl Conjunction {
    /// A conjunction without children
    pub fn new(kind: ConjunctionKind) -> Self {
        Self {
            kind,
            left: None,
            right: None,
        }
    }

    pub fn child(&self, side: Side) -> Option<&Node> {
        match side {
            Side::Left => self.left.as_deref(),
            Side::Right => self.right.as_deref(),
        }
    }

    pub fn child_mut(&mut self, side: Side) -> &mut Link {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// First empty child slot, left before right
    pub fn free_side(&self) -> Option<Side> {
        if self.left.is_none() {
            Some(Side::Left)
        } else if self.right.is_none() {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn is_complete(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    /// Present children, left to right
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.left.as_deref().into_iter().chain(self.right.as_deref())
    }
}

/// Leaf condition: `left OPERATOR right`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub operator: Operator,
    /// Attribute as written, a dotted path for nested fields
    pub left: String,
    #[serde(default)]
    pub right: Vec<String>,
    /// Free-form tag for the attribute, e.g. that it holds a timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
}

impl Condition {
    pub fn new<I, T>(operator: Operator, left: impl Into<String>, right: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            operator,
            left: left.into(),
            right: right.into_iter().map(|v| v.into().trim().to_string()).collect(),
            context: None,
            aggregate: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    /// Last segment of the attribute path
    pub fn field(&self) -> &str {
        self.left.rsplit('.').next().unwrap_or_default()
    }

    pub fn path(&self) -> SmallVec<[&str; 4]> {
        self.left.split('.').collect()
    }

    /// Operator and attribute agree, and right values too when the probe has any
    pub fn matches_probe(&self, probe: &Condition) -> bool {
        self.operator == probe.operator
            && self.left == probe.left
            && (probe.right.is_empty() || self.right == probe.right)
    }
}

impl From<Expression> for Condition {
    fn from(expression: Expression) -> Self {
        let left = expression.attribute();
        Self {
            operator: expression.operator,
            left,
            right: expression.values,
            context: None,
            aggregate: expression.aggregate,
        }
    }
}

/// A filter tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Conjunction(Conjunction),
    Operator(Condition),
}

impl Node {
    /// Leaf node
    pub fn operator<I, T>(operator: Operator, left: impl Into<String>, right: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Node::Operator(Condition::new(operator, left, right))
    }

    /// Conjunction with optional children
    pub fn conjunction(kind: ConjunctionKind, left: Option<Node>, right: Option<Node>) -> Self {
        Node::Conjunction(Conjunction {
            kind,
            left: left.map(Box::new),
            right: right.map(Box::new),
        })
    }

    pub fn and(left: Node, right: Node) -> Self {
        Self::conjunction(ConjunctionKind::And, Some(left), Some(right))
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::conjunction(ConjunctionKind::Or, Some(left), Some(right))
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Node::Operator(_))
    }

    pub fn as_conjunction(&self) -> Option<&Conjunction> {
        match self {
            Node::Conjunction(conj) => Some(conj),
            Node::Operator(_) => None,
        }
    }

    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            Node::Operator(cond) => Some(cond),
            Node::Conjunction(_) => None,
        }
    }

    /// Conjunction kind, None for leaves
    pub fn kind(&self) -> Option<ConjunctionKind> {
        self.as_conjunction().map(|c| c.kind)
    }

    /// Leaf attributes in depth-first, left-to-right order; duplicates are kept
    pub fn attributes(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_attributes(&mut out);
        out
    }

    fn collect_attributes(&self, out: &mut Vec<String>) {
        match self {
            Node::Operator(cond) => out.push(cond.left.clone()),
            Node::Conjunction(conj) => {
                for child in conj.children() {
                    child.collect_attributes(out);
                }
            }
        }
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        match self {
            Node::Operator(cond) => cond.left == name,
            Node::Conjunction(conj) => conj.children().any(|c| c.has_attribute(name)),
        }
    }

    /// Whether this node matches a search probe
    ///
    /// Leaf probes compare operator, attribute and (when given) right values;
    /// conjunction probes compare structurally.
    pub fn matches_probe(&self, probe: &Node) -> bool {
        match (self, probe) {
            (Node::Operator(cond), Node::Operator(probe)) => cond.matches_probe(probe),
            (Node::Conjunction(_), Node::Conjunction(_)) => self == probe,
            _ => false,
        }
    }

    /// Depth-first search for the first node matching `probe`
    pub fn find(&self, probe: &Node) -> Option<&Node> {
        if self.matches_probe(probe) {
            return Some(self);
        }
        match self {
            Node::Operator(_) => None,
            Node::Conjunction(conj) => conj.children().find_map(|c| c.find(probe)),
        }
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Operator(_) => 1,
            Node::Conjunction(conj) => conj.children().map(Node::leaf_count).sum(),
        }
    }
}

/// Collapse conjunctions with fewer than two children
///
/// A conjunction with one child is replaced by that child, one without
/// children disappears. Leaves pass through unchanged.
pub fn normalize_tree(node: Option<Node>) -> Option<Node> {
    normalize_link(node.map(Box::new)).map(|n| *n)
}

pub(crate) fn normalize_link(link: Link) -> Link {
    let node = link?;
    match *node {
        Node::Operator(_) => Some(node),
        Node::Conjunction(Conjunction { kind, left, right }) => {
            match (normalize_link(left), normalize_link(right)) {
                (Some(left), Some(right)) => Some(Box::new(Node::Conjunction(Conjunction {
                    kind,
                    left: Some(left),
                    right: Some(right),
                }))),
                (Some(only), None) | (None, Some(only)) => Some(only),
                (None, None) => None,
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Operator(cond) => write!(f, "{}", cond),
            Node::Conjunction(conj) => {
                let mut first = true;
                for child in conj.children() {
                    if !first {
                        write!(f, " {} ", conj.kind)?;
                    }
                    first = false;
                    match child.kind() {
                        Some(kind) if kind != conj.kind => write!(f, "({})", child)?,
                        _ => write!(f, "{}", child)?,
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.aggregate {
            Some(aggregate) => write!(f, "{}{{{}}}", aggregate.as_str(), self.left)?,
            None => f.write_str(&self.left)?,
        }
        write!(f, " {} ", self.operator)?;

        match self.right.as_slice() {
            [value] if !self.operator.is_set_operator() => f.write_str(&quote_value(value)),
            values => {
                let items: Vec<String> = values.iter().map(|v| quote_value(v)).collect();
                write!(f, "[{}]", items.join(","))
            }
        }
    }
}

/// Quote a value when it would not survive re-parsing bare
fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value == "?"
        || value.starts_with(':')
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\'' | ',' | '[' | ']'));
    if !needs_quotes {
        return value.to_string();
    }
    if value.contains('"') {
        format!("'{}'", value)
    } else {
        format!("\"{}\"", value)
    }
}
