//! Filter tree ownership, insertion and structural transforms

use crate::error::Result;
use crate::tree::filterable::Filterable;
use crate::tree::node::{normalize_link, normalize_tree, Conjunction, ConjunctionKind, Link, Node, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A binary tree of conjunctions and conditions
///
/// The tree owns its root; an empty tree means "no filter". The insertion
/// cursor remembers where the last node went so that a following leaf can
/// be attached below it. It is not part of the tree's value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterTree {
    #[serde(default)]
    root: Link,
    #[serde(skip)]
    cursor: Option<Vec<Side>>,
}

impl PartialEq for FilterTree {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl FilterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing node, normalizing it
    pub fn from_root(root: Node) -> Self {
        Self {
            root: normalize_link(Some(Box::new(root))),
            cursor: None,
        }
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    pub fn into_root(self) -> Option<Node> {
        self.root.map(|n| *n)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Forget the insertion cursor; call before starting a new insertion session
    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    /// Insert a node, placing it by precedence
    ///
    /// - AND conjunctions descend through AND nodes (filling left, then right,
    ///   then the right chain) and sit above the first other node found.
    /// - OR conjunctions descend through any conjunction and sit above the
    ///   first leaf found: below AND nodes, above conditions.
    /// - Leaves (and complete subtrees) fill the free side of the last
    ///   inserted conjunction. After a leaf, an implicit AND is inserted first.
    pub fn insert(&mut self, node: Node) {
        let path = if self.root.is_none() {
            self.root = Some(Box::new(node));
            Vec::new()
        } else {
            match node {
                Node::Conjunction(conj) if !conj.is_complete() => self.insert_conjunction(conj),
                operand => self.insert_operand(operand),
            }
        };
        self.cursor = Some(path);
    }

    fn insert_conjunction(&mut self, mut conj: Conjunction) -> Vec<Side> {
        let path = locate_conjunction_slot(self.root.as_deref(), conj.kind);
        tracing::trace!(kind = %conj.kind, depth = path.len(), "placing conjunction");

        if let Some(slot) = slot_at(&mut self.root, &path) {
            if let Some(displaced) = slot.take() {
                if conj.left.is_some() && conj.right.is_none() {
                    conj.right = conj.left.take();
                }
                conj.left = Some(displaced);
            }
            *slot = Some(Box::new(Node::Conjunction(conj)));
        }
        path
    }

    fn insert_operand(&mut self, node: Node) -> Vec<Side> {
        let target = self.cursor.as_ref().and_then(|path| {
            let side = node_at(self.root.as_deref(), path)?
                .as_conjunction()?
                .free_side()?;
            Some((path.clone(), side))
        });

        let (mut path, side) = match target {
            Some(target) => target,
            None => {
                tracing::trace!("synthesizing implicit AND");
                let path = self.insert_conjunction(Conjunction::new(ConjunctionKind::And));
                let side = node_at(self.root.as_deref(), &path)
                    .and_then(Node::as_conjunction)
                    .and_then(Conjunction::free_side)
                    .unwrap_or(Side::Right);
                (path, side)
            }
        };

        path.push(side);
        if let Some(slot) = slot_at(&mut self.root, &path) {
            *slot = Some(Box::new(node));
        }
        path
    }

    /// Independent deep copy, normalized, with a fresh cursor
    ///
    /// Conjunctions are rebuilt by inserting their copied children into a new
    /// tree, so the copy never shares nodes with the source.
    pub fn create_copy(&self) -> FilterTree {
        let root = self.root.as_deref().and_then(copy_node);
        FilterTree {
            root: normalize_link(root.map(Box::new)),
            cursor: None,
        }
    }

    /// Copy without the conditions the filterable cannot handle
    ///
    /// A conjunction that loses one side collapses into the other; one that
    /// loses both disappears.
    pub fn copy_for_filterable<F: Filterable + ?Sized>(&self, filterable: &F) -> FilterTree {
        let copy = self.create_copy();
        FilterTree {
            root: prune(copy.root, filterable),
            cursor: None,
        }
    }

    pub fn normalize(&mut self) {
        self.root = normalize_link(self.root.take());
        self.cursor = None;
    }

    /// See [`normalize_tree`]
    pub fn normalize_tree(node: Option<Node>) -> Option<Node> {
        normalize_tree(node)
    }

    /// Copy with the first node matching `probe` removed
    ///
    /// Returns an unchanged copy when nothing matches.
    pub fn without_node(&self, probe: &Node) -> FilterTree {
        let mut copy = self.create_copy();
        if remove_first(&mut copy.root, probe) {
            copy.normalize();
        } else {
            tracing::debug!(probe = %probe, "node to remove not found");
        }
        copy
    }

    /// All leaf attributes, duplicates kept
    pub fn attributes(&self) -> Vec<String> {
        self.root().map(Node::attributes).unwrap_or_default()
    }

    pub fn has_node_with_attribute(&self, name: &str) -> bool {
        self.root().is_some_and(|root| root.has_attribute(name))
    }

    pub fn find_node(&self, probe: &Node) -> Option<&Node> {
        self.root()?.find(probe)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a tree, normalizing it
    pub fn from_json(json: &str) -> Result<Self> {
        let mut tree: FilterTree = serde_json::from_str(json)?;
        tree.normalize();
        Ok(tree)
    }
}

impl From<Node> for FilterTree {
    fn from(node: Node) -> Self {
        FilterTree::from_root(node)
    }
}

impl fmt::Display for FilterTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root() {
            Some(root) => write!(f, "{}", root),
            None => Ok(()),
        }
    }
}

/// Path to the slot a new conjunction of `kind` goes into
fn locate_conjunction_slot(root: Option<&Node>, kind: ConjunctionKind) -> Vec<Side> {
    let mut path = Vec::new();
    let mut current = root;
    while let Some(Node::Conjunction(conj)) = current {
        if kind == ConjunctionKind::And && conj.kind != ConjunctionKind::And {
            break;
        }
        if let Some(side) = conj.free_side() {
            path.push(side);
            break;
        }
        path.push(Side::Right);
        current = conj.right.as_deref();
    }
    path
}

fn node_at<'a>(root: Option<&'a Node>, path: &[Side]) -> Option<&'a Node> {
    let mut current = root?;
    for side in path {
        current = current.as_conjunction()?.child(*side)?;
    }
    Some(current)
}

fn slot_at<'a>(mut slot: &'a mut Link, path: &[Side]) -> Option<&'a mut Link> {
    for side in path {
        slot = match slot.as_deref_mut() {
            Some(Node::Conjunction(conj)) => conj.child_mut(*side),
            _ => return None,
        };
    }
    Some(slot)
}

fn copy_node(node: &Node) -> Option<Node> {
    match node {
        Node::Operator(cond) => Some(Node::Operator(cond.clone())),
        Node::Conjunction(conj) => {
            let mut subtree = FilterTree::new();
            subtree.insert(Node::Conjunction(Conjunction::new(conj.kind)));
            for child in conj.children() {
                if let Some(copy) = copy_node(child) {
                    // children go below the copied conjunction, not next to each other
                    subtree.cursor = Some(Vec::new());
                    subtree.insert(copy);
                }
            }
            normalize_tree(subtree.into_root())
        }
    }
}

fn prune<F: Filterable + ?Sized>(link: Link, filterable: &F) -> Link {
    let node = link?;
    match *node {
        Node::Operator(ref cond) => {
            if filterable.is_valid_filter_target(&cond.left) {
                Some(node)
            } else {
                tracing::trace!(attribute = %cond.left, "pruning condition");
                None
            }
        }
        Node::Conjunction(Conjunction { kind, left, right }) => {
            match (prune(left, filterable), prune(right, filterable)) {
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

fn remove_first(link: &mut Link, probe: &Node) -> bool {
    let Some(node) = link.as_deref_mut() else {
        return false;
    };
    if node.matches_probe(probe) {
        *link = None;
        return true;
    }
    match node {
        Node::Operator(_) => false,
        Node::Conjunction(conj) => {
            remove_first(&mut conj.left, probe) || remove_first(&mut conj.right, probe)
        }
    }
}
