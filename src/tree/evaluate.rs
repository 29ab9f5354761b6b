//! Evaluation of a filter tree against an indexed dataset

use crate::config::QueryConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::expression::Matcher;
use crate::tree::filter_tree::FilterTree;
use crate::tree::node::{ConjunctionKind, Node};
use std::collections::BTreeSet;

impl FilterTree {
    /// Indices of the records matching this tree
    ///
    /// `pre_index` restricts the candidates; without it every record is a
    /// candidate. An empty tree returns the candidates unchanged.
    pub fn filter<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        pre_index: Option<&BTreeSet<usize>>,
    ) -> Result<BTreeSet<usize>> {
        self.filter_with_config(dataset, pre_index, &QueryConfig::default())
    }

    pub fn filter_with_config<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        pre_index: Option<&BTreeSet<usize>>,
        config: &QueryConfig,
    ) -> Result<BTreeSet<usize>> {
        let len = dataset.len();
        let candidates: BTreeSet<usize> = match pre_index {
            Some(index) => index.iter().copied().filter(|&i| i < len).collect(),
            None => (0..len).collect(),
        };

        match self.root() {
            Some(root) => evaluate(root, dataset, candidates, config),
            None => Ok(candidates),
        }
    }

    /// Whether a single record matches
    pub fn matches<D: Dataset + ?Sized>(&self, dataset: &D, index: usize) -> Result<bool> {
        let pre_index = BTreeSet::from([index]);
        Ok(!self.filter(dataset, Some(&pre_index))?.is_empty())
    }
}

fn evaluate<D: Dataset + ?Sized>(
    node: &Node,
    dataset: &D,
    candidates: BTreeSet<usize>,
    config: &QueryConfig,
) -> Result<BTreeSet<usize>> {
    match node {
        Node::Operator(cond) => {
            let matcher = Matcher::new(
                cond.operator,
                &cond.right,
                cond.aggregate,
                config.case_insensitive_like,
            )?;
            let path = cond.path();
            Ok(candidates
                .into_iter()
                .filter(|&index| matcher.matches(&dataset.field_value(index, &path).into_values()))
                .collect())
        }
        Node::Conjunction(conj) => {
            if conj.children().next().is_none() {
                return Ok(candidates);
            }
            match conj.kind {
                ConjunctionKind::And => {
                    let mut remaining = candidates;
                    for child in conj.children() {
                        if remaining.is_empty() {
                            break;
                        }
                        remaining = evaluate(child, dataset, remaining, config)?;
                    }
                    Ok(remaining)
                }
                ConjunctionKind::Or => {
                    let mut matched = BTreeSet::new();
                    for child in conj.children() {
                        matched.extend(evaluate(child, dataset, candidates.clone(), config)?);
                    }
                    Ok(matched)
                }
            }
        }
    }
}
