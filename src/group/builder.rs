//! Recursive-descent group parser
//!
//! A query is a flat sequence of terms joined by AND / OR, where a term is
//! either a single expression or a parenthesized query. Precedence is
//! resolved without a grammar table by opening implicit subgroups whenever
//! the conjunction changes at the same level.

use crate::config::QueryConfig;
use crate::error::{QueryError, Result};
use crate::expression::{parse_expression, Expression, Params};
use crate::group::lexer::{Lexer, Token, TokenKind};
use crate::tree::{ConjunctionKind, Condition, Node};

/// One member of a group
#[derive(Debug, Clone, PartialEq)]
pub enum GroupItem {
    Expression(Expression),
    Group(Group),
}

impl GroupItem {
    pub fn into_node(self) -> Option<Node> {
        match self {
            GroupItem::Expression(expr) => Some(Node::Operator(Condition::from(expr))),
            GroupItem::Group(group) => group.into_node(),
        }
    }
}

/// Items joined by a single conjunction kind
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    kind: Option<ConjunctionKind>,
    items: Vec<GroupItem>,
}

impl Group {
    pub fn new(kind: ConjunctionKind) -> Self {
        Self {
            kind: Some(kind),
            items: Vec::new(),
        }
    }

    /// Conjunction joining the items; AND until a keyword says otherwise
    pub fn kind(&self) -> ConjunctionKind {
        self.kind.unwrap_or(ConjunctionKind::And)
    }

    pub fn set_kind(&mut self, kind: ConjunctionKind) {
        self.kind = Some(kind);
    }

    pub fn items(&self) -> &[GroupItem] {
        &self.items
    }

    pub fn add_item(&mut self, item: GroupItem) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Fold the items into a right-leaning conjunction chain
    ///
    /// Left-to-right order is kept; empty nested groups disappear.
    pub fn into_node(self) -> Option<Node> {
        let kind = self.kind();
        self.items
            .into_iter()
            .filter_map(GroupItem::into_node)
            .rev()
            .reduce(|right, left| Node::conjunction(kind, Some(left), Some(right)))
    }
}

/// Parse a whole query into its top-level group
pub(crate) fn parse_group(query: &str, params: &mut Params, config: &QueryConfig) -> Result<Group> {
    let mut terms = 0;
    build_group(query, query, 0, 0, &mut terms, params, config)
}

/// Parse `src`, which starts at byte `offset` of `query`, into a group
///
/// `terms` counts the expressions parsed so far across all groups.
fn build_group(
    query: &str,
    src: &str,
    offset: usize,
    depth: usize,
    terms: &mut usize,
    params: &mut Params,
    config: &QueryConfig,
) -> Result<Group> {
    if depth > config.max_nesting_depth {
        return Err(QueryError::MaxNestingExceeded {
            limit: config.max_nesting_depth,
            position: offset.saturating_sub(1),
        });
    }

    let mut lexer = Lexer::new(src);
    let mut state = GroupState::new(query, offset, terms);
    let mut nesting = 0usize;
    let mut group_start = 0usize;
    let mut span: Option<(usize, usize)> = None;

    loop {
        let token = lexer.next_token();
        match token.kind {
            TokenKind::Eof => break,
            TokenKind::UnterminatedQuote => {
                return Err(QueryError::UnterminatedQuote {
                    position: offset + token.start,
                    query: query.to_string(),
                });
            }
            TokenKind::GroupBegin => {
                if nesting == 0 {
                    state.flush(span.take(), src, params, config)?;
                    group_start = token.start;
                }
                nesting += 1;
            }
            TokenKind::GroupEnd => {
                if nesting == 0 {
                    return Err(QueryError::UnbalancedParenthesis {
                        position: offset + token.start,
                        query: query.to_string(),
                    });
                }
                nesting -= 1;
                if nesting == 0 {
                    let inner_start = group_start + 1;
                    let group = build_group(
                        query,
                        &src[inner_start..token.start],
                        offset + inner_start,
                        depth + 1,
                        state.terms,
                        params,
                        config,
                    )?;
                    state.push(GroupItem::Group(group));
                }
            }
            TokenKind::Conjunction(kind) if nesting == 0 => {
                state.flush(span.take(), src, params, config)?;
                state.conjunction(kind, &token)?;
            }
            TokenKind::Conjunction(_) | TokenKind::Expression => {
                if nesting == 0 {
                    let start = span.map_or(token.start, |(start, _)| start);
                    span = Some((start, token.end));
                }
            }
        }
    }

    if nesting > 0 {
        return Err(QueryError::UnterminatedGroup {
            position: offset + group_start,
            query: query.to_string(),
        });
    }

    state.flush(span.take(), src, params, config)?;
    state.finish()
}

/// Items collected so far at one parenthesis level
struct GroupState<'q, 't> {
    query: &'q str,
    terms: &'t mut usize,
    offset: usize,
    kind: Option<ConjunctionKind>,
    items: Vec<GroupItem>,
    /// Implicit AND subgroup being collected inside an OR group
    and_run: Option<Vec<GroupItem>>,
    /// Conjunction still waiting for its right-hand term
    pending: Option<(ConjunctionKind, usize)>,
}

impl<'q, 't> GroupState<'q, 't> {
    fn new(query: &'q str, offset: usize, terms: &'t mut usize) -> Self {
        Self {
            query,
            terms,
            offset,
            kind: None,
            items: Vec::new(),
            and_run: None,
            pending: None,
        }
    }

    fn push(&mut self, item: GroupItem) {
        self.pending = None;
        match &mut self.and_run {
            Some(run) => run.push(item),
            None => self.items.push(item),
        }
    }

    fn flush(
        &mut self,
        span: Option<(usize, usize)>,
        src: &str,
        params: &mut Params,
        config: &QueryConfig,
    ) -> Result<()> {
        let Some((start, end)) = span else {
            return Ok(());
        };
        let text = src[start..end].trim();
        if !text.is_empty() {
            // flat chains become one tree level per condition
            if *self.terms >= config.max_terms {
                return Err(QueryError::TooManyTerms {
                    limit: config.max_terms,
                    position: self.offset + start,
                });
            }
            *self.terms += 1;
            let expression = parse_expression(text, params, config)?;
            self.push(GroupItem::Expression(expression));
        }
        Ok(())
    }

    fn conjunction(&mut self, kind: ConjunctionKind, token: &Token) -> Result<()> {
        let has_term = !self.items.is_empty() || self.and_run.is_some();
        if self.pending.is_some() || !has_term {
            return Err(self.unexpected(kind, token.start));
        }
        self.pending = Some((kind, token.start));

        match (self.kind, kind) {
            (None, _) => self.kind = Some(kind),
            (Some(ConjunctionKind::And), ConjunctionKind::Or) => {
                // everything so far binds tighter than the OR
                if self.items.len() > 1 {
                    tracing::debug!(items = self.items.len(), "implicit AND subgroup before OR");
                    let items = std::mem::take(&mut self.items);
                    self.items.push(GroupItem::Group(Group {
                        kind: Some(ConjunctionKind::And),
                        items,
                    }));
                }
                self.kind = Some(ConjunctionKind::Or);
            }
            (Some(ConjunctionKind::Or), ConjunctionKind::And) => {
                if self.and_run.is_none() {
                    tracing::debug!("implicit AND subgroup inside OR");
                    let last = self.items.pop();
                    self.and_run = Some(last.into_iter().collect());
                }
            }
            (Some(ConjunctionKind::Or), ConjunctionKind::Or) => self.close_and_run(),
            (Some(ConjunctionKind::And), ConjunctionKind::And) => {}
        }
        Ok(())
    }

    fn close_and_run(&mut self) {
        if let Some(run) = self.and_run.take() {
            let item = if run.len() == 1 {
                run.into_iter().next()
            } else {
                Some(GroupItem::Group(Group {
                    kind: Some(ConjunctionKind::And),
                    items: run,
                }))
            };
            self.items.extend(item);
        }
    }

    fn finish(mut self) -> Result<Group> {
        if let Some((kind, position)) = self.pending {
            return Err(self.unexpected(kind, position));
        }
        self.close_and_run();
        Ok(Group {
            kind: self.kind,
            items: self.items,
        })
    }

    fn unexpected(&self, kind: ConjunctionKind, position: usize) -> QueryError {
        QueryError::UnexpectedConjunction {
            keyword: kind.as_str().to_string(),
            position: self.offset + position,
            query: self.query.to_string(),
        }
    }
}
