//! Property tests for query structure and precedence

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::expression::Params;
use crate::query::parse_query;
use crate::tree::ConjunctionKind;

const FIELDS: [&str; 4] = ["a", "b", "c", "d"];

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators
// ═══════════════════════════════════════════════════════════════════════════

/// One `field = value` term
fn term_strategy() -> impl Strategy<Value = (usize, u8)> {
    (0..FIELDS.len(), 0u8..3)
}

/// A flat query: terms joined by AND / OR, no parentheses
fn flat_query_strategy() -> impl Strategy<Value = (Vec<(usize, u8)>, Vec<ConjunctionKind>)> {
    prop::collection::vec(term_strategy(), 1..7).prop_flat_map(|terms| {
        let joins = prop::collection::vec(
            prop_oneof![Just(ConjunctionKind::And), Just(ConjunctionKind::Or)],
            terms.len() - 1,
        );
        (Just(terms), joins)
    })
}

fn dataset_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        prop::array::uniform4(0u8..3).prop_map(|[a, b, c, d]| json!({"a": a, "b": b, "c": c, "d": d})),
        1..12,
    )
}

fn render(terms: &[(usize, u8)], joins: &[ConjunctionKind]) -> String {
    let mut query = format!("{} = {}", FIELDS[terms[0].0], terms[0].1);
    for (join, (field, value)) in joins.iter().zip(&terms[1..]) {
        query.push_str(&format!(" {} {} = {}", join, FIELDS[*field], value));
    }
    query
}

/// AND binds tighter than OR: a disjunction of AND runs
fn reference_match(record: &Value, terms: &[(usize, u8)], joins: &[ConjunctionKind]) -> bool {
    let holds = |(field, value): &(usize, u8)| record[FIELDS[*field]] == json!(value);
    let mut any = false;
    let mut run = holds(&terms[0]);
    for (join, term) in joins.iter().zip(&terms[1..]) {
        match join {
            ConjunctionKind::And => run = run && holds(term),
            ConjunctionKind::Or => {
                any = any || run;
                run = holds(term);
            }
        }
    }
    any || run
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// Parsed trees evaluate with AND-over-OR precedence
    #[test]
    fn prop_precedence_matches_reference(
        (terms, joins) in flat_query_strategy(),
        records in dataset_strategy()
    ) {
        let query = render(&terms, &joins);
        let tree = parse_query(&query, Params::none()).unwrap();
        let matched = tree.filter(&records, None).unwrap();

        for (index, record) in records.iter().enumerate() {
            prop_assert_eq!(
                matched.contains(&index),
                reference_match(record, &terms, &joins),
                "query {:?} record {}", query, record
            );
        }
    }

    /// The tree mentions exactly the fields written in the query, in order
    #[test]
    fn prop_attribute_round_trip((terms, joins) in flat_query_strategy()) {
        let query = render(&terms, &joins);
        let tree = parse_query(&query, Params::none()).unwrap();
        let expected: Vec<String> = terms.iter().map(|(f, _)| FIELDS[*f].to_string()).collect();
        prop_assert_eq!(tree.attributes(), expected);
    }

    /// Rendering a tree and parsing it again keeps its meaning
    #[test]
    fn prop_display_reparses_equivalently(
        (terms, joins) in flat_query_strategy(),
        records in dataset_strategy()
    ) {
        let tree = parse_query(&render(&terms, &joins), Params::none()).unwrap();
        let rendered = tree.to_string();
        let reparsed = parse_query(&rendered, Params::none()).unwrap();

        prop_assert_eq!(reparsed.attributes(), tree.attributes());
        prop_assert_eq!(
            reparsed.filter(&records, None).unwrap(),
            tree.filter(&records, None).unwrap()
        );
    }

    /// Wrapping a query in redundant parentheses changes nothing
    #[test]
    fn prop_redundant_parentheses(
        (terms, joins) in flat_query_strategy(),
        records in dataset_strategy()
    ) {
        let query = render(&terms, &joins);
        let plain = parse_query(&query, Params::none()).unwrap();
        let wrapped = parse_query(&format!("(({}))", query), Params::none()).unwrap();
        prop_assert_eq!(
            wrapped.filter(&records, None).unwrap(),
            plain.filter(&records, None).unwrap()
        );
    }
}
