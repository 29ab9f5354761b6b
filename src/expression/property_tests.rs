//! Property tests for the expression module

use proptest::prelude::*;

use crate::config::QueryConfig;
use crate::error::QueryError;
use crate::expression::ast::Operator;
use crate::expression::matcher::Matcher;
use crate::expression::params::Params;
use crate::expression::parser::parse_expression;

fn field_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,8}(\\.[a-z][a-z_]{0,8}){0,2}"
}

fn symbol_operator_strategy() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::Equal),
        Just(Operator::NotEqual),
        Just(Operator::Greater),
        Just(Operator::Less),
        Just(Operator::GreaterEqual),
        Just(Operator::LessEqual),
    ]
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_\\-]{1,12}"
}

proptest! {
    /// Spaced and compact forms parse to the same expression
    #[test]
    fn prop_spaced_and_compact_agree(
        field in field_strategy(),
        op in symbol_operator_strategy(),
        value in value_strategy()
    ) {
        let config = QueryConfig::default();
        let spaced = parse_expression(&format!("{} {} {}", field, op, value), &mut Params::none(), &config).unwrap();
        let compact = parse_expression(&format!("{}{}{}", field, op, value), &mut Params::none(), &config).unwrap();
        prop_assert_eq!(&spaced.fields, &compact.fields);
        prop_assert_eq!(spaced.operator, compact.operator);
        prop_assert_eq!(&spaced.values, &compact.values);
        prop_assert_eq!(spaced.attribute(), field);
    }

    /// Every `?` consumes exactly one positional argument
    #[test]
    fn prop_positional_consumption(args in prop::collection::vec(value_strategy(), 0..4)) {
        let config = QueryConfig::default();
        let mut params = Params::positional(args.clone());
        for arg in &args {
            let expr = parse_expression("field = ?", &mut params, &config).unwrap();
            prop_assert_eq!(expr.value(), Some(arg.as_str()));
        }
        let err = parse_expression("field = ?", &mut params, &config).unwrap_err();
        let is_exhausted = matches!(err, QueryError::PositionalArgumentExhausted { .. });
        prop_assert!(is_exhausted);
    }

    /// `prefix%` matches exactly the strings starting with prefix
    #[test]
    fn prop_like_prefix(prefix in "[a-z.*+?()]{0,6}", candidate in "[a-z.*+?()]{0,10}") {
        let matcher = Matcher::new(Operator::Like, &[format!("{}%", prefix)], None, false).unwrap();
        prop_assert_eq!(matcher.matches(&[candidate.clone()]), candidate.starts_with(&prefix));
    }

    /// NOT_IN is the complement of IN for any non-empty field
    #[test]
    fn prop_not_in_complements_in(
        set in prop::collection::vec("[a-c]{1,2}", 1..4),
        field_values in prop::collection::vec("[a-c]{1,2}", 0..4)
    ) {
        let is_in = Matcher::new(Operator::In, &set, None, false).unwrap();
        let not_in = Matcher::new(Operator::NotIn, &set, None, false).unwrap();
        prop_assert_eq!(is_in.matches(&field_values), !not_in.matches(&field_values));
    }
}
