//! Single expression parser
//!
//! Grammar: `[FUNC{]FIELD.PATH[}] OPERATOR (VALUE | ? | :name)`.
//! Both `host = a` and `host=a` are accepted; everything after the
//! operator is the value, so values may contain spaces.

use crate::config::QueryConfig;
use crate::error::{QueryError, Result};
use crate::expression::ast::{Aggregate, Expression, Operator, Placeholder};
use crate::expression::params::Params;
use once_cell::sync::Lazy;
use regex::Regex;

static AGGREGATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_]+)\{(.*)\}$").expect("aggregate pattern is valid")
});

const OPERATOR_CHARS: [char; 4] = ['=', '!', '<', '>'];

/// Parse one condition, resolving placeholders from `params`
pub fn parse_expression(text: &str, params: &mut Params, config: &QueryConfig) -> Result<Expression> {
    let raw = text.trim();
    let malformed = || QueryError::Parse {
        expression: raw.to_string(),
    };

    let (field_token, rest) = split_field(raw).ok_or_else(malformed)?;
    let (aggregate, path) = extract_aggregate(field_token, raw)?;

    let fields: Vec<String> = path.split('.').map(|s| s.trim().to_string()).collect();
    if fields.iter().any(String::is_empty) {
        return Err(malformed());
    }

    let (operator_token, value_token) = split_operator(rest).ok_or_else(malformed)?;
    let operator = Operator::from_token(&operator_token).ok_or_else(|| QueryError::UnknownOperator {
        operator: operator_token.clone(),
        expression: raw.to_string(),
    })?;

    let value_token = value_token.trim();
    if value_token.is_empty() {
        return Err(malformed());
    }

    let (values, placeholder) = resolve_value(value_token, operator, params, config, raw)?;

    Ok(Expression {
        raw: raw.to_string(),
        aggregate,
        fields,
        operator,
        values,
        placeholder,
    })
}

/// Split off the field token; braces of an aggregation wrapper are kept together
fn split_field(raw: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut end = raw.len();
    for (i, c) in raw.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            c if depth == 0 && (c.is_whitespace() || OPERATOR_CHARS.contains(&c)) => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    if end == 0 || end == raw.len() {
        return None;
    }
    Some((&raw[..end], &raw[end..]))
}

fn extract_aggregate<'a>(token: &'a str, raw: &str) -> Result<(Option<Aggregate>, &'a str)> {
    let Some(caps) = AGGREGATE_RE.captures(token) else {
        return Ok((None, token));
    };
    let (Some(function), Some(inner)) = (caps.get(1), caps.get(2)) else {
        return Ok((None, token));
    };
    let aggregate = Aggregate::from_name(function.as_str()).ok_or_else(|| QueryError::UnknownAggregate {
        function: function.as_str().to_string(),
        expression: raw.to_string(),
    })?;
    Ok((Some(aggregate), inner.as_str().trim()))
}

/// Split the operator token from the value
///
/// Symbolic operators may be glued to the value (`=1`); word operators
/// end at whitespace. `NOT LIKE` and `NOT IN` are folded into one token.
fn split_operator(rest: &str) -> Option<(String, &str)> {
    let rest = rest.trim_start();
    let first = rest.chars().next()?;

    if OPERATOR_CHARS.contains(&first) {
        let end = rest
            .find(|c: char| !OPERATOR_CHARS.contains(&c))
            .unwrap_or(rest.len());
        return Some((rest[..end].to_string(), &rest[end..]));
    }

    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let word = &rest[..end];
    let after = &rest[end..];

    if word.eq_ignore_ascii_case("NOT") {
        let next = after.trim_start();
        let next_end = next.find(char::is_whitespace).unwrap_or(next.len());
        let next_word = &next[..next_end];
        if next_word.eq_ignore_ascii_case("LIKE") || next_word.eq_ignore_ascii_case("IN") {
            return Some((
                format!("NOT_{}", next_word.to_ascii_uppercase()),
                &next[next_end..],
            ));
        }
    }

    Some((word.to_string(), after))
}

fn resolve_value(
    value: &str,
    operator: Operator,
    params: &mut Params,
    config: &QueryConfig,
    raw: &str,
) -> Result<(Vec<String>, Option<Placeholder>)> {
    if let Some(name) = value.strip_prefix(':') {
        let name = name.trim();
        if name.is_empty() {
            return Err(QueryError::Parse {
                expression: raw.to_string(),
            });
        }
        let param = params
            .get_named(name)
            .cloned()
            .ok_or_else(|| QueryError::NamedArgumentMissing {
                name: name.to_string(),
                expression: raw.to_string(),
            })?;
        return Ok((param.into_values(), Some(Placeholder::Named(name.to_string()))));
    }

    if value == "?" {
        let param = params
            .next_positional()
            .ok_or_else(|| QueryError::PositionalArgumentExhausted {
                expression: raw.to_string(),
            })?;
        return Ok((param.into_values(), Some(Placeholder::Positional)));
    }

    Ok((literal_values(value, operator, config), None))
}

/// Literal values: set operators take `[a,b]` or `a,b`; any operator takes a
/// bracketed list, which is how a multi-valued condition prints
fn literal_values(value: &str, operator: Operator, config: &QueryConfig) -> Vec<String> {
    let bracketed = value.strip_prefix('[').and_then(|v| v.strip_suffix(']'));
    let inner = match bracketed {
        Some(inner) => inner,
        None if operator.is_set_operator() => value,
        None => return vec![unquote(value, config).to_string()],
    };

    split_list(inner, config.list_separator)
        .into_iter()
        .map(|v| unquote(v.trim(), config).to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Split on `separator` outside of quotes
fn split_list(inner: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == separator => {
                parts.push(&inner[start..i]);
                start = i + c.len_utf8();
            }
            None => {}
        }
    }
    parts.push(&inner[start..]);
    parts
}

fn unquote<'a>(value: &'a str, config: &QueryConfig) -> &'a str {
    if !config.strip_quotes || value.len() < 2 {
        return value;
    }
    let bytes = value.as_bytes();
    let first = bytes[0];
    if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Expression> {
        parse_expression(text, &mut Params::none(), &QueryConfig::default())
    }

    #[test]
    fn test_parse_spaced_expression() {
        let expr = parse("host_name = localhost").unwrap();
        assert_eq!(expr.fields, vec!["host_name".to_string()]);
        assert_eq!(expr.operator, Operator::Equal);
        assert_eq!(expr.values, vec!["localhost".to_string()]);
        assert_eq!(expr.placeholder, None);
    }

    #[test]
    fn test_parse_compact_expression() {
        let expr = parse("a>=1").unwrap();
        assert_eq!(expr.field(), "a");
        assert_eq!(expr.operator, Operator::GreaterEqual);
        assert_eq!(expr.value(), Some("1"));
    }

    #[test]
    fn test_value_keeps_inner_spaces() {
        let expr = parse("  output LIKE  CRITICAL - disk full ").unwrap();
        assert_eq!(expr.operator, Operator::Like);
        assert_eq!(expr.value(), Some("CRITICAL - disk full"));
    }

    #[test]
    fn test_dotted_path_last_segment_is_field() {
        let expr = parse("host.comments.author = icinga").unwrap();
        assert_eq!(expr.fields.len(), 3);
        assert_eq!(expr.field(), "author");
        assert_eq!(expr.attribute(), "host.comments.author");
    }

    #[test]
    fn test_count_aggregate() {
        let expr = parse("COUNT{service.comments} > 2").unwrap();
        assert_eq!(expr.aggregate, Some(Aggregate::Count));
        assert_eq!(expr.fields, vec!["service".to_string(), "comments".to_string()]);
        assert_eq!(expr.operator, Operator::Greater);
    }

    #[test]
    fn test_unknown_aggregate() {
        let err = parse("SUM{a} > 2").unwrap_err();
        assert!(matches!(err, QueryError::UnknownAggregate { ref function, .. } if function == "SUM"));
    }

    #[test]
    fn test_unknown_operator_names_token_and_expression() {
        let err = parse("host ~ web").unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownOperator {
                operator: "~".to_string(),
                expression: "host ~ web".to_string(),
            }
        );

        let err = parse("a == 1").unwrap_err();
        assert!(matches!(err, QueryError::UnknownOperator { ref operator, .. } if operator == "=="));
    }

    #[test]
    fn test_malformed_expressions() {
        for text in ["", "host", "host =", "= 1", "host LIKE   "] {
            let err = parse(text).unwrap_err();
            assert!(matches!(err, QueryError::Parse { .. }), "{text}: {err:?}");
        }
    }

    #[test]
    fn test_positional_placeholder() {
        let mut params = Params::positional([4]);
        let expr = parse_expression("numeric_val >= ?", &mut params, &QueryConfig::default()).unwrap();
        assert_eq!(expr.value(), Some("4"));
        assert_eq!(expr.placeholder, Some(Placeholder::Positional));
        assert_eq!(params.remaining(), 0);

        let err = parse_expression("numeric_val >= ?", &mut params, &QueryConfig::default()).unwrap_err();
        assert!(matches!(err, QueryError::PositionalArgumentExhausted { .. }));
    }

    #[test]
    fn test_named_placeholder() {
        let mut params = Params::named([("host", "web01")]);
        let expr = parse_expression("host_name = :host", &mut params, &QueryConfig::default()).unwrap();
        assert_eq!(expr.value(), Some("web01"));
        assert_eq!(expr.placeholder, Some(Placeholder::Named("host".to_string())));

        let err = parse_expression("host_name = :missing", &mut params, &QueryConfig::default()).unwrap_err();
        assert_eq!(
            err,
            QueryError::NamedArgumentMissing {
                name: "missing".to_string(),
                expression: "host_name = :missing".to_string(),
            }
        );
    }

    #[test]
    fn test_quotes_stripped() {
        let expr = parse(r#"name LIKE "foo%""#).unwrap();
        assert_eq!(expr.value(), Some("foo%"));

        let config = QueryConfig {
            strip_quotes: false,
            ..Default::default()
        };
        let expr = parse_expression("name = 'x'", &mut Params::none(), &config).unwrap();
        assert_eq!(expr.value(), Some("'x'"));
    }

    #[test]
    fn test_literal_in_list() {
        let expr = parse("state IN [0, 1,'2']").unwrap();
        assert_eq!(expr.operator, Operator::In);
        assert_eq!(expr.values, vec!["0", "1", "2"]);

        let expr = parse("state not in 3,4").unwrap();
        assert_eq!(expr.operator, Operator::NotIn);
        assert_eq!(expr.values, vec!["3", "4"]);
    }

    #[test]
    fn test_list_param_for_in() {
        let mut params = Params::positional([vec!["a", "b"]]);
        let expr = parse_expression("host IN ?", &mut params, &QueryConfig::default()).unwrap();
        assert_eq!(expr.values, vec!["a", "b"]);
    }

    #[test]
    fn test_not_like_alias() {
        let expr = parse("host NOT LIKE web%").unwrap();
        assert_eq!(expr.operator, Operator::NotLike);
        assert_eq!(expr.value(), Some("web%"));
    }

    #[test]
    fn test_bracketed_list_for_scalar_operator() {
        let expr = parse("host_name = [web01, web02]").unwrap();
        assert_eq!(expr.operator, Operator::Equal);
        assert_eq!(expr.values, vec!["web01", "web02"]);

        let expr = parse("host_name = []").unwrap();
        assert!(expr.values.is_empty());

        let expr = parse("host_name = '[web01]'").unwrap();
        assert_eq!(expr.values, vec!["[web01]"]);
    }

    #[test]
    fn test_list_separator_inside_quotes() {
        let expr = parse("output IN [\"disk, full\", ok]").unwrap();
        assert_eq!(expr.values, vec!["disk, full", "ok"]);
    }
}
