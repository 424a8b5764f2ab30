//! Matcher evaluation and rule matching.

use super::{MatchOperator, Matcher, ReactionRule};
use crate::alert::{self, AlertPayload};
use regex::Regex;

/// Resolve a matcher attribute. A bare name (no dot) that is not a top-level
/// field addresses the label of the same name.
fn resolve_attribute(payload: &AlertPayload, path: &str) -> Option<String> {
    alert::resolve(payload, path).or_else(|| {
        if !path.is_empty() && !path.contains('.') {
            payload.label(path).map(str::to_string)
        } else {
            None
        }
    })
}

/// Evaluate one matcher against a payload.
///
/// Unresolved attributes never match, including for the negated operators
/// (`NotEqual`, `NotIn`, `NotRegex`). Only `DoesNotExist` is satisfied by a
/// missing attribute. Pure and deterministic.
pub fn evaluate(matcher: &Matcher, payload: &AlertPayload) -> bool {
    let resolved = resolve_attribute(payload, &matcher.attribute_path);

    match matcher.operator {
        MatchOperator::Exists => resolved.is_some(),
        MatchOperator::DoesNotExist => resolved.is_none(),
        op => resolved.is_some_and(|actual| compare(op, &actual, &matcher.values)),
    }
}

/// Compare a resolved value. Single-value operators read `values[0]`,
/// treating an absent first value as the empty string.
fn compare(op: MatchOperator, actual: &str, values: &[String]) -> bool {
    let expected = values.first().map(String::as_str).unwrap_or("");

    match op {
        MatchOperator::Equal => actual == expected,
        MatchOperator::NotEqual => actual != expected,
        MatchOperator::In => values.iter().any(|v| v == actual),
        MatchOperator::NotIn => !values.iter().any(|v| v == actual),
        MatchOperator::GreaterThan => compare_numeric(actual, expected, |a, e| a > e),
        MatchOperator::LessThan => compare_numeric(actual, expected, |a, e| a < e),
        // A broken pattern never fires, in either direction.
        MatchOperator::Regex => Regex::new(expected).is_ok_and(|re| re.is_match(actual)),
        MatchOperator::NotRegex => Regex::new(expected).is_ok_and(|re| !re.is_match(actual)),
        MatchOperator::Exists | MatchOperator::DoesNotExist => false,
    }
}

fn compare_numeric(actual: &str, expected: &str, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (parse_decimal(actual), parse_decimal(expected)) {
        (Some(a), Some(e)) => cmp(a, e),
        _ => false,
    }
}

/// Parses a finite decimal number. `f64::from_str` also accepts `inf`,
/// `infinity` and `NaN`, which are not numeric label values.
fn parse_decimal(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whether `rule` applies to an alert.
///
/// The alert name must match exactly (case-sensitive); then every matcher
/// must hold. A rule without matchers matches on the name alone.
pub fn matches(rule: &ReactionRule, alert_name: &str, payload: &AlertPayload) -> bool {
    if rule.alert_name != alert_name {
        return false;
    }
    rule.matchers.iter().all(|m| evaluate(m, payload))
}
