//! Property tests for matcher evaluation.

use karo::alert::AlertPayload;
use karo::rules::{evaluate, matches, Action, MatchOperator, Matcher, ReactionRule};
use proptest::prelude::*;

fn payload(key: &str, value: &str) -> AlertPayload {
    AlertPayload::new()
        .with_field("status", "firing")
        .with_label("alertname", "Prop")
        .with_label(key, value)
        .flatten()
}

fn rule(matchers: Vec<Matcher>) -> ReactionRule {
    ReactionRule {
        name: "prop".to_string(),
        namespace: None,
        uid: None,
        alert_name: "Prop".to_string(),
        matchers,
        actions: vec![Action::new("run", "busybox")],
        volumes: vec![],
    }
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(value in "[a-z0-9]{0,12}", expected in "[a-z0-9]{0,12}") {
        let p = payload("tier", &value);
        let m = Matcher::new("labels.tier", MatchOperator::Equal, &[expected.as_str()]);
        prop_assert_eq!(evaluate(&m, &p), evaluate(&m, &p));
    }

    #[test]
    fn equal_and_not_equal_are_complementary(value in "[a-z0-9]{0,12}", expected in "[a-z0-9]{0,12}") {
        let p = payload("tier", &value);
        let eq = Matcher::new("labels.tier", MatchOperator::Equal, &[expected.as_str()]);
        let ne = Matcher::new("labels.tier", MatchOperator::NotEqual, &[expected.as_str()]);
        prop_assert_ne!(evaluate(&eq, &p), evaluate(&ne, &p));
    }

    #[test]
    fn in_and_not_in_are_complementary(
        value in "[a-z]{1,6}",
        set in proptest::collection::vec("[a-z]{1,6}", 0..5),
    ) {
        let p = payload("tier", &value);
        let values: Vec<&str> = set.iter().map(String::as_str).collect();
        let is_in = Matcher::new("labels.tier", MatchOperator::In, &values);
        let not_in = Matcher::new("labels.tier", MatchOperator::NotIn, &values);
        prop_assert_ne!(evaluate(&is_in, &p), evaluate(&not_in, &p));
    }

    #[test]
    fn bare_name_matches_like_label_path(value in "[a-z0-9]{1,12}", expected in "[a-z0-9]{1,12}") {
        let p = payload("tier", &value);
        let bare = Matcher::new("tier", MatchOperator::Equal, &[expected.as_str()]);
        let full = Matcher::new("labels.tier", MatchOperator::Equal, &[expected.as_str()]);
        prop_assert_eq!(evaluate(&bare, &p), evaluate(&full, &p));
    }

    #[test]
    fn negated_operators_never_match_missing_attribute(expected in "[a-z0-9]{1,12}") {
        let p = payload("tier", "x");
        for op in [MatchOperator::NotEqual, MatchOperator::NotIn, MatchOperator::NotRegex] {
            let m = Matcher::new("labels.missing", op, &[expected.as_str()]);
            prop_assert!(!evaluate(&m, &p));
        }
    }

    #[test]
    fn rule_without_matchers_matches_on_name_only(name in "[A-Za-z]{1,12}", value in "[a-z]{0,8}") {
        let r = rule(vec![]);
        let p = payload("tier", &value);
        prop_assert_eq!(matches(&r, &name, &p), name == "Prop");
    }
}
