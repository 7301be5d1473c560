//! End-to-end scenarios against the public `calku` API only — the
//! concrete literal-input cases and universal invariants this crate
//! promises, exercised the way a downstream consumer would call it rather
//! than through the unit tests beside each crate's internals.

use std::collections::BTreeMap;

use calku::Expression;
use calku_common::{CalkuErrorKind, Value};
use proptest::prelude::*;

#[test]
fn scenario_1_order_of_operations() {
    assert_eq!(
        Expression::evaluate("10 + 5 - 12 / 3 * 2", None, None).unwrap(),
        Value::Number(7.0)
    );
}

#[test]
fn scenario_2_grouping() {
    assert_eq!(
        Expression::evaluate("(15 - 2 * 4) + (1 + 1 / 4)", None, None).unwrap(),
        Value::Number(8.25)
    );
}

#[test]
fn scenario_3_logic_precedence() {
    assert_eq!(
        Expression::evaluate("false AND true OR (true AND false)", None, None).unwrap(),
        Value::Boolean(false)
    );
}

#[test]
fn scenario_4_nested_function_calls() {
    assert_eq!(
        Expression::evaluate("SUM(SUM(1, 3), 4, 8, 5)", None, None).unwrap(),
        Value::Number(21.0)
    );
}

#[test]
fn scenario_5_property_ref() {
    let mut target = BTreeMap::new();
    target.insert("num".to_string(), Value::Number(334455.0));
    assert_eq!(
        Expression::evaluate("{num} + 3", None, Some(&Value::Object(target))).unwrap(),
        Value::Number(334458.0)
    );
}

#[test]
fn scenario_6_concat() {
    assert_eq!(
        Expression::evaluate("\"hi\" & \" there x\" & 3 & true", None, None).unwrap(),
        Value::String("hi there x3true".to_string())
    );
}

#[test]
fn scenario_7_value_at_nested_path() {
    let hello = |name: &str| {
        let mut m = BTreeMap::new();
        m.insert("hello".to_string(), Value::String(name.to_string()));
        m
    };
    let mut jupiter = hello("jupiter");
    jupiter.insert(
        "moons".to_string(),
        Value::Array(vec![Value::String("io".into()), Value::String("europa".into())]),
    );
    let mut neptune = hello("neptune");
    let mut meta = BTreeMap::new();
    meta.insert("a".to_string(), Value::Number(1.0));
    meta.insert("b".to_string(), Value::Number(2.0));
    neptune.insert("meta".to_string(), Value::Object(meta));

    let moose = Value::Array(vec![Value::Object(hello("mars")), Value::Object(jupiter), Value::Object(neptune)]);
    let mut test = BTreeMap::new();
    test.insert("moose".to_string(), moose);
    let mut root = BTreeMap::new();
    root.insert("test".to_string(), Value::Object(test));
    let target = Value::Object(root);

    assert_eq!(
        Expression::value_at(&target, "test.moose:1.moons:1:2").unwrap(),
        Value::String("r".to_string())
    );
}

#[test]
fn scenario_8_unknown_function_is_syntax_error() {
    let err = Expression::evaluate("BOGUS(1,2)", None, None).unwrap_err();
    assert_eq!(err.kind, CalkuErrorKind::Syntax);
    assert!(err.message.contains("BOGUS"));
}

proptest! {
    /// `value(E, T)` is deterministic: evaluating the same expression
    /// against the same target twice yields identical results.
    #[test]
    fn value_is_deterministic(a in -1000i32..1000, b in -1000i32..1000) {
        let src = format!("{a} + {b}");
        let first = Expression::evaluate(&src, None, None);
        let second = Expression::evaluate(&src, None, None);
        prop_assert_eq!(first.ok(), second.ok());
    }

    /// Setting `expression` twice in a row yields the same evaluated
    /// result as setting it once.
    #[test]
    fn setting_expression_twice_matches_setting_once(a in -1000i32..1000, b in -1000i32..1000) {
        let src = format!("{a} * {b}");

        let mut once = Expression::new();
        once.set_expression(Some(src.clone()));
        let once_result = once.value(None);

        let mut twice = Expression::new();
        twice.set_expression(Some(src.clone()));
        twice.set_expression(Some(src));
        let twice_result = twice.value(None);

        prop_assert_eq!(once_result.ok(), twice_result.ok());
    }
}
