//! Evaluator.
//!
//! Three steps per level (root sequence, a `Group`'s children, or one
//! function argument's token stream): resolve every token to a value
//! (recursing into nested `Group`/`Func` nodes), dispatch function calls,
//! then collapse the interleaved operator/value list by ascending
//! precedence (`calku_eval::operators::OperatorCatalog::precedence_groups`).
//! Grounded on `formualizer_parse::parser::Parser::parse_binary_op`'s
//! precedence-climbing in spirit, but CalKu evaluates a tree it already has
//! in full rather than building one while scanning tokens, so the natural
//! shape here is an iterative sweep over a flat slot list instead of
//! recursive descent.

use calku_common::{CalkuError, Value};
use calku_parse::Token;

use crate::functions::FunctionCatalog;
use crate::operators::OperatorCatalog;
use crate::path;

enum Slot {
    Value(Value),
    Op(String),
}

/// Evaluates a full token tree against an optional target.
pub fn evaluate(
    tokens: &[Token],
    target: Option<&Value>,
    operators: &OperatorCatalog,
    functions: &FunctionCatalog,
) -> Result<Value, CalkuError> {
    evaluate_level(tokens, target, operators, functions)
}

fn evaluate_level(
    tokens: &[Token],
    target: Option<&Value>,
    operators: &OperatorCatalog,
    functions: &FunctionCatalog,
) -> Result<Value, CalkuError> {
    let significant: Vec<&Token> = tokens.iter().filter(|t| !t.is_comment()).collect();

    if significant.is_empty() {
        return Ok(Value::Undefined);
    }
    if significant.len() == 1 {
        return resolve_token(significant[0], target, operators, functions);
    }

    if matches!(significant[0], Token::Operator { .. }) || matches!(significant[significant.len() - 1], Token::Operator { .. }) {
        return Err(CalkuError::evaluation("operator is missing an operand"));
    }

    let mut slots = Vec::with_capacity(significant.len());
    for tok in &significant {
        match tok {
            Token::Operator { op_key, .. } => slots.push(Slot::Op(op_key.clone())),
            other => slots.push(Slot::Value(resolve_token(other, target, operators, functions)?)),
        }
    }

    #[cfg(feature = "trace")]
    tracing::trace!(slots = slots.len(), "collapsing operator level");

    for group in operators.precedence_groups() {
        loop {
            let mut applied = false;
            let mut i = 0;
            while i < slots.len() {
                let is_match = matches!(&slots[i], Slot::Op(key) if group.contains(&key.as_str()));
                if is_match {
                    if i == 0 || i + 1 >= slots.len() {
                        return Err(CalkuError::evaluation("operator is missing an operand"));
                    }
                    let (left, right) = match (&slots[i - 1], &slots[i + 1]) {
                        (Slot::Value(l), Slot::Value(r)) => (l.clone(), r.clone()),
                        _ => {
                            return Err(CalkuError::evaluation(
                                "operator's neighbour has no value (structural token in place of an operand)",
                            ))
                        }
                    };
                    let op_key = match &slots[i] {
                        Slot::Op(key) => key.clone(),
                        _ => unreachable!(),
                    };
                    operators.validate_args(&op_key, &left, &right)?;
                    let result = operators.eval(&op_key, &left, &right)?;
                    #[cfg(feature = "trace")]
                    tracing::debug!(op = %op_key, "applied operator");
                    slots.splice(i - 1..=i + 1, [Slot::Value(result)]);
                    applied = true;
                    break;
                }
                i += 1;
            }
            if !applied {
                break;
            }
        }
    }

    if slots.len() != 1 {
        return Err(CalkuError::evaluation(
            "operator collapse did not reduce this level to a single value",
        ));
    }
    match slots.into_iter().next().unwrap() {
        Slot::Value(v) => Ok(v),
        Slot::Op(_) => Err(CalkuError::evaluation("level collapsed to a bare operator")),
    }
}

fn resolve_token(
    tok: &Token,
    target: Option<&Value>,
    operators: &OperatorCatalog,
    functions: &FunctionCatalog,
) -> Result<Value, CalkuError> {
    match tok {
        Token::Literal { value, .. } => Ok(value.clone()),
        Token::PropertyRef { path: p, .. } => {
            let root = target.cloned().unwrap_or(Value::Undefined);
            path::resolve(&root, p)
        }
        Token::Group { children, .. } => evaluate_level(children, target, operators, functions),
        Token::Func { name, children, .. } => {
            let arg_segments = split_args(children);
            let mut args = Vec::with_capacity(arg_segments.len());
            for seg in arg_segments {
                args.push(evaluate_level(seg, target, operators, functions)?);
            }
            functions.validate_args(name, &args)?;
            functions.call(name, &args)
        }
        Token::Comment { .. } => unreachable!("comments are filtered before resolution"),
        Token::Operator { .. } => unreachable!("operators are handled by the caller's sweep"),
        Token::FuncArgsSeparator { .. } => {
            CalkuError::definition_bug("a function-argument separator escaped argument splitting")
        }
        Token::GroupStart { .. } | Token::GroupEnd { .. } | Token::FuncArgsStart { .. } | Token::FuncArgsEnd { .. } => {
            CalkuError::definition_bug("a structural delimiter escaped tree-building")
        }
    }
}

/// Splits a `Func`'s children on its own `FuncArgsSeparator` tokens.
fn split_args(children: &[Token]) -> Vec<&[Token]> {
    if children.is_empty() {
        return Vec::new();
    }
    let mut segments = Vec::new();
    let mut start = 0;
    for (i, tok) in children.iter().enumerate() {
        if tok.is_separator() {
            segments.push(&children[start..i]);
            start = i + 1;
        }
    }
    segments.push(&children[start..]);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use calku_parse::Lexer;
    use calku_common::ResolvedTimeZone;
    use std::collections::BTreeMap;

    fn run(src: &str, target: Option<&Value>) -> Result<Value, CalkuError> {
        let ops = OperatorCatalog::new();
        let funcs = FunctionCatalog::new();
        let tokens = Lexer::new(src, &ops, &funcs).tokenize(&ResolvedTimeZone::utc())?;
        evaluate(&tokens, target, &ops, &funcs)
    }

    #[test]
    fn order_of_operations_scenario_1() {
        assert_eq!(run("10 + 5 - 12 / 3 * 2", None).unwrap(), Value::Number(7.0));
    }

    #[test]
    fn grouping_scenario_2() {
        assert_eq!(
            run("(15 - 2 * 4) + (1 + 1 / 4)", None).unwrap(),
            Value::Number(8.25)
        );
    }

    #[test]
    fn logic_precedence_scenario_3() {
        assert_eq!(
            run("false and true or (true and false)", None).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn nested_function_calls_scenario_4() {
        assert_eq!(run("SUM(SUM(1, 3), 4, 8, 5)", None).unwrap(), Value::Number(21.0));
    }

    #[test]
    fn property_ref_scenario_5() {
        let mut target = BTreeMap::new();
        target.insert("num".to_string(), Value::Number(334455.0));
        let target = Value::Object(target);
        assert_eq!(run("{num} + 3", Some(&target)).unwrap(), Value::Number(334458.0));
    }

    #[test]
    fn concat_scenario_6() {
        assert_eq!(
            run("\"hi\" & \" there x\" & 3 & true", None).unwrap(),
            Value::String("hi there x3true".to_string())
        );
    }

    #[test]
    fn unknown_function_is_syntax_error_scenario_8() {
        let err = run("BOGUS(1,2)", None).unwrap_err();
        assert!(err.message.contains("BOGUS"));
    }

    #[test]
    fn empty_expression_returns_undefined() {
        assert_eq!(run("", None).unwrap(), Value::Undefined);
    }

    proptest::proptest! {
        /// `evaluate` is deterministic: the same token tree and target
        /// produce the same result no matter how many times it is run.
        #[test]
        fn evaluate_is_deterministic(a in -10_000i32..10_000, b in -10_000i32..10_000) {
            let src = format!("{a} + {b} * 2 - {a}");
            let first = run(&src, None);
            let second = run(&src, None);
            proptest::prop_assert_eq!(first.ok(), second.ok());
        }
    }
}
