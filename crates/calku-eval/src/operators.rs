//! Operator catalog.
//!
//! Grounded on an "open-method-on-registry" shape: a
//! static data table of [`OperatorSpec`]s plus a free-standing module of
//! pure functions over it, with a memoised derived table (`precedence_groups`)
//! and an explicit `recycle()` to drop the memo — the same split
//! `formualizer_eval::function_registry` draws between its `DashMap` of
//! specs and the lazily-built dispatch tables layered on top, simplified
//! here to a single-threaded `RefCell` since CalKu has no concurrent access
//! to the catalog.

use std::cell::RefCell;

use calku_common::{CalkuError, Value};
use calku_parse::OperatorMatcher;

use crate::validator::Validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorType {
    Logic,
    Compare,
    Math,
    Consolidate,
}

pub type BinaryEval = fn(&Value, &Value) -> Value;
pub type ArgValidator = fn(&mut Validator) -> &mut Validator;

/// Static description of one operator. `symbols` lists every spelling
/// (e.g. `AND` has `and` and `&&`); `precedence` is smaller-first priority.
pub struct OperatorSpec {
    pub key: &'static str,
    pub op_type: OperatorType,
    pub symbols: &'static [&'static str],
    pub precedence: i32,
    pub left_validator: Option<ArgValidator>,
    pub right_validator: Option<ArgValidator>,
    pub eval: BinaryEval,
}

/// Read-only operator table plus memoised derived views.
pub struct OperatorCatalog {
    specs: &'static [OperatorSpec],
    symbol_cache: RefCell<Option<Vec<(String, &'static OperatorSpec)>>>,
    precedence_cache: RefCell<Option<Vec<Vec<&'static str>>>>,
}

impl OperatorCatalog {
    pub fn new() -> Self {
        let specs = builtin_operators();
        debug_assert!(
            {
                let mut keys: Vec<&str> = specs.iter().map(|s| s.key).collect();
                keys.sort_unstable();
                keys.windows(2).all(|w| w[0] != w[1])
            },
            "operator catalog has duplicate keys"
        );
        Self {
            specs,
            symbol_cache: RefCell::new(None),
            precedence_cache: RefCell::new(None),
        }
    }

    pub fn spec(&self, key: &str) -> Option<&'static OperatorSpec> {
        self.specs.iter().find(|s| s.key == key)
    }

    /// Invalidates the memoised `symbol_matcher`/`precedence_groups` tables.
    pub fn recycle(&self) {
        self.symbol_cache.borrow_mut().take();
        self.precedence_cache.borrow_mut().take();
    }

    /// Builds (and memoises) the symbol → spec table, longest symbol first,
    /// restricted to `types` if non-empty.
    fn symbol_table(&self, types: &[OperatorType]) -> Vec<(String, &'static OperatorSpec)> {
        let mut table: Vec<(String, &'static OperatorSpec)> = Vec::new();
        for spec in self.specs {
            if !types.is_empty() && !types.contains(&spec.op_type) {
                continue;
            }
            for sym in spec.symbols {
                table.push((sym.to_lowercase(), spec));
            }
        }
        table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        table
    }

    /// Ascending-precedence groups of tied operator keys.
    pub fn precedence_groups(&self) -> Vec<Vec<&'static str>> {
        if let Some(cached) = self.precedence_cache.borrow().as_ref() {
            return cached.clone();
        }
        let mut by_precedence: Vec<(i32, Vec<&'static str>)> = Vec::new();
        for spec in self.specs {
            match by_precedence.iter_mut().find(|(p, _)| *p == spec.precedence) {
                Some((_, keys)) => keys.push(spec.key),
                None => by_precedence.push((spec.precedence, vec![spec.key])),
            }
        }
        by_precedence.sort_by_key(|(p, _)| *p);
        let groups: Vec<Vec<&'static str>> = by_precedence.into_iter().map(|(_, keys)| keys).collect();
        *self.precedence_cache.borrow_mut() = Some(groups.clone());
        groups
    }

    /// Enforces exactly two arguments and runs the operator's per-side
    /// validators, raising on the first failure (evaluator always calls in
    /// throw mode).
    pub fn validate_args(&self, op_key: &str, left: &Value, right: &Value) -> Result<(), CalkuError> {
        let spec = self
            .spec(op_key)
            .unwrap_or_else(|| CalkuError::definition_bug(format!("unknown operator key '{op_key}'")));
        if let Some(validator_fn) = spec.left_validator {
            let mut v = Validator::named(left.clone(), format!("{} (left)", spec.key));
            validator_fn(&mut v);
            if let Some(msg) = v.message() {
                return Err(CalkuError::evaluation(msg));
            }
        }
        if let Some(validator_fn) = spec.right_validator {
            let mut v = Validator::named(right.clone(), format!("{} (right)", spec.key));
            validator_fn(&mut v);
            if let Some(msg) = v.message() {
                return Err(CalkuError::evaluation(msg));
            }
        }
        Ok(())
    }

    pub fn eval(&self, op_key: &str, left: &Value, right: &Value) -> Result<Value, CalkuError> {
        let spec = self
            .spec(op_key)
            .unwrap_or_else(|| CalkuError::definition_bug(format!("unknown operator key '{op_key}'")));
        Ok((spec.eval)(left, right))
    }
}

impl Default for OperatorCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorMatcher for OperatorCatalog {
    fn match_at(&self, chars: &[char], pos: usize) -> Option<(String, usize)> {
        if self.symbol_cache.borrow().is_none() {
            *self.symbol_cache.borrow_mut() = Some(self.symbol_table(&[]));
        }
        let table = self.symbol_cache.borrow();
        let table = table.as_ref().unwrap();
        for (sym, spec) in table {
            let sym_chars: Vec<char> = sym.chars().collect();
            let end = pos + sym_chars.len();
            if end > chars.len() {
                continue;
            }
            let candidate: String = chars[pos..end].iter().collect::<String>().to_lowercase();
            if candidate != *sym {
                continue;
            }
            let boundary_ok = end >= chars.len() || chars[end].is_whitespace() || chars[end] == '(';
            if boundary_ok {
                return Some((spec.key.to_string(), sym_chars.len()));
            }
        }
        None
    }
}

fn coerce_number(v: &Value) -> f64 {
    v.coerce_to_number().unwrap_or(f64::NAN)
}

fn op_exponentiation(l: &Value, r: &Value) -> Value {
    Value::Number(coerce_number(l).powf(coerce_number(r)))
}
fn op_division(l: &Value, r: &Value) -> Value {
    let (a, b) = (coerce_number(l), coerce_number(r));
    Value::Number(if b == 0.0 { f64::NAN } else { a / b })
}
fn op_modulo(l: &Value, r: &Value) -> Value {
    let (a, b) = (coerce_number(l), coerce_number(r));
    Value::Number(if b == 0.0 { f64::NAN } else { a % b })
}
fn op_multiplication(l: &Value, r: &Value) -> Value {
    Value::Number(coerce_number(l) * coerce_number(r))
}
fn op_addition(l: &Value, r: &Value) -> Value {
    Value::Number(coerce_number(l) + coerce_number(r))
}
fn op_subtraction(l: &Value, r: &Value) -> Value {
    Value::Number(coerce_number(l) - coerce_number(r))
}
fn op_and(l: &Value, r: &Value) -> Value {
    Value::Boolean(l.is_truthy() && r.is_truthy())
}
fn op_or(l: &Value, r: &Value) -> Value {
    Value::Boolean(l.is_truthy() || r.is_truthy())
}
fn op_less_than(l: &Value, r: &Value) -> Value {
    Value::Boolean(matches!(l.partial_cmp(r), Some(std::cmp::Ordering::Less)))
}
fn op_less_than_or_equal(l: &Value, r: &Value) -> Value {
    if matches!(l, Value::Null) && matches!(r, Value::Null) {
        return Value::Boolean(true);
    }
    Value::Boolean(matches!(
        l.partial_cmp(r),
        Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
    ))
}
fn op_greater_than(l: &Value, r: &Value) -> Value {
    Value::Boolean(matches!(l.partial_cmp(r), Some(std::cmp::Ordering::Greater)))
}
fn op_greater_than_or_equal(l: &Value, r: &Value) -> Value {
    if matches!(l, Value::Null) && matches!(r, Value::Null) {
        return Value::Boolean(true);
    }
    Value::Boolean(matches!(
        l.partial_cmp(r),
        Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
    ))
}
fn op_equals(l: &Value, r: &Value) -> Value {
    Value::Boolean(l == r)
}
fn op_not_equals(l: &Value, r: &Value) -> Value {
    Value::Boolean(l != r)
}

fn stringify_for_contains(v: &Value) -> String {
    v.to_display_string()
}

fn op_contains(l: &Value, r: &Value) -> Value {
    if matches!(l, Value::Null) && matches!(r, Value::Null) {
        return Value::Boolean(true);
    }
    match l {
        Value::Array(items) => Value::Boolean(items.iter().any(|el| el == r)),
        _ => {
            let hay = stringify_for_contains(l);
            let needle = stringify_for_contains(r);
            Value::Boolean(hay.contains(&needle))
        }
    }
}
fn op_does_not_contain(l: &Value, r: &Value) -> Value {
    if matches!(l, Value::Null) && matches!(r, Value::Null) {
        return Value::Boolean(false);
    }
    match op_contains(l, r) {
        Value::Boolean(b) => Value::Boolean(!b),
        _ => unreachable!(),
    }
}
fn op_ends_with(l: &Value, r: &Value) -> Value {
    if matches!(l, Value::Null) && matches!(r, Value::Null) {
        return Value::Boolean(true);
    }
    let hay = stringify_for_contains(l);
    let needle = stringify_for_contains(r);
    Value::Boolean(hay.ends_with(&needle))
}
fn op_starts_with(l: &Value, r: &Value) -> Value {
    if matches!(l, Value::Null) && matches!(r, Value::Null) {
        return Value::Boolean(true);
    }
    let hay = stringify_for_contains(l);
    let needle = stringify_for_contains(r);
    Value::Boolean(hay.starts_with(&needle))
}

fn op_concatenate(l: &Value, r: &Value) -> Value {
    let a = l.to_concat_string().unwrap_or_default();
    let b = r.to_concat_string().unwrap_or_default();
    Value::String(format!("{a}{b}"))
}

fn validate_contains_left(v: &mut Validator) -> &mut Validator {
    v.instance_of(&["array", "string", "number", "boolean", "null"])
}
fn validate_contains_right(v: &mut Validator) -> &mut Validator {
    v.instance_of(&["string", "number", "boolean", "null"])
}
fn validate_concat_side(v: &mut Validator) -> &mut Validator {
    v.instance_of(&["string", "number", "boolean", "date", "null"])
}

static OPERATORS: &[OperatorSpec] = &[
    OperatorSpec {
        key: "EXPONENTIATION",
        op_type: OperatorType::Math,
        symbols: &["^"],
        precedence: 50,
        left_validator: None,
        right_validator: None,
        eval: op_exponentiation,
    },
    OperatorSpec {
        key: "DIVISION",
        op_type: OperatorType::Math,
        symbols: &["/"],
        precedence: 100,
        left_validator: None,
        right_validator: None,
        eval: op_division,
    },
    OperatorSpec {
        key: "MODULO",
        op_type: OperatorType::Math,
        symbols: &["%"],
        precedence: 100,
        left_validator: None,
        right_validator: None,
        eval: op_modulo,
    },
    OperatorSpec {
        key: "MULTIPLICATION",
        op_type: OperatorType::Math,
        symbols: &["*"],
        precedence: 100,
        left_validator: None,
        right_validator: None,
        eval: op_multiplication,
    },
    OperatorSpec {
        key: "ADDITION",
        op_type: OperatorType::Math,
        symbols: &["+"],
        precedence: 120,
        left_validator: None,
        right_validator: None,
        eval: op_addition,
    },
    OperatorSpec {
        key: "SUBTRACTION",
        op_type: OperatorType::Math,
        symbols: &["-"],
        precedence: 120,
        left_validator: None,
        right_validator: None,
        eval: op_subtraction,
    },
    OperatorSpec {
        key: "AND",
        op_type: OperatorType::Logic,
        symbols: &["and", "&&"],
        precedence: 200,
        left_validator: None,
        right_validator: None,
        eval: op_and,
    },
    OperatorSpec {
        key: "OR",
        op_type: OperatorType::Logic,
        symbols: &["or", "||"],
        precedence: 205,
        left_validator: None,
        right_validator: None,
        eval: op_or,
    },
    OperatorSpec {
        key: "LESSTHAN",
        op_type: OperatorType::Compare,
        symbols: &["lt", "<"],
        precedence: 300,
        left_validator: None,
        right_validator: None,
        eval: op_less_than,
    },
    OperatorSpec {
        key: "LESSTHANOREQUAL",
        op_type: OperatorType::Compare,
        symbols: &["lte", "<="],
        precedence: 305,
        left_validator: None,
        right_validator: None,
        eval: op_less_than_or_equal,
    },
    OperatorSpec {
        key: "GREATERTHAN",
        op_type: OperatorType::Compare,
        symbols: &["gt", ">"],
        precedence: 310,
        left_validator: None,
        right_validator: None,
        eval: op_greater_than,
    },
    OperatorSpec {
        key: "GREATERTHANOREQUAL",
        op_type: OperatorType::Compare,
        symbols: &["gte", ">="],
        precedence: 315,
        left_validator: None,
        right_validator: None,
        eval: op_greater_than_or_equal,
    },
    OperatorSpec {
        key: "EQUALS",
        op_type: OperatorType::Compare,
        symbols: &["eq", "=="],
        precedence: 320,
        left_validator: None,
        right_validator: None,
        eval: op_equals,
    },
    OperatorSpec {
        key: "NOTEQUALS",
        op_type: OperatorType::Compare,
        symbols: &["neq", "<>", "!="],
        precedence: 325,
        left_validator: None,
        right_validator: None,
        eval: op_not_equals,
    },
    OperatorSpec {
        key: "CONTAINS",
        op_type: OperatorType::Compare,
        symbols: &["contains", "~~"],
        precedence: 330,
        left_validator: Some(validate_contains_left),
        right_validator: Some(validate_contains_right),
        eval: op_contains,
    },
    OperatorSpec {
        key: "DOESNOTCONTAIN",
        op_type: OperatorType::Compare,
        symbols: &["doesnotcontain", "!~~"],
        precedence: 330,
        left_validator: Some(validate_contains_left),
        right_validator: Some(validate_contains_right),
        eval: op_does_not_contain,
    },
    OperatorSpec {
        key: "ENDSWITH",
        op_type: OperatorType::Compare,
        symbols: &["endswith"],
        precedence: 330,
        left_validator: Some(validate_contains_left),
        right_validator: Some(validate_contains_right),
        eval: op_ends_with,
    },
    OperatorSpec {
        key: "STARTSWITH",
        op_type: OperatorType::Compare,
        symbols: &["startswith"],
        precedence: 330,
        left_validator: Some(validate_contains_left),
        right_validator: Some(validate_contains_right),
        eval: op_starts_with,
    },
    OperatorSpec {
        key: "CONCATENATE",
        op_type: OperatorType::Consolidate,
        symbols: &["&"],
        precedence: 99999,
        left_validator: Some(validate_concat_side),
        right_validator: Some(validate_concat_side),
        eval: op_concatenate,
    },
];

fn builtin_operators() -> &'static [OperatorSpec] {
    OPERATORS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_groups_sorted_ascending_and_tied() {
        let cat = OperatorCatalog::new();
        let groups = cat.precedence_groups();
        assert_eq!(groups[0], vec!["EXPONENTIATION"]);
        let div_group = groups.iter().find(|g| g.contains(&"DIVISION")).unwrap();
        assert!(div_group.contains(&"MODULO"));
        assert!(div_group.contains(&"MULTIPLICATION"));
    }

    #[test]
    fn recycle_clears_memo() {
        let cat = OperatorCatalog::new();
        let _ = cat.precedence_groups();
        assert!(cat.precedence_cache.borrow().is_some());
        cat.recycle();
        assert!(cat.precedence_cache.borrow().is_none());
    }

    #[test]
    fn symbol_matcher_requires_boundary() {
        let cat = OperatorCatalog::new();
        let chars: Vec<char> = "orange".chars().collect();
        assert!(cat.match_at(&chars, 0).is_none());
        let chars2: Vec<char> = "or ".chars().collect();
        assert_eq!(cat.match_at(&chars2, 0).unwrap().0, "OR");
    }

    #[test]
    fn contains_on_numeric_left_uses_decimal_string() {
        let cat = OperatorCatalog::new();
        let result = cat
            .eval("CONTAINS", &Value::Number(12334.0), &Value::Number(3.0))
            .unwrap();
        assert_eq!(result, Value::Boolean(true));
    }

    #[test]
    fn division_by_zero_yields_nan() {
        let cat = OperatorCatalog::new();
        let result = cat.eval("DIVISION", &Value::Number(1.0), &Value::Number(0.0)).unwrap();
        match result {
            Value::Number(n) => assert!(n.is_nan()),
            other => panic!("expected Number, got {other:?}"),
        }
    }
}
