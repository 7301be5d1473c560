//! The CalKu expression facade.
//!
//! `Expression` wraps a source string and a time zone, lexes them lazily and
//! caches the resulting token tree, and exposes `properties`/`value`/
//! `values` over that tree. Grounded on `formualizer::Engine` in spirit — a
//! thin façade over parse + eval crates that owns the cache invalidation a
//! caller would otherwise have to manage by hand — though CalKu has no
//! workbook/dependency-graph state to track, just one cached tree.

use std::cell::RefCell;

use calku_common::{CalkuError, ClockProvider, ResolvedTimeZone, SystemClock, Value};
use calku_eval::{evaluator, FunctionCatalog, OperatorCatalog};
use calku_parse::{Lexer, Token};

/// A CalKu expression bound to an optional time zone.
///
/// Setting `expression` or `time_zone` invalidates the cached token tree;
/// the next call to `properties`/`value`/`values` relexes lazily.
pub struct Expression {
    source: Option<String>,
    time_zone: Option<String>,
    clock: Box<dyn ClockProvider>,
    operators: OperatorCatalog,
    functions: FunctionCatalog,
    cache: RefCell<Option<Vec<Token>>>,
}

impl Expression {
    pub fn new() -> Self {
        Self {
            source: None,
            time_zone: None,
            clock: Box::new(SystemClock),
            operators: OperatorCatalog::new(),
            functions: FunctionCatalog::new(),
            cache: RefCell::new(None),
        }
    }

    pub fn with_expression<S: Into<String>>(expression: S) -> Self {
        let mut e = Self::new();
        e.set_expression(Some(expression.into()));
        e
    }

    pub fn expression(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_expression(&mut self, expression: Option<String>) {
        self.source = expression;
        self.cache.borrow_mut().take();
    }

    pub fn time_zone(&self) -> Option<&str> {
        self.time_zone.as_deref()
    }

    pub fn set_time_zone(&mut self, time_zone: Option<String>) {
        self.time_zone = time_zone;
        self.cache.borrow_mut().take();
    }

    /// Swaps in a deterministic clock, for tests against relative date
    /// lexemes or named time zones whose offset depends on "now".
    pub fn set_clock(&mut self, clock: Box<dyn ClockProvider>) {
        self.clock = clock;
        self.cache.borrow_mut().take();
    }

    fn resolved_tz(&self) -> Result<ResolvedTimeZone, CalkuError> {
        match &self.time_zone {
            Some(name) => ResolvedTimeZone::resolve(name, self.clock.as_ref()),
            None => Ok(ResolvedTimeZone::utc()),
        }
    }

    fn tokens(&self) -> Result<std::cell::Ref<'_, Vec<Token>>, CalkuError> {
        if self.cache.borrow().is_none() {
            let source = self.source.as_deref().unwrap_or("");
            let tz = self.resolved_tz()?;
            let lexer = Lexer::new(source, &self.operators, &self.functions);
            let tree = lexer.tokenize(&tz)?;
            *self.cache.borrow_mut() = Some(tree);
        }
        Ok(std::cell::Ref::map(self.cache.borrow(), |c| c.as_ref().unwrap()))
    }

    /// The distinct `{...}` property paths referenced anywhere in the
    /// expression, in order of first appearance, including inside groups
    /// and function arguments.
    pub fn properties(&self) -> Result<Vec<String>, CalkuError> {
        let mut seen: Vec<String> = Vec::new();
        self.visit_properties(|path| {
            if !seen.iter().any(|p| p == path) {
                seen.push(path.to_string());
            }
        })?;
        Ok(seen)
    }

    /// Walks every `{...}` property path reference in order of occurrence,
    /// including duplicates and paths nested in groups or function
    /// arguments, without collecting them into a buffer first — mirrors
    /// `ASTNode::visit_refs`'s callback-based, no-allocation traversal.
    /// Unlike `properties()`, the callback fires once per occurrence rather
    /// than once per distinct path.
    pub fn visit_properties<F: FnMut(&str)>(&self, mut visit: F) -> Result<(), CalkuError> {
        let tokens = self.tokens()?;
        fn walk<F: FnMut(&str)>(tokens: &[Token], visit: &mut F) {
            for tok in tokens {
                match tok {
                    Token::PropertyRef { path, .. } => visit(path),
                    Token::Group { children, .. } | Token::Func { children, .. } => {
                        walk(children, visit);
                    }
                    _ => {}
                }
            }
        }
        walk(&tokens, &mut visit);
        Ok(())
    }

    /// Evaluates once against `target`. Lexing and evaluation errors are
    /// returned as the call's result rather than propagated separately —
    /// there is no distinct "thrown" channel at this boundary.
    pub fn value(&self, target: Option<&Value>) -> Result<Value, CalkuError> {
        let tokens = self.tokens()?;
        evaluator::evaluate(&tokens, target, &self.operators, &self.functions)
    }

    /// Maps `value` over a sequence of targets, reusing the cached tree.
    pub fn values(&self, targets: &[Value]) -> Vec<Result<Value, CalkuError>> {
        targets.iter().map(|t| self.value(Some(t))).collect()
    }

    /// One-shot form: builds a transient facade, evaluates once, discards it.
    pub fn evaluate(expression: &str, time_zone: Option<&str>, target: Option<&Value>) -> Result<Value, CalkuError> {
        let mut expr = Self::with_expression(expression);
        expr.set_time_zone(time_zone.map(str::to_string));
        expr.value(target)
    }

    /// One-shot form of `values`.
    pub fn evaluate_many(expression: &str, time_zone: Option<&str>, targets: &[Value]) -> Vec<Result<Value, CalkuError>> {
        let mut expr = Self::with_expression(expression);
        expr.set_time_zone(time_zone.map(str::to_string));
        expr.values(targets)
    }

    /// Exposes the property path resolver directly, bypassing the
    /// lexer/evaluator entirely.
    pub fn value_at(target: &Value, path: &str) -> Result<Value, CalkuError> {
        calku_eval::path::resolve(target, path)
    }
}

impl Default for Expression {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn value_evaluates_arithmetic() {
        let expr = Expression::with_expression("10 + 5 - 12 / 3 * 2");
        assert_eq!(expr.value(None).unwrap(), Value::Number(7.0));
    }

    #[test]
    fn setting_expression_invalidates_cache() {
        let mut expr = Expression::with_expression("1 + 1");
        assert_eq!(expr.value(None).unwrap(), Value::Number(2.0));
        expr.set_expression(Some("2 + 2".to_string()));
        assert_eq!(expr.value(None).unwrap(), Value::Number(4.0));
    }

    #[test]
    fn properties_lists_distinct_paths_in_order() {
        let expr = Expression::with_expression("{a.b} + {c} + {a.b}");
        assert_eq!(expr.properties().unwrap(), vec!["a.b".to_string(), "c".to_string()]);
    }

    #[test]
    fn properties_reach_into_groups_and_function_args() {
        let expr = Expression::with_expression("SUM({x}, ({y} + 1))");
        assert_eq!(expr.properties().unwrap(), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn visit_properties_visits_every_occurrence_including_duplicates() {
        let expr = Expression::with_expression("{a.b} + {c} + {a.b}");
        let mut seen = Vec::new();
        expr.visit_properties(|p| seen.push(p.to_string())).unwrap();
        assert_eq!(seen, vec!["a.b".to_string(), "c".to_string(), "a.b".to_string()]);
    }

    #[test]
    fn value_returns_error_instead_of_panicking() {
        let expr = Expression::with_expression("BOGUS(1,2)");
        let err = expr.value(None).unwrap_err();
        assert_eq!(err.kind, calku_common::CalkuErrorKind::Syntax);
    }

    #[test]
    fn values_maps_over_targets() {
        let expr = Expression::with_expression("{n} * 2");
        let mut t1 = BTreeMap::new();
        t1.insert("n".to_string(), Value::Number(3.0));
        let mut t2 = BTreeMap::new();
        t2.insert("n".to_string(), Value::Number(4.0));
        let results = expr.values(&[Value::Object(t1), Value::Object(t2)]);
        assert_eq!(results[0].as_ref().unwrap(), &Value::Number(6.0));
        assert_eq!(results[1].as_ref().unwrap(), &Value::Number(8.0));
    }

    #[test]
    fn static_evaluate_one_shot() {
        assert_eq!(Expression::evaluate("1 + 2", None, None).unwrap(), Value::Number(3.0));
    }

    #[test]
    fn value_at_exposes_property_resolver_directly() {
        let mut obj = BTreeMap::new();
        obj.insert("word".to_string(), Value::String("charm".to_string()));
        let target = Value::Object(obj);
        assert_eq!(Expression::value_at(&target, "word.2").unwrap(), Value::String("a".to_string()));
    }
}
