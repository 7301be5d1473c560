//! Function catalog.
//!
//! Built-ins are grouped into category modules the way
//! `formualizer_eval::builtins` splits `math.rs`/`text.rs`/`logical.rs`/etc.,
//! each exposing a plain `specs() -> Vec<FunctionSpec>`; `FunctionCatalog`
//! just concatenates them into one name-keyed table. No per-function trait
//! objects or capability bitflags — CalKu's functions are a single
//! synchronous `fn(&[Value]) -> Result<Value, CalkuError>`, so a data table
//! is simpler than a `Function` trait hierarchy with capability flags.

mod info;
mod logic;
mod math;
pub mod spec;
mod text;

use calku_common::{CalkuError, Value};
use calku_parse::FunctionMatcher;

pub use spec::{FunctionEval, FunctionSpec, ParamSpec, ParamValidator};

pub struct FunctionCatalog {
    specs: Vec<FunctionSpec>,
}

impl FunctionCatalog {
    pub fn new() -> Self {
        let mut specs = Vec::new();
        specs.extend(math::specs());
        specs.extend(text::specs());
        specs.extend(logic::specs());
        specs.extend(info::specs());
        debug_assert!(
            {
                let mut keys: Vec<&str> = specs.iter().map(|s| s.key).collect();
                keys.sort_unstable();
                keys.windows(2).all(|w| w[0] != w[1])
            },
            "function catalog has duplicate keys"
        );
        Self { specs }
    }

    pub fn spec(&self, name: &str) -> Option<&FunctionSpec> {
        let upper = name.to_ascii_uppercase();
        self.specs.iter().find(|s| s.key == upper)
    }

    /// Looks up `name`'s spec, or panics — `validate_args`/`call` are only
    /// ever reached for names the lexer already confirmed are known via
    /// [`FunctionMatcher::is_known`](calku_parse::FunctionMatcher::is_known),
    /// so a miss here means the catalog and the lexer's view of it diverged.
    fn spec_or_bug(&self, name: &str) -> &FunctionSpec {
        self.spec(name)
            .unwrap_or_else(|| CalkuError::definition_bug(format!("unknown function '{name}'")))
    }

    pub fn validate_args(&self, name: &str, args: &[Value]) -> Result<(), CalkuError> {
        spec::validate_args(self.spec_or_bug(name), args)
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, CalkuError> {
        (self.spec_or_bug(name).eval)(args)
    }
}

impl Default for FunctionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionMatcher for FunctionCatalog {
    fn is_known(&self, name: &str) -> bool {
        self.spec(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_sum_with_flatten() {
        let cat = FunctionCatalog::new();
        let args = vec![Value::Number(1.0), Value::Array(vec![Value::Number(2.0), Value::Number(3.0)])];
        cat.validate_args("SUM", &args).unwrap();
        assert_eq!(cat.call("SUM", &args).unwrap(), Value::Number(6.0));
    }

    #[test]
    fn fixed_count_mismatch_is_syntax_error() {
        let cat = FunctionCatalog::new();
        let err = cat.validate_args("ABS", &[]).unwrap_err();
        assert_eq!(err.kind, calku_common::CalkuErrorKind::Syntax);
    }

    #[test]
    fn textjoin_skips_empty_when_ignore_empty_set() {
        let cat = FunctionCatalog::new();
        let args = vec![
            Value::String(",".into()),
            Value::Boolean(true),
            Value::String("a".into()),
            Value::Null,
            Value::String("b".into()),
        ];
        cat.validate_args("TEXTJOIN", &args).unwrap();
        assert_eq!(cat.call("TEXTJOIN", &args).unwrap(), Value::String("a,b".into()));
    }

    #[test]
    fn is_known_is_case_insensitive() {
        let cat = FunctionCatalog::new();
        assert!(cat.is_known("sum"));
        assert!(cat.is_known("Sum"));
        assert!(!cat.is_known("nope"));
    }
}
