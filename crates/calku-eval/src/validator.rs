//! Chainable argument validator.
//!
//! A `Validator` carries one value through a chain of predicate calls; the
//! first failure sticks and every later predicate becomes a no-op, mirroring
//! the short-circuiting fluent validators CalKu's argument checks are built
//! from (`required().instanceOf(...)`, etc.). Grounded on the same "builder
//! that records the first failure and lets every call afterwards fall
//! through" shape as `calku_common::error`'s constructors, generalized into
//! a reusable session object instead of one-shot constructors.

use calku_common::{CalkuError, Value};

/// One validation session. Create with [`Validator::new`], chain predicate
/// calls, then read [`Validator::is_valid`] / [`Validator::message`] or
/// convert with [`Validator::into_result`].
#[derive(Debug, Clone)]
pub struct Validator {
    value: Value,
    name: Option<String>,
    failure: Option<String>,
    bypassed: bool,
}

impl Validator {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            name: None,
            failure: None,
            bypassed: false,
        }
    }

    pub fn named(value: Value, name: impl Into<String>) -> Self {
        Self {
            value,
            name: Some(name.into()),
            failure: None,
            bypassed: false,
        }
    }

    /// Clears the failure state; optionally replaces the carried value/name.
    pub fn reset(&mut self, value: Option<Value>, name: Option<String>) -> &mut Self {
        self.failure = None;
        self.bypassed = false;
        if let Some(v) = value {
            self.value = v;
        }
        if name.is_some() {
            self.name = name;
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.failure.is_none()
    }

    /// The first failure sentence, prefixed with the value's name if set.
    pub fn message(&self) -> Option<String> {
        self.failure.as_ref().map(|reason| match &self.name {
            Some(name) => format!("The value for \"{name}\" {reason}"),
            None => format!("The value {reason}"),
        })
    }

    pub fn into_result(self) -> Result<Value, String> {
        match self.message() {
            Some(msg) => Err(msg),
            None => Ok(self.value),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn fail(&mut self, reason: impl Into<String>) -> &mut Self {
        if self.failure.is_none() && !self.bypassed {
            self.failure = Some(reason.into());
        }
        self
    }

    fn active(&self) -> bool {
        self.failure.is_none() && !self.bypassed
    }

    pub fn required(&mut self) -> &mut Self {
        if !self.active() {
            return self;
        }
        let rejected = match &self.value {
            Value::Null | Value::Undefined => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(a) => a.is_empty(),
            _ => false,
        };
        if rejected {
            self.fail("is required");
        }
        self
    }

    pub fn anything(&mut self) -> &mut Self {
        self
    }

    pub fn instance_of(&mut self, types: &[&str]) -> &mut Self {
        if !self.active() {
            return self;
        }
        if !matches_any_tag(&self.value, types) {
            self.fail(format!("must be one of: {}", types.join(", ")));
        }
        self
    }

    pub fn array(&mut self) -> &mut Self {
        self.instance_of(&["array"])
    }
    pub fn boolean(&mut self) -> &mut Self {
        self.instance_of(&["boolean"])
    }
    pub fn number(&mut self) -> &mut Self {
        self.instance_of(&["number"])
    }
    pub fn string(&mut self) -> &mut Self {
        self.instance_of(&["string"])
    }

    pub fn object(&mut self) -> &mut Self {
        if !self.active() {
            return self;
        }
        if !matches!(self.value, Value::Object(_)) {
            self.fail("must be an object");
        }
        self
    }

    pub fn integer(&mut self) -> &mut Self {
        if !self.active() {
            return self;
        }
        match &self.value {
            Value::Number(n) if n.floor() == *n => {}
            _ => {
                self.fail("must be an integer");
            }
        }
        self
    }

    pub fn length(&mut self, min: Option<usize>, max: Option<usize>) -> &mut Self {
        if !self.active() {
            return self;
        }
        let len = match &self.value {
            Value::String(s) => s.chars().count(),
            Value::Array(a) => a.len(),
            _ => {
                self.fail("must be a string or array");
                return self;
            }
        };
        if min.is_some_and(|m| len < m) || max.is_some_and(|m| len > m) {
            self.fail("has an invalid length");
        }
        self
    }

    pub fn range(&mut self, min: Option<f64>, max: Option<f64>) -> &mut Self {
        if !self.active() {
            return self;
        }
        match &self.value {
            Value::Number(n) => {
                if min.is_some_and(|m| *n < m) || max.is_some_and(|m| *n > m) {
                    self.fail("is out of range");
                }
            }
            _ => {
                self.fail("must be a number");
            }
        }
        self
    }

    pub fn regexp(&mut self, pattern: &regex::Regex) -> &mut Self {
        if !self.active() {
            return self;
        }
        match &self.value {
            Value::String(s) if pattern.is_match(s) => {}
            _ => {
                self.fail("does not match the required pattern");
            }
        }
        self
    }

    pub fn email_address(&mut self) -> &mut Self {
        static RE: once_cell::sync::Lazy<regex::Regex> = once_cell::sync::Lazy::new(|| {
            regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap()
        });
        let re = RE.clone();
        self.regexp(&re)
    }

    pub fn phone_number(&mut self, allow_extension: bool) -> &mut Self {
        if !self.active() {
            return self;
        }
        let pattern = if allow_extension {
            r"^\+?[\d().\-\s]{7,}(\s*(x|ext\.?)\s*\d+)?$"
        } else {
            r"^\+?[\d().\-\s]{7,}$"
        };
        let re = regex::Regex::new(pattern).expect("static phone pattern");
        self.regexp(&re)
    }

    pub fn postal_code(&mut self) -> &mut Self {
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new(r"^\d{5}(-\d{4})?$").unwrap());
        let re = RE.clone();
        self.regexp(&re)
    }

    pub fn custom(&mut self, f: impl FnOnce(&Value) -> String) -> &mut Self {
        if !self.active() {
            return self;
        }
        let reason = f(&self.value);
        if !reason.is_empty() {
            self.fail(reason);
        }
        self
    }

    /// If the value exactly equals any of `values`, short-circuits the rest
    /// of the chain as a success.
    pub fn allowed(&mut self, values: &[Value]) -> &mut Self {
        if !self.active() {
            return self;
        }
        if values.iter().any(|v| v == &self.value) {
            self.bypassed = true;
        }
        self
    }
}

fn matches_any_tag(value: &Value, types: &[&str]) -> bool {
    for t in types {
        if tag_matches(value, t) {
            return true;
        }
    }
    // "array" combined with other tags also requires every element to match
    // the full type list.
    if types.contains(&"array") {
        if let Value::Array(items) = value {
            return items.iter().all(|el| matches_any_tag(el, types));
        }
    }
    false
}

/// A typo'd tag or `"undefined"` is a catalog bug, not an ordinary
/// validation failure: every `instance_of` call site is written by hand
/// against this fixed tag vocabulary, and Undefined can never be the type a
/// caller legitimately asks an argument to be (it denotes "absent", not a
/// value shape). Both panic via [`CalkuError::definition_bug`] rather than
/// falling through to an ordinary non-match, the same way other malformed-
/// catalog conditions in this crate do.
fn tag_matches(value: &Value, tag: &str) -> bool {
    match tag {
        "boolean" => matches!(value, Value::Boolean(_)),
        "number" => matches!(value, Value::Number(_)),
        "string" => matches!(value, Value::String(_)),
        "object" => matches!(value, Value::Object(_)),
        "array" => matches!(value, Value::Array(_)),
        "date" | "Date" => matches!(value, Value::Date(_)),
        "null" | "Null" => matches!(value, Value::Null),
        "undefined" | "Undefined" => {
            CalkuError::definition_bug(format!("'{tag}' is not a valid instanceOf tag"))
        }
        other => CalkuError::definition_bug(format!("unrecognised instanceOf tag '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_null_and_blank_strings() {
        assert!(!Validator::new(Value::Null).required().is_valid());
        assert!(!Validator::new(Value::String("   ".into())).required().is_valid());
        assert!(Validator::new(Value::Number(0.0)).required().is_valid());
    }

    #[test]
    fn instance_of_recurses_into_arrays() {
        let arr = Value::Array(vec![Value::Number(1.0), Value::String("x".into())]);
        assert!(!Validator::new(arr.clone())
            .instance_of(&["array", "number"])
            .is_valid());
        let nums = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert!(Validator::new(nums).instance_of(&["array", "number"]).is_valid());
    }

    #[test]
    fn first_failure_sticks() {
        let mut v = Validator::named(Value::Null, "amount");
        v.required().range(Some(0.0), None);
        assert_eq!(v.message().unwrap(), "The value for \"amount\" is required");
    }

    #[test]
    fn allowed_short_circuits_remaining_predicates() {
        let mut v = Validator::new(Value::Null);
        v.allowed(&[Value::Null]).instance_of(&["number"]);
        assert!(v.is_valid());
    }

    #[test]
    fn integer_predicate_rejects_fractions() {
        assert!(Validator::new(Value::Number(4.0)).integer().is_valid());
        assert!(!Validator::new(Value::Number(4.5)).integer().is_valid());
    }

    #[test]
    #[should_panic(expected = "unrecognised instanceOf tag")]
    fn instance_of_panics_on_unrecognised_tag() {
        Validator::new(Value::Number(1.0)).instance_of(&["numbr"]);
    }

    #[test]
    #[should_panic(expected = "not a valid instanceOf tag")]
    fn instance_of_panics_on_undefined_tag() {
        Validator::new(Value::Undefined).instance_of(&["undefined"]);
    }
}
