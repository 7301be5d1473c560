//! The CalKu value model.
//!
//! `Value` is a tagged variant, not an Excel-style cell value: there is no
//! distinct "error" tag (errors are `CalkuError`, caught by the facade and
//! returned as the call's `Result`, never folded into the value space the
//! way `formualizer_common::LiteralValue::Error` is).

use chrono::{DateTime, FixedOffset};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// A CalKu value. Arrays and Objects carry reference semantics for equality:
/// two array values are never equal to each other, even when built from
/// identical elements. The same rule extends to Object, which shares
/// Array's composite, identity-sensitive nature.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Undefined,
    Boolean(bool),
    Number(f64),
    String(String),
    Date(DateTime<FixedOffset>),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Short tag name used in validator messages and `instanceOf` checks.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Canonical JS-like truthiness: Null, Undefined,
    /// false, 0 (including NaN), and "" are falsey; everything else,
    /// including empty arrays/objects, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null | Value::Undefined => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Date(_) | Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Coerce to `f64` for arithmetic operators: Boolean false/true -> 0/1,
    /// Null -> 0. Everything else is not coercible (math ops validate their
    /// operands before calling this, so None here is a logic error upstream).
    pub fn coerce_to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Null => Some(0.0),
            _ => None,
        }
    }

    /// Render for `CONCATENATE`/`&`: string/number/boolean/date/null only;
    /// null becomes "". Numbers use the shortest round-trip decimal (Rust's
    /// default `f64` `Display` already is); dates render as ISO-8601.
    pub fn to_concat_string(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Date(d) => Some(d.to_rfc3339()),
            _ => None,
        }
    }

    /// Like `to_concat_string` but falls back to the tag name, used by
    /// operators (CONTAINS/STARTSWITH/ENDSWITH) that stringify a numeric or
    /// boolean left operand before a substring test.
    pub fn to_display_string(&self) -> String {
        self.to_concat_string().unwrap_or_else(|| self.tag_name().to_string())
    }

    /// Unix milliseconds for a Date value (used by `LEN(date)`).
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            Value::Date(d) => Some(d.timestamp_millis()),
            _ => None,
        }
    }

    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }
}

/// Render the shortest round-trip decimal form of a number, matching
/// Numbers render using the shortest round-trip decimal form.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else {
        // Rust's default f64 formatter already produces the shortest
        // representation that round-trips exactly.
        let mut s = format!("{n}");
        if let Some(stripped) = s.strip_suffix(".0") {
            s = stripped.to_string();
        }
        s
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b, // NaN != NaN, by IEEE-754
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b, // chrono compares instants
            (Value::Array(_), Value::Array(_)) => false, // reference semantics
            (Value::Object(_), Value::Object(_)) => false, // reference semantics
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Undefined, Value::Undefined) => Some(Ordering::Equal),
            (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Undefined => write!(f, "undefined"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_never_equal() {
        let a = Value::Array(vec![Value::Number(1.0)]);
        let b = Value::Array(vec![Value::Number(1.0)]);
        assert_ne!(a, b);
        assert_ne!(a, a.clone());
    }

    #[test]
    fn nan_not_equal_to_itself() {
        let nan = Value::Number(f64::NAN);
        assert_ne!(nan, nan.clone());
    }

    #[test]
    fn cross_tag_never_equal() {
        assert_ne!(Value::Number(0.0), Value::Boolean(false));
        assert_ne!(Value::Null, Value::Undefined);
    }

    #[test]
    fn truthiness_matches_js_like_rule() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
        assert!(Value::Object(BTreeMap::new()).is_truthy());
    }

    #[test]
    fn number_formats_shortest_round_trip() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(3.25), "3.25");
    }
}
