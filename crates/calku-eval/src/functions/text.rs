//! String built-ins.

use calku_common::{CalkuError, Value};

use crate::functions::spec::{FunctionSpec, ParamSpec, ParamValidator};
use crate::validator::Validator;

fn stringish(v: &mut Validator) -> &mut Validator {
    v.instance_of(&["string", "number", "null"])
}
fn integer_param(v: &mut Validator) -> &mut Validator {
    v.integer()
}
fn anything(v: &mut Validator) -> &mut Validator {
    v.anything()
}

/// The "decimal/string form" LEFT/RIGHT/MID/LEN operate on: numbers render
/// via the shortest round-trip decimal, null renders as "".
fn string_form(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_concat_string().unwrap_or_default(),
    }
}

fn left(args: &[Value]) -> Result<Value, CalkuError> {
    let s = string_form(&args[0]);
    let n = args[1].coerce_to_number().unwrap_or(0.0).max(0.0) as usize;
    Ok(Value::String(s.chars().take(n).collect()))
}

fn right(args: &[Value]) -> Result<Value, CalkuError> {
    let s = string_form(&args[0]);
    let n = args[1].coerce_to_number().unwrap_or(0.0).max(0.0) as usize;
    let total = s.chars().count();
    let skip = total.saturating_sub(n);
    Ok(Value::String(s.chars().skip(skip).collect()))
}

fn mid(args: &[Value]) -> Result<Value, CalkuError> {
    let s = string_form(&args[0]);
    let start = args[1].coerce_to_number().unwrap_or(0.0).max(0.0) as usize;
    let len = args[2].coerce_to_number().unwrap_or(0.0).max(0.0) as usize;
    Ok(Value::String(s.chars().skip(start).take(len).collect()))
}

fn len(args: &[Value]) -> Result<Value, CalkuError> {
    let n = match &args[0] {
        Value::Null => 0.0,
        Value::Array(items) => items.len() as f64,
        Value::String(_) | Value::Number(_) => string_form(&args[0]).chars().count() as f64,
        Value::Boolean(_) => 1.0,
        Value::Date(d) => d.timestamp_millis() as f64,
        Value::Object(_) => 1.0,
        Value::Undefined => 0.0,
    };
    Ok(Value::Number(n))
}

fn textjoin(args: &[Value]) -> Result<Value, CalkuError> {
    let delim = match &args[0] {
        Value::String(s) => s.clone(),
        other => string_form(other),
    };
    let ignore_empty = args[1].is_truthy();
    let mut parts = Vec::new();
    for v in &args[2..] {
        if ignore_empty {
            let skip = matches!(v, Value::Null | Value::Undefined)
                || matches!(v, Value::String(s) if s.is_empty());
            if skip {
                continue;
            }
        }
        parts.push(match v {
            Value::Undefined => String::new(),
            other => string_form(other),
        });
    }
    Ok(Value::String(parts.join(&delim)))
}

pub fn specs() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec {
            key: "LEFT",
            params: ParamSpec::TypedList(&[
                ParamValidator::required(stringish),
                ParamValidator::required(integer_param),
            ]),
            eval: left,
        },
        FunctionSpec {
            key: "RIGHT",
            params: ParamSpec::TypedList(&[
                ParamValidator::required(stringish),
                ParamValidator::required(integer_param),
            ]),
            eval: right,
        },
        FunctionSpec {
            key: "MID",
            params: ParamSpec::TypedList(&[
                ParamValidator::required(stringish),
                ParamValidator::required(integer_param),
                ParamValidator::required(integer_param),
            ]),
            eval: mid,
        },
        FunctionSpec {
            key: "LEN",
            params: ParamSpec::TypedList(&[ParamValidator::required(anything)]),
            eval: len,
        },
        FunctionSpec {
            key: "TEXTJOIN",
            params: ParamSpec::TypedList(&[
                ParamValidator::required(|v| v.instance_of(&["string", "number", "null"])),
                ParamValidator::required(|v| v.instance_of(&["boolean"])),
                ParamValidator::spread(anything),
            ]),
            eval: textjoin,
        },
    ]
}
