//! Type-predicate and misc built-ins.

use calku_common::{CalkuError, Value};

use crate::functions::spec::{FunctionSpec, ParamSpec, ParamValidator};
use crate::validator::Validator;

fn anything(v: &mut Validator) -> &mut Validator {
    v.anything()
}
fn string_or_null(v: &mut Validator) -> &mut Validator {
    v.instance_of(&["string", "null"])
}

fn is_array(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Boolean(matches!(args[0], Value::Array(_))))
}
fn is_boolean(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Boolean(matches!(args[0], Value::Boolean(_))))
}
fn is_date(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Boolean(matches!(args[0], Value::Date(_))))
}
fn is_object(args: &[Value]) -> Result<Value, CalkuError> {
    // Excludes Date: an object check that let a date through would make
    // ISOBJECT/ISDATE overlap would make the two predicates redundant.
    Ok(Value::Boolean(matches!(args[0], Value::Object(_))))
}

fn blank(v: &Value) -> bool {
    match v {
        Value::Null | Value::Undefined => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
fn is_empty(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Boolean(blank(&args[0])))
}
fn is_not_empty(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Boolean(!blank(&args[0])))
}

fn is_null(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Boolean(matches!(args[0], Value::Null)))
}
fn is_not_null(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Boolean(!matches!(args[0], Value::Null)))
}

fn hello_world(_args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::String("Hello world.".to_string()))
}

pub fn specs() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec {
            key: "ISARRAY",
            params: ParamSpec::TypedList(&[ParamValidator::required(anything)]),
            eval: is_array,
        },
        FunctionSpec {
            key: "ISBOOLEAN",
            params: ParamSpec::TypedList(&[ParamValidator::required(anything)]),
            eval: is_boolean,
        },
        FunctionSpec {
            key: "ISDATE",
            params: ParamSpec::TypedList(&[ParamValidator::required(anything)]),
            eval: is_date,
        },
        FunctionSpec {
            key: "ISOBJECT",
            params: ParamSpec::TypedList(&[ParamValidator::required(anything)]),
            eval: is_object,
        },
        FunctionSpec {
            key: "ISEMPTY",
            params: ParamSpec::TypedList(&[ParamValidator::required(string_or_null)]),
            eval: is_empty,
        },
        FunctionSpec {
            key: "ISNOTEMPTY",
            params: ParamSpec::TypedList(&[ParamValidator::required(string_or_null)]),
            eval: is_not_empty,
        },
        FunctionSpec {
            key: "ISNULL",
            params: ParamSpec::TypedList(&[ParamValidator::required(anything)]),
            eval: is_null,
        },
        FunctionSpec {
            key: "ISNOTNULL",
            params: ParamSpec::TypedList(&[ParamValidator::required(anything)]),
            eval: is_not_null,
        },
        FunctionSpec {
            key: "HELLOWORLD",
            params: ParamSpec::NoArgs,
            eval: hello_world,
        },
    ]
}
