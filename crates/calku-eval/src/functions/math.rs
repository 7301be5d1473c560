//! Numeric built-ins.

use calku_common::{CalkuError, Value};

use crate::functions::spec::{flatten, FunctionSpec, ParamSpec, ParamValidator};
use crate::validator::Validator;

fn numericish(v: &mut Validator) -> &mut Validator {
    v.instance_of(&["number", "boolean", "null"])
}

fn single_number(args: &[Value]) -> f64 {
    args[0].coerce_to_number().unwrap_or(f64::NAN)
}

fn abs(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Number(single_number(args).abs()))
}
fn ceil(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Number(single_number(args).ceil()))
}
fn floor(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Number(single_number(args).floor()))
}
fn sqrt(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Number(single_number(args).sqrt()))
}
fn truncate(args: &[Value]) -> Result<Value, CalkuError> {
    Ok(Value::Number(single_number(args).trunc()))
}

fn sum(args: &[Value]) -> Result<Value, CalkuError> {
    let flat = flatten(args, 3);
    let total: f64 = flat
        .iter()
        .filter_map(|v| v.coerce_to_number())
        .filter(|n| !n.is_nan())
        .sum();
    Ok(Value::Number(total))
}

fn average(args: &[Value]) -> Result<Value, CalkuError> {
    let flat = flatten(args, 3);
    let nums: Vec<f64> = flat
        .iter()
        .filter_map(|v| v.coerce_to_number())
        .filter(|n| !n.is_nan())
        .collect();
    if nums.is_empty() {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(nums.iter().sum::<f64>() / nums.len() as f64))
}

fn count(args: &[Value]) -> Result<Value, CalkuError> {
    let flat = flatten(args, 3);
    let n = flat
        .iter()
        .filter(|v| v.coerce_to_number().is_some_and(|n| !n.is_nan()))
        .count();
    Ok(Value::Number(n as f64))
}

pub fn specs() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec {
            key: "ABS",
            params: ParamSpec::TypedList(&[ParamValidator::required(numericish)]),
            eval: abs,
        },
        FunctionSpec {
            key: "CEIL",
            params: ParamSpec::TypedList(&[ParamValidator::required(numericish)]),
            eval: ceil,
        },
        FunctionSpec {
            key: "FLOOR",
            params: ParamSpec::TypedList(&[ParamValidator::required(numericish)]),
            eval: floor,
        },
        FunctionSpec {
            key: "SQRT",
            params: ParamSpec::TypedList(&[ParamValidator::required(numericish)]),
            eval: sqrt,
        },
        FunctionSpec {
            key: "TRUNCATE",
            params: ParamSpec::TypedList(&[ParamValidator::required(numericish)]),
            eval: truncate,
        },
        FunctionSpec {
            key: "SUM",
            params: ParamSpec::SingleSpread(ParamValidator::spread(|v| {
                v.instance_of(&["number", "boolean", "null", "array"])
            })),
            eval: sum,
        },
        FunctionSpec {
            key: "AVERAGE",
            params: ParamSpec::SingleSpread(ParamValidator::spread(|v| {
                v.instance_of(&["number", "boolean", "null", "array"])
            })),
            eval: average,
        },
        FunctionSpec {
            key: "COUNT",
            params: ParamSpec::SingleSpread(ParamValidator::spread(|v| v.anything())),
            eval: count,
        },
    ]
}
