//! Control-flow built-in: `IF` is the only branching construct CalKu has.

use calku_common::{CalkuError, Value};

use crate::functions::spec::{FunctionSpec, ParamSpec, ParamValidator};
use crate::validator::Validator;

fn boolean_required(v: &mut Validator) -> &mut Validator {
    v.required().boolean()
}
fn anything(v: &mut Validator) -> &mut Validator {
    v.anything()
}

fn if_fn(args: &[Value]) -> Result<Value, CalkuError> {
    let cond = match &args[0] {
        Value::Boolean(b) => *b,
        _ => return Err(CalkuError::evaluation("IF condition must be boolean")),
    };
    Ok(if cond { args[1].clone() } else { args[2].clone() })
}

pub fn specs() -> Vec<FunctionSpec> {
    vec![FunctionSpec {
        key: "IF",
        params: ParamSpec::TypedList(&[
            ParamValidator::required(boolean_required),
            ParamValidator::required(anything),
            ParamValidator::required(anything),
        ]),
        eval: if_fn,
    }]
}
