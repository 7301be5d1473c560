//! Shared `FunctionSpec`/`ParamSpec` data model.

use calku_common::{CalkuError, Value};

use crate::validator::Validator;

pub type ParamValidate = fn(&mut Validator) -> &mut Validator;
pub type FunctionEval = fn(&[Value]) -> Result<Value, CalkuError>;

#[derive(Clone, Copy)]
pub struct ParamValidator {
    pub validate: ParamValidate,
    pub spread: bool,
}

impl ParamValidator {
    pub const fn required(validate: ParamValidate) -> Self {
        Self { validate, spread: false }
    }
    pub const fn spread(validate: ParamValidate) -> Self {
        Self { validate, spread: true }
    }
}

pub enum ParamSpec {
    NoArgs,
    FixedCount(usize),
    TypedList(&'static [ParamValidator]),
    SingleSpread(ParamValidator),
}

pub struct FunctionSpec {
    pub key: &'static str,
    pub params: ParamSpec,
    pub eval: FunctionEval,
}

/// Enforces arity (a mismatch is a syntax error, not an
/// evaluation error — see DESIGN.md's "arity mismatch kind" decision) and,
/// for `TypedList`/`SingleSpread`, each argument's predicate.
pub fn validate_args(spec: &FunctionSpec, args: &[Value]) -> Result<(), CalkuError> {
    match &spec.params {
        ParamSpec::NoArgs => {
            if !args.is_empty() {
                return Err(arity_error(spec.key, 0, args.len()));
            }
        }
        ParamSpec::FixedCount(n) => {
            if args.len() != *n {
                return Err(arity_error(spec.key, *n, args.len()));
            }
        }
        ParamSpec::TypedList(params) => {
            validate_typed_list(spec.key, params, args)?;
        }
        ParamSpec::SingleSpread(p) => {
            for (i, arg) in args.iter().enumerate() {
                run_predicate(spec.key, i, p.validate, arg)?;
            }
        }
    }
    Ok(())
}

fn validate_typed_list(name: &str, params: &'static [ParamValidator], args: &[Value]) -> Result<(), CalkuError> {
    let has_spread = params.last().is_some_and(|p| p.spread);
    if has_spread {
        let fixed_len = params.len() - 1;
        if args.len() < fixed_len {
            return Err(arity_error_min(name, fixed_len, args.len()));
        }
        for (i, p) in params[..fixed_len].iter().enumerate() {
            run_predicate(name, i, p.validate, &args[i])?;
        }
        let spread_param = &params[fixed_len];
        for (i, arg) in args[fixed_len..].iter().enumerate() {
            run_predicate(name, fixed_len + i, spread_param.validate, arg)?;
        }
    } else {
        if args.len() != params.len() {
            return Err(arity_error(name, params.len(), args.len()));
        }
        for (i, p) in params.iter().enumerate() {
            run_predicate(name, i, p.validate, &args[i])?;
        }
    }
    Ok(())
}

fn run_predicate(name: &str, index: usize, validate: ParamValidate, arg: &Value) -> Result<(), CalkuError> {
    let mut v = Validator::named(arg.clone(), format!("{name} argument {index}"));
    validate(&mut v);
    match v.message() {
        Some(msg) => Err(CalkuError::evaluation(msg)),
        None => Ok(()),
    }
}

fn arity_error(name: &str, expected: usize, got: usize) -> CalkuError {
    CalkuError::syntax(format!("{name} expects exactly {expected} argument(s), got {got}"))
}

fn arity_error_min(name: &str, min: usize, got: usize) -> CalkuError {
    CalkuError::syntax(format!("{name} expects at least {min} argument(s), got {got}"))
}

/// Flattens nested `Array` values up to `depth` levels (the
/// "flatten depth 3" spread rule for the numeric aggregations).
pub fn flatten(args: &[Value], depth: usize) -> Vec<Value> {
    let mut out = Vec::new();
    flatten_into(args, depth, &mut out);
    out
}

fn flatten_into(args: &[Value], depth: usize, out: &mut Vec<Value>) {
    for arg in args {
        match arg {
            Value::Array(items) if depth > 0 => flatten_into(items, depth - 1, out),
            other => out.push(other.clone()),
        }
    }
}
