//! Property path resolver.
//!
//! Paths use `.` for object keys and `:` for array/string indices. Segments
//! named `prototype`, `constructor`, or `__proto__` are rejected outright —
//! prototype-pollution hardening carried over unconditionally even though
//! CalKu's `Value` has no prototype chain — treated as a language-agnostic
//! safety invariant, not an artifact of a specific host.

use calku_common::{CalkuError, Value};

const FORBIDDEN_SEGMENTS: &[&str] = &["prototype", "constructor", "__proto__"];

/// Splits `path` on `.`/`:`, validating segment shape, without allocating a
/// `Vec<String>` for the common case (mirrors the non-allocating iterator
/// ergonomics `calku_parse`'s token walk uses elsewhere).
fn segments(path: &str) -> Result<Vec<&str>, CalkuError> {
    if path.is_empty() {
        return Err(CalkuError::syntax("property path must not be empty"));
    }
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = path.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'.' || *b == b':' {
            let seg = &path[start..i];
            validate_segment(seg)?;
            out.push(seg);
            start = i + 1;
        }
    }
    let last = &path[start..];
    validate_segment(last)?;
    out.push(last);
    Ok(out)
}

fn validate_segment(seg: &str) -> Result<(), CalkuError> {
    if seg.is_empty() {
        return Err(CalkuError::syntax("property path contains an empty segment"));
    }
    if FORBIDDEN_SEGMENTS.contains(&seg) {
        return Err(CalkuError::syntax(format!(
            "property path segment '{seg}' is not allowed"
        )));
    }
    Ok(())
}

/// Resolves `path` against `target`.
pub fn resolve(target: &Value, path: &str) -> Result<Value, CalkuError> {
    let segs = segments(path)?;
    let mut current = target.clone();
    for seg in segs {
        if matches!(current, Value::Null | Value::Undefined) {
            return Ok(Value::Undefined);
        }
        current = step(&current, seg);
    }
    Ok(current)
}

/// Dispatches purely on `value`'s runtime shape, not on which separator
/// (`.` vs `:`) preceded `seg` in the source path — `segments` discards that
/// distinction during splitting. A numeric-looking segment reached through
/// either separator indexes an array/string the same way (`"arr.2"` and
/// `"arr:2"` are equivalent), and a non-numeric segment against an object
/// looks up a key regardless of which separator introduced it. This is a
/// deliberate looser reading than a literal "`.` is always a key, `:` is
/// always an index" grammar: it lets a path keep working if a target's
/// shape changes between an object and an array at that position, the same
/// forgiving spirit as this resolver returning `Undefined` instead of
/// erroring on a missing key or out-of-range index.
fn step(value: &Value, seg: &str) -> Value {
    match value {
        Value::Object(map) => map.get(seg).cloned().unwrap_or(Value::Undefined),
        Value::Array(items) => match seg.parse::<usize>() {
            Ok(idx) => items.get(idx).cloned().unwrap_or(Value::Undefined),
            Err(_) => Value::Undefined,
        },
        Value::String(s) => match seg.parse::<usize>() {
            Ok(idx) => s
                .chars()
                .nth(idx)
                .map(|c| Value::String(c.to_string()))
                .unwrap_or(Value::Undefined),
            Err(_) => Value::Undefined,
        },
        _ => Value::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn obj(pairs: &[(&str, Value)]) -> Value {
        let mut m = BTreeMap::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v.clone());
        }
        Value::Object(m)
    }

    #[test]
    fn resolves_nested_object_and_array_and_char_index() {
        let target = obj(&[(
            "test",
            obj(&[(
                "moose",
                Value::Array(vec![
                    obj(&[("hello", Value::String("mars".into()))]),
                    obj(&[
                        ("hello", Value::String("jupiter".into())),
                        (
                            "moons",
                            Value::Array(vec![
                                Value::String("io".into()),
                                Value::String("europa".into()),
                            ]),
                        ),
                    ]),
                ]),
            )]),
        )]);

        let result = resolve(&target, "test.moose:1.moons:1:2").unwrap();
        assert_eq!(result, Value::String("r".to_string()));
    }

    #[test]
    fn rejects_prototype_pollution_segments() {
        assert!(resolve(&Value::Null, "a.constructor.b").is_err());
        assert!(resolve(&Value::Null, "__proto__").is_err());
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(resolve(&Value::Null, "a..b").is_err());
        assert!(resolve(&Value::Null, "a.b:").is_err());
    }

    #[test]
    fn null_mid_path_short_circuits_to_undefined() {
        let target = obj(&[("a", Value::Null)]);
        assert_eq!(resolve(&target, "a.b").unwrap(), Value::Undefined);
    }

    #[test]
    fn dot_and_colon_are_interchangeable_for_array_indexing() {
        let target = obj(&[("arr", Value::Array(vec![Value::String("x".into()), Value::String("y".into())]))]);
        assert_eq!(resolve(&target, "arr.1").unwrap(), Value::String("y".to_string()));
        assert_eq!(resolve(&target, "arr:1").unwrap(), Value::String("y".to_string()));
    }
}
