//! Argument-coercion helpers shared across the builtin categories.

use crate::decimal::Decimal;
use crate::error::Error;
use crate::value::Value;

pub(crate) fn decimal_arg(args: &[Value], i: usize, function: &str) -> crate::error::Result<Decimal> {
    args[i].to_decimal().map_err(|_| Error::TypeMismatch {
        expected: "numeric".into(),
        actual: args[i].type_name().into(),
        where_: format!("{function} argument {i}"),
    })
}

pub(crate) fn string_arg<'a>(args: &'a [Value], i: usize, function: &str) -> crate::error::Result<&'a str> {
    match &args[i] {
        Value::String(s) => Ok(s.as_str()),
        other => Err(Error::TypeMismatch {
            expected: "string".into(),
            actual: other.type_name().into(),
            where_: format!("{function} argument {i}"),
        }),
    }
}

pub(crate) fn array_arg<'a>(args: &'a [Value], i: usize, function: &str) -> crate::error::Result<&'a [Value]> {
    match &args[i] {
        Value::Array(a) => Ok(a.as_slice()),
        other => Err(Error::TypeMismatch {
            expected: "array".into(),
            actual: other.type_name().into(),
            where_: format!("{function} argument {i}"),
        }),
    }
}

pub(crate) fn object_arg<'a>(
    args: &'a [Value],
    i: usize,
    function: &str,
) -> crate::error::Result<&'a indexmap::IndexMap<String, Value>> {
    match &args[i] {
        Value::Object(o) => Ok(o),
        other => Err(Error::TypeMismatch {
            expected: "object".into(),
            actual: other.type_name().into(),
            where_: format!("{function} argument {i}"),
        }),
    }
}

/// Native (non-Decimal) index conversion used by array bounds/slicing.
pub(crate) fn to_index(value: &Value) -> Option<i64> {
    match value {
        Value::Decimal(d) => Some(d.to_f64().round() as i64),
        Value::Float(f) => Some(f.round() as i64),
        _ => None,
    }
}

/// Resolve a possibly-negative, possibly-out-of-range array index to an
/// in-bounds `usize`, or `None` (callers return `Null`/skip on `None`).
pub(crate) fn resolve_index(idx: i64, len: usize) -> Option<usize> {
    if idx < 0 || idx as usize >= len {
        None
    } else {
        Some(idx as usize)
    }
}

/// Numeric equality that treats Decimal and any other numeric the same way
/// value comparisons do elsewhere in the evaluator (`LOOKUP`/`RANGE` use
/// this for criteria matching).
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Decimal(_), _) | (_, Value::Decimal(_)) if a.is_numeric() && b.is_numeric() => {
            a.to_decimal().ok() == b.to_decimal().ok()
        }
        (Value::Decimal(d), Value::String(s)) | (Value::String(s), Value::Decimal(d)) => {
            d.to_canonical_text() == *s
        }
        _ => a == b,
    }
}
