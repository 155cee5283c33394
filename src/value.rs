//! The dynamic `Value` returned by evaluation.
//!
//! The source language is untyped at the value level: every evaluator
//! operation dispatches on `Value` and coerces explicitly via the helper
//! predicates below. There is no implicit subtype relationship between
//! variants.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;
use crate::error::{Error, Result};

/// A dynamically-typed value flowing through the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Decimal(Decimal),
    /// Pass-through for explicitly float-typed literals/inputs; never
    /// produced implicitly by arithmetic, which always computes in Decimal.
    Float(f64),
    String(String),
    Bool(bool),
    Null,
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Decimal(_) | Value::Float(_))
    }

    /// Coerce a numeric value to Decimal. Non-numeric values are a type error
    /// at the call site; this helper only handles the numeric variants.
    pub fn to_decimal(&self) -> Result<Decimal> {
        match self {
            Value::Decimal(d) => Ok(*d),
            Value::Float(f) => Decimal::from_f64(*f).map_err(|_| Error::InvalidDecimal(f.to_string())),
            other => Err(Error::TypeMismatch {
                expected: "numeric".into(),
                actual: other.type_name().into(),
                where_: "numeric coercion".into(),
            }),
        }
    }

    /// Truthiness coercion used by `&&`, `||`, `!`, and the ternary operator.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Decimal(d) => !d.is_zero(),
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// `TYPEOF()` result / error-message type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Decimal(_) => "decimal",
            Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Stringify for `+`-as-concatenation: Decimal renders as canonical text,
    /// never as a lossy float.
    pub fn stringify(&self) -> String {
        match self {
            Value::Decimal(d) => d.to_canonical_text(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Array(_) | Value::Object(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }

    pub fn decimal(d: Decimal) -> Self {
        Value::Decimal(d)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// If this is a primitive numeric that isn't already Decimal, upgrade it.
    /// Used on `$`-variable resolution and on object/array member access,
    /// per spec: "convert to Decimal before returning".
    pub fn auto_decimal(self) -> Self {
        match self {
            Value::Float(f) => match Decimal::from_f64(f) {
                Ok(d) => Value::Decimal(d),
                Err(_) => Value::Float(f),
            },
            other => other,
        }
    }

    /// `auto_decimal`, recursing into arrays/objects. Used for the batch-entry
    /// conversion pass (`DecimalConfig::auto_convert_floats`), which promotes
    /// every primitive numeric reachable from a `$`-variable, not just the
    /// top-level value.
    pub fn auto_decimal_deep(self) -> Self {
        match self {
            Value::Array(items) => Value::Array(items.into_iter().map(Value::auto_decimal_deep).collect()),
            Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, v.auto_decimal_deep())).collect())
            }
            other => other.auto_decimal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_spec_rules() {
        assert!(!Value::Null.to_bool());
        assert!(!Value::Decimal(Decimal::ZERO).to_bool());
        assert!(Value::Decimal(Decimal::ONE).to_bool());
        assert!(!Value::String(String::new()).to_bool());
        assert!(Value::String("x".into()).to_bool());
        assert!(!Value::Array(vec![]).to_bool());
        assert!(Value::Array(vec![Value::Null]).to_bool());
        assert!(Value::Object(IndexMap::new()).to_bool());
    }

    #[test]
    fn auto_decimal_deep_converts_nested_floats() {
        let mut row = IndexMap::new();
        row.insert("rate".to_string(), Value::Float(0.5));
        let nested = Value::Array(vec![Value::Float(1.5), Value::Object(row)]);
        let converted = nested.auto_decimal_deep();
        match converted {
            Value::Array(items) => {
                assert_eq!(items[0], Value::decimal(Decimal::from_f64(1.5).unwrap()));
                match &items[1] {
                    Value::Object(map) => {
                        assert_eq!(map["rate"], Value::decimal(Decimal::from_f64(0.5).unwrap()));
                    }
                    other => panic!("expected object, got {other:?}"),
                }
            }
            other => panic!("expected array, got {other:?}"),
        }
    }
}
