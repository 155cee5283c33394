//! Type-coercion builtins: `NUMBER`, `STRING`, `BOOLEAN`, `TYPEOF`.

use indexmap::IndexMap;

use super::{insert, FunctionSpec};
use crate::decimal::Decimal;
use crate::error::Error;
use crate::value::Value;

pub(super) fn install(table: &mut IndexMap<String, FunctionSpec>) {
    insert(table, "NUMBER", 1, Some(1), |args| match &args[0] {
        Value::Decimal(d) => Ok(Value::decimal(*d)),
        Value::Float(f) => Ok(Value::decimal(Decimal::from_f64(*f)?)),
        Value::Bool(b) => Ok(Value::decimal(Decimal::from_i64(*b as i64))),
        Value::String(s) => Decimal::from_text(s)
            .map(Value::decimal)
            .map_err(Error::from),
        other => Err(Error::TypeMismatch {
            expected: "numeric-coercible".into(),
            actual: other.type_name().into(),
            where_: "NUMBER argument".into(),
        }),
    });

    insert(table, "STRING", 1, Some(1), |args| Ok(Value::string(args[0].stringify())));

    insert(table, "BOOLEAN", 1, Some(1), |args| Ok(Value::Bool(args[0].to_bool())));

    insert(table, "TYPEOF", 1, Some(1), |args| Ok(Value::string(args[0].type_name())));
}
