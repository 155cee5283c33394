//! Logical builtins: `IF`, `COALESCE`, `ISNULL`, `ISEMPTY`, `DEFAULT`,
//! `AND`, `OR`, `NOT`.
//!
//! Unlike the `? :` operator, `IF`'s arguments are evaluated eagerly before
//! this function ever runs (spec §4.5) — there is no short-circuiting here.

use indexmap::IndexMap;

use super::{insert, FunctionSpec};
use crate::value::Value;

pub(super) fn install(table: &mut IndexMap<String, FunctionSpec>) {
    insert(table, "IF", 3, Some(3), |args| {
        Ok(if args[0].to_bool() { args[1].clone() } else { args[2].clone() })
    });

    insert(table, "COALESCE", 1, None, |args| {
        Ok(args
            .iter()
            .find(|v| !matches!(v, Value::Null))
            .cloned()
            .unwrap_or(Value::Null))
    });

    insert(table, "ISNULL", 1, Some(1), |args| Ok(Value::Bool(matches!(args[0], Value::Null))));

    insert(table, "ISEMPTY", 1, Some(1), |args| {
        Ok(Value::Bool(match &args[0] {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }))
    });

    insert(table, "DEFAULT", 2, Some(2), |args| {
        Ok(if matches!(args[0], Value::Null) { args[1].clone() } else { args[0].clone() })
    });

    insert(table, "AND", 1, None, |args| Ok(Value::Bool(args.iter().all(Value::to_bool))));

    insert(table, "OR", 1, None, |args| Ok(Value::Bool(args.iter().any(Value::to_bool))));

    insert(table, "NOT", 1, Some(1), |args| Ok(Value::Bool(!args[0].to_bool())));
}
