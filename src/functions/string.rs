//! String builtins: `LEN`, `UPPER`, `LOWER`, `TRIM`, `CONCAT`, `SUBSTR`,
//! `REPLACE`, `CONTAINS`, `STARTSWITH`, `ENDSWITH`.

use indexmap::IndexMap;

use super::{insert, string_arg, to_index, FunctionSpec};
use crate::decimal::Decimal;
use crate::value::Value;

pub(super) fn install(table: &mut IndexMap<String, FunctionSpec>) {
    insert(table, "LEN", 1, Some(1), |args| {
        let s = string_arg(args, 0, "LEN")?;
        Ok(Value::decimal(Decimal::from_i64(s.chars().count() as i64)))
    });

    insert(table, "UPPER", 1, Some(1), |args| {
        Ok(Value::string(string_arg(args, 0, "UPPER")?.to_uppercase()))
    });

    insert(table, "LOWER", 1, Some(1), |args| {
        Ok(Value::string(string_arg(args, 0, "LOWER")?.to_lowercase()))
    });

    insert(table, "TRIM", 1, Some(1), |args| {
        Ok(Value::string(string_arg(args, 0, "TRIM")?.trim().to_string()))
    });

    insert(table, "CONCAT", 0, None, |args| {
        Ok(Value::string(args.iter().map(Value::stringify).collect::<String>()))
    });

    insert(table, "SUBSTR", 2, Some(3), |args| {
        let s = string_arg(args, 0, "SUBSTR")?;
        let chars: Vec<char> = s.chars().collect();
        let start = to_index(&args[1]).unwrap_or(0).clamp(0, chars.len() as i64) as usize;
        let len = match args.get(2) {
            Some(v) => to_index(v).unwrap_or(0).max(0) as usize,
            None => chars.len() - start,
        };
        let end = (start + len).min(chars.len());
        Ok(Value::string(chars[start..end].iter().collect::<String>()))
    });

    insert(table, "REPLACE", 3, Some(3), |args| {
        let s = string_arg(args, 0, "REPLACE")?;
        let find = string_arg(args, 1, "REPLACE")?;
        let rep = string_arg(args, 2, "REPLACE")?;
        Ok(Value::string(s.replace(find, rep)))
    });

    insert(table, "CONTAINS", 2, Some(2), |args| {
        Ok(Value::Bool(
            string_arg(args, 0, "CONTAINS")?.contains(string_arg(args, 1, "CONTAINS")?),
        ))
    });

    insert(table, "STARTSWITH", 2, Some(2), |args| {
        Ok(Value::Bool(
            string_arg(args, 0, "STARTSWITH")?.starts_with(string_arg(args, 1, "STARTSWITH")?),
        ))
    });

    insert(table, "ENDSWITH", 2, Some(2), |args| {
        Ok(Value::Bool(
            string_arg(args, 0, "ENDSWITH")?.ends_with(string_arg(args, 1, "ENDSWITH")?),
        ))
    });
}
