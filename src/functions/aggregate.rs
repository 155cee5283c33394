//! Array/aggregation builtins that don't need an `it` binding: `SUM`
//! (one-argument form only — the two-argument form is handled by the
//! evaluator directly), `AVG`, `COUNT`, `PRODUCT`, `FIRST`, `LAST`,
//! `REVERSE`, `SLICE`, `INCLUDES`, `INDEXOF`, `FLATTEN`.

use indexmap::IndexMap;

use super::{array_arg, insert, to_index, values_equal, FunctionSpec};
use crate::decimal::Decimal;
use crate::error::Error;
use crate::value::Value;

pub(super) fn install(table: &mut IndexMap<String, FunctionSpec>) {
    insert(table, "SUM", 1, Some(1), |args| {
        let arr = array_arg(args, 0, "SUM")?;
        let mut total = Decimal::ZERO;
        for v in arr {
            total = total.add(numeric(v, "SUM")?);
        }
        Ok(Value::decimal(total))
    });

    insert(table, "AVG", 1, Some(1), |args| {
        let arr = array_arg(args, 0, "AVG")?;
        if arr.is_empty() {
            return Ok(Value::Null);
        }
        let mut total = Decimal::ZERO;
        for v in arr {
            total = total.add(numeric(v, "AVG")?);
        }
        Ok(Value::decimal(
            total.div(Decimal::from_i64(arr.len() as i64), 10, crate::decimal::RoundingMode::HalfUp)?,
        ))
    });

    insert(table, "COUNT", 1, Some(1), |args| {
        let arr = array_arg(args, 0, "COUNT")?;
        Ok(Value::decimal(Decimal::from_i64(arr.len() as i64)))
    });

    insert(table, "PRODUCT", 1, Some(1), |args| {
        let arr = array_arg(args, 0, "PRODUCT")?;
        let mut total = Decimal::ONE;
        for v in arr {
            total = total.mul(numeric(v, "PRODUCT")?);
        }
        Ok(Value::decimal(total))
    });

    insert(table, "FIRST", 1, Some(1), |args| {
        Ok(array_arg(args, 0, "FIRST")?.first().cloned().unwrap_or(Value::Null).auto_decimal())
    });

    insert(table, "LAST", 1, Some(1), |args| {
        Ok(array_arg(args, 0, "LAST")?.last().cloned().unwrap_or(Value::Null).auto_decimal())
    });

    insert(table, "REVERSE", 1, Some(1), |args| {
        let mut arr = array_arg(args, 0, "REVERSE")?.to_vec();
        arr.reverse();
        Ok(Value::Array(arr))
    });

    insert(table, "SLICE", 2, Some(3), |args| {
        let arr = array_arg(args, 0, "SLICE")?;
        let start = to_index(&args[1]).unwrap_or(0).max(0) as usize;
        let end = match args.get(2) {
            Some(v) => to_index(v).unwrap_or(arr.len() as i64).clamp(0, arr.len() as i64) as usize,
            None => arr.len(),
        };
        if start >= end || start >= arr.len() {
            return Ok(Value::Array(Vec::new()));
        }
        Ok(Value::Array(arr[start..end.min(arr.len())].to_vec()))
    });

    insert(table, "INCLUDES", 2, Some(2), |args| {
        let arr = array_arg(args, 0, "INCLUDES")?;
        Ok(Value::Bool(arr.iter().any(|v| values_equal(v, &args[1]))))
    });

    insert(table, "INDEXOF", 2, Some(2), |args| {
        let arr = array_arg(args, 0, "INDEXOF")?;
        let found = arr.iter().position(|v| values_equal(v, &args[1]));
        Ok(Value::decimal(Decimal::from_i64(
            found.map(|i| i as i64).unwrap_or(-1),
        )))
    });

    insert(table, "FLATTEN", 1, Some(2), |args| {
        let arr = array_arg(args, 0, "FLATTEN")?;
        let depth = match args.get(1) {
            Some(v) => to_index(v).unwrap_or(1).max(0) as u32,
            None => 1,
        };
        Ok(Value::Array(flatten(arr, depth)))
    });
}

fn numeric(v: &Value, function: &str) -> crate::error::Result<Decimal> {
    v.to_decimal().map_err(|_| Error::TypeMismatch {
        expected: "numeric".into(),
        actual: v.type_name().into(),
        where_: format!("{function} array element"),
    })
}

fn flatten(values: &[Value], depth: u32) -> Vec<Value> {
    if depth == 0 {
        return values.to_vec();
    }
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        match v {
            Value::Array(inner) => out.extend(flatten(inner, depth - 1)),
            other => out.push(other.clone()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionLibrary;

    fn arr(nums: &[i64]) -> Value {
        Value::Array(nums.iter().map(|n| Value::decimal(Decimal::from_i64(*n))).collect())
    }

    #[test]
    fn sum_and_avg() {
        let lib = FunctionLibrary::new();
        let a = arr(&[1, 2, 3]);
        assert_eq!(lib.call("SUM", std::slice::from_ref(&a)).unwrap(), Value::decimal(Decimal::from_i64(6)));
        assert_eq!(lib.call("AVG", &[a]).unwrap(), Value::decimal(Decimal::from_i64(2)));
    }

    #[test]
    fn indexof_returns_negative_one_when_missing() {
        let lib = FunctionLibrary::new();
        let a = arr(&[1, 2, 3]);
        let result = lib.call("INDEXOF", &[a, Value::decimal(Decimal::from_i64(9))]).unwrap();
        assert_eq!(result, Value::decimal(Decimal::from_i64(-1)));
    }

    #[test]
    fn flatten_respects_depth() {
        let lib = FunctionLibrary::new();
        let nested = Value::Array(vec![
            Value::decimal(Decimal::from_i64(1)),
            Value::Array(vec![Value::decimal(Decimal::from_i64(2)), Value::Array(vec![Value::decimal(Decimal::from_i64(3))])]),
        ]);
        let one = lib.call("FLATTEN", &[nested.clone()]).unwrap();
        assert_eq!(
            one,
            Value::Array(vec![
                Value::decimal(Decimal::from_i64(1)),
                Value::decimal(Decimal::from_i64(2)),
                Value::Array(vec![Value::decimal(Decimal::from_i64(3))]),
            ])
        );
        let two = lib.call("FLATTEN", &[nested, Value::decimal(Decimal::from_i64(2))]).unwrap();
        assert_eq!(
            two,
            Value::Array(vec![
                Value::decimal(Decimal::from_i64(1)),
                Value::decimal(Decimal::from_i64(2)),
                Value::decimal(Decimal::from_i64(3)),
            ])
        );
    }
}
