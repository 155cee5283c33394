//! Table-lookup builtins: `LOOKUP`, `RANGE`.
//!
//! Both intentionally return Decimal zero on no-match rather than raising
//! (spec §7, §9(b)) — they're used as cascading defaults in pricing tables.
//! Shape errors (criteria not an object, table not an array) still raise.

use indexmap::IndexMap;

use super::{object_arg, values_equal, FunctionSpec};
use crate::decimal::Decimal;
use crate::error::Error;
use crate::value::Value;

pub(super) fn install(table: &mut IndexMap<String, FunctionSpec>) {
    super::insert(table, "LOOKUP", 3, Some(3), |args| {
        let rows = match &args[0] {
            Value::Array(rows) => rows,
            Value::Null => return Ok(Value::decimal(Decimal::ZERO)),
            other => {
                return Err(Error::TypeMismatch {
                    expected: "array".into(),
                    actual: other.type_name().into(),
                    where_: "LOOKUP table argument".into(),
                })
            }
        };
        let criteria = object_arg(args, 1, "LOOKUP")?;
        let return_field = match &args[2] {
            Value::String(s) => s.as_str(),
            other => {
                return Err(Error::TypeMismatch {
                    expected: "string".into(),
                    actual: other.type_name().into(),
                    where_: "LOOKUP returnField argument".into(),
                })
            }
        };

        for row in rows {
            let Value::Object(fields) = row else { continue };
            let matches = criteria.iter().all(|(key, want)| {
                fields.get(key).is_some_and(|have| values_equal(have, want))
            });
            if matches {
                return Ok(fields
                    .get(return_field)
                    .cloned()
                    .unwrap_or(Value::decimal(Decimal::ZERO))
                    .auto_decimal());
            }
        }
        Ok(Value::decimal(Decimal::ZERO))
    });

    super::insert(table, "RANGE", 5, Some(5), |args| {
        let rows = match &args[0] {
            Value::Array(rows) => rows,
            Value::Null => return Ok(Value::decimal(Decimal::ZERO)),
            other => {
                return Err(Error::TypeMismatch {
                    expected: "array".into(),
                    actual: other.type_name().into(),
                    where_: "RANGE table argument".into(),
                })
            }
        };
        let probe = args[1].to_decimal().map_err(|_| Error::TypeMismatch {
            expected: "numeric".into(),
            actual: args[1].type_name().into(),
            where_: "RANGE value argument".into(),
        })?;
        let min_field = field_name(args, 2, "minField")?;
        let max_field = field_name(args, 3, "maxField")?;
        let return_field = field_name(args, 4, "returnField")?;

        for row in rows {
            let Value::Object(fields) = row else { continue };
            let Some(min) = fields.get(min_field).and_then(|v| v.to_decimal().ok()) else {
                continue;
            };
            let max = fields
                .get(max_field)
                .filter(|v| !matches!(v, Value::Null))
                .and_then(|v| v.to_decimal().ok());
            let in_range = probe >= min && max.map(|max| probe < max).unwrap_or(true);
            if in_range {
                return Ok(fields
                    .get(return_field)
                    .cloned()
                    .unwrap_or(Value::decimal(Decimal::ZERO))
                    .auto_decimal());
            }
        }
        Ok(Value::decimal(Decimal::ZERO))
    });
}

fn field_name<'a>(args: &'a [Value], i: usize, label: &str) -> crate::error::Result<&'a str> {
    match &args[i] {
        Value::String(s) => Ok(s.as_str()),
        other => Err(Error::TypeMismatch {
            expected: "string".into(),
            actual: other.type_name().into(),
            where_: format!("RANGE {label} argument"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FunctionLibrary;
    use indexmap::IndexMap as Map;

    fn row(pairs: &[(&str, Value)]) -> Value {
        let mut m = Map::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v.clone());
        }
        Value::Object(m)
    }

    #[test]
    fn lookup_matches_s3_scenario() {
        let lib = FunctionLibrary::new();
        let table = Value::Array(vec![
            row(&[("region", Value::string("US")), ("category", Value::string("food")), ("rate", Value::decimal(Decimal::from_text("0.02").unwrap()))]),
            row(&[("region", Value::string("EU")), ("category", Value::string("food")), ("rate", Value::decimal(Decimal::from_text("0.10").unwrap()))]),
        ]);
        let criteria = row(&[("region", Value::string("EU")), ("category", Value::string("food"))]);
        let result = lib.call("LOOKUP", &[table.clone(), criteria, Value::string("rate")]).unwrap();
        assert_eq!(result, Value::decimal(Decimal::from_text("0.10").unwrap()));

        let no_match = row(&[("region", Value::string("JP")), ("category", Value::string("food"))]);
        let result = lib.call("LOOKUP", &[table, no_match, Value::string("rate")]).unwrap();
        assert_eq!(result, Value::decimal(Decimal::ZERO));
    }

    #[test]
    fn range_matches_s4_scenario() {
        let lib = FunctionLibrary::new();
        let tiers = Value::Array(vec![
            row(&[("min", Value::decimal(Decimal::from_i64(0))), ("max", Value::decimal(Decimal::from_i64(1000))), ("rate", Value::decimal(Decimal::from_text("0.10").unwrap()))]),
            row(&[("min", Value::decimal(Decimal::from_i64(1000))), ("max", Value::decimal(Decimal::from_i64(5000))), ("rate", Value::decimal(Decimal::from_text("0.15").unwrap()))]),
            row(&[("min", Value::decimal(Decimal::from_i64(5000))), ("max", Value::Null), ("rate", Value::decimal(Decimal::from_text("0.20").unwrap()))]),
        ]);

        let at_1000 = lib
            .call("RANGE", &[tiers.clone(), Value::decimal(Decimal::from_i64(1000)), Value::string("min"), Value::string("max"), Value::string("rate")])
            .unwrap();
        assert_eq!(at_1000, Value::decimal(Decimal::from_text("0.15").unwrap()));

        let at_5000 = lib
            .call("RANGE", &[tiers.clone(), Value::decimal(Decimal::from_i64(5000)), Value::string("min"), Value::string("max"), Value::string("rate")])
            .unwrap();
        assert_eq!(at_5000, Value::decimal(Decimal::from_text("0.20").unwrap()));

        let below_zero = lib
            .call("RANGE", &[tiers, Value::decimal(Decimal::from_i64(-5)), Value::string("min"), Value::string("max"), Value::string("rate")])
            .unwrap();
        assert_eq!(below_zero, Value::decimal(Decimal::ZERO));
    }
}
