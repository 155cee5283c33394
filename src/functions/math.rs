//! Numeric builtins: `ABS`, `ROUND`, `FLOOR`, `CEIL`, `TRUNCATE`, `MIN`,
//! `MAX`, `POW`, `SQRT`, `LOG`, `LOG10`, `SIGN`, `DECIMAL`, `SCALE`,
//! `PRECISION`, `DIVIDE`.

use indexmap::IndexMap;

use super::{decimal_arg, insert, FunctionSpec};
use crate::decimal::{Decimal, RoundingMode};
use crate::error::Error;
use crate::value::Value;

pub(super) fn install(table: &mut IndexMap<String, FunctionSpec>) {
    insert(table, "ABS", 1, Some(1), |args| {
        Ok(Value::decimal(decimal_arg(args, 0, "ABS")?.abs()))
    });

    insert(table, "ROUND", 1, Some(2), |args| {
        let value = decimal_arg(args, 0, "ROUND")?;
        let scale = optional_scale(args, 1, "ROUND")?;
        Ok(Value::decimal(value.round(scale, RoundingMode::HalfUp)))
    });

    insert(table, "FLOOR", 1, Some(2), |args| {
        let value = decimal_arg(args, 0, "FLOOR")?;
        let scale = optional_scale(args, 1, "FLOOR")?;
        Ok(Value::decimal(value.floor_to(scale)))
    });

    insert(table, "CEIL", 1, Some(2), |args| {
        let value = decimal_arg(args, 0, "CEIL")?;
        let scale = optional_scale(args, 1, "CEIL")?;
        Ok(Value::decimal(value.ceil_to(scale)))
    });

    insert(table, "TRUNCATE", 1, Some(2), |args| {
        let value = decimal_arg(args, 0, "TRUNCATE")?;
        let scale = optional_scale(args, 1, "TRUNCATE")?;
        Ok(Value::decimal(value.truncate_to(scale)))
    });

    insert(table, "MIN", 1, None, |args| reduce_extreme(args, "MIN", true));
    insert(table, "MAX", 1, None, |args| reduce_extreme(args, "MAX", false));

    insert(table, "POW", 2, Some(2), |args| {
        let base = decimal_arg(args, 0, "POW")?;
        let exp = decimal_arg(args, 1, "POW")?;
        Ok(Value::decimal(base.pow(exp)?))
    });

    insert(table, "SQRT", 1, Some(1), |args| {
        Ok(Value::decimal(decimal_arg(args, 0, "SQRT")?.sqrt()?))
    });

    insert(table, "LOG", 1, Some(1), |args| {
        Ok(Value::decimal(decimal_arg(args, 0, "LOG")?.ln()?))
    });

    insert(table, "LOG10", 1, Some(1), |args| {
        Ok(Value::decimal(decimal_arg(args, 0, "LOG10")?.log10()?))
    });

    insert(table, "SIGN", 1, Some(1), |args| {
        Ok(Value::decimal(Decimal::from_i64(
            decimal_arg(args, 0, "SIGN")?.sign() as i64,
        )))
    });

    insert(table, "DECIMAL", 1, Some(2), |args| {
        let value = match &args[0] {
            Value::String(s) => Decimal::from_text(s).map_err(Error::from)?,
            other => other.to_decimal()?,
        };
        match args.get(1) {
            Some(scale_arg) => {
                let scale = to_scale(scale_arg, "DECIMAL")?;
                Ok(Value::decimal(value.with_scale(scale)))
            }
            None => Ok(Value::decimal(value)),
        }
    });

    insert(table, "SCALE", 1, Some(1), |args| {
        Ok(Value::decimal(Decimal::from_i64(
            decimal_arg(args, 0, "SCALE")?.scale() as i64,
        )))
    });

    insert(table, "PRECISION", 1, Some(1), |args| {
        Ok(Value::decimal(Decimal::from_i64(
            decimal_arg(args, 0, "PRECISION")?.precision() as i64,
        )))
    });

    insert(table, "DIVIDE", 2, Some(4), |args| {
        let a = decimal_arg(args, 0, "DIVIDE")?;
        let b = decimal_arg(args, 1, "DIVIDE")?;
        let scale = optional_scale(args, 2, "DIVIDE")?;
        let mode = match args.get(3) {
            Some(Value::String(s)) => parse_rounding_mode(s)?,
            Some(other) => {
                return Err(Error::TypeMismatch {
                    expected: "string".into(),
                    actual: other.type_name().into(),
                    where_: "DIVIDE argument 3".into(),
                })
            }
            None => RoundingMode::HalfUp,
        };
        Ok(Value::decimal(a.div(b, scale, mode)?))
    });
}

fn optional_scale(args: &[Value], i: usize, function: &str) -> crate::error::Result<u32> {
    match args.get(i) {
        Some(v) => to_scale(v, function),
        None => Ok(0),
    }
}

fn to_scale(value: &Value, function: &str) -> crate::error::Result<u32> {
    let d = value.to_decimal().map_err(|_| Error::TypeMismatch {
        expected: "numeric".into(),
        actual: value.type_name().into(),
        where_: format!("{function} scale argument"),
    })?;
    Ok(d.to_f64().max(0.0).round() as u32)
}

fn reduce_extreme(args: &[Value], function: &str, want_min: bool) -> crate::error::Result<Value> {
    let values: Vec<Decimal> = if args.len() == 1 {
        match &args[0] {
            Value::Array(a) => a
                .iter()
                .map(|v| {
                    v.to_decimal().map_err(|_| Error::TypeMismatch {
                        expected: "numeric".into(),
                        actual: v.type_name().into(),
                        where_: format!("{function} array element"),
                    })
                })
                .collect::<crate::error::Result<_>>()?,
            single => vec![decimal_arg(std::slice::from_ref(single), 0, function)?],
        }
    } else {
        args.iter()
            .enumerate()
            .map(|(i, _)| decimal_arg(args, i, function))
            .collect::<crate::error::Result<_>>()?
    };

    values
        .into_iter()
        .reduce(|a, b| if want_min { a.min(b) } else { a.max(b) })
        .map(Value::decimal)
        .ok_or_else(|| Error::ArgumentCount {
            function: function.to_string(),
            min: 1,
            max: None,
            actual: 0,
        })
}

pub(crate) fn parse_rounding_mode(text: &str) -> crate::error::Result<RoundingMode> {
    match text.to_uppercase().as_str() {
        "CEIL" => Ok(RoundingMode::Ceil),
        "FLOOR" => Ok(RoundingMode::Floor),
        "DOWN" => Ok(RoundingMode::Down),
        "UP" => Ok(RoundingMode::Up),
        "HALF_UP" => Ok(RoundingMode::HalfUp),
        "HALF_DOWN" => Ok(RoundingMode::HalfDown),
        "HALF_EVEN" => Ok(RoundingMode::HalfEven),
        "HALF_ODD" => Ok(RoundingMode::HalfOdd),
        "NONE" => Ok(RoundingMode::None),
        other => Err(Error::ConfigurationError(format!("unknown rounding mode {other:?}"))),
    }
}
