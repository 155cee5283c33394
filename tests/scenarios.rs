//! End-to-end scenarios, run through the `Engine` façade rather than any
//! individual pipeline stage.

use formula_engine::{BatchOptions, Error, FormulaDefinition, OnErrorPolicy, Value};

mod test_support;
use test_support::{ctx_with, dec, engine, row};

#[test]
fn s1_cascading_invoice() {
    let mut engine = engine();
    let ctx = ctx_with(&[
        ("unitPrice", dec("100")),
        ("quantity", dec("5")),
        ("discountRate", dec("0.1")),
        ("taxRate", dec("0.2")),
    ]);
    let formulas = vec![
        FormulaDefinition::new("gross", "$unitPrice * $quantity"),
        FormulaDefinition::new("discount", "$gross * $discountRate"),
        FormulaDefinition::new("net", "$gross - $discount"),
        FormulaDefinition::new("tax", "$net * $taxRate"),
        FormulaDefinition::new("total", "$net + $tax"),
    ];

    let result = engine.evaluate_all(&formulas, &ctx, BatchOptions::default()).unwrap();
    assert!(result.success);
    assert_eq!(result.evaluation_order, vec!["gross", "discount", "net", "tax", "total"]);
    assert_eq!(result.results["gross"].value, dec("500"));
    assert_eq!(result.results["discount"].value, dec("50"));
    assert_eq!(result.results["net"].value, dec("450"));
    assert_eq!(result.results["tax"].value, dec("90"));
    assert_eq!(result.results["total"].value, dec("540"));
}

#[test]
fn s2_cycle() {
    let mut engine = engine();
    let ctx = ctx_with(&[]);
    let formulas = vec![
        FormulaDefinition::new("a", "$b + 1"),
        FormulaDefinition::new("b", "$c + 1"),
        FormulaDefinition::new("c", "$a + 1"),
    ];

    let err = engine.evaluate_all(&formulas, &ctx, BatchOptions::default()).unwrap_err();
    assert!(matches!(err, Error::CircularDependency { .. }));
}

#[test]
fn s3_lookup_table() {
    let mut engine = engine();
    let table = Value::Array(vec![
        row(&[("region", Value::string("US")), ("category", Value::string("food")), ("rate", dec("0.02"))]),
        row(&[("region", Value::string("EU")), ("category", Value::string("food")), ("rate", dec("0.10"))]),
    ]);
    let ctx = ctx_with(&[
        ("table", table),
        ("criteria", row(&[("region", Value::string("EU")), ("category", Value::string("food"))])),
    ]);
    let mut result = engine.evaluate(r#"LOOKUP($table, $criteria, "rate")"#, &mut ctx.clone()).unwrap();
    assert_eq!(result, dec("0.10"));

    let mut ctx2 = ctx.clone();
    ctx2.set_variable("criteria", row(&[("region", Value::string("JP")), ("category", Value::string("food"))]));
    result = engine.evaluate(r#"LOOKUP($table, $criteria, "rate")"#, &mut ctx2).unwrap();
    assert_eq!(result, dec("0"));
}

#[test]
fn s4_range_tiers() {
    let mut engine = engine();
    let tiers = Value::Array(vec![
        row(&[("min", dec("0")), ("max", dec("1000")), ("rate", dec("0.10"))]),
        row(&[("min", dec("1000")), ("max", dec("5000")), ("rate", dec("0.15"))]),
        row(&[("min", dec("5000")), ("max", Value::Null), ("rate", dec("0.20"))]),
    ]);
    let mut ctx = ctx_with(&[("tiers", tiers)]);

    ctx.set_variable("value", dec("1000"));
    assert_eq!(
        engine.evaluate(r#"RANGE($tiers, $value, "min", "max", "rate")"#, &mut ctx).unwrap(),
        dec("0.15")
    );

    ctx.set_variable("value", dec("5000"));
    assert_eq!(
        engine.evaluate(r#"RANGE($tiers, $value, "min", "max", "rate")"#, &mut ctx).unwrap(),
        dec("0.20")
    );

    ctx.set_variable("value", dec("-5"));
    assert_eq!(
        engine.evaluate(r#"RANGE($tiers, $value, "min", "max", "rate")"#, &mut ctx).unwrap(),
        dec("0")
    );
}

#[test]
fn s5_ternary_and_nested_access() {
    let mut engine = engine();
    let mut ctx = ctx_with(&[("score", dec("85"))]);
    let result = engine
        .evaluate(r#"$score>=90?"A":($score>=80?"B":"C")"#, &mut ctx)
        .unwrap();
    assert_eq!(result, Value::string("B"));

    let mut ctx2 = ctx_with(&[(
        "customer",
        row(&[("address", row(&[("city", Value::string("NY"))]))]),
    )]);
    assert_eq!(
        engine.evaluate("$customer.address.city", &mut ctx2).unwrap(),
        Value::string("NY")
    );
}

#[test]
fn s6_error_policy() {
    let mut engine = engine();
    let ctx = ctx_with(&[("a", dec("10")), ("b", dec("0"))]);
    let mut ratio = FormulaDefinition::new("ratio", "$a / $b");
    ratio.on_error = Some(OnErrorPolicy::Zero);
    let formulas = vec![ratio, FormulaDefinition::new("x", "$ratio * 100")];

    let result = engine.evaluate_all(&formulas, &ctx, BatchOptions::default()).unwrap();
    assert!(!result.success);
    assert_eq!(result.results["ratio"].value, dec("0"));
    assert_eq!(result.results["x"].value, dec("0"));
    assert!(result.errors.iter().any(|e| matches!(e, Error::DivisionByZero)));
}
