#![allow(dead_code)]

use formula_engine::{Decimal, Engine, EngineConfig, EvaluationContext, Value};

pub fn engine() -> Engine {
    Engine::new(EngineConfig::default())
}

pub fn ctx_with(vars: &[(&str, Value)]) -> EvaluationContext {
    let mut ctx = EvaluationContext::new();
    for (name, value) in vars {
        ctx.set_variable(*name, value.clone());
    }
    ctx
}

pub fn dec(text: &str) -> Value {
    Value::decimal(Decimal::from_text(text).expect("valid decimal literal in test fixture"))
}

pub fn row(pairs: &[(&str, Value)]) -> Value {
    let mut map = indexmap::IndexMap::new();
    for (key, value) in pairs {
        map.insert(key.to_string(), value.clone());
    }
    Value::Object(map)
}
