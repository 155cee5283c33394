//! Named formula definitions and evaluation result envelopes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::decimal::RoundingMode;
use crate::value::Value;

/// What to substitute for a formula's value when it fails during batch
/// evaluation. `Throw` is the only policy that aborts the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnErrorPolicy {
    Throw,
    Null,
    Zero,
    Default,
    Skip,
}

/// Per-formula rounding override; `precision` is digits after the point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundingSpec {
    pub mode: RoundingMode,
    pub precision: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaDefinition {
    pub id: String,
    pub expression: String,
    /// Overrides dependency extraction when present; used as-is, still
    /// filtered to ids that are formulas in the batch.
    pub explicit_deps: Option<Vec<String>>,
    pub on_error: Option<OnErrorPolicy>,
    pub default_value: Option<Value>,
    pub rounding: Option<RoundingSpec>,
    pub metadata: HashMap<String, Value>,
}

impl Default for FormulaDefinition {
    fn default() -> Self {
        FormulaDefinition {
            id: String::new(),
            expression: String::new(),
            explicit_deps: None,
            on_error: None,
            default_value: None,
            rounding: None,
            metadata: HashMap::new(),
        }
    }
}

impl FormulaDefinition {
    pub fn new(id: impl Into<String>, expression: impl Into<String>) -> Self {
        FormulaDefinition {
            id: id.into(),
            expression: expression.into(),
            ..Default::default()
        }
    }
}

/// Result of one `evaluate` call, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct EvalResult {
    pub value: Value,
    pub success: bool,
    pub error: Option<crate::error::Error>,
    pub elapsed_ms: f64,
    pub accessed_vars: Vec<String>,
}

impl EvalResult {
    pub fn ok(value: Value, elapsed_ms: f64, accessed_vars: Vec<String>) -> Self {
        EvalResult {
            value,
            success: true,
            error: None,
            elapsed_ms,
            accessed_vars,
        }
    }

    pub fn failed(error: crate::error::Error, elapsed_ms: f64, accessed_vars: Vec<String>) -> Self {
        EvalResult {
            value: Value::Null,
            success: false,
            error: Some(error),
            elapsed_ms,
            accessed_vars,
        }
    }
}

/// Result of `evaluate_all`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub results: HashMap<String, EvalResult>,
    pub evaluation_order: Vec<String>,
    pub errors: Vec<crate::error::Error>,
    pub success: bool,
    pub total_elapsed_ms: f64,
}

/// Result of `validate`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<crate::error::Error>,
    pub warnings: Vec<String>,
    pub order: Vec<String>,
}
