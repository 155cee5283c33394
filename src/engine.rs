//! Public façade wiring the cache, dependency graph, evaluator, and function
//! library together into the operations a caller actually drives.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::ast::Ast;
use crate::cache::{AstCache, CacheStats};
use crate::config::EngineConfig;
use crate::context::EvaluationContext;
use crate::decimal::Decimal;
use crate::dependency::extract_dependencies;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::formula::{BatchResult, EvalResult, FormulaDefinition, OnErrorPolicy, ValidationReport};
use crate::functions::{FunctionLibrary, NativeFn};
use crate::graph::DependencyGraph;
use crate::parser::parse_with_sigils;
use crate::value::Value;

/// Extra knobs for `evaluate_all` beyond what's on each `FormulaDefinition`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// When true, a successful formula's raw (unrounded) value is written
    /// back into the working context instead of its rounded display value,
    /// so downstream formulas see full precision. Default (false) matches
    /// spec §9's "rounding happens before injection" rule.
    pub disable_intermediate_rounding: bool,
}

pub struct Engine {
    config: EngineConfig,
    cache: AstCache,
    functions: FunctionLibrary,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            cache: AstCache::new(config.max_cache_size),
            functions: FunctionLibrary::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        func: NativeFn,
    ) -> Result<()> {
        self.functions.register(name, min_args, max_args, func)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn parse(&mut self, expression: &str) -> Result<Ast> {
        self.parse_and_cache(expression).map(|(ast, _)| ast)
    }

    pub fn extract_dependencies(&mut self, expression: &str) -> Result<HashSet<String>> {
        self.parse_and_cache(expression).map(|(_, deps)| deps)
    }

    fn parse_and_cache(&mut self, expression: &str) -> Result<(Ast, HashSet<String>)> {
        if expression.len() > self.config.security.max_expression_length {
            return Err(Error::MaxExpressionLength {
                limit: self.config.security.max_expression_length,
            });
        }
        if self.config.enable_cache {
            if let Some(hit) = self.cache.get(expression) {
                return Ok(hit);
            }
        }
        let ast = parse_with_sigils(expression, self.config.variable_prefix, self.config.context_prefix)?;
        let deps = extract_dependencies(&ast);
        if self.config.enable_cache {
            self.cache.insert(expression.to_string(), ast.clone(), deps.clone());
        }
        Ok((ast, deps))
    }

    /// Build the dependency graph for a batch of formulas. `explicit_deps`
    /// on a definition overrides extraction; both are filtered to ids that
    /// are themselves formulas in `formulas` so a reference to an external
    /// `$`-variable never creates a dangling graph node.
    pub fn build_dependency_graph(&mut self, formulas: &[FormulaDefinition]) -> Result<DependencyGraph> {
        let ids: HashSet<&str> = formulas.iter().map(|f| f.id.as_str()).collect();
        let mut graph = DependencyGraph::new();
        for formula in formulas {
            graph.add_node(&formula.id);
            let deps: Vec<String> = match &formula.explicit_deps {
                Some(explicit) => explicit.clone(),
                None => {
                    let extracted = self.extract_dependencies(&formula.expression)?;
                    extracted.into_iter().collect()
                }
            };
            for dep in deps {
                if ids.contains(dep.as_str()) {
                    graph.add_edge(&formula.id, &dep);
                }
            }
        }
        Ok(graph)
    }

    pub fn get_evaluation_order(&mut self, formulas: &[FormulaDefinition]) -> Result<Vec<String>> {
        let graph = self.build_dependency_graph(formulas)?;
        graph.topological_sort()
    }

    /// Evaluate a single expression string against `ctx`, with no formula
    /// id, rounding policy, or error policy involved.
    pub fn evaluate(&mut self, expression: &str, ctx: &mut EvaluationContext) -> Result<Value> {
        ctx.set_strict(self.config.strict_mode);
        let (ast, _deps) = self.parse_and_cache(expression)?;
        let evaluator = Evaluator::new(&self.functions, &self.config.decimal, &self.config.security);
        evaluator.evaluate(&ast, ctx)
    }

    /// Validate a batch without evaluating: every expression parses, every
    /// referenced formula id resolves, and the dependency graph is acyclic.
    /// Unknown `explicit_deps` entries that aren't other formula ids and
    /// aren't `$`-variables available in `ctx` are reported as warnings, not
    /// hard errors, since they may be batch-external inputs.
    pub fn validate(&mut self, formulas: &[FormulaDefinition], ctx: &EvaluationContext) -> ValidationReport {
        let mut errors = Vec::new();
        let mut seen_ids = HashSet::new();
        for formula in formulas {
            if !seen_ids.insert(formula.id.clone()) {
                errors.push(Error::DuplicateFormula(formula.id.clone()));
            }
            if let Err(e) = self.parse_and_cache(&formula.expression) {
                errors.push(e);
            }
        }

        let mut warnings = Vec::new();
        if errors.is_empty() {
            for formula in formulas {
                if let Ok(deps) = self.extract_dependencies(&formula.expression) {
                    let known_ids: HashSet<&str> = formulas.iter().map(|f| f.id.as_str()).collect();
                    for dep in deps {
                        if !known_ids.contains(dep.as_str()) && ctx.get_variable(&dep).is_none() {
                            warnings.push(format!("formula {:?} references unresolved variable {dep:?}", formula.id));
                        }
                    }
                }
            }
        }

        let order = if errors.is_empty() {
            match self.get_evaluation_order(formulas) {
                Ok(order) => order,
                Err(e) => {
                    errors.push(e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            order,
        }
    }

    /// Evaluate every formula in dependency order, threading each result
    /// back into a private working context so later formulas see earlier
    /// ones' values under their own id (spec §4.6). A formula whose
    /// `on_error` policy is `Throw` (the default) aborts the whole batch on
    /// failure; every other policy substitutes a value and continues.
    pub fn evaluate_all(
        &mut self,
        formulas: &[FormulaDefinition],
        ctx: &EvaluationContext,
        options: BatchOptions,
    ) -> Result<BatchResult> {
        let batch_start = Instant::now();
        let mut seen_ids = HashSet::new();
        for formula in formulas {
            if !seen_ids.insert(formula.id.as_str()) {
                return Err(Error::DuplicateFormula(formula.id.clone()));
            }
        }
        let order = self.get_evaluation_order(formulas)?;
        let by_id: HashMap<&str, &FormulaDefinition> = formulas.iter().map(|f| (f.id.as_str(), f)).collect();

        let mut working = ctx.fork();
        working.set_strict(self.config.strict_mode);
        if self.config.decimal.auto_convert_floats {
            working.convert_floats_to_decimal();
        }
        let mut results: HashMap<String, EvalResult> = HashMap::new();
        let mut errors = Vec::new();

        for id in &order {
            let formula = by_id.get(id.as_str()).expect("order only contains known ids");
            let policy = formula.on_error.unwrap_or(self.config.default_error_behavior);
            let started = Instant::now();

            let (ast, _deps) = match self.parse_and_cache(&formula.expression) {
                Ok(v) => v,
                Err(e) => {
                    let elapsed = started.elapsed().as_secs_f64() * 1000.0;
                    if policy == OnErrorPolicy::Throw {
                        return Err(e);
                    }
                    errors.push(e.clone());
                    let value = substitute_on_error(policy, formula);
                    if let Some(v) = &value {
                        working.set_variable(id.clone(), v.clone());
                    }
                    results.insert(id.clone(), EvalResult::failed(e, elapsed, Vec::new()));
                    continue;
                }
            };

            let mut scoped = working.fork();
            let evaluator = Evaluator::new(&self.functions, &self.config.decimal, &self.config.security);
            let outcome = evaluator.evaluate(&ast, &mut scoped);
            let accessed = scoped.take_accessed();
            let elapsed = started.elapsed().as_secs_f64() * 1000.0;

            match outcome {
                Ok(value) => {
                    let rounded = apply_rounding(value.clone(), formula, &self.config, options);
                    working.set_variable(id.clone(), rounded.clone());
                    results.insert(id.clone(), EvalResult::ok(rounded, elapsed, accessed));
                }
                Err(e) => {
                    if policy == OnErrorPolicy::Throw {
                        return Err(e);
                    }
                    errors.push(e.clone());
                    let value = substitute_on_error(policy, formula);
                    if let Some(v) = &value {
                        working.set_variable(id.clone(), v.clone());
                    }
                    results.insert(id.clone(), EvalResult::failed(e, elapsed, accessed));
                }
            }
        }

        Ok(BatchResult {
            results,
            evaluation_order: order,
            success: errors.is_empty(),
            errors,
            total_elapsed_ms: batch_start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

/// `Skip` leaves the working context untouched (no `$id` binding at all);
/// every other non-`Throw` policy injects a concrete substitute value.
fn substitute_on_error(policy: OnErrorPolicy, formula: &FormulaDefinition) -> Option<Value> {
    match policy {
        OnErrorPolicy::Throw => unreachable!("Throw aborts before reaching substitution"),
        OnErrorPolicy::Null => Some(Value::Null),
        OnErrorPolicy::Zero => Some(Value::decimal(Decimal::ZERO)),
        OnErrorPolicy::Default => Some(formula.default_value.clone().unwrap_or(Value::Null)),
        OnErrorPolicy::Skip => None,
    }
}

/// Rounding is applied here, before the value is written into the working
/// context, so downstream formulas read the rounded figure (spec §9,
/// testable property 9) unless the caller opted out via `BatchOptions`.
fn apply_rounding(value: Value, formula: &FormulaDefinition, config: &EngineConfig, options: BatchOptions) -> Value {
    if options.disable_intermediate_rounding {
        return value;
    }
    let spec = formula.rounding.unwrap_or(crate::formula::RoundingSpec {
        mode: config.default_rounding.mode,
        precision: config.default_rounding.precision,
    });
    if matches!(spec.mode, crate::decimal::RoundingMode::None) {
        return value;
    }
    match value {
        Value::Decimal(d) => Value::Decimal(d.round(spec.precision, spec.mode)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, expr: &str) -> FormulaDefinition {
        FormulaDefinition::new(id, expr)
    }

    #[test]
    fn cascading_invoice_matches_s1_scenario() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut ctx = EvaluationContext::new();
        ctx.set_variable("unit_price", Value::decimal(Decimal::from_text("19.99").unwrap()));
        ctx.set_variable("quantity", Value::decimal(Decimal::from_i64(3)));
        ctx.set_variable("tax_rate", Value::decimal(Decimal::from_text("0.08").unwrap()));

        let formulas = vec![
            def("subtotal", "$unit_price * $quantity"),
            def("tax", "$subtotal * $tax_rate"),
            def("total", "$subtotal + $tax"),
        ];

        let result = engine.evaluate_all(&formulas, &ctx, BatchOptions::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.evaluation_order, vec!["subtotal", "tax", "total"]);
        assert_eq!(
            result.results["subtotal"].value,
            Value::decimal(Decimal::from_text("59.97").unwrap())
        );
    }

    #[test]
    fn circular_dependency_is_reported_as_s2_scenario() {
        let mut engine = Engine::new(EngineConfig::default());
        let formulas = vec![def("a", "$b + 1"), def("b", "$a + 1")];
        let err = engine.get_evaluation_order(&formulas).unwrap_err();
        assert!(matches!(err, Error::CircularDependency { .. }));
    }

    #[test]
    fn on_error_zero_policy_substitutes_and_continues_s6_scenario() {
        let mut engine = Engine::new(EngineConfig::default());
        let ctx = EvaluationContext::new();
        let mut failing = def("risky", "1 / 0");
        failing.on_error = Some(OnErrorPolicy::Zero);
        let formulas = vec![failing, def("downstream", "$risky + 1")];

        let result = engine.evaluate_all(&formulas, &ctx, BatchOptions::default()).unwrap();
        assert!(!result.success);
        assert_eq!(result.results["risky"].value, Value::decimal(Decimal::ZERO));
        assert_eq!(result.results["downstream"].value, Value::decimal(Decimal::ONE));
    }

    #[test]
    fn on_error_throw_aborts_the_batch() {
        let mut engine = Engine::new(EngineConfig::default());
        let ctx = EvaluationContext::new();
        let formulas = vec![def("broken", "1 / 0")];
        assert!(engine.evaluate_all(&formulas, &ctx, BatchOptions::default()).is_err());
    }

    #[test]
    fn rounding_applies_before_value_is_reused_downstream() {
        let mut engine = Engine::new(EngineConfig::default());
        let ctx = EvaluationContext::new();
        let mut rounded = def("price", "10 / 3");
        rounded.rounding = Some(crate::formula::RoundingSpec {
            mode: crate::decimal::RoundingMode::HalfUp,
            precision: 2,
        });
        let formulas = vec![rounded, def("doubled", "$price * 2")];
        let result = engine.evaluate_all(&formulas, &ctx, BatchOptions::default()).unwrap();
        assert_eq!(result.results["price"].value, Value::decimal(Decimal::from_text("3.33").unwrap()));
        assert_eq!(result.results["doubled"].value, Value::decimal(Decimal::from_text("6.66").unwrap()));
    }

    #[test]
    fn validate_flags_duplicate_formula_ids() {
        let mut engine = Engine::new(EngineConfig::default());
        let ctx = EvaluationContext::new();
        let formulas = vec![def("a", "1"), def("a", "2")];
        let report = engine.validate(&formulas, &ctx);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| matches!(e, Error::DuplicateFormula(_))));
    }

    #[test]
    fn evaluate_all_rejects_duplicate_formula_ids() {
        let mut engine = Engine::new(EngineConfig::default());
        let ctx = EvaluationContext::new();
        let formulas = vec![def("a", "1"), def("a", "2")];
        let err = engine.evaluate_all(&formulas, &ctx, BatchOptions::default()).unwrap_err();
        assert!(matches!(err, Error::DuplicateFormula(id) if id == "a"));
    }

    #[test]
    fn strict_mode_false_resolves_missing_variable_to_null_in_a_batch() {
        let mut config = EngineConfig::default();
        config.strict_mode = false;
        let mut engine = Engine::new(config);
        let ctx = EvaluationContext::new();
        let formulas = vec![def("a", "$missing")];
        let result = engine.evaluate_all(&formulas, &ctx, BatchOptions::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.results["a"].value, Value::Null);
    }

    #[test]
    fn auto_convert_floats_promotes_nested_variables_before_a_batch_runs() {
        // Plain variable resolution only auto-promotes the top-level value
        // (see `EvaluationContext::resolve`); returning `$rows` whole only
        // shows Decimal elements if the batch-entry walk converted them.
        let mut engine = Engine::new(EngineConfig::default());
        let mut ctx = EvaluationContext::new();
        ctx.set_variable("rows", Value::Array(vec![Value::Float(1.5)]));
        let formulas = vec![def("copy", "$rows")];
        let result = engine.evaluate_all(&formulas, &ctx, BatchOptions::default()).unwrap();
        assert_eq!(
            result.results["copy"].value,
            Value::Array(vec![Value::decimal(Decimal::from_f64(1.5).unwrap())])
        );
    }
}
