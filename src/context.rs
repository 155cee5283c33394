//! Runtime variable bindings an expression is evaluated against.
//!
//! Two separate namespaces, mirroring the two sigils the lexer recognizes:
//! `$name` reads `variables` (the evaluation inputs/outputs a caller is
//! expected to supply and a batch run threads between formulas) and `@name`
//! reads `extra` (ambient context the dependency extractor deliberately
//! ignores, e.g. the current date or tenant id). Strict mode turns an
//! unresolved `$name` into `Error::UndefinedVariable`; lenient mode resolves
//! it to `Value::Null`.

use indexmap::IndexMap;

use crate::ast::VariablePrefix;
use crate::error::{Error, Result};
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct EvaluationContext {
    variables: IndexMap<String, Value>,
    extra: IndexMap<String, Value>,
    strict: bool,
    /// Variable names actually read during the last evaluation that used
    /// this context, tracked for `EvalResult::accessed_vars`.
    accessed: Vec<String>,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationContext {
    pub fn new() -> Self {
        EvaluationContext {
            variables: IndexMap::new(),
            extra: IndexMap::new(),
            strict: true,
            accessed: Vec::new(),
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// In-place equivalent of `with_strict`, for wiring `EngineConfig::strict_mode`
    /// into a context the engine already owns (e.g. a batch's working copy).
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn set_extra(&mut self, name: impl Into<String>, value: Value) {
        self.extra.insert(name.into(), value);
    }

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Names read via `resolve` since the last `take_accessed` call, in
    /// first-access order with duplicates removed.
    pub fn take_accessed(&mut self) -> Vec<String> {
        std::mem::take(&mut self.accessed)
    }

    /// Resolve a `$name`/`@name` reference, recording the access for
    /// `$name` lookups (the ones dependency extraction and batch telemetry
    /// care about). `$name` values are auto-promoted to Decimal on read
    /// per spec; `@name` values are returned as stored.
    pub fn resolve(&mut self, prefix: VariablePrefix, name: &str) -> Result<Value> {
        match prefix {
            VariablePrefix::Dollar => {
                if !self.accessed.iter().any(|a| a == name) {
                    self.accessed.push(name.to_string());
                }
                match self.variables.get(name) {
                    Some(v) => Ok(v.clone().auto_decimal()),
                    None if self.strict => Err(Error::UndefinedVariable(name.to_string())),
                    None => Ok(Value::Null),
                }
            }
            VariablePrefix::At => match self.extra.get(name) {
                Some(v) => Ok(v.clone()),
                None if self.strict => Err(Error::UndefinedVariable(format!("@{name}"))),
                None => Ok(Value::Null),
            },
        }
    }

    /// A private working copy for a single formula evaluation: same
    /// variables and extras, empty access log. Mutations the evaluator
    /// makes to `it`-style scratch bindings never leak back into the
    /// caller's context.
    pub fn fork(&self) -> Self {
        EvaluationContext {
            variables: self.variables.clone(),
            extra: self.extra.clone(),
            strict: self.strict,
            accessed: Vec::new(),
        }
    }

    /// A child scope for FILTER/MAP: inherits everything, binds `it` to the
    /// current iteration element. Also sets `@_currentItem` for library
    /// hooks (native functions that want the raw element without relying on
    /// the `$`-variable namespace). Shadows any caller-supplied `$it`.
    pub fn with_iteration_var(&self, name: &str, value: Value) -> Self {
        let mut child = self.fork();
        child.variables.insert(name.to_string(), value.clone());
        child.extra.insert("_currentItem".to_string(), value);
        child
    }

    /// Promotes every primitive numeric `$`-variable (including nested
    /// inside arrays/objects) to Decimal in place. A one-time pass at batch
    /// entry when `DecimalConfig::auto_convert_floats` is enabled.
    pub fn convert_floats_to_decimal(&mut self) {
        for value in self.variables.values_mut() {
            let taken = std::mem::replace(value, Value::Null);
            *value = taken.auto_decimal_deep();
        }
    }

    /// Folds `other`'s accessed-variable log into `self`'s, deduped. Used
    /// after running a child (iteration/fork) context so accessed-variable
    /// reporting reflects everything a formula touched, not just its
    /// top-level reads.
    pub(crate) fn merge_accessed(&mut self, other: &mut EvaluationContext) {
        for name in other.take_accessed() {
            if !self.accessed.iter().any(|a| a == &name) {
                self.accessed.push(name);
            }
        }
    }
}
