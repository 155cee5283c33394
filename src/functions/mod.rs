//! Built-in function library and custom-function registration.
//!
//! Every function here is a plain `&[Value] -> Result<Value>` — the three
//! AST-consuming forms (`SUM`'s two-argument form, `FILTER`, `MAP`) are
//! intercepted by the evaluator before a call ever reaches this module, per
//! spec §9's "special iterating functions" design note. Custom functions
//! registered by a caller share the exact same shape and therefore never see
//! an AST.

mod aggregate;
mod helpers;
mod logical;
mod lookup;
mod math;
mod string;
mod type_fns;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::value::Value;

pub(crate) use helpers::*;

pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

#[derive(Clone)]
pub struct FunctionSpec {
    pub min_args: usize,
    pub max_args: Option<usize>,
    pub func: NativeFn,
}

impl FunctionSpec {
    fn new(min_args: usize, max_args: Option<usize>, func: NativeFn) -> Self {
        FunctionSpec { min_args, max_args, func }
    }
}

/// Three of the array functions (`SUM`, `FILTER`, `MAP`) also have
/// AST-consuming forms the evaluator handles directly; these names are
/// reserved here too so `UndefinedFunction` is never raised for them even
/// before a caller supplies the iterating argument form.
pub const ITERATING_FUNCTION_NAMES: &[&str] = &["SUM", "FILTER", "MAP"];

#[derive(Clone)]
pub struct FunctionLibrary {
    builtins: IndexMap<String, FunctionSpec>,
    custom: IndexMap<String, FunctionSpec>,
}

impl Default for FunctionLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionLibrary {
    pub fn new() -> Self {
        let mut builtins = IndexMap::new();
        math::install(&mut builtins);
        aggregate::install(&mut builtins);
        string::install(&mut builtins);
        logical::install(&mut builtins);
        type_fns::install(&mut builtins);
        lookup::install(&mut builtins);
        FunctionLibrary {
            builtins,
            custom: IndexMap::new(),
        }
    }

    /// Register (or override) a function under an upper-cased name.
    ///
    /// `SUM`/`FILTER`/`MAP` are reserved: the evaluator intercepts their
    /// AST-consuming forms before a call ever reaches this registry, so a
    /// custom override here would be silently unreachable.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        func: NativeFn,
    ) -> Result<()> {
        let upper = name.into().to_uppercase();
        if ITERATING_FUNCTION_NAMES.contains(&upper.as_str()) {
            return Err(Error::ReservedFunctionName(upper));
        }
        self.custom.insert(upper, FunctionSpec::new(min_args, max_args, func));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        let upper = name.to_uppercase();
        self.custom.contains_key(&upper) || self.builtins.contains_key(&upper)
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let upper = name.to_uppercase();
        let spec = self
            .custom
            .get(&upper)
            .or_else(|| self.builtins.get(&upper))
            .ok_or_else(|| Error::UndefinedFunction(upper.clone()))?;

        if args.len() < spec.min_args || spec.max_args.is_some_and(|max| args.len() > max) {
            return Err(Error::ArgumentCount {
                function: upper,
                min: spec.min_args,
                max: spec.max_args,
                actual: args.len(),
            });
        }
        (spec.func)(args)
    }
}

pub(crate) fn insert(
    table: &mut IndexMap<String, FunctionSpec>,
    name: &str,
    min_args: usize,
    max_args: Option<usize>,
    func: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
) {
    table.insert(name.to_string(), FunctionSpec::new(min_args, max_args, Arc::new(func)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Decimal;

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        let lib = FunctionLibrary::new();
        assert!(lib.contains("abs"));
        assert!(lib.contains("ABS"));
    }

    #[test]
    fn custom_function_overrides_builtin() {
        let mut lib = FunctionLibrary::new();
        lib.register("ABS", 1, Some(1), Arc::new(|_args| Ok(Value::decimal(Decimal::from_i64(42)))))
            .unwrap();
        let result = lib.call("abs", &[Value::decimal(Decimal::from_i64(-1))]).unwrap();
        assert_eq!(result, Value::decimal(Decimal::from_i64(42)));
    }

    #[test]
    fn registering_an_iterating_function_name_is_rejected() {
        let mut lib = FunctionLibrary::new();
        let err = lib
            .register("FILTER", 2, Some(2), Arc::new(|_args| Ok(Value::Null)))
            .unwrap_err();
        assert!(matches!(err, Error::ReservedFunctionName(_)));
    }

    #[test]
    fn arity_is_enforced() {
        let lib = FunctionLibrary::new();
        let err = lib.call("ABS", &[]).unwrap_err();
        assert!(matches!(err, Error::ArgumentCount { .. }));
    }

    #[test]
    fn unknown_function_is_an_error() {
        let lib = FunctionLibrary::new();
        assert!(matches!(lib.call("NOPE", &[]), Err(Error::UndefinedFunction(_))));
    }
}
