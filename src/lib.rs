//! Dependency-aware expression evaluation engine for configuration-driven
//! formulas: lex, parse, extract `$`-variable dependencies, topologically
//! schedule a batch, and evaluate each formula's AST against an
//! arbitrary-precision Decimal runtime.
//!
//! [`Engine`] is the entry point most callers want; the submodules are
//! public so embedders can drive the pipeline's individual stages (parse
//! once and reuse the AST, inspect the dependency graph before running it,
//! swap in a custom [`FunctionLibrary`][functions::FunctionLibrary]).

pub mod ast;
pub mod cache;
pub mod config;
pub mod context;
pub mod decimal;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod formula;
pub mod functions;
pub mod graph;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;

pub use config::EngineConfig;
pub use context::EvaluationContext;
pub use decimal::{Decimal, RoundingMode};
pub use engine::{BatchOptions, Engine};
pub use error::{Error, Result};
pub use formula::{BatchResult, EvalResult, FormulaDefinition, OnErrorPolicy, RoundingSpec, ValidationReport};
pub use value::Value;
