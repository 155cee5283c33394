//! Error taxonomy for the formula engine.
//!
//! Every error carries the structured fields named in the error design (parse,
//! validation, evaluation, decimal, configuration, security) so callers can
//! match on `code()` without parsing message text.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A rounding/decimal failure, kept distinct from `Error` so the decimal
/// adapter module has no dependency on the rest of the crate's error surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    #[error("decimal overflow")]
    Overflow,
    #[error("decimal underflow")]
    Underflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("invalid decimal literal: {0}")]
    Invalid(String),
}

/// Top-level engine error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ---- Parse ----
    #[error("syntax error at {line}:{column} (offset {offset}): {message}")]
    SyntaxError {
        message: String,
        offset: usize,
        line: usize,
        column: usize,
    },
    #[error("unexpected token {token:?} at offset {offset}, expected one of {expected:?}")]
    UnexpectedToken {
        token: String,
        expected: Vec<String>,
        offset: usize,
    },
    #[error("unterminated string literal at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("invalid number literal {text:?} at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    // ---- Validation ----
    #[error("circular dependency: {}", cycle.join(" -> "))]
    CircularDependency {
        cycle: Vec<String>,
        involved: Vec<String>,
    },
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("undefined function: {0}")]
    UndefinedFunction(String),
    #[error("duplicate formula id: {0}")]
    DuplicateFormula(String),
    #[error("{0} is a reserved function name and cannot be overridden")]
    ReservedFunctionName(String),

    // ---- Evaluation ----
    #[error("division by zero")]
    DivisionByZero,
    #[error("type mismatch: expected {expected}, got {actual} ({where_})")]
    TypeMismatch {
        expected: String,
        actual: String,
        where_: String,
    },
    #[error("{function} expects {min}..{max:?} arguments, got {actual}")]
    ArgumentCount {
        function: String,
        min: usize,
        max: Option<usize>,
        actual: usize,
    },
    #[error("invalid operation {op} on {operand_types:?}")]
    InvalidOperation {
        op: String,
        operand_types: Vec<String>,
    },
    #[error("cannot access property {property:?} of {object_type}")]
    PropertyAccess {
        property: String,
        object_type: String,
    },
    #[error("cannot index {object_type} with {index:?}")]
    IndexAccess { index: String, object_type: String },

    // ---- Decimal ----
    #[error("decimal overflow")]
    DecimalOverflow,
    #[error("decimal underflow")]
    DecimalUnderflow,
    #[error("decimal division by zero")]
    DecimalDivisionByZero,
    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    // ---- Configuration ----
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    // ---- Security ----
    #[error("maximum iteration count exceeded ({limit})")]
    MaxIterations { limit: usize },
    #[error("maximum recursion depth exceeded ({limit})")]
    MaxRecursion { limit: usize },
    #[error("expression exceeds maximum length ({limit} bytes)")]
    MaxExpressionLength { limit: usize },
}

/// `{ code, category, message, ...structured_fields }` per the serialization
/// contract (spec §6.4) — hand-written rather than derived because the
/// structured fields vary per variant and `code`/`category` aren't real
/// struct fields.
impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("code", self.code())?;
        map.serialize_entry("category", self.category())?;
        map.serialize_entry("message", &self.to_string())?;
        match self {
            Error::SyntaxError { message: _, offset, line, column } => {
                map.serialize_entry("offset", offset)?;
                map.serialize_entry("line", line)?;
                map.serialize_entry("column", column)?;
            }
            Error::UnexpectedToken { token, expected, offset } => {
                map.serialize_entry("token", token)?;
                map.serialize_entry("expected", expected)?;
                map.serialize_entry("offset", offset)?;
            }
            Error::UnterminatedString { offset } => {
                map.serialize_entry("offset", offset)?;
            }
            Error::InvalidNumber { text, offset } => {
                map.serialize_entry("text", text)?;
                map.serialize_entry("offset", offset)?;
            }
            Error::CircularDependency { cycle, involved } => {
                map.serialize_entry("cycle", cycle)?;
                map.serialize_entry("involved", involved)?;
            }
            Error::UndefinedVariable(name)
            | Error::UndefinedFunction(name)
            | Error::DuplicateFormula(name)
            | Error::ReservedFunctionName(name) => {
                map.serialize_entry("name", name)?;
            }
            Error::TypeMismatch { expected, actual, where_ } => {
                map.serialize_entry("expected", expected)?;
                map.serialize_entry("actual", actual)?;
                map.serialize_entry("where", where_)?;
            }
            Error::ArgumentCount { function, min, max, actual } => {
                map.serialize_entry("function", function)?;
                map.serialize_entry("min", min)?;
                map.serialize_entry("max", max)?;
                map.serialize_entry("actual", actual)?;
            }
            Error::InvalidOperation { op, operand_types } => {
                map.serialize_entry("op", op)?;
                map.serialize_entry("operand_types", operand_types)?;
            }
            Error::PropertyAccess { property, object_type } => {
                map.serialize_entry("property", property)?;
                map.serialize_entry("object_type", object_type)?;
            }
            Error::IndexAccess { index, object_type } => {
                map.serialize_entry("index", index)?;
                map.serialize_entry("object_type", object_type)?;
            }
            Error::InvalidDecimal(text) | Error::ConfigurationError(text) => {
                map.serialize_entry("detail", text)?;
            }
            Error::MaxIterations { limit } | Error::MaxRecursion { limit } | Error::MaxExpressionLength { limit } => {
                map.serialize_entry("limit", limit)?;
            }
            Error::DivisionByZero
            | Error::DecimalOverflow
            | Error::DecimalUnderflow
            | Error::DecimalDivisionByZero => {}
        }
        map.end()
    }
}

impl From<DecimalError> for Error {
    fn from(e: DecimalError) -> Self {
        match e {
            DecimalError::Overflow => Error::DecimalOverflow,
            DecimalError::Underflow => Error::DecimalUnderflow,
            DecimalError::DivisionByZero => Error::DecimalDivisionByZero,
            DecimalError::Invalid(s) => Error::InvalidDecimal(s),
        }
    }
}

impl Error {
    /// Stable machine-readable identifier, as required by the serialization
    /// contract (`{ code, category, message, ...structured_fields }`).
    pub fn code(&self) -> &'static str {
        match self {
            Error::SyntaxError { .. } => "SYNTAX_ERROR",
            Error::UnexpectedToken { .. } => "UNEXPECTED_TOKEN",
            Error::UnterminatedString { .. } => "UNTERMINATED_STRING",
            Error::InvalidNumber { .. } => "INVALID_NUMBER",
            Error::CircularDependency { .. } => "CIRCULAR_DEPENDENCY",
            Error::UndefinedVariable(_) => "UNDEFINED_VARIABLE",
            Error::UndefinedFunction(_) => "UNDEFINED_FUNCTION",
            Error::DuplicateFormula(_) => "DUPLICATE_FORMULA",
            Error::ReservedFunctionName(_) => "RESERVED_FUNCTION_NAME",
            Error::DivisionByZero => "DIVISION_BY_ZERO",
            Error::TypeMismatch { .. } => "TYPE_MISMATCH",
            Error::ArgumentCount { .. } => "ARGUMENT_COUNT",
            Error::InvalidOperation { .. } => "INVALID_OPERATION",
            Error::PropertyAccess { .. } => "PROPERTY_ACCESS",
            Error::IndexAccess { .. } => "INDEX_ACCESS",
            Error::DecimalOverflow => "DECIMAL_OVERFLOW",
            Error::DecimalUnderflow => "DECIMAL_UNDERFLOW",
            Error::DecimalDivisionByZero => "DECIMAL_DIVISION_BY_ZERO",
            Error::InvalidDecimal(_) => "INVALID_DECIMAL",
            Error::ConfigurationError(_) => "CONFIGURATION_ERROR",
            Error::MaxIterations { .. } => "MAX_ITERATIONS",
            Error::MaxRecursion { .. } => "MAX_RECURSION",
            Error::MaxExpressionLength { .. } => "MAX_EXPRESSION_LENGTH",
        }
    }

    /// Coarse error category, mirrored in serialized error envelopes.
    pub fn category(&self) -> &'static str {
        match self {
            Error::SyntaxError { .. }
            | Error::UnexpectedToken { .. }
            | Error::UnterminatedString { .. }
            | Error::InvalidNumber { .. } => "parse",
            Error::CircularDependency { .. }
            | Error::UndefinedVariable(_)
            | Error::UndefinedFunction(_)
            | Error::DuplicateFormula(_)
            | Error::ReservedFunctionName(_) => "validation",
            Error::DivisionByZero
            | Error::TypeMismatch { .. }
            | Error::ArgumentCount { .. }
            | Error::InvalidOperation { .. }
            | Error::PropertyAccess { .. }
            | Error::IndexAccess { .. } => "evaluation",
            Error::DecimalOverflow
            | Error::DecimalUnderflow
            | Error::DecimalDivisionByZero
            | Error::InvalidDecimal(_) => "decimal",
            Error::ConfigurationError(_) => "configuration",
            Error::MaxIterations { .. }
            | Error::MaxRecursion { .. }
            | Error::MaxExpressionLength { .. } => "security",
        }
    }
}
