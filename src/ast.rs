//! Abstract syntax tree produced by the parser.
//!
//! Nodes are immutable once built and own their children outright: no
//! sharing, no cycles. The tree is destroyed wholesale when evicted from the
//! AST cache.

/// Binary operator kinds (arithmetic, comparison, logical).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

/// Unary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Which sigil a `VariableReference` used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariablePrefix {
    /// `$name` — resolved against `context.variables`.
    Dollar,
    /// `@name` — resolved against `context.extra`.
    At,
}

/// A parsed expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    DecimalLiteral { text: String },
    FloatLiteral { value: f64 },
    StringLiteral { value: String },
    BooleanLiteral { value: bool },
    NullLiteral,
    ArrayLiteral { elements: Vec<Ast> },
    /// Object keys are bare identifiers; insertion order is preserved.
    ObjectLiteral { properties: Vec<(String, Ast)> },
    VariableReference { prefix: VariablePrefix, name: String },
    UnaryOperation { op: UnaryOp, operand: Box<Ast> },
    BinaryOperation {
        op: BinaryOp,
        left: Box<Ast>,
        right: Box<Ast>,
    },
    ConditionalExpression {
        cond: Box<Ast>,
        then_branch: Box<Ast>,
        else_branch: Box<Ast>,
    },
    /// `name` is always upper-cased by the parser before any lookup happens.
    FunctionCall { name: String, arguments: Vec<Ast> },
    MemberAccess { object: Box<Ast>, property: String },
    IndexAccess { object: Box<Ast>, index: Box<Ast> },
}
