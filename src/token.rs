//! Token types produced by the lexer.

/// Lexical category of a token, together with any payload it carries.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Number kept in its original textual form so decimal precision survives
    /// end-to-end; `is_float` records whether an `f`/`F` suffix or scientific
    /// notation downgraded it to binary float.
    Number { text: String, is_float: bool },
    String(String),
    Boolean(bool),
    Null,
    Identifier(String),
    /// `$name`
    Variable(String),
    /// `@name`
    ContextVariable(String),

    // Punctuation / delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Question,
    Colon,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,

    // Keywords (case-insensitive spellings normalize to these)
    And,
    Or,
    Not,

    Eof,
}

/// A single lexed token with full source-position diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize, line: usize, column: usize) -> Self {
        Self {
            kind,
            offset,
            line,
            column,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Human-readable label used in `UnexpectedToken` diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Number { text, .. } => format!("number `{text}`"),
            TokenKind::String(s) => format!("string {s:?}"),
            TokenKind::Boolean(b) => format!("boolean `{b}`"),
            TokenKind::Null => "null".to_string(),
            TokenKind::Identifier(name) => format!("identifier `{name}`"),
            TokenKind::Variable(name) => format!("variable `${name}`"),
            TokenKind::ContextVariable(name) => format!("context variable `@{name}`"),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("{other:?}"),
        }
    }
}
