//! Pratt (precedence-climbing) parser: token stream → AST.

use crate::ast::{Ast, BinaryOp, UnaryOp, VariablePrefix};
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Binding powers, lowest to highest, mirroring the precedence table.
/// Ternary < || < && < equality < relational < additive < multiplicative <
/// power (right-assoc) < unary < call < member/index.
fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    use TokenKind::*;
    Some(match kind {
        OrOr | Or => (3, 4),
        AndAnd | And => (5, 6),
        EqEq | NotEq => (7, 8),
        Lt | Gt | LtEq | GtEq => (9, 10),
        Plus | Minus => (11, 12),
        Star | Slash | Percent => (13, 14),
        Caret => (18, 17), // right-associative: right bp lower than left bp
        _ => return None,
    })
}

/// Higher than `^`'s left binding power, so `-2^2` parses as `(-2)^2`: unary
/// binds tighter than power, matching the precedence table.
const UNARY_BP: u8 = 19;
/// Ternary binds looser than every other binary operator; its right branch is
/// parsed at the same binding power so `a?b:c?d:e` right-chains.
const TERNARY_BP: u8 = 2;

/// Parse a full expression from source text; errors if tokens remain after a
/// complete expression, or if the lexer itself fails.
pub fn parse(source: &str) -> Result<Ast> {
    parse_tokens(Lexer::new(source).tokenize()?)
}

/// `parse`, but lexing with caller-configured variable/context sigils
/// (`EngineConfig::variable_prefix`/`context_prefix`) instead of the
/// default `$`/`@`.
pub fn parse_with_sigils(source: &str, variable_prefix: char, context_prefix: char) -> Result<Ast> {
    let tokens = Lexer::with_sigils(source, variable_prefix, context_prefix)?.tokenize()?;
    parse_tokens(tokens)
}

fn parse_tokens(tokens: Vec<Token>) -> Result<Ast> {
    let mut parser = Parser { tokens, pos: 0 };
    let ast = parser.parse_expr(0)?;
    parser.expect_eof()?;
    Ok(ast)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect_eof(&self) -> Result<()> {
        if self.peek().is_eof() {
            Ok(())
        } else {
            Err(self.unexpected(&["end of input".to_string()]))
        }
    }

    fn unexpected(&self, expected: &[String]) -> Error {
        let tok = self.peek();
        Error::UnexpectedToken {
            token: tok.describe(),
            expected: expected.to_vec(),
            offset: tok.offset,
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<Token> {
        if &self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&[format!("{kind:?}")]))
        }
    }

    /// Pratt loop: parse a prefix term, then repeatedly fold in infix
    /// operators, member access, and index access whose left binding power
    /// exceeds `min_bp`.
    fn parse_expr(&mut self, min_bp: u8) -> Result<Ast> {
        let mut left = self.parse_prefix()?;

        loop {
            // Postfix: member access / index access / call-args already
            // consumed in parse_prefix for the initial call; here we handle
            // chained `.` and `[` on the growing left-hand side.
            match &self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_member_name()?;
                    left = Ast::MemberAccess {
                        object: Box::new(left),
                        property,
                    };
                    continue;
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr(0)?;
                    self.eat(&TokenKind::RBracket)?;
                    left = Ast::IndexAccess {
                        object: Box::new(left),
                        index: Box::new(index),
                    };
                    continue;
                }
                TokenKind::Question => {
                    if TERNARY_BP < min_bp {
                        break;
                    }
                    self.advance();
                    let then_branch = self.parse_expr(0)?;
                    self.eat(&TokenKind::Colon)?;
                    // Alternate parsed at the same binding power as the `?`
                    // itself, so a nested ternary there is consumed rather
                    // than deferred to an enclosing frame: right-chains.
                    let else_branch = self.parse_expr(TERNARY_BP)?;
                    left = Ast::ConditionalExpression {
                        cond: Box::new(left),
                        then_branch: Box::new(then_branch),
                        else_branch: Box::new(else_branch),
                    };
                    continue;
                }
                other => {
                    let Some((left_bp, right_bp)) = infix_binding_power(other) else {
                        break;
                    };
                    if left_bp < min_bp {
                        break;
                    }
                    let op_token = self.advance();
                    let op = binary_op(&op_token.kind);
                    let right = self.parse_expr(right_bp)?;
                    left = Ast::BinaryOperation {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                }
            }
        }

        Ok(left)
    }

    fn parse_member_name(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            TokenKind::Variable(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(&["property name".to_string()])),
        }
    }

    fn parse_prefix(&mut self) -> Result<Ast> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expr(UNARY_BP)?;
                Ok(Ast::UnaryOperation {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Bang | TokenKind::Not => {
                self.advance();
                let operand = self.parse_expr(UNARY_BP)?;
                Ok(Ast::UnaryOperation {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Number { text, is_float } => {
                self.advance();
                if is_float {
                    let value: f64 = text
                        .parse()
                        .map_err(|_| Error::InvalidNumber { text: text.clone(), offset: tok.offset })?;
                    Ok(Ast::FloatLiteral { value })
                } else {
                    Ok(Ast::DecimalLiteral { text })
                }
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Ast::StringLiteral { value: s })
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(Ast::BooleanLiteral { value: b })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Ast::NullLiteral)
            }
            TokenKind::Variable(name) => {
                self.advance();
                Ok(Ast::VariableReference {
                    prefix: VariablePrefix::Dollar,
                    name,
                })
            }
            TokenKind::ContextVariable(name) => {
                self.advance();
                Ok(Ast::VariableReference {
                    prefix: VariablePrefix::At,
                    name,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                self.eat(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if self.peek().kind != TokenKind::RBracket {
                    loop {
                        elements.push(self.parse_expr(0)?);
                        if self.peek().kind == TokenKind::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.eat(&TokenKind::RBracket)?;
                Ok(Ast::ArrayLiteral { elements })
            }
            TokenKind::LBrace => {
                self.advance();
                let mut properties = Vec::new();
                if self.peek().kind != TokenKind::RBrace {
                    loop {
                        let key = match &self.peek().kind {
                            TokenKind::Identifier(name) => name.clone(),
                            _ => return Err(self.unexpected(&["object key".to_string()])),
                        };
                        self.advance();
                        self.eat(&TokenKind::Colon)?;
                        let value = self.parse_expr(0)?;
                        properties.push((key, value));
                        if self.peek().kind == TokenKind::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.eat(&TokenKind::RBrace)?;
                Ok(Ast::ObjectLiteral { properties })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.peek().kind == TokenKind::LParen {
                    self.advance();
                    let mut arguments = Vec::new();
                    if self.peek().kind != TokenKind::RParen {
                        loop {
                            arguments.push(self.parse_expr(0)?);
                            if self.peek().kind == TokenKind::Comma {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.eat(&TokenKind::RParen)?;
                    Ok(Ast::FunctionCall {
                        name: name.to_ascii_uppercase(),
                        arguments,
                    })
                } else {
                    Err(Error::SyntaxError {
                        message: format!(
                            "bare identifier `{name}` is not a valid operand; all operands must be \
                             `$`/`@`-prefixed variables, literals, or function calls"
                        ),
                        offset: tok.offset,
                        line: tok.line,
                        column: tok.column,
                    })
                }
            }
            // `AND`/`OR` reached in prefix position (not after a left-hand
            // side) are invalid, per spec.
            TokenKind::And | TokenKind::Or => Err(self.unexpected(&["expression".to_string()])),
            _ => Err(self.unexpected(&["expression".to_string()])),
        }
    }
}

fn binary_op(kind: &TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Caret => BinaryOp::Pow,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::AndAnd | TokenKind::And => BinaryOp::And,
        TokenKind::OrOr | TokenKind::Or => BinaryOp::Or,
        other => unreachable!("{other:?} is not a binary operator token"),
    }
}
