//! Single-pass, hand-written lexer.
//!
//! Consumes UTF-8 source and emits a token stream terminated by `Eof`.
//! Whitespace is skipped but still advances `(line, column)`. Failure is
//! always a hard syntax error — the lexer never emits a partial token stream.

use crate::error::{Error, Result};
use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    variable_prefix: char,
    context_prefix: char,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_sigils(source, '$', '@').expect("default sigils are valid")
    }

    /// A lexer using caller-configured variable sigils
    /// (`EngineConfig::variable_prefix`/`context_prefix`) instead of the
    /// default `$`/`@`. Both must be distinct single-byte ASCII characters,
    /// since the scanner dispatches on raw bytes.
    pub fn with_sigils(source: &'a str, variable_prefix: char, context_prefix: char) -> Result<Self> {
        if !variable_prefix.is_ascii() || !context_prefix.is_ascii() {
            return Err(Error::ConfigurationError(
                "variable_prefix/context_prefix must be ASCII characters".to_string(),
            ));
        }
        if variable_prefix == context_prefix {
            return Err(Error::ConfigurationError(
                "variable_prefix and context_prefix must differ".to_string(),
            ));
        }
        Ok(Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            variable_prefix,
            context_prefix,
        })
    }

    /// Tokenize the entire source, returning all tokens including the
    /// trailing `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.is_eof();
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let (offset, line, column) = (self.pos, self.line, self.column);
        let Some(b) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, offset, line, column));
        };

        if b == self.variable_prefix as u8 {
            self.advance();
            let name = self.read_identifier_chars();
            if name.is_empty() {
                return Err(self.syntax_error(
                    &format!("empty variable name after `{}`", self.variable_prefix),
                    offset,
                    line,
                    column,
                ));
            }
            return Ok(Token::new(TokenKind::Variable(name), offset, line, column));
        }
        if b == self.context_prefix as u8 {
            self.advance();
            let name = self.read_identifier_chars();
            if name.is_empty() {
                return Err(self.syntax_error(
                    &format!("empty context variable name after `{}`", self.context_prefix),
                    offset,
                    line,
                    column,
                ));
            }
            return Ok(Token::new(TokenKind::ContextVariable(name), offset, line, column));
        }

        let kind = match b {
            b'(' => {
                self.advance();
                TokenKind::LParen
            }
            b')' => {
                self.advance();
                TokenKind::RParen
            }
            b'[' => {
                self.advance();
                TokenKind::LBracket
            }
            b']' => {
                self.advance();
                TokenKind::RBracket
            }
            b'{' => {
                self.advance();
                TokenKind::LBrace
            }
            b'}' => {
                self.advance();
                TokenKind::RBrace
            }
            b',' => {
                self.advance();
                TokenKind::Comma
            }
            b'.' => {
                self.advance();
                TokenKind::Dot
            }
            b'?' => {
                self.advance();
                TokenKind::Question
            }
            b':' => {
                self.advance();
                TokenKind::Colon
            }
            b'+' => {
                self.advance();
                TokenKind::Plus
            }
            b'-' => {
                self.advance();
                TokenKind::Minus
            }
            b'*' => {
                self.advance();
                TokenKind::Star
            }
            b'/' => {
                self.advance();
                TokenKind::Slash
            }
            b'%' => {
                self.advance();
                TokenKind::Percent
            }
            b'^' => {
                self.advance();
                TokenKind::Caret
            }
            b'!' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            b'=' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    return Err(self.syntax_error("bare `=` is not a valid operator", offset, line, column));
                }
            }
            b'<' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            b'&' => {
                self.advance();
                if self.peek() == Some(b'&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    return Err(self.syntax_error("bare `&` is not a valid operator", offset, line, column));
                }
            }
            b'|' => {
                self.advance();
                if self.peek() == Some(b'|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    return Err(self.syntax_error("bare `|` is not a valid operator", offset, line, column));
                }
            }
            b'"' | b'\'' => self.read_string(b, offset, line, column)?,
            b'0'..=b'9' => self.read_number(),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.read_identifier_or_keyword(),
            other => {
                return Err(self.syntax_error(
                    &format!("unexpected character {:?}", other as char),
                    offset,
                    line,
                    column,
                ))
            }
        };

        Ok(Token::new(kind, offset, line, column))
    }

    fn syntax_error(&self, message: &str, offset: usize, line: usize, column: usize) -> Error {
        Error::SyntaxError {
            message: message.to_string(),
            offset,
            line,
            column,
        }
    }

    fn read_identifier_chars(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        self.source[start..self.pos].to_string()
    }

    fn read_identifier_or_keyword(&mut self) -> TokenKind {
        let name = self.read_identifier_chars();
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "TRUE" => TokenKind::Boolean(true),
            "FALSE" => TokenKind::Boolean(false),
            "NULL" => TokenKind::Null,
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            _ => TokenKind::Identifier(name),
        }
    }

    fn read_number(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.advance();
        }
        let mut is_float = false;
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.advance();
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let save = self.pos;
            let save_line = self.line;
            let save_col = self.column;
            self.advance();
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.advance();
            }
            if matches!(self.peek(), Some(b'0'..=b'9')) {
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.advance();
                }
                is_float = true;
            } else {
                // Not actually an exponent; back out.
                self.pos = save;
                self.line = save_line;
                self.column = save_col;
            }
        }
        let text = self.source[start..self.pos].to_string();
        match self.peek() {
            Some(b'f') | Some(b'F') => {
                self.advance();
                is_float = true;
            }
            Some(b'd') | Some(b'D') => {
                self.advance();
                is_float = false;
            }
            _ => {}
        }
        TokenKind::Number { text, is_float }
    }

    fn read_string(&mut self, quote: u8, offset: usize, line: usize, column: usize) -> Result<TokenKind> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(Error::UnterminatedString { offset }),
                Some(b) if b == quote => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    match self.advance() {
                        Some(b'n') => value.push('\n'),
                        Some(b't') => value.push('\t'),
                        Some(b'r') => value.push('\r'),
                        Some(b'\\') => value.push('\\'),
                        Some(b'"') => value.push('"'),
                        Some(b'\'') => value.push('\''),
                        Some(other) => value.push(other as char),
                        None => return Err(Error::UnterminatedString { offset }),
                    }
                }
                Some(_) => {
                    // Advance by UTF-8 char, not byte, to keep non-ASCII intact.
                    let rest = &self.source[self.pos..];
                    let ch = rest.chars().next().expect("non-empty at this point");
                    for _ in 0..ch.len_utf8() {
                        self.advance();
                    }
                    value.push(ch);
                }
            }
        }
        let _ = (line, column);
        Ok(TokenKind::String(value))
    }
}
