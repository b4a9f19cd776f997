//=====================================================
// File: tokenizer.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Buddy Script lexical analysis
// Objective: Convert raw script text into a flat token stream with
//            line/column tracking for diagnostics
//=====================================================

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

//=====================================================
// Section 1: Token Model
//=====================================================

/// All token kinds understood by Buddy Script (and the FCS dialect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    Number,
    String,
    Template,
    Boolean,
    Null,
    Identifier,

    // Keywords
    Let,
    Const,
    Var,
    Function,
    Async,
    Await,
    Return,
    If,
    Else,
    While,
    For,
    In,
    Break,
    Continue,
    Try,
    Catch,
    Finally,
    Throw,
    Import,
    Export,
    From,
    As,
    Class,
    New,
    Test,
    Assert,

    // Operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Equal,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    OrOr,
    Bang,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    Arrow,
    Question,
    Colon,
    Dot,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,

    Eof,
}

impl TokenKind {
    /// Source spelling for operator and delimiter kinds.
    pub fn symbol(self) -> Option<&'static str> {
        use TokenKind::*;
        let text = match self {
            Plus => "+",
            Minus => "-",
            Star => "*",
            StarStar => "**",
            Slash => "/",
            Percent => "%",
            Equal => "=",
            EqualEqual => "==",
            BangEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            AndAnd => "&&",
            OrOr => "||",
            Bang => "!",
            PlusEqual => "+=",
            MinusEqual => "-=",
            StarEqual => "*=",
            SlashEqual => "/=",
            PercentEqual => "%=",
            Arrow => "=>",
            Question => "?",
            Colon => ":",
            Dot => ".",
            LeftParen => "(",
            RightParen => ")",
            LeftBrace => "{",
            RightBrace => "}",
            LeftBracket => "[",
            RightBracket => "]",
            Comma => ",",
            Semicolon => ";",
            _ => return None,
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol() {
            Some(symbol) => f.write_str(symbol),
            None => write!(f, "{:?}", self),
        }
    }
}

/// Literal payload carried by literal and identifier tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenLiteral {
    Boolean(bool),
    Number(f64),
    String(String),
}

/// A token with its kind, optional literal value, and start position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub literal: Option<TokenLiteral>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: Option<TokenLiteral>, line: usize, column: usize) -> Self {
        Self {
            kind,
            literal,
            line,
            column,
        }
    }
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    HashMap::from([
        ("let", Let),
        ("const", Const),
        ("var", Var),
        ("function", Function),
        ("async", Async),
        ("await", Await),
        ("return", Return),
        ("if", If),
        ("else", Else),
        ("while", While),
        ("for", For),
        ("in", In),
        ("break", Break),
        ("continue", Continue),
        ("try", Try),
        ("catch", Catch),
        ("finally", Finally),
        ("throw", Throw),
        ("import", Import),
        ("export", Export),
        ("from", From),
        ("as", As),
        ("class", Class),
        ("new", New),
        ("test", Test),
        ("assert", Assert),
    ])
});

//=====================================================
// Section 2: Lex Errors
//=====================================================

/// Lexing is not recoverable; every error aborts the whole tokenize call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },
    #[error("Unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
    #[error("Unterminated block comment starting at line {line}, column {column}")]
    UnterminatedComment { line: usize, column: usize },
    #[error("Invalid number literal '{text}' at line {line}, column {column}")]
    InvalidNumber {
        text: String,
        line: usize,
        column: usize,
    },
}

impl LexError {
    /// Line the offending construct started on.
    pub fn line(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { line, .. }
            | LexError::UnterminatedString { line, .. }
            | LexError::UnterminatedComment { line, .. }
            | LexError::InvalidNumber { line, .. } => *line,
        }
    }
}

//=====================================================
// Section 3: Tokenizer
//=====================================================

/// Single left-to-right scanner with one character of lookahead.
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    start_line: usize,
    start_column: usize,
    tokens: Vec<Token>,
}

/// Tokenize `source` in one call.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Tokenizer::new(source).tokenize()
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            self.start_line = self.line;
            self.start_column = self.column;

            let ch = self.peek();
            if ch == '/' && self.peek_next() == Some('/') {
                self.skip_line_comment();
            } else if ch == '/' && self.peek_next() == Some('*') {
                self.skip_block_comment()?;
            } else if ch == '"' || ch == '\'' {
                self.handle_string(ch, TokenKind::String)?;
            } else if ch == '`' {
                self.handle_string(ch, TokenKind::Template)?;
            } else if ch.is_ascii_digit() {
                self.handle_number()?;
            } else if is_identifier_start(ch) {
                self.handle_identifier();
            } else {
                self.handle_operator_or_delimiter()?;
            }
        }

        self.start_line = self.line;
        self.start_column = self.column;
        self.emit(TokenKind::Eof, None);
        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn peek(&self) -> char {
        self.input.get(self.position).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    fn matches(&mut self, expected: char) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn emit(&mut self, kind: TokenKind, literal: Option<TokenLiteral>) {
        self.tokens
            .push(Token::new(kind, literal, self.start_line, self.start_column));
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        self.advance(); // '/'
        self.advance(); // '*'
        loop {
            if self.is_at_end() {
                return Err(LexError::UnterminatedComment {
                    line: self.start_line,
                    column: self.start_column,
                });
            }
            if self.peek() == '*' && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }
    }

    fn handle_string(&mut self, quote: char, kind: TokenKind) -> Result<(), LexError> {
        self.advance(); // opening quote

        let mut value = String::new();
        loop {
            if self.is_at_end() {
                return Err(LexError::UnterminatedString {
                    line: self.start_line,
                    column: self.start_column,
                });
            }
            let ch = self.advance();
            if ch == quote {
                break;
            }
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            if self.is_at_end() {
                return Err(LexError::UnterminatedString {
                    line: self.start_line,
                    column: self.start_column,
                });
            }
            match self.advance() {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                '\\' => value.push('\\'),
                '"' => value.push('"'),
                '\'' => value.push('\''),
                '`' => value.push('`'),
                other => {
                    value.push('\\');
                    value.push(other);
                }
            }
        }

        self.emit(kind, Some(TokenLiteral::String(value)));
        Ok(())
    }

    fn handle_number(&mut self) -> Result<(), LexError> {
        let mut text = String::new();
        while self.peek().is_ascii_digit() {
            text.push(self.advance());
        }

        if self.peek() == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            text.push(self.advance());
            while self.peek().is_ascii_digit() {
                text.push(self.advance());
            }
        }

        if matches!(self.peek(), 'e' | 'E') {
            let sign = self.peek_next();
            let exponent_follows = match sign {
                Some('+') | Some('-') => self
                    .input
                    .get(self.position + 2)
                    .is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_follows {
                text.push(self.advance());
                if matches!(self.peek(), '+' | '-') {
                    text.push(self.advance());
                }
                while self.peek().is_ascii_digit() {
                    text.push(self.advance());
                }
            }
        }

        let value = text.parse::<f64>().map_err(|_| LexError::InvalidNumber {
            text: text.clone(),
            line: self.start_line,
            column: self.start_column,
        })?;
        self.emit(TokenKind::Number, Some(TokenLiteral::Number(value)));
        Ok(())
    }

    fn handle_identifier(&mut self) {
        let mut identifier = String::new();
        while !self.is_at_end() && is_identifier_part(self.peek()) {
            identifier.push(self.advance());
        }

        match identifier.as_str() {
            "true" => self.emit(TokenKind::Boolean, Some(TokenLiteral::Boolean(true))),
            "false" => self.emit(TokenKind::Boolean, Some(TokenLiteral::Boolean(false))),
            "null" => self.emit(TokenKind::Null, None),
            word => match KEYWORDS.get(word) {
                Some(kind) => self.emit(*kind, None),
                None => self.emit(TokenKind::Identifier, Some(TokenLiteral::String(identifier))),
            },
        }
    }

    fn handle_operator_or_delimiter(&mut self) -> Result<(), LexError> {
        let ch = self.advance();

        let kind = match ch {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '?' => TokenKind::Question,
            '+' => {
                if self.matches('=') {
                    TokenKind::PlusEqual
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.matches('=') {
                    TokenKind::MinusEqual
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.matches('*') {
                    TokenKind::StarStar
                } else if self.matches('=') {
                    TokenKind::StarEqual
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.matches('=') {
                    TokenKind::SlashEqual
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.matches('=') {
                    TokenKind::PercentEqual
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.matches('=') {
                    self.matches('=');
                    TokenKind::EqualEqual
                } else if self.matches('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                if self.matches('=') {
                    self.matches('=');
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.matches('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.matches('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            '&' if self.matches('&') => TokenKind::AndAnd,
            '|' if self.matches('|') => TokenKind::OrOr,
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    ch,
                    line: self.start_line,
                    column: self.start_column,
                });
            }
        };

        self.emit(kind, None);
        Ok(())
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

//=====================================================
// Section 4: Tests
//=====================================================


//=====================================================
// End of file
//=====================================================
