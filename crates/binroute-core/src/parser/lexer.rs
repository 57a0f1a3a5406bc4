//! Lexer for the condition language
//!
//! Turns a condition string such as `color == 'red' AND size_mm > 50` into a
//! token sequence terminated by [`TokenKind::Eof`]. Whitespace is discarded.
//! Lexing is all-or-nothing: the first unrecognized character aborts with a
//! [`LexError`] and no partial token sequence is returned.

use super::token::{Token, TokenKind};
use thiserror::Error;

/// Unrecognized input in a condition string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unexpected character {found:?} at offset {offset}")]
pub struct LexError {
    /// Byte offset of the offending character
    pub offset: usize,
    /// The offending character
    pub found: char,
}

pub type LexResult<T> = Result<T, LexError>;

/// Lexer for tokenizing condition strings
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    offset: usize,
}

impl Lexer {
    /// Create a new lexer over a condition string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            offset: 0,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_whitespace();

        let start = self.offset;

        if self.is_at_end() {
            return Ok(Token::new(TokenKind::Eof, String::new(), start));
        }

        let ch = self.current_char();

        if ch == '\'' || ch == '"' {
            return self.lex_string(ch);
        }

        if ch.is_ascii_digit() || (ch == '-' && self.peek_char().is_some_and(|c| c.is_ascii_digit())) {
            return self.lex_number();
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            return Ok(self.lex_identifier_or_keyword());
        }

        self.lex_operator_or_punctuation()
    }

    /// Tokenize all input, including the trailing end marker
    pub fn tokenize(&mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn advance(&mut self) -> char {
        let ch = self.current_char();
        self.position += 1;
        self.offset += ch.len_utf8();
        ch
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Quoted string, contents taken verbatim. The closing quote must match
    /// the opening one; there are no escape sequences.
    fn lex_string(&mut self, quote: char) -> LexResult<Token> {
        let start = self.offset;
        let end = self.input[self.position + 1..]
            .iter()
            .position(|&c| c == quote)
            .ok_or(LexError { offset: start, found: quote })?;

        let mut text = String::new();
        text.push(self.advance());
        let mut value = String::new();
        for _ in 0..end {
            value.push(self.advance());
        }
        text.push_str(&value);
        text.push(self.advance());

        Ok(Token::new(TokenKind::StringLit(value), text, start))
    }

    fn lex_number(&mut self) -> LexResult<Token> {
        let start = self.offset;
        let mut number_str = String::new();

        if self.current_char() == '-' {
            number_str.push(self.advance());
        }

        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            number_str.push(self.advance());
        }

        // Fractional part only when a digit follows the point
        if !self.is_at_end()
            && self.current_char() == '.'
            && self.peek_char().is_some_and(|c| c.is_ascii_digit())
        {
            number_str.push(self.advance());
            while !self.is_at_end() && self.current_char().is_ascii_digit() {
                number_str.push(self.advance());
            }
        }

        // Literals too large for f64 would otherwise become infinity
        let value = number_str
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| LexError {
                offset: start,
                found: number_str.chars().next().unwrap_or_default(),
            })?;

        Ok(Token::new(TokenKind::NumberLit(value), number_str, start))
    }

    fn lex_identifier_or_keyword(&mut self) -> Token {
        let start = self.offset;
        let mut ident = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(self.advance());
            } else {
                break;
            }
        }

        // Keywords are case-sensitive and must match the whole word
        let kind = match ident.as_str() {
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "true" => TokenKind::BoolLit(true),
            "false" => TokenKind::BoolLit(false),
            _ => TokenKind::Ident(ident.clone()),
        };

        Token::new(kind, ident, start)
    }

    fn lex_operator_or_punctuation(&mut self) -> LexResult<Token> {
        let start = self.offset;
        let ch = self.current_char();

        // Two-character operators before their one-character prefixes
        if let Some(next_ch) = self.peek_char() {
            let kind = match (ch, next_ch) {
                ('!', '=') => Some(TokenKind::Neq),
                ('=', '=') => Some(TokenKind::Eq),
                ('>', '=') => Some(TokenKind::GtEq),
                ('<', '=') => Some(TokenKind::LtEq),
                _ => None,
            };

            if let Some(kind) = kind {
                self.advance();
                self.advance();
                return Ok(Token::new(kind, format!("{}{}", ch, next_ch), start));
            }
        }

        let kind = match ch {
            '>' => TokenKind::Gt,
            '<' => TokenKind::Lt,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            _ => return Err(LexError { offset: start, found: ch }),
        };

        self.advance();
        Ok(Token::new(kind, ch.to_string(), start))
    }
}

/// Tokenize a condition string in one call
pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    Lexer::new(input).tokenize()
}
