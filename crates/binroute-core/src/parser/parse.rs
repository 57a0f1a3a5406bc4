//! Parser implementation for policy conditions
//!
//! Grammar, lowest to highest precedence:
//!
//! ```text
//! expr        := or_expr
//! or_expr     := and_expr (OR and_expr)*
//! and_expr    := comparison (AND comparison)*
//! comparison  := '(' or_expr ')' | atom (cmp_op atom)?
//! atom        := '(' or_expr ')' | IDENTIFIER | literal
//! literal     := STRING | NUMBER | BOOL
//! cmp_op      := '==' | '!=' | '>' | '>=' | '<' | '<='
//! ```
//!
//! Parentheses may nest at most [`MAX_CONDITION_NESTING`] deep and a
//! condition may join at most [`MAX_CONDITION_TERMS`] operands with
//! `AND`/`OR`, which bounds the depth of every tree the parser returns.

use super::lexer::{LexError, Lexer};
use super::token::{Token, TokenKind};
use crate::ast::nodes::{ComparisonOp, Expression, Operand, Value};
use thiserror::Error;

/// Parse error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("unexpected token at offset {offset}: expected {expected}, got {got}")]
    UnexpectedToken { expected: String, got: String, offset: usize },

    #[error("unexpected token at offset {offset} after complete condition: expected {expected}, got {got}")]
    TrailingInput { expected: String, got: String, offset: usize },

    #[error("comparison operand at offset {offset} must be a literal or identifier")]
    InvalidOperand { offset: usize },

    #[error("parentheses nested deeper than {max_depth} at offset {offset}")]
    NestingTooDeep { max_depth: usize, offset: usize },

    #[error("more than {max_terms} AND/OR operands at offset {offset}")]
    TooManyTerms { max_terms: usize, offset: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum depth of nested parentheses
pub const MAX_CONDITION_NESTING: usize = 32;

/// Maximum number of operands joined by `AND`/`OR` in one condition
pub const MAX_CONDITION_TERMS: usize = 256;

const EXPECTED_ATOM: &str = "identifier, literal or '('";
const EXPECTED_CONTINUATION: &str = "AND, OR or end of input";

/// Recursive-descent parser over a token sequence
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    nesting: usize,
    terms: usize,
}

impl Parser {
    /// Create a parser by lexing the given condition string
    pub fn new(source: &str) -> ParseResult<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Create a parser over an already lexed token sequence
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let offset = tokens.last().map(|t| t.offset + t.text.len()).unwrap_or(0);
            tokens.push(Token::new(TokenKind::Eof, String::new(), offset));
        }
        Self { tokens, position: 0, nesting: 0, terms: 1 }
    }

    /// Parse a complete condition. Every token up to end-of-input must be
    /// consumed.
    pub fn parse_condition(&mut self) -> ParseResult<Expression> {
        let expr = self.parse_expression()?;

        if !self.is_at_end() {
            let token = self.current();
            return Err(ParseError::TrailingInput {
                expected: EXPECTED_CONTINUATION.to_string(),
                got: token.kind.to_string(),
                offset: token.offset,
            });
        }

        Ok(expr)
    }

    /// Parse an expression
    pub fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_logical_and()?;

        while self.check_token(&TokenKind::Or) {
            self.count_term()?;
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expression::or(left, right);
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_comparison()?;

        while self.check_token(&TokenKind::And) {
            self.count_term()?;
            self.advance();
            let right = self.parse_comparison()?;
            left = Expression::and(left, right);
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        // A leading group is a complete comparison on its own
        if self.check_token(&TokenKind::LParen) {
            return self.parse_group();
        }

        let left_offset = self.current().offset;
        let left = self.parse_atom()?;

        if let Some(op) = self.parse_comparison_op() {
            self.advance();
            let right_offset = self.current().offset;
            let right = self.parse_atom()?;

            let left = left.into_operand().ok_or(ParseError::InvalidOperand { offset: left_offset })?;
            let right = right.into_operand().ok_or(ParseError::InvalidOperand { offset: right_offset })?;
            Ok(Expression::comparison(left, op, right))
        } else {
            Ok(left)
        }
    }

    fn parse_atom(&mut self) -> ParseResult<Expression> {
        let token_kind = self.current().kind.clone();

        match token_kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expression::Identifier(name))
            }
            TokenKind::StringLit(s) => {
                self.advance();
                Ok(Expression::Literal(Value::String(s)))
            }
            TokenKind::NumberLit(n) => {
                self.advance();
                Ok(Expression::Literal(Value::Number(n)))
            }
            TokenKind::BoolLit(b) => {
                self.advance();
                Ok(Expression::Literal(Value::Bool(b)))
            }
            TokenKind::LParen => self.parse_group(),
            _ => Err(self.unexpected(EXPECTED_ATOM)),
        }
    }

    fn parse_group(&mut self) -> ParseResult<Expression> {
        let offset = self.current().offset;
        if self.nesting >= MAX_CONDITION_NESTING {
            return Err(ParseError::NestingTooDeep { max_depth: MAX_CONDITION_NESTING, offset });
        }

        self.expect_token(TokenKind::LParen)?;
        self.nesting += 1;
        let expr = self.parse_logical_or();
        self.nesting -= 1;
        let expr = expr?;
        self.expect_token(TokenKind::RParen)?;
        Ok(expr)
    }

    /// Count the operand introduced by the `AND`/`OR` at the current token
    fn count_term(&mut self) -> ParseResult<()> {
        if self.terms >= MAX_CONDITION_TERMS {
            return Err(ParseError::TooManyTerms {
                max_terms: MAX_CONDITION_TERMS,
                offset: self.current().offset,
            });
        }
        self.terms += 1;
        Ok(())
    }

    fn parse_comparison_op(&self) -> Option<ComparisonOp> {
        match self.current().kind {
            TokenKind::Eq => Some(ComparisonOp::Eq),
            TokenKind::Neq => Some(ComparisonOp::Neq),
            TokenKind::Lt => Some(ComparisonOp::Lt),
            TokenKind::Gt => Some(ComparisonOp::Gt),
            TokenKind::LtEq => Some(ComparisonOp::LtEq),
            TokenKind::GtEq => Some(ComparisonOp::GtEq),
            _ => None,
        }
    }

    // Helper methods

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn check_token(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn expect_token(&mut self, expected: TokenKind) -> ParseResult<()> {
        if self.check_token(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", expected)))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            got: token.kind.to_string(),
            offset: token.offset,
        }
    }
}

/// Lex and parse a condition string
pub fn parse_condition(source: &str) -> ParseResult<Expression> {
    Parser::new(source)?.parse_condition()
}
