//! Token definitions for the condition language

use std::fmt;

/// A token in a condition string with its byte offset
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The source text for this token
    pub text: String,
    /// Byte offset of the first character (0-indexed)
    pub offset: usize,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Self { kind, text: text.into(), offset }
    }
}

/// The kind of token
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    And,
    Or,

    // Comparison operators
    Eq,   // ==
    Neq,  // !=
    Lt,   // <
    Gt,   // >
    LtEq, // <=
    GtEq, // >=

    // Literals
    StringLit(String),
    NumberLit(f64),
    BoolLit(bool),

    // Identifiers
    Ident(String),

    // Punctuation
    LParen, // (
    RParen, // )

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::And => write!(f, "AND"),
            TokenKind::Or => write!(f, "OR"),
            TokenKind::Eq => write!(f, "=="),
            TokenKind::Neq => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::StringLit(s) => write!(f, "'{}'", s),
            TokenKind::NumberLit(n) => write!(f, "{}", n),
            TokenKind::BoolLit(b) => write!(f, "{}", b),
            TokenKind::Ident(s) => write!(f, "{}", s),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

impl TokenKind {
    /// Check if this token is a comparison operator
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::Neq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::LtEq
                | TokenKind::GtEq
        )
    }
}
