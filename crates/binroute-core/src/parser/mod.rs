//! Condition language parser
//!
//! This module turns rule condition strings into [`Expression`](crate::ast::Expression) trees.

pub mod lexer;
pub mod parse;
pub mod token;

pub use lexer::{tokenize, LexError, Lexer};
pub use parse::{parse_condition, ParseError, ParseResult, Parser, MAX_CONDITION_NESTING, MAX_CONDITION_TERMS};
pub use token::{Token, TokenKind};
