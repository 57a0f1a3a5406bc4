//! AST node definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed condition
///
/// The tree is closed: comparisons only ever hold [`Operand`]s, so nested
/// comparisons such as `a == b == c` cannot be represented.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value used as a truthy check
    Literal(Value),

    /// Fact name resolved against the context, used as a truthy check
    Identifier(String),

    /// Comparison (e.g., size_mm > 50)
    Comparison { left: Operand, op: ComparisonOp, right: Operand },

    /// Logical operation (AND, OR)
    Logical { left: Box<Expression>, op: LogicalOp, right: Box<Expression> },
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create an identifier expression
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Create a comparison expression
    pub fn comparison(left: Operand, op: ComparisonOp, right: Operand) -> Self {
        Self::Comparison { left, op, right }
    }

    /// Create a logical AND
    pub fn and(left: Expression, right: Expression) -> Self {
        Self::Logical {
            left: Box::new(left),
            op: LogicalOp::And,
            right: Box::new(right),
        }
    }

    /// Create a logical OR
    pub fn or(left: Expression, right: Expression) -> Self {
        Self::Logical {
            left: Box::new(left),
            op: LogicalOp::Or,
            right: Box::new(right),
        }
    }

    /// Convert to a comparison operand, if this is an atom
    pub fn into_operand(self) -> Option<Operand> {
        match self {
            Expression::Literal(value) => Some(Operand::Literal(value)),
            Expression::Identifier(name) => Some(Operand::Identifier(name)),
            Expression::Comparison { .. } | Expression::Logical { .. } => None,
        }
    }

    fn logical_op(&self) -> Option<LogicalOp> {
        match self {
            Expression::Logical { op, .. } => Some(*op),
            _ => None,
        }
    }
}

impl From<Operand> for Expression {
    fn from(operand: Operand) -> Self {
        match operand {
            Operand::Literal(value) => Expression::Literal(value),
            Operand::Identifier(name) => Expression::Identifier(name),
        }
    }
}

/// Canonical condition text. Parentheses are emitted only where precedence
/// or left-associativity requires them, so the output re-parses to an equal
/// tree.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Comparison { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expression::Logical { left, op, right } => {
                let left_parens = *op == LogicalOp::And && left.logical_op() == Some(LogicalOp::Or);
                let right_parens = match right.logical_op() {
                    Some(LogicalOp::And) => *op == LogicalOp::And,
                    Some(LogicalOp::Or) => true,
                    None => false,
                };

                if left_parens {
                    write!(f, "({})", left)?;
                } else {
                    write!(f, "{}", left)?;
                }
                write!(f, " {} ", op)?;
                if right_parens {
                    write!(f, "({})", right)
                } else {
                    write!(f, "{}", right)
                }
            }
        }
    }
}

/// One side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Identifier(String),
}

impl Operand {
    /// Create a literal operand
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create an identifier operand
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Identifier(name) => write!(f, "{}", name),
        }
    }
}

/// A dynamically typed fact or literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
}

impl Value {
    /// Truthiness: non-zero number, non-empty string, `true`
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
        }
    }

    /// Numeric coercion for ordering comparisons. Strings holding a finite
    /// decimal coerce; booleans never do.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Value::Bool(_) => None,
        }
    }

    /// Type-aware equality; values of different types are never equal
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }

    /// Get the type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "String",
            Value::Number(_) => "Number",
            Value::Bool(_) => "Bool",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Strings holding a single quote fall back to double quotes
            Value::String(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">=")]
    GtEq,
}

impl ComparisonOp {
    /// Check if this is an ordering operator (`<`, `>`, `<=`, `>=`)
    pub fn is_ordering(&self) -> bool {
        matches!(self, ComparisonOp::Lt | ComparisonOp::Gt | ComparisonOp::LtEq | ComparisonOp::GtEq)
    }

    /// Apply the operator to two numbers
    pub fn compare_numbers(&self, left: f64, right: f64) -> bool {
        match self {
            ComparisonOp::Eq => left == right,
            ComparisonOp::Neq => left != right,
            ComparisonOp::Lt => left < right,
            ComparisonOp::Gt => left > right,
            ComparisonOp::LtEq => left <= right,
            ComparisonOp::GtEq => left >= right,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonOp::Eq => write!(f, "=="),
            ComparisonOp::Neq => write!(f, "!="),
            ComparisonOp::Lt => write!(f, "<"),
            ComparisonOp::Gt => write!(f, ">"),
            ComparisonOp::LtEq => write!(f, "<="),
            ComparisonOp::GtEq => write!(f, ">="),
        }
    }
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "AND"),
            LogicalOp::Or => write!(f, "OR"),
        }
    }
}
