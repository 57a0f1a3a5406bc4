//! Static checks for conditions against a fact schema
//!
//! The checker never blocks evaluation. Its findings surface in policy
//! validation so authors can spot a rule that can never match, e.g. an
//! ordering comparison against a string fact or a misspelled fact name.

use super::nodes::{ComparisonOp, Expression, Operand, Value};
use std::collections::HashMap;
use std::fmt;

/// Type of a fact or literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactType {
    String,
    Number,
    Bool,
    Any,
}

impl FactType {
    /// Get type from value
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(_) => FactType::String,
            Value::Number(_) => FactType::Number,
            Value::Bool(_) => FactType::Bool,
        }
    }

    /// Check if this type is compatible with another under `==`/`!=`
    pub fn is_compatible_with(&self, other: &FactType) -> bool {
        match (self, other) {
            (FactType::Any, _) | (_, FactType::Any) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for FactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactType::String => write!(f, "String"),
            FactType::Number => write!(f, "Number"),
            FactType::Bool => write!(f, "Bool"),
            FactType::Any => write!(f, "Any"),
        }
    }
}

/// Known fact names and their types
#[derive(Debug, Clone, Default)]
pub struct FactSchema {
    facts: HashMap<String, FactType>,
}

impl FactSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fact binding
    pub fn bind(&mut self, name: impl Into<String>, typ: FactType) {
        self.facts.insert(name.into(), typ);
    }

    /// Look up a fact type
    pub fn lookup(&self, name: &str) -> Option<FactType> {
        self.facts.get(name).copied()
    }

    /// Schema of the facts built from a part inspection
    pub fn standard() -> Self {
        let mut schema = Self::new();
        for name in ["color", "color_hex", "size_category", "part_type", "shape", "surface_quality"] {
            schema.bind(name, FactType::String);
        }
        for name in ["size_mm", "confidence", "defect_count"] {
            schema.bind(name, FactType::Number);
        }
        schema.bind("defect_detected", FactType::Bool);
        schema
    }
}

/// Something a condition does that will make it fail or never match
#[derive(Debug, Clone, PartialEq)]
pub enum TypeFinding {
    /// Fact name absent from the schema
    UnknownFact { name: String },
    /// Ordering comparison on an operand that never coerces to a number
    NonNumericOrdering { op: ComparisonOp, operand: String, found: FactType },
    /// Equality between types that are never equal
    IncompatibleEquality { left: FactType, right: FactType },
}

impl fmt::Display for TypeFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFinding::UnknownFact { name } => write!(f, "unknown fact '{}'", name),
            TypeFinding::NonNumericOrdering { op, operand, found } => {
                write!(f, "'{}' compares {} of type {}", op, operand, found)
            }
            TypeFinding::IncompatibleEquality { left, right } => {
                write!(f, "equality between {} and {} is always false", left, right)
            }
        }
    }
}

/// Type checker for conditions
pub struct TypeChecker {
    schema: FactSchema,
    findings: Vec<TypeFinding>,
}

impl TypeChecker {
    /// Create a new type checker
    pub fn new(schema: FactSchema) -> Self {
        Self { schema, findings: Vec::new() }
    }

    /// Check an expression, accumulating findings
    pub fn check_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Literal(_) => {}
            Expression::Identifier(name) => {
                self.check_identifier(name);
            }
            Expression::Comparison { left, op, right } => {
                let left_type = self.check_operand(left);
                let right_type = self.check_operand(right);

                if op.is_ordering() {
                    for (operand, typ) in [(left, left_type), (right, right_type)] {
                        if !Self::may_be_numeric(operand, typ) {
                            self.findings.push(TypeFinding::NonNumericOrdering {
                                op: *op,
                                operand: operand.to_string(),
                                found: typ,
                            });
                        }
                    }
                } else if !left_type.is_compatible_with(&right_type) {
                    self.findings.push(TypeFinding::IncompatibleEquality {
                        left: left_type,
                        right: right_type,
                    });
                }
            }
            Expression::Logical { left, right, .. } => {
                self.check_expression(left);
                self.check_expression(right);
            }
        }
    }

    fn check_operand(&mut self, operand: &Operand) -> FactType {
        match operand {
            Operand::Literal(value) => FactType::from_value(value),
            Operand::Identifier(name) => self.check_identifier(name),
        }
    }

    fn check_identifier(&mut self, name: &str) -> FactType {
        match self.schema.lookup(name) {
            Some(typ) => typ,
            None => {
                self.findings.push(TypeFinding::UnknownFact { name: name.to_string() });
                FactType::Any
            }
        }
    }

    fn may_be_numeric(operand: &Operand, typ: FactType) -> bool {
        match operand {
            Operand::Literal(value) => value.as_number().is_some(),
            // String facts may still carry numeric text at runtime
            Operand::Identifier(_) => typ != FactType::Bool,
        }
    }

    /// Get collected findings
    pub fn findings(&self) -> &[TypeFinding] {
        &self.findings
    }

    /// Consume the checker, returning its findings
    pub fn into_findings(self) -> Vec<TypeFinding> {
        self.findings
    }
}
