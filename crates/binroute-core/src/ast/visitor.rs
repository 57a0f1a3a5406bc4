//! Visitor pattern for traversing condition trees

use super::nodes::{Expression, Operand, Value};
use std::collections::BTreeSet;

/// Visitor trait for AST traversal
pub trait Visitor: Sized {
    /// Visit an expression
    fn visit_expression(&mut self, expr: &Expression) {
        walk_expression(self, expr);
    }

    /// Visit a comparison operand
    fn visit_operand(&mut self, operand: &Operand) {
        walk_operand(self, operand);
    }

    /// Visit a fact reference
    fn visit_identifier(&mut self, _name: &str) {
        // Leaf node, no children
    }

    /// Visit a value
    fn visit_value(&mut self, _value: &Value) {
        // Leaf node, no children
    }
}

/// Walk an expression
pub fn walk_expression<V: Visitor>(visitor: &mut V, expr: &Expression) {
    match expr {
        Expression::Literal(value) => visitor.visit_value(value),
        Expression::Identifier(name) => visitor.visit_identifier(name),
        Expression::Comparison { left, right, .. } => {
            visitor.visit_operand(left);
            visitor.visit_operand(right);
        }
        Expression::Logical { left, right, .. } => {
            visitor.visit_expression(left);
            visitor.visit_expression(right);
        }
    }
}

/// Walk an operand
pub fn walk_operand<V: Visitor>(visitor: &mut V, operand: &Operand) {
    match operand {
        Operand::Literal(value) => visitor.visit_value(value),
        Operand::Identifier(name) => visitor.visit_identifier(name),
    }
}

/// Collects the fact names a condition reads
#[derive(Debug, Default)]
pub struct FactCollector {
    pub facts: BTreeSet<String>,
}

impl Visitor for FactCollector {
    fn visit_identifier(&mut self, name: &str) {
        self.facts.insert(name.to_string());
    }
}

/// Fact names referenced by an expression, sorted
pub fn referenced_facts(expr: &Expression) -> BTreeSet<String> {
    let mut collector = FactCollector::default();
    collector.visit_expression(expr);
    collector.facts
}
