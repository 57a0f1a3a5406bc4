//! Tree-walking condition evaluator
//!
//! Facts missing from the context are unset. An unset operand makes every
//! comparison false and is falsy in a truthy check, so a rule that reads an
//! unmeasured fact simply does not match.

use crate::ast::{ComparisonOp, Expression, LogicalOp, Operand, Value};
use crate::context::EvaluationContext;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("cannot apply '{op}' to {left} and {right}")]
    TypeMismatch { op: ComparisonOp, left: String, right: String },
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Evaluates parsed conditions against a fact context
pub struct Interpreter<'ctx> {
    ctx: &'ctx EvaluationContext,
}

impl<'ctx> Interpreter<'ctx> {
    pub fn new(ctx: &'ctx EvaluationContext) -> Self {
        Self { ctx }
    }

    /// Evaluate an expression to a boolean
    pub fn evaluate(&self, expr: &Expression) -> EvalResult<bool> {
        match expr {
            Expression::Literal(value) => Ok(value.is_truthy()),
            Expression::Identifier(name) => Ok(self.ctx.get(name).is_some_and(Value::is_truthy)),
            Expression::Comparison { left, op, right } => self.compare(left, *op, right),
            Expression::Logical { left, op, right } => match op {
                LogicalOp::And => Ok(self.evaluate(left)? && self.evaluate(right)?),
                LogicalOp::Or => Ok(self.evaluate(left)? || self.evaluate(right)?),
            },
        }
    }

    fn resolve<'a>(&'a self, operand: &'a Operand) -> Option<&'a Value> {
        match operand {
            Operand::Literal(value) => Some(value),
            Operand::Identifier(name) => self.ctx.get(name),
        }
    }

    fn compare(&self, left: &Operand, op: ComparisonOp, right: &Operand) -> EvalResult<bool> {
        let (Some(lhs), Some(rhs)) = (self.resolve(left), self.resolve(right)) else {
            return Ok(false);
        };

        match op {
            ComparisonOp::Eq => Ok(lhs.strict_eq(rhs)),
            ComparisonOp::Neq => Ok(!lhs.strict_eq(rhs)),
            _ => match (lhs.as_number(), rhs.as_number()) {
                (Some(a), Some(b)) => Ok(op.compare_numbers(a, b)),
                _ => Err(EvalError::TypeMismatch {
                    op,
                    left: describe(lhs),
                    right: describe(rhs),
                }),
            },
        }
    }
}

fn describe(value: &Value) -> String {
    format!("{} {}", value.type_name(), value)
}

/// Evaluate a condition against a context
pub fn evaluate(expr: &Expression, ctx: &EvaluationContext) -> EvalResult<bool> {
    Interpreter::new(ctx).evaluate(expr)
}
