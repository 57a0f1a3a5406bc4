//! Abstract Syntax Tree (AST) for rule conditions
//!
//! The AST is the parsed form of a condition string, evaluated by the
//! [`interpreter`](crate::interpreter) against a fact context.

pub mod nodes;
pub mod types;
pub mod visitor;

pub use nodes::{ComparisonOp, Expression, LogicalOp, Operand, Value};
pub use types::{FactSchema, FactType, TypeChecker, TypeFinding};
pub use visitor::{referenced_facts, walk_expression, Visitor};
