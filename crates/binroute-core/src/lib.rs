//! Part-routing policy core
//!
//! Conditions such as `color == 'red' AND size_mm > 50` are lexed, parsed
//! into an [`Expression`] and evaluated against an [`EvaluationContext`].
//! The [`DecisionEngine`] applies prioritized [`DecisionRule`]s to pick a
//! bin, falling back to the policy's default action. Safety checks, policy
//! validation, diffing and a lifecycle store work over the same data model.

pub mod ast;
pub mod cache;
pub mod config;
pub mod context;
pub mod diff;
pub mod engine;
pub mod interpreter;
pub mod parser;
pub mod policy;
pub mod safety;
pub mod store;
pub mod validation;

// Test utilities (available in tests and behind the `testing` feature)
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use ast::{ComparisonOp, Expression, LogicalOp, Operand, Value};
pub use cache::ConditionCache;
pub use config::EngineConfig;
pub use context::{DefectInspection, EvaluationContext, PartClassification};
pub use diff::{diff_policies, DiffKind, PolicyDiff};
pub use engine::{Decision, DecisionEngine, RuleOutcome, RuleTrace};
pub use interpreter::{evaluate, EvalError};
pub use parser::{parse_condition, tokenize, LexError, ParseError};
pub use policy::{Action, DecisionRule, DefaultAction, DocumentSource, ExecutablePolicy, PolicyStatus, SafetyConstraint};
pub use safety::{check_command, SafetyCheck};
pub use store::PolicyStore;
pub use validation::{validate_policy, PolicyValidation, Severity};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    #[error("Policy {policy_id} rejected: {reason}")]
    PolicyRejected { policy_id: String, reason: String },

    #[error("Policy {policy_id} cannot move from {from} to {to}")]
    InvalidTransition { policy_id: String, from: PolicyStatus, to: PolicyStatus },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
