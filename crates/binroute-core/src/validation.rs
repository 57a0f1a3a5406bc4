//! Structural completeness checks run before a policy is activated

use crate::ast::{FactSchema, TypeChecker};
use crate::config::EngineConfig;
use crate::parser::parse_condition;
use crate::policy::{ExecutablePolicy, PolicyConflict};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Ok,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Ok => write!(f, "OK"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Validation report consumed by the approval workflow
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyValidation {
    pub is_complete: bool,
    pub missing_elements: Vec<String>,
    pub severity: Severity,
    pub coverage_pct: f64,
    pub ambiguities: Vec<String>,
    pub conflicts: Vec<PolicyConflict>,
    pub recommendations: Vec<String>,
}

struct Validator {
    missing: Vec<String>,
    recommendations: Vec<String>,
    severity: Severity,
}

impl Validator {
    fn new() -> Self {
        Self { missing: Vec::new(), recommendations: Vec::new(), severity: Severity::Ok }
    }

    fn missing(&mut self, element: &str, severity: Severity, recommendation: &str) {
        self.missing.push(element.to_string());
        self.recommendations.push(recommendation.to_string());
        self.severity = self.severity.max(severity);
    }
}

/// Validate a policy for completeness
///
/// Missing decision rules are CRITICAL. Missing safety constraints or vision
/// instructions are WARNING. Missing inspection criteria are reported but do
/// not raise the severity. Conditions that fail to parse, and static type
/// findings against the standard fact schema, are reported as ambiguities.
pub fn validate_policy(policy: &ExecutablePolicy, config: &EngineConfig) -> PolicyValidation {
    let mut validator = Validator::new();

    if policy.decision_rules.is_empty() {
        validator.missing("no_decision_rules", Severity::Critical, "add at least one decision rule");
    }
    if policy.safety_constraints.is_empty() {
        validator.missing("no_safety_constraints", Severity::Warning, "add speed and force limits");
    }
    if policy.vision_instructions.is_empty() {
        validator.missing("no_vision_instructions", Severity::Warning, "add classify and defect prompts");
    }
    if policy.inspection_criteria.is_empty() {
        validator.missing("no_inspection_criteria", Severity::Ok, "add inspection criteria");
    }

    let ambiguities = rule_ambiguities(policy);
    if !ambiguities.is_empty() {
        validator
            .recommendations
            .push("fix ambiguous rules; they never match at runtime".to_string());
    }

    PolicyValidation {
        is_complete: validator.severity != Severity::Critical,
        missing_elements: validator.missing,
        severity: validator.severity,
        coverage_pct: coverage(policy.decision_rules.len(), config.coverage_rule_target),
        ambiguities,
        conflicts: policy.conflicts.clone(),
        recommendations: validator.recommendations,
    }
}

fn rule_ambiguities(policy: &ExecutablePolicy) -> Vec<String> {
    let mut ambiguities = Vec::new();
    let mut seen = HashSet::new();
    let schema = FactSchema::standard();

    for rule in &policy.decision_rules {
        if !seen.insert(rule.id.as_str()) {
            ambiguities.push(format!("{}: duplicate rule id", rule.id));
        }

        match parse_condition(&rule.condition) {
            Ok(expr) => {
                let mut checker = TypeChecker::new(schema.clone());
                checker.check_expression(&expr);
                for finding in checker.into_findings() {
                    ambiguities.push(format!("{}: {}", rule.id, finding));
                }
            }
            Err(e) => {
                ambiguities.push(format!("{}: condition '{}' does not parse: {}", rule.id, rule.condition, e));
            }
        }
    }

    ambiguities
}

/// Fraction of the target rule count present, capped at 1 and rounded to
/// two decimals
fn coverage(rule_count: usize, target: usize) -> f64 {
    if target == 0 {
        return 1.0;
    }
    let ratio = (rule_count as f64 / target as f64).min(1.0);
    (ratio * 100.0).round() / 100.0
}
