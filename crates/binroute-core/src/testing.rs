//! Test utilities and fixtures for binroute tests
//!
//! Shared policy and context builders so unit tests read as scenarios
//! rather than setup.

use crate::ast::ComparisonOp;
use crate::context::EvaluationContext;
use crate::policy::{
    Action, DecisionRule, DefaultAction, DocumentSource, ExecutablePolicy, InspectionCriterion, SafetyConstraint,
    VisionMode, VisionPrompt,
};

/// A complete sorting policy that validates as OK
///
/// Rejects defective parts, sends low-confidence parts to review and sorts
/// red, blue and green parts by size. Every rule cites page 1 of
/// `sorting_sop.pdf`.
pub fn sample_policy(policy_id: &str) -> ExecutablePolicy {
    let source = DocumentSource::new("sorting_sop.pdf", 1).with_section("Sorting Criteria");
    let rules = [
        ("RULE_001", 1, "defect_detected == true", Action::Reject, "REJECT_BIN"),
        ("RULE_002", 2, "confidence < 0.7", Action::ManualReview, "REVIEW_BIN"),
        ("RULE_003", 3, "color == 'red' AND size_mm > 50", Action::Sort, "BIN_A"),
        ("RULE_004", 4, "color == 'blue' AND size_mm >= 30 AND size_mm <= 50", Action::Sort, "BIN_B"),
        ("RULE_005", 5, "color == 'green' AND size_mm < 30", Action::Sort, "BIN_C"),
    ];

    let mut policy = ExecutablePolicy::new(policy_id).with_default_action(DefaultAction::default());
    policy.source_documents.push(source.clone());
    for (id, priority, condition, action, target) in rules {
        policy
            .decision_rules
            .push(DecisionRule::new(id, priority, condition, action, target).with_source(source.clone()));
    }
    policy.safety_constraints = vec![
        SafetyConstraint::new("SAFETY_001", "speed_pct", ComparisonOp::LtEq, 80.0, "%"),
        SafetyConstraint::new("SAFETY_002", "grip_force_n", ComparisonOp::LtEq, 15.0, "N"),
    ];
    policy.inspection_criteria.push(InspectionCriterion {
        id: "IC_001".to_string(),
        description: "Surface defect check".to_string(),
        check_type: Default::default(),
        threshold: None,
        action_on_fail: Default::default(),
        source: None,
    });
    policy
        .vision_instructions
        .insert("classify".to_string(), VisionPrompt::new("Classify color, size and shape", VisionMode::Classify));
    policy
        .vision_instructions
        .insert("defect".to_string(), VisionPrompt::new("Inspect for surface defects", VisionMode::Defect));
    policy
}

/// Edits a policy for diff and lifecycle tests
pub struct PolicyBuilder {
    policy: ExecutablePolicy,
}

impl PolicyBuilder {
    pub fn new(policy_id: &str) -> Self {
        Self { policy: ExecutablePolicy::new(policy_id) }
    }

    pub fn rule(mut self, id: &str, priority: i64, condition: &str, target_bin: &str) -> Self {
        self.policy
            .decision_rules
            .push(DecisionRule::new(id, priority, condition, Action::Sort, target_bin));
        self
    }

    pub fn remove_rule(mut self, id: &str) -> Self {
        self.policy.decision_rules.retain(|r| r.id != id);
        self
    }

    pub fn condition(mut self, id: &str, condition: &str) -> Self {
        if let Some(rule) = self.policy.decision_rules.iter_mut().find(|r| r.id == id) {
            rule.condition = condition.to_string();
        }
        self
    }

    pub fn retarget(mut self, id: &str, target_bin: &str) -> Self {
        if let Some(rule) = self.policy.decision_rules.iter_mut().find(|r| r.id == id) {
            rule.target_bin = target_bin.to_string();
        }
        self
    }

    pub fn threshold(mut self, parameter: &str, value: f64) -> Self {
        for constraint in self.policy.safety_constraints.iter_mut().filter(|c| c.parameter == parameter) {
            constraint.value = value;
        }
        self
    }

    pub fn default_action(mut self, action: Action, target_bin: &str) -> Self {
        self.policy.default_action = DefaultAction::new(action, target_bin);
        self
    }

    pub fn build(self) -> ExecutablePolicy {
        self.policy
    }
}

impl From<ExecutablePolicy> for PolicyBuilder {
    fn from(policy: ExecutablePolicy) -> Self {
        Self { policy }
    }
}

/// Context for a clean part of the given color and size
pub fn part_context(color: &str, size_mm: f64, confidence: f64) -> EvaluationContext {
    EvaluationContext::new()
        .with_fact("color", color)
        .with_fact("size_mm", size_mm)
        .with_fact("confidence", confidence)
        .with_fact("defect_detected", false)
}
