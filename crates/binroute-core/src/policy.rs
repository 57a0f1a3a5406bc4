//! Policy data model
//!
//! An [`ExecutablePolicy`] is the compiled form of one or more source
//! documents: ordered decision rules, safety limits, inspection criteria and
//! the fallback applied when no rule matches. Every rule and constraint may
//! carry the [`DocumentSource`] it was derived from for audit.

use crate::ast::ComparisonOp;
use crate::validation::PolicyValidation;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where a rule or constraint came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSource {
    pub document_id: String,
    pub document_name: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub row: Option<u32>,
    #[serde(default)]
    pub cell_text: String,
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl DocumentSource {
    pub fn new(document_name: impl Into<String>, page: u32) -> Self {
        Self {
            document_id: String::new(),
            document_name: document_name.into(),
            page,
            section: String::new(),
            table_id: None,
            row: None,
            cell_text: String::new(),
            bbox: None,
            confidence: full_confidence(),
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} p{}", self.document_name, self.page)?;
        if !self.section.is_empty() {
            write!(f, " ({})", self.section)?;
        }
        Ok(())
    }
}

/// What happens to a part once a decision is made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    #[default]
    Sort,
    Reject,
    ManualReview,
    Pass,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Sort => write!(f, "SORT"),
            Action::Reject => write!(f, "REJECT"),
            Action::ManualReview => write!(f, "MANUAL_REVIEW"),
            Action::Pass => write!(f, "PASS"),
        }
    }
}

/// A prioritized routing rule. Lower priority values are evaluated first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRule {
    pub id: String,
    #[serde(default)]
    pub priority: i64,
    pub condition: String,
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub target_bin: String,
    #[serde(default)]
    pub source: Option<DocumentSource>,
}

impl DecisionRule {
    pub fn new(
        id: impl Into<String>,
        priority: i64,
        condition: impl Into<String>,
        action: Action,
        target_bin: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            priority,
            condition: condition.into(),
            action,
            target_bin: target_bin.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: DocumentSource) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (p{}): IF {} THEN {} -> {}",
            self.id, self.priority, self.condition, self.action, self.target_bin
        )?;
        if let Some(source) = &self.source {
            write!(f, " [from: {} p{}]", source.document_name, source.page)?;
        }
        Ok(())
    }
}

/// Rules in evaluation order: ascending priority, list order on ties
pub fn priority_order(rules: &[DecisionRule]) -> Vec<&DecisionRule> {
    let mut ordered: Vec<&DecisionRule> = rules.iter().collect();
    // sort_by_key is stable
    ordered.sort_by_key(|rule| rule.priority);
    ordered
}

/// A numeric limit on a robot command parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyConstraint {
    pub id: String,
    pub parameter: String,
    #[serde(default = "default_constraint_op")]
    pub operator: ComparisonOp,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub source: Option<DocumentSource>,
}

fn default_constraint_op() -> ComparisonOp {
    ComparisonOp::LtEq
}

impl SafetyConstraint {
    pub fn new(
        id: impl Into<String>,
        parameter: impl Into<String>,
        operator: ComparisonOp,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parameter: parameter.into(),
            operator,
            value,
            unit: unit.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: DocumentSource) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for SafetyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {} {}{}", self.id, self.parameter, self.operator, self.value, self.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    #[default]
    Visual,
    Dimensional,
    Surface,
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckType::Visual => write!(f, "visual"),
            CheckType::Dimensional => write!(f, "dimensional"),
            CheckType::Surface => write!(f, "surface"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureAction {
    #[default]
    Reject,
    ManualReview,
    Flag,
}

impl fmt::Display for FailureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureAction::Reject => write!(f, "REJECT"),
            FailureAction::ManualReview => write!(f, "MANUAL_REVIEW"),
            FailureAction::Flag => write!(f, "FLAG"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionCriterion {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub check_type: CheckType,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub action_on_fail: FailureAction,
    #[serde(default)]
    pub source: Option<DocumentSource>,
}

impl fmt::Display for InspectionCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (type: {}, on_fail: {})",
            self.id, self.description, self.check_type, self.action_on_fail
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisionMode {
    #[default]
    Classify,
    Defect,
    Verify,
}

/// Instruction handed to the vision pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionPrompt {
    pub prompt: String,
    #[serde(default = "default_vision_model")]
    pub model: String,
    #[serde(default)]
    pub mode: VisionMode,
}

fn default_vision_model() -> String {
    "gemini-2.5-pro".to_string()
}

impl VisionPrompt {
    pub fn new(prompt: impl Into<String>, mode: VisionMode) -> Self {
        Self { prompt: prompt.into(), model: default_vision_model(), mode }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub step: u32,
    pub instruction: String,
    #[serde(default)]
    pub requires_confirmation: bool,
    #[serde(default)]
    pub source: Option<DocumentSource>,
}

/// Fallback applied when no rule matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultAction {
    pub action: Action,
    pub target_bin: String,
}

impl DefaultAction {
    pub fn new(action: Action, target_bin: impl Into<String>) -> Self {
        Self { action, target_bin: target_bin.into() }
    }
}

impl Default for DefaultAction {
    fn default() -> Self {
        Self::new(Action::ManualReview, "REVIEW_BIN")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    #[default]
    ValueMismatch,
    RuleOverlap,
    MissingInOne,
}

/// Disagreement between two source documents found during compilation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConflict {
    pub conflict_type: ConflictType,
    pub description: String,
    pub doc_a: Option<DocumentSource>,
    pub doc_b: Option<DocumentSource>,
    pub resolution: String,
    pub requires_human: bool,
}

impl Default for PolicyConflict {
    fn default() -> Self {
        Self {
            conflict_type: ConflictType::ValueMismatch,
            description: String::new(),
            doc_a: None,
            doc_b: None,
            resolution: String::new(),
            requires_human: true,
        }
    }
}

/// Lifecycle state of a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    #[default]
    Draft,
    Approved,
    Suspended,
    Rejected,
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyStatus::Draft => write!(f, "DRAFT"),
            PolicyStatus::Approved => write!(f, "APPROVED"),
            PolicyStatus::Suspended => write!(f, "SUSPENDED"),
            PolicyStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// A compiled, versioned routing policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutablePolicy {
    pub policy_id: String,
    pub source_documents: Vec<DocumentSource>,
    pub version: u32,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,

    pub decision_rules: Vec<DecisionRule>,
    pub safety_constraints: Vec<SafetyConstraint>,
    pub inspection_criteria: Vec<InspectionCriterion>,
    pub vision_instructions: BTreeMap<String, VisionPrompt>,
    pub operator_workflows: Vec<WorkflowStep>,

    pub default_action: DefaultAction,
    pub conflicts: Vec<PolicyConflict>,
    pub validation: PolicyValidation,

    pub execution_sequence: Vec<String>,
}

impl Default for ExecutablePolicy {
    fn default() -> Self {
        let created_at = Utc::now();
        Self {
            policy_id: format!("policy-{}", created_at.format("%Y%m%d-%H%M%S")),
            source_documents: Vec::new(),
            version: 1,
            status: PolicyStatus::Draft,
            created_at,
            decision_rules: Vec::new(),
            safety_constraints: Vec::new(),
            inspection_criteria: Vec::new(),
            vision_instructions: BTreeMap::new(),
            operator_workflows: Vec::new(),
            default_action: DefaultAction::default(),
            conflicts: Vec::new(),
            validation: PolicyValidation::default(),
            execution_sequence: ["VISION_CLASSIFY", "VISION_DEFECT", "POLICY_DECIDE", "ROUTE_TO_BIN"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ExecutablePolicy {
    /// Create an empty draft policy
    pub fn new(policy_id: impl Into<String>) -> Self {
        Self { policy_id: policy_id.into(), ..Self::default() }
    }

    pub fn with_rule(mut self, rule: DecisionRule) -> Self {
        self.decision_rules.push(rule);
        self
    }

    pub fn with_constraint(mut self, constraint: SafetyConstraint) -> Self {
        self.safety_constraints.push(constraint);
        self
    }

    pub fn with_default_action(mut self, default_action: DefaultAction) -> Self {
        self.default_action = default_action;
        self
    }

    /// Load a policy from its persisted JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a rule by id
    pub fn rule(&self, id: &str) -> Option<&DecisionRule> {
        self.decision_rules.iter().find(|rule| rule.id == id)
    }

    /// Human-readable summary: rules in priority order, constraints,
    /// inspection criteria and the fallback.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("## Policy {} (v{}, {})", self.policy_id, self.version, self.status)];

        if !self.source_documents.is_empty() {
            let docs: Vec<&str> = self.source_documents.iter().map(|d| d.document_name.as_str()).collect();
            lines.push(format!("Source documents: {}", docs.join(", ")));
        }

        if !self.decision_rules.is_empty() {
            lines.push(String::new());
            lines.push("### Decision Rules (priority order):".to_string());
            for rule in priority_order(&self.decision_rules) {
                lines.push(format!("  {}", rule));
            }
        }

        if !self.safety_constraints.is_empty() {
            lines.push(String::new());
            lines.push("### Safety Constraints:".to_string());
            for constraint in &self.safety_constraints {
                lines.push(format!("  {}", constraint));
            }
        }

        if !self.inspection_criteria.is_empty() {
            lines.push(String::new());
            lines.push("### Inspection Criteria:".to_string());
            for criterion in &self.inspection_criteria {
                lines.push(format!("  {}", criterion));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "### Default Action: {} -> {}",
            self.default_action.action, self.default_action.target_bin
        ));
        lines.join("\n")
    }
}
