//! Audit diff between two policy versions

use crate::ast::ComparisonOp;
use crate::policy::{DecisionRule, DocumentSource, ExecutablePolicy, SafetyConstraint};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffKind {
    RuleAdded,
    RuleRemoved,
    RuleModified,
    ThresholdChanged,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffKind::RuleAdded => write!(f, "RULE_ADDED"),
            DiffKind::RuleRemoved => write!(f, "RULE_REMOVED"),
            DiffKind::RuleModified => write!(f, "RULE_MODIFIED"),
            DiffKind::ThresholdChanged => write!(f, "THRESHOLD_CHANGED"),
        }
    }
}

/// One audited change between policy versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDiff {
    pub kind: DiffKind,
    /// Rule id, or constraint parameter for threshold changes
    pub item_id: String,
    /// Changed field for modifications
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub source: Option<DocumentSource>,
}

impl PolicyDiff {
    fn new(kind: DiffKind, item_id: &str) -> Self {
        Self {
            kind,
            item_id: item_id.to_string(),
            field: None,
            old_value: None,
            new_value: None,
            source: None,
        }
    }
}

impl fmt::Display for PolicyDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.item_id)?;
        if let Some(field) = &self.field {
            write!(f, ".{}", field)?;
        }
        match (&self.old_value, &self.new_value) {
            (Some(old), Some(new)) => write!(f, ": {} -> {}", old, new),
            (Some(old), None) => write!(f, ": {}", old),
            (None, Some(new)) => write!(f, ": {}", new),
            (None, None) => Ok(()),
        }
    }
}

/// Diff two policies: rules by id, then safety thresholds
pub fn diff_policies(old: &ExecutablePolicy, new: &ExecutablePolicy) -> Vec<PolicyDiff> {
    let mut diffs = diff_rules(&old.decision_rules, &new.decision_rules);
    diffs.extend(diff_thresholds(&old.safety_constraints, &new.safety_constraints));
    diffs
}

/// Classify rule changes keyed by rule id
///
/// A rule whose condition and target both changed yields one diff per field.
pub fn diff_rules(old: &[DecisionRule], new: &[DecisionRule]) -> Vec<PolicyDiff> {
    let old_by_id: HashMap<&str, &DecisionRule> = old.iter().map(|r| (r.id.as_str(), r)).collect();
    let new_by_id: HashMap<&str, &DecisionRule> = new.iter().map(|r| (r.id.as_str(), r)).collect();
    let mut diffs = Vec::new();

    for rule in new {
        match old_by_id.get(rule.id.as_str()) {
            None => diffs.push(PolicyDiff {
                new_value: Some(rule.to_string()),
                source: rule.source.clone(),
                ..PolicyDiff::new(DiffKind::RuleAdded, &rule.id)
            }),
            Some(previous) => {
                let fields = [
                    ("condition", &previous.condition, &rule.condition),
                    ("target_bin", &previous.target_bin, &rule.target_bin),
                ];
                for (field, before, after) in fields {
                    if before != after {
                        diffs.push(PolicyDiff {
                            field: Some(field.to_string()),
                            old_value: Some(before.clone()),
                            new_value: Some(after.clone()),
                            source: rule.source.clone(),
                            ..PolicyDiff::new(DiffKind::RuleModified, &rule.id)
                        });
                    }
                }
            }
        }
    }

    for rule in old {
        if !new_by_id.contains_key(rule.id.as_str()) {
            diffs.push(PolicyDiff {
                old_value: Some(rule.to_string()),
                source: rule.source.clone(),
                ..PolicyDiff::new(DiffKind::RuleRemoved, &rule.id)
            });
        }
    }

    diffs
}

/// Report limit changes for constraints present in both versions
///
/// Constraints are matched by parameter and operator, so a parameter with
/// both a lower and an upper bound is tracked per bound. A bound whose
/// operator changed has no such match and is paired with the unmatched old
/// bound on the same parameter; that change is reported on the `limit`
/// field with the operator in both values.
pub fn diff_thresholds(old: &[SafetyConstraint], new: &[SafetyConstraint]) -> Vec<PolicyDiff> {
    let old_by_key: HashMap<(&str, ComparisonOp), &SafetyConstraint> =
        old.iter().map(|c| (bound_key(c), c)).collect();
    let new_keys: HashSet<(&str, ComparisonOp)> = new.iter().map(bound_key).collect();
    let mut reshaped: Vec<&SafetyConstraint> = old.iter().filter(|c| !new_keys.contains(&bound_key(c))).collect();

    let mut diffs = Vec::new();
    for constraint in new {
        if let Some(previous) = old_by_key.get(&bound_key(constraint)) {
            if previous.value != constraint.value {
                diffs.push(PolicyDiff {
                    field: Some("value".to_string()),
                    old_value: Some(previous.value.to_string()),
                    new_value: Some(constraint.value.to_string()),
                    source: constraint.source.clone(),
                    ..PolicyDiff::new(DiffKind::ThresholdChanged, &constraint.parameter)
                });
            }
        } else if let Some(index) = reshaped.iter().position(|c| c.parameter == constraint.parameter) {
            let previous = reshaped.remove(index);
            diffs.push(PolicyDiff {
                field: Some("limit".to_string()),
                old_value: Some(format!("{} {}", previous.operator, previous.value)),
                new_value: Some(format!("{} {}", constraint.operator, constraint.value)),
                source: constraint.source.clone(),
                ..PolicyDiff::new(DiffKind::ThresholdChanged, &constraint.parameter)
            });
        }
    }
    diffs
}

fn bound_key(constraint: &SafetyConstraint) -> (&str, ComparisonOp) {
    (constraint.parameter.as_str(), constraint.operator)
}
