//! Integration tests for the policy store lifecycle and version diffs

use super::common::{facts, sorting_policy, sorting_policy_with_id};
use binroute_core::{
    diff_policies, Action, DecisionEngine, DecisionRule, DiffKind, Error, ExecutablePolicy, PolicyStatus, PolicyStore,
    Severity,
};
use std::sync::Arc;
use std::thread;

fn revised(policy_id: &str) -> ExecutablePolicy {
    let mut policy = sorting_policy_with_id(policy_id);
    policy.version = 2;
    policy.decision_rules.retain(|r| r.id != "RULE_005");
    if let Some(rule) = policy.decision_rules.iter_mut().find(|r| r.id == "RULE_003") {
        rule.condition = "color == 'red' AND size_mm > 60".to_string();
    }
    policy
        .decision_rules
        .push(DecisionRule::new("RULE_006", 6, "color == 'yellow'", Action::Sort, "BIN_D"));
    if let Some(limit) = policy.safety_constraints.iter_mut().find(|c| c.parameter == "speed_pct") {
        limit.value = 70.0;
    }
    policy
}

#[test]
fn test_diff_between_versions() {
    let diffs = diff_policies(&sorting_policy(), &revised("sorting-v2"));

    let summary: Vec<(DiffKind, &str)> = diffs.iter().map(|d| (d.kind, d.item_id.as_str())).collect();
    assert_eq!(
        summary,
        vec![
            (DiffKind::RuleModified, "RULE_003"),
            (DiffKind::RuleAdded, "RULE_006"),
            (DiffKind::RuleRemoved, "RULE_005"),
            (DiffKind::ThresholdChanged, "speed_pct"),
        ]
    );

    let threshold = &diffs[3];
    assert_eq!(threshold.old_value.as_deref(), Some("80"));
    assert_eq!(threshold.new_value.as_deref(), Some("70"));
    assert_eq!(threshold.source.as_ref().map(|s| s.page), Some(4));
}

#[test]
fn test_diff_of_identical_policies_is_empty() {
    assert!(diff_policies(&sorting_policy(), &sorting_policy()).is_empty());
}

#[test]
fn test_approve_then_supersede() {
    let store = PolicyStore::default();
    store.store(sorting_policy_with_id("sorting-v1"));
    store.store(revised("sorting-v2"));

    let first = store.approve("sorting-v1").unwrap();
    assert_eq!(first.validation.severity, Severity::Ok);
    assert!(first.diffs.is_empty());
    assert!(first.previous_policy_id.is_none());

    let second = store.approve("sorting-v2").unwrap();
    assert_eq!(second.previous_policy_id.as_deref(), Some("sorting-v1"));
    assert_eq!(second.diffs.len(), 4);

    assert_eq!(store.get("sorting-v1").map(|p| p.status), Some(PolicyStatus::Suspended));
    assert_eq!(store.active().map(|p| p.policy_id.clone()), Some("sorting-v2".to_string()));
    assert_eq!(store.stats().activations, 2);
}

#[test]
fn test_active_policy_drives_decisions() {
    let store = PolicyStore::default();
    store.store(sorting_policy_with_id("sorting-v1"));
    store.store(revised("sorting-v2"));
    let engine = DecisionEngine::default();
    let part = facts(r#"{"color": "red", "size_mm": 55, "confidence": 0.9, "defect_detected": false}"#);

    store.approve("sorting-v1").unwrap();
    let active = store.active().unwrap();
    assert_eq!(engine.decide_policy(&active, &part, 0.9).target_bin, "BIN_A");

    // The revised threshold no longer admits a 55 mm red part
    store.approve("sorting-v2").unwrap();
    let active = store.active().unwrap();
    assert!(engine.decide_policy(&active, &part, 0.9).is_default());
}

#[test]
fn test_critical_policy_stays_draft() {
    let store = PolicyStore::default();
    store.store(ExecutablePolicy::new("empty"));

    let err = store.approve("empty").unwrap_err();
    assert!(matches!(err, Error::PolicyRejected { ref policy_id, .. } if policy_id == "empty"));

    let stored = store.get("empty").unwrap();
    assert_eq!(stored.status, PolicyStatus::Draft);
    assert_eq!(stored.validation.severity, Severity::Critical);
    assert!(store.active().is_none());
}

#[test]
fn test_suspend_and_reapprove() {
    let store = PolicyStore::default();
    store.store(sorting_policy_with_id("sorting-v1"));
    store.approve("sorting-v1").unwrap();

    store.suspend("sorting-v1").unwrap();
    assert!(store.active().is_none());
    assert_eq!(store.by_status(PolicyStatus::Suspended).len(), 1);

    store.approve("sorting-v1").unwrap();
    assert!(store.active().is_some());
}

#[test]
fn test_rejected_policy_is_terminal() {
    let store = PolicyStore::default();
    store.store(sorting_policy_with_id("sorting-v1"));
    store.reject("sorting-v1").unwrap();

    assert!(matches!(
        store.approve("sorting-v1"),
        Err(Error::InvalidTransition { from: PolicyStatus::Rejected, .. })
    ));
    assert!(matches!(store.suspend("sorting-v1"), Err(Error::InvalidTransition { .. })));
}

#[test]
fn test_concurrent_readers_see_a_policy() {
    let store = Arc::new(PolicyStore::default());
    store.store(sorting_policy_with_id("sorting-v1"));
    store.store(revised("sorting-v2"));
    store.approve("sorting-v1").unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0..200)
                    .filter_map(|_| store.active())
                    .all(|p| p.policy_id == "sorting-v1" || p.policy_id == "sorting-v2")
            })
        })
        .collect();

    store.approve("sorting-v2").unwrap();

    for reader in readers {
        assert!(reader.join().unwrap());
    }
    assert!(store.stats().reads >= 800);
}
