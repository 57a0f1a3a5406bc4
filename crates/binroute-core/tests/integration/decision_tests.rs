//! Integration tests for routing decisions, safety checks and validation

use super::common::{facts, sorting_policy};
use binroute_core::context::{DefectDetail, DefectInspection, PartClassification, SurfaceQuality};
use binroute_core::engine::decide;
use binroute_core::{
    check_command, validate_policy, Action, DecisionEngine, DecisionRule, DefaultAction, EngineConfig,
    EvaluationContext, ExecutablePolicy, RuleOutcome, Severity,
};

fn review() -> DefaultAction {
    DefaultAction::new(Action::ManualReview, "REVIEW_BIN")
}

#[test]
fn test_lowest_priority_value_wins() {
    let rules = vec![
        DecisionRule::new("R1", 2, "defect_detected == true", Action::Reject, "REJECT_BIN"),
        DecisionRule::new("R2", 1, "confidence < 0.7", Action::ManualReview, "REVIEW_BIN"),
    ];
    let ctx = facts(r#"{"defect_detected": true, "confidence": 0.4}"#);

    let decision = DecisionEngine::default().decide(&rules, &review(), &ctx, 0.4);

    assert_eq!(decision.rule_id, "R2");
    assert_eq!(decision.target_bin, "REVIEW_BIN");
    assert_eq!(decision.rule_condition, "confidence < 0.7");
}

#[test]
fn test_malformed_rule_does_not_block_valid_rule() {
    let rules = vec![
        DecisionRule::new("BROKEN", 1, "size_mm >>", Action::Reject, "REJECT_BIN"),
        DecisionRule::new("VALID", 2, "size_mm > 50", Action::Sort, "BIN_A"),
    ];
    let ctx = facts(r#"{"size_mm": 62}"#);

    let decision = DecisionEngine::default().decide_traced(&rules, &review(), &ctx, 1.0);

    assert_eq!(decision.rule_id, "VALID");
    match &decision.trace[0].outcome {
        RuleOutcome::Skipped { reason } => assert!(reason.contains("Parse error")),
        other => panic!("expected skipped rule, got {:?}", other),
    }
}

#[test]
fn test_no_match_uses_default() {
    let rules = vec![DecisionRule::new("R1", 1, "color == 'green'", Action::Sort, "BIN_C")];
    let ctx = facts(r#"{"color": "purple"}"#);

    let decision = decide(&rules, &review(), &ctx, 0.75);

    assert_eq!(decision.rule_id, "DEFAULT");
    assert_eq!(decision.rule_condition, "no_rule_matched");
    assert_eq!(decision.action, Action::ManualReview);
    assert_eq!(decision.target_bin, "REVIEW_BIN");
    assert_eq!(decision.confidence, 0.75);
}

#[test]
fn test_empty_rules_use_default() {
    let default = DefaultAction::new(Action::Reject, "REJECT_BIN");
    let decision = decide(&[], &default, &EvaluationContext::new(), 0.0);
    assert_eq!(decision.action, Action::Reject);
    assert_eq!(decision.target_bin, "REJECT_BIN");
}

#[test]
fn test_all_rules_broken_still_decides() {
    let rules = vec![
        DecisionRule::new("R1", 1, "((", Action::Sort, "BIN_A"),
        DecisionRule::new("R2", 2, "color > 1", Action::Sort, "BIN_B"),
        DecisionRule::new("R3", 3, "@", Action::Sort, "BIN_C"),
    ];
    let ctx = facts(r#"{"color": "red"}"#);
    let decision = DecisionEngine::default().decide_traced(&rules, &review(), &ctx, 0.5);

    assert!(decision.is_default());
    assert!(decision
        .trace
        .iter()
        .all(|t| matches!(t.outcome, RuleOutcome::Skipped { .. })));
}

#[test]
fn test_sorting_policy_routes_parts() {
    let policy = sorting_policy();
    let engine = DecisionEngine::default();
    let route = |json: &str| engine.decide_policy(&policy, &facts(json), 0.9);

    let red = route(r#"{"color": "red", "size_mm": 62, "confidence": 0.9, "defect_detected": false}"#);
    assert_eq!((red.rule_id.as_str(), red.target_bin.as_str()), ("RULE_003", "BIN_A"));
    assert_eq!(red.source.map(|s| s.page), Some(3));

    let blue = route(r#"{"color": "blue", "size_mm": 50, "confidence": 0.9, "defect_detected": false}"#);
    assert_eq!(blue.target_bin, "BIN_B");

    let green = route(r#"{"color": "green", "size_mm": 12, "confidence": 0.9, "defect_detected": false}"#);
    assert_eq!(green.target_bin, "BIN_C");

    let cracked = route(r#"{"color": "red", "size_mm": 62, "confidence": 0.9, "defect_detected": true}"#);
    assert_eq!(cracked.action, Action::Reject);

    // Sparse context: only the default can apply
    let unknown = route(r#"{"shape": "round"}"#);
    assert!(unknown.is_default());
}

#[test]
fn test_decide_from_inspection() {
    let policy = sorting_policy();
    let classification: PartClassification =
        serde_json::from_str(r#"{"color": "blue", "size_mm": 35.5, "shape": "square", "confidence": 0.88}"#).unwrap();
    let defects = DefectInspection {
        defect_detected: false,
        defects: vec![],
        surface_quality: SurfaceQuality::Acceptable,
        overall_confidence: 0.9,
    };

    let decision = DecisionEngine::default().decide_inspection(&policy, &classification, &defects);
    assert_eq!(decision.rule_id, "RULE_004");
    assert_eq!(decision.confidence, 0.88);

    let low_confidence = PartClassification { confidence: 0.3, ..classification.clone() };
    let decision = DecisionEngine::default().decide_inspection(&policy, &low_confidence, &defects);
    assert_eq!(decision.action, Action::ManualReview);
    assert!(decision.requires_operator);

    let chipped = DefectInspection {
        defect_detected: true,
        defects: vec![DefectDetail::default()],
        ..defects
    };
    let decision = DecisionEngine::default().decide_inspection(&policy, &classification, &chipped);
    assert_eq!(decision.rule_id, "RULE_001");
}

#[test]
fn test_defect_count_fact() {
    let policy = ExecutablePolicy::new("counting").with_rule(DecisionRule::new(
        "MANY_DEFECTS",
        1,
        "defect_count >= 2",
        Action::Reject,
        "REJECT_BIN",
    ));
    let defects = DefectInspection {
        defect_detected: true,
        defects: vec![DefectDetail::default(), DefectDetail::default()],
        ..Default::default()
    };
    let decision =
        DecisionEngine::default().decide_inspection(&policy, &PartClassification::default(), &defects);
    assert_eq!(decision.rule_id, "MANY_DEFECTS");
}

#[test]
fn test_speed_limit_violation() {
    let policy = sorting_policy();
    let check = check_command(&policy.safety_constraints, "speed_pct", 85.0);

    assert!(!check.passed);
    let message = &check.violations[0];
    assert!(message.contains("85"));
    assert!(message.contains("80"));
    assert!(message.contains("machine_spec.pdf p4"));
}

#[test]
fn test_speed_within_limit() {
    let policy = sorting_policy();
    assert!(check_command(&policy.safety_constraints, "speed_pct", 80.0).passed);
    assert!(check_command(&policy.safety_constraints, "grip_force_n", 14.9).passed);
}

#[test]
fn test_validate_sorting_policy() {
    let report = validate_policy(&sorting_policy(), &EngineConfig::default());
    assert!(report.is_complete);
    assert_eq!(report.severity, Severity::Ok);
    assert_eq!(report.coverage_pct, 1.0);
    assert!(report.ambiguities.is_empty());
}

#[test]
fn test_validate_partial_policy() {
    let policy = ExecutablePolicy::new("partial")
        .with_rule(DecisionRule::new("R1", 1, "color == 'red'", Action::Sort, "BIN_A"))
        .with_rule(DecisionRule::new("R2", 2, "size_mm >>", Action::Sort, "BIN_B"));

    let report = validate_policy(&policy, &EngineConfig::default());
    assert!(report.is_complete);
    assert_eq!(report.severity, Severity::Warning);
    assert_eq!(report.coverage_pct, 0.4);
    assert_eq!(report.ambiguities.len(), 1);
    assert!(report.missing_elements.contains(&"no_safety_constraints".to_string()));
}

#[test]
fn test_decision_json_shape() {
    let decision = decide(
        &sorting_policy().decision_rules,
        &review(),
        &facts(r#"{"color": "red", "size_mm": 62, "confidence": 0.9}"#),
        0.9,
    );
    let json = serde_json::to_value(&decision).unwrap();
    assert_eq!(json["action"], "SORT");
    assert_eq!(json["target_bin"], "BIN_A");
    assert_eq!(json["rule_id"], "RULE_003");
    assert_eq!(json["source"]["document_name"], "sorting_sop.pdf");
}
