//! Property-based tests for parsing and rule selection

use binroute_core::engine::decide;
use binroute_core::{
    evaluate, parse_condition, tokenize, Action, ComparisonOp, DecisionRule, DefaultAction, EvaluationContext,
    Expression, LogicalOp, Operand, Value,
};
use proptest::prelude::*;

fn identifier() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,6}".prop_filter("keywords are not identifiers", |s| s != "true" && s != "false")
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z ]{0,8}".prop_map(Value::String),
        (-1.0e6..1.0e6f64).prop_map(Value::Number),
        any::<bool>().prop_map(Value::Bool),
    ]
}

fn operand() -> impl Strategy<Value = Operand> {
    prop_oneof![value().prop_map(Operand::Literal), identifier().prop_map(Operand::Identifier)]
}

fn comparison_op() -> impl Strategy<Value = ComparisonOp> {
    prop_oneof![
        Just(ComparisonOp::Eq),
        Just(ComparisonOp::Neq),
        Just(ComparisonOp::Lt),
        Just(ComparisonOp::Gt),
        Just(ComparisonOp::LtEq),
        Just(ComparisonOp::GtEq),
    ]
}

fn expression() -> impl Strategy<Value = Expression> {
    let leaf = prop_oneof![
        value().prop_map(Expression::Literal),
        identifier().prop_map(Expression::Identifier),
        (operand(), comparison_op(), operand())
            .prop_map(|(left, op, right)| Expression::Comparison { left, op, right }),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        (inner.clone(), prop_oneof![Just(LogicalOp::And), Just(LogicalOp::Or)], inner).prop_map(
            |(left, op, right)| Expression::Logical { left: Box::new(left), op, right: Box::new(right) },
        )
    })
}

fn context() -> impl Strategy<Value = EvaluationContext> {
    prop::collection::vec((identifier(), value()), 0..6).prop_map(|facts| facts.into_iter().collect())
}

proptest! {
    #[test]
    fn test_rendering_reparses_to_same_tree(expr in expression()) {
        let rendered = expr.to_string();
        let reparsed = parse_condition(&rendered);
        prop_assert_eq!(reparsed, Ok(expr), "rendered as {}", rendered);
    }

    #[test]
    fn test_evaluation_is_deterministic(expr in expression(), ctx in context()) {
        prop_assert_eq!(evaluate(&expr, &ctx), evaluate(&expr, &ctx));
    }

    #[test]
    fn test_lexer_and_parser_never_panic(input in "\\PC{0,40}") {
        let _ = tokenize(&input);
        let _ = parse_condition(&input);
    }

    #[test]
    fn test_lowest_priority_true_rule_wins(rules in prop::collection::vec((-3i64..3, any::<bool>()), 0..12)) {
        let rules: Vec<DecisionRule> = rules
            .into_iter()
            .enumerate()
            .map(|(i, (priority, fires))| {
                let condition = if fires { "true" } else { "false" };
                DecisionRule::new(format!("R{}", i), priority, condition, Action::Sort, format!("BIN_{}", i))
            })
            .collect();
        let default = DefaultAction::new(Action::ManualReview, "REVIEW_BIN");

        let expected = rules
            .iter()
            .filter(|r| r.condition == "true")
            .min_by_key(|r| r.priority)
            .map(|r| r.id.clone())
            .unwrap_or_else(|| "DEFAULT".to_string());

        let decision = decide(&rules, &default, &EvaluationContext::new(), 1.0);
        prop_assert_eq!(decision.rule_id, expected);
    }
}
