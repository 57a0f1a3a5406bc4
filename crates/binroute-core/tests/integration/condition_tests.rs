//! Integration tests for the condition language: lexing, parsing, canonical
//! rendering and evaluation

use super::common::facts;
use binroute_core::ast::{referenced_facts, FactSchema, TypeChecker};
use binroute_core::parser::TokenKind;
use binroute_core::{evaluate, parse_condition, tokenize, EvalError, LexError, ParseError};

#[test]
fn test_red_large_part_matches() {
    let expr = parse_condition("color == 'red' AND size_mm > 50").unwrap();
    let ctx = facts(r#"{"color": "red", "size_mm": 62}"#);
    assert_eq!(evaluate(&expr, &ctx), Ok(true));
}

#[test]
fn test_blue_part_does_not_match() {
    let expr = parse_condition("color == 'red' AND size_mm > 50").unwrap();
    let ctx = facts(r#"{"color": "blue", "size_mm": 62}"#);
    assert_eq!(evaluate(&expr, &ctx), Ok(false));
}

#[test]
fn test_longest_operator_match() {
    let kinds: Vec<TokenKind> = tokenize("a>=1 b<=2 c!=3 d==4 e>5 f<6")
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| k.is_operator())
        .collect();
    assert_eq!(
        kinds,
        vec![TokenKind::GtEq, TokenKind::LtEq, TokenKind::Neq, TokenKind::Eq, TokenKind::Gt, TokenKind::Lt]
    );
}

#[test]
fn test_lex_error_reports_byte_offset() {
    assert_eq!(tokenize("size_mm > 50 & x"), Err(LexError { offset: 13, found: '&' }));
    // Multi-byte characters before the error shift the byte offset
    assert_eq!(tokenize("'é' == x ; y").unwrap_err().offset, 10);
}

#[test]
fn test_unterminated_string() {
    assert_eq!(tokenize("color == 'red"), Err(LexError { offset: 9, found: '\'' }));
}

#[test]
fn test_lone_bang_and_equals_are_errors() {
    assert!(tokenize("a ! b").is_err());
    assert!(tokenize("a = b").is_err());
}

#[test]
fn test_malformed_conditions() {
    assert!(matches!(parse_condition("size_mm >>"), Err(ParseError::UnexpectedToken { .. })));
    assert!(matches!(parse_condition("color == 'red' AND"), Err(ParseError::UnexpectedToken { .. })));
    assert!(matches!(parse_condition("(size_mm > 5"), Err(ParseError::UnexpectedToken { .. })));
    assert!(matches!(parse_condition(""), Err(ParseError::UnexpectedToken { .. })));
    assert!(matches!(parse_condition("a == b == c"), Err(ParseError::TrailingInput { .. })));
    assert!(matches!(parse_condition("size_mm > 5)"), Err(ParseError::TrailingInput { .. })));
    assert!(matches!(parse_condition("color # 'red'"), Err(ParseError::Lex(_))));
}

#[test]
fn test_parenthesized_operands() {
    let ctx = facts(r#"{"size_mm": 62}"#);
    let expr = parse_condition("size_mm > (50)").unwrap();
    assert_eq!(evaluate(&expr, &ctx), Ok(true));

    assert!(matches!(
        parse_condition("size_mm > (a AND b)"),
        Err(ParseError::InvalidOperand { offset: 10 })
    ));
}

#[test]
fn test_and_binds_tighter_than_or() {
    let ctx = facts(r#"{"color": "red", "size_mm": 10, "confidence": 0.5}"#);
    let loose = parse_condition("color == 'red' OR size_mm > 50 AND confidence > 0.9").unwrap();
    let grouped = parse_condition("(color == 'red' OR size_mm > 50) AND confidence > 0.9").unwrap();

    assert_eq!(evaluate(&loose, &ctx), Ok(true));
    assert_eq!(evaluate(&grouped, &ctx), Ok(false));
}

#[test]
fn test_canonical_rendering_reparses() {
    for source in [
        "color == \"red\"   AND   size_mm>50",
        "(a OR b) AND c",
        "a OR b AND c",
        "a AND (b AND c)",
        "defect_detected",
        "confidence <= -0.25",
    ] {
        let expr = parse_condition(source).unwrap();
        let rendered = expr.to_string();
        assert_eq!(parse_condition(&rendered).unwrap(), expr, "{} -> {}", source, rendered);
    }

    let expr = parse_condition("color == \"red\"   AND   size_mm>50").unwrap();
    assert_eq!(expr.to_string(), "color == 'red' AND size_mm > 50");
}

#[test]
fn test_missing_fact_never_matches_or_errors() {
    let ctx = facts(r#"{"color": "red"}"#);
    for source in ["size_mm == 5", "size_mm != 5", "size_mm > 5", "size_mm <= 5", "size_mm"] {
        let expr = parse_condition(source).unwrap();
        assert_eq!(evaluate(&expr, &ctx), Ok(false), "{}", source);
    }
}

#[test]
fn test_ordering_on_strings_is_type_error() {
    let ctx = facts(r#"{"color": "red"}"#);
    let expr = parse_condition("color >= 'blue'").unwrap();
    assert!(matches!(evaluate(&expr, &ctx), Err(EvalError::TypeMismatch { .. })));
}

#[test]
fn test_cross_type_equality_is_false() {
    let ctx = facts(r#"{"size_mm": 50, "defect_detected": true}"#);
    let expr = parse_condition("size_mm == '50' OR defect_detected == 1").unwrap();
    assert_eq!(evaluate(&expr, &ctx), Ok(false));
}

#[test]
fn test_referenced_facts_and_static_check() {
    let expr = parse_condition("colour == 'red' AND size_mm > 'large'").unwrap();
    let names: Vec<String> = referenced_facts(&expr).into_iter().collect();
    assert_eq!(names, vec!["colour".to_string(), "size_mm".to_string()]);

    let mut checker = TypeChecker::new(FactSchema::standard());
    checker.check_expression(&expr);
    assert_eq!(checker.findings().len(), 2);
}
