use super::*;

fn reject(rules: &[&str]) -> GrammarError {
    match Grammar::new(rules) {
        Err(e) => e,
        Ok(_) => panic!("expected {:?} to be rejected", rules),
    }
}

#[test]
fn empty_rule_set() {
    assert!(matches!(reject(&[]), GrammarError::Empty));
}

#[test]
fn end_mark_in_production() {
    let e = reject(&["S -> $"]);
    assert!(matches!(e, GrammarError::MalformedRule { .. }));
}

#[test]
fn trailing_empty_alternative() {
    assert!(matches!(
        reject(&["S -> a |"]),
        GrammarError::MalformedRule { .. }
    ));
}

#[test]
fn epsilon_with_other_symbols() {
    assert!(matches!(
        reject(&["S -> # a"]),
        GrammarError::MalformedRule { .. }
    ));
}

#[test]
fn doubled_arrow() {
    assert!(matches!(
        reject(&["S ->->"]),
        GrammarError::MalformedRule { .. }
    ));
}

#[test]
fn arrow_inside_rhs() {
    assert!(matches!(
        reject(&["S -> a -> b"]),
        GrammarError::MalformedRule { .. }
    ));
}

#[test]
fn empty_rhs() {
    assert!(matches!(
        reject(&["S ->"]),
        GrammarError::MalformedRule { .. }
    ));
}

#[test]
fn missing_lhs() {
    assert!(matches!(
        reject(&[" -> a"]),
        GrammarError::MalformedRule { .. }
    ));
}

#[test]
fn missing_arrow() {
    assert!(matches!(reject(&["S"]), GrammarError::MalformedRule { .. }));
}

#[test]
fn epsilon_as_lhs() {
    assert!(matches!(
        reject(&["# -> a"]),
        GrammarError::MalformedRule { .. }
    ));
}

#[test]
fn end_mark_as_lhs() {
    assert!(matches!(
        reject(&["$ -> a"]),
        GrammarError::MalformedRule { .. }
    ));
}

#[test]
fn one_bad_rule_spoils_the_grammar() {
    let e = reject(&["S -> a", "T ->"]);
    match e {
        GrammarError::MalformedRule { rule, .. } => assert_eq!(rule, "T ->"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn error_message_names_the_rule() {
    let e = reject(&["S -> $"]);
    assert!(e.to_string().contains("S -> $"));
}
