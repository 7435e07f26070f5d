#[cfg(test)]
mod integration_tests {
    use chartley::{Chartley, ChartleyError, GrammarError};

    fn leaf_names(tree: &chartley::ParseTree) -> Vec<String> {
        tree.leaves()
            .iter()
            .map(|&(name, _)| name.to_string())
            .collect()
    }

    #[test]
    fn nested_nullable_grammar_end_to_end() {
        let engine =
            Chartley::from_rules(&["S -> A S | #", "A -> a B", "B -> b C b", "C -> c C | #"])
                .unwrap();
        let tree = engine.parse("abccbabb").unwrap();
        assert_eq!(
            leaf_names(&tree),
            vec!["a", "b", "c", "c", "b", "a", "b", "b"]
        );
    }

    #[test]
    fn empty_input_parses_when_the_start_is_nullable() {
        let engine =
            Chartley::from_rules(&["S -> A S | #", "A -> a B", "B -> b C b", "C -> c C | #"])
                .unwrap();
        let tree = engine.parse("").unwrap();
        assert!(tree.leaves().is_empty());
    }

    #[test]
    fn dangling_else_resolves_to_the_if_else_alternative() {
        let engine = Chartley::from_rules(&["S -> A S | #", "A -> if A | if A else A | ;"]).unwrap();
        let tree = engine.parse("if if ; else ;").unwrap();
        assert_eq!(leaf_names(&tree), vec!["if", "if", ";", "else", ";"]);
        // The outer A must be reduced with `if A else A`, not `if A`; the
        // flattened yield alone cannot tell the two derivations apart.
        match &tree.children()[0] {
            chartley::ParseTree::Node { production, .. } => {
                assert_eq!(production.lhs, "A");
                assert_eq!(production.rhs, vec!["if", "A", "else", "A"]);
            }
            other => panic!("unexpected subtree: {:?}", other),
        }
        // Determinism: the same input always produces the same shape.
        assert_eq!(tree, engine.parse("if if ; else ;").unwrap());
    }

    #[test]
    fn unparseable_input_is_rejected() {
        let engine = Chartley::with_patterns(
            &["S -> A B | #", "A -> A num | num", "B -> abc | id | #"],
            &[("num", "[0-9]+"), ("id", "[a-z]+")],
        )
        .unwrap();
        match engine.parse("4 foo 4") {
            Err(ChartleyError::Rejected(_)) => {}
            other => panic!("expected rejection, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn unlexable_input_is_a_lex_failure() {
        let engine = Chartley::with_patterns(
            &["S -> A B | #", "A -> A num | num", "B -> abc | id | #"],
            &[("num", "[0-9]+"), ("id", "[a-z]+")],
        )
        .unwrap();
        match engine.parse("4 #") {
            Err(ChartleyError::Lex(err)) => {
                assert_eq!(err.word, "#");
                assert_eq!(err.partial.len(), 2);
            }
            other => panic!("expected lex failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn left_recursive_sums_lex_and_parse() {
        let engine = Chartley::with_patterns(
            &["Sum -> Sum + Term | Term", "Term -> Term * num | num"],
            &[("num", "[0-9]+")],
        )
        .unwrap();
        let tree = engine.parse("1 + 2 * 3 + 4").unwrap();
        assert_eq!(
            leaf_names(&tree),
            vec!["num", "+", "num", "*", "num", "+", "num"]
        );
    }

    #[test]
    fn keywords_beat_identifier_patterns() {
        let engine = Chartley::with_patterns(
            &["Stmt -> while id do Stmt | id"],
            &[("id", "[a-z]+")],
        )
        .unwrap();
        let tree = engine.parse("while x do y").unwrap();
        assert_eq!(leaf_names(&tree), vec!["while", "id", "do", "id"]);
    }

    #[test]
    fn yield_reproduces_the_raw_input() {
        let engine = Chartley::with_patterns(
            &["List -> List , id | id"],
            &[("id", "[a-z]+")],
        )
        .unwrap();
        let input = "foo , bar , baz";
        let tree = engine.parse(input).unwrap();
        let raws: Vec<&str> = tree.leaves().iter().map(|&(_, raw)| raw).collect();
        let words: Vec<&str> = input.split_whitespace().collect();
        assert_eq!(raws, words);
    }

    #[test]
    fn invalid_grammar_is_reported_before_parsing() {
        assert!(matches!(
            Chartley::from_rules(&["S -> $"]),
            Err(GrammarError::MalformedRule { .. })
        ));
        assert!(matches!(
            Chartley::from_rules(&[]),
            Err(GrammarError::Empty)
        ));
    }
}
