use crate::recognizer::Chart;

/// A production the parser was still inside when the input ran out of
/// derivations: its lhs, the rhs symbols not yet matched, and the column
/// the attempt began at.
#[derive(Debug, Clone)]
pub struct RuleHint<'gr> {
    pub lhs: &'gr str,
    pub remaining: Vec<&'gr str>,
    pub origin: usize,
}

/// The chart holds no accepting entry: the input is not in the language.
///
/// `pos` is the furthest column the recognizer populated, `found` the token
/// sitting there (if the input did not simply end), and `hints` the
/// continuations that were still open at that point.
#[derive(Debug, Clone)]
pub struct Rejection<'gr, 'inp> {
    pub pos: usize,
    pub found: Option<&'inp str>,
    pub hints: Vec<RuleHint<'gr>>,
}

impl<'gr, 'inp> std::fmt::Display for Rejection<'gr, 'inp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.found {
            Some(found) => write!(f, "input rejected at token {} (`{}`)", self.pos, found)?,
            None => write!(f, "input rejected at end of input (token {})", self.pos)?,
        }
        if !self.hints.is_empty() {
            write!(f, "; expected continuations:")?;
            for hint in &self.hints {
                write!(f, "\n  {} -> {}", hint.lhs, hint.remaining.join(" "))?;
            }
        }
        Ok(())
    }
}

impl<'gr, 'inp> std::error::Error for Rejection<'gr, 'inp> {}

impl<'gr, 'inp> Chart<'gr, 'inp> {
    /// Acceptance with diagnostics: `Ok` when the chart accepts, otherwise a
    /// [`Rejection`] describing how far recognition got and what could have
    /// continued from there.
    pub fn try_accept(&self) -> Result<(), Rejection<'gr, 'inp>> {
        if self.accepted() {
            return Ok(());
        }

        let mut furthest = 0;
        for k in 0..self.column_count() {
            if !self.column(k).is_empty() {
                furthest = k;
            }
        }
        let found = self.tokens().get(furthest).map(|t| t.raw);

        let mut hints = Vec::new();
        for key in self.column(furthest).iter() {
            let Some(lhs) = self.lhs(key.item.prod) else {
                continue;
            };
            if self.is_reduce(key.item) {
                continue;
            }
            let remaining = (key.item.dot..self.rhs_len(key.item.prod))
                .filter_map(|i| self.rhs_symbol(key.item.prod, i))
                .collect();
            hints.push(RuleHint {
                lhs,
                remaining,
                origin: key.origin,
            });
        }

        Err(Rejection {
            pos: furthest,
            found,
            hints,
        })
    }
}

#[cfg(test)]
mod try_accept_tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::lexer::Token;
    use crate::recognizer::Chart;

    fn toks<'a>(names: &[&'a str]) -> Vec<Token<'a>> {
        names.iter().map(|&n| Token::new(n, n)).collect()
    }

    #[test]
    fn accepting_chart_is_ok() {
        let grammar = Grammar::new(&["S -> a"]).unwrap();
        let mut chart = Chart::new(&grammar, toks(&["a"]));
        chart.recognize();
        assert!(chart.try_accept().is_ok());
    }

    #[test]
    fn truncated_input_reports_open_continuations() {
        let grammar = Grammar::new(&["S -> a b c"]).unwrap();
        let mut chart = Chart::new(&grammar, toks(&["a", "b"]));
        chart.recognize();
        let rejection = chart.try_accept().unwrap_err();
        assert_eq!(rejection.pos, 2);
        assert_eq!(rejection.found, None);
        assert_eq!(rejection.hints.len(), 1);
        assert_eq!(rejection.hints[0].lhs, "S");
        assert_eq!(rejection.hints[0].remaining, vec!["c"]);
        assert_eq!(rejection.hints[0].origin, 0);
    }

    #[test]
    fn multiple_hints_render_on_separate_lines() {
        let grammar = Grammar::new(&["S -> a b | a c"]).unwrap();
        let mut chart = Chart::new(&grammar, toks(&["a"]));
        chart.recognize();
        let rejection = chart.try_accept().unwrap_err();
        assert_eq!(rejection.hints.len(), 2);
        let rendered = rejection.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "  S -> b");
        assert_eq!(lines[2], "  S -> c");
    }

    #[test]
    fn stray_token_is_named() {
        let grammar = Grammar::new(&["S -> a b"]).unwrap();
        let mut chart = Chart::new(&grammar, toks(&["a", "x"]));
        chart.recognize();
        let rejection = chart.try_accept().unwrap_err();
        assert_eq!(rejection.pos, 1);
        assert_eq!(rejection.found, Some("x"));
        assert!(rejection
            .hints
            .iter()
            .any(|h| h.lhs == "S" && h.remaining == vec!["b"]));
        assert!(rejection.to_string().contains("S -> b"));
    }
}
