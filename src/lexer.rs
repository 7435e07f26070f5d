use crate::grammar::{Grammar, GrammarError};
use regex::Regex;

/// One unit of input: `name` identifies a grammar terminal (or the pattern
/// that produced the token), `raw` is the surface text. A failed match
/// yields a token with an empty name. Token lists may also be synthesised
/// directly and fed to the recognizer, bypassing the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub name: &'a str,
    pub raw: &'a str,
}

impl<'a> Token<'a> {
    pub fn new(name: &'a str, raw: &'a str) -> Self {
        Token { name, raw }
    }
}

impl<'a> std::fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:?})", self.name, self.raw)
    }
}

/// A named regex for one class of tokens, compiled to match only at the
/// scan position.
#[derive(Debug, Clone)]
pub struct TokenPattern<'gr> {
    name: &'gr str,
    regex: Regex,
}

impl<'gr> TokenPattern<'gr> {
    pub fn new(name: &'gr str, pattern: &str) -> Result<Self, GrammarError> {
        let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|source| {
            GrammarError::InvalidPattern {
                name: name.to_string(),
                source,
            }
        })?;
        Ok(TokenPattern { name, regex })
    }

    pub fn name(&self) -> &'gr str {
        self.name
    }
}

/// Tokenisation failed at some position. The scan keeps going after a
/// failure (each unmatched character becomes a token with an empty name),
/// so `partial` holds the best-effort token list for the whole input.
#[derive(Debug, Clone)]
pub struct LexError<'inp> {
    /// The word the failure occurred in.
    pub word: &'inp str,
    /// Index of that word in the whitespace-split input.
    pub word_index: usize,
    /// Byte offset of the failure in the full input.
    pub offset: usize,
    pub partial: Vec<Token<'inp>>,
}

impl<'inp> std::fmt::Display for LexError<'inp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no token matches at byte {} (word {} `{}`)",
            self.offset, self.word_index, self.word
        )
    }
}

impl<'inp> std::error::Error for LexError<'inp> {}

/// Longest-match tokeniser over whitespace-separated words.
///
/// Candidates at each position are the grammar's literal terminals (those
/// not claimed by a pattern name) and the supplied patterns. The longest
/// match wins; a literal beats a pattern of the same length, and an earlier
/// pattern beats a later one of the same length. This is what keeps a
/// keyword terminal like `while` from lexing as an identifier.
pub struct Lexer<'gr> {
    literals: Vec<&'gr str>,
    patterns: &'gr [TokenPattern<'gr>],
}

impl<'gr> Lexer<'gr> {
    pub fn new(grammar: &'gr Grammar<'gr>, patterns: &'gr [TokenPattern<'gr>]) -> Self {
        let literals = grammar
            .terms()
            .iter()
            .copied()
            .filter(|t| patterns.iter().all(|p| p.name != *t))
            .collect();
        Lexer { literals, patterns }
    }

    pub fn tokenize<'inp>(&self, input: &'inp str) -> Result<Vec<Token<'inp>>, LexError<'inp>>
    where
        'gr: 'inp,
    {
        let mut tokens = Vec::new();
        let mut failure: Option<(usize, &'inp str, usize)> = None;

        let words = input
            .split_whitespace()
            .map(|w| (w.as_ptr() as usize - input.as_ptr() as usize, w));
        for (word_index, (word_start, word)) in words.enumerate() {
            let mut pos = 0;
            while pos < word.len() {
                let rest = &word[pos..];
                match self.best_match(rest) {
                    Some((name, len)) => {
                        tokens.push(Token::new(name, &rest[..len]));
                        pos += len;
                    }
                    None => {
                        if failure.is_none() {
                            failure = Some((word_index, word, word_start + pos));
                        }
                        let step = rest.chars().next().map_or(1, char::len_utf8);
                        tokens.push(Token::new("", &rest[..step]));
                        pos += step;
                    }
                }
            }
        }

        match failure {
            None => Ok(tokens),
            Some((word_index, word, offset)) => Err(LexError {
                word,
                word_index,
                offset,
                partial: tokens,
            }),
        }
    }

    /// The winning candidate at the start of `rest`: its token name and
    /// match length. Literals are scanned before patterns and a candidate
    /// only displaces a strictly shorter one, which encodes both priority
    /// rules: literals beat patterns of equal length, earlier patterns beat
    /// later ones.
    fn best_match(&self, rest: &str) -> Option<(&'gr str, usize)> {
        let mut best: Option<(&'gr str, usize)> = None;
        for &lit in &self.literals {
            if rest.starts_with(lit) && best.map_or(true, |(_, len)| lit.len() > len) {
                best = Some((lit, lit.len()));
            }
        }
        for pat in self.patterns {
            if let Some(m) = pat.regex.find(rest) {
                if !m.is_empty() && best.map_or(true, |(_, len)| m.end() > len) {
                    best = Some((pat.name, m.end()));
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod lexer_tests {
    use super::*;
    use crate::grammar::Grammar;

    fn raws<'a>(tokens: &[Token<'a>]) -> Vec<&'a str> {
        tokens.iter().map(|t| t.raw).collect()
    }

    fn names<'a>(tokens: &[Token<'a>]) -> Vec<&'a str> {
        tokens.iter().map(|t| t.name).collect()
    }

    #[test]
    fn single_char_terminals_split_a_word() {
        let g = Grammar::new(&["S -> a b c"]).unwrap();
        let lexer = Lexer::new(&g, &[]);
        let tokens = lexer.tokenize("abc cba").unwrap();
        assert_eq!(raws(&tokens), vec!["a", "b", "c", "c", "b", "a"]);
    }

    #[test]
    fn longest_literal_wins() {
        let g = Grammar::new(&["S -> < <="]).unwrap();
        let lexer = Lexer::new(&g, &[]);
        let tokens = lexer.tokenize("<=<").unwrap();
        assert_eq!(names(&tokens), vec!["<=", "<"]);
    }

    #[test]
    fn literal_beats_pattern_of_equal_length() {
        let g = Grammar::new(&["S -> while id"]).unwrap();
        let patterns = [TokenPattern::new("id", "[a-z]+").unwrap()];
        let lexer = Lexer::new(&g, &patterns);
        let tokens = lexer.tokenize("while other").unwrap();
        assert_eq!(names(&tokens), vec!["while", "id"]);
        assert_eq!(raws(&tokens), vec!["while", "other"]);
    }

    #[test]
    fn longer_pattern_match_beats_shorter_literal() {
        let g = Grammar::new(&["S -> do id"]).unwrap();
        let patterns = [TokenPattern::new("id", "[a-z]+").unwrap()];
        let lexer = Lexer::new(&g, &patterns);
        let tokens = lexer.tokenize("dog").unwrap();
        assert_eq!(names(&tokens), vec!["id"]);
        assert_eq!(raws(&tokens), vec!["dog"]);
    }

    #[test]
    fn earlier_pattern_wins_ties() {
        let g = Grammar::new(&["S -> word any"]).unwrap();
        let patterns = [
            TokenPattern::new("word", "[a-z]+").unwrap(),
            TokenPattern::new("any", "[a-z0-9]+").unwrap(),
        ];
        let lexer = Lexer::new(&g, &patterns);
        let tokens = lexer.tokenize("abc").unwrap();
        assert_eq!(names(&tokens), vec!["word"]);
    }

    #[test]
    fn patterns_tokenize_numbers() {
        let g = Grammar::new(&["S -> num + num"]).unwrap();
        let patterns = [TokenPattern::new("num", "[0-9]+").unwrap()];
        let lexer = Lexer::new(&g, &patterns);
        let tokens = lexer.tokenize("12+345").unwrap();
        assert_eq!(names(&tokens), vec!["num", "+", "num"]);
        assert_eq!(raws(&tokens), vec!["12", "+", "345"]);
    }

    #[test]
    fn raw_fields_reproduce_each_word() {
        let g = Grammar::new(&["S -> ( id )"]).unwrap();
        let patterns = [TokenPattern::new("id", "[a-z]+").unwrap()];
        let lexer = Lexer::new(&g, &patterns);
        let input = "(abc) (de)";
        let tokens = lexer.tokenize(input).unwrap();
        let rebuilt: String = raws(&tokens).concat();
        let squashed: String = input.split_whitespace().collect();
        assert_eq!(rebuilt, squashed);
    }

    #[test]
    fn unmatched_character_reports_failure_with_partial_tokens() {
        let g = Grammar::new(&["S -> num"]).unwrap();
        let patterns = [TokenPattern::new("num", "[0-9]+").unwrap()];
        let lexer = Lexer::new(&g, &patterns);
        let err = lexer.tokenize("4 #").unwrap_err();
        assert_eq!(err.word, "#");
        assert_eq!(err.word_index, 1);
        assert_eq!(err.offset, 2);
        assert_eq!(names(&err.partial), vec!["num", ""]);
        assert_eq!(raws(&err.partial), vec!["4", "#"]);
    }

    #[test]
    fn scan_continues_past_a_failure() {
        let g = Grammar::new(&["S -> a"]).unwrap();
        let lexer = Lexer::new(&g, &[]);
        let err = lexer.tokenize("a!a").unwrap_err();
        assert_eq!(err.offset, 1);
        assert_eq!(raws(&err.partial), vec!["a", "!", "a"]);
        assert_eq!(names(&err.partial), vec!["a", "", "a"]);
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = TokenPattern::new("broken", "[unclosed").unwrap_err();
        assert!(matches!(err, GrammarError::InvalidPattern { .. }));
    }
}
