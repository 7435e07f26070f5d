//! Earley parsing for declarative context-free grammars.
//!
//! A grammar is a list of rule strings (`"Expr -> Expr + Term | Term"`);
//! [`Chartley`] analyses it once, tokenises input against its terminals
//! (plus optional named regex patterns) and parses by building an Earley
//! chart, so left recursion, nullable productions and ambiguity all work.
//! An ambiguous input yields one deterministic tree, chosen by chart
//! insertion order.

pub mod grammar;
pub mod lexer;
mod ordered_set;
pub mod parser;
pub mod recognizer;
mod try_accept;

pub use grammar::{Grammar, GrammarError, Production, END_MARK, EPSILON};
pub use lexer::{LexError, Lexer, Token, TokenPattern};
pub use ordered_set::{Cursor, OrderedSet};
pub use parser::{ParseTree, TreeError};
pub use recognizer::Chart;
pub use try_accept::{Rejection, RuleHint};

use thiserror::Error;

/// Any way a parse can fail, from grammar definition to tree building.
#[derive(Debug, Error)]
pub enum ChartleyError<'gr, 'inp> {
    #[error("invalid grammar: {0}")]
    InvalidGrammar(#[from] GrammarError),
    #[error("lexing failed: {0}")]
    Lex(LexError<'inp>),
    #[error("{0}")]
    Rejected(Rejection<'gr, 'inp>),
    #[error("could not build a parse tree: {0}")]
    Tree(#[from] TreeError),
}

/// A ready-to-use parser: an analysed [`Grammar`] plus the compiled token
/// patterns its lexer runs with.
///
/// ```
/// use chartley::Chartley;
///
/// let engine = Chartley::with_patterns(
///     &["Sum -> Sum + num | num"],
///     &[("num", "[0-9]+")],
/// )
/// .unwrap();
/// let tree = engine.parse("1 + 23 + 4").unwrap();
/// assert_eq!(tree.leaves().len(), 5);
/// ```
pub struct Chartley<'gr> {
    grammar: Grammar<'gr>,
    patterns: Vec<TokenPattern<'gr>>,
}

impl<'gr> Chartley<'gr> {
    /// An engine whose lexer knows only the grammar's literal terminals.
    pub fn from_rules(rules: &[&'gr str]) -> Result<Self, GrammarError> {
        Ok(Chartley {
            grammar: Grammar::new(rules)?,
            patterns: Vec::new(),
        })
    }

    /// An engine with named regex token patterns. Terminals named by a
    /// pattern are lexed by it; all others match literally.
    pub fn with_patterns(
        rules: &[&'gr str],
        patterns: &[(&'gr str, &str)],
    ) -> Result<Self, GrammarError> {
        let grammar = Grammar::new(rules)?;
        let patterns = patterns
            .iter()
            .map(|&(name, pattern)| TokenPattern::new(name, pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Chartley { grammar, patterns })
    }

    pub fn grammar(&self) -> &Grammar<'gr> {
        &self.grammar
    }

    pub fn tokenize<'inp>(&'gr self, input: &'inp str) -> Result<Vec<Token<'inp>>, LexError<'inp>>
    where
        'gr: 'inp,
    {
        Lexer::new(&self.grammar, &self.patterns).tokenize(input)
    }

    /// Tokenise `input` and parse it from the grammar's start symbol.
    pub fn parse<'inp>(
        &'gr self,
        input: &'inp str,
    ) -> Result<ParseTree<'gr, 'inp>, ChartleyError<'gr, 'inp>>
    where
        'gr: 'inp,
    {
        let tokens = self.tokenize(input).map_err(ChartleyError::Lex)?;
        self.parse_tokens(tokens)
    }

    /// Parse from `start` instead of the grammar's start symbol.
    pub fn parse_from<'inp>(
        &'gr self,
        start: &str,
        input: &'inp str,
    ) -> Result<ParseTree<'gr, 'inp>, ChartleyError<'gr, 'inp>>
    where
        'gr: 'inp,
    {
        let start = self
            .grammar
            .nonterms()
            .iter()
            .copied()
            .find(|&n| n == start)
            .ok_or_else(|| GrammarError::UnknownStart {
                name: start.to_string(),
            })?;
        let tokens = self.tokenize(input).map_err(ChartleyError::Lex)?;
        let mut chart = Chart::with_start(&self.grammar, tokens, start);
        chart.recognize();
        chart.try_accept().map_err(ChartleyError::Rejected)?;
        Ok(chart.build_parse_tree()?)
    }

    /// Parse a synthesised token stream, bypassing the lexer.
    pub fn parse_tokens<'inp>(
        &'gr self,
        tokens: Vec<Token<'inp>>,
    ) -> Result<ParseTree<'gr, 'inp>, ChartleyError<'gr, 'inp>>
    where
        'gr: 'inp,
    {
        let mut chart = Chart::new(&self.grammar, tokens);
        chart.recognize();
        chart.try_accept().map_err(ChartleyError::Rejected)?;
        Ok(chart.build_parse_tree()?)
    }
}
