mod rules;
#[cfg(test)]
mod tests_rejections;

use crate::ordered_set::OrderedSet;
use chumsky::Parser;
use std::collections::HashMap;
use thiserror::Error;

/// The empty string. Only valid as the sole right-hand side of a production.
pub const EPSILON: &str = "#";
/// End of input. Never valid inside a production; seeds FOLLOW of the start.
pub const END_MARK: &str = "$";

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("malformed rule `{rule}`: {reason}")]
    MalformedRule { rule: String, reason: String },
    #[error("grammar defines no productions")]
    Empty,
    #[error("`{name}` does not name a nonterminal of the grammar")]
    UnknownStart { name: String },
    #[error("token pattern `{name}` is not a valid regex")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// One alternative of a rule, in canonical form. An epsilon production has
/// the single-element rhs `["#"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production<'gr> {
    pub lhs: &'gr str,
    pub rhs: Vec<&'gr str>,
}

/// An analysed context-free grammar.
///
/// Built once from rule strings of the form `LHS -> ALT1 | ALT2 | ...` and
/// immutable afterwards. Construction canonicalises the productions (input
/// order preserved, one per alternative) and computes the nullable set,
/// FIRST and FOLLOW eagerly. Symbol and set iteration follows insertion
/// order, so two grammars built from the same rules analyse identically.
#[derive(Debug, Clone)]
pub struct Grammar<'gr> {
    productions: Vec<Production<'gr>>,
    rules_index: HashMap<&'gr str, Vec<usize>>,
    nonterms: OrderedSet<&'gr str>,
    terms: OrderedSet<&'gr str>,
    start: &'gr str,
    nullable: OrderedSet<&'gr str>,
    first: HashMap<&'gr str, OrderedSet<&'gr str>>,
    follow: HashMap<&'gr str, OrderedSet<&'gr str>>,
}

impl<'gr> Grammar<'gr> {
    /// Parse and analyse a grammar, one rule string per slice element. The
    /// lhs of the first rule becomes the start symbol.
    pub fn new(rule_texts: &[&'gr str]) -> Result<Self, GrammarError> {
        let mut productions = Vec::new();
        for &text in rule_texts {
            let raw = rules::rule()
                .parse(text)
                .into_result()
                .map_err(|errors| GrammarError::MalformedRule {
                    rule: text.to_string(),
                    reason: errors
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; "),
                })?;
            validate(text, raw.lhs, &raw.alts)?;
            for alt in raw.alts {
                productions.push(Production { lhs: raw.lhs, rhs: alt });
            }
        }
        if productions.is_empty() {
            return Err(GrammarError::Empty);
        }

        let mut nonterms = OrderedSet::new();
        for prod in &productions {
            nonterms.add(prod.lhs);
        }
        let mut terms = OrderedSet::new();
        for prod in &productions {
            for &sym in &prod.rhs {
                if sym != EPSILON && !nonterms.contains(&sym) {
                    terms.add(sym);
                }
            }
        }
        let mut rules_index: HashMap<&'gr str, Vec<usize>> = HashMap::new();
        for (i, prod) in productions.iter().enumerate() {
            rules_index.entry(prod.lhs).or_default().push(i);
        }
        let start = productions[0].lhs;

        let nullable = compute_nullable(&productions);
        let first_full = compute_first(&productions, &nonterms, &terms, &nullable);
        let follow = compute_follow(&productions, &nonterms, &nullable, &first_full, start);

        // FIRST of a terminal is itself; only nonterminal entries are kept.
        let mut first = HashMap::new();
        for &n in nonterms.iter() {
            if let Some(set) = first_full.get(n) {
                first.insert(n, set.clone());
            }
        }

        Ok(Grammar {
            productions,
            rules_index,
            nonterms,
            terms,
            start,
            nullable,
            first,
            follow,
        })
    }

    /// All productions, in input order.
    pub fn productions(&self) -> &[Production<'gr>] {
        &self.productions
    }

    /// Indices into [`Self::productions`] of the alternatives for `name`,
    /// in input order. Empty for terminals and unknown symbols.
    pub fn prods_for(&self, name: &str) -> &[usize] {
        self.rules_index
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The alternatives for `name`, in input order.
    pub fn rules_for(&self, name: &str) -> impl Iterator<Item = &Production<'gr>> {
        self.prods_for(name).iter().map(|&i| &self.productions[i])
    }

    pub fn start(&self) -> &'gr str {
        self.start
    }

    pub fn nonterms(&self) -> &OrderedSet<&'gr str> {
        &self.nonterms
    }

    pub fn terms(&self) -> &OrderedSet<&'gr str> {
        &self.terms
    }

    /// Every symbol of the grammar: nonterminals first, then terminals,
    /// each in insertion order.
    pub fn symbols(&self) -> impl Iterator<Item = &'gr str> + '_ {
        self.nonterms.iter().chain(self.terms.iter()).copied()
    }

    pub fn is_nonterm(&self, sym: &str) -> bool {
        self.nonterms.contains(&sym)
    }

    /// Whether `sym` can derive the empty string. `#` itself is not a
    /// member of the nullable set.
    pub fn is_nullable(&self, sym: &str) -> bool {
        self.nullable.contains(&sym)
    }

    pub fn nullable_set(&self) -> &OrderedSet<&'gr str> {
        &self.nullable
    }

    /// FIRST of a nonterminal: the terminals that can begin a string it
    /// derives, plus `#` iff it is nullable.
    pub fn first_of(&self, nonterm: &str) -> Option<&OrderedSet<&'gr str>> {
        self.first.get(nonterm)
    }

    /// FOLLOW of a nonterminal: the terminals that can appear immediately
    /// after it in a sentential form, plus `$` where it can end one. `#`
    /// never appears in a FOLLOW set.
    pub fn follow_of(&self, nonterm: &str) -> Option<&OrderedSet<&'gr str>> {
        self.follow.get(nonterm)
    }

    /// FIRST of every nonterminal, in nonterminal insertion order.
    pub fn first_sets(&self) -> impl Iterator<Item = (&'gr str, &OrderedSet<&'gr str>)> + '_ {
        self.nonterms
            .iter()
            .filter_map(move |&n| self.first.get(n).map(|set| (n, set)))
    }

    /// FOLLOW of every nonterminal, in nonterminal insertion order.
    pub fn follow_sets(&self) -> impl Iterator<Item = (&'gr str, &OrderedSet<&'gr str>)> + '_ {
        self.nonterms
            .iter()
            .filter_map(move |&n| self.follow.get(n).map(|set| (n, set)))
    }
}

impl<'gr> std::fmt::Display for Production<'gr> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.lhs, self.rhs.join(" "))
    }
}

/// Renders one rule line per nonterminal, alternatives joined with `|`, in
/// the grammar's own order; the output parses back to the same productions.
impl<'gr> std::fmt::Display for Grammar<'gr> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, &nonterm) in self.nonterms.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let alts: Vec<String> = self
                .rules_for(nonterm)
                .map(|prod| prod.rhs.join(" "))
                .collect();
            write!(f, "{} -> {}", nonterm, alts.join(" | "))?;
        }
        Ok(())
    }
}

fn validate(rule: &str, lhs: &str, alts: &[Vec<&str>]) -> Result<(), GrammarError> {
    let malformed = |reason: String| GrammarError::MalformedRule {
        rule: rule.to_string(),
        reason,
    };
    if lhs == END_MARK || lhs == EPSILON {
        return Err(malformed(format!("`{}` may not be a left-hand side", lhs)));
    }
    for alt in alts {
        if alt.iter().any(|&sym| sym == END_MARK) {
            return Err(malformed(format!(
                "`{}` may not appear in a production",
                END_MARK
            )));
        }
        if alt.len() > 1 && alt.contains(&EPSILON) {
            return Err(malformed(format!(
                "`{}` must be the only symbol of its alternative",
                EPSILON
            )));
        }
    }
    Ok(())
}

fn compute_nullable<'gr>(productions: &[Production<'gr>]) -> OrderedSet<&'gr str> {
    let mut nullable = OrderedSet::new();
    let mut changed = true;
    while changed {
        changed = false;
        for prod in productions {
            if nullable.contains(&prod.lhs) {
                continue;
            }
            let all_nullable = prod
                .rhs
                .iter()
                .all(|&sym| sym == EPSILON || nullable.contains(&sym));
            if all_nullable {
                nullable.add(prod.lhs);
                changed = true;
            }
        }
    }
    nullable
}

/// FIRST over every symbol, terminals included. For each production the rhs
/// is walked left to right, gathering FIRST of each symbol and stopping at
/// the first non-nullable one; a walk that falls off the end marks the lhs
/// with `#`.
fn compute_first<'gr>(
    productions: &[Production<'gr>],
    nonterms: &OrderedSet<&'gr str>,
    terms: &OrderedSet<&'gr str>,
    nullable: &OrderedSet<&'gr str>,
) -> HashMap<&'gr str, OrderedSet<&'gr str>> {
    let mut first: HashMap<&'gr str, OrderedSet<&'gr str>> = HashMap::new();
    for &t in terms.iter() {
        first.insert(t, [t].into_iter().collect());
    }
    for &n in nonterms.iter() {
        first.entry(n).or_default();
    }

    let mut changed = true;
    while changed {
        changed = false;
        for prod in productions {
            let mut gathered: Vec<&'gr str> = Vec::new();
            let mut every_symbol_nullable = true;
            for &sym in &prod.rhs {
                if sym == EPSILON {
                    continue;
                }
                if let Some(set) = first.get(sym) {
                    gathered.extend(set.iter().copied().filter(|&s| s != EPSILON));
                }
                if !nullable.contains(&sym) {
                    every_symbol_nullable = false;
                    break;
                }
            }
            if every_symbol_nullable {
                gathered.push(EPSILON);
            }
            let target = first.entry(prod.lhs).or_default();
            for sym in gathered {
                changed |= target.add(sym);
            }
        }
    }
    first
}

/// FOLLOW by the right-to-left trailer sweep: the trailer starts as FOLLOW
/// of the lhs, is unioned into FOLLOW of each nonterminal encountered, and
/// is extended with FIRST of nullable symbols or reset to FIRST of
/// non-nullable ones.
fn compute_follow<'gr>(
    productions: &[Production<'gr>],
    nonterms: &OrderedSet<&'gr str>,
    nullable: &OrderedSet<&'gr str>,
    first: &HashMap<&'gr str, OrderedSet<&'gr str>>,
    start: &'gr str,
) -> HashMap<&'gr str, OrderedSet<&'gr str>> {
    let mut follow: HashMap<&'gr str, OrderedSet<&'gr str>> = HashMap::new();
    for &n in nonterms.iter() {
        follow.entry(n).or_default();
    }
    follow.entry(start).or_default().add(END_MARK);

    let mut changed = true;
    while changed {
        changed = false;
        for prod in productions {
            let mut trailer = follow.get(prod.lhs).cloned().unwrap_or_default();
            for &sym in prod.rhs.iter().rev() {
                if nonterms.contains(&sym) {
                    let target = follow.entry(sym).or_default();
                    for &s in trailer.iter() {
                        changed |= target.add(s);
                    }
                }
                if sym == EPSILON || nullable.contains(&sym) {
                    if let Some(set) = first.get(sym) {
                        for &s in set.iter() {
                            if s != EPSILON {
                                trailer.add(s);
                            }
                        }
                    }
                } else {
                    trailer = first.get(sym).cloned().unwrap_or_default();
                }
            }
        }
    }
    follow
}
