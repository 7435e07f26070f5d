use crate::grammar::{Production, EPSILON};
use crate::recognizer::{Chart, EntryId, EntryKey, Item, AUGMENTED};
use thiserror::Error;

/// A concrete parse tree.
///
/// Leaves carry a terminal symbol and the raw lexeme it matched (the
/// epsilon leaf's lexeme is empty); nodes carry the production they reduce
/// and their children in left-to-right grammatical order. The tree borrows
/// the grammar and the input but not the chart it was built from.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseTree<'gr, 'inp> {
    Leaf {
        symbol: &'gr str,
        raw: &'inp str,
    },
    Node {
        production: &'gr Production<'gr>,
        children: Vec<ParseTree<'gr, 'inp>>,
    },
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("chart has no accepting entry")]
    NotAccepted,
    /// Invariant violations while replaying the derivation. Unreachable for
    /// charts produced by `recognize`.
    #[error("chart is internally inconsistent: {0}")]
    Inconsistent(&'static str),
}

impl<'gr, 'inp> ParseTree<'gr, 'inp> {
    /// The nonterminal this subtree derives, or the terminal at a leaf.
    pub fn symbol(&self) -> &'gr str {
        match self {
            ParseTree::Leaf { symbol, .. } => symbol,
            ParseTree::Node { production, .. } => production.lhs,
        }
    }

    pub fn children(&self) -> &[ParseTree<'gr, 'inp>] {
        match self {
            ParseTree::Leaf { .. } => &[],
            ParseTree::Node { children, .. } => children,
        }
    }

    /// The yield: left-to-right `(symbol, raw)` pairs of the non-epsilon
    /// leaves. Equal to the token stream the tree was parsed from.
    pub fn leaves(&self) -> Vec<(&'gr str, &'inp str)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<(&'gr str, &'inp str)>) {
        match self {
            ParseTree::Leaf { symbol, raw } => {
                if *symbol != EPSILON {
                    out.push((symbol, raw));
                }
            }
            ParseTree::Node { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Indented dump, one symbol per line.
    pub fn pretty_print(&self, indent: usize) {
        let padding = "  ".repeat(indent);
        match self {
            ParseTree::Leaf { symbol, raw } => {
                println!("{}{}({:?})", padding, symbol, raw);
            }
            ParseTree::Node {
                production,
                children,
            } => {
                println!("{}{} -> {}", padding, production.lhs, production.rhs.join(" "));
                for child in children {
                    child.pretty_print(indent + 1);
                }
            }
        }
    }
}

/// Frames of the backward derivation walk: chart entries still to process,
/// and the key a parent reduction expects its subtree to bottom out at.
enum Frame {
    Entry(EntryId),
    Expect(EntryKey),
}

impl<'gr, 'inp> Chart<'gr, 'inp> {
    /// Reconstruct one concrete parse tree from an accepting chart.
    ///
    /// The rightmost derivation is replayed backwards from the accepting
    /// entry, consuming tokens right to left and predecessor links at each
    /// step; the visited entries then drive bottom-up assembly. Whenever an
    /// entry has several predecessors the first in insertion order is taken
    /// — chart construction order makes that prefer alternatives appearing
    /// earlier in the grammar — and no other candidate is tried: a first
    /// choice that fails to extend surfaces as `Inconsistent` rather than
    /// backtracking.
    pub fn build_parse_tree(&self) -> Result<ParseTree<'gr, 'inp>, TreeError> {
        let accept = self.accepting_entry().ok_or(TreeError::NotAccepted)?;
        let order = self.derivation_order(accept)?;
        self.assemble(&order)
    }

    /// Walk the derivation backwards, recording entries in the order
    /// visited: each reduce entry precedes the entries of its rhs, rightmost
    /// symbol first.
    fn derivation_order(&self, accept: EntryId) -> Result<Vec<EntryId>, TreeError> {
        let mut pending_names: Vec<&str> = self.tokens().iter().map(|t| t.name).collect();
        let mut stack = vec![Frame::Entry(accept)];
        let mut order = Vec::new();

        while let Some(frame) = stack.pop() {
            let id = match frame {
                Frame::Entry(id) => id,
                Frame::Expect(_) => {
                    return Err(TreeError::Inconsistent("expectation left unresolved"))
                }
            };
            order.push(id);
            let key = self.key_of(id);

            if key.item.dot == 0 {
                // Leftmost end of this production; hand control back to the
                // entry that predicted it.
                match stack.pop() {
                    None => {
                        if key.item.prod == AUGMENTED && key.origin == 0 && pending_names.is_empty()
                        {
                            break;
                        }
                        return Err(TreeError::Inconsistent(
                            "walk ended away from the start entry",
                        ));
                    }
                    Some(Frame::Expect(target)) => {
                        let pred = self
                            .pred_matching(id, |k| k == target)
                            .ok_or(TreeError::Inconsistent("no predicting predecessor"))?;
                        stack.push(Frame::Entry(pred));
                    }
                    Some(Frame::Entry(_)) => {
                        return Err(TreeError::Inconsistent("missing parent expectation"))
                    }
                }
                continue;
            }

            let before = self
                .rhs_symbol(key.item.prod, key.item.dot - 1)
                .ok_or(TreeError::Inconsistent("dot past the production"))?;
            let target = EntryKey {
                item: Item::new(key.item.prod, key.item.dot - 1),
                origin: key.origin,
            };

            let matches_token = pending_names.last() == Some(&before);
            if before == EPSILON || (!self.grammar().is_nonterm(before) && matches_token) {
                if before != EPSILON {
                    pending_names.pop();
                }
                let pred = self
                    .pred_matching(id, |k| k == target)
                    .ok_or(TreeError::Inconsistent("no pre-advance predecessor"))?;
                stack.push(Frame::Entry(pred));
            } else {
                // A nonterminal was reduced here: descend into the entry
                // that completed it, leaving the pre-advance key on the
                // stack for the descent to come back to.
                let pred = self
                    .pred_matching(id, |k| {
                        self.is_reduce(k.item) && self.lhs(k.item.prod) == Some(before)
                    })
                    .ok_or(TreeError::Inconsistent("no completing predecessor"))?;
                stack.push(Frame::Expect(target));
                stack.push(Frame::Entry(pred));
            }
        }

        Ok(order)
    }

    fn pred_matching(
        &self,
        id: EntryId,
        matches: impl Fn(EntryKey) -> bool,
    ) -> Option<EntryId> {
        self.preds_of(id)
            .iter()
            .copied()
            .find(|&pred| matches(self.key_of(pred)))
    }

    /// Turn the walk order into a tree. Only reduce entries matter: they
    /// appear parent first with children in rightmost-first order, so raw
    /// lexemes are consumed from the back of the token list and each child
    /// list is reversed once collected. The synthetic start node is
    /// stripped; the returned root reduces the start symbol.
    fn assemble(&self, order: &[EntryId]) -> Result<ParseTree<'gr, 'inp>, TreeError> {
        let reduces: Vec<EntryId> = order
            .iter()
            .copied()
            .filter(|&id| self.is_reduce(self.key_of(id).item))
            .collect();
        match reduces.first() {
            Some(&first) if self.key_of(first).item.prod == AUGMENTED => {}
            _ => return Err(TreeError::Inconsistent("derivation lost the start entry")),
        }

        let mut next = 1;
        let mut raws: Vec<&'inp str> = self.tokens().iter().map(|t| t.raw).collect();
        let tree = self.node_from(&reduces, &mut next, &mut raws)?;
        if next != reduces.len() || !raws.is_empty() {
            return Err(TreeError::Inconsistent("derivation was not fully consumed"));
        }
        Ok(tree)
    }

    fn node_from(
        &self,
        reduces: &[EntryId],
        next: &mut usize,
        raws: &mut Vec<&'inp str>,
    ) -> Result<ParseTree<'gr, 'inp>, TreeError> {
        let id = reduces
            .get(*next)
            .copied()
            .ok_or(TreeError::Inconsistent("derivation ended early"))?;
        *next += 1;
        let key = self.key_of(id);
        if key.item.prod == AUGMENTED {
            return Err(TreeError::Inconsistent("start entry inside the derivation"));
        }
        let production = &self.grammar().productions()[key.item.prod];

        let mut children = Vec::with_capacity(production.rhs.len());
        for &sym in production.rhs.iter().rev() {
            if sym == EPSILON {
                children.push(ParseTree::Leaf {
                    symbol: EPSILON,
                    raw: "",
                });
            } else if self.grammar().is_nonterm(sym) {
                children.push(self.node_from(reduces, next, raws)?);
            } else {
                let raw = raws
                    .pop()
                    .ok_or(TreeError::Inconsistent("ran out of lexemes"))?;
                children.push(ParseTree::Leaf { symbol: sym, raw });
            }
        }
        children.reverse();
        Ok(ParseTree::Node {
            production,
            children,
        })
    }
}
