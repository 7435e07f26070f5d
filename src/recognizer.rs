use crate::grammar::{Grammar, EPSILON};
use crate::lexer::Token;
use crate::ordered_set::{Cursor, OrderedSet};

/// Production id of the synthetic start production `S' -> S`. It exists only
/// inside the chart; the grammar never sees it.
pub(crate) const AUGMENTED: usize = usize::MAX;

/// A production with a dot marking how much of its rhs has been matched.
/// `prod` indexes the grammar's production list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    pub prod: usize,
    pub dot: usize,
}

impl Item {
    pub fn new(prod: usize, dot: usize) -> Self {
        Item { prod, dot }
    }

    pub fn advanced(self) -> Self {
        Item::new(self.prod, self.dot + 1)
    }
}

/// Identity of a chart entry within its column: the same `(item, origin)`
/// pair is stored once per column, however many ways it is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub item: Item,
    /// Column at which this derivation attempt began.
    pub origin: usize,
}

/// Stable address of a chart entry: column index plus slot in the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    pub col: usize,
    pub idx: usize,
}

/// One column of the chart: entries in insertion order, deduplicated on
/// `(item, origin)`, with a parallel table of predecessor references.
/// Entries are never removed, so slot indices stay aligned.
#[derive(Debug, Default)]
pub(crate) struct Column {
    keys: OrderedSet<EntryKey>,
    preds: Vec<Vec<EntryId>>,
}

impl Column {
    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &EntryKey> {
        self.keys.iter()
    }

    /// Cursor step that observes entries appended since the cursor started.
    pub(crate) fn advance(&self, cursor: &mut Cursor) -> Option<(usize, EntryKey)> {
        self.keys.advance(cursor).map(|(idx, key)| (idx, *key))
    }

    pub(crate) fn position(&self, key: &EntryKey) -> Option<usize> {
        self.keys.position(key)
    }

    pub(crate) fn key_at(&self, idx: usize) -> Option<EntryKey> {
        self.keys.get_index(idx).copied()
    }

    pub(crate) fn preds_at(&self, idx: usize) -> &[EntryId] {
        &self.preds[idx]
    }

    /// Insert, or union the predecessor into the existing entry. Keeping
    /// every predecessor is what lets the tree reconstructor find a path
    /// through an ambiguous or left-recursive chart.
    fn insert(&mut self, key: EntryKey, pred: Option<EntryId>) {
        let (idx, inserted) = self.keys.insert_full(key);
        if inserted {
            self.preds.push(pred.into_iter().collect());
        } else if let Some(p) = pred {
            let existing = &mut self.preds[idx];
            if !existing.contains(&p) {
                existing.push(p);
            }
        }
    }
}

/// An Earley chart over one token stream.
///
/// `recognize` fills the columns; `accepted` and `try_accept` read the
/// verdict off the last one. The chart borrows the grammar and owns the
/// tokens; it is discarded once a parse tree has been built from it.
pub struct Chart<'gr, 'inp> {
    grammar: &'gr Grammar<'gr>,
    tokens: Vec<Token<'inp>>,
    start: &'gr str,
    columns: Vec<Column>,
}

impl<'gr, 'inp> Chart<'gr, 'inp> {
    pub fn new(grammar: &'gr Grammar<'gr>, tokens: Vec<Token<'inp>>) -> Self {
        let start = grammar.start();
        Self::with_start(grammar, tokens, start)
    }

    /// A chart that derives from `start` instead of the grammar's start
    /// symbol. The caller is responsible for `start` naming a nonterminal.
    pub fn with_start(
        grammar: &'gr Grammar<'gr>,
        tokens: Vec<Token<'inp>>,
        start: &'gr str,
    ) -> Self {
        let mut columns = Vec::new();
        columns.resize_with(tokens.len() + 1, Column::default);
        Chart {
            grammar,
            tokens,
            start,
            columns,
        }
    }

    pub(crate) fn grammar(&self) -> &'gr Grammar<'gr> {
        self.grammar
    }

    pub fn tokens(&self) -> &[Token<'inp>] {
        &self.tokens
    }

    /// Symbol at position `idx` of a production's rhs. The synthetic start
    /// production has the single symbol `start`.
    pub(crate) fn rhs_symbol(&self, prod: usize, idx: usize) -> Option<&'gr str> {
        if prod == AUGMENTED {
            (idx == 0).then_some(self.start)
        } else {
            self.grammar.productions()[prod].rhs.get(idx).copied()
        }
    }

    pub(crate) fn rhs_len(&self, prod: usize) -> usize {
        if prod == AUGMENTED {
            1
        } else {
            self.grammar.productions()[prod].rhs.len()
        }
    }

    /// Lhs of a production; `None` for the synthetic start production.
    pub(crate) fn lhs(&self, prod: usize) -> Option<&'gr str> {
        (prod != AUGMENTED).then(|| self.grammar.productions()[prod].lhs)
    }

    pub(crate) fn is_reduce(&self, item: Item) -> bool {
        item.dot == self.rhs_len(item.prod)
    }

    pub(crate) fn next_symbol(&self, item: Item) -> Option<&'gr str> {
        self.rhs_symbol(item.prod, item.dot)
    }

    pub(crate) fn key_of(&self, id: EntryId) -> EntryKey {
        self.columns[id.col]
            .key_at(id.idx)
            .expect("entry ids address live chart slots")
    }

    pub(crate) fn preds_of(&self, id: EntryId) -> &[EntryId] {
        self.columns[id.col].preds_at(id.idx)
    }

    pub(crate) fn column(&self, k: usize) -> &Column {
        &self.columns[k]
    }

    pub(crate) fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Build the chart. Each column is swept in insertion order with a
    /// cursor, so entries inserted into the column being swept are processed
    /// in the same pass; completion scans its origin column the same way.
    /// Without that, nullable productions and left recursion would either
    /// loop or lose derivations.
    pub fn recognize(&mut self) {
        let n = self.tokens.len();
        let seed = EntryKey {
            item: Item::new(AUGMENTED, 0),
            origin: 0,
        };
        self.columns[0].insert(seed, None);

        let grammar = self.grammar;
        for k in 0..=n {
            let mut cursor = Cursor::new();
            while let Some((idx, entry)) = self.columns[k].advance(&mut cursor) {
                let id = EntryId { col: k, idx };
                if let Some(sym) = self.next_symbol(entry.item) {
                    if sym == EPSILON {
                        // The epsilon production matches the empty string
                        // right here; completion then carries it to the
                        // entries of this column waiting on its lhs.
                        self.columns[k].insert(
                            EntryKey {
                                item: entry.item.advanced(),
                                origin: entry.origin,
                            },
                            Some(id),
                        );
                    } else if grammar.is_nonterm(sym) {
                        // Predict, in production order.
                        for &pid in grammar.prods_for(sym) {
                            self.columns[k].insert(
                                EntryKey {
                                    item: Item::new(pid, 0),
                                    origin: k,
                                },
                                Some(id),
                            );
                        }
                    } else if k < n && self.tokens[k].name == sym {
                        // Scan.
                        self.columns[k + 1].insert(
                            EntryKey {
                                item: entry.item.advanced(),
                                origin: entry.origin,
                            },
                            Some(id),
                        );
                    }
                } else if let Some(lhs) = self.lhs(entry.item.prod) {
                    // Complete: advance everything in the origin column
                    // waiting on `lhs`. When origin == k the cursor sees the
                    // insertions made by this very loop.
                    let mut waiting = Cursor::new();
                    while let Some((_, w)) = self.columns[entry.origin].advance(&mut waiting) {
                        if self.next_symbol(w.item) == Some(lhs) {
                            self.columns[k].insert(
                                EntryKey {
                                    item: w.item.advanced(),
                                    origin: w.origin,
                                },
                                Some(id),
                            );
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn accepting_key(&self) -> EntryKey {
        EntryKey {
            item: Item::new(AUGMENTED, 1),
            origin: 0,
        }
    }

    /// The entry `S' -> S •` with origin 0 in the last column, if present.
    pub fn accepting_entry(&self) -> Option<EntryId> {
        let col = self.tokens.len();
        self.columns[col]
            .position(&self.accepting_key())
            .map(|idx| EntryId { col, idx })
    }

    pub fn accepted(&self) -> bool {
        self.accepting_entry().is_some()
    }

    pub(crate) fn format_entry(&self, key: &EntryKey) -> String {
        let lhs = self.lhs(key.item.prod).unwrap_or("S'");
        let len = self.rhs_len(key.item.prod);
        let mut rhs = Vec::new();
        for i in 0..len {
            if i == key.item.dot {
                rhs.push("•".to_string());
            }
            if let Some(sym) = self.rhs_symbol(key.item.prod, i) {
                rhs.push(sym.to_string());
            }
        }
        if key.item.dot == len {
            rhs.push("•".to_string());
        }
        format!("{} -> {} ({})", lhs, rhs.join(" "), key.origin)
    }

    /// Dump every column, one dotted item per line.
    pub fn print_chart(&self) {
        for (i, column) in self.columns.iter().enumerate() {
            println!("\n=== {} ===", i);
            for key in column.iter() {
                println!("{}", self.format_entry(key));
            }
        }
    }
}
