use chumsky::prelude::*;
use chumsky::text::inline_whitespace;

/// A rule as written: one left-hand side, one or more alternatives.
#[derive(Debug, Clone)]
pub(crate) struct RawRule<'gr> {
    pub lhs: &'gr str,
    pub alts: Vec<Vec<&'gr str>>,
}

/// A symbol is any run of non-whitespace characters. `|` separates
/// alternatives and `->` binds the rule, so neither may occur inside a
/// symbol; everything else (including `#` and `$`) parses here and is
/// vetted semantically by the grammar constructor.
fn symbol<'gr>() -> impl Parser<'gr, &'gr str, &'gr str, extra::Err<Rich<'gr, char>>> {
    any()
        .filter(|c: &char| !c.is_whitespace() && *c != '|')
        .and_is(just("->").not())
        .repeated()
        .at_least(1)
        .to_slice()
        .labelled("symbol")
}

fn alternative<'gr>() -> impl Parser<'gr, &'gr str, Vec<&'gr str>, extra::Err<Rich<'gr, char>>> {
    symbol()
        .padded_by(inline_whitespace())
        .repeated()
        .at_least(1)
        .collect()
        .labelled("alternative")
}

/// Parser for a single rule string: `LHS -> ALT1 | ALT2 | ...`, with
/// arbitrary horizontal whitespace between tokens (none required around
/// `->`).
pub(crate) fn rule<'gr>() -> impl Parser<'gr, &'gr str, RawRule<'gr>, extra::Err<Rich<'gr, char>>> {
    symbol()
        .padded_by(inline_whitespace())
        .then_ignore(just("->"))
        .then(
            alternative()
                .separated_by(just('|'))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(end())
        .map(|(lhs, alts)| RawRule { lhs, alts })
        .labelled("rule")
}
