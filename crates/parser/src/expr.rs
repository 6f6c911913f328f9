//! The parse expression algebra.
//!
//! Grammars are trees of [`Expr`] values. Expressions are small `Copy`
//! handles whose children live in the grammar's arena, so composing them
//! never clones subtrees. The variant set is closed: the engine matches on
//! it exhaustively and there is no user extension point.
//!
//! Recursion (including left recursion) always goes through a
//! [`RuleId`](crate::RuleId) reference, never through a raw expression
//! cycle; the arena cannot express one.

use bumpalo::Bump;

use crate::charset::CharSet;
use crate::grammar::RuleId;

/// A parse expression.
#[derive(Debug, Clone, Copy)]
pub enum Expr<'a> {
    /// Match a single code point.
    Char(char),
    /// Match a fixed string, all-or-nothing.
    Literal(&'a str),
    /// Match one code point from a set.
    Set(&'a CharSet<'a>),
    /// Match any single code point.
    Any,
    /// Match only at end of input.
    Eof,
    /// Evaluate the child with whitespace skipping suppressed.
    Terminal(&'a Expr<'a>),
    /// Match the child or nothing.
    Optional(&'a Expr<'a>),
    /// Match the child any number of times, including zero.
    ZeroOrMore(&'a Expr<'a>),
    /// Match the child at least once.
    OneOrMore(&'a Expr<'a>),
    /// Zero-width positive lookahead.
    And(&'a Expr<'a>),
    /// Zero-width negative lookahead.
    Not(&'a Expr<'a>),
    /// On success of the child, advance the line counter.
    Newline(&'a Expr<'a>),
    /// Match left then right.
    Seq(&'a Expr<'a>, &'a Expr<'a>),
    /// Try left; on failure backtrack and try right.
    Choice(&'a Expr<'a>, &'a Expr<'a>),
    /// Invoke a rule through the engine (the left-recursion frontier).
    Rule(RuleId),
}

// ============================================================================
// Constructors
// ============================================================================
// Leaf constructors that own no data take no arena; everything else
// allocates its operands into the grammar's arena, the same way syntax
// patterns are assembled elsewhere in this workspace.

/// Match the single character `c`.
pub fn ch<'a>(c: char) -> Expr<'a> {
    Expr::Char(c)
}

/// Match the exact string `s`.
pub fn lit<'a>(arena: &'a Bump, s: &str) -> Expr<'a> {
    Expr::Literal(arena.alloc_str(s))
}

/// Match one character out of `chars`.
pub fn set<'a>(arena: &'a Bump, chars: &str) -> Expr<'a> {
    Expr::Set(arena.alloc(CharSet::from_chars(arena, chars)))
}

/// Match one character in the inclusive range `lo..=hi`.
pub fn range<'a>(arena: &'a Bump, lo: char, hi: char) -> Expr<'a> {
    Expr::Set(arena.alloc(CharSet::from_range(arena, lo, hi)))
}

/// Match any one character.
pub fn any<'a>() -> Expr<'a> {
    Expr::Any
}

/// Match the end of input.
pub fn eof<'a>() -> Expr<'a> {
    Expr::Eof
}

/// Treat `e` as a terminal: no whitespace is skipped inside it.
pub fn term<'a>(arena: &'a Bump, e: Expr<'a>) -> Expr<'a> {
    Expr::Terminal(arena.alloc(e))
}

/// Match `e` or nothing.
pub fn opt<'a>(arena: &'a Bump, e: Expr<'a>) -> Expr<'a> {
    Expr::Optional(arena.alloc(e))
}

/// Match `e` zero or more times.
pub fn zero_or_more<'a>(arena: &'a Bump, e: Expr<'a>) -> Expr<'a> {
    Expr::ZeroOrMore(arena.alloc(e))
}

/// Match `e` one or more times.
pub fn one_or_more<'a>(arena: &'a Bump, e: Expr<'a>) -> Expr<'a> {
    Expr::OneOrMore(arena.alloc(e))
}

/// Succeed if `e` matches here, consuming nothing.
pub fn and_<'a>(arena: &'a Bump, e: Expr<'a>) -> Expr<'a> {
    Expr::And(arena.alloc(e))
}

/// Succeed if `e` does not match here, consuming nothing.
pub fn not_<'a>(arena: &'a Bump, e: Expr<'a>) -> Expr<'a> {
    Expr::Not(arena.alloc(e))
}

/// On success of `e`, bump the line counter and reset the column.
///
/// The engine never counts lines on its own; wrap whatever matches your
/// line terminator in this.
pub fn newline<'a>(arena: &'a Bump, e: Expr<'a>) -> Expr<'a> {
    Expr::Newline(arena.alloc(e))
}

/// Match `l` then `r`.
pub fn seq<'a>(arena: &'a Bump, l: Expr<'a>, r: Expr<'a>) -> Expr<'a> {
    Expr::Seq(arena.alloc(l), arena.alloc(r))
}

/// Try `l`; if it fails, backtrack and try `r`.
pub fn choice<'a>(arena: &'a Bump, l: Expr<'a>, r: Expr<'a>) -> Expr<'a> {
    Expr::Choice(arena.alloc(l), arena.alloc(r))
}

/// Left-associative sequence of all of `items`.
///
/// Panics on an empty slice; a sequence of nothing has no meaning.
pub fn seq_of<'a>(arena: &'a Bump, items: &[Expr<'a>]) -> Expr<'a> {
    let (first, rest) = items.split_first().expect("seq_of needs at least one expression");
    rest.iter().fold(*first, |acc, e| seq(arena, acc, *e))
}

/// Ordered choice over all of `items`.
///
/// Panics on an empty slice.
pub fn choice_of<'a>(arena: &'a Bump, items: &[Expr<'a>]) -> Expr<'a> {
    let (first, rest) = items.split_first().expect("choice_of needs at least one expression");
    rest.iter().fold(*first, |acc, e| choice(arena, acc, *e))
}

/// Reference the rule `r`.
pub fn rule_ref<'a>(r: RuleId) -> Expr<'a> {
    Expr::Rule(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_of_folds_left() {
        let arena = Bump::new();
        let e = seq_of(&arena, &[ch('a'), ch('b'), ch('c')]);
        // ((a b) c)
        match e {
            Expr::Seq(l, r) => {
                assert!(matches!(r, Expr::Char('c')));
                assert!(matches!(l, Expr::Seq(_, _)));
            }
            other => panic!("expected Seq, got {:?}", other),
        }
    }

    #[test]
    fn choice_of_single_item_is_identity() {
        let arena = Bump::new();
        let e = choice_of(&arena, &[ch('x')]);
        assert!(matches!(e, Expr::Char('x')));
    }
}
