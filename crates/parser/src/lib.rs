//! pegleg parser
//!
//! A parser-construction library: grammars are built as composable
//! expression values and run against text to produce a sequence of
//! position-delimited match records, which drive deferred semantic
//! actions. The engine is a backtracking PEG interpreter that handles
//! left-recursive rules - direct, indirect, and mutual - with the
//! OMeta-style seed-and-grow algorithm.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use parser::{ch, choice, one_or_more, opt, parse, range, rule_ref, seq, term, Grammar};
//!
//! // sum  = sum '+' num | num
//! // num  = [0-9]+          (a terminal: no whitespace inside)
//! let arena = Bump::new();
//! let mut g: Grammar<'_, Vec<String>> = Grammar::new(&arena);
//!
//! let ws = g.add("ws", opt(&arena, ch(' ')));
//! let num = g.add("num", term(&arena, one_or_more(&arena, range(&arena, '0', '9'))));
//! let sum = g.declare("sum");
//! g.define(
//!     sum,
//!     choice(
//!         &arena,
//!         seq(&arena, rule_ref(sum), seq(&arena, ch('+'), rule_ref(num))),
//!         rule_ref(num),
//!     ),
//! );
//!
//! g.bind(num, |m, out: &mut Vec<String>| out.push(m.text.to_string()));
//! g.bind(sum, |m, out: &mut Vec<String>| out.push(format!("sum({})", m.text)));
//!
//! let mut out = Vec::new();
//! let mut errors = Vec::new();
//! assert!(parse("1 + 2 + 3", &g, sum, ws, &mut errors, &mut out));
//! // Actions run children-first: each number before the sum that ends with it.
//! assert_eq!(out, ["1", "sum(1)", "2", "sum(1 + 2)", "3", "sum(1 + 2 + 3)"]);
//! ```
//!
//! # Building grammars
//!
//! Expressions are `Copy` values allocated in a caller-owned [`bumpalo`]
//! arena; see [`expr`] for the constructor set. Rules are declared on a
//! [`Grammar`] (forward references first, bodies later), so any recursion
//! shape can be spelled. Binding an action to a rule makes its matches
//! observable; unbound rules are pure structure.
//!
//! # Whitespace
//!
//! `parse` takes a whitespace rule alongside the start rule. Sequences and
//! repetitions skip it automatically except inside [`term`] subtrees, which
//! is how token-shaped rules ("identifier", "number") keep whitespace out
//! while the grammar around them ignores it.
//!
//! # Errors
//!
//! Parsing is all-or-nothing. On failure a single [`ParseError`] is pushed
//! into the caller's sink, pointing at the furthest position any branch
//! reached; [`format_error`] renders it with the offending line and a
//! caret.
//!
//! # Debugging
//!
//! Set `DEBUG=parser` (and `DEBUG_VERBOSITY=2` for per-rule detail) to
//! trace rule entry, left-recursion seeding, and grow steps on stderr.

mod charset;
mod engine;
mod error;
pub mod expr;
mod format;
mod grammar;

// Re-export from pegleg-common
pub use common::{create_logger, line_containing, Logger, SourceLoc};

pub use charset::CharSet;
pub use engine::parse;
pub use error::{ErrorKind, ParseError};
pub use expr::{
    and_, any, ch, choice, choice_of, eof, lit, newline, not_, one_or_more, opt, range, rule_ref,
    seq, seq_of, set, term, zero_or_more, Expr,
};
pub use format::{format_error, format_errors};
pub use grammar::{Action, Grammar, Matched, RuleId};
