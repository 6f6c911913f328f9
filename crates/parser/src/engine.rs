//! The parsing engine: a backtracking recursive-descent evaluator over
//! [`Expr`] trees with support for left-recursive rules.
//!
//! # Evaluation modes
//!
//! Every expression evaluates in one of two modes. In *non-terminal* mode,
//! sequences and repetitions skip the whitespace rule between elements; in
//! *terminal* mode they do not. [`Expr::Terminal`] switches its subtree to
//! terminal mode, which is how token-like rules keep whitespace out of
//! their matched text while the rules around them stay whitespace-blind.
//!
//! # Left recursion
//!
//! Rule invocations carry per-rule state `(mode, last attempt position)`.
//! Re-entering a rule at the position of an in-flight invocation marks
//! left recursion and triggers the seed-and-grow protocol:
//!
//! 1. *Seed*: the rule's body runs in `Reject` mode, where further
//!    re-entries at the same position fail immediately, so only the
//!    non-left-recursive alternatives can produce the initial match.
//! 2. *Grow*: the body is re-run in `Accept` mode from the seed's end.
//!    There the left-recursive reference succeeds consuming nothing,
//!    standing in for everything matched so far, and each successful
//!    iteration extends the match by one more application of a recursive
//!    alternative. The loop stops when an iteration fails or stops making
//!    progress.
//! 3. The completed result unwinds to the in-flight invocation that the
//!    recursion resolved against, carried by an [`LrBreak`] value through
//!    every `?` on the way up.
//!
//! Rule state is restored on every exit from a rule frame, including
//! unwinds, and every frame that invokes a body catches its own rule's
//! signal; both are load-bearing for indirect and mutual cycles.
//!
//! # Match records
//!
//! Parsing never builds a tree. Rules with a bound action append
//! `(rule, begin, end)` records as they return, children before parents,
//! and backtracking truncates records along with the position. After a
//! successful parse the driver replays the surviving records through the
//! bound actions in order.

use common::{create_logger, log, log_detail, Logger, SourceLoc};

use crate::error::{ErrorKind, ParseError};
use crate::expr::Expr;
use crate::grammar::{Grammar, Matched, RuleId};

// ============================================================================
// Engine-internal state
// ============================================================================

/// Dispatch mode of a rule, part of the left-recursion protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Parse,
    Reject,
    Accept,
}

/// Per-rule, per-parse state. Scoped to the innermost active invocation:
/// each rule frame saves and restores it around its own work.
#[derive(Debug, Clone, Copy)]
struct RuleState {
    mode: Mode,
    /// Offset of the most recent in-flight attempt of this rule; equality
    /// with the current position is what detects left recursion.
    last_pos: Option<u32>,
    /// While growing: where the accumulated seed started.
    seed_begin: SourceLoc,
}

impl Default for RuleState {
    fn default() -> Self {
        Self {
            mode: Mode::Parse,
            last_pos: None,
            seed_begin: SourceLoc::start(),
        }
    }
}

/// Signal that a left-recursion cycle completed for a rule. Propagated as
/// the `Err` arm so `?` unwinds intermediate frames; consumed by the
/// nearest enclosing frame of the same rule.
#[derive(Debug, Clone, Copy)]
struct LrBreak(RuleId);

type Step = Result<bool, LrBreak>;

/// A deferred action anchor: rule plus matched range.
#[derive(Debug, Clone, Copy)]
struct MatchRecord {
    rule: RuleId,
    begin: SourceLoc,
    end: SourceLoc,
}

/// Published when an `Accept`-mode re-entry succeeds with zero width: any
/// frame already in flight at `at` whose body consumed that success as its
/// first element actually matched everything from `begin` on, and records
/// its match accordingly.
#[derive(Debug, Clone, Copy)]
struct LrSlot {
    at: u32,
    begin: SourceLoc,
    tick: u64,
}

/// Snapshot for backtracking. Restoring resets the position and truncates
/// the match log and slot stack; the furthest-error position is deliberately
/// never restored.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    pos: SourceLoc,
    matches: usize,
    slots: usize,
}

// ============================================================================
// Machine
// ============================================================================

struct Machine<'s, 'a, U> {
    source: &'s str,
    grammar: &'a Grammar<'a, U>,
    ws: RuleId,

    pos: SourceLoc,
    error_pos: SourceLoc,
    matches: Vec<MatchRecord>,
    states: Vec<RuleState>,
    slots: Vec<LrSlot>,
    tick: u64,

    log: Logger,
}

impl<'s, 'a, U> Machine<'s, 'a, U> {
    fn new(source: &'s str, grammar: &'a Grammar<'a, U>, ws: RuleId) -> Self {
        Self {
            source,
            grammar,
            ws,
            pos: SourceLoc::start(),
            error_pos: SourceLoc::start(),
            matches: Vec::new(),
            states: vec![RuleState::default(); grammar.rule_count()],
            slots: Vec::new(),
            tick: 0,
            log: create_logger("parser"),
        }
    }

    // ------------------------------------------------------------------
    // Position
    // ------------------------------------------------------------------

    fn at_end(&self) -> bool {
        self.pos.offset as usize >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos.offset as usize..].chars().next()
    }

    /// Consume one code point. Only columns move; lines are counted solely
    /// by [`Expr::Newline`] wrappers.
    fn advance_column(&mut self, c: char) {
        self.pos.offset += c.len_utf8() as u32;
        self.pos.col += 1;
    }

    fn advance_line(&mut self) {
        self.pos.line += 1;
        self.pos.col = 1;
    }

    /// Track the deepest failure position. Monotone: backtracking never
    /// rolls it back.
    fn set_error_pos(&mut self) {
        if self.pos.offset > self.error_pos.offset {
            self.error_pos = self.pos;
        }
    }

    fn save(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            matches: self.matches.len(),
            slots: self.slots.len(),
        }
    }

    fn restore(&mut self, cp: Checkpoint) {
        self.pos = cp.pos;
        self.matches.truncate(cp.matches);
        self.slots.truncate(cp.slots);
    }

    fn next_tick(&mut self) -> u64 {
        let t = self.tick;
        self.tick += 1;
        t
    }

    // ------------------------------------------------------------------
    // Character-level matchers
    // ------------------------------------------------------------------

    fn match_char(&mut self, want: char) -> bool {
        if let Some(c) = self.peek() {
            if c == want {
                self.advance_column(c);
                return true;
            }
        }
        self.set_error_pos();
        false
    }

    /// All-or-nothing: the cursor walks the literal to find the deepest
    /// mismatch for error reporting, then rewinds before failing.
    fn match_literal(&mut self, lit: &str) -> bool {
        let start = self.pos;
        for want in lit.chars() {
            match self.peek() {
                Some(c) if c == want => self.advance_column(c),
                _ => {
                    self.set_error_pos();
                    self.pos = start;
                    return false;
                }
            }
        }
        true
    }

    fn match_set(&mut self, set: &crate::charset::CharSet<'_>) -> bool {
        if let Some(c) = self.peek() {
            if set.contains(c) {
                self.advance_column(c);
                return true;
            }
        }
        self.set_error_pos();
        false
    }

    fn match_any(&mut self) -> bool {
        if let Some(c) = self.peek() {
            self.advance_column(c);
            return true;
        }
        self.set_error_pos();
        false
    }

    // ------------------------------------------------------------------
    // Expression evaluation
    // ------------------------------------------------------------------

    /// Run the whitespace rule in terminal mode, ignoring its outcome;
    /// whitespace may legitimately match nothing.
    fn parse_ws(&mut self) -> Result<(), LrBreak> {
        self.parse_rule(self.ws, true)?;
        Ok(())
    }

    /// Evaluate `e` at the current position. `term` selects terminal mode,
    /// in which sequences and repetitions do not skip whitespace.
    fn eval(&mut self, e: Expr<'a>, term: bool) -> Step {
        match e {
            Expr::Char(c) => Ok(self.match_char(c)),
            Expr::Literal(s) => Ok(self.match_literal(s)),
            Expr::Set(set) => Ok(self.match_set(set)),
            Expr::Any => Ok(self.match_any()),
            Expr::Eof => Ok(self.at_end()),

            Expr::Terminal(inner) => self.eval(*inner, true),

            Expr::Optional(inner) => {
                let cp = self.save();
                if !self.eval(*inner, term)? {
                    self.restore(cp);
                }
                Ok(true)
            }

            Expr::ZeroOrMore(inner) => {
                loop {
                    if !term {
                        self.parse_ws()?;
                    }
                    let cp = self.save();
                    if !self.eval(*inner, term)? {
                        self.restore(cp);
                        break;
                    }
                }
                Ok(true)
            }

            Expr::OneOrMore(inner) => {
                if !term {
                    self.parse_ws()?;
                }
                if !self.eval(*inner, term)? {
                    return Ok(false);
                }
                loop {
                    if !term {
                        self.parse_ws()?;
                    }
                    let cp = self.save();
                    if !self.eval(*inner, term)? {
                        self.restore(cp);
                        break;
                    }
                }
                Ok(true)
            }

            Expr::And(inner) => {
                let cp = self.save();
                let ok = self.eval(*inner, term)?;
                self.restore(cp);
                Ok(ok)
            }

            Expr::Not(inner) => {
                let cp = self.save();
                let ok = self.eval(*inner, term)?;
                self.restore(cp);
                Ok(!ok)
            }

            Expr::Newline(inner) => {
                if !self.eval(*inner, term)? {
                    return Ok(false);
                }
                self.advance_line();
                Ok(true)
            }

            Expr::Seq(l, r) => {
                if !self.eval(*l, term)? {
                    return Ok(false);
                }
                if !term {
                    self.parse_ws()?;
                }
                self.eval(*r, term)
            }

            Expr::Choice(l, r) => {
                let cp = self.save();
                if self.eval(*l, term)? {
                    return Ok(true);
                }
                self.restore(cp);
                self.eval(*r, term)
            }

            Expr::Rule(id) => self.parse_rule(id, term),
        }
    }

    // ------------------------------------------------------------------
    // Rule protocol
    // ------------------------------------------------------------------

    fn state(&mut self, id: RuleId) -> &mut RuleState {
        &mut self.states[id.0 as usize]
    }

    fn run_body(&mut self, id: RuleId, term: bool) -> Step {
        let body = self.grammar.body(id);
        self.eval(body, term)
    }

    /// One protocol frame for rule `id`. The rule's state is restored on
    /// every exit path, signal propagation included; stale state leaking
    /// through an unwind mis-triggers recursion detection later.
    fn parse_rule(&mut self, id: RuleId, term: bool) -> Step {
        let old = self.states[id.0 as usize];
        let frame_tick = self.next_tick();
        self.log.push_indent();
        let res = self.rule_frame(id, term, old, frame_tick);
        self.log.pop_indent();
        self.states[id.0 as usize] = old;
        res
    }

    fn rule_frame(&mut self, id: RuleId, term: bool, old: RuleState, frame_tick: u64) -> Step {
        let entry = self.pos;
        let lr = old.last_pos == Some(entry.offset);
        self.state(id).last_pos = Some(entry.offset);

        log_detail!(
            self.log,
            "rule {} at {}:{}{}",
            self.grammar.name(id),
            entry.line,
            entry.col,
            if lr { " (left recursive)" } else { "" }
        );

        match old.mode {
            Mode::Parse if lr => self.seed_and_grow(id, term, entry, frame_tick),
            Mode::Parse => self.invoke_body(id, term, entry, frame_tick, Mode::Parse),
            // Rejecting the recursive re-entry is what forces the seed onto
            // the non-recursive alternatives.
            Mode::Reject if lr => Ok(false),
            Mode::Reject => self.invoke_body(id, term, entry, frame_tick, Mode::Reject),
            // The recursive slot: succeed with zero width, standing in for
            // the seed grown so far, and publish where that seed began.
            Mode::Accept if lr => {
                let tick = self.next_tick();
                self.slots.push(LrSlot {
                    at: entry.offset,
                    begin: old.seed_begin,
                    tick,
                });
                Ok(true)
            }
            Mode::Accept => self.nested_in_grow(id, term, entry, frame_tick),
        }
    }

    /// A nested invocation at a fresh position while this rule is growing.
    ///
    /// Parse just the non-recursive core first, leaving recursive
    /// extensions for the enclosing grow loop to attach; this is what makes
    /// `1+2-3` come out left-associative when both operands of the
    /// recursive alternatives are the rule itself. When the core alone
    /// cannot match - the rule occurs here only inside brackets, say - fall
    /// back to a full parse with local recursion resolution.
    fn nested_in_grow(
        &mut self,
        id: RuleId,
        term: bool,
        entry: SourceLoc,
        frame_tick: u64,
    ) -> Step {
        let cp = self.save();
        self.state(id).mode = Mode::Reject;
        let res = self.run_body(id, term);
        self.state(id).mode = Mode::Accept;
        match res {
            Ok(true) => {
                self.record(id, entry, frame_tick);
                Ok(true)
            }
            Ok(false) => {
                self.restore(cp);
                self.invoke_body(id, term, entry, frame_tick, Mode::Accept)
            }
            Err(LrBreak(r)) if r == id => Ok(true),
            Err(signal) => Err(signal),
        }
    }

    /// Invoke the rule body once, catching this rule's own completion
    /// signal. Nested invocations under `Reject`/`Accept` run the body in
    /// `Parse` mode so recursion elsewhere in the input behaves normally.
    fn invoke_body(
        &mut self,
        id: RuleId,
        term: bool,
        entry: SourceLoc,
        frame_tick: u64,
        outer: Mode,
    ) -> Step {
        if outer != Mode::Parse {
            self.state(id).mode = Mode::Parse;
        }
        let res = self.run_body(id, term);
        if outer != Mode::Parse {
            self.state(id).mode = outer;
        }
        match res {
            Ok(true) => {
                self.record(id, entry, frame_tick);
                Ok(true)
            }
            Ok(false) => Ok(false),
            // A grow loop below this frame settled; its records are already
            // in the log, so this frame only converts the signal.
            Err(LrBreak(r)) if r == id => Ok(true),
            Err(signal) => Err(signal),
        }
    }

    /// Resolve left recursion detected at `entry`.
    fn seed_and_grow(
        &mut self,
        id: RuleId,
        term: bool,
        entry: SourceLoc,
        frame_tick: u64,
    ) -> Step {
        log!(
            self.log,
            "seeding {} at {}:{}",
            self.grammar.name(id),
            entry.line,
            entry.col
        );

        self.state(id).mode = Mode::Reject;
        if !self.run_body(id, term)? {
            // No non-recursive alternative matches here; the recursion is
            // unresolvable.
            return Ok(false);
        }
        self.record(id, entry, frame_tick);

        self.state(id).mode = Mode::Accept;
        self.state(id).seed_begin = entry;
        loop {
            let cp = self.save();
            self.state(id).last_pos = Some(self.pos.offset);
            let grown = self.run_body(id, term)?;
            if !grown || self.pos.offset <= cp.pos.offset {
                // Failed or made no progress: keep the best seed so far.
                self.restore(cp);
                break;
            }
            log_detail!(
                self.log,
                "grew {} to {}:{}",
                self.grammar.name(id),
                self.pos.line,
                self.pos.col
            );
            self.record(id, entry, frame_tick);
        }

        log!(
            self.log,
            "resolved {} through {}:{}",
            self.grammar.name(id),
            self.pos.line,
            self.pos.col
        );
        Err(LrBreak(id))
    }

    /// Append a match record for `id` if it has a bound action. A frame
    /// whose body consumed a zero-width recursive slot as its first
    /// element matched everything from that slot's seed begin, not just
    /// from its own entry.
    fn record(&mut self, id: RuleId, entry: SourceLoc, frame_tick: u64) {
        if !self.grammar.has_action(id) {
            return;
        }
        let consumed_slot = self
            .slots
            .iter()
            .rev()
            .find(|slot| slot.at == entry.offset && slot.tick > frame_tick);
        let begin = match consumed_slot {
            Some(slot) => slot.begin,
            None => entry,
        };
        self.matches.push(MatchRecord {
            rule: id,
            begin,
            end: self.pos,
        });
    }

    // ------------------------------------------------------------------
    // Driver
    // ------------------------------------------------------------------

    fn syntax_error(&self) -> ParseError {
        let begin = self.error_pos;
        let end = match self.source[begin.offset as usize..].chars().next() {
            Some(c) => SourceLoc::new(begin.offset + c.len_utf8() as u32, begin.line, begin.col + 1),
            None => begin,
        };
        ParseError::new(ErrorKind::Syntax, begin, end)
    }

    fn run(&mut self, start: RuleId, errors: &mut Vec<ParseError>, data: &mut U) -> bool {
        // Leading whitespace.
        if self.parse_rule(self.ws, true).is_err() {
            errors.push(self.syntax_error());
            return false;
        }

        match self.parse_rule(start, false) {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                errors.push(self.syntax_error());
                return false;
            }
        }

        // Trailing whitespace.
        if self.parse_rule(self.ws, true).is_err() {
            errors.push(self.syntax_error());
            return false;
        }

        if !self.at_end() {
            // A failure past the matched prefix is the better diagnostic;
            // otherwise the prefix matched cleanly and the input simply
            // kept going.
            if self.error_pos.offset > self.pos.offset {
                errors.push(self.syntax_error());
            } else {
                errors.push(ParseError::new(ErrorKind::InvalidEof, self.pos, self.pos));
            }
            return false;
        }

        log!(self.log, "parse ok, {} match records", self.matches.len());
        for rec in &self.matches {
            if let Some(action) = self.grammar.action(rec.rule) {
                let text = &self.source[rec.begin.offset as usize..rec.end.offset as usize];
                action(
                    Matched {
                        begin: rec.begin,
                        end: rec.end,
                        text,
                    },
                    data,
                );
            }
        }
        true
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Parse `source` with `grammar`, starting from rule `start`.
///
/// `whitespace` is evaluated in terminal mode before the start rule, after
/// it, and between the elements of every non-terminal sequence and
/// repetition. On success the actions bound to matched rules run in match
/// order (children before parents) against `data`, and `parse` returns
/// `true`. On failure one [`ParseError`] describing the furthest failure
/// is pushed into `errors`.
///
/// Panics if any declared rule lacks a definition.
pub fn parse<'a, U>(
    source: &str,
    grammar: &'a Grammar<'a, U>,
    start: RuleId,
    whitespace: RuleId,
    errors: &mut Vec<ParseError>,
    data: &mut U,
) -> bool {
    grammar.check_defined();
    let mut machine = Machine::new(source, grammar, whitespace);
    machine.run(start, errors, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ch, choice, one_or_more, range, seq};
    use bumpalo::Bump;

    fn ws_none<'a, U>(g: &mut Grammar<'a, U>) -> RuleId {
        let arena = g.arena();
        g.add("ws", crate::expr::opt(arena, ch(' ')))
    }

    #[test]
    fn choice_failure_restores_position_and_matches() {
        let arena = Bump::new();
        let mut g: Grammar<'_, Vec<String>> = Grammar::new(&arena);
        let ws = ws_none(&mut g);
        let a = g.add("a", ch('a'));
        g.bind(a, |m, out: &mut Vec<String>| out.push(m.text.to_string()));
        // (a 'x') | (a 'y') - the first alternative records `a`, then fails
        // on 'x'; the record must not survive into the second alternative.
        let root = g.add(
            "root",
            choice(
                &arena,
                seq(&arena, crate::expr::rule_ref(a), ch('x')),
                seq(&arena, crate::expr::rule_ref(a), ch('y')),
            ),
        );

        let mut out = Vec::new();
        let mut errors = Vec::new();
        assert!(parse("ay", &g, root, ws, &mut errors, &mut out));
        assert_eq!(out, vec!["a".to_string()]);
    }

    #[test]
    fn furthest_error_survives_backtracking() {
        let arena = Bump::new();
        let mut g: Grammar<'_, ()> = Grammar::new(&arena);
        let ws = ws_none(&mut g);
        // ('a' 'b' 'c') | 'z' - the first branch dies at offset 2, the
        // second at offset 0; the report must name the deeper one.
        let root = g.add(
            "root",
            choice(
                &arena,
                seq(&arena, seq(&arena, ch('a'), ch('b')), ch('c')),
                ch('z'),
            ),
        );

        let mut errors = Vec::new();
        assert!(!parse("abx", &g, root, ws, &mut errors, &mut ()));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Syntax);
        assert_eq!(errors[0].begin.offset, 2);
    }

    #[test]
    fn repeated_parses_are_deterministic() {
        let arena = Bump::new();
        let mut g: Grammar<'_, Vec<String>> = Grammar::new(&arena);
        let ws = ws_none(&mut g);
        let num = g.add("num", one_or_more(&arena, range(&arena, '0', '9')));
        g.bind(num, |m, out: &mut Vec<String>| out.push(m.text.to_string()));
        let root = g.add(
            "root",
            seq(&arena, crate::expr::rule_ref(num), crate::expr::eof()),
        );

        let mut first = Vec::new();
        let mut errors = Vec::new();
        assert!(parse("1234", &g, root, ws, &mut errors, &mut first));
        for _ in 0..3 {
            let mut again = Vec::new();
            assert!(parse("1234", &g, root, ws, &mut errors, &mut again));
            assert_eq!(again, first);
        }
    }

    #[test]
    fn trailing_input_without_deep_failure_is_invalid_eof() {
        let arena = Bump::new();
        let mut g: Grammar<'_, ()> = Grammar::new(&arena);
        let ws = ws_none(&mut g);
        let root = g.add("root", ch('a'));

        let mut errors = Vec::new();
        assert!(!parse("ab", &g, root, ws, &mut errors, &mut ()));
        assert_eq!(errors[0].kind, ErrorKind::InvalidEof);
        assert_eq!(errors[0].begin.offset, 1);
    }
}
