//! Rule storage and action bindings.
//!
//! A [`Grammar`] owns the rules of one language: each rule has a name, a
//! body [`Expr`], and optionally an action invoked after a successful
//! parse. Rules are identified by [`RuleId`]; forward references are the
//! normal case (declare first, define later), which is what makes
//! recursive and mutually recursive grammars possible to spell at all.
//!
//! A grammar is immutable during parsing. All per-parse bookkeeping lives
//! in the engine, so one grammar value serves any number of sequential
//! parses.

use bumpalo::Bump;
use hashbrown::HashMap;

use common::SourceLoc;

use crate::expr::Expr;

/// Identity of a rule inside its [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub(crate) u32);

/// The span a bound action is invoked with: the matched range and its
/// text, sliced out of the parse input.
#[derive(Debug, Clone, Copy)]
pub struct Matched<'s> {
    pub begin: SourceLoc,
    pub end: SourceLoc,
    pub text: &'s str,
}

/// A deferred semantic action. Actions run only after the whole parse has
/// succeeded, in match order; they cannot fail and cannot influence
/// parsing.
pub type Action<U> = Box<dyn Fn(Matched<'_>, &mut U)>;

struct RuleInfo<'a, U> {
    name: &'a str,
    body: Option<Expr<'a>>,
    action: Option<Action<U>>,
}

/// A set of named rules plus their action bindings.
///
/// `U` is the user-data type threaded through actions, typically the
/// state an AST or a result value is accumulated in.
pub struct Grammar<'a, U> {
    arena: &'a Bump,
    rules: Vec<RuleInfo<'a, U>>,
    names: HashMap<&'a str, RuleId>,
}

impl<'a, U> Grammar<'a, U> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            rules: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// The arena expressions for this grammar are built in.
    pub fn arena(&self) -> &'a Bump {
        self.arena
    }

    /// Declare a rule, creating its identity without a body. The body must
    /// be supplied with [`define`](Self::define) before parsing.
    ///
    /// Panics if `name` is already taken; rule names are unique.
    pub fn declare(&mut self, name: &str) -> RuleId {
        let name = self.arena.alloc_str(name);
        let id = RuleId(self.rules.len() as u32);
        if self.names.insert(name, id).is_some() {
            panic!("duplicate rule name {:?}", name);
        }
        self.rules.push(RuleInfo {
            name,
            body: None,
            action: None,
        });
        id
    }

    /// Attach a body to a declared rule.
    ///
    /// Panics if the rule already has a body.
    pub fn define(&mut self, id: RuleId, body: Expr<'a>) {
        let info = &mut self.rules[id.0 as usize];
        if info.body.is_some() {
            panic!("rule {:?} defined twice", info.name);
        }
        info.body = Some(body);
    }

    /// Declare and define in one step, for rules without forward
    /// references.
    pub fn add(&mut self, name: &str, body: Expr<'a>) -> RuleId {
        let id = self.declare(name);
        self.define(id, body);
        id
    }

    /// Bind an action to a rule. Each successful match of the rule in a
    /// successful parse invokes the action exactly once, after all actions
    /// of matches recorded earlier (children before parents).
    pub fn bind(&mut self, id: RuleId, action: impl Fn(Matched<'_>, &mut U) + 'static) {
        self.rules[id.0 as usize].action = Some(Box::new(action));
    }

    /// Look up a rule by name.
    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.names.get(name).copied()
    }

    /// The name a rule was declared with.
    pub fn name(&self, id: RuleId) -> &'a str {
        self.rules[id.0 as usize].name
    }

    pub(crate) fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub(crate) fn body(&self, id: RuleId) -> Expr<'a> {
        self.rules[id.0 as usize]
            .body
            .unwrap_or_else(|| panic!("rule {:?} declared but never defined", self.name(id)))
    }

    pub(crate) fn action(&self, id: RuleId) -> Option<&Action<U>> {
        self.rules[id.0 as usize].action.as_ref()
    }

    pub(crate) fn has_action(&self, id: RuleId) -> bool {
        self.rules[id.0 as usize].action.is_some()
    }

    /// Check every declared rule has a body; called once at parse entry so
    /// a missing `define` fails loudly instead of mid-parse.
    pub(crate) fn check_defined(&self) {
        for info in &self.rules {
            if info.body.is_none() {
                panic!("rule {:?} declared but never defined", info.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ch, rule_ref, seq};

    #[test]
    fn declare_then_define_allows_forward_reference() {
        let arena = Bump::new();
        let mut g: Grammar<'_, ()> = Grammar::new(&arena);
        let a = g.declare("a");
        let b = g.add("b", seq(&arena, ch('x'), rule_ref(a)));
        g.define(a, ch('y'));
        assert_eq!(g.rule_id("a"), Some(a));
        assert_eq!(g.rule_id("b"), Some(b));
        assert_eq!(g.name(a), "a");
        g.check_defined();
    }

    #[test]
    #[should_panic(expected = "duplicate rule name")]
    fn duplicate_names_rejected() {
        let arena = Bump::new();
        let mut g: Grammar<'_, ()> = Grammar::new(&arena);
        g.declare("a");
        g.declare("a");
    }

    #[test]
    #[should_panic(expected = "defined twice")]
    fn double_definition_rejected() {
        let arena = Bump::new();
        let mut g: Grammar<'_, ()> = Grammar::new(&arena);
        let a = g.declare("a");
        g.define(a, ch('x'));
        g.define(a, ch('y'));
    }

    #[test]
    #[should_panic(expected = "never defined")]
    fn undefined_rule_detected() {
        let arena = Bump::new();
        let mut g: Grammar<'_, ()> = Grammar::new(&arena);
        g.declare("a");
        g.check_defined();
    }

    #[test]
    fn bind_marks_rule_for_recording() {
        let arena = Bump::new();
        let mut g: Grammar<'_, u32> = Grammar::new(&arena);
        let a = g.add("a", ch('x'));
        assert!(!g.has_action(a));
        g.bind(a, |_, n| *n += 1);
        assert!(g.has_action(a));
    }
}
