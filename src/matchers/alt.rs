/*!
Alternation, optionality and negative look-ahead.
*/

use crate::matchers::{Matcher, MatchingLogic};
use crate::pattern::{
    MatchContext, MatchFailure, MatchPrefixResult, PatternMatch,
    TerminalMatch, Value,
};
use crate::util::state::InputState;

/// Tries each alternative at the same offset; the first success wins.
#[derive(Clone, Debug)]
pub struct Alt {
    id: String,
    alternatives: Vec<Matcher>,
}

impl Alt {
    /// An alternation of two matchers.
    pub fn new<A, B>(a: A, b: B) -> Alt
    where
        A: Into<Matcher>,
        B: Into<Matcher>,
    {
        Alt::any(vec![a.into(), b.into()])
    }

    /// An alternation over any number of matchers, tried in order.
    pub fn any(alternatives: Vec<Matcher>) -> Alt {
        let names: Vec<&str> =
            alternatives.iter().map(|m| m.id()).collect();
        Alt { id: format!("Alt[{}]", names.join("|")), alternatives }
    }
}

impl MatchingLogic for Alt {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(
        &self,
        state: &InputState,
        ctx: &mut MatchContext,
    ) -> MatchPrefixResult {
        for alternative in &self.alternatives {
            if let Ok(m) = alternative.match_prefix(state, ctx) {
                return Ok(m);
            }
        }
        Err(MatchFailure::new(
            &self.id,
            state.offset(),
            "no alternative matched".to_string(),
        ))
    }

    fn can_start_with(&self, c: char) -> bool {
        self.alternatives.iter().any(|m| m.can_start_with(c))
    }
}

/// Matches `inner` if it matches, and otherwise succeeds with a
/// zero-width `Undefined` placeholder.
#[derive(Clone, Debug)]
pub struct Opt {
    id: String,
    inner: Box<Matcher>,
}

impl Opt {
    pub fn new<M: Into<Matcher>>(inner: M) -> Opt {
        let inner = inner.into();
        Opt { id: format!("Opt[{}]", inner.id()), inner: Box::new(inner) }
    }
}

impl MatchingLogic for Opt {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(
        &self,
        state: &InputState,
        ctx: &mut MatchContext,
    ) -> MatchPrefixResult {
        match self.inner.match_prefix(state, ctx) {
            Ok(m) => Ok(m),
            Err(_) => Ok(PatternMatch::Undefined {
                matcher_id: self.id.clone(),
                offset: state.offset(),
            }),
        }
    }
}

/// Succeeds, consuming nothing, exactly when `inner` fails at the
/// cursor.
#[derive(Clone, Debug)]
pub struct Not {
    id: String,
    inner: Box<Matcher>,
}

impl Not {
    pub fn new<M: Into<Matcher>>(inner: M) -> Not {
        let inner = inner.into();
        Not { id: format!("Not[{}]", inner.id()), inner: Box::new(inner) }
    }
}

impl MatchingLogic for Not {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(
        &self,
        state: &InputState,
        ctx: &mut MatchContext,
    ) -> MatchPrefixResult {
        match self.inner.match_prefix(state, ctx) {
            Ok(_) => Err(MatchFailure::new(
                &self.id,
                state.offset(),
                format!("'{}' matched where it must not", self.inner.id()),
            )),
            Err(_) => Ok(PatternMatch::Terminal(TerminalMatch::new(
                &self.id,
                String::new(),
                state.offset(),
                Value::Undefined,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::{integer, lowercase_boolean};
    use crate::util::input::StringInputStream;

    fn state(text: &str) -> InputState {
        InputState::new(Box::new(StringInputStream::new(text)), None)
    }

    #[test]
    fn first_success_wins() {
        let alt = Alt::new(lowercase_boolean(), integer());
        let mut ctx = MatchContext::new();
        let m = alt.match_prefix(&state("true"), &mut ctx).unwrap();
        assert_eq!(Value::Bool(true), m.value());
        let m = alt.match_prefix(&state("17"), &mut ctx).unwrap();
        assert_eq!(Value::Int(17), m.value());
        assert!(alt.match_prefix(&state("nope"), &mut ctx).is_err());
    }

    #[test]
    fn alternatives_all_try_the_same_offset() {
        let alt = Alt::new(Matcher::literal("abc"), Matcher::literal("abd"));
        let mut ctx = MatchContext::new();
        let m = alt.match_prefix(&state("abd"), &mut ctx).unwrap();
        assert_eq!("abd", m.matched());
    }

    #[test]
    fn opt_yields_undefined_on_miss() {
        let opt = Opt::new(integer());
        let mut ctx = MatchContext::new();
        let m = opt.match_prefix(&state("xyz"), &mut ctx).unwrap();
        assert!(m.is_empty());
        assert_eq!(Value::Undefined, m.value());
        let m = opt.match_prefix(&state("9"), &mut ctx).unwrap();
        assert_eq!("9", m.matched());
    }

    #[test]
    fn not_is_a_zero_width_guard() {
        let not = Not::new(Matcher::literal("//"));
        let mut ctx = MatchContext::new();
        let m = not.match_prefix(&state("code"), &mut ctx).unwrap();
        assert_eq!("", m.matched());
        assert!(not.match_prefix(&state("// comment"), &mut ctx).is_err());
    }
}
