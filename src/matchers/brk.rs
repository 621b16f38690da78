/*!
Break: the skip-until combinator.

`Break` consumes characters until its terminator matches at the
cursor. It is the canonical internal representation of every "skip"
the engine offers: undefined template slots lower to a non-consuming
`Break`, the gap token and the `skip_gaps` option lower to a
consuming, binding one.
*/

use crate::matchers::{Matcher, MatchingLogic};
use crate::pattern::{
    ArrayMatch, MatchContext, MatchFailure, MatchPrefixResult, PatternMatch,
    TerminalMatch, TreeMatch, Value,
};
use crate::util::state::InputState;

/// Consumes characters until a terminator matches.
#[derive(Clone, Debug)]
pub struct Break {
    id: String,
    terminator: Box<Matcher>,
    consume_terminator: bool,
    bind_terminator: bool,
    excluded: Option<Box<Matcher>>,
}

impl Break {
    /// Skip up to **and including** the terminator; the value is the
    /// skipped prefix. This is the default form.
    pub fn through<M: Into<Matcher>>(terminator: M) -> Break {
        Break::build(terminator.into(), true, false)
    }

    /// Skip up to and including the terminator; the value is the
    /// *terminator's* match rather than the skipped prefix (the
    /// "yada-yada" idiom).
    pub fn binding<M: Into<Matcher>>(terminator: M) -> Break {
        Break::build(terminator.into(), true, true)
    }

    /// Skip up to but **not including** the terminator, leaving it for
    /// the next step to match; the value is the skipped prefix.
    pub fn until<M: Into<Matcher>>(terminator: M) -> Break {
        Break::build(terminator.into(), false, false)
    }

    fn build(
        terminator: Matcher,
        consume_terminator: bool,
        bind_terminator: bool,
    ) -> Break {
        Break {
            id: format!("Break[{}]", terminator.id()),
            terminator: Box::new(terminator),
            consume_terminator,
            bind_terminator,
            excluded: None,
        }
    }

    /// Fail the break if `excluded` would match at any position before
    /// the terminator is found: "A eventually, but not if B appears
    /// first".
    pub fn excluding<M: Into<Matcher>>(mut self, excluded: M) -> Break {
        self.excluded = Some(Box::new(excluded.into()));
        self
    }

    fn finish(
        &self,
        start_offset: usize,
        skipped: String,
        terminator_match: PatternMatch,
    ) -> MatchPrefixResult {
        if !self.consume_terminator {
            return Ok(PatternMatch::Terminal(TerminalMatch::new(
                &self.id,
                skipped.clone(),
                start_offset,
                Value::Str(skipped),
            )));
        }
        let mut total = skipped.clone();
        total.push_str(terminator_match.matched());
        if !self.bind_terminator {
            return Ok(PatternMatch::Terminal(TerminalMatch::new(
                &self.id,
                total,
                start_offset,
                Value::Str(skipped),
            )));
        }
        // The bound value is the terminator's match. The span still
        // covers the skipped text, but a structured terminator keeps
        // its inner slots at their exact offsets, so updates through
        // them stay byte-accurate.
        match terminator_match {
            PatternMatch::Tree(t) => {
                let slots = t.slots().to_vec();
                Ok(PatternMatch::Tree(TreeMatch::new(
                    &self.id,
                    total,
                    start_offset,
                    slots,
                )))
            }
            PatternMatch::Array(a) => {
                let contents = a.contents().to_vec();
                Ok(PatternMatch::Array(ArrayMatch::new(
                    &self.id,
                    total,
                    start_offset,
                    contents,
                )))
            }
            PatternMatch::Terminal(t) => {
                Ok(PatternMatch::Terminal(TerminalMatch::new(
                    &self.id,
                    total,
                    start_offset,
                    t.value().clone(),
                )))
            }
            PatternMatch::Undefined { .. } => {
                Ok(PatternMatch::Terminal(TerminalMatch::new(
                    &self.id,
                    total,
                    start_offset,
                    Value::Undefined,
                )))
            }
        }
    }
}

impl MatchingLogic for Break {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(
        &self,
        state: &InputState,
        ctx: &mut MatchContext,
    ) -> MatchPrefixResult {
        let start_offset = state.offset();
        let mut state = state.clone();
        let mut skipped = String::new();
        loop {
            if let Ok(tm) = self.terminator.match_prefix(&state, ctx) {
                return self.finish(start_offset, skipped, tm);
            }
            if let Some(ref excluded) = self.excluded {
                if excluded.match_prefix(&state, ctx).is_ok() {
                    return Err(MatchFailure::new(
                        &self.id,
                        start_offset,
                        format!(
                            "excluded '{}' matched at offset {} before \
                             the terminator",
                            excluded.id(),
                            state.offset(),
                        ),
                    ));
                }
            }
            if state.exhausted() {
                return Err(MatchFailure::new(
                    &self.id,
                    start_offset,
                    format!(
                        "terminator '{}' not found",
                        self.terminator.id(),
                    ),
                ));
            }
            // Jump straight to the next plausible terminator start.
            // With an exclusion in play every position must be probed,
            // so the jump only applies without one.
            if self.excluded.is_none() {
                if let Some(prefix) = self.terminator.required_prefix() {
                    match state.find_next(prefix) {
                        Some(found) if found > state.offset() => {
                            skipped.push_str(&state.text_to(found));
                            state = state.advance_to(found);
                            continue;
                        }
                        Some(_) => {
                            // The prefix is right here but the full
                            // terminator still failed; step over it.
                        }
                        None => {
                            return Err(MatchFailure::new(
                                &self.id,
                                start_offset,
                                format!(
                                    "terminator '{}' not found",
                                    self.terminator.id(),
                                ),
                            ));
                        }
                    }
                }
            }
            let c = state.peek_char().expect("not exhausted");
            skipped.push(c);
            state = state.advance();
        }
    }

    // A break can start anywhere; the default capability answers
    // (anything may start it, no required prefix) are the right ones.
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::integer;
    use crate::util::input::StringInputStream;

    fn state(text: &str) -> InputState {
        InputState::new(Box::new(StringInputStream::new(text)), None)
    }

    #[test]
    fn through_consumes_the_terminator() {
        let brk = Break::through(Matcher::literal("<-"));
        let mut ctx = MatchContext::new();
        let m = brk.match_prefix(&state("banana<-rest"), &mut ctx).unwrap();
        assert_eq!("banana<-", m.matched());
        assert_eq!(Value::Str("banana".to_string()), m.value());
    }

    #[test]
    fn until_leaves_the_terminator() {
        let brk = Break::until(Matcher::literal("<-"));
        let mut ctx = MatchContext::new();
        let m = brk.match_prefix(&state("banana<-rest"), &mut ctx).unwrap();
        assert_eq!("banana", m.matched());
        assert_eq!(Value::Str("banana".to_string()), m.value());
    }

    #[test]
    fn binding_takes_the_terminator_value() {
        let brk = Break::binding(integer());
        let mut ctx = MatchContext::new();
        let m = brk
            .match_prefix(&state("junk then 63 more"), &mut ctx)
            .unwrap();
        assert_eq!("junk then 63", m.matched());
        assert_eq!(Value::Int(63), m.value());
    }

    #[test]
    fn missing_terminator_fails_at_the_start() {
        let brk = Break::through(Matcher::literal("?"));
        let mut ctx = MatchContext::new();
        let err = brk.match_prefix(&state("no question"), &mut ctx).unwrap_err();
        assert_eq!(0, err.offset());
    }

    #[test]
    fn excluded_matcher_fails_the_break() {
        let brk =
            Break::through(Matcher::literal(";")).excluding(Matcher::literal("}"));
        let mut ctx = MatchContext::new();
        assert!(brk.match_prefix(&state("let x = 1;"), &mut ctx).is_ok());
        assert!(brk.match_prefix(&state("let x }1;"), &mut ctx).is_err());
    }

    #[test]
    fn terminator_at_the_cursor_skips_nothing() {
        let brk = Break::through(Matcher::literal("end"));
        let mut ctx = MatchContext::new();
        let m = brk.match_prefix(&state("end"), &mut ctx).unwrap();
        assert_eq!("end", m.matched());
        assert_eq!(Value::Str(String::new()), m.value());
    }

    #[test]
    fn partial_prefix_hits_do_not_derail_the_scan() {
        // "<-" appears as a bare "<" first; the scan must step over
        // the false start and still find the real terminator.
        let brk = Break::until(Matcher::literal("<-"));
        let mut ctx = MatchContext::new();
        let m = brk.match_prefix(&state("a < b <- c"), &mut ctx).unwrap();
        assert_eq!("a < b ", m.matched());
    }
}
