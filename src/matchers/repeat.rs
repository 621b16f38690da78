/*!
Repetition, with or without a separator.
*/

use crate::matchers::{Matcher, MatchingLogic};
use crate::pattern::{
    ArrayMatch, MatchContext, MatchFailure, MatchPrefixResult, PatternMatch,
};
use crate::util::state::InputState;

/// Matches `inner` zero or more times, optionally separated by `sep`,
/// requiring at least `min` occurrences.
///
/// A separator is only committed when another inner match follows it;
/// a trailing separator is left unconsumed.
#[derive(Clone, Debug)]
pub struct Rep {
    id: String,
    inner: Box<Matcher>,
    min: usize,
    sep: Option<Box<Matcher>>,
    consume_white_space: bool,
}

impl Rep {
    /// Zero or more occurrences of `inner`.
    pub fn new<M: Into<Matcher>>(inner: M) -> Rep {
        Rep::build(inner.into(), 0, None)
    }

    /// At least `min` occurrences of `inner`.
    pub fn at_least<M: Into<Matcher>>(inner: M, min: usize) -> Rep {
        Rep::build(inner.into(), min, None)
    }

    /// Zero or more occurrences of `inner`, separated by `sep`.
    pub fn separated<M, S>(inner: M, sep: S) -> Rep
    where
        M: Into<Matcher>,
        S: Into<Matcher>,
    {
        Rep::build(inner.into(), 0, Some(sep.into()))
    }

    /// At least `min` occurrences of `inner`, separated by `sep`.
    pub fn separated_at_least<M, S>(inner: M, sep: S, min: usize) -> Rep
    where
        M: Into<Matcher>,
        S: Into<Matcher>,
    {
        Rep::build(inner.into(), min, Some(sep.into()))
    }

    fn build(inner: Matcher, min: usize, sep: Option<Matcher>) -> Rep {
        Rep {
            id: format!("Rep[{}]", inner.id()),
            inner: Box::new(inner),
            min,
            sep: sep.map(Box::new),
            consume_white_space: true,
        }
    }

    /// Whether to skip whitespace before each occurrence and
    /// separator. Defaults to true.
    pub fn consume_white_space(mut self, yes: bool) -> Rep {
        self.consume_white_space = yes;
        self
    }

    fn skip(&self, state: &InputState) -> (String, InputState) {
        if self.consume_white_space {
            state.skip_white_space()
        } else {
            (String::new(), state.clone())
        }
    }

    fn guard_progress(&self, m: &PatternMatch) {
        if m.is_empty() {
            panic!(
                "degenerate grammar: '{}' matched the empty string inside \
                 a repetition and can never make progress",
                m.matcher_id(),
            );
        }
    }
}

impl MatchingLogic for Rep {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(
        &self,
        state: &InputState,
        ctx: &mut MatchContext,
    ) -> MatchPrefixResult {
        let initial_offset = state.offset();
        let mut state = state.clone();
        let mut matched = String::new();
        let mut contents: Vec<PatternMatch> = Vec::new();
        loop {
            if contents.is_empty() {
                let (ws, at) = self.skip(&state);
                let m = match self.inner.match_prefix(&at, ctx) {
                    Ok(m) => m,
                    Err(_) => break,
                };
                self.guard_progress(&m);
                matched.push_str(&ws);
                matched.push_str(m.matched());
                state = at.consume(m.matched(), "rep");
                contents.push(m);
                continue;
            }
            // Subsequent occurrences: when a separator is configured,
            // it is only committed together with the inner match that
            // follows it.
            let mut tentative = String::new();
            let (ws, mut at) = self.skip(&state);
            tentative.push_str(&ws);
            if let Some(ref sep) = self.sep {
                let sm = match sep.match_prefix(&at, ctx) {
                    Ok(sm) => sm,
                    Err(_) => break,
                };
                at = at.consume(sm.matched(), "rep-sep");
                tentative.push_str(sm.matched());
                let (ws2, after) = self.skip(&at);
                tentative.push_str(&ws2);
                at = after;
            }
            let m = match self.inner.match_prefix(&at, ctx) {
                Ok(m) => m,
                Err(_) => break,
            };
            self.guard_progress(&m);
            matched.push_str(&tentative);
            matched.push_str(m.matched());
            state = at.consume(m.matched(), "rep");
            contents.push(m);
        }
        if contents.len() < self.min {
            return Err(MatchFailure::new(
                &self.id,
                initial_offset,
                format!(
                    "expected at least {} occurrences of '{}', found {}",
                    self.min,
                    self.inner.id(),
                    contents.len(),
                ),
            ));
        }
        Ok(PatternMatch::Array(ArrayMatch::new(
            &self.id,
            matched,
            initial_offset,
            contents,
        )))
    }

    fn can_start_with(&self, c: char) -> bool {
        if self.min == 0 {
            return true;
        }
        self.inner.can_start_with(c)
    }

    fn required_prefix(&self) -> Option<&str> {
        if self.min == 0 {
            return None;
        }
        self.inner.required_prefix()
    }
}
