/*!
The matching driver: scans an entire input for matches of a primary
matcher, optionally running an observer matcher alongside it.

The driver owns the scan-and-retry policy: skip whitespace, fast-reject
offsets where no match can start, advance one character (or jump to the
next plausible start) after a failure, and release window memory behind
the cursor after every step. The *handler* owns the control policy: its
return value after each match decides whether the scan continues with
the same matcher, a different one, or not at all.
*/

use std::sync::Arc;

use log::trace;

use crate::matchers::{Matcher, MatchingLogic};
use crate::pattern::{MatchContext, PatternMatch, Slot, Value};
use crate::util::input::{InputStream, StringInputStream};
use crate::util::listener::ListenerSet;
use crate::util::state::InputState;

/// Receives every match the driver finds and steers the scan.
pub trait MachineHandler {
    /// Called for each successful, non-empty primary match. The
    /// returned matcher replaces the current one: return the current
    /// matcher (cheaply, via the provided handle) to continue
    /// unchanged, a different one to swap, or `None` to terminate the
    /// scan.
    fn on_match(
        &mut self,
        m: PatternMatch,
        current: &Arc<Matcher>,
    ) -> Option<Arc<Matcher>>;

    /// Called for each hit of the observer matcher, if one is
    /// configured.
    fn observe_match(&mut self, _m: PatternMatch) {}
}

/// Driver options.
#[derive(Clone, Debug, Default)]
pub struct Config {
    consume_white_space: Option<bool>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Whether to skip whitespace before each match attempt. Defaults
    /// to true.
    pub fn consume_white_space(mut self, yes: bool) -> Config {
        self.consume_white_space = Some(yes);
        self
    }

    pub fn get_consume_white_space(&self) -> bool {
        self.consume_white_space.unwrap_or(true)
    }
}

/// A state-machine style driver over one primary matcher and an
/// optional observer.
///
/// The observer is fully independent of the primary matcher: it is run
/// over each matched region (after the primary callbacks for that
/// region) and at each failed offset, and its hits are piped through
/// [`MachineHandler::observe_match`]. The classic use is tracking
/// surrounding structure, such as element depth, while searching for
/// an unrelated pattern.
#[derive(Clone, Debug)]
pub struct MatchingMachine {
    matcher: Arc<Matcher>,
    observer: Option<Arc<Matcher>>,
    config: Config,
}

impl MatchingMachine {
    /// A machine scanning with the given matcher.
    pub fn new(matcher: Matcher) -> MatchingMachine {
        MatchingMachine {
            matcher: Arc::new(matcher),
            observer: None,
            config: Config::default(),
        }
    }

    /// A machine scanning with `matcher` while running `observer`
    /// alongside it.
    pub fn with_observer(matcher: Matcher, observer: Matcher) -> MatchingMachine {
        MatchingMachine {
            matcher: Arc::new(matcher),
            observer: Some(Arc::new(observer)),
            config: Config::default(),
        }
    }

    pub(crate) fn from_shared(matcher: Arc<Matcher>) -> MatchingMachine {
        MatchingMachine { matcher, observer: None, config: Config::default() }
    }

    /// Replace the driver options.
    pub fn configure(mut self, config: Config) -> MatchingMachine {
        self.config = config;
        self
    }

    /// Scan an in-memory input.
    pub fn consume(
        &self,
        input: &str,
        ctx: &mut MatchContext,
        listeners: Option<ListenerSet>,
        handler: &mut dyn MachineHandler,
    ) {
        self.consume_stream(
            Box::new(StringInputStream::new(input)),
            ctx,
            listeners,
            handler,
        )
    }

    /// Scan a streaming input with bounded memory.
    pub fn consume_stream(
        &self,
        stream: Box<dyn InputStream>,
        ctx: &mut MatchContext,
        listeners: Option<ListenerSet>,
        handler: &mut dyn MachineHandler,
    ) {
        let mut state = InputState::new(stream, listeners);
        let mut current = Arc::clone(&self.matcher);
        loop {
            if self.config.get_consume_white_space() {
                let (_, next) = state.skip_white_space();
                state = next;
            }
            if state.exhausted() {
                break;
            }
            let plausible = match state.peek_char() {
                Some(c) => current.can_start_with(c),
                None => false,
            };
            let result = if plausible {
                current.match_prefix(&state, ctx)
            } else {
                Err(crate::pattern::MatchFailure::new(
                    current.id(),
                    state.offset(),
                    "no match can start here".to_string(),
                ))
            };
            match result {
                // A zero-length success cannot advance the scan and is
                // treated as a failure.
                Ok(m) if !m.is_empty() => {
                    let end = m.end();
                    let m = enrich(m, &current);
                    if let Some(ls) = state.listeners() {
                        ls.match_found(&m, 0);
                    }
                    let next = handler.on_match(m, &current);
                    if let Some(ref observer) = self.observer {
                        self.observe_region(observer, &state, end, ctx, handler);
                    }
                    match next {
                        Some(next) => {
                            if !Arc::ptr_eq(&next, &current) {
                                trace!(
                                    "swapping matcher '{}' for '{}' at offset {}",
                                    current.id(),
                                    next.id(),
                                    end,
                                );
                            }
                            current = next;
                        }
                        None => {
                            trace!("handler terminated the scan at offset {}", end);
                            break;
                        }
                    }
                    state = state.advance_to(end);
                }
                _ => {
                    if let Some(ref observer) = self.observer {
                        self.observe_at(observer, &state, ctx, handler);
                    }
                    state = self.advance_past_failure(&current, state);
                }
            }
            state.manager().borrow_mut().drop_left(state.offset());
        }
    }

    /// After a failed attempt, move at least one character and as far
    /// as the current matcher's capabilities prove no match can start.
    fn advance_past_failure(
        &self,
        current: &Matcher,
        state: InputState,
    ) -> InputState {
        let state = state.advance();
        if state.exhausted() {
            return state;
        }
        if let Some(prefix) = current.required_prefix() {
            return match state.find_next(prefix) {
                Some(found) => state.advance_to(found),
                None => {
                    // No plausible start remains anywhere.
                    let end = state.manager().borrow_mut().end();
                    state.advance_to(end)
                }
            };
        }
        let (_, state) = state.skip_while(|c| !current.can_start_with(c), 0);
        state
    }

    fn observe_region(
        &self,
        observer: &Arc<Matcher>,
        start: &InputState,
        end: usize,
        ctx: &mut MatchContext,
        handler: &mut dyn MachineHandler,
    ) {
        let mut cursor = start.clone();
        while cursor.offset() < end && !cursor.exhausted() {
            let plausible = match cursor.peek_char() {
                Some(c) => observer.can_start_with(c),
                None => false,
            };
            if plausible {
                if let Ok(m) = observer.match_prefix(&cursor, ctx) {
                    if !m.is_empty() && m.end() <= end {
                        let to = m.end();
                        if let Some(ls) = cursor.listeners() {
                            ls.match_found(&m, 1);
                        }
                        handler.observe_match(m);
                        cursor = cursor.advance_to(to);
                        continue;
                    }
                }
            }
            cursor = cursor.advance();
        }
    }

    fn observe_at(
        &self,
        observer: &Arc<Matcher>,
        state: &InputState,
        ctx: &mut MatchContext,
        handler: &mut dyn MachineHandler,
    ) {
        if let Ok(m) = observer.match_prefix(state, ctx) {
            if !m.is_empty() {
                if let Some(ls) = state.listeners() {
                    ls.match_found(&m, 1);
                }
                handler.observe_match(m);
            }
        }
    }
}

/// Stamp the driver's metadata onto a match: tree matches gain a
/// `$name` computed slot equal to the matcher id.
fn enrich(m: PatternMatch, current: &Matcher) -> PatternMatch {
    match m {
        PatternMatch::Tree(mut t) => {
            t.push_slot(Slot::Computed {
                name: "$name".to_string(),
                value: Value::Str(current.id().to_string()),
            });
            PatternMatch::Tree(t)
        }
        other => other,
    }
}

/// The built-in "find all" handler: collects matches, optionally
/// stopping when a predicate says so.
pub struct MatchCollector<'a> {
    matches: Vec<PatternMatch>,
    stop_after: Option<Box<dyn FnMut(&PatternMatch) -> bool + 'a>>,
}

impl<'a> MatchCollector<'a> {
    /// Collect every match in the input.
    pub fn new() -> MatchCollector<'a> {
        MatchCollector { matches: Vec::new(), stop_after: None }
    }

    /// Collect matches until `stop_after` returns true for one (that
    /// match is still collected).
    pub fn stopping_after<F>(stop_after: F) -> MatchCollector<'a>
    where
        F: FnMut(&PatternMatch) -> bool + 'a,
    {
        MatchCollector {
            matches: Vec::new(),
            stop_after: Some(Box::new(stop_after)),
        }
    }

    /// The collected matches, in strictly increasing offset order.
    pub fn into_matches(self) -> Vec<PatternMatch> {
        self.matches
    }
}

impl<'a> Default for MatchCollector<'a> {
    fn default() -> MatchCollector<'a> {
        MatchCollector::new()
    }
}

impl<'a> MachineHandler for MatchCollector<'a> {
    fn on_match(
        &mut self,
        m: PatternMatch,
        current: &Arc<Matcher>,
    ) -> Option<Arc<Matcher>> {
        let stop = match self.stop_after {
            Some(ref mut f) => f(&m),
            None => false,
        };
        self.matches.push(m);
        if stop {
            None
        } else {
            Some(Arc::clone(current))
        }
    }
}
