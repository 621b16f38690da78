/*!
The user-facing grammar type tying the engine together.
*/

use std::sync::Arc;

use crate::error::BuildError;
use crate::machine::{MatchCollector, MatchingMachine};
use crate::matchers::{Concat, Matcher, MatchingLogic};
use crate::pattern::{DismatchReport, MatchContext, PatternMatch, TreeMatch};
use crate::spec::{self, Config, Definitions};
use crate::update::{MatchUpdater, Updatable};
use crate::util::input::StringInputStream;
use crate::util::listener::ListenerSet;
use crate::util::state::InputState;

/// How much trailing input a dismatch report quotes back.
const REMAINDER_PREVIEW: usize = 50;

/// A microgrammar: a compiled pattern that finds structured matches
/// inside larger texts.
///
/// Build one from a template string with [`Microgrammar::from_string`]
/// or from an explicitly assembled [`Concat`] with
/// [`Microgrammar::from_concat`], then scan inputs with
/// [`find_matches`](Microgrammar::find_matches),
/// [`first_match`](Microgrammar::first_match) or
/// [`exact_match`](Microgrammar::exact_match).
#[derive(Clone, Debug)]
pub struct Microgrammar {
    matcher: Arc<Matcher>,
}

impl Microgrammar {
    /// Compile a template like `"${name} = ${value}"` against the
    /// given slot definitions.
    pub fn from_string(
        template: &str,
        definitions: Definitions,
    ) -> Result<Microgrammar, BuildError> {
        Microgrammar::from_string_with(template, definitions, Config::new())
    }

    /// Like [`Microgrammar::from_string`], with compile options.
    pub fn from_string_with(
        template: &str,
        definitions: Definitions,
        config: Config,
    ) -> Result<Microgrammar, BuildError> {
        let concat = spec::compile(template, &definitions, &config)?;
        Ok(Microgrammar::from_concat(concat))
    }

    /// A grammar over an explicitly assembled concatenation.
    pub fn from_concat(concat: Concat) -> Microgrammar {
        Microgrammar { matcher: Arc::new(Matcher::Concat(concat)) }
    }

    /// The underlying matcher.
    pub fn matcher(&self) -> &Arc<Matcher> {
        &self.matcher
    }

    /// A clone of the underlying matcher, for use as a sub-matcher of
    /// another grammar.
    pub fn to_matcher(&self) -> Matcher {
        (*self.matcher).clone()
    }

    /// Every match in `input`, in strictly increasing offset order.
    pub fn find_matches(&self, input: &str) -> Vec<PatternMatch> {
        let mut ctx = MatchContext::new();
        self.find_matches_with(input, &mut ctx, None, None)
    }

    /// The full-parameter variant of
    /// [`find_matches`](Microgrammar::find_matches): a caller-supplied
    /// context, listeners observing the run, and a `stop_after`
    /// predicate for cooperative cancellation (the match it accepts is
    /// still returned).
    pub fn find_matches_with(
        &self,
        input: &str,
        ctx: &mut MatchContext,
        listeners: Option<ListenerSet>,
        stop_after: Option<Box<dyn FnMut(&PatternMatch) -> bool>>,
    ) -> Vec<PatternMatch> {
        let machine = MatchingMachine::from_shared(Arc::clone(&self.matcher));
        let mut collector = match stop_after {
            Some(f) => MatchCollector::stopping_after(f),
            None => MatchCollector::new(),
        };
        machine.consume(input, ctx, listeners, &mut collector);
        collector.into_matches()
    }

    /// The first match in `input`, if any.
    ///
    /// This is find-all with a stop-after that accepts the first
    /// match.
    pub fn first_match(&self, input: &str) -> Option<PatternMatch> {
        let mut ctx = MatchContext::new();
        self.find_matches_with(input, &mut ctx, None, Some(Box::new(|_| true)))
            .into_iter()
            .next()
    }

    /// Match the whole input, from its first byte to its last.
    ///
    /// Fails with a [`DismatchReport`] when the pattern does not match
    /// at offset 0 or leaves anything but trailing whitespace
    /// unconsumed.
    pub fn exact_match(
        &self,
        input: &str,
    ) -> Result<PatternMatch, DismatchReport> {
        let mut ctx = MatchContext::new();
        self.exact_match_with(input, &mut ctx, None)
    }

    /// Like [`exact_match`](Microgrammar::exact_match), with a
    /// caller-supplied context and listeners.
    pub fn exact_match_with(
        &self,
        input: &str,
        ctx: &mut MatchContext,
        listeners: Option<ListenerSet>,
    ) -> Result<PatternMatch, DismatchReport> {
        let state = InputState::new(
            Box::new(StringInputStream::new(input)),
            listeners,
        );
        match self.matcher.match_prefix(&state, ctx) {
            Ok(m) => {
                let rest = &input[m.end()..];
                if rest.chars().all(char::is_whitespace) {
                    Ok(m)
                } else {
                    Err(DismatchReport::partial(
                        self.matcher.id(),
                        m.end(),
                        preview(rest),
                    ))
                }
            }
            Err(failure) => Err(DismatchReport::failed(
                self.matcher.id(),
                preview(input),
                failure,
            )),
        }
    }

    /// An update overlay for one match over the content it was found
    /// in.
    pub fn updatable_match(m: &TreeMatch, content: &str) -> MatchUpdater {
        MatchUpdater::new(m, content)
    }

    /// A bulk overlay: one updater per match, all composing into a
    /// single rewritten output.
    pub fn updatable(matches: &[TreeMatch], content: &str) -> Updatable {
        Updatable::new(matches, content)
    }
}

impl From<&Microgrammar> for Matcher {
    fn from(mg: &Microgrammar) -> Matcher {
        mg.to_matcher()
    }
}

fn preview(rest: &str) -> String {
    rest.chars().take(REMAINDER_PREVIEW).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::integer;

    #[test]
    fn first_match_is_the_head_of_find_all() {
        let mg = Microgrammar::from_string(
            "#${num}",
            Definitions::new().define("num", integer()),
        )
        .unwrap();
        let input = "#1 #2 #3";
        let all = mg.find_matches(input);
        let first = mg.first_match(input).unwrap();
        assert_eq!(3, all.len());
        assert_eq!(all[0], first);
    }

    #[test]
    fn exact_match_requires_full_consumption() {
        let mg = Microgrammar::from_string(
            "#${num}",
            Definitions::new().define("num", integer()),
        )
        .unwrap();
        assert!(mg.exact_match("#42").is_ok());
        // Trailing whitespace is tolerated; anything else is not.
        assert!(mg.exact_match("#42  ").is_ok());
        let report = mg.exact_match("#42 and more").unwrap_err();
        assert_eq!(3, report.reached());
        assert!(report.remainder().contains("and more"));
        let report = mg.exact_match("nope").unwrap_err();
        assert!(report.failure().is_some());
    }
}
