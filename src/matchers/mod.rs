/*!
The matcher algebra: a single `MatchingLogic` contract, the primitive
matchers, and the combinators that compose them.

Everything that can match is one variant of the [`Matcher`] enum. The
engine is polymorphic over the capability set `{match_prefix, optional
can_start_with, optional required_prefix, stable id}`; each variant
owns its children, so a grammar is an ordinary owned tree.
*/

use crate::error::BuildError;
use crate::pattern::{
    MatchContext, MatchFailure, MatchPrefixResult, PatternMatch,
    TerminalMatch, Value,
};
use crate::util::state::InputState;

pub mod alt;
pub mod brk;
pub mod concat;
pub mod repeat;

pub use self::alt::{Alt, Not, Opt};
pub use self::brk::Break;
pub use self::concat::{Concat, ConcatBuilder, Step, StepKind};
pub use self::repeat::Rep;

/// The core contract every matcher fulfills.
///
/// `match_prefix` attempts to match at the given cursor and reports
/// either a structured match or a failure value. A failure never
/// advances the caller's cursor and never mutates shared state.
///
/// `can_start_with` and `required_prefix` are optional fast-reject
/// capabilities: the driver uses them to skip offsets where a match is
/// impossible without paying for a full `match_prefix` call.
pub trait MatchingLogic {
    /// A stable identifier used in diagnostics and match reports.
    fn id(&self) -> &str;

    /// Attempt to match a prefix of the input at the given cursor.
    fn match_prefix(
        &self,
        state: &InputState,
        ctx: &mut MatchContext,
    ) -> MatchPrefixResult;

    /// Whether a match could conceivably begin with the given
    /// character. `true` means "maybe"; `false` is a guarantee.
    fn can_start_with(&self, _c: char) -> bool {
        true
    }

    /// A literal prefix every match must begin with, when one exists.
    fn required_prefix(&self) -> Option<&str> {
        None
    }
}

/// A matcher: one node of a grammar tree.
#[derive(Clone, Debug)]
pub enum Matcher {
    Literal(Literal),
    Regex(RegexMatcher),
    Rest(RestOfInput),
    Concat(Concat),
    Rep(Rep),
    Alt(Alt),
    Opt(Opt),
    Not(Not),
    Break(Break),
}

impl Matcher {
    /// A matcher for the exact text `s`.
    pub fn literal(s: &str) -> Matcher {
        Matcher::Literal(Literal::new(s))
    }

    /// A matcher for the longest prefix matching the given regular
    /// expression, anchored at the cursor.
    pub fn regex(pattern: &str) -> Result<Matcher, BuildError> {
        Ok(Matcher::Regex(RegexMatcher::new(pattern)?))
    }
}

impl MatchingLogic for Matcher {
    fn id(&self) -> &str {
        match *self {
            Matcher::Literal(ref m) => m.id(),
            Matcher::Regex(ref m) => m.id(),
            Matcher::Rest(ref m) => m.id(),
            Matcher::Concat(ref m) => m.id(),
            Matcher::Rep(ref m) => m.id(),
            Matcher::Alt(ref m) => m.id(),
            Matcher::Opt(ref m) => m.id(),
            Matcher::Not(ref m) => m.id(),
            Matcher::Break(ref m) => m.id(),
        }
    }

    fn match_prefix(
        &self,
        state: &InputState,
        ctx: &mut MatchContext,
    ) -> MatchPrefixResult {
        match *self {
            Matcher::Literal(ref m) => m.match_prefix(state, ctx),
            Matcher::Regex(ref m) => m.match_prefix(state, ctx),
            Matcher::Rest(ref m) => m.match_prefix(state, ctx),
            Matcher::Concat(ref m) => m.match_prefix(state, ctx),
            Matcher::Rep(ref m) => m.match_prefix(state, ctx),
            Matcher::Alt(ref m) => m.match_prefix(state, ctx),
            Matcher::Opt(ref m) => m.match_prefix(state, ctx),
            Matcher::Not(ref m) => m.match_prefix(state, ctx),
            Matcher::Break(ref m) => m.match_prefix(state, ctx),
        }
    }

    fn can_start_with(&self, c: char) -> bool {
        match *self {
            Matcher::Literal(ref m) => m.can_start_with(c),
            Matcher::Regex(ref m) => m.can_start_with(c),
            Matcher::Rest(ref m) => m.can_start_with(c),
            Matcher::Concat(ref m) => m.can_start_with(c),
            Matcher::Rep(ref m) => m.can_start_with(c),
            Matcher::Alt(ref m) => m.can_start_with(c),
            Matcher::Opt(ref m) => m.can_start_with(c),
            Matcher::Not(ref m) => m.can_start_with(c),
            Matcher::Break(ref m) => m.can_start_with(c),
        }
    }

    fn required_prefix(&self) -> Option<&str> {
        match *self {
            Matcher::Literal(ref m) => m.required_prefix(),
            Matcher::Regex(ref m) => m.required_prefix(),
            Matcher::Rest(ref m) => m.required_prefix(),
            Matcher::Concat(ref m) => m.required_prefix(),
            Matcher::Rep(ref m) => m.required_prefix(),
            Matcher::Alt(ref m) => m.required_prefix(),
            Matcher::Opt(ref m) => m.required_prefix(),
            Matcher::Not(ref m) => m.required_prefix(),
            Matcher::Break(ref m) => m.required_prefix(),
        }
    }
}

impl From<Literal> for Matcher {
    fn from(m: Literal) -> Matcher {
        Matcher::Literal(m)
    }
}

impl From<RegexMatcher> for Matcher {
    fn from(m: RegexMatcher) -> Matcher {
        Matcher::Regex(m)
    }
}

impl From<RestOfInput> for Matcher {
    fn from(m: RestOfInput) -> Matcher {
        Matcher::Rest(m)
    }
}

impl From<Concat> for Matcher {
    fn from(m: Concat) -> Matcher {
        Matcher::Concat(m)
    }
}

impl From<Rep> for Matcher {
    fn from(m: Rep) -> Matcher {
        Matcher::Rep(m)
    }
}

impl From<Alt> for Matcher {
    fn from(m: Alt) -> Matcher {
        Matcher::Alt(m)
    }
}

impl From<Opt> for Matcher {
    fn from(m: Opt) -> Matcher {
        Matcher::Opt(m)
    }
}

impl From<Not> for Matcher {
    fn from(m: Not) -> Matcher {
        Matcher::Not(m)
    }
}

impl From<Break> for Matcher {
    fn from(m: Break) -> Matcher {
        Matcher::Break(m)
    }
}

/// Matches the exact text it was built from, nothing else.
#[derive(Clone, Debug)]
pub struct Literal {
    id: String,
    text: String,
    chars: usize,
}

impl Literal {
    /// A matcher for the exact text `s`.
    pub fn new(s: &str) -> Literal {
        Literal {
            id: format!("Literal[{}]", s),
            text: s.to_string(),
            chars: s.chars().count(),
        }
    }
}

impl MatchingLogic for Literal {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(
        &self,
        state: &InputState,
        _ctx: &mut MatchContext,
    ) -> MatchPrefixResult {
        let ahead = state.peek(self.chars);
        if ahead == self.text {
            Ok(PatternMatch::Terminal(TerminalMatch::new(
                &self.id,
                self.text.clone(),
                state.offset(),
                Value::Str(self.text.clone()),
            )))
        } else {
            Err(MatchFailure::new(
                &self.id,
                state.offset(),
                format!("expected '{}'", self.text),
            ))
        }
    }

    fn can_start_with(&self, c: char) -> bool {
        self.text.chars().next() == Some(c)
    }

    fn required_prefix(&self) -> Option<&str> {
        Some(&self.text)
    }
}

/// How far ahead of the cursor a regex match initially looks. The
/// window doubles whenever a match (or a failure) might extend past
/// it, so streaming inputs stay bounded without capping match length.
const INITIAL_LOOKAHEAD: usize = 256;

/// The value-conversion step applied to a regex-backed primitive.
#[derive(Clone, Copy, Debug)]
enum Convert {
    Raw,
    Int,
    Bool,
}

/// Matches the longest prefix accepted by a regular expression,
/// anchored at the cursor.
#[derive(Clone, Debug)]
pub struct RegexMatcher {
    id: String,
    re: regex::Regex,
    convert: Convert,
}

impl RegexMatcher {
    /// An anchored matcher for `pattern`.
    pub fn new(pattern: &str) -> Result<RegexMatcher, BuildError> {
        RegexMatcher::converting(
            &format!("Regex[{}]", pattern),
            pattern,
            Convert::Raw,
        )
    }

    fn converting(
        id: &str,
        pattern: &str,
        convert: Convert,
    ) -> Result<RegexMatcher, BuildError> {
        let anchored = format!(r"\A(?:{})", pattern);
        let re = regex::Regex::new(&anchored)
            .map_err(|e| BuildError::regex(pattern, e))?;
        Ok(RegexMatcher { id: id.to_string(), re, convert })
    }

    fn value_of(&self, matched: &str) -> Result<Value, String> {
        match self.convert {
            Convert::Raw => Ok(Value::Str(matched.to_string())),
            Convert::Int => matched
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("'{}' is out of integer range", matched)),
            Convert::Bool => Ok(Value::Bool(matched == "true")),
        }
    }
}

impl MatchingLogic for RegexMatcher {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(
        &self,
        state: &InputState,
        _ctx: &mut MatchContext,
    ) -> MatchPrefixResult {
        let mut lookahead = INITIAL_LOOKAHEAD;
        loop {
            let ahead = state.peek(lookahead);
            // Fewer characters than requested means the window reaches
            // the end of input, so this attempt is definitive.
            let definitive = ahead.chars().count() < lookahead;
            match self.re.find(&ahead) {
                Some(m) if m.end() < ahead.len() || definitive => {
                    let matched = ahead[..m.end()].to_string();
                    let value =
                        self.value_of(&matched).map_err(|description| {
                            MatchFailure::new(
                                &self.id,
                                state.offset(),
                                description,
                            )
                        })?;
                    return Ok(PatternMatch::Terminal(TerminalMatch::new(
                        &self.id,
                        matched,
                        state.offset(),
                        value,
                    )));
                }
                None if definitive => {
                    return Err(MatchFailure::new(
                        &self.id,
                        state.offset(),
                        format!("/{}/ did not match", self.re.as_str()),
                    ));
                }
                // The match ran to the edge of the window (or the
                // failure might flip with more context): widen.
                _ => lookahead *= 2,
            }
        }
    }
}

/// Always succeeds, consuming everything that remains.
#[derive(Clone, Debug)]
pub struct RestOfInput {
    id: String,
}

impl RestOfInput {
    pub fn new() -> RestOfInput {
        RestOfInput { id: "RestOfInput".to_string() }
    }
}

impl Default for RestOfInput {
    fn default() -> RestOfInput {
        RestOfInput::new()
    }
}

impl MatchingLogic for RestOfInput {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(
        &self,
        state: &InputState,
        _ctx: &mut MatchContext,
    ) -> MatchPrefixResult {
        let rest = state.text_to(usize::MAX);
        Ok(PatternMatch::Terminal(TerminalMatch::new(
            &self.id,
            rest.clone(),
            state.offset(),
            Value::Str(rest),
        )))
    }
}

/// A signed decimal integer with an `i64` value.
pub fn integer() -> Matcher {
    Matcher::Regex(
        RegexMatcher::converting("Integer", r"-?[0-9]+", Convert::Int)
            .expect("the integer pattern always compiles"),
    )
}

/// A lowercase `true` or `false` with a boolean value.
pub fn lowercase_boolean() -> Matcher {
    Matcher::Regex(
        RegexMatcher::converting(
            "LowercaseBoolean",
            r"true|false",
            Convert::Bool,
        )
        .expect("the boolean pattern always compiles"),
    )
}

/// One or more whitespace characters.
pub fn white_space() -> Matcher {
    Matcher::Regex(
        RegexMatcher::converting("WhiteSpace", r"\s+", Convert::Raw)
            .expect("the whitespace pattern always compiles"),
    )
}

/// Everything that remains in the input.
pub fn rest_of_input() -> Matcher {
    Matcher::Rest(RestOfInput::new())
}

/// Whether `s` is a valid slot or step name: identifier-like, with
/// `_` permitted (and conventional) as the internal-name prefix.
pub(crate) fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::input::StringInputStream;

    fn state(text: &str) -> InputState {
        InputState::new(Box::new(StringInputStream::new(text)), None)
    }

    #[test]
    fn literal_matches_exact_prefix() {
        let lit = Literal::new("public");
        let mut ctx = MatchContext::new();
        let m = lit.match_prefix(&state("public class"), &mut ctx).unwrap();
        assert_eq!("public", m.matched());
        assert_eq!(0, m.offset());
        assert!(lit.match_prefix(&state("private"), &mut ctx).is_err());
        assert!(lit.can_start_with('p'));
        assert!(!lit.can_start_with('q'));
        assert_eq!(Some("public"), lit.required_prefix());
    }

    #[test]
    fn regex_takes_longest_prefix() {
        let re = RegexMatcher::new("[a-z]+").unwrap();
        let mut ctx = MatchContext::new();
        let m = re.match_prefix(&state("abc123"), &mut ctx).unwrap();
        assert_eq!("abc", m.matched());
        assert!(re.match_prefix(&state("123"), &mut ctx).is_err());
    }

    #[test]
    fn regex_widens_past_initial_lookahead() {
        let text = "a".repeat(INITIAL_LOOKAHEAD * 3);
        let re = RegexMatcher::new("a+").unwrap();
        let mut ctx = MatchContext::new();
        let m = re.match_prefix(&state(&text), &mut ctx).unwrap();
        assert_eq!(text.len(), m.matched().len());
    }

    #[test]
    fn integer_converts_its_value() {
        let mut ctx = MatchContext::new();
        let m = integer().match_prefix(&state("-42 rest"), &mut ctx).unwrap();
        assert_eq!("-42", m.matched());
        assert_eq!(Value::Int(-42), m.value());
    }

    #[test]
    fn boolean_converts_its_value() {
        let mut ctx = MatchContext::new();
        let m = lowercase_boolean()
            .match_prefix(&state("false!"), &mut ctx)
            .unwrap();
        assert_eq!(Value::Bool(false), m.value());
        assert!(lowercase_boolean()
            .match_prefix(&state("True"), &mut ctx)
            .is_err());
    }

    #[test]
    fn rest_of_input_consumes_everything() {
        let mut ctx = MatchContext::new();
        let m = rest_of_input()
            .match_prefix(&state("anything at all"), &mut ctx)
            .unwrap();
        assert_eq!("anything at all", m.matched());
    }

    #[test]
    fn name_validation() {
        assert!(is_valid_name("fruit"));
        assert!(is_valid_name("_veto"));
        assert!(is_valid_name("a1_b2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1abc"));
        assert!(!is_valid_name("$name"));
        assert!(!is_valid_name("a-b"));
    }
}
