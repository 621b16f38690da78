/*!
The structured results of a match: terminal values, trees of named
slots, repetitions and the failure reports produced when a matcher
declines an input.

Everything in this module is an owned value type. A match never borrows
from the input window, so the driver is free to release buffered text
behind the cursor while matches it already produced stay alive.
*/

use std::collections::HashMap;
use std::fmt;

/// A typed scalar or structured value carried by a match or bound to a
/// slot.
///
/// Primitive matchers produce `Str`/`Int`/`Bool` values, repetition
/// produces `Seq`, nested concatenations produce `Tree` and a missed
/// optional produces `Undefined`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Tree(Box<TreeMatch>),
    Seq(Vec<Value>),
    Undefined,
}

impl Value {
    /// Returns the string content, if this is a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::Str(ref s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content, if this is an `Int` value.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the boolean content, if this is a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the nested tree, if this is a `Tree` value.
    pub fn as_tree(&self) -> Option<&TreeMatch> {
        match *self {
            Value::Tree(ref t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Str(ref s) => write!(f, "{}", s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Tree(ref t) => write!(f, "{}", t.matched()),
            Value::Seq(ref vs) => {
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            Value::Undefined => write!(f, "<undefined>"),
        }
    }
}

/// An atomic match produced by a primitive matcher.
#[derive(Clone, Debug, PartialEq)]
pub struct TerminalMatch {
    matcher_id: String,
    matched: String,
    offset: usize,
    value: Value,
}

impl TerminalMatch {
    pub(crate) fn new(
        matcher_id: &str,
        matched: String,
        offset: usize,
        value: Value,
    ) -> TerminalMatch {
        TerminalMatch { matcher_id: matcher_id.to_string(), matched, offset, value }
    }

    /// The identifier of the matcher that produced this match.
    #[inline]
    pub fn matcher_id(&self) -> &str {
        &self.matcher_id
    }

    /// The exact text this match consumed.
    #[inline]
    pub fn matched(&self) -> &str {
        &self.matched
    }

    /// The byte offset in the input at which this match begins.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The byte offset in the input one past the end of this match.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.matched.len()
    }

    /// The typed value of this match. For most terminals this is the
    /// raw matched text; primitives with a conversion step (integers,
    /// booleans) carry the converted value instead.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// A structured match produced by a concatenation: an ordered sequence
/// of named slots, each bound to a sub-match or a computed value.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeMatch {
    matcher_id: String,
    matched: String,
    offset: usize,
    slots: Vec<Slot>,
}

impl TreeMatch {
    pub(crate) fn new(
        matcher_id: &str,
        matched: String,
        offset: usize,
        slots: Vec<Slot>,
    ) -> TreeMatch {
        TreeMatch { matcher_id: matcher_id.to_string(), matched, offset, slots }
    }

    /// The identifier of the matcher that produced this match.
    #[inline]
    pub fn matcher_id(&self) -> &str {
        &self.matcher_id
    }

    /// The exact text this match consumed, including any whitespace
    /// consumed between steps.
    #[inline]
    pub fn matched(&self) -> &str {
        &self.matched
    }

    /// The byte offset in the input at which this match begins.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The byte offset in the input one past the end of this match.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.matched.len()
    }

    /// All slots in declaration order, including internal ones.
    #[inline]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(crate) fn push_slot(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    /// Look up a slot by name.
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name() == name)
    }

    /// The names of the user-facing slots, in declaration order.
    ///
    /// Names beginning with `_` (vetoes, discardable steps) and `$`
    /// (engine metadata) are never exposed here.
    pub fn slot_names(&self) -> Vec<&str> {
        self.slots
            .iter()
            .map(|s| s.name())
            .filter(|n| !n.starts_with('_') && !n.starts_with('$'))
            .collect()
    }

    /// The value bound to the named slot, if any.
    pub fn value_of(&self, name: &str) -> Option<Value> {
        self.slot(name).map(|s| s.value())
    }

    /// The string value of the named slot, if it is bound to one.
    ///
    /// For a slot whose value is raw text this is the captured text,
    /// surrounding whitespace included; trimming is the caller's
    /// concern.
    pub fn string(&self, name: &str) -> Option<String> {
        match self.value_of(name)? {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer value of the named slot, if it is bound to one.
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.value_of(name)?.as_int()
    }

    /// The boolean value of the named slot, if it is bound to one.
    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.value_of(name)?.as_bool()
    }

    /// The nested tree bound to the named slot, if any.
    pub fn tree(&self, name: &str) -> Option<&TreeMatch> {
        match self.slot(name)? {
            Slot::Nested { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The underlying terminal match for a scalar slot.
    ///
    /// This is the offset-preserving view used by the update overlay:
    /// the terminal knows the exact span of input its value came from.
    pub fn terminal(&self, name: &str) -> Option<&TerminalMatch> {
        match self.slot(name)? {
            Slot::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// A read-only view of the slots bound so far, as handed to veto
    /// and compute steps.
    pub fn bindings(&self) -> Bindings<'_> {
        Bindings { slots: &self.slots }
    }
}

/// A repetition match: the matches of each iteration in order.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayMatch {
    matcher_id: String,
    matched: String,
    offset: usize,
    contents: Vec<PatternMatch>,
}

impl ArrayMatch {
    pub(crate) fn new(
        matcher_id: &str,
        matched: String,
        offset: usize,
        contents: Vec<PatternMatch>,
    ) -> ArrayMatch {
        ArrayMatch { matcher_id: matcher_id.to_string(), matched, offset, contents }
    }

    /// The identifier of the matcher that produced this match.
    #[inline]
    pub fn matcher_id(&self) -> &str {
        &self.matcher_id
    }

    /// The exact text this match consumed, separators and interleaved
    /// whitespace included.
    #[inline]
    pub fn matched(&self) -> &str {
        &self.matched
    }

    /// The byte offset in the input at which this match begins.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The byte offset in the input one past the end of this match.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.matched.len()
    }

    /// The match of each iteration, in input order.
    #[inline]
    pub fn contents(&self) -> &[PatternMatch] {
        &self.contents
    }

    /// The value sequence: the scalar value of each terminal
    /// iteration, the tree of each structured one.
    pub fn values(&self) -> Vec<Value> {
        self.contents.iter().map(|m| m.value()).collect()
    }
}

/// The result of a successful prefix match.
#[derive(Clone, Debug, PartialEq)]
pub enum PatternMatch {
    /// An atomic match from a primitive matcher.
    Terminal(TerminalMatch),
    /// A structured match with named slots.
    Tree(TreeMatch),
    /// A repetition.
    Array(ArrayMatch),
    /// The zero-width placeholder produced when an optional matcher
    /// did not match.
    Undefined {
        /// The identifier of the optional matcher.
        matcher_id: String,
        /// The offset at which the optional was attempted.
        offset: usize,
    },
}

impl PatternMatch {
    /// The identifier of the matcher that produced this match.
    pub fn matcher_id(&self) -> &str {
        match *self {
            PatternMatch::Terminal(ref m) => m.matcher_id(),
            PatternMatch::Tree(ref m) => m.matcher_id(),
            PatternMatch::Array(ref m) => m.matcher_id(),
            PatternMatch::Undefined { ref matcher_id, .. } => matcher_id,
        }
    }

    /// The exact text this match consumed. Empty for `Undefined`.
    pub fn matched(&self) -> &str {
        match *self {
            PatternMatch::Terminal(ref m) => m.matched(),
            PatternMatch::Tree(ref m) => m.matched(),
            PatternMatch::Array(ref m) => m.matched(),
            PatternMatch::Undefined { .. } => "",
        }
    }

    /// The byte offset in the input at which this match begins.
    pub fn offset(&self) -> usize {
        match *self {
            PatternMatch::Terminal(ref m) => m.offset(),
            PatternMatch::Tree(ref m) => m.offset(),
            PatternMatch::Array(ref m) => m.offset(),
            PatternMatch::Undefined { offset, .. } => offset,
        }
    }

    /// The byte offset in the input one past the end of this match.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset() + self.matched().len()
    }

    /// Whether this match consumed no input.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matched().is_empty()
    }

    /// The value of this match: the terminal's typed value, the tree
    /// itself, the repetition's value sequence, or `Undefined`.
    pub fn value(&self) -> Value {
        match *self {
            PatternMatch::Terminal(ref m) => m.value().clone(),
            PatternMatch::Tree(ref m) => Value::Tree(Box::new(m.clone())),
            PatternMatch::Array(ref m) => Value::Seq(m.values()),
            PatternMatch::Undefined { .. } => Value::Undefined,
        }
    }

    /// Returns the tree, if this is a structured match.
    pub fn as_tree(&self) -> Option<&TreeMatch> {
        match *self {
            PatternMatch::Tree(ref m) => Some(m),
            _ => None,
        }
    }

    /// Returns the terminal, if this is an atomic match.
    pub fn as_terminal(&self) -> Option<&TerminalMatch> {
        match *self {
            PatternMatch::Terminal(ref m) => Some(m),
            _ => None,
        }
    }
}

/// One named binding inside a tree match.
///
/// `Scalar` and `Nested` are the two shapes named holes usually take;
/// `Collection` and `Empty` are the slot-level images of repetition
/// and missed-optional step results; `Computed` slots have no span in
/// the input at all.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    /// A named sub-match whose value is a scalar.
    Scalar { name: String, value: TerminalMatch },
    /// A named sub-match whose value is another tree.
    Nested { name: String, value: TreeMatch },
    /// A named repetition.
    Collection { name: String, value: ArrayMatch },
    /// A named optional that did not match.
    Empty { name: String, offset: usize },
    /// A value derived from previously bound slots; consumes nothing.
    Computed { name: String, value: Value },
}

impl Slot {
    /// The slot's name.
    pub fn name(&self) -> &str {
        match *self {
            Slot::Scalar { ref name, .. } => name,
            Slot::Nested { ref name, .. } => name,
            Slot::Collection { ref name, .. } => name,
            Slot::Empty { ref name, .. } => name,
            Slot::Computed { ref name, .. } => name,
        }
    }

    /// The slot's value.
    pub fn value(&self) -> Value {
        match *self {
            Slot::Scalar { ref value, .. } => value.value().clone(),
            Slot::Nested { ref value, .. } => {
                Value::Tree(Box::new(value.clone()))
            }
            Slot::Collection { ref value, .. } => Value::Seq(value.values()),
            Slot::Empty { .. } => Value::Undefined,
            Slot::Computed { ref value, .. } => value.clone(),
        }
    }

    /// The span of input this slot covers, if it has one. Computed
    /// slots do not; an empty optional covers a zero-width span.
    pub fn span(&self) -> Option<(usize, usize)> {
        match *self {
            Slot::Scalar { ref value, .. } => {
                Some((value.offset(), value.end()))
            }
            Slot::Nested { ref value, .. } => {
                Some((value.offset(), value.end()))
            }
            Slot::Collection { ref value, .. } => {
                Some((value.offset(), value.end()))
            }
            Slot::Empty { offset, .. } => Some((offset, offset)),
            Slot::Computed { .. } => None,
        }
    }
}

/// A read-only, name-keyed view of the slots a concatenation has bound
/// so far. This is what veto predicates and compute steps receive.
#[derive(Clone, Copy, Debug)]
pub struct Bindings<'a> {
    slots: &'a [Slot],
}

impl<'a> Bindings<'a> {
    pub(crate) fn new(slots: &'a [Slot]) -> Bindings<'a> {
        Bindings { slots }
    }

    /// Whether a slot with the given name has been bound.
    pub fn has(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s.name() == name)
    }

    /// The value bound to the given name, if any.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.slots.iter().find(|s| s.name() == name).map(|s| s.value())
    }

    /// The string value bound to the given name, if any.
    pub fn string(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer value bound to the given name, if any.
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_int()
    }

    /// The boolean value bound to the given name, if any.
    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }
}

/// Why and where a matcher declined the input.
///
/// Failures are ordinary values. They never advance the caller's
/// cursor and never propagate as panics; the driver decides whether to
/// move on and retry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchFailure {
    matcher_id: String,
    offset: usize,
    description: String,
}

impl MatchFailure {
    /// Create a new failure report.
    pub fn new(
        matcher_id: &str,
        offset: usize,
        description: String,
    ) -> MatchFailure {
        MatchFailure { matcher_id: matcher_id.to_string(), offset, description }
    }

    /// A concatenation failure at a particular step, wrapping the
    /// step's own failure.
    pub(crate) fn at_step(
        matcher_id: &str,
        offset: usize,
        step_name: &str,
        cause: &MatchFailure,
    ) -> MatchFailure {
        MatchFailure::new(
            matcher_id,
            offset,
            format!(
                "Failed at step '{}': {}",
                step_name,
                cause.description()
            ),
        )
    }

    /// A concatenation failure caused by a veto predicate.
    pub(crate) fn vetoed(
        matcher_id: &str,
        offset: usize,
        veto_name: &str,
    ) -> MatchFailure {
        MatchFailure::new(
            matcher_id,
            offset,
            format!("Match vetoed by {}", veto_name),
        )
    }

    /// The identifier of the matcher that declared the failure.
    #[inline]
    pub fn matcher_id(&self) -> &str {
        &self.matcher_id
    }

    /// The offset at which the failure was declared.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// A human-readable reason.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} did not match at offset {}: {}",
            self.matcher_id, self.offset, self.description,
        )
    }
}

/// The result of every prefix-match attempt.
pub type MatchPrefixResult = Result<PatternMatch, MatchFailure>;

/// A string-keyed bag of values threaded through a matching run.
///
/// The engine itself only carries it; veto and compute steps read slot
/// bindings instead. Callers can use it to smuggle run-scoped data to
/// their own handlers.
#[derive(Clone, Debug, Default)]
pub struct MatchContext {
    entries: HashMap<String, Value>,
}

impl MatchContext {
    /// Create an empty context.
    pub fn new() -> MatchContext {
        MatchContext::default()
    }

    /// Bind a value under the given key, replacing any previous one.
    pub fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    /// The value bound under the given key, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }
}

/// The report returned when an exact match consumed less than the
/// whole input.
#[derive(Clone, Debug)]
pub struct DismatchReport {
    matcher_id: String,
    reached: usize,
    remainder: String,
    failure: Option<MatchFailure>,
}

impl DismatchReport {
    pub(crate) fn partial(
        matcher_id: &str,
        reached: usize,
        remainder: String,
    ) -> DismatchReport {
        DismatchReport {
            matcher_id: matcher_id.to_string(),
            reached,
            remainder,
            failure: None,
        }
    }

    pub(crate) fn failed(
        matcher_id: &str,
        remainder: String,
        failure: MatchFailure,
    ) -> DismatchReport {
        DismatchReport {
            matcher_id: matcher_id.to_string(),
            reached: 0,
            remainder,
            failure: Some(failure),
        }
    }

    /// How far into the input the match reached before stopping.
    #[inline]
    pub fn reached(&self) -> usize {
        self.reached
    }

    /// A preview of the input that remained unconsumed.
    #[inline]
    pub fn remainder(&self) -> &str {
        &self.remainder
    }

    /// The prefix failure, when the match never succeeded at all.
    #[inline]
    pub fn failure(&self) -> Option<&MatchFailure> {
        self.failure.as_ref()
    }
}

impl fmt::Display for DismatchReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.failure {
            Some(ref fail) => write!(
                f,
                "{} did not match the input at all: {}",
                self.matcher_id, fail,
            ),
            None => write!(
                f,
                "{} matched {} bytes but input remained: {:?}",
                self.matcher_id, self.reached, self.remainder,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal(name: &str, text: &str, offset: usize) -> Slot {
        Slot::Scalar {
            name: name.to_string(),
            value: TerminalMatch::new(
                "test",
                text.to_string(),
                offset,
                Value::Str(text.to_string()),
            ),
        }
    }

    #[test]
    fn tree_accessors() {
        let tree = TreeMatch::new(
            "pair",
            "a = 1".to_string(),
            0,
            vec![
                terminal("key", "a", 0),
                Slot::Scalar {
                    name: "value".to_string(),
                    value: TerminalMatch::new(
                        "integer",
                        "1".to_string(),
                        4,
                        Value::Int(1),
                    ),
                },
                Slot::Computed {
                    name: "$name".to_string(),
                    value: Value::Str("pair".to_string()),
                },
            ],
        );
        assert_eq!(Some("a".to_string()), tree.string("key"));
        assert_eq!(Some(1), tree.integer("value"));
        assert_eq!(vec!["key", "value"], tree.slot_names());
        assert_eq!(Some((4, 5)), tree.slot("value").unwrap().span());
    }

    #[test]
    fn bindings_lookup() {
        let slots = vec![terminal("fruit", "banana", 2)];
        let bindings = Bindings::new(&slots);
        assert!(bindings.has("fruit"));
        assert_eq!(Some("banana".to_string()), bindings.string("fruit"));
        assert_eq!(None, bindings.get("drink"));
    }

    #[test]
    fn failure_formatting() {
        let inner = MatchFailure::new("lit", 5, "expected '='".to_string());
        let outer = MatchFailure::at_step("pair", 0, "eq", &inner);
        assert_eq!("Failed at step 'eq': expected '='", outer.description());
        assert_eq!(0, outer.offset());
    }
}
