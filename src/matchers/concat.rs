/*!
Concatenation: the structural core of the algebra.

A `Concat` runs an ordered sequence of named steps. Matcher steps bind
slots; veto steps can fail the whole concatenation based on what has
been bound so far; compute steps derive new values without consuming
input. Whitespace between steps is consumed (and folded into the
match) according to the concatenation's whitespace strategy.
*/

use std::fmt;
use std::sync::Arc;

use crate::error::BuildError;
use crate::matchers::brk::Break;
use crate::matchers::{is_valid_name, Matcher, MatchingLogic};
use crate::pattern::{
    Bindings, MatchContext, MatchFailure, MatchPrefixResult, PatternMatch,
    Slot, TreeMatch, Value,
};
use crate::util::state::InputState;

/// A veto predicate: receives the slots bound so far and returns
/// `false` to fail the concatenation at that point.
pub type VetoFn = Arc<dyn Fn(&Bindings<'_>) -> bool + Send + Sync>;

/// A compute step: receives the slots bound so far and produces the
/// value stored under its name.
pub type ComputeFn = Arc<dyn Fn(&Bindings<'_>) -> Value + Send + Sync>;

/// One named step of a concatenation.
#[derive(Clone)]
pub struct Step {
    name: String,
    kind: StepKind,
}

impl Step {
    /// The step's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the step does.
    pub fn kind(&self) -> &StepKind {
        &self.kind
    }
}

/// What a step does when the concatenation reaches it.
#[derive(Clone)]
pub enum StepKind {
    /// Match a sub-pattern and bind it under the step's name.
    Match(Matcher),
    /// Evaluate a predicate over the bound slots; `false` vetoes.
    Veto(VetoFn),
    /// Derive a value from the bound slots; consumes nothing.
    Compute(ComputeFn),
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            StepKind::Match(ref m) => {
                f.debug_struct("Step").field("name", &self.name).field("matcher", m).finish()
            }
            StepKind::Veto(_) => {
                f.debug_struct("Step").field("name", &self.name).field("veto", &"<fn>").finish()
            }
            StepKind::Compute(_) => {
                f.debug_struct("Step").field("name", &self.name).field("compute", &"<fn>").finish()
            }
        }
    }
}

/// An ordered concatenation of named steps producing a tree match.
#[derive(Clone, Debug)]
pub struct Concat {
    id: String,
    steps: Vec<Step>,
    consume_white_space: bool,
    lazy: bool,
}

impl Concat {
    /// Start building a concatenation.
    pub fn builder() -> ConcatBuilder {
        ConcatBuilder::new()
    }

    /// The steps in declaration order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Whether whitespace is consumed before each step.
    pub fn consumes_white_space(&self) -> bool {
        self.consume_white_space
    }

    /// Validate a lazily built concatenation. Eagerly built ones were
    /// validated by [`ConcatBuilder::build`] already.
    pub fn init(&self) -> Result<(), BuildError> {
        self.validate()
    }

    fn validate(&self) -> Result<(), BuildError> {
        let mut seen: Vec<&str> = Vec::new();
        let mut matchers = 0;
        for step in &self.steps {
            let name = step.name.as_str();
            if !is_valid_name(name) {
                return Err(BuildError::invalid_name(name));
            }
            if seen.contains(&name) {
                return Err(BuildError::duplicate_name(name));
            }
            seen.push(name);
            match step.kind {
                StepKind::Match(_) => matchers += 1,
                StepKind::Veto(_) => {
                    if !name.starts_with('_') {
                        return Err(BuildError::veto_name(name));
                    }
                }
                StepKind::Compute(_) => {}
            }
        }
        if matchers == 0 {
            return Err(BuildError::no_steps(&self.id));
        }
        Ok(())
    }

    /// Consume whitespace per the strategy, threading the skipped text
    /// into the accumulated match.
    fn ready_to_match(&self, state: &InputState, matched: &mut String) -> InputState {
        if !self.consume_white_space {
            return state.clone();
        }
        let (skipped, next) = state.skip_white_space();
        matched.push_str(&skipped);
        next
    }

    fn first_matcher(&self) -> Option<&Matcher> {
        self.steps.iter().find_map(|s| match s.kind {
            StepKind::Match(ref m) => Some(m),
            _ => None,
        })
    }
}

impl MatchingLogic for Concat {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_prefix(
        &self,
        state: &InputState,
        ctx: &mut MatchContext,
    ) -> MatchPrefixResult {
        if self.lazy {
            if let Err(err) = self.validate() {
                panic!("lazy concatenation '{}' is invalid: {}", self.id, err);
            }
        }
        let initial_offset = state.offset();
        let mut state = state.clone();
        let mut matched = String::new();
        let mut slots: Vec<Slot> = Vec::new();
        for step in &self.steps {
            match step.kind {
                StepKind::Match(ref matcher) => {
                    state = self.ready_to_match(&state, &mut matched);
                    match matcher.match_prefix(&state, ctx) {
                        Ok(m) => {
                            state = state.consume(m.matched(), &step.name);
                            matched.push_str(m.matched());
                            slots.push(bind(&step.name, m));
                        }
                        Err(failure) => {
                            // The failure is declared at the initial
                            // offset: no partial consumption is
                            // visible to the caller.
                            return Err(MatchFailure::at_step(
                                &self.id,
                                initial_offset,
                                &step.name,
                                &failure,
                            ));
                        }
                    }
                }
                StepKind::Veto(ref veto) => {
                    if !veto(&Bindings::new(&slots)) {
                        return Err(MatchFailure::vetoed(
                            &self.id,
                            initial_offset,
                            &step.name,
                        ));
                    }
                }
                StepKind::Compute(ref compute) => {
                    let value = compute(&Bindings::new(&slots));
                    slots.push(Slot::Computed {
                        name: step.name.clone(),
                        value,
                    });
                }
            }
        }
        Ok(PatternMatch::Tree(TreeMatch::new(
            &self.id,
            matched,
            initial_offset,
            slots,
        )))
    }

    fn can_start_with(&self, c: char) -> bool {
        match self.first_matcher() {
            Some(m) => m.can_start_with(c),
            None => true,
        }
    }

    fn required_prefix(&self) -> Option<&str> {
        self.first_matcher().and_then(|m| m.required_prefix())
    }
}

/// Bind a step result as a slot, by result shape.
fn bind(name: &str, m: PatternMatch) -> Slot {
    match m {
        PatternMatch::Terminal(t) => {
            Slot::Scalar { name: name.to_string(), value: t }
        }
        PatternMatch::Tree(t) => {
            Slot::Nested { name: name.to_string(), value: t }
        }
        PatternMatch::Array(a) => {
            Slot::Collection { name: name.to_string(), value: a }
        }
        PatternMatch::Undefined { offset, .. } => {
            Slot::Empty { name: name.to_string(), offset }
        }
    }
}

/// Builds a [`Concat`] step by step.
#[derive(Clone, Debug)]
pub struct ConcatBuilder {
    id: Option<String>,
    steps: Vec<Step>,
    consume_white_space: bool,
    skip_gaps: bool,
    lazy: bool,
}

impl ConcatBuilder {
    pub fn new() -> ConcatBuilder {
        ConcatBuilder {
            id: None,
            steps: Vec::new(),
            consume_white_space: true,
            skip_gaps: false,
            lazy: false,
        }
    }

    /// Append a matcher step bound under `name`.
    pub fn step<M: Into<Matcher>>(mut self, name: &str, matcher: M) -> ConcatBuilder {
        self.steps.push(Step {
            name: name.to_string(),
            kind: StepKind::Match(matcher.into()),
        });
        self
    }

    /// Append a veto predicate. The name must begin with `_`.
    pub fn veto<F>(mut self, name: &str, veto: F) -> ConcatBuilder
    where
        F: Fn(&Bindings<'_>) -> bool + Send + Sync + 'static,
    {
        self.steps.push(Step {
            name: name.to_string(),
            kind: StepKind::Veto(Arc::new(veto)),
        });
        self
    }

    /// Append a compute step deriving a value from earlier slots.
    pub fn compute<F>(mut self, name: &str, compute: F) -> ConcatBuilder
    where
        F: Fn(&Bindings<'_>) -> Value + Send + Sync + 'static,
    {
        self.steps.push(Step {
            name: name.to_string(),
            kind: StepKind::Compute(Arc::new(compute)),
        });
        self
    }

    /// Whether to skip whitespace before each step. Defaults to true.
    pub fn consume_white_space(mut self, yes: bool) -> ConcatBuilder {
        self.consume_white_space = yes;
        self
    }

    /// When enabled, every matcher step is implicitly wrapped in a
    /// consuming, binding [`Break`], so arbitrary text may intervene
    /// between steps. Defaults to false.
    pub fn skip_gaps(mut self, yes: bool) -> ConcatBuilder {
        self.skip_gaps = yes;
        self
    }

    /// Defer step validation until the concatenation is first used
    /// (or [`Concat::init`] is called). Defaults to false.
    pub fn lazy(mut self, yes: bool) -> ConcatBuilder {
        self.lazy = yes;
        self
    }

    /// An explicit identifier for diagnostics.
    pub fn id(mut self, id: &str) -> ConcatBuilder {
        self.id = Some(id.to_string());
        self
    }

    /// Build the concatenation, validating it unless `lazy` was set.
    pub fn build(self) -> Result<Concat, BuildError> {
        let steps = if self.skip_gaps {
            self.steps
                .into_iter()
                .map(|step| match step.kind {
                    StepKind::Match(m) => Step {
                        name: step.name,
                        kind: StepKind::Match(Matcher::Break(
                            Break::binding(m),
                        )),
                    },
                    other => Step { name: step.name, kind: other },
                })
                .collect()
        } else {
            self.steps
        };
        let concat = Concat {
            id: self.id.unwrap_or_else(|| "Concat".to_string()),
            steps,
            consume_white_space: self.consume_white_space,
            lazy: self.lazy,
        };
        if !concat.lazy {
            concat.validate()?;
        }
        Ok(concat)
    }
}

impl Default for ConcatBuilder {
    fn default() -> ConcatBuilder {
        ConcatBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::integer;
    use crate::util::input::StringInputStream;

    fn state(text: &str) -> InputState {
        InputState::new(Box::new(StringInputStream::new(text)), None)
    }

    fn pair() -> Concat {
        Concat::builder()
            .id("pair")
            .step("key", Matcher::regex("[a-z_]+").unwrap())
            .step("_eq", Matcher::literal("="))
            .step("value", integer())
            .build()
            .unwrap()
    }

    #[test]
    fn binds_slots_in_order() {
        let mut ctx = MatchContext::new();
        let m = pair().match_prefix(&state("count = 2"), &mut ctx).unwrap();
        let tree = m.as_tree().unwrap();
        assert_eq!("count = 2", tree.matched());
        assert_eq!(Some("count".to_string()), tree.string("key"));
        assert_eq!(Some(2), tree.integer("value"));
        // The special step is bound but never exposed.
        assert_eq!(vec!["key", "value"], tree.slot_names());
    }

    #[test]
    fn whitespace_between_steps_is_part_of_the_match() {
        let mut ctx = MatchContext::new();
        let m = pair().match_prefix(&state("a   =   1"), &mut ctx).unwrap();
        assert_eq!("a   =   1", m.matched());
    }

    #[test]
    fn step_failure_reports_initial_offset() {
        let mut ctx = MatchContext::new();
        let err = pair().match_prefix(&state("count : 2"), &mut ctx).unwrap_err();
        assert_eq!(0, err.offset());
        assert!(err.description().starts_with("Failed at step '_eq'"));
    }

    #[test]
    fn veto_fails_the_whole_concat() {
        let grammar = Concat::builder()
            .id("guarded")
            .step("n", integer())
            .veto("_positive", |b| b.integer("n").unwrap() > 0)
            .build()
            .unwrap();
        let mut ctx = MatchContext::new();
        assert!(grammar.match_prefix(&state("5"), &mut ctx).is_ok());
        let err = grammar.match_prefix(&state("-5"), &mut ctx).unwrap_err();
        assert_eq!("Match vetoed by _positive", err.description());
    }

    #[test]
    fn compute_step_derives_a_value() {
        let grammar = Concat::builder()
            .id("sum")
            .step("a", integer())
            .step("_plus", Matcher::literal("+"))
            .step("b", integer())
            .compute("total", |b| {
                Value::Int(b.integer("a").unwrap() + b.integer("b").unwrap())
            })
            .build()
            .unwrap();
        let mut ctx = MatchContext::new();
        let m = grammar.match_prefix(&state("2 + 3"), &mut ctx).unwrap();
        let tree = m.as_tree().unwrap();
        assert_eq!(Some(Value::Int(5)), tree.value_of("total"));
        // Computed slots have no span.
        assert_eq!(None, tree.slot("total").unwrap().span());
    }

    #[test]
    fn veto_name_must_be_internal() {
        let err = Concat::builder()
            .step("n", integer())
            .veto("positive", |_| true)
            .build()
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::error::BuildErrorKind::VetoName { .. }
        ));
    }

    #[test]
    fn lazy_defers_validation_to_init() {
        // Invalid (no matcher steps), but lazy construction accepts it.
        let concat = Concat::builder()
            .lazy(true)
            .veto("_never", |_| false)
            .build()
            .unwrap();
        let err = concat.init().unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::error::BuildErrorKind::NoSteps { .. }
        ));
    }

    #[test]
    fn required_prefix_comes_from_first_step() {
        let grammar = Concat::builder()
            .step("_kw", Matcher::literal("import"))
            .step("what", Matcher::regex("[a-z.]+").unwrap())
            .build()
            .unwrap();
        assert_eq!(Some("import"), grammar.required_prefix());
        assert!(grammar.can_start_with('i'));
        assert!(!grammar.can_start_with('x'));
    }
}
