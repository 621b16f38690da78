/*!
The template-string compiler: turns `"...${slot}...⤞..."` into a
[`Concat`].

Lowering rules:

* a slot with a supplied matcher becomes that matcher, bound under the
  slot's name;
* a slot with **no** supplied matcher becomes a non-consuming
  [`Break`] on the next anchor, so it matches anything, non-greedily,
  up to the next landmark;
* the gap token `⤞` wraps whatever follows it in a consuming, binding
  `Break`, so arbitrary text may intervene;
* literal text becomes internal literal steps; with whitespace
  consumption on, template whitespace is elastic (any run in the
  template permits any run in the input).
*/

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::error::BuildError;
use crate::matchers::{is_valid_name, Break, Concat, Matcher, MatchingLogic};

/// The gap token: an explicit "skip anything here" between anchors.
pub const GAP: char = '⤞';

/// The matchers supplied for named slots of a template.
#[derive(Clone, Debug, Default)]
pub struct Definitions {
    map: HashMap<String, Matcher>,
}

impl Definitions {
    /// No definitions: every slot in the template is an undefined,
    /// non-greedy hole.
    pub fn new() -> Definitions {
        Definitions::default()
    }

    /// Supply a matcher for the named slot.
    pub fn define<M: Into<Matcher>>(mut self, name: &str, matcher: M) -> Definitions {
        self.map.insert(name.to_string(), matcher.into());
        self
    }

    fn get(&self, name: &str) -> Option<&Matcher> {
        self.map.get(name)
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|s| s.as_str())
    }
}

/// Options recognized when compiling a template.
#[derive(Clone, Debug, Default)]
pub struct Config {
    consume_white_space_between_tokens: Option<bool>,
    terminator: Option<Matcher>,
    id: Option<String>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Whether template whitespace is elastic and input whitespace is
    /// skipped between steps. Defaults to true.
    pub fn consume_white_space_between_tokens(mut self, yes: bool) -> Config {
        self.consume_white_space_between_tokens = Some(yes);
        self
    }

    /// The anchor for an undefined slot at the very end of a
    /// template. Without one, such a slot is a build error.
    pub fn terminator<M: Into<Matcher>>(mut self, terminator: M) -> Config {
        self.terminator = Some(terminator.into());
        self
    }

    /// An explicit identifier for the compiled grammar.
    pub fn id(mut self, id: &str) -> Config {
        self.id = Some(id.to_string());
        self
    }

    pub fn get_consume_white_space_between_tokens(&self) -> bool {
        self.consume_white_space_between_tokens.unwrap_or(true)
    }

    pub fn get_terminator(&self) -> Option<&Matcher> {
        self.terminator.as_ref()
    }

    pub fn get_id(&self) -> &str {
        self.id.as_deref().unwrap_or("Microgrammar")
    }
}

/// One token of a parsed template.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Element {
    Literal(String),
    Slot(String),
    Gap,
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Element::Literal(ref t) => write!(f, "{:?}", t),
            Element::Slot(ref n) => write!(f, "${{{}}}", n),
            Element::Gap => write!(f, "{}", GAP),
        }
    }
}

fn tokenize(template: &str, elastic: bool) -> Result<Vec<Element>, BuildError> {
    let mut elements = Vec::new();
    let mut literal = String::new();
    let flush = |literal: &mut String, elements: &mut Vec<Element>| {
        if literal.is_empty() {
            return;
        }
        if elastic {
            // Elastic whitespace: split the run into bare anchors and
            // let the concatenation's whitespace strategy absorb any
            // input whitespace between them.
            for word in literal.split_whitespace() {
                elements.push(Element::Literal(word.to_string()));
            }
        } else {
            elements.push(Element::Literal(literal.clone()));
        }
        literal.clear();
    };
    let mut chars = template.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '$' && matches!(chars.peek(), Some(&(_, '{'))) {
            flush(&mut literal, &mut elements);
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            for (_, c) in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                name.push(c);
            }
            if !closed {
                return Err(BuildError::unterminated_slot(i));
            }
            if !is_valid_name(&name) {
                return Err(BuildError::invalid_name(&name));
            }
            elements.push(Element::Slot(name));
        } else if c == GAP {
            flush(&mut literal, &mut elements);
            elements.push(Element::Gap);
        } else {
            literal.push(c);
        }
    }
    flush(&mut literal, &mut elements);
    Ok(elements)
}

/// Compile a template against its definitions into a concatenation.
pub(crate) fn compile(
    template: &str,
    definitions: &Definitions,
    config: &Config,
) -> Result<Concat, BuildError> {
    let elastic = config.get_consume_white_space_between_tokens();
    let elements = tokenize(template, elastic)?;
    let slot_names: Vec<&str> = elements
        .iter()
        .filter_map(|e| match e {
            Element::Slot(name) => Some(name.as_str()),
            _ => None,
        })
        .collect();
    for defined in definitions.names() {
        if !slot_names.contains(&defined) {
            return Err(BuildError::unused_definition(defined));
        }
    }

    let mut builder = Concat::builder()
        .id(config.get_id())
        .consume_white_space(elastic);
    let mut literal_count = 0;
    let mut pending_gap = false;
    for (index, element) in elements.iter().enumerate() {
        match element {
            Element::Gap => pending_gap = true,
            Element::Literal(text) => {
                let name = format!("_lit_{}", literal_count);
                literal_count += 1;
                let anchor = Matcher::literal(text);
                let step = if pending_gap {
                    debug!("gap before {}: lowering to a binding break", element);
                    Matcher::Break(Break::binding(anchor))
                } else {
                    anchor
                };
                builder = builder.step(&name, step);
                pending_gap = false;
            }
            Element::Slot(name) => {
                if let Some(matcher) = definitions.get(name) {
                    let step = if pending_gap {
                        debug!(
                            "gap before ${{{}}}: lowering to a binding break",
                            name,
                        );
                        Matcher::Break(Break::binding(matcher.clone()))
                    } else {
                        matcher.clone()
                    };
                    builder = builder.step(name, step);
                } else {
                    // An undefined slot skips, non-greedily, to the
                    // next anchor; a gap before it adds nothing.
                    let anchor = match elements.get(index + 1) {
                        Some(Element::Literal(text)) => Matcher::literal(text),
                        Some(Element::Slot(next)) => {
                            match definitions.get(next) {
                                Some(m) => m.clone(),
                                None => {
                                    return Err(
                                        BuildError::adjacent_undefined_slots(
                                            name, next,
                                        ),
                                    );
                                }
                            }
                        }
                        Some(Element::Gap) | None => {
                            match config.get_terminator() {
                                Some(m) => m.clone(),
                                None => {
                                    return Err(BuildError::unanchored_slot(
                                        name,
                                    ));
                                }
                            }
                        }
                    };
                    debug!(
                        "undefined slot ${{{}}}: lowering to break until '{}'",
                        name,
                        anchor.id(),
                    );
                    builder = builder.step(name, Break::until(anchor));
                }
                pending_gap = false;
            }
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildErrorKind;
    use crate::matchers::integer;

    fn parse(template: &str) -> Vec<Element> {
        tokenize(template, true).unwrap()
    }

    #[test]
    fn tokenizes_slots_gaps_and_anchors() {
        assert_eq!(
            vec![
                Element::Literal("foo".to_string()),
                Element::Gap,
                Element::Slot("num".to_string()),
            ],
            parse("foo⤞${num}"),
        );
    }

    #[test]
    fn elastic_whitespace_splits_literal_runs() {
        assert_eq!(
            vec![
                Element::Literal("a".to_string()),
                Element::Literal("b".to_string()),
            ],
            parse("a   b"),
        );
        // Verbatim mode keeps the run whole.
        assert_eq!(
            vec![Element::Literal("a   b".to_string())],
            tokenize("a   b", false).unwrap(),
        );
    }

    #[test]
    fn rejects_unterminated_slot() {
        let err = tokenize("foo ${bar", true).unwrap_err();
        assert!(matches!(
            err.kind(),
            BuildErrorKind::UnterminatedSlot { offset: 4 },
        ));
    }

    #[test]
    fn rejects_bad_slot_names() {
        assert!(tokenize("${9lives}", true).is_err());
        assert!(tokenize("${$meta}", true).is_err());
    }

    #[test]
    fn rejects_adjacent_undefined_slots() {
        let err = compile(
            "${a}${b}!",
            &Definitions::new(),
            &Config::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err.kind(),
            BuildErrorKind::AdjacentUndefinedSlots { .. },
        ));
        // Defining one of them resolves the ambiguity.
        assert!(compile(
            "${a}${b}!",
            &Definitions::new().define("b", integer()),
            &Config::new(),
        )
        .is_ok());
    }

    #[test]
    fn rejects_trailing_undefined_slot_without_terminator() {
        let err =
            compile("-> ${x}", &Definitions::new(), &Config::new()).unwrap_err();
        assert!(matches!(err.kind(), BuildErrorKind::UnanchoredSlot { .. }));
        assert!(compile(
            "-> ${x}",
            &Definitions::new(),
            &Config::new().terminator(Matcher::literal(";")),
        )
        .is_ok());
    }

    #[test]
    fn rejects_definitions_for_absent_slots() {
        let err = compile(
            "${a}!",
            &Definitions::new().define("ghost", integer()),
            &Config::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err.kind(),
            BuildErrorKind::UnusedDefinition { .. },
        ));
    }
}
