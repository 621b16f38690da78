/*!
A parser-combinator engine for *microgrammars*: declarative patterns
that fill the gap between regular expressions and full grammars.

A microgrammar is composed of literal anchors, named holes (slots) and
sub-matchers. Given a large input, often semi-structured source code or
configuration text, the engine finds every occurrence of the pattern,
skipping arbitrary intervening text between anchors where instructed,
and produces a tree of structured matches whose leaves are slot
values. Matched regions can then be mutated in place to produce an
updated version of the original input with byte-accurate edits.

# Example: find

```
use microgrammar::{Definitions, Microgrammar};
use microgrammar::matchers::integer;

let mg = Microgrammar::from_string(
    "foo⤞${num}",
    Definitions::new().define("num", integer()),
).unwrap();

let matches = mg.find_matches("foo (and some junk) 63");
assert_eq!(1, matches.len());
let tree = matches[0].as_tree().unwrap();
assert_eq!("foo (and some junk) 63", tree.matched());
assert_eq!(Some(63), tree.integer("num"));
```

The `⤞` gap token permits arbitrary text between the anchor and the
slot. A slot with no supplied matcher matches anything, non-greedily,
up to the next anchor:

```
use microgrammar::{Definitions, Microgrammar};

let mg = Microgrammar::from_string("->${fruit}<-", Definitions::new()).unwrap();
let m = mg.exact_match("->banana<-").unwrap();
assert_eq!(Some("banana".to_string()), m.as_tree().unwrap().string("fruit"));
```

# Example: update

```
use microgrammar::{Definitions, Microgrammar};

let mg = Microgrammar::from_string("[${name}]", Definitions::new()).unwrap();
let input = "[alpha] [beta]";
let matches = mg.find_matches(input);
let tree = matches[0].as_tree().unwrap();

let updater = Microgrammar::updatable_match(tree, input);
updater.set("name", "gamma").unwrap();
assert_eq!("[gamma] [beta]", updater.new_content());
```

# Structure

* [`matchers`] is the combinator algebra: primitives, concatenation,
  repetition, alternation, optionality, negative look-ahead and the
  skip-until [`Break`](matchers::Break).
* [`spec`] compiles template strings into concatenations.
* [`machine`] is the scan driver, with matcher swapping and observer
  support.
* [`update`] records byte-ranged edits against matched slots.
* [`util`] holds the streaming input model: a sliding window over a
  character stream, immutable cursors and listener hooks.
*/

pub mod error;
pub mod grammar;
pub mod machine;
pub mod matchers;
pub mod pattern;
pub mod spec;
pub mod update;
pub mod util;

pub use crate::error::{BuildError, UpdateError};
pub use crate::grammar::Microgrammar;
pub use crate::pattern::{
    ArrayMatch, Bindings, DismatchReport, MatchContext, MatchFailure,
    MatchPrefixResult, PatternMatch, Slot, TerminalMatch, TreeMatch, Value,
};
pub use crate::spec::{Config, Definitions};
