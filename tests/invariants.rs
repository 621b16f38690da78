use microgrammar::matchers::{integer, Matcher};
use microgrammar::{Definitions, Microgrammar, PatternMatch, Slot};

use crate::init;

const INPUT: &str = "\
pre a = 1 amble b = 22 noise
then c = 333 and finally d = 4444
";

fn pair_grammar() -> Microgrammar {
    Microgrammar::from_string(
        "${key} = ${value}",
        Definitions::new()
            .define("key", Matcher::regex("[a-z]+").unwrap())
            .define("value", integer()),
    )
    .unwrap()
}

#[test]
fn matched_text_is_exactly_the_input_slice() {
    init();
    let matches = pair_grammar().find_matches(INPUT);
    assert!(!matches.is_empty());
    for m in &matches {
        assert_eq!(
            &INPUT[m.offset()..m.offset() + m.matched().len()],
            m.matched(),
        );
    }
}

#[test]
fn matches_come_in_strictly_increasing_non_overlapping_order() {
    init();
    let matches = pair_grammar().find_matches(INPUT);
    assert_eq!(4, matches.len());
    for pair in matches.windows(2) {
        assert!(pair[0].offset() < pair[1].offset());
        assert!(pair[0].end() <= pair[1].offset());
    }
}

#[test]
fn scanning_is_deterministic() {
    init();
    let mg = pair_grammar();
    assert_eq!(mg.find_matches(INPUT), mg.find_matches(INPUT));
}

#[test]
fn tree_matched_decomposes_into_steps_and_whitespace() {
    init();
    let matches = pair_grammar().find_matches(INPUT);
    for m in &matches {
        let tree = match m {
            PatternMatch::Tree(t) => t,
            other => panic!("expected a tree, got {:?}", other),
        };
        // Walking the slot spans in order must tile the whole match,
        // with nothing but whitespace between consecutive steps.
        let mut pos = tree.offset();
        for slot in tree.slots() {
            let (start, end) = match slot.span() {
                Some(span) => span,
                None => continue,
            };
            assert!(start >= pos);
            assert!(
                INPUT[pos..start].chars().all(char::is_whitespace),
                "non-whitespace between steps: {:?}",
                &INPUT[pos..start],
            );
            if let Slot::Scalar { value, .. } = slot {
                assert_eq!(&INPUT[start..end], value.matched());
            }
            pos = end;
        }
        assert_eq!(pos, tree.end());
    }
}

#[test]
fn overlay_without_writes_roundtrips_the_input() {
    init();
    let matches = pair_grammar().find_matches(INPUT);
    let tree = matches[0].as_tree().unwrap();
    let updater = Microgrammar::updatable_match(tree, INPUT);
    assert_eq!(INPUT, updater.new_content());
}

#[test]
fn writing_the_current_value_is_idempotent() {
    init();
    let matches = pair_grammar().find_matches(INPUT);
    let tree = matches[1].as_tree().unwrap();
    let updater = Microgrammar::updatable_match(tree, INPUT);
    let current = tree.string("key").unwrap();
    updater.set("key", &current).unwrap();
    assert_eq!(INPUT, updater.new_content());
}

#[test]
fn empty_input_yields_no_matches() {
    init();
    assert!(pair_grammar().find_matches("").is_empty());
}

#[test]
fn impossible_first_matcher_scans_cleanly_to_the_end() {
    init();
    let mg = Microgrammar::from_string(
        "@@${num}",
        Definitions::new().define("num", integer()),
    )
    .unwrap();
    // No '@' anywhere: the scan must fall straight through.
    let haystack = "plain text ".repeat(10_000);
    assert!(mg.find_matches(&haystack).is_empty());
}
