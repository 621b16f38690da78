use anyhow::Result;

use microgrammar::error::UpdateErrorKind;
use microgrammar::matchers::{integer, Concat, Matcher};
use microgrammar::update::ChangeSet;
use microgrammar::{Definitions, Microgrammar, Value};

use crate::init;

fn element() -> Microgrammar {
    Microgrammar::from_string("<${name}>", Definitions::new()).unwrap()
}

fn pair_of_elements() -> Microgrammar {
    let element = element();
    Microgrammar::from_string(
        "${first}${second}",
        Definitions::new()
            .define("first", element.to_matcher())
            .define("second", element.to_matcher()),
    )
    .unwrap()
}

#[test]
fn reading_returns_the_overridden_value() -> Result<()> {
    init();
    let input = "<first><second>";
    let matches = pair_of_elements().find_matches(input);
    let tree = matches[0].as_tree().unwrap();
    let updater = Microgrammar::updatable_match(tree, input);
    assert_eq!(
        Value::Str("<second>".to_string()),
        updater.get("second").map(|v| Value::Str(v.to_string()))?,
    );
    updater.set("second", "<third>")?;
    assert_eq!(Value::Str("<third>".to_string()), updater.get("second")?);
    Ok(())
}

#[test]
fn assigning_a_parent_invalidates_derived_children() -> Result<()> {
    init();
    let input = "<first><second>";
    let matches = pair_of_elements().find_matches(input);
    let tree = matches[0].as_tree().unwrap();
    let updater = Microgrammar::updatable_match(tree, input);

    let second = updater.child("second")?;
    updater.set("second", "<replaced>")?;
    let err = second.set("name", "dead").unwrap_err();
    assert!(matches!(err.kind(), UpdateErrorKind::Invalidated { .. }));
    let err = second.get("name").unwrap_err();
    assert!(matches!(err.kind(), UpdateErrorKind::Invalidated { .. }));
    assert_eq!("<first><replaced>", updater.new_content());
    Ok(())
}

#[test]
fn replace_all_invalidates_every_child() -> Result<()> {
    init();
    let input = "<first><second>";
    let matches = pair_of_elements().find_matches(input);
    let tree = matches[0].as_tree().unwrap();
    let updater = Microgrammar::updatable_match(tree, input);

    let first = updater.child("first")?;
    updater.replace_all("gone")?;
    assert!(first.set("name", "x").is_err());
    assert_eq!("gone", updater.new_content());
    Ok(())
}

#[test]
fn computed_slots_are_read_only() {
    init();
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
    let mg = Microgrammar::from_concat(grammar);
    let input = "2 + 3";
    let matches = mg.find_matches(input);
    let tree = matches[0].as_tree().unwrap();
    assert_eq!(Some(Value::Int(5)), tree.value_of("total"));

    let updater = Microgrammar::updatable_match(tree, input);
    let err = updater.set("total", "9").unwrap_err();
    assert!(matches!(err.kind(), UpdateErrorKind::ComputedSlot { .. }));
}

#[test]
fn unknown_slots_are_reported() {
    init();
    let input = "<first><second>";
    let matches = pair_of_elements().find_matches(input);
    let tree = matches[0].as_tree().unwrap();
    let updater = Microgrammar::updatable_match(tree, input);
    let err = updater.set("third", "x").unwrap_err();
    assert!(matches!(err.kind(), UpdateErrorKind::NoSuchSlot { .. }));
}

#[test]
fn bulk_updates_compose_into_one_output() -> Result<()> {
    init();
    let mg = Microgrammar::from_string(
        "key: ${value};",
        Definitions::new(),
    )
    .unwrap();
    let input = "key: one; key: two; key: three;";
    let trees: Vec<_> = mg
        .find_matches(input)
        .into_iter()
        .map(|m| m.as_tree().unwrap().clone())
        .collect();
    assert_eq!(3, trees.len());

    let bulk = Microgrammar::updatable(&trees, input);
    bulk.updater(0).set("value", "1")?;
    bulk.updater(2).set("value", "3")?;
    assert_eq!("key: 1; key: two; key: 3;", bulk.updated());
    Ok(())
}

#[test]
fn overlapping_edits_are_detected() {
    init();
    let mut cs = ChangeSet::new("hello overlapping world");
    cs.change(0, 10, "A").unwrap();
    let err = cs.change(5, 15, "B").unwrap_err();
    assert!(matches!(
        err.kind(),
        UpdateErrorKind::OverlappingEdit { .. },
    ));
}
