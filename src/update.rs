/*!
In-place mutation of matched regions.

A [`ChangeSet`] owns the original text and an ordered set of
non-overlapping byte-ranged edits; a [`MatchUpdater`] exposes the slots
of one tree match as assignable properties whose writes record edits
against the slot's exact span. All updaters derived from one text share
a single change set, so edits from several matches compose into one
rewritten output.
*/

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::UpdateError;
use crate::pattern::{Slot, TreeMatch, Value};

#[derive(Clone, Debug, Eq, PartialEq)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// The original text plus an ordered set of non-overlapping edits.
///
/// Edits are keyed by their span: recording a new edit over exactly
/// the same span replaces the old one, and an edit whose span strictly
/// contains previously recorded edits supersedes them. Partially
/// overlapping spans are a usage error.
#[derive(Clone, Debug)]
pub struct ChangeSet {
    original: String,
    edits: Vec<Edit>,
}

impl ChangeSet {
    /// An empty change set over the given text.
    pub fn new(text: &str) -> ChangeSet {
        ChangeSet { original: text.to_string(), edits: Vec::new() }
    }

    /// Record the replacement of `[start, end)` with `text`.
    pub fn change(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<(), UpdateError> {
        assert!(
            start <= end && end <= self.original.len(),
            "edit span [{}, {}) is outside the text",
            start,
            end,
        );
        // Edits wholly inside the new span are superseded by it; that
        // covers exact re-assignment (same span, last write wins) and
        // a parent slot overwriting edits to its children.
        self.edits.retain(|e| e.start < start || e.end > end);
        for e in &self.edits {
            if e.start < end && start < e.end {
                return Err(UpdateError::overlapping_edit(start, end));
            }
        }
        let at = self
            .edits
            .iter()
            .position(|e| e.start >= end)
            .unwrap_or(self.edits.len());
        self.edits.insert(at, Edit { start, end, text: text.to_string() });
        Ok(())
    }

    /// The recorded replacement for exactly `[start, end)`, if any.
    pub fn edit_for(&self, start: usize, end: usize) -> Option<&str> {
        self.edits
            .iter()
            .find(|e| e.start == start && e.end == end)
            .map(|e| e.text.as_str())
    }

    /// The original text with all edits applied, left to right.
    pub fn updated(&self) -> String {
        let mut out = String::with_capacity(self.original.len());
        let mut pos = 0;
        for e in &self.edits {
            out.push_str(&self.original[pos..e.start]);
            out.push_str(&e.text);
            pos = e.end;
        }
        out.push_str(&self.original[pos..]);
        out
    }
}

/// Exposes the slots of one tree match as assignable properties.
///
/// Reading returns the current (possibly already overridden) value;
/// writing records an edit over the slot's span. Assigning to a nested
/// slot invalidates any child updater previously derived from it:
/// later reads or writes through the child report an error instead of
/// silently editing replaced text.
pub struct MatchUpdater {
    tree: TreeMatch,
    changes: Rc<RefCell<ChangeSet>>,
    // This updater is dead once any flag along its derivation chain
    // is set.
    invalidation: Vec<Rc<Cell<bool>>>,
    child_flags: RefCell<HashMap<String, Rc<Cell<bool>>>>,
}

impl MatchUpdater {
    /// An updater for `tree`, which must have been matched against
    /// `content`.
    pub fn new(tree: &TreeMatch, content: &str) -> MatchUpdater {
        MatchUpdater {
            tree: tree.clone(),
            changes: Rc::new(RefCell::new(ChangeSet::new(content))),
            invalidation: Vec::new(),
            child_flags: RefCell::new(HashMap::new()),
        }
    }

    fn derived(
        tree: TreeMatch,
        changes: Rc<RefCell<ChangeSet>>,
        invalidation: Vec<Rc<Cell<bool>>>,
    ) -> MatchUpdater {
        MatchUpdater {
            tree,
            changes,
            invalidation,
            child_flags: RefCell::new(HashMap::new()),
        }
    }

    /// The match this updater edits.
    pub fn tree(&self) -> &TreeMatch {
        &self.tree
    }

    pub(crate) fn change_set(&self) -> Rc<RefCell<ChangeSet>> {
        Rc::clone(&self.changes)
    }

    fn check_alive(&self) -> Result<(), UpdateError> {
        if self.invalidation.iter().any(|flag| flag.get()) {
            return Err(UpdateError::invalidated(self.tree.matcher_id()));
        }
        Ok(())
    }

    /// The current value of the named slot: the replacement text if
    /// one has been assigned, the matched value otherwise.
    pub fn get(&self, name: &str) -> Result<Value, UpdateError> {
        self.check_alive()?;
        let slot = self
            .tree
            .slot(name)
            .ok_or_else(|| UpdateError::no_such_slot(name))?;
        if let Some((start, end)) = slot.span() {
            if let Some(text) = self.changes.borrow().edit_for(start, end) {
                return Ok(Value::Str(text.to_string()));
            }
        }
        Ok(slot.value())
    }

    /// Assign `text` to the named slot, recording an edit over its
    /// span.
    pub fn set(&self, name: &str, text: &str) -> Result<(), UpdateError> {
        self.check_alive()?;
        let slot = self
            .tree
            .slot(name)
            .ok_or_else(|| UpdateError::no_such_slot(name))?;
        let (start, end) = match slot.span() {
            Some(span) => span,
            None => return Err(UpdateError::computed_slot(name)),
        };
        if let Slot::Nested { .. } = slot {
            // Overwriting the whole nested region kills any overlay
            // previously derived from it.
            if let Some(flag) = self.child_flags.borrow().get(name) {
                flag.set(true);
            }
        }
        self.changes.borrow_mut().change(start, end, text)
    }

    /// Derive an updater for the named nested slot.
    pub fn child(&self, name: &str) -> Result<MatchUpdater, UpdateError> {
        self.check_alive()?;
        let slot = self
            .tree
            .slot(name)
            .ok_or_else(|| UpdateError::no_such_slot(name))?;
        let nested = match slot {
            Slot::Nested { value, .. } => value.clone(),
            _ => return Err(UpdateError::not_a_tree(name)),
        };
        let flag = Rc::clone(
            self.child_flags
                .borrow_mut()
                .entry(name.to_string())
                .or_insert_with(|| Rc::new(Cell::new(false))),
        );
        let mut invalidation = self.invalidation.clone();
        invalidation.push(flag);
        Ok(MatchUpdater::derived(
            nested,
            Rc::clone(&self.changes),
            invalidation,
        ))
    }

    /// Replace the entire matched span with `text`.
    pub fn replace_all(&self, text: &str) -> Result<(), UpdateError> {
        self.check_alive()?;
        for flag in self.child_flags.borrow().values() {
            flag.set(true);
        }
        self.changes.borrow_mut().change(
            self.tree.offset(),
            self.tree.end(),
            text,
        )
    }

    /// The original text with every recorded edit applied.
    pub fn new_content(&self) -> String {
        self.changes.borrow().updated()
    }
}

impl fmt::Debug for MatchUpdater {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MatchUpdater")
            .field("matcher_id", &self.tree.matcher_id())
            .field("span", &(self.tree.offset(), self.tree.end()))
            .field("invalidated", &self.invalidation.iter().any(|f| f.get()))
            .finish()
    }
}

/// A bulk overlay: updaters for several matches over one text, all
/// feeding a single change set.
pub struct Updatable {
    updaters: Vec<MatchUpdater>,
    changes: Rc<RefCell<ChangeSet>>,
}

impl Updatable {
    /// Updaters for each match, sharing one change set over `content`.
    pub fn new(matches: &[TreeMatch], content: &str) -> Updatable {
        let changes = Rc::new(RefCell::new(ChangeSet::new(content)));
        let updaters = matches
            .iter()
            .map(|m| {
                MatchUpdater::derived(
                    m.clone(),
                    Rc::clone(&changes),
                    Vec::new(),
                )
            })
            .collect();
        Updatable { updaters, changes }
    }

    /// The per-match updaters, in the order the matches were given.
    pub fn updaters(&self) -> &[MatchUpdater] {
        &self.updaters
    }

    /// The updater for the `index`th match.
    pub fn updater(&self, index: usize) -> &MatchUpdater {
        &self.updaters[index]
    }

    /// The content with the edits of every updater applied.
    pub fn updated(&self) -> String {
        self.changes.borrow().updated()
    }
}
