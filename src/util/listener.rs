/*!
Hooks for observing a matching run from outside without influencing
it.
*/

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::pattern::PatternMatch;
use crate::util::input::InputStateManager;

/// A side-effect-only observer of a matching run.
///
/// Listeners receive every character as it is first read past the
/// cursor (in offset order, each character exactly once) and every
/// successful match with its depth: `0` for hits of the primary
/// matcher, `1` for hits of an observer matcher. Return values are
/// ignored by design; a listener cannot influence the run.
pub trait MatchListener {
    /// Called once per character, in offset order, as the cursor first
    /// passes it.
    fn on_character(&mut self, _c: char, _offset: usize) {}

    /// Called for each successful match the driver reports.
    fn on_match(&mut self, _m: &PatternMatch, _depth: usize) {}
}

/// The set of listeners attached to one matching run.
///
/// Cursors are value types cloned at every step, so the set is a
/// cheaply clonable handle sharing one high-water mark: no character
/// is ever reported twice, no matter how many cursor snapshots pass
/// over it or how often a combinator backtracks.
#[derive(Clone)]
pub struct ListenerSet(Rc<Inner>);

struct Inner {
    listeners: RefCell<Vec<Rc<RefCell<dyn MatchListener>>>>,
    high_water: Cell<usize>,
}

impl ListenerSet {
    /// Create an empty listener set.
    pub fn new() -> ListenerSet {
        ListenerSet(Rc::new(Inner {
            listeners: RefCell::new(Vec::new()),
            high_water: Cell::new(0),
        }))
    }

    /// Create a set holding a single listener.
    pub fn single(listener: Rc<RefCell<dyn MatchListener>>) -> ListenerSet {
        let set = ListenerSet::new();
        set.add(listener);
        set
    }

    /// Attach a listener. The caller keeps its own handle to inspect
    /// whatever state the listener accumulates.
    pub fn add(&self, listener: Rc<RefCell<dyn MatchListener>>) {
        self.0.listeners.borrow_mut().push(listener);
    }

    /// Report the characters in `[high_water, upto)` and raise the
    /// mark.
    pub(crate) fn characters_read(
        &self,
        manager: &Rc<RefCell<InputStateManager>>,
        upto: usize,
    ) {
        let from = self.0.high_water.get();
        if upto <= from {
            return;
        }
        let text = manager.borrow_mut().text(from, upto);
        let mut offset = from;
        for c in text.chars() {
            for listener in self.0.listeners.borrow().iter() {
                listener.borrow_mut().on_character(c, offset);
            }
            offset += c.len_utf8();
        }
        self.0.high_water.set(upto);
    }

    /// Report a successful match at the given depth.
    pub(crate) fn match_found(&self, m: &PatternMatch, depth: usize) {
        for listener in self.0.listeners.borrow().iter() {
            listener.borrow_mut().on_match(m, depth);
        }
    }
}

impl Default for ListenerSet {
    fn default() -> ListenerSet {
        ListenerSet::new()
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.0.listeners.borrow().len())
            .field("high_water", &self.0.high_water.get())
            .finish()
    }
}
