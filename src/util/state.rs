/*!
The immutable cursor over a matching run's input.
*/

use std::cell::RefCell;
use std::rc::Rc;

use crate::util::input::{InputStateManager, InputStream};
use crate::util::listener::ListenerSet;

/// An immutable cursor into the input.
///
/// States are value types: every operation that moves forward returns
/// a *new* state and leaves the receiver untouched, so a combinator
/// can probe ahead and fall back to an older snapshot on failure.
/// All states of one run share a single [`InputStateManager`] by
/// reference; producing a new state never invalidates an older one
/// still in scope.
///
/// Offsets are byte offsets into the input, always aligned to a
/// character boundary.
#[derive(Clone, Debug)]
pub struct InputState {
    manager: Rc<RefCell<InputStateManager>>,
    offset: usize,
    listeners: Option<ListenerSet>,
}

impl InputState {
    /// A cursor at offset 0 over a fresh manager for the given stream.
    pub fn new(
        stream: Box<dyn InputStream>,
        listeners: Option<ListenerSet>,
    ) -> InputState {
        InputState {
            manager: Rc::new(RefCell::new(InputStateManager::new(stream))),
            offset: 0,
            listeners,
        }
    }

    pub(crate) fn shared(
        manager: Rc<RefCell<InputStateManager>>,
        offset: usize,
        listeners: Option<ListenerSet>,
    ) -> InputState {
        InputState { manager, offset, listeners }
    }

    /// The manager shared by every state of this run.
    pub(crate) fn manager(&self) -> &Rc<RefCell<InputStateManager>> {
        &self.manager
    }

    /// This cursor's byte offset.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether the cursor is at or past the end of the input.
    pub fn exhausted(&self) -> bool {
        self.manager.borrow_mut().exhausted(self.offset)
    }

    /// Up to `n` characters from the cursor, without moving it.
    pub fn peek(&self, n: usize) -> String {
        self.manager.borrow_mut().peek_chars(self.offset, n)
    }

    /// The character under the cursor, if any.
    pub fn peek_char(&self) -> Option<char> {
        self.manager.borrow_mut().char_at(self.offset)
    }

    /// The exact text between this cursor and `to`.
    pub(crate) fn text_to(&self, to: usize) -> String {
        self.manager.borrow_mut().text(self.offset, to)
    }

    /// The next occurrence of `needle` at or after the cursor.
    pub(crate) fn find_next(&self, needle: &str) -> Option<usize> {
        self.manager.borrow_mut().find_from(self.offset, needle)
    }

    /// A new state just past `matched`, which must be exactly the text
    /// under the cursor. `why` names the consumer in trace output.
    pub fn consume(&self, matched: &str, why: &str) -> InputState {
        debug_assert_eq!(
            self.manager
                .borrow_mut()
                .text(self.offset, self.offset + matched.len()),
            matched,
            "consume of text that is not at the cursor (consumer: {})",
            why,
        );
        log::trace!(
            "{} consumed {} bytes at offset {}",
            why,
            matched.len(),
            self.offset,
        );
        self.moved(self.offset + matched.len())
    }

    /// A new state one character further on. Used by the driver after
    /// a failed prefix match. At end of input, returns a clone.
    pub fn advance(&self) -> InputState {
        match self.peek_char() {
            Some(c) => self.moved(self.offset + c.len_utf8()),
            None => self.clone(),
        }
    }

    /// A new state at `offset`, which must not be behind the cursor.
    pub(crate) fn advance_to(&self, offset: usize) -> InputState {
        assert!(offset >= self.offset, "cursor cannot move backwards");
        self.moved(offset)
    }

    /// Consume characters while `pred` holds. If fewer than `min`
    /// characters satisfy it, nothing is consumed.
    pub fn skip_while<P: Fn(char) -> bool>(
        &self,
        pred: P,
        min: usize,
    ) -> (String, InputState) {
        let mut skipped = String::new();
        let mut count = 0;
        let mut offset = self.offset;
        loop {
            let c = self.manager.borrow_mut().char_at(offset);
            match c {
                Some(c) if pred(c) => {
                    skipped.push(c);
                    count += 1;
                    offset += c.len_utf8();
                }
                _ => break,
            }
        }
        if count < min {
            return (String::new(), self.clone());
        }
        (skipped, self.moved(offset))
    }

    /// Consume any run of whitespace under the cursor.
    pub fn skip_white_space(&self) -> (String, InputState) {
        self.skip_while(char::is_whitespace, 0)
    }

    fn moved(&self, offset: usize) -> InputState {
        if let Some(ref listeners) = self.listeners {
            listeners.characters_read(&self.manager, offset);
        }
        InputState {
            manager: Rc::clone(&self.manager),
            offset,
            listeners: self.listeners.clone(),
        }
    }

    pub(crate) fn listeners(&self) -> Option<&ListenerSet> {
        self.listeners.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::input::StringInputStream;

    fn state(text: &str) -> InputState {
        InputState::new(Box::new(StringInputStream::new(text)), None)
    }

    #[test]
    fn snapshots_are_independent_values() {
        let s0 = state("abcdef");
        let s1 = s0.consume("abc", "test");
        assert_eq!(0, s0.offset());
        assert_eq!(3, s1.offset());
        // The older cursor still reads its own position.
        assert_eq!("abc", s0.peek(3));
        assert_eq!("def", s1.peek(3));
    }

    #[test]
    fn skip_while_honors_minimum() {
        let s = state("   x");
        let (skipped, next) = s.skip_while(char::is_whitespace, 0);
        assert_eq!("   ", skipped);
        assert_eq!(3, next.offset());
        let (skipped, next) = s.skip_while(char::is_whitespace, 5);
        assert_eq!("", skipped);
        assert_eq!(0, next.offset());
    }

    #[test]
    fn advance_stops_at_end() {
        let s = state("a");
        let s = s.advance();
        assert!(s.exhausted());
        assert_eq!(1, s.advance().offset());
    }

    #[test]
    fn multibyte_advance() {
        let s = state("⤞x");
        let s = s.advance();
        assert_eq!('⤞'.len_utf8(), s.offset());
        assert_eq!("x", s.peek(1));
    }
}
