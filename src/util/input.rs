/*!
The character source and the sliding window over it.

An [`InputStream`] produces characters in chunks; the
[`InputStateManager`] owns the stream plus a window of already-read
text covering byte offsets `[left, right)`. Cursors only ever borrow
the manager, so the driver can release the window behind the oldest
live cursor and keep memory bounded by the largest match span rather
than the whole input.
*/

use std::fmt;

use memchr::memmem;

/// How many characters to pull from the underlying stream per read.
const DEFAULT_READ_SIZE: usize = 4096;

/// An abstract producer of characters.
///
/// Implementations report `exhausted` once no further characters will
/// be produced; `read` returns up to `n` characters and an empty
/// string at end of input.
pub trait InputStream {
    /// Whether the stream has no more characters to produce.
    fn exhausted(&self) -> bool;

    /// Read up to `n` characters. May return fewer; returns an empty
    /// string only at end of input.
    fn read(&mut self, n: usize) -> String;
}

/// An in-memory stream over a string.
#[derive(Clone, Debug)]
pub struct StringInputStream {
    text: String,
    pos: usize,
}

impl StringInputStream {
    /// Create a stream producing the characters of `text`.
    pub fn new(text: &str) -> StringInputStream {
        StringInputStream { text: text.to_string(), pos: 0 }
    }
}

impl InputStream for StringInputStream {
    fn exhausted(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn read(&mut self, n: usize) -> String {
        let rest = &self.text[self.pos..];
        let took: String = rest.chars().take(n).collect();
        self.pos += took.len();
        took
    }
}

/// Owns the stream and a sliding window `[left, right)` of already
/// read text.
///
/// Invariant: no cursor issued may refer to an offset below `left`.
/// Reading behind the window is a bug in the driver, not a data error,
/// and panics.
pub struct InputStateManager {
    stream: Box<dyn InputStream>,
    window: String,
    left: usize,
    drained: bool,
}

impl InputStateManager {
    /// Create a manager over the given stream with an empty window.
    pub fn new(stream: Box<dyn InputStream>) -> InputStateManager {
        let drained = stream.exhausted();
        InputStateManager { stream, window: String::new(), left: 0, drained }
    }

    /// The lowest offset still covered by the window.
    #[inline]
    pub fn left(&self) -> usize {
        self.left
    }

    /// One past the highest offset covered by the window.
    #[inline]
    fn window_end(&self) -> usize {
        self.left + self.window.len()
    }

    /// Pull one chunk from the stream into the window. Returns false
    /// once the stream is drained and nothing was added.
    fn fill(&mut self) -> bool {
        if self.drained {
            return false;
        }
        let chunk = self.stream.read(DEFAULT_READ_SIZE);
        if chunk.is_empty() {
            self.drained = true;
            return false;
        }
        self.window.push_str(&chunk);
        if self.stream.exhausted() {
            self.drained = true;
        }
        true
    }

    /// Grow the window until it covers `offset`, or the stream drains.
    fn fill_to(&mut self, offset: usize) {
        while self.window_end() <= offset {
            if !self.fill() {
                return;
            }
        }
    }

    fn check_window(&self, offset: usize) {
        assert!(
            offset >= self.left,
            "cursor at offset {} is behind the window (left is {}): \
             drop_left released it too early",
            offset,
            self.left,
        );
    }

    /// Whether there is no character at or after `offset`.
    pub fn exhausted(&mut self, offset: usize) -> bool {
        self.check_window(offset);
        self.fill_to(offset);
        offset >= self.window_end()
    }

    /// The character at `offset`, if any.
    pub fn char_at(&mut self, offset: usize) -> Option<char> {
        self.check_window(offset);
        self.fill_to(offset);
        if offset >= self.window_end() {
            return None;
        }
        self.window[offset - self.left..].chars().next()
    }

    /// Up to `n` characters starting at `offset`.
    pub fn peek_chars(&mut self, offset: usize, n: usize) -> String {
        self.check_window(offset);
        self.fill_to(offset);
        loop {
            if offset >= self.window_end() {
                return String::new();
            }
            let avail = self.window[offset - self.left..].chars().take(n);
            if avail.clone().count() >= n || self.drained {
                return avail.collect();
            }
            if !self.fill() {
                // drained flag flips; loop once more to collect
            }
        }
    }

    /// The exact text in `[from, to)`, growing the window as needed.
    /// The range is clamped to the end of input.
    pub fn text(&mut self, from: usize, to: usize) -> String {
        self.check_window(from);
        if to > from {
            self.fill_to(to - 1);
        }
        let end = std::cmp::min(to, self.window_end());
        if from >= end {
            return String::new();
        }
        self.window[from - self.left..end - self.left].to_string()
    }

    /// The next occurrence of `needle` at or after `offset`, growing
    /// the window as needed.
    ///
    /// This is the prefilter primitive: both the driver's scan loop
    /// and Break's terminator hunt use it to jump over text that
    /// cannot possibly start a match.
    pub fn find_from(&mut self, offset: usize, needle: &str) -> Option<usize> {
        assert!(!needle.is_empty(), "cannot search for an empty needle");
        self.check_window(offset);
        self.fill_to(offset);
        let mut from = offset;
        loop {
            let end = self.window_end();
            if from < end {
                let hay = &self.window.as_bytes()[from - self.left..];
                if let Some(i) = memmem::find(hay, needle.as_bytes()) {
                    return Some(from + i);
                }
            }
            if !self.fill() {
                return None;
            }
            // Overlap the next search by needle.len() - 1 bytes so a
            // hit straddling the old window edge is still found.
            from = std::cmp::max(
                from,
                std::cmp::max(
                    self.left,
                    end.saturating_sub(needle.len() - 1),
                ),
            );
        }
    }

    /// The total length of the input, reading the stream to its end.
    pub fn end(&mut self) -> usize {
        while self.fill() {}
        self.window_end()
    }

    /// Release window memory before `offset`.
    ///
    /// The caller must guarantee no live cursor refers to an offset
    /// below `offset`; the invariant is enforced (by panic) on the
    /// next read behind the new left edge.
    pub fn drop_left(&mut self, offset: usize) {
        if offset <= self.left {
            return;
        }
        let cut = std::cmp::min(offset, self.window_end()) - self.left;
        self.window.drain(..cut);
        self.left += cut;
        log::trace!("window dropped to [{}, {})", self.left, self.window_end());
    }
}

impl fmt::Debug for InputStateManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("InputStateManager")
            .field("left", &self.left)
            .field("window_len", &self.window.len())
            .field("drained", &self.drained)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(text: &str) -> InputStateManager {
        InputStateManager::new(Box::new(StringInputStream::new(text)))
    }

    #[test]
    fn peek_and_exhaustion() {
        let mut m = manager("abc");
        assert_eq!("ab", m.peek_chars(0, 2));
        assert_eq!("c", m.peek_chars(2, 5));
        assert!(!m.exhausted(2));
        assert!(m.exhausted(3));
    }

    #[test]
    fn drop_left_releases_memory() {
        let mut m = manager("hello world");
        assert_eq!(Some('h'), m.char_at(0));
        m.drop_left(6);
        assert_eq!(Some('w'), m.char_at(6));
        assert_eq!(6, m.left());
    }

    #[test]
    #[should_panic(expected = "behind the window")]
    fn reading_behind_window_panics() {
        let mut m = manager("hello world");
        m.char_at(10);
        m.drop_left(6);
        m.char_at(2);
    }

    #[test]
    fn find_from_crosses_chunks() {
        // Needle placed beyond the first read chunk.
        let mut text = "x".repeat(DEFAULT_READ_SIZE + 10);
        text.push_str("needle");
        let mut m = manager(&text);
        assert_eq!(
            Some(DEFAULT_READ_SIZE + 10),
            m.find_from(0, "needle"),
        );
        assert_eq!(None, m.find_from(0, "absent"));
    }

    #[test]
    fn multibyte_text() {
        let mut m = manager("aé⤞b");
        assert_eq!(Some('é'), m.char_at(1));
        assert_eq!("é⤞", m.peek_chars(1, 2));
        assert_eq!(Some(3), m.find_from(0, "⤞"));
    }
}
