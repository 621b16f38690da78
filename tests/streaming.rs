use microgrammar::machine::{MatchCollector, MatchingMachine};
use microgrammar::matchers::{integer, Concat, Matcher};
use microgrammar::util::input::InputStream;
use microgrammar::MatchContext;

use crate::init;

/// A stream that doles its text out in deliberately tiny pieces, so
/// the window manager has to refill many times per match.
struct TricklingStream {
    text: String,
    pos: usize,
    chunk: usize,
}

impl TricklingStream {
    fn new(text: String, chunk: usize) -> TricklingStream {
        TricklingStream { text, pos: 0, chunk }
    }
}

impl InputStream for TricklingStream {
    fn exhausted(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn read(&mut self, n: usize) -> String {
        let take = std::cmp::min(n, self.chunk);
        let took: String =
            self.text[self.pos..].chars().take(take).collect();
        self.pos += took.len();
        took
    }
}

fn number_grammar() -> Matcher {
    Matcher::Concat(
        Concat::builder()
            .id("numbered")
            .step("_hash", Matcher::literal("#"))
            .step("num", integer())
            .build()
            .unwrap(),
    )
}

#[test]
fn matches_survive_chunk_boundaries() {
    init();
    // Matches placed so that several straddle the 16-character read
    // boundary of the stream.
    let mut input = String::new();
    for i in 0..200 {
        input.push_str("some filler text ");
        input.push_str(&format!("#{} ", i));
    }
    let machine = MatchingMachine::new(number_grammar());
    let mut collector = MatchCollector::new();
    let mut ctx = MatchContext::new();
    machine.consume_stream(
        Box::new(TricklingStream::new(input, 16)),
        &mut ctx,
        None,
        &mut collector,
    );
    let matches = collector.into_matches();
    assert_eq!(200, matches.len());
    for (i, m) in matches.iter().enumerate() {
        assert_eq!(format!("#{}", i), m.matched());
    }
}

#[test]
fn long_input_with_no_matches_completes() {
    init();
    let input = "nothing to see here ".repeat(5_000);
    let machine = MatchingMachine::new(number_grammar());
    let mut collector = MatchCollector::new();
    let mut ctx = MatchContext::new();
    machine.consume_stream(
        Box::new(TricklingStream::new(input, 64)),
        &mut ctx,
        None,
        &mut collector,
    );
    assert!(collector.into_matches().is_empty());
}
