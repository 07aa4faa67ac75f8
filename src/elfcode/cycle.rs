// elfcode/cycle.rs
use std::collections::HashSet;

use super::registers::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    /// The very first value observed.
    FirstSeen(Word),
    /// A value repeated; carries the last novel value before the repeat.
    Terminal(Word),
}

/// Watches a deterministic sequence and reports its first value and the
/// last value produced before any value repeats.
#[derive(Debug, Default, Clone)]
pub struct CycleDetector {
    seen: HashSet<Word>,
    first: Option<Word>,
    last_novel: Option<Word>,
    terminal: Option<Word>,
}

impl CycleDetector {
    pub fn new() -> Self { Self::default() }

    pub fn observe(&mut self, value: Word) -> Signal {
        if let Some(last) = self.terminal {
            return Signal::Terminal(last);
        }
        if self.first.is_none() {
            self.first = Some(value);
            self.seen.insert(value);
            self.last_novel = Some(value);
            return Signal::FirstSeen(value);
        }
        if !self.seen.insert(value) {
            // first is always set here, so last_novel is too
            let last = self.last_novel.unwrap_or(value);
            self.terminal = Some(last);
            return Signal::Terminal(last);
        }
        self.last_novel = Some(value);
        Signal::Continue
    }

    #[inline] pub fn first(&self) -> Option<Word> { self.first }
    #[inline] pub fn last_novel(&self) -> Option<Word> { self.last_novel }
    #[inline] pub fn is_terminal(&self) -> bool { self.terminal.is_some() }
    /// Number of distinct values seen so far.
    #[inline] pub fn distinct(&self) -> usize { self.seen.len() }
}
