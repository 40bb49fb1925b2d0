//! Sequence key generation
//!
//! [`SequenceGen`] enumerates every word over an alphabet in order of length,
//! then lexicographically: for `[0, 1, 2]` it yields `0, 1, 2, 10, 11, 12, 20,
//! 21, 22, 100, ...`. The leading symbol of a multi-symbol word is never the
//! first alphabet item, so every word is distinct.
//!
//! [`AlphanumericSequence`] specializes it to short string keys, used by
//! rectifying queues to tag keyless submissions.

use thiserror::Error;

/// Errors raised when building a sequence generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// The alphabet holds no items.
    #[error("Expected at least 1 item in sequence alphabet")]
    EmptyAlphabet,
}

/// Generator of successive words over a fixed alphabet.
#[derive(Debug, Clone)]
pub struct SequenceGen<T> {
    items: Vec<T>,
    /// Little-endian digits of the next word.
    digits: Vec<usize>,
}

impl<T: Clone> SequenceGen<T> {
    /// Creates a generator over `items`.
    pub fn new(items: Vec<T>) -> Result<Self, SequenceError> {
        if items.is_empty() {
            return Err(SequenceError::EmptyAlphabet);
        }
        Ok(Self { items, digits: vec![0] })
    }

    /// Returns the next word, most significant symbol first.
    pub fn next_word(&mut self) -> Vec<T> {
        let word = self.digits.iter().rev().map(|&digit| self.items[digit].clone()).collect();
        self.advance();
        word
    }

    /// Returns the next `count` words.
    pub fn take_words(&mut self, count: usize) -> Vec<Vec<T>> {
        (0..count).map(|_| self.next_word()).collect()
    }

    fn advance(&mut self) {
        let last = self.items.len() - 1;
        for digit in &mut self.digits {
            if *digit < last {
                *digit += 1;
                return;
            }
            *digit = 0;
        }
        // Carry out of the top digit: grow the word by one symbol.
        self.digits.push(last.min(1));
    }
}

impl<T: Clone> Iterator for SequenceGen<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_word())
    }
}

const ALPHANUMERIC: &str = "123456789ABCDEFGHIKLMNOPQRSTVXYZ";

/// Generator of compact alphanumeric keys: `1`, `2`, ..., `Z`, `21`, `22`,
/// ...
#[derive(Debug, Clone)]
pub struct AlphanumericSequence {
    inner: SequenceGen<char>,
}

impl Default for AlphanumericSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl AlphanumericSequence {
    /// Creates a generator starting at `"1"`.
    pub fn new() -> Self {
        Self { inner: SequenceGen { items: ALPHANUMERIC.chars().collect(), digits: vec![0] } }
    }

    /// Returns the next key.
    pub fn next_key(&mut self) -> String {
        self.inner.next_word().into_iter().collect()
    }
}

impl Iterator for AlphanumericSequence {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_key())
    }
}
