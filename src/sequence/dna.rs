//! DNA window encoder
//!
//! Sliding window of bases packed into a u64 key.

use crate::error::Result;
use crate::GeneBankError;

use super::Base;

/// Longest window that fits a u64 with two bits per base
pub const MAX_SEQUENCE_LEN: usize = 31;

/// Sliding window over a stream of bases
#[derive(Debug, Clone)]
pub struct DnaSequence {
    /// Packed window
    acc: u64,
    /// Bit offset of the newest base (`2 * (len - 1)`)
    top: u32,
    /// Window length in bases
    len: usize,
    /// Bases still needed before the window is complete
    needed: usize,
}

impl DnaSequence {
    /// Create an empty window of `len` bases
    pub fn new(len: usize) -> Result<Self> {
        if !(1..=MAX_SEQUENCE_LEN).contains(&len) {
            return Err(GeneBankError::Config(format!(
                "sequence length must be 1..={}, got {}",
                MAX_SEQUENCE_LEN, len
            )));
        }
        Ok(Self {
            acc: 0,
            top: ((len - 1) * 2) as u32,
            len,
            needed: len,
        })
    }

    /// Clear the window
    pub fn reset(&mut self) {
        self.acc = 0;
        self.needed = self.len;
    }

    /// Push one base. Anything that is not a base resets the window.
    ///
    /// Returns whether the character was accepted.
    pub fn push(&mut self, c: char) -> bool {
        match Base::from_char(c) {
            Some(base) => {
                self.acc = (self.acc >> 2) | (base.code() << self.top);
                self.needed = self.needed.saturating_sub(1);
                true
            }
            None => {
                self.reset();
                false
            }
        }
    }

    /// Whether the window holds `len` bases
    pub fn is_complete(&self) -> bool {
        self.needed == 0
    }

    /// Key for the current window
    pub fn key(&self) -> Result<u64> {
        if !self.is_complete() {
            return Err(GeneBankError::WrongSequenceLength {
                expected: self.len,
                actual: self.len - self.needed,
            });
        }
        Ok(self.acc)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no base has been pushed since the last reset
    pub fn is_empty(&self) -> bool {
        self.needed == self.len
    }
}

/// Encode a whole query string whose length is the window length
pub fn encode(text: &str) -> Result<u64> {
    let len = text.chars().count();
    let mut window = DnaSequence::new(len)?;
    for c in text.chars() {
        if !window.push(c) {
            return Err(GeneBankError::BadSymbol(c));
        }
    }
    window.key()
}

/// Render a key back into `len` lowercase bases (the dump label)
pub fn decode(len: usize, key: u64) -> String {
    (0..len)
        .map(|i| Base::from_bits(key.checked_shr(2 * i as u32).unwrap_or(0)).to_char())
        .collect()
}
