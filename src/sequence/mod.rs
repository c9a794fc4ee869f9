//! Sequence Module
//!
//! Turns DNA text into tree keys and back.
//!
//! ## Key Encoding
//! Each base takes two bits. A window of `k` bases (`1 <= k <= 31`) packs
//! into one u64 with the first base of the window in the lowest bits:
//! ```text
//!   bits:  [ .. unused .. | base k-1 | ... | base 1 | base 0 ]
//! ```
//! Pushing a base shifts the window down by two bits and places the new base
//! at the top, so a stream of bases yields one key per position.

mod dna;
mod genbank;

pub use dna::{decode, encode, DnaSequence, MAX_SEQUENCE_LEN};
pub use genbank::GenBankScanner;

/// Two-bit base codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Base {
    A = 0b00,
    C = 0b01,
    G = 0b10,
    T = 0b11,
}

impl Base {
    /// Parse a base, ignoring case
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' | 'a' => Some(Base::A),
            'C' | 'c' => Some(Base::C),
            'G' | 'g' => Some(Base::G),
            'T' | 't' => Some(Base::T),
            _ => None,
        }
    }

    /// Base for the low two bits of `bits`
    pub fn from_bits(bits: u64) -> Self {
        match bits & 0b11 {
            0b00 => Base::A,
            0b01 => Base::C,
            0b10 => Base::G,
            _ => Base::T,
        }
    }

    /// Lowercase letter, matching GenBank sequence text
    pub fn to_char(self) -> char {
        match self {
            Base::A => 'a',
            Base::C => 'c',
            Base::G => 'g',
            Base::T => 't',
        }
    }

    pub fn code(self) -> u64 {
        self as u64
    }
}
