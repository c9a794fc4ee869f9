//! Key records
//!
//! The `(key, counter)` pair stored in tree nodes.

use std::fmt;

/// Encoded size of a key record: key (8) + counter (8)
pub const KEY_RECORD_SIZE: u64 = 16;

/// A stored key with its occurrence counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRecord {
    pub key: u64,
    pub counter: u64,
}

impl KeyRecord {
    /// A record for a key seen once
    pub fn new(key: u64) -> Self {
        Self { key, counter: 1 }
    }

    /// A record with an explicit counter (used when decoding)
    pub fn with_counter(key: u64, counter: u64) -> Self {
        Self { key, counter }
    }

    /// Count one more occurrence
    pub fn increment(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }
}

impl fmt::Display for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.counter)
    }
}
