//! GenBank scanner
//!
//! Streams window keys out of the `ORIGIN` sections of a GenBank flat file.
//!
//! ## Input Shape
//! ```text
//! LOCUS       ...            (header lines, skipped)
//! ORIGIN
//!         1 gatcctccat atcaggctga ...
//!        61 ...
//! //                         (end of record; next ORIGIN starts over)
//! ```
//! The leading position number of each sequence line is dropped. `n`/`N`
//! (unknown base) breaks the window; spaces and other characters are skipped.

use std::io::BufRead;

use crate::error::Result;

use super::DnaSequence;

const ORIGIN_MARKER: &str = "ORIGIN";
const RECORD_END: &str = "//";

/// Iterator of window keys over a GenBank file
pub struct GenBankScanner<R> {
    reader: R,
    /// Sliding window
    window: DnaSequence,
    /// Sequence characters of the current line
    line: Vec<char>,
    /// Next character in `line`
    pos: usize,
    /// Inside an ORIGIN section
    in_sequence: bool,
    /// Input exhausted (or failed)
    done: bool,
}

impl<R: BufRead> GenBankScanner<R> {
    /// Scan `reader` for windows of `seq_len` bases
    pub fn new(reader: R, seq_len: usize) -> Result<Self> {
        Ok(Self {
            reader,
            window: DnaSequence::new(seq_len)?,
            line: Vec::new(),
            pos: 0,
            in_sequence: false,
            done: false,
        })
    }

    /// Read one line; `None` at end of input
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        if self.reader.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf))
    }

    /// Skip ahead to the line after the next `ORIGIN` marker
    fn seek_origin(&mut self) -> Result<bool> {
        while let Some(line) = self.read_line()? {
            if line.trim() == ORIGIN_MARKER {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Advance to the next complete window
    fn next_key(&mut self) -> Result<Option<u64>> {
        loop {
            if !self.in_sequence {
                if !self.seek_origin()? {
                    return Ok(None);
                }
                self.in_sequence = true;
                self.window.reset();
                self.line.clear();
                self.pos = 0;
            }

            if self.pos >= self.line.len() {
                let Some(line) = self.read_line()? else {
                    return Ok(None);
                };
                let line = line.trim();
                if line == RECORD_END {
                    self.in_sequence = false;
                    continue;
                }
                // Drop the position number
                let bases = line.split_once(char::is_whitespace).map_or("", |(_, rest)| rest);
                self.line = bases.chars().collect();
                self.pos = 0;
                continue;
            }

            let c = self.line[self.pos];
            self.pos += 1;
            match c {
                'n' | 'N' => self.window.reset(),
                'a' | 'A' | 'c' | 'C' | 'g' | 'G' | 't' | 'T' => {
                    self.window.push(c);
                    if self.window.is_complete() {
                        return self.window.key().map(Some);
                    }
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for GenBankScanner<R> {
    type Item = Result<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_key() {
            Ok(Some(key)) => Some(Ok(key)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
