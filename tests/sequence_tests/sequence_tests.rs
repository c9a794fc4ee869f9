//! Tests for the sequence module
//!
//! These tests verify:
//! - Two-bit base codes and window packing
//! - Query encoding and dump-label decoding
//! - GenBank scanning across lines, unknown bases and record boundaries

use std::io::Cursor;

use genebank::sequence::{decode, encode, Base, DnaSequence, GenBankScanner, MAX_SEQUENCE_LEN};
use genebank::GeneBankError;

// =============================================================================
// Helper Functions
// =============================================================================

fn scan(text: &str, seq_len: usize) -> Vec<u64> {
    GenBankScanner::new(Cursor::new(text), seq_len)
        .unwrap()
        .collect::<genebank::Result<Vec<_>>>()
        .unwrap()
}

fn keys(windows: &[&str]) -> Vec<u64> {
    windows.iter().map(|w| encode(w).unwrap()).collect()
}

const TWO_RECORDS: &str = "\
LOCUS       SAMPLE1                 9 bp    DNA     linear
DEFINITION  first sample.
ORIGIN
        1 acgtn acg
//
LOCUS       SAMPLE2                 2 bp    DNA     linear
ORIGIN
        1 tt
//
";

// =============================================================================
// Base Tests
// =============================================================================

#[test]
fn test_base_codes() {
    assert_eq!(Base::A.code(), 0b00);
    assert_eq!(Base::C.code(), 0b01);
    assert_eq!(Base::G.code(), 0b10);
    assert_eq!(Base::T.code(), 0b11);
}

#[test]
fn test_base_parse_ignores_case() {
    assert_eq!(Base::from_char('g'), Some(Base::G));
    assert_eq!(Base::from_char('G'), Some(Base::G));
    assert_eq!(Base::from_char('n'), None);
    assert_eq!(Base::from_bits(0b111), Base::T);
    assert_eq!(Base::C.to_char(), 'c');
}

// =============================================================================
// Encode / Decode Tests
// =============================================================================

#[test]
fn test_encode_first_base_lowest_bits() {
    assert_eq!(encode("ca").unwrap(), 0b00_01);
    assert_eq!(encode("acgt").unwrap(), 0b11_10_01_00);
    assert_eq!(encode("ACGT").unwrap(), encode("acgt").unwrap());
}

#[test]
fn test_decode_renders_lowercase() {
    assert_eq!(decode(2, 1), "ca");
    assert_eq!(decode(4, 0b11_10_01_00), "acgt");
    assert_eq!(decode(3, 0), "aaa");
}

#[test]
fn test_decode_longest_window() {
    let text = "gattacagattacagattacagattacagat";
    assert_eq!(text.len(), MAX_SEQUENCE_LEN);

    let key = encode(text).unwrap();

    assert_eq!(decode(MAX_SEQUENCE_LEN, key), text);
}

#[test]
fn test_encode_rejects_bad_symbol() {
    assert!(matches!(encode("acxt"), Err(GeneBankError::BadSymbol('x'))));
    assert!(matches!(encode("acnt"), Err(GeneBankError::BadSymbol('n'))));
}

#[test]
fn test_encode_rejects_bad_length() {
    assert!(matches!(encode(""), Err(GeneBankError::Config(_))));
    let long = "a".repeat(MAX_SEQUENCE_LEN + 1);
    assert!(matches!(encode(&long), Err(GeneBankError::Config(_))));
}

// =============================================================================
// Window Tests
// =============================================================================

#[test]
fn test_window_length_bounds() {
    assert!(matches!(DnaSequence::new(0), Err(GeneBankError::Config(_))));
    assert!(matches!(DnaSequence::new(32), Err(GeneBankError::Config(_))));
    assert_eq!(DnaSequence::new(31).unwrap().len(), 31);
}

#[test]
fn test_window_incomplete_key() {
    let mut window = DnaSequence::new(3).unwrap();
    assert!(window.is_empty());
    window.push('a');
    window.push('c');

    assert!(!window.is_complete());
    assert!(matches!(
        window.key(),
        Err(GeneBankError::WrongSequenceLength { expected: 3, actual: 2 })
    ));
}

#[test]
fn test_window_slides() {
    let mut window = DnaSequence::new(3).unwrap();
    let mut out = Vec::new();
    for c in "acgta".chars() {
        window.push(c);
        if window.is_complete() {
            out.push(window.key().unwrap());
        }
    }

    assert_eq!(out, keys(&["acg", "cgt", "gta"]));
}

#[test]
fn test_window_resets_on_unknown() {
    let mut window = DnaSequence::new(2).unwrap();
    window.push('a');
    window.push('c');
    assert!(window.is_complete());

    assert!(!window.push('n'));
    assert!(window.is_empty());
    window.push('g');
    assert!(!window.is_complete());
}

// =============================================================================
// GenBank Scanner Tests
// =============================================================================

#[test]
fn test_scanner_two_records() {
    let found = scan(TWO_RECORDS, 3);

    // The second record is shorter than the window
    assert_eq!(found, keys(&["acg", "cgt", "acg"]));
}

#[test]
fn test_scanner_spans_lines() {
    let text = "ORIGIN\n        1 ac\n        3 gt\n//\n";

    assert_eq!(scan(text, 4), keys(&["acgt"]));
}

#[test]
fn test_scanner_resets_between_records() {
    let text = "ORIGIN\n        1 ac\n//\nORIGIN\n        1 gt\n//\n";

    assert!(scan(text, 4).is_empty());
    assert_eq!(scan(text, 2), keys(&["ac", "gt"]));
}

#[test]
fn test_scanner_ignores_text_outside_origin() {
    let text = "\
LOCUS       acgtacgt
FEATURES    gattaca
ORIGIN
        1 GATtaca
//
trailing acgt
";

    assert_eq!(scan(text, 7), keys(&["gattaca"]));
}

#[test]
fn test_scanner_without_origin() {
    assert!(scan("LOCUS only a header\n", 2).is_empty());
    assert!(scan("", 2).is_empty());
}

#[test]
fn test_scanner_rejects_bad_length() {
    let result = GenBankScanner::new(Cursor::new(""), 0);
    assert!(matches!(result, Err(GeneBankError::Config(_))));
}
