//! Error types for GeneBank
//!
//! Provides a unified error type for all operations. Every tree fault is
//! unrecoverable for the operation that raised it: nothing is retried and
//! nothing on disk is repaired.

use thiserror::Error;

/// Result type alias using GeneBankError
pub type Result<T> = std::result::Result<T, GeneBankError>;

/// Unified error type for GeneBank operations
#[derive(Debug, Error)]
pub enum GeneBankError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tree is opened read-only")]
    ReadOnly,

    // -------------------------------------------------------------------------
    // Header / File Shape Errors
    // -------------------------------------------------------------------------
    #[error("Bad tree metadata: {0}")]
    BadMetadata(String),

    #[error("Wrong file size: expected {expected} bytes, found {actual}")]
    WrongFileSize { expected: u64, actual: u64 },

    #[error("Wrong root node: {0}")]
    WrongRootNode(String),

    // -------------------------------------------------------------------------
    // Node Consistency Errors
    // -------------------------------------------------------------------------
    #[error("Wrong block id: expected {expected}, found {found}")]
    WrongBlockId { expected: u64, found: u64 },

    #[error("Wrong key order: key {key} does not fit at position {position} of node {node}")]
    WrongKeyOrder { node: u64, key: u64, position: usize },

    #[error("Insert into internal node {node} without a right child")]
    MissingInternalChild { node: u64 },

    #[error("Node {node} is full")]
    NodeFull { node: u64 },

    #[error("Node {node} is not full and cannot be split")]
    NodeNotFull { node: u64 },

    #[error("Search for key {key} stopped at internal node {node} without an exact match")]
    NonExactAtInternal { node: u64, key: u64 },

    // -------------------------------------------------------------------------
    // Sequence Encoding Errors
    // -------------------------------------------------------------------------
    #[error("Wrong sequence length: expected {expected}, got {actual}")]
    WrongSequenceLength { expected: usize, actual: usize },

    #[error("Bad sequence symbol: {0:?}")]
    BadSymbol(char),
}

impl From<bincode::Error> for GeneBankError {
    fn from(e: bincode::Error) -> Self {
        GeneBankError::Serialization(e.to_string())
    }
}
