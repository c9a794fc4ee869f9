//! # GeneBank
//!
//! A disk-resident B-tree that counts fixed-length DNA subsequences:
//! - Fixed-size binary node blocks at fixed file offsets
//! - Header validation on every open
//! - Bottom-up node splitting with root promotion
//! - Bounded node cache with approximate-LRU eviction and a key shortcut
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Front ends (create / search)                │
//! │      GenBank scanner ─► DNA encoder ─► u64 keys             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        BTree engine                         │
//! │        (lookup, insert-or-increment, dump, shutdown)        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ load / save by node id
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  NodeCache  │ evict ─► │  BlockFile  │
//!   │ (approx LRU)│          │ header+nodes│
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod storage;
pub mod node;
pub mod cache;
pub mod tree;
pub mod sequence;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{GeneBankError, Result};
pub use config::Config;
pub use record::KeyRecord;
pub use tree::{BTree, SearchResult, TreeStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of GeneBank
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
