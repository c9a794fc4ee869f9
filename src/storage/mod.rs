//! Storage Module
//!
//! Fixed-offset block storage over a single file.
//!
//! ## Responsibilities
//! - Raw block reads/writes at fixed offsets
//! - Header (tree metadata) encoding and validation
//! - Tree shape arithmetic (node size, node offsets)
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header Block (4096 bytes)              │
//! │ ┌────────┬───────┬─────────┬────────┐  │
//! │ │Degree 8│Order 8│MaxKeys 8│Count 8 │  │
//! │ ├────────┼───────┼─────────┼────────┤  │
//! │ │NodeSz 8│RecSz 8│ Root 8  │ pad... │  │
//! │ └────────┴───────┴─────────┴────────┘  │
//! ├────────────────────────────────────────┤
//! │ Node 0 (node_size bytes)               │
//! ├────────────────────────────────────────┤
//! │ Node 1                                 │
//! │ ...                                    │
//! └────────────────────────────────────────┘
//! ```
//! Node `i` lives at byte offset `4096 + i * node_size`.

mod file;
pub mod metadata;

pub use file::BlockFile;
pub use metadata::Metadata;

// =============================================================================
// Shared Constants (used by metadata, node codec, tree)
// =============================================================================

/// Default storage block size
pub const BLOCK_SIZE: u64 = 4096;

/// Bytes reserved for the header at offset 0
pub const HEADER_SIZE: u64 = 4096;

/// Fixed node prefix: id (8) + parent id (8) + packed keycount/leaf (8)
pub const NODE_OVERHEAD: u64 = 24;

/// On-disk sentinel for "no node" (`-1` as a signed 64-bit integer)
pub const NIL: u64 = u64::MAX;
