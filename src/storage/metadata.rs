//! Tree metadata
//!
//! The header record at offset 0: tree shape, node allocator and root location.
//! Computed once at creation, rewritten on shutdown, revalidated on every open.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::KEY_RECORD_SIZE;
use crate::GeneBankError;

use super::{BLOCK_SIZE, HEADER_SIZE, NIL, NODE_OVERHEAD};

/// Header fields, serialized as seven little-endian u64 values in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Minimum branching factor `t`
    pub degree: u64,
    /// Max children per node (`2t`)
    pub order: u64,
    /// Max keys per node (`order - 1`)
    pub max_keys: u64,
    /// Number of allocated nodes; also the next node id
    pub node_count: u64,
    /// Bytes reserved per node block
    pub node_size: u64,
    /// Bytes per key record
    pub key_record_size: u64,
    /// Id of the current root
    pub root_id: u64,
}

/// Fixed-width little-endian encoding; the header block is zero padded after it
fn header_codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
}

impl Metadata {
    /// Bytes a node of the given degree needs, without padding
    pub fn node_data_size(degree: u64) -> u64 {
        let order = degree * 2;
        NODE_OVERHEAD + 8 * order + KEY_RECORD_SIZE * (order - 1)
    }

    /// Largest degree whose node still fits a single storage block
    pub fn auto_degree() -> u64 {
        let degree = 2;
        if Self::node_data_size(degree) >= BLOCK_SIZE {
            return degree;
        }
        // order * (8 + 16) - 16 + overhead <= block
        (BLOCK_SIZE - NODE_OVERHEAD + KEY_RECORD_SIZE) / (8 + KEY_RECORD_SIZE) / 2
    }

    /// Shape for an explicit degree; nodes take exactly the bytes they need
    pub fn for_degree(degree: u64) -> Self {
        Self::with_node_size(degree, Self::node_data_size(degree))
    }

    /// Shape with the auto-derived degree; nodes padded to whole blocks
    pub fn auto() -> Self {
        let degree = Self::auto_degree();
        let data = Self::node_data_size(degree);
        let node_size = data.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        Self::with_node_size(degree, node_size)
    }

    fn with_node_size(degree: u64, node_size: u64) -> Self {
        let order = degree * 2;
        Self {
            degree,
            order,
            max_keys: order - 1,
            node_count: 1,
            node_size,
            key_record_size: KEY_RECORD_SIZE,
            root_id: 0,
        }
    }

    /// Byte offset of node `id`.
    ///
    /// Ids at or beyond the allocated node count have no block and fail with
    /// `WrongBlockId` (found = NIL).
    pub fn node_offset(&self, id: u64) -> Result<u64> {
        if id >= self.node_count {
            return Err(GeneBankError::WrongBlockId {
                expected: id,
                found: NIL,
            });
        }
        id.checked_mul(self.node_size)
            .and_then(|bytes| bytes.checked_add(HEADER_SIZE))
            .ok_or_else(|| {
                GeneBankError::BadMetadata(format!(
                    "offset of node {} overflows with node size {}",
                    id, self.node_size
                ))
            })
    }

    /// File length implied by the allocated node count
    pub fn expected_file_len(&self) -> u64 {
        self.node_count
            .saturating_mul(self.node_size)
            .saturating_add(HEADER_SIZE)
    }

    /// Allocate the next node id
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.node_count;
        self.node_count += 1;
        id
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Encode into a full header block
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut block = header_codec().serialize(self)?;
        block.resize(HEADER_SIZE as usize, 0);
        Ok(block)
    }

    /// Decode from the start of a header block (no validation)
    pub fn decode(block: &[u8]) -> Result<Self> {
        Ok(header_codec().deserialize(block)?)
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check header consistency against itself and the file it came from.
    ///
    /// The root node itself is checked by the tree after loading it.
    pub fn validate(&self, file_len: u64) -> Result<()> {
        // Bound degree before any arithmetic on it
        if self.degree < 2 || self.degree > u64::from(u32::MAX) {
            return Err(GeneBankError::BadMetadata(format!(
                "degree {} out of range",
                self.degree
            )));
        }
        if self.order != 2 * self.degree {
            return Err(GeneBankError::BadMetadata(format!(
                "order {} is not twice degree {}",
                self.order, self.degree
            )));
        }
        if self.max_keys != self.order - 1 {
            return Err(GeneBankError::BadMetadata(format!(
                "max keys {} does not match order {}",
                self.max_keys, self.order
            )));
        }

        let min_node_size = Self::node_data_size(self.degree);
        if self.node_size < min_node_size {
            return Err(GeneBankError::BadMetadata(format!(
                "node size {} below minimum {} for degree {}",
                self.node_size, min_node_size, self.degree
            )));
        }

        let expected = self
            .node_count
            .checked_mul(self.node_size)
            .and_then(|nodes| nodes.checked_add(HEADER_SIZE));
        if expected != Some(file_len) {
            return Err(GeneBankError::WrongFileSize {
                expected: expected.unwrap_or(u64::MAX),
                actual: file_len,
            });
        }

        if self.key_record_size != KEY_RECORD_SIZE {
            return Err(GeneBankError::BadMetadata(format!(
                "key record size {} (expected {})",
                self.key_record_size, KEY_RECORD_SIZE
            )));
        }

        if self.root_id >= self.node_count {
            return Err(GeneBankError::WrongRootNode(format!(
                "root id {} beyond {} allocated nodes",
                self.root_id, self.node_count
            )));
        }

        Ok(())
    }
}
