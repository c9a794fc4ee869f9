//! Node codec
//!
//! Encoding and decoding of one node block.
//!
//! ## Block Format
//! ```text
//! ┌──────────┬──────────┬────────────────────────────┐
//! │  Id (8)  │Parent (8)│ (keycount << 8) | leaf (8) │
//! ├──────────┴──────────┴────────────────────────────┤
//! │ Children: `order` x u64 (unused slots = NIL)      │
//! ├──────────────────────────────────────────────────┤
//! │ Keys: keycount x [Key (8) | Counter (8)]         │
//! ├──────────────────────────────────────────────────┤
//! │ Padding up to node_size                          │
//! └──────────────────────────────────────────────────┘
//! ```
//! All integers little-endian.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::Result;
use crate::record::KeyRecord;
use crate::storage::{Metadata, NIL, NODE_OVERHEAD};
use crate::GeneBankError;

use super::{Node, NodeId};

/// Encodes/decodes nodes for one tree shape
#[derive(Debug, Clone, Copy)]
pub struct NodeCodec {
    order: usize,
    max_keys: usize,
    node_size: usize,
}

impl NodeCodec {
    /// Codec for the shape described by a header
    pub fn new(meta: &Metadata) -> Self {
        Self {
            order: meta.order as usize,
            max_keys: meta.max_keys as usize,
            node_size: meta.node_size as usize,
        }
    }

    /// Size of one encoded block
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Encode a node into a full block
    pub fn encode(&self, node: &Node) -> Result<BytesMut> {
        if node.keys.len() > self.max_keys || node.children.len() > self.order {
            return Err(GeneBankError::BadMetadata(format!(
                "node {} holds {} keys and {} children, shape allows {} and {}",
                node.id,
                node.keys.len(),
                node.children.len(),
                self.max_keys,
                self.order
            )));
        }

        let mut buf = BytesMut::with_capacity(self.node_size);
        buf.put_u64_le(node.id);
        buf.put_u64_le(node.parent.unwrap_or(NIL));
        buf.put_u64_le(((node.keys.len() as u64) << 8) | u64::from(node.is_leaf));

        for slot in 0..self.order {
            buf.put_u64_le(node.children.get(slot).copied().unwrap_or(NIL));
        }
        for record in &node.keys {
            buf.put_u64_le(record.key);
            buf.put_u64_le(record.counter);
        }

        buf.resize(self.node_size, 0);
        Ok(buf)
    }

    /// Decode the block stored for node `id`.
    ///
    /// The stored id must equal `id`, and the stored keycount must fit the shape.
    pub fn decode(&self, id: NodeId, block: &[u8]) -> Result<Node> {
        let needed = NODE_OVERHEAD as usize + 8 * self.order + 16 * self.max_keys;
        if block.len() < needed {
            return Err(GeneBankError::BadMetadata(format!(
                "block for node {} is {} bytes, need {}",
                id,
                block.len(),
                needed
            )));
        }

        let mut buf = block;
        let found = buf.get_u64_le();
        if found != id {
            return Err(GeneBankError::WrongBlockId { expected: id, found });
        }

        let parent = match buf.get_u64_le() {
            NIL => None,
            parent => Some(parent),
        };

        let packed = buf.get_u64_le();
        let key_count = (packed >> 8) as usize;
        let is_leaf = packed & 1 == 1;
        if key_count > self.max_keys {
            return Err(GeneBankError::BadMetadata(format!(
                "node {} claims {} keys, max is {}",
                id, key_count, self.max_keys
            )));
        }

        let mut slots = Vec::with_capacity(self.order);
        for _ in 0..self.order {
            slots.push(buf.get_u64_le());
        }
        let children = if is_leaf {
            Vec::new()
        } else {
            slots.truncate(key_count + 1);
            slots
        };

        let mut keys = Vec::with_capacity(self.max_keys);
        for _ in 0..key_count {
            let key = buf.get_u64_le();
            let counter = buf.get_u64_le();
            keys.push(KeyRecord::with_counter(key, counter));
        }

        Ok(Node {
            id,
            parent,
            keys,
            children,
            is_leaf,
        })
    }
}
