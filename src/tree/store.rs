//! Node store
//!
//! Routes every node materialization and persistence through the cache (when
//! enabled) or straight to the block file.

use crate::cache::{CacheStats, NodeCache};
use crate::error::Result;
use crate::node::{Node, NodeCodec, NodeId, NodeStore};
use crate::storage::{BlockFile, Metadata, HEADER_SIZE};
use crate::GeneBankError;

/// File-backed node arena with optional resident cache
pub struct Pager {
    /// Backing file
    file: BlockFile,
    /// Live header (node allocator, root id)
    meta: Metadata,
    /// Block codec for this tree's shape
    codec: NodeCodec,
    /// `None` when caching is disabled
    cache: Option<NodeCache>,
    read_only: bool,
    debug: bool,
}

impl Pager {
    pub fn new(file: BlockFile, meta: Metadata, cache_size: usize, debug: bool) -> Self {
        let read_only = file.is_read_only();
        Self {
            codec: NodeCodec::new(&meta),
            cache: (cache_size > 0).then(|| NodeCache::new(cache_size)),
            file,
            meta,
            read_only,
            debug,
        }
    }

    // =========================================================================
    // Header
    // =========================================================================

    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    /// Point the header at a new root
    pub fn set_root(&mut self, id: NodeId) {
        self.meta.root_id = id;
    }

    /// Rewrite the header block
    pub fn write_header(&mut self) -> Result<()> {
        let block = self.meta.encode()?;
        self.file.write_at(0, &block)?;
        tracing::debug!(
            node_count = self.meta.node_count,
            root_id = self.meta.root_id,
            "Header written"
        );
        Ok(())
    }

    /// Read and decode the header block of an open file
    pub fn read_header(file: &mut BlockFile) -> Result<Metadata> {
        let mut block = vec![0u8; HEADER_SIZE as usize];
        file.read_at(0, &mut block)?;
        Metadata::decode(&block)
    }

    // =========================================================================
    // Storage Access (bypasses the cache)
    // =========================================================================

    /// Decode node `id` from its block
    pub fn read_node(&mut self, id: NodeId) -> Result<Node> {
        let offset = self.meta.node_offset(id)?;
        let mut block = vec![0u8; self.codec.node_size()];
        self.file.read_at(offset, &mut block)?;
        self.codec.decode(id, &block)
    }

    /// Encode node into its block
    pub fn write_node(&mut self, node: &Node) -> Result<()> {
        let offset = self.meta.node_offset(node.id)?;
        let block = self.codec.encode(node)?;
        self.file.write_at(offset, &block)
    }

    // =========================================================================
    // Cache Access
    // =========================================================================

    /// Exact-key shortcut; always a miss when caching is disabled
    pub fn by_key(&mut self, key: u64) -> Option<(Node, usize)> {
        self.cache.as_mut()?.by_key(key)
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(NodeCache::stats)
    }

    pub fn resident_count(&self) -> usize {
        self.cache.as_ref().map_or(0, NodeCache::len)
    }

    /// Hand a node to the cache and write back whatever it evicts
    fn cache_node(&mut self, node: Node, dirty: bool) -> Result<()> {
        let Some(cache) = self.cache.as_mut() else {
            return Ok(());
        };
        let evicted = cache.touch(node, dirty);

        if self.debug && !evicted.is_empty() {
            tracing::trace!(
                nodes = cache.len(),
                keys = cache.key_count(),
                queue = cache.queue_len(),
                write_back = evicted.len(),
                "Cache eviction"
            );
        }

        if !self.read_only {
            for node in &evicted {
                self.write_node(node)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Write every dirty resident node to storage
    pub fn flush(&mut self) -> Result<()> {
        let Some(cache) = self.cache.as_mut() else {
            return Ok(());
        };
        let file = &mut self.file;
        let codec = &self.codec;
        let meta = &self.meta;
        let written = cache.flush(|node| {
            let offset = meta.node_offset(node.id)?;
            let block = codec.encode(node)?;
            file.write_at(offset, &block)
        })?;
        tracing::debug!(written, "Cache flushed");
        Ok(())
    }

    /// Force written data to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

impl NodeStore for Pager {
    fn max_keys(&self) -> usize {
        self.meta.max_keys as usize
    }

    fn load(&mut self, id: NodeId) -> Result<Node> {
        if let Some(node) = self.cache.as_mut().and_then(|cache| cache.get(id)) {
            return Ok(node);
        }
        let node = self.read_node(id)?;
        if self.cache.is_some() {
            self.cache_node(node.clone(), false)?;
        }
        Ok(node)
    }

    fn save(&mut self, node: &Node) -> Result<()> {
        if self.read_only {
            return Err(GeneBankError::ReadOnly);
        }
        if self.cache.is_some() {
            self.cache_node(node.clone(), true)
        } else {
            self.write_node(node)
        }
    }

    fn allocate_id(&mut self) -> NodeId {
        self.meta.allocate_id()
    }
}
