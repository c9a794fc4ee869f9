//! Cache Module
//!
//! Bounded pool of resident nodes with approximate-LRU eviction and a
//! key → (node, position) shortcut.
//!
//! ## Eviction
//! Every touch stamps the node with a fresh tick and appends `(id, tick)` to
//! the eviction queue. When the pool is over capacity the oldest queue entry
//! is popped: if its tick still equals the node's current tick the node has
//! not been touched since and is evicted; otherwise the entry is stale and is
//! dropped, leaving the node's newer entry queued. A node touched more
//! recently than the oldest queued entry is therefore never evicted.
//!
//! The cache never performs I/O. Evicted nodes that need writing back are
//! returned to the caller.

use std::collections::{HashMap, VecDeque};

use crate::error::Result;
use crate::node::{Node, NodeId};

/// Queue length (as a multiple of capacity) that triggers dropping stale entries
const QUEUE_COMPACT_FACTOR: usize = 4;

/// A resident node and its bookkeeping
#[derive(Debug)]
struct Resident {
    node: Node,
    /// Tick of the most recent touch
    touched: u64,
    /// Modified since it was last written to storage
    dirty: bool,
}

/// Where a key currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySlot {
    pub node: NodeId,
    pub position: usize,
}

/// Counters for cache behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub key_hits: u64,
    pub evictions: u64,
    pub stale_entries: u64,
}

/// Resident node pool
#[derive(Debug)]
pub struct NodeCache {
    /// Max resident nodes
    capacity: usize,
    /// Resident nodes by id
    nodes: HashMap<NodeId, Resident>,
    /// Key shortcut index
    keys: HashMap<u64, KeySlot>,
    /// Eviction queue of `(id, tick at enqueue)`, oldest first
    queue: VecDeque<(NodeId, u64)>,
    /// Monotonic touch clock
    clock: u64,
    stats: CacheStats,
}

impl NodeCache {
    /// Create a cache holding at most `capacity` nodes
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            nodes: HashMap::with_capacity(capacity + 1),
            keys: HashMap::new(),
            queue: VecDeque::with_capacity(capacity * 2),
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    /// Insert or refresh a node.
    ///
    /// `dirty` marks the node as needing a write before it may be dropped.
    /// Returns the dirty nodes evicted to get back under capacity.
    pub fn touch(&mut self, node: Node, dirty: bool) -> Vec<Node> {
        let tick = self.tick();
        let id = node.id;

        let was_dirty = match self.nodes.remove(&id) {
            Some(previous) => {
                self.unindex_keys(&previous.node);
                previous.dirty
            }
            None => false,
        };

        for (position, record) in node.keys.iter().enumerate() {
            self.keys.insert(record.key, KeySlot { node: id, position });
        }
        self.nodes.insert(
            id,
            Resident {
                node,
                touched: tick,
                dirty: dirty || was_dirty,
            },
        );
        self.queue.push_back((id, tick));

        let evicted = self.evict();
        self.compact_queue();
        evicted
    }

    /// Resident lookup by id; a hit refreshes recency
    pub fn get(&mut self, id: NodeId) -> Option<Node> {
        let tick = self.clock + 1;
        match self.nodes.get_mut(&id) {
            Some(resident) => {
                self.clock = tick;
                resident.touched = tick;
                self.queue.push_back((id, tick));
                self.stats.hits += 1;
                let node = resident.node.clone();
                self.compact_queue();
                Some(node)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Exact-key shortcut: the resident node holding `key` and its position
    pub fn by_key(&mut self, key: u64) -> Option<(Node, usize)> {
        let slot = *self.keys.get(&key)?;
        let resident = self.nodes.get(&slot.node)?;
        if !resident.node.is_exact(slot.position, key) {
            return None;
        }
        self.stats.key_hits += 1;
        Some((resident.node.clone(), slot.position))
    }

    /// Where `key` lives, if its node is resident
    pub fn locate(&self, key: u64) -> Option<KeySlot> {
        self.keys.get(&key).copied()
    }

    /// Whether node `id` is resident
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Write every dirty node through `write`, marking each clean on success
    pub fn flush<F>(&mut self, mut write: F) -> Result<usize>
    where
        F: FnMut(&Node) -> Result<()>,
    {
        let mut written = 0;
        for resident in self.nodes.values_mut().filter(|r| r.dirty) {
            write(&resident.node)?;
            resident.dirty = false;
            written += 1;
        }
        Ok(written)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Resident node count
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Indexed key count
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Eviction queue length, stale entries included
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Resident nodes not yet written back
    pub fn dirty_count(&self) -> usize {
        self.nodes.values().filter(|r| r.dirty).count()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Pop queue entries until back under capacity
    fn evict(&mut self) -> Vec<Node> {
        let mut write_back = Vec::new();

        while self.nodes.len() > self.capacity {
            let Some((id, tick)) = self.queue.pop_front() else {
                break;
            };

            let current = self.nodes.get(&id).map(|r| r.touched);
            if current != Some(tick) {
                self.stats.stale_entries += 1;
                continue;
            }

            if let Some(resident) = self.nodes.remove(&id) {
                self.unindex_keys(&resident.node);
                self.stats.evictions += 1;
                if resident.dirty {
                    write_back.push(resident.node);
                }
            }
        }

        write_back
    }

    /// Drop index entries that still point at this node
    fn unindex_keys(&mut self, node: &Node) {
        for record in &node.keys {
            if self.keys.get(&record.key).is_some_and(|slot| slot.node == node.id) {
                self.keys.remove(&record.key);
            }
        }
    }

    /// Discard stale queue entries once the queue outgrows the pool
    fn compact_queue(&mut self) {
        let limit = self.capacity.max(1) * QUEUE_COMPACT_FACTOR;
        if self.queue.len() <= limit {
            return;
        }
        let nodes = &self.nodes;
        let before = self.queue.len();
        self.queue
            .retain(|(id, tick)| nodes.get(id).is_some_and(|r| r.touched == *tick));
        self.stats.stale_entries += (before - self.queue.len()) as u64;
    }
}
