//! Node Module
//!
//! In-memory tree nodes: key search, in-place insert, and full-node split.
//!
//! ## Ownership
//! Nodes never hold each other by reference. Parent and child links are node
//! ids, resolved through a [`NodeStore`] that loads and saves nodes by id.
//! A node value is a detached copy: mutate it, then save it back.

mod codec;

pub use codec::NodeCodec;

use crate::error::Result;
use crate::record::KeyRecord;
use crate::GeneBankError;

/// Node identifier (dense, allocated from the tree-wide counter, never reused)
pub type NodeId = u64;

/// Id-indexed access to nodes, backed by the file and optionally a cache
pub trait NodeStore {
    /// Max keys a node may hold
    fn max_keys(&self) -> usize;

    /// Materialize a node by id
    fn load(&mut self, id: NodeId) -> Result<Node>;

    /// Persist a node (immediately or deferred, depending on the store)
    fn save(&mut self, node: &Node) -> Result<()>;

    /// Hand out the next node id
    fn allocate_id(&mut self) -> NodeId;
}

/// One tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    /// `None` for the root
    pub parent: Option<NodeId>,
    /// Strictly increasing by key
    pub keys: Vec<KeyRecord>,
    /// Empty for leaves, `keys.len() + 1` entries for internal nodes
    pub children: Vec<NodeId>,
    pub is_leaf: bool,
}

/// Result of splitting a full node
#[derive(Debug, Clone)]
pub struct Split {
    /// Key to promote into the parent
    pub median: KeyRecord,
    /// Newly allocated right sibling (the split node keeps the left half)
    pub right: Node,
}

impl Node {
    /// Create an empty node
    pub fn new(id: NodeId, parent: Option<NodeId>, is_leaf: bool) -> Self {
        Self {
            id,
            parent,
            keys: Vec::new(),
            children: Vec::new(),
            is_leaf,
        }
    }

    /// Number of keys held
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Whether no further key fits without a split
    pub fn is_full(&self, max_keys: usize) -> bool {
        self.keys.len() >= max_keys
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Binary search for `key`: the index of an exact match, or of the first key greater than it
    pub fn search_position(&self, key: u64) -> usize {
        match self.keys.binary_search_by_key(&key, |record| record.key) {
            Ok(pos) | Err(pos) => pos,
        }
    }

    /// Whether `pos` holds exactly `key`
    pub fn is_exact(&self, pos: usize, key: u64) -> bool {
        self.keys.get(pos).is_some_and(|record| record.key == key)
    }

    /// Child to descend into for a non-matching search position
    pub fn child_at(&self, pos: usize) -> Option<NodeId> {
        self.children.get(pos).copied()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Insert `record` at `position` into a node that is not full.
    ///
    /// Internal nodes take `right_child` as the child to the right of the new
    /// key; it is re-parented to this node. Both nodes are saved.
    pub fn insert_in_place<S: NodeStore + ?Sized>(
        &mut self,
        store: &mut S,
        record: KeyRecord,
        position: usize,
        right_child: Option<Node>,
    ) -> Result<()> {
        if self.is_full(store.max_keys()) {
            return Err(GeneBankError::NodeFull { node: self.id });
        }
        let right_child = self.check_insert(record, position, right_child)?;

        self.keys.insert(position, record);
        if let Some(mut child) = right_child {
            self.children.insert(position + 1, child.id);
            child.parent = Some(self.id);
            store.save(&child)?;
        }

        store.save(self)
    }

    /// Split a full node around `record` inserted at `position`.
    ///
    /// The combined `max_keys + 1` keys are cut at `mid = (max_keys + 1) / 2`:
    /// keys below `mid` stay here, the key at `mid` is returned for promotion,
    /// and the rest move into a new node with the next id. Children that move
    /// are re-parented. Both halves are saved; promoting the median is the
    /// caller's job.
    pub fn split<S: NodeStore + ?Sized>(
        &mut self,
        store: &mut S,
        record: KeyRecord,
        position: usize,
        right_child: Option<Node>,
    ) -> Result<Split> {
        if !self.is_full(store.max_keys()) {
            return Err(GeneBankError::NodeNotFull { node: self.id });
        }
        let right_child = self.check_insert(record, position, right_child)?;

        let mut keys = std::mem::take(&mut self.keys);
        keys.insert(position, record);
        let mut children = std::mem::take(&mut self.children);
        if let Some(mut child) = right_child {
            children.insert(position + 1, child.id);
            // Parent link is correct if the child stays left; fixed below if it moves
            child.parent = Some(self.id);
            store.save(&child)?;
        }

        let mid = keys.len() / 2;
        let right_keys = keys.split_off(mid + 1);
        let median = keys[mid];
        keys.truncate(mid);

        let right_children = if self.is_leaf {
            Vec::new()
        } else {
            children.split_off(mid + 1)
        };

        self.keys = keys;
        self.children = children;

        let mut right = Node::new(store.allocate_id(), self.parent, self.is_leaf);
        right.keys = right_keys;
        right.children = right_children;

        for &child_id in &right.children {
            let mut child = store.load(child_id)?;
            child.parent = Some(right.id);
            store.save(&child)?;
        }

        store.save(self)?;
        store.save(&right)?;

        Ok(Split { median, right })
    }

    /// Validate ordering against both neighbours and the right-child requirement
    fn check_insert(
        &self,
        record: KeyRecord,
        position: usize,
        right_child: Option<Node>,
    ) -> Result<Option<Node>> {
        let out_of_order = GeneBankError::WrongKeyOrder {
            node: self.id,
            key: record.key,
            position,
        };
        if position > self.keys.len() {
            return Err(out_of_order);
        }
        if position > 0 && self.keys[position - 1].key >= record.key {
            return Err(out_of_order);
        }
        if position < self.keys.len() && self.keys[position].key <= record.key {
            return Err(out_of_order);
        }

        if self.is_leaf {
            return Ok(None);
        }
        match right_child {
            Some(child) => Ok(Some(child)),
            None => Err(GeneBankError::MissingInternalChild { node: self.id }),
        }
    }
}
