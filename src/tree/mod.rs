//! Tree Module
//!
//! The B-tree engine that coordinates nodes, cache and storage.
//!
//! ## Responsibilities
//! - Create a new tree file or open and validate an existing one
//! - Lookup by cache shortcut or root-to-leaf descent
//! - Insert-or-increment with bottom-up splitting and root promotion
//! - Ordered traversal (dump) without recursion
//! - Flush and close

mod store;

use std::io::Write;

use crate::cache::CacheStats;
use crate::config::Config;
use crate::error::Result;
use crate::node::{Node, NodeId, NodeStore, Split};
use crate::record::KeyRecord;
use crate::storage::{BlockFile, Metadata, HEADER_SIZE, NIL};
use crate::GeneBankError;

pub use store::Pager;

/// Outcome of a lookup
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The key was found
    pub exact: bool,
    /// Node where the search stopped (a leaf unless `exact`)
    pub node: Node,
    /// Match index, or insertion index when not `exact`
    pub position: usize,
    /// The stored record when `exact`
    pub record: Option<KeyRecord>,
}

/// Shape and size of an open tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub degree: u64,
    pub order: u64,
    pub max_keys: u64,
    pub node_size: u64,
    pub node_count: u64,
    pub root_id: NodeId,
    pub resident_nodes: usize,
    pub cache: Option<CacheStats>,
}

/// Disk-resident B-tree counting occurrences of u64 keys
///
/// ## Concurrency Model
/// Single-threaded and blocking. The tree owns its file for its whole open
/// lifetime; callers sharing it across threads must serialize access.
pub struct BTree {
    /// Tree configuration
    config: Config,
    /// Node arena (file + optional cache) and live header
    store: Pager,
}

impl BTree {
    /// Create a new tree file, truncating any existing one.
    ///
    /// The file ends up holding exactly the header block and one empty root leaf.
    pub fn create(config: Config) -> Result<Self> {
        config.validate()?;

        let meta = match config.degree {
            Some(degree) => Metadata::for_degree(u64::from(degree)),
            None => Metadata::auto(),
        };

        let file = BlockFile::create(&config.path, meta.expected_file_len())?;
        let mut store = Pager::new(file, meta, config.cache_size, config.debug);

        let root = Node::new(meta.root_id, None, true);
        store.write_node(&root)?;
        store.write_header()?;

        tracing::debug!(
            path = %config.path.display(),
            degree = meta.degree,
            node_size = meta.node_size,
            cache_size = config.cache_size,
            "Tree created"
        );

        let mut config = config;
        config.read_only = false;
        Ok(Self { config, store })
    }

    /// Open an existing tree file and validate its header and root
    pub fn open(config: Config) -> Result<Self> {
        let mut file = BlockFile::open(&config.path, config.read_only)?;

        let file_len = file.len()?;
        if file_len < HEADER_SIZE {
            return Err(GeneBankError::WrongFileSize {
                expected: HEADER_SIZE,
                actual: file_len,
            });
        }

        let meta = Pager::read_header(&mut file)?;
        meta.validate(file_len)?;

        let mut store = Pager::new(file, meta, config.cache_size, config.debug);
        let root = store.load(meta.root_id)?;
        if let Some(parent) = root.parent {
            return Err(GeneBankError::WrongRootNode(format!(
                "root {} has parent {}",
                root.id, parent
            )));
        }

        tracing::debug!(
            path = %config.path.display(),
            degree = meta.degree,
            node_count = meta.node_count,
            root_id = meta.root_id,
            read_only = config.read_only,
            "Tree opened"
        );

        Ok(Self { config, store })
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Find `key`, or the leaf position where it would be inserted
    ///
    /// Search order:
    /// 1. Cache key shortcut (exact hits only)
    /// 2. Descent from the root, checking every child's parent link
    pub fn lookup(&mut self, key: u64) -> Result<SearchResult> {
        if let Some((node, position)) = self.store.by_key(key) {
            let record = node.keys.get(position).copied();
            return Ok(SearchResult {
                exact: true,
                node,
                position,
                record,
            });
        }

        let root_id = self.store.meta().root_id;
        let mut node = self.store.load(root_id)?;
        loop {
            let position = node.search_position(key);
            if node.is_exact(position, key) {
                let record = node.keys.get(position).copied();
                return Ok(SearchResult {
                    exact: true,
                    node,
                    position,
                    record,
                });
            }
            if node.is_leaf {
                return Ok(SearchResult {
                    exact: false,
                    node,
                    position,
                    record: None,
                });
            }

            let child_id = node
                .child_at(position)
                .ok_or(GeneBankError::NonExactAtInternal { node: node.id, key })?;
            let child = self.store.load(child_id)?;
            if child.parent != Some(node.id) {
                return Err(GeneBankError::WrongBlockId {
                    expected: node.id,
                    found: child.parent.unwrap_or(NIL),
                });
            }
            node = child;
        }
    }

    /// Counter stored for `key`, if present
    pub fn count(&mut self, key: u64) -> Result<Option<u64>> {
        let found = self.lookup(key)?;
        Ok(found.record.filter(|_| found.exact).map(|r| r.counter))
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Count one occurrence of `key`, inserting it with counter 1 if new.
    ///
    /// Returns the key's counter after the update.
    pub fn insert_or_increment(&mut self, key: u64) -> Result<u64> {
        if self.store.is_read_only() {
            return Err(GeneBankError::ReadOnly);
        }

        let found = self.lookup(key)?;
        if found.exact {
            let mut node = found.node;
            let counter = node.keys[found.position].increment();
            self.store.save(&node)?;
            if self.config.debug {
                tracing::trace!(key, counter, "Incremented key");
            }
            return Ok(counter);
        }

        let node_count = self.store.meta().node_count;
        self.insert_at(found.node, found.position, KeyRecord::new(key))?;
        if self.config.debug {
            tracing::trace!(key, "Inserted key");
        }

        // Without a cache nothing is deferred, so keep the header current too
        if !self.store.cache_enabled() && self.store.meta().node_count != node_count {
            self.store.write_header()?;
        }

        Ok(1)
    }

    /// Bottom-up insertion starting at a leaf position
    fn insert_at(&mut self, leaf: Node, position: usize, record: KeyRecord) -> Result<()> {
        let max_keys = self.store.max_keys();
        let mut current = leaf;
        let mut position = position;
        let mut record = record;
        let mut right_child: Option<Node> = None;

        while current.is_full(max_keys) {
            let Split { median, right } =
                current.split(&mut self.store, record, position, right_child.take())?;
            tracing::debug!(
                node = current.id,
                right = right.id,
                median = median.key,
                "Split node"
            );

            let Some(parent_id) = current.parent else {
                return self.grow_root(current, median, right);
            };

            let parent = self.store.load(parent_id)?;
            if parent.id != parent_id {
                return Err(GeneBankError::WrongBlockId {
                    expected: parent_id,
                    found: parent.id,
                });
            }

            position = parent.search_position(median.key);
            record = median;
            right_child = Some(right);
            current = parent;
        }

        current.insert_in_place(&mut self.store, record, position, right_child)
    }

    /// Fabricate a new root above a split old root
    fn grow_root(&mut self, mut left: Node, median: KeyRecord, mut right: Node) -> Result<()> {
        let mut root = Node::new(self.store.allocate_id(), None, false);
        root.keys.push(median);
        root.children = vec![left.id, right.id];

        left.parent = Some(root.id);
        right.parent = Some(root.id);

        self.store.save(&root)?;
        self.store.save(&left)?;
        self.store.save(&right)?;
        self.store.set_root(root.id);

        tracing::debug!(root = root.id, median = median.key, "Promoted new root");
        Ok(())
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Visit every record in key order.
    ///
    /// Iterative: a stack of `(key, right child)` pairs replaces recursion, so
    /// depth is bounded only by memory.
    pub fn for_each_in_order<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(&KeyRecord),
    {
        let mut pending: Vec<(KeyRecord, NodeId)> = Vec::new();
        let root_id = self.store.meta().root_id;
        let mut node = self.store.load(root_id)?;

        loop {
            if node.is_leaf {
                node.keys.iter().for_each(&mut visit);

                let Some((record, right)) = pending.pop() else {
                    break;
                };
                visit(&record);
                node = self.store.load(right)?;
            } else {
                for (i, record) in node.keys.iter().enumerate().rev() {
                    pending.push((*record, Self::child(&node, i + 1)?));
                }
                node = self.store.load(Self::child(&node, 0)?)?;
            }
        }

        Ok(())
    }

    /// Ordered `(counter, label)` pairs for every stored key
    pub fn dump<F>(&mut self, mut label: F) -> Result<Vec<(u64, String)>>
    where
        F: FnMut(u64) -> String,
    {
        let mut out = Vec::new();
        self.for_each_in_order(|record| out.push((record.counter, label(record.key))))?;
        Ok(out)
    }

    /// Write `"<counter> <label>"` lines in key order; returns the line count
    pub fn dump_to<W, F>(&mut self, writer: &mut W, label: F) -> Result<usize>
    where
        W: Write,
        F: FnMut(u64) -> String,
    {
        let lines = self.dump(label)?;
        for (counter, text) in &lines {
            writeln!(writer, "{} {}", counter, text)?;
        }
        writer.flush()?;
        Ok(lines.len())
    }

    /// Walk the whole tree checking key order, parent links, occupancy and
    /// leaf depth. Returns the height (1 for a lone root leaf).
    pub fn check_invariants(&mut self) -> Result<usize> {
        struct Pending {
            id: NodeId,
            parent: Option<NodeId>,
            depth: usize,
            lower: Option<u64>,
            upper: Option<u64>,
        }

        let max_keys = self.store.max_keys();
        let min_keys = self.store.meta().degree as usize - 1;
        let mut leaf_depth: Option<usize> = None;
        let mut stack = vec![Pending {
            id: self.store.meta().root_id,
            parent: None,
            depth: 1,
            lower: None,
            upper: None,
        }];

        while let Some(next) = stack.pop() {
            let node = self.store.load(next.id)?;
            if node.parent != next.parent {
                return Err(GeneBankError::WrongBlockId {
                    expected: next.parent.unwrap_or(NIL),
                    found: node.parent.unwrap_or(NIL),
                });
            }

            let count = node.key_count();
            if count > max_keys || (next.parent.is_some() && count < min_keys) {
                return Err(GeneBankError::BadMetadata(format!(
                    "node {} holds {} keys, allowed {}..={}",
                    node.id, count, min_keys, max_keys
                )));
            }

            let mut previous = next.lower;
            for (position, record) in node.keys.iter().enumerate() {
                let above_lower = previous.map_or(true, |p| record.key > p);
                let below_upper = next.upper.map_or(true, |u| record.key < u);
                if !above_lower || !below_upper {
                    return Err(GeneBankError::WrongKeyOrder {
                        node: node.id,
                        key: record.key,
                        position,
                    });
                }
                previous = Some(record.key);
            }

            if node.is_leaf {
                match leaf_depth {
                    None => leaf_depth = Some(next.depth),
                    Some(depth) if depth != next.depth => {
                        return Err(GeneBankError::BadMetadata(format!(
                            "leaf {} at depth {}, other leaves at {}",
                            node.id, next.depth, depth
                        )));
                    }
                    Some(_) => {}
                }
                continue;
            }

            if node.children.len() != count + 1 {
                return Err(GeneBankError::MissingInternalChild { node: node.id });
            }
            for (i, &child) in node.children.iter().enumerate() {
                stack.push(Pending {
                    id: child,
                    parent: Some(node.id),
                    depth: next.depth + 1,
                    lower: if i == 0 { next.lower } else { Some(node.keys[i - 1].key) },
                    upper: node.keys.get(i).map(|r| r.key).or(next.upper),
                });
            }
        }

        Ok(leaf_depth.unwrap_or(1))
    }

    /// Number of levels, measured along the leftmost spine
    pub fn height(&mut self) -> Result<usize> {
        let root_id = self.store.meta().root_id;
        let mut node = self.store.load(root_id)?;
        let mut height = 1;
        while !node.is_leaf {
            node = self.store.load(Self::child(&node, 0)?)?;
            height += 1;
        }
        Ok(height)
    }

    fn child(node: &Node, position: usize) -> Result<NodeId> {
        node.child_at(position)
            .ok_or(GeneBankError::MissingInternalChild { node: node.id })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flush cached nodes, rewrite the header and close the file
    pub fn shutdown(mut self) -> Result<()> {
        if !self.store.is_read_only() {
            self.store.flush()?;
            self.store.write_header()?;
            self.store.sync()?;
        }

        tracing::debug!(
            path = %self.config.path.display(),
            node_count = self.store.meta().node_count,
            "Tree shut down"
        );
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current header values
    pub fn metadata(&self) -> &Metadata {
        self.store.meta()
    }

    /// Shape, size and cache counters
    pub fn stats(&self) -> TreeStats {
        let meta = self.store.meta();
        TreeStats {
            degree: meta.degree,
            order: meta.order,
            max_keys: meta.max_keys,
            node_size: meta.node_size,
            node_count: meta.node_count,
            root_id: meta.root_id,
            resident_nodes: self.store.resident_count(),
            cache: self.store.cache_stats(),
        }
    }

    /// Id of the current root
    pub fn root_id(&self) -> NodeId {
        self.store.meta().root_id
    }

    /// Load a node by id through the cache (for inspection and tests)
    pub fn node(&mut self, id: NodeId) -> Result<Node> {
        self.store.load(id)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
