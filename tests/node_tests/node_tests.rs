//! Tests for Node
//!
//! These tests verify:
//! - Binary search positions (exact and insertion)
//! - In-place insert ordering checks and persistence
//! - Full-node splits for leaves and internal nodes
//! - Re-parenting of moved children

use std::collections::HashMap;

use genebank::node::{Node, NodeId, NodeStore};
use genebank::storage::NIL;
use genebank::{GeneBankError, KeyRecord, Result};

// =============================================================================
// Helper Functions
// =============================================================================

/// In-memory node store recording every save
struct MemStore {
    nodes: HashMap<NodeId, Node>,
    next_id: NodeId,
    max_keys: usize,
    saves: Vec<NodeId>,
}

impl MemStore {
    fn new(max_keys: usize, next_id: NodeId) -> Self {
        Self {
            nodes: HashMap::new(),
            next_id,
            max_keys,
            saves: Vec::new(),
        }
    }

    fn put(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    fn get(&self, id: NodeId) -> &Node {
        &self.nodes[&id]
    }
}

impl NodeStore for MemStore {
    fn max_keys(&self) -> usize {
        self.max_keys
    }

    fn load(&mut self, id: NodeId) -> Result<Node> {
        self.nodes
            .get(&id)
            .cloned()
            .ok_or(GeneBankError::WrongBlockId { expected: id, found: NIL })
    }

    fn save(&mut self, node: &Node) -> Result<()> {
        self.saves.push(node.id);
        self.nodes.insert(node.id, node.clone());
        Ok(())
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn leaf_with(id: NodeId, keys: &[u64]) -> Node {
    let mut node = Node::new(id, None, true);
    node.keys = keys.iter().map(|&k| KeyRecord::new(k)).collect();
    node
}

fn keys_of(node: &Node) -> Vec<u64> {
    node.keys.iter().map(|r| r.key).collect()
}

/// Internal node 0 with keys [10, 20, 30] over leaves 1..=4 (degree 2)
fn internal_store() -> (MemStore, Node) {
    let mut store = MemStore::new(3, 6);
    let mut parent = leaf_with(0, &[10, 20, 30]);
    parent.is_leaf = false;
    parent.children = vec![1, 2, 3, 4];

    for (id, key) in [(1, 5), (2, 15), (3, 22), (4, 35)] {
        let mut child = leaf_with(id, &[key]);
        child.parent = Some(0);
        store.put(child);
    }
    // Right half of a child split, already pointing at node 0
    let mut extra = leaf_with(5, &[27]);
    extra.parent = Some(0);
    store.put(extra);

    store.put(parent.clone());
    (store, parent)
}

// =============================================================================
// Search Tests
// =============================================================================

#[test]
fn test_search_position_empty_node() {
    let node = Node::new(0, None, true);
    assert_eq!(node.search_position(42), 0);
    assert!(!node.is_exact(0, 42));
}

#[test]
fn test_search_position_exact_match() {
    let node = leaf_with(0, &[10, 20, 30, 40, 50]);

    assert_eq!(node.search_position(10), 0);
    assert_eq!(node.search_position(30), 2);
    assert_eq!(node.search_position(50), 4);
    assert!(node.is_exact(2, 30));
}

#[test]
fn test_search_position_insertion_point() {
    let node = leaf_with(0, &[10, 20, 30, 40, 50]);

    assert_eq!(node.search_position(5), 0);
    assert_eq!(node.search_position(25), 2);
    assert_eq!(node.search_position(55), 5);
    assert!(!node.is_exact(2, 25));
    assert!(!node.is_exact(5, 55));
}

#[test]
fn test_search_position_large_node() {
    let keys: Vec<u64> = (0..169).map(|k| k * 2).collect();
    let node = leaf_with(0, &keys);

    for (i, &k) in keys.iter().enumerate() {
        assert_eq!(node.search_position(k), i);
        assert_eq!(node.search_position(k + 1), i + 1);
    }
}

// =============================================================================
// Insert In Place Tests
// =============================================================================

#[test]
fn test_insert_in_place_leaf() {
    let mut store = MemStore::new(3, 1);
    let mut node = leaf_with(0, &[10, 30]);

    node.insert_in_place(&mut store, KeyRecord::new(20), 1, None).unwrap();

    assert_eq!(keys_of(&node), vec![10, 20, 30]);
    assert_eq!(node.keys[1].counter, 1);
    assert_eq!(store.saves, vec![0]);
    assert_eq!(keys_of(store.get(0)), vec![10, 20, 30]);
}

#[test]
fn test_insert_in_place_at_ends() {
    let mut store = MemStore::new(5, 1);
    let mut node = leaf_with(0, &[10, 20]);

    node.insert_in_place(&mut store, KeyRecord::new(5), 0, None).unwrap();
    node.insert_in_place(&mut store, KeyRecord::new(25), 3, None).unwrap();

    assert_eq!(keys_of(&node), vec![5, 10, 20, 25]);
}

#[test]
fn test_insert_in_place_full_node() {
    let mut store = MemStore::new(3, 1);
    let mut node = leaf_with(0, &[10, 20, 30]);

    let result = node.insert_in_place(&mut store, KeyRecord::new(40), 3, None);

    assert!(matches!(result, Err(GeneBankError::NodeFull { node: 0 })));
    assert!(store.saves.is_empty());
}

#[test]
fn test_insert_in_place_wrong_order() {
    let mut store = MemStore::new(5, 1);
    let mut node = leaf_with(0, &[10, 20, 30]);

    // Left neighbour is larger
    let result = node.insert_in_place(&mut store, KeyRecord::new(15), 2, None);
    assert!(matches!(result, Err(GeneBankError::WrongKeyOrder { .. })));

    // Right neighbour is smaller
    let result = node.insert_in_place(&mut store, KeyRecord::new(25), 1, None);
    assert!(matches!(result, Err(GeneBankError::WrongKeyOrder { .. })));

    // Duplicate
    let result = node.insert_in_place(&mut store, KeyRecord::new(20), 1, None);
    assert!(matches!(result, Err(GeneBankError::WrongKeyOrder { .. })));

    // Past the end
    let result = node.insert_in_place(&mut store, KeyRecord::new(40), 4, None);
    assert!(matches!(result, Err(GeneBankError::WrongKeyOrder { .. })));

    assert_eq!(keys_of(&node), vec![10, 20, 30]);
}

#[test]
fn test_insert_in_place_internal_requires_child() {
    let mut store = MemStore::new(5, 3);
    let mut node = leaf_with(0, &[10]);
    node.is_leaf = false;
    node.children = vec![1, 2];

    let result = node.insert_in_place(&mut store, KeyRecord::new(20), 1, None);

    assert!(matches!(
        result,
        Err(GeneBankError::MissingInternalChild { node: 0 })
    ));
}

#[test]
fn test_insert_in_place_internal_reparents_child() {
    let mut store = MemStore::new(5, 4);
    let mut node = leaf_with(0, &[10]);
    node.is_leaf = false;
    node.children = vec![1, 2];
    let child = leaf_with(3, &[25]);

    node.insert_in_place(&mut store, KeyRecord::new(20), 1, Some(child)).unwrap();

    assert_eq!(keys_of(&node), vec![10, 20]);
    assert_eq!(node.children, vec![1, 2, 3]);
    assert_eq!(store.get(3).parent, Some(0));
    assert_eq!(store.saves, vec![3, 0]);
}

// =============================================================================
// Split Tests
// =============================================================================

#[test]
fn test_split_not_full() {
    let mut store = MemStore::new(3, 1);
    let mut node = leaf_with(0, &[10, 20]);

    let result = node.split(&mut store, KeyRecord::new(15), 1, None);

    assert!(matches!(result, Err(GeneBankError::NodeNotFull { node: 0 })));
    assert_eq!(keys_of(&node), vec![10, 20]);
}

#[test]
fn test_split_leaf_degree_two() {
    let mut store = MemStore::new(3, 1);
    let mut node = leaf_with(0, &[5, 10, 20]);

    let split = node.split(&mut store, KeyRecord::new(6), 1, None).unwrap();

    assert_eq!(split.median.key, 10);
    assert_eq!(keys_of(&node), vec![5, 6]);
    assert_eq!(keys_of(&split.right), vec![20]);
    assert_eq!(split.right.id, 1);
    assert!(split.right.is_leaf);
    assert_eq!(split.right.parent, node.parent);
    assert!(node.children.is_empty());
    assert!(split.right.children.is_empty());

    assert_eq!(keys_of(store.get(0)), vec![5, 6]);
    assert_eq!(keys_of(store.get(1)), vec![20]);
}

#[test]
fn test_split_preserves_counters() {
    let mut store = MemStore::new(3, 1);
    let mut node = leaf_with(0, &[5, 10, 20]);
    node.keys[1].counter = 7;
    node.keys[2].counter = 3;

    let split = node.split(&mut store, KeyRecord::new(30), 3, None).unwrap();

    assert_eq!(split.median, KeyRecord::with_counter(20, 3));
    assert_eq!(node.keys[1], KeyRecord::with_counter(10, 7));
    assert_eq!(split.right.keys, vec![KeyRecord::new(30)]);
}

#[test]
fn test_split_larger_degree_partition() {
    // degree 4: max_keys 7, mid = 4
    let mut store = MemStore::new(7, 1);
    let mut node = leaf_with(0, &[10, 20, 30, 40, 50, 60, 70]);

    let split = node.split(&mut store, KeyRecord::new(45), 4, None).unwrap();

    assert_eq!(keys_of(&node), vec![10, 20, 30, 40]);
    assert_eq!(split.median.key, 45);
    assert_eq!(keys_of(&split.right), vec![50, 60, 70]);
}

#[test]
fn test_split_internal_moves_and_reparents_children() {
    let (mut store, mut node) = internal_store();
    let incoming = store.get(5).clone();

    // Scratch: keys [10, 20, 25, 30], children [1, 2, 3, 5, 4]
    let split = node
        .split(&mut store, KeyRecord::new(25), 2, Some(incoming))
        .unwrap();

    assert_eq!(split.median.key, 25);
    assert_eq!(keys_of(&node), vec![10, 20]);
    assert_eq!(node.children, vec![1, 2, 3]);
    assert_eq!(keys_of(&split.right), vec![30]);
    assert_eq!(split.right.children, vec![5, 4]);
    assert!(!split.right.is_leaf);

    let right_id = split.right.id;
    assert_eq!(right_id, 6);
    for id in [1, 2, 3] {
        assert_eq!(store.get(id).parent, Some(0));
    }
    for id in [5, 4] {
        assert_eq!(store.get(id).parent, Some(right_id));
    }
}

#[test]
fn test_split_internal_incoming_child_stays_left() {
    let (mut store, mut node) = internal_store();
    let mut incoming = store.get(5).clone();
    incoming.keys = vec![KeyRecord::new(7)];

    // Scratch: keys [6, 10, 20, 30], children [1, 5, 2, 3, 4]
    let split = node
        .split(&mut store, KeyRecord::new(6), 0, Some(incoming))
        .unwrap();

    assert_eq!(keys_of(&node), vec![6, 10]);
    assert_eq!(node.children, vec![1, 5, 2]);
    assert_eq!(split.median.key, 20);
    assert_eq!(split.right.children, vec![3, 4]);
    assert_eq!(store.get(5).parent, Some(0));
    assert_eq!(store.get(3).parent, Some(split.right.id));
}

#[test]
fn test_split_internal_requires_child() {
    let (mut store, mut node) = internal_store();

    let result = node.split(&mut store, KeyRecord::new(25), 2, None);

    assert!(matches!(
        result,
        Err(GeneBankError::MissingInternalChild { node: 0 })
    ));
}
