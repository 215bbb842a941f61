//! AVL tree backend.
//!
//! Every node caches the height of its subtree. Insert and remove recurse
//! down to the affected leaf and rebalance each ancestor on the way back up,
//! so after a remove every unbalanced ancestor is repaired, not only the
//! first one found.

use std::cmp::Ordering;

use super::{BalancedTree, InvariantViolation, NodeIdx, TreeShape, check_order};

struct AvlNode<K, V> {
    key: K,
    value: V,
    left: Option<NodeIdx>,
    right: Option<NodeIdx>,
    /// Height of the subtree rooted here; a leaf has height 1.
    height: usize,
}

/// Height-balanced binary search tree.
pub struct AvlTree<K, V> {
    nodes: Vec<Option<AvlNode<K, V>>>,
    free: Vec<NodeIdx>,
    root: Option<NodeIdx>,
    len: usize,
}

impl<K: Ord, V> AvlTree<K, V> {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), free: Vec::new(), root: None, len: 0 }
    }

    fn node(&self, idx: NodeIdx) -> &AvlNode<K, V> {
        self.nodes[idx].as_ref().expect("AVL link points at a vacant slot")
    }

    fn node_mut(&mut self, idx: NodeIdx) -> &mut AvlNode<K, V> {
        self.nodes[idx].as_mut().expect("AVL link points at a vacant slot")
    }

    fn alloc(&mut self, key: K, value: V) -> NodeIdx {
        let node = AvlNode { key, value, left: None, right: None, height: 1 };
        self.len += 1;
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, idx: NodeIdx) -> V {
        let node = self.nodes[idx].take().expect("AVL release of a vacant slot");
        self.free.push(idx);
        self.len -= 1;
        node.value
    }

    fn height_of(&self, idx: Option<NodeIdx>) -> usize {
        idx.map_or(0, |i| self.node(i).height)
    }

    fn update_height(&mut self, idx: NodeIdx) {
        let node = self.node(idx);
        let height = 1 + self.height_of(node.left).max(self.height_of(node.right));
        self.node_mut(idx).height = height;
    }

    /// `height(left) - height(right)`.
    fn balance_factor(&self, idx: NodeIdx) -> isize {
        let node = self.node(idx);
        self.height_of(node.left) as isize - self.height_of(node.right) as isize
    }

    fn rotate_right(&mut self, idx: NodeIdx) -> NodeIdx {
        let Some(pivot) = self.node(idx).left else { return idx };
        let inner = self.node(pivot).right;
        self.node_mut(idx).left = inner;
        self.node_mut(pivot).right = Some(idx);
        self.update_height(idx);
        self.update_height(pivot);
        pivot
    }

    fn rotate_left(&mut self, idx: NodeIdx) -> NodeIdx {
        let Some(pivot) = self.node(idx).right else { return idx };
        let inner = self.node(pivot).left;
        self.node_mut(idx).right = inner;
        self.node_mut(pivot).left = Some(idx);
        self.update_height(idx);
        self.update_height(pivot);
        pivot
    }

    /// Refresh the height of `idx` and rotate if it is out of balance.
    /// Returns the root of the (possibly rotated) subtree.
    fn rebalance(&mut self, idx: NodeIdx) -> NodeIdx {
        self.update_height(idx);
        let factor = self.balance_factor(idx);
        if factor > 1 {
            if let Some(left) = self.node(idx).left {
                if self.balance_factor(left) < 0 {
                    // left-right
                    let rotated = self.rotate_left(left);
                    self.node_mut(idx).left = Some(rotated);
                }
            }
            return self.rotate_right(idx);
        }
        if factor < -1 {
            if let Some(right) = self.node(idx).right {
                if self.balance_factor(right) > 0 {
                    // right-left
                    let rotated = self.rotate_right(right);
                    self.node_mut(idx).right = Some(rotated);
                }
            }
            return self.rotate_left(idx);
        }
        idx
    }

    fn insert_at(&mut self, at: Option<NodeIdx>, key: K, value: V) -> (NodeIdx, Option<V>) {
        let Some(idx) = at else {
            return (self.alloc(key, value), None);
        };
        let replaced = match key.cmp(&self.node(idx).key) {
            Ordering::Less => {
                let left = self.node(idx).left;
                let (child, replaced) = self.insert_at(left, key, value);
                self.node_mut(idx).left = Some(child);
                replaced
            }
            Ordering::Greater => {
                let right = self.node(idx).right;
                let (child, replaced) = self.insert_at(right, key, value);
                self.node_mut(idx).right = Some(child);
                replaced
            }
            Ordering::Equal => {
                let old = std::mem::replace(&mut self.node_mut(idx).value, value);
                return (idx, Some(old));
            }
        };
        (self.rebalance(idx), replaced)
    }

    /// Unlinks the node holding `key` from the subtree at `at`.
    /// Returns the new subtree root and the unlinked slot.
    fn remove_at(&mut self, at: Option<NodeIdx>, key: &K) -> (Option<NodeIdx>, Option<NodeIdx>) {
        let Some(idx) = at else { return (None, None) };
        match key.cmp(&self.node(idx).key) {
            Ordering::Less => {
                let left = self.node(idx).left;
                let (child, removed) = self.remove_at(left, key);
                if removed.is_none() {
                    return (Some(idx), None);
                }
                self.node_mut(idx).left = child;
                (Some(self.rebalance(idx)), removed)
            }
            Ordering::Greater => {
                let right = self.node(idx).right;
                let (child, removed) = self.remove_at(right, key);
                if removed.is_none() {
                    return (Some(idx), None);
                }
                self.node_mut(idx).right = child;
                (Some(self.rebalance(idx)), removed)
            }
            Ordering::Equal => {
                let (left, right) = (self.node(idx).left, self.node(idx).right);
                let replacement = match (left, right) {
                    (None, _) => right,
                    (_, None) => left,
                    (Some(_), Some(right)) => {
                        // Successor takes the removed node's place.
                        let (rest, successor) = self.detach_min(right);
                        let node = self.node_mut(successor);
                        node.left = left;
                        node.right = rest;
                        Some(self.rebalance(successor))
                    }
                };
                (replacement, Some(idx))
            }
        }
    }

    /// Unlinks the minimum of the subtree at `idx`.
    /// Returns the new subtree root and the unlinked slot.
    fn detach_min(&mut self, idx: NodeIdx) -> (Option<NodeIdx>, NodeIdx) {
        match self.node(idx).left {
            None => (self.node(idx).right, idx),
            Some(left) => {
                let (child, min) = self.detach_min(left);
                self.node_mut(idx).left = child;
                (Some(self.rebalance(idx)), min)
            }
        }
    }

    /// Returns the verified height of the subtree at `at`.
    fn check_subtree(&self, at: Option<NodeIdx>) -> Result<usize, InvariantViolation> {
        let Some(idx) = at else { return Ok(0) };
        let node = self.node(idx);
        let left = self.check_subtree(node.left)?;
        let right = self.check_subtree(node.right)?;
        if left.abs_diff(right) > 1 {
            return Err(InvariantViolation::Unbalanced { at: idx, left, right });
        }
        let actual = 1 + left.max(right);
        if node.height != actual {
            return Err(InvariantViolation::StaleHeight { at: idx, cached: node.height, actual });
        }
        Ok(actual)
    }
}

impl<K: Ord, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TreeShape<K, V> for AvlTree<K, V> {
    fn root(&self) -> Option<NodeIdx> {
        self.root
    }

    fn left(&self, node: NodeIdx) -> Option<NodeIdx> {
        self.nodes[node].as_ref().and_then(|n| n.left)
    }

    fn right(&self, node: NodeIdx) -> Option<NodeIdx> {
        self.nodes[node].as_ref().and_then(|n| n.right)
    }

    fn entry(&self, node: NodeIdx) -> (&K, &V) {
        let node = self.nodes[node].as_ref().expect("AVL entry of a vacant slot");
        (&node.key, &node.value)
    }
}

impl<K: Ord, V> BalancedTree<K, V> for AvlTree<K, V> {
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (root, replaced) = self.insert_at(self.root, key, value);
        self.root = Some(root);
        replaced
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let (root, removed) = self.remove_at(self.root, key);
        let removed = removed?;
        self.root = root;
        Some(self.release(removed))
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    fn height(&self) -> usize {
        self.height_of(self.root)
    }

    fn validate(&self) -> Result<(), InvariantViolation> {
        check_order(self, self.len)?;
        self.check_subtree(self.root).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Iter, TraversalOrder};

    fn keys(tree: &AvlTree<i64, i64>) -> Vec<i64> {
        Iter::new(tree, TraversalOrder::InOrder).map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_ascending_inserts_stay_logarithmic() {
        let mut tree = AvlTree::new();
        for k in 0..1024 {
            tree.insert(k, k * 10);
        }
        tree.validate().unwrap();
        // Perfectly balanced bound for 1024 keys is 11; AVL allows ~1.44 log2 n.
        assert!(tree.height() <= 15, "height {}", tree.height());
        assert_eq!(tree.len(), 1024);
    }

    #[test]
    fn test_left_right_and_right_left_cases() {
        let mut lr = AvlTree::new();
        for k in [30, 10, 20] {
            lr.insert(k, 0);
        }
        assert_eq!(lr.entry(lr.root().unwrap()).0, &20);
        lr.validate().unwrap();

        let mut rl = AvlTree::new();
        for k in [10, 30, 20] {
            rl.insert(k, 0);
        }
        assert_eq!(rl.entry(rl.root().unwrap()).0, &20);
        rl.validate().unwrap();
    }

    #[test]
    fn test_insert_replaces_equal_key() {
        let mut tree = AvlTree::new();
        assert_eq!(tree.insert(1, 100), None);
        assert_eq!(tree.insert(1, 200), Some(100));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(&1), Some(&200));
    }

    #[test]
    fn test_remove_rebalances_every_ancestor() {
        let mut tree = AvlTree::new();
        for k in 0..100 {
            tree.insert(k, k);
        }
        for k in (0..100).filter(|k| k % 3 != 0) {
            assert_eq!(tree.remove(&k), Some(k));
            tree.validate().unwrap();
        }
        assert_eq!(keys(&tree), (0..100).filter(|k| k % 3 == 0).collect::<Vec<_>>());
    }

    #[test]
    fn test_remove_missing_key_is_none() {
        let mut tree = AvlTree::new();
        tree.insert(5, 5);
        assert_eq!(tree.remove(&6), None);
        assert_eq!(tree.len(), 1);
        tree.validate().unwrap();
    }

    #[test]
    fn test_slots_are_reused() {
        let mut tree = AvlTree::new();
        for k in 0..8 {
            tree.insert(k, k);
        }
        for k in 0..8 {
            tree.remove(&k);
        }
        assert!(tree.is_empty());
        for k in 10..18 {
            tree.insert(k, k);
        }
        assert_eq!(tree.nodes.len(), 8);
        assert_eq!(keys(&tree), (10..18).collect::<Vec<_>>());
    }
}
