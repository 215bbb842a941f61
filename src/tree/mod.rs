//! # Balanced Search Trees
//!
//! Comparator-driven ordered maps used as the storage layer of
//! [`WeightedIndex`](crate::index::WeightedIndex). Neither backend knows
//! what its keys mean; they only rely on `K: Ord`.
//!
//! ## Backends
//!
//! | Backend | Module | Balance rule |
//! |---------|--------|--------------|
//! | `AvlTree` | `avl` | sibling subtree heights differ by at most 1 |
//! | `RbTree` | `rbtree` | no red-red edge, equal black-height on every path |
//!
//! Both store nodes in an arena (`Vec` + free list) and link them by slot
//! index. The read-only [`TreeShape`] view is all that lookup and the
//! traversal iterators in this module need, so searching and walking are
//! written once and shared by both backends.

pub mod avl;
pub mod rbtree;

use std::cmp::Ordering;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

pub use avl::AvlTree;
pub use rbtree::{Color, RbTree};

/// Arena slot of a tree node.
pub type NodeIdx = usize;

// ============================================================================
// Structural view
// ============================================================================

/// Read-only structural view of a binary search tree.
pub trait TreeShape<K, V> {
    fn root(&self) -> Option<NodeIdx>;
    fn left(&self, node: NodeIdx) -> Option<NodeIdx>;
    fn right(&self, node: NodeIdx) -> Option<NodeIdx>;
    /// Key and value stored at a live node.
    fn entry(&self, node: NodeIdx) -> (&K, &V);
}

// ============================================================================
// BalancedTree trait
// ============================================================================

/// The contract every backend implements.
///
/// Mutations keep the backend's own balance invariant after every call, for
/// any key sequence (including sorted and reverse-sorted inserts).
pub trait BalancedTree<K: Ord, V>: TreeShape<K, V> {
    /// Insert or replace. Returns the previous value for an equal key.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Remove by key. `None` means the key was not present.
    fn remove(&mut self, key: &K) -> Option<V>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    /// Number of nodes on the longest root-to-leaf path (0 when empty).
    fn height(&self) -> usize;

    /// Full structural check: ordering, bookkeeping and balance rule.
    fn validate(&self) -> Result<(), InvariantViolation>;

    fn get<'a>(&'a self, key: &K) -> Option<&'a V>
    where
        K: 'a,
    {
        locate(self, key).map(|node| self.entry(node).1)
    }

    fn contains_key(&self, key: &K) -> bool {
        locate(self, key).is_some()
    }

    fn min(&self) -> Option<(&K, &V)> {
        let mut node = self.root()?;
        while let Some(left) = self.left(node) {
            node = left;
        }
        Some(self.entry(node))
    }

    fn max(&self) -> Option<(&K, &V)> {
        let mut node = self.root()?;
        while let Some(right) = self.right(node) {
            node = right;
        }
        Some(self.entry(node))
    }
}

/// Exact-key BST lookup.
pub fn locate<K, V, T>(tree: &T, key: &K) -> Option<NodeIdx>
where
    K: Ord,
    T: TreeShape<K, V> + ?Sized,
{
    let mut cursor = tree.root();
    while let Some(node) = cursor {
        cursor = match key.cmp(tree.entry(node).0) {
            Ordering::Less => tree.left(node),
            Ordering::Greater => tree.right(node),
            Ordering::Equal => return Some(node),
        };
    }
    None
}

// ============================================================================
// Traversal
// ============================================================================

/// Standard binary-tree visiting orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalOrder {
    /// Left, node, right: ascending key order.
    #[default]
    InOrder,
    /// Node, left, right.
    PreOrder,
    /// Left, right, node.
    PostOrder,
}

/// Lazy traversal over any [`TreeShape`].
///
/// The frontier is an explicit stack of `(node, ready)` pairs: a node that is
/// not yet `ready` is expanded into its children plus itself (marked ready)
/// in the order the traversal needs, a ready node is yielded. Dropping the
/// iterator early costs nothing; creating a new one restarts from the root.
pub struct Iter<'t, T: ?Sized, K, V> {
    tree: &'t T,
    order: TraversalOrder,
    stack: Vec<(NodeIdx, bool)>,
    _entries: PhantomData<fn() -> (K, V)>,
}

impl<'t, T, K, V> Iter<'t, T, K, V>
where
    T: TreeShape<K, V> + ?Sized,
{
    pub fn new(tree: &'t T, order: TraversalOrder) -> Self {
        let stack = tree.root().map(|root| vec![(root, false)]).unwrap_or_default();
        Self { tree, order, stack, _entries: PhantomData }
    }

    /// In-order iteration starting at the first key `>= bound`.
    pub fn seek(tree: &'t T, bound: &K) -> Self
    where
        K: Ord,
    {
        let mut stack = Vec::new();
        let mut cursor = tree.root();
        while let Some(node) = cursor {
            if tree.entry(node).0 >= bound {
                if let Some(right) = tree.right(node) {
                    stack.push((right, false));
                }
                stack.push((node, true));
                cursor = tree.left(node);
            } else {
                cursor = tree.right(node);
            }
        }
        Self { tree, order: TraversalOrder::InOrder, stack, _entries: PhantomData }
    }

    fn push_child(&mut self, child: Option<NodeIdx>) {
        if let Some(child) = child {
            self.stack.push((child, false));
        }
    }
}

impl<'t, T, K, V> Iterator for Iter<'t, T, K, V>
where
    T: TreeShape<K, V> + ?Sized,
    K: 't,
    V: 't,
{
    type Item = (&'t K, &'t V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, ready)) = self.stack.pop() {
            if ready {
                return Some(self.tree.entry(node));
            }
            let (left, right) = (self.tree.left(node), self.tree.right(node));
            // Pushed in reverse of the visiting order.
            match self.order {
                TraversalOrder::InOrder => {
                    self.push_child(right);
                    self.stack.push((node, true));
                    self.push_child(left);
                }
                TraversalOrder::PreOrder => {
                    self.push_child(right);
                    self.push_child(left);
                    self.stack.push((node, true));
                }
                TraversalOrder::PostOrder => {
                    self.stack.push((node, true));
                    self.push_child(right);
                    self.push_child(left);
                }
            }
        }
        None
    }
}

// ============================================================================
// Invariant violations
// ============================================================================

/// A broken structural invariant.
///
/// These are faults in a backend, never caused by caller input. They are
/// only surfaced through [`BalancedTree::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("keys out of order at node {at}")]
    OutOfOrder { at: NodeIdx },

    #[error("node count {counted} does not match recorded length {recorded}")]
    LengthMismatch { counted: usize, recorded: usize },

    #[error("AVL imbalance at node {at}: left height {left}, right height {right}")]
    Unbalanced { at: NodeIdx, left: usize, right: usize },

    #[error("stale cached height at node {at}: cached {cached}, actual {actual}")]
    StaleHeight { at: NodeIdx, cached: usize, actual: usize },

    #[error("red node {at} has a red child")]
    RedRed { at: NodeIdx },

    #[error("black-height mismatch at node {at}: left {left}, right {right}")]
    BlackHeight { at: NodeIdx, left: usize, right: usize },

    #[error("root is red")]
    RedRoot,

    #[error("parent link of node {at} is inconsistent")]
    BrokenParent { at: NodeIdx },
}

/// Checks strict ascending order of an in-order walk and the node count.
pub(crate) fn check_order<K, V, T>(tree: &T, recorded: usize) -> Result<(), InvariantViolation>
where
    K: Ord,
    T: TreeShape<K, V> + ?Sized,
{
    let mut counted = 0;
    let mut stack = Vec::new();
    let mut cursor = tree.root();
    let mut previous: Option<&K> = None;
    loop {
        while let Some(node) = cursor {
            stack.push(node);
            cursor = tree.left(node);
        }
        let Some(node) = stack.pop() else { break };
        let key = tree.entry(node).0;
        if previous.is_some_and(|prev| prev >= key) {
            return Err(InvariantViolation::OutOfOrder { at: node });
        }
        previous = Some(key);
        counted += 1;
        cursor = tree.right(node);
    }
    if counted != recorded {
        return Err(InvariantViolation::LengthMismatch { counted, recorded });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
