//! # Weighted Index
//!
//! A per-symbol ordered index of other symbols keyed by an `f64` weight.
//!
//! Entries are keyed by [`WeightKey`], the weight plus a monotonically
//! increasing sequence number, so equal weights stay in insertion order and
//! the key order is total. Structural work is delegated to a
//! [`BalancedTree`] backend picked at construction time; callers only see the
//! backend through [`WeightedIndex::backend`].
//!
//! ```rust
//! use symgraph::{Graph, TraversalOrder};
//!
//! # fn example() -> symgraph::Result<()> {
//! let mut graph = Graph::new();
//! let owner = graph.intern("owner");
//! let (a, b) = (graph.intern("a"), graph.intern("b"));
//!
//! graph.index_insert(&owner, &a, 0.7)?;
//! graph.index_insert(&owner, &b, 0.2)?;
//!
//! let index = graph.index(&owner).unwrap();
//! let ranked: Vec<_> = index.traverse(TraversalOrder::InOrder).collect();
//! assert_eq!(ranked, vec![b.id(), a.id()]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::cmp::Ordering;
use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::model::SymbolId;
use crate::tree::{AvlTree, BalancedTree, InvariantViolation, Iter, RbTree};
use crate::{Error, Result};

pub use crate::tree::TraversalOrder;

// ============================================================================
// Keys and entries
// ============================================================================

/// Index key: weight first, insertion sequence second.
///
/// Weights compare with `f64::total_cmp`, so `-0.0` sorts before `0.0`.
/// NaN never gets in: [`WeightedIndex::insert`] rejects it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightKey {
    pub weight: f64,
    pub seq: u64,
}

impl WeightKey {
    /// Smallest possible key for `weight`.
    fn floor(weight: f64) -> Self {
        Self { weight, seq: 0 }
    }
}

impl PartialEq for WeightKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WeightKey {}

impl PartialOrd for WeightKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeightKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight.total_cmp(&other.weight).then(self.seq.cmp(&other.seq))
    }
}

/// One entry as seen by traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: WeightKey,
    pub target: SymbolId,
}

impl IndexEntry {
    pub fn weight(&self) -> f64 {
        self.key.weight
    }
}

// ============================================================================
// Backend selection
// ============================================================================

/// Balanced-tree backend of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Avl,
    RedBlack,
}

type DynTree = dyn BalancedTree<WeightKey, SymbolId>;

enum Tree {
    Avl(AvlTree<WeightKey, SymbolId>),
    RedBlack(RbTree<WeightKey, SymbolId>),
}

impl Tree {
    fn new(backend: Backend) -> Self {
        match backend {
            Backend::Avl => Tree::Avl(AvlTree::new()),
            Backend::RedBlack => Tree::RedBlack(RbTree::new()),
        }
    }

    fn backend(&self) -> Backend {
        match self {
            Tree::Avl(_) => Backend::Avl,
            Tree::RedBlack(_) => Backend::RedBlack,
        }
    }

    fn get(&self) -> &DynTree {
        match self {
            Tree::Avl(tree) => tree,
            Tree::RedBlack(tree) => tree,
        }
    }

    fn get_mut(&mut self) -> &mut DynTree {
        match self {
            Tree::Avl(tree) => tree,
            Tree::RedBlack(tree) => tree,
        }
    }
}

/// Maintenance strategies for [`WeightedIndex::rebalance`].
pub enum Rebalance {
    /// Rebuild on the same backend, compacting the node arena.
    Compact,
    /// Rebuild on another backend.
    Switch(Backend),
    /// Re-key every entry with a new weight computed from `(target, old weight)`.
    /// Entries that end up with equal weights keep their previous relative order.
    Reweigh(Box<dyn Fn(SymbolId, f64) -> f64>),
}

impl fmt::Debug for Rebalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rebalance::Compact => f.write_str("Compact"),
            Rebalance::Switch(backend) => f.debug_tuple("Switch").field(backend).finish(),
            Rebalance::Reweigh(_) => f.write_str("Reweigh(..)"),
        }
    }
}

// ============================================================================
// WeightedIndex
// ============================================================================

/// Ordered `(weight, target)` index with one entry per target.
pub struct WeightedIndex {
    tree: Tree,
    /// target → its current key, for O(1) `find` and keyed `delete`.
    keys: HashMap<SymbolId, WeightKey>,
    next_seq: u64,
}

impl WeightedIndex {
    pub fn new(backend: Backend) -> Self {
        Self { tree: Tree::new(backend), keys: HashMap::new(), next_seq: 0 }
    }

    pub fn backend(&self) -> Backend {
        self.tree.backend()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Tree height, for diagnostics.
    pub fn height(&self) -> usize {
        self.tree.get().height()
    }

    /// Insert `target` at `weight`.
    ///
    /// An already-indexed target is moved to the new weight and placed after
    /// every existing entry of equal weight. Returns its previous weight.
    pub fn insert(&mut self, target: SymbolId, weight: f64) -> Result<Option<f64>> {
        if weight.is_nan() {
            return Err(Error::InvalidWeight(weight));
        }
        let previous = self.delete(target);
        let key = WeightKey { weight, seq: self.next_seq };
        self.next_seq += 1;
        self.tree.get_mut().insert(key, target);
        self.keys.insert(target, key);
        Ok(previous)
    }

    /// Remove `target`. `None` if it was not indexed.
    pub fn delete(&mut self, target: SymbolId) -> Option<f64> {
        let key = self.keys.remove(&target)?;
        self.tree.get_mut().remove(&key);
        Some(key.weight)
    }

    pub fn contains(&self, target: SymbolId) -> bool {
        self.keys.contains_key(&target)
    }

    /// Current key of `target`.
    pub fn find(&self, target: SymbolId) -> Option<WeightKey> {
        self.keys.get(&target).copied()
    }

    pub fn weight_of(&self, target: SymbolId) -> Option<f64> {
        self.find(target).map(|key| key.weight)
    }

    /// The earliest-inserted target at exactly `weight`.
    pub fn search(&self, weight: f64) -> Option<SymbolId> {
        self.search_all(weight).next()
    }

    /// Every target at exactly `weight`, in insertion order.
    pub fn search_all(&self, weight: f64) -> impl Iterator<Item = SymbolId> + '_ {
        self.seek(weight)
            .take_while(move |entry| entry.key.weight.total_cmp(&weight) == Ordering::Equal)
            .map(|entry| entry.target)
    }

    /// Entries with `lo <= weight <= hi`, ascending.
    pub fn range(&self, lo: f64, hi: f64) -> impl Iterator<Item = IndexEntry> + '_ {
        self.seek(lo).take_while(move |entry| entry.key.weight.total_cmp(&hi) != Ordering::Greater)
    }

    /// Lowest-weighted entry.
    pub fn first(&self) -> Option<IndexEntry> {
        self.tree.get().min().map(|(key, target)| IndexEntry { key: *key, target: *target })
    }

    /// Highest-weighted entry.
    pub fn last(&self) -> Option<IndexEntry> {
        self.tree.get().max().map(|(key, target)| IndexEntry { key: *key, target: *target })
    }

    /// Targets in the given order.
    pub fn traverse(&self, order: TraversalOrder) -> Traverse<'_> {
        Traverse { inner: self.entries(order) }
    }

    /// Entries in the given order.
    pub fn entries(&self, order: TraversalOrder) -> Entries<'_> {
        Entries { inner: Iter::new(self.tree.get(), order) }
    }

    fn seek(&self, weight: f64) -> Entries<'_> {
        Entries { inner: Iter::seek(self.tree.get(), &WeightKey::floor(weight)) }
    }

    /// Rebuild the tree under `strategy`.
    ///
    /// Maintenance only: O(n log n). A reweigh that produces NaN for any
    /// entry fails before anything is changed.
    pub fn rebalance(&mut self, strategy: Rebalance) -> Result<()> {
        let mut entries: Vec<IndexEntry> = self.entries(TraversalOrder::InOrder).collect();
        let backend = match &strategy {
            Rebalance::Compact | Rebalance::Reweigh(_) => self.backend(),
            Rebalance::Switch(backend) => *backend,
        };
        if let Rebalance::Reweigh(reweigh) = &strategy {
            for entry in &mut entries {
                let weight = reweigh(entry.target, entry.key.weight);
                if weight.is_nan() {
                    return Err(Error::InvalidWeight(weight));
                }
                entry.key.weight = weight;
            }
        }

        // Renumber in the pre-rebuild order so ties resolve the way they did before.
        for (seq, entry) in entries.iter_mut().enumerate() {
            entry.key.seq = seq as u64;
        }
        self.next_seq = entries.len() as u64;

        let mut tree = Tree::new(backend);
        for entry in &entries {
            tree.get_mut().insert(entry.key, entry.target);
            self.keys.insert(entry.target, entry.key);
        }
        self.tree = tree;
        tracing::debug!(entries = entries.len(), ?backend, "weighted index rebuilt");
        Ok(())
    }

    /// Check the backend's structural invariants.
    pub fn validate(&self) -> std::result::Result<(), InvariantViolation> {
        self.tree.get().validate()
    }

    /// Panics if the backend is out of balance. A failure here is a defect in
    /// the tree code, not something callers can recover from.
    pub fn assert_balanced(&self) {
        if let Err(violation) = self.validate() {
            panic!("{:?} index invariant broken: {violation}", self.backend());
        }
    }
}

impl Default for WeightedIndex {
    fn default() -> Self {
        Self::new(Backend::default())
    }
}

impl fmt::Debug for WeightedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedIndex")
            .field("backend", &self.backend())
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Lazy entry iterator. Each call to `entries`/`traverse` starts afresh.
pub struct Entries<'a> {
    inner: Iter<'a, DynTree, WeightKey, SymbolId>,
}

impl Iterator for Entries<'_> {
    type Item = IndexEntry;

    fn next(&mut self) -> Option<IndexEntry> {
        self.inner.next().map(|(key, target)| IndexEntry { key: *key, target: *target })
    }
}

/// Lazy target iterator.
pub struct Traverse<'a> {
    inner: Entries<'a>,
}

impl Iterator for Traverse<'_> {
    type Item = SymbolId;

    fn next(&mut self) -> Option<SymbolId> {
        self.inner.next().map(|entry| entry.target)
    }
}

// ============================================================================
// Tests
// ============================================================================
