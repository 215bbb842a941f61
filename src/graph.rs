//! # Graph
//!
//! The relationship model on top of the [`Registry`]: labelled directed
//! edges kept symmetric in both directions, per-symbol weighted indexes with
//! reverse bookkeeping, explicit removal and sweeping.
//!
//! Every mutation touches only the symbols involved and their direct
//! neighbours; nothing here rescans the whole graph except [`Graph::sweep`].

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::index::{Backend, Rebalance, WeightedIndex};
use crate::model::{Adjacency, Direction, Edge, Label, LabelFilter, Symbol, SymbolId, SymbolRef};
use crate::registry::Registry;
use crate::{Error, Result};

// ============================================================================
// Configuration
// ============================================================================

/// Graph configuration.
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Label used by [`Graph::link`].
    pub default_label: String,
    /// Backend for indexes created on first insert.
    pub default_backend: Backend,
    /// Run [`Graph::sweep`] automatically after this many interns.
    pub auto_sweep_every: Option<usize>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_label: Label::CHILD.to_string(),
            default_backend: Backend::Avl,
            auto_sweep_every: None,
        }
    }
}

impl GraphConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

// ============================================================================
// Graph
// ============================================================================

/// A universe of interned symbols and the edges between them.
///
/// Not internally synchronised; see [`SharedGraph`](crate::SharedGraph).
pub struct Graph {
    registry: Registry,
    config: GraphConfig,
    edge_count: usize,
    interns_since_sweep: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self { registry: Registry::new(), config, edge_count: 0, interns_since_sweep: 0 }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// The live symbol named `name`, created on first use.
    pub fn intern(&mut self, name: &str) -> SymbolRef {
        if let Some(every) = self.config.auto_sweep_every {
            if self.interns_since_sweep >= every {
                self.sweep();
            }
        }
        self.interns_since_sweep += 1;

        let (handle, created) = self.registry.intern(name);
        if created {
            debug!(symbol = %handle.id(), name, "symbol created");
        }
        handle
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.registry.lookup(name).and_then(|id| self.registry.get(id))
    }

    pub fn symbol(&self, id: impl Into<SymbolId>) -> Option<&Symbol> {
        self.registry.get(id.into())
    }

    pub fn contains(&self, id: impl Into<SymbolId>) -> bool {
        self.registry.contains(id.into())
    }

    /// Live symbols in creation-slot order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.registry.iter()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Names of the given symbols; ids that are no longer live are skipped.
    pub fn names_of(&self, ids: impl IntoIterator<Item = SymbolId>) -> Vec<&str> {
        ids.into_iter().filter_map(|id| self.registry.get(id)).map(Symbol::name).collect()
    }

    pub(crate) fn resolve(&self, id: SymbolId) -> Result<&Symbol> {
        self.registry.get(id).ok_or(Error::UnknownSymbol(id))
    }

    fn resolve_mut(&mut self, id: SymbolId) -> Result<&mut Symbol> {
        self.registry.get_mut(id).ok_or(Error::UnknownSymbol(id))
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Add `from -[label]-> to`. Returns `false` if the edge already existed.
    pub fn add_edge(
        &mut self,
        from: impl Into<SymbolId>,
        to: impl Into<SymbolId>,
        label: impl Into<Label>,
    ) -> Result<bool> {
        let (from, to, label) = (from.into(), to.into(), label.into());
        self.resolve(to)?;
        if !self.resolve_mut(from)?.out_edges.insert(Edge::new(label.clone(), to)) {
            return Ok(false);
        }
        self.resolve_mut(to)?.in_edges.insert(Edge::new(label.clone(), from));
        self.edge_count += 1;
        trace!(%from, %to, %label, "edge added");
        Ok(true)
    }

    /// Add an edge under the configured default label.
    pub fn link(&mut self, from: impl Into<SymbolId>, to: impl Into<SymbolId>) -> Result<bool> {
        let label = Label::new(&self.config.default_label);
        self.add_edge(from, to, label)
    }

    /// Remove `from -[label]-> to`. Returns `false` if there was no such edge.
    pub fn remove_edge(
        &mut self,
        from: impl Into<SymbolId>,
        to: impl Into<SymbolId>,
        label: impl Into<Label>,
    ) -> Result<bool> {
        let (from, to, label) = (from.into(), to.into(), label.into());
        self.resolve(to)?;
        if !self.resolve_mut(from)?.out_edges.remove(&Edge::new(label.clone(), to)) {
            return Ok(false);
        }
        self.resolve_mut(to)?.in_edges.remove(&Edge::new(label.clone(), from));
        self.edge_count -= 1;
        trace!(%from, %to, %label, "edge removed");
        Ok(true)
    }

    pub fn has_edge(&self, from: impl Into<SymbolId>, to: impl Into<SymbolId>, label: impl Into<Label>) -> bool {
        let (from, to) = (from.into(), to.into());
        self.registry.get(from).is_some_and(|s| s.out_edges.contains(&Edge::new(label, to)))
    }

    pub fn out_edges(&self, id: impl Into<SymbolId>) -> Result<&Adjacency> {
        Ok(&self.resolve(id.into())?.out_edges)
    }

    pub fn in_edges(&self, id: impl Into<SymbolId>) -> Result<&Adjacency> {
        Ok(&self.resolve(id.into())?.in_edges)
    }

    /// Adjacent symbols in edge-insertion order (outgoing before incoming
    /// for [`Direction::Both`]). A peer linked under several labels appears
    /// once per label.
    pub fn neighbors<'a>(
        &'a self,
        id: SymbolId,
        direction: Direction,
        labels: &'a LabelFilter,
    ) -> Result<impl Iterator<Item = SymbolId> + 'a> {
        let symbol = self.resolve(id)?;
        let outgoing = matches!(direction, Direction::Outgoing | Direction::Both)
            .then(|| symbol.out_edges.peers(labels))
            .into_iter()
            .flatten();
        let incoming = matches!(direction, Direction::Incoming | Direction::Both)
            .then(|| symbol.in_edges.peers(labels))
            .into_iter()
            .flatten();
        Ok(outgoing.chain(incoming))
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove a symbol, severing every edge and index entry that mentions it.
    ///
    /// Costs O(degree + index entries) of the removed symbol: each peer-side
    /// edge removal is O(1) amortized. Returns
    /// `false` if the id was not live.
    pub fn remove_node(&mut self, id: impl Into<SymbolId>) -> bool {
        let id = id.into();
        let Some(mut symbol) = self.registry.release(id) else {
            return false;
        };
        self.detach(&mut symbol);
        debug!(symbol = %id, name = %symbol.name, "symbol removed");
        true
    }

    /// Sever everything that links `symbol` (already released) to the rest
    /// of the graph.
    fn detach(&mut self, symbol: &mut Symbol) {
        let id = symbol.id;
        for edge in symbol.out_edges.take() {
            self.edge_count -= 1;
            if let Some(peer) = self.registry.get_mut(edge.peer) {
                peer.in_edges.remove(&Edge::new(edge.label, id));
            }
        }
        for edge in symbol.in_edges.take() {
            // Self-loops were already counted on the outgoing side.
            if edge.peer == id {
                continue;
            }
            self.edge_count -= 1;
            if let Some(peer) = self.registry.get_mut(edge.peer) {
                peer.out_edges.remove(&Edge::new(edge.label, id));
            }
        }
        for owner in symbol.indexed_by.drain(..) {
            if let Some(index) = self.registry.get_mut(owner).and_then(|s| s.index.as_mut()) {
                index.delete(id);
            }
        }
        if let Some(index) = symbol.index.take() {
            for target in index.traverse(Default::default()) {
                self.unmark_indexed(target, id);
            }
        }
    }

    /// Evict every symbol that nothing references any more: no outstanding
    /// [`SymbolRef`], no edge and no index entry pointing at it.
    ///
    /// Evicting a symbol drops its own index, which may leave further
    /// symbols unreferenced; those are collected in the same call. Returns
    /// the number of symbols evicted.
    pub fn sweep(&mut self) -> usize {
        self.interns_since_sweep = 0;
        let mut evicted = 0;
        loop {
            let doomed: Vec<SymbolId> =
                self.registry.iter().filter(|s| s.is_unreferenced()).map(Symbol::id).collect();
            if doomed.is_empty() {
                break;
            }
            for id in doomed {
                if let Some(mut symbol) = self.registry.release(id) {
                    self.detach(&mut symbol);
                    trace!(symbol = %id, name = %symbol.name, "symbol evicted");
                    evicted += 1;
                }
            }
        }
        if evicted > 0 {
            debug!(evicted, remaining = self.len(), "sweep finished");
        }
        evicted
    }

    // ========================================================================
    // Weighted indexes
    // ========================================================================

    /// The index owned by `owner`, if it has one.
    pub fn index(&self, owner: impl Into<SymbolId>) -> Option<&WeightedIndex> {
        self.registry.get(owner.into()).and_then(|s| s.index.as_ref())
    }

    /// Insert `target` into `owner`'s index at `weight`, creating the index
    /// with the configured backend on first use. Returns the target's
    /// previous weight in that index.
    pub fn index_insert(
        &mut self,
        owner: impl Into<SymbolId>,
        target: impl Into<SymbolId>,
        weight: f64,
    ) -> Result<Option<f64>> {
        let (owner, target) = (owner.into(), target.into());
        self.resolve(target)?;
        if weight.is_nan() {
            return Err(Error::InvalidWeight(weight));
        }
        let backend = self.config.default_backend;
        let previous = self
            .resolve_mut(owner)?
            .index
            .get_or_insert_with(|| WeightedIndex::new(backend))
            .insert(target, weight)?;
        // A symbol's own index does not keep it alive.
        if previous.is_none() && owner != target {
            self.resolve_mut(target)?.indexed_by.push(owner);
        }
        Ok(previous)
    }

    /// Remove `target` from `owner`'s index. `Ok(None)` if it was not there.
    pub fn index_delete(&mut self, owner: impl Into<SymbolId>, target: impl Into<SymbolId>) -> Result<Option<f64>> {
        let (owner, target) = (owner.into(), target.into());
        let removed = self.resolve_mut(owner)?.index.as_mut().and_then(|index| index.delete(target));
        if removed.is_some() {
            self.unmark_indexed(target, owner);
        }
        Ok(removed)
    }

    /// Run a maintenance rebuild of `owner`'s index. A symbol without an
    /// index has nothing to rebuild.
    pub fn index_rebalance(&mut self, owner: impl Into<SymbolId>, strategy: Rebalance) -> Result<()> {
        let owner = owner.into();
        match self.resolve_mut(owner)?.index.as_mut() {
            Some(index) => index.rebalance(strategy),
            None => Ok(()),
        }
    }

    fn unmark_indexed(&mut self, target: SymbolId, owner: SymbolId) {
        if let Some(symbol) = self.registry.get_mut(target) {
            if let Some(pos) = symbol.indexed_by.iter().position(|o| *o == owner) {
                symbol.indexed_by.swap_remove(pos);
            }
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
