//! Symbol: the interned graph vertex.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::Adjacency;
use crate::index::WeightedIndex;

/// Generational handle to a registry slot.
///
/// A slot's generation is bumped when its symbol is removed or evicted, so
/// an id taken before that never resolves to the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId {
    index: u32,
    generation: u32,
}

impl SymbolId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// A named vertex with labelled edges in both directions and an optional
/// private weighted index.
#[derive(Debug)]
pub struct Symbol {
    pub(crate) id: SymbolId,
    pub(crate) name: String,
    pub(crate) out_edges: Adjacency,
    pub(crate) in_edges: Adjacency,
    pub(crate) index: Option<WeightedIndex>,
    /// Owners whose index holds an entry for this symbol.
    pub(crate) indexed_by: SmallVec<[SymbolId; 2]>,
    /// Cloned into every `SymbolRef`; strong count minus one is the number
    /// of outstanding external handles.
    pub(crate) token: Arc<()>,
}

impl Symbol {
    pub(crate) fn new(id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            out_edges: Adjacency::new(),
            in_edges: Adjacency::new(),
            index: None,
            indexed_by: SmallVec::new(),
            token: Arc::new(()),
        }
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn out_edges(&self) -> &Adjacency {
        &self.out_edges
    }

    pub fn in_edges(&self) -> &Adjacency {
        &self.in_edges
    }

    /// The symbol's weighted index, if anything was ever inserted.
    pub fn index(&self) -> Option<&WeightedIndex> {
        self.index.as_ref()
    }

    pub fn degree(&self) -> usize {
        self.out_edges.len() + self.in_edges.len()
    }

    pub fn external_handles(&self) -> usize {
        Arc::strong_count(&self.token) - 1
    }

    /// No external handle, no edge and no index entry keeps this symbol alive.
    pub fn is_unreferenced(&self) -> bool {
        self.external_handles() == 0 && self.degree() == 0 && self.indexed_by.is_empty()
    }
}

/// External handle returned by interning.
///
/// Holding a `SymbolRef` keeps its symbol from being swept. Equality and
/// hashing use the id only.
#[derive(Clone)]
pub struct SymbolRef {
    id: SymbolId,
    token: Arc<()>,
}

impl SymbolRef {
    pub(crate) fn new(id: SymbolId, token: Arc<()>) -> Self {
        Self { id, token }
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    /// Number of handles to this symbol, this one included. Only meaningful
    /// while the symbol is still registered.
    pub fn handles(&self) -> usize {
        Arc::strong_count(&self.token) - 1
    }
}

impl fmt::Debug for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SymbolRef").field(&self.id).finish()
    }
}

impl PartialEq for SymbolRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SymbolRef {}

impl std::hash::Hash for SymbolRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<&SymbolRef> for SymbolId {
    fn from(handle: &SymbolRef) -> Self {
        handle.id
    }
}

impl From<SymbolRef> for SymbolId {
    fn from(handle: SymbolRef) -> Self {
        handle.id
    }
}

impl From<&Symbol> for SymbolId {
    fn from(symbol: &Symbol) -> Self {
        symbol.id
    }
}
