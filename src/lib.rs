//! # symgraph: Interned Symbol Graph
//!
//! A directed graph of uniquely-named symbols with labelled edges, cycle-safe
//! traversal, and a private weighted index per symbol backed by a
//! self-balancing search tree.
//!
//! ## Design Principles
//!
//! 1. **One symbol per name**: the registry interns names; handles compare by identity
//! 2. **Arena, not pointers**: symbols live in generational slots, edges are ids, cycles own nothing
//! 3. **Symmetric edges**: every out-edge has its in-edge twin, removal severs both
//! 4. **Backend-agnostic index**: AVL and red-black trees sit behind one trait
//!
//! ## Quick Start
//!
//! ```rust
//! use symgraph::{Graph, Strategy, TraversalOrder};
//!
//! # fn example() -> symgraph::Result<()> {
//! let mut graph = Graph::new();
//! let (a, b, c) = (graph.intern("a"), graph.intern("b"), graph.intern("c"));
//!
//! graph.link(&a, &b)?;
//! graph.link(&b, &c)?;
//! graph.link(&c, &a)?; // cycles are fine
//!
//! let order: Vec<&str> = graph.walk(&a, Strategy::DepthFirst)?.map(|s| s.name()).collect();
//! assert_eq!(order, ["a", "b", "c"]);
//!
//! let path = graph.path_to(&a, &c)?.expect("c is reachable");
//! assert_eq!(graph.names_of(path.iter()), ["a", "b", "c"]);
//!
//! graph.index_insert(&a, &b, 0.9)?;
//! graph.index_insert(&a, &c, 0.1)?;
//! let ranked: Vec<_> = graph.index(&a).unwrap().traverse(TraversalOrder::InOrder).collect();
//! assert_eq!(ranked, [c.id(), b.id()]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Index Backends
//!
//! | Backend | Module | Balance rule |
//! |---------|--------|--------------|
//! | `Backend::Avl` | `tree::avl` | subtree heights differ by at most 1 (default) |
//! | `Backend::RedBlack` | `tree::rbtree` | no red-red edge, equal black-height |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod registry;
pub mod graph;
pub mod traversal;
pub mod index;
pub mod tree;
pub mod shared;
pub mod export;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Symbol, SymbolId, SymbolRef, SymbolPath,
    Adjacency, Direction, Edge, Label, LabelFilter,
};

// ============================================================================
// Re-exports: Graph, traversal, sharing
// ============================================================================

pub use graph::{Graph, GraphConfig};
pub use traversal::{Matching, Strategy, Walk, WalkOptions};
pub use shared::SharedGraph;

// ============================================================================
// Re-exports: Weighted index
// ============================================================================

pub use index::{Backend, IndexEntry, Rebalance, TraversalOrder, WeightKey, WeightedIndex};
pub use tree::{BalancedTree, InvariantViolation};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(SymbolId),

    #[error("Invalid weight: {0} (weights must be comparable numbers)")]
    InvalidWeight(f64),

    #[error("A path holds at least one symbol")]
    EmptyPath,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
