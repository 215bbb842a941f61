//! # Symbol Graph Model
//!
//! The data types shared by the registry, the relationship model, the
//! traversal engine and the exporters. Pure data: no registry state lives
//! here, only the per-symbol bookkeeping.

pub mod symbol;
pub mod relation;
pub mod path;

pub use symbol::{Symbol, SymbolId, SymbolRef};
pub use relation::{Adjacency, Direction, Edge, Label, LabelFilter};
pub use path::SymbolPath;
