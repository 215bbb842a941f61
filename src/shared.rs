//! Thread-shared graph handle.
//!
//! [`Graph`] itself does no locking. `SharedGraph` puts it behind one
//! `parking_lot::RwLock` so that interning is atomic across threads: two
//! threads interning the same name always get the same symbol.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::graph::{Graph, GraphConfig};
use crate::model::SymbolRef;

/// Cloneable, thread-safe handle to a [`Graph`].
#[derive(Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<Graph>>,
}

impl SharedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self::from(Graph::with_config(config))
    }

    /// Intern under the write lock.
    pub fn intern(&self, name: &str) -> SymbolRef {
        self.inner.write().intern(name)
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&Graph) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> R {
        f(&mut self.inner.write())
    }
}

impl From<Graph> for SharedGraph {
    fn from(graph: Graph) -> Self {
        Self { inner: Arc::new(RwLock::new(graph)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_intern_yields_one_symbol() {
        let shared = SharedGraph::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.intern("contended"))
            })
            .collect();
        let refs: Vec<SymbolRef> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(refs.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(shared.read(|g| g.len()), 1);
    }

    #[test]
    fn test_write_then_read() {
        let shared = SharedGraph::new();
        let (a, b) = (shared.intern("a"), shared.intern("b"));
        shared.write(|g| g.link(&a, &b)).unwrap();
        assert!(shared.read(|g| g.has_edge(&a, &b, "child")));
    }
}
