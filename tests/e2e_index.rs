//! End-to-end tests for per-symbol weighted indexes through the graph API.

use symgraph::{Backend, Error, Graph, GraphConfig, Rebalance, SymbolRef, TraversalOrder};
use pretty_assertions::assert_eq;

// ============================================================================
// Helpers
// ============================================================================

fn ranked(graph: &Graph, owner: &SymbolRef) -> Vec<String> {
    let index = graph.index(owner).expect("owner has an index");
    graph
        .names_of(index.traverse(TraversalOrder::InOrder))
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn graph_with(backend: Backend) -> Graph {
    Graph::with_config(GraphConfig { default_backend: backend, ..GraphConfig::default() })
}

// ============================================================================
// 1. Ordering
// ============================================================================

#[test]
fn test_weight_order_round_trip() {
    for backend in [Backend::Avl, Backend::RedBlack] {
        let mut graph = graph_with(backend);
        let owner = graph.intern("owner");
        let (a, b, c) = (graph.intern("a"), graph.intern("b"), graph.intern("c"));

        graph.index_insert(&owner, &a, 0.7).unwrap();
        graph.index_insert(&owner, &b, 0.2).unwrap();
        graph.index_insert(&owner, &c, 0.5).unwrap();
        assert_eq!(ranked(&graph, &owner), vec!["b", "c", "a"]);

        assert_eq!(graph.index_delete(&owner, &c).unwrap(), Some(0.5));
        assert_eq!(ranked(&graph, &owner), vec!["b", "a"]);
        graph.index(&owner).unwrap().assert_balanced();
    }
}

#[test]
fn test_ties_and_signed_zero() {
    let mut graph = Graph::new();
    let owner = graph.intern("owner");
    let targets: Vec<_> = ["p", "q", "r", "s"].iter().map(|n| graph.intern(n)).collect();

    graph.index_insert(&owner, &targets[0], 0.0).unwrap();
    graph.index_insert(&owner, &targets[1], -0.0).unwrap();
    graph.index_insert(&owner, &targets[2], 0.0).unwrap();
    graph.index_insert(&owner, &targets[3], f64::NEG_INFINITY).unwrap();

    assert_eq!(ranked(&graph, &owner), vec!["s", "q", "p", "r"]);
    let index = graph.index(&owner).unwrap();
    assert_eq!(index.search(0.0), Some(targets[0].id()));
    assert_eq!(index.search_all(0.0).count(), 2);
}

#[test]
fn test_reinsert_reweighs() {
    let mut graph = Graph::new();
    let owner = graph.intern("owner");
    let (a, b) = (graph.intern("a"), graph.intern("b"));
    graph.index_insert(&owner, &a, 1.0).unwrap();
    graph.index_insert(&owner, &b, 2.0).unwrap();

    assert_eq!(graph.index_insert(&owner, &a, 5.0).unwrap(), Some(1.0));
    assert_eq!(ranked(&graph, &owner), vec!["b", "a"]);
    assert_eq!(graph.index(&owner).unwrap().len(), 2);
}

#[test]
fn test_invalid_weight_and_unknown_target() {
    let mut graph = Graph::new();
    let (owner, a, gone) = (graph.intern("owner"), graph.intern("a"), graph.intern("gone"));
    graph.remove_node(&gone);

    assert!(matches!(graph.index_insert(&owner, &a, f64::NAN), Err(Error::InvalidWeight(_))));
    assert!(matches!(graph.index_insert(&owner, &gone, 1.0), Err(Error::UnknownSymbol(_))));
    assert!(graph.index(&owner).is_none());
}

// ============================================================================
// 2. Lifecycle with the graph
// ============================================================================

#[test]
fn test_removed_target_leaves_every_index() {
    let mut graph = Graph::new();
    let owners: Vec<_> = (0..3).map(|i| graph.intern(&format!("owner{i}"))).collect();
    let (shared, other) = (graph.intern("shared"), graph.intern("other"));
    for (i, owner) in owners.iter().enumerate() {
        graph.index_insert(owner, &shared, i as f64).unwrap();
        graph.index_insert(owner, &other, 10.0).unwrap();
    }

    graph.remove_node(&shared);
    for owner in &owners {
        assert_eq!(ranked(&graph, owner), vec!["other"]);
    }
}

#[test]
fn test_index_survives_edge_changes() {
    let mut graph = Graph::new();
    let (owner, a) = (graph.intern("owner"), graph.intern("a"));
    graph.link(&owner, &a).unwrap();
    graph.index_insert(&owner, &a, 3.0).unwrap();
    graph.remove_edge(&owner, &a, "child").unwrap();
    assert_eq!(graph.index(&owner).unwrap().weight_of(a.id()), Some(3.0));
}

// ============================================================================
// 3. Maintenance
// ============================================================================

#[test]
fn test_rebalance_switch_backend_keeps_order() {
    let mut graph = Graph::new();
    let owner = graph.intern("owner");
    for i in 0..32 {
        let target = graph.intern(&format!("t{i:02}"));
        graph.index_insert(&owner, &target, f64::from(31 - i)).unwrap();
    }
    let before = ranked(&graph, &owner);

    graph.index_rebalance(&owner, Rebalance::Switch(Backend::RedBlack)).unwrap();
    let index = graph.index(&owner).unwrap();
    assert_eq!(index.backend(), Backend::RedBlack);
    index.assert_balanced();
    assert_eq!(ranked(&graph, &owner), before);

    graph.index_rebalance(&owner, Rebalance::Compact).unwrap();
    assert_eq!(ranked(&graph, &owner), before);
}

#[test]
fn test_rebalance_without_index_is_noop() {
    let mut graph = Graph::new();
    let owner = graph.intern("owner");
    graph.index_rebalance(&owner, Rebalance::Compact).unwrap();
    assert!(graph.index(&owner).is_none());
}

#[test]
fn test_height_stays_logarithmic() {
    for backend in [Backend::Avl, Backend::RedBlack] {
        let mut graph = graph_with(backend);
        let owner = graph.intern("owner");
        for i in 0..1024 {
            let target = graph.intern(&format!("t{i}"));
            graph.index_insert(&owner, &target, f64::from(i)).unwrap();
        }
        let index = graph.index(&owner).unwrap();
        assert_eq!(index.len(), 1024);
        // 2 * log2(n + 1) bounds both backends.
        assert!(index.height() <= 21, "{backend:?} height {}", index.height());
        index.assert_balanced();
    }
}
