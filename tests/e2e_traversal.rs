//! End-to-end integration tests for traversal: depth-first and breadth-first
//! walks, predicate matching and path finding over cyclic graphs.

use symgraph::{Direction, Error, Graph, LabelFilter, Strategy, Symbol, SymbolId, SymbolPath, WalkOptions};
use pretty_assertions::assert_eq;

// ============================================================================
// Helpers
// ============================================================================

/// Build a graph from `(from, to)` pairs linked under the default label.
fn build(edges: &[(&str, &str)]) -> Graph {
    let mut graph = Graph::new();
    for (from, to) in edges {
        let (f, t) = (graph.intern(from), graph.intern(to));
        graph.link(&f, &t).unwrap();
    }
    graph
}

fn id(graph: &Graph, name: &str) -> SymbolId {
    graph.lookup(name).map(Symbol::id).unwrap()
}

fn visit<'g>(walk: impl Iterator<Item = &'g Symbol>) -> Vec<&'g str> {
    walk.map(Symbol::name).collect()
}

// ============================================================================
// 1. Walk orders
// ============================================================================

#[test]
fn test_tree_dfs_and_bfs() {
    //        root
    //       /    \
    //      l      r
    //     / \      \
    //    ll  lr     rr
    let graph = build(&[("root", "l"), ("root", "r"), ("l", "ll"), ("l", "lr"), ("r", "rr")]);
    let root = id(&graph, "root");

    assert_eq!(visit(graph.dfs(root).unwrap()), vec!["root", "l", "ll", "lr", "r", "rr"]);
    assert_eq!(visit(graph.bfs(root).unwrap()), vec!["root", "l", "r", "ll", "lr", "rr"]);
}

#[test]
fn test_cycles_terminate_and_visit_once() {
    // A ring of 50 with chords back to the start.
    let names: Vec<String> = (0..50).map(|i| format!("n{i}")).collect();
    let mut edges: Vec<(&str, &str)> = names.windows(2).map(|w| (w[0].as_str(), w[1].as_str())).collect();
    edges.push((names[49].as_str(), names[0].as_str()));
    for name in names.iter().step_by(7) {
        edges.push((name.as_str(), names[0].as_str()));
    }
    let graph = build(&edges);
    let start = id(&graph, "n0");

    for strategy in [Strategy::DepthFirst, Strategy::BreadthFirst] {
        let mut seen = visit(graph.walk(start, strategy).unwrap());
        assert_eq!(seen.len(), 50);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 50);
    }
}

#[test]
fn test_isolated_start_yields_itself() {
    let mut graph = Graph::new();
    let lone = graph.intern("lone");
    assert_eq!(visit(graph.dfs(&lone).unwrap()), vec!["lone"]);
    assert_eq!(visit(graph.bfs(&lone).unwrap()), vec!["lone"]);
}

#[test]
fn test_walk_both_directions_with_depth() {
    let graph = build(&[("a", "b"), ("b", "c"), ("c", "d"), ("x", "b")]);
    let b = id(&graph, "b");
    let options = WalkOptions::new(Strategy::BreadthFirst).direction(Direction::Both).max_depth(1);
    assert_eq!(visit(graph.walk_with(b, options).unwrap()), vec!["b", "c", "a", "x"]);
}

#[test]
fn test_walk_ignores_other_labels() {
    let mut graph = Graph::new();
    let (a, b, c) = (graph.intern("a"), graph.intern("b"), graph.intern("c"));
    graph.add_edge(&a, &b, "child").unwrap();
    graph.add_edge(&b, &c, "ref").unwrap();

    let children = WalkOptions::default().labels(LabelFilter::only(["child"]));
    assert_eq!(visit(graph.walk_with(&a, children).unwrap()), vec!["a", "b"]);
    assert_eq!(visit(graph.dfs(&a).unwrap()), vec!["a", "b", "c"]);
}

// ============================================================================
// 2. Matching
// ============================================================================

#[test]
fn test_match_collects_in_visit_order() {
    let graph = build(&[("root", "apple"), ("root", "berry"), ("apple", "avocado"), ("berry", "apricot")]);
    let root = id(&graph, "root");

    let dfs: Vec<_> = visit(graph.matching(root, |s| s.name().starts_with('a'), Strategy::DepthFirst).unwrap());
    assert_eq!(dfs, vec!["apple", "avocado", "apricot"]);

    let bfs: Vec<_> = visit(graph.matching(root, |s| s.name().starts_with('a'), Strategy::BreadthFirst).unwrap());
    assert_eq!(bfs, vec!["apple", "avocado", "apricot"]);

    let none = graph.matching(root, |_| false, Strategy::DepthFirst).unwrap().count();
    assert_eq!(none, 0);
}

// ============================================================================
// 3. Paths
// ============================================================================

#[test]
fn test_path_through_chain_and_disconnected() {
    let mut graph = build(&[("A", "B"), ("B", "C")]);
    let d = graph.intern("D");
    let (a, c) = (id(&graph, "A"), id(&graph, "C"));

    let path = graph.path_to(a, c).unwrap().unwrap();
    assert_eq!(graph.names_of(path.iter()), vec!["A", "B", "C"]);
    assert_eq!(path.len(), 2);
    assert_eq!((path.start(), path.end()), (a, c));

    assert_eq!(graph.path_to(a, &d).unwrap(), None);
    // Edges are directed.
    assert_eq!(graph.path_to(c, a).unwrap(), None);
}

#[test]
fn test_bfs_path_is_shortest() {
    // DFS follows the long branch first; BFS finds the direct edge.
    let graph = build(&[("s", "x"), ("x", "y"), ("y", "t"), ("s", "t")]);
    let (s, t) = (id(&graph, "s"), id(&graph, "t"));

    let deep = graph.path_to(s, t).unwrap().unwrap();
    assert_eq!(graph.names_of(deep.iter()), vec!["s", "x", "y", "t"]);

    let shortest = graph.path_to_with(s, t, WalkOptions::new(Strategy::BreadthFirst)).unwrap().unwrap();
    assert_eq!(graph.names_of(shortest.iter()), vec!["s", "t"]);
}

#[test]
fn test_path_in_cycle() {
    let graph = build(&[("a", "b"), ("b", "c"), ("c", "a")]);
    let (c, b) = (id(&graph, "c"), id(&graph, "b"));
    let path = graph.path_to(c, b).unwrap().unwrap();
    assert_eq!(graph.names_of(path.iter()), vec!["c", "a", "b"]);
}

#[test]
fn test_unknown_endpoint_is_error() {
    let mut graph = build(&[("a", "b")]);
    let (a, b) = (id(&graph, "a"), id(&graph, "b"));
    graph.remove_node(b);
    assert!(matches!(graph.path_to(a, b), Err(Error::UnknownSymbol(gone)) if gone == b));
    assert!(matches!(graph.bfs(b), Err(Error::UnknownSymbol(_))));
}

#[test]
fn test_path_serializes_as_id_sequence() {
    let graph = build(&[("a", "b")]);
    let (a, b) = (id(&graph, "a"), id(&graph, "b"));
    let path = graph.path_to(a, b).unwrap().unwrap();

    let json = serde_json::to_string(&path).unwrap();
    let back: SymbolPath = serde_json::from_str(&json).unwrap();
    assert_eq!(back, path);
    assert_eq!(back.as_slice(), &[a, b]);

    // An empty sequence is not a path.
    assert!(serde_json::from_str::<SymbolPath>("[]").is_err());
    assert!(matches!(SymbolPath::try_from(Vec::new()), Err(Error::EmptyPath)));
}
