//! Graph export: DOT diagrams and JSON snapshots.
//!
//! Both exporters only read the graph. Output is deterministic: symbols in
//! slot order, edges in insertion order, index entries ascending.
//!
//! ```text
//! Graph → export_dot()  → `dot -Tsvg` / any Graphviz viewer
//! Graph → export_json() → snapshot for diffing or fixtures
//! ```

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::index::TraversalOrder;
use crate::model::SymbolId;
use crate::Result;

/// Serializable view of a whole graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub symbols: Vec<SymbolSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<EdgeSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub index: Vec<IndexSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub label: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub target: String,
    pub weight: f64,
}

/// Capture names, outgoing edges and index entries of every live symbol.
pub fn snapshot(graph: &Graph) -> GraphSnapshot {
    let name_of = |id: SymbolId| graph.symbol(id).map(|s| s.name().to_string()).unwrap_or_default();
    let symbols = graph
        .symbols()
        .map(|symbol| SymbolSnapshot {
            name: symbol.name().to_string(),
            edges: symbol
                .out_edges()
                .iter()
                .map(|edge| EdgeSnapshot { label: edge.label.to_string(), target: name_of(edge.peer) })
                .collect(),
            index: symbol
                .index()
                .map(|index| {
                    index
                        .entries(TraversalOrder::InOrder)
                        .map(|entry| IndexSnapshot { target: name_of(entry.target), weight: entry.weight() })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect();
    GraphSnapshot { symbols }
}

/// Write [`snapshot`] as pretty-printed JSON.
pub fn export_json(graph: &Graph, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &snapshot(graph))?;
    writeln!(writer)?;
    Ok(())
}

/// Write the relationship graph as a Graphviz digraph.
pub fn export_dot(graph: &Graph, writer: &mut dyn Write) -> Result<()> {
    writeln!(writer, "digraph symbols {{")?;
    for symbol in graph.symbols() {
        writeln!(writer, "    {};", quote(symbol.name()))?;
    }
    for symbol in graph.symbols() {
        for edge in symbol.out_edges().iter() {
            let Some(target) = graph.symbol(edge.peer) else { continue };
            writeln!(
                writer,
                "    {} -> {} [label={}];",
                quote(symbol.name()),
                quote(target.name()),
                quote(edge.label.as_str()),
            )?;
        }
    }
    writeln!(writer, "}}")?;
    Ok(())
}

/// DOT string literal.
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Graph {
        let mut graph = Graph::new();
        let (a, b, c) = (graph.intern("a"), graph.intern("b"), graph.intern("c"));
        graph.link(&a, &b).unwrap();
        graph.add_edge(&a, &c, "ref").unwrap();
        graph.index_insert(&a, &c, 0.5).unwrap();
        graph.index_insert(&a, &b, 0.1).unwrap();
        graph
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_dot_is_deterministic() {
        let graph = sample();
        let mut out = Vec::new();
        export_dot(&graph, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "digraph symbols {\n    \"a\";\n    \"b\";\n    \"c\";\n    \"a\" -> \"b\" [label=\"child\"];\n    \"a\" -> \"c\" [label=\"ref\"];\n}\n"
        );
    }

    #[test]
    fn test_snapshot_orders_index_by_weight() {
        let snap = snapshot(&sample());
        let a = &snap.symbols[0];
        assert_eq!(a.edges.len(), 2);
        let targets: Vec<&str> = a.index.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["b", "c"]);
        assert!(snap.symbols[1].index.is_empty());
    }

    #[test]
    fn test_json_round_trips_snapshot() {
        let graph = sample();
        let mut out = Vec::new();
        export_json(&graph, &mut out).unwrap();
        let parsed: GraphSnapshot = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, snapshot(&graph));
    }
}
