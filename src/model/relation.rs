//! Labelled directed edges and per-symbol adjacency.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::SymbolId;

/// Relation label. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Label(Arc<str>);

impl Label {
    /// The label used when none is given.
    pub const CHILD: &'static str = "child";

    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn child() -> Self {
        Self::new(Self::CHILD)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Label {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&Label> for Label {
    fn from(label: &Label) -> Self {
        label.clone()
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0.to_string()
    }
}

/// Traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Outgoing,
    Incoming,
    Both,
}

/// Which labels a walk or neighbour query follows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LabelFilter {
    #[default]
    Any,
    Only(SmallVec<[Label; 2]>),
}

impl LabelFilter {
    pub fn only(labels: impl IntoIterator<Item = impl Into<Label>>) -> Self {
        Self::Only(labels.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, label: &Label) -> bool {
        match self {
            LabelFilter::Any => true,
            LabelFilter::Only(labels) => labels.contains(label),
        }
    }
}

/// One side of a directed edge: the label and the symbol at the other end.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub label: Label,
    pub peer: SymbolId,
}

impl Edge {
    pub fn new(label: impl Into<Label>, peer: SymbolId) -> Self {
        Self { label: label.into(), peer }
    }
}

/// Insertion-ordered edge set with constant-time membership and removal.
///
/// The same peer may appear once per label. Removed edges leave a vacant
/// slot; slots are compacted once vacancies outnumber live edges.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    slots: Vec<Option<Edge>>,
    /// edge → its slot in `slots`.
    positions: HashMap<Edge, usize>,
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the edge was already present.
    pub fn insert(&mut self, edge: Edge) -> bool {
        if self.positions.contains_key(&edge) {
            return false;
        }
        self.positions.insert(edge.clone(), self.slots.len());
        self.slots.push(Some(edge));
        true
    }

    /// O(1) amortized.
    pub fn remove(&mut self, edge: &Edge) -> bool {
        let Some(slot) = self.positions.remove(edge) else {
            return false;
        };
        self.slots[slot] = None;
        if self.slots.len() - self.positions.len() > self.positions.len() {
            self.compact();
        }
        true
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        for (slot, edge) in self.slots.iter().enumerate() {
            if let Some(edge) = edge {
                if let Some(position) = self.positions.get_mut(edge) {
                    *position = slot;
                }
            }
        }
    }

    pub fn contains(&self, edge: &Edge) -> bool {
        self.positions.contains_key(edge)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Every edge in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.slots.iter().flatten()
    }

    /// Peers under one label, in insertion order.
    pub fn targets<'a>(&'a self, label: &'a str) -> impl Iterator<Item = SymbolId> + 'a {
        self.iter().filter(move |e| e.label.as_str() == label).map(|e| e.peer)
    }

    /// Peers whose label passes `filter`, in insertion order.
    pub fn peers<'a>(&'a self, filter: &'a LabelFilter) -> impl Iterator<Item = SymbolId> + 'a {
        self.iter().filter(move |e| filter.matches(&e.label)).map(|e| e.peer)
    }

    /// Distinct labels in order of first use.
    pub fn labels(&self) -> Vec<&Label> {
        let mut seen: Vec<&Label> = Vec::new();
        for edge in self.iter() {
            if !seen.contains(&&edge.label) {
                seen.push(&edge.label);
            }
        }
        seen
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn take(&mut self) -> Vec<Edge> {
        self.positions.clear();
        std::mem::take(&mut self.slots).into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> SymbolId {
        SymbolId::new(index, 0)
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut adj = Adjacency::new();
        assert!(adj.insert(Edge::new("child", id(1))));
        assert!(!adj.insert(Edge::new("child", id(1))));
        assert!(adj.insert(Edge::new("owns", id(1))));
        assert_eq!(adj.len(), 2);
    }

    #[test]
    fn test_order_survives_removal() {
        let mut adj = Adjacency::new();
        for i in 1..=4 {
            adj.insert(Edge::new("child", id(i)));
        }
        assert!(adj.remove(&Edge::new("child", id(2))));
        assert!(!adj.remove(&Edge::new("child", id(2))));
        let peers: Vec<_> = adj.targets("child").collect();
        assert_eq!(peers, vec![id(1), id(3), id(4)]);
    }

    #[test]
    fn test_removal_compacts_and_keeps_order() {
        let mut adj = Adjacency::new();
        for i in 0..100 {
            adj.insert(Edge::new("child", id(i)));
        }
        for i in (0..100).filter(|i| i % 4 != 0) {
            assert!(adj.remove(&Edge::new("child", id(i))));
        }
        assert_eq!(adj.len(), 25);
        assert!(adj.slot_count() <= 2 * adj.len() + 1);
        let peers: Vec<_> = adj.targets("child").collect();
        let expected: Vec<_> = (0..100).step_by(4).map(id).collect();
        assert_eq!(peers, expected);

        // Positions stay valid after compaction.
        assert!(adj.remove(&Edge::new("child", id(48))));
        assert!(adj.insert(Edge::new("child", id(48))));
        assert_eq!(adj.iter().last(), Some(&Edge::new("child", id(48))));
        assert_eq!(adj.len(), 25);
    }

    #[test]
    fn test_labels_in_first_use_order() {
        let mut adj = Adjacency::new();
        adj.insert(Edge::new("b", id(1)));
        adj.insert(Edge::new("a", id(2)));
        adj.insert(Edge::new("b", id(3)));
        let labels: Vec<&str> = adj.labels().into_iter().map(Label::as_str).collect();
        assert_eq!(labels, vec!["b", "a"]);
    }

    #[test]
    fn test_label_filter() {
        let mut adj = Adjacency::new();
        adj.insert(Edge::new("x", id(1)));
        adj.insert(Edge::new("y", id(2)));
        adj.insert(Edge::new("x", id(3)));
        let only_x = LabelFilter::only(["x"]);
        assert_eq!(adj.peers(&only_x).collect::<Vec<_>>(), vec![id(1), id(3)]);
        assert_eq!(adj.peers(&LabelFilter::Any).count(), 3);
    }

    #[test]
    fn test_label_serde_as_plain_string() {
        let json = serde_json::to_string(&Label::child()).unwrap();
        assert_eq!(json, "\"child\"");
        let back: Label = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Label::child());
    }
}
