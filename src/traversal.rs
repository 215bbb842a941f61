//! # Traversal Engine
//!
//! Depth-first and breadth-first walks over the relationship model.
//!
//! A walk owns its visited-set and frontier, so walks are restartable and
//! independent of each other. Cycles need no special handling: a symbol is
//! yielded and expanded only the first time it is popped, which is what
//! keeps a walk over a cyclic graph finite.
//!
//! Neighbours are expanded in edge-insertion order. For depth-first walks
//! they are pushed in reverse, so the first-inserted edge is followed first.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::graph::Graph;
use crate::model::{Direction, LabelFilter, Symbol, SymbolId, SymbolPath};
use crate::Result;

/// Frontier discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Stack frontier.
    #[default]
    DepthFirst,
    /// Queue frontier.
    BreadthFirst,
}

/// Walk parameters beyond the start symbol.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    pub strategy: Strategy,
    pub direction: Direction,
    pub labels: LabelFilter,
    /// Symbols at this many hops from the start are yielded but not expanded.
    pub max_depth: Option<usize>,
}

impl WalkOptions {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy, ..Self::default() }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn labels(mut self, labels: LabelFilter) -> Self {
        self.labels = labels;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

// ============================================================================
// Search core
// ============================================================================

/// A frontier entry: the symbol, who pushed it, and its hop count.
#[derive(Debug, Clone, Copy)]
struct Step {
    id: SymbolId,
    parent: Option<SymbolId>,
    depth: usize,
}

enum Frontier {
    Stack(Vec<Step>),
    Queue(VecDeque<Step>),
}

impl Frontier {
    fn new(strategy: Strategy, start: Step) -> Self {
        match strategy {
            Strategy::DepthFirst => Frontier::Stack(vec![start]),
            Strategy::BreadthFirst => Frontier::Queue(VecDeque::from([start])),
        }
    }

    fn pop(&mut self) -> Option<Step> {
        match self {
            Frontier::Stack(stack) => stack.pop(),
            Frontier::Queue(queue) => queue.pop_front(),
        }
    }

    /// Enqueue `steps` so that they come out in the given order.
    fn extend(&mut self, steps: impl DoubleEndedIterator<Item = Step>) {
        match self {
            Frontier::Stack(stack) => stack.extend(steps.rev()),
            Frontier::Queue(queue) => queue.extend(steps),
        }
    }
}

/// Shared engine behind [`Walk`] and [`Graph::path_to`].
struct Search<'g> {
    graph: &'g Graph,
    options: WalkOptions,
    visited: HashSet<SymbolId>,
    frontier: Frontier,
}

impl<'g> Search<'g> {
    fn new(graph: &'g Graph, start: SymbolId, options: WalkOptions) -> Self {
        let frontier = Frontier::new(options.strategy, Step { id: start, parent: None, depth: 0 });
        Self { graph, options, visited: HashSet::new(), frontier }
    }

    /// Pop until an unvisited live symbol comes up, mark it, expand it.
    fn step(&mut self) -> Option<(&'g Symbol, Step)> {
        loop {
            let step = self.frontier.pop()?;
            if self.visited.contains(&step.id) {
                continue;
            }
            let Some(symbol) = self.graph.symbol(step.id) else { continue };
            self.visited.insert(step.id);
            if self.options.max_depth.is_none_or(|max| step.depth < max) {
                self.expand(step);
            }
            return Some((symbol, step));
        }
    }

    fn expand(&mut self, from: Step) {
        let Ok(neighbors) = self.graph.neighbors(from.id, self.options.direction, &self.options.labels) else {
            return;
        };
        let next: SmallVec<[Step; 8]> = neighbors
            .filter(|id| !self.visited.contains(id))
            .map(|id| Step { id, parent: Some(from.id), depth: from.depth + 1 })
            .collect();
        self.frontier.extend(next.into_iter());
    }
}

// ============================================================================
// Walk
// ============================================================================

/// Lazy walk over the symbols reachable from a start symbol, start included.
pub struct Walk<'g> {
    search: Search<'g>,
}

impl<'g> Iterator for Walk<'g> {
    type Item = &'g Symbol;

    fn next(&mut self) -> Option<&'g Symbol> {
        self.search.step().map(|(symbol, _)| symbol)
    }
}

/// Walk that yields only symbols accepted by a predicate. Rejected symbols
/// are still expanded.
pub struct Matching<'g, P> {
    walk: Walk<'g>,
    predicate: P,
}

impl<'g, P> Iterator for Matching<'g, P>
where
    P: FnMut(&Symbol) -> bool,
{
    type Item = &'g Symbol;

    fn next(&mut self) -> Option<&'g Symbol> {
        self.walk.by_ref().find(|symbol| (self.predicate)(*symbol))
    }
}

// ============================================================================
// Graph entry points
// ============================================================================

impl Graph {
    /// Walk outgoing edges of every label from `start`.
    pub fn walk(&self, start: impl Into<SymbolId>, strategy: Strategy) -> Result<Walk<'_>> {
        self.walk_with(start, WalkOptions::new(strategy))
    }

    pub fn walk_with(&self, start: impl Into<SymbolId>, options: WalkOptions) -> Result<Walk<'_>> {
        let start = start.into();
        self.resolve(start)?;
        Ok(Walk { search: Search::new(self, start, options) })
    }

    pub fn dfs(&self, start: impl Into<SymbolId>) -> Result<Walk<'_>> {
        self.walk(start, Strategy::DepthFirst)
    }

    pub fn bfs(&self, start: impl Into<SymbolId>) -> Result<Walk<'_>> {
        self.walk(start, Strategy::BreadthFirst)
    }

    /// Symbols reachable from `start` for which `predicate` holds, in the
    /// strategy's visiting order.
    pub fn matching<P>(&self, start: impl Into<SymbolId>, predicate: P, strategy: Strategy) -> Result<Matching<'_, P>>
    where
        P: FnMut(&Symbol) -> bool,
    {
        Ok(Matching { walk: self.walk(start, strategy)?, predicate })
    }

    /// First path found by a depth-first search from `start` to `target`.
    ///
    /// `Ok(None)` means `target` is unreachable; an id that is not a live
    /// symbol is an error.
    pub fn path_to(&self, start: impl Into<SymbolId>, target: impl Into<SymbolId>) -> Result<Option<SymbolPath>> {
        self.path_to_with(start, target, WalkOptions::default())
    }

    /// [`Graph::path_to`] under arbitrary walk options. With
    /// [`Strategy::BreadthFirst`] the path found has the fewest hops.
    pub fn path_to_with(
        &self,
        start: impl Into<SymbolId>,
        target: impl Into<SymbolId>,
        options: WalkOptions,
    ) -> Result<Option<SymbolPath>> {
        let (start, target) = (start.into(), target.into());
        self.resolve(start)?;
        self.resolve(target)?;

        let mut parents: HashMap<SymbolId, SymbolId> = HashMap::new();
        let mut search = Search::new(self, start, options);
        while let Some((_, step)) = search.step() {
            if let Some(parent) = step.parent {
                parents.insert(step.id, parent);
            }
            if step.id == target {
                let mut symbols = vec![target];
                let mut cursor = target;
                while let Some(parent) = parents.get(&cursor) {
                    symbols.push(*parent);
                    cursor = *parent;
                }
                symbols.reverse();
                return SymbolPath::try_from(symbols).map(Some);
            }
        }
        Ok(None)
    }
}
