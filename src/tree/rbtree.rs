//! Red-black tree backend.
//!
//! Slot 0 of the arena is a shared black sentinel standing in for every
//! absent child and for the root's parent. The delete fix-up writes the
//! sentinel's parent link while it stands in for the removed position, so
//! it is a real slot rather than `None`.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{BalancedTree, InvariantViolation, NodeIdx, TreeShape, check_order};

const NIL: NodeIdx = 0;

/// Node colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Black,
}

struct RbNode<K, V> {
    /// `None` for the sentinel and for vacant slots.
    entry: Option<(K, V)>,
    color: Color,
    parent: NodeIdx,
    left: NodeIdx,
    right: NodeIdx,
}

impl<K, V> RbNode<K, V> {
    fn nil() -> Self {
        Self { entry: None, color: Color::Black, parent: NIL, left: NIL, right: NIL }
    }
}

/// Red-black binary search tree.
pub struct RbTree<K, V> {
    nodes: Vec<RbNode<K, V>>,
    free: Vec<NodeIdx>,
    root: NodeIdx,
    len: usize,
}

impl<K: Ord, V> RbTree<K, V> {
    pub fn new() -> Self {
        Self { nodes: vec![RbNode::nil()], free: Vec::new(), root: NIL, len: 0 }
    }

    /// Colour of a node; the sentinel is always black.
    pub fn color(&self, node: NodeIdx) -> Color {
        self.nodes[node].color
    }

    fn key(&self, node: NodeIdx) -> &K {
        &self.nodes[node].entry.as_ref().expect("red-black link points at an empty slot").0
    }

    fn alloc(&mut self, key: K, value: V, parent: NodeIdx) -> NodeIdx {
        let node = RbNode { entry: Some((key, value)), color: Color::Red, parent, left: NIL, right: NIL };
        self.len += 1;
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, idx: NodeIdx) -> V {
        let slot = std::mem::replace(&mut self.nodes[idx], RbNode::nil());
        self.free.push(idx);
        self.len -= 1;
        slot.entry.expect("red-black release of an empty slot").1
    }

    fn rotate_left(&mut self, x: NodeIdx) {
        let y = self.nodes[x].right;
        let inner = self.nodes[y].left;
        self.nodes[x].right = inner;
        if inner != NIL {
            self.nodes[inner].parent = x;
        }
        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        if parent == NIL {
            self.root = y;
        } else if x == self.nodes[parent].left {
            self.nodes[parent].left = y;
        } else {
            self.nodes[parent].right = y;
        }
        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    fn rotate_right(&mut self, x: NodeIdx) {
        let y = self.nodes[x].left;
        let inner = self.nodes[y].right;
        self.nodes[x].left = inner;
        if inner != NIL {
            self.nodes[inner].parent = x;
        }
        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        if parent == NIL {
            self.root = y;
        } else if x == self.nodes[parent].right {
            self.nodes[parent].right = y;
        } else {
            self.nodes[parent].left = y;
        }
        self.nodes[y].right = x;
        self.nodes[x].parent = y;
    }

    fn insert_fixup(&mut self, mut z: NodeIdx) {
        while self.color(self.nodes[z].parent) == Color::Red {
            let parent = self.nodes[z].parent;
            let grand = self.nodes[parent].parent;
            if parent == self.nodes[grand].left {
                let uncle = self.nodes[grand].right;
                if self.color(uncle) == Color::Red {
                    self.nodes[parent].color = Color::Black;
                    self.nodes[uncle].color = Color::Black;
                    self.nodes[grand].color = Color::Red;
                    z = grand;
                } else {
                    if z == self.nodes[parent].right {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let parent = self.nodes[z].parent;
                    let grand = self.nodes[parent].parent;
                    self.nodes[parent].color = Color::Black;
                    self.nodes[grand].color = Color::Red;
                    self.rotate_right(grand);
                }
            } else {
                let uncle = self.nodes[grand].left;
                if self.color(uncle) == Color::Red {
                    self.nodes[parent].color = Color::Black;
                    self.nodes[uncle].color = Color::Black;
                    self.nodes[grand].color = Color::Red;
                    z = grand;
                } else {
                    if z == self.nodes[parent].left {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let parent = self.nodes[z].parent;
                    let grand = self.nodes[parent].parent;
                    self.nodes[parent].color = Color::Black;
                    self.nodes[grand].color = Color::Red;
                    self.rotate_left(grand);
                }
            }
        }
        let root = self.root;
        self.nodes[root].color = Color::Black;
    }

    /// Replace the subtree at `u` with the subtree at `v` in `u`'s parent.
    fn transplant(&mut self, u: NodeIdx, v: NodeIdx) {
        let parent = self.nodes[u].parent;
        if parent == NIL {
            self.root = v;
        } else if u == self.nodes[parent].left {
            self.nodes[parent].left = v;
        } else {
            self.nodes[parent].right = v;
        }
        // Deliberately also written when `v` is the sentinel.
        self.nodes[v].parent = parent;
    }

    fn minimum(&self, mut node: NodeIdx) -> NodeIdx {
        while self.nodes[node].left != NIL {
            node = self.nodes[node].left;
        }
        node
    }

    fn delete_fixup(&mut self, mut x: NodeIdx) {
        while x != self.root && self.color(x) == Color::Black {
            let parent = self.nodes[x].parent;
            if x == self.nodes[parent].left {
                let mut w = self.nodes[parent].right;
                if self.color(w) == Color::Red {
                    self.nodes[w].color = Color::Black;
                    self.nodes[parent].color = Color::Red;
                    self.rotate_left(parent);
                    w = self.nodes[self.nodes[x].parent].right;
                }
                if self.color(self.nodes[w].left) == Color::Black
                    && self.color(self.nodes[w].right) == Color::Black
                {
                    self.nodes[w].color = Color::Red;
                    x = self.nodes[x].parent;
                } else {
                    if self.color(self.nodes[w].right) == Color::Black {
                        let near = self.nodes[w].left;
                        self.nodes[near].color = Color::Black;
                        self.nodes[w].color = Color::Red;
                        self.rotate_right(w);
                        w = self.nodes[self.nodes[x].parent].right;
                    }
                    let parent = self.nodes[x].parent;
                    self.nodes[w].color = self.color(parent);
                    self.nodes[parent].color = Color::Black;
                    let far = self.nodes[w].right;
                    self.nodes[far].color = Color::Black;
                    self.rotate_left(parent);
                    x = self.root;
                }
            } else {
                let mut w = self.nodes[parent].left;
                if self.color(w) == Color::Red {
                    self.nodes[w].color = Color::Black;
                    self.nodes[parent].color = Color::Red;
                    self.rotate_right(parent);
                    w = self.nodes[self.nodes[x].parent].left;
                }
                if self.color(self.nodes[w].right) == Color::Black
                    && self.color(self.nodes[w].left) == Color::Black
                {
                    self.nodes[w].color = Color::Red;
                    x = self.nodes[x].parent;
                } else {
                    if self.color(self.nodes[w].left) == Color::Black {
                        let near = self.nodes[w].right;
                        self.nodes[near].color = Color::Black;
                        self.nodes[w].color = Color::Red;
                        self.rotate_left(w);
                        w = self.nodes[self.nodes[x].parent].left;
                    }
                    let parent = self.nodes[x].parent;
                    self.nodes[w].color = self.color(parent);
                    self.nodes[parent].color = Color::Black;
                    let far = self.nodes[w].left;
                    self.nodes[far].color = Color::Black;
                    self.rotate_right(parent);
                    x = self.root;
                }
            }
        }
        self.nodes[x].color = Color::Black;
    }

    /// Returns the verified black-height of the subtree at `node`.
    fn check_subtree(&self, node: NodeIdx) -> Result<usize, InvariantViolation> {
        if node == NIL {
            return Ok(1);
        }
        let n = &self.nodes[node];
        for child in [n.left, n.right] {
            if child != NIL && self.nodes[child].parent != node {
                return Err(InvariantViolation::BrokenParent { at: child });
            }
        }
        if n.color == Color::Red
            && (self.color(n.left) == Color::Red || self.color(n.right) == Color::Red)
        {
            return Err(InvariantViolation::RedRed { at: node });
        }
        let left = self.check_subtree(n.left)?;
        let right = self.check_subtree(n.right)?;
        if left != right {
            return Err(InvariantViolation::BlackHeight { at: node, left, right });
        }
        Ok(left + usize::from(n.color == Color::Black))
    }
}

impl<K: Ord, V> Default for RbTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TreeShape<K, V> for RbTree<K, V> {
    fn root(&self) -> Option<NodeIdx> {
        (self.root != NIL).then_some(self.root)
    }

    fn left(&self, node: NodeIdx) -> Option<NodeIdx> {
        let left = self.nodes[node].left;
        (left != NIL).then_some(left)
    }

    fn right(&self, node: NodeIdx) -> Option<NodeIdx> {
        let right = self.nodes[node].right;
        (right != NIL).then_some(right)
    }

    fn entry(&self, node: NodeIdx) -> (&K, &V) {
        let (key, value) = self.nodes[node].entry.as_ref().expect("red-black entry of an empty slot");
        (key, value)
    }
}

impl<K: Ord, V> BalancedTree<K, V> for RbTree<K, V> {
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut parent = NIL;
        let mut cursor = self.root;
        let mut went_left = false;
        while cursor != NIL {
            parent = cursor;
            match key.cmp(self.key(cursor)) {
                Ordering::Less => {
                    cursor = self.nodes[cursor].left;
                    went_left = true;
                }
                Ordering::Greater => {
                    cursor = self.nodes[cursor].right;
                    went_left = false;
                }
                Ordering::Equal => {
                    let slot = self.nodes[cursor].entry.as_mut().expect("red-black link points at an empty slot");
                    return Some(std::mem::replace(&mut slot.1, value));
                }
            }
        }

        let z = self.alloc(key, value, parent);
        if parent == NIL {
            self.root = z;
        } else if went_left {
            self.nodes[parent].left = z;
        } else {
            self.nodes[parent].right = z;
        }
        self.insert_fixup(z);
        None
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let z = super::locate(self, key)?;

        let mut removed_color = self.color(z);
        let x;
        if self.nodes[z].left == NIL {
            x = self.nodes[z].right;
            self.transplant(z, x);
        } else if self.nodes[z].right == NIL {
            x = self.nodes[z].left;
            self.transplant(z, x);
        } else {
            let y = self.minimum(self.nodes[z].right);
            removed_color = self.color(y);
            x = self.nodes[y].right;
            if self.nodes[y].parent == z {
                self.nodes[x].parent = y;
            } else {
                self.transplant(y, x);
                let right = self.nodes[z].right;
                self.nodes[y].right = right;
                self.nodes[right].parent = y;
            }
            self.transplant(z, y);
            let left = self.nodes[z].left;
            self.nodes[y].left = left;
            self.nodes[left].parent = y;
            self.nodes[y].color = self.color(z);
        }

        if removed_color == Color::Black {
            self.delete_fixup(x);
        }
        self.nodes[NIL].parent = NIL;
        Some(self.release(z))
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[NIL] = RbNode::nil();
        self.free.clear();
        self.root = NIL;
        self.len = 0;
    }

    fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeIdx, usize)> = self.root().map(|r| vec![(r, 1)]).unwrap_or_default();
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(self.left(node).map(|c| (c, depth + 1)));
            stack.extend(self.right(node).map(|c| (c, depth + 1)));
        }
        deepest
    }

    fn validate(&self) -> Result<(), InvariantViolation> {
        check_order(self, self.len)?;
        if self.color(NIL) != Color::Black {
            return Err(InvariantViolation::RedRed { at: NIL });
        }
        if self.color(self.root) == Color::Red {
            return Err(InvariantViolation::RedRoot);
        }
        if self.root != NIL && self.nodes[self.root].parent != NIL {
            return Err(InvariantViolation::BrokenParent { at: self.root });
        }
        self.check_subtree(self.root).map(|_| ())
    }
}
