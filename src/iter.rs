use std::iter::FusedIterator;
use std::sync::Arc;

use crate::node::{Children, NodeRef};
use crate::partials::key_segment::Key;

/// Children of one node still to be visited.
struct Frame<V> {
    children: Arc<Children<V>>,
    idx: usize,
    len: usize,
}

/// Pre-order depth-first walk over the nodes below a collection root.
///
/// Keeps an explicit stack of partially visited children arrays instead of recursing, so a
/// suspended walk costs one frame per level. The length of each array is read once when its
/// frame is pushed: children appended after that are not visited by this walk.
struct Walk<V> {
    pending: Option<NodeRef<V>>,
    stack: Vec<Frame<V>>,
}

impl<V> Walk<V> {
    fn new(start: Option<NodeRef<V>>) -> Self {
        Self {
            pending: start,
            stack: Vec::new(),
        }
    }

    fn descend(&mut self, node: &NodeRef<V>) {
        if let Some(children) = node.children() {
            let len = children.num_children();
            if len > 0 {
                self.stack.push(Frame {
                    children: Arc::clone(children),
                    idx: 0,
                    len,
                });
            }
        }
    }

    fn next_node(&mut self) -> Option<NodeRef<V>> {
        if let Some(node) = self.pending.take() {
            self.descend(&node);
            return Some(node);
        }
        loop {
            let frame = self.stack.last_mut()?;
            if frame.idx >= frame.len {
                self.stack.pop();
                continue;
            }
            let idx = frame.idx;
            frame.idx += 1;
            let Some(child) = frame.children.child_at(idx) else {
                continue;
            };
            self.descend(&child);
            return Some(child);
        }
    }
}

/// Lazy iterator over `(key, value)` pairs in byte-lexicographic key order.
///
/// Returned by [`RadixTree::iter`](crate::tree::RadixTree::iter) and
/// [`RadixTree::search`](crate::tree::RadixTree::search). Single pass: a fresh call starts a
/// fresh walk.
pub struct Iter<V> {
    walk: Walk<V>,
}

impl<V> Iter<V> {
    pub(crate) fn new(start: Option<NodeRef<V>>) -> Self {
        Self {
            walk: Walk::new(start),
        }
    }
}

impl<V> Iterator for Iter<V> {
    type Item = (Key, Arc<V>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.walk.next_node()?;
            if let Some(value) = node.value() {
                return Some((node.full_key(), value));
            }
        }
    }
}

impl<V> FusedIterator for Iter<V> {}

/// Lazy iterator over values in key order, without materializing keys.
pub struct Values<V> {
    walk: Walk<V>,
}

impl<V> Values<V> {
    pub(crate) fn new(start: Option<NodeRef<V>>) -> Self {
        Self {
            walk: Walk::new(start),
        }
    }
}

impl<V> Iterator for Values<V> {
    type Item = Arc<V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.walk.next_node()?.value() {
                return Some(value);
            }
        }
    }
}

impl<V> FusedIterator for Values<V> {}
