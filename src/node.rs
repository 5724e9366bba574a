use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};

use crate::mapping::capacity::CapacityPolicy;
use crate::mapping::child_array::ChildArray;
use crate::partials::key_segment::{Key, KeySegment};
use crate::partials::{common_prefix_length, Partial};
use crate::tracing_helpers::trace_log;

pub(crate) type NodeRef<V> = Arc<RadixNode<V>>;
pub(crate) type Children<V> = ChildArray<RadixNode<V>>;

/// A node of the radix tree.
///
/// The key segment and the children array reference are fixed for the life of the node; any
/// change to either is made by building a replacement node and publishing it into the slot the
/// old one occupied. The value slot is the one thing overwritten in place.
pub(crate) struct RadixNode<V> {
    pub(crate) segment: KeySegment,
    value: ArcSwapOption<V>,
    children: Option<Arc<Children<V>>>,
}

/// Where a node is published: the tree's root, or a slot in its parent's children array.
pub(crate) enum Slot<'a, V> {
    Root(&'a ArcSwap<RadixNode<V>>),
    Child(Arc<Children<V>>, usize),
}

impl<V> Slot<'_, V> {
    fn publish(&self, node: NodeRef<V>) {
        match self {
            Slot::Root(root) => root.store(node),
            Slot::Child(children, idx) => {
                children.replace_child(*idx, node);
            }
        }
    }
}

impl<V> RadixNode<V> {
    pub(crate) fn new_root() -> Self {
        Self::from_parts(KeySegment::empty(), None, None)
    }

    #[inline]
    pub(crate) fn new_leaf(segment: KeySegment, value: Arc<V>) -> Self {
        Self::from_parts(segment, Some(value), None)
    }

    fn from_parts(
        segment: KeySegment,
        value: Option<Arc<V>>,
        children: Option<Arc<Children<V>>>,
    ) -> Self {
        Self {
            segment,
            value: ArcSwapOption::new(value),
            children,
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<Arc<V>> {
        self.value.load_full()
    }

    #[inline]
    pub(crate) fn has_value(&self) -> bool {
        self.value.load().is_some()
    }

    /// Overwrite the value in place, returning the previous one.
    pub(crate) fn swap_value(&self, value: Arc<V>) -> Option<Arc<V>> {
        self.value.swap(Some(value))
    }

    pub(crate) fn children(&self) -> Option<&Arc<Children<V>>> {
        self.children.as_ref()
    }

    pub(crate) fn num_children(&self) -> usize {
        self.children.as_ref().map_or(0, |c| c.num_children())
    }

    pub(crate) fn capacity(&self) -> usize {
        self.children.as_ref().map_or(0, |c| c.capacity())
    }

    pub(crate) fn full_key(&self) -> Key {
        self.segment.full_key()
    }

    #[inline]
    fn find_child(&self, key: u8) -> isize {
        match &self.children {
            Some(children) => children.find(key),
            None => !0,
        }
    }

    #[inline]
    fn child_at(&self, idx: usize) -> Option<NodeRef<V>> {
        self.children.as_ref()?.child_at(idx)
    }

    /// Exact lookup of `key` below `root`.
    pub(crate) fn get(root: NodeRef<V>, key: &[u8]) -> Option<Arc<V>> {
        let mut node = root;
        let mut rest = key;
        loop {
            let Some(&first) = rest.first() else {
                return node.value();
            };
            let idx = node.find_child(first);
            if idx < 0 {
                return None;
            }
            let child = node.child_at(idx as usize)?;
            let matched = common_prefix_length(rest, child.segment.as_ref());
            if matched < child.segment.len() {
                // Either the key diverges inside the segment, or it ends inside it. A key ending
                // there would have split the segment when it was inserted.
                return None;
            }
            rest = &rest[matched..];
            node = child;
        }
    }

    /// The node at which every key starting with `prefix` lives: the first node whose path
    /// consumes the whole prefix, even if its own segment runs on past it.
    pub(crate) fn find_prefix_match(root: NodeRef<V>, prefix: &[u8]) -> Option<NodeRef<V>> {
        let mut node = root;
        let mut rest = prefix;
        loop {
            let Some(&first) = rest.first() else {
                return Some(node);
            };
            let idx = node.find_child(first);
            if idx < 0 {
                return None;
            }
            let child = node.child_at(idx as usize)?;
            let matched = common_prefix_length(rest, child.segment.as_ref());
            if matched == rest.len() {
                return Some(child);
            }
            if matched < child.segment.len() {
                return None;
            }
            rest = &rest[matched..];
            node = child;
        }
    }

    /// Insert or overwrite `key`. Must only be called by the single writer.
    ///
    /// Walks down from the root like [`RadixNode::get`]. Every structural change is built off to
    /// the side and made visible with one store into the slot the replaced node occupied, so a
    /// reader sees the tree either before or after the insertion.
    pub(crate) fn set(
        root: &ArcSwap<RadixNode<V>>,
        key: &[u8],
        value: Arc<V>,
        policy: CapacityPolicy,
    ) -> Option<Arc<V>> {
        let mut slot = Slot::Root(root);
        let mut node = root.load_full();
        let mut depth = 0;
        loop {
            let rest = &key[depth..];
            let Some(&first) = rest.first() else {
                // Only the empty key gets here; it lives on the root.
                return node.swap_value(value);
            };

            let found = node.find_child(first);
            if found < 0 {
                let leaf = RadixNode::new_leaf(KeySegment::tail_of(Arc::from(key), depth), value);
                node.insert_child(&slot, !found as usize, first, Arc::new(leaf), policy);
                return None;
            }

            let idx = found as usize;
            let (Some(children), Some(child)) = (node.children.clone(), node.child_at(idx)) else {
                unreachable!("child index {idx} found but not published");
            };
            let matched = common_prefix_length(rest, child.segment.as_ref());

            if matched == child.segment.len() {
                if matched == rest.len() {
                    return child.swap_value(value);
                }
                depth += matched;
                slot = Slot::Child(children, idx);
                node = child;
                continue;
            }

            let split_parent = if matched == rest.len() {
                // The key ends inside the child's segment: the split parent carries the value.
                child.split_at(matched, Some(value), None, policy)
            } else {
                // The key diverges inside the segment: the new leaf becomes the split parent's
                // second child, so the split and the insertion publish together.
                let leaf = RadixNode::new_leaf(
                    KeySegment::tail_of(Arc::from(key), depth + matched),
                    value,
                );
                child.split_at(matched, None, Some(Arc::new(leaf)), policy)
            };
            trace_log!(depth, matched, "split child segment");
            children.replace_child(idx, Arc::new(split_parent));
            return None;
        }
    }

    /// Split this node's segment after `at` bytes.
    ///
    /// Returns a new parent holding the first `at` bytes of the segment, with `value` and a
    /// clone of this node holding the rest of the segment as its child. The clone keeps this
    /// node's value and takes over its children array: this node is unreachable as soon as the
    /// returned parent is published. A `sibling` whose segment diverges from the clone's first
    /// byte is placed beside it in sorted order.
    pub(crate) fn split_at(
        &self,
        at: usize,
        value: Option<Arc<V>>,
        sibling: Option<NodeRef<V>>,
        policy: CapacityPolicy,
    ) -> RadixNode<V> {
        debug_assert!(at > 0 && at < self.segment.len());
        let remainder = self.segment.partial_after(at);
        let first = remainder.at(0);
        let grandchild = RadixNode::from_parts(remainder, self.value(), self.children.clone());

        let mut entries = vec![(first, Arc::new(grandchild))];
        if let Some(sibling) = sibling {
            let sibling_first = sibling.segment.at(0);
            debug_assert_ne!(sibling_first, first);
            if sibling_first < first {
                entries.insert(0, (sibling_first, sibling));
            } else {
                entries.push((sibling_first, sibling));
            }
        }
        let capacity = policy.capacity_for(entries.len());
        let children = ChildArray::from_sorted(entries, capacity);
        RadixNode::from_parts(
            self.segment.partial_before(at),
            value,
            Some(Arc::new(children)),
        )
    }

    /// Add `leaf` as the child at `idx`. Appends in place when the children array has room at
    /// the end; otherwise publishes a copy of this node with a larger array into `slot`.
    fn insert_child(
        &self,
        slot: &Slot<'_, V>,
        idx: usize,
        key: u8,
        leaf: NodeRef<V>,
        policy: CapacityPolicy,
    ) {
        let leaf = match &self.children {
            Some(children) if idx == children.num_children() => {
                match children.try_append(key, leaf) {
                    Ok(()) => {
                        trace_log!(idx, "appended child in place");
                        return;
                    }
                    Err(leaf) => leaf,
                }
            }
            _ => leaf,
        };

        let needed = self.num_children() + 1;
        let capacity = policy.capacity_for(needed);
        let children = match &self.children {
            Some(children) => children.copy_with_insert(idx, key, leaf, capacity),
            None => ChildArray::from_sorted(vec![(key, leaf)], capacity),
        };
        trace_log!(needed, capacity, "copy-on-write child array growth");
        let replacement = RadixNode::from_parts(
            self.segment.clone(),
            self.value(),
            Some(Arc::new(children)),
        );
        slot.publish(Arc::new(replacement));
    }

    /// Depth-first, pre-order collection of every entry at or below this node.
    pub(crate) fn collect_key_values(&self, collector: &mut Vec<(Key, Arc<V>)>) {
        if let Some(value) = self.value() {
            collector.push((self.full_key(), value));
        }
        if let Some(children) = &self.children {
            for (_, child) in children.iter() {
                child.collect_key_values(collector);
            }
        }
    }

    pub(crate) fn collect_values(&self, collector: &mut Vec<Arc<V>>) {
        if let Some(value) = self.value() {
            collector.push(value);
        }
        if let Some(children) = &self.children {
            for (_, child) in children.iter() {
                child.collect_values(collector);
            }
        }
    }
}

/// Tears a subtree down with a work list of children arrays instead of recursing once per level.
impl<V> Drop for RadixNode<V> {
    fn drop(&mut self) {
        let mut pending: Vec<Arc<Children<V>>> = self.children.take().into_iter().collect();
        while let Some(children) = pending.pop() {
            // Arrays still shared with a live node, or nodes another reader holds, are left to
            // whoever drops the last reference.
            let Some(children) = Arc::into_inner(children) else {
                continue;
            };
            for child in children.take_children() {
                if let Some(mut child) = Arc::into_inner(child) {
                    pending.extend(child.children.take());
                }
            }
        }
    }
}
