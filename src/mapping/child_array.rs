use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::utils::u8_keys::find_child_index;

/// Children of a node, kept sorted by the first byte of each child's key segment.
///
/// `keys[i]` is the first byte of the child in `children[i]`. Only the first `num_children`
/// entries are live. The array is shared between one writer and any number of readers:
/// - a live slot is only ever replaced by a node with the same first byte (a split or a
///   copy-on-write replacement of that child), which is a single atomic store;
/// - a new child may be appended past the end while there is spare capacity, by writing the
///   key and slot first and then publishing the new count with `Release`.
///
/// Readers acquire the count once and never look past it, so they see either the array before
/// an append or after it, never a half-written entry. Insertions anywhere but the end build a
/// new array with [`ChildArray::copy_with_insert`] instead.
pub struct ChildArray<N> {
    keys: Box<[AtomicU8]>,
    children: Box<[ArcSwapOption<N>]>,
    num_children: AtomicUsize,
}

impl<N> ChildArray<N> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: (0..capacity).map(|_| AtomicU8::new(0)).collect(),
            children: (0..capacity).map(|_| ArcSwapOption::empty()).collect(),
            num_children: AtomicUsize::new(0),
        }
    }

    /// Build an array from entries already sorted by key.
    pub fn from_sorted(entries: Vec<(u8, Arc<N>)>, capacity: usize) -> Self {
        debug_assert!(entries.len() <= capacity);
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        let array = Self::with_capacity(capacity);
        let num_children = entries.len();
        for (i, (key, node)) in entries.into_iter().enumerate() {
            array.keys[i].store(key, Ordering::Relaxed);
            array.children[i].store(Some(node));
        }
        array.num_children.store(num_children, Ordering::Release);
        array
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.children.len()
    }

    #[inline(always)]
    pub fn num_children(&self) -> usize {
        self.num_children.load(Ordering::Acquire)
    }

    /// Index of the child starting with `key`, or the bitwise-NOT of where it would go.
    #[inline]
    pub fn find(&self, key: u8) -> isize {
        find_child_index(&self.keys[..], self.num_children(), key)
    }

    #[inline]
    pub fn key_at(&self, idx: usize) -> u8 {
        self.keys[idx].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn child_at(&self, idx: usize) -> Option<Arc<N>> {
        self.children.get(idx)?.load_full()
    }

    /// Publish `node` in place of the live child at `idx`. The first byte must not change.
    pub fn replace_child(&self, idx: usize, node: Arc<N>) -> Option<Arc<N>> {
        debug_assert!(idx < self.num_children());
        self.children[idx].swap(Some(node))
    }

    /// Append a child in place. Only valid for the single writer, and only succeeds when there
    /// is spare capacity and `key` sorts after every existing child; otherwise the node is
    /// handed back so the caller can fall back to a copy-on-write replacement.
    pub fn try_append(&self, key: u8, node: Arc<N>) -> Result<(), Arc<N>> {
        let len = self.num_children.load(Ordering::Acquire);
        if len >= self.capacity() {
            return Err(node);
        }
        if len > 0 && self.key_at(len - 1) >= key {
            return Err(node);
        }
        self.keys[len].store(key, Ordering::Relaxed);
        self.children[len].store(Some(node));
        self.num_children.store(len + 1, Ordering::Release);
        Ok(())
    }

    /// A new array of `capacity` slots holding the current children with `node` inserted at
    /// `idx`.
    pub fn copy_with_insert(&self, idx: usize, key: u8, node: Arc<N>, capacity: usize) -> Self {
        let len = self.num_children();
        debug_assert!(idx <= len);
        let mut entries = Vec::with_capacity(len + 1);
        entries.extend(self.iter().take(idx));
        entries.push((key, node));
        entries.extend(self.iter().skip(idx));
        Self::from_sorted(entries, capacity)
    }

    /// Move every child out, leaving the slots empty. Only for an array no reader can reach.
    pub fn take_children(&self) -> Vec<Arc<N>> {
        self.children.iter().filter_map(|slot| slot.swap(None)).collect()
    }

    /// Iterate the children present when the iterator was created.
    pub fn iter(&self) -> ChildArrayIter<'_, N> {
        ChildArrayIter {
            array: self,
            idx: 0,
            len: self.num_children(),
        }
    }
}

pub struct ChildArrayIter<'a, N> {
    array: &'a ChildArray<N>,
    idx: usize,
    len: usize,
}

impl<N> Iterator for ChildArrayIter<'_, N> {
    type Item = (u8, Arc<N>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < self.len {
            let i = self.idx;
            self.idx += 1;
            if let Some(child) = self.array.child_at(i) {
                return Some((self.array.key_at(i), child));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.len - self.idx))
    }
}
