//! A concurrent radix tree for exact and prefix lookup over byte-string keys.
//!
//! [`RadixTree`] stores each key as a chain of byte segments, one per node, with the children of
//! every node kept sorted by their first byte. Lookups walk down comparing segments; prefix
//! searches walk down to the node covering the prefix and then enumerate its subtree in key
//! order.
//!
//! One writer and any number of readers may use a tree at the same time without locks: see
//! [`RadixTree`] for the rules.
//!
//! ```rust
//! use radix_prefix::{PrefixLookup, RadixTree};
//!
//! let tree: RadixTree<u32> = [("apple", 1), ("apply", 2), ("banana", 3)].into_iter().collect();
//! let values: Vec<u32> = tree.search_values("app").map(|v| *v).collect();
//! assert_eq!(values, vec![1, 2]);
//! assert!(RadixTree::<u32>::is_sorted());
//! ```

use std::sync::Arc;

pub mod iter;
pub mod mapping;
mod node;
pub mod partials;
pub mod stats;
mod tracing_helpers;
pub mod tree;
pub mod utils;

pub use crate::iter::{Iter, Values};
pub use crate::mapping::capacity::CapacityPolicy;
pub use crate::partials::key_segment::Key;
pub use crate::stats::{NodeStats, TreeStats, TreeStatsTrait};
pub use crate::tree::RadixTree;

/// How much concurrent access a lookup supports without external locking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Concurrency {
    /// No concurrent access at all.
    None,
    /// Many readers alongside a single writer.
    Read,
    /// Many writers, but reads must be serialized with them.
    Write,
    /// Any mix of readers and writers.
    Full,
}

/// The interface shared by prefix lookups.
pub trait PrefixLookup<V> {
    type Iter: Iterator<Item = (Key, Arc<V>)>;
    type Values: Iterator<Item = Arc<V>>;

    fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<Arc<V>>;

    /// Insert or overwrite, returning the value that was replaced.
    fn set<K: AsRef<[u8]>>(&self, key: K, value: V) -> Option<Arc<V>>;

    fn clear(&self);

    /// Number of entries.
    fn count(&self) -> usize;

    /// Entries whose key starts with `prefix`.
    fn search<K: AsRef<[u8]>>(&self, prefix: K) -> Self::Iter;

    /// Values of the entries whose key starts with `prefix`.
    fn search_values<K: AsRef<[u8]>>(&self, prefix: K) -> Self::Values;

    fn thread_safety() -> Concurrency
    where
        Self: Sized,
    {
        Concurrency::None
    }

    /// True if searches return keys in byte-lexicographic order.
    fn is_sorted() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// True if the lookup cannot be modified after it is built.
    fn is_immutable() -> bool
    where
        Self: Sized,
    {
        false
    }
}

impl<V> PrefixLookup<V> for RadixTree<V> {
    type Iter = Iter<V>;
    type Values = Values<V>;

    fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<Arc<V>> {
        RadixTree::get(self, key)
    }

    fn set<K: AsRef<[u8]>>(&self, key: K, value: V) -> Option<Arc<V>> {
        RadixTree::set(self, key, value)
    }

    fn clear(&self) {
        RadixTree::clear(self)
    }

    fn count(&self) -> usize {
        RadixTree::count(self)
    }

    fn search<K: AsRef<[u8]>>(&self, prefix: K) -> Iter<V> {
        RadixTree::search(self, prefix)
    }

    fn search_values<K: AsRef<[u8]>>(&self, prefix: K) -> Values<V> {
        RadixTree::search_values(self, prefix)
    }

    fn thread_safety() -> Concurrency {
        Concurrency::Read
    }

    fn is_sorted() -> bool {
        true
    }
}
