//! The radix tree façade.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::iter::{Iter, Values};
use crate::mapping::capacity::CapacityPolicy;
use crate::node::{NodeRef, RadixNode};
use crate::partials::key_segment::Key;
use crate::stats::{update_tree_stats, TreeStats, TreeStatsTrait};
use crate::tracing_helpers::debug_log;

/// A radix tree mapping byte-string keys to values, for exact and prefix lookup.
///
/// Keys are anything that can be viewed as bytes: `&str`, `String`, `&[u8]`, `Vec<u8>`. Each
/// inserted key is copied once into a shared buffer that the nodes created for it slice into,
/// and values are held behind an `Arc` so lookups hand them out without copying or locking.
///
/// # Concurrency
///
/// All methods take `&self`. Any number of threads may call [`get`](Self::get),
/// [`search`](Self::search) and the other read operations at the same time as **one** thread
/// calls [`set`](Self::set) or [`clear`](Self::clear). Readers never block and never observe a
/// partially applied insertion; an iterator keeps walking the version of each node it loaded
/// and may or may not see entries added after it started.
///
/// Writers must be serialized by the caller. Two concurrent writers cannot corrupt memory, but
/// one of their insertions may be lost.
///
/// ```rust
/// use radix_prefix::RadixTree;
///
/// let tree = RadixTree::new();
/// tree.set("1", 'A');
/// tree.set("10", 'B');
/// tree.set("100", 'C');
/// tree.set("11", 'D');
///
/// assert_eq!(tree.get("10").as_deref(), Some(&'B'));
/// let found: Vec<_> = tree
///     .search("10")
///     .map(|(k, v)| (k.to_string_lossy().into_owned(), *v))
///     .collect();
/// assert_eq!(found, vec![("10".to_string(), 'B'), ("100".to_string(), 'C')]);
/// assert_eq!(tree.search("99").count(), 0);
/// ```
pub struct RadixTree<V> {
    root: ArcSwap<RadixNode<V>>,
    policy: CapacityPolicy,
}

impl<V> Default for RadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RadixTree<V> {
    pub fn new() -> Self {
        Self::with_capacity_policy(CapacityPolicy::default())
    }

    /// Create a tree that sizes new children arrays with `policy`.
    pub fn with_capacity_policy(policy: CapacityPolicy) -> Self {
        Self {
            root: ArcSwap::from_pointee(RadixNode::new_root()),
            policy,
        }
    }

    /// Build a tree from `(key, value)` pairs, as if by calling [`set`](Self::set) for each in
    /// turn. Later duplicates win.
    pub fn create<K, I>(entries: I) -> Self
    where
        K: AsRef<[u8]>,
        I: IntoIterator<Item = (K, V)>,
    {
        let tree = Self::new();
        for (key, value) in entries {
            tree.set(key, value);
        }
        tree
    }

    pub fn capacity_policy(&self) -> CapacityPolicy {
        self.policy
    }

    #[inline]
    fn root(&self) -> NodeRef<V> {
        self.root.load_full()
    }

    /// Insert or overwrite the value at `key`, returning the value it replaced.
    ///
    /// Single writer only: see the concurrency notes on [`RadixTree`].
    pub fn set<K: AsRef<[u8]>>(&self, key: K, value: V) -> Option<Arc<V>> {
        self.set_arc(key, Arc::new(value))
    }

    /// [`set`](Self::set) for a value that is already shared.
    pub fn set_arc<K: AsRef<[u8]>>(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        RadixNode::set(&self.root, key.as_ref(), value, self.policy)
    }

    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<Arc<V>> {
        RadixNode::get(self.root(), key.as_ref())
    }

    pub fn contains_key<K: AsRef<[u8]>>(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Lazily iterate every entry whose key starts with `prefix`, in key order.
    pub fn search<K: AsRef<[u8]>>(&self, prefix: K) -> Iter<V> {
        Iter::new(RadixNode::find_prefix_match(self.root(), prefix.as_ref()))
    }

    /// Lazily iterate the values of every entry whose key starts with `prefix`, in key order.
    pub fn search_values<K: AsRef<[u8]>>(&self, prefix: K) -> Values<V> {
        Values::new(RadixNode::find_prefix_match(self.root(), prefix.as_ref()))
    }

    /// Append every entry whose key starts with `prefix` to `collector`, in key order.
    ///
    /// Walks the matching subtree eagerly. `collector` is not cleared first, so one buffer can
    /// be reused across calls.
    pub fn search_into<K: AsRef<[u8]>>(&self, prefix: K, collector: &mut Vec<(Key, Arc<V>)>) {
        if let Some(node) = RadixNode::find_prefix_match(self.root(), prefix.as_ref()) {
            node.collect_key_values(collector);
        }
    }

    /// Values-only form of [`search_into`](Self::search_into).
    pub fn search_values_into<K: AsRef<[u8]>>(&self, prefix: K, collector: &mut Vec<Arc<V>>) {
        if let Some(node) = RadixNode::find_prefix_match(self.root(), prefix.as_ref()) {
            node.collect_values(collector);
        }
    }

    /// Lazily iterate the whole tree in key order.
    pub fn iter(&self) -> Iter<V> {
        Iter::new(Some(self.root()))
    }

    pub fn values(&self) -> Values<V> {
        Values::new(Some(self.root()))
    }

    /// Number of entries. Walks the whole tree: O(n).
    pub fn count(&self) -> usize {
        self.values().count()
    }

    pub fn is_empty(&self) -> bool {
        let root = self.root();
        !root.has_value() && root.num_children() == 0
    }

    /// Drop every entry by publishing a fresh root. Readers already walking the old tree
    /// finish on it undisturbed.
    ///
    /// Single writer only: see the concurrency notes on [`RadixTree`].
    pub fn clear(&self) {
        debug_log!("replacing root");
        self.root.store(Arc::new(RadixNode::new_root()));
    }
}

impl<K: AsRef<[u8]>, V> FromIterator<(K, V)> for RadixTree<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::create(iter)
    }
}

impl<K: AsRef<[u8]>, V> Extend<(K, V)> for RadixTree<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<'a, V> IntoIterator for &'a RadixTree<V> {
    type Item = (Key, Arc<V>);
    type IntoIter = Iter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: Debug> Debug for RadixTree<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V> TreeStatsTrait for RadixTree<V> {
    fn get_tree_stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        let root = self.root();
        let mut stack = vec![(root, 1usize)];
        while let Some((node, height)) = stack.pop() {
            update_tree_stats(&mut stats, &node, height);
            if let Some(children) = node.children() {
                stack.extend(children.iter().map(|(_, child)| (child, height + 1)));
            }
        }
        stats.finish();
        stats
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use rand::seq::SliceRandom;
    use rand::{thread_rng, Rng};

    use crate::mapping::capacity::CapacityPolicy;
    use crate::tree::RadixTree;

    fn keys_of<V>(tree: &RadixTree<V>, prefix: &str) -> Vec<String> {
        tree.search(prefix)
            .map(|(k, _)| k.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_root_set_get() {
        let tree = RadixTree::new();
        assert!(tree.set("abc", 1).is_none());
        assert_eq!(tree.get("abc").as_deref(), Some(&1));
        assert_eq!(tree.get(b"abc".as_slice()).as_deref(), Some(&1));
        assert_eq!(tree.get(String::from("abc")).as_deref(), Some(&1));
    }

    #[test]
    fn test_string_keys_get_set() {
        let tree = RadixTree::new();
        tree.set("abcd", 1);
        tree.set("abc", 2);
        tree.set("abcde", 3);
        tree.set("xyz", 4);
        tree.set("xyz", 5);
        tree.set("axyz", 6);
        tree.set("1245zzz", 6);

        assert_eq!(*tree.get("abcd").unwrap(), 1);
        assert_eq!(*tree.get("abc").unwrap(), 2);
        assert_eq!(*tree.get("abcde").unwrap(), 3);
        assert_eq!(*tree.get("axyz").unwrap(), 6);
        assert_eq!(*tree.get("xyz").unwrap(), 5);
        assert_eq!(tree.get("ab"), None);
        assert_eq!(tree.get("abcdef"), None);
        assert_eq!(tree.count(), 6);
    }

    #[test]
    fn test_insert_returns_replaced_value() {
        let tree = RadixTree::new();
        assert_eq!(tree.set("key", 1), None);
        assert_eq!(tree.set("key", 2), Some(Arc::new(1)));
        assert_eq!(tree.set("key", 3).as_deref(), Some(&2));
        assert_eq!(tree.count(), 1);
    }

    #[test]
    fn test_example_scenario() {
        let tree = RadixTree::new();
        tree.set("1", "A");
        tree.set("10", "B");
        tree.set("100", "C");
        tree.set("11", "D");

        let found: Vec<(String, &str)> = tree
            .search("1")
            .map(|(k, v)| (k.to_string_lossy().into_owned(), *v))
            .collect();
        assert_eq!(
            found,
            vec![
                ("1".to_string(), "A"),
                ("10".to_string(), "B"),
                ("100".to_string(), "C"),
                ("11".to_string(), "D"),
            ]
        );
        assert_eq!(tree.get("10").as_deref(), Some(&"B"));
        assert_eq!(tree.search("99").count(), 0);
        assert_eq!(keys_of(&tree, "10"), vec!["10", "100"]);
        assert_eq!(keys_of(&tree, "100"), vec!["100"]);
        assert!(keys_of(&tree, "1000").is_empty());
    }

    #[test]
    fn test_search_inside_segment() {
        let tree = RadixTree::new();
        tree.set("romane", 1);
        tree.set("romanus", 2);
        tree.set("romulus", 3);
        tree.set("rubens", 4);

        assert_eq!(keys_of(&tree, "r").len(), 4);
        assert_eq!(keys_of(&tree, "rom"), vec!["romane", "romanus", "romulus"]);
        // "roma" ends inside the "an" segment.
        assert_eq!(keys_of(&tree, "roma"), vec!["romane", "romanus"]);
        assert_eq!(keys_of(&tree, "romanu"), vec!["romanus"]);
        assert!(keys_of(&tree, "romax").is_empty());
        assert!(keys_of(&tree, "s").is_empty());
    }

    #[test]
    fn test_empty_key_and_prefix() {
        let tree = RadixTree::new();
        tree.set("a", 1);
        tree.set("", 0);
        assert_eq!(tree.get("").as_deref(), Some(&0));
        assert_eq!(keys_of(&tree, ""), vec!["", "a"]);
        assert_eq!(tree.count(), 2);
    }

    #[test]
    fn test_search_into_appends() {
        let tree: RadixTree<u32> = ["apple", "apply", "banana"]
            .iter()
            .enumerate()
            .map(|(i, k)| (*k, i as u32))
            .collect();

        let mut collector = Vec::new();
        tree.search_into("app", &mut collector);
        tree.search_into("ban", &mut collector);
        tree.search_into("cherry", &mut collector);
        let keys: Vec<Vec<u8>> = collector.iter().map(|(k, _)| k.to_vec()).collect();
        assert_eq!(
            keys,
            vec![b"apple".to_vec(), b"apply".to_vec(), b"banana".to_vec()]
        );

        let mut values = vec![Arc::new(99)];
        tree.search_values_into("appl", &mut values);
        let values: Vec<u32> = values.iter().map(|v| **v).collect();
        assert_eq!(values, vec![99, 0, 1]);
    }

    #[test]
    fn test_clear() {
        let tree = RadixTree::new();
        for i in 0..100 {
            tree.set(i.to_string(), i);
        }
        let before = tree.iter();
        assert!(!tree.is_empty());
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.count(), 0);
        assert_eq!(tree.iter().count(), 0);
        // An iterator started before the clear still sees the old tree.
        assert_eq!(before.count(), 100);

        tree.set("fresh", 1);
        assert_eq!(tree.count(), 1);
        assert_eq!(keys_of(&tree, ""), vec!["fresh"]);
    }

    #[test]
    fn test_is_empty_with_only_empty_key() {
        let tree = RadixTree::new();
        assert!(tree.is_empty());
        tree.set("", ());
        assert!(!tree.is_empty());
    }

    #[test]
    fn test_extend_and_debug() {
        let mut tree = RadixTree::new();
        tree.extend([("b", 2), ("a", 1)]);
        assert_eq!(format!("{tree:?}"), r#"{Key("a"): 1, Key("b"): 2}"#);
        let keys: Vec<Vec<u8>> = (&tree).into_iter().map(|(k, _)| k.to_vec()).collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn test_binary_keys() {
        let tree = RadixTree::new();
        let keys: Vec<Vec<u8>> = vec![vec![0, 0], vec![0], vec![255, 1], vec![0, 255], vec![]];
        for (i, key) in keys.iter().enumerate() {
            tree.set(key, i);
        }
        let found: Vec<Vec<u8>> = tree.iter().map(|(k, _)| k.to_vec()).collect();
        let mut expected = keys.clone();
        expected.sort();
        assert_eq!(found, expected);
        assert_eq!(tree.search(&[0u8][..]).count(), 3);
    }

    #[test]
    fn test_exact_policy_matches_default() {
        let alphabet = RadixTree::new();
        let exact = RadixTree::with_capacity_policy(CapacityPolicy::Exact);
        assert_eq!(exact.capacity_policy(), CapacityPolicy::Exact);
        let mut rng = thread_rng();
        for i in 0..2000u32 {
            let key = format!("{:x}", rng.gen_range(0..100_000u32));
            alphabet.set(&key, i);
            exact.set(&key, i);
        }
        let a: Vec<_> = alphabet.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        let e: Vec<_> = exact.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        assert_eq!(a, e);
    }

    #[test]
    fn test_random_against_btreemap() {
        let tree = RadixTree::new();
        let mut model = BTreeMap::new();
        let mut rng = thread_rng();
        let mut keys: Vec<String> = (0..5000)
            .map(|_| {
                let len = rng.gen_range(0..8);
                (0..len)
                    .map(|_| char::from(b'a' + rng.gen_range(0..4u8)))
                    .collect()
            })
            .collect();
        keys.shuffle(&mut rng);

        for (i, key) in keys.iter().enumerate() {
            let previous = tree.set(key, i);
            assert_eq!(previous.map(|v| *v), model.insert(key.clone(), i));
        }
        assert_eq!(tree.count(), model.len());
        for (key, value) in &model {
            assert_eq!(tree.get(key).as_deref(), Some(value));
        }
        for prefix in ["", "a", "ab", "dd", "abca", "cccccccc"] {
            let expected: Vec<&String> =
                model.keys().filter(|k| k.starts_with(prefix)).collect();
            let found = keys_of(&tree, prefix);
            assert_eq!(found.iter().collect::<Vec<_>>(), expected, "prefix {prefix:?}");
        }
    }
}
