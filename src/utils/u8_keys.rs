//! Search over the sorted first-byte keys of a node's children.
//!
//! All searches return an `isize`: a non-negative value is the index of the exact match, a
//! negative value is the bitwise-NOT of the position the byte would be inserted at to keep the
//! keys sorted. Callers use the miss encoding to place a new child without searching twice.
//!
//! Child counts in real key sets cluster on a handful of sizes: 1-3 for sparse branches, 10 for
//! decimal digits, 16 for hex, 32/65/95 for alphabetic, base64 and printable ASCII, and 256 once
//! every byte value is present. Those counts get a fixed-size search the compiler can fully
//! unroll. Every other count falls back to [`binary_find_child_index`], which is also the
//! reference behaviour the specialized forms must agree with.

use std::sync::atomic::{AtomicU8, Ordering};

/// Read access to a sorted array of key bytes.
pub trait ByteKeys {
    fn key_at(&self, idx: usize) -> u8;
}

impl ByteKeys for [u8] {
    #[inline(always)]
    fn key_at(&self, idx: usize) -> u8 {
        self[idx]
    }
}

/// Keys of a published child array. Slots below the published length are never rewritten
/// with a different byte, so a relaxed load is enough once the length has been acquired.
impl ByteKeys for [AtomicU8] {
    #[inline(always)]
    fn key_at(&self, idx: usize) -> u8 {
        self[idx].load(Ordering::Relaxed)
    }
}

#[inline(always)]
fn miss(insert_at: usize) -> isize {
    !(insert_at as isize)
}

/// Ordinary binary search over the first `num_children` keys.
pub fn binary_find_child_index<K: ByteKeys + ?Sized>(
    keys: &K,
    num_children: usize,
    key: u8,
) -> isize {
    let mut left = 0;
    let mut right = num_children;
    while left < right {
        let mid = (left + right) / 2;
        match keys.key_at(mid).cmp(&key) {
            std::cmp::Ordering::Less => left = mid + 1,
            std::cmp::Ordering::Equal => return mid as isize,
            std::cmp::Ordering::Greater => right = mid,
        }
    }
    miss(left)
}

#[inline(always)]
fn find_1<K: ByteKeys + ?Sized>(keys: &K, key: u8) -> isize {
    let k0 = keys.key_at(0);
    if key == k0 {
        0
    } else if key < k0 {
        miss(0)
    } else {
        miss(1)
    }
}

#[inline(always)]
fn find_2<K: ByteKeys + ?Sized>(keys: &K, key: u8) -> isize {
    let k0 = keys.key_at(0);
    if key <= k0 {
        return if key == k0 { 0 } else { miss(0) };
    }
    let k1 = keys.key_at(1);
    if key == k1 {
        1
    } else if key < k1 {
        miss(1)
    } else {
        miss(2)
    }
}

#[inline(always)]
fn find_3<K: ByteKeys + ?Sized>(keys: &K, key: u8) -> isize {
    let k1 = keys.key_at(1);
    if key == k1 {
        return 1;
    }
    if key < k1 {
        let k0 = keys.key_at(0);
        return if key == k0 {
            0
        } else if key < k0 {
            miss(0)
        } else {
            miss(1)
        };
    }
    let k2 = keys.key_at(2);
    if key == k2 {
        2
    } else if key < k2 {
        miss(2)
    } else {
        miss(3)
    }
}

/// Fixed-width search: `N` is a constant so the halving loop runs a known number of times and
/// unrolls into a straight comparison sequence.
#[inline(always)]
fn find_fixed<K: ByteKeys + ?Sized, const N: usize>(keys: &K, key: u8) -> isize {
    let mut base = 0;
    let mut size = N;
    while size > 1 {
        let half = size / 2;
        let mid = base + half;
        if keys.key_at(mid) <= key {
            base = mid;
        }
        size -= half;
    }
    let found = keys.key_at(base);
    if found == key {
        base as isize
    } else if found < key {
        miss(base + 1)
    } else {
        miss(base)
    }
}

/// A saturated node holds one child for every byte value, so the index is the byte itself.
#[inline(always)]
fn find_256(key: u8) -> isize {
    key as isize
}

/// Find `key` among the first `num_children` sorted keys.
#[inline]
pub fn find_child_index<K: ByteKeys + ?Sized>(keys: &K, num_children: usize, key: u8) -> isize {
    match num_children {
        0 => miss(0),
        1 => find_1(keys, key),
        2 => find_2(keys, key),
        3 => find_3(keys, key),
        10 => find_fixed::<K, 10>(keys, key),
        16 => find_fixed::<K, 16>(keys, key),
        32 => find_fixed::<K, 32>(keys, key),
        65 => find_fixed::<K, 65>(keys, key),
        95 => find_fixed::<K, 95>(keys, key),
        256 => find_256(key),
        _ => binary_find_child_index(keys, num_children, key),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU8;

    use rand::seq::SliceRandom;
    use rand::{thread_rng, Rng};

    use super::{binary_find_child_index, find_child_index};

    fn sorted_sample(count: usize) -> Vec<u8> {
        let mut all: Vec<u8> = (0..=255u8).collect();
        all.shuffle(&mut thread_rng());
        let mut keys = all[..count].to_vec();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn test_miss_encoding() {
        let keys = [b'1', b'3', b'5'];
        assert_eq!(find_child_index(&keys[..], 3, b'3'), 1);
        assert_eq!(find_child_index(&keys[..], 3, b'0'), !0);
        assert_eq!(find_child_index(&keys[..], 3, b'2'), !1);
        assert_eq!(find_child_index(&keys[..], 3, b'4'), !2);
        assert_eq!(find_child_index(&keys[..], 3, b'9'), !3);
        assert_eq!(find_child_index(&keys[..], 0, b'1'), !0);
    }

    #[test]
    fn test_decimal_digits() {
        let keys: Vec<u8> = (b'0'..=b'9').collect();
        for (i, &k) in keys.iter().enumerate() {
            assert_eq!(find_child_index(&keys[..], 10, k), i as isize);
        }
        assert_eq!(find_child_index(&keys[..], 10, b'/'), !0);
        assert_eq!(find_child_index(&keys[..], 10, b':'), !10);
    }

    #[test]
    fn test_saturated() {
        let keys: Vec<u8> = (0..=255u8).collect();
        for k in 0..=255u8 {
            assert_eq!(find_child_index(&keys[..], 256, k), k as isize);
        }
    }

    #[test]
    fn test_specialized_agree_with_binary_search() {
        let mut rng = thread_rng();
        for count in (0..=255).chain([10, 16, 32, 65, 95].into_iter()) {
            for _ in 0..8 {
                let keys = sorted_sample(count);
                for _ in 0..64 {
                    let needle: u8 = rng.gen();
                    assert_eq!(
                        find_child_index(&keys[..], count, needle),
                        binary_find_child_index(&keys[..], count, needle),
                        "count {count} needle {needle} keys {keys:?}"
                    );
                }
                for &k in &keys {
                    assert!(find_child_index(&keys[..], count, k) >= 0);
                }
            }
        }
    }

    #[test]
    fn test_atomic_keys() {
        let keys: Vec<AtomicU8> = [b'a', b'c', b'e', 0, 0]
            .into_iter()
            .map(AtomicU8::new)
            .collect();
        // Only the first three are published.
        assert_eq!(find_child_index(&keys[..], 3, b'e'), 2);
        assert_eq!(find_child_index(&keys[..], 3, 0), !0);
        assert_eq!(find_child_index(&keys[..], 3, b'f'), !3);
    }
}
