use std::borrow::{Borrow, Cow};
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::str::Utf8Error;
use std::sync::Arc;

use crate::partials::Partial;

/// A view of `length` bytes at `offset` into an immutable, shared key buffer.
///
/// The buffer holds exactly one inserted key. Every node created while inserting that key
/// references a disjoint segment of the same buffer, and `buffer[..offset]` is always the
/// concatenation of the segments on the path from the root down to this one. That makes the
/// full key of any node recoverable from its own segment without walking back up the tree.
#[derive(Clone)]
pub struct KeySegment {
    buffer: Arc<[u8]>,
    offset: usize,
    length: usize,
}

impl KeySegment {
    /// The segment of the root node.
    pub fn empty() -> Self {
        Self {
            buffer: Arc::from(&[][..]),
            offset: 0,
            length: 0,
        }
    }

    pub fn new(buffer: Arc<[u8]>, offset: usize, length: usize) -> Self {
        assert!(offset + length <= buffer.len());
        Self {
            buffer,
            offset,
            length,
        }
    }

    /// The segment running from `offset` to the end of `buffer`.
    pub fn tail_of(buffer: Arc<[u8]>, offset: usize) -> Self {
        let length = buffer.len() - offset;
        Self::new(buffer, offset, length)
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The key ending at this segment: every byte on the path from the root, this segment
    /// included.
    pub fn full_key(&self) -> Key {
        Key {
            buffer: Arc::clone(&self.buffer),
            length: self.offset + self.length,
        }
    }

    /// True if both segments are views into the same key buffer.
    pub fn shares_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }

    #[inline]
    fn to_slice(&self) -> &[u8] {
        &self.buffer[self.offset..self.offset + self.length]
    }
}

impl Partial for KeySegment {
    #[inline]
    fn partial_before(&self, length: usize) -> Self {
        assert!(length <= self.length);
        Self {
            buffer: Arc::clone(&self.buffer),
            offset: self.offset,
            length,
        }
    }

    #[inline]
    fn partial_after(&self, start: usize) -> Self {
        assert!(start <= self.length);
        Self {
            buffer: Arc::clone(&self.buffer),
            offset: self.offset + start,
            length: self.length - start,
        }
    }

    #[inline(always)]
    fn at(&self, pos: usize) -> u8 {
        assert!(pos < self.length);
        self.buffer[self.offset + pos]
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.length
    }
}

impl AsRef<[u8]> for KeySegment {
    fn as_ref(&self) -> &[u8] {
        self.to_slice()
    }
}

impl PartialEq for KeySegment {
    fn eq(&self, other: &Self) -> bool {
        self.shares_buffer(other) && self.offset == other.offset && self.length == other.length
            || self.to_slice() == other.to_slice()
    }
}
impl Eq for KeySegment {}

impl Debug for KeySegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeySegment[{}..{}]", self.offset, self.offset + self.length)?;
        write_hex(f, self.to_slice())
    }
}

/// A full key handed out by lookups and searches.
///
/// Shares the buffer of the node it was read from, so producing one never copies key bytes.
#[derive(Clone)]
pub struct Key {
    buffer: Arc<[u8]>,
    length: usize,
}

impl Key {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.length]
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Decodes the key as UTF-8.
    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl Deref for Key {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Borrow<[u8]> for Key {
    fn borrow(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}
impl Eq for Key {}

impl PartialEq<[u8]> for Key {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<&[u8]> for Key {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_bytes() == *other
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state)
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_str() {
            Ok(s) => write!(f, "Key({s:?})"),
            Err(_) => {
                write!(f, "Key")?;
                write_hex(f, self.as_bytes())
            }
        }
    }
}

fn write_hex(f: &mut Formatter<'_>, bytes: &[u8]) -> std::fmt::Result {
    write!(f, "[")?;
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{b:02x}")?;
    }
    write!(f, "]")
}
