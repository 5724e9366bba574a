//! Sizing of freshly allocated child arrays.
//!
//! A node whose children array still has spare capacity can take a new trailing child in place;
//! anything else costs a copy-on-write replacement of the node. Rounding allocations up to the
//! size of a common key alphabet keeps those replacements rare while bounding the waste.

/// Largest number of children a node can have: one per byte value.
pub const MAX_CHILDREN: usize = 256;

/// Required child count -> allocated capacity, for every count a node can need.
static ALPHABET_CAPACITIES: [u16; MAX_CHILDREN + 1] = build_alphabet_table();

const fn alphabet_bucket(needed: usize) -> u16 {
    match needed {
        0 => 0,
        1 => 1,
        2..=3 => 4,
        // Decimal digits.
        4..=10 => 10,
        // Hex, GUIDs.
        11..=15 => 16,
        16..=31 => 32,
        // Base64 and friends.
        32..=64 => 65,
        // Printable ASCII.
        65..=94 => 95,
        95..=127 => 128,
        _ => 256,
    }
}

const fn build_alphabet_table() -> [u16; MAX_CHILDREN + 1] {
    let mut table = [0u16; MAX_CHILDREN + 1];
    let mut i = 0;
    while i <= MAX_CHILDREN {
        table[i] = alphabet_bucket(i);
        i += 1;
    }
    table
}

/// How much room to allocate when a node's children array has to be (re)built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// Round up to the bucket of the nearest common key alphabet.
    #[default]
    Alphabet,
    /// Allocate exactly what is needed. Every new child then replaces its parent.
    Exact,
}

impl CapacityPolicy {
    /// Capacity to allocate for an array that must hold `needed` children.
    #[inline]
    pub fn capacity_for(self, needed: usize) -> usize {
        debug_assert!(needed <= MAX_CHILDREN);
        match self {
            CapacityPolicy::Alphabet => ALPHABET_CAPACITIES[needed.min(MAX_CHILDREN)] as usize,
            CapacityPolicy::Exact => needed,
        }
    }
}
