//! Statistics and introspection.
//!
//! Reports how the tree's children arrays are sized and filled, which is what the choice of
//! [`CapacityPolicy`](crate::mapping::capacity::CapacityPolicy) trades off: spare slots cost
//! memory, missing slots cost a copy-on-write replacement on the next insertion.

use std::collections::BTreeMap;

use crate::node::RadixNode;

pub trait TreeStatsTrait {
    fn get_tree_stats(&self) -> TreeStats;
}

/// Totals for all inner nodes whose children array has the same capacity.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeStats {
    pub capacity: usize,
    pub total_nodes: usize,
    pub total_children: usize,
    /// Fraction of the allocated slots in use.
    pub density: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TreeStats {
    /// Inner nodes grouped by children array capacity.
    pub node_stats: BTreeMap<usize, NodeStats>,
    pub num_nodes: usize,
    pub num_leaves: usize,
    pub num_inner_nodes: usize,
    pub num_values: usize,
    /// Child slots allocated across every children array.
    pub total_slots: usize,
    /// Child slots holding a child.
    pub used_slots: usize,
    pub total_density: f64,
    /// Number of nodes on the longest root-to-leaf path, root included.
    pub max_height: usize,
}

impl TreeStats {
    pub(crate) fn finish(&mut self) {
        for ns in self.node_stats.values_mut() {
            let width = ns.capacity * ns.total_nodes;
            ns.density = if width == 0 {
                0.0
            } else {
                ns.total_children as f64 / width as f64
            };
        }
        self.total_density = if self.total_slots == 0 {
            0.0
        } else {
            self.used_slots as f64 / self.total_slots as f64
        };
    }
}

pub(crate) fn update_tree_stats<V>(tree_stats: &mut TreeStats, node: &RadixNode<V>, height: usize) {
    tree_stats.num_nodes += 1;
    tree_stats.max_height = tree_stats.max_height.max(height);
    if node.has_value() {
        tree_stats.num_values += 1;
    }

    let num_children = node.num_children();
    if num_children == 0 {
        tree_stats.num_leaves += 1;
        return;
    }
    tree_stats.num_inner_nodes += 1;

    let capacity = node.capacity();
    tree_stats.total_slots += capacity;
    tree_stats.used_slots += num_children;
    let ns = tree_stats
        .node_stats
        .entry(capacity)
        .or_insert_with(|| NodeStats {
            capacity,
            ..Default::default()
        });
    ns.total_nodes += 1;
    ns.total_children += num_children;
}
