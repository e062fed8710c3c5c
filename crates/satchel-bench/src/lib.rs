//! Workload profiles and utilities for benchmarking Satchel.
//!
//! Models the motivating workload: a tree traversal where every node
//! produces a handful of values and each parent gathers the values of its
//! whole subtree.
//!
//! - [`tree_profile`]: deterministic random tree via an LCG seed
//! - [`collect_with_bags`]: post-order collection through merged [`Bag`]s
//! - [`collect_with_vecs`]: the same traversal with `Vec::append`, as a baseline

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use satchel_arena::{Bag, SharedStorage};

/// One node of a [`TreeProfile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Values this node contributes.
    pub values: Vec<u32>,
    /// Indices of child nodes.
    pub children: Vec<usize>,
}

/// A rooted tree with per-node values. Node 0 is the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeProfile {
    /// All nodes; children always follow their parent.
    pub nodes: Vec<Node>,
}

impl TreeProfile {
    /// Total number of values over all nodes.
    pub fn value_count(&self) -> usize {
        self.nodes.iter().map(|n| n.values.len()).sum()
    }

    /// Length of the longest root-to-leaf path, in nodes.
    pub fn depth(&self) -> usize {
        let mut depth = vec![0usize; self.nodes.len()];
        let mut max = 0;
        // Children always have a higher index than their parent.
        for (i, node) in self.nodes.iter().enumerate() {
            if i == 0 {
                depth[0] = 1;
            }
            for &c in &node.children {
                depth[c] = depth[i] + 1;
            }
            max = max.max(depth[i]);
        }
        max
    }
}

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

/// Build a tree of `node_count` nodes where every node after the root picks
/// a random earlier node as its parent and carries `0..=max_values` values.
///
/// The same arguments always produce the same tree.
///
/// # Panics
///
/// Panics if `node_count` is zero.
pub fn tree_profile(node_count: usize, max_values: usize, seed: u64) -> TreeProfile {
    assert!(node_count > 0, "a tree needs at least its root");
    let mut rng = Lcg(seed);
    let mut nodes: Vec<Node> = Vec::with_capacity(node_count);
    let mut next_value = 0u32;
    for i in 0..node_count {
        let count = rng.below(max_values + 1);
        let values = (0..count)
            .map(|_| {
                next_value += 1;
                next_value
            })
            .collect();
        nodes.push(Node {
            values,
            children: Vec::new(),
        });
        if i > 0 {
            let parent = rng.below(i);
            nodes[parent].children.push(i);
        }
    }
    TreeProfile { nodes }
}

/// Collect every value of the tree into one bag living in `storage`.
///
/// Children are collected first and merged into the parent, then the
/// parent's own values are appended, so most merges take the adjacent path.
pub fn collect_with_bags(tree: &TreeProfile, storage: &SharedStorage<u32>) -> Bag<u32> {
    fn visit(tree: &TreeProfile, index: usize, storage: &SharedStorage<u32>) -> Bag<u32> {
        let node = &tree.nodes[index];
        let mut bag = Bag::new_in(storage);
        for &child in &node.children {
            bag.merge(visit(tree, child, storage));
        }
        bag.extend(node.values.iter().copied());
        bag
    }
    visit(tree, 0, storage)
}

/// Baseline: the same traversal gathering into owned `Vec`s.
pub fn collect_with_vecs(tree: &TreeProfile) -> Vec<u32> {
    fn visit(tree: &TreeProfile, index: usize) -> Vec<u32> {
        let node = &tree.nodes[index];
        let mut out = Vec::new();
        for &child in &node.children {
            let mut sub = visit(tree, child);
            out.append(&mut sub);
        }
        out.extend_from_slice(&node.values);
        out
    }
    visit(tree, 0)
}
