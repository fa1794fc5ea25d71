//! Hierarchical channel key tree (GGM / Subset-Cover derivation).
//!
//! A conceptual full binary tree of height `H`, 1-based level-order node
//! numbering (`root = 1`, children of `n` are `2n` and `2n+1`). Node `n`'s
//! key is derived lazily from the channel root by walking root-to-`n`
//! along `n`'s binary expansion, applying [`prf_l`]/[`prf_r`] at each
//! step; the tree itself is never materialized.
//!
//! Node numbers need up to `H + 1` bits (a leaf at height 64 is numbered
//! `2^64 + t`, which already overflows `u64` at `t = 0`), so every node
//! number in this module is a [`NodeNum`] (`u128`); the wire format for
//! serialized cover nodes follows suit.

use sat_core::constants::TREE_HEIGHT;
use sat_core::{Result, SatError};

use crate::primitives::{prf_l, prf_r, NodeKey};

/// A 1-based level-order tree node number. `u128` because leaves at
/// `H = 64` require up to 65 bits.
pub type NodeNum = u128;

/// A contiguous, inclusive leaf (timestamp) range, `(lo, hi)`.
pub type Cover = (u64, u64);

/// The channel key derivation tree for one channel.
///
/// Every operation here is a pure function of `(root, height)` — no
/// state is mutated and nothing is cached; the tree is never stored,
/// only walked, one root-to-node path at a time.
#[derive(Debug, Clone, Copy)]
pub struct ChannelKeyDerivation {
    root: NodeKey,
    height: u32,
}

impl ChannelKeyDerivation {
    /// Build a tree over the canonical height (`H = 64`).
    pub fn new(root: NodeKey) -> Self {
        Self::with_height(root, TREE_HEIGHT)
    }

    /// Build a tree over an explicit height, for testing against smaller
    /// trees or matching a fixed-height scenario from a test vector.
    pub fn with_height(root: NodeKey, height: u32) -> Self {
        Self { root, height }
    }

    /// Tree height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Depth of node `n`: `⌊log2 n⌋`, equivalently `bit_length(n) - 1`.
    fn depth(n: NodeNum) -> u32 {
        128 - n.leading_zeros() - 1
    }

    /// Leaf node number for timestamp `t`: `2^H + t`.
    fn leaf_node(&self, t: u64) -> NodeNum {
        (1u128 << self.height) + t as u128
    }

    /// `cover_of(n)` — the leaf range node `n` covers.
    pub fn cover_of(&self, n: NodeNum) -> Cover {
        let d = Self::depth(n) as u128;
        let h = self.height as u128;
        let level_index = n - (1u128 << d);
        let span = 1u128 << (h - d);
        let skipped = span * level_index;
        (skipped as u64, (skipped + span - 1) as u64)
    }

    /// `combined_cover(nodes)` — bounding box of the given nodes' covers:
    /// min of their `lo`s and max of their `hi`s. Equals the exact union
    /// only when `nodes` is a minimum cover (pairwise disjoint, contiguous).
    pub fn combined_cover(&self, nodes: &[NodeNum]) -> Result<Cover> {
        let mut iter = nodes.iter();
        let first = iter
            .next()
            .ok_or_else(|| SatError::range("cannot determine cover for an empty node list"))?;
        let (mut lo, mut hi) = self.cover_of(*first);
        for n in iter {
            let (node_lo, node_hi) = self.cover_of(*n);
            lo = lo.min(node_lo);
            hi = hi.max(node_hi);
        }
        Ok((lo, hi))
    }

    /// `minimum_cover(start, end)` — the minimum antichain of nodes whose
    /// leaf ranges partition `[start, end]` exactly.
    ///
    /// Implemented as a two-phase ascend/descend automaton: climb from the
    /// leaf at `start` while the parent's cover stays inside `[start, end]`;
    /// once it doesn't, hop to the right sibling and either keep climbing or
    /// start descending left-first until each emitted node's cover fits,
    /// then move right.
    pub fn minimum_cover(&self, start: u64, end: u64) -> Result<Vec<NodeNum>> {
        if start > end {
            return Err(SatError::range(format!(
                "start ({start}) must not exceed end ({end})"
            )));
        }
        let target: Cover = (start, end);
        let in_range = |r: Cover| r.0 >= target.0 && r.1 <= target.1;

        let mut nodes = Vec::new();
        let mut iter_node = self.leaf_node(start);
        let mut descending = false;

        loop {
            if !nodes.is_empty() && self.combined_cover(&nodes)? == target {
                break;
            }

            if !descending {
                let mut parent = iter_node;
                while parent > 1 && in_range(self.cover_of(parent / 2)) {
                    parent = parent / 2;
                }
                nodes.push(parent);

                if parent == 1 {
                    break;
                }

                iter_node = parent + 1;
                if !in_range(self.cover_of(iter_node)) {
                    descending = true;
                }
            } else {
                iter_node *= 2;
                while !in_range(self.cover_of(iter_node)) {
                    iter_node *= 2;
                }
                nodes.push(iter_node);
                iter_node += 1;
            }
        }

        Ok(nodes)
    }

    /// `key_at(n)` — walk from the channel root to node `n` along `n`'s
    /// binary expansion (most significant bit below the leading 1 first),
    /// applying `prf_l`/`prf_r` at each step.
    pub fn key_at(&self, n: NodeNum) -> NodeKey {
        let d = Self::depth(n);
        let mut key = self.root;
        for shift in (0..d).rev() {
            let bit = (n >> shift) & 1;
            key = if bit == 0 { prf_l(&key) } else { prf_r(&key) };
        }
        key
    }

    /// `leaf_key(t) = key_at(2^H + t)`.
    pub fn leaf_key(&self, t: u64) -> NodeKey {
        self.key_at(self.leaf_node(t))
    }
}

/// The decoder-side operation: find the unique node in `cover` whose leaf
/// range contains `t`, then derive subkeys down to leaf `t`.
///
/// Fails with [`SatError::NotCovered`] if no node in `cover` spans `t`.
pub fn key_for_timestamp_from_cover(
    height: u32,
    cover: &[(NodeNum, NodeKey)],
    t: u64,
) -> Result<NodeKey> {
    let leaf = (1u128 << height) + t as u128;
    let leaf_depth = height;

    for (node_num, node_key) in cover {
        let (lo, hi) = cover_of_with_height(height, *node_num);
        if t < lo || t > hi {
            continue;
        }

        let node_depth = 128 - node_num.leading_zeros() - 1;
        let mut key = *node_key;
        for shift in (0..(leaf_depth - node_depth)).rev() {
            let bit = (leaf >> shift) & 1;
            key = if bit == 0 { prf_l(&key) } else { prf_r(&key) };
        }
        return Ok(key);
    }

    Err(SatError::not_covered(format!(
        "timestamp {t} is not spanned by any node in the supplied cover"
    )))
}

fn cover_of_with_height(height: u32, n: NodeNum) -> Cover {
    let d = (128 - n.leading_zeros() - 1) as u128;
    let h = height as u128;
    let level_index = n - (1u128 << d);
    let span = 1u128 << (h - d);
    let skipped = span * level_index;
    (skipped as u64, (skipped + span - 1) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ChannelKeyDerivation {
        ChannelKeyDerivation::with_height(*b"1234567890123456", 64)
    }

    // Scenario 1: cover_of(1) == (0, 2^64 - 1).
    #[test]
    fn cover_of_root_spans_entire_timestamp_space() {
        let t = tree();
        assert_eq!(t.cover_of(1), (0, u64::MAX));
    }

    // Scenario 2: cover_of(6) == (2^62, 3*2^62 - 1).
    #[test]
    fn cover_of_node_six_matches_scenario() {
        let t = tree();
        let span = 1u64 << 62;
        assert_eq!(t.cover_of(6), (2 * span, 3 * span - 1));
    }

    // Scenario 3: minimum_cover(0, 2^64-1) == [1].
    #[test]
    fn minimum_cover_of_full_range_is_root() {
        let t = tree();
        let cover = t.minimum_cover(0, u64::MAX).unwrap();
        assert_eq!(cover, vec![1]);
    }

    // Scenario 4: minimum_cover(0, 2^62-1) == [4].
    #[test]
    fn minimum_cover_of_left_quarter_is_node_four() {
        let t = tree();
        let cover = t.minimum_cover(0, (1u64 << 62) - 1).unwrap();
        assert_eq!(cover, vec![4]);
    }

    // Scenario 5: minimum_cover(2^64-2, 2^64-1) is a single depth-63 node.
    #[test]
    fn minimum_cover_of_last_two_leaves_is_single_depth_63_node() {
        let t = tree();
        let cover = t.minimum_cover(u64::MAX - 1, u64::MAX).unwrap();
        assert_eq!(cover.len(), 1);
        let n = cover[0];
        let depth = 128 - n.leading_zeros() - 1;
        assert_eq!(depth, 63);
        assert_eq!(t.cover_of(n), (u64::MAX - 1, u64::MAX));
    }

    #[test]
    fn property_cover_span_matches_depth_formula() {
        let t = tree();
        for n in 1u128..=255 {
            let d = 128 - n.leading_zeros() - 1;
            let (lo, hi) = t.cover_of(n);
            assert_eq!(hi - lo + 1, 1u64 << (64 - d));
        }
    }

    #[test]
    fn property_minimum_cover_partitions_range_exactly() {
        let t = tree();
        let ranges: &[(u64, u64)] = &[
            (0, u64::MAX),
            (0, (1u64 << 62) - 1),
            (u64::MAX - 1, u64::MAX),
            (1000, 50_000),
            (12345, 12345),
        ];
        for &(start, end) in ranges {
            let cover = t.minimum_cover(start, end).unwrap();
            assert!(cover.len() <= 2 * 64 - 1);
            assert_eq!(t.combined_cover(&cover).unwrap(), (start, end));

            // Pairwise disjoint covers.
            let mut spans: Vec<Cover> = cover.iter().map(|&n| t.cover_of(n)).collect();
            spans.sort();
            for w in spans.windows(2) {
                assert!(w[0].1 < w[1].0, "covers must not overlap");
            }
        }
    }

    #[test]
    fn leaf_key_matches_key_at_leaf_node() {
        let t = tree();
        let leaf = (1u128 << 64) + 42u128;
        assert_eq!(t.leaf_key(42), t.key_at(leaf));
    }

    #[test]
    fn key_for_timestamp_from_cover_matches_direct_leaf_key() {
        let t = tree();
        let start = 1_000_000u64;
        let end = 1_050_000u64;
        let cover = t.minimum_cover(start, end).unwrap();
        let cover_keys: Vec<(NodeNum, NodeKey)> =
            cover.iter().map(|&n| (n, t.key_at(n))).collect();

        for ts in [start, start + 1, (start + end) / 2, end - 1, end] {
            let expected = t.leaf_key(ts);
            let actual = key_for_timestamp_from_cover(64, &cover_keys, ts).unwrap();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn key_for_timestamp_from_cover_rejects_uncovered_timestamp() {
        let t = tree();
        let cover = t.minimum_cover(1_000, 2_000).unwrap();
        let cover_keys: Vec<(NodeNum, NodeKey)> =
            cover.iter().map(|&n| (n, t.key_at(n))).collect();

        assert!(key_for_timestamp_from_cover(64, &cover_keys, 999).is_err());
        assert!(key_for_timestamp_from_cover(64, &cover_keys, 2_001).is_err());
    }

    #[test]
    fn minimum_cover_rejects_start_after_end() {
        let t = tree();
        assert!(t.minimum_cover(5, 4).is_err());
    }
}
