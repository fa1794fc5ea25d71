//! Property tests for the channel key tree's cover algorithm.
//!
//! ## Properties Verified
//!
//! 1. `cover_of(n)` spans exactly `2^(H - depth(n))` leaves.
//! 2. `minimum_cover(start, end)`'s combined cover equals `(start, end)`
//!    exactly, with pairwise-disjoint, contiguous member covers.
//! 3. `|minimum_cover(start, end)| <= 2*H - 1`.
//! 4. Every timestamp in `[start, end]` recovers the same leaf key via
//!    `key_for_timestamp_from_cover` as via a direct `leaf_key` lookup.
//! 5. Timestamps outside `[start, end]` are rejected with `NotCoveredError`.

use proptest::prelude::*;
use sat_crypto::tree::{key_for_timestamp_from_cover, ChannelKeyDerivation, NodeNum};

const HEIGHT: u32 = 16;

fn tree() -> ChannelKeyDerivation {
    ChannelKeyDerivation::with_height([0x42; 16], HEIGHT)
}

fn depth_of(n: NodeNum) -> u32 {
    128 - n.leading_zeros() - 1
}

proptest! {
    /// Property 1: cover span matches the depth formula.
    #[test]
    fn prop_cover_span_matches_depth(n in 1u128..(1u128 << (HEIGHT + 1))) {
        let t = tree();
        let (lo, hi) = t.cover_of(n);
        let d = depth_of(n);
        prop_assert_eq!(hi - lo + 1, 1u64 << (HEIGHT - d));
    }

    /// Properties 2 and 3: minimum cover partitions the range exactly,
    /// with pairwise-disjoint members, and stays within the 2H-1 bound.
    #[test]
    fn prop_minimum_cover_partitions_range_exactly(
        start in 0u64..(1u64 << HEIGHT),
        len in 0u64..(1u64 << HEIGHT),
    ) {
        let t = tree();
        let max_leaf = (1u64 << HEIGHT) - 1;
        let end = (start + len).min(max_leaf);
        let start = start.min(end);

        let cover = t.minimum_cover(start, end).unwrap();
        prop_assert!(cover.len() <= 2 * HEIGHT as usize - 1);
        prop_assert_eq!(t.combined_cover(&cover).unwrap(), (start, end));

        let mut spans: Vec<(u64, u64)> = cover.iter().map(|&n| t.cover_of(n)).collect();
        spans.sort();
        for w in spans.windows(2) {
            prop_assert!(w[0].1 < w[1].0, "covers must not overlap");
        }
    }

    /// Property 4: key_for_timestamp_from_cover agrees with leaf_key for
    /// every timestamp inside the queried range.
    #[test]
    fn prop_covered_timestamp_recovers_leaf_key(
        start in 0u64..(1u64 << HEIGHT),
        len in 0u64..256u64,
        offset in 0u64..256u64,
    ) {
        let t = tree();
        let max_leaf = (1u64 << HEIGHT) - 1;
        let end = (start + len).min(max_leaf);
        let start = start.min(end);

        let cover = t.minimum_cover(start, end).unwrap();
        let cover_keys: Vec<(NodeNum, [u8; 16])> =
            cover.iter().map(|&n| (n, t.key_at(n))).collect();

        let ts = start + (offset % (end - start + 1));
        let expected = t.leaf_key(ts);
        let actual = key_for_timestamp_from_cover(HEIGHT, &cover_keys, ts).unwrap();
        prop_assert_eq!(actual, expected);
    }

    /// Property 5: a timestamp strictly past the queried range is rejected.
    #[test]
    fn prop_uncovered_timestamp_is_rejected(
        start in 1u64..((1u64 << HEIGHT) - 1),
        len in 0u64..64u64,
    ) {
        let t = tree();
        let max_leaf = (1u64 << HEIGHT) - 1;
        let end = (start + len).min(max_leaf - 1);
        let start = start.min(end);

        let cover = t.minimum_cover(start, end).unwrap();
        let cover_keys: Vec<(NodeNum, [u8; 16])> =
            cover.iter().map(|&n| (n, t.key_at(n))).collect();

        prop_assert!(key_for_timestamp_from_cover(HEIGHT, &cover_keys, end + 1).is_err());
    }
}
