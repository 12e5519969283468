/// Property-based tests for tiered minimum lengths
///
/// Property: a tier table resolves to the length of the highest non-negative
/// threshold the source's priority reaches, and to nothing below every one.
use confluo_protocol::CompleteLength;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_highest_reached_tier_wins(
        tiers in prop::collection::btree_map(-10i64..10, 0usize..8, 1..6),
        priority in -12i64..12,
    ) {
        let table = CompleteLength::Tiered(tiers.iter().rev().map(|(p, l)| (*p, *l)).collect());
        let expected = if priority < 0 {
            None
        } else {
            tiers.range(0..=priority).next_back().map(|(_, len)| *len)
        };
        prop_assert_eq!(table.resolve(priority), expected);
    }

    #[test]
    fn prop_fixed_ignores_priority(len in 0usize..10, priority in any::<i64>()) {
        prop_assert_eq!(CompleteLength::Fixed(len).resolve(priority), Some(len));
    }
}
