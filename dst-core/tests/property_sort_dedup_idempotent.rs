//! Idempotence: running `ErrorList::sort_and_dedup` twice on the same
//! list is a no-op after the first call, and the entry count never
//! increases across either call, for any input list of (address,
//! status) pairs including duplicate addresses with differing statuses.

use dst_core::{ErrorList, RepairStatus};
use proptest::prelude::*;

fn a_status() -> impl Strategy<Value = RepairStatus> {
    prop_oneof![
        Just(RepairStatus::NotRepaired),
        Just(RepairStatus::RepairFailed),
        Just(RepairStatus::Repaired),
        Just(RepairStatus::RepairNotRequired),
        Just(RepairStatus::AccessDenied),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn sort_and_dedup_converges_and_never_grows(
        entries in prop::collection::vec((any::<u64>(), a_status()), 0..64),
    ) {
        let mut list = ErrorList::new();
        for (address, status) in &entries {
            list.push(*address, *status);
        }
        let before = list.len();

        list.sort_and_dedup();
        let after_first = list.len();
        prop_assert!(after_first <= before);

        let addresses: Vec<u64> = list.entries().iter().map(|e| e.address).collect();
        prop_assert!(addresses.windows(2).all(|w| w[0] < w[1]), "not strictly sorted and deduplicated");

        let first_pass: Vec<_> = list.entries().to_vec();
        list.sort_and_dedup();
        prop_assert_eq!(list.entries(), first_pass.as_slice());
        prop_assert!(list.len() <= after_first);
    }
}
