//! Property-based tests for scanner reference counting
//!
//! Random interleavings of search and location commands must leave the
//! foreground scanner running exactly when at least one consumer holds it.


use proptest::prelude::*;

use beeper_bridge::Channel;
use test_helpers::Harness;

#[derive(Debug, Clone, Copy)]
enum Op {
    Search,
    StopSearching,
    SubscribeLocations,
    UnsubscribeLocations,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Search),
        Just(Op::StopSearching),
        Just(Op::SubscribeLocations),
        Just(Op::UnsubscribeLocations),
    ]
}

fn apply(h: &Harness, op: Op) {
    let _results = match op {
        Op::Search => h.run("searchDevices", Some(r#"["tokenA"]"#)),
        Op::StopSearching => h.run("stopSearching", Some("stopped")),
        Op::SubscribeLocations => h.run("subscribeToLocations", None),
        Op::UnsubscribeLocations => h.run("unsubscribeFromLocations", None),
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The scanner runs iff a consumer holds it, and every consumer holds at
    /// most one reference.
    #[test]
    fn prop_scanner_follows_consumers(ops in prop::collection::vec(op_strategy(), 1..24)) {
        let h = Harness::ready();
        let mut searching = false;
        let mut locating = false;

        for op in ops {
            apply(&h, op);
            match op {
                Op::Search => searching = true,
                Op::StopSearching => searching = false,
                Op::SubscribeLocations => locating = true,
                Op::UnsubscribeLocations => locating = false,
            }

            let expected = usize::from(searching) + usize::from(locating);
            prop_assert_eq!(h.bridge.ref_count(), expected);
            prop_assert_eq!(h.scanner_running(), expected > 0);
            prop_assert_eq!(h.bridge.is_subscribed(Channel::DeviceEvents), searching);
            prop_assert_eq!(h.bridge.is_subscribed(Channel::LocationEvents), locating);

            prop_assert!(h.sdk.lockers.listener_count() <= 1);
            prop_assert!(h.sdk.locations.listener_count() <= 1);
        }
    }

    /// Starts and stops alternate: the scanner is never started twice in a row.
    #[test]
    fn prop_scanner_starts_and_stops_alternate(ops in prop::collection::vec(op_strategy(), 1..24)) {
        let h = Harness::ready();

        for op in ops {
            apply(&h, op);
            let starts = h.sdk.scanner.start_count();
            let stops = h.sdk.scanner.stop_count();
            prop_assert!(starts == stops || starts == stops + 1,
                "starts = {}, stops = {}", starts, stops);
        }
    }
}
