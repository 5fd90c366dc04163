//! Property-based tests for scheduling and metadata merging
//!
//! These tests use proptest to verify invariants across many randomly
//! generated registrations.

use proptest::prelude::*;
use trellis::runner::resolve_tests;
use trellis::{ClassId, DEFAULT_ORDER, MetadataRegistry, TestOptions};

struct Subject;

fn order_strategy() -> impl Strategy<Value = Option<i64>> {
    prop_oneof![Just(None), (-3i64..4).prop_map(Some), Just(Some(DEFAULT_ORDER))]
}

proptest! {
    /// Property: resolved tests are a stable sort of discovery order by effective order
    #[test]
    fn resolution_is_a_stable_sort(orders in prop::collection::vec(order_strategy(), 0..12)) {
        let registry = MetadataRegistry::new();
        let class = ClassId::of::<Subject>();
        for (i, order) in orders.iter().enumerate() {
            let mut options = TestOptions::new().test();
            if let Some(order) = order {
                options = options.with_order(*order);
            }
            registry.add_test(class, &format!("t{i}"), options, None);
        }

        let mut expected: Vec<(i64, String)> = orders
            .iter()
            .enumerate()
            .map(|(i, o)| (o.unwrap_or(DEFAULT_ORDER), format!("t{i}")))
            .collect();
        expected.sort_by_key(|(order, _)| *order);
        let expected: Vec<String> = expected.into_iter().map(|(_, name)| name).collect();

        let resolved: Vec<String> = resolve_tests(&registry, class, None, None)
            .into_iter()
            .map(|t| t.name)
            .collect();
        prop_assert_eq!(resolved, expected);
    }

    /// Property: repeated annotation keeps the first value set for every field
    #[test]
    fn merge_keeps_first_set_value(
        orders in prop::collection::vec(prop::option::of(0i64..100), 1..6),
        timeouts in prop::collection::vec(0u64..50, 1..6),
    ) {
        let registry = MetadataRegistry::new();
        let class = ClassId::of::<Subject>();
        for order in &orders {
            let mut options = TestOptions::new().test();
            if let Some(order) = order {
                options = options.with_order(*order);
            }
            registry.add_test(class, "merged", options, None);
        }
        for timeout in &timeouts {
            registry.add_test(class, "merged", TestOptions::new().with_timeout_ms(*timeout), None);
        }

        let tests = registry.tests(class);
        prop_assert_eq!(tests.len(), 1);
        let options = &tests[0].options;
        prop_assert_eq!(options.order, orders.iter().flatten().next().copied());
        prop_assert_eq!(
            options.timeout_ms.map(|t| t.get()),
            timeouts.iter().copied().find(|t| *t > 0)
        );
    }
}
