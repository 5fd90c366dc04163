//! Resolve which tests of a class run, and in which order.

use trellis_core::filter_accepts;

use crate::registry::{ClassId, MetadataRegistry, TestDescriptor};

/// Runnable tests of `class` after filtering, sorted by effective order.
///
/// ## Parameters
/// - `tags`: active tag filter; matches against class tags and method tags together.
/// - `name_filter`: keep only tests whose method name or display name contains this substring.
///
/// ## Notes
/// - The sort is stable: tests with equal order keep their discovery order.
pub fn resolve_tests(
    registry: &MetadataRegistry,
    class: ClassId,
    tags: Option<&[String]>,
    name_filter: Option<&str>,
) -> Vec<TestDescriptor> {
    let metadata = registry.class_metadata(class).unwrap_or_default();
    let class_tags = metadata.tag_slice();

    let mut tests: Vec<TestDescriptor> = registry
        .tests(class)
        .into_iter()
        .filter(|t| t.options.is_runnable())
        .filter(|t| filter_accepts(tags, &class_tags, &t.options.tag_slice()))
        .filter(|t| match name_filter {
            Some(needle) => t.name.contains(needle) || t.display_name().contains(needle),
            None => true,
        })
        .collect();

    tests.sort_by_key(|t| t.options.effective_order());
    tests
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{ClassMetadata, TestOptions};

    struct Ordered;
    struct Tagged;

    fn names(tests: &[TestDescriptor]) -> Vec<&str> {
        tests.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_order_with_stable_ties() {
        let registry = MetadataRegistry::new();
        let class = ClassId::of::<Ordered>();
        registry.add_test(class, "unordered_a", TestOptions::new().test(), None);
        registry.add_test(class, "second", TestOptions::new().test().with_order(2), None);
        registry.add_test(class, "unordered_b", TestOptions::new().test(), None);
        registry.add_test(class, "first", TestOptions::new().test().with_order(1), None);
        registry.add_test(class, "also_second", TestOptions::new().test().with_order(2), None);
        registry.add_test(class, "explicit_default", TestOptions::new().test().with_order(999), None);

        let tests = resolve_tests(&registry, class, None, None);
        assert_eq!(
            names(&tests),
            ["first", "second", "also_second", "unordered_a", "unordered_b", "explicit_default"]
        );
    }

    #[test]
    fn test_non_runnable_descriptors_are_dropped() {
        let registry = MetadataRegistry::new();
        let class = ClassId::of::<Ordered>();
        registry.add_test(class, "helper", TestOptions::new().with_tags(["x"]), None);
        registry.add_test(class, "real", TestOptions::new().test(), None);
        assert_eq!(names(&resolve_tests(&registry, class, None, None)), ["real"]);
    }

    #[test]
    fn test_tag_filter_uses_class_and_method_tags() {
        let registry = MetadataRegistry::new();
        let class = ClassId::of::<Tagged>();
        registry.add_class_metadata(class, ClassMetadata::new().with_tags(["A"]));
        registry.add_test(class, "b_tagged", TestOptions::new().test().with_tags(["B"]), None);

        let filter = vec!["A".to_string()];
        assert_eq!(names(&resolve_tests(&registry, class, Some(&filter), None)), ["b_tagged"]);

        let other = vec!["C".to_string()];
        assert!(resolve_tests(&registry, class, Some(&other), None).is_empty());
    }

    #[test]
    fn test_name_filter_matches_substring() {
        let registry = MetadataRegistry::new();
        let class = ClassId::of::<Ordered>();
        registry.add_test(class, "insert_row", TestOptions::new().test(), None);
        registry.add_test(class, "delete_row", TestOptions::new().test(), None);
        registry.add_test(
            class,
            "misc",
            TestOptions::new().test().with_display_name("insert via display"),
            None,
        );
        assert_eq!(
            names(&resolve_tests(&registry, class, None, Some("insert"))),
            ["insert_row", "misc"]
        );
    }
}
