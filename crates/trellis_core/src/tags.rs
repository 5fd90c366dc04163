//! Tag filter semantics.
//!
//! A test is retained by a tag filter when the filter shares at least one tag with the union of
//! the class's tags and the method's own tags.

use std::collections::HashSet;

/// Check whether two tag collections share at least one element.
///
/// The smaller side is turned into a lookup set and the larger side probes it, so the check stays
/// near-linear whichever side is larger.
///
/// ## Examples
/// ```rust
/// use trellis_core::intersects;
///
/// assert!(intersects(&["db", "slow"], &["slow"]));
/// assert!(!intersects(&["db"], &["net", "fs"]));
/// assert!(!intersects::<&str, &str>(&[], &["net"]));
/// ```
pub fn intersects<L, R>(left: &[L], right: &[R]) -> bool
where
    L: AsRef<str>,
    R: AsRef<str>,
{
    if left.is_empty() || right.is_empty() {
        return false;
    }

    if left.len() <= right.len() {
        let lookup: HashSet<&str> = left.iter().map(AsRef::as_ref).collect();
        right.iter().any(|tag| lookup.contains(tag.as_ref()))
    } else {
        let lookup: HashSet<&str> = right.iter().map(AsRef::as_ref).collect();
        left.iter().any(|tag| lookup.contains(tag.as_ref()))
    }
}

/// Decide whether a test passes the tag filter.
///
/// ## Parameters
/// - `filter`: active filter; `None` accepts everything.
/// - `class_tags`: tags attached to the test's class.
/// - `method_tags`: tags attached to the test method.
///
/// ## Notes
/// - An active filter rejects a test with no tags in an untagged class.
pub fn filter_accepts<F>(filter: Option<&[F]>, class_tags: &[&str], method_tags: &[&str]) -> bool
where
    F: AsRef<str>,
{
    let Some(filter) = filter else {
        return true;
    };

    let mut owned: Vec<&str> = Vec::with_capacity(class_tags.len() + method_tags.len());
    owned.extend_from_slice(class_tags);
    owned.extend_from_slice(method_tags);
    intersects(filter, &owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_tag_admits_untagged_method_tag() {
        assert!(filter_accepts(Some(&["A"][..]), &["A"], &["B"]));
    }

    #[test]
    fn test_foreign_class_tag_excludes() {
        assert!(!filter_accepts(Some(&["A"][..]), &["C"], &["B"]));
    }

    #[test]
    fn test_untagged_is_excluded_once_filter_active() {
        assert!(!filter_accepts(Some(&["A"][..]), &[], &[]));
    }

    #[test]
    fn test_no_filter_accepts_everything() {
        assert!(filter_accepts::<&str>(None, &[], &[]));
    }

    #[test]
    fn test_intersects_both_size_orders() {
        let big = ["a", "b", "c", "d", "e"];
        assert!(intersects(&big, &["e"]));
        assert!(intersects(&["e"], &big));
        assert!(!intersects(&big, &["z"]));
    }
}
