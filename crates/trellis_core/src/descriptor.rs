//! Typed shape of test method and test class configuration.
//!
//! Every option is stored as an `Option` so that repeated annotation of the same method (or class)
//! can be merged field by field: a field that is already set is never overwritten, a field that is
//! still unset is filled from the newer annotation. This is the "first-set-wins" policy shared by
//! [`TestOptions::merge_missing`] and [`ClassMetadata::merge_missing`].

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

/// Effective order of a test that never had an explicit order.
pub const DEFAULT_ORDER: i64 = 999;

/// Execution context a test may be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    #[default]
    Server,
    Client,
}

impl Environment {
    /// Return the canonical lowercase spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Server => "server",
            Environment::Client => "client",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown environment name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEnvironment(pub String);

impl fmt::Display for UnknownEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown environment `{}` (expected `server` or `client`)", self.0)
    }
}

impl std::error::Error for UnknownEnvironment {}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Environment::Server),
            "client" => Ok(Environment::Client),
            other => Err(UnknownEnvironment(other.to_string())),
        }
    }
}

/// Disabled state of a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disabled {
    pub value: bool,
    pub message: Option<String>,
}

impl Disabled {
    /// A disabled marker with an optional reason.
    pub fn with_message(message: Option<String>) -> Self {
        Self { value: true, message }
    }
}

/// Set of tags attached to a test or a class. Insertion order is irrelevant.
pub type TagSet = BTreeSet<String>;

/// Mutable configuration of a single test method.
///
/// ## Notes
/// - `is_a_test` must resolve to `true` for the method to be scheduled; annotating a method with
///   only tags or an order registers a descriptor but does not make it runnable.
/// - Use [`TestOptions::effective_order`] rather than reading `order` directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestOptions {
    pub is_a_test: Option<bool>,
    pub display_name: Option<String>,
    pub tags: Option<TagSet>,
    pub order: Option<i64>,
    pub timeout_ms: Option<NonZeroU64>,
    pub disabled: Option<Disabled>,
    pub environment: Option<Environment>,
    pub negated: Option<bool>,
}

impl TestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the method as a runnable test.
    pub fn test(mut self) -> Self {
        self.is_a_test = Some(true);
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Set a timeout in milliseconds. A zero timeout is treated as "no timeout".
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = NonZeroU64::new(timeout_ms);
        self
    }

    pub fn with_disabled(mut self, message: Option<String>) -> Self {
        self.disabled = Some(Disabled::with_message(message));
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_negated(mut self, negated: bool) -> Self {
        self.negated = Some(negated);
        self
    }

    /// Fill every unset field from `newer`; fields that are already set keep their value.
    ///
    /// ## Examples
    /// ```rust
    /// use trellis_core::TestOptions;
    ///
    /// let mut first = TestOptions::new().with_order(1);
    /// first.merge_missing(TestOptions::new().with_order(5).with_negated(true));
    /// assert_eq!(first.order, Some(1));
    /// assert_eq!(first.negated, Some(true));
    /// ```
    pub fn merge_missing(&mut self, newer: TestOptions) {
        fill(&mut self.is_a_test, newer.is_a_test);
        fill(&mut self.display_name, newer.display_name);
        fill(&mut self.tags, newer.tags);
        fill(&mut self.order, newer.order);
        fill(&mut self.timeout_ms, newer.timeout_ms);
        fill(&mut self.disabled, newer.disabled);
        fill(&mut self.environment, newer.environment);
        fill(&mut self.negated, newer.negated);
    }

    pub fn is_runnable(&self) -> bool {
        self.is_a_test == Some(true)
    }

    pub fn effective_order(&self) -> i64 {
        self.order.unwrap_or(DEFAULT_ORDER)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.as_ref().is_some_and(|d| d.value)
    }

    pub fn is_negated(&self) -> bool {
        self.negated == Some(true)
    }

    /// Tags of this method, empty when none were set.
    pub fn tag_slice(&self) -> Vec<&str> {
        self.tags
            .iter()
            .flat_map(|tags| tags.iter().map(String::as_str))
            .collect()
    }
}

/// Aggregate properties of a test class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMetadata {
    pub display_name: Option<String>,
    pub tags: Option<TagSet>,
}

impl ClassMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Field-level merge-if-absent, same policy as [`TestOptions::merge_missing`].
    pub fn merge_missing(&mut self, newer: ClassMetadata) {
        fill(&mut self.display_name, newer.display_name);
        fill(&mut self.tags, newer.tags);
    }

    pub fn tag_slice(&self) -> Vec<&str> {
        self.tags
            .iter()
            .flat_map(|tags| tags.iter().map(String::as_str))
            .collect()
    }
}

#[inline]
fn fill<T>(slot: &mut Option<T>, newer: Option<T>) {
    if slot.is_none() {
        *slot = newer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_is_sentinel() {
        assert_eq!(TestOptions::new().effective_order(), 999);
        assert_eq!(TestOptions::new().with_order(-3).effective_order(), -3);
    }

    #[test]
    fn test_merge_keeps_first_set_fields() {
        let mut opts = TestOptions::new().test().with_tags(["a"]).with_timeout_ms(50);
        opts.merge_missing(
            TestOptions::new()
                .with_tags(["b", "c"])
                .with_timeout_ms(10)
                .with_display_name("later"),
        );

        assert_eq!(opts.tag_slice(), vec!["a"]);
        assert_eq!(opts.timeout_ms.map(NonZeroU64::get), Some(50));
        assert_eq!(opts.display_name.as_deref(), Some("later"));
        assert!(opts.is_runnable());
    }

    #[test]
    fn test_merge_fills_is_a_test_later() {
        let mut opts = TestOptions::new().with_tags(["slow"]);
        assert!(!opts.is_runnable());
        opts.merge_missing(TestOptions::new().test());
        assert!(opts.is_runnable());
    }

    #[test]
    fn test_zero_timeout_means_none() {
        assert_eq!(TestOptions::new().with_timeout_ms(0).timeout_ms, None);
    }

    #[test]
    fn test_disabled_flags() {
        let opts = TestOptions::new().with_disabled(Some("pending".into()));
        assert!(opts.is_disabled());
        let explicit_off = TestOptions {
            disabled: Some(Disabled {
                value: false,
                message: None,
            }),
            ..TestOptions::default()
        };
        assert!(!explicit_off.is_disabled());
    }

    #[test]
    fn test_class_metadata_merge_if_absent() {
        let mut meta = ClassMetadata::new().with_display_name("Math");
        meta.merge_missing(ClassMetadata::new().with_display_name("Other").with_tags(["unit"]));
        assert_eq!(meta.display_name.as_deref(), Some("Math"));
        assert_eq!(meta.tag_slice(), vec!["unit"]);
    }

    #[test]
    fn test_environment_parse_and_display() {
        assert_eq!("Client".parse::<Environment>(), Ok(Environment::Client));
        assert_eq!(" server ".parse::<Environment>(), Ok(Environment::Server));
        assert!("browser".parse::<Environment>().is_err());
        assert_eq!(Environment::Client.to_string(), "client");
    }
}
