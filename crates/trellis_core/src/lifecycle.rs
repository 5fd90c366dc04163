//! Lifecycle hook vocabulary.
//!
//! This module centralizes the recognized lifecycle hook kinds so the annotation surface and the
//! scheduler don't need stringly-typed comparisons.

use std::fmt;

/// Stable identifier for a lifecycle hook kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleKind {
    /// Run once before all tests in a class
    BeforeAll,
    /// Run before each test in a class
    BeforeEach,
    /// Run after each test in a class, including skipped ones
    AfterEach,
    /// Run once after all tests in a class
    AfterAll,
}

impl LifecycleKind {
    /// Return the canonical spelling for a lifecycle kind.
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleKind::BeforeAll => "before_all",
            LifecycleKind::BeforeEach => "before_each",
            LifecycleKind::AfterEach => "after_each",
            LifecycleKind::AfterAll => "after_all",
        }
    }

    /// Check if this is a teardown hook
    pub fn is_teardown(self) -> bool {
        matches!(self, LifecycleKind::AfterEach | LifecycleKind::AfterAll)
    }

    /// Check if this hook wraps every test rather than the whole class
    pub fn is_per_test(self) -> bool {
        matches!(self, LifecycleKind::BeforeEach | LifecycleKind::AfterEach)
    }
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
