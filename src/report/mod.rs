//! Results, aggregation and reporting.
//!
//! ## Reporter Trait
//!
//! The runner notifies an optional [`Reporter`] at fixed lifecycle points. This separates
//! reporting from execution and allows custom output formats (console, JSON, TAP, ...) by
//! implementing the trait. A reporter is a passive observer: it is called synchronously and
//! cannot influence scheduling.
//!
//! Notification order for one run:
//!
//! ```text
//! on_run_start(class_count)
//!   on_class_start(class)
//!     on_test_start(name) -> on_test_passed | on_test_failed | on_test_skipped -> on_test_end(name, result)
//!     ...
//!   on_class_end(class)
//!   ...
//! on_run_end(elapsed)
//! ```

mod aggregate;
mod console;
mod render;

use std::time::Duration;

use crate::registry::ClassId;

pub use aggregate::{ClassResults, HookFailure, RecordedTest, RunResults, RunSummary};
pub use console::ConsoleReporter;

/// Observer of a test run.
///
/// Only `on_run_start` and `on_run_end` are required.
pub trait Reporter {
    /// Called once before the first class runs
    fn on_run_start(&mut self, total_class_count: usize);

    /// Called before a class's `before_all` hooks
    fn on_class_start(&mut self, _class: &str) {}

    /// Called before a test's `before_each` hooks
    fn on_test_start(&mut self, _name: &str) {}

    fn on_test_passed(&mut self, _name: &str, _result: &TestCaseResult) {}

    fn on_test_failed(&mut self, _name: &str, _result: &TestCaseResult) {}

    fn on_test_skipped(&mut self, _name: &str, _result: &TestCaseResult) {}

    /// Called after a test's `after_each` hooks
    fn on_test_end(&mut self, _name: &str, _result: &TestCaseResult) {}

    /// Called after a class's `after_all` hooks
    fn on_class_end(&mut self, _class: &str, _results: &ClassResults) {}

    /// Called once after the last class
    fn on_run_end(&mut self, elapsed: Duration);
}

/// Category of a recorded test. Exactly one applies to every result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Passed => "PASSED",
            Outcome::Failed => "FAILED",
            Outcome::Skipped => "SKIPPED",
        }
    }
}

/// Immutable record of one executed (or skipped) test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCaseResult {
    pub outcome: Outcome,
    pub error_message: Option<String>,
    pub time_elapsed: Duration,
    pub class_name: String,
    pub class_id: ClassId,
}

impl TestCaseResult {
    pub fn passed(class_id: ClassId, class_name: impl Into<String>, elapsed: Duration) -> Self {
        Self::new(class_id, class_name, Outcome::Passed, None, elapsed)
    }

    pub fn failed(class_id: ClassId, class_name: impl Into<String>, elapsed: Duration, message: String) -> Self {
        Self::new(class_id, class_name, Outcome::Failed, Some(message), elapsed)
    }

    /// A skipped result never ran its body, so its elapsed time is zero.
    pub fn skipped(class_id: ClassId, class_name: impl Into<String>, message: Option<String>) -> Self {
        Self::new(class_id, class_name, Outcome::Skipped, message, Duration::ZERO)
    }

    fn new(
        class_id: ClassId,
        class_name: impl Into<String>,
        outcome: Outcome,
        error_message: Option<String>,
        time_elapsed: Duration,
    ) -> Self {
        Self {
            outcome,
            error_message,
            time_elapsed,
            class_name: class_name.into(),
            class_id,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    pub fn is_failed(&self) -> bool {
        self.outcome == Outcome::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.outcome == Outcome::Skipped
    }
}
