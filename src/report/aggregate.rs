//! Run accumulation state.
//!
//! Results are keyed by class identity and method name. Display names are carried along for
//! rendering and may collide freely.

use std::time::Duration;

use super::{Outcome, TestCaseResult};
use crate::registry::{ClassId, TestDescriptor};

/// One recorded test of a class.
#[derive(Debug, Clone)]
pub struct RecordedTest {
    /// Method name, unique within the class
    pub method: String,
    pub display_name: String,
    pub result: TestCaseResult,
}

/// Results of one class, in execution order.
#[derive(Debug, Clone)]
pub struct ClassResults {
    pub class_id: ClassId,
    pub display_name: String,
    pub tests: Vec<RecordedTest>,
}

impl ClassResults {
    fn new(class_id: ClassId, display_name: String) -> Self {
        Self {
            class_id,
            display_name,
            tests: Vec::new(),
        }
    }

    /// Result of the test registered under `method`.
    pub fn get(&self, method: &str) -> Option<&TestCaseResult> {
        self.tests.iter().find(|t| t.method == method).map(|t| &t.result)
    }

    /// Sum of the elapsed time of the class's tests.
    pub fn elapsed(&self) -> Duration {
        self.tests.iter().map(|t| t.result.time_elapsed).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.tests.iter().any(|t| t.result.is_failed())
    }
}

/// A lifecycle hook that errored or panicked. Diagnostic only; never counted as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    pub class_name: String,
    pub hook: String,
    pub kind: String,
    pub message: String,
}

/// Counters of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration: Duration,
}

/// Per-class, per-test results plus running counters. Reset at the start of every run.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    classes: Vec<ClassResults>,
    passed: usize,
    failed: usize,
    skipped: usize,
    elapsed: Duration,
    hook_failures: Vec<HookFailure>,
}

impl RunResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn begin_class(&mut self, class_id: ClassId, display_name: String) {
        self.classes.push(ClassResults::new(class_id, display_name));
    }

    /// Store `result` under its class and `descriptor`, and bump exactly one counter.
    pub(crate) fn record_result(&mut self, descriptor: &TestDescriptor, result: TestCaseResult) {
        match result.outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
        }

        let class_id = result.class_id;
        if self.classes.last().is_none_or(|c| c.class_id != class_id) {
            self.begin_class(class_id, result.class_name.clone());
        }
        if let Some(class) = self.classes.last_mut() {
            class.tests.push(RecordedTest {
                method: descriptor.name.clone(),
                display_name: descriptor.display_name().to_string(),
                result,
            });
        }
    }

    pub(crate) fn record_hook_failure(&mut self, failure: HookFailure) {
        self.hook_failures.push(failure);
    }

    pub(crate) fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    pub fn classes(&self) -> &[ClassResults] {
        &self.classes
    }

    pub fn class(&self, class_id: ClassId) -> Option<&ClassResults> {
        self.classes.iter().find(|c| c.class_id == class_id)
    }

    pub(crate) fn last_class(&self) -> Option<&ClassResults> {
        self.classes.last()
    }

    /// Look up one result by class identity and method name.
    pub fn get(&self, class_id: ClassId, method: &str) -> Option<&TestCaseResult> {
        self.class(class_id).and_then(|c| c.get(method))
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn hook_failures(&self) -> &[HookFailure] {
        &self.hook_failures
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.total(),
            passed: self.passed,
            failed: self.failed,
            skipped: self.skipped,
            duration: self.elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Render the plain-text report tree.
    pub fn generate_report(&self) -> String {
        super::render::render(self)
    }
}
