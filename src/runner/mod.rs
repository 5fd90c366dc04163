//! Test scheduling and execution.
//!
//! A [`TestRunner`] owns the classes produced by collection and the results of the latest run.
//! Each `run` walks the classes in discovery order, one class at a time:
//!
//! ```text
//! before_all hooks
//! for each test (sorted by order):
//!     before_each hooks
//!     disabled?              -> skipped
//!     wrong environment?     -> skipped
//!     otherwise run the body (optionally raced against its timeout)
//!     after_each hooks
//! after_all hooks
//! ```
//!
//! Tests never run concurrently with each other. A class whose filtered test list is empty is
//! skipped entirely: no hooks run and the reporter never sees it.

mod execute;
mod schedule;

use std::time::Instant;

use trellis_core::LifecycleKind;

use crate::collector::{CollectedClass, Suite, collect};
use crate::config::RunOptions;
use crate::errors::CollectError;
use crate::registry::MetadataRegistry;
use crate::report::{Outcome, RunResults};

pub use execute::NEGATED_DID_NOT_ERROR;
pub use schedule::resolve_tests;

/// Runs collected test classes against a registry.
///
/// `run` takes `&mut self`, so overlapping runs on one runner are rejected at compile time.
#[derive(Debug)]
pub struct TestRunner<'r> {
    registry: &'r MetadataRegistry,
    classes: Vec<CollectedClass>,
    results: RunResults,
}

impl<'r> TestRunner<'r> {
    /// Collect the classes reachable from `roots` and build a runner over them.
    pub fn new(registry: &'r MetadataRegistry, roots: &[Suite]) -> Result<Self, CollectError> {
        let classes = collect(registry, roots)?;
        Ok(Self::from_classes(registry, classes))
    }

    /// Build a runner over already-collected classes.
    pub fn from_classes(registry: &'r MetadataRegistry, classes: Vec<CollectedClass>) -> Self {
        Self {
            registry,
            classes,
            results: RunResults::new(),
        }
    }

    pub fn classes(&self) -> &[CollectedClass] {
        &self.classes
    }

    /// Results of the most recent run (empty before the first one).
    pub fn results(&self) -> &RunResults {
        &self.results
    }

    /// Render the plain-text report of the most recent run.
    pub fn generate_report(&self) -> String {
        self.results.generate_report()
    }

    /// Class display names paired with the test names `options` would run, without running them.
    pub fn plan(&self, options: &RunOptions<'_>) -> Vec<(String, Vec<String>)> {
        self.classes
            .iter()
            .filter_map(|class| {
                let tests = resolve_tests(
                    self.registry,
                    class.id,
                    options.tags.as_deref(),
                    options.name_filter.as_deref(),
                );
                if tests.is_empty() {
                    return None;
                }
                let names = tests.iter().map(|t| t.display_name().to_string()).collect();
                Some((self.registry.class_display_name(class.id), names))
            })
            .collect()
    }

    /// Execute every collected class and return the fresh results.
    ///
    /// ## Notes
    /// - Results and counters are reset first; nothing carries over from a previous run.
    /// - Test failures, hook failures and timeouts are all recorded, never returned as errors.
    #[tracing::instrument(skip_all, fields(class_count = self.classes.len()))]
    pub async fn run(&mut self, mut options: RunOptions<'_>) -> &RunResults {
        self.results.reset();
        let started = Instant::now();

        if let Some(reporter) = options.reporter.as_deref_mut() {
            reporter.on_run_start(self.classes.len());
        }

        for class in &self.classes {
            run_class(self.registry, class, &mut options, &mut self.results).await;
        }

        let elapsed = started.elapsed();
        self.results.finish(elapsed);
        tracing::info!(
            passed = self.results.passed(),
            failed = self.results.failed(),
            skipped = self.results.skipped(),
            elapsed_ms = elapsed.as_millis() as u64,
            "run finished"
        );

        if let Some(reporter) = options.reporter.as_deref_mut() {
            reporter.on_run_end(elapsed);
        }
        &self.results
    }
}

#[tracing::instrument(skip_all, fields(class = %class.id))]
async fn run_class(
    registry: &MetadataRegistry,
    class: &CollectedClass,
    options: &mut RunOptions<'_>,
    results: &mut RunResults,
) {
    let tests = resolve_tests(
        registry,
        class.id,
        options.tags.as_deref(),
        options.name_filter.as_deref(),
    );
    if tests.is_empty() {
        tracing::debug!("no tests selected; skipping class");
        return;
    }

    let class_name = registry.class_display_name(class.id);
    let before_each = registry.get_annotation(class.id, LifecycleKind::BeforeEach);
    let after_each = registry.get_annotation(class.id, LifecycleKind::AfterEach);

    results.begin_class(class.id, class_name.clone());
    if let Some(reporter) = options.reporter.as_deref_mut() {
        reporter.on_class_start(&class_name);
    }

    let before_all = registry.get_annotation(class.id, LifecycleKind::BeforeAll);
    execute::run_hooks(LifecycleKind::BeforeAll, &before_all, &class.instance, &class_name, results).await;

    for descriptor in &tests {
        let name = descriptor.display_name();
        tracing::debug!(test = name, "starting test");
        if let Some(reporter) = options.reporter.as_deref_mut() {
            reporter.on_test_start(name);
        }

        execute::run_hooks(LifecycleKind::BeforeEach, &before_each, &class.instance, &class_name, results).await;

        let result =
            execute::execute_test(descriptor, &class.instance, &class_name, class.id, options.environment).await;

        if let Some(reporter) = options.reporter.as_deref_mut() {
            match result.outcome {
                Outcome::Passed => reporter.on_test_passed(name, &result),
                Outcome::Failed => reporter.on_test_failed(name, &result),
                Outcome::Skipped => reporter.on_test_skipped(name, &result),
            }
        }

        execute::run_hooks(LifecycleKind::AfterEach, &after_each, &class.instance, &class_name, results).await;

        if let Some(reporter) = options.reporter.as_deref_mut() {
            reporter.on_test_end(name, &result);
        }
        tracing::debug!(test = name, outcome = result.outcome.as_str(), "test finished");
        results.record_result(descriptor, result);
    }

    let after_all = registry.get_annotation(class.id, LifecycleKind::AfterAll);
    execute::run_hooks(LifecycleKind::AfterAll, &after_all, &class.instance, &class_name, results).await;

    if let (Some(reporter), Some(class_results)) = (options.reporter.as_deref_mut(), results.last_class()) {
        reporter.on_class_end(&class_name, class_results);
    }
}
