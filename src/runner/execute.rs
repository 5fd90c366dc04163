//! Execution of test bodies and lifecycle hooks.
//!
//! Bodies and hooks run as their own Tokio tasks so that both `Err` returns and panics are caught
//! at the task boundary. A body with a timeout is raced against a timer; when the timer wins the
//! task is detached and its eventual completion is never observed.

use std::any::Any;
use std::time::{Duration, Instant};

use tokio::task::JoinError;
use trellis_core::{Environment, LifecycleKind, TestOptions};

use crate::registry::{Callable, ClassId, Hook, Instance, TestDescriptor};
use crate::report::{HookFailure, Outcome, RunResults, TestCaseResult};

/// Message recorded when a negated test completes without error.
pub const NEGATED_DID_NOT_ERROR: &str = "Test was marked as a negative test and unexpectedly did not error";

/// Final state of a body task as observed by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BodyState {
    /// The body settled before any deadline; `Err` carries the stringified error or panic.
    Completed(Result<(), String>),
    /// The deadline elapsed first; the task was detached and its result will be discarded.
    Abandoned,
}

/// Run one test to a recorded result: skip checks, body execution and verdict.
pub(crate) async fn execute_test(
    descriptor: &TestDescriptor,
    instance: &Instance,
    class_name: &str,
    class_id: ClassId,
    environment: Environment,
) -> TestCaseResult {
    let options = &descriptor.options;

    if options.is_disabled() {
        let message = options.disabled.as_ref().and_then(|d| d.message.clone());
        return TestCaseResult::skipped(class_id, class_name, message);
    }

    if let Some(required) = options.environment {
        if required != environment {
            return TestCaseResult::skipped(
                class_id,
                class_name,
                Some(format!("Test needs to run on {required} environment")),
            );
        }
    }

    let Some(body) = descriptor.body.clone() else {
        return TestCaseResult::failed(
            class_id,
            class_name,
            Duration::ZERO,
            format!("Test `{}` has no body registered", descriptor.name),
        );
    };

    let timeout = options.timeout_ms.map(|ms| Duration::from_millis(ms.get()));
    let (state, elapsed) = run_body(body, instance.clone(), timeout).await;

    match judge(options, state) {
        (Outcome::Passed, _) => TestCaseResult::passed(class_id, class_name, elapsed),
        (_, message) => TestCaseResult::failed(
            class_id,
            class_name,
            elapsed,
            message.unwrap_or_else(|| "test failed".to_string()),
        ),
    }
}

/// Spawn the body and wait for it, racing a timer when `timeout` is set.
pub(crate) async fn run_body(body: Callable, instance: Instance, timeout: Option<Duration>) -> (BodyState, Duration) {
    let started = Instant::now();
    let mut handle = tokio::spawn(body(instance));

    let state = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => BodyState::Completed(settle(joined)),
            Err(_) => {
                // Dropping the handle detaches the task without cancelling it.
                drop(handle);
                BodyState::Abandoned
            }
        },
        None => BodyState::Completed(settle(handle.await)),
    };

    (state, started.elapsed())
}

/// Turn a body state into a pass/fail verdict.
///
/// ## Notes
/// - A timeout always fails, negated or not.
/// - Negation inverts a settled body: success fails with [`NEGATED_DID_NOT_ERROR`], an error
///   passes and is discarded.
pub(crate) fn judge(options: &TestOptions, state: BodyState) -> (Outcome, Option<String>) {
    match state {
        BodyState::Abandoned => {
            let limit = options.timeout_ms.map(|ms| ms.get()).unwrap_or_default();
            (Outcome::Failed, Some(format!("Test exceeded timeout of {limit}ms")))
        }
        BodyState::Completed(Ok(())) if options.is_negated() => {
            (Outcome::Failed, Some(NEGATED_DID_NOT_ERROR.to_string()))
        }
        BodyState::Completed(Err(_)) if options.is_negated() => (Outcome::Passed, None),
        BodyState::Completed(Ok(())) => (Outcome::Passed, None),
        BodyState::Completed(Err(message)) => (Outcome::Failed, Some(message)),
    }
}

/// Run every hook of one kind in registration order, each inside its own failure boundary.
///
/// A failing hook is logged and kept as a diagnostic in `results`; it never affects counters,
/// sibling hooks or the surrounding tests.
pub(crate) async fn run_hooks(
    kind: LifecycleKind,
    hooks: &[Hook],
    instance: &Instance,
    class_name: &str,
    results: &mut RunResults,
) {
    if !hooks.is_empty() {
        tracing::trace!(kind = %kind, per_test = kind.is_per_test(), count = hooks.len(), "running hooks");
    }
    for hook in hooks {
        let joined = tokio::spawn((hook.call)(instance.clone())).await;
        if let Err(message) = settle(joined) {
            tracing::warn!(
                class = class_name,
                hook = %hook.method,
                kind = %kind,
                phase = if kind.is_teardown() { "teardown" } else { "setup" },
                error = %message,
                "lifecycle hook failed; continuing"
            );
            results.record_hook_failure(HookFailure {
                class_name: class_name.to_string(),
                hook: hook.method.clone(),
                kind: kind.to_string(),
                message,
            });
        }
    }
}

fn settle(joined: Result<anyhow::Result<()>, JoinError>) -> Result<(), String> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(format!("{error:#}")),
        Err(error) if error.is_panic() => Err(panic_message(error.into_panic())),
        Err(error) => Err(format!("task did not complete: {error}")),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "test panicked".to_string()
    }
}
