//! Plain-text report tree.
//!
//! Layout: one block per class (header, then one line per test), a `Failures:` section when any
//! test failed, and a final summary line. Glyphs and indentation are presentation only; the block
//! order is stable.

use std::fmt::Write as _;
use std::time::Duration;

use super::aggregate::RunResults;
use super::{Outcome, TestCaseResult};

const PASS_GLYPH: &str = "✓";
const FAIL_GLYPH: &str = "✗";
const SKIP_GLYPH: &str = "○";

pub(super) fn render(results: &RunResults) -> String {
    let mut out = String::new();

    for class in results.classes() {
        let glyph = if class.has_failures() { FAIL_GLYPH } else { PASS_GLYPH };
        // Writing to String cannot fail.
        let _ = writeln!(out, "{} {} ({})", glyph, class.display_name, millis(class.elapsed()));
        for test in &class.tests {
            let _ = writeln!(
                out,
                "  {} {} ({}) {}",
                glyph_for(test.result.outcome),
                test.display_name,
                millis(test.result.time_elapsed),
                status(&test.result)
            );
        }
        out.push('\n');
    }

    let failures: Vec<_> = results
        .classes()
        .iter()
        .flat_map(|class| class.tests.iter().map(move |test| (class, test)))
        .filter(|(_, test)| test.result.is_failed())
        .collect();

    if !failures.is_empty() {
        out.push_str("Failures:\n");
        for (class, test) in failures {
            let _ = writeln!(out, "\n  {}::{}", class.display_name, test.display_name);
            let message = test.result.error_message.as_deref().unwrap_or("unknown error");
            for line in message.lines() {
                let _ = writeln!(out, "    {line}");
            }
        }
        out.push('\n');
    }

    let _ = write!(
        out,
        "Total: {}, Passed: {}, Failed: {}, Skipped: {}, Time: {:.2}s",
        results.total(),
        results.passed(),
        results.failed(),
        results.skipped(),
        results.elapsed().as_secs_f64()
    );
    out
}

fn glyph_for(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => PASS_GLYPH,
        Outcome::Failed => FAIL_GLYPH,
        Outcome::Skipped => SKIP_GLYPH,
    }
}

fn status(result: &TestCaseResult) -> String {
    match (&result.outcome, &result.error_message) {
        (Outcome::Skipped, Some(reason)) if !reason.is_empty() => format!("SKIPPED ({reason})"),
        (outcome, _) => outcome.as_str().to_string(),
    }
}

fn millis(d: Duration) -> String {
    format!("{}ms", d.as_millis())
}
