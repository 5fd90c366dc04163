//! Default console reporter (pytest-style).

use std::io::{self, Write};
use std::time::Duration;

use super::{ClassResults, Reporter, TestCaseResult};

/// Prints progress to stderr while a run is in flight.
///
/// Compact mode prints one character per test (`.`, `F`, `s`); verbose mode prints one line per
/// test with its status and timing.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
    passed: usize,
    failed: usize,
    skipped: usize,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            ..Self::default()
        }
    }

    fn progress(&self, compact: &str, line: String) {
        if self.verbose {
            eprintln!("{line}");
        } else {
            eprint!("{compact}");
            let _ = io::stderr().flush();
        }
    }
}

impl Reporter for ConsoleReporter {
    fn on_run_start(&mut self, total_class_count: usize) {
        self.passed = 0;
        self.failed = 0;
        self.skipped = 0;
        eprintln!("\x1b[1m=================== test session starts ===================\x1b[0m");
        eprintln!("collected {} class(es)", total_class_count);
        eprintln!();
    }

    fn on_class_start(&mut self, class: &str) {
        if self.verbose {
            eprintln!("\x1b[1m{}\x1b[0m", class);
        }
    }

    fn on_test_start(&mut self, name: &str) {
        if self.verbose {
            eprint!("  {} ... ", name);
        }
    }

    fn on_test_passed(&mut self, _name: &str, result: &TestCaseResult) {
        self.passed += 1;
        self.progress(
            "\x1b[32m.\x1b[0m",
            format!("\x1b[32mPASSED\x1b[0m ({}ms)", result.time_elapsed.as_millis()),
        );
    }

    fn on_test_failed(&mut self, name: &str, result: &TestCaseResult) {
        self.failed += 1;
        self.progress(
            "\x1b[31mF\x1b[0m",
            format!("\x1b[31mFAILED\x1b[0m ({}ms)", result.time_elapsed.as_millis()),
        );
        if self.verbose {
            if let Some(error) = &result.error_message {
                eprintln!("\x1b[31m    {}: {}\x1b[0m", name, error);
            }
        }
    }

    fn on_test_skipped(&mut self, _name: &str, result: &TestCaseResult) {
        self.skipped += 1;
        let line = match result.error_message.as_deref() {
            Some(reason) if !reason.is_empty() => format!("\x1b[33mSKIPPED\x1b[0m ({})", reason),
            _ => "\x1b[33mSKIPPED\x1b[0m".to_string(),
        };
        self.progress("\x1b[33ms\x1b[0m", line);
    }

    fn on_class_end(&mut self, _class: &str, _results: &ClassResults) {
        if self.verbose {
            eprintln!();
        }
    }

    fn on_run_end(&mut self, elapsed: Duration) {
        if !self.verbose {
            eprintln!();
        }
        eprintln!();

        let mut parts = Vec::new();
        if self.passed > 0 {
            parts.push(format!("\x1b[32m{} passed\x1b[0m", self.passed));
        }
        if self.failed > 0 {
            parts.push(format!("\x1b[31m{} failed\x1b[0m", self.failed));
        }
        if self.skipped > 0 {
            parts.push(format!("\x1b[33m{} skipped\x1b[0m", self.skipped));
        }
        if parts.is_empty() {
            parts.push("no tests ran".to_string());
        }

        eprintln!("====== {} in {:.2}s ======", parts.join(", "), elapsed.as_secs_f64());
    }
}
