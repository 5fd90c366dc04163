//! CLI module for the trellis demo runner
//!
//! ## Commands
//!
//! - `run` - Run the bundled sample suite (default when no subcommand is given)
//! - `list` - Print the tests a run would execute, without running them
//!
//! Both commands accept the same selection flags (`--tags`, `-k`, `--env`). Unset flags fall back
//! to `TRELLIS_TAGS`, `TRELLIS_FILTER` and `TRELLIS_ENV`.
//!
//! ## Design
//!
//! Commands return `CliResult<bool>` (whether every selected test passed) instead of calling
//! `process::exit`. Only the top-level `run()` function maps that to an exit status.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod sample;

use std::io;
use std::process;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use trellis_core::Environment;

use crate::config::RunOptions;
use crate::errors::{AnnotationError, CollectError};
use crate::report::ConsoleReporter;
use crate::runner::TestRunner;

/// Failure that stops a command before or around the run itself.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Registration(#[from] AnnotationError),
    #[error(transparent)]
    Collection(#[from] CollectError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] io::Error),
}

type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Class-oriented test runner (demo binary)
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(version = VERSION)]
#[command(about = "Run the bundled trellis sample suite", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the sample suite and print the report
    Run {
        #[command(flatten)]
        select: SelectArgs,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the tests a run would execute
    List {
        #[command(flatten)]
        select: SelectArgs,
    },
}

/// Test selection flags shared by every command.
#[derive(Args, Debug, Default, Clone)]
pub struct SelectArgs {
    /// Only run tests whose class or method tags match one of these (comma separated)
    #[arg(long, value_name = "TAGS", value_delimiter = ',')]
    pub tags: Vec<String>,
    /// Filter tests by name substring
    #[arg(short = 'k', value_name = "EXPR")]
    pub filter: Option<String>,
    /// Execution environment tests are matched against (server or client)
    #[arg(long = "env", value_name = "ENV")]
    pub environment: Option<Environment>,
}

impl SelectArgs {
    /// Environment-derived options, overridden by any flag that was given.
    fn into_options<'a>(self) -> RunOptions<'a> {
        let mut options = RunOptions::from_env();
        let tags: Vec<String> = self.tags.into_iter().filter(|t| !t.trim().is_empty()).collect();
        if !tags.is_empty() {
            options = options.with_tags(tags);
        }
        if let Some(filter) = self.filter {
            options = options.with_name_filter(filter);
        }
        if let Some(environment) = self.environment {
            options = options.with_environment(environment);
        }
        options
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Execute the CLI command; `Ok(false)` means at least one test failed.
fn execute(cli: Cli) -> CliResult<bool> {
    match cli.command {
        Some(Command::Run { select, verbose }) => run_suite(select, verbose),
        Some(Command::List { select }) => list_suite(select),
        None => run_suite(SelectArgs::default(), false),
    }
}

fn run_suite(select: SelectArgs, verbose: bool) -> CliResult<bool> {
    let registry = sample::registry()?;
    let roots = sample::suites();
    let mut runner = TestRunner::new(&registry, &roots)?;

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    let mut reporter = ConsoleReporter::new(verbose);
    let options = select.into_options().with_reporter(&mut reporter);
    let results = runtime.block_on(runner.run(options));

    println!("{}", results.generate_report());
    for failure in results.hook_failures() {
        eprintln!(
            "\x1b[33mwarning\x1b[0m: {} hook `{}::{}` failed: {}",
            failure.kind, failure.class_name, failure.hook, failure.message
        );
    }

    Ok(results.is_success())
}

fn list_suite(select: SelectArgs) -> CliResult<bool> {
    let registry = sample::registry()?;
    let roots = sample::suites();
    let runner = TestRunner::new(&registry, &roots)?;

    let options = select.into_options();
    let plan = runner.plan(&options);
    if plan.is_empty() {
        println!("no tests selected");
        return Ok(true);
    }
    for (class, tests) in plan {
        println!("{class}");
        for test in tests {
            println!("  {test}");
        }
    }
    Ok(true)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_default_is_run() {
        let cli = Cli::try_parse_from(["trellis"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_run_flags() {
        let cli =
            Cli::try_parse_from(["trellis", "run", "-v", "--tags", "db,slow", "-k", "item", "--env", "client"])
                .unwrap();
        if let Some(Command::Run { select, verbose }) = cli.command {
            assert!(verbose);
            assert_eq!(select.tags, vec!["db", "slow"]);
            assert_eq!(select.filter.as_deref(), Some("item"));
            assert_eq!(select.environment, Some(Environment::Client));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_rejects_unknown_environment() {
        assert!(Cli::try_parse_from(["trellis", "list", "--env", "desktop"]).is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let select = SelectArgs {
            tags: vec!["db".into(), " ".into()],
            filter: Some("item".into()),
            environment: Some(Environment::Client),
        };
        let options = select.into_options();
        assert_eq!(options.tags, Some(vec!["db".to_string()]));
        assert_eq!(options.name_filter.as_deref(), Some("item"));
        assert_eq!(options.environment, Environment::Client);
    }

    #[test]
    fn test_commands_report_suite_outcome() {
        let run = Cli::try_parse_from(["trellis", "run", "--tags", "unit"]).unwrap();
        assert!(execute(run).unwrap());
        let list = Cli::try_parse_from(["trellis", "list", "-k", "nothing_matches"]).unwrap();
        assert!(execute(list).unwrap());
    }

    #[test]
    fn test_collection_errors_convert() {
        let err: CliError = CollectError::Setup {
            class: "Inventory".into(),
            source: anyhow::anyhow!("disk full"),
        }
        .into();
        assert_eq!(err.to_string(), "setup of test class `Inventory` failed: disk full");
    }

    #[test]
    fn test_list_plan_respects_filters() {
        let registry = sample::registry().unwrap();
        let roots = sample::suites();
        let runner = TestRunner::new(&registry, &roots).unwrap();

        let plan = runner.plan(&RunOptions::new().with_name_filter("item"));
        assert_eq!(
            plan,
            vec![(
                "Inventory store".to_string(),
                vec!["adds_item".to_string(), "lists_seeded_items".to_string()]
            )]
        );
    }
}
