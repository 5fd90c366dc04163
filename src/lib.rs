#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
//! Trellis: a class-oriented unit-testing framework for async Rust.
//!
//! Test authors register methods of plain types as tests, lifecycle hooks or metadata through
//! [`ClassBuilder`] (or raw [`Annotation`]s). A [`TestRunner`] collects the registered classes
//! from a tree of [`Suite`]s, then schedules, executes and reports on them.
//!
//! ## Panic Policy
//!
//! - **Library code**: explicit `Result`/`Option` handling; `#![deny(clippy::unwrap_used)]` is
//!   enforced crate-wide.
//! - **Test bodies and hooks**: may return `Err` or panic. Both are caught at the task boundary
//!   and turned into a recorded outcome; neither aborts a run.
//! - **Tests**: `.unwrap()` and `.expect()` are acceptable in `#[cfg(test)]` code.

pub mod annotate;
pub mod cli;
pub mod collector;
pub mod config;
pub mod errors;
pub mod registry;
pub mod report;
pub mod runner;

pub use trellis_core::{ClassMetadata, DEFAULT_ORDER, Disabled, Environment, LifecycleKind, TagSet, TestOptions};

pub use annotate::{Annotation, ClassBuilder, Method, erase};
pub use collector::{ClassFactory, CollectedClass, Export, Fixture, Module, Suite, collect};
pub use config::RunOptions;
pub use errors::{AnnotationError, CollectError};
pub use registry::{Callable, ClassId, Hook, Instance, MetadataKind, MetadataRegistry, TestDescriptor, TestFuture};
pub use report::{
    ClassResults, ConsoleReporter, HookFailure, Outcome, RecordedTest, Reporter, RunResults, RunSummary, TestCaseResult,
};
pub use runner::TestRunner;
