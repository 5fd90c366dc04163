//! Provide the shared, pure descriptor model and tag semantics for the trellis test engine.
//!
//! This crate is intentionally small and dependency-light. It contains the typed shape of test
//! configuration that both:
//! - the annotation surface writes when test authors register methods, and
//! - the scheduler reads when it decides what runs and in which order.
//!
//! ## Notes
//!
//! - This is a "semantic core" crate: **no IO**, no async, no global state.
//! - Current scope: test/class descriptor options with first-set-wins merging, lifecycle hook
//!   vocabulary, execution environments, and tag-filter intersection.

pub mod descriptor;
pub mod lifecycle;
pub mod tags;

pub use descriptor::{ClassMetadata, DEFAULT_ORDER, Disabled, Environment, TagSet, TestOptions, UnknownEnvironment};
pub use lifecycle::LifecycleKind;
pub use tags::{filter_accepts, intersects};
