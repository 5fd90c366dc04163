//! Error taxonomy for test authoring and collection.
//!
//! Only configuration and collection problems are errors. Failing test bodies, failing lifecycle
//! hooks and timeouts are outcomes recorded by the runner and never surface through these types.

use thiserror::Error;

/// Mistakes made while registering tests, raised immediately at registration time.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("cannot apply `{annotation}` annotation: target class is undefined")]
    UndefinedTarget { annotation: String },

    #[error("lifecycle annotation `{kind}` on `{class}::{method}` has no callable to run")]
    MissingCallable {
        class: String,
        method: String,
        kind: String,
    },

    #[error("lifecycle annotation `{kind}` on class `{class}` must target a method")]
    LifecycleOnClass { class: String, kind: String },
}

/// Errors that abort test collection.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("setup of test class `{class}` failed: {source:#}")]
    Setup {
        class: String,
        #[source]
        source: anyhow::Error,
    },
}
