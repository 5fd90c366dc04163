//! Declarative registration surface.
//!
//! An [`Annotation`] is either a lifecycle kind or a partial set of [`TestOptions`]. Applying it to
//! a class (and optionally a method) writes into a [`MetadataRegistry`]:
//!
//! - no method: class-level metadata (`display_name` and `tags` of the options)
//! - lifecycle kind: the method's callable is appended to that kind's hook list
//! - anything else: the method's test descriptor is created or merged
//!
//! [`ClassBuilder`] is the typed front end test authors use when defining a class:
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! use trellis::{Annotation, ClassBuilder, MetadataRegistry};
//!
//! #[derive(Default)]
//! struct Counter {
//!     hits: AtomicU32,
//! }
//!
//! # fn main() -> Result<(), trellis::AnnotationError> {
//! let registry = MetadataRegistry::new();
//! ClassBuilder::<Counter>::new(&registry)
//!     .tags(["unit"])?
//!     .before_each("reset", |this: Arc<Counter>| async move {
//!         this.hits.store(0, Ordering::SeqCst);
//!         Ok(())
//!     })?
//!     .test("increments", |this: Arc<Counter>| async move {
//!         this.hits.fetch_add(1, Ordering::SeqCst);
//!         anyhow::ensure!(this.hits.load(Ordering::SeqCst) == 1);
//!         Ok(())
//!     })?
//!     .annotate("increments", Annotation::order(1))?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::FutureExt;
use trellis_core::{ClassMetadata, Environment, LifecycleKind, TestOptions};

use crate::errors::AnnotationError;
use crate::registry::{Callable, ClassId, Instance, MetadataRegistry, TestFuture};

/// A method reference an annotation is applied to.
#[derive(Clone)]
pub struct Method {
    pub name: String,
    pub call: Option<Callable>,
}

impl Method {
    /// A method referenced by name only; used for annotations that carry no body.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            call: None,
        }
    }

    pub fn with_call(name: impl Into<String>, call: Callable) -> Self {
        Self {
            name: name.into(),
            call: Some(call),
        }
    }
}

/// Configuration of a single annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Lifecycle(LifecycleKind),
    Options(TestOptions),
}

impl Annotation {
    /// Mark a method as a test.
    pub fn test() -> Self {
        Self::Options(TestOptions::new().test())
    }

    pub fn display_name(name: impl Into<String>) -> Self {
        Self::Options(TestOptions::new().with_display_name(name))
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Options(TestOptions::new().with_tags(tags))
    }

    pub fn order(order: i64) -> Self {
        Self::Options(TestOptions::new().with_order(order))
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Options(TestOptions::new().with_timeout_ms(timeout_ms))
    }

    pub fn disabled(message: Option<&str>) -> Self {
        Self::Options(TestOptions::new().with_disabled(message.map(str::to_string)))
    }

    pub fn environment(environment: Environment) -> Self {
        Self::Options(TestOptions::new().with_environment(environment))
    }

    pub fn negated() -> Self {
        Self::Options(TestOptions::new().with_negated(true))
    }

    pub fn before_all() -> Self {
        Self::Lifecycle(LifecycleKind::BeforeAll)
    }

    pub fn before_each() -> Self {
        Self::Lifecycle(LifecycleKind::BeforeEach)
    }

    pub fn after_each() -> Self {
        Self::Lifecycle(LifecycleKind::AfterEach)
    }

    pub fn after_all() -> Self {
        Self::Lifecycle(LifecycleKind::AfterAll)
    }

    /// Short label used in error messages.
    fn label(&self) -> String {
        match self {
            Annotation::Lifecycle(kind) => kind.as_str().to_string(),
            Annotation::Options(opts) if opts.is_runnable() => "test".to_string(),
            Annotation::Options(_) => "options".to_string(),
        }
    }

    /// Apply the annotation to `class` and, when given, one of its methods.
    ///
    /// ## Errors
    /// - [`AnnotationError::UndefinedTarget`] when `class` is `None`.
    /// - [`AnnotationError::LifecycleOnClass`] when a lifecycle kind is applied without a method.
    /// - [`AnnotationError::MissingCallable`] when a lifecycle kind targets a method with no body.
    pub fn apply(
        &self,
        registry: &MetadataRegistry,
        class: Option<ClassId>,
        method: Option<Method>,
    ) -> Result<(), AnnotationError> {
        let Some(class) = class else {
            return Err(AnnotationError::UndefinedTarget {
                annotation: self.label(),
            });
        };

        match (self, method) {
            (Annotation::Lifecycle(kind), None) => Err(AnnotationError::LifecycleOnClass {
                class: class.name().to_string(),
                kind: kind.to_string(),
            }),
            (Annotation::Options(opts), None) => {
                registry.add_class_metadata(
                    class,
                    ClassMetadata {
                        display_name: opts.display_name.clone(),
                        tags: opts.tags.clone(),
                    },
                );
                Ok(())
            }
            (Annotation::Lifecycle(kind), Some(method)) => {
                let Some(call) = method.call else {
                    return Err(AnnotationError::MissingCallable {
                        class: class.name().to_string(),
                        method: method.name,
                        kind: kind.to_string(),
                    });
                };
                registry.add_annotation(class, &method.name, *kind, call);
                Ok(())
            }
            (Annotation::Options(opts), Some(method)) => {
                registry.add_test(class, &method.name, opts.clone(), method.call);
                Ok(())
            }
        }
    }
}

/// Wrap a typed async method into a type-erased [`Callable`].
///
/// The callable downcasts the shared instance back to `T`; a mismatch is reported as an error
/// from the call rather than a panic.
pub fn erase<T, F, Fut>(method: F) -> Callable
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |instance: Instance| -> TestFuture {
        match instance.downcast::<T>() {
            Ok(this) => method(this).boxed(),
            Err(_) => {
                let expected = std::any::type_name::<T>();
                async move { Err(anyhow::anyhow!("instance is not a `{expected}`")) }.boxed()
            }
        }
    })
}

/// Typed registration front end for one test class.
pub struct ClassBuilder<'r, T> {
    registry: &'r MetadataRegistry,
    class: ClassId,
    _class: PhantomData<fn() -> T>,
}

impl<'r, T: Send + Sync + 'static> ClassBuilder<'r, T> {
    pub fn new(registry: &'r MetadataRegistry) -> Self {
        Self {
            registry,
            class: ClassId::of::<T>(),
            _class: PhantomData,
        }
    }

    pub fn class_id(&self) -> ClassId {
        self.class
    }

    /// Apply a class-level annotation.
    pub fn annotate_class(&mut self, annotation: Annotation) -> Result<&mut Self, AnnotationError> {
        annotation.apply(self.registry, Some(self.class), None)?;
        Ok(self)
    }

    pub fn display_name(&mut self, name: impl Into<String>) -> Result<&mut Self, AnnotationError> {
        self.annotate_class(Annotation::display_name(name))
    }

    pub fn tags<I, S>(&mut self, tags: I) -> Result<&mut Self, AnnotationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.annotate_class(Annotation::tags(tags))
    }

    /// Apply a body-less annotation to a method, e.g. extra tags or an order.
    pub fn annotate(&mut self, method: &str, annotation: Annotation) -> Result<&mut Self, AnnotationError> {
        annotation.apply(self.registry, Some(self.class), Some(Method::named(method)))?;
        Ok(self)
    }

    /// Register `body` as the test `name`.
    pub fn test<F, Fut>(&mut self, name: &str, body: F) -> Result<&mut Self, AnnotationError>
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.test_with(name, TestOptions::new(), body)
    }

    /// Register `body` as the test `name` with extra options in one step.
    pub fn test_with<F, Fut>(&mut self, name: &str, options: TestOptions, body: F) -> Result<&mut Self, AnnotationError>
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Annotation::Options(options.test()).apply(
            self.registry,
            Some(self.class),
            Some(Method::with_call(name, erase(body))),
        )?;
        Ok(self)
    }

    pub fn hook<F, Fut>(&mut self, kind: LifecycleKind, name: &str, hook: F) -> Result<&mut Self, AnnotationError>
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Annotation::Lifecycle(kind).apply(self.registry, Some(self.class), Some(Method::with_call(name, erase(hook))))?;
        Ok(self)
    }

    pub fn before_all<F, Fut>(&mut self, name: &str, hook: F) -> Result<&mut Self, AnnotationError>
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hook(LifecycleKind::BeforeAll, name, hook)
    }

    pub fn before_each<F, Fut>(&mut self, name: &str, hook: F) -> Result<&mut Self, AnnotationError>
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hook(LifecycleKind::BeforeEach, name, hook)
    }

    pub fn after_each<F, Fut>(&mut self, name: &str, hook: F) -> Result<&mut Self, AnnotationError>
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hook(LifecycleKind::AfterEach, name, hook)
    }

    pub fn after_all<F, Fut>(&mut self, name: &str, hook: F) -> Result<&mut Self, AnnotationError>
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hook(LifecycleKind::AfterAll, name, hook)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::MetadataKind;

    #[derive(Default)]
    struct Sample;

    struct Other;

    #[test]
    fn test_undefined_target_is_a_configuration_error() {
        let registry = MetadataRegistry::new();
        let err = Annotation::test()
            .apply(&registry, None, Some(Method::named("anything")))
            .unwrap_err();
        assert!(matches!(err, AnnotationError::UndefinedTarget { .. }));
        assert_eq!(
            err.to_string(),
            "cannot apply `test` annotation: target class is undefined"
        );
    }

    #[test]
    fn test_class_level_application_writes_class_metadata() {
        let registry = MetadataRegistry::new();
        let class = ClassId::of::<Sample>();
        Annotation::tags(["db"]).apply(&registry, Some(class), None).unwrap();
        Annotation::display_name("Storage").apply(&registry, Some(class), None).unwrap();

        let meta = registry.class_metadata(class).unwrap();
        assert_eq!(meta.tag_slice(), vec!["db"]);
        assert_eq!(meta.display_name.as_deref(), Some("Storage"));
        assert!(!registry.has_metadata(class, MetadataKind::Tests));
    }

    #[test]
    fn test_stacked_method_annotations_merge() {
        let registry = MetadataRegistry::new();
        let class = ClassId::of::<Sample>();
        Annotation::order(3).apply(&registry, Some(class), Some(Method::named("m"))).unwrap();
        Annotation::order(8).apply(&registry, Some(class), Some(Method::named("m"))).unwrap();
        Annotation::test().apply(&registry, Some(class), Some(Method::named("m"))).unwrap();

        let tests = registry.tests(class);
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].options.order, Some(3));
        assert!(tests[0].options.is_runnable());
    }

    #[test]
    fn test_lifecycle_needs_method_and_callable() {
        let registry = MetadataRegistry::new();
        let class = ClassId::of::<Sample>();

        let on_class = Annotation::before_all().apply(&registry, Some(class), None).unwrap_err();
        assert!(matches!(on_class, AnnotationError::LifecycleOnClass { .. }));

        let no_body = Annotation::after_each()
            .apply(&registry, Some(class), Some(Method::named("cleanup")))
            .unwrap_err();
        assert!(matches!(no_body, AnnotationError::MissingCallable { .. }));
        assert!(!registry.has_metadata(class, MetadataKind::Lifecycle(LifecycleKind::AfterEach)));
    }

    #[test]
    fn test_builder_registers_tests_and_hooks() {
        let registry = MetadataRegistry::new();
        let mut builder = ClassBuilder::<Sample>::new(&registry);
        builder
            .display_name("Sample suite")
            .unwrap()
            .before_each("prepare", |_this: Arc<Sample>| async { Ok(()) })
            .unwrap()
            .test_with("second", TestOptions::new().with_order(2), |_this| async { Ok(()) })
            .unwrap()
            .test("first", |_this| async { Ok(()) })
            .unwrap()
            .annotate("first", Annotation::order(1))
            .unwrap();

        let class = builder.class_id();
        let tests = registry.tests(class);
        assert_eq!(tests.len(), 2);
        assert!(tests.iter().all(|t| t.options.is_runnable() && t.body.is_some()));
        assert_eq!(registry.get_annotation(class, LifecycleKind::BeforeEach).len(), 1);
        assert_eq!(registry.class_display_name(class), "Sample suite");
    }

    #[tokio::test]
    async fn test_erased_callable_rejects_foreign_instance() {
        let call = erase(|_this: Arc<Sample>| async { Ok(()) });
        let wrong: Instance = Arc::new(Other);
        let err = call(wrong).await.unwrap_err();
        assert!(err.to_string().contains("Sample"));

        let right: Instance = Arc::new(Sample);
        assert!(call(right).await.is_ok());
    }
}
