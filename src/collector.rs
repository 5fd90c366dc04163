//! Test collection: turn container trees into instantiated test classes.
//!
//! Callers describe what to scan as a tree of [`Suite`]s whose leaves are [`Module`]s. Each module
//! may export a constructible class ([`Export::Class`]) or some other value that cannot be
//! instantiated. Collection walks the tree depth-first, roots in order, constructs every exported
//! class exactly once and runs its [`Fixture::setup`], then keeps the test-bearing ones.

use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::CollectError;
use crate::registry::{ClassId, Instance, MetadataRegistry};

/// Construction-time fixture contract of a test class.
///
/// `setup` runs synchronously right after construction, before the instance is shared. An error
/// aborts the whole collection step.
pub trait Fixture: Send + Sync + 'static {
    fn setup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

type Constructor = Arc<dyn Fn() -> anyhow::Result<Instance> + Send + Sync>;

/// Constructor of a test class, paired with its identity.
#[derive(Clone)]
pub struct ClassFactory {
    id: ClassId,
    construct: Constructor,
}

impl ClassFactory {
    /// Factory that builds `T` with `ctor`.
    pub fn new<T, F>(ctor: F) -> Self
    where
        T: Fixture,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            id: ClassId::of::<T>(),
            construct: Arc::new(move || -> anyhow::Result<Instance> {
                let mut fixture = ctor();
                fixture.setup()?;
                Ok(Arc::new(fixture) as Instance)
            }),
        }
    }

    /// Factory that builds `T` through `Default`.
    pub fn of<T: Fixture + Default>() -> Self {
        Self::new(T::default)
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    fn instantiate(&self) -> Result<Instance, CollectError> {
        (self.construct)().map_err(|source| CollectError::Setup {
            class: self.id.name().to_string(),
            source,
        })
    }
}

/// What a module leaf resolves to.
#[derive(Clone)]
pub enum Export {
    Class(ClassFactory),
    /// A value that is not constructible; skipped during collection.
    Value(String),
}

/// Leaf of a container tree.
#[derive(Clone)]
pub struct Module {
    pub path: String,
    pub export: Option<Export>,
}

/// Child of a [`Suite`].
#[derive(Clone)]
pub enum SuiteNode {
    Suite(Suite),
    Module(Module),
}

/// Container of modules and nested suites.
#[derive(Clone, Default)]
pub struct Suite {
    pub name: String,
    pub children: Vec<SuiteNode>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Add a module exporting the test class `T` (built through `Default`).
    pub fn class<T: Fixture + Default>(self, path: impl Into<String>) -> Self {
        self.module(path, Some(Export::Class(ClassFactory::of::<T>())))
    }

    pub fn module(mut self, path: impl Into<String>, export: Option<Export>) -> Self {
        self.children.push(SuiteNode::Module(Module {
            path: path.into(),
            export,
        }));
        self
    }

    pub fn suite(mut self, child: Suite) -> Self {
        self.children.push(SuiteNode::Suite(child));
        self
    }

    /// All module leaves, depth-first in declaration order.
    pub fn modules(&self) -> Vec<&Module> {
        let mut out = Vec::new();
        self.collect_modules(&mut out);
        out
    }

    fn collect_modules<'a>(&'a self, out: &mut Vec<&'a Module>) {
        for child in &self.children {
            match child {
                SuiteNode::Suite(suite) => suite.collect_modules(out),
                SuiteNode::Module(module) => out.push(module),
            }
        }
    }
}

/// A test class paired with its single shared instance.
#[derive(Clone)]
pub struct CollectedClass {
    pub id: ClassId,
    pub instance: Instance,
}

impl std::fmt::Debug for CollectedClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectedClass").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Collect every test-bearing class reachable from `roots`.
///
/// ## Returns
/// - classes in discovery order (roots in sequence, then depth-first traversal), each constructed
///   once even when several modules export it.
///
/// ## Errors
/// - [`CollectError::Setup`] when a class's [`Fixture::setup`] fails.
///
/// ## Notes
/// - Modules without an export, or exporting a non-constructible value, are skipped.
/// - Every constructible class is built and set up, so a broken fixture fails collection even
///   when the class has no runnable test. Such classes are then left out of the result.
#[tracing::instrument(skip_all, fields(root_count = roots.len()))]
pub fn collect(registry: &MetadataRegistry, roots: &[Suite]) -> Result<Vec<CollectedClass>, CollectError> {
    let mut seen: HashSet<ClassId> = HashSet::new();
    let mut classes = Vec::new();

    for root in roots {
        for module in root.modules() {
            let factory = match &module.export {
                Some(Export::Class(factory)) => factory,
                Some(Export::Value(kind)) => {
                    tracing::debug!(module = %module.path, kind = %kind, "export is not constructible; skipping");
                    continue;
                }
                None => {
                    tracing::debug!(module = %module.path, "module has no export; skipping");
                    continue;
                }
            };

            let id = factory.id();
            if !seen.insert(id) {
                continue;
            }

            let instance = factory.instantiate()?;
            if !registry.has_runnable_tests(id) {
                tracing::debug!(class = %id, "class has no tests; dropping");
                continue;
            }
            classes.push(CollectedClass { id, instance });
        }
    }

    tracing::debug!(class_count = classes.len(), "collection complete");
    Ok(classes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trellis_core::TestOptions;

    static BUILT: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Counted;

    impl Fixture for Counted {
        fn setup(&mut self) -> anyhow::Result<()> {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Broken;

    impl Fixture for Broken {
        fn setup(&mut self) -> anyhow::Result<()> {
            anyhow::bail!("database unreachable")
        }
    }

    #[derive(Default)]
    struct NoTests;

    impl Fixture for NoTests {}

    #[derive(Default)]
    struct First;

    impl Fixture for First {}

    fn mark_runnable<T: 'static>(registry: &MetadataRegistry) {
        registry.add_test(ClassId::of::<T>(), "t", TestOptions::new().test(), None);
    }

    #[test]
    fn test_each_class_constructed_once_in_discovery_order() {
        let registry = MetadataRegistry::new();
        mark_runnable::<Counted>(&registry);
        mark_runnable::<First>(&registry);

        let roots = vec![
            Suite::new("a")
                .class::<First>("a/first")
                .suite(Suite::new("nested").class::<Counted>("a/nested/counted")),
            Suite::new("b").class::<Counted>("b/counted_again"),
        ];

        let before = BUILT.load(Ordering::SeqCst);
        let classes = collect(&registry, &roots).unwrap();
        let names: Vec<_> = classes.iter().map(|c| c.id.name()).collect();
        assert_eq!(names, ["First", "Counted"]);
        assert_eq!(BUILT.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    fn test_non_constructible_and_testless_are_skipped() {
        let registry = MetadataRegistry::new();
        mark_runnable::<First>(&registry);

        let roots = vec![
            Suite::new("root")
                .module("helpers", Some(Export::Value("function".into())))
                .module("empty", None)
                .class::<NoTests>("no_tests")
                .class::<First>("first"),
        ];

        let classes = collect(&registry, &roots).unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].id, ClassId::of::<First>());
    }

    #[test]
    fn test_setup_failure_aborts_collection() {
        let registry = MetadataRegistry::new();
        mark_runnable::<Broken>(&registry);
        mark_runnable::<First>(&registry);

        let roots = vec![Suite::new("root").class::<First>("first").class::<Broken>("broken")];
        let err = collect(&registry, &roots).unwrap_err();
        assert_eq!(
            err.to_string(),
            "setup of test class `Broken` failed: database unreachable"
        );
    }

    #[derive(Default)]
    struct BrokenHelper;

    impl Fixture for BrokenHelper {
        fn setup(&mut self) -> anyhow::Result<()> {
            anyhow::bail!("missing credentials")
        }
    }

    #[test]
    fn test_setup_failure_without_runnable_tests_still_aborts() {
        let registry = MetadataRegistry::new();
        let id = ClassId::of::<BrokenHelper>();
        registry.add_class_metadata(id, trellis_core::ClassMetadata::new().with_tags(["db"]));
        registry.add_test(id, "draft", TestOptions::new().with_tags(["db"]), None);
        assert!(!registry.has_runnable_tests(id));

        let roots = vec![Suite::new("root").class::<BrokenHelper>("helper")];
        let err = collect(&registry, &roots).unwrap_err();
        assert!(matches!(err, CollectError::Setup { .. }), "{err}");
        assert_eq!(
            err.to_string(),
            "setup of test class `BrokenHelper` failed: missing credentials"
        );
    }

    #[test]
    fn test_modules_are_depth_first() {
        let root = Suite::new("root")
            .module("one", None)
            .suite(Suite::new("inner").module("two", None))
            .module("three", None);
        let paths: Vec<_> = root.modules().iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, ["one", "two", "three"]);
    }
}
