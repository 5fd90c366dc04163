//! Metadata registry: the side-table that attaches test descriptors to class identities.
//!
//! Test classes are plain Rust types. Nothing is injected into them; instead every annotation is
//! written into a [`MetadataRegistry`] keyed by the class's [`ClassId`]. A process-wide registry is
//! available through [`MetadataRegistry::global`], and tests can build private registries so that
//! registrations never leak between them.
//!
//! Entries are never removed.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures_util::future::BoxFuture;
use trellis_core::{ClassMetadata, LifecycleKind, TestOptions};

/// Shared fixture instance of a collected test class.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Future returned by a test body or lifecycle hook. `Err` (or a panic) means "threw".
pub type TestFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Type-erased test body or hook, invoked with the class's shared instance.
pub type Callable = Arc<dyn Fn(Instance) -> TestFuture + Send + Sync>;

/// Stable identity of a test class.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId {
    type_id: TypeId,
    name: &'static str,
}

impl ClassId {
    pub fn of<T: Any>() -> Self {
        let full = std::any::type_name::<T>();
        // Only the path before any generic arguments is stripped.
        let base_len = full.find('<').unwrap_or(full.len());
        let start = full[..base_len].rfind("::").map_or(0, |i| i + 2);
        Self {
            type_id: TypeId::of::<T>(),
            name: &full[start..],
        }
    }

    /// Short type name of the class (module path stripped).
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.name)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One test method's descriptor.
#[derive(Clone)]
pub struct TestDescriptor {
    pub name: String,
    pub options: TestOptions,
    pub body: Option<Callable>,
}

impl TestDescriptor {
    /// Name shown in reports: the display name override, or the method name.
    pub fn display_name(&self) -> &str {
        self.options.display_name.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Debug for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDescriptor")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// A registered lifecycle hook.
#[derive(Clone)]
pub struct Hook {
    pub method: String,
    pub call: Callable,
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("method", &self.method).finish_non_exhaustive()
    }
}

/// What kind of metadata to probe with [`MetadataRegistry::has_metadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    /// At least one test descriptor (runnable or not).
    Tests,
    /// Class-level metadata.
    Class,
    /// At least one hook of the given kind.
    Lifecycle(LifecycleKind),
}

#[derive(Default)]
struct ClassEntry {
    metadata: Option<ClassMetadata>,
    tests: Vec<TestDescriptor>,
    hooks: HashMap<LifecycleKind, Vec<Hook>>,
}

/// Side-table from class identity to its descriptors, class metadata and lifecycle hooks.
#[derive(Default)]
pub struct MetadataRegistry {
    classes: RwLock<HashMap<ClassId, ClassEntry>>,
}

impl fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataRegistry")
            .field("class_count", &self.read().len())
            .finish()
    }
}

static GLOBAL: OnceLock<MetadataRegistry> = OnceLock::new();

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static MetadataRegistry {
        GLOBAL.get_or_init(MetadataRegistry::new)
    }

    pub fn has_metadata(&self, class: ClassId, kind: MetadataKind) -> bool {
        let classes = self.read();
        let Some(entry) = classes.get(&class) else {
            return false;
        };
        match kind {
            MetadataKind::Tests => !entry.tests.is_empty(),
            MetadataKind::Class => entry.metadata.is_some(),
            MetadataKind::Lifecycle(kind) => entry.hooks.get(&kind).is_some_and(|h| !h.is_empty()),
        }
    }

    /// Whether the class has at least one descriptor that resolves to a runnable test.
    pub fn has_runnable_tests(&self, class: ClassId) -> bool {
        self.read()
            .get(&class)
            .is_some_and(|entry| entry.tests.iter().any(|t| t.options.is_runnable()))
    }

    /// Create or merge the descriptor for `class::method_name`.
    ///
    /// ## Notes
    /// - Existing fields win; the new options only fill gaps. The same holds for `body`.
    /// - Discovery order is the order of the first registration of each method.
    pub fn add_test(&self, class: ClassId, method_name: &str, options: TestOptions, body: Option<Callable>) {
        let mut classes = self.write();
        let entry = classes.entry(class).or_default();

        if let Some(existing) = entry.tests.iter_mut().find(|t| t.name == method_name) {
            existing.options.merge_missing(options);
            if existing.body.is_none() {
                existing.body = body;
            }
            return;
        }

        entry.tests.push(TestDescriptor {
            name: method_name.to_string(),
            options,
            body,
        });
    }

    /// Create or merge class-level metadata, field-level merge-if-absent.
    pub fn add_class_metadata(&self, class: ClassId, metadata: ClassMetadata) {
        let mut classes = self.write();
        let entry = classes.entry(class).or_default();
        match entry.metadata.as_mut() {
            Some(existing) => existing.merge_missing(metadata),
            None => entry.metadata = Some(metadata),
        }
    }

    /// Append a hook to the ordered list for `kind`.
    pub fn add_annotation(&self, class: ClassId, method_name: &str, kind: LifecycleKind, call: Callable) {
        let mut classes = self.write();
        classes.entry(class).or_default().hooks.entry(kind).or_default().push(Hook {
            method: method_name.to_string(),
            call,
        });
    }

    /// Hooks registered under `kind`, in registration order. Empty when none.
    pub fn get_annotation(&self, class: ClassId, kind: LifecycleKind) -> Vec<Hook> {
        self.read()
            .get(&class)
            .and_then(|entry| entry.hooks.get(&kind))
            .cloned()
            .unwrap_or_default()
    }

    /// All descriptors of a class in discovery order.
    pub fn tests(&self, class: ClassId) -> Vec<TestDescriptor> {
        self.read()
            .get(&class)
            .map(|entry| entry.tests.clone())
            .unwrap_or_default()
    }

    pub fn class_metadata(&self, class: ClassId) -> Option<ClassMetadata> {
        self.read().get(&class).and_then(|entry| entry.metadata.clone())
    }

    /// Name shown in reports: the class display name, or the type name.
    pub fn class_display_name(&self, class: ClassId) -> String {
        self.class_metadata(class)
            .and_then(|m| m.display_name)
            .unwrap_or_else(|| class.name().to_string())
    }

    // A panic while holding the lock cannot leave a half-written entry behind, so poisoning is
    // ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ClassId, ClassEntry>> {
        self.classes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ClassId, ClassEntry>> {
        self.classes.write().unwrap_or_else(PoisonError::into_inner)
    }
}
