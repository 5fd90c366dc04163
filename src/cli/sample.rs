//! Sample suite bundled with the `trellis` binary.
//!
//! Two small fixtures exercise every kind of registration: ordering, lifecycle hooks, class and
//! method tags, negation, a disabled test, an environment restriction and a timeout.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, ensure};
use tokio::sync::Mutex;
use trellis_core::{Environment, TestOptions};

use crate::annotate::ClassBuilder;
use crate::collector::{Export, Fixture, Suite};
use crate::errors::AnnotationError;
use crate::registry::MetadataRegistry;

#[derive(Debug, Default)]
pub struct Arithmetic {
    evaluations: AtomicU32,
}

impl Fixture for Arithmetic {}

#[derive(Debug, Default)]
pub struct Inventory {
    items: Mutex<Vec<String>>,
}

impl Fixture for Inventory {
    fn setup(&mut self) -> anyhow::Result<()> {
        self.items.get_mut().push("widget".to_string());
        Ok(())
    }
}

/// Build a registry holding the sample classes.
pub fn registry() -> Result<MetadataRegistry, AnnotationError> {
    let registry = MetadataRegistry::new();
    register_arithmetic(&registry)?;
    register_inventory(&registry)?;
    Ok(registry)
}

/// Container tree the sample classes are discovered from.
pub fn suites() -> Vec<Suite> {
    vec![
        Suite::new("sample")
            .class::<Arithmetic>("sample/arithmetic")
            .module("sample/constants", Some(Export::Value("i64".to_string())))
            .suite(Suite::new("storage").class::<Inventory>("sample/storage/inventory")),
    ]
}

fn register_arithmetic(registry: &MetadataRegistry) -> Result<(), AnnotationError> {
    ClassBuilder::<Arithmetic>::new(registry)
        .tags(["unit"])?
        .before_each("count_evaluation", |this: Arc<Arithmetic>| async move {
            this.evaluations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })?
        .test_with("adds", TestOptions::new().with_order(1), |_: Arc<Arithmetic>| async move {
            let sum: i32 = [1, 2, 3].iter().sum();
            ensure!(sum == 6, "expected 6, got {sum}");
            Ok(())
        })?
        .test_with("divides", TestOptions::new().with_order(2), |_: Arc<Arithmetic>| async move {
            let quotient = 10_i32.checked_div(4).ok_or_else(|| anyhow!("division failed"))?;
            ensure!(quotient == 2, "expected 2, got {quotient}");
            Ok(())
        })?
        .test_with(
            "overflow_is_reported",
            TestOptions::new().with_display_name("overflow is reported").with_negated(true),
            |_: Arc<Arithmetic>| async move {
                let sum = i32::MAX.checked_add(1);
                ensure!(sum.is_some(), "i32 addition overflowed");
                Ok(())
            },
        )?
        .test_with(
            "rounds_half_even",
            TestOptions::new().with_disabled(Some("rounding mode not decided".to_string())),
            |_: Arc<Arithmetic>| async move { Ok(()) },
        )?
        .test("counts_evaluations", |this: Arc<Arithmetic>| async move {
            let seen = this.evaluations.load(Ordering::SeqCst);
            ensure!(seen >= 1, "before_each hook did not run");
            Ok(())
        })?;
    Ok(())
}

fn register_inventory(registry: &MetadataRegistry) -> Result<(), AnnotationError> {
    ClassBuilder::<Inventory>::new(registry)
        .display_name("Inventory store")?
        .tags(["db"])?
        .before_all("stock_shelves", |this: Arc<Inventory>| async move {
            this.items.lock().await.push("gadget".to_string());
            Ok(())
        })?
        .after_each("log_stock", |this: Arc<Inventory>| async move {
            let items = this.items.lock().await.len();
            tracing::debug!(items, "stock after test");
            Ok(())
        })?
        .test_with(
            "adds_item",
            TestOptions::new().with_order(1),
            |this: Arc<Inventory>| async move {
                let mut items = this.items.lock().await;
                items.push("gizmo".to_string());
                ensure!(items.len() == 3, "expected 3 items, found {}", items.len());
                Ok(())
            },
        )?
        .test("lists_seeded_items", |this: Arc<Inventory>| async move {
            let items = this.items.lock().await;
            ensure!(items.iter().any(|i| i == "widget"), "seeded item missing: {items:?}");
            Ok(())
        })?
        .test_with(
            "syncs_with_client_cache",
            TestOptions::new().with_environment(Environment::Client),
            |_: Arc<Inventory>| async move { Ok(()) },
        )?
        .test_with(
            "reindexes",
            TestOptions::new().with_tags(["slow"]).with_timeout_ms(1_000),
            |this: Arc<Inventory>| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let mut items = this.items.lock().await;
                items.sort();
                Ok(())
            },
        )?;
    Ok(())
}
