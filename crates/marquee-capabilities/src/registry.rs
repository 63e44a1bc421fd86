//! The capability catalog — an explicit, statically built table.
//!
//! No runtime discovery, no global singleton: the catalog is constructed
//! once at startup via [`CatalogBuilder`], validated (duplicate names
//! rejected), and passed by reference to the orchestrator and context
//! builder. Iteration order is name order, so rendered context is stable.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use marquee_core::capability::{CapabilityCategory, CapabilityDescriptor};

use crate::help::HelpCapability;
use crate::traits::Capability;

/// Catalog construction errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two capabilities registered under the same name.
    #[error("duplicate capability name '{0}'")]
    DuplicateName(String),
}

/// Builder for [`Catalog`]. Registration happens once, at startup.
#[derive(Default)]
pub struct CatalogBuilder {
    entries: BTreeMap<String, Arc<dyn Capability>>,
}

impl std::fmt::Debug for CatalogBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogBuilder")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CatalogBuilder {
    /// Start an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability under its declared name.
    pub fn register(mut self, capability: Arc<dyn Capability>) -> Result<Self, CatalogError> {
        let name = capability.describe().name;
        if self.entries.contains_key(&name) {
            return Err(CatalogError::DuplicateName(name));
        }
        let _ = self.entries.insert(name, capability);
        Ok(self)
    }

    /// Finish construction.
    pub fn build(self) -> Catalog {
        Catalog {
            entries: self.entries,
        }
    }

    /// Finish construction with a `help` capability included.
    ///
    /// Two-phase: `help` is registered over an empty slot, the catalog is
    /// built, then the slot is filled — so `help` can summarize the very
    /// catalog it lives in.
    pub fn build_with_help(self) -> Result<Arc<Catalog>, CatalogError> {
        let slot = Arc::new(OnceLock::new());
        let catalog = Arc::new(
            self.register(Arc::new(HelpCapability::new(Arc::clone(&slot))))?
                .build(),
        );
        let _ = slot.set(Arc::clone(&catalog));
        Ok(catalog)
    }
}

/// Immutable name → capability table.
pub struct Catalog {
    entries: BTreeMap<String, Arc<dyn Capability>>,
}

impl Catalog {
    /// Look up a capability by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.entries.get(name)
    }

    /// True when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, in name order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// All descriptors, in name order.
    pub fn descriptors(&self) -> Vec<CapabilityDescriptor> {
        self.entries.values().map(|c| c.describe()).collect()
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Human-readable summary grouped by category, for "what can you do"
    /// style questions.
    pub fn summary(&self) -> String {
        let mut by_category: BTreeMap<&'static str, Vec<CapabilityDescriptor>> = BTreeMap::new();
        for descriptor in self.descriptors() {
            by_category
                .entry(category_title(descriptor.category))
                .or_default()
                .push(descriptor);
        }

        let mut out = String::from("I can help you with:\n");
        for (title, descriptors) in by_category {
            out.push_str(&format!("\n**{title}** - {}\n", descriptors[0].category.description()));
            for descriptor in descriptors {
                out.push_str(&format!("  - {}\n", descriptor.purpose));
                if !descriptor.examples.is_empty() {
                    let examples: Vec<String> = descriptor
                        .examples
                        .iter()
                        .take(2)
                        .map(|e| format!("\"{e}\""))
                        .collect();
                    out.push_str(&format!("    For example: {}\n", examples.join(", ")));
                }
            }
        }
        out
    }
}

fn category_title(category: CapabilityCategory) -> &'static str {
    match category {
        CapabilityCategory::Data => "Data",
        CapabilityCategory::Analysis => "Analysis",
        CapabilityCategory::Communication => "Communication",
        CapabilityCategory::General => "General",
    }
}
