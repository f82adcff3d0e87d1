//! Constructor registry
//!
//! Maps a host object category to the guest object template its wrappers
//! are instantiated from. Owned by one portal, populated at build time,
//! extendable afterwards; unknown categories fall back to a generic
//! template so every opaque host object remains representable.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use causeway_engine::ObjectTemplate;

/// Category-keyed registry of proxy templates
pub struct ConstructorRegistry {
    templates: RwLock<FxHashMap<Arc<str>, Arc<ObjectTemplate>>>,
    fallback: Arc<ObjectTemplate>,
}

impl ConstructorRegistry {
    pub(crate) fn new(fallback: Arc<ObjectTemplate>) -> Self {
        Self {
            templates: RwLock::new(FxHashMap::default()),
            fallback,
        }
    }

    /// Register a template for a category, replacing any previous one
    pub fn register(&self, category: &str, template: Arc<ObjectTemplate>) {
        self.templates.write().insert(Arc::from(category), template);
    }

    /// The template for a category, or the generic fallback
    pub fn template_for(&self, category: &str) -> Arc<ObjectTemplate> {
        self.templates
            .read()
            .get(category)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// Whether a category has its own template
    pub fn contains(&self, category: &str) -> bool {
        self.templates.read().contains_key(category)
    }
}
