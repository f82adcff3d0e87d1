//! Object templates and the property-handler table
//!
//! A template carries the ten interception hooks a host installs once per
//! execution context; every object instantiated from it routes property
//! operations through those hooks before the engine's default behavior.
//!
//! A hook returning `Ok(None)` signals "no interception occurred": the
//! engine proceeds with its built-in property semantics.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::EngineResult;
use crate::object::{GuestObject, PropertyAttributes};
use crate::value::GuestValue;

/// Named-property getter hook
pub type NamedGetter =
    Arc<dyn Fn(&GuestValue, &str) -> EngineResult<Option<GuestValue>> + Send + Sync>;
/// Named-property setter hook
pub type NamedSetter =
    Arc<dyn Fn(&GuestValue, &str, &GuestValue) -> EngineResult<Option<GuestValue>> + Send + Sync>;
/// Named-property query hook
pub type NamedQuery =
    Arc<dyn Fn(&GuestValue, &str) -> EngineResult<Option<PropertyAttributes>> + Send + Sync>;
/// Named-property deleter hook
pub type NamedDeleter =
    Arc<dyn Fn(&GuestValue, &str) -> EngineResult<Option<GuestValue>> + Send + Sync>;
/// Named-property enumerator hook
pub type NamedEnumerator =
    Arc<dyn Fn(&GuestValue) -> EngineResult<Option<Vec<Arc<str>>>> + Send + Sync>;

/// Indexed-property getter hook
pub type IndexedGetter =
    Arc<dyn Fn(&GuestValue, u32) -> EngineResult<Option<GuestValue>> + Send + Sync>;
/// Indexed-property setter hook
pub type IndexedSetter =
    Arc<dyn Fn(&GuestValue, u32, &GuestValue) -> EngineResult<Option<GuestValue>> + Send + Sync>;
/// Indexed-property query hook
pub type IndexedQuery =
    Arc<dyn Fn(&GuestValue, u32) -> EngineResult<Option<PropertyAttributes>> + Send + Sync>;
/// Indexed-property deleter hook
pub type IndexedDeleter =
    Arc<dyn Fn(&GuestValue, u32) -> EngineResult<Option<GuestValue>> + Send + Sync>;
/// Indexed-property enumerator hook
pub type IndexedEnumerator =
    Arc<dyn Fn(&GuestValue) -> EngineResult<Option<Vec<u32>>> + Send + Sync>;

/// The ten interception hook slots.
///
/// Unset slots fall through to default behavior unconditionally.
#[derive(Clone, Default)]
pub struct PropertyHandlers {
    /// Named get
    pub named_getter: Option<NamedGetter>,
    /// Named set
    pub named_setter: Option<NamedSetter>,
    /// Named query
    pub named_query: Option<NamedQuery>,
    /// Named delete
    pub named_deleter: Option<NamedDeleter>,
    /// Named enumerate
    pub named_enumerator: Option<NamedEnumerator>,
    /// Indexed get
    pub indexed_getter: Option<IndexedGetter>,
    /// Indexed set
    pub indexed_setter: Option<IndexedSetter>,
    /// Indexed query
    pub indexed_query: Option<IndexedQuery>,
    /// Indexed delete
    pub indexed_deleter: Option<IndexedDeleter>,
    /// Indexed enumerate
    pub indexed_enumerator: Option<IndexedEnumerator>,
}

impl std::fmt::Debug for PropertyHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyHandlers")
            .field("named_getter", &self.named_getter.is_some())
            .field("named_setter", &self.named_setter.is_some())
            .field("named_query", &self.named_query.is_some())
            .field("named_deleter", &self.named_deleter.is_some())
            .field("named_enumerator", &self.named_enumerator.is_some())
            .field("indexed_getter", &self.indexed_getter.is_some())
            .field("indexed_setter", &self.indexed_setter.is_some())
            .field("indexed_query", &self.indexed_query.is_some())
            .field("indexed_deleter", &self.indexed_deleter.is_some())
            .field("indexed_enumerator", &self.indexed_enumerator.is_some())
            .finish()
    }
}

/// A template guest objects are instantiated from
#[derive(Default)]
pub struct ObjectTemplate {
    handlers: RwLock<Option<Arc<PropertyHandlers>>>,
}

impl ObjectTemplate {
    /// Create an empty template
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a handler table on this template.
    ///
    /// Only instances created afterwards see the new table.
    pub fn set_handlers(&self, handlers: PropertyHandlers) {
        *self.handlers.write() = Some(Arc::new(handlers));
    }

    /// The installed handler table, if any
    pub fn handlers(&self) -> Option<Arc<PropertyHandlers>> {
        self.handlers.read().clone()
    }

    /// Instantiate an object bound to this template's handlers
    pub fn instance(&self) -> Arc<GuestObject> {
        match self.handlers() {
            Some(handlers) => Arc::new(GuestObject::with_handlers(handlers)),
            None => Arc::new(GuestObject::new()),
        }
    }
}
