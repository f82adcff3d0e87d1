//! Execution context boundary
//!
//! One `GuestContext` stands for one engine execution context. It provides
//! scoped entry and the default property semantics the engine applies when a
//! hook declines. All operations are synchronous and reentrant: a hook may
//! call back into the context to unbounded depth, since no lock is held
//! across a hook invocation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EngineResult;
use crate::object::{GuestObject, PropertyAttributes, PropertyKey};
use crate::value::GuestValue;

/// One guest execution context.
///
/// Contexts are fully isolated from each other; nothing here is shared
/// between two contexts.
pub struct GuestContext {
    depth: AtomicUsize,
}

impl GuestContext {
    /// Create a new context
    pub fn new() -> Self {
        Self {
            depth: AtomicUsize::new(0),
        }
    }

    /// Enter the context for a unit of work.
    ///
    /// The returned scope deactivates the context on drop, so every exit
    /// path (normal return, declined interception, exception) balances the
    /// entry.
    pub fn enter(&self) -> ContextScope<'_> {
        self.depth.fetch_add(1, Ordering::Relaxed);
        ContextScope { context: self }
    }

    /// Whether the context is currently active
    pub fn is_entered(&self) -> bool {
        self.depth.load(Ordering::Relaxed) > 0
    }

    /// Current entry depth (nested entries are counted)
    pub fn entry_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Read a property, consulting the object's handlers first.
    ///
    /// Falls back to the own-property table and yields `Undefined` for an
    /// unset property, matching default lookup.
    pub fn get(&self, object: &Arc<GuestObject>, key: &PropertyKey) -> EngineResult<GuestValue> {
        if let Some(handlers) = object.handlers().cloned() {
            let this = GuestValue::Object(object.clone());
            match key {
                PropertyKey::Named(name) => {
                    if let Some(getter) = &handlers.named_getter {
                        if let Some(value) = getter(&this, name)? {
                            return Ok(value);
                        }
                    }
                }
                PropertyKey::Index(index) => {
                    if let Some(getter) = &handlers.indexed_getter {
                        if let Some(value) = getter(&this, *index)? {
                            return Ok(value);
                        }
                    }
                }
            }
        }
        Ok(object.get_own(key).unwrap_or(GuestValue::Undefined))
    }

    /// Write a property, consulting the object's handlers first.
    ///
    /// A handler returning a value signals the assignment was intercepted;
    /// otherwise the own-property table is written.
    pub fn set(
        &self,
        object: &Arc<GuestObject>,
        key: &PropertyKey,
        value: GuestValue,
    ) -> EngineResult<()> {
        if let Some(handlers) = object.handlers().cloned() {
            let this = GuestValue::Object(object.clone());
            match key {
                PropertyKey::Named(name) => {
                    if let Some(setter) = &handlers.named_setter {
                        if setter(&this, name, &value)?.is_some() {
                            return Ok(());
                        }
                    }
                }
                PropertyKey::Index(index) => {
                    if let Some(setter) = &handlers.indexed_setter {
                        if setter(&this, *index, &value)?.is_some() {
                            return Ok(());
                        }
                    }
                }
            }
        }
        object.set_own(key.clone(), value);
        Ok(())
    }

    /// Query a property's attributes, consulting the object's handlers first
    pub fn query(
        &self,
        object: &Arc<GuestObject>,
        key: &PropertyKey,
    ) -> EngineResult<Option<PropertyAttributes>> {
        if let Some(handlers) = object.handlers().cloned() {
            let this = GuestValue::Object(object.clone());
            match key {
                PropertyKey::Named(name) => {
                    if let Some(query) = &handlers.named_query {
                        if let Some(attributes) = query(&this, name)? {
                            return Ok(Some(attributes));
                        }
                    }
                }
                PropertyKey::Index(index) => {
                    if let Some(query) = &handlers.indexed_query {
                        if let Some(attributes) = query(&this, *index)? {
                            return Ok(Some(attributes));
                        }
                    }
                }
            }
        }
        Ok(object.own_attributes(key))
    }

    /// Whether a property is present (intercepted or own)
    pub fn has(&self, object: &Arc<GuestObject>, key: &PropertyKey) -> EngineResult<bool> {
        Ok(self.query(object, key)?.is_some())
    }

    /// Delete a property, consulting the object's handlers first.
    ///
    /// A handler result is interpreted by truthiness; fall-through deletes
    /// from the own-property table.
    pub fn delete(&self, object: &Arc<GuestObject>, key: &PropertyKey) -> EngineResult<bool> {
        if let Some(handlers) = object.handlers().cloned() {
            let this = GuestValue::Object(object.clone());
            match key {
                PropertyKey::Named(name) => {
                    if let Some(deleter) = &handlers.named_deleter {
                        if let Some(result) = deleter(&this, name)? {
                            return Ok(result.is_truthy());
                        }
                    }
                }
                PropertyKey::Index(index) => {
                    if let Some(deleter) = &handlers.indexed_deleter {
                        if let Some(result) = deleter(&this, *index)? {
                            return Ok(result.is_truthy());
                        }
                    }
                }
            }
        }
        Ok(object.delete_own(key))
    }

    /// Enumerate a property's names: intercepted indices first, then
    /// intercepted names, then own enumerable keys not already reported.
    pub fn own_property_names(&self, object: &Arc<GuestObject>) -> EngineResult<Vec<PropertyKey>> {
        let mut keys: Vec<PropertyKey> = Vec::new();
        if let Some(handlers) = object.handlers().cloned() {
            let this = GuestValue::Object(object.clone());
            if let Some(enumerator) = &handlers.indexed_enumerator {
                if let Some(indices) = enumerator(&this)? {
                    keys.extend(indices.into_iter().map(PropertyKey::Index));
                }
            }
            if let Some(enumerator) = &handlers.named_enumerator {
                if let Some(names) = enumerator(&this)? {
                    keys.extend(names.into_iter().map(PropertyKey::Named));
                }
            }
        }
        for key in object.enumerable_keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Construct an error-shaped guest object with a message property
    pub fn new_error(&self, message: &str) -> GuestValue {
        let error = GuestObject::new();
        error.set_own("name".into(), GuestValue::string("Error"));
        error.set_own("message".into(), GuestValue::string(message));
        GuestValue::Object(Arc::new(error))
    }
}

impl Default for GuestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII scope marking the context active
pub struct ContextScope<'a> {
    context: &'a GuestContext,
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        self.context.depth.fetch_sub(1, Ordering::Relaxed);
    }
}
