//! Guest objects
//!
//! Objects keep their own properties in insertion order, carry a dense
//! element store for array-like access, and hold a hidden-value table the
//! host can use for out-of-band annotations. Hidden values never show up in
//! property lookup, enumeration, or deletion.

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::template::PropertyHandlers;
use crate::value::GuestValue;

/// Property key (name or array index)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Named property key
    Named(Arc<str>),
    /// Integer index (for arrays)
    Index(u32),
}

impl PropertyKey {
    /// Create a named property key
    pub fn named(s: &str) -> Self {
        Self::Named(Arc::from(s))
    }

    /// Create an index property key
    pub fn index(i: u32) -> Self {
        Self::Index(i)
    }

    /// The name behind this key, if it is named
    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(s) => Some(s),
            Self::Index(_) => None,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::named(s)
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        Self::Index(i)
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(s) => write!(f, "{s}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Property attribute flags.
///
/// All flags are unset by default. Builder methods are idempotent; setting
/// the same flag twice is a no-op.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropertyAttributes {
    bits: u8,
}

impl PropertyAttributes {
    /// Flag bit: assignments are rejected
    pub const READ_ONLY: u8 = 1 << 0;
    /// Flag bit: hidden from enumeration
    pub const DONT_ENUM: u8 = 1 << 1;
    /// Flag bit: deletion is rejected
    pub const DONT_DELETE: u8 = 1 << 2;

    /// All flags unset
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    /// Set the read-only flag
    pub const fn read_only(self) -> Self {
        Self {
            bits: self.bits | Self::READ_ONLY,
        }
    }

    /// Set the non-enumerable flag
    pub const fn dont_enum(self) -> Self {
        Self {
            bits: self.bits | Self::DONT_ENUM,
        }
    }

    /// Set the non-deletable flag
    pub const fn dont_delete(self) -> Self {
        Self {
            bits: self.bits | Self::DONT_DELETE,
        }
    }

    /// Raw flag bits
    pub const fn bits(self) -> u8 {
        self.bits
    }

    /// Whether the read-only flag is set
    pub const fn is_read_only(self) -> bool {
        self.bits & Self::READ_ONLY != 0
    }

    /// Whether the non-enumerable flag is set
    pub const fn is_dont_enum(self) -> bool {
        self.bits & Self::DONT_ENUM != 0
    }

    /// Whether the non-deletable flag is set
    pub const fn is_dont_delete(self) -> bool {
        self.bits & Self::DONT_DELETE != 0
    }
}

/// A property slot: value plus attributes
#[derive(Clone, Debug)]
pub struct PropertyEntry {
    /// The value
    pub value: GuestValue,
    /// Attribute flags
    pub attributes: PropertyAttributes,
}

/// A guest object
///
/// Thread-safe with interior mutability. The handler table is fixed at
/// instantiation; no lock is ever held across a handler invocation.
pub struct GuestObject {
    /// Own properties, insertion-ordered
    properties: RwLock<IndexMap<PropertyKey, PropertyEntry>>,
    /// Dense elements (for array-like objects)
    elements: RwLock<Vec<GuestValue>>,
    /// Hidden values, invisible to every property operation
    hidden: RwLock<FxHashMap<Arc<str>, GuestValue>>,
    /// Interception hooks installed from a template
    handlers: Option<Arc<PropertyHandlers>>,
    /// Is this an array
    is_array: bool,
}

impl GuestObject {
    /// Create a new empty object
    pub fn new() -> Self {
        Self {
            properties: RwLock::new(IndexMap::new()),
            elements: RwLock::new(Vec::new()),
            hidden: RwLock::new(FxHashMap::default()),
            handlers: None,
            is_array: false,
        }
    }

    /// Create a new array with `len` undefined elements
    pub fn array(len: usize) -> Self {
        let mut obj = Self::new();
        obj.is_array = true;
        obj.elements.write().resize(len, GuestValue::Undefined);
        obj
    }

    /// Create an object bound to a handler table
    pub fn with_handlers(handlers: Arc<PropertyHandlers>) -> Self {
        let mut obj = Self::new();
        obj.handlers = Some(handlers);
        obj
    }

    /// The installed handler table, if any
    pub fn handlers(&self) -> Option<&Arc<PropertyHandlers>> {
        self.handlers.as_ref()
    }

    /// Get an own property or element
    pub fn get_own(&self, key: &PropertyKey) -> Option<GuestValue> {
        if let Some(entry) = self.properties.read().get(key) {
            return Some(entry.value.clone());
        }

        if let PropertyKey::Index(i) = key {
            let elements = self.elements.read();
            if (*i as usize) < elements.len() {
                return Some(elements[*i as usize].clone());
            }
        }

        None
    }

    /// Set an own property or element.
    ///
    /// Returns false when the property exists and is read-only.
    pub fn set_own(&self, key: PropertyKey, value: GuestValue) -> bool {
        if let PropertyKey::Index(i) = &key {
            let mut elements = self.elements.write();
            let idx = *i as usize;
            if idx < elements.len() {
                elements[idx] = value;
                return true;
            }
            if self.is_array {
                elements.resize(idx + 1, GuestValue::Undefined);
                elements[idx] = value;
                return true;
            }
        }

        let mut properties = self.properties.write();
        if let Some(entry) = properties.get_mut(&key) {
            if entry.attributes.is_read_only() {
                return false;
            }
            entry.value = value;
            return true;
        }
        properties.insert(
            key,
            PropertyEntry {
                value,
                attributes: PropertyAttributes::none(),
            },
        );
        true
    }

    /// Define a property with explicit attributes, replacing any existing slot
    pub fn define(&self, key: PropertyKey, value: GuestValue, attributes: PropertyAttributes) {
        self.properties
            .write()
            .insert(key, PropertyEntry { value, attributes });
    }

    /// Delete an own property.
    ///
    /// Returns false when absent or flagged non-deletable.
    pub fn delete_own(&self, key: &PropertyKey) -> bool {
        let mut properties = self.properties.write();
        match properties.get(key) {
            Some(entry) if entry.attributes.is_dont_delete() => return false,
            Some(_) => {}
            None => return false,
        }
        properties.shift_remove(key).is_some()
    }

    /// Whether an own property or element exists
    pub fn has_own(&self, key: &PropertyKey) -> bool {
        if self.properties.read().contains_key(key) {
            return true;
        }
        if let PropertyKey::Index(i) = key {
            return (*i as usize) < self.elements.read().len();
        }
        false
    }

    /// Attributes of an own property, if present
    pub fn own_attributes(&self, key: &PropertyKey) -> Option<PropertyAttributes> {
        if let Some(entry) = self.properties.read().get(key) {
            return Some(entry.attributes);
        }
        if let PropertyKey::Index(i) = key {
            if (*i as usize) < self.elements.read().len() {
                return Some(PropertyAttributes::none());
            }
        }
        None
    }

    /// All own keys: element indices first, then named keys in insertion order
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> =
            (0..self.elements.read().len() as u32).map(PropertyKey::Index).collect();
        keys.extend(self.properties.read().keys().cloned());
        keys
    }

    /// Own keys visible to enumeration
    pub fn enumerable_keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> =
            (0..self.elements.read().len() as u32).map(PropertyKey::Index).collect();
        keys.extend(
            self.properties
                .read()
                .iter()
                .filter(|(_, entry)| !entry.attributes.is_dont_enum())
                .map(|(key, _)| key.clone()),
        );
        keys
    }

    /// Is this an array
    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Element count
    pub fn array_len(&self) -> usize {
        self.elements.read().len()
    }

    /// Read an element
    pub fn element(&self, index: usize) -> Option<GuestValue> {
        self.elements.read().get(index).cloned()
    }

    /// Write an element, growing the store as needed
    pub fn set_element(&self, index: usize, value: GuestValue) {
        let mut elements = self.elements.write();
        if index >= elements.len() {
            elements.resize(index + 1, GuestValue::Undefined);
        }
        elements[index] = value;
    }

    /// Store a hidden value.
    ///
    /// Hidden values are keyed by a string the host chooses and are never
    /// observable through get/set/delete/enumerate.
    pub fn set_hidden(&self, key: &str, value: GuestValue) {
        self.hidden.write().insert(Arc::from(key), value);
    }

    /// Read a hidden value
    pub fn get_hidden(&self, key: &str) -> Option<GuestValue> {
        self.hidden.read().get(key).cloned()
    }
}

impl Default for GuestObject {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GuestObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestObject")
            .field("properties", &self.properties.read().len())
            .field("elements", &self.elements.read().len())
            .field("is_array", &self.is_array)
            .finish()
    }
}
