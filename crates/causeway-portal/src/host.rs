//! Host-side value model
//!
//! `HostValue` is the tagged union the host hands to and receives from the
//! bridge. Opaque payloads and callables are behind `Arc`, so identity is
//! pointer identity and values are cheap to clone.

use chrono::{DateTime, Utc};
use std::any::Any;
use std::sync::Arc;

use causeway_engine::GuestValue;

use crate::error::HostFailure;

/// A value in the host's object model
#[derive(Clone, Debug)]
pub enum HostValue {
    /// Absent/none value
    Null,
    /// Boolean
    Bool(bool),
    /// Double-precision number
    Number(f64),
    /// String
    Str(String),
    /// Timestamp
    Time(DateTime<Utc>),
    /// Ordered sequence
    List(Vec<HostValue>),
    /// Key-value mapping, insertion-order preserving
    Entries(Vec<(HostValue, HostValue)>),
    /// Host callable
    Callable(HostFn),
    /// Host constructor: guest-side `new` produces an identity-tagged wrapper
    Constructor(HostConstructor),
    /// Opaque host object
    Object(HostObject),
    /// Proxy for a guest object that crossed into the host
    Guest(GuestRef),
}

impl HostValue {
    /// Create a string value
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// True for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The number behind this value, if it is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string slice behind this value, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The opaque host object behind this value, if it is one
    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The guest proxy behind this value, if it is one
    pub fn as_guest(&self) -> Option<&GuestRef> {
        match self {
            Self::Guest(guest) => Some(guest),
            _ => None,
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        Self::List(items)
    }
}

// Primitives compare structurally; opaque variants compare by identity.
impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Entries(a), Self::Entries(b)) => a == b,
            (Self::Callable(a), Self::Callable(b)) => a.same(b),
            (Self::Constructor(a), Self::Constructor(b)) => a.same(b),
            (Self::Object(a), Self::Object(b)) => a.same(b),
            (Self::Guest(a), Self::Guest(b)) => a.same(b),
            _ => false,
        }
    }
}

/// Signature of a host callable
pub type HostCallable =
    Arc<dyn Fn(&[HostValue]) -> Result<HostValue, HostFailure> + Send + Sync>;

/// A variadic host function
#[derive(Clone)]
pub struct HostFn {
    name: Arc<str>,
    body: HostCallable,
}

impl HostFn {
    /// Create a named host function
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostValue, HostFailure> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            body: Arc::new(body),
        }
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke directly, without protection
    pub fn invoke(&self, args: &[HostValue]) -> Result<HostValue, HostFailure> {
        (self.body)(args)
    }

    /// Pointer identity with another function
    pub fn same(&self, other: &HostFn) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl std::fmt::Debug for HostFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HostFn({})", self.name)
    }
}

/// An opaque host object: an `Any` payload plus a category label.
///
/// The category selects the guest-side proxy constructor when the object
/// crosses the boundary. Identity is payload pointer identity.
#[derive(Clone)]
pub struct HostObject {
    category: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    /// Wrap a host value under a category
    pub fn new<T: Any + Send + Sync>(category: &str, payload: T) -> Self {
        Self {
            category: Arc::from(category),
            payload: Arc::new(payload),
        }
    }

    /// Wrap an already-shared payload without re-boxing
    pub fn from_arc(category: &str, payload: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            category: Arc::from(category),
            payload,
        }
    }

    /// Category label
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The raw payload
    pub fn payload(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.payload
    }

    /// Downcast the payload to a concrete type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.payload.clone().downcast::<T>().ok()
    }

    /// Pointer identity with another object
    pub fn same(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }

    pub(crate) fn identity_key(&self) -> usize {
        Arc::as_ptr(&self.payload) as *const () as usize
    }
}

impl std::fmt::Debug for HostObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HostObject({} @ {:p})", self.category, Arc::as_ptr(&self.payload))
    }
}

/// A host constructor: builds a categorized payload from call arguments
#[derive(Clone)]
pub struct HostConstructor {
    category: Arc<str>,
    build: Arc<dyn Fn(&[HostValue]) -> Result<HostObject, HostFailure> + Send + Sync>,
}

impl HostConstructor {
    /// Create a constructor for a category
    pub fn new<F>(category: &str, build: F) -> Self
    where
        F: Fn(&[HostValue]) -> Result<HostObject, HostFailure> + Send + Sync + 'static,
    {
        Self {
            category: Arc::from(category),
            build: Arc::new(build),
        }
    }

    /// Category label of produced objects
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Build a payload, without protection
    pub fn construct(&self, args: &[HostValue]) -> Result<HostObject, HostFailure> {
        (self.build)(args)
    }

    /// Pointer identity with another constructor
    pub fn same(&self, other: &HostConstructor) -> bool {
        Arc::ptr_eq(&self.build, &other.build)
    }
}

impl std::fmt::Debug for HostConstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HostConstructor({})", self.category)
    }
}

/// Shape of a guest value proxied into the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuestKind {
    /// Generic object
    Object,
    /// Ordered array
    Array,
    /// Callable function
    Function,
}

/// A host-side proxy for a guest object, array, or function.
///
/// The wrapped guest value is kept verbatim so converting the proxy back to
/// guest representation returns the identical object.
#[derive(Clone, Debug)]
pub struct GuestRef {
    value: GuestValue,
    kind: GuestKind,
}

impl GuestRef {
    pub(crate) fn new(value: GuestValue, kind: GuestKind) -> Self {
        Self { value, kind }
    }

    /// Shape of the proxied value
    pub fn kind(&self) -> GuestKind {
        self.kind
    }

    /// The wrapped guest value
    pub fn value(&self) -> &GuestValue {
        &self.value
    }

    /// Identity with another proxy
    pub fn same(&self, other: &GuestRef) -> bool {
        self.value == other.value
    }
}
