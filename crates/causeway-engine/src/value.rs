//! Guest values crossing the boundary
//!
//! `GuestValue` is the tagged union an embedding host exchanges with the
//! engine. All heap-allocated variants are behind `Arc`, so values are
//! `Send + Sync` and equality on them is pointer identity.

use crate::error::EngineResult;
use crate::object::GuestObject;
use std::any::Any;
use std::sync::Arc;

/// Native function handler type
pub type NativeFn =
    Arc<dyn Fn(&GuestValue, &[GuestValue]) -> EngineResult<GuestValue> + Send + Sync>;

/// A value in the guest engine's object model
#[derive(Clone)]
pub enum GuestValue {
    /// Absent value
    Undefined,
    /// Null value
    Null,
    /// Boolean
    Boolean(bool),
    /// Double-precision number
    Number(f64),
    /// Immutable string
    String(Arc<str>),
    /// Date as milliseconds since the Unix epoch
    Date(f64),
    /// Object (plain or array)
    Object(Arc<GuestObject>),
    /// Callable function
    Function(Arc<GuestFunction>),
    /// Opaque external handle owned by the host
    External(External),
}

impl GuestValue {
    /// Create a string value
    pub fn string(s: &str) -> Self {
        Self::String(Arc::from(s))
    }

    /// True for `Undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// True for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The object behind this value, if it is one
    pub fn as_object(&self) -> Option<&Arc<GuestObject>> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The function behind this value, if it is one
    pub fn as_function(&self) -> Option<&Arc<GuestFunction>> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The string slice behind this value, if it is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The number behind this value, if it is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The external handle behind this value, if it is one
    pub fn as_external(&self) -> Option<&External> {
        match self {
            Self::External(ext) => Some(ext),
            _ => None,
        }
    }

    /// ToBoolean over the guest model
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            _ => true,
        }
    }
}

// Primitives compare structurally; heap variants compare by identity.
impl PartialEq for GuestValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(a, b),
            (Self::External(a), Self::External(b)) => a.same(b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for GuestValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Date(ms) => write!(f, "Date({ms})"),
            Self::Object(obj) => obj.fmt(f),
            Self::Function(func) => write!(f, "[Function: {}]", func.name()),
            Self::External(_) => write!(f, "[External]"),
        }
    }
}

/// Opaque handle to host-owned data.
///
/// The engine never inspects the payload; it only carries it. Identity is
/// payload pointer identity.
#[derive(Clone)]
pub struct External(Arc<dyn Any + Send + Sync>);

impl External {
    /// Wrap a host value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wrap an already-shared host value without re-boxing
    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self(value)
    }

    /// The raw payload
    pub fn payload(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.0
    }

    /// Downcast the payload to a concrete host type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.0.clone().downcast::<T>().ok()
    }

    /// Pointer identity with another handle
    pub fn same(&self, other: &External) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for External {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "External({:p})", Arc::as_ptr(&self.0))
    }
}

/// A guest function backed by a native handler.
///
/// Arity-erased and variadic; the handler receives the `this` receiver and
/// the argument slice.
pub struct GuestFunction {
    name: String,
    body: NativeFn,
}

impl GuestFunction {
    /// Create a native function
    pub fn native<F>(name: &str, body: F) -> Arc<Self>
    where
        F: Fn(&GuestValue, &[GuestValue]) -> EngineResult<GuestValue> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.to_string(),
            body: Arc::new(body),
        })
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke with an explicit receiver
    pub fn call(&self, this: &GuestValue, args: &[GuestValue]) -> EngineResult<GuestValue> {
        (self.body)(this, args)
    }

    /// Invoke as a constructor.
    ///
    /// A fresh object is passed as the receiver; if the body returns an
    /// object that return value wins, otherwise the fresh receiver is the
    /// instance.
    pub fn construct(&self, args: &[GuestValue]) -> EngineResult<GuestValue> {
        let instance = GuestValue::Object(Arc::new(GuestObject::new()));
        let returned = (self.body)(&instance, args)?;
        Ok(if returned.as_object().is_some() {
            returned
        } else {
            instance
        })
    }
}

impl std::fmt::Debug for GuestFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}
