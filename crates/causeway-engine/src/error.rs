//! Engine error types

use crate::object::PropertyKey;
use crate::value::GuestValue;
use thiserror::Error;

/// Failures no layer of the bridge may catch.
///
/// A fatal error crosses every protection boundary unchanged; the embedding
/// process is expected to unwind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FatalError {
    /// The host requested process termination
    #[error("process exit requested (status {0})")]
    ProcessExit(i32),

    /// Unrecoverable resource exhaustion
    #[error("out of memory")]
    OutOfMemory,
}

/// Errors produced by engine boundary operations
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    /// Type error (e.g., calling a non-function)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// A guest exception in flight
    #[error("uncaught guest exception: {0}")]
    Thrown(Box<ThrownValue>),

    /// Fatal failure, never translated or handled
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// A thrown guest value
#[derive(Debug, Clone)]
pub struct ThrownValue {
    /// The thrown value
    pub value: GuestValue,
    /// Human-readable message extracted from the thrown value
    pub message: String,
}

impl std::fmt::Display for ThrownValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl EngineError {
    /// Create a type error
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create an exception from a thrown guest value.
    ///
    /// The message is taken from the value itself when it is a string, or
    /// from its `message` property when it is an error-like object.
    pub fn thrown(value: GuestValue) -> Self {
        let message = match &value {
            GuestValue::String(s) => s.to_string(),
            GuestValue::Object(obj) => match obj.get_own(&PropertyKey::named("message")) {
                Some(GuestValue::String(s)) => s.to_string(),
                _ => "uncaught exception".to_string(),
            },
            other => format!("{other:?}"),
        };
        Self::Thrown(Box::new(ThrownValue { value, message }))
    }

    /// Whether this error belongs to the fatal class
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Result type for engine boundary operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;
