//! Host failure taxonomy
//!
//! Two classes: recoverable failures are translated into guest-catchable
//! exceptions with the original cause preserved; fatal failures propagate
//! past every layer of the bridge unchanged.

use std::sync::Arc;
use thiserror::Error;

pub use causeway_engine::FatalError;

use crate::host::HostObject;

/// A recoverable host failure.
///
/// Carries a human-readable message and an optional opaque payload. The
/// failure object itself is the cause attached to the translated guest
/// exception, so the `Arc` identity survives the round trip.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
    payload: Option<HostObject>,
}

impl HostError {
    /// Create a failure with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            payload: None,
        }
    }

    /// Create a failure carrying an opaque payload
    pub fn with_payload(message: impl Into<String>, payload: HostObject) -> Self {
        Self {
            message: message.into(),
            payload: Some(payload),
        }
    }

    /// Failure message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Attached payload, if any
    pub fn payload(&self) -> Option<&HostObject> {
        self.payload.as_ref()
    }
}

/// A failure raised by host logic running under protection
#[derive(Debug, Error, Clone)]
pub enum HostFailure {
    /// Translated into a guest exception carrying the original cause
    #[error("{0}")]
    Recoverable(Arc<HostError>),

    /// Never translated; propagates unchanged
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl HostFailure {
    /// Create a recoverable failure from a message
    pub fn error(message: impl Into<String>) -> Self {
        Self::Recoverable(Arc::new(HostError::new(message)))
    }

    /// Create a recoverable failure carrying an opaque payload
    pub fn error_with_payload(message: impl Into<String>, payload: HostObject) -> Self {
        Self::Recoverable(Arc::new(HostError::with_payload(message, payload)))
    }

    /// Whether this failure belongs to the fatal class
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Result type for host logic crossing the bridge
pub type HostResult<T> = std::result::Result<T, HostFailure>;
