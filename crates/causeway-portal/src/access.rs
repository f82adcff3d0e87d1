//! Access policy interface
//!
//! The policy decides how a host object's attributes map to guest property
//! names. It is supplied by the embedder; the bridge only dispatches to it.
//! Every method returns an explicit outcome: `Handled` with a result, or
//! `Declined` to fall back to the engine's default property behavior.

use causeway_engine::PropertyAttributes;

use crate::error::HostFailure;
use crate::host::HostValue;

/// Outcome of one policy call
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The policy handled the access
    Handled(T),
    /// The policy is not handling this access; use default behavior
    Declined,
}

impl<T> Outcome<T> {
    /// `Some` when handled
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Handled(value) => Some(value),
            Self::Declined => None,
        }
    }
}

/// Result type for policy calls
pub type PolicyResult<T> = std::result::Result<Outcome<T>, HostFailure>;

/// How a host receiver's attributes surface as guest properties.
///
/// Implemented externally; all methods default to `Declined`, so a policy
/// implements only the accesses it intercepts. Policies should be atomic
/// per call: a failure abandons the property operation with no partial
/// mutation guaranteed.
pub trait AccessPolicy: Send + Sync {
    /// Read a named property
    fn get(&self, receiver: &HostValue, key: &str) -> PolicyResult<HostValue> {
        let _ = (receiver, key);
        Ok(Outcome::Declined)
    }

    /// Write a named property
    fn set(&self, receiver: &HostValue, key: &str, value: &HostValue) -> PolicyResult<HostValue> {
        let _ = (receiver, key, value);
        Ok(Outcome::Declined)
    }

    /// Report a named property's attributes
    fn query(&self, receiver: &HostValue, key: &str) -> PolicyResult<PropertyAttributes> {
        let _ = (receiver, key);
        Ok(Outcome::Declined)
    }

    /// Delete a named property
    fn delete(&self, receiver: &HostValue, key: &str) -> PolicyResult<HostValue> {
        let _ = (receiver, key);
        Ok(Outcome::Declined)
    }

    /// Enumerate named property keys, in order
    fn names(&self, receiver: &HostValue) -> PolicyResult<Vec<String>> {
        let _ = receiver;
        Ok(Outcome::Declined)
    }

    /// Read an indexed property
    fn iget(&self, receiver: &HostValue, index: u32) -> PolicyResult<HostValue> {
        let _ = (receiver, index);
        Ok(Outcome::Declined)
    }

    /// Write an indexed property
    fn iset(&self, receiver: &HostValue, index: u32, value: &HostValue) -> PolicyResult<HostValue> {
        let _ = (receiver, index, value);
        Ok(Outcome::Declined)
    }

    /// Delete an indexed property
    fn idelete(&self, receiver: &HostValue, index: u32) -> PolicyResult<HostValue> {
        let _ = (receiver, index);
        Ok(Outcome::Declined)
    }

    /// Enumerate indexed property indices, in order.
    ///
    /// Also backs the indexed query hook; see `HookKind::IndexedQuery`.
    fn indices(&self, receiver: &HostValue) -> PolicyResult<Vec<u32>> {
        let _ = receiver;
        Ok(Outcome::Declined)
    }
}

/// A policy that declines every access
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclinePolicy;

impl AccessPolicy for DeclinePolicy {}
