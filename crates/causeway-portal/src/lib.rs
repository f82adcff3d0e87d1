//! # Causeway Portal
//!
//! Bridges two independent object models — a Rust host and an embedded
//! guest execution engine — so values, objects, exceptions, and property
//! accesses cross the boundary transparently and without identity loss.
//!
//! The pieces:
//!
//! - **Value bridge** (`Portal::to_host` / `Portal::to_guest`) converts
//!   primitives, strings, dates, lists, maps, functions, and opaque host
//!   objects in both directions
//! - **Identity registry** keeps one wrapper per host object and resolves
//!   wrappers back to the exact object they proxy
//! - **Exception bridge** (`Portal::protect`) translates recoverable host
//!   failures into guest-catchable exceptions carrying the original cause;
//!   fatal failures propagate unchanged
//! - **Interceptor dispatch** implements the ten property hooks the engine
//!   invokes on host-backed objects, honoring the policy's decline signal
//! - **Portal** composes all of the above for one execution context
//!
//! The mapping from a host object's attributes to property names is not
//! decided here: it is supplied as an [`AccessPolicy`].

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod access;
pub mod constructors;
pub mod error;
pub mod host;
pub mod identity;
pub mod interceptor;
pub mod portal;
pub mod protect;
pub mod value;

pub use access::{AccessPolicy, DeclinePolicy, Outcome, PolicyResult};
pub use constructors::ConstructorRegistry;
pub use error::{FatalError, HostError, HostFailure, HostResult};
pub use host::{GuestKind, GuestRef, HostConstructor, HostFn, HostObject, HostValue};
pub use identity::IdentityRegistry;
pub use interceptor::HookKind;
pub use portal::{Portal, PortalBuilder};

// Re-exported for convenience
pub use causeway_engine as engine;
