//! # Causeway Engine
//!
//! Boundary surface of an embedded guest execution engine: the value model,
//! objects with hidden slots, object templates with property-interception
//! hooks, scoped context entry, and the engine error taxonomy.
//!
//! This crate deliberately stops at the boundary — script compilation,
//! execution, and garbage collection belong to a full engine, not to the
//! contract a host embeds against.
//!
//! ## Design Principles
//!
//! - **Thread-safe**: values and objects are `Send + Sync`; a context is
//!   still driven by one logical thread at a time
//! - **Reentrant**: no lock is held across an interception hook, so hooks
//!   may call back into the context to unbounded depth
//! - **Hidden slots**: hosts can annotate objects out of band; hidden values
//!   never leak into property operations

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod object;
pub mod template;
pub mod value;

pub use context::{ContextScope, GuestContext};
pub use error::{EngineError, EngineResult, FatalError, ThrownValue};
pub use object::{GuestObject, PropertyAttributes, PropertyEntry, PropertyKey};
pub use template::{ObjectTemplate, PropertyHandlers};
pub use value::{External, GuestFunction, GuestValue, NativeFn};
