//! Interceptor dispatch
//!
//! The ten property-interception hooks the guest engine invokes on
//! host-backed objects. Every hook follows one protocol: resolve the guest
//! receiver to its host value, run the policy call under protection, and
//! either convert the handled result to guest representation or return the
//! engine's "no interception occurred" sentinel so default property
//! behavior takes over.

use std::sync::Arc;
use tracing::trace;

use causeway_engine::{
    EngineError, EngineResult, GuestValue, ObjectTemplate, PropertyAttributes, PropertyHandlers,
};

use crate::access::{AccessPolicy, Outcome, PolicyResult};
use crate::error::HostFailure;
use crate::host::HostValue;
use crate::portal::Portal;

/// The ten interception hook kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookKind {
    /// Named property read
    NamedGet,
    /// Named property write
    NamedSet,
    /// Named property attribute query
    NamedQuery,
    /// Named property deletion
    NamedDelete,
    /// Named property enumeration
    NamedEnumerate,
    /// Indexed property read
    IndexedGet,
    /// Indexed property write
    IndexedSet,
    /// Indexed property attribute query
    IndexedQuery,
    /// Indexed property deletion
    IndexedDelete,
    /// Indexed property enumeration
    IndexedEnumerate,
}

impl HookKind {
    /// Stable name for diagnostics
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NamedGet => "named_get",
            Self::NamedSet => "named_set",
            Self::NamedQuery => "named_query",
            Self::NamedDelete => "named_delete",
            Self::NamedEnumerate => "named_enumerate",
            Self::IndexedGet => "indexed_get",
            Self::IndexedSet => "indexed_set",
            Self::IndexedQuery => "indexed_query",
            Self::IndexedDelete => "indexed_delete",
            Self::IndexedEnumerate => "indexed_enumerate",
        }
    }
}

impl Portal {
    /// One generic interception step, parameterized by the policy call and
    /// the conversion the hook kind needs.
    ///
    /// `Ok(None)` means the policy declined and the engine should fall back
    /// to its default property behavior. A recoverable policy failure is
    /// raised as a guest exception and abandons the property operation;
    /// fatal failures pass through untranslated.
    fn intercept<T, U>(
        &self,
        kind: HookKind,
        this: &GuestValue,
        call: impl FnOnce(&dyn AccessPolicy, &HostValue) -> PolicyResult<T>,
        convert: impl FnOnce(&Portal, T) -> EngineResult<U>,
    ) -> EngineResult<Option<U>> {
        let receiver = self.to_host(this);
        trace!(hook = kind.as_str(), "dispatching interceptor");
        match call(self.policy().as_ref(), &receiver) {
            Ok(Outcome::Handled(result)) => Ok(Some(convert(self, result)?)),
            Ok(Outcome::Declined) => {
                trace!(hook = kind.as_str(), "policy declined, using default behavior");
                Ok(None)
            }
            Err(HostFailure::Fatal(fatal)) => Err(EngineError::Fatal(fatal)),
            Err(HostFailure::Recoverable(cause)) => Err(self.raise_host_error(cause)),
        }
    }

    /// Build the property-handler table for this portal.
    ///
    /// The table is stateless beyond the portal binding and is shared by
    /// every template it is installed on.
    pub fn handlers(&self) -> PropertyHandlers {
        let mut handlers = PropertyHandlers::default();

        let p = self.clone();
        handlers.named_getter = Some(Arc::new(move |this, name| {
            p.intercept(
                HookKind::NamedGet,
                this,
                |policy, receiver| policy.get(receiver, name),
                |portal, value| portal.to_guest(&value),
            )
        }));

        let p = self.clone();
        handlers.named_setter = Some(Arc::new(move |this, name, value| {
            // The hook reports the supplied value, not the policy's return,
            // to signal the assignment was intercepted.
            let host_value = p.to_host(value);
            let supplied = value.clone();
            p.intercept(
                HookKind::NamedSet,
                this,
                |policy, receiver| policy.set(receiver, name, &host_value),
                move |_portal, _result| Ok(supplied),
            )
        }));

        let p = self.clone();
        handlers.named_query = Some(Arc::new(move |this, name| {
            p.intercept(
                HookKind::NamedQuery,
                this,
                |policy, receiver| policy.query(receiver, name),
                |_portal, attributes| Ok(attributes),
            )
        }));

        let p = self.clone();
        handlers.named_deleter = Some(Arc::new(move |this, name| {
            p.intercept(
                HookKind::NamedDelete,
                this,
                |policy, receiver| policy.delete(receiver, name),
                |portal, value| portal.to_guest(&value),
            )
        }));

        let p = self.clone();
        handlers.named_enumerator = Some(Arc::new(move |this| {
            // Enumeration never declines: a declining policy contributes an
            // empty name sequence.
            let names = p.intercept(
                HookKind::NamedEnumerate,
                this,
                |policy, receiver| policy.names(receiver),
                |_portal, names| Ok(names.into_iter().map(Arc::<str>::from).collect::<Vec<_>>()),
            )?;
            Ok(Some(names.unwrap_or_default()))
        }));

        let p = self.clone();
        handlers.indexed_getter = Some(Arc::new(move |this, index| {
            p.intercept(
                HookKind::IndexedGet,
                this,
                |policy, receiver| policy.iget(receiver, index),
                |portal, value| portal.to_guest(&value),
            )
        }));

        let p = self.clone();
        handlers.indexed_setter = Some(Arc::new(move |this, index, value| {
            let host_value = p.to_host(value);
            let supplied = value.clone();
            p.intercept(
                HookKind::IndexedSet,
                this,
                |policy, receiver| policy.iset(receiver, index, &host_value),
                move |_portal, _result| Ok(supplied),
            )
        }));

        let p = self.clone();
        handlers.indexed_query = Some(Arc::new(move |this, index| {
            // Aliases the enumeration call: an index is reported with empty
            // attributes when the policy's indices contain it.
            let resolved = p.intercept(
                HookKind::IndexedQuery,
                this,
                |policy, receiver| policy.indices(receiver),
                |_portal, indices| Ok(indices),
            )?;
            Ok(resolved.and_then(|indices| indices.contains(&index).then(PropertyAttributes::none)))
        }));

        let p = self.clone();
        handlers.indexed_deleter = Some(Arc::new(move |this, index| {
            p.intercept(
                HookKind::IndexedDelete,
                this,
                |policy, receiver| policy.idelete(receiver, index),
                |portal, value| portal.to_guest(&value),
            )
        }));

        let p = self.clone();
        handlers.indexed_enumerator = Some(Arc::new(move |this| {
            let indices = p.intercept(
                HookKind::IndexedEnumerate,
                this,
                |policy, receiver| policy.indices(receiver),
                |_portal, indices| Ok(indices),
            )?;
            Ok(Some(indices.unwrap_or_default()))
        }));

        handlers
    }

    /// Install this portal's property handlers on a guest object template
    pub fn install_handlers(&self, template: &ObjectTemplate) {
        template.set_handlers(self.handlers());
    }

    /// Create a template with this portal's handlers installed
    pub fn object_template(&self) -> Arc<ObjectTemplate> {
        let template = Arc::new(ObjectTemplate::new());
        self.install_handlers(&template);
        template
    }
}
