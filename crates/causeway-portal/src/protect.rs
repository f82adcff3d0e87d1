//! Exception bridge
//!
//! Runs host logic under protection: recoverable failures become
//! guest-catchable exceptions whose hidden cause slot holds the original
//! failure object; fatal failures propagate unchanged past every layer.
//! Failures are local to the protected call — they never invalidate the
//! execution context or other pending calls.

use std::sync::Arc;
use tracing::debug;

use causeway_engine::{EngineError, EngineResult, External, GuestValue};

use crate::access::Outcome;
use crate::error::{HostError, HostFailure};
use crate::host::{HostFn, HostValue};
use crate::portal::{HIDDEN_CAUSE, Portal};

impl Portal {
    /// Run host logic under protection, keeping the host representation.
    ///
    /// A recoverable failure is raised as a guest exception; a fatal one is
    /// returned unchanged.
    pub fn protect_host<F>(&self, block: F) -> EngineResult<HostValue>
    where
        F: FnOnce() -> Result<HostValue, HostFailure>,
    {
        match block() {
            Ok(value) => Ok(value),
            Err(HostFailure::Fatal(fatal)) => Err(EngineError::Fatal(fatal)),
            Err(HostFailure::Recoverable(cause)) => Err(self.raise_host_error(cause)),
        }
    }

    /// Run host logic under protection and convert the result to guest
    /// representation
    pub fn protect<F>(&self, block: F) -> EngineResult<GuestValue>
    where
        F: FnOnce() -> Result<HostValue, HostFailure>,
    {
        let value = self.protect_host(block)?;
        self.to_guest(&value)
    }

    /// Invoke a host callable under protection
    pub fn invoke_callable(&self, callable: &HostFn, args: &[HostValue]) -> EngineResult<GuestValue> {
        self.protect(|| callable.invoke(args))
    }

    /// Invoke a member of a host receiver under protection.
    ///
    /// The member is fetched through the access policy and must resolve to
    /// a callable.
    pub fn invoke_member(
        &self,
        receiver: &HostValue,
        key: &str,
        args: &[HostValue],
    ) -> EngineResult<GuestValue> {
        self.protect(|| {
            let member = match self.policy().get(receiver, key)? {
                Outcome::Handled(value) => value,
                Outcome::Declined => {
                    return Err(HostFailure::error(format!("no such member: {key}")));
                }
            };
            match member {
                HostValue::Callable(callable) => callable.invoke(args),
                other => Err(HostFailure::error(format!(
                    "member {key} is not callable: {other:?}"
                ))),
            }
        })
    }

    /// Retrieve the original host failure behind a translated guest
    /// exception. Only host code knowing the hidden key can reach it.
    pub fn exception_cause(&self, error: &GuestValue) -> Option<Arc<HostError>> {
        error
            .as_object()?
            .get_hidden(HIDDEN_CAUSE)?
            .as_external()?
            .downcast::<HostError>()
    }

    /// Build and raise a guest exception for a recoverable host failure.
    ///
    /// The error object carries the failure message; the original failure
    /// is attached in a hidden, non-enumerable cause slot.
    pub(crate) fn raise_host_error(&self, cause: Arc<HostError>) -> EngineError {
        debug!(error = %cause, "translating host failure into guest exception");
        let error = self.context().new_error(cause.message());
        if let Some(object) = error.as_object() {
            let payload: Arc<dyn std::any::Any + Send + Sync> = cause;
            object.set_hidden(HIDDEN_CAUSE, GuestValue::External(External::from_arc(payload)));
        }
        EngineError::thrown(error)
    }

    /// Map an engine failure back onto the host taxonomy.
    ///
    /// A thrown exception that originated on this side of the bridge
    /// recovers its original cause; fatal errors stay fatal.
    pub(crate) fn engine_failure_to_host(&self, err: EngineError) -> HostFailure {
        match err {
            EngineError::Fatal(fatal) => HostFailure::Fatal(fatal),
            EngineError::Thrown(thrown) => match self.exception_cause(&thrown.value) {
                Some(cause) => HostFailure::Recoverable(cause),
                None => HostFailure::error(thrown.message),
            },
            other => HostFailure::error(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DeclinePolicy;
    use causeway_engine::{FatalError, GuestContext};

    fn portal() -> Portal {
        Portal::new(Arc::new(GuestContext::new()), DeclinePolicy)
    }

    #[test]
    fn test_protect_converts_success() {
        let portal = portal();
        let result = portal.protect(|| Ok(HostValue::Number(9.0))).unwrap();
        assert_eq!(result, GuestValue::Number(9.0));
    }

    #[test]
    fn test_recoverable_failure_raises_guest_exception_with_cause() {
        let portal = portal();
        let failure = HostFailure::error("attribute refused");
        let original = match &failure {
            HostFailure::Recoverable(cause) => cause.clone(),
            HostFailure::Fatal(_) => unreachable!(),
        };

        let err = portal.protect(|| Err(failure)).unwrap_err();
        let EngineError::Thrown(thrown) = err else {
            panic!("expected a thrown guest exception");
        };
        assert_eq!(thrown.message, "attribute refused");

        let cause = portal.exception_cause(&thrown.value).unwrap();
        assert!(Arc::ptr_eq(&cause, &original));
    }

    #[test]
    fn test_cause_slot_is_hidden() {
        let portal = portal();
        let err = portal
            .protect(|| Err(HostFailure::error("boom")))
            .unwrap_err();
        let EngineError::Thrown(thrown) = err else {
            panic!("expected a thrown guest exception");
        };
        let object = thrown.value.as_object().unwrap();
        let keys = portal.context().own_property_names(object).unwrap();
        assert!(keys.iter().all(|key| key.as_named() != Some(HIDDEN_CAUSE)));
    }

    #[test]
    fn test_fatal_failure_propagates_untranslated() {
        let portal = portal();
        let err = portal
            .protect(|| Err(HostFailure::Fatal(FatalError::ProcessExit(2))))
            .unwrap_err();
        assert!(err.is_fatal());
        match err {
            EngineError::Fatal(FatalError::ProcessExit(2)) => {}
            other => panic!("fatal failure was translated: {other:?}"),
        }
    }

    #[test]
    fn test_invoke_callable_under_protection() {
        let portal = portal();
        let shout = HostFn::new("shout", |args| {
            let s = args
                .first()
                .and_then(HostValue::as_str)
                .ok_or_else(|| HostFailure::error("expected a string"))?;
            Ok(HostValue::Str(s.to_uppercase()))
        });
        let result = portal
            .invoke_callable(&shout, &[HostValue::str("hey")])
            .unwrap();
        assert_eq!(result, GuestValue::string("HEY"));

        let err = portal.invoke_callable(&shout, &[]).unwrap_err();
        assert!(matches!(err, EngineError::Thrown(_)));
    }

    #[test]
    fn test_engine_failure_round_trips_cause() {
        let portal = portal();
        let failure = HostFailure::error("original");
        let original = match &failure {
            HostFailure::Recoverable(cause) => cause.clone(),
            HostFailure::Fatal(_) => unreachable!(),
        };
        let engine_err = portal.protect(|| Err(failure)).unwrap_err();
        match portal.engine_failure_to_host(engine_err) {
            HostFailure::Recoverable(cause) => assert!(Arc::ptr_eq(&cause, &original)),
            HostFailure::Fatal(_) => panic!("unexpected fatal"),
        }
    }
}
