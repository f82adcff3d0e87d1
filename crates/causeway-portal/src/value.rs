//! Value bridge
//!
//! Converts values in both directions between the host and guest object
//! models. Both directions are pure functions of their input except the
//! opaque-object paths, which consult the identity registry so repeated
//! round trips never lose identity or duplicate wrappers. Guest arrays and
//! objects are built eagerly; conversion never mutates host state.

use chrono::DateTime;
use std::sync::Arc;

use causeway_engine::{
    EngineResult, External, GuestFunction, GuestValue, PropertyKey,
};

use crate::error::HostFailure;
use crate::host::{GuestKind, GuestRef, HostObject, HostValue};
use crate::portal::{HIDDEN_HOST, Portal};

impl Portal {
    /// Convert a guest value to host representation.
    ///
    /// Wrappers tagged by the identity registry resolve to the exact host
    /// object they proxy; other objects, arrays, and functions surface as
    /// guest proxies.
    pub fn to_host(&self, value: &GuestValue) -> HostValue {
        match value {
            GuestValue::Undefined | GuestValue::Null => HostValue::Null,
            GuestValue::Boolean(b) => HostValue::Bool(*b),
            GuestValue::Number(n) => HostValue::Number(*n),
            GuestValue::String(s) => HostValue::Str(s.to_string()),
            GuestValue::Date(ms) => HostValue::Time(
                DateTime::from_timestamp_millis(*ms as i64).unwrap_or(DateTime::UNIX_EPOCH),
            ),
            GuestValue::Object(object) => match self.identity().resolve(object) {
                Some(host) => HostValue::Object(host),
                None => {
                    let kind = if object.is_array() {
                        GuestKind::Array
                    } else {
                        GuestKind::Object
                    };
                    HostValue::Guest(GuestRef::new(value.clone(), kind))
                }
            },
            GuestValue::Function(_) => {
                HostValue::Guest(GuestRef::new(value.clone(), GuestKind::Function))
            }
            GuestValue::External(external) => {
                HostValue::Object(HostObject::from_arc("external", external.payload().clone()))
            }
        }
    }

    /// Convert a host value to guest representation.
    ///
    /// Guest proxies unwrap to the identical guest value; opaque host
    /// objects wrap through their category's registered template and are
    /// identity-tagged.
    pub fn to_guest(&self, value: &HostValue) -> EngineResult<GuestValue> {
        match value {
            HostValue::Null => Ok(GuestValue::Null),
            HostValue::Bool(b) => Ok(GuestValue::Boolean(*b)),
            HostValue::Number(n) => Ok(GuestValue::Number(*n)),
            HostValue::Str(s) => Ok(GuestValue::string(s)),
            HostValue::Time(t) => Ok(GuestValue::Date(t.timestamp_millis() as f64)),
            HostValue::List(items) => {
                let array = Arc::new(causeway_engine::GuestObject::array(items.len()));
                for (index, item) in items.iter().enumerate() {
                    array.set_element(index, self.to_guest(item)?);
                }
                Ok(GuestValue::Object(array))
            }
            HostValue::Entries(pairs) => {
                let object = Arc::new(causeway_engine::GuestObject::new());
                for (key, entry) in pairs {
                    object.set_own(host_property_key(key), self.to_guest(entry)?);
                }
                Ok(GuestValue::Object(object))
            }
            HostValue::Callable(host_fn) => {
                let portal = self.clone();
                let callable = host_fn.clone();
                Ok(GuestValue::Function(GuestFunction::native(
                    host_fn.name(),
                    move |_this, args| {
                        let host_args: Vec<HostValue> =
                            args.iter().map(|arg| portal.to_host(arg)).collect();
                        portal.protect(|| callable.invoke(&host_args))
                    },
                )))
            }
            HostValue::Constructor(constructor) => {
                let portal = self.clone();
                let ctor = constructor.clone();
                Ok(GuestValue::Function(GuestFunction::native(
                    constructor.category(),
                    move |_this, args| {
                        let host_args: Vec<HostValue> =
                            args.iter().map(|arg| portal.to_host(arg)).collect();
                        portal.protect(|| Ok(HostValue::Object(ctor.construct(&host_args)?)))
                    },
                )))
            }
            HostValue::Object(host) => self.wrap_host_object(host),
            HostValue::Guest(guest) => Ok(guest.value().clone()),
        }
    }

    /// Wrap an opaque host object as a guest instance of its category's
    /// registered proxy template, carrying the payload as a hidden external
    /// reference and an identity tag.
    fn wrap_host_object(&self, host: &HostObject) -> EngineResult<GuestValue> {
        if let Some(existing) = self.identity().wrapper_for(host) {
            return Ok(GuestValue::Object(existing));
        }
        let template = self.constructors().template_for(host.category());
        let instance = template.instance();
        instance.set_hidden(
            HIDDEN_HOST,
            GuestValue::External(External::from_arc(host.payload().clone())),
        );
        self.identity().tag(&instance, host.clone());
        Ok(GuestValue::Object(instance))
    }

    /// Read a member of a guest peer, marshalling the result to host
    /// representation
    pub fn read_member(
        &self,
        peer: &GuestRef,
        key: impl Into<PropertyKey>,
    ) -> Result<HostValue, HostFailure> {
        let object = peer
            .value()
            .as_object()
            .ok_or_else(|| HostFailure::error("guest peer has no properties"))?;
        let value = self
            .context()
            .get(object, &key.into())
            .map_err(|err| self.engine_failure_to_host(err))?;
        Ok(self.to_host(&value))
    }

    /// Write a member of a guest peer, marshalling the value from host
    /// representation
    pub fn write_member(
        &self,
        peer: &GuestRef,
        key: impl Into<PropertyKey>,
        value: &HostValue,
    ) -> Result<(), HostFailure> {
        let object = peer
            .value()
            .as_object()
            .ok_or_else(|| HostFailure::error("guest peer has no properties"))?;
        let guest_value = self
            .to_guest(value)
            .map_err(|err| self.engine_failure_to_host(err))?;
        self.context()
            .set(object, &key.into(), guest_value)
            .map_err(|err| self.engine_failure_to_host(err))
    }

    /// Call a guest function peer from the host.
    ///
    /// Arguments marshal to guest representation, the return value marshals
    /// back, and a thrown guest exception surfaces as a recoverable host
    /// failure (with the original cause when the exception carries one).
    pub fn call_guest(
        &self,
        peer: &GuestRef,
        args: &[HostValue],
    ) -> Result<HostValue, HostFailure> {
        let function = peer
            .value()
            .as_function()
            .ok_or_else(|| HostFailure::error("guest peer is not callable"))?;
        let mut guest_args = Vec::with_capacity(args.len());
        for arg in args {
            guest_args.push(
                self.to_guest(arg)
                    .map_err(|err| self.engine_failure_to_host(err))?,
            );
        }
        let result = function
            .call(&GuestValue::Undefined, &guest_args)
            .map_err(|err| self.engine_failure_to_host(err))?;
        Ok(self.to_host(&result))
    }
}

/// Map a host map key onto a guest property key
fn host_property_key(key: &HostValue) -> PropertyKey {
    match key {
        HostValue::Str(s) => PropertyKey::named(s),
        HostValue::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64 => {
            PropertyKey::Index(*n as u32)
        }
        HostValue::Number(n) => PropertyKey::named(&n.to_string()),
        HostValue::Bool(b) => PropertyKey::named(if *b { "true" } else { "false" }),
        other => PropertyKey::named(&format!("{other:?}")),
    }
}
