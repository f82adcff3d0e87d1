//! End-to-end bridge scenarios: a host-backed record exposed to the guest
//! engine through an access policy, with property access, enumeration,
//! failure translation, and identity round trips crossing the boundary.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use causeway_portal::engine::{
    EngineError, FatalError, GuestContext, GuestValue, PropertyAttributes, PropertyKey,
};
use causeway_portal::{
    AccessPolicy, HostConstructor, HostFailure, HostFn, HostObject, HostValue, Outcome,
    PolicyResult, Portal,
};

type Record = RwLock<IndexMap<String, HostValue>>;
type Vector = RwLock<Vec<HostValue>>;

fn new_record(entries: &[(&str, HostValue)]) -> HostObject {
    let map: IndexMap<String, HostValue> = entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    HostObject::new("record", RwLock::new(map))
}

fn new_vector(items: Vec<HostValue>) -> HostObject {
    HostObject::new("vector", RwLock::new(items))
}

fn record_of(receiver: &HostValue) -> Option<Arc<Record>> {
    receiver.as_object()?.downcast::<Record>()
}

fn vector_of(receiver: &HostValue) -> Option<Arc<Vector>> {
    receiver.as_object()?.downcast::<Vector>()
}

/// Exposes record fields as named properties and vector items as indexed
/// properties, declining anything it does not manage.
struct MapPolicy;

impl AccessPolicy for MapPolicy {
    fn get(&self, receiver: &HostValue, key: &str) -> PolicyResult<HostValue> {
        let Some(record) = record_of(receiver) else {
            return Ok(Outcome::Declined);
        };
        match record.read().get(key) {
            Some(value) => Ok(Outcome::Handled(value.clone())),
            None => Ok(Outcome::Declined),
        }
    }

    fn set(&self, receiver: &HostValue, key: &str, value: &HostValue) -> PolicyResult<HostValue> {
        let Some(record) = record_of(receiver) else {
            return Ok(Outcome::Declined);
        };
        record.write().insert(key.to_string(), value.clone());
        Ok(Outcome::Handled(value.clone()))
    }

    fn query(&self, receiver: &HostValue, key: &str) -> PolicyResult<PropertyAttributes> {
        let Some(record) = record_of(receiver) else {
            return Ok(Outcome::Declined);
        };
        if record.read().contains_key(key) {
            Ok(Outcome::Handled(PropertyAttributes::none()))
        } else {
            Ok(Outcome::Declined)
        }
    }

    fn delete(&self, receiver: &HostValue, key: &str) -> PolicyResult<HostValue> {
        let Some(record) = record_of(receiver) else {
            return Ok(Outcome::Declined);
        };
        match record.write().shift_remove(key) {
            Some(removed) => Ok(Outcome::Handled(removed)),
            None => Ok(Outcome::Declined),
        }
    }

    fn names(&self, receiver: &HostValue) -> PolicyResult<Vec<String>> {
        let Some(record) = record_of(receiver) else {
            return Ok(Outcome::Declined);
        };
        Ok(Outcome::Handled(record.read().keys().cloned().collect()))
    }

    fn iget(&self, receiver: &HostValue, index: u32) -> PolicyResult<HostValue> {
        let Some(vector) = vector_of(receiver) else {
            return Ok(Outcome::Declined);
        };
        match vector.read().get(index as usize) {
            Some(value) => Ok(Outcome::Handled(value.clone())),
            None => Ok(Outcome::Declined),
        }
    }

    fn iset(&self, receiver: &HostValue, index: u32, value: &HostValue) -> PolicyResult<HostValue> {
        let Some(vector) = vector_of(receiver) else {
            return Ok(Outcome::Declined);
        };
        let mut items = vector.write();
        let index = index as usize;
        if index >= items.len() {
            items.resize(index + 1, HostValue::Null);
        }
        items[index] = value.clone();
        Ok(Outcome::Handled(value.clone()))
    }

    fn idelete(&self, receiver: &HostValue, index: u32) -> PolicyResult<HostValue> {
        let Some(vector) = vector_of(receiver) else {
            return Ok(Outcome::Declined);
        };
        let mut items = vector.write();
        if (index as usize) < items.len() {
            items[index as usize] = HostValue::Null;
            Ok(Outcome::Handled(HostValue::Bool(true)))
        } else {
            Ok(Outcome::Declined)
        }
    }

    fn indices(&self, receiver: &HostValue) -> PolicyResult<Vec<u32>> {
        let Some(vector) = vector_of(receiver) else {
            return Ok(Outcome::Declined);
        };
        Ok(Outcome::Handled((0..vector.read().len() as u32).collect()))
    }
}

fn map_portal() -> Portal {
    Portal::builder()
        .with_policy(MapPolicy)
        .register_category("record")
        .register_category("vector")
        .build(Arc::new(GuestContext::new()))
}

fn wrap(portal: &Portal, host: &HostObject) -> Arc<causeway_portal::engine::GuestObject> {
    let guest = portal.to_guest(&HostValue::Object(host.clone())).unwrap();
    guest.as_object().unwrap().clone()
}

#[test]
fn test_identity_round_trip() {
    let portal = map_portal();
    let host = new_record(&[]);

    portal.open(|p| {
        let first = p.to_guest(&HostValue::Object(host.clone())).unwrap();
        let second = p.to_guest(&HostValue::Object(host.clone())).unwrap();
        // No second wrapper while the first is reachable.
        assert_eq!(first, second);

        match p.to_host(&first) {
            HostValue::Object(resolved) => assert!(resolved.same(&host)),
            other => panic!("expected the original host object, got {other:?}"),
        }
    });
}

#[test]
fn test_wrapper_death_does_not_lose_identity() {
    let portal = map_portal();
    let host = new_record(&[]);

    drop(wrap(&portal, &host));
    // The first wrapper is gone; a fresh one is built and still resolves to
    // the same host object.
    let wrapper = wrap(&portal, &host);
    match portal.to_host(&GuestValue::Object(wrapper)) {
        HostValue::Object(resolved) => assert!(resolved.same(&host)),
        other => panic!("expected the original host object, got {other:?}"),
    }
}

#[test]
fn test_primitive_pass_through() {
    let portal = map_portal();
    for value in [
        HostValue::Null,
        HostValue::Bool(true),
        HostValue::Number(0.5),
        HostValue::Number(-7.0),
    ] {
        let guest = portal.to_guest(&value).unwrap();
        assert_eq!(portal.to_host(&guest), value);
    }
}

#[test]
fn test_sequence_order_preserved() {
    let portal = map_portal();
    let list = HostValue::List(vec![
        HostValue::str("a"),
        HostValue::str("b"),
        HostValue::str("c"),
    ]);
    let guest = portal.to_guest(&list).unwrap();

    // Reading the sequence back through the host-side peer keeps the order.
    let peer = match portal.to_host(&guest) {
        HostValue::Guest(peer) => peer,
        other => panic!("expected a guest sequence proxy, got {other:?}"),
    };
    let items: Vec<HostValue> = (0..3u32)
        .map(|i| portal.read_member(&peer, i).unwrap())
        .collect();
    assert_eq!(
        items,
        vec![HostValue::str("a"), HostValue::str("b"), HostValue::str("c")]
    );
}

#[test]
fn test_decline_falls_back_to_default_behavior() {
    let portal = map_portal();
    let host = new_record(&[("present", HostValue::Number(1.0))]);
    let wrapper = wrap(&portal, &host);
    let ctx = portal.context().clone();

    // An unset property resolves via default behavior, not via the policy.
    let missing = ctx.get(&wrapper, &PropertyKey::named("ghost")).unwrap();
    assert_eq!(missing, GuestValue::Undefined);

    // Declined deletion of a property the policy does not manage.
    wrapper.set_own("local".into(), GuestValue::Number(2.0));
    assert!(ctx.delete(&wrapper, &PropertyKey::named("local")).unwrap());
    assert!(!wrapper.has_own(&"local".into()));
}

#[test]
fn test_exception_cause_preserved() {
    struct FailingPolicy {
        failure: HostFailure,
    }

    impl AccessPolicy for FailingPolicy {
        fn set(
            &self,
            _receiver: &HostValue,
            _key: &str,
            _value: &HostValue,
        ) -> PolicyResult<HostValue> {
            Err(self.failure.clone())
        }
    }

    let failure = HostFailure::error_with_payload(
        "assignment refused",
        HostObject::new("ticket", 99_u32),
    );
    let HostFailure::Recoverable(original) = failure.clone() else {
        unreachable!();
    };

    let portal = Portal::new(
        Arc::new(GuestContext::new()),
        FailingPolicy { failure },
    );
    let wrapper = portal.object_template().instance();

    let err = portal
        .context()
        .set(&wrapper, &PropertyKey::named("x"), GuestValue::Number(1.0))
        .unwrap_err();
    let EngineError::Thrown(thrown) = err else {
        panic!("expected a guest-catchable exception");
    };
    assert_eq!(thrown.message, "assignment refused");

    let cause = portal.exception_cause(&thrown.value).unwrap();
    assert!(Arc::ptr_eq(&cause, &original));
    assert_eq!(*cause.payload().unwrap().downcast::<u32>().unwrap(), 99);
}

#[test]
fn test_fatal_failure_is_never_translated() {
    struct FatalPolicy;

    impl AccessPolicy for FatalPolicy {
        fn get(&self, _receiver: &HostValue, _key: &str) -> PolicyResult<HostValue> {
            Err(HostFailure::Fatal(FatalError::ProcessExit(3)))
        }
    }

    let portal = Portal::new(Arc::new(GuestContext::new()), FatalPolicy);
    let wrapper = portal.object_template().instance();

    let err = portal
        .context()
        .get(&wrapper, &PropertyKey::named("anything"))
        .unwrap_err();
    match err {
        EngineError::Fatal(FatalError::ProcessExit(3)) => {}
        other => panic!("fatal failure was translated: {other:?}"),
    }
    // The context survives; the failure was local to the call.
    assert!(!portal.context().is_entered());
}

#[test]
fn test_enumeration_completeness() {
    let portal = map_portal();
    let host = new_record(&[("x", HostValue::Number(1.0)), ("y", HostValue::Number(2.0))]);
    let wrapper = wrap(&portal, &host);

    let keys = portal.context().own_property_names(&wrapper).unwrap();
    assert_eq!(
        keys,
        vec![PropertyKey::named("x"), PropertyKey::named("y")]
    );
}

#[test]
fn test_host_map_scenario() {
    let portal = map_portal();
    let host = new_record(&[("foo", HostValue::Number(1.0))]);
    let wrapper = wrap(&portal, &host);
    let ctx = portal.context().clone();

    portal.open(|_p| {
        // Guest reads receiver.foo: the policy handles it with 1.
        let foo = ctx.get(&wrapper, &PropertyKey::named("foo")).unwrap();
        assert_eq!(foo, GuestValue::Number(1.0));

        // Guest writes receiver.bar = "x": the policy performs the
        // assignment on the host map.
        ctx.set(&wrapper, &PropertyKey::named("bar"), GuestValue::string("x"))
            .unwrap();
    });

    let record = host.downcast::<Record>().unwrap();
    assert_eq!(record.read().get("bar"), Some(&HostValue::str("x")));

    let keys = portal.context().own_property_names(&wrapper).unwrap();
    assert_eq!(
        keys,
        vec![PropertyKey::named("foo"), PropertyKey::named("bar")]
    );
}

#[test]
fn test_indexed_hooks() {
    let portal = map_portal();
    let host = new_vector(vec![HostValue::Number(10.0), HostValue::Number(20.0)]);
    let wrapper = wrap(&portal, &host);
    let ctx = portal.context().clone();

    assert_eq!(
        ctx.get(&wrapper, &PropertyKey::Index(0)).unwrap(),
        GuestValue::Number(10.0)
    );
    assert_eq!(
        ctx.get(&wrapper, &PropertyKey::Index(5)).unwrap(),
        GuestValue::Undefined
    );

    ctx.set(&wrapper, &PropertyKey::Index(1), GuestValue::Number(21.0))
        .unwrap();
    let vector = host.downcast::<Vector>().unwrap();
    assert_eq!(vector.read()[1], HostValue::Number(21.0));

    // Query aliases enumeration: known indices report empty attributes.
    assert_eq!(
        ctx.query(&wrapper, &PropertyKey::Index(1)).unwrap(),
        Some(PropertyAttributes::none())
    );
    assert_eq!(ctx.query(&wrapper, &PropertyKey::Index(9)).unwrap(), None);

    let keys = ctx.own_property_names(&wrapper).unwrap();
    assert_eq!(keys, vec![PropertyKey::Index(0), PropertyKey::Index(1)]);

    assert!(ctx.delete(&wrapper, &PropertyKey::Index(0)).unwrap());
    assert_eq!(vector.read()[0], HostValue::Null);
}

#[test]
fn test_constructor_tags_instances() {
    let portal = map_portal();
    let constructor = HostConstructor::new("record", |args| {
        let mut map = IndexMap::new();
        if let Some(name) = args.first().and_then(HostValue::as_str) {
            map.insert("name".to_string(), HostValue::str(name));
        }
        Ok(HostObject::new("record", RwLock::new(map)))
    });

    let guest_ctor = portal
        .to_guest(&HostValue::Constructor(constructor))
        .unwrap();
    let function = guest_ctor.as_function().unwrap();
    assert_eq!(function.name(), "record");

    let instance = function.construct(&[GuestValue::string("ada")]).unwrap();
    let host = match portal.to_host(&instance) {
        HostValue::Object(host) => host,
        other => panic!("instance did not resolve to a host object: {other:?}"),
    };
    assert_eq!(host.category(), "record");
    let record = host.downcast::<Record>().unwrap();
    assert_eq!(record.read().get("name"), Some(&HostValue::str("ada")));

    // The instance is handler-bound: policy-managed reads work on it.
    let wrapper = instance.as_object().unwrap();
    let name = portal
        .context()
        .get(wrapper, &PropertyKey::named("name"))
        .unwrap();
    assert_eq!(name, GuestValue::string("ada"));
}

#[test]
fn test_constructor_failure_becomes_guest_exception() {
    let portal = map_portal();
    let constructor =
        HostConstructor::new("record", |_args| Err(HostFailure::error("bad arguments")));
    let guest_ctor = portal
        .to_guest(&HostValue::Constructor(constructor))
        .unwrap();

    let err = guest_ctor.as_function().unwrap().construct(&[]).unwrap_err();
    let EngineError::Thrown(thrown) = err else {
        panic!("expected a guest-catchable exception");
    };
    assert_eq!(thrown.message, "bad arguments");
}

#[test]
fn test_invoke_member_under_protection() {
    let portal = map_portal();
    let greet = HostFn::new("greet", |args| {
        let name = args.first().and_then(HostValue::as_str).unwrap_or("world");
        Ok(HostValue::Str(format!("hello {name}")))
    });
    let host = new_record(&[("greet", HostValue::Callable(greet))]);
    let receiver = HostValue::Object(host);

    let result = portal
        .invoke_member(&receiver, "greet", &[HostValue::str("guest")])
        .unwrap();
    assert_eq!(result, GuestValue::string("hello guest"));

    let err = portal.invoke_member(&receiver, "missing", &[]).unwrap_err();
    assert!(matches!(err, EngineError::Thrown(_)));
}

#[test]
fn test_guest_function_called_from_host() {
    let portal = map_portal();
    let function = causeway_portal::engine::GuestFunction::native("concat", |_this, args| {
        let mut out = String::new();
        for arg in args {
            if let Some(s) = arg.as_str() {
                out.push_str(s);
            }
        }
        Ok(GuestValue::string(&out))
    });

    let peer = match portal.to_host(&GuestValue::Function(function)) {
        HostValue::Guest(peer) => peer,
        other => panic!("expected a callable proxy, got {other:?}"),
    };
    let result = portal
        .call_guest(&peer, &[HostValue::str("a"), HostValue::str("b")])
        .unwrap();
    assert_eq!(result, HostValue::str("ab"));
}

#[test]
fn test_reentrant_property_access() {
    // A policy-managed property whose value is a host callable that itself
    // reads back through the bridge; exercises nested dispatch.
    let portal = map_portal();
    let inner = new_record(&[("depth", HostValue::Number(2.0))]);
    let host = new_record(&[("inner", HostValue::Object(inner))]);
    let wrapper = wrap(&portal, &host);
    let ctx = portal.context().clone();

    let inner_value = ctx.get(&wrapper, &PropertyKey::named("inner")).unwrap();
    let inner_wrapper = inner_value.as_object().unwrap();
    let depth = ctx
        .get(inner_wrapper, &PropertyKey::named("depth"))
        .unwrap();
    assert_eq!(depth, GuestValue::Number(2.0));
}
